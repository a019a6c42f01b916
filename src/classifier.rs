//! Image classifiers
//!
//! [`ImageClassifier`] implements the common workflow of all classifier variants:
//!
//! 1. collect labeled images, one source per class
//! 2. train a learner on the extracted features and score it on the training data
//! 3. test the fitted model on other images
//! 4. save the classifier and classify single images with it
//!
//! The variants only differ in their [`Learner`].
use std::path::Path;

use image::DynamicImage;
use log::{info, warn};
use ndarray::{Array1, Axis};
use rand::{rngs::SmallRng, seq::SliceRandom, SeedableRng};

use crate::collect::{collect, NoDisplay, Phase, RunOptions};
use crate::display::PreviewSink;
use crate::error::{ClassifierError, Result};
use crate::extractor::{extract_all, field_names, FeatureExtractor};
use crate::learners::{
    ClassModel, KnnDistance, KnnParams, Learner, NaiveBayesParams, SvmParams,
};
use crate::metrics::{ConfusionMatrix, Report};
use crate::source::LabeledSource;
use crate::state::ClassifierState;
use crate::table::FeatureTable;

/// Classifier built on k-nearest neighbours
pub type KnnClassifier = ImageClassifier<KnnParams>;
/// Classifier built on Gaussian Naive Bayes
pub type NaiveBayesClassifier = ImageClassifier<NaiveBayesParams>;
/// Classifier built on support vector machines
pub type SvmClassifier = ImageClassifier<SvmParams>;

/// Multi-class image classifier
///
/// The classifier retains the feature rows of its last training run. They are used to refit the
/// model after the learner changed or the classifier was loaded from disk.
pub struct ImageClassifier<L: Learner> {
    extractors: Vec<Box<dyn FeatureExtractor>>,
    learner: L,
    table: FeatureTable,
    model: Option<L::Model>,
}

impl<L: Learner> ImageClassifier<L> {
    pub fn new(extractors: Vec<Box<dyn FeatureExtractor>>, learner: L) -> Self {
        let table = FeatureTable::new(field_names(&extractors), Vec::new());

        ImageClassifier {
            extractors,
            learner,
            table,
            model: None,
        }
    }

    pub fn extractors(&self) -> &[Box<dyn FeatureExtractor>] {
        &self.extractors
    }

    pub fn learner(&self) -> &L {
        &self.learner
    }

    /// Feature rows of the last training run
    pub fn table(&self) -> &FeatureTable {
        &self.table
    }

    pub fn class_names(&self) -> &[String] {
        self.table.class_names()
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }

    /// Replace the feature extractors
    ///
    /// The retained rows no longer match the new extractors, so they are dropped together with
    /// the model. The classifier has to be trained again.
    pub fn set_feature_extractors(&mut self, extractors: Vec<Box<dyn FeatureExtractor>>) {
        self.table = FeatureTable::new(field_names(&extractors), self.table.class_names().to_vec());
        self.extractors = extractors;
        self.model = None;
    }

    /// Replace the learner, the model has to be rebuilt with [`refit`](Self::refit) or a new
    /// training run
    pub fn set_learner(&mut self, learner: L) {
        self.learner = learner;
        self.model = None;
    }

    /// Fit a new model on the retained feature rows
    pub fn refit(&mut self) -> Result<()> {
        if self.table.is_empty() {
            return Err(ClassifierError::NoData);
        }

        let dataset = self.table.to_dataset()?;
        self.model = Some(self.learner.learn(&dataset)?);

        Ok(())
    }

    /// Train on one image source per class
    ///
    /// Returns `None` if no image produced a feature row, otherwise the accuracy on the training
    /// data.
    pub fn train(&mut self, classes: &[LabeledSource], opts: &RunOptions) -> Result<Option<Report>> {
        self.train_inner(classes, opts, None::<&mut NoDisplay>)
    }

    /// Train and show every accepted image on `display`
    pub fn train_with_display<S: PreviewSink + ?Sized>(
        &mut self,
        classes: &[LabeledSource],
        opts: &RunOptions,
        display: &mut S,
    ) -> Result<Option<Report>> {
        self.train_inner(classes, opts, Some(display))
    }

    fn train_inner<S: PreviewSink + ?Sized>(
        &mut self,
        classes: &[LabeledSource],
        opts: &RunOptions,
        mut display: Option<&mut S>,
    ) -> Result<Option<Report>> {
        let mut class_names: Vec<String> = Vec::new();
        for class in classes {
            if !class_names.contains(&class.class_name) {
                class_names.push(class.class_name.clone());
            }
        }

        self.table = FeatureTable::new(field_names(&self.extractors), class_names);
        self.model = None;

        let mut count = 0;
        for class in classes {
            count += collect(
                &self.extractors,
                class,
                &mut self.table,
                opts,
                Phase::Training,
                display.as_deref_mut(),
            )?;
        }

        if count == 0 {
            warn!("No features extracted - bailing");
            return Ok(None);
        }

        if let Some(path) = opts.save_data_path() {
            self.table.write_tab(path)?;
        }

        info!(
            "Fitting {} on {} rows of {} classes",
            self.learner.name(),
            count,
            self.table.class_names().len()
        );
        let dataset = self.table.to_dataset()?;
        let model = self.learner.learn(&dataset)?;
        let predicted = model.predict_indices(dataset.records())?;
        let report = self.report(dataset.targets(), &predicted, opts.is_verbose());

        self.model = Some(model);

        Ok(Some(report))
    }

    /// Test the trained model on one image source per class
    ///
    /// The class names have to be known to the classifier. Returns `None` if no image produced a
    /// feature row.
    pub fn test(&self, classes: &[LabeledSource], opts: &RunOptions) -> Result<Option<Report>> {
        self.test_inner(classes, opts, None::<&mut NoDisplay>)
    }

    /// Test and show every accepted image on `display`
    pub fn test_with_display<S: PreviewSink + ?Sized>(
        &self,
        classes: &[LabeledSource],
        opts: &RunOptions,
        display: &mut S,
    ) -> Result<Option<Report>> {
        self.test_inner(classes, opts, Some(display))
    }

    fn test_inner<S: PreviewSink + ?Sized>(
        &self,
        classes: &[LabeledSource],
        opts: &RunOptions,
        mut display: Option<&mut S>,
    ) -> Result<Option<Report>> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotTrained)?;
        for class in classes {
            self.table.class_index(&class.class_name)?;
        }

        let mut table = FeatureTable::new(
            self.table.field_names().to_vec(),
            self.table.class_names().to_vec(),
        );

        let mut count = 0;
        for class in classes {
            count += collect(
                &self.extractors,
                class,
                &mut table,
                opts,
                Phase::Testing,
                display.as_deref_mut(),
            )?;
        }

        if count == 0 {
            warn!("No features extracted - bailing");
            return Ok(None);
        }

        if let Some(path) = opts.save_data_path() {
            table.write_tab(path)?;
        }

        let dataset = table.to_dataset()?;
        let predicted = model.predict_indices(dataset.records())?;

        Ok(Some(self.report(
            dataset.targets(),
            &predicted,
            opts.is_verbose(),
        )))
    }

    fn report(&self, truth: &Array1<usize>, predicted: &Array1<usize>, verbose: bool) -> Report {
        let names = self.table.class_names();
        if verbose {
            for (t, p) in truth.iter().zip(predicted.iter()) {
                info!("original {} classified as {}", names[*t], names[*p]);
            }
        }

        let report = Report::from_predictions(&truth.to_vec(), &predicted.to_vec(), names);
        if verbose {
            for line in report.to_string().lines() {
                info!("{}", line);
            }
        }

        report
    }

    /// Classify a single image and return the name of its class
    pub fn classify(&self, image: &DynamicImage) -> Result<String> {
        let model = self.model.as_ref().ok_or(ClassifierError::NotTrained)?;
        let values =
            extract_all(&self.extractors, image)?.ok_or(ClassifierError::MissingFeatures)?;

        let records = Array1::from(values).insert_axis(Axis(0));
        let predicted = model.predict_indices(&records)?;

        predicted
            .get(0)
            .and_then(|idx| self.table.class_names().get(*idx))
            .cloned()
            .ok_or(ClassifierError::NoData)
    }

    /// Estimate the accuracy with k-fold cross-validation on the retained rows
    ///
    /// The rows are shuffled with a generator seeded by `seed`, then split into `folds` parts.
    /// Every part is scored by a model fitted on the remaining ones. The report always carries
    /// the confusion matrix accumulated over all parts.
    ///
    /// Every part holds `rows / folds` rows. The remaining `rows % folds` rows are only ever used
    /// for training, so `evaluated` may be smaller than the number of retained rows.
    pub fn cross_validate(&self, folds: usize, seed: u64) -> Result<Report> {
        let n = self.table.len();
        if folds < 2 || folds > n {
            return Err(ClassifierError::Parameters(format!(
                "number of folds must lie in [2, {}], got {}",
                n, folds
            )));
        }

        let dataset = self.table.to_dataset()?;
        let mut order = (0..n).collect::<Vec<_>>();
        order.shuffle(&mut SmallRng::seed_from_u64(seed));

        let shuffled = linfa::DatasetBase::new(
            dataset.records().select(Axis(0), &order),
            dataset.targets().select(Axis(0), &order),
        );

        let names = self.table.class_names();
        let mut confusion = ConfusionMatrix::from_predictions(&[], &[], names);
        let mut correct = 0;
        let mut evaluated = 0;
        for (train, valid) in shuffled.fold(folds) {
            let model = self.learner.learn(&train)?;
            let predicted = model.predict_indices(valid.records())?;
            let truth = valid.targets();

            correct += truth
                .iter()
                .zip(predicted.iter())
                .filter(|(t, p)| t == p)
                .count();
            evaluated += truth.len();
            confusion.merge(&ConfusionMatrix::from_predictions(
                &truth.to_vec(),
                &predicted.to_vec(),
                names,
            ));
        }

        Ok(Report::new(correct, evaluated, Some(confusion)))
    }

    /// Write learner and retained rows to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        ClassifierState::write(path, &self.learner, &self.table)
    }

    /// Load a classifier written by [`save`](Self::save)
    ///
    /// The extractors have to declare the same fields as the ones used for training. If the
    /// stored table holds rows, the model is fitted again.
    pub fn load<P: AsRef<Path>>(
        path: P,
        extractors: Vec<Box<dyn FeatureExtractor>>,
    ) -> Result<Self> {
        let state = ClassifierState::<L>::read(path)?;

        let found = field_names(&extractors);
        if found != state.table.field_names() {
            return Err(ClassifierError::SchemaMismatch {
                expected: state.table.field_names().to_vec(),
                found,
            });
        }

        let mut classifier = ImageClassifier {
            extractors,
            learner: state.learner,
            table: state.table,
            model: None,
        };
        if !classifier.table.is_empty() {
            classifier.refit()?;
        }

        Ok(classifier)
    }
}

impl<L: Learner + Default> ImageClassifier<L> {
    /// Classifier with default learner parameters
    pub fn with_defaults(extractors: Vec<Box<dyn FeatureExtractor>>) -> Self {
        Self::new(extractors, L::default())
    }
}

impl ImageClassifier<KnnParams> {
    /// Set the number of neighbours, training has to be redone
    pub fn set_k(&mut self, k: usize) {
        let learner = self.learner.clone().k(k);
        self.set_learner(learner);
    }

    /// Set the distance metric, training has to be redone
    pub fn set_distance_metric(&mut self, distance: KnnDistance) {
        let learner = self.learner.clone().distance(distance);
        self.set_learner(learner);
    }
}

impl ImageClassifier<SvmParams> {
    /// Replace all SVM properties, training has to be redone
    pub fn set_properties(&mut self, properties: SvmParams) {
        self.set_learner(properties);
    }
}
