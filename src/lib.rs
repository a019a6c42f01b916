//! `linfa-vision` trains image classifiers on top of the `linfa` learners.
//!
//! An image classifier turns every image into a feature row by running a list of
//! [`FeatureExtractor`](extractor::FeatureExtractor)s on it and concatenating their outputs. The
//! rows of all classes form an example table, which is handed to one of three learners:
//!
//! * [k-nearest neighbours](learners::KnnParams), backed by the KD-tree of `linfa-nn`
//! * [Gaussian Naive Bayes](learners::NaiveBayesParams), backed by `linfa-bayes`
//! * [support vector machines](learners::SvmParams), backed by `linfa-svm`
//!
//! The crate does no feature extraction and no learning of its own. It collects images from
//! directories or memory, runs training and testing and reports accuracy together with a
//! confusion matrix.
//!
//! ## Example
//!
//! ```no_run
//! use linfa_vision::prelude::*;
//! # fn extractors() -> Vec<Box<dyn FeatureExtractor>> { Vec::new() }
//!
//! # fn main() -> linfa_vision::error::Result<()> {
//! let mut classifier = KnnClassifier::new(extractors(), KnnParams::new().k(3));
//! let classes = vec![
//!     LabeledSource::directory("cat", "train/cat"),
//!     LabeledSource::directory("dog", "train/dog"),
//! ];
//!
//! if let Some(report) = classifier.train(&classes, &RunOptions::new().subset(50))? {
//!     println!("{}", report);
//! }
//!
//! let image = image::open("unknown.png")?;
//! println!("{}", classifier.classify(&image)?);
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod collect;
pub mod display;
pub mod error;
pub mod extractor;
pub mod learners;
pub mod metrics;
pub mod prelude;
pub mod source;
pub mod state;
pub mod table;

pub use classifier::{ImageClassifier, KnnClassifier, NaiveBayesClassifier, SvmClassifier};
pub use error::{ClassifierError, Result};
