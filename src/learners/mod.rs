//! Learners backing the image classifiers
//!
//! The heavy lifting is done by the `linfa` ecosystem. A [`Learner`] holds the hyperparameters
//! of one algorithm and fits a [`ClassModel`] on the example table built from collected
//! feature rows. Targets are indices into the class list of the classifier.
use linfa::Dataset;
use ndarray::{Array1, Array2, Ix1};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

mod knn;
mod naive_bayes;
mod svm;

pub use knn::{KnnDistance, KnnModel, KnnParams, KnnValidParams};
pub use naive_bayes::{NaiveBayesModel, NaiveBayesParams};
pub use svm::{SvmKernel, SvmModel, SvmParams, SvmType, SvmValidParams};

/// A fitted model predicting class indices
pub trait ClassModel {
    /// Predict the class index of every row in `records`
    fn predict_indices(&self, records: &Array2<f64>) -> Result<Array1<usize>>;
}

/// Hyperparameters of a learning algorithm
///
/// The parameters are persisted together with the feature table, so they have to be
/// serializable. The fitted model is not, it is rebuilt by calling `learn` again.
pub trait Learner: Serialize + DeserializeOwned {
    type Model: ClassModel;

    /// Human readable name of the algorithm
    fn name(&self) -> &'static str;

    /// Fit a model on the example table
    fn learn(&self, dataset: &Dataset<f64, usize, Ix1>) -> Result<Self::Model>;
}
