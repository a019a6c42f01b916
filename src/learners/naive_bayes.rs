use linfa::prelude::*;
use linfa_bayes::GaussianNb;
use ndarray::{Array1, Array2, Ix1};
use serde::{Deserialize, Serialize};

use super::{ClassModel, Learner};
use crate::error::Result;

/// Gaussian Naive Bayes, it takes no configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayesParams;

impl NaiveBayesParams {
    pub fn new() -> Self {
        NaiveBayesParams
    }
}

/// Fitted Gaussian Naive Bayes model
#[derive(Debug)]
pub struct NaiveBayesModel {
    inner: GaussianNb<f64, usize>,
}

impl ClassModel for NaiveBayesModel {
    fn predict_indices(&self, records: &Array2<f64>) -> Result<Array1<usize>> {
        Ok(self.inner.predict(records))
    }
}

impl Learner for NaiveBayesParams {
    type Model = NaiveBayesModel;

    fn name(&self) -> &'static str {
        "naive bayes"
    }

    fn learn(&self, dataset: &Dataset<f64, usize, Ix1>) -> Result<NaiveBayesModel> {
        let inner = GaussianNb::<f64, usize>::params().fit(dataset)?;

        Ok(NaiveBayesModel { inner })
    }
}
