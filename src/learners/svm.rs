//! Support vector machines
//!
//! One binary SVM from `linfa-svm` is trained for every pair of classes. A row is assigned the
//! class winning most of the pairwise decisions, ties go to the class listed first.
use std::fmt;
use std::str::FromStr;

use linfa::prelude::*;
use linfa::ParamGuard;
use linfa_svm::Svm;
use log::debug;
use ndarray::{Array1, Array2, Axis, Ix1};
use serde::{Deserialize, Serialize};

use super::{ClassModel, Learner};
use crate::error::{ClassifierError, Result};

/// Kernel function of the SVM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SvmKernel {
    /// Radial basis function `exp(-gamma * |x - x'|^2)`
    Rbf,
    /// Inner product `<x, x'>`
    Linear,
    /// Polynomial `(<x, x'> + coef)^degree`
    Poly,
}

/// Formulation of the optimization problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SvmType {
    /// Nu-SVC, `nu` bounds the fraction of support vectors
    Nu,
    /// C-SVC, `c` weights the slack variables
    C,
}

impl FromStr for SvmKernel {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rbf" => Ok(SvmKernel::Rbf),
            "linear" => Ok(SvmKernel::Linear),
            "poly" => Ok(SvmKernel::Poly),
            _ => Err(ClassifierError::Parameters(format!(
                "unsupported kernel type {}",
                s
            ))),
        }
    }
}

impl FromStr for SvmType {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nu" => Ok(SvmType::Nu),
            "c" => Ok(SvmType::C),
            _ => Err(ClassifierError::Parameters(format!(
                "unknown SVM type {}",
                s
            ))),
        }
    }
}

impl fmt::Display for SvmKernel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SvmKernel::Rbf => write!(f, "RBF"),
            SvmKernel::Linear => write!(f, "Linear"),
            SvmKernel::Poly => write!(f, "Poly"),
        }
    }
}

/// Verified SVM hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmValidParams {
    kernel: SvmKernel,
    svm_type: SvmType,
    nu: Option<f64>,
    c: Option<f64>,
    degree: Option<f64>,
    coef: Option<f64>,
    gamma: Option<f64>,
}

impl SvmValidParams {
    pub fn kernel(&self) -> SvmKernel {
        self.kernel
    }

    pub fn svm_type(&self) -> SvmType {
        self.svm_type
    }

    /// Nu weight, defaults to 0.5
    pub fn nu(&self) -> f64 {
        self.nu.unwrap_or(0.5)
    }

    /// Slack weight, defaults to 1
    pub fn c(&self) -> f64 {
        self.c.unwrap_or(1.0)
    }

    /// Degree of the polynomial kernel, defaults to 3
    pub fn degree(&self) -> f64 {
        self.degree.unwrap_or(3.0)
    }

    /// Constant of the polynomial kernel, defaults to 0
    pub fn coef(&self) -> f64 {
        self.coef.unwrap_or(0.0)
    }

    /// Width of the RBF kernel, defaults to one over the number of features
    pub fn gamma(&self, n_features: usize) -> f64 {
        self.gamma.unwrap_or(1.0 / n_features as f64)
    }

    /// Translate into the parameters of a binary `linfa-svm` model
    ///
    /// Nu-SVC is only feasible for `nu <= 2 * min(n_pos, n_neg) / n`, larger values are clamped
    /// to that bound.
    fn binary_params(
        &self,
        n_features: usize,
        n_positive: usize,
        n_samples: usize,
    ) -> linfa_svm::SvmParams<f64, bool> {
        let params = Svm::<f64, bool>::params();

        let params = match self.kernel {
            // linfa-svm uses exp(-|x - x'|^2 / eps)
            SvmKernel::Rbf => params.gaussian_kernel(1.0 / self.gamma(n_features)),
            SvmKernel::Linear => params.linear_kernel(),
            SvmKernel::Poly => params.polynomial_kernel(self.coef(), self.degree()),
        };

        match self.svm_type {
            SvmType::Nu => {
                let minority = n_positive.min(n_samples - n_positive);
                let bound = 2.0 * minority as f64 / n_samples as f64;
                if self.nu() > bound {
                    debug!("Clamping nu {} to {} for an unbalanced pair", self.nu(), bound);
                }
                params.nu_weight(self.nu().min(bound))
            }
            SvmType::C => params.pos_neg_weights(self.c(), self.c()),
        }
    }
}

/// SVM hyperparameters
///
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :--- | :--- |
/// | [kernel](Self::kernel) | `Rbf` | Kernel function | |
/// | [svm_type](Self::svm_type) | `Nu` | Nu-SVC or C-SVC | |
/// | [nu](Self::nu) | `0.5` | Nu weight of Nu-SVC | `(0, 1]` |
/// | [c](Self::c) | `1` | Slack weight of C-SVC | `(0, inf)` |
/// | [degree](Self::degree) | `3` | Degree of the polynomial kernel | `[1, inf)` |
/// | [coef](Self::coef) | `0` | Constant of the polynomial kernel | |
/// | [gamma](Self::gamma) | `1 / #features` | Width of the RBF kernel, unused by the other kernels | `(0, inf)` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmParams(SvmValidParams);

impl SvmParams {
    pub fn new() -> Self {
        SvmParams(SvmValidParams {
            kernel: SvmKernel::Rbf,
            svm_type: SvmType::Nu,
            nu: None,
            c: None,
            degree: None,
            coef: None,
            gamma: None,
        })
    }

    pub fn kernel(mut self, kernel: SvmKernel) -> Self {
        self.0.kernel = kernel;
        self
    }

    pub fn svm_type(mut self, svm_type: SvmType) -> Self {
        self.0.svm_type = svm_type;
        self
    }

    pub fn nu(mut self, nu: f64) -> Self {
        self.0.nu = Some(nu);
        self
    }

    pub fn c(mut self, c: f64) -> Self {
        self.0.c = Some(c);
        self
    }

    pub fn degree(mut self, degree: f64) -> Self {
        self.0.degree = Some(degree);
        self
    }

    pub fn coef(mut self, coef: f64) -> Self {
        self.0.coef = Some(coef);
        self
    }

    /// Set the width of the RBF kernel
    ///
    /// The polynomial kernel of `linfa-svm` has no scale factor, so `gamma` is ignored by the
    /// `Poly` and `Linear` kernels.
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.0.gamma = Some(gamma);
        self
    }
}

impl Default for SvmParams {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamGuard for SvmParams {
    type Checked = SvmValidParams;
    type Error = ClassifierError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        let p = &self.0;
        if let Some(nu) = p.nu {
            if !(nu > 0.0 && nu <= 1.0) {
                return Err(ClassifierError::Parameters(format!(
                    "nu must lie in (0, 1], got {}",
                    nu
                )));
            }
        }
        if let Some(c) = p.c {
            if !(c > 0.0) {
                return Err(ClassifierError::Parameters(format!(
                    "c must be positive, got {}",
                    c
                )));
            }
        }
        if let Some(gamma) = p.gamma {
            if !(gamma > 0.0) {
                return Err(ClassifierError::Parameters(format!(
                    "gamma must be positive, got {}",
                    gamma
                )));
            }
        }
        if let Some(degree) = p.degree {
            if !(degree >= 1.0) {
                return Err(ClassifierError::Parameters(format!(
                    "degree must be at least 1, got {}",
                    degree
                )));
            }
        }

        Ok(p)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// Binary SVM deciding between two classes
struct PairModel {
    positive: usize,
    negative: usize,
    svm: Svm<f64, bool>,
}

/// One-vs-one combination of binary SVMs
pub struct SvmModel {
    labels: Vec<usize>,
    pairs: Vec<PairModel>,
    n_features: usize,
}

impl fmt::Debug for SvmModel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SvmModel")
            .field("labels", &self.labels)
            .field("pairs", &self.pairs.len())
            .field("n_features", &self.n_features)
            .finish()
    }
}

impl SvmModel {
    /// Class labels seen during training, in ascending order
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }
}

impl Fit<Array2<f64>, Array1<usize>, ClassifierError> for SvmValidParams {
    type Object = SvmModel;

    fn fit(&self, dataset: &Dataset<f64, usize, Ix1>) -> Result<SvmModel> {
        let n_features = dataset.nfeatures();
        if dataset.nsamples() == 0 || n_features == 0 {
            return Err(ClassifierError::Parameters(
                "no training rows or features".to_string(),
            ));
        }

        let targets = dataset.targets();
        let mut labels = targets.to_vec();
        labels.sort_unstable();
        labels.dedup();

        let mut pairs = Vec::new();
        for (i, &positive) in labels.iter().enumerate() {
            for &negative in &labels[i + 1..] {
                let idx = targets
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| **t == positive || **t == negative)
                    .map(|(i, _)| i)
                    .collect::<Vec<_>>();
                let n_positive = idx.iter().filter(|&&i| targets[i] == positive).count();

                let pair = DatasetBase::new(
                    dataset.records().select(Axis(0), &idx),
                    targets.select(Axis(0), &idx),
                );
                let binary = pair
                    .one_vs_all()?
                    .into_iter()
                    .find(|(label, _)| *label == positive)
                    .map(|(_, binary)| binary)
                    .ok_or_else(|| {
                        ClassifierError::Parameters(format!("class {} has no rows", positive))
                    })?;

                let svm = self
                    .binary_params(n_features, n_positive, idx.len())
                    .fit(&binary)?;
                pairs.push(PairModel {
                    positive,
                    negative,
                    svm,
                });
            }
        }

        Ok(SvmModel {
            labels,
            pairs,
            n_features,
        })
    }
}

impl ClassModel for SvmModel {
    fn predict_indices(&self, records: &Array2<f64>) -> Result<Array1<usize>> {
        if records.ncols() != self.n_features {
            return Err(ClassifierError::FieldCount {
                expected: self.n_features,
                found: records.ncols(),
            });
        }

        let n_labels = self.labels.iter().max().map_or(0, |l| l + 1);
        let mut votes = Array2::<usize>::zeros((records.nrows(), n_labels));
        for pair in &self.pairs {
            let decisions: Array1<bool> = pair.svm.predict(records);
            for (mut row, positive) in votes.rows_mut().into_iter().zip(decisions.iter()) {
                let winner = if *positive { pair.positive } else { pair.negative };
                row[winner] += 1;
            }
        }

        // labels are ascending, so ties go to the smaller label
        Ok(votes
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = self.labels[0];
                for &label in &self.labels[1..] {
                    if row[label] > row[best] {
                        best = label;
                    }
                }
                best
            })
            .collect())
    }
}

impl Learner for SvmParams {
    type Model = SvmModel;

    fn name(&self) -> &'static str {
        "support vector machine"
    }

    fn learn(&self, dataset: &Dataset<f64, usize, Ix1>) -> Result<SvmModel> {
        self.fit(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::{SvmKernel, SvmParams, SvmType, SvmValidParams};
    use crate::error::{ClassifierError, Result};
    use crate::learners::{ClassModel, Learner};
    use approx::assert_abs_diff_eq;
    use linfa::prelude::*;
    use linfa::ParamGuard;
    use ndarray::{Array1, Array2};

    /// `n_classes` blobs of six points each, spread along a line
    fn blobs(n_classes: usize) -> Dataset<f64, usize, ndarray::Ix1> {
        let offsets = [(0.0, 0.0), (0.3, 0.1), (-0.2, 0.3), (0.1, -0.3), (-0.3, -0.1), (0.2, 0.2)];
        let mut records = Vec::new();
        let mut targets = Vec::new();
        for class in 0..n_classes {
            for (dx, dy) in &offsets {
                records.push([class as f64 * 5.0 + dx, (class % 2) as f64 * 5.0 + dy]);
                targets.push(class);
            }
        }

        let records = Array2::from_shape_fn((records.len(), 2), |(i, j)| records[i][j]);
        DatasetBase::new(records, Array1::from(targets))
    }

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<SvmParams>();
        has_autotraits::<SvmValidParams>();
        has_autotraits::<SvmKernel>();
        has_autotraits::<SvmType>();
    }

    #[test]
    fn defaults() {
        let params = SvmParams::new().check().unwrap();

        assert_eq!(params.kernel(), SvmKernel::Rbf);
        assert_eq!(params.svm_type(), SvmType::Nu);
        assert_abs_diff_eq!(params.nu(), 0.5);
        assert_abs_diff_eq!(params.c(), 1.0);
        assert_abs_diff_eq!(params.degree(), 3.0);
        assert_abs_diff_eq!(params.coef(), 0.0);
        assert_abs_diff_eq!(params.gamma(4), 0.25);
    }

    #[test]
    fn invalid_params() {
        for params in vec![
            SvmParams::new().nu(0.0),
            SvmParams::new().nu(1.5),
            SvmParams::new().c(-1.0),
            SvmParams::new().gamma(0.0),
            SvmParams::new().degree(0.5),
        ] {
            assert!(matches!(
                params.check(),
                Err(ClassifierError::Parameters(_))
            ));
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!("RBF".parse::<SvmKernel>().unwrap(), SvmKernel::Rbf);
        assert_eq!("Poly".parse::<SvmKernel>().unwrap(), SvmKernel::Poly);
        assert_eq!("NU".parse::<SvmType>().unwrap(), SvmType::Nu);
        assert_eq!("c".parse::<SvmType>().unwrap(), SvmType::C);
        assert!("Sigmoid".parse::<SvmKernel>().is_err());
    }

    fn iris_accuracy(params: SvmParams) -> Result<f64> {
        let dataset = linfa_datasets::iris();
        let model = params.learn(&dataset)?;
        let pred = model.predict_indices(dataset.records())?;

        let correct = pred
            .iter()
            .zip(dataset.targets().iter())
            .filter(|(a, b)| a == b)
            .count();

        Ok(correct as f64 / dataset.nsamples() as f64)
    }

    #[test]
    fn iris_rbf_nu() -> Result<()> {
        assert!(iris_accuracy(SvmParams::new())? > 0.8);
        Ok(())
    }

    #[test]
    fn iris_linear_c() -> Result<()> {
        let params = SvmParams::new()
            .kernel(SvmKernel::Linear)
            .svm_type(SvmType::C)
            .c(10.0);

        assert!(iris_accuracy(params)? > 0.7);
        Ok(())
    }

    #[test]
    fn many_classes_with_defaults() -> Result<()> {
        for n_classes in 2..=6 {
            let dataset = blobs(n_classes);
            let model = SvmParams::new().learn(&dataset)?;

            assert_eq!(model.labels().len(), n_classes);
            assert_eq!(&model.predict_indices(dataset.records())?, dataset.targets());
        }

        Ok(())
    }

    #[test]
    fn unbalanced_pairs_clamp_nu() -> Result<()> {
        let dataset = blobs(2);
        // one row of class 1 against six rows of class 0
        let idx = [0, 1, 2, 3, 4, 5, 6];
        let dataset = DatasetBase::new(
            dataset.records().select(ndarray::Axis(0), &idx),
            dataset.targets().select(ndarray::Axis(0), &idx),
        );

        let model = SvmParams::new().nu(0.9).learn(&dataset)?;
        let pred = model.predict_indices(dataset.records())?;
        assert_eq!(pred.len(), 7);

        Ok(())
    }
}
