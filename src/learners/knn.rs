//! k-nearest neighbours
//!
//! Neighbour search is delegated to the KD-tree of `linfa-nn`. A query row is assigned the
//! majority class of its `k` nearest training rows.
use std::str::FromStr;

use linfa::prelude::*;
use linfa::ParamGuard;
use linfa_nn::distance::{Distance, L1Dist, L2Dist, LInfDist};
use linfa_nn::{CommonNearestNeighbour, NearestNeighbour};
use ndarray::{Array1, Array2, Axis, Ix1};
use serde::{Deserialize, Serialize};

use super::{ClassModel, Learner};
use crate::error::{ClassifierError, Result};

/// Distance metric used to find neighbours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnnDistance {
    /// L2 distance
    Euclidean,
    /// L1 distance
    Manhattan,
    /// L-infinity distance, the largest difference in any feature
    Maximal,
    /// L2 distance on features rescaled to the `[0, 1]` range of the training data
    Normalized,
}

impl Default for KnnDistance {
    fn default() -> Self {
        KnnDistance::Normalized
    }
}

impl FromStr for KnnDistance {
    type Err = ClassifierError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "euclidean" => Ok(KnnDistance::Euclidean),
            "manhattan" => Ok(KnnDistance::Manhattan),
            "maximal" => Ok(KnnDistance::Maximal),
            "normalized" => Ok(KnnDistance::Normalized),
            _ => Err(ClassifierError::Parameters(format!(
                "unknown distance metric {}",
                s
            ))),
        }
    }
}

/// Verified hyperparameters of the k-NN learner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnValidParams {
    k: usize,
    distance: KnnDistance,
}

impl KnnValidParams {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn distance(&self) -> KnnDistance {
        self.distance
    }
}

/// Hyperparameters of the k-NN learner
///
/// | Name | Default | Purpose | Range |
/// | :--- | :--- | :--- | :--- |
/// | [k](Self::k) | `1` | Number of neighbours voting on the class | `[1, inf)` |
/// | [distance](Self::distance) | `Normalized` | Metric used to find neighbours | |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnParams(KnnValidParams);

impl KnnParams {
    pub fn new() -> Self {
        KnnParams(KnnValidParams {
            k: 1,
            distance: KnnDistance::default(),
        })
    }

    /// Set the number of neighbours
    pub fn k(mut self, k: usize) -> Self {
        self.0.k = k;
        self
    }

    /// Set the distance metric
    pub fn distance(mut self, distance: KnnDistance) -> Self {
        self.0.distance = distance;
        self
    }
}

impl Default for KnnParams {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamGuard for KnnParams {
    type Checked = KnnValidParams;
    type Error = ClassifierError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        if self.0.k == 0 {
            Err(ClassifierError::Parameters(
                "number of neighbours must be at least 1".to_string(),
            ))
        } else {
            Ok(&self.0)
        }
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

/// Per-feature min-max rescaling
#[derive(Debug, Clone, PartialEq)]
struct MinMax {
    min: Array1<f64>,
    range: Array1<f64>,
}

impl MinMax {
    fn fit(records: &Array2<f64>) -> Self {
        let min = records.fold_axis(Axis(0), f64::INFINITY, |a, b| a.min(*b));
        let max = records.fold_axis(Axis(0), f64::NEG_INFINITY, |a, b| a.max(*b));
        // constant features keep their scale
        let range = (&max - &min).mapv(|r| if r > 0.0 { r } else { 1.0 });

        MinMax { min, range }
    }

    fn transform(&self, records: &Array2<f64>) -> Array2<f64> {
        (records - &self.min) / &self.range
    }
}

/// Fitted k-NN model, it keeps the training rows
#[derive(Debug, Clone, PartialEq)]
pub struct KnnModel {
    records: Array2<f64>,
    labels: Array1<usize>,
    k: usize,
    distance: KnnDistance,
    scaling: Option<MinMax>,
}

impl Fit<Array2<f64>, Array1<usize>, ClassifierError> for KnnValidParams {
    type Object = KnnModel;

    fn fit(&self, dataset: &Dataset<f64, usize, Ix1>) -> Result<KnnModel> {
        let records = dataset.records();
        if records.nrows() == 0 {
            return Err(ClassifierError::Parameters(
                "no training rows".to_string(),
            ));
        }
        if records.ncols() == 0 {
            return Err(ClassifierError::Parameters(
                "records have no features".to_string(),
            ));
        }

        let scaling = match self.distance {
            KnnDistance::Normalized => Some(MinMax::fit(records)),
            _ => None,
        };
        let records = match &scaling {
            Some(scaling) => scaling.transform(records),
            None => records.clone(),
        };

        Ok(KnnModel {
            records,
            labels: dataset.targets().clone(),
            k: self.k,
            distance: self.distance,
            scaling,
        })
    }
}

impl KnnModel {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn distance(&self) -> KnnDistance {
        self.distance
    }

    // The KD-tree borrows the rows it indexes and cannot be stored next to them in the model,
    // so it is built on every call. A batch of rows shares one tree.
    fn vote<D: 'static + Distance<f64>>(
        &self,
        records: &Array2<f64>,
        dist: D,
    ) -> Result<Array1<usize>> {
        let index = CommonNearestNeighbour::KdTree.from_batch(&self.records, dist)?;

        records
            .rows()
            .into_iter()
            .map(|row| -> Result<usize> {
                let neighbours = index.k_nearest(row, self.k)?;
                Ok(majority(neighbours.iter().map(|(_, i)| self.labels[*i])))
            })
            .collect()
    }
}

/// Most frequent label, ties are broken in favour of the label seen first
fn majority<I: Iterator<Item = usize>>(labels: I) -> usize {
    let mut votes: Vec<(usize, usize)> = Vec::new();
    for label in labels {
        match votes.iter_mut().find(|(l, _)| *l == label) {
            Some((_, count)) => *count += 1,
            None => votes.push((label, 1)),
        }
    }

    let mut best: Option<(usize, usize)> = None;
    for (label, count) in votes {
        match best {
            Some((_, c)) if c >= count => {}
            _ => best = Some((label, count)),
        }
    }

    best.map(|(label, _)| label).unwrap_or_default()
}

impl ClassModel for KnnModel {
    fn predict_indices(&self, records: &Array2<f64>) -> Result<Array1<usize>> {
        if records.ncols() != self.records.ncols() {
            return Err(ClassifierError::FieldCount {
                expected: self.records.ncols(),
                found: records.ncols(),
            });
        }

        let scaled;
        let records = match &self.scaling {
            Some(scaling) => {
                scaled = scaling.transform(records);
                &scaled
            }
            None => records,
        };

        match self.distance {
            KnnDistance::Euclidean | KnnDistance::Normalized => self.vote(records, L2Dist),
            KnnDistance::Manhattan => self.vote(records, L1Dist),
            KnnDistance::Maximal => self.vote(records, LInfDist),
        }
    }
}

impl Learner for KnnParams {
    type Model = KnnModel;

    fn name(&self) -> &'static str {
        "k-nearest neighbours"
    }

    fn learn(&self, dataset: &Dataset<f64, usize, Ix1>) -> Result<KnnModel> {
        self.fit(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::{majority, KnnDistance, KnnModel, KnnParams, KnnValidParams};
    use crate::error::{ClassifierError, Result};
    use crate::learners::{ClassModel, Learner};
    use linfa::prelude::*;
    use linfa::ParamGuard;
    use ndarray::array;

    #[test]
    fn autotraits() {
        fn has_autotraits<T: Send + Sync + Sized + Unpin>() {}
        has_autotraits::<KnnParams>();
        has_autotraits::<KnnValidParams>();
        has_autotraits::<KnnModel>();
        has_autotraits::<KnnDistance>();
    }

    #[test]
    fn invalid_k() {
        assert!(matches!(
            KnnParams::new().k(0).check(),
            Err(ClassifierError::Parameters(_))
        ));
        assert!(KnnParams::new().k(3).check().is_ok());
    }

    #[test]
    fn parse_distance() {
        assert_eq!(
            "Manhattan".parse::<KnnDistance>().unwrap(),
            KnnDistance::Manhattan
        );
        assert_eq!(
            "euclidean".parse::<KnnDistance>().unwrap(),
            KnnDistance::Euclidean
        );
        assert!("Hamming".parse::<KnnDistance>().is_err());
    }

    #[test]
    fn vote_ties_go_to_nearest() {
        assert_eq!(majority(vec![2, 1, 1].into_iter()), 1);
        assert_eq!(majority(vec![2, 1, 1, 2].into_iter()), 2);
        assert_eq!(majority(vec![0, 3].into_iter()), 0);
    }

    #[test]
    fn majority_of_neighbours() -> Result<()> {
        let x = array![[0., 0.], [0., 1.], [1., 0.], [10., 10.], [10., 11.]];
        let y = array![0, 0, 0, 1, 1];
        let dataset = DatasetBase::new(x, y);

        let model = KnnParams::new()
            .k(3)
            .distance(KnnDistance::Euclidean)
            .learn(&dataset)?;

        // two of the three nearest rows belong to class 1
        let pred = model.predict_indices(&array![[9., 9.], [0.5, 0.5], [6., 6.]])?;
        assert_eq!(pred, array![1, 0, 1]);

        Ok(())
    }

    #[test]
    fn normalized_distance_rescales_features() -> Result<()> {
        // the second feature dominates unless rescaled
        let x = array![[0., 100.], [1., 150.], [0., 1000.], [1., 0.]];
        let y = array![0, 1, 0, 1];
        let dataset = DatasetBase::new(x, y);
        let query = array![[0.95, 100.]];

        let plain = KnnParams::new()
            .distance(KnnDistance::Euclidean)
            .learn(&dataset)?;
        let normalized = KnnParams::new()
            .distance(KnnDistance::Normalized)
            .learn(&dataset)?;

        assert_eq!(plain.predict_indices(&query)?, array![0]);
        assert_eq!(normalized.predict_indices(&query)?, array![1]);

        Ok(())
    }

    #[test]
    fn manhattan_and_maximal() -> Result<()> {
        let x = array![[0., 0.], [3., 3.]];
        let y = array![0, 1];
        let dataset = DatasetBase::new(x, y);
        let query = array![[2.1, 0.]];

        // L1: 2.1 vs 3.9, L-inf: 2.1 vs 3.0
        for distance in &[KnnDistance::Manhattan, KnnDistance::Maximal] {
            let model = KnnParams::new().distance(*distance).learn(&dataset)?;
            assert_eq!(model.predict_indices(&query)?, array![0]);
        }

        Ok(())
    }

    #[test]
    fn wrong_width() -> Result<()> {
        let dataset = DatasetBase::new(array![[0., 0.], [1., 1.]], array![0, 1]);
        let model = KnnParams::new().learn(&dataset)?;

        assert!(matches!(
            model.predict_indices(&array![[0., 0., 0.]]),
            Err(ClassifierError::FieldCount {
                expected: 2,
                found: 3
            })
        ));

        Ok(())
    }

    #[test]
    fn iris() -> Result<()> {
        let dataset = linfa_datasets::iris();
        let model = KnnParams::new().k(1).learn(&dataset)?;
        let pred = model.predict_indices(dataset.records())?;

        let correct = pred
            .iter()
            .zip(dataset.targets().iter())
            .filter(|(a, b)| a == b)
            .count();
        assert!(correct as f64 / dataset.nsamples() as f64 > 0.95);

        Ok(())
    }
}
