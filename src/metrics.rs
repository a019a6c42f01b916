//! Evaluation of trained classifiers
//!
//! Every run reports the share of correctly classified rows. For more than two classes the
//! report also carries a confusion matrix.
use std::fmt;

use ndarray::prelude::*;

/// Confusion matrix for multi-class evaluation
///
/// Rows correspond to the true class and columns to the predicted class. The diagonal entries
/// are correct predictions.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionMatrix {
    matrix: Array2<usize>,
    members: Vec<String>,
}

impl ConfusionMatrix {
    /// Count true and predicted class indices into a matrix over `members`
    ///
    /// Indices outside of `members` are ignored.
    pub fn from_predictions(truth: &[usize], predicted: &[usize], members: &[String]) -> Self {
        let n = members.len();
        let mut matrix = Array2::zeros((n, n));
        for (t, p) in truth.iter().zip(predicted.iter()) {
            if *t < n && *p < n {
                matrix[(*t, *p)] += 1;
            }
        }

        ConfusionMatrix {
            matrix,
            members: members.to_vec(),
        }
    }

    /// Add the counts of another matrix over the same classes
    pub fn merge(&mut self, other: &ConfusionMatrix) {
        self.matrix += &other.matrix;
    }

    /// Number of rows of class `truth` which were predicted as `predicted`
    pub fn get(&self, truth: &str, predicted: &str) -> Option<usize> {
        let t = self.members.iter().position(|m| m == truth)?;
        let p = self.members.iter().position(|m| m == predicted)?;

        Some(self.matrix[(t, p)])
    }

    pub fn matrix(&self) -> &Array2<usize> {
        &self.matrix
    }

    pub fn class_names(&self) -> &[String] {
        &self.members
    }

    /// Number of evaluated rows
    pub fn total(&self) -> usize {
        self.matrix.sum()
    }

    /// Calculate precision for every class
    pub fn precision(&self) -> Array1<f32> {
        let sum = self.matrix.sum_axis(Axis(0));

        self.matrix
            .diag()
            .iter()
            .zip(sum.iter())
            .map(|(a, b)| *a as f32 / *b as f32)
            .collect()
    }

    /// Calculate recall for every class
    pub fn recall(&self) -> Array1<f32> {
        let sum = self.matrix.sum_axis(Axis(1));

        self.matrix
            .diag()
            .iter()
            .zip(sum.iter())
            .map(|(a, b)| *a as f32 / *b as f32)
            .collect()
    }

    /// Return mean accuracy
    pub fn accuracy(&self) -> f32 {
        self.matrix.diag().sum() as f32 / self.matrix.sum() as f32
    }

    /// Return beta=1 score for every class
    pub fn f1_score(&self) -> Array1<f32> {
        let precision = self.precision();
        let recall = self.recall();

        precision
            .iter()
            .zip(recall.iter())
            .map(|(p, r)| 2.0 * (p * r) / (p + r))
            .collect()
    }
}

/// Print the matrix as tab separated table, prefixed by a header of class names
impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "\t{}", self.members.join("\t"))?;

        for (name, row) in self.members.iter().zip(self.matrix.rows()) {
            write!(f, "{}", name)?;
            for count in row {
                write!(f, "\t{}", count)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Result of a training, testing or cross-validation run
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Percentage of correctly classified rows
    pub correct: f64,
    /// Percentage of misclassified rows
    pub incorrect: f64,
    /// Number of rows evaluated
    pub evaluated: usize,
    pub confusion: Option<ConfusionMatrix>,
}

impl Report {
    /// Build a report from the number of correct predictions out of `evaluated`
    pub fn new(correct: usize, evaluated: usize, confusion: Option<ConfusionMatrix>) -> Self {
        let good = 100.0 * correct as f64 / evaluated as f64;

        Report {
            correct: good,
            incorrect: 100.0 * (evaluated - correct) as f64 / evaluated as f64,
            evaluated,
            confusion,
        }
    }

    /// Build a report from predicted and true class indices
    ///
    /// The confusion matrix is kept only for more than two classes.
    pub fn from_predictions(truth: &[usize], predicted: &[usize], members: &[String]) -> Self {
        let correct = truth
            .iter()
            .zip(predicted.iter())
            .filter(|(t, p)| t == p)
            .count();

        let confusion = if members.len() > 2 {
            Some(ConfusionMatrix::from_predictions(truth, predicted, members))
        } else {
            None
        };

        Report::new(correct, truth.len(), confusion)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Correct: {}", self.correct)?;
        writeln!(f, "Incorrect: {}", self.incorrect)?;
        if let Some(confusion) = &self.confusion {
            write!(f, "{}", confusion)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfusionMatrix, Report};
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn members() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn counts() {
        let cm = ConfusionMatrix::from_predictions(
            &[0, 0, 1, 1, 2, 2],
            &[0, 1, 1, 1, 2, 0],
            &members(),
        );

        assert_eq!(cm.matrix(), &array![[1, 1, 0], [0, 2, 0], [1, 0, 1]]);
        assert_eq!(cm.get("a", "b"), Some(1));
        assert_eq!(cm.get("c", "c"), Some(1));
        assert_eq!(cm.get("d", "c"), None);
        assert_eq!(cm.total(), 6);
        assert_abs_diff_eq!(cm.accuracy(), 4.0 / 6.0);
        assert_abs_diff_eq!(cm.recall(), array![0.5, 1.0, 0.5]);
        assert_abs_diff_eq!(cm.precision(), array![0.5, 2.0 / 3.0, 1.0]);
    }

    #[test]
    fn display_layout() {
        let cm = ConfusionMatrix::from_predictions(&[0, 1, 2], &[0, 2, 2], &members());

        assert_eq!(
            cm.to_string(),
            "\ta\tb\tc\na\t1\t0\t0\nb\t0\t0\t1\nc\t0\t0\t1\n"
        );
    }

    #[test]
    fn percentages_sum_to_hundred() {
        let report = Report::from_predictions(&[0, 1, 1, 0, 1, 1, 0], &[0, 1, 0, 0, 1, 1, 1], &[
            "x".into(),
            "y".into(),
        ]);

        assert_eq!(report.evaluated, 7);
        assert_abs_diff_eq!(report.correct + report.incorrect, 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(report.correct, 500.0 / 7.0, epsilon = 1e-9);
        assert!(report.confusion.is_none());
    }

    #[test]
    fn confusion_only_for_many_classes() {
        let report = Report::from_predictions(&[0, 1, 2], &[0, 1, 1], &members());

        assert_eq!(report.confusion.unwrap().get("c", "b"), Some(1));
    }
}
