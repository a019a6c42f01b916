//! Error types in linfa-vision
//!
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClassifierError>;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("invalid parameter {0}")]
    Parameters(String),
    #[error("the classifier has not been trained")]
    NotTrained,
    #[error("no feature rows available")]
    NoData,
    #[error("feature {field} has the non-finite value {value}")]
    NonFinite { field: String, value: f64 },
    #[error("a feature extractor produced no value for the image")]
    MissingFeatures,
    #[error("expected {expected} feature values, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("unknown class {0}")]
    UnknownClass(String),
    #[error("extractor fields {found:?} do not match the stored fields {expected:?}")]
    SchemaMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error(transparent)]
    BaseCrate(#[from] linfa::Error),
    #[error(transparent)]
    NaiveBayes(#[from] linfa_bayes::NaiveBayesError),
    #[error(transparent)]
    Svm(#[from] linfa_svm::SvmError),
    #[error(transparent)]
    NnBuild(#[from] linfa_nn::BuildError),
    #[error(transparent)]
    Nn(#[from] linfa_nn::NnError),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Walk(#[from] walkdir::Error),
}
