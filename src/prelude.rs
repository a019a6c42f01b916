//! linfa-vision prelude.
//!
//! This module contains the most used types, type aliases, traits and
//! functions that you can import easily as a group.
//!

#[doc(no_inline)]
pub use crate::error::{ClassifierError, Result};

#[doc(no_inline)]
pub use crate::classifier::{ImageClassifier, KnnClassifier, NaiveBayesClassifier, SvmClassifier};

#[doc(no_inline)]
pub use crate::collect::{Phase, RunOptions};

#[doc(no_inline)]
pub use crate::display::{PreviewFrame, PreviewSink};

#[doc(no_inline)]
pub use crate::extractor::FeatureExtractor;

#[doc(no_inline)]
pub use crate::learners::{
    ClassModel, KnnDistance, KnnParams, Learner, NaiveBayesParams, SvmKernel, SvmParams, SvmType,
};

#[doc(no_inline)]
pub use crate::metrics::{ConfusionMatrix, Report};

#[doc(no_inline)]
pub use crate::source::{ImageSource, LabeledSource};

#[doc(no_inline)]
pub use crate::table::{FeatureRow, FeatureTable};
