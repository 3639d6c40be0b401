use std::path::PathBuf;

mod error;
mod model;
mod vectorizer;
#[allow(clippy::module_inception)]
mod classifier;
mod utils;

pub use error::ClassifierError;
pub use model::{ClassifierModel, ModelKind, ModelSpec, MultiClass};
pub use vectorizer::{Norm, TfidfVectorizer, VectorizerSpec, DEFAULT_TOKEN_PATTERN};
pub use classifier::{classify, CategoryScore, ClassificationResult, Classifier};

/// Information about the artifacts a classifier was loaded from
#[derive(Debug, Clone)]
pub struct ClassifierInfo {
    /// Path to the model artifact
    pub model_path: PathBuf,
    /// Path to the vectorizer artifact
    pub vectorizer_path: PathBuf,
    /// Number of categories known to the model
    pub num_classes: usize,
    /// Category labels in model order
    pub class_labels: Vec<String>,
    /// Width of the feature vector
    pub num_features: usize,
}
