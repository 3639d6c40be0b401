/// Represents the different types of errors that can occur in the headline classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    /// Inference was requested but the model or vectorizer never loaded
    #[error("Model or vectorizer was not loaded successfully")]
    ModelUnavailable,
    /// The vectorizer and the model disagree on the feature width
    #[error("Feature width mismatch: vectorizer produces {vectorizer} columns, model expects {model}")]
    FeatureMismatch { vectorizer: usize, model: usize },
    /// An artifact parsed but its contents are not a usable fitted object
    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),
}
