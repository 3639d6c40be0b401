use log::{debug, info};
use serde::Serialize;

use crate::classifier::{ClassificationResult, Classifier, ClassifierError};
use crate::retriever::{ArticleRetriever, ArticleSource, ExtractionSource, RetrievalResult};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Nothing to classify; the user has to type something first
    #[error("Please enter a headline or URL first")]
    EmptyInput,
    /// The URL could not be turned into text
    #[error("{0}")]
    RetrievalFailure(String),
    /// Artifacts never loaded, so no inference is possible
    #[error("Model or vectorizer was not loaded successfully")]
    ModelUnavailable,
    #[error(transparent)]
    Classification(ClassifierError),
}

impl From<ClassifierError> for PipelineError {
    fn from(err: ClassifierError) -> Self {
        match err {
            ClassifierError::ModelUnavailable => PipelineError::ModelUnavailable,
            other => PipelineError::Classification(other),
        }
    }
}

/// Cheap structural check: anything whose trimmed form starts with `http` is
/// treated as a URL, well-formed or not.
pub fn looks_like_url(input: &str) -> bool {
    input.trim().starts_with("http")
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputSource {
    Typed,
    Url {
        url: String,
        extracted_from: ExtractionSource,
    },
}

/// Success payload handed back to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub input: String,
    pub analyzed_text: String,
    pub source: InputSource,
    pub result: ClassificationResult,
}

/// Routes one user input through retrieval (for URLs) and classification.
///
/// Holds no per-request state; every call to [`Pipeline::run`] is independent.
#[derive(Debug, Clone)]
pub struct Pipeline<R = ArticleRetriever> {
    classifier: Classifier,
    retriever: R,
}

impl<R: ArticleSource> Pipeline<R> {
    pub fn new(classifier: Classifier, retriever: R) -> Self {
        Self {
            classifier,
            retriever,
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub async fn run(&self, input: &str) -> Result<Analysis, PipelineError> {
        if input.trim().is_empty() {
            return Err(PipelineError::EmptyInput);
        }

        let (analyzed_text, source) = if looks_like_url(input) {
            let url = input.trim();
            match self.retriever.fetch(url).await {
                RetrievalResult::Extracted { text, source } => (
                    text,
                    InputSource::Url {
                        url: url.to_string(),
                        extracted_from: source,
                    },
                ),
                RetrievalResult::Failed { reason } => {
                    return Err(PipelineError::RetrievalFailure(reason));
                }
            }
        } else {
            debug!("Classifying typed input directly");
            (input.to_string(), InputSource::Typed)
        };

        let result = self.classifier.predict(&analyzed_text)?;
        info!(
            "Classified as '{}' with confidence {:.4}",
            result.label,
            result.confidence()
        );
        Ok(Analysis {
            input: input.to_string(),
            analyzed_text,
            source,
            result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_sniffing() {
        assert!(looks_like_url("http://example.com"));
        assert!(looks_like_url("  https://detik.com/x  "));
        assert!(looks_like_url("httpfoo"));
        assert!(!looks_like_url("Baca di http://example.com"));
        assert!(!looks_like_url("HTTP://EXAMPLE.COM"));
        assert!(!looks_like_url(""));
    }

    #[test]
    fn test_model_unavailable_maps_through() {
        assert!(matches!(
            PipelineError::from(ClassifierError::ModelUnavailable),
            PipelineError::ModelUnavailable
        ));
        assert!(matches!(
            PipelineError::from(ClassifierError::FeatureMismatch { vectorizer: 1, model: 2 }),
            PipelineError::Classification(_)
        ));
    }
}
