//! Classifies Indonesian news headlines with a pre-trained TF-IDF model.
//!
//! Input is either a typed headline or a news URL. URLs are fetched and the
//! page's headline is classified instead.
//!
//! # Basic Usage
//!
//! ```no_run
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use kabar::{ArticleRetriever, ArtifactStore, Classifier, Pipeline, RetrieverConfig};
//!
//! let artifacts = ArtifactStore::new_default().load_set();
//! let pipeline = Pipeline::new(
//!     Classifier::new(artifacts),
//!     ArticleRetriever::new(RetrieverConfig::default())?,
//! );
//!
//! let analysis = pipeline.run("Harga emas naik tajam hari ini").await?;
//! println!("Predicted category: {}", analysis.result.display_label());
//! for score in &analysis.result.probabilities {
//!     println!("{}: {:.2}%", score.label, score.probability * 100.0);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Artifacts
//!
//! The model and vectorizer are JSON exports of a fitted scikit-learn
//! `TfidfVectorizer` and a `MultinomialNB`, `ComplementNB` or
//! `LogisticRegression` estimator. They are loaded once and shared read-only.

pub mod artifacts;
pub mod classifier;
pub mod config;
pub mod pipeline;
pub mod report;
pub mod retriever;

pub use artifacts::{ArtifactError, ArtifactSet, ArtifactStore, Artifacts, DigestCheck};
pub use classifier::{
    classify, CategoryScore, ClassificationResult, Classifier, ClassifierError, ClassifierInfo,
    ClassifierModel, TfidfVectorizer,
};
pub use config::{ArtifactPaths, KabarConfig, RetrieverConfig};
pub use pipeline::{looks_like_url, Analysis, InputSource, Pipeline, PipelineError};
pub use retriever::{ArticleRetriever, ArticleSource, ExtractionSource, RetrievalResult};

pub fn init_logger() {
    env_logger::init();
}
