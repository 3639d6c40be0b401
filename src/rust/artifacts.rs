use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::classifier::{ClassifierError, ClassifierModel, TfidfVectorizer};
use crate::config::ArtifactPaths;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// The file is absent, unreadable, or does not hold a usable fitted artifact.
    #[error("Artifact missing or unreadable at {}: {reason}", .path.display())]
    ArtifactMissing { path: PathBuf, reason: String },
}

impl ArtifactError {
    fn missing(path: &Path, reason: impl ToString) -> Self {
        ArtifactError::ArtifactMissing {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            ArtifactError::ArtifactMissing { path, .. } => path,
        }
    }
}

/// A loaded model and vectorizer pair that agree on the feature width.
#[derive(Debug)]
pub struct Artifacts {
    model_path: PathBuf,
    vectorizer_path: PathBuf,
    model: ClassifierModel,
    vectorizer: TfidfVectorizer,
}

impl Artifacts {
    pub fn new(
        paths: &ArtifactPaths,
        model: ClassifierModel,
        vectorizer: TfidfVectorizer,
    ) -> Result<Self, ClassifierError> {
        if model.num_features() != vectorizer.num_features() {
            return Err(ClassifierError::FeatureMismatch {
                vectorizer: vectorizer.num_features(),
                model: model.num_features(),
            });
        }
        Ok(Self {
            model_path: paths.model.clone(),
            vectorizer_path: paths.vectorizer.clone(),
            model,
            vectorizer,
        })
    }

    pub fn model(&self) -> &ClassifierModel {
        &self.model
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn vectorizer_path(&self) -> &Path {
        &self.vectorizer_path
    }

    /// Category labels known to the model, in model order.
    pub fn categories(&self) -> &[String] {
        self.model.classes()
    }
}

/// Load state of the artifacts, decided once at startup.
#[derive(Debug, Clone)]
pub enum ArtifactSet {
    NotLoaded { reason: String },
    Loaded(Arc<Artifacts>),
}

impl ArtifactSet {
    pub fn categories(&self) -> Option<&[String]> {
        match self {
            ArtifactSet::Loaded(artifacts) => Some(artifacts.categories()),
            ArtifactSet::NotLoaded { .. } => None,
        }
    }
}

fn unreadable(path: &Path, e: io::Error) -> ArtifactError {
    match e.kind() {
        io::ErrorKind::NotFound => ArtifactError::missing(path, "file not found"),
        _ => ArtifactError::missing(path, e),
    }
}

fn read_artifact(path: &Path) -> Result<String, ArtifactError> {
    log::info!("Reading artifact {:?}", path);
    let raw = fs::read_to_string(path).map_err(|e| unreadable(path, e))?;
    log::info!("Read {} bytes from {:?}", raw.len(), path);
    Ok(raw)
}

/// Loads the fitted model and vectorizer from disk.
///
/// Any failure, including malformed contents, is reported as
/// [`ArtifactError::ArtifactMissing`] naming the offending file.
pub fn load(
    model_path: &Path,
    vectorizer_path: &Path,
) -> Result<(ClassifierModel, TfidfVectorizer), ArtifactError> {
    let model = ClassifierModel::from_json(&read_artifact(model_path)?)
        .map_err(|e| ArtifactError::missing(model_path, e))?;
    let vectorizer = TfidfVectorizer::from_json(&read_artifact(vectorizer_path)?)
        .map_err(|e| ArtifactError::missing(vectorizer_path, e))?;
    Ok((model, vectorizer))
}

/// Lowercase hex SHA-256 of a file's contents.
pub fn file_digest(path: &Path) -> Result<String, ArtifactError> {
    let bytes = fs::read(path).map_err(|e| unreadable(path, e))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let hash = format!("{:x}", hasher.finalize());
    log::debug!("Calculated hash for {:?}: {}", path, hash);
    Ok(hash)
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    paths: ArtifactPaths,
}

impl ArtifactStore {
    /// Creates a store over the default artifacts directory
    pub fn new_default() -> Self {
        Self::new(ArtifactPaths::default())
    }

    pub fn new(paths: ArtifactPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    pub fn is_present(&self) -> bool {
        let model_exists = self.paths.model.exists();
        let vectorizer_exists = self.paths.vectorizer.exists();
        log::debug!("Model path: {:?} (exists: {})", self.paths.model, model_exists);
        log::debug!("Vectorizer path: {:?} (exists: {})", self.paths.vectorizer, vectorizer_exists);
        model_exists && vectorizer_exists
    }

    pub fn load(&self) -> Result<Artifacts, ArtifactError> {
        let (model, vectorizer) = load(&self.paths.model, &self.paths.vectorizer)?;
        let artifacts = Artifacts::new(&self.paths, model, vectorizer)
            .map_err(|e| ArtifactError::missing(&self.paths.model, e))?;
        log::info!(
            "Artifacts loaded: {} categories, {} features",
            artifacts.categories().len(),
            artifacts.vectorizer().num_features()
        );
        Ok(artifacts)
    }

    /// Loads once and records the outcome; a failure becomes `NotLoaded`.
    pub fn load_set(&self) -> ArtifactSet {
        match self.load() {
            Ok(artifacts) => ArtifactSet::Loaded(Arc::new(artifacts)),
            Err(e) => {
                log::error!("Failed to load artifacts: {}", e);
                ArtifactSet::NotLoaded {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Hashes `path` once and, when a checksum is published, compares against it.
    pub fn check_file(&self, path: &Path, expected_hash: Option<&str>) -> Result<DigestCheck, ArtifactError> {
        let digest = file_digest(path)?;
        log::info!("Calculated hash: {}", digest);
        let matches = expected_hash.map(|expected| {
            log::info!("Expected hash:   {}", expected);
            digest.eq_ignore_ascii_case(expected.trim())
        });
        Ok(DigestCheck {
            path: path.to_path_buf(),
            digest,
            matches,
        })
    }

    /// Compares a file against a published checksum; the hex case is ignored.
    pub fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<bool, ArtifactError> {
        Ok(self.check_file(path, Some(expected_hash))?.matches == Some(true))
    }
}

/// SHA-256 of one artifact file, plus the comparison outcome when a checksum was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestCheck {
    pub path: PathBuf,
    pub digest: String,
    pub matches: Option<bool>,
}
