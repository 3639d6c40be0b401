use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the directory holding the artifacts.
pub const MODELS_DIR_ENV: &str = "KABAR_MODELS_DIR";
pub const DEFAULT_MODELS_DIR: &str = "models";
pub const MODEL_FILE_NAME: &str = "model_klasifikasi.json";
pub const VECTORIZER_FILE_NAME: &str = "tfidf_vectorizer.json";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Desktop Chrome identification; some news sites reject default client agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36";

/// Where the two artifacts live on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub vectorizer: PathBuf,
}

impl ArtifactPaths {
    pub fn new(model: impl Into<PathBuf>, vectorizer: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            vectorizer: vectorizer.into(),
        }
    }

    /// Uses the default file names inside `dir`.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self::new(dir.join(MODEL_FILE_NAME), dir.join(VECTORIZER_FILE_NAME))
    }

    /// Returns the default artifacts directory
    pub fn default_dir() -> PathBuf {
        match env::var(MODELS_DIR_ENV) {
            Ok(path) if !path.is_empty() => PathBuf::from(path),
            _ => PathBuf::from(DEFAULT_MODELS_DIR),
        }
    }

    /// Explicit file paths win over the directory, which wins over the default.
    pub fn resolve(
        dir: Option<PathBuf>,
        model: Option<PathBuf>,
        vectorizer: Option<PathBuf>,
    ) -> Self {
        let base = Self::from_dir(dir.unwrap_or_else(Self::default_dir));
        Self {
            model: model.unwrap_or(base.model),
            vectorizer: vectorizer.unwrap_or(base.vectorizer),
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self::from_dir(Self::default_dir())
    }
}

/// Settings for the HTTP side of article retrieval.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub timeout: Duration,
    /// Extra attempts after a transport error or 5xx response. Zero means a single attempt.
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 0,
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct KabarConfig {
    pub artifacts: ArtifactPaths,
    pub retriever: RetrieverConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dir_uses_default_names() {
        let paths = ArtifactPaths::from_dir("/srv/kabar");
        assert!(paths.model.ends_with("kabar/model_klasifikasi.json"));
        assert!(paths.vectorizer.ends_with("kabar/tfidf_vectorizer.json"));
    }

    #[test]
    fn test_explicit_paths_win() {
        let paths = ArtifactPaths::resolve(
            Some(PathBuf::from("/srv/kabar")),
            Some(PathBuf::from("/tmp/other.json")),
            None,
        );
        assert_eq!(paths.model, PathBuf::from("/tmp/other.json"));
        assert_eq!(paths.vectorizer, PathBuf::from("/srv/kabar/tfidf_vectorizer.json"));
    }

    #[test]
    fn test_retriever_defaults() {
        let config = RetrieverConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 0);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }
}
