use log::{debug, info};
use serde::Serialize;

use super::error::ClassifierError;
use super::model::ClassifierModel;
use super::vectorizer::TfidfVectorizer;
use super::ClassifierInfo;
use crate::artifacts::ArtifactSet;

/// Probability assigned to a single category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub label: String,
    pub probability: f64,
}

/// Outcome of one inference call.
///
/// `probabilities` holds one entry per model category, sorted from most to
/// least likely. Equal probabilities keep the model's category order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub label: String,
    pub probabilities: Vec<CategoryScore>,
}

impl ClassificationResult {
    /// The maximum probability across the distribution.
    pub fn confidence(&self) -> f64 {
        self.probabilities
            .iter()
            .map(|s| s.probability)
            .fold(0.0, f64::max)
    }

    pub fn probability_of(&self, label: &str) -> Option<f64> {
        self.probabilities
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.probability)
    }

    /// Label as shown to the user.
    pub fn display_label(&self) -> String {
        self.label.to_uppercase()
    }
}

/// Vectorizes `text` and runs both predict operations of `model` on the same row.
pub fn classify(
    text: &str,
    vectorizer: &TfidfVectorizer,
    model: &ClassifierModel,
) -> Result<ClassificationResult, ClassifierError> {
    if vectorizer.num_features() != model.num_features() {
        return Err(ClassifierError::FeatureMismatch {
            vectorizer: vectorizer.num_features(),
            model: model.num_features(),
        });
    }

    let features = vectorizer.transform(text);
    let label = model.predict(&features).to_string();
    let proba = model.predict_proba(&features);

    let mut probabilities: Vec<CategoryScore> = model
        .classes()
        .iter()
        .zip(proba.iter())
        .map(|(label, &probability)| CategoryScore {
            label: label.clone(),
            probability,
        })
        .collect();
    // sort_by is stable, so ties keep model order
    probabilities.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    debug!("Predicted '{}' over {} categories", label, probabilities.len());
    Ok(ClassificationResult {
        label,
        probabilities,
    })
}

/// The classification engine bound to whatever the artifact store produced.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use kabar::{ArtifactPaths, ArtifactStore, Classifier};
///
/// let store = ArtifactStore::new(ArtifactPaths::from_dir("models"));
/// let classifier = Classifier::new(store.load_set());
/// let result = classifier.predict("Harga emas naik tajam hari ini")?;
/// println!("{} ({:.2}%)", result.display_label(), result.confidence() * 100.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    artifacts: ArtifactSet,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Classifier>();
    }
};

impl Classifier {
    pub fn new(artifacts: ArtifactSet) -> Self {
        if let ArtifactSet::Loaded(loaded) = &artifacts {
            info!(
                "Classifier ready: {} categories, {} features",
                loaded.model().classes().len(),
                loaded.vectorizer().num_features()
            );
        }
        Self { artifacts }
    }

    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.artifacts, ArtifactSet::Loaded(_))
    }

    /// Returns information about the loaded artifacts, if any.
    pub fn info(&self) -> Option<ClassifierInfo> {
        match &self.artifacts {
            ArtifactSet::Loaded(loaded) => Some(ClassifierInfo {
                model_path: loaded.model_path().to_path_buf(),
                vectorizer_path: loaded.vectorizer_path().to_path_buf(),
                num_classes: loaded.model().classes().len(),
                class_labels: loaded.model().classes().to_vec(),
                num_features: loaded.vectorizer().num_features(),
            }),
            ArtifactSet::NotLoaded { .. } => None,
        }
    }

    /// Predicts the category of `text`.
    ///
    /// Fails with [`ClassifierError::ModelUnavailable`] when the artifacts did
    /// not load; nothing is vectorized in that case.
    pub fn predict(&self, text: &str) -> Result<ClassificationResult, ClassifierError> {
        match &self.artifacts {
            ArtifactSet::Loaded(loaded) => classify(text, loaded.vectorizer(), loaded.model()),
            ArtifactSet::NotLoaded { .. } => Err(ClassifierError::ModelUnavailable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{ModelSpec, MultiClass, VectorizerSpec};

    fn vectorizer(terms: &[&str]) -> TfidfVectorizer {
        TfidfVectorizer::from_spec(VectorizerSpec {
            vocabulary: terms
                .iter()
                .enumerate()
                .map(|(i, t)| (t.to_string(), i))
                .collect(),
            idf: vec![1.0; terms.len()],
            lowercase: true,
            token_pattern: crate::classifier::DEFAULT_TOKEN_PATTERN.into(),
            ngram_range: (1, 1),
            stop_words: vec![],
            sublinear_tf: false,
            use_idf: true,
            norm: None,
        })
        .unwrap()
    }

    fn uniform_model(classes: &[&str], width: usize) -> ClassifierModel {
        ClassifierModel::from_spec(ModelSpec::LogisticRegression {
            classes: classes.iter().map(|c| c.to_string()).collect(),
            coef: vec![vec![0.0; width]; classes.len()],
            intercept: vec![0.0; classes.len()],
            multi_class: MultiClass::default(),
        })
        .unwrap()
    }

    #[test]
    fn test_ties_keep_model_order() {
        let result = classify("apa saja", &vectorizer(&["emas"]), &uniform_model(&["c", "a", "b"], 1))
            .unwrap();
        let order: Vec<_> = result.probabilities.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(result.label, "c");
        assert!((result.confidence() - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_feature_mismatch_is_an_error() {
        let result = classify("emas", &vectorizer(&["emas", "saham"]), &uniform_model(&["a"], 1));
        assert!(matches!(
            result,
            Err(ClassifierError::FeatureMismatch { vectorizer: 2, model: 1 })
        ));
    }

    #[test]
    fn test_not_loaded_is_unavailable() {
        let classifier = Classifier::new(ArtifactSet::NotLoaded {
            reason: "missing".into(),
        });
        assert!(!classifier.is_loaded());
        assert!(classifier.info().is_none());
        assert!(matches!(
            classifier.predict("Harga emas"),
            Err(ClassifierError::ModelUnavailable)
        ));
    }

    #[test]
    fn test_display_label_is_uppercase() {
        let result = ClassificationResult {
            label: "olahraga".into(),
            probabilities: vec![CategoryScore {
                label: "olahraga".into(),
                probability: 1.0,
            }],
        };
        assert_eq!(result.display_label(), "OLAHRAGA");
        assert_eq!(result.probability_of("olahraga"), Some(1.0));
        assert_eq!(result.probability_of("politik"), None);
    }
}
