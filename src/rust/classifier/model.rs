use std::collections::HashSet;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::{argmax, sigmoid, softmax};

/// On-disk form of a fitted linear classifier, tagged by estimator kind.
///
/// Weights are stored row-per-class with one column per vectorizer feature,
/// the same layout scikit-learn uses for `feature_log_prob_` and `coef_`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    MultinomialNb {
        classes: Vec<String>,
        class_log_prior: Vec<f64>,
        feature_log_prob: Vec<Vec<f64>>,
    },
    ComplementNb {
        classes: Vec<String>,
        #[serde(default)]
        class_log_prior: Vec<f64>,
        feature_log_prob: Vec<Vec<f64>>,
    },
    LogisticRegression {
        classes: Vec<String>,
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
        #[serde(default)]
        multi_class: MultiClass,
    },
}

/// Multi-class scheme a logistic regression was fitted with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiClass {
    #[default]
    Multinomial,
    /// One binary problem per class (`liblinear`, `multi_class="ovr"`)
    Ovr,
}

/// How decision scores become a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    /// Joint log-likelihoods, normalised with log-sum-exp
    NaiveBayes,
    /// A single logistic row for a two-class problem
    Binomial,
    /// One logistic row per class, normalised with softmax
    Multinomial,
    /// One logistic row per class, per-class sigmoids rescaled to sum to one
    OneVsRest,
}

/// A fitted, immutable linear classifier over TF-IDF rows.
#[derive(Debug, Clone)]
pub struct ClassifierModel {
    classes: Vec<String>,
    kind: ModelKind,
    weights: Array2<f64>,
    bias: Array1<f64>,
}

impl ClassifierModel {
    pub fn from_spec(spec: ModelSpec) -> Result<Self, ClassifierError> {
        let (classes, kind, rows, bias) = match spec {
            ModelSpec::MultinomialNb {
                classes,
                class_log_prior,
                feature_log_prob,
            } => (classes, ModelKind::NaiveBayes, feature_log_prob, class_log_prior),
            ModelSpec::ComplementNb {
                classes,
                class_log_prior,
                feature_log_prob,
            } => {
                // The prior only takes part when there is a single class.
                let bias = if classes.len() == 1 && !class_log_prior.is_empty() {
                    class_log_prior
                } else {
                    vec![0.0; feature_log_prob.len()]
                };
                (classes, ModelKind::NaiveBayes, feature_log_prob, bias)
            }
            ModelSpec::LogisticRegression {
                classes,
                coef,
                intercept,
                multi_class,
            } => {
                let kind = match multi_class {
                    _ if classes.len() == 2 && coef.len() == 1 => ModelKind::Binomial,
                    MultiClass::Multinomial => ModelKind::Multinomial,
                    MultiClass::Ovr => ModelKind::OneVsRest,
                };
                (classes, kind, coef, intercept)
            }
        };

        Self::validate(&classes, kind, &rows, &bias)?;

        let width = rows[0].len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let weights = Array2::from_shape_vec((flat.len() / width, width), flat)
            .map_err(|e| ClassifierError::InvalidArtifact(format!("weight matrix: {}", e)))?;

        Ok(Self {
            classes,
            kind,
            weights,
            bias: Array1::from(bias),
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, ClassifierError> {
        let spec: ModelSpec = serde_json::from_str(raw)
            .map_err(|e| ClassifierError::InvalidArtifact(format!("model json: {}", e)))?;
        Self::from_spec(spec)
    }

    fn validate(
        classes: &[String],
        kind: ModelKind,
        rows: &[Vec<f64>],
        bias: &[f64],
    ) -> Result<(), ClassifierError> {
        if classes.is_empty() {
            return Err(ClassifierError::InvalidArtifact("model has no classes".into()));
        }
        let unique: HashSet<&String> = classes.iter().collect();
        if unique.len() != classes.len() {
            return Err(ClassifierError::InvalidArtifact("model has duplicate class labels".into()));
        }
        let expected_rows = match kind {
            ModelKind::Binomial => 1,
            _ => classes.len(),
        };
        if rows.len() != expected_rows {
            return Err(ClassifierError::InvalidArtifact(format!(
                "weight matrix has {} rows, expected {}",
                rows.len(),
                expected_rows
            )));
        }
        if bias.len() != expected_rows {
            return Err(ClassifierError::InvalidArtifact(format!(
                "bias has {} entries, expected {}",
                bias.len(),
                expected_rows
            )));
        }
        let width = rows[0].len();
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return Err(ClassifierError::InvalidArtifact("weight rows have inconsistent width".into()));
        }
        let finite = rows.iter().flatten().chain(bias.iter()).all(|v| v.is_finite());
        if !finite {
            return Err(ClassifierError::InvalidArtifact("model contains non-finite weights".into()));
        }
        Ok(())
    }

    /// Category labels in model order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Number of feature columns the model was fitted on.
    pub fn num_features(&self) -> usize {
        self.weights.ncols()
    }

    /// Raw per-row scores: joint log-likelihoods or logits.
    pub fn decision_function(&self, features: &Array1<f64>) -> Array1<f64> {
        self.weights.dot(features) + &self.bias
    }

    /// Returns the single most likely class label.
    pub fn predict(&self, features: &Array1<f64>) -> &str {
        let scores = self.decision_function(features);
        let idx = match self.kind {
            ModelKind::Binomial => usize::from(scores[0] > 0.0),
            _ => argmax(scores.view()).unwrap_or(0),
        };
        &self.classes[idx]
    }

    /// Returns one probability per class, in model order, summing to one.
    pub fn predict_proba(&self, features: &Array1<f64>) -> Array1<f64> {
        let scores = self.decision_function(features);
        match self.kind {
            ModelKind::Binomial => {
                let positive = sigmoid(scores[0]);
                Array1::from(vec![1.0 - positive, positive])
            }
            ModelKind::OneVsRest => {
                let positive = scores.mapv(sigmoid);
                let total = positive.sum();
                positive / total
            }
            ModelKind::NaiveBayes | ModelKind::Multinomial => softmax(scores.view()),
        }
    }
}
