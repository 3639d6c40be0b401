use std::collections::{HashMap, HashSet};

use log::debug;
use ndarray::Array1;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::error::ClassifierError;
use super::utils::{normalize_l1, normalize_l2};

/// Token pattern used by scikit-learn when none is exported: words of two or more characters.
pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Row normalisation applied after weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

/// On-disk form of a fitted TF-IDF vectorizer.
///
/// Field names follow the attributes of scikit-learn's `TfidfVectorizer`
/// so an export script can dump them as they are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorizerSpec {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f64>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub stop_words: Vec<String>,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_true")]
    pub use_idf: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// A fitted, immutable text-to-feature transformer.
///
/// `transform` reproduces the scikit-learn pipeline: optional lowercasing,
/// regex tokenisation, stop-word removal, word n-grams, term counting over the
/// fixed vocabulary, optional sublinear tf, idf weighting and row normalisation.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Array1<f64>,
    lowercase: bool,
    token_re: Regex,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    sublinear_tf: bool,
    use_idf: bool,
    norm: Option<Norm>,
}

impl TfidfVectorizer {
    /// Validates an exported vectorizer and compiles its token pattern.
    pub fn from_spec(spec: VectorizerSpec) -> Result<Self, ClassifierError> {
        let width = spec.idf.len();
        if width == 0 {
            return Err(ClassifierError::InvalidArtifact("vectorizer has an empty idf vector".into()));
        }
        if spec.vocabulary.len() != width {
            return Err(ClassifierError::InvalidArtifact(format!(
                "vocabulary has {} terms but idf has {} entries",
                spec.vocabulary.len(),
                width
            )));
        }
        if let Some((term, &idx)) = spec.vocabulary.iter().find(|(_, &idx)| idx >= width) {
            return Err(ClassifierError::InvalidArtifact(format!(
                "term '{}' maps to column {} outside 0..{}",
                term, idx, width
            )));
        }
        let distinct: HashSet<usize> = spec.vocabulary.values().copied().collect();
        if distinct.len() != width {
            return Err(ClassifierError::InvalidArtifact(
                "vocabulary maps several terms to the same column".into(),
            ));
        }
        if spec.idf.iter().any(|v| !v.is_finite()) {
            return Err(ClassifierError::InvalidArtifact("idf contains non-finite values".into()));
        }
        let (min_n, max_n) = spec.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(ClassifierError::InvalidArtifact(format!(
                "invalid ngram_range ({}, {})",
                min_n, max_n
            )));
        }
        let token_re = Regex::new(&spec.token_pattern).map_err(|e| {
            ClassifierError::InvalidArtifact(format!("invalid token_pattern: {}", e))
        })?;

        Ok(Self {
            vocabulary: spec.vocabulary,
            idf: Array1::from(spec.idf),
            lowercase: spec.lowercase,
            token_re,
            ngram_range: spec.ngram_range,
            stop_words: spec.stop_words.into_iter().collect(),
            sublinear_tf: spec.sublinear_tf,
            use_idf: spec.use_idf,
            norm: spec.norm,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, ClassifierError> {
        let spec: VectorizerSpec = serde_json::from_str(raw)
            .map_err(|e| ClassifierError::InvalidArtifact(format!("vectorizer json: {}", e)))?;
        Self::from_spec(spec)
    }

    /// Number of columns in every transformed row.
    pub fn num_features(&self) -> usize {
        self.idf.len()
    }

    pub fn contains_term(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    /// Splits text into the terms the vocabulary was fitted on, n-grams included.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let prepared = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<&str> = self
            .token_re
            .find_iter(&prepared)
            .map(|m| m.as_str())
            .filter(|t| !self.stop_words.contains(*t))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        if min_n == 1 && max_n == 1 {
            return tokens.into_iter().map(str::to_string).collect();
        }

        let mut terms = Vec::new();
        for n in min_n..=max_n.min(tokens.len()) {
            for window in tokens.windows(n) {
                terms.push(window.join(" "));
            }
        }
        terms
    }

    /// Transforms a single document into its weighted feature row.
    pub fn transform(&self, text: &str) -> Array1<f64> {
        let mut row = Array1::<f64>::zeros(self.num_features());
        let mut hits = 0usize;
        for term in self.analyze(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                row[idx] += 1.0;
                hits += 1;
            }
        }
        debug!("Vectorized text: {} vocabulary hits over {} columns", hits, row.len());

        if self.sublinear_tf {
            row.mapv_inplace(|tf| if tf > 0.0 { 1.0 + tf.ln() } else { 0.0 });
        }
        if self.use_idf {
            row *= &self.idf;
        }
        match self.norm {
            Some(Norm::L2) => normalize_l2(&mut row),
            Some(Norm::L1) => normalize_l1(&mut row),
            None => {}
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(terms: &[&str]) -> VectorizerSpec {
        VectorizerSpec {
            vocabulary: terms
                .iter()
                .enumerate()
                .map(|(i, t)| (t.to_string(), i))
                .collect(),
            idf: vec![1.0; terms.len()],
            lowercase: true,
            token_pattern: default_token_pattern(),
            ngram_range: (1, 1),
            stop_words: Vec::new(),
            sublinear_tf: false,
            use_idf: true,
            norm: Some(Norm::L2),
        }
    }

    #[test]
    fn test_default_pattern_drops_single_characters() {
        let vectorizer = TfidfVectorizer::from_spec(spec(&["harga", "emas"])).unwrap();
        assert_eq!(
            vectorizer.analyze("Harga EMAS naik 5 % di-2024"),
            vec!["harga", "emas", "naik", "di", "2024"]
        );
    }

    #[test]
    fn test_transform_is_l2_normalized() {
        let vectorizer = TfidfVectorizer::from_spec(spec(&["harga", "emas", "saham"])).unwrap();
        let row = vectorizer.transform("harga emas harga");
        let norm: f64 = row.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-12);
        assert!(row[0] > row[1]);
        assert_eq!(row[2], 0.0);
    }

    #[test]
    fn test_unknown_text_gives_zero_row() {
        let vectorizer = TfidfVectorizer::from_spec(spec(&["harga"])).unwrap();
        let row = vectorizer.transform("tidak ada kata yang dikenal");
        assert!(row.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_bigrams_and_stop_words() {
        let mut s = spec(&["bank indonesia", "bank"]);
        s.ngram_range = (1, 2);
        s.stop_words = vec!["yang".into()];
        let vectorizer = TfidfVectorizer::from_spec(s).unwrap();
        assert_eq!(
            vectorizer.analyze("Bank yang Indonesia"),
            vec!["bank", "indonesia", "bank indonesia"]
        );
        let row = vectorizer.transform("bank indonesia");
        assert!(row[0] > 0.0 && row[1] > 0.0);
    }

    #[test]
    fn test_sublinear_tf_without_norm() {
        let mut s = spec(&["gol"]);
        s.sublinear_tf = true;
        s.norm = None;
        s.idf = vec![2.0];
        let vectorizer = TfidfVectorizer::from_spec(s).unwrap();
        let row = vectorizer.transform("gol gol gol");
        assert!((row[0] - 2.0 * (1.0 + 3f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_mismatched_idf() {
        let mut s = spec(&["a1", "b2"]);
        s.idf.pop();
        assert!(matches!(
            TfidfVectorizer::from_spec(s),
            Err(ClassifierError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_column() {
        let mut s = spec(&["a1"]);
        s.vocabulary.insert("a1".into(), 4);
        assert!(TfidfVectorizer::from_spec(s).is_err());
    }

    #[test]
    fn test_json_defaults() {
        let vectorizer =
            TfidfVectorizer::from_json(r#"{"vocabulary": {"emas": 0}, "idf": [1.5]}"#).unwrap();
        assert_eq!(vectorizer.num_features(), 1);
        assert!(vectorizer.contains_term("emas"));
        assert!((vectorizer.transform("EMAS")[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_explicit_null_norm() {
        let vectorizer = TfidfVectorizer::from_json(
            r#"{"vocabulary": {"emas": 0}, "idf": [1.5], "norm": null}"#,
        )
        .unwrap();
        assert!((vectorizer.transform("emas emas")[0] - 3.0).abs() < 1e-12);
    }
}
