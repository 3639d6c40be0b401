//! Plain-text and JSON rendering of classification outcomes for the CLI.

use std::fmt;

use crate::pipeline::{Analysis, InputSource};

const BAR_WIDTH: usize = 30;

fn bar(probability: f64) -> String {
    let filled = (probability.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "·".repeat(BAR_WIDTH - filled))
}

/// Human-readable report: analysed text for URLs, the uppercased label with
/// its confidence, then every category from most to least likely.
pub struct TextReport<'a>(pub &'a Analysis);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.0;
        let result = &analysis.result;

        if let InputSource::Url { .. } = analysis.source {
            writeln!(f, "Text analysed from URL: '{}'", analysis.analyzed_text)?;
            writeln!(f)?;
        }
        writeln!(f, "Predicted category: {}", result.display_label())?;
        writeln!(f, "Confidence:         {:.2}%", result.confidence() * 100.0)?;
        writeln!(f)?;
        writeln!(f, "Confidence per category:")?;

        let width = result
            .probabilities
            .iter()
            .map(|s| s.label.chars().count())
            .max()
            .unwrap_or(0);
        for score in &result.probabilities {
            writeln!(
                f,
                "  {:<width$}  {}  {:>6.2}%",
                score.label,
                bar(score.probability),
                score.probability * 100.0,
                width = width
            )?;
        }
        Ok(())
    }
}

pub fn render_text(analysis: &Analysis) -> String {
    TextReport(analysis).to_string()
}

pub fn render_json(analysis: &Analysis) -> serde_json::Result<String> {
    serde_json::to_string_pretty(analysis)
}

struct CategoryList<'a>(&'a [String]);

impl fmt::Display for CategoryList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Available categories:")?;
        for (idx, category) in self.0.iter().enumerate() {
            writeln!(f, "  {:>2}. {}", idx + 1, category)?;
        }
        Ok(())
    }
}

pub fn render_categories(categories: &[String]) -> String {
    CategoryList(categories).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{CategoryScore, ClassificationResult};
    use crate::retriever::ExtractionSource;

    fn analysis(source: InputSource) -> Analysis {
        Analysis {
            input: "https://example.com/berita".into(),
            analyzed_text: "Timnas menang".into(),
            source,
            result: ClassificationResult {
                label: "olahraga".into(),
                probabilities: vec![
                    CategoryScore { label: "olahraga".into(), probability: 0.875 },
                    CategoryScore { label: "ekonomi".into(), probability: 0.125 },
                ],
            },
        }
    }

    #[test]
    fn test_text_report() {
        let text = render_text(&analysis(InputSource::Typed));
        assert!(text.contains("Predicted category: OLAHRAGA"));
        assert!(text.contains("87.50%"));
        assert!(!text.contains("Text analysed from URL"));
        let olahraga = text.find("olahraga ").unwrap();
        let ekonomi = text.find("ekonomi ").unwrap();
        assert!(olahraga < ekonomi);
    }

    #[test]
    fn test_url_report_shows_analysed_text() {
        let text = render_text(&analysis(InputSource::Url {
            url: "https://example.com/berita".into(),
            extracted_from: ExtractionSource::OpenGraph,
        }));
        assert!(text.starts_with("Text analysed from URL: 'Timnas menang'"));
    }

    #[test]
    fn test_json_report() {
        let json = render_json(&analysis(InputSource::Typed)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["result"]["label"], "olahraga");
        assert_eq!(value["source"]["type"], "typed");
        assert_eq!(value["result"]["probabilities"][1]["probability"], 0.125);
    }

    #[test]
    fn test_category_list() {
        let text = render_categories(&["ekonomi".to_string(), "olahraga".to_string()]);
        assert_eq!(text, "Available categories:\n   1. ekonomi\n   2. olahraga\n");
    }

    #[test]
    fn test_bar_is_fixed_width() {
        assert_eq!(bar(0.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(1.0).chars().count(), BAR_WIDTH);
        assert_eq!(bar(0.5).chars().filter(|&c| c == '█').count(), 15);
    }
}
