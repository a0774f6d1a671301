//! Language detection for extracted text.
//!
//! Detection is best-effort: short inputs, low-confidence results, and
//! detector failures all collapse to [`UNKNOWN`]. Callers never see an error.

use crate::config::LanguageConfig;

/// Tag returned when the language cannot be determined.
pub const UNKNOWN: &str = "unknown";

/// Inputs at or below this many characters (after whitespace normalization)
/// are not classified.
const MIN_DETECT_CHARS: usize = 10;

/// Classifies text into an ISO 639-3 tag (`"eng"`, `"hin"`, `"fra"`, ...).
#[derive(Debug, Clone, Default)]
pub struct LanguageDetector {
    min_confidence: f64,
}

impl LanguageDetector {
    pub fn new(config: &LanguageConfig) -> Self {
        Self {
            min_confidence: config.min_confidence,
        }
    }

    pub fn detect(&self, text: &str) -> String {
        let normalized = normalize_whitespace(text);
        if normalized.chars().count() <= MIN_DETECT_CHARS {
            return UNKNOWN.to_string();
        }

        match whatlang::detect(&normalized) {
            Some(info) if info.confidence() >= self.min_confidence => {
                info.lang().code().to_string()
            }
            Some(info) => {
                tracing::debug!(
                    lang = info.lang().code(),
                    confidence = info.confidence(),
                    "language detection below confidence threshold"
                );
                UNKNOWN.to_string()
            }
            None => UNKNOWN.to_string(),
        }
    }
}

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_inputs_are_unknown() {
        let detector = LanguageDetector::default();
        assert_eq!(detector.detect(""), UNKNOWN);
        assert_eq!(detector.detect("hi"), UNKNOWN);
        // 10 characters after collapsing whitespace
        assert_eq!(detector.detect("  abcde \n\n\t fghi  "), UNKNOWN);
    }

    #[test]
    fn detects_english_prose() {
        let detector = LanguageDetector::default();
        let text = "The tenant agrees to pay the landlord a monthly rent on the first day of each month.";
        assert_eq!(detector.detect(text), "eng");
    }

    #[test]
    fn detects_french_prose() {
        let detector = LanguageDetector::default();
        let text = "Le locataire s'engage à payer le loyer au propriétaire le premier jour de chaque mois.";
        assert_eq!(detector.detect(text), "fra");
    }

    #[test]
    fn strict_threshold_yields_unknown_for_ambiguous_text() {
        let detector = LanguageDetector::new(&LanguageConfig {
            min_confidence: 1.0,
        });
        assert_eq!(detector.detect("12345 67890 12345 67890"), UNKNOWN);
    }

    #[test]
    fn normalizes_whitespace_runs() {
        assert_eq!(normalize_whitespace("  a\n\nb \t c  "), "a b c");
    }
}
