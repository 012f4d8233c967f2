//! Display labels for probability and impact levels

use crate::matrix::MATRIX_SIZE;
use crate::normalize::LevelIndex;

/// Marker rendered for invalid levels and missing residual halves
pub const NOT_APPLICABLE: &str = "N/A";

/// Name used when an inherent observation has no description
pub const DEFAULT_PLACEHOLDER_NAME: &str = "Riesgo sin descripción";

pub const DEFAULT_PROBABILITY_LABELS: [&str; MATRIX_SIZE] =
    ["Muy bajo", "Bajo", "Medio", "Alto", "Muy alto"];

pub const DEFAULT_IMPACT_LABELS: [&str; MATRIX_SIZE] = [
    "Insignificante",
    "Menor",
    "Moderado",
    "Mayor",
    "Catastrófico",
];

/// Labels for each axis, indexed by zero-based level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelLabels {
    pub probability: [String; MATRIX_SIZE],
    pub impact: [String; MATRIX_SIZE],
}

impl Default for LevelLabels {
    fn default() -> Self {
        LevelLabels {
            probability: DEFAULT_PROBABILITY_LABELS.map(String::from),
            impact: DEFAULT_IMPACT_LABELS.map(String::from),
        }
    }
}

impl LevelLabels {
    pub fn probability_label(&self, level: LevelIndex) -> &str {
        match level {
            LevelIndex::Valid(index) => &self.probability[index.min(MATRIX_SIZE - 1)],
            LevelIndex::Invalid => NOT_APPLICABLE,
        }
    }

    pub fn impact_label(&self, level: LevelIndex) -> &str {
        match level {
            LevelIndex::Valid(index) => &self.impact[index.min(MATRIX_SIZE - 1)],
            LevelIndex::Invalid => NOT_APPLICABLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_labels() {
        let labels = LevelLabels::default();
        assert_eq!(labels.probability_label(LevelIndex::Valid(2)), "Medio");
        assert_eq!(labels.impact_label(LevelIndex::Valid(3)), "Mayor");
        assert_eq!(labels.impact_label(LevelIndex::Valid(4)), "Catastrófico");
    }

    #[test]
    fn test_invalid_is_not_applicable() {
        let labels = LevelLabels::default();
        assert_eq!(labels.probability_label(LevelIndex::Invalid), NOT_APPLICABLE);
        assert_eq!(labels.impact_label(LevelIndex::Invalid), NOT_APPLICABLE);
    }
}
