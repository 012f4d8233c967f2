//! Risk band classification
//!
//! Global invariants enforced:
//! - Every risk value maps to exactly one band
//! - Band order is monotonic in the risk value

use crate::matrix::CellIndex;
use crate::normalize::LevelIndex;
use serde::{Deserialize, Serialize};

/// Risk band classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,      // <= 5
    Medium,   // 6-10
    High,     // 11-15
    Critical, // >= 16
}

impl RiskBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Medium => "medium",
            RiskBand::High => "high",
            RiskBand::Critical => "critical",
        }
    }

    /// Label shown on dashboards and exports
    pub fn label(&self) -> &'static str {
        match self {
            RiskBand::Low => "Bajo",
            RiskBand::Medium => "Medio",
            RiskBand::High => "Alto",
            RiskBand::Critical => "Crítico",
        }
    }
}

impl std::fmt::Display for RiskBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lowest risk value of each band above Low
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandThresholds {
    pub medium: u32,
    pub high: u32,
    pub critical: u32,
}

impl Default for BandThresholds {
    fn default() -> Self {
        BandThresholds {
            medium: 6,
            high: 11,
            critical: 16,
        }
    }
}

/// Classify a risk value with the default thresholds
pub fn classify(value: u32) -> RiskBand {
    classify_with_thresholds(value, &BandThresholds::default())
}

/// Classify a risk value with custom thresholds
pub fn classify_with_thresholds(value: u32, thresholds: &BandThresholds) -> RiskBand {
    if value < thresholds.medium {
        RiskBand::Low
    } else if value < thresholds.high {
        RiskBand::Medium
    } else if value < thresholds.critical {
        RiskBand::High
    } else {
        RiskBand::Critical
    }
}

/// Scored position of one observation in the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RiskScore {
    pub probability_index: usize,
    pub impact_index: usize,
    pub value: u32,
    pub band: RiskBand,
}

impl RiskScore {
    pub fn from_cell(cell: CellIndex, thresholds: &BandThresholds) -> Self {
        let value = cell.value();
        RiskScore {
            probability_index: cell.probability,
            impact_index: cell.impact,
            value,
            band: classify_with_thresholds(value, thresholds),
        }
    }

    pub fn cell(&self) -> CellIndex {
        CellIndex::new(self.probability_index, self.impact_index)
    }
}

/// Score a pair of normalized levels.
///
/// Returns `None` when either level is invalid; missing data is never
/// reported as a Low risk.
pub fn assess(
    probability: LevelIndex,
    impact: LevelIndex,
    thresholds: &BandThresholds,
) -> Option<RiskScore> {
    let cell = CellIndex::new(probability.index()?, impact.index()?);
    Some(RiskScore::from_cell(cell, thresholds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(1), RiskBand::Low);
        assert_eq!(classify(5), RiskBand::Low);
        assert_eq!(classify(6), RiskBand::Medium);
        assert_eq!(classify(10), RiskBand::Medium);
        assert_eq!(classify(11), RiskBand::High);
        assert_eq!(classify(15), RiskBand::High);
        assert_eq!(classify(16), RiskBand::Critical);
        assert_eq!(classify(25), RiskBand::Critical);
    }

    #[test]
    fn test_classify_extremes() {
        assert_eq!(classify(0), RiskBand::Low);
        assert_eq!(classify(u32::MAX), RiskBand::Critical);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let mut previous = RiskBand::Low;
        for value in 0..=30 {
            let band = classify(value);
            assert!(band >= previous, "band dropped at value {}", value);
            previous = band;
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = BandThresholds {
            medium: 4,
            high: 9,
            critical: 20,
        };
        assert_eq!(classify_with_thresholds(3, &thresholds), RiskBand::Low);
        assert_eq!(classify_with_thresholds(4, &thresholds), RiskBand::Medium);
        assert_eq!(classify_with_thresholds(16, &thresholds), RiskBand::High);
        assert_eq!(classify_with_thresholds(20, &thresholds), RiskBand::Critical);
    }

    #[test]
    fn test_assess_valid_levels() {
        let score = assess(
            LevelIndex::Valid(2),
            LevelIndex::Valid(3),
            &BandThresholds::default(),
        )
        .unwrap();
        assert_eq!(score.value, 12);
        assert_eq!(score.band, RiskBand::High);
        assert_eq!(score.cell(), CellIndex::new(2, 3));
    }

    #[test]
    fn test_assess_invalid_level_is_not_low() {
        let thresholds = BandThresholds::default();
        assert!(assess(LevelIndex::Invalid, LevelIndex::Valid(0), &thresholds).is_none());
        assert!(assess(LevelIndex::Valid(0), LevelIndex::Invalid, &thresholds).is_none());
    }

    #[test]
    fn test_band_strings() {
        assert_eq!(RiskBand::Critical.as_str(), "critical");
        assert_eq!(RiskBand::Medium.label(), "Medio");
        assert_eq!(RiskBand::High.to_string(), "high");
    }
}
