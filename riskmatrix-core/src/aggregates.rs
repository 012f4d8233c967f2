//! Aggregation views for dashboards
//!
//! Computes derived aggregates from combined records without modifying them.
//!
//! Global invariants enforced:
//! - Aggregates are strictly derived (never stored, always computed)
//! - Every record is counted exactly once per view

use crate::combine::CombinedRiskRecord;
use crate::risk::RiskBand;
use serde::{Deserialize, Serialize};

/// Record counts per band for one view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BandDistribution {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
    pub critical: usize,
    /// Records whose levels were invalid or missing
    pub not_assessed: usize,
}

impl BandDistribution {
    fn add(&mut self, band: Option<RiskBand>) {
        match band {
            Some(RiskBand::Low) => self.low += 1,
            Some(RiskBand::Medium) => self.medium += 1,
            Some(RiskBand::High) => self.high += 1,
            Some(RiskBand::Critical) => self.critical += 1,
            None => self.not_assessed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high + self.critical + self.not_assessed
    }

    /// High or critical
    pub fn high_plus(&self) -> usize {
        self.high + self.critical
    }
}

/// Inherent vs residual summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MatrixAggregates {
    pub inherent: BandDistribution,
    pub residual: BandDistribution,
    /// Residual value below inherent value
    pub improved: usize,
    pub unchanged: usize,
    /// Residual value above inherent value
    pub worsened: usize,
}

/// Compute band distributions and inherent-to-residual movement
pub fn compute_aggregates(records: &[CombinedRiskRecord]) -> MatrixAggregates {
    let mut aggregates = MatrixAggregates::default();

    for record in records {
        aggregates.inherent.add(record.inherent_band);
        aggregates.residual.add(record.residual_band);

        // Only compare pairs where both halves were scored
        if record.inherent_band.is_some() && record.residual_band.is_some() {
            match record.residual_value.cmp(&record.inherent_value) {
                std::cmp::Ordering::Less => aggregates.improved += 1,
                std::cmp::Ordering::Equal => aggregates.unchanged += 1,
                std::cmp::Ordering::Greater => aggregates.worsened += 1,
            }
        }
    }

    aggregates
}
