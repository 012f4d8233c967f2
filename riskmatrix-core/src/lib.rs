//! Risk matrix core library - probability x impact scoring, banding and
//! inherent/residual aggregation

#![deny(warnings)]

// Global invariants enforced in this crate:
// - The lookup matrix is a compile-time constant
// - No global mutable state
// - No randomness, clocks, threads, or async
// - No I/O in the scoring path (loaders live at the edges)
// - Invalid levels are never scored as Low
// - Identical input yields identical output

pub mod aggregates;
pub mod combine;
pub mod config;
pub mod form;
pub mod labels;
pub mod matrix;
pub mod normalize;
pub mod observation;
pub mod occupancy;
pub mod report;
pub mod risk;

pub use combine::{combine, combine_with, CombinedRiskRecord, Combination, JoinStrategy};
pub use config::ResolvedConfig;
pub use matrix::{score, CellIndex};
pub use normalize::{normalize, LevelIndex};
pub use observation::{InherentObservation, ResidualObservation};
pub use occupancy::{build_occupancy, HeatMapCell, Named};
pub use report::{render_csv, render_json, render_text};
pub use risk::{classify, RiskBand};

use aggregates::MatrixAggregates;
use combine::Diagnostic;
use serde::Serialize;

/// Everything a dashboard needs from one pair of source collections
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RiskMatrixView {
    pub records: Vec<CombinedRiskRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
    pub inherent_heat_map: Vec<HeatMapCell>,
    pub residual_heat_map: Vec<HeatMapCell>,
    pub aggregates: MatrixAggregates,
}

/// Run one full computation pass over the two source collections.
///
/// Heat-map labels use the same names as `records`. A residual observation
/// that no record claimed keeps its own `event <id>` label.
pub fn analyze(
    inherent: &[InherentObservation],
    residual: &[ResidualObservation],
    config: &ResolvedConfig,
) -> RiskMatrixView {
    let combination = combine_with(inherent, residual, &config.combine_options());

    let inherent_points: Vec<Named<'_, InherentObservation>> = inherent
        .iter()
        .zip(&combination.records)
        .map(|(point, record)| Named::new(point, Some(record.name.as_str())))
        .collect();
    let residual_points: Vec<Named<'_, ResidualObservation>> = residual
        .iter()
        .zip(combination.residual_names(residual.len()))
        .map(|(point, name)| Named::new(point, name))
        .collect();

    let inherent_heat_map = build_occupancy(&inherent_points).heat_map(&config.thresholds);
    let residual_heat_map = build_occupancy(&residual_points).heat_map(&config.thresholds);

    let Combination {
        records,
        diagnostics,
        ..
    } = combination;
    let aggregates = aggregates::compute_aggregates(&records);

    RiskMatrixView {
        records,
        diagnostics,
        inherent_heat_map,
        residual_heat_map,
        aggregates,
    }
}
