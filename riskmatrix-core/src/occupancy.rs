//! Cell occupancy index for heat-map rendering
//!
//! Global invariants enforced:
//! - Every observation with valid indices lands in exactly one cell
//! - Observations with an invalid level are excluded, never placed in (0, 0)
//! - Deterministic ordering (cells by index, observations by input order)

use crate::matrix::CellIndex;
use crate::normalize::LevelIndex;
use crate::observation::MatrixPoint;
use crate::risk::{classify_with_thresholds, BandThresholds, RiskBand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Observations grouped by matrix cell
#[derive(Debug)]
pub struct Occupancy<'a, T> {
    pub cells: BTreeMap<CellIndex, Vec<&'a T>>,
    /// Observations left out because a level was invalid
    pub excluded: usize,
}

/// One rendered heat-map cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HeatMapCell {
    pub probability_index: usize,
    pub impact_index: usize,
    pub value: u32,
    pub band: RiskBand,
    pub count: usize,
    pub labels: Vec<String>,
}

/// An observation shown under an externally resolved risk name
#[derive(Debug, Clone)]
pub struct Named<'a, T> {
    pub point: &'a T,
    pub name: String,
}

impl<'a, T: MatrixPoint> Named<'a, T> {
    /// Use `name` when present, else the observation's own label
    pub fn new(point: &'a T, name: Option<&str>) -> Self {
        Named {
            point,
            name: name.map_or_else(|| point.label(), str::to_string),
        }
    }
}

impl<T: MatrixPoint> MatrixPoint for Named<'_, T> {
    fn probability(&self) -> LevelIndex {
        self.point.probability()
    }

    fn impact(&self) -> LevelIndex {
        self.point.impact()
    }

    fn label(&self) -> String {
        self.name.clone()
    }
}

/// Group observations by their (probability, impact) cell
pub fn build_occupancy<T: MatrixPoint>(observations: &[T]) -> Occupancy<'_, T> {
    let mut cells: BTreeMap<CellIndex, Vec<&T>> = BTreeMap::new();
    let mut excluded = 0;

    for obs in observations {
        match (obs.probability().index(), obs.impact().index()) {
            (Some(p), Some(i)) => cells.entry(CellIndex::new(p, i)).or_default().push(obs),
            _ => excluded += 1,
        }
    }

    if excluded > 0 {
        tracing::debug!(excluded, "observations without valid levels left out of occupancy");
    }

    Occupancy { cells, excluded }
}

impl<T: MatrixPoint> Occupancy<'_, T> {
    /// Number of observations in a cell
    pub fn count(&self, cell: CellIndex) -> usize {
        self.cells.get(&cell).map_or(0, Vec::len)
    }

    /// Number of observations placed on the grid
    pub fn total(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }

    /// All 25 cells with value, band, count and contributing labels
    pub fn heat_map(&self, thresholds: &BandThresholds) -> Vec<HeatMapCell> {
        CellIndex::all()
            .map(|cell| {
                let labels: Vec<String> = self
                    .cells
                    .get(&cell)
                    .map(|members| members.iter().map(|m| m.label()).collect())
                    .unwrap_or_default();
                let value = cell.value();
                HeatMapCell {
                    probability_index: cell.probability,
                    impact_index: cell.impact,
                    value,
                    band: classify_with_thresholds(value, thresholds),
                    count: self.count(cell),
                    labels,
                }
            })
            .collect()
    }
}
