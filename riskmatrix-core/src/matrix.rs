//! Probability x impact lookup matrix
//!
//! Global invariants enforced:
//! - The matrix is a compile-time constant and is never mutated
//! - `score` is total over all integer inputs
//! - Rows are indexed by probability, columns by impact (both zero-based)

use serde::{Deserialize, Serialize};

/// Number of ordinal levels on each axis
pub const MATRIX_SIZE: usize = 5;

/// Highest valid zero-based index on either axis
pub const MAX_INDEX: usize = MATRIX_SIZE - 1;

/// Risk values indexed `[probability][impact]`
///
/// Each entry is `(probability + 1) * (impact + 1)`.
pub const RISK_MATRIX: [[u32; MATRIX_SIZE]; MATRIX_SIZE] = [
    [1, 2, 3, 4, 5],
    [2, 4, 6, 8, 10],
    [3, 6, 9, 12, 15],
    [4, 8, 12, 16, 20],
    [5, 10, 15, 20, 25],
];

/// One coordinate of the 5x5 grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CellIndex {
    pub probability: usize,
    pub impact: usize,
}

impl CellIndex {
    /// Build a cell, clamping both indices into the grid
    pub fn new(probability: usize, impact: usize) -> Self {
        CellIndex {
            probability: probability.min(MAX_INDEX),
            impact: impact.min(MAX_INDEX),
        }
    }

    /// Risk value stored at this cell
    ///
    /// Fields are public, so a cell built by hand or deserialized may hold
    /// out-of-range indices; those read the nearest edge cell.
    pub fn value(&self) -> u32 {
        RISK_MATRIX[self.probability.min(MAX_INDEX)][self.impact.min(MAX_INDEX)]
    }

    /// All 25 cells, probability-major
    pub fn all() -> impl Iterator<Item = CellIndex> {
        (0..MATRIX_SIZE).flat_map(|p| (0..MATRIX_SIZE).map(move |i| CellIndex::new(p, i)))
    }
}

fn clamp_index(axis: &str, index: i64) -> usize {
    if index < 0 || index > MAX_INDEX as i64 {
        tracing::warn!(axis, index, "matrix index out of range, clamping");
    }
    index.clamp(0, MAX_INDEX as i64) as usize
}

/// Look up the risk value for zero-based probability and impact indices.
///
/// Callers are expected to pass indices in `[0, 4]`; anything else is
/// clamped into range and reported through `tracing` rather than rejected.
pub fn score(probability_index: i64, impact_index: i64) -> u32 {
    let p = clamp_index("probability", probability_index);
    let i = clamp_index("impact", impact_index);
    RISK_MATRIX[p][i]
}
