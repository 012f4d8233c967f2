//! Normalization of 1-based ordinal levels into matrix indices
//!
//! Backend records carry probability/impact as 1-based levels. They arrive
//! as JSON numbers most of the time, but numeric strings, nulls and missing
//! fields all occur in practice.
//!
//! Global invariants enforced:
//! - A valid index is always within `[0, MAX_INDEX]`
//! - Unusable input becomes `LevelIndex::Invalid`, never index 0

use crate::matrix::MAX_INDEX;
use serde_json::Value;

/// Zero-based level index, or the sentinel for unusable input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LevelIndex {
    Valid(usize),
    Invalid,
}

impl LevelIndex {
    pub fn index(&self) -> Option<usize> {
        match self {
            LevelIndex::Valid(index) => Some(*index),
            LevelIndex::Invalid => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, LevelIndex::Valid(_))
    }
}

/// Normalize a 1-based level: `clamp(level - 1, 0, 4)`.
///
/// Negative levels are treated as corrupt and map to `Invalid`. Zero is
/// clamped to index 0.
pub fn normalize(raw_level: i64) -> LevelIndex {
    if raw_level < 0 {
        return LevelIndex::Invalid;
    }
    let index = raw_level.saturating_sub(1).clamp(0, MAX_INDEX as i64);
    LevelIndex::Valid(index as usize)
}

/// Normalize a level as it appears on the wire
pub fn normalize_value(value: &Value) -> LevelIndex {
    match value {
        Value::Number(n) => {
            if let Some(level) = n.as_i64() {
                normalize(level)
            } else if n.as_u64().is_some() {
                // Larger than i64::MAX, still a positive level
                LevelIndex::Valid(MAX_INDEX)
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 => normalize(f as i64),
                    _ => LevelIndex::Invalid,
                }
            }
        }
        Value::String(s) => match s.trim().parse::<i64>() {
            Ok(level) => normalize(level),
            Err(_) => LevelIndex::Invalid,
        },
        _ => LevelIndex::Invalid,
    }
}

/// Normalize an optional field; missing is `Invalid`
pub fn normalize_field(value: Option<&Value>) -> LevelIndex {
    value.map(normalize_value).unwrap_or(LevelIndex::Invalid)
}
