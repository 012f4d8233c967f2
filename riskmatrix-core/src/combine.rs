//! Combined inherent/residual risk records
//!
//! The inherent collection drives the output: one record per inherent
//! observation, in input order. By default the residual observation at the
//! same position is paired with it. That pairing only holds when the backend
//! returns both collections in matching order and length, so an explicit
//! key join is available as an opt-in and every residual that cannot be
//! paired is reported as a diagnostic.
//!
//! Global invariants enforced:
//! - Output length equals inherent length
//! - Identical inputs yield identical output (ids are positional)
//! - Invalid levels render as "N/A" with value 0, never as Low

pub use crate::labels::DEFAULT_PLACEHOLDER_NAME;

use crate::labels::{LevelLabels, NOT_APPLICABLE};
use crate::observation::{EventId, InherentObservation, MatrixPoint, ResidualObservation};
use crate::risk::{assess, BandThresholds, RiskBand};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How residual observations are paired with inherent ones
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinStrategy {
    /// residual[i] pairs with inherent[i]
    #[default]
    Positional,
    /// `eventlog_id` pairs with `event_id`; the last residual per key wins
    EventId,
}

impl JoinStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinStrategy::Positional => "positional",
            JoinStrategy::EventId => "event_id",
        }
    }
}

/// Options for one combination pass
#[derive(Debug, Clone)]
pub struct CombineOptions {
    pub strategy: JoinStrategy,
    pub thresholds: BandThresholds,
    pub labels: LevelLabels,
    pub placeholder_name: String,
}

impl Default for CombineOptions {
    fn default() -> Self {
        CombineOptions {
            strategy: JoinStrategy::default(),
            thresholds: BandThresholds::default(),
            labels: LevelLabels::default(),
            placeholder_name: DEFAULT_PLACEHOLDER_NAME.to_string(),
        }
    }
}

/// One risk with both its inherent and residual view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CombinedRiskRecord {
    pub id: String,
    pub name: String,
    pub inherent_probability_label: String,
    pub inherent_impact_label: String,
    pub inherent_value: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub inherent_band: Option<RiskBand>,
    pub residual_probability_label: String,
    pub residual_impact_label: String,
    pub residual_value: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub residual_band: Option<RiskBand>,
}

/// Residual data that could not be paired cleanly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A residual observation that no inherent observation claimed
    UnmatchedResidual {
        position: usize,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        eventlog_id: Option<EventId>,
    },
    /// A residual observation replaced by a later one with the same key
    DuplicateResidual {
        position: usize,
        eventlog_id: EventId,
    },
    /// An inherent observation with no key under a keyed join
    MissingInherentKey { record_id: String },
    /// An inherent observation whose key an earlier record already uses;
    /// both records are paired with the same residual
    DuplicateInherentKey {
        record_id: String,
        first_record_id: String,
        event_id: EventId,
    },
}

/// Result of a combination pass
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Combination {
    pub records: Vec<CombinedRiskRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub diagnostics: Vec<Diagnostic>,
    /// Residual position paired with each record, parallel to `records`
    #[serde(skip)]
    pub pairing: Vec<Option<usize>>,
}

impl Combination {
    /// Name of the first record paired with each residual observation
    pub fn residual_names(&self, residual_count: usize) -> Vec<Option<&str>> {
        let mut names = vec![None; residual_count];
        for (record, paired) in self.records.iter().zip(&self.pairing) {
            if let Some(slot) = paired.and_then(|index| names.get_mut(index)) {
                if slot.is_none() {
                    *slot = Some(record.name.as_str());
                }
            }
        }
        names
    }
}

/// Scored half of a combined record
struct Half {
    probability_label: String,
    impact_label: String,
    value: u32,
    band: Option<RiskBand>,
}

impl Half {
    fn not_applicable() -> Self {
        Half {
            probability_label: NOT_APPLICABLE.to_string(),
            impact_label: NOT_APPLICABLE.to_string(),
            value: 0,
            band: None,
        }
    }
}

fn score_half<T: MatrixPoint>(point: Option<&T>, options: &CombineOptions) -> Half {
    let Some(point) = point else {
        return Half::not_applicable();
    };
    let probability = point.probability();
    let impact = point.impact();
    let score = assess(probability, impact, &options.thresholds);
    Half {
        probability_label: options.labels.probability_label(probability).to_string(),
        impact_label: options.labels.impact_label(impact).to_string(),
        value: score.map_or(0, |s| s.value),
        band: score.map(|s| s.band),
    }
}

/// Positional identifier: R-001, R-002, ...
pub fn record_id(position: usize) -> String {
    format!("R-{:03}", position + 1)
}

fn build_record(
    position: usize,
    inherent: &InherentObservation,
    residual: Option<&ResidualObservation>,
    options: &CombineOptions,
) -> CombinedRiskRecord {
    let before = score_half(Some(inherent), options);
    let after = score_half(residual, options);
    CombinedRiskRecord {
        id: record_id(position),
        name: inherent
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| options.placeholder_name.clone()),
        inherent_probability_label: before.probability_label,
        inherent_impact_label: before.impact_label,
        inherent_value: before.value,
        inherent_band: before.band,
        residual_probability_label: after.probability_label,
        residual_impact_label: after.impact_label,
        residual_value: after.value,
        residual_band: after.band,
    }
}

/// Combine with the default options (positional pairing)
pub fn combine(
    inherent: &[InherentObservation],
    residual: &[ResidualObservation],
) -> Vec<CombinedRiskRecord> {
    combine_with(inherent, residual, &CombineOptions::default()).records
}

/// Combine with explicit options, reporting unpaired residual data
pub fn combine_with(
    inherent: &[InherentObservation],
    residual: &[ResidualObservation],
    options: &CombineOptions,
) -> Combination {
    let combination = match options.strategy {
        JoinStrategy::Positional => combine_positional(inherent, residual, options),
        JoinStrategy::EventId => combine_by_event_id(inherent, residual, options),
    };

    if !combination.diagnostics.is_empty() {
        tracing::warn!(
            strategy = options.strategy.as_str(),
            diagnostics = combination.diagnostics.len(),
            "residual observations could not all be paired"
        );
    }
    tracing::debug!(
        inherent = inherent.len(),
        residual = residual.len(),
        records = combination.records.len(),
        "combined risk records"
    );

    combination
}

fn combine_positional(
    inherent: &[InherentObservation],
    residual: &[ResidualObservation],
    options: &CombineOptions,
) -> Combination {
    let records = inherent
        .iter()
        .enumerate()
        .map(|(position, obs)| build_record(position, obs, residual.get(position), options))
        .collect();
    let pairing = (0..inherent.len())
        .map(|position| (position < residual.len()).then_some(position))
        .collect();

    let diagnostics = residual
        .iter()
        .enumerate()
        .skip(inherent.len())
        .map(|(position, obs)| Diagnostic::UnmatchedResidual {
            position,
            eventlog_id: obs.eventlog_id.clone(),
        })
        .collect();

    Combination {
        records,
        diagnostics,
        pairing,
    }
}

fn combine_by_event_id(
    inherent: &[InherentObservation],
    residual: &[ResidualObservation],
    options: &CombineOptions,
) -> Combination {
    let mut diagnostics = Vec::new();
    let mut by_key: HashMap<&EventId, usize> = HashMap::new();

    for (position, obs) in residual.iter().enumerate() {
        match &obs.eventlog_id {
            Some(key) => {
                if let Some(previous) = by_key.insert(key, position) {
                    diagnostics.push(Diagnostic::DuplicateResidual {
                        position: previous,
                        eventlog_id: key.clone(),
                    });
                }
            }
            None => diagnostics.push(Diagnostic::UnmatchedResidual {
                position,
                eventlog_id: None,
            }),
        }
    }

    let mut claimed = vec![false; residual.len()];
    let mut first_claimant: HashMap<&EventId, usize> = HashMap::new();
    let mut records = Vec::with_capacity(inherent.len());
    let mut pairing = Vec::with_capacity(inherent.len());

    for (position, obs) in inherent.iter().enumerate() {
        let matched = match &obs.event_id {
            Some(key) => {
                if let Some(&first) = first_claimant.get(key) {
                    diagnostics.push(Diagnostic::DuplicateInherentKey {
                        record_id: record_id(position),
                        first_record_id: record_id(first),
                        event_id: key.clone(),
                    });
                } else {
                    first_claimant.insert(key, position);
                }
                by_key.get(key).copied()
            }
            None => {
                diagnostics.push(Diagnostic::MissingInherentKey {
                    record_id: record_id(position),
                });
                None
            }
        };
        if let Some(index) = matched {
            claimed[index] = true;
        }
        pairing.push(matched);
        records.push(build_record(
            position,
            obs,
            matched.map(|index| &residual[index]),
            options,
        ));
    }

    // Winners that no inherent observation asked for
    let mut unclaimed: Vec<usize> = by_key
        .values()
        .copied()
        .filter(|&index| !claimed[index])
        .collect();
    unclaimed.sort_unstable();
    diagnostics.extend(unclaimed.into_iter().map(|position| {
        Diagnostic::UnmatchedResidual {
            position,
            eventlog_id: residual[position].eventlog_id.clone(),
        }
    }));

    Combination {
        records,
        diagnostics,
        pairing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_empty_inputs() {
        assert!(combine(&[], &[]).is_empty());
        let residual = vec![ResidualObservation::new(1, 1)];
        assert!(combine(&[], &residual).is_empty());
    }

    #[test]
    fn test_fraude_example() {
        let inherent = vec![InherentObservation::new("Fraude", 3, 4)];
        let records = combine(&inherent, &[]);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.id, "R-001");
        assert_eq!(record.name, "Fraude");
        assert_eq!(record.inherent_probability_label, "Medio");
        assert_eq!(record.inherent_impact_label, "Mayor");
        assert_eq!(record.inherent_value, 12);
        assert_eq!(record.inherent_band, Some(RiskBand::High));
    }

    #[test]
    fn test_missing_residual_defaults() {
        let inherent = vec![
            InherentObservation::new("A", 1, 1),
            InherentObservation::new("B", 5, 5),
        ];
        let records = combine(&inherent, &[]);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.residual_probability_label, NOT_APPLICABLE);
            assert_eq!(record.residual_impact_label, NOT_APPLICABLE);
            assert_eq!(record.residual_value, 0);
            assert_eq!(record.residual_band, None);
        }
    }

    #[test]
    fn test_positional_pairing() {
        let inherent = vec![
            InherentObservation::new("A", 5, 5),
            InherentObservation::new("B", 4, 4),
        ];
        let residual = vec![ResidualObservation::new(2, 3)];
        let records = combine(&inherent, &residual);
        assert_eq!(records[0].residual_value, 6);
        assert_eq!(records[0].residual_band, Some(RiskBand::Medium));
        assert_eq!(records[0].residual_probability_label, "Bajo");
        assert_eq!(records[0].residual_impact_label, "Moderado");
        assert_eq!(records[1].residual_value, 0);
        assert_eq!(records[1].id, "R-002");
    }

    #[test]
    fn test_invalid_levels_still_listed() {
        let inherent = vec![InherentObservation {
            impact_id: Some(Value::Null),
            ..InherentObservation::new("Parcial", 2, 1)
        }];
        let residual = vec![ResidualObservation {
            n_probability: Some(Value::from("x")),
            ..ResidualObservation::new(1, 3)
        }];
        let records = combine(&inherent, &residual);
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.inherent_probability_label, "Bajo");
        assert_eq!(record.inherent_impact_label, NOT_APPLICABLE);
        assert_eq!(record.inherent_value, 0);
        assert_eq!(record.inherent_band, None);
        assert_eq!(record.residual_probability_label, NOT_APPLICABLE);
        assert_eq!(record.residual_impact_label, "Moderado");
        assert_eq!(record.residual_value, 0);
    }

    #[test]
    fn test_placeholder_name() {
        let inherent = vec![InherentObservation {
            description: None,
            ..InherentObservation::new("", 1, 1)
        }];
        let records = combine(&inherent, &[]);
        assert_eq!(records[0].name, DEFAULT_PLACEHOLDER_NAME);

        let options = CombineOptions {
            placeholder_name: "Sin nombre".to_string(),
            ..CombineOptions::default()
        };
        let combination = combine_with(&inherent, &[], &options);
        assert_eq!(combination.records[0].name, "Sin nombre");
    }

    #[test]
    fn test_idempotent() {
        let inherent = vec![
            InherentObservation::new("A", 3, 4),
            InherentObservation::new("B", 2, 2),
        ];
        let residual = vec![ResidualObservation::new(1, 2)];
        assert_eq!(combine(&inherent, &residual), combine(&inherent, &residual));
    }

    #[test]
    fn test_surplus_residuals_reported() {
        let inherent = vec![InherentObservation::new("A", 3, 3)];
        let residual = vec![
            ResidualObservation::new(1, 1),
            ResidualObservation::new(2, 2).with_eventlog_id(9i64),
        ];
        let combination = combine_with(&inherent, &residual, &CombineOptions::default());
        assert_eq!(combination.records.len(), 1);
        assert_eq!(
            combination.diagnostics,
            vec![Diagnostic::UnmatchedResidual {
                position: 1,
                eventlog_id: Some(EventId::from(9i64)),
            }]
        );
    }

    #[test]
    fn test_event_id_join() {
        let inherent = vec![
            InherentObservation::new("A", 5, 5).with_event_id(1i64),
            InherentObservation::new("B", 4, 4).with_event_id(2i64),
            InherentObservation::new("C", 3, 3),
        ];
        let residual = vec![
            ResidualObservation::new(2, 2).with_eventlog_id(2i64),
            ResidualObservation::new(1, 1).with_eventlog_id(1i64),
            ResidualObservation::new(1, 2).with_eventlog_id(1i64),
            ResidualObservation::new(3, 3).with_eventlog_id(77i64),
            ResidualObservation::new(3, 3),
        ];
        let options = CombineOptions {
            strategy: JoinStrategy::EventId,
            ..CombineOptions::default()
        };
        let combination = combine_with(&inherent, &residual, &options);

        // Last residual per key wins
        assert_eq!(combination.records[0].residual_value, 2);
        assert_eq!(combination.records[1].residual_value, 4);
        assert_eq!(combination.records[2].residual_value, 0);

        assert_eq!(
            combination.diagnostics,
            vec![
                Diagnostic::DuplicateResidual {
                    position: 1,
                    eventlog_id: EventId::from(1i64),
                },
                Diagnostic::UnmatchedResidual {
                    position: 4,
                    eventlog_id: None,
                },
                Diagnostic::MissingInherentKey {
                    record_id: "R-003".to_string(),
                },
                Diagnostic::UnmatchedResidual {
                    position: 3,
                    eventlog_id: Some(EventId::from(77i64)),
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_inherent_key_reported() {
        let inherent = vec![
            InherentObservation::new("A", 5, 5).with_event_id(1i64),
            InherentObservation::new("B", 4, 4).with_event_id(2i64),
            InherentObservation::new("A bis", 3, 3).with_event_id(1i64),
        ];
        let residual = vec![ResidualObservation::new(1, 2).with_eventlog_id(1i64)];
        let options = CombineOptions {
            strategy: JoinStrategy::EventId,
            ..CombineOptions::default()
        };
        let combination = combine_with(&inherent, &residual, &options);

        assert_eq!(combination.records.len(), 3);
        assert_eq!(combination.records[0].residual_value, 2);
        assert_eq!(combination.records[2].residual_value, 2);
        assert_eq!(
            combination.diagnostics,
            vec![Diagnostic::DuplicateInherentKey {
                record_id: "R-003".to_string(),
                first_record_id: "R-001".to_string(),
                event_id: EventId::from(1i64),
            }]
        );
        assert_eq!(combination.pairing, vec![Some(0), None, Some(0)]);
        assert_eq!(combination.residual_names(residual.len()), vec![Some("A")]);
    }

    #[test]
    fn test_residual_names_follow_pairing() {
        let inherent = vec![
            InherentObservation::new("A", 3, 3),
            InherentObservation::new("B", 2, 2),
        ];
        let residual = vec![
            ResidualObservation::new(1, 1),
            ResidualObservation::new(1, 2),
            ResidualObservation::new(2, 2),
        ];
        let combination = combine_with(&inherent, &residual, &CombineOptions::default());
        assert_eq!(combination.pairing, vec![Some(0), Some(1)]);
        assert_eq!(
            combination.residual_names(residual.len()),
            vec![Some("A"), Some("B"), None]
        );
    }

    #[test]
    fn test_record_id_format() {
        assert_eq!(record_id(0), "R-001");
        assert_eq!(record_id(41), "R-042");
        assert_eq!(record_id(999), "R-1000");
    }
}
