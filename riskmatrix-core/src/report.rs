//! Reporting and output generation
//!
//! Global invariants enforced:
//! - Deterministic output ordering (records keep their positional order)
//! - Byte-for-byte identical output across runs

use crate::combine::CombinedRiskRecord;
use crate::matrix::MATRIX_SIZE;
use crate::occupancy::HeatMapCell;
use serde::{Deserialize, Serialize};

/// Flattened row consumed by the spreadsheet exporter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub id: String,
    pub nombre: String,
    #[serde(rename = "probabilidadInherente")]
    pub probabilidad_inherente: String,
    #[serde(rename = "impactoInherente")]
    pub impacto_inherente: String,
    #[serde(rename = "valorInherente")]
    pub valor_inherente: u32,
    #[serde(rename = "probabilidadResidual")]
    pub probabilidad_residual: String,
    #[serde(rename = "impactoResidual")]
    pub impacto_residual: String,
    #[serde(rename = "valorResidual")]
    pub valor_residual: u32,
}

/// Column order of the export format
pub const EXPORT_COLUMNS: [&str; 8] = [
    "id",
    "nombre",
    "probabilidadInherente",
    "impactoInherente",
    "valorInherente",
    "probabilidadResidual",
    "impactoResidual",
    "valorResidual",
];

impl From<&CombinedRiskRecord> for ExportRow {
    fn from(record: &CombinedRiskRecord) -> Self {
        ExportRow {
            id: record.id.clone(),
            nombre: record.name.clone(),
            probabilidad_inherente: record.inherent_probability_label.clone(),
            impacto_inherente: record.inherent_impact_label.clone(),
            valor_inherente: record.inherent_value,
            probabilidad_residual: record.residual_probability_label.clone(),
            impacto_residual: record.residual_impact_label.clone(),
            valor_residual: record.residual_value,
        }
    }
}

impl ExportRow {
    fn fields(&self) -> [String; 8] {
        [
            self.id.clone(),
            self.nombre.clone(),
            self.probabilidad_inherente.clone(),
            self.impacto_inherente.clone(),
            self.valor_inherente.to_string(),
            self.probabilidad_residual.clone(),
            self.impacto_residual.clone(),
            self.valor_residual.to_string(),
        ]
    }
}

pub fn to_export_rows(records: &[CombinedRiskRecord]) -> Vec<ExportRow> {
    records.iter().map(ExportRow::from).collect()
}

/// Render export rows as JSON output
pub fn render_json(records: &[CombinedRiskRecord]) -> String {
    serde_json::to_string_pretty(&to_export_rows(records)).unwrap_or_else(|_| "[]".to_string())
}

/// Quote a CSV field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Render export rows as CSV with a header line
pub fn render_csv(records: &[CombinedRiskRecord]) -> String {
    let mut output = EXPORT_COLUMNS.join(",");
    output.push('\n');
    for row in to_export_rows(records) {
        let line = row
            .fields()
            .iter()
            .map(|f| csv_field(f))
            .collect::<Vec<_>>()
            .join(",");
        output.push_str(&line);
        output.push('\n');
    }
    output
}

/// Render combined records as a text table
pub fn render_text(records: &[CombinedRiskRecord]) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{:<7} {:<30} {:<14} {:<14} {:>5} {:<14} {:<14} {:>5}\n",
        "ID", "RISK", "P.INH", "I.INH", "V.INH", "P.RES", "I.RES", "V.RES"
    ));

    for record in records {
        output.push_str(&format!(
            "{:<7} {} {} {} {:>5} {} {} {:>5}\n",
            record.id,
            truncate_or_pad(&record.name, 30),
            truncate_or_pad(&record.inherent_probability_label, 14),
            truncate_or_pad(&record.inherent_impact_label, 14),
            record.inherent_value,
            truncate_or_pad(&record.residual_probability_label, 14),
            truncate_or_pad(&record.residual_impact_label, 14),
            record.residual_value,
        ));
    }

    output
}

/// Render a heat map as a 5x5 grid of counts, highest probability on top
pub fn render_heat_map_text(cells: &[HeatMapCell]) -> String {
    let mut grid = [[0usize; MATRIX_SIZE]; MATRIX_SIZE];
    for cell in cells {
        if cell.probability_index < MATRIX_SIZE && cell.impact_index < MATRIX_SIZE {
            grid[cell.probability_index][cell.impact_index] = cell.count;
        }
    }

    let mut output = String::from("P\\I ");
    for impact in 1..=MATRIX_SIZE {
        output.push_str(&format!("{:>6}", impact));
    }
    output.push('\n');

    for probability in (0..MATRIX_SIZE).rev() {
        output.push_str(&format!("{:<4}", probability + 1));
        for count in grid[probability] {
            if count == 0 {
                output.push_str(&format!("{:>6}", "."));
            } else {
                output.push_str(&format!("{:>6}", count));
            }
        }
        output.push('\n');
    }

    output
}

/// Truncate or pad string to fixed width (counted in characters)
fn truncate_or_pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len > width {
        let head: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", head)
    } else {
        format!("{}{}", s, " ".repeat(width - len))
    }
}
