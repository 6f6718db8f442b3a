//! FILENAME: pivot-export/src/lib.rs
//! Tabular export - flattens a `PivotResult` into rectangular rows.
//!
//! The output mirrors the rendered cross-tab and is handed to an external
//! spreadsheet writer. Export reads the computed result only.
//!
//! Layout (R row fields, C column fields, K columns, V value fields):
//! - C column-level header rows, then one value-header row
//! - each row starts with max(R, 1) label cells
//! - K * V data cells, column-major over value fields
//! - V trailing row-total cells when row totals are present
//! - one trailing total row when column totals are present; its last V
//!   cells carry the grand total when row totals are present too

use log::debug;
use pivot_engine::{PivotResult, Scalar};

/// Number of header rows `export_rows` emits for `result`.
pub fn header_row_count(result: &PivotResult) -> usize {
    result.column_fields.len() + 1
}

/// Number of leading label cells per row.
pub fn label_column_count(result: &PivotResult) -> usize {
    result.row_fields.len().max(1)
}

/// Width of every exported row.
pub fn export_width(result: &PivotResult) -> usize {
    let totals = if result.row_totals.is_some() { result.value_count() } else { 0 };
    label_column_count(result) + result.column_count() * result.value_count() + totals
}

/// Flattens `result` into header rows, body rows and an optional total row.
/// Cells with no value are `Scalar::Null`.
pub fn export_rows(result: &PivotResult) -> Vec<Vec<Scalar>> {
    let width = export_width(result);
    let label_cols = label_column_count(result);
    let mut rows = Vec::with_capacity(header_row_count(result) + result.row_count() + 1);

    // Column dimension levels
    for (level, field_name) in result.column_fields.iter().enumerate() {
        let mut row = Vec::with_capacity(width);
        row.extend(std::iter::repeat(Scalar::Null).take(label_cols - 1));
        row.push(Scalar::text(field_name.as_str()));
        for header in &result.column_headers {
            let label = header.labels.get(level).cloned().unwrap_or_default();
            row.extend(std::iter::repeat(Scalar::Text(label)).take(result.value_count()));
        }
        if result.row_totals.is_some() {
            for _ in &result.value_headers {
                row.push(if level == 0 {
                    Scalar::text(result.total_label.as_str())
                } else {
                    Scalar::Null
                });
            }
        }
        rows.push(row);
    }

    // Value headers
    let mut row = Vec::with_capacity(width);
    push_labels(&mut row, &result.row_fields, label_cols);
    for _ in &result.column_headers {
        row.extend(result.value_headers.iter().map(|v| Scalar::text(v.label.as_str())));
    }
    if result.row_totals.is_some() {
        row.extend(
            result
                .value_headers
                .iter()
                .map(|v| Scalar::Text(format!("{} {}", result.total_label, v.label))),
        );
    }
    rows.push(row);

    // Body
    for (r, header) in result.row_headers.iter().enumerate() {
        let mut row = Vec::with_capacity(width);
        push_labels(&mut row, &header.labels, label_cols);
        for c in 0..result.column_count() {
            for v in 0..result.value_count() {
                row.push(Scalar::from(result.cell(r, c, v)));
            }
        }
        if result.row_totals.is_some() {
            for v in 0..result.value_count() {
                row.push(Scalar::from(result.row_total(r, v)));
            }
        }
        rows.push(row);
    }

    // Column totals
    if result.column_totals.is_some() {
        let mut row = Vec::with_capacity(width);
        row.push(Scalar::text(result.total_label.as_str()));
        row.extend(std::iter::repeat(Scalar::Null).take(label_cols - 1));
        for c in 0..result.column_count() {
            for v in 0..result.value_count() {
                row.push(Scalar::from(result.column_total(c, v)));
            }
        }
        if result.row_totals.is_some() {
            for v in 0..result.value_count() {
                row.push(Scalar::from(result.grand_total(v)));
            }
        }
        rows.push(row);
    }

    debug!(target: "pivot", "exported {} rows x {} columns", rows.len(), width);
    rows
}

/// Pushes `labels` padded with `Null` up to `count` cells.
fn push_labels(row: &mut Vec<Scalar>, labels: &[String], count: usize) {
    row.extend(labels.iter().map(|l| Scalar::text(l.as_str())));
    row.extend(std::iter::repeat(Scalar::Null).take(count.saturating_sub(labels.len())));
}
