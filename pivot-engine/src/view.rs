//! FILENAME: pivot-engine/src/view.rs
//! Pivot Result - the computed cross-tab handed to renderers and exporters.
//!
//! Everything a consumer needs is in here: labels, keys, cells and totals.
//! Exporting or rendering never needs the source records again.

use serde::{Deserialize, Serialize};

use crate::cache::{AxisKey, GroupValue};
use crate::catalog::FieldId;
use crate::definition::AggregationKind;

// ============================================================================
// HEADERS
// ============================================================================

/// One row or column of the cross-tab: its key and per-level labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisHeader {
    pub key: AxisKey,
    /// Display label per dimension level, aligned with `key`.
    pub labels: Vec<String>,
}

/// A configured value field with its display label (e.g. "Sum of Amount").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueHeader {
    pub field: FieldId,
    pub aggregation: AggregationKind,
    pub label: String,
}

// ============================================================================
// RESULT
// ============================================================================

/// Aggregates per value field; `None` means no value to show.
pub type ValueSet = Vec<Option<f64>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotResult {
    /// Display labels of the row dimensions, outer to inner.
    pub row_fields: Vec<String>,

    /// Display labels of the column dimensions, outer to inner.
    pub column_fields: Vec<String>,

    pub value_headers: Vec<ValueHeader>,

    /// Rows in display order.
    pub row_headers: Vec<AxisHeader>,

    /// Columns in display order.
    pub column_headers: Vec<AxisHeader>,

    /// Dense cell storage indexed by (row, column, value field).
    pub(crate) cells: Vec<Option<f64>>,

    /// Per row: aggregate over all columns, one entry per value field.
    pub row_totals: Option<Vec<ValueSet>>,

    /// Per column: aggregate over all rows, one entry per value field.
    pub column_totals: Option<Vec<ValueSet>>,

    /// Aggregate over the whole filtered record set, one entry per value field.
    pub grand_total: ValueSet,

    /// Label of the trailing total row/columns.
    pub total_label: String,

    /// Number of records that survived filtering.
    pub record_count: usize,
}

impl PivotResult {
    pub fn row_count(&self) -> usize {
        self.row_headers.len()
    }

    pub fn column_count(&self) -> usize {
        self.column_headers.len()
    }

    pub fn value_count(&self) -> usize {
        self.value_headers.len()
    }

    fn cell_index(&self, row: usize, column: usize, value: usize) -> Option<usize> {
        if row >= self.row_count() || column >= self.column_count() || value >= self.value_count() {
            return None;
        }
        Some((row * self.column_count() + column) * self.value_count() + value)
    }

    /// Aggregate at a cell. `None` if no record contributed to the cell,
    /// the aggregation had nothing to report, or an index is out of range.
    pub fn cell(&self, row: usize, column: usize, value: usize) -> Option<f64> {
        self.cell_index(row, column, value)
            .and_then(|i| self.cells.get(i).copied().flatten())
    }

    pub fn row_index(&self, key: &[GroupValue]) -> Option<usize> {
        self.row_headers.iter().position(|h| h.key.as_slice() == key)
    }

    pub fn column_index(&self, key: &[GroupValue]) -> Option<usize> {
        self.column_headers.iter().position(|h| h.key.as_slice() == key)
    }

    /// Cell lookup by row and column key.
    pub fn cell_by_key(&self, row_key: &[GroupValue], column_key: &[GroupValue], value: usize) -> Option<f64> {
        let row = self.row_index(row_key)?;
        let column = self.column_index(column_key)?;
        self.cell(row, column, value)
    }

    pub fn row_total(&self, row: usize, value: usize) -> Option<f64> {
        self.row_totals
            .as_ref()
            .and_then(|totals| totals.get(row))
            .and_then(|set| set.get(value).copied().flatten())
    }

    pub fn column_total(&self, column: usize, value: usize) -> Option<f64> {
        self.column_totals
            .as_ref()
            .and_then(|totals| totals.get(column))
            .and_then(|set| set.get(value).copied().flatten())
    }

    pub fn grand_total(&self, value: usize) -> Option<f64> {
        self.grand_total.get(value).copied().flatten()
    }
}

// ============================================================================
// DRILL DOWN
// ============================================================================

/// Source records behind a cell or total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrillDownResult {
    /// Indices into the record slice passed to `drill_down`, in input order.
    pub record_indices: Vec<usize>,
    /// Total number of matching records, even when truncated.
    pub total_count: usize,
    pub is_truncated: bool,
    pub max_records: usize,
}

impl DrillDownResult {
    pub fn new(max_records: usize) -> Self {
        DrillDownResult {
            record_indices: Vec::new(),
            total_count: 0,
            is_truncated: false,
            max_records,
        }
    }
}
