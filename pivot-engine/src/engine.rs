//! FILENAME: pivot-engine/src/engine.rs
//! Pivot Engine - turns raw records and a config into a `PivotResult`.
//!
//! Algorithm:
//! 1. Filter records (conjunction of every filter)
//! 2. Single pass: build row/column keys, intern them, and feed each record
//!    into its cell bucket, its row-total bucket, its column-total bucket
//!    and the grand-total bucket
//! 3. Order keys (first-seen or ascending) and finish every accumulator
//!
//! Totals are fed from the records themselves, never from finished cells,
//! so Avg and Count totals stay correct when buckets are uneven.

use log::{debug, trace};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::cache::{axis_key, AccumulatorSet, AxisIndex, GroupValue};
use crate::catalog::{field_label, FieldId, FieldMeta};
use crate::definition::{FilterSpec, PivotConfig, ValueField};
use crate::options::{KeyOrder, PivotOptions};
use crate::record::RawRecord;
use crate::view::{AxisHeader, DrillDownResult, PivotResult, ValueHeader, ValueSet};

// ============================================================================
// PIVOT CALCULATOR
// ============================================================================

/// Accumulation state for one calculation.
struct PivotCalculator<'a> {
    config: &'a PivotConfig,
    fields: &'a [FieldMeta],
    options: &'a PivotOptions,

    rows: AxisIndex,
    columns: AxisIndex,

    /// Keyed by internal (row, column) indices.
    cells: FxHashMap<(usize, usize), AccumulatorSet>,

    /// Indexed by internal row index; empty when row totals are off.
    row_totals: Vec<AccumulatorSet>,

    /// Indexed by internal column index; empty when column totals are off.
    column_totals: Vec<AccumulatorSet>,

    grand_total: AccumulatorSet,

    record_count: usize,
}

impl<'a> PivotCalculator<'a> {
    fn new(config: &'a PivotConfig, fields: &'a [FieldMeta], options: &'a PivotOptions) -> Self {
        PivotCalculator {
            config,
            fields,
            options,
            rows: AxisIndex::new(),
            columns: AxisIndex::new(),
            cells: FxHashMap::default(),
            row_totals: Vec::new(),
            column_totals: Vec::new(),
            grand_total: AccumulatorSet::new(config.value_fields()),
            record_count: 0,
        }
    }

    fn value_fields(&self) -> &'a [ValueField] {
        self.config.value_fields()
    }

    /// Feeds one filtered record into every bucket it belongs to.
    fn accumulate(&mut self, record: &RawRecord) {
        let value_fields = self.value_fields();
        let values: SmallVec<[Option<f64>; 4]> = value_fields
            .iter()
            .map(|v| record.get(&v.field).as_number())
            .collect();

        let (row, new_row) = self.rows.intern(axis_key(record, self.config.row_fields()));
        let (column, new_column) = self.columns.intern(axis_key(record, self.config.column_fields()));

        self.cells
            .entry((row, column))
            .or_insert_with(|| AccumulatorSet::new(value_fields))
            .add(&values);

        if self.config.show_row_totals() {
            if new_row {
                self.row_totals.push(AccumulatorSet::new(value_fields));
            }
            self.row_totals[row].add(&values);
        }

        if self.config.show_column_totals() {
            if new_column {
                self.column_totals.push(AccumulatorSet::new(value_fields));
            }
            self.column_totals[column].add(&values);
        }

        self.grand_total.add(&values);
        self.record_count += 1;
    }

    fn display_order(&self, index: &AxisIndex) -> Vec<usize> {
        match self.options.key_order {
            KeyOrder::FirstSeen => index.first_seen_order(),
            KeyOrder::Ascending => index.sorted_order(),
        }
    }

    fn headers(&self, index: &AxisIndex, order: &[usize]) -> Vec<AxisHeader> {
        order
            .iter()
            .map(|&i| {
                let key = index.keys()[i].clone();
                let labels = key.iter().map(|v| v.label(&self.options.missing_label)).collect();
                AxisHeader { key, labels }
            })
            .collect()
    }

    /// Finishes every accumulator into the result, in display order.
    fn finish(self) -> PivotResult {
        let row_order = self.display_order(&self.rows);
        let column_order = self.display_order(&self.columns);
        let value_count = self.value_fields().len();

        let mut cells = Vec::with_capacity(row_order.len() * column_order.len() * value_count);
        for &row in &row_order {
            for &column in &column_order {
                match self.cells.get(&(row, column)) {
                    Some(set) => cells.extend(set.finish()),
                    None => cells.extend(std::iter::repeat(None).take(value_count)),
                }
            }
        }

        let row_totals = self
            .config
            .show_row_totals()
            .then(|| row_order.iter().map(|&r| self.row_totals[r].finish()).collect::<Vec<ValueSet>>());
        let column_totals = self
            .config
            .show_column_totals()
            .then(|| column_order.iter().map(|&c| self.column_totals[c].finish()).collect::<Vec<ValueSet>>());

        let value_headers = self
            .value_fields()
            .iter()
            .map(|v| ValueHeader {
                field: v.field.clone(),
                aggregation: v.aggregation,
                label: format!("{} of {}", v.aggregation.label(), field_label(self.fields, &v.field)),
            })
            .collect();

        PivotResult {
            row_fields: labels_for(self.fields, self.config.row_fields()),
            column_fields: labels_for(self.fields, self.config.column_fields()),
            value_headers,
            row_headers: self.headers(&self.rows, &row_order),
            column_headers: self.headers(&self.columns, &column_order),
            cells,
            row_totals,
            column_totals,
            grand_total: self.grand_total.finish(),
            total_label: self.options.total_label.clone(),
            record_count: self.record_count,
        }
    }
}

fn labels_for(fields: &[FieldMeta], ids: &[FieldId]) -> Vec<String> {
    ids.iter().map(|id| field_label(fields, id)).collect()
}

/// Whether a record's key along `fields` equals `key`; `None` matches anything.
fn key_matches(record: &RawRecord, fields: &[FieldId], key: Option<&[GroupValue]>) -> bool {
    match key {
        Some(key) => axis_key(record, fields).as_slice() == key,
        None => true,
    }
}

/// Whether a record passes every filter.
fn passes_filters(record: &RawRecord, filters: &[FilterSpec]) -> bool {
    filters.iter().all(|f| f.matches(record))
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Calculates the cross-tab with default options.
///
/// Returns `None` when there is nothing to display: no value fields are
/// configured, or no record survives the filters.
pub fn calculate_pivot(records: &[RawRecord], config: &PivotConfig, fields: &[FieldMeta]) -> Option<PivotResult> {
    calculate_pivot_with(records, config, fields, &PivotOptions::default())
}

/// Calculates the cross-tab with explicit display options.
pub fn calculate_pivot_with(
    records: &[RawRecord],
    config: &PivotConfig,
    fields: &[FieldMeta],
    options: &PivotOptions,
) -> Option<PivotResult> {
    if config.value_fields().is_empty() {
        debug!(target: "pivot", "no value fields configured for '{}', nothing to calculate", config.data_source_id());
        return None;
    }

    let mut calculator = PivotCalculator::new(config, fields, options);
    for record in records.iter().filter(|r| passes_filters(r, config.filters())) {
        calculator.accumulate(record);
    }

    if calculator.record_count == 0 {
        debug!(
            target: "pivot",
            "no records left after filtering ({} in, {} filters)",
            records.len(),
            config.filters().len()
        );
        return None;
    }

    trace!(
        target: "pivot",
        "accumulated {} records into {} cells",
        calculator.record_count,
        calculator.cells.len()
    );

    let result = calculator.finish();
    debug!(
        target: "pivot",
        "calculated pivot for '{}': {} rows x {} columns x {} values from {}/{} records",
        config.data_source_id(),
        result.row_count(),
        result.column_count(),
        result.value_count(),
        result.record_count,
        records.len()
    );
    Some(result)
}

/// Finds the filtered records behind a cell or total.
///
/// `row_key` / `column_key` of `None` match any row / column, so
/// `(Some(row), None)` drills into a row total and `(None, None)` into the
/// grand total. At most `max_records` indices are returned.
pub fn drill_down(
    records: &[RawRecord],
    config: &PivotConfig,
    row_key: Option<&[GroupValue]>,
    column_key: Option<&[GroupValue]>,
    max_records: usize,
) -> DrillDownResult {
    let mut result = DrillDownResult::new(max_records);

    for (index, record) in records.iter().enumerate() {
        if !passes_filters(record, config.filters())
            || !key_matches(record, config.row_fields(), row_key)
            || !key_matches(record, config.column_fields(), column_key)
        {
            continue;
        }
        result.total_count += 1;
        if result.record_indices.len() < max_records {
            result.record_indices.push(index);
        }
    }

    result.is_truncated = result.total_count > max_records;
    result
}
