//! FILENAME: pivot-engine/src/cache.rs
//! Grouping and accumulation primitives used during one calculation.
//!
//! - `GroupValue`: hashable form of a dimension value (one key component)
//! - `AxisKey`: ordered tuple of group values along the row or column fields
//! - `AxisIndex`: first-seen interning of axis keys
//! - `Accumulator`: running state of one aggregation

use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::catalog::FieldId;
use crate::definition::{AggregationKind, ValueField};
use crate::record::RawRecord;
use crate::value::{Scalar, DATE_FORMAT};

// ============================================================================
// GROUP VALUES
// ============================================================================

/// Wrapper around f64 that implements Eq and Hash for use as map keys.
/// NaN values are treated as equal to each other; -0.0 equals 0.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl Hash for OrderedFloat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

/// One component of a row or column key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupValue {
    /// The record had no value for the dimension.
    Missing,
    Number(OrderedFloat),
    Text(String),
    Date(NaiveDate),
    Boolean(bool),
}

impl From<&Scalar> for GroupValue {
    fn from(value: &Scalar) -> Self {
        match value {
            Scalar::Null => GroupValue::Missing,
            Scalar::Number(n) => GroupValue::Number(OrderedFloat(*n)),
            Scalar::Text(s) => GroupValue::Text(s.clone()),
            Scalar::Date(d) => GroupValue::Date(*d),
            Scalar::Boolean(b) => GroupValue::Boolean(*b),
        }
    }
}

impl From<&str> for GroupValue {
    fn from(value: &str) -> Self {
        GroupValue::Text(value.to_string())
    }
}

impl GroupValue {
    /// Display label; `Missing` renders as `missing_label`.
    pub fn label(&self, missing_label: &str) -> String {
        match self {
            GroupValue::Missing => missing_label.to_string(),
            GroupValue::Number(n) => format!("{}", n.0),
            GroupValue::Text(s) => s.clone(),
            GroupValue::Date(d) => d.format(DATE_FORMAT).to_string(),
            GroupValue::Boolean(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        }
    }

    /// Ascending order: numbers, dates, text, booleans, then missing.
    pub fn compare(&self, other: &GroupValue) -> Ordering {
        fn rank(v: &GroupValue) -> u8 {
            match v {
                GroupValue::Number(_) => 0,
                GroupValue::Date(_) => 1,
                GroupValue::Text(_) => 2,
                GroupValue::Boolean(_) => 3,
                GroupValue::Missing => 4,
            }
        }

        match (self, other) {
            (GroupValue::Number(a), GroupValue::Number(b)) => a.0.total_cmp(&b.0),
            (GroupValue::Date(a), GroupValue::Date(b)) => a.cmp(b),
            (GroupValue::Text(a), GroupValue::Text(b)) => a.cmp(b),
            (GroupValue::Boolean(a), GroupValue::Boolean(b)) => a.cmp(b),
            _ => rank(self).cmp(&rank(other)),
        }
    }
}

// ============================================================================
// AXIS KEYS
// ============================================================================

/// Ordered tuple of dimension values identifying a row or column bucket.
pub type AxisKey = SmallVec<[GroupValue; 4]>;

/// Builds the key of `record` along `fields`, in configured order.
pub fn axis_key(record: &RawRecord, fields: &[FieldId]) -> AxisKey {
    fields.iter().map(|f| GroupValue::from(record.get(f))).collect()
}

/// Lexicographic comparison of two axis keys.
pub fn compare_keys(a: &[GroupValue], b: &[GroupValue]) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.compare(y))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

/// Interns axis keys in first-seen order.
///
/// Alongside whole keys it ranks each level's values by first appearance,
/// so composite keys can be displayed grouped by their leading levels.
#[derive(Debug, Default)]
pub struct AxisIndex {
    key_to_index: FxHashMap<AxisKey, usize>,
    keys: Vec<AxisKey>,
    level_ranks: Vec<FxHashMap<GroupValue, usize>>,
}

impl AxisIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of `key` and whether it was seen for the first time.
    pub fn intern(&mut self, key: AxisKey) -> (usize, bool) {
        if let Some(&index) = self.key_to_index.get(&key) {
            return (index, false);
        }
        if self.level_ranks.len() < key.len() {
            self.level_ranks.resize_with(key.len(), FxHashMap::default);
        }
        for (ranks, value) in self.level_ranks.iter_mut().zip(key.iter()) {
            let next = ranks.len();
            ranks.entry(value.clone()).or_insert(next);
        }
        let index = self.keys.len();
        self.keys.push(key.clone());
        self.key_to_index.insert(key, index);
        (index, true)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[AxisKey] {
        &self.keys
    }

    /// Internal indices in ascending key order.
    pub fn sorted_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.keys.len()).collect();
        order.sort_by(|&a, &b| compare_keys(&self.keys[a], &self.keys[b]));
        order
    }

    /// Internal indices ordered level by level on first-seen rank.
    /// For single-level keys this is plain insertion order.
    pub fn first_seen_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.keys.len()).collect();
        order.sort_by_key(|&index| self.rank_tuple(index));
        order
    }

    fn rank_tuple(&self, index: usize) -> SmallVec<[usize; 4]> {
        self.keys[index]
            .iter()
            .zip(self.level_ranks.iter())
            .map(|(value, ranks)| ranks.get(value).copied().unwrap_or(usize::MAX))
            .collect()
    }
}

// ============================================================================
// ACCUMULATORS
// ============================================================================

/// Running state of one aggregation over the records of a bucket.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Sum(f64),
    Count(u64),
    Avg { sum: f64, count: u64 },
    Min(Option<f64>),
    Max(Option<f64>),
}

impl Accumulator {
    pub fn new(kind: AggregationKind) -> Self {
        match kind {
            AggregationKind::Sum => Accumulator::Sum(0.0),
            AggregationKind::Count => Accumulator::Count(0),
            AggregationKind::Avg => Accumulator::Avg { sum: 0.0, count: 0 },
            AggregationKind::Min => Accumulator::Min(None),
            AggregationKind::Max => Accumulator::Max(None),
        }
    }

    /// Feeds one record. `value` is the record's numeric value for the
    /// measure, `None` when absent or malformed.
    pub fn add(&mut self, value: Option<f64>) {
        match self {
            Accumulator::Sum(sum) => {
                if let Some(v) = value {
                    *sum += v;
                }
            }
            Accumulator::Count(count) => *count += 1,
            Accumulator::Avg { sum, count } => {
                if let Some(v) = value {
                    *sum += v;
                    *count += 1;
                }
            }
            Accumulator::Min(min) => {
                if let Some(v) = value {
                    *min = Some(min.map_or(v, |m| m.min(v)));
                }
            }
            Accumulator::Max(max) => {
                if let Some(v) = value {
                    *max = Some(max.map_or(v, |m| m.max(v)));
                }
            }
        }
    }

    /// Final value. `None` when the aggregation has nothing to report
    /// (average of zero values, extremum of no values).
    pub fn finish(&self) -> Option<f64> {
        match self {
            Accumulator::Sum(sum) => Some(*sum),
            Accumulator::Count(count) => Some(*count as f64),
            Accumulator::Avg { sum, count } => {
                if *count > 0 {
                    Some(sum / *count as f64)
                } else {
                    None
                }
            }
            Accumulator::Min(min) => *min,
            Accumulator::Max(max) => *max,
        }
    }
}

/// One accumulator per configured value field.
#[derive(Debug, Clone, PartialEq)]
pub struct AccumulatorSet(SmallVec<[Accumulator; 4]>);

impl AccumulatorSet {
    pub fn new(value_fields: &[ValueField]) -> Self {
        AccumulatorSet(value_fields.iter().map(|v| Accumulator::new(v.aggregation)).collect())
    }

    /// Feeds one record's measure values, aligned with the value fields.
    pub fn add(&mut self, values: &[Option<f64>]) {
        for (acc, value) in self.0.iter_mut().zip(values) {
            acc.add(*value);
        }
    }

    pub fn finish(&self) -> Vec<Option<f64>> {
        self.0.iter().map(Accumulator::finish).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(kind: AggregationKind, values: &[Option<f64>]) -> Option<f64> {
        let mut acc = Accumulator::new(kind);
        for v in values {
            acc.add(*v);
        }
        acc.finish()
    }

    #[test]
    fn test_accumulators_skip_absent_values() {
        let values = [Some(4.0), None, Some(-2.0), Some(10.0)];
        assert_eq!(feed(AggregationKind::Sum, &values), Some(12.0));
        assert_eq!(feed(AggregationKind::Count, &values), Some(4.0));
        assert_eq!(feed(AggregationKind::Avg, &values), Some(4.0));
        assert_eq!(feed(AggregationKind::Min, &values), Some(-2.0));
        assert_eq!(feed(AggregationKind::Max, &values), Some(10.0));
    }

    #[test]
    fn test_accumulators_with_no_numeric_values() {
        let values = [None, None];
        assert_eq!(feed(AggregationKind::Sum, &values), Some(0.0));
        assert_eq!(feed(AggregationKind::Count, &values), Some(2.0));
        assert_eq!(feed(AggregationKind::Avg, &values), None);
        assert_eq!(feed(AggregationKind::Min, &values), None);
        assert_eq!(feed(AggregationKind::Max, &values), None);
    }

    #[test]
    fn test_missing_dimension_maps_to_one_key() {
        let fields = vec!["region".to_string(), "zone".to_string()];
        let a = axis_key(&RawRecord::new().with("region", "A"), &fields);
        let b = axis_key(&RawRecord::new().with("region", "A").with("zone", Scalar::Null), &fields);
        assert_eq!(a, b);
        assert_eq!(a[1], GroupValue::Missing);
        assert_eq!(a[1].label("(blank)"), "(blank)");
    }

    #[test]
    fn test_axis_index_first_seen_and_sorted() {
        let mut index = AxisIndex::new();
        for label in ["North", "South", "East", "North"] {
            let key: AxisKey = std::iter::once(GroupValue::from(label)).collect();
            index.intern(key);
        }
        assert_eq!(index.len(), 3);
        assert_eq!(index.first_seen_order(), vec![0, 1, 2]);
        assert_eq!(index.sorted_order(), vec![2, 0, 1]);
    }

    #[test]
    fn test_first_seen_order_groups_composite_keys_by_level() {
        let mut index = AxisIndex::new();
        let keys = [("Q1", "Base"), ("Q2", "Base"), ("Q1", "Peak"), ("Q2", "Peak")];
        for (quarter, product) in keys {
            let key: AxisKey = [GroupValue::from(quarter), GroupValue::from(product)]
                .into_iter()
                .collect();
            index.intern(key);
        }
        // Q1 keys stay together even though Q2/Base arrived in between.
        assert_eq!(index.first_seen_order(), vec![0, 2, 1, 3]);

        // a value first seen at a deeper position keeps its rank for later parents
        let mut index = AxisIndex::new();
        for (quarter, product) in [("Q2", "Peak"), ("Q1", "Base"), ("Q1", "Peak")] {
            let key: AxisKey = [GroupValue::from(quarter), GroupValue::from(product)]
                .into_iter()
                .collect();
            index.intern(key);
        }
        assert_eq!(index.first_seen_order(), vec![0, 2, 1]);
    }

    #[test]
    fn test_group_value_ordering_puts_missing_last() {
        let mut values = vec![
            GroupValue::Missing,
            GroupValue::from("b"),
            GroupValue::Number(OrderedFloat(2.0)),
            GroupValue::from("a"),
            GroupValue::Number(OrderedFloat(-1.0)),
        ];
        values.sort_by(|a, b| a.compare(b));
        assert_eq!(
            values,
            vec![
                GroupValue::Number(OrderedFloat(-1.0)),
                GroupValue::Number(OrderedFloat(2.0)),
                GroupValue::from("a"),
                GroupValue::from("b"),
                GroupValue::Missing,
            ]
        );
    }
}
