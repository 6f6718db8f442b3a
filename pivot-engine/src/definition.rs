//! FILENAME: pivot-engine/src/definition.rs
//! Pivot Configuration - the immutable description of a cross-tab.
//!
//! A `PivotConfig` says which fields occupy which zone (rows, columns,
//! values, filters) plus the totals flags. Every mutator is pure: it returns
//! a new config or a typed rejection and never touches `self`.
//!
//! Invariants enforced here and nowhere else:
//! - a field occupies at most one zone at a time
//! - only dimensions go to Rows/Columns, only measures go to Values
//! - Sum/Avg/Min/Max require a numeric measure
//! - filters only use supported operators

use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalog::{DataSourceId, DataType, FieldCatalog, FieldId, FieldMeta};
use crate::error::ConfigError;
use crate::record::RawRecord;
use crate::value::Scalar;

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for value fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AggregationKind {
    #[default]
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

impl AggregationKind {
    pub const ALL: [AggregationKind; 5] = [
        AggregationKind::Sum,
        AggregationKind::Avg,
        AggregationKind::Count,
        AggregationKind::Min,
        AggregationKind::Max,
    ];

    /// Display name used in value headers ("Sum of ...").
    pub fn label(self) -> &'static str {
        match self {
            AggregationKind::Sum => "Sum",
            AggregationKind::Avg => "Average",
            AggregationKind::Count => "Count",
            AggregationKind::Min => "Min",
            AggregationKind::Max => "Max",
        }
    }

    /// Whether the aggregation is legal for fields of `data_type`.
    pub fn supports(self, data_type: DataType) -> bool {
        match self {
            AggregationKind::Count => true,
            AggregationKind::Sum
            | AggregationKind::Avg
            | AggregationKind::Min
            | AggregationKind::Max => data_type == DataType::Numeric,
        }
    }
}

/// A measure placed in the Values zone with its aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueField {
    pub field: FieldId,
    pub aggregation: AggregationKind,
}

// ============================================================================
// FILTERS
// ============================================================================

/// Kind of comparison a filter performs, without its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    Between,
}

impl FilterOperator {
    /// Only `Equals` is evaluated today; the rest are rejected when configured.
    pub fn is_supported(self) -> bool {
        matches!(self, FilterOperator::Equals)
    }
}

/// A filter comparison together with its operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterCondition {
    Equals(Scalar),
    NotEquals(Scalar),
    Contains(String),
    /// Inclusive range.
    Between { low: Scalar, high: Scalar },
}

impl FilterCondition {
    pub fn operator(&self) -> FilterOperator {
        match self {
            FilterCondition::Equals(_) => FilterOperator::Equals,
            FilterCondition::NotEquals(_) => FilterOperator::NotEquals,
            FilterCondition::Contains(_) => FilterOperator::Contains,
            FilterCondition::Between { .. } => FilterOperator::Between,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub field: FieldId,
    pub condition: FilterCondition,
}

impl FilterSpec {
    pub fn equals(field: &str, value: impl Into<Scalar>) -> Self {
        FilterSpec {
            field: field.to_string(),
            condition: FilterCondition::Equals(value.into()),
        }
    }

    pub fn operator(&self) -> FilterOperator {
        self.condition.operator()
    }

    /// Whether a record passes this filter.
    /// `Equals(Null)` matches records where the field is absent or null.
    /// Unsupported conditions never get past configuration and match nothing.
    pub fn matches(&self, record: &RawRecord) -> bool {
        match &self.condition {
            FilterCondition::Equals(value) => record.get(&self.field) == value,
            FilterCondition::NotEquals(_)
            | FilterCondition::Contains(_)
            | FilterCondition::Between { .. } => false,
        }
    }
}

// ============================================================================
// ZONES
// ============================================================================

/// Target zone for `add_field`. The Values zone carries the initial aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Rows,
    Columns,
    Values(AggregationKind),
}

impl Zone {
    pub fn kind(self) -> ZoneKind {
        match self {
            Zone::Rows => ZoneKind::Rows,
            Zone::Columns => ZoneKind::Columns,
            Zone::Values(_) => ZoneKind::Values,
        }
    }
}

/// The four zones a field can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ZoneKind {
    Rows,
    Columns,
    Values,
    Filters,
}

// ============================================================================
// PIVOT CONFIG
// ============================================================================

fn default_true() -> bool {
    true
}

/// The validated, immutable configuration of one cross-tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotConfig {
    data_source_id: DataSourceId,

    /// Row dimensions, outer to inner.
    #[serde(default)]
    row_fields: Vec<FieldId>,

    /// Column dimensions, outer to inner.
    #[serde(default)]
    column_fields: Vec<FieldId>,

    #[serde(default)]
    value_fields: Vec<ValueField>,

    /// Conjunctive filters applied before grouping.
    #[serde(default)]
    filters: Vec<FilterSpec>,

    #[serde(default = "default_true")]
    show_row_totals: bool,

    #[serde(default = "default_true")]
    show_column_totals: bool,
}

impl PivotConfig {
    /// A config with every zone empty and both totals enabled.
    pub fn empty(data_source_id: &str) -> Self {
        PivotConfig {
            data_source_id: data_source_id.to_string(),
            row_fields: Vec::new(),
            column_fields: Vec::new(),
            value_fields: Vec::new(),
            filters: Vec::new(),
            show_row_totals: true,
            show_column_totals: true,
        }
    }

    /// The starter config shown on first render: the source's first
    /// dimension in Rows and its first numeric measure summed in Values.
    /// Sources lacking either yield the empty config.
    pub fn create_default(catalog: &FieldCatalog, data_source_id: &str) -> Result<Self, ConfigError> {
        let source = catalog
            .data_source(data_source_id)
            .ok_or_else(|| reject(ConfigError::UnknownDataSource(data_source_id.to_string())))?;

        let mut config = PivotConfig::empty(data_source_id);
        let dimension = source.dimensions().next();
        let measure = source.measures().find(|m| m.data_type == DataType::Numeric);

        if let (Some(dimension), Some(measure)) = (dimension, measure) {
            config.row_fields.push(dimension.id.clone());
            config.value_fields.push(ValueField {
                field: measure.id.clone(),
                aggregation: AggregationKind::Sum,
            });
        }
        Ok(config)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn data_source_id(&self) -> &str {
        &self.data_source_id
    }

    pub fn row_fields(&self) -> &[FieldId] {
        &self.row_fields
    }

    pub fn column_fields(&self) -> &[FieldId] {
        &self.column_fields
    }

    pub fn value_fields(&self) -> &[ValueField] {
        &self.value_fields
    }

    pub fn filters(&self) -> &[FilterSpec] {
        &self.filters
    }

    pub fn show_row_totals(&self) -> bool {
        self.show_row_totals
    }

    pub fn show_column_totals(&self) -> bool {
        self.show_column_totals
    }

    /// The zone currently holding `field`, if any.
    pub fn zone_of(&self, field: &str) -> Option<ZoneKind> {
        if self.row_fields.iter().any(|f| f == field) {
            Some(ZoneKind::Rows)
        } else if self.column_fields.iter().any(|f| f == field) {
            Some(ZoneKind::Columns)
        } else if self.value_fields.iter().any(|v| v.field == field) {
            Some(ZoneKind::Values)
        } else if self.filters.iter().any(|f| f.field == field) {
            Some(ZoneKind::Filters)
        } else {
            None
        }
    }

    /// Whether every zone is empty.
    pub fn is_empty(&self) -> bool {
        self.row_fields.is_empty()
            && self.column_fields.is_empty()
            && self.value_fields.is_empty()
            && self.filters.is_empty()
    }

    // ------------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------------

    /// Places `field` in `zone`.
    pub fn add_field(&self, catalog: &FieldCatalog, field: &str, zone: Zone) -> Result<Self, ConfigError> {
        let meta = self.lookup(catalog, field)?;

        if let Some(existing) = self.zone_of(field) {
            return Err(reject(ConfigError::AlreadyUsed {
                field: field.to_string(),
                zone: existing,
            }));
        }

        let mut next = self.clone();
        match zone {
            Zone::Rows | Zone::Columns => {
                if !meta.is_dimension() {
                    return Err(reject(ConfigError::WrongZoneForType {
                        field: field.to_string(),
                        zone: zone.kind(),
                    }));
                }
                if zone == Zone::Rows {
                    next.row_fields.push(meta.id.clone());
                } else {
                    next.column_fields.push(meta.id.clone());
                }
            }
            Zone::Values(aggregation) => {
                if !meta.is_measure() {
                    return Err(reject(ConfigError::WrongZoneForType {
                        field: field.to_string(),
                        zone: ZoneKind::Values,
                    }));
                }
                check_aggregation(meta, aggregation)?;
                next.value_fields.push(ValueField {
                    field: meta.id.clone(),
                    aggregation,
                });
            }
        }
        Ok(next)
    }

    /// Removes `field` from whichever zone holds it. Absent fields are a no-op.
    pub fn remove_field(&self, field: &str) -> Self {
        let mut next = self.clone();
        next.row_fields.retain(|f| f != field);
        next.column_fields.retain(|f| f != field);
        next.value_fields.retain(|v| v.field != field);
        next.filters.retain(|f| f.field != field);
        next
    }

    /// Moves `field` to `zone`, or rejects without changing anything.
    pub fn move_field(&self, catalog: &FieldCatalog, field: &str, zone: Zone) -> Result<Self, ConfigError> {
        self.remove_field(field).add_field(catalog, field, zone)
    }

    /// Changes the aggregation of a field already in the Values zone.
    pub fn set_aggregation(
        &self,
        catalog: &FieldCatalog,
        field: &str,
        aggregation: AggregationKind,
    ) -> Result<Self, ConfigError> {
        let position = self
            .value_fields
            .iter()
            .position(|v| v.field == field)
            .ok_or_else(|| reject(ConfigError::NotInValueZone(field.to_string())))?;

        let meta = self.lookup(catalog, field)?;
        check_aggregation(meta, aggregation)?;

        let mut next = self.clone();
        next.value_fields[position].aggregation = aggregation;
        Ok(next)
    }

    /// Adds or replaces the filter on `field`.
    pub fn set_filter(
        &self,
        catalog: &FieldCatalog,
        field: &str,
        condition: FilterCondition,
    ) -> Result<Self, ConfigError> {
        let meta = self.lookup(catalog, field)?;

        let operator = condition.operator();
        if !operator.is_supported() {
            return Err(reject(ConfigError::UnsupportedOperator(operator)));
        }

        match self.zone_of(field) {
            None | Some(ZoneKind::Filters) => {}
            Some(existing) => {
                return Err(reject(ConfigError::AlreadyUsed {
                    field: field.to_string(),
                    zone: existing,
                }));
            }
        }

        let filter = FilterSpec {
            field: meta.id.clone(),
            condition,
        };
        let mut next = self.clone();
        match next.filters.iter_mut().find(|f| f.field == field) {
            Some(existing) => *existing = filter,
            None => next.filters.push(filter),
        }
        Ok(next)
    }

    /// Drops the filter on `field`. Absent filters are a no-op.
    pub fn remove_filter(&self, field: &str) -> Self {
        let mut next = self.clone();
        next.filters.retain(|f| f.field != field);
        next
    }

    pub fn set_totals(&self, show_row_totals: bool, show_column_totals: bool) -> Self {
        let mut next = self.clone();
        next.show_row_totals = show_row_totals;
        next.show_column_totals = show_column_totals;
        next
    }

    /// Switches to another data source. Field ids are not portable across
    /// sources, so every zone is reset to that source's default.
    pub fn with_data_source(&self, catalog: &FieldCatalog, data_source_id: &str) -> Result<Self, ConfigError> {
        Self::create_default(catalog, data_source_id)
    }

    /// Re-checks every invariant, for configs that did not come from the
    /// mutators (e.g. deserialized templates).
    pub fn validate(&self, catalog: &FieldCatalog) -> Result<(), ConfigError> {
        if catalog.data_source(&self.data_source_id).is_none() {
            return Err(reject(ConfigError::UnknownDataSource(self.data_source_id.clone())));
        }

        let mut rebuilt = PivotConfig::empty(&self.data_source_id);
        for field in &self.row_fields {
            rebuilt = rebuilt.add_field(catalog, field, Zone::Rows)?;
        }
        for field in &self.column_fields {
            rebuilt = rebuilt.add_field(catalog, field, Zone::Columns)?;
        }
        for value in &self.value_fields {
            rebuilt = rebuilt.add_field(catalog, &value.field, Zone::Values(value.aggregation))?;
        }
        for filter in &self.filters {
            if rebuilt.filters.iter().any(|f| f.field == filter.field) {
                return Err(reject(ConfigError::AlreadyUsed {
                    field: filter.field.clone(),
                    zone: ZoneKind::Filters,
                }));
            }
            rebuilt = rebuilt.set_filter(catalog, &filter.field, filter.condition.clone())?;
        }
        Ok(())
    }

    fn lookup<'a>(&self, catalog: &'a FieldCatalog, field: &str) -> Result<&'a FieldMeta, ConfigError> {
        catalog.field(&self.data_source_id, field).ok_or_else(|| {
            reject(ConfigError::UnknownField {
                data_source: self.data_source_id.clone(),
                field: field.to_string(),
            })
        })
    }
}

fn check_aggregation(meta: &FieldMeta, aggregation: AggregationKind) -> Result<(), ConfigError> {
    if aggregation.supports(meta.data_type) {
        Ok(())
    } else {
        Err(reject(ConfigError::UnsupportedAggregation {
            field: meta.id.clone(),
            aggregation,
        }))
    }
}

fn reject(err: ConfigError) -> ConfigError {
    debug!(target: "pivot", "config change rejected: {}", err);
    err
}
