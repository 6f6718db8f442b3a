//! FILENAME: pivot-engine/src/catalog.rs
//! Field Catalog - read-only metadata describing each data source.
//!
//! Lookups return `Option`: a missing source or field means "no metadata",
//! and callers skip whatever depended on it.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// Field identifier, unique within one data source.
pub type FieldId = String;

/// Data source identifier, unique within a catalog.
pub type DataSourceId = String;

// ============================================================================
// FIELD METADATA
// ============================================================================

/// Capability of a field in the report builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    /// Groupable and filterable; may populate the Rows or Columns zone.
    Dimension,
    /// Aggregable and filterable; may populate the Values zone.
    Measure,
}

/// Storage type of a field's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Numeric,
    Text,
    Date,
    Boolean,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub id: FieldId,
    /// Display label.
    pub name: String,
    pub field_type: FieldType,
    pub data_type: DataType,
}

impl FieldMeta {
    pub fn dimension(id: &str, name: &str, data_type: DataType) -> Self {
        FieldMeta {
            id: id.to_string(),
            name: name.to_string(),
            field_type: FieldType::Dimension,
            data_type,
        }
    }

    /// Creates a numeric measure.
    pub fn measure(id: &str, name: &str) -> Self {
        FieldMeta {
            id: id.to_string(),
            name: name.to_string(),
            field_type: FieldType::Measure,
            data_type: DataType::Numeric,
        }
    }

    pub fn is_dimension(&self) -> bool {
        self.field_type == FieldType::Dimension
    }

    pub fn is_measure(&self) -> bool {
        self.field_type == FieldType::Measure
    }
}

/// Finds a field by id in a flat field list.
pub fn find_field<'a>(fields: &'a [FieldMeta], id: &str) -> Option<&'a FieldMeta> {
    fields.iter().find(|f| f.id == id)
}

/// Display label for a field, falling back to its id when metadata is missing.
pub fn field_label(fields: &[FieldMeta], id: &str) -> String {
    find_field(fields, id)
        .map(|f| f.name.clone())
        .unwrap_or_else(|| id.to_string())
}

// ============================================================================
// DATA SOURCES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: DataSourceId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Fields in display order.
    pub fields: Vec<FieldMeta>,
}

impl DataSource {
    pub fn new(id: &str, name: &str, fields: Vec<FieldMeta>) -> Self {
        DataSource {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            fields,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn field(&self, id: &str) -> Option<&FieldMeta> {
        find_field(&self.fields, id)
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &FieldMeta> {
        self.fields.iter().filter(|f| f.is_dimension())
    }

    pub fn measures(&self) -> impl Iterator<Item = &FieldMeta> {
        self.fields.iter().filter(|f| f.is_measure())
    }
}

/// Ordered registry of data sources and their fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCatalog {
    sources: Vec<DataSource>,
}

impl FieldCatalog {
    /// Builds a catalog, rejecting duplicate source or field identifiers.
    pub fn new(sources: Vec<DataSource>) -> Result<Self, CatalogError> {
        let mut seen_sources = FxHashSet::default();
        for source in &sources {
            if !seen_sources.insert(source.id.as_str()) {
                return Err(CatalogError::DuplicateDataSource(source.id.clone()));
            }
            let mut seen_fields = FxHashSet::default();
            for field in &source.fields {
                if !seen_fields.insert(field.id.as_str()) {
                    return Err(CatalogError::DuplicateField {
                        data_source: source.id.clone(),
                        field: field.id.clone(),
                    });
                }
            }
        }
        Ok(FieldCatalog { sources })
    }

    /// Loads a catalog supplied by the hosting system as a JSON array of sources.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let sources: Vec<DataSource> = serde_json::from_str(json)?;
        Self::new(sources)
    }

    pub fn list_data_sources(&self) -> &[DataSource] {
        &self.sources
    }

    pub fn data_source(&self, id: &str) -> Option<&DataSource> {
        self.sources.iter().find(|s| s.id == id)
    }

    pub fn fields(&self, data_source: &str) -> Option<&[FieldMeta]> {
        self.data_source(data_source).map(|s| s.fields.as_slice())
    }

    pub fn field(&self, data_source: &str, field: &str) -> Option<&FieldMeta> {
        self.data_source(data_source).and_then(|s| s.field(field))
    }

    /// The back-office data sources offered by the custom report builder.
    pub fn electricity_market() -> Self {
        use DataType::{Date, Numeric, Text};

        let day_ahead = DataSource::new(
            "day_ahead",
            "Day-Ahead Market Results",
            vec![
                FieldMeta::dimension("trade_date", "Trade Date", Date),
                FieldMeta::dimension("bidding_zone", "Bidding Zone", Text),
                FieldMeta::dimension("delivery_hour", "Delivery Hour", Numeric),
                FieldMeta::dimension("participant", "Market Participant", Text),
                FieldMeta::measure("clearing_price", "Clearing Price (EUR/MWh)"),
                FieldMeta::measure("cleared_volume", "Cleared Volume (MWh)"),
            ],
        )
        .with_description("Hourly clearing results per bidding zone and participant");

        let balancing = DataSource::new(
            "balancing",
            "Balancing Settlements",
            vec![
                FieldMeta::dimension("settlement_date", "Settlement Date", Date),
                FieldMeta::dimension("balance_group", "Balance Responsible Party", Text),
                FieldMeta::dimension("direction", "Imbalance Direction", Text),
                FieldMeta::measure("imbalance_volume", "Imbalance Volume (MWh)"),
                FieldMeta::measure("imbalance_price", "Imbalance Price (EUR/MWh)"),
                FieldMeta::measure("settlement_amount", "Settlement Amount (EUR)"),
            ],
        )
        .with_description("Per-period imbalance settlement of balance groups");

        let contracts = DataSource::new(
            "contracts",
            "Bilateral Contracts",
            vec![
                FieldMeta::dimension("counterparty", "Counterparty", Text),
                FieldMeta::dimension("product", "Product", Text),
                FieldMeta::dimension("delivery_month", "Delivery Month", Text),
                FieldMeta::dimension("status", "Status", Text),
                FieldMeta::measure("contract_volume", "Contract Volume (MWh)"),
                FieldMeta::measure("contract_price", "Contract Price (EUR/MWh)"),
            ],
        );

        FieldCatalog {
            sources: vec![day_ahead, balancing, contracts],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_missing_is_none() {
        let catalog = FieldCatalog::electricity_market();
        assert!(catalog.data_source("nope").is_none());
        assert!(catalog.field("day_ahead", "nope").is_none());
        assert!(catalog.field("nope", "clearing_price").is_none());
        assert!(catalog.fields("nope").is_none());
    }

    #[test]
    fn test_builtin_catalog_is_valid() {
        let builtin = FieldCatalog::electricity_market();
        let rebuilt = FieldCatalog::new(builtin.list_data_sources().to_vec());
        assert!(rebuilt.is_ok());

        let ids: Vec<&str> = builtin.list_data_sources().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["day_ahead", "balancing", "contracts"]);

        let price = builtin.field("day_ahead", "clearing_price").unwrap();
        assert!(price.is_measure());
        assert_eq!(price.data_type, DataType::Numeric);
    }

    #[test]
    fn test_duplicate_field_rejected() {
        let source = DataSource::new(
            "s",
            "S",
            vec![
                FieldMeta::dimension("a", "A", DataType::Text),
                FieldMeta::measure("a", "A again"),
            ],
        );
        let err = FieldCatalog::new(vec![source]).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateField { .. }));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {
                "id": "sales",
                "name": "Sales",
                "fields": [
                    {"id": "region", "name": "Region", "field_type": "Dimension", "data_type": "Text"},
                    {"id": "amount", "name": "Amount", "field_type": "Measure", "data_type": "Numeric"}
                ]
            }
        ]"#;
        let catalog = FieldCatalog::from_json(json).unwrap();
        assert_eq!(catalog.list_data_sources().len(), 1);
        assert_eq!(catalog.fields("sales").map(|f| f.len()), Some(2));
        assert_eq!(catalog.data_source("sales").and_then(|s| s.description.clone()), None);
    }

    #[test]
    fn test_field_label_falls_back_to_id() {
        let fields = vec![FieldMeta::measure("amount", "Amount")];
        assert_eq!(field_label(&fields, "amount"), "Amount");
        assert_eq!(field_label(&fields, "ghost"), "ghost");
    }
}
