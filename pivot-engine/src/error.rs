//! FILENAME: pivot-engine/src/error.rs

use thiserror::Error;

use crate::catalog::{DataSourceId, FieldId};
use crate::definition::{AggregationKind, FilterOperator, ZoneKind};

/// Why a configuration change was rejected. The input config is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Field '{field}' is already used in the {zone:?} zone")]
    AlreadyUsed { field: FieldId, zone: ZoneKind },

    #[error("Field '{field}' cannot be placed in the {zone:?} zone")]
    WrongZoneForType { field: FieldId, zone: ZoneKind },

    #[error("Field '{0}' is not in the Values zone")]
    NotInValueZone(FieldId),

    #[error("Data source not found: {0}")]
    UnknownDataSource(DataSourceId),

    #[error("Field '{field}' not found in data source '{data_source}'")]
    UnknownField { data_source: DataSourceId, field: FieldId },

    #[error("Filter operator {0:?} is not supported")]
    UnsupportedOperator(FilterOperator),

    #[error("{aggregation:?} cannot be applied to non-numeric field '{field}'")]
    UnsupportedAggregation { field: FieldId, aggregation: AggregationKind },
}

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate data source: {0}")]
    DuplicateDataSource(DataSourceId),

    #[error("Duplicate field '{field}' in data source '{data_source}'")]
    DuplicateField { data_source: DataSourceId, field: FieldId },
}

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected an array of records")]
    NotAnArray,

    #[error("Record {index} is not a JSON object")]
    NotAnObject { index: usize },
}
