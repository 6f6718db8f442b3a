//! FILENAME: pivot-engine/src/record.rs
//! Raw records - flat rows fetched by the hosting system.
//!
//! Records are held only for the duration of one computation; the engine
//! never caches them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::catalog::{find_field, FieldId, FieldMeta};
use crate::error::IngestError;
use crate::value::Scalar;

static NULL: Scalar = Scalar::Null;

/// A flat mapping from field id to a tagged scalar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord {
    values: FxHashMap<FieldId, Scalar>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, field: &str, value: impl Into<Scalar>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Scalar>) {
        self.values.insert(field.to_string(), value.into());
    }

    /// Value of a field; absent fields read as `Null`.
    pub fn get(&self, field: &str) -> &Scalar {
        self.values.get(field).unwrap_or(&NULL)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Tags one JSON object using the data types declared in `fields`.
    pub fn from_json(value: &JsonValue, fields: &[FieldMeta]) -> Option<Self> {
        let object = value.as_object()?;
        let mut record = RawRecord::new();
        for (key, raw) in object {
            let data_type = find_field(fields, key).map(|f| f.data_type);
            record.values.insert(key.clone(), Scalar::from_json(raw, data_type));
        }
        Some(record)
    }
}

/// Ingests a fetched JSON array of flat objects.
pub fn records_from_json(value: &JsonValue, fields: &[FieldMeta]) -> Result<Vec<RawRecord>, IngestError> {
    let rows = value.as_array().ok_or(IngestError::NotAnArray)?;
    rows.iter()
        .enumerate()
        .map(|(index, row)| RawRecord::from_json(row, fields).ok_or(IngestError::NotAnObject { index }))
        .collect()
}

/// Parses and ingests a JSON document in one step.
pub fn records_from_json_str(json: &str, fields: &[FieldMeta]) -> Result<Vec<RawRecord>, IngestError> {
    let value: JsonValue = serde_json::from_str(json)?;
    records_from_json(&value, fields)
}
