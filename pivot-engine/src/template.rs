//! FILENAME: pivot-engine/src/template.rs
//! Report templates - named, saved pivot configurations.
//!
//! Storage lives outside this crate; templates only need to survive a
//! serde round trip and be re-validated before use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::FieldCatalog;
use crate::definition::PivotConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub config: PivotConfig,
    /// Shipped with the product rather than saved by a user.
    #[serde(default)]
    pub is_preset: bool,
    pub created_at: DateTime<Utc>,
    pub owner_id: String,
}

impl ReportTemplate {
    pub fn new(name: &str, config: PivotConfig, owner_id: &str) -> Self {
        ReportTemplate {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            config,
            is_preset: false,
            created_at: Utc::now(),
            owner_id: owner_id.to_string(),
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn preset(mut self) -> Self {
        self.is_preset = true;
        self
    }

    /// Returns the stored config once it has been checked against the
    /// current catalog. Catalogs change, so stored configs may go stale.
    pub fn resolve(&self, catalog: &FieldCatalog) -> Result<PivotConfig, ConfigError> {
        self.config.validate(catalog)?;
        Ok(self.config.clone())
    }
}
