//! FILENAME: pivot-engine/src/options.rs
//! Engine options - display-level settings that never change aggregate values.

use serde::{Deserialize, Serialize};

/// Order in which row and column keys are enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyOrder {
    /// First-encountered order over the filtered records.
    #[default]
    FirstSeen,
    /// Ascending by key value, component by component; blanks sort last.
    Ascending,
}

fn default_missing_label() -> String {
    "(blank)".to_string()
}

fn default_total_label() -> String {
    "Total".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotOptions {
    #[serde(default)]
    pub key_order: KeyOrder,

    /// Label shown for records missing a dimension value.
    #[serde(default = "default_missing_label")]
    pub missing_label: String,

    /// Label of the trailing total row and total columns.
    #[serde(default = "default_total_label")]
    pub total_label: String,
}

impl Default for PivotOptions {
    fn default() -> Self {
        PivotOptions {
            key_order: KeyOrder::FirstSeen,
            missing_label: default_missing_label(),
            total_label: default_total_label(),
        }
    }
}
