//! FILENAME: pivot-engine/src/lib.rs
//! Cross-tab aggregation engine for the custom report builder.
//!
//! Layers:
//! - `catalog`: Field metadata per data source (WHAT can be placed where)
//! - `definition`: Immutable pivot configuration (what the cross-tab IS)
//! - `record` / `value`: Raw records and their tagged scalars
//! - `cache`: Group keys and accumulators (HOW we aggregate)
//! - `engine`: Calculation entry points (HOW we calculate)
//! - `view`: The computed result (WHAT we hand to renderers and exporters)
//! - `options`: Display settings that never change aggregate values
//! - `template`: Saved, named configurations

pub mod cache;
pub mod catalog;
pub mod definition;
pub mod engine;
pub mod error;
pub mod options;
pub mod record;
pub mod template;
pub mod value;
pub mod view;

pub use cache::{AxisKey, GroupValue, OrderedFloat};
pub use catalog::*;
pub use definition::*;
pub use engine::{calculate_pivot, calculate_pivot_with, drill_down};
pub use error::{CatalogError, ConfigError, IngestError};
pub use options::{KeyOrder, PivotOptions};
pub use record::{records_from_json, records_from_json_str, RawRecord};
pub use template::ReportTemplate;
pub use value::Scalar;
pub use view::*;
