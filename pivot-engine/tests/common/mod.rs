//! FILENAME: tests/common/mod.rs
//! Shared fixtures for pivot-engine integration tests.

#![allow(dead_code)]

use pivot_engine::{
    AggregationKind, DataSource, DataType, FieldCatalog, FieldMeta, PivotConfig, RawRecord, Zone,
};

pub const SOURCE: &str = "sales";

pub fn catalog() -> FieldCatalog {
    FieldCatalog::new(vec![DataSource::new(
        SOURCE,
        "Sales",
        vec![
            FieldMeta::dimension("region", "Region", DataType::Text),
            FieldMeta::dimension("quarter", "Quarter", DataType::Text),
            FieldMeta::measure("amount", "Amount"),
        ],
    )])
    .expect("fixture catalog is valid")
}

pub fn fields() -> Vec<FieldMeta> {
    catalog().fields(SOURCE).expect("fixture source exists").to_vec()
}

pub fn sale(region: &str, amount: f64) -> RawRecord {
    RawRecord::new().with("region", region).with("amount", amount)
}

pub fn sale_in(region: &str, quarter: &str, amount: f64) -> RawRecord {
    sale(region, amount).with("quarter", quarter)
}

/// Region A: [10, 20], Region B: [30, 40].
pub fn two_region_sales() -> Vec<RawRecord> {
    vec![sale("A", 10.0), sale("A", 20.0), sale("B", 30.0), sale("B", 40.0)]
}

/// Region A: [10, 10, 10], Region B: [100].
pub fn uneven_sales() -> Vec<RawRecord> {
    vec![sale("A", 10.0), sale("A", 10.0), sale("A", 10.0), sale("B", 100.0)]
}

/// Twelve sales spread unevenly over regions and quarters.
pub fn quarterly_sales() -> Vec<RawRecord> {
    vec![
        sale_in("North", "Q1", 120.0),
        sale_in("North", "Q1", 80.0),
        sale_in("North", "Q2", 45.5),
        sale_in("South", "Q1", 300.0),
        sale_in("South", "Q3", 12.0),
        sale_in("South", "Q3", 18.0),
        sale_in("South", "Q3", 30.0),
        sale_in("East", "Q2", 7.0),
        sale_in("East", "Q4", 990.0),
        sale_in("North", "Q4", 1.5),
        RawRecord::new().with("region", "East").with("quarter", "Q4"),
        RawRecord::new().with("region", "West").with("quarter", "Q1").with("amount", "n/a"),
    ]
}

/// Rows by region, one value field.
pub fn region_config(aggregation: AggregationKind) -> PivotConfig {
    PivotConfig::empty(SOURCE)
        .add_field(&catalog(), "region", Zone::Rows)
        .and_then(|c| c.add_field(&catalog(), "amount", Zone::Values(aggregation)))
        .expect("fixture config is valid")
}
