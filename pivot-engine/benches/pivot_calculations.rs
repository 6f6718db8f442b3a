//! FILENAME: benches/pivot_calculations.rs

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pivot_engine::{calculate_pivot, AggregationKind, FieldCatalog, PivotConfig, RawRecord, Zone};

const ZONES: [&str; 4] = ["DE-LU", "FR", "NL", "AT"];
const PARTICIPANTS: [&str; 5] = ["Alpha", "Borealis", "Cirrus", "Delta", "Etesian"];

fn day_ahead_records(count: usize) -> Vec<RawRecord> {
    (0..count)
        .map(|i| {
            RawRecord::new()
                .with("bidding_zone", ZONES[i % ZONES.len()])
                .with("participant", PARTICIPANTS[(i / 3) % PARTICIPANTS.len()])
                .with("delivery_hour", (i % 24) as f64)
                .with("clearing_price", 40.0 + (i % 97) as f64 * 0.75)
                .with("cleared_volume", 10.0 + (i % 13) as f64)
        })
        .collect()
}

fn bench_calculate_pivot(c: &mut Criterion) {
    let catalog = FieldCatalog::electricity_market();
    let fields = catalog.fields("day_ahead").unwrap_or_default().to_vec();
    let config = PivotConfig::empty("day_ahead")
        .add_field(&catalog, "bidding_zone", Zone::Rows)
        .and_then(|c| c.add_field(&catalog, "participant", Zone::Rows))
        .and_then(|c| c.add_field(&catalog, "delivery_hour", Zone::Columns))
        .and_then(|c| c.add_field(&catalog, "clearing_price", Zone::Values(AggregationKind::Avg)))
        .and_then(|c| c.add_field(&catalog, "cleared_volume", Zone::Values(AggregationKind::Sum)))
        .expect("benchmark config is valid");

    let mut group = c.benchmark_group("calculate_pivot");
    for count in [1_000usize, 10_000, 100_000] {
        let records = day_ahead_records(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &records, |b, records| {
            b.iter(|| calculate_pivot(black_box(records), black_box(&config), black_box(&fields)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_calculate_pivot);
criterion_main!(benches);
