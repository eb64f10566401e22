//! Benchmarks for the aggregation engine
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use sma_landscape::aggregate::{rollup, tally_by, Entity, GroupBy};
use sma_landscape::layout::{account_tree, LayoutConfig, ReferralEdge};
use sma_landscape::record::Record;
use sma_landscape::session::Filters;

const STATES: [&str; 6] = ["CA", "TX", "NY", "FL", "MA", "WA"];
const DRUGS: [&str; 3] = ["Zolgensma", "Spinraza", "Evrysdi"];

fn create_test_records(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| {
            let state = STATES[i % STATES.len()];
            Record {
                patient_id: Some(format!("P{}", i / 3)),
                hcp_id: Some(format!("H{}", i % 400)),
                hcp_name: Some(format!("Dr {}", i % 400)),
                hcp_specialty: Some(
                    if i % 2 == 0 { "Neurology" } else { "Pediatrics" }.to_string(),
                ),
                hcp_state: Some(state.to_string()),
                hco_mdm: Some(format!("M{}", i % 120)),
                hco_name: Some(format!("Account {}", i % 120)),
                hco_tier: Some(((i % 4) + 1).to_string()),
                hco_grouping: Some(if i % 3 == 0 { "Academic" } else { "Community" }.to_string()),
                hco_state: Some(state.to_string()),
                hco_zip: Some(format!("{:05}", 10000 + i % 900)),
                ref_hco_mdm: Some(format!("M{}", (i + 7) % 120)),
                ref_hco_name: Some(format!("Account {}", (i + 7) % 120)),
                ref_hcp_name: Some(format!("Dr {}", (i + 13) % 400)),
                drug_name: Some(DRUGS[i % DRUGS.len()].to_string()),
                year: Some(2022 + (i % 3) as i32),
                quarter: Some(format!("Q{}", (i % 4) + 1)),
                ..Default::default()
            }
        })
        .collect()
}

fn bench_rollup(c: &mut Criterion) {
    let mut group = c.benchmark_group("rollup");

    for size in [1_000, 10_000, 100_000] {
        let records = create_test_records(size);

        group.throughput(Throughput::Elements(size as u64));

        group.bench_function(format!("state_patients_{}", size), |b| {
            b.iter(|| rollup(black_box(&records), GroupBy::State, Entity::Patient))
        });

        group.bench_function(format!("tier_hcos_{}", size), |b| {
            b.iter(|| rollup(black_box(&records), GroupBy::Tier, Entity::Hco))
        });

        group.bench_function(format!("tally_state_{}", size), |b| {
            b.iter(|| tally_by(black_box(&records), GroupBy::State, None, Entity::Patient))
        });
    }

    group.finish();
}

fn bench_filters(c: &mut Criterion) {
    let records = create_test_records(50_000);
    let filters: Filters =
        serde_json::from_str(r#"{"state": "CA", "year": 2023, "relationship": "outside"}"#).unwrap();

    c.bench_function("filters_apply_50000", |b| {
        b.iter(|| filters.apply(black_box(&records), None))
    });
}

fn bench_layout(c: &mut Criterion) {
    let records = create_test_records(20_000);
    let edges = ReferralEdge::from_records(&records);
    let config = LayoutConfig::default();

    c.bench_function("account_tree_layout", |b| {
        b.iter(|| account_tree(black_box("All accounts"), black_box(&edges)).layout(&config))
    });
}

criterion_group!(benches, bench_rollup, bench_filters, bench_layout);
criterion_main!(benches);
