use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

use t81_gate::core::contract::CapabilityContract;
use t81_gate::core::report::{BenchReport, write_report};
use t81_gate::core::vm::{snapshot_state_hash, state_hash_line};
use t81_gate::gates::perf::render_workload;

fn shipped_contract_text() -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("docs/contracts/vm-compatibility.json");
    fs::read_to_string(path).unwrap()
}

/// Benchmark contract parsing and decoding, the per-invocation cost of
/// `t81-gate contract` before any rule runs.
fn bench_contract_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("contract_decode");
    group.measurement_time(Duration::from_secs(10));

    let text = shipped_contract_text();

    group.bench_function("parse_value", |b| {
        b.iter(|| {
            let value: serde_json::Value = serde_json::from_str(black_box(&text)).unwrap();
            black_box(value);
        });
    });

    group.bench_function("decode_typed", |b| {
        b.iter(|| {
            let contract: CapabilityContract = serde_json::from_str(black_box(&text)).unwrap();
            black_box(contract);
        });
    });

    group.finish();
}

/// Benchmark workload rendering and snapshot parsing, the fixed overhead
/// around every measured perf run.
fn bench_snapshot_plumbing(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_plumbing");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("render_workload", |b| {
        b.iter(|| {
            black_box(render_workload(black_box(1_000_000)));
        });
    });

    // Long trace output with the hash line at the very end, the worst
    // case for the line scanners.
    let mut long_output = String::new();
    for step in 0..10_000 {
        long_output.push_str(&format!("Trace step {}: Add r2 r2 r1\n", step));
    }
    long_output.push_str("STATE_HASH 0x9c3f6a2e44b1d08e\n");

    group.bench_function("snapshot_state_hash", |b| {
        b.iter(|| {
            black_box(snapshot_state_hash(black_box(&long_output)));
        });
    });

    group.bench_function("state_hash_line", |b| {
        b.iter(|| {
            black_box(state_hash_line(black_box(&long_output)));
        });
    });

    group.finish();
}

/// Benchmark report serialization and write, paid once per perf run.
fn bench_report_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_write");
    group.measurement_time(Duration::from_secs(10));

    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("report.json");
    let report = BenchReport {
        run_id: "01J9Z0A1B2C3D4E5F6G7H8J9K0".to_string(),
        suite: "vm-runtime-bench".to_string(),
        profile_id: "countdown-1e6".to_string(),
        vm_bin: "build/t81vm".to_string(),
        iterations: 1_000_000,
        expected_steps: 4_000_001,
        max_steps: 5_000_000,
        warmup_runs: 1,
        measure_runs: 5,
        timings_seconds: vec![1.58, 1.61, 1.59, 1.63, 1.60],
        state_hash: "0x9c3f6a2e44b1d08e".to_string(),
        median_seconds: 1.60,
        median_instructions_per_sec: 2_500_000.63,
        min_observed_instructions_per_sec: 2_453_988.35,
        baseline_floor_instructions_per_sec: 100_000.0,
        regression_floor_instructions_per_sec: None,
    };

    group.bench_function("write_report", |b| {
        b.iter(|| {
            write_report(black_box(&out), black_box(&report)).unwrap();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_contract_decode,
    bench_snapshot_plumbing,
    bench_report_write
);
criterion_main!(benches);
