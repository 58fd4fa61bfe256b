//! Determinism and throughput gate. Drives the VM over a synthetic
//! countdown workload, checks the snapshot hash is stable across runs,
//! and compares median throughput against the baseline floors. The
//! report is written before any floor check so a failing run still
//! leaves its numbers on disk.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

use ulid::Ulid;

use crate::core::contract::{load_baseline, PerfBaseline};
use crate::core::error::GateError;
use crate::core::report::{write_report, BenchReport};
use crate::core::vm::{snapshot_state_hash, SystemVm, VmFlags, VmInvoker};

/// Render the countdown workload in the runtime's text program format.
pub fn render_workload(iterations: u64) -> String {
    format!(
        "LoadImm 0 {} 0\n\
         LoadImm 1 1 0\n\
         Add 2 2 1\n\
         Dec 0 0 0\n\
         JumpIfNotZero 2 0 0\n\
         Halt 0 0 0\n",
        iterations
    )
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

fn snapshot_run(
    vm: &dyn VmInvoker,
    program: &Path,
    max_steps: u64,
) -> Result<(f64, String), GateError> {
    let flags = VmFlags {
        trace: false,
        snapshot: true,
        max_steps: Some(max_steps),
    };
    let out = vm.run(program, &flags)?;
    if out.exit_code != 0 {
        return Err(GateError::ExecutionFailure(format!(
            "vm run failed: rc={}\n{}",
            out.exit_code,
            out.stderr.trim()
        )));
    }
    let hash = snapshot_state_hash(&out.stdout).ok_or_else(|| {
        GateError::ExecutionFailure("missing STATE_HASH in snapshot output".to_string())
    })?;
    Ok((out.elapsed.as_secs_f64().max(1e-9), hash))
}

/// Load the baseline and gate the binary at `vm_bin`, writing the report
/// to `report_out`.
pub fn check_perf(vm_bin: &Path, baseline_path: &Path, report_out: &Path) -> Result<(), GateError> {
    let baseline = load_baseline(baseline_path)?;
    let timeout = baseline
        .timeout_seconds
        .filter(|s| *s > 0)
        .map(Duration::from_secs);
    let vm = SystemVm::with_timeout(vm_bin, timeout);
    run_perf(&vm, &baseline, vm_bin, report_out)
}

pub fn run_perf(
    vm: &dyn VmInvoker,
    baseline: &PerfBaseline,
    vm_bin: &Path,
    report_out: &Path,
) -> Result<(), GateError> {
    if baseline.measure_runs == 0 {
        return Err(GateError::SchemaViolation(
            "baseline measure_runs must be at least 1".to_string(),
        ));
    }

    let scratch = tempfile::Builder::new()
        .prefix("t81-gate-perf-")
        .tempdir()?;
    let program = scratch.path().join("runtime_bench.t81");
    fs::write(&program, render_workload(baseline.iterations))?;

    for _ in 0..baseline.warmup_runs {
        snapshot_run(vm, &program, baseline.max_steps)?;
    }

    let mut timings = Vec::with_capacity(baseline.measure_runs as usize);
    let mut hashes = Vec::with_capacity(baseline.measure_runs as usize);
    for _ in 0..baseline.measure_runs {
        let (secs, hash) = snapshot_run(vm, &program, baseline.max_steps)?;
        timings.push(secs);
        hashes.push(hash);
    }

    let distinct: BTreeSet<String> = hashes.iter().cloned().collect();
    if distinct.len() != 1 {
        let listed: Vec<&str> = distinct.iter().map(String::as_str).collect();
        return Err(GateError::NonDeterministic(format!(
            "non-deterministic state hash in perf runs: [{}]",
            listed.join(", ")
        )));
    }
    let state_hash = distinct.into_iter().next().unwrap_or_default();

    let ips: Vec<f64> = timings
        .iter()
        .map(|secs| baseline.expected_steps as f64 / secs)
        .collect();
    let median_ips = median(&ips);
    let min_ips = ips.iter().fold(f64::INFINITY, |acc, v| acc.min(*v));
    let regression_floor = if baseline.reference_median_instructions_per_sec > 0.0
        && baseline.max_regression_ratio > 0.0
    {
        Some(baseline.reference_median_instructions_per_sec * baseline.max_regression_ratio)
    } else {
        None
    };

    let report = BenchReport {
        run_id: Ulid::new().to_string(),
        suite: baseline.suite.clone(),
        profile_id: baseline.profile_id.clone(),
        vm_bin: vm_bin.display().to_string(),
        iterations: baseline.iterations,
        expected_steps: baseline.expected_steps,
        max_steps: baseline.max_steps,
        warmup_runs: baseline.warmup_runs,
        measure_runs: baseline.measure_runs,
        timings_seconds: timings.clone(),
        state_hash: state_hash.clone(),
        median_seconds: median(&timings),
        median_instructions_per_sec: median_ips,
        min_observed_instructions_per_sec: min_ips,
        baseline_floor_instructions_per_sec: baseline.min_instructions_per_sec,
        regression_floor_instructions_per_sec: regression_floor,
    };
    write_report(report_out, &report)?;

    if let Some(expected) = baseline.expected_state_hash.as_deref() {
        let expected = expected.trim();
        if !expected.is_empty() && !expected.eq_ignore_ascii_case(&state_hash) {
            return Err(GateError::NonDeterministic(format!(
                "unexpected state hash for benchmark workload: got={} expected={}",
                state_hash, expected
            )));
        }
    }

    if median_ips < baseline.min_instructions_per_sec {
        return Err(GateError::Regression(format!(
            "median ips {:.2} below baseline floor {:.2}",
            median_ips, baseline.min_instructions_per_sec
        )));
    }

    if let Some(floor) = regression_floor {
        if median_ips < floor {
            return Err(GateError::Regression(format!(
                "median ips {:.2} below regression floor {:.2} (ref={:.2}, ratio={:.2})",
                median_ips,
                floor,
                baseline.reference_median_instructions_per_sec,
                baseline.max_regression_ratio
            )));
        }
    }

    println!(
        "perf-check: ok (median_ips={:.2}, min_ips={:.2}, hash={})",
        median_ips, min_ips, state_hash
    );
    Ok(())
}
