//! Benchmark report artifact. Written on every perf run that produces
//! stats, including runs that go on to fail a floor check, so CI always
//! has the numbers that led to a verdict.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::GateError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
    pub run_id: String,
    pub suite: String,
    pub profile_id: String,
    pub vm_bin: String,
    pub iterations: u64,
    pub expected_steps: u64,
    pub max_steps: u64,
    pub warmup_runs: u64,
    pub measure_runs: u64,
    pub timings_seconds: Vec<f64>,
    pub state_hash: String,
    pub median_seconds: f64,
    pub median_instructions_per_sec: f64,
    pub min_observed_instructions_per_sec: f64,
    pub baseline_floor_instructions_per_sec: f64,
    pub regression_floor_instructions_per_sec: Option<f64>,
}

/// Serialize through `serde_json::Value` so the emitted keys are sorted,
/// making reports diffable across runs. Parent directories are created
/// and any prior report is overwritten.
pub fn write_report(path: &Path, report: &BenchReport) -> Result<(), GateError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let value = serde_json::to_value(report)?;
    let mut rendered = serde_json::to_string_pretty(&value)?;
    rendered.push('\n');
    fs::write(path, rendered)?;
    Ok(())
}
