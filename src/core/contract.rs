//! Typed views over the JSON documents the gate consumes.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::GateError;

/// Entry carrying only a `name` field (opcodes, traps, execution modes).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedEntry {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateHashSpec {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceContract {
    pub format_version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParityEvidence {
    pub schema_version: String,
    pub artifact_path: String,
    pub generator: String,
    pub baseline_mode: String,
    pub candidate_modes: Vec<String>,
    pub required_equal_signals: Vec<String>,
    pub canonical_vectors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Governance {
    pub process_doc: String,
    pub waiver_registry: String,
    pub steward: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrapPayloadContract {
    pub format_version: String,
    pub summary_line: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostAbi {
    pub name: String,
    pub header: String,
    pub library: String,
    pub version: String,
}

/// The full compatibility contract. Every field defaults to empty so a
/// sparse document still decodes; the gate rules report what is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CapabilityContract {
    pub contract_version: String,
    pub runtime_owner: String,
    pub accepted_program_formats: Vec<NamedEntry>,
    pub state_hash: StateHashSpec,
    pub trace_contract: TraceContract,
    pub execution_modes: Vec<NamedEntry>,
    pub execution_mode_parity_evidence: ParityEvidence,
    pub compatibility_governance: Governance,
    pub trap_payload_contract: TrapPayloadContract,
    pub trap_registry: Vec<String>,
    pub supported_opcodes: Vec<String>,
    pub host_abi: HostAbi,
}

/// Runtime contract marker published by the VM and mirrored by consumers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeMarker {
    pub contract_version: String,
    pub runtime_tag: String,
    pub vm_main_pin: String,
}

/// Parity evidence artifact emitted by the VM build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParityArtifact {
    pub schema_version: String,
    pub baseline_mode: String,
    pub candidate_modes: Vec<String>,
    pub vectors: Vec<Value>,
}

/// Performance baseline for the synthetic countdown workload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerfBaseline {
    pub iterations: u64,
    pub expected_steps: u64,
    pub max_steps: u64,
    pub min_instructions_per_sec: f64,
    #[serde(default)]
    pub suite: String,
    #[serde(default)]
    pub profile_id: String,
    #[serde(default)]
    pub expected_state_hash: Option<String>,
    #[serde(default)]
    pub reference_median_instructions_per_sec: f64,
    #[serde(default)]
    pub max_regression_ratio: f64,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
    #[serde(default = "default_warmup_runs")]
    pub warmup_runs: u64,
    #[serde(default = "default_measure_runs")]
    pub measure_runs: u64,
}

fn default_warmup_runs() -> u64 {
    1
}

fn default_measure_runs() -> u64 {
    5
}

/// Read a JSON file. Missing files and malformed JSON are distinct failures.
pub fn read_json(path: &Path) -> Result<Value, GateError> {
    if !path.exists() {
        return Err(GateError::NotFound(format!(
            "Missing JSON file: {}",
            path.display()
        )));
    }
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| GateError::SchemaViolation(format!("{}: invalid JSON ({})", path.display(), e)))
}

/// Decode a JSON value into a typed document, naming the source on failure.
pub fn decode<T: DeserializeOwned>(value: Value, path: &Path) -> Result<T, GateError> {
    serde_json::from_value(value)
        .map_err(|e| GateError::SchemaViolation(format!("{}: {}", path.display(), e)))
}

/// Load the compatibility contract, keeping the raw tree alongside the
/// typed view. Key-presence rules need the raw tree.
pub fn load_contract(path: &Path) -> Result<(Value, CapabilityContract), GateError> {
    let raw = read_json(path)?;
    let typed = decode(raw.clone(), path)?;
    Ok((raw, typed))
}

pub fn load_marker(path: &Path) -> Result<RuntimeMarker, GateError> {
    let raw = read_json(path)?;
    decode(raw, path)
}

pub fn load_parity_artifact(path: &Path) -> Result<ParityArtifact, GateError> {
    let raw = read_json(path)?;
    decode(raw, path)
}

pub fn load_baseline(path: &Path) -> Result<PerfBaseline, GateError> {
    let raw = read_json(path)?;
    decode(raw, path)
}
