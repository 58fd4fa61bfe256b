//! Compatibility contract validation. Rules run in a fixed order and the
//! first violation wins, so CI output always names exactly one problem.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::Value;

use crate::core::contract::{load_contract, load_parity_artifact, NamedEntry};
use crate::core::error::GateError;
use crate::core::literals::{
    CONTRACT_RELPATH, GOVERNANCE_PROCESS_DOC, GOVERNANCE_STEWARD, GOVERNANCE_WAIVER_REGISTRY,
    PARITY_BASELINE_MODE, PARITY_REQUIRED_CANDIDATE, PARITY_SCHEMA_VERSION,
    REQUIRED_CANONICAL_VECTORS, REQUIRED_EXECUTION_MODES, REQUIRED_FORMATS, REQUIRED_OPCODES,
    REQUIRED_PARITY_SIGNALS, REQUIRED_TOP_LEVEL_KEYS, REQUIRED_TRAPS, RUNTIME_OWNER,
    TRAP_PAYLOAD_MARKER,
};

fn trace_rule(name: &str) {
    if std::env::var("T81_GATE_TRACE").ok().as_deref() == Some("1") {
        println!("contract: rule {}", name);
    }
}

fn missing_names(
    required: &BTreeSet<&'static str>,
    declared: &[NamedEntry],
) -> Vec<&'static str> {
    let have: BTreeSet<&str> = declared.iter().map(|e| e.name.as_str()).collect();
    required
        .iter()
        .copied()
        .filter(|name| !have.contains(*name))
        .collect()
}

fn missing_strings(
    required: &BTreeSet<&'static str>,
    declared: &[String],
) -> Vec<&'static str> {
    let have: BTreeSet<&str> = declared.iter().map(String::as_str).collect();
    required
        .iter()
        .copied()
        .filter(|name| !have.contains(*name))
        .collect()
}

fn check_top_level_keys(raw: &Value) -> Result<(), GateError> {
    let present: BTreeSet<&str> = raw
        .as_object()
        .map(|obj| obj.keys().map(String::as_str).collect())
        .unwrap_or_default();
    let missing: Vec<&str> = REQUIRED_TOP_LEVEL_KEYS
        .iter()
        .copied()
        .filter(|key| !present.contains(*key))
        .collect();
    if !missing.is_empty() {
        return Err(GateError::SchemaViolation(format!(
            "Missing top-level keys in contract: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

fn check_parity_artifact(root: &Path, artifact_path: &str) -> Result<(), GateError> {
    let artifact = load_parity_artifact(&root.join(artifact_path))?;
    if artifact.schema_version.trim() != PARITY_SCHEMA_VERSION {
        return Err(GateError::SchemaViolation(format!(
            "parity artifact schema_version must be '{}' (got '{}')",
            PARITY_SCHEMA_VERSION, artifact.schema_version
        )));
    }
    if artifact.baseline_mode.trim() != PARITY_BASELINE_MODE {
        return Err(GateError::SchemaViolation(format!(
            "parity artifact baseline_mode must be '{}' (got '{}')",
            PARITY_BASELINE_MODE, artifact.baseline_mode
        )));
    }
    if artifact.candidate_modes.is_empty() {
        return Err(GateError::SchemaViolation(
            "parity artifact candidate_modes must be non-empty".to_string(),
        ));
    }
    if artifact.vectors.is_empty() {
        return Err(GateError::SchemaViolation(
            "parity artifact vectors must be non-empty".to_string(),
        ));
    }
    Ok(())
}

/// Validate `docs/contracts/vm-compatibility.json` under `root` against
/// the pinned literal sets.
pub fn check_contract(root: &Path) -> Result<(), GateError> {
    let path = root.join(CONTRACT_RELPATH);
    let (raw, contract) = load_contract(&path)?;

    trace_rule("top-level-keys");
    check_top_level_keys(&raw)?;

    trace_rule("runtime-owner");
    if contract.runtime_owner.trim() != RUNTIME_OWNER {
        return Err(GateError::SchemaViolation(format!(
            "runtime_owner must be '{}' (got '{}')",
            RUNTIME_OWNER, contract.runtime_owner
        )));
    }

    trace_rule("contract-version");
    if contract.contract_version.trim().is_empty() {
        return Err(GateError::SchemaViolation(
            "contract_version must be non-empty".to_string(),
        ));
    }

    trace_rule("formats");
    let missing = missing_names(&REQUIRED_FORMATS, &contract.accepted_program_formats);
    if !missing.is_empty() {
        return Err(GateError::SchemaViolation(format!(
            "Missing accepted program formats: {}",
            missing.join(", ")
        )));
    }

    trace_rule("traps");
    let missing = missing_strings(&REQUIRED_TRAPS, &contract.trap_registry);
    if !missing.is_empty() {
        return Err(GateError::SchemaViolation(format!(
            "Missing required traps: {}",
            missing.join(", ")
        )));
    }

    trace_rule("opcodes");
    let missing = missing_strings(&REQUIRED_OPCODES, &contract.supported_opcodes);
    if !missing.is_empty() {
        return Err(GateError::SchemaViolation(format!(
            "Missing required opcodes: {}",
            missing.join(", ")
        )));
    }

    trace_rule("host-abi");
    let abi = &contract.host_abi;
    for (field, value) in [
        ("name", &abi.name),
        ("header", &abi.header),
        ("library", &abi.library),
        ("version", &abi.version),
    ] {
        if value.trim().is_empty() {
            return Err(GateError::SchemaViolation(format!(
                "host_abi.{} must be non-empty",
                field
            )));
        }
    }

    trace_rule("trace-contract");
    if contract.trace_contract.format_version.trim().is_empty() {
        return Err(GateError::SchemaViolation(
            "trace_contract.format_version must be non-empty".to_string(),
        ));
    }

    trace_rule("execution-modes");
    let missing = missing_names(&REQUIRED_EXECUTION_MODES, &contract.execution_modes);
    if !missing.is_empty() {
        return Err(GateError::SchemaViolation(format!(
            "Missing execution modes: {}",
            missing.join(", ")
        )));
    }

    trace_rule("parity-evidence");
    let parity = &contract.execution_mode_parity_evidence;
    if parity.schema_version.trim() != PARITY_SCHEMA_VERSION {
        return Err(GateError::SchemaViolation(format!(
            "execution_mode_parity_evidence.schema_version must be '{}' (got '{}')",
            PARITY_SCHEMA_VERSION, parity.schema_version
        )));
    }
    if parity.artifact_path.trim().is_empty() {
        return Err(GateError::SchemaViolation(
            "execution_mode_parity_evidence.artifact_path must be non-empty".to_string(),
        ));
    }
    if parity.generator.trim().is_empty() {
        return Err(GateError::SchemaViolation(
            "execution_mode_parity_evidence.generator must be non-empty".to_string(),
        ));
    }
    if parity.baseline_mode.trim() != PARITY_BASELINE_MODE {
        return Err(GateError::SchemaViolation(format!(
            "execution_mode_parity_evidence.baseline_mode must be '{}' (got '{}')",
            PARITY_BASELINE_MODE, parity.baseline_mode
        )));
    }
    if !parity
        .candidate_modes
        .iter()
        .any(|m| m.trim() == PARITY_REQUIRED_CANDIDATE)
    {
        return Err(GateError::SchemaViolation(format!(
            "execution_mode_parity_evidence.candidate_modes must include '{}'",
            PARITY_REQUIRED_CANDIDATE
        )));
    }
    let missing = missing_strings(&REQUIRED_PARITY_SIGNALS, &parity.required_equal_signals);
    if !missing.is_empty() {
        return Err(GateError::SchemaViolation(format!(
            "Missing required parity signals: {}",
            missing.join(", ")
        )));
    }

    trace_rule("canonical-vectors");
    let missing = missing_strings(&REQUIRED_CANONICAL_VECTORS, &parity.canonical_vectors);
    if !missing.is_empty() {
        return Err(GateError::SchemaViolation(format!(
            "Missing required canonical vectors: {}",
            missing.join(", ")
        )));
    }
    for vector in &parity.canonical_vectors {
        if !root.join(vector).exists() {
            return Err(GateError::NotFound(format!(
                "canonical vector missing on disk: {}",
                vector
            )));
        }
    }

    if std::env::var("REQUIRE_PARITY_ARTIFACT").ok().as_deref() == Some("1") {
        trace_rule("parity-artifact");
        check_parity_artifact(root, &parity.artifact_path)?;
    }

    trace_rule("governance");
    let governance = &contract.compatibility_governance;
    for (field, value, pinned) in [
        ("process_doc", &governance.process_doc, GOVERNANCE_PROCESS_DOC),
        (
            "waiver_registry",
            &governance.waiver_registry,
            GOVERNANCE_WAIVER_REGISTRY,
        ),
        ("steward", &governance.steward, GOVERNANCE_STEWARD),
    ] {
        if value.trim() != pinned {
            return Err(GateError::SchemaViolation(format!(
                "compatibility_governance.{} must be '{}' (got '{}')",
                field, pinned, value
            )));
        }
    }

    trace_rule("trap-payload");
    let payload = &contract.trap_payload_contract;
    if payload.format_version.trim().is_empty() {
        return Err(GateError::SchemaViolation(
            "trap_payload_contract.format_version must be non-empty".to_string(),
        ));
    }
    if !payload.summary_line.contains(TRAP_PAYLOAD_MARKER) {
        return Err(GateError::SchemaViolation(format!(
            "trap_payload_contract.summary_line must mention {}",
            TRAP_PAYLOAD_MARKER
        )));
    }

    trace_rule("state-hash");
    if contract.state_hash.name.trim().is_empty() {
        return Err(GateError::SchemaViolation(
            "state_hash.name must be non-empty".to_string(),
        ));
    }

    println!("vm contract validation: ok");
    Ok(())
}
