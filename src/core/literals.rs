//! Pinned compatibility literals. Changing any value here is a
//! contract-breaking event and must go through the process documented
//! in `docs/contracts/COMPATIBILITY.md`.

use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Owner string the contract must declare.
pub const RUNTIME_OWNER: &str = "t81-vm";

/// Top-level keys every compatibility contract must carry.
pub static REQUIRED_TOP_LEVEL_KEYS: LazyLock<BTreeSet<&'static str>> = LazyLock::new(|| {
    [
        "contract_version",
        "runtime_owner",
        "accepted_program_formats",
        "state_hash",
        "trace_contract",
        "execution_modes",
        "execution_mode_parity_evidence",
        "compatibility_governance",
        "trap_payload_contract",
        "trap_registry",
        "supported_opcodes",
        "host_abi",
    ]
    .into_iter()
    .collect()
});

/// Program formats the runtime must keep accepting.
pub static REQUIRED_FORMATS: LazyLock<BTreeSet<&'static str>> =
    LazyLock::new(|| ["TextV1", "TiscJsonV1"].into_iter().collect());

/// Trap classes that must stay registered.
pub static REQUIRED_TRAPS: LazyLock<BTreeSet<&'static str>> = LazyLock::new(|| {
    ["DecodeFault", "TypeFault", "DivisionFault", "TrapInstruction"]
        .into_iter()
        .collect()
});

/// Opcode floor. The runtime may grow the set but never shrink below this.
pub static REQUIRED_OPCODES: LazyLock<BTreeSet<&'static str>> = LazyLock::new(|| {
    [
        "Nop",
        "Halt",
        "LoadImm",
        "Load",
        "Store",
        "Add",
        "Sub",
        "Mul",
        "Div",
        "Mod",
        "Jump",
        "JumpIfZero",
        "Mov",
        "Inc",
        "Dec",
        "Cmp",
        "Push",
        "Pop",
        "JumpIfNotZero",
        "Call",
        "Ret",
        "Trap",
    ]
    .into_iter()
    .collect()
});

/// Execution modes the contract must list.
pub static REQUIRED_EXECUTION_MODES: LazyLock<BTreeSet<&'static str>> =
    LazyLock::new(|| ["interpreter", "accelerated-preview"].into_iter().collect());

/// Parity evidence schema this gate understands.
pub const PARITY_SCHEMA_VERSION: &str = "parity-evidence-v1";

/// Mode every candidate is compared against.
pub const PARITY_BASELINE_MODE: &str = "interpreter";

/// Candidate mode that must be covered by parity evidence.
pub const PARITY_REQUIRED_CANDIDATE: &str = "accelerated-preview";

/// Signals that must compare equal between baseline and candidate runs.
pub static REQUIRED_PARITY_SIGNALS: LazyLock<BTreeSet<&'static str>> =
    LazyLock::new(|| ["state_hash", "trap_class", "trap_payload"].into_iter().collect());

/// Canonical vectors the contract must reference, relative to the repo root.
pub static REQUIRED_CANONICAL_VECTORS: LazyLock<BTreeSet<&'static str>> = LazyLock::new(|| {
    [
        "tests/vectors/counting.t81",
        "tests/vectors/faults.t81",
        "tests/vectors/bounds_fault.t81",
    ]
    .into_iter()
    .collect()
});

/// Governance pins.
pub const GOVERNANCE_PROCESS_DOC: &str = "docs/contracts/COMPATIBILITY.md";
pub const GOVERNANCE_WAIVER_REGISTRY: &str = "docs/contracts/waivers.json";
pub const GOVERNANCE_STEWARD: &str = "t81-vm-maintainers";

/// Marker every trap payload summary line must mention.
pub const TRAP_PAYLOAD_MARKER: &str = "TRAP_PAYLOAD";

/// Canonical in-repo document locations.
pub const CONTRACT_RELPATH: &str = "docs/contracts/vm-compatibility.json";
pub const MARKER_RELPATH: &str = "contracts/runtime-contract.json";
