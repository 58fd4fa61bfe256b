//! Cross-repo marker alignment. Consumer repos vendor a copy of the
//! runtime contract marker; drift between a consumer copy and the
//! runtime's own marker blocks the merge.

use std::path::Path;

use crate::core::contract::{load_contract, load_marker};
use crate::core::error::GateError;
use crate::core::literals::{CONTRACT_RELPATH, MARKER_RELPATH};

/// Compare `<repo_dir>`'s runtime contract marker against the VM repo's
/// marker and compatibility contract.
pub fn check_markers(vm_dir: &Path, repo_dir: &Path, repo_name: &str) -> Result<(), GateError> {
    let (_, contract) = load_contract(&vm_dir.join(CONTRACT_RELPATH))?;
    let vm_marker = load_marker(&vm_dir.join(MARKER_RELPATH))?;
    let repo_marker = load_marker(&repo_dir.join(MARKER_RELPATH))?;

    if vm_marker.vm_main_pin.trim().is_empty() {
        return Err(GateError::AlignmentViolation(
            "t81-vm marker missing vm_main_pin".to_string(),
        ));
    }

    if repo_marker.contract_version.trim() != contract.contract_version.trim() {
        return Err(GateError::AlignmentViolation(format!(
            "{}: contract_version mismatch (repo='{}', vm='{}')",
            repo_name,
            repo_marker.contract_version.trim(),
            contract.contract_version.trim()
        )));
    }

    if repo_marker.runtime_tag.trim() != vm_marker.runtime_tag.trim() {
        return Err(GateError::AlignmentViolation(format!(
            "{}: runtime_tag mismatch (repo='{}', vm='{}')",
            repo_name,
            repo_marker.runtime_tag.trim(),
            vm_marker.runtime_tag.trim()
        )));
    }

    if repo_marker.vm_main_pin.trim().is_empty() {
        return Err(GateError::AlignmentViolation(format!(
            "{}: vm_main_pin must be non-empty",
            repo_name
        )));
    }
    if repo_marker.vm_main_pin.trim() != vm_marker.vm_main_pin.trim() {
        return Err(GateError::AlignmentViolation(format!(
            "{}: vm_main_pin mismatch (repo={}, vm_baseline={})",
            repo_name,
            repo_marker.vm_main_pin.trim(),
            vm_marker.vm_main_pin.trim()
        )));
    }

    println!("{}: runtime contract marker ok", repo_name);
    Ok(())
}
