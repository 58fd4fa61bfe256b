//! Conformance harness. Phase one runs every vector twice and demands
//! bit-identical behavior; phase two runs the fault vectors and demands
//! a loud, non-zero failure.

use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;
use sha2::{Digest, Sha256};

use crate::core::error::GateError;
use crate::core::vm::{state_hash_line, SystemVm, VmFlags, VmInvoker};

/// Vectors that must trap, in the order they are checked.
const FAULT_VECTORS: &[&str] = &["faults.t81", "bounds_fault.t81"];

fn digest(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn vector_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn list_vectors(dir: &Path) -> Result<Vec<PathBuf>, GateError> {
    let mut vectors = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) == Some("t81") {
            vectors.push(path);
        }
    }
    vectors.sort();
    Ok(vectors)
}

fn check_determinism(vm: &dyn VmInvoker, vector: &Path) -> Result<(), GateError> {
    let name = vector_name(vector);
    let flags = VmFlags {
        trace: true,
        snapshot: true,
        max_steps: None,
    };
    let first = vm.run(vector, &flags)?;
    let second = vm.run(vector, &flags)?;

    if first.exit_code != second.exit_code {
        return Err(GateError::NonDeterministic(format!(
            "Return code mismatch in {} ({} vs {})",
            name, first.exit_code, second.exit_code
        )));
    }

    let first_digest = digest(&first.stdout);
    let second_digest = digest(&second.stdout);
    if first_digest != second_digest {
        return Err(GateError::NonDeterministic(format!(
            "Trace mismatch in {} ({} vs {})",
            name, first_digest, second_digest
        )));
    }

    let first_hash = state_hash_line(&first.stdout).ok_or_else(|| {
        GateError::ExecutionFailure(format!("Missing STATE_HASH line in {}", name))
    })?;
    let second_hash = state_hash_line(&second.stdout).ok_or_else(|| {
        GateError::ExecutionFailure(format!("Missing STATE_HASH line in {}", name))
    })?;
    if first_hash != second_hash {
        return Err(GateError::NonDeterministic(format!(
            "State hash mismatch in {} ({} vs {})",
            name, first_hash, second_hash
        )));
    }
    Ok(())
}

fn check_fault(vm: &dyn VmInvoker, vector: &Path, name: &str) -> Result<(), GateError> {
    if !vector.exists() {
        return Err(GateError::NotFound(format!(
            "fault vector missing: {}",
            vector.display()
        )));
    }
    let flags = VmFlags {
        trace: true,
        snapshot: true,
        max_steps: None,
    };
    let out = vm.run(vector, &flags)?;
    if out.exit_code == 0 {
        return Err(GateError::ExecutionFailure(format!(
            "Expected fault for {}",
            name
        )));
    }
    if !out.stderr.contains("FAULT") {
        return Err(GateError::ExecutionFailure(format!(
            "Missing FAULT marker for {}",
            name
        )));
    }
    Ok(())
}

/// Run both conformance phases against the binary at `vm_bin`.
pub fn check_conformance(vm_bin: &Path, vectors_dir: &Path) -> Result<(), GateError> {
    let vm = SystemVm::new(vm_bin);
    run_conformance(&vm, vectors_dir)
}

pub fn run_conformance(vm: &dyn VmInvoker, vectors_dir: &Path) -> Result<(), GateError> {
    if !vectors_dir.is_dir() {
        return Err(GateError::NotFound(format!(
            "vector directory missing: {}",
            vectors_dir.display()
        )));
    }
    let vectors = list_vectors(vectors_dir)?;
    if vectors.is_empty() {
        return Err(GateError::NotFound(format!(
            "no .t81 vectors found in {}",
            vectors_dir.display()
        )));
    }

    println!("[1] Determinism");
    for vector in &vectors {
        check_determinism(vm, vector)?;
    }
    println!(
        "{} Determinism verified ({} vectors)",
        "✓".bright_green(),
        vectors.len()
    );

    println!("[2] Fault behavior");
    for name in FAULT_VECTORS {
        check_fault(vm, &vectors_dir.join(name), name)?;
    }
    println!("{} Fault behavior verified", "✓".bright_green());

    println!(
        "conformance: ok ({} vectors, {} fault vectors)",
        vectors.len(),
        FAULT_VECTORS.len()
    );
    Ok(())
}
