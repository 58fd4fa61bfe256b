//! t81-gate: compatibility and regression gate for the t81 VM runtime.
//!
//! The runtime itself (`t81vm`) is an external binary. This crate never
//! interprets programs; it drives the binary and checks the promises the
//! runtime publishes about itself:
//!
//! - **contract**: validates `docs/contracts/vm-compatibility.json`
//!   against the pinned literal sets in [`core::literals`]. Declared
//!   capability sets may grow but never shrink.
//! - **markers**: compares a consumer repo's vendored
//!   `contracts/runtime-contract.json` against the runtime's own marker
//!   and contract, so cross-repo drift is caught at merge time.
//! - **perf**: runs a synthetic countdown workload, requires a stable
//!   `STATE_HASH` across runs, and gates median throughput against the
//!   baseline floors. A JSON report is written on every measured run.
//! - **conformance**: runs every `tests/vectors/*.t81` twice and demands
//!   identical behavior, then checks the fault vectors trap loudly.
//!
//! Every check is fail-fast: the first violation is reported and the
//! process exits non-zero. There are no retries and no partial passes.
//!
//! # Examples
//!
//! ```bash
//! # Validate the compatibility contract in the current repo
//! t81-gate contract
//!
//! # Check a consumer repo's marker against the runtime repo
//! t81-gate markers --vm-dir ../t81-vm --repo-dir . --repo-name t81-lang
//!
//! # Throughput and determinism gate
//! t81-gate perf --vm-bin build/t81vm
//!
//! # Conformance harness
//! t81-gate conformance run --vm-bin build/t81vm
//! ```

pub mod core;
pub mod gates;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::core::error::GateError;

#[derive(Parser, Debug)]
#[clap(
    name = "t81-gate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Compatibility and regression gate for the t81 VM runtime"
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug)]
struct ContractCli {
    /// Repository root holding docs/contracts/vm-compatibility.json.
    #[clap(long, default_value = ".")]
    root: PathBuf,
}

#[derive(clap::Args, Debug)]
struct MarkersCli {
    /// Checkout of the t81 VM runtime repository.
    #[clap(long)]
    vm_dir: PathBuf,
    /// Checkout of the consumer repository to check.
    #[clap(long)]
    repo_dir: PathBuf,
    /// Consumer repository name, used in gate messages.
    #[clap(long)]
    repo_name: String,
}

#[derive(clap::Args, Debug)]
struct PerfCli {
    /// Path to the t81vm binary.
    #[clap(long, default_value = "build/t81vm")]
    vm_bin: PathBuf,
    /// Perf baseline document.
    #[clap(long, default_value = "docs/benchmarks/vm-perf-baseline.json")]
    baseline: PathBuf,
    /// Where the benchmark report is written.
    #[clap(long, default_value = "build/perf/runtime-bench-report.json")]
    report_out: PathBuf,
}

#[derive(clap::Args, Debug)]
struct ConformanceRunCli {
    /// Path to the t81vm binary.
    #[clap(long, default_value = "build/t81vm")]
    vm_bin: PathBuf,
    /// Directory holding the *.t81 test vectors.
    #[clap(long, default_value = "tests/vectors")]
    vectors: PathBuf,
}

#[derive(Subcommand, Debug)]
enum ConformanceCommand {
    /// Run the determinism and fault phases against the VM binary.
    Run(ConformanceRunCli),
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate the VM compatibility contract against the pinned literals.
    Contract(ContractCli),
    /// Check runtime contract markers for cross-repo drift.
    Markers(MarkersCli),
    /// Determinism and throughput gate over the countdown workload.
    Perf(PerfCli),
    /// Conformance harness over the canonical test vectors.
    Conformance {
        #[clap(subcommand)]
        command: ConformanceCommand,
    },
}

pub fn run() -> Result<(), GateError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Contract(args) => gates::contract::check_contract(&args.root),
        Command::Markers(args) => {
            gates::markers::check_markers(&args.vm_dir, &args.repo_dir, &args.repo_name)
        }
        Command::Perf(args) => {
            gates::perf::check_perf(&args.vm_bin, &args.baseline, &args.report_out)
        }
        Command::Conformance { command } => match command {
            ConformanceCommand::Run(args) => {
                gates::conformance::check_conformance(&args.vm_bin, &args.vectors)
            }
        },
    }
}
