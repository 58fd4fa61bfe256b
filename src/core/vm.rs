//! Process adapter around the external `t81vm` binary.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::thread;
use std::time::{Duration, Instant};

use regex::Regex;

use crate::core::error::GateError;

static STATE_HASH_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^STATE_HASH\s+(0x[0-9a-fA-F]+)\s*$").unwrap());

/// Flags understood by the runtime CLI: `t81vm [--trace] [--snapshot]
/// [--max-steps <n>] <program>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct VmFlags {
    pub trace: bool,
    pub snapshot: bool,
    pub max_steps: Option<u64>,
}

/// Captured result of one VM invocation.
#[derive(Debug, Clone)]
pub struct VmRunOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// The gates talk to the VM only through this trait so tests can
/// substitute a scripted runner.
pub trait VmInvoker {
    fn run(&self, program: &Path, flags: &VmFlags) -> Result<VmRunOutput, GateError>;
}

/// Runs the real binary as a child process, optionally under a deadline.
pub struct SystemVm {
    bin: PathBuf,
    timeout: Option<Duration>,
}

impl SystemVm {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        SystemVm {
            bin: bin.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(bin: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        SystemVm {
            bin: bin.into(),
            timeout,
        }
    }

    fn command(&self, program: &Path, flags: &VmFlags) -> Command {
        let mut cmd = Command::new(&self.bin);
        if flags.trace {
            cmd.arg("--trace");
        }
        if flags.snapshot {
            cmd.arg("--snapshot");
        }
        if let Some(n) = flags.max_steps {
            cmd.arg("--max-steps").arg(n.to_string());
        }
        cmd.arg(program);
        cmd
    }

    fn launch_error(&self, e: std::io::Error) -> GateError {
        GateError::ExecutionFailure(format!("failed to launch {}: {}", self.bin.display(), e))
    }

    fn run_with_deadline(
        &self,
        program: &Path,
        flags: &VmFlags,
        limit: Duration,
        start: Instant,
    ) -> Result<VmRunOutput, GateError> {
        let mut child = self
            .command(program, flags)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.launch_error(e))?;

        let mut stdout_pipe = child.stdout.take();
        let stdout_thread = thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(pipe) = stdout_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf);
            }
            buf
        });
        let mut stderr_pipe = child.stderr.take();
        let stderr_thread = thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_end(&mut buf);
            }
            buf
        });

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let stdout = stdout_thread.join().unwrap_or_default();
                    let stderr = stderr_thread.join().unwrap_or_default();
                    return Ok(VmRunOutput {
                        exit_code: status.code().unwrap_or(-1),
                        stdout: String::from_utf8_lossy(&stdout).to_string(),
                        stderr: String::from_utf8_lossy(&stderr).to_string(),
                        elapsed: start.elapsed(),
                    });
                }
                Ok(None) => {
                    if start.elapsed() >= limit {
                        let _ = child.kill();
                        let _ = child.wait();
                        let _ = stdout_thread.join();
                        let _ = stderr_thread.join();
                        return Err(GateError::ExecutionFailure(format!(
                            "vm run timed out after {}s: {}",
                            limit.as_secs(),
                            program.display()
                        )));
                    }
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(GateError::ExecutionFailure(format!(
                        "wait on vm failed: {}",
                        e
                    )));
                }
            }
        }
    }
}

impl VmInvoker for SystemVm {
    fn run(&self, program: &Path, flags: &VmFlags) -> Result<VmRunOutput, GateError> {
        let start = Instant::now();
        match self.timeout {
            Some(limit) => self.run_with_deadline(program, flags, limit, start),
            None => {
                let output = self
                    .command(program, flags)
                    .output()
                    .map_err(|e| self.launch_error(e))?;
                Ok(VmRunOutput {
                    exit_code: output.status.code().unwrap_or(-1),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                    elapsed: start.elapsed(),
                })
            }
        }
    }
}

/// Tolerant STATE_HASH extraction for snapshot output. The value is
/// lower-cased so hash comparisons are case-insensitive.
pub fn snapshot_state_hash(stdout: &str) -> Option<String> {
    STATE_HASH_LINE
        .captures(stdout)
        .map(|c| c[1].to_ascii_lowercase())
}

/// Exact-prefix STATE_HASH extraction, preserving the value as printed.
/// Used where two runs of the same program are compared verbatim.
pub fn state_hash_line(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("STATE_HASH "))
        .map(|v| v.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn renders_flags_in_cli_order() {
        let vm = SystemVm::new("/bin/echo");
        let flags = VmFlags {
            trace: true,
            snapshot: true,
            max_steps: Some(42),
        };
        let out = vm.run(Path::new("prog.t81"), &flags).unwrap();
        assert_eq!(out.exit_code, 0);
        assert_eq!(out.stdout.trim(), "--trace --snapshot --max-steps 42 prog.t81");
    }

    #[test]
    #[cfg(unix)]
    fn enforces_deadline() {
        let vm = SystemVm::with_timeout("/bin/sleep", Some(Duration::from_millis(200)));
        let err = vm.run(Path::new("5"), &VmFlags::default()).unwrap_err();
        match err {
            GateError::ExecutionFailure(msg) => assert!(msg.contains("timed out")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_binary_is_execution_failure() {
        let vm = SystemVm::new("/nonexistent/t81vm");
        let err = vm
            .run(Path::new("prog.t81"), &VmFlags::default())
            .unwrap_err();
        assert!(matches!(err, GateError::ExecutionFailure(_)));
    }

    #[test]
    fn snapshot_hash_is_lowercased() {
        let out = "steps 12\nSTATE_HASH 0xDEADBEEF00112233\n";
        assert_eq!(
            snapshot_state_hash(out).unwrap(),
            "0xdeadbeef00112233"
        );
    }

    #[test]
    fn snapshot_hash_requires_a_full_line() {
        assert!(snapshot_state_hash("prefix STATE_HASH 0x1\n").is_none());
        assert!(snapshot_state_hash("STATE_HASH 0x1 trailing\n").is_none());
        assert!(snapshot_state_hash("no hash here\n").is_none());
    }

    #[test]
    fn line_extraction_keeps_value_as_printed() {
        let out = "trace line\nSTATE_HASH 0xABCD\n";
        assert_eq!(state_hash_line(out).unwrap(), "0xABCD");
        assert!(state_hash_line("nothing\n").is_none());
    }
}
