use std::process::ExitCode;

fn main() -> ExitCode {
    match t81_gate::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("t81-gate: {}", e);
            ExitCode::FAILURE
        }
    }
}
