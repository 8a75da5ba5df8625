mod app;
mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    match app::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("\nError: {:#}\n", e);
            ExitCode::FAILURE
        }
    }
}
