use std::process::ExitCode;

use console::style;

fn main() -> ExitCode {
    sifter::cli::init_logging();

    match sifter::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Errors are always shown, even with logging filtered down
            eprintln!("{} {err:#}", style("✖").red());
            ExitCode::FAILURE
        }
    }
}
