use std::io;
use std::process::ExitCode;

use terminator_cli::{build_cli, run, Options};

fn main() -> ExitCode {
    let matches = build_cli().get_matches();
    let options = Options::from_matches(&matches);

    terminator_core::init_tracing(options.verbose);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&options, &mut out) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(summary) => {
            eprintln!("{} of {} files failed:", summary.failures.len(), summary.files);
            for (path, message) in &summary.failures {
                eprintln!("  {}: {}", path.display(), message);
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
