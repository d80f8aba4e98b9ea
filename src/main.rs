use clap::Parser;
use std::panic;
use std::process::ExitCode;
use treetidy::OrganizeError;
use treetidy::cli::{Args, run_cli};
use treetidy::logging::init_logging;
use treetidy::output::OutputFormatter;

fn main() -> ExitCode {
    // Usage errors exit with status 2 from inside clap.
    let args = Args::parse();
    init_logging(args.verbose);

    match panic::catch_unwind(|| run_cli(&args)) {
        Ok(Ok(_report)) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            OutputFormatter::error(&e.to_string());
            if matches!(e, OrganizeError::Configuration { .. }) {
                eprintln!("Run 'treetidy --help' for usage.");
            }
            ExitCode::from(e.exit_code())
        }
        Err(_) => {
            let e = OrganizeError::Internal("unexpected failure, see message above".to_string());
            OutputFormatter::error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}
