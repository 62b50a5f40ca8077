use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use treemirror::cli::{Cli, Outcome, run_cli};
use treemirror::output::OutputFormatter;

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("treemirror=debug"),
        _ => EnvFilter::new("treemirror=trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run_cli(cli) {
        Ok(Outcome::Batch(report)) if !report.failed.is_empty() => ExitCode::FAILURE,
        Ok(Outcome::Grep(report)) if !report.batch.failed.is_empty() => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e);
            ExitCode::FAILURE
        }
    }
}
