use clap::Parser;
use pythodan::cli::Cli;
use pythodan::output;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Log to stderr. `RUST_LOG` wins; otherwise only errors, or debug output
/// from this crate with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "pythodan=debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&format!("{:#}", anyhow::Error::new(e)));
            ExitCode::FAILURE
        }
    }
}
