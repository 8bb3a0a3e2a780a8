//! Command-line interface for Pythodan.
//!
//! Uses `clap` derive macros for declarative argument parsing. The shell owns
//! everything around the query pipeline: credentials, the disclosure prompt,
//! reading target files, and deciding which errors end the run.

mod progress;
mod prompt;

pub use progress::ConsoleObserver;
pub use prompt::{confirm, confirm_from, external_ip, parse_answer, ExternalIp};

use crate::batch::{BatchRunner, RateLimiter, MAX_INTERVAL};
use crate::config::Settings;
use crate::error::{CliError, CliResult, CredentialError};
use crate::output::{self, ReportWriter};
use crate::query::ShodanClient;
use crate::types::TargetSpec;
use chrono::Local;
use clap::{ArgGroup, Parser};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const LONG_ABOUT: &str = "\
Given a valid Shodan API key, queries Shodan for information such as open
ports and banners about Internet-facing hosts without sending any traffic to
them yourself. A CSV report is generated for ease of analysis.";

/// Timeout for the external IP lookup.
const EXTERNAL_IP_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_INTERVAL_MS: u64 = MAX_INTERVAL.as_millis() as u64;

/// Passive host reconnaissance through Shodan.
#[derive(Parser, Debug)]
#[command(name = "pythodan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query Shodan for open ports and banners of IP ranges", long_about = LONG_ABOUT)]
#[command(group(ArgGroup::new("targets").required(true).args(["target", "file"])))]
pub struct Cli {
    /// Shodan API key
    #[arg(short = 'k', long = "key", value_name = "API_KEY", env = "SHODAN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Target IPs: a single address, a range like 192.168.1.1-10 (as with
    /// Nmap), or CIDR notation
    #[arg(short = 't', long, value_name = "TARGET_IPS")]
    pub target: Option<String>,

    /// File listing one target specification per line
    #[arg(short = 'f', long, value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Minimum delay between queries in milliseconds [default: 1000]
    #[arg(
        long = "interval-ms",
        value_name = "MS",
        value_parser = clap::value_parser!(u64).range(0..=MAX_INTERVAL_MS)
    )]
    pub interval_ms: Option<u64>,

    /// Directory for the CSV report [default: current directory]
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Do not ask for confirmation before querying
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Skip the external IP disclosure lookup
    #[arg(long)]
    pub no_ip_check: bool,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print errors and the report location
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to a settings file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Load settings from `--config` or the default location.
    ///
    /// A broken default settings file is only a warning; an explicit one is
    /// an error.
    fn settings(&self) -> CliResult<Settings> {
        match &self.config {
            Some(path) => Ok(Settings::load_from(path)?),
            None => Ok(Settings::load().unwrap_or_else(|e| {
                warn!(error = %e, "Ignoring settings file");
                Settings::default()
            })),
        }
    }

    /// Collect the target specifications to process.
    fn specs(&self) -> CliResult<Vec<String>> {
        match (&self.target, &self.file) {
            (Some(target), _) => {
                // a lone spec that does not parse ends the run
                TargetSpec::parse(target)?;
                Ok(vec![target.trim().to_string()])
            }
            (None, Some(path)) => read_target_file(path),
            (None, None) => Err(CliError::Other("no targets given".to_string())),
        }
    }

    /// Execute the full run.
    pub async fn execute(self) -> CliResult<()> {
        let settings = self.settings()?;

        let api_key = self
            .api_key
            .clone()
            .or_else(|| settings.api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .ok_or(CredentialError::Missing)?;

        let specs = self.specs()?;
        let total: u128 = specs
            .iter()
            .filter_map(|s| TargetSpec::parse(s).ok())
            .map(|t| t.host_count())
            .fold(0, u128::saturating_add);
        debug!(specs = specs.len(), addresses = %total, "Targets loaded");

        if !self.no_ip_check {
            match external_ip(EXTERNAL_IP_TIMEOUT).await {
                Ok(me) => output::print_info(&format!(
                    "Your external IP is {}, which is from {}",
                    me.ip, me.country
                )),
                Err(e) => output::print_warning(&format!("Could not determine external IP: {}", e)),
            }
        }

        if !self.yes && !ask("Do you want to continue?", false).await? {
            output::print_info("Aborted, nothing was queried.");
            return Ok(());
        }

        let client = ShodanClient::with_options(
            api_key,
            settings.api_base_url.as_str(),
            settings.request_timeout(),
        )
        .map_err(|e| CliError::Other(e.to_string()))?;

        let info = client.api_info().await?;
        if !self.quiet {
            output::print_info(&format!(
                "API key accepted ({} query credits, {} scan credits)",
                info.query_credits, info.scan_credits
            ));
        }

        let interval = self
            .interval_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| settings.min_interval());
        let limiter = RateLimiter::new(interval);
        debug!(interval = ?limiter.interval(), limited = limiter.is_limited(), "Pacing queries");
        let runner = BatchRunner::new(client, limiter);

        let started_at = Local::now();
        let mut observer = ConsoleObserver::new(total, self.quiet);
        let outcome = runner.run(&specs, &mut observer).await;
        observer.finish();

        if !self.quiet {
            output::print_summary(&outcome.summary());
        }

        if outcome.has_report_rows() {
            let dir = self
                .output_dir
                .clone()
                .or_else(|| settings.output_dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            let path = ReportWriter::new(dir)
                .write(outcome.batches.iter().map(|b| &b.hosts), &started_at)?;
            let shown = fs::canonicalize(&path).unwrap_or(path);
            output::print_success(&format!("CSV report saved at: {}", shown.display()));
        } else {
            output::print_warning("No open ports found, no report written.");
        }

        match runner.lookup().api_info().await {
            Ok(info) => output::print_info(&format!(
                "FYI - You have {} scan credits left.",
                info.scan_credits
            )),
            Err(e) => output::print_warning(&format!("Could not read credit balance: {}", e)),
        }

        Ok(())
    }
}

/// Run the blocking terminal prompt off the async runtime.
async fn ask(question: &'static str, default: bool) -> CliResult<bool> {
    let answer = tokio::task::spawn_blocking(move || confirm(question, default))
        .await
        .map_err(|e| CliError::Other(format!("prompt failed: {}", e)))??;
    Ok(answer)
}

/// Read target specifications from a file, one per line.
///
/// Blank lines and lines starting with `#` are ignored.
pub fn read_target_file(path: &Path) -> CliResult<Vec<String>> {
    if !path.is_file() {
        return Err(CliError::TargetFile {
            path: path.to_path_buf(),
            reason: "file does not exist".to_string(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| CliError::TargetFile {
        path: path.to_path_buf(),
        reason: format!("file is not readable: {}", e),
    })?;

    let specs: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect();

    if specs.is_empty() {
        return Err(CliError::TargetFile {
            path: path.to_path_buf(),
            reason: "no target specifications found".to_string(),
        });
    }

    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_target_and_file_are_exclusive() {
        let result = Cli::try_parse_from(["pythodan", "-k", "x", "-t", "10.0.0.1", "-f", "t.txt"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_one_of_target_or_file_required() {
        assert!(Cli::try_parse_from(["pythodan", "-k", "x"]).is_err());
    }

    #[test]
    fn test_parse_target_invocation() {
        let cli = Cli::try_parse_from([
            "pythodan",
            "-k",
            "secret",
            "-t",
            "192.168.1.1-10",
            "--interval-ms",
            "1500",
            "-y",
        ])
        .unwrap();
        assert_eq!(cli.api_key.as_deref(), Some("secret"));
        assert_eq!(cli.target.as_deref(), Some("192.168.1.1-10"));
        assert_eq!(cli.interval_ms, Some(1500));
        assert!(cli.yes);
        assert_eq!(cli.specs().unwrap(), vec!["192.168.1.1-10".to_string()]);
    }

    #[test]
    fn test_interval_is_bounded() {
        let huge = u64::MAX.to_string();
        let result = Cli::try_parse_from(["pythodan", "-t", "10.0.0.1", "--interval-ms", &huge]);
        assert!(result.is_err());

        let max = MAX_INTERVAL_MS.to_string();
        let cli =
            Cli::try_parse_from(["pythodan", "-t", "10.0.0.1", "--interval-ms", &max]).unwrap();
        assert_eq!(cli.interval_ms, Some(MAX_INTERVAL_MS));
    }

    #[test]
    fn test_invalid_single_target_is_fatal() {
        let cli = Cli::try_parse_from(["pythodan", "-k", "x", "-t", "10.0.0.1/33"]).unwrap();
        assert!(matches!(cli.specs(), Err(CliError::Target(_))));
    }

    #[test]
    fn test_read_target_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("targets.txt");
        fs::write(&path, "10.0.0.1\n\n  # office\n192.168.1.1-5  \n\nabc\n").unwrap();

        let specs = read_target_file(&path).unwrap();
        assert_eq!(specs, vec!["10.0.0.1", "192.168.1.1-5", "abc"]);
    }

    #[test]
    fn test_read_missing_or_empty_target_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_target_file(&dir.path().join("nope.txt")),
            Err(CliError::TargetFile { .. })
        ));

        let empty = dir.path().join("empty.txt");
        fs::write(&empty, "\n# nothing\n").unwrap();
        assert!(matches!(
            read_target_file(&empty),
            Err(CliError::TargetFile { .. })
        ));
    }
}
