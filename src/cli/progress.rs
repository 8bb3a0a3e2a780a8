//! Live console reporting while a batch runs.

use crate::batch::BatchObserver;
use crate::error::QueryError;
use crate::output;
use crate::types::{HostRecord, TargetError, TargetSpec};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::net::IpAddr;

/// Prints hosts as they are found and tracks progress across all addresses.
///
/// Skipped addresses and specifications are always reported, even when
/// quiet.
pub struct ConsoleObserver {
    progress: Option<ProgressBar>,
}

impl ConsoleObserver {
    /// Create an observer for `total` addresses. Quiet mode hides the
    /// progress bar and host details.
    pub fn new(total: u128, quiet: bool) -> Self {
        let progress = (!quiet).then(|| {
            let pb = ProgressBar::new(u64::try_from(total).unwrap_or(u64::MAX));
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=>-"),
            );
            pb
        });

        Self { progress }
    }

    /// Print above the progress bar.
    fn report(&self, print: impl FnOnce()) {
        match &self.progress {
            Some(pb) => pb.suspend(print),
            None => print(),
        }
    }

    fn tick(&self) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }

    /// Clear the progress bar.
    pub fn finish(&self) {
        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
    }
}

impl BatchObserver for ConsoleObserver {
    fn on_spec_start(&mut self, spec: &TargetSpec) {
        if let Some(pb) = &self.progress {
            pb.set_message(spec.to_string());
        }
    }

    fn on_host(&mut self, host: &HostRecord) {
        self.tick();
        if self.progress.is_some() {
            self.report(|| {
                if let Err(e) = output::print_host(host) {
                    tracing::debug!(error = %e, "Failed to print host");
                }
            });
        }
    }

    fn on_failure(&mut self, ip: IpAddr, error: &QueryError) {
        self.tick();
        self.report(|| {
            eprintln!("{} {} - {}", style("[-] Error:").red().bold(), error, ip);
        });
    }

    fn on_invalid_spec(&mut self, spec: &str, error: &TargetError) {
        self.report(|| {
            output::print_error(&format!("{} (skipping '{}')", error, spec));
        });
    }
}
