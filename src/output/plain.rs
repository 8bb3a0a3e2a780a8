//! Plain text console output.
//!
//! Produces human-readable output with colors and formatting.

use crate::banner::{display_banner, DISPLAY_WIDTH};
use crate::batch::BatchSummary;
use crate::types::HostRecord;
use console::style;
use std::io::{self, Write};

/// Render a host's details as they are found.
pub fn format_host(host: &HostRecord) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\n{} {}\n",
        style("[+] Results found for:").green().bold(),
        style(host.ip).white().bold()
    ));
    out.push_str(&format!("  {:<18}{}\n", "Hostname:", host.hostname));
    out.push_str(&format!("  {:<18}{}\n", "Country:", host.country));
    out.push_str(&format!("  {:<18}{}\n", "Organisation:", host.organisation));
    out.push_str(&format!("  {:<18}{}\n", "Operating System:", host.os));

    if host.ports.is_empty() {
        out.push_str(&format!("  {}\n", style("No open-port data.").dim()));
    }
    for port in &host.ports {
        out.push_str(&format!(
            "  {:<18}{}\n",
            "Open Port:",
            style(port).green()
        ));
        out.push_str(&format!(
            "  {:<18}{}\n",
            "Banner:",
            style(display_banner(&port.banner, DISPLAY_WIDTH)).dim()
        ));
    }
    out
}

/// Print a host's details to stdout.
pub fn print_host(host: &HostRecord) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write!(out, "{}", format_host(host))
}

/// Print the end-of-run counters.
pub fn print_summary(summary: &BatchSummary) {
    println!();
    println!(
        "{} {} addresses queried: {} found, {} skipped",
        style("•").dim(),
        style(summary.queried).white().bold(),
        style(summary.found).green().bold(),
        style(summary.failed).yellow()
    );
    if summary.invalid_specs > 0 {
        println!(
            "{} {} invalid target specification(s) skipped",
            style("•").dim(),
            style(summary.invalid_specs).red()
        );
    }
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}
