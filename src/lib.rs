//! # Pythodan - Passive Host Reconnaissance
//!
//! Pythodan asks Shodan what it already knows about a set of addresses (open
//! ports, banners, OS guess, organisation, hostnames) without sending a single
//! packet to the targets, and writes the findings to a CSV report.
//!
//! ## Features
//!
//! - **Flexible Targeting**: single IPs, Nmap-style octet ranges, and CIDR blocks
//! - **Lazy Expansion**: large blocks are streamed, never materialized
//! - **Global Pacing**: one query per interval across the whole run
//! - **Failure Tolerance**: a failed lookup is reported and skipped
//! - **CSV Report**: one row per host and open port
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use pythodan::batch::{BatchRunner, RateLimiter};
//! use pythodan::output::ReportWriter;
//! use pythodan::query::ShodanClient;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ShodanClient::new("API_KEY")?;
//!     let runner = BatchRunner::new(client, RateLimiter::new(Duration::from_secs(1)));
//!
//!     let outcome = runner.run(["192.168.1.1-10"], &mut ()).await;
//!     let path = ReportWriter::current_dir()
//!         .write(outcome.batches.iter().map(|b| &b.hosts), &chrono::Local::now())?;
//!     println!("report written to {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Target specifications (range expansion) and host records
//! - [`query`] - The `HostLookup` trait and the Shodan client
//! - [`batch`] - Sequential, paced batch runner
//! - [`output`] - Console rendering and the CSV report writer
//! - [`config`] - Settings file handling
//! - [`cli`] - Command-line shell
//! - [`error`] - Error types

pub mod banner;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod query;
pub mod types;

// Re-export commonly used types
pub use batch::{BatchOutcome, BatchRunner, Pacer, RateLimiter};
pub use error::{CliError, CredentialError, QueryError, ReportError};
pub use query::{HostLookup, ShodanClient};
pub use types::{HostRecord, PortBanner, TargetError, TargetSpec};
