//! CSV report generation.
//!
//! One row per (host, open port) pair with the host-level fields repeated on
//! every row. Hosts without open-port data produce no rows.

use crate::error::ReportError;
use crate::types::HostRecord;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::info;

/// Column headers, in output order.
pub const REPORT_HEADERS: [&str; 8] = [
    "IP",
    "Hostname",
    "Country",
    "Organisation",
    "Operating System",
    "Port",
    "Protocol",
    "Banner",
];

/// One flattened report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "Hostname")]
    pub hostname: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Organisation")]
    pub organisation: String,
    #[serde(rename = "Operating System")]
    pub os: String,
    #[serde(rename = "Port")]
    pub port: u16,
    #[serde(rename = "Protocol")]
    pub protocol: String,
    #[serde(rename = "Banner")]
    pub banner: String,
}

/// Flatten batches of hosts into report rows, preserving encounter order.
pub fn flatten<'a, B, H>(batches: B) -> Vec<ReportRow>
where
    B: IntoIterator<Item = H>,
    H: IntoIterator<Item = &'a HostRecord>,
{
    batches
        .into_iter()
        .flatten()
        .flat_map(|host| {
            host.ports.iter().map(move |port| ReportRow {
                ip: host.ip.to_string(),
                hostname: host.hostname.clone(),
                country: host.country.clone(),
                organisation: host.organisation.clone(),
                os: host.os.clone(),
                port: port.port,
                protocol: port.transport.clone(),
                banner: port.banner.clone(),
            })
        })
        .collect()
}

/// File name for a report started at `started_at`.
pub fn report_file_name(started_at: &DateTime<Local>) -> String {
    format!("pythodan-{}.csv", started_at.format("%Y%m%d-%H%M%S"))
}

/// Write rows, header first, to any writer.
pub fn write_rows<W: io::Write>(writer: W, rows: &[ReportRow]) -> Result<(), ReportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    // Written by hand so an empty report still has a header.
    wtr.write_record(REPORT_HEADERS)?;
    for row in rows {
        wtr.serialize(row)?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Writes timestamped CSV reports into a directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    /// Write reports into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write reports into the current working directory.
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    /// Flatten `batches` and write them to a new report file.
    ///
    /// Returns the path of the written file.
    pub fn write<'a, B, H>(
        &self,
        batches: B,
        started_at: &DateTime<Local>,
    ) -> Result<PathBuf, ReportError>
    where
        B: IntoIterator<Item = H>,
        H: IntoIterator<Item = &'a HostRecord>,
    {
        let rows = flatten(batches);
        let path = self.dir.join(report_file_name(started_at));

        let file = File::create(&path).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        write_rows(file, &rows)?;

        info!(path = %path.display(), rows = rows.len(), "Report written");
        Ok(path)
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::current_dir()
    }
}
