//! Host intelligence lookups.
//!
//! [`HostLookup`] abstracts "fetch enrichment data for one address" so the
//! batch runner can be driven by the real API client or an in-memory table.

pub mod shodan;

use crate::error::QueryResult;
use crate::types::HostRecord;
use async_trait::async_trait;
use std::net::IpAddr;

pub use shodan::{ApiInfo, ShodanClient};

/// A source of host intelligence.
///
/// Implementations must not sleep or retry: pacing belongs to the caller.
#[async_trait]
pub trait HostLookup: Send + Sync {
    /// Look up a single address.
    async fn lookup(&self, ip: IpAddr) -> QueryResult<HostRecord>;
}

