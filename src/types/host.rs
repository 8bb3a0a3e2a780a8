//! Normalized host intelligence records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::net::IpAddr;

/// Sentinel used for any field the API did not supply.
pub const UNKNOWN: &str = "Unknown";

/// One open-port observation for a host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBanner {
    pub port: u16,
    /// Transport protocol, usually "tcp" or "udp".
    pub transport: String,
    /// Captured banner text, verbatim.
    pub banner: String,
}

impl PortBanner {
    pub fn new(port: u16, transport: impl Into<String>, banner: impl Into<String>) -> Self {
        Self {
            port,
            transport: transport.into(),
            banner: banner.into(),
        }
    }
}

impl fmt::Display for PortBanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.transport)
    }
}

/// Enrichment data for one successfully queried address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    pub ip: IpAddr,
    pub hostname: String,
    pub country: String,
    pub organisation: String,
    pub os: String,
    /// Open ports in the order the API returned them.
    pub ports: Vec<PortBanner>,
}

impl HostRecord {
    /// Create a record with every optional field set to [`UNKNOWN`].
    pub fn unknown(ip: IpAddr) -> Self {
        Self {
            ip,
            hostname: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            organisation: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
            ports: Vec::new(),
        }
    }

    pub fn with_port(mut self, port: PortBanner) -> Self {
        self.ports.push(port);
        self
    }

    /// Whether the host contributes rows to a report.
    pub fn has_ports(&self) -> bool {
        !self.ports.is_empty()
    }
}

/// Coerce an optional JSON field into a display string.
///
/// Absent, null, empty strings and empty collections become [`UNKNOWN`].
/// A non-empty list collapses to its first element, since the API returns
/// several scalar fields as singleton lists.
pub fn normalize_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => UNKNOWN.to_string(),
        Some(Value::Array(items)) => normalize_field(items.first()),
        Some(Value::String(s)) if s.is_empty() => UNKNOWN.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Object(map)) if map.is_empty() => UNKNOWN.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_missing_and_empty() {
        assert_eq!(normalize_field(None), UNKNOWN);
        assert_eq!(normalize_field(Some(&Value::Null)), UNKNOWN);
        assert_eq!(normalize_field(Some(&json!([]))), UNKNOWN);
        assert_eq!(normalize_field(Some(&json!(""))), UNKNOWN);
        assert_eq!(normalize_field(Some(&json!({}))), UNKNOWN);
    }

    #[test]
    fn test_normalize_keeps_whitespace_banner() {
        assert_eq!(normalize_field(Some(&json!("\r\n"))), "\r\n");
        assert_eq!(normalize_field(Some(&json!(" "))), " ");
    }

    #[test]
    fn test_normalize_singleton_list() {
        assert_eq!(normalize_field(Some(&json!(["France"]))), "France");
        assert_eq!(
            normalize_field(Some(&json!(["a.example.com", "b.example.com"]))),
            "a.example.com"
        );
    }

    #[test]
    fn test_normalize_scalars() {
        assert_eq!(normalize_field(Some(&json!("Linux"))), "Linux");
        assert_eq!(normalize_field(Some(&json!(42))), "42");
        assert_eq!(normalize_field(Some(&json!(true))), "true");
    }

    #[test]
    fn test_host_record_builder() {
        let ip: IpAddr = "192.0.2.1".parse().unwrap();
        let host = HostRecord::unknown(ip).with_port(PortBanner::new(22, "tcp", "SSH-2.0"));
        assert_eq!(host.hostname, UNKNOWN);
        assert!(host.has_ports());
        assert_eq!(host.ports[0].to_string(), "22/tcp");
        assert!(!HostRecord::unknown(ip).has_ports());
    }
}
