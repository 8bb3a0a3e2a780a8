//! Target specification parsing and address expansion.
//!
//! Supports:
//! - Single IP addresses (IPv4 and IPv6)
//! - CIDR notation (192.168.1.0/24, 2001:db8::/120)
//! - Nmap-style IPv4 octet ranges (192.168.1.1-10, 10.0-3.*.1,5,9)
//!
//! Expansion is lazy: a `/8` is never materialized, addresses are produced
//! as the caller pulls them.

use ipnetwork::IpNetwork;
use std::collections::BTreeSet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// Error type for target parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TargetError {
    #[error("empty target specification")]
    Empty,
    #[error("invalid target specification: {0}")]
    InvalidFormat(String),
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
    #[error("invalid octet '{octet}' in target specification '{spec}'")]
    InvalidOctet { spec: String, octet: String },
}

/// Values taken by each of the four octets of an Nmap-style range.
///
/// Each octet holds its distinct values in ascending order; iteration varies
/// the last octet fastest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctetRange {
    octets: [Vec<u8>; 4],
}

impl OctetRange {
    fn parse(s: &str) -> Result<Self, TargetError> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 4 {
            return Err(TargetError::InvalidFormat(s.to_string()));
        }

        let mut octets: [Vec<u8>; 4] = Default::default();
        for (slot, part) in octets.iter_mut().zip(parts) {
            *slot = parse_octet(part).ok_or_else(|| TargetError::InvalidOctet {
                spec: s.to_string(),
                octet: part.to_string(),
            })?;
        }

        Ok(Self { octets })
    }

    /// Iterate every address in the range.
    pub fn iter(&self) -> impl Iterator<Item = Ipv4Addr> + Send + '_ {
        let [a, b, c, d] = &self.octets;
        a.iter().flat_map(move |&o1| {
            b.iter().flat_map(move |&o2| {
                c.iter()
                    .flat_map(move |&o3| d.iter().map(move |&o4| Ipv4Addr::new(o1, o2, o3, o4)))
            })
        })
    }

    /// Number of addresses in the range.
    pub fn len(&self) -> u128 {
        self.octets.iter().map(|o| o.len() as u128).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for OctetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.octets.iter().map(|o| format_octet(o)).collect();
        write!(f, "{}", rendered.join("."))
    }
}

/// Parse one octet: `n`, `a-b`, `-b`, `a-`, `*`, or a comma list of these.
fn parse_octet(spec: &str) -> Option<Vec<u8>> {
    if spec.is_empty() {
        return None;
    }

    let mut values = BTreeSet::new();
    for element in spec.split(',') {
        if element == "*" {
            values.extend(0..=u8::MAX);
        } else if let Some((low, high)) = element.split_once('-') {
            let low = if low.is_empty() { 0 } else { parse_octet_value(low)? };
            let high = if high.is_empty() { u8::MAX } else { parse_octet_value(high)? };
            if low > high {
                return None;
            }
            values.extend(low..=high);
        } else {
            values.insert(parse_octet_value(element)?);
        }
    }

    Some(values.into_iter().collect())
}

fn parse_octet_value(s: &str) -> Option<u8> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Render an octet's values back into compact range notation.
fn format_octet(values: &[u8]) -> String {
    let mut runs: Vec<String> = Vec::new();
    let mut iter = values.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while let Some(&next) = iter.peek() {
            if end.checked_add(1) == Some(next) {
                end = next;
                iter.next();
            } else {
                break;
            }
        }
        if start == end {
            runs.push(start.to_string());
        } else if start == 0 && end == u8::MAX {
            runs.push("*".to_string());
        } else {
            runs.push(format!("{}-{}", start, end));
        }
    }
    runs.join(",")
}

/// A parsed target specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    /// A single IP address.
    Single(IpAddr),
    /// A CIDR network block, normalized to its network address.
    Cidr(IpNetwork),
    /// An Nmap-style IPv4 octet range.
    Octets(OctetRange),
}

impl TargetSpec {
    /// Parse a target specification from a string.
    pub fn parse(s: &str) -> Result<Self, TargetError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TargetError::Empty);
        }

        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::Single(ip));
        }

        if s.contains('/') {
            let network: IpNetwork = s
                .parse()
                .map_err(|_| TargetError::InvalidCidr(s.to_string()))?;
            let network = IpNetwork::new(network.network(), network.prefix())
                .map_err(|_| TargetError::InvalidCidr(s.to_string()))?;
            return Ok(Self::Cidr(network));
        }

        if s.contains(':') {
            return Err(TargetError::InvalidFormat(s.to_string()));
        }

        OctetRange::parse(s).map(Self::Octets)
    }

    /// Lazily iterate every address this specification denotes.
    ///
    /// Calling this again restarts from the first address.
    pub fn addresses(&self) -> Box<dyn Iterator<Item = IpAddr> + Send + '_> {
        match self {
            Self::Single(ip) => Box::new(std::iter::once(*ip)),
            Self::Cidr(IpNetwork::V4(net)) => {
                let start = u32::from(net.network());
                let end = start | !u32::from(net.mask());
                Box::new((start..=end).map(|n| IpAddr::V4(Ipv4Addr::from(n))))
            }
            Self::Cidr(IpNetwork::V6(net)) => {
                let start = u128::from(net.network());
                let end = start | !u128::from(net.mask());
                Box::new((start..=end).map(|n| IpAddr::V6(Ipv6Addr::from(n))))
            }
            Self::Octets(range) => Box::new(range.iter().map(IpAddr::V4)),
        }
    }

    /// Exact number of addresses, saturating at `u128::MAX` for `::/0`.
    pub fn host_count(&self) -> u128 {
        match self {
            Self::Single(_) => 1,
            Self::Cidr(network) => {
                let bits: u32 = if network.is_ipv4() { 32 } else { 128 };
                let host_bits = bits - u32::from(network.prefix());
                1u128.checked_shl(host_bits).unwrap_or(u128::MAX)
            }
            Self::Octets(range) => range.len(),
        }
    }
}

impl FromStr for TargetSpec {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(ip) => write!(f, "{}", ip),
            Self::Cidr(network) => write!(f, "{}", network),
            Self::Octets(range) => write!(f, "{}", range),
        }
    }
}
