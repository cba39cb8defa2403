//! Destination checks that run before any outbound connection is made.
//!
//! [`check_destination`] first requires an `http`/`https` URL with a host,
//! then applies the operator's [`DestinationPolicy`]: an optional host
//! allow-list and a CIDR deny-list for IP-literal destinations. Nothing
//! here resolves DNS, so a hostname pointing into a denied range is only
//! stopped by the allow-list or by network isolation around the relay.

use std::net::IpAddr;

use ipnet::IpNet;
use url::{Host, Url};

use super::outcome::RelayOutcome;
use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostPattern {
    Exact(String),
    /// `*.example.com` — any subdomain, not the apex.
    Suffix(String),
}

impl HostPattern {
    fn matches(&self, host: &str) -> bool {
        match self {
            Self::Exact(name) => host == name,
            Self::Suffix(suffix) => host
                .strip_suffix(suffix.as_str())
                .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.')),
        }
    }
}

impl std::fmt::Display for HostPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact(name) => f.write_str(name),
            Self::Suffix(suffix) => write!(f, "*.{suffix}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DestinationPolicy {
    allow_hosts: Vec<HostPattern>,
    deny_nets: Vec<IpNet>,
}

impl DestinationPolicy {
    /// Build a policy from raw CLI entries. Blank entries are ignored;
    /// every malformed entry is reported, not just the first.
    pub fn new(allow_hosts: &[String], deny_cidrs: &[String]) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut policy = Self::default();

        for raw in allow_hosts.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            match parse_host_pattern(raw) {
                Ok(pattern) => policy.allow_hosts.push(pattern),
                Err(message) => errors.push(ValidationError {
                    field: "allow_host".into(),
                    message,
                    suggestion: Some("use 'name' or '*.domain'".into()),
                }),
            }
        }

        for raw in deny_cidrs.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            // A bare IP is accepted as a single-address network.
            let parsed = raw
                .parse::<IpNet>()
                .or_else(|_| raw.parse::<IpAddr>().map(IpNet::from));
            match parsed {
                Ok(net) => policy.deny_nets.push(net),
                Err(_) => errors.push(ValidationError {
                    field: "deny_cidr".into(),
                    message: format!("'{raw}' is not a valid IP address or CIDR"),
                    suggestion: Some("e.g. 10.0.0.0/8 or 169.254.169.254".into()),
                }),
            }
        }

        if errors.is_empty() {
            Ok(policy)
        } else {
            Err(errors)
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.allow_hosts.is_empty() && self.deny_nets.is_empty()
    }

    #[must_use]
    pub fn allow_hosts(&self) -> Vec<String> {
        self.allow_hosts.iter().map(ToString::to_string).collect()
    }

    #[must_use]
    pub fn deny_cidrs(&self) -> Vec<String> {
        self.deny_nets.iter().map(ToString::to_string).collect()
    }

    fn permits(&self, host: &Host<&str>) -> bool {
        let literal = match host {
            Host::Ipv4(v4) => Some(IpAddr::V4(*v4)),
            Host::Ipv6(v6) => Some(IpAddr::V6(*v6)),
            Host::Domain(_) => None,
        };
        // `::ffff:a.b.c.d` reaches the IPv4 host on dual-stack sockets, so it
        // is checked in both forms.
        let canonical = literal.map(canonical_ip);
        if let (Some(literal), Some(canonical)) = (literal, canonical) {
            if self
                .deny_nets
                .iter()
                .any(|net| net.contains(&literal) || net.contains(&canonical))
            {
                return false;
            }
        }

        if self.allow_hosts.is_empty() {
            return true;
        }
        let name = match (host, canonical) {
            (Host::Domain(d), _) => d.to_ascii_lowercase(),
            (_, Some(ip)) => ip.to_string(),
            (Host::Ipv4(v4), None) => v4.to_string(),
            (Host::Ipv6(v6), None) => v6.to_string(),
        };
        self.allow_hosts.iter().any(|p| p.matches(&name))
    }
}

/// Unwrap IPv4-mapped IPv6 addresses to the IPv4 address they stand for.
fn canonical_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        IpAddr::V4(_) => ip,
    }
}

fn parse_host_pattern(raw: &str) -> Result<HostPattern, String> {
    let lowered = raw.to_ascii_lowercase();
    let (name, wildcard) = match lowered.strip_prefix("*.") {
        Some(rest) => (rest.to_string(), true),
        None => (lowered, false),
    };
    if name.is_empty() {
        return Err(format!("'{raw}' has no host name"));
    }
    if name
        .chars()
        .any(|c| c == '*' || c == '/' || c == '@' || c.is_whitespace())
    {
        return Err(format!("'{raw}' is not a valid host pattern"));
    }
    // IPv6 literals are written bracketed in URLs; store them bare.
    let name = name
        .strip_prefix('[')
        .and_then(|n| n.strip_suffix(']'))
        .map_or(name.clone(), str::to_string);
    Ok(if wildcard {
        HostPattern::Suffix(name)
    } else {
        HostPattern::Exact(name)
    })
}

/// Validate `address` syntactically and against `policy`.
pub fn check_destination(address: &str, policy: &DestinationPolicy) -> Result<Url, RelayOutcome> {
    let url = Url::parse(address).map_err(|_| RelayOutcome::InvalidDestination)?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(RelayOutcome::InvalidDestination);
    }
    let host = match url.host() {
        Some(Host::Domain("")) | None => return Err(RelayOutcome::InvalidDestination),
        Some(host) => host,
    };

    if !policy.permits(&host) {
        return Err(RelayOutcome::DestinationNotAllowed {
            host: host.to_string(),
        });
    }

    Ok(url)
}
