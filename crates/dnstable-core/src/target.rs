//! Target token classification
//!
//! Every positional argument is one of:
//!
//! - a literal address: `192.0.2.10`, `2001:db8::1`, `[2001:db8::1]`
//! - a domain name: `www.example.com`
//! - a service specification: `name[:services[:transports]]`, e.g.
//!   `example.com:ldap,ldaps:tcp,udp`
//!
//! Classification is strict. A token that fits none of these fails the
//! whole run before anything is resolved.

use std::fmt;
use std::net::{IpAddr, Ipv6Addr};
use std::str::FromStr;

use crate::error::{Error, TargetField};
use crate::traits::normalize_name;

/// Services queried when a service spec gives none
pub const DEFAULT_SERVICES: &[&str] = &["http", "https"];

/// Longest domain name accepted (RFC 1035), without the trailing dot
const MAX_NAME_LEN: usize = 253;

/// Longest label accepted (RFC 1035)
const MAX_LABEL_LEN: usize = 63;

/// A classified target token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Literal IPv4 or IPv6 address
    Literal(IpAddr),
    /// Domain name resolved through CNAME/A/AAAA
    Domain(String),
    /// Name resolved through SRV records first
    Service(ServiceSpec),
}

/// SRV-based target: every service is tried over every transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    /// Base domain name
    pub name: String,
    /// Service labels, without the leading underscore, in given order
    pub services: Vec<String>,
    /// Transports, in given order
    pub transports: Vec<Transport>,
}

impl ServiceSpec {
    /// All (service, transport) pairs, services outermost
    pub fn pairs(&self) -> impl Iterator<Item = (&str, Transport)> + '_ {
        self.services.iter().flat_map(move |service| {
            self.transports
                .iter()
                .map(move |transport| (service.as_str(), *transport))
        })
    }
}

/// SRV transport label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// `_tcp`
    Tcp,
    /// `_udp`
    Udp,
}

impl Transport {
    /// Label without the leading underscore
    pub fn as_str(&self) -> &'static str {
        match self {
            Transport::Tcp => "tcp",
            Transport::Udp => "udp",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        if let Some(addr) = parse_literal(token) {
            return Ok(Target::Literal(addr));
        }

        if !token.contains(':') {
            check_domain_name(token)
                .map_err(|reason| Error::invalid_target(token, TargetField::Name, reason))?;
            return Ok(Target::Domain(normalize_name(token)));
        }

        parse_service_spec(token).map(Target::Service)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Literal(addr) => write!(f, "{}", addr),
            Target::Domain(name) => f.write_str(name),
            Target::Service(spec) => {
                let transports: Vec<&str> = spec.transports.iter().map(|t| t.as_str()).collect();
                write!(
                    f,
                    "{}:{}:{}",
                    spec.name,
                    spec.services.join(","),
                    transports.join(",")
                )
            }
        }
    }
}

/// Classify every token, stopping at the first invalid one
pub fn classify_all<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Target>, Error> {
    tokens.iter().map(|t| t.as_ref().parse()).collect()
}

/// Parse an IPv4 or IPv6 literal, with or without brackets around IPv6
pub fn parse_literal(text: &str) -> Option<IpAddr> {
    if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
        return inner.parse::<Ipv6Addr>().ok().map(IpAddr::V6);
    }
    text.parse::<IpAddr>().ok()
}

fn parse_service_spec(token: &str) -> Result<ServiceSpec, Error> {
    let fields: Vec<&str> = token.split(':').collect();
    if fields.len() > 3 {
        return Err(Error::invalid_target(
            token,
            TargetField::Name,
            format!(
                "expected name[:services[:transports]], got {} fields",
                fields.len()
            ),
        ));
    }

    let name = fields[0];
    check_domain_name(name)
        .map_err(|reason| Error::invalid_target(token, TargetField::Name, reason))?;

    let services = match fields.get(1).copied().filter(|s| !s.is_empty()) {
        Some(list) => parse_services(list)
            .map_err(|reason| Error::invalid_target(token, TargetField::Services, reason))?,
        None => DEFAULT_SERVICES.iter().map(|s| s.to_string()).collect(),
    };

    let transports = match fields.get(2).copied().filter(|s| !s.is_empty()) {
        Some(list) => parse_transports(list)
            .map_err(|reason| Error::invalid_target(token, TargetField::Transports, reason))?,
        None => vec![Transport::Tcp],
    };

    Ok(ServiceSpec {
        name: normalize_name(name),
        services,
        transports,
    })
}

fn parse_services(list: &str) -> Result<Vec<String>, String> {
    let mut services: Vec<String> = Vec::new();
    for service in list.split(',') {
        if service.is_empty() {
            return Err(format!("empty service in '{}'", list));
        }
        if !service
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(format!("'{}' is not a bare service word", service));
        }
        let service = service.to_ascii_lowercase();
        if !services.contains(&service) {
            services.push(service);
        }
    }
    Ok(services)
}

fn parse_transports(list: &str) -> Result<Vec<Transport>, String> {
    match list {
        "tcp" => Ok(vec![Transport::Tcp]),
        "udp" => Ok(vec![Transport::Udp]),
        "tcp,udp" => Ok(vec![Transport::Tcp, Transport::Udp]),
        "udp,tcp" => Ok(vec![Transport::Udp, Transport::Tcp]),
        other => Err(format!(
            "'{}' is not one of tcp, udp, tcp,udp, udp,tcp",
            other
        )),
    }
}

/// Check domain name syntax
///
/// Labels may hold ASCII alphanumerics, hyphens and underscores; a single
/// trailing dot is allowed.
fn check_domain_name(name: &str) -> Result<(), String> {
    let name = name.strip_suffix('.').unwrap_or(name);
    if name.is_empty() {
        return Err("name cannot be empty".to_string());
    }

    if name.len() > MAX_NAME_LEN {
        return Err(format!(
            "name too long: {} chars (max {})",
            name.len(),
            MAX_NAME_LEN
        ));
    }

    for label in name.split('.') {
        if label.is_empty() {
            return Err(format!("empty label in '{}'", name));
        }

        if label.len() > MAX_LABEL_LEN {
            return Err(format!(
                "label too long: {} chars (max {}). Label: '{}'",
                label.len(),
                MAX_LABEL_LEN,
                label
            ));
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(format!("label contains invalid characters: '{}'", label));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(format!(
                "label cannot start or end with hyphen: '{}'",
                label
            ));
        }
    }

    Ok(())
}
