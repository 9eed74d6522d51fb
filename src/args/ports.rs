//! Port binding tokens: `[IP:][HOST:]GUEST[/PROTO]`.

use crate::error::DkrError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "tcp",
            Protocol::Udp => "udp",
            Protocol::Sctp => "sctp",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = DkrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            "sctp" => Ok(Protocol::Sctp),
            other => Err(DkrError::invalid_input(format!(
                "Unsupported port protocol: {}",
                other
            ))),
        }
    }
}

/// A published port: the guest port is always present, host side is optional.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortBinding {
    pub ip: Option<String>,
    pub host_port: Option<u16>,
    pub guest_port: u16,
    pub proto: Protocol,
}

impl PortBinding {
    /// Engine key for the guest side, e.g. `8080/tcp`.
    pub fn exposed_key(&self) -> String {
        format!("{}/{}", self.guest_port, self.proto)
    }
}

fn invalid_port(token: &str) -> DkrError {
    DkrError::invalid_input(format!(
        "Port parameter must match [IP:][HOST:]GUEST[/PROTO]: {}",
        token
    ))
}

fn parse_number(segment: &str, token: &str) -> Result<u16, DkrError> {
    segment.trim().parse::<u16>().map_err(|_| invalid_port(token))
}

impl FromStr for PortBinding {
    type Err = DkrError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = token.split(':').collect();

        let (ip, host, guest) = match segments.as_slice() {
            [ip, host, guest] if ip.contains('.') => (Some(*ip), Some(*host), *guest),
            [ip, guest] if ip.contains('.') => (Some(*ip), None, *guest),
            [host, guest] => (None, Some(*host), *guest),
            [guest] => (None, None, *guest),
            _ => return Err(invalid_port(token)),
        };

        let (guest, proto) = match guest.split_once('/') {
            Some((port, proto)) => (port, proto.parse::<Protocol>()?),
            None => (guest, Protocol::Tcp),
        };

        // `ip::guest` leaves the host port to the engine.
        let host_port = match host {
            Some(h) if h.is_empty() && ip.is_some() => None,
            Some(h) => Some(parse_number(h, token)?),
            None => None,
        };

        Ok(PortBinding {
            ip: ip.map(str::to_string),
            host_port,
            guest_port: parse_number(guest, token)?,
            proto,
        })
    }
}
