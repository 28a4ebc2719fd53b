use std::fmt;
use std::str::FromStr;

use crate::error::LinkError;

/// Where an engine lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// TCP listener, e.g. `tcp://127.0.0.1:8181` or `127.0.0.1:8181`.
    Tcp { host: String, port: u16 },
    /// Child process speaking the protocol on stdin/stdout, e.g.
    /// `exec:./rollerball --depth 4`.
    Process { program: String, args: Vec<String> },
}

impl Endpoint {
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Endpoint::Tcp {
            host: host.into(),
            port,
        }
    }

    pub fn process(program: impl Into<String>, args: Vec<String>) -> Self {
        Endpoint::Process {
            program: program.into(),
            args,
        }
    }
}

fn invalid(endpoint: &str, reason: impl Into<String>) -> LinkError {
    LinkError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason: reason.into(),
    }
}

fn parse_host_port(raw: &str, addr: &str) -> Result<Endpoint, LinkError> {
    let (host, port) = match addr.strip_prefix('[') {
        // IPv6 literal, e.g. [::1]:8181
        Some(rest) => rest
            .split_once("]:")
            .ok_or_else(|| invalid(raw, "expected [addr]:port"))?,
        None => addr
            .rsplit_once(':')
            .ok_or_else(|| invalid(raw, "expected host:port"))?,
    };
    if host.is_empty() {
        return Err(invalid(raw, "missing host"));
    }
    let port: u16 = port
        .parse()
        .map_err(|_| invalid(raw, format!("invalid port {:?}", port)))?;
    Ok(Endpoint::tcp(host, port))
}

impl FromStr for Endpoint {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if let Some(command) = raw.strip_prefix("exec:") {
            let mut parts = command.split_whitespace().map(str::to_string);
            let program = parts
                .next()
                .ok_or_else(|| invalid(raw, "missing program"))?;
            return Ok(Endpoint::process(program, parts.collect()));
        }
        if let Some(addr) = raw.strip_prefix("tcp://") {
            return parse_host_port(raw, addr);
        }
        if let Some((scheme, _)) = raw.split_once("://") {
            return Err(invalid(raw, format!("unsupported scheme {:?}", scheme)));
        }
        parse_host_port(raw, raw)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Tcp { host, port } if host.contains(':') => {
                write!(f, "tcp://[{}]:{}", host, port)
            }
            Endpoint::Tcp { host, port } => write!(f, "tcp://{}:{}", host, port),
            Endpoint::Process { program, args } => {
                write!(f, "exec:{}", program)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tcp() {
        assert_eq!(
            "tcp://127.0.0.1:8181".parse::<Endpoint>().unwrap(),
            Endpoint::tcp("127.0.0.1", 8181)
        );
        assert_eq!(
            "localhost:8182".parse::<Endpoint>().unwrap(),
            Endpoint::tcp("localhost", 8182)
        );
    }

    #[test]
    fn test_parse_process() {
        let endpoint: Endpoint = "exec:./rollerball --depth 4".parse().unwrap();
        assert_eq!(
            endpoint,
            Endpoint::process("./rollerball", vec!["--depth".into(), "4".into()])
        );
        assert_eq!(endpoint.to_string(), "exec:./rollerball --depth 4");
    }

    #[test]
    fn test_parse_rejects_bad_endpoints() {
        for raw in [
            "http://localhost:80",
            "localhost",
            ":8181",
            "host:99999",
            "exec:",
            "[::1]",
            "[]:8181",
        ] {
            assert!(
                matches!(raw.parse::<Endpoint>(), Err(LinkError::InvalidEndpoint { .. })),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn test_parse_ipv6_literal() {
        assert_eq!(
            "[::1]:8181".parse::<Endpoint>().unwrap(),
            Endpoint::tcp("::1", 8181)
        );
        assert_eq!(
            "tcp://[fe80::1]:8182".parse::<Endpoint>().unwrap(),
            Endpoint::tcp("fe80::1", 8182)
        );
    }

    #[test]
    fn test_display_round_trips() {
        for endpoint in [Endpoint::tcp("127.0.0.1", 8181), Endpoint::tcp("::1", 8181)] {
            assert_eq!(endpoint.to_string().parse::<Endpoint>().unwrap(), endpoint);
        }
        assert_eq!(Endpoint::tcp("::1", 8181).to_string(), "tcp://[::1]:8181");
    }
}
