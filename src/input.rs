use crate::error::{ProbeError, TransportError};
use crate::model::{Target, TargetSpec, DEFAULT_PORT};
use tokio::net::lookup_host;

/// Builds the target from a host argument and an optional port. The host may
/// carry its own port (`example.com:8443`, `[::1]:443`) when none is given
/// separately.
pub fn target_spec(host: &str, port: Option<u16>) -> anyhow::Result<TargetSpec> {
    let host = host.trim();
    let (name, embedded) = split_host_port(host)?;
    if name.is_empty() {
        anyhow::bail!("target host must not be empty");
    }

    let port = match (embedded, port) {
        (Some(_), Some(_)) => anyhow::bail!("port given twice for target {host}"),
        (Some(port), None) | (None, Some(port)) => port,
        (None, None) => DEFAULT_PORT,
    };
    Ok(TargetSpec {
        host: name.to_string(),
        port,
    })
}

fn split_host_port(host: &str) -> anyhow::Result<(&str, Option<u16>)> {
    if let Some(rest) = host.strip_prefix('[') {
        let Some((addr, tail)) = rest.split_once(']') else {
            anyhow::bail!("missing ']' in target {host}");
        };
        if tail.is_empty() {
            return Ok((addr, None));
        }
        let Some(port) = tail.strip_prefix(':') else {
            anyhow::bail!("unexpected text after ']' in target {host}");
        };
        return Ok((addr, Some(parse_port(port, host)?)));
    }

    match host.split_once(':') {
        // a bare IPv6 address has several colons and no port
        Some((name, port)) if !port.contains(':') => Ok((name, Some(parse_port(port, host)?))),
        _ => Ok((host, None)),
    }
}

fn parse_port(port: &str, host: &str) -> anyhow::Result<u16> {
    port.parse()
        .map_err(|_| anyhow::anyhow!("invalid port {port:?} in target {host}"))
}

/// Resolves the target and keeps the first address returned.
pub async fn resolve(spec: &TargetSpec) -> Result<Target, ProbeError> {
    let mut addrs = lookup_host((spec.host.as_str(), spec.port))
        .await
        .map_err(|_| TransportError::Resolve {
            host: spec.host.clone(),
        })?;
    let resolved = addrs.next().ok_or_else(|| TransportError::Resolve {
        host: spec.host.clone(),
    })?;
    Ok(Target {
        original: spec.clone(),
        resolved,
    })
}
