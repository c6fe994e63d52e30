//! Server name resolution

use std::net::{IpAddr, Ipv4Addr};

use trust_dns_resolver::TokioAsyncResolver;

use crate::core::{Error, Result};

/// Resolves `host` to an IPv4 address.
///
/// Dotted-quad literals are returned as-is; anything else goes through the
/// system resolver configuration and the first IPv4 answer wins.
pub async fn resolve_host(host: &str) -> Result<Ipv4Addr> {
    if let Ok(addr) = host.parse::<Ipv4Addr>() {
        return Ok(addr);
    }
    if host.parse::<IpAddr>().is_ok() {
        return Err(Error::resolution(format!("{} is not an IPv4 address", host)));
    }

    let resolver = TokioAsyncResolver::tokio_from_system_conf()
        .map_err(|e| Error::resolution(format!("Failed to load resolver configuration: {}", e)))?;

    let lookup = resolver
        .lookup_ip(host)
        .await
        .map_err(|e| Error::resolution(format!("Failed to resolve {}: {}", host, e)))?;

    let addr = first_ipv4(lookup.iter())
        .ok_or_else(|| Error::resolution(format!("No IPv4 address found for {}", host)))?;

    tracing::debug!("Resolved {} to {}", host, addr);
    Ok(addr)
}

fn first_ipv4(addrs: impl IntoIterator<Item = IpAddr>) -> Option<Ipv4Addr> {
    addrs.into_iter().find_map(|addr| match addr {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(_) => None,
    })
}
