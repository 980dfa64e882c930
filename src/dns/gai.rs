//! System DNS resolver using getaddrinfo.
//!
//! This resolver uses the operating system's native DNS resolution via
//! `getaddrinfo`, executed in a thread pool to avoid blocking the async runtime.
//!
//! # When to Use
//!
//! - When PAC lookups must respect system DNS configuration (/etc/hosts, etc.)
//! - When DoH/DoT is not required

use super::{AddressFamily, Addrs, Name, Resolve, Resolving};
use crate::base::context::IoResultExt;
use crate::base::neterror::NetError;
use std::{
    io,
    net::{IpAddr, ToSocketAddrs},
};

/// System DNS resolver using `getaddrinfo` in a thread pool.
///
/// This resolver wraps the standard library's `ToSocketAddrs` trait and
/// executes resolution in `tokio::task::spawn_blocking` to avoid blocking
/// the async runtime. IP literals are answered without a lookup.
#[derive(Clone, Debug, Default)]
pub struct GaiResolver;

impl GaiResolver {
    /// Creates a new `GaiResolver`.
    pub fn new() -> Self {
        Self
    }
}

impl Resolve for GaiResolver {
    fn resolve(&self, name: Name, family: AddressFamily) -> Resolving {
        Box::pin(lookup(name, family))
    }
}

async fn lookup(name: Name, family: AddressFamily) -> Result<Addrs, NetError> {
    let domain = name.as_str().to_string();

    let ips = match parse_ip_literal(&domain) {
        Some(ip) => vec![ip],
        None => {
            let host = domain.clone();
            tokio::task::spawn_blocking(move || {
                tracing::debug!(host = %host, "resolving via getaddrinfo");
                (host.as_str(), 0u16)
                    .to_socket_addrs()
                    .map(|iter| iter.map(|addr| addr.ip()).collect::<Vec<_>>())
                    .dns_context(&host)
            })
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "DNS resolution task failed");
                NetError::NameNotResolved
            })??
        }
    };

    let ips: Vec<IpAddr> = ips.into_iter().filter(|ip| family.matches(ip)).collect();
    if ips.is_empty() {
        return Err(NetError::dns_failed(
            &domain,
            io::Error::new(io::ErrorKind::NotFound, "No addresses of requested family"),
        ));
    }

    tracing::debug!(domain = %domain, count = ips.len(), "DNS resolution complete");
    Ok(Box::new(ips.into_iter()) as Addrs)
}

/// Parses `host` as an IP literal, accepting bracketed IPv6 (`[::1]`).
fn parse_ip_literal(host: &str) -> Option<IpAddr> {
    let trimmed = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    trimmed.parse().ok()
}
