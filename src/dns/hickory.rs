//! Async DNS resolver using hickory-dns.
//!
//! This resolver provides fully async DNS resolution with support for:
//! - DNS-over-HTTPS (DoH)
//! - DNS-over-TLS (DoT)
//! - System DNS configuration auto-detection
//!
//! # Performance
//!
//! Unlike `GaiResolver`, this resolver is fully async and doesn't require
//! spawning blocking tasks. It maintains connection pools to DNS servers
//! for better performance under load.

use super::{AddressFamily, Addrs, Name, Resolve, Resolving};
use crate::base::neterror::NetError;
use hickory_resolver::{
    config::{LookupIpStrategy, ResolverConfig},
    name_server::TokioConnectionProvider,
    TokioResolver,
};
use std::{io, net::IpAddr, sync::LazyLock};

/// Async DNS resolver backed by hickory-dns.
///
/// This resolver is lazily initialized on first use and shared across
/// all instances via a static `LazyLock`. It always asks for both address
/// families and filters the answer to what the caller requested, so one
/// cached lookup serves both `dnsResolve()` and `dnsResolveEx()`.
///
/// # Example
///
/// ```rust,ignore
/// use pacbridge::dns::{AddressFamily, HickoryResolver, Name, Resolve};
///
/// let resolver = HickoryResolver::new();
/// let addrs = resolver.resolve(Name::new("example.com"), AddressFamily::Ipv4).await?;
/// ```
#[derive(Debug, Clone)]
pub struct HickoryResolver {
    resolver: &'static LazyLock<TokioResolver>,
}

impl HickoryResolver {
    /// Creates a new `HickoryResolver`.
    ///
    /// The underlying resolver is lazily initialized on first DNS query.
    /// It will attempt to read system DNS configuration; if that fails,
    /// it falls back to sensible defaults.
    pub fn new() -> Self {
        static RESOLVER: LazyLock<TokioResolver> = LazyLock::new(|| {
            let mut builder = match TokioResolver::builder_tokio() {
                Ok(builder) => {
                    tracing::debug!("Using system DNS configuration");
                    builder
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to read system DNS config, using defaults"
                    );
                    TokioResolver::builder_with_config(
                        ResolverConfig::default(),
                        TokioConnectionProvider::default(),
                    )
                }
            };

            builder.options_mut().ip_strategy = LookupIpStrategy::Ipv4AndIpv6;

            builder.build()
        });

        Self {
            resolver: &RESOLVER,
        }
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolve for HickoryResolver {
    fn resolve(&self, name: Name, family: AddressFamily) -> Resolving {
        Box::pin(lookup(self.clone(), name, family))
    }
}

async fn lookup(
    resolver: HickoryResolver,
    name: Name,
    family: AddressFamily,
) -> Result<Addrs, NetError> {
    let domain = name.as_str();
    tracing::debug!(domain = %domain, ?family, "resolving via hickory-dns");

    let lookup = resolver.resolver.lookup_ip(domain).await.map_err(|e| {
        tracing::debug!(domain = %domain, error = %e, "hickory-dns lookup failed");
        NetError::dns_failed(domain, io::Error::new(io::ErrorKind::NotFound, e.to_string()))
    })?;

    let ips: Vec<IpAddr> = lookup.iter().filter(|ip| family.matches(ip)).collect();

    if ips.is_empty() {
        return Err(NetError::dns_failed(
            domain,
            io::Error::new(io::ErrorKind::NotFound, "No addresses returned"),
        ));
    }

    tracing::debug!(domain = %domain, count = ips.len(), "hickory-dns resolution complete");
    Ok(Box::new(ips.into_iter()) as Addrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_hickory_resolver_ip_literal() {
        let resolver = HickoryResolver::new();
        let addrs: Vec<_> = resolver
            .resolve(Name::new("192.0.2.7"), AddressFamily::Unspecified)
            .await
            .unwrap()
            .collect();

        assert_eq!(addrs, vec![IpAddr::V4(Ipv4Addr::new(192, 0, 2, 7))]);
    }

    #[tokio::test]
    async fn test_hickory_resolver_filters_family() {
        let resolver = HickoryResolver::new();
        let result = resolver.resolve(Name::new("192.0.2.7"), AddressFamily::Ipv6).await;

        match result {
            Err(NetError::NameNotResolvedFor { domain, .. }) => assert_eq!(domain, "192.0.2.7"),
            Err(other) => panic!("Unexpected error: {other}"),
            Ok(_) => panic!("Expected failure"),
        }
    }

    #[test]
    fn test_hickory_resolver_is_clone() {
        let r1 = HickoryResolver::new();
        let r2 = r1.clone();
        // Both should point to the same static resolver
        assert!(std::ptr::eq(r1.resolver, r2.resolver));
    }
}
