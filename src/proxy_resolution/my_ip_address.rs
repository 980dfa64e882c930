//! `myIpAddress()` and `myIpAddressEx()` for PAC scripts.
//!
//! Enumerating interfaces can block, so the work runs on Tokio's blocking
//! pool and the answer is posted back through the request's
//! [`HostResolverRequestClient`]. The task is not tied to the job that asked:
//! if the job is gone by the time the answer is ready, the send is a no-op.

use crate::proxy_resolution::mojom::HostResolverRequestClient;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

/// Source of this machine's addresses.
pub trait LocalAddressSource: Send + Sync {
    /// The address `myIpAddress()` should report, or nothing.
    fn my_ip_address(&self) -> Vec<IpAddr>;

    /// Every address `myIpAddressEx()` should report.
    fn my_ip_address_ex(&self) -> Vec<IpAddr>;
}

/// Reads addresses from the operating system via `local-ip-address`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemAddressSource;

impl SystemAddressSource {
    fn interface_addresses() -> Vec<IpAddr> {
        match local_ip_address::list_afinet_netifas() {
            Ok(interfaces) => {
                let mut addrs: Vec<IpAddr> = Vec::with_capacity(interfaces.len());
                for (name, ip) in interfaces {
                    if ip.is_loopback() || addrs.contains(&ip) {
                        continue;
                    }
                    tracing::trace!(interface = %name, %ip, "candidate local address");
                    addrs.push(ip);
                }
                addrs
            }
            Err(e) => {
                tracing::debug!(error = %e, "failed to enumerate network interfaces");
                Vec::new()
            }
        }
    }
}

impl LocalAddressSource for SystemAddressSource {
    fn my_ip_address(&self) -> Vec<IpAddr> {
        // Address of the default route first, then any interface.
        let routed = local_ip_address::local_ip()
            .ok()
            .filter(is_routable)
            .or_else(|| local_ip_address::local_ipv6().ok().filter(is_routable));
        if let Some(ip) = routed {
            return vec![ip];
        }

        let interfaces = Self::interface_addresses();
        interfaces
            .iter()
            .copied()
            .find(is_routable)
            .or_else(|| interfaces.first().copied())
            .into_iter()
            .collect()
    }

    fn my_ip_address_ex(&self) -> Vec<IpAddr> {
        let interfaces = Self::interface_addresses();
        let routable: Vec<IpAddr> = interfaces.iter().copied().filter(is_routable).collect();
        if routable.is_empty() {
            interfaces
        } else {
            routable
        }
    }
}

/// A fixed list of addresses, answered for both variants.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedAddressSource {
    addrs: Vec<IpAddr>,
}

impl FixedAddressSource {
    pub fn new(addrs: Vec<IpAddr>) -> Self {
        Self { addrs }
    }
}

impl LocalAddressSource for FixedAddressSource {
    fn my_ip_address(&self) -> Vec<IpAddr> {
        self.addrs.first().copied().into_iter().collect()
    }

    fn my_ip_address_ex(&self) -> Vec<IpAddr> {
        self.addrs.clone()
    }
}

fn is_routable(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => !v4.is_loopback() && !v4.is_link_local() && !v4.is_unspecified(),
        IpAddr::V6(v6) => {
            !v6.is_loopback() && !v6.is_unspecified() && (v6.segments()[0] & 0xffc0) != 0xfe80
        }
    }
}

/// Computes the reply for `myIpAddress()` (`is_ex == false`) or
/// `myIpAddressEx()` (`is_ex == true`).
///
/// Never fails: when nothing is found the answer is `[127.0.0.1]` for both
/// variants. For `myIpAddressEx()` that differs from returning an empty
/// string, but the engine caches successful answers only, and this layer
/// does not de-duplicate requests.
pub fn compute_local_addresses(source: &dyn LocalAddressSource, is_ex: bool) -> Vec<IpAddr> {
    let mut addrs = if is_ex {
        source.my_ip_address_ex()
    } else {
        source.my_ip_address()
    };
    if addrs.is_empty() {
        addrs.push(IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
    addrs
}

/// Posts `myIpAddress[Ex]()` work to the blocking pool.
#[derive(Clone)]
pub struct MyIpAddressWorker {
    source: Arc<dyn LocalAddressSource>,
}

impl MyIpAddressWorker {
    pub fn new(source: Arc<dyn LocalAddressSource>) -> Self {
        Self { source }
    }

    /// Computes the addresses off the calling task and reports them to
    /// `client`. Fire-and-forget.
    pub fn post(&self, is_ex: bool, client: HostResolverRequestClient) {
        let source = Arc::clone(&self.source);
        tokio::task::spawn_blocking(move || {
            let addrs = compute_local_addresses(source.as_ref(), is_ex);
            tracing::debug!(is_ex, count = addrs.len(), "myIpAddress computed");
            if client.send(Ok(addrs)).is_err() {
                tracing::trace!("myIpAddress requester went away");
            }
        });
    }
}

impl Default for MyIpAddressWorker {
    fn default() -> Self {
        Self::new(Arc::new(SystemAddressSource))
    }
}

impl fmt::Debug for MyIpAddressWorker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MyIpAddressWorker").finish_non_exhaustive()
    }
}
