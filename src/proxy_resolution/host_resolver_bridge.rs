use crate::dns::{AddressFamily, Name, Resolve};
use crate::proxy_resolution::mojom::{HostResolverRequestClient, HostResolverResult};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Answers `dnsResolve()` / `dnsResolveEx()` for one job using a [`Resolve`]
/// implementation. Equivalent to Chromium's `MojoHostResolverImpl`.
///
/// Lookups are polled by the owning job's task through
/// [`next_completion`](Self::next_completion); dropping the bridge cancels
/// every outstanding lookup, which the engine sees as a closed client.
pub(crate) struct HostResolverBridge {
    resolver: Arc<dyn Resolve>,
    pending: FuturesUnordered<BoxFuture<'static, ()>>,
    in_progress: Arc<AtomicBool>,
}

impl HostResolverBridge {
    pub(crate) fn new(resolver: Arc<dyn Resolve>, in_progress: Arc<AtomicBool>) -> Self {
        Self {
            resolver,
            pending: FuturesUnordered::new(),
            in_progress,
        }
    }

    /// Starts a lookup and reports the answer to `client`.
    pub(crate) fn resolve(
        &mut self,
        hostname: String,
        is_ex: bool,
        mut client: HostResolverRequestClient,
    ) {
        let family = if is_ex {
            AddressFamily::Unspecified
        } else {
            AddressFamily::Ipv4
        };
        tracing::debug!(host = %hostname, ?family, "PAC script requested host resolution");

        let lookup = self.resolver.resolve(Name::from(hostname.clone()), family);
        self.pending.push(
            async move {
                let result = tokio::select! {
                    result = lookup => Some(result),
                    _ = client.closed() => None,
                };
                let Some(result) = result else {
                    tracing::debug!(host = %hostname, "host resolution abandoned by engine");
                    return;
                };
                let result: HostResolverResult = result.map(|addrs| addrs.collect::<Vec<IpAddr>>());
                match &result {
                    Ok(addrs) => tracing::debug!(host = %hostname, count = addrs.len(), "host resolved"),
                    Err(e) => tracing::debug!(host = %hostname, error = %e, "host resolution failed"),
                }
                let _ = client.send(result);
            }
            .boxed(),
        );
        self.sync_flag();
    }

    pub(crate) fn request_in_progress(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drives outstanding lookups; resolves once one of them finishes.
    /// Returns `None` right away when nothing is outstanding.
    pub(crate) async fn next_completion(&mut self) -> Option<()> {
        let done = self.pending.next().await;
        self.sync_flag();
        done
    }

    fn sync_flag(&self) {
        self.in_progress
            .store(self.request_in_progress(), Ordering::Release);
    }
}

impl Drop for HostResolverBridge {
    fn drop(&mut self) {
        self.in_progress.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::neterror::NetError;
    use crate::dns::{Addrs, Resolving};
    use std::net::{Ipv4Addr, Ipv6Addr};
    use tokio::sync::oneshot;

    struct DualStackResolver;

    impl Resolve for DualStackResolver {
        fn resolve(&self, name: Name, family: AddressFamily) -> Resolving {
            if name.as_str() == "missing.test" {
                return Box::pin(async { Err(NetError::NameNotResolved) });
            }
            let addrs: Vec<IpAddr> = vec![
                IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)),
                IpAddr::V6(Ipv6Addr::LOCALHOST),
            ]
            .into_iter()
            .filter(|ip| family.matches(ip))
            .collect();
            Box::pin(async move { Ok(Box::new(addrs.into_iter()) as Addrs) })
        }
    }

    fn bridge() -> (HostResolverBridge, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (HostResolverBridge::new(Arc::new(DualStackResolver), flag.clone()), flag)
    }

    #[tokio::test]
    async fn test_plain_lookup_is_ipv4_only() {
        let (mut bridge, flag) = bridge();
        let (client, response) = oneshot::channel();

        bridge.resolve("host.test".into(), false, client);
        assert!(bridge.request_in_progress());
        assert!(flag.load(Ordering::Acquire));

        assert_eq!(bridge.next_completion().await, Some(()));
        assert!(!flag.load(Ordering::Acquire));
        assert_eq!(
            response.await.unwrap().unwrap(),
            vec![IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))]
        );
    }

    #[tokio::test]
    async fn test_ex_lookup_returns_all_families() {
        let (mut bridge, _flag) = bridge();
        let (client, response) = oneshot::channel();

        bridge.resolve("host.test".into(), true, client);
        bridge.next_completion().await;

        assert_eq!(response.await.unwrap().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_forwarded() {
        let (mut bridge, _flag) = bridge();
        let (client, response) = oneshot::channel();

        bridge.resolve("missing.test".into(), false, client);
        bridge.next_completion().await;

        assert_eq!(response.await.unwrap(), Err(NetError::NameNotResolved));
    }

    #[tokio::test]
    async fn test_idle_bridge_completes_immediately() {
        let (mut bridge, _flag) = bridge();
        assert!(!bridge.request_in_progress());
        assert_eq!(bridge.next_completion().await, None);
    }

    #[tokio::test]
    async fn test_drop_clears_flag_and_closes_client() {
        let (mut bridge, flag) = bridge();
        let (client, response) = oneshot::channel();

        bridge.resolve("host.test".into(), false, client);
        drop(bridge);

        assert!(!flag.load(Ordering::Acquire));
        assert!(response.await.is_err());
    }
}
