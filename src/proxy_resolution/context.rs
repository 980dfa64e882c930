//! Construction-time configuration for [`ProxyResolverFactoryMojo`].
//!
//! Plays the role `URLRequestContextConfig` plays for request contexts: a
//! single struct with defaults for everything the bridge needs from its
//! environment.

use crate::base::netlog::NetLog;
use crate::dns::{DnsResolverWithOverrides, HickoryResolver, Resolve};
use crate::proxy_resolution::error_observer::ErrorObserverFactory;
use crate::proxy_resolution::factory_mojo::ProxyResolverFactoryMojo;
use crate::proxy_resolution::mojom::{FactoryCall, Remote};
use crate::proxy_resolution::my_ip_address::LocalAddressSource;
use std::borrow::Cow;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

/// Configuration options for [`ProxyResolverFactoryMojo`].
#[derive(Clone, Default)]
pub struct ProxyResolutionConfig {
    /// Resolver for `dnsResolve()` / `dnsResolveEx()` (None = use HickoryResolver).
    pub dns_resolver: Option<Arc<dyn Resolve>>,

    /// DNS hostname overrides (hostname -> addresses).
    pub dns_overrides: HashMap<Cow<'static, str>, Vec<SocketAddr>>,

    /// Receives global copies of PAC alerts and errors.
    pub net_log: Option<Arc<dyn NetLog>>,

    /// Makes one error observer per created resolver.
    pub error_observer_factory: Option<ErrorObserverFactory>,

    /// Answers `myIpAddress()` (None = ask the operating system).
    pub local_addresses: Option<Arc<dyn LocalAddressSource>>,
}

impl ProxyResolutionConfig {
    /// The host resolver this configuration describes.
    pub fn host_resolver(&self) -> Arc<dyn Resolve> {
        let base_resolver: Arc<dyn Resolve> = self
            .dns_resolver
            .clone()
            .unwrap_or_else(|| Arc::new(HickoryResolver::new()));

        if self.dns_overrides.is_empty() {
            base_resolver
        } else {
            Arc::new(DnsResolverWithOverrides::new(
                base_resolver,
                self.dns_overrides.clone(),
            ))
        }
    }
}

impl std::fmt::Debug for ProxyResolutionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyResolutionConfig")
            .field("dns_resolver", &self.dns_resolver.is_some())
            .field("dns_overrides_count", &self.dns_overrides.len())
            .field("net_log", &self.net_log.is_some())
            .field("error_observer_factory", &self.error_observer_factory.is_some())
            .field("local_addresses", &self.local_addresses.is_some())
            .finish()
    }
}

impl ProxyResolverFactoryMojo {
    /// Create a factory talking to `factory` with custom configuration.
    pub fn with_config(factory: Remote<FactoryCall>, config: ProxyResolutionConfig) -> Self {
        let mut this = Self::new(factory, config.host_resolver());
        if let Some(net_log) = config.net_log {
            this = this.with_net_log(net_log);
        }
        if let Some(make_observer) = config.error_observer_factory {
            this = this.with_error_observer_factory(make_observer);
        }
        if let Some(source) = config.local_addresses {
            this = this.with_local_address_source(source);
        }
        this
    }
}
