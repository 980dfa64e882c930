//! Proxy resolution through an out-of-process PAC engine.
//!
//! Mirrors Chromium's `services/network/proxy_resolver_factory_mojo`:
//! - [`ProxyResolverFactoryMojo`]: Hands PAC scripts to the engine and yields resolvers
//! - [`ProxyResolverMojo`]: One compiled script; answers `get_proxy_for_url`
//! - [`mojom`]: The channel messages exchanged with the engine
//! - [`ProxyInfo`]: The proxies a script chose, in order
//!
//! While a request is outstanding the engine may call back for `alert()`,
//! script errors, `dnsResolve()` and `myIpAddress()`. Those are answered by a
//! per-request [`ProxyResolverClient`] until the engine reports a result or
//! disconnects.
//!
//! A factory and the resolvers it creates run all their jobs on one task, so
//! completion callbacks never run concurrently and follow the order in which
//! the engine reported results.

pub mod client_bridge;
pub mod context;
pub mod error_observer;
pub mod factory_mojo;
mod host_resolver_bridge;
mod job_sequence;
pub mod mojom;
pub mod my_ip_address;
pub mod pac_file_data;
pub mod proxy_info;
pub mod resolver_mojo;

pub use client_bridge::ProxyResolverClient;
pub use context::ProxyResolutionConfig;
pub use error_observer::{ErrorObserverFactory, ProxyResolverErrorObserver};
pub use factory_mojo::{CreateRequest, CreateResult, ProxyResolverFactoryMojo};
pub use my_ip_address::{FixedAddressSource, LocalAddressSource, SystemAddressSource};
pub use pac_file_data::PacFileData;
pub use proxy_info::{ProxyInfo, ProxyScheme, ProxyServer};
pub use resolver_mojo::{ProxyResolverMojo, ResolveRequest, ResolveResult};
