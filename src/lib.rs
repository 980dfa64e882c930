//! # pacbridge
//!
//! Proxy auto-config (PAC) resolution against an isolated PAC engine.
//!
//! `pacbridge` is the browser-side half of Chromium's out-of-process proxy
//! resolver: it sends PAC scripts and URLs to an engine over channels, answers
//! the DNS and `myIpAddress()` lookups the script makes while it runs, and
//! turns the engine's replies into completion callbacks that run exactly once.
//!
//! ## Features
//!
//! - **Job lifecycle**: Creation and resolve jobs with cancel-on-drop handles
//! - **Disconnect handling**: A lost engine fails requests with `PacScriptTerminated`
//! - **Ordering**: One task runs every job of a factory; callbacks fire in the order the engine reports
//! - **Host resolution**: `dnsResolve()` (IPv4) and `dnsResolveEx()` via pluggable resolvers
//! - **NetLog**: PAC alerts and errors as structured events
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pacbridge::dns::HickoryResolver;
//! use pacbridge::proxy_resolution::{mojom, PacFileData, ProxyResolverFactoryMojo};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (factory_remote, factory_receiver) = mojom::pipe();
//!     tokio::spawn(my_pac_engine::serve(factory_receiver));
//!
//!     let factory = ProxyResolverFactoryMojo::new(factory_remote, Arc::new(HickoryResolver::new()));
//!     let resolver = factory
//!         .create(&PacFileData::from_utf8(include_str!("proxy.pac")))
//!         .await
//!         .unwrap();
//!     let info = resolver.resolve(&"https://example.com/".parse().unwrap()).await.unwrap();
//!     println!("Proxies: {}", info);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error codes, load states, NetLog and completion callbacks
//! - [`dns`] - Host resolvers used for PAC `dnsResolve()`
//! - [`proxy_resolution`] - Factory, resolver, jobs and the engine channel messages

pub mod base;
pub mod dns;
pub mod proxy_resolution;
