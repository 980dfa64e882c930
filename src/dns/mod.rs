//! DNS Resolution Module
//!
//! Host resolvers that answer `dnsResolve()` / `dnsResolveEx()` calls made by
//! PAC scripts:
//! - System resolver (getaddrinfo via thread pool)
//! - Async hickory-dns resolver (DoH/DoT capable)
//! - Hostname-to-IP override mechanism
//!
//! # Architecture
//!
//! This module mirrors Chromium's `HostResolver` concept. The `Resolve` trait
//! is the core abstraction; every lookup names the [`AddressFamily`] it wants
//! because the PAC built-ins differ on that point.
//!
//! # Example
//!
//! ```rust,ignore
//! use pacbridge::dns::{AddressFamily, HickoryResolver, Name, Resolve};
//!
//! let resolver = HickoryResolver::new();
//! let addrs = resolver.resolve(Name::new("example.com"), AddressFamily::Ipv4).await?;
//! for addr in addrs {
//!     println!("Resolved: {}", addr);
//! }
//! ```

mod gai;
mod hickory;
mod resolve;

pub use gai::GaiResolver;
pub use hickory::HickoryResolver;
pub use resolve::{AddressFamily, Addrs, DnsResolverWithOverrides, Name, Resolve, Resolving};
