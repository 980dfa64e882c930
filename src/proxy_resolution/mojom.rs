//! Message definitions for talking to an out-of-process PAC engine.
//!
//! Mirrors `services/proxy_resolver/public/mojom/proxy_resolver.mojom`. Each
//! interface is an unbounded Tokio channel: the sending half is the remote
//! end, the receiving half is the implementation. Dropping either half is a
//! disconnect, which the other side observes as a closed channel.
//!
//! The engine side looks like this:
//!
//! ```rust,ignore
//! while let Some(FactoryCall::CreateResolver { pac_script, resolver, client }) =
//!     factory_rx.recv().await
//! {
//!     let _ = client.send(ClientEvent::Alert("compiling".into()));
//!     tokio::spawn(serve_resolver(compile(pac_script), resolver));
//!     let _ = client.send(ClientEvent::ReportResult(Ok(())));
//! }
//! ```

use crate::base::neterror::NetError;
use crate::proxy_resolution::proxy_info::ProxyInfo;
use std::net::IpAddr;
use tokio::sync::{mpsc, oneshot};
use url::Url;

/// Sending half of an interface channel.
pub type Remote<T> = mpsc::UnboundedSender<T>;

/// Receiving half of an interface channel, handed to the implementation.
pub type PendingReceiver<T> = mpsc::UnboundedReceiver<T>;

/// Creates a connected `(Remote, PendingReceiver)` pair.
pub fn pipe<T>() -> (Remote<T>, PendingReceiver<T>) {
    mpsc::unbounded_channel()
}

/// Which PAC built-in triggered a [`DnsRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyResolveDnsOperation {
    /// `dnsResolve(host)`: IPv4 only.
    DnsResolve,
    /// `dnsResolveEx(host)`: every address family.
    DnsResolveEx,
    /// `myIpAddress()`
    MyIpAddress,
    /// `myIpAddressEx()`
    MyIpAddressEx,
}

impl ProxyResolveDnsOperation {
    /// True for the `*Ex` variants.
    pub fn is_ex(self) -> bool {
        matches!(
            self,
            ProxyResolveDnsOperation::DnsResolveEx | ProxyResolveDnsOperation::MyIpAddressEx
        )
    }

    /// True for the operations that enumerate local addresses instead of
    /// resolving a hostname.
    pub fn is_my_ip_address(self) -> bool {
        matches!(
            self,
            ProxyResolveDnsOperation::MyIpAddress | ProxyResolveDnsOperation::MyIpAddressEx
        )
    }
}

/// Reply to a [`DnsRequest`].
pub type HostResolverResult = Result<Vec<IpAddr>, NetError>;

/// Where the answer to a [`DnsRequest`] goes. Equivalent to
/// `HostResolverRequestClient`.
pub type HostResolverRequestClient = oneshot::Sender<HostResolverResult>;

/// A host lookup requested by a running PAC script.
#[derive(Debug)]
pub struct DnsRequest {
    pub hostname: String,
    pub operation: ProxyResolveDnsOperation,
    pub client: HostResolverRequestClient,
}

impl DnsRequest {
    /// Builds a request and the receiver its answer arrives on.
    pub fn new(
        hostname: impl Into<String>,
        operation: ProxyResolveDnsOperation,
    ) -> (Self, oneshot::Receiver<HostResolverResult>) {
        let (client, response) = oneshot::channel();
        (
            Self {
                hostname: hostname.into(),
                operation,
                client,
            },
            response,
        )
    }
}

/// Events the engine sends back while serving one request.
///
/// `R` is the payload of the final `ReportResult`: `()` when creating a
/// resolver, [`ProxyInfo`] when resolving a URL.
#[derive(Debug)]
pub enum ClientEvent<R> {
    /// `alert(message)` from the script.
    Alert(String),
    /// A script error at `line_number`.
    OnError { line_number: i32, message: String },
    /// The script needs a host lookup.
    ResolveDns(DnsRequest),
    /// Final outcome. Nothing is read from the channel after this.
    ReportResult(Result<R, NetError>),
}

/// Client of a `CreateResolver` call. `ProxyResolverFactoryRequestClient`.
pub type FactoryRequestClient = Remote<ClientEvent<()>>;

/// Client of a `GetProxyForUrl` call. `ProxyResolverRequestClient`.
pub type ResolverRequestClient = Remote<ClientEvent<ProxyInfo>>;

/// Calls on the engine's `ProxyResolverFactory` interface.
#[derive(Debug)]
pub enum FactoryCall {
    /// Compile `pac_script` and bind the resulting resolver to `resolver`.
    CreateResolver {
        pac_script: String,
        resolver: PendingReceiver<ResolverCall>,
        client: FactoryRequestClient,
    },
}

/// Calls on an engine-side `ProxyResolver` instance.
#[derive(Debug)]
pub enum ResolverCall {
    GetProxyForUrl {
        url: Url,
        client: ResolverRequestClient,
    },
}
