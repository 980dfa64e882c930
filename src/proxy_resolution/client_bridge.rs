//! Per-job handling of the callbacks a PAC engine makes while it works.
//!
//! Every creation or resolution job owns one [`ClientBridge`]. The bridge
//! logs `alert()` and script errors, forwards errors to the job's observer,
//! and answers DNS and `myIpAddress()` requests, until the engine reports a
//! final result or goes away.

use crate::base::neterror::NetError;
use crate::base::netlog::{NetLog, NetLogEventType, NetLogWithSource};
use crate::dns::Resolve;
use crate::proxy_resolution::error_observer::ProxyResolverErrorObserver;
use crate::proxy_resolution::host_resolver_bridge::HostResolverBridge;
use crate::proxy_resolution::job_sequence::JobSequence;
use crate::proxy_resolution::mojom::{ClientEvent, DnsRequest, PendingReceiver};
use crate::proxy_resolution::my_ip_address::MyIpAddressWorker;
use serde_json::json;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::watch;

/// Callbacks a PAC engine makes on behalf of a running script.
pub trait ProxyResolverClient {
    /// `alert(message)` was called.
    fn alert(&mut self, message: &str);

    /// The script raised an error. `line_number` is `-1` when unknown.
    fn on_error(&mut self, line_number: i32, message: &str);

    /// The script called `dnsResolve()`, `dnsResolveEx()`, `myIpAddress()`
    /// or `myIpAddressEx()`.
    fn resolve_dns(&mut self, request: DnsRequest);
}

/// Dependencies shared by every job created from one factory.
#[derive(Clone)]
pub(crate) struct ClientServices {
    pub(crate) host_resolver: Arc<dyn Resolve>,
    pub(crate) net_log: Option<Arc<dyn NetLog>>,
    pub(crate) my_ip_address: MyIpAddressWorker,
    pub(crate) sequence: JobSequence,
}

pub(crate) struct ClientBridge {
    host_resolver: HostResolverBridge,
    my_ip_address: MyIpAddressWorker,
    error_observer: Option<Arc<dyn ProxyResolverErrorObserver>>,
    net_log: Option<Arc<dyn NetLog>>,
    net_log_with_source: NetLogWithSource,
}

impl ClientBridge {
    pub(crate) fn new(
        services: &ClientServices,
        error_observer: Option<Arc<dyn ProxyResolverErrorObserver>>,
        net_log_with_source: NetLogWithSource,
        dns_in_progress: Arc<AtomicBool>,
    ) -> Self {
        Self {
            host_resolver: HostResolverBridge::new(
                Arc::clone(&services.host_resolver),
                dns_in_progress,
            ),
            my_ip_address: services.my_ip_address.clone(),
            error_observer,
            net_log: services.net_log.clone(),
            net_log_with_source,
        }
    }

    /// Handles client events until the engine reports its result.
    ///
    /// Fails with [`NetError::PacScriptTerminated`] if the engine drops the
    /// client channel first, or if `owner` goes away.
    pub(crate) async fn serve<R>(
        &mut self,
        events: &mut PendingReceiver<ClientEvent<R>>,
        owner: &mut watch::Receiver<()>,
    ) -> Result<R, NetError> {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(ClientEvent::Alert(message)) => self.alert(&message),
                    Some(ClientEvent::OnError { line_number, message }) => {
                        self.on_error(line_number, &message)
                    }
                    Some(ClientEvent::ResolveDns(request)) => self.resolve_dns(request),
                    Some(ClientEvent::ReportResult(result)) => return result,
                    None => {
                        tracing::debug!("PAC engine closed the client channel");
                        return Err(NetError::PacScriptTerminated);
                    }
                },
                Some(()) = self.host_resolver.next_completion(),
                    if self.host_resolver.request_in_progress() => {}
                Err(_) = owner.changed() => {
                    tracing::debug!("resolver dropped while a job was outstanding");
                    return Err(NetError::PacScriptTerminated);
                }
            }
        }
    }

    fn add_event(&self, event_type: NetLogEventType, params: serde_json::Value) {
        if let Some(net_log) = &self.net_log {
            net_log.add_global_entry(event_type, params.clone());
        }
        self.net_log_with_source.add_event(event_type, params);
    }
}

impl ProxyResolverClient for ClientBridge {
    fn alert(&mut self, message: &str) {
        tracing::debug!(message, "PAC alert");
        self.add_event(
            NetLogEventType::PacJavascriptAlert,
            json!({ "message": message }),
        );
    }

    fn on_error(&mut self, line_number: i32, message: &str) {
        tracing::debug!(line_number, message, "PAC script error");
        self.add_event(
            NetLogEventType::PacJavascriptError,
            json!({ "line_number": line_number, "message": message }),
        );
        if let Some(observer) = &self.error_observer {
            observer.on_pac_script_error(line_number, message);
        }
    }

    fn resolve_dns(&mut self, request: DnsRequest) {
        let DnsRequest {
            hostname,
            operation,
            client,
        } = request;

        if operation.is_my_ip_address() {
            self.my_ip_address.post(operation.is_ex(), client);
        } else {
            self.host_resolver.resolve(hostname, operation.is_ex(), client);
        }
    }
}
