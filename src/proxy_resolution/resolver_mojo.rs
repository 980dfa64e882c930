//! A proxy resolver backed by a PAC engine on the other end of a channel.
//!
//! Equivalent to Chromium's `ProxyResolverMojo`. Each call to
//! [`ProxyResolverMojo::get_proxy_for_url`] posts one resolve job to the job
//! sequence shared with the factory. The job owns a dedicated client channel
//! for the engine to talk back on.

use crate::base::completion::{CompletionOnceCallback, CompletionSlot, JobState, JobStatus};
use crate::base::loadstate::LoadState;
use crate::base::neterror::NetError;
use crate::base::netlog::NetLogWithSource;
use crate::proxy_resolution::client_bridge::{ClientBridge, ClientServices};
use crate::proxy_resolution::error_observer::ProxyResolverErrorObserver;
use crate::proxy_resolution::mojom::{
    self, ClientEvent, PendingReceiver, Remote, ResolverCall, ResolverRequestClient,
};
use crate::proxy_resolution::proxy_info::ProxyInfo;
use futures::future::AbortHandle;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use url::Url;

/// Result delivered to a [`ProxyResolverMojo::get_proxy_for_url`] callback.
pub type ResolveResult = Result<ProxyInfo, NetError>;

/// A live connection to one compiled PAC script.
///
/// Dropping the resolver fails every outstanding request with
/// [`NetError::PacScriptTerminated`].
pub struct ProxyResolverMojo {
    resolver: Remote<ResolverCall>,
    connection_lost: AtomicBool,
    services: ClientServices,
    error_observer: Option<Arc<dyn ProxyResolverErrorObserver>>,
    alive: watch::Sender<()>,
}

impl ProxyResolverMojo {
    pub(crate) fn new(
        resolver: Remote<ResolverCall>,
        services: ClientServices,
        error_observer: Option<Arc<dyn ProxyResolverErrorObserver>>,
    ) -> Self {
        let (alive, _) = watch::channel(());
        Self {
            resolver,
            connection_lost: AtomicBool::new(false),
            services,
            error_observer,
            alive,
        }
    }

    /// Asks the engine which proxies to use for `url`.
    ///
    /// Returns `Err` if the request fails right away; the callback is then
    /// never run. Otherwise `callback` runs exactly once, unless the returned
    /// [`ResolveRequest`] is dropped first. Callbacks of one resolver run one
    /// at a time, in the order the engine reported the results.
    pub fn get_proxy_for_url<F>(
        &self,
        url: &Url,
        callback: F,
        net_log: &NetLogWithSource,
    ) -> Result<ResolveRequest, NetError>
    where
        F: FnOnce(ResolveResult) + Send + 'static,
    {
        tracing::debug!(url = %url, "GetProxyForUrl");

        if self.is_disconnected() {
            self.on_connection_lost();
            return Err(NetError::PacScriptTerminated);
        }

        let dns_in_progress = Arc::new(AtomicBool::new(false));
        let slot = CompletionSlot::new(Box::new(callback) as CompletionOnceCallback<ResolveResult>);
        let status = slot.status();
        let (client, client_rx) = mojom::pipe();
        let job = ResolveJob {
            url: url.clone(),
            resolver: self.resolver.clone(),
            client: Some(client),
            bridge: ClientBridge::new(
                &self.services,
                self.error_observer.clone(),
                net_log.clone(),
                Arc::clone(&dns_in_progress),
            ),
            client_rx,
            owner: self.alive.subscribe(),
            slot,
        };

        let abort = self.services.sequence.post(job.run())?;
        Ok(ResolveRequest {
            status,
            dns_in_progress,
            abort,
        })
    }

    /// Resolves `url` and waits for the answer.
    pub async fn resolve(&self, url: &Url) -> ResolveResult {
        let (tx, rx) = oneshot::channel();
        let _request = self.get_proxy_for_url(
            url,
            move |result| {
                let _ = tx.send(result);
            },
            &NetLogWithSource::default(),
        )?;
        rx.await.unwrap_or(Err(NetError::PacScriptTerminated))
    }

    /// True once the engine side of this resolver has gone away.
    pub fn is_disconnected(&self) -> bool {
        self.connection_lost.load(Ordering::Acquire) || self.resolver.is_closed()
    }

    fn on_connection_lost(&self) {
        if !self.connection_lost.swap(true, Ordering::AcqRel) {
            tracing::debug!("ProxyResolverMojo disconnected");
        }
    }
}

impl fmt::Debug for ProxyResolverMojo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyResolverMojo")
            .field("disconnected", &self.is_disconnected())
            .field("outstanding_jobs", &self.alive.receiver_count())
            .finish()
    }
}

struct ResolveJob {
    url: Url,
    resolver: Remote<ResolverCall>,
    client: Option<ResolverRequestClient>,
    bridge: ClientBridge,
    client_rx: PendingReceiver<ClientEvent<ProxyInfo>>,
    owner: watch::Receiver<()>,
    slot: CompletionSlot<ResolveResult>,
}

impl ResolveJob {
    async fn run(mut self) {
        self.start();
        let result = self.bridge.serve(&mut self.client_rx, &mut self.owner).await;
        self.complete_request(result);
    }

    /// Issues the one `GetProxyForUrl` call this job makes.
    fn start(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        let call = ResolverCall::GetProxyForUrl {
            url: self.url.clone(),
            client,
        };
        // A failed send drops the client, which closes `client_rx`.
        if self.resolver.send(call).is_err() {
            tracing::debug!(url = %self.url, "resolver gone before GetProxyForUrl");
        }
        self.slot.awaiting_remote();
    }

    fn complete_request(mut self, result: ResolveResult) {
        // Nothing is read from the engine after the result.
        self.client_rx.close();
        drop(self.client_rx);

        match &result {
            Ok(info) => tracing::debug!(url = %self.url, proxies = %info, "resolved proxy"),
            Err(e) => tracing::debug!(url = %self.url, code = e.as_i32(), "proxy resolution failed"),
        }

        drop(self.bridge);
        self.slot.run(result);
    }
}

/// Handle to an outstanding [`ProxyResolverMojo::get_proxy_for_url`] call.
///
/// Dropping it cancels the request; the callback will not run.
pub struct ResolveRequest {
    status: JobStatus,
    dns_in_progress: Arc<AtomicBool>,
    abort: AbortHandle,
}

impl ResolveRequest {
    pub fn load_state(&self) -> LoadState {
        if self.dns_in_progress.load(Ordering::Acquire) {
            LoadState::ResolvingHostInPacFile
        } else {
            LoadState::ResolvingProxyForUrl
        }
    }

    /// False once the callback has run.
    pub fn is_pending(&self) -> bool {
        self.status.get() != JobState::Completed
    }
}

impl Drop for ResolveRequest {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

impl fmt::Debug for ResolveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveRequest")
            .field("state", &self.status.get())
            .field("load_state", &self.load_state())
            .finish()
    }
}
