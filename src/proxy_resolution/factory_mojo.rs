//! Creates [`ProxyResolverMojo`] instances by handing PAC scripts to a remote
//! engine's factory endpoint. Equivalent to Chromium's
//! `ProxyResolverFactoryMojo`.

use crate::base::completion::{CompletionOnceCallback, CompletionSlot, JobState, JobStatus};
use crate::base::neterror::NetError;
use crate::base::netlog::{NetLog, NetLogWithSource};
use crate::dns::Resolve;
use crate::proxy_resolution::client_bridge::{ClientBridge, ClientServices};
use crate::proxy_resolution::error_observer::{ErrorObserverFactory, ProxyResolverErrorObserver};
use crate::proxy_resolution::job_sequence::JobSequence;
use crate::proxy_resolution::mojom::{
    self, ClientEvent, FactoryCall, FactoryRequestClient, PendingReceiver, Remote, ResolverCall,
};
use crate::proxy_resolution::my_ip_address::{LocalAddressSource, MyIpAddressWorker};
use crate::proxy_resolution::pac_file_data::PacFileData;
use crate::proxy_resolution::resolver_mojo::ProxyResolverMojo;
use futures::future::AbortHandle;
use std::fmt;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::{oneshot, watch};

/// Result delivered to a [`ProxyResolverFactoryMojo::create_proxy_resolver`]
/// callback.
pub type CreateResult = Result<ProxyResolverMojo, NetError>;

/// Entry point: owns the channel to the engine's factory.
///
/// The factory spawns one job sequence on the current Tokio runtime, so it
/// must be created inside one. Creation jobs, the resolvers they produce and
/// those resolvers' jobs all run on that sequence.
///
/// # Example
///
/// ```rust,ignore
/// let (factory_remote, factory_receiver) = pacbridge::proxy_resolution::mojom::pipe();
/// tokio::spawn(run_pac_engine(factory_receiver));
///
/// let factory = ProxyResolverFactoryMojo::new(factory_remote, Arc::new(HickoryResolver::new()));
/// let resolver = factory.create(&PacFileData::from_utf8(script)).await?;
/// let info = resolver.resolve(&"http://example.com/".parse()?).await?;
/// ```
pub struct ProxyResolverFactoryMojo {
    factory: Remote<FactoryCall>,
    services: ClientServices,
    error_observer_factory: Option<ErrorObserverFactory>,
    alive: watch::Sender<()>,
}

impl ProxyResolverFactoryMojo {
    pub fn new(factory: Remote<FactoryCall>, host_resolver: Arc<dyn Resolve>) -> Self {
        let (alive, _) = watch::channel(());
        Self {
            factory,
            services: ClientServices {
                host_resolver,
                net_log: None,
                my_ip_address: MyIpAddressWorker::default(),
                sequence: JobSequence::spawn(),
            },
            error_observer_factory: None,
            alive,
        }
    }

    /// Every created resolver gets its own observer from `factory`.
    pub fn with_error_observer_factory(mut self, factory: ErrorObserverFactory) -> Self {
        self.error_observer_factory = Some(factory);
        self
    }

    /// Alerts and script errors are also written to `net_log` as global
    /// entries.
    pub fn with_net_log(mut self, net_log: Arc<dyn NetLog>) -> Self {
        self.services.net_log = Some(net_log);
        self
    }

    /// Overrides where `myIpAddress()` and `myIpAddressEx()` get addresses.
    pub fn with_local_address_source(mut self, source: Arc<dyn LocalAddressSource>) -> Self {
        self.services.my_ip_address = MyIpAddressWorker::new(source);
        self
    }

    /// PAC scripts must be handed over as text, never as a URL.
    pub fn expects_pac_bytes(&self) -> bool {
        true
    }

    /// Compiles `pac_script` into a new resolver.
    ///
    /// Fails right away with [`NetError::PacScriptFailed`] unless the payload
    /// is non-empty script text; the callback is dropped without running.
    /// Otherwise `callback` runs exactly once, unless the returned
    /// [`CreateRequest`] is dropped first.
    pub fn create_proxy_resolver<F>(
        &self,
        pac_script: &PacFileData,
        callback: F,
    ) -> Result<CreateRequest, NetError>
    where
        F: FnOnce(CreateResult) + Send + 'static,
    {
        let Some(script) = pac_script.usable_script() else {
            tracing::debug!("rejecting PAC payload without script contents");
            return Err(NetError::PacScriptFailed);
        };

        let slot = CompletionSlot::new(Box::new(callback) as CompletionOnceCallback<CreateResult>);
        let status = slot.status();
        let job = CreationJob::new(self, script.to_owned(), slot);
        let abort = self.services.sequence.post(job.run())?;
        Ok(CreateRequest { status, abort })
    }

    /// Compiles `pac_script` and waits for the new resolver.
    pub async fn create(&self, pac_script: &PacFileData) -> CreateResult {
        let (tx, rx) = oneshot::channel();
        let _request = self.create_proxy_resolver(pac_script, move |result| {
            let _ = tx.send(result);
        })?;
        rx.await.unwrap_or(Err(NetError::PacScriptTerminated))
    }
}

impl fmt::Debug for ProxyResolverFactoryMojo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyResolverFactoryMojo")
            .field("connected", &!self.factory.is_closed())
            .field("error_observer_factory", &self.error_observer_factory.is_some())
            .field("net_log", &self.services.net_log.is_some())
            .field("outstanding_jobs", &self.alive.receiver_count())
            .finish()
    }
}

struct CreationJob {
    factory: Remote<FactoryCall>,
    call: Option<(String, PendingReceiver<ResolverCall>, FactoryRequestClient)>,
    bridge: ClientBridge,
    client_rx: PendingReceiver<ClientEvent<()>>,
    resolver: Remote<ResolverCall>,
    services: ClientServices,
    error_observer: Option<Arc<dyn ProxyResolverErrorObserver>>,
    owner: watch::Receiver<()>,
    slot: CompletionSlot<CreateResult>,
}

impl CreationJob {
    fn new(
        factory: &ProxyResolverFactoryMojo,
        pac_script: String,
        slot: CompletionSlot<CreateResult>,
    ) -> Self {
        let error_observer = factory.error_observer_factory.as_ref().map(|make| make());
        let (client, client_rx) = mojom::pipe();
        let (resolver, resolver_rx) = mojom::pipe();

        Self {
            factory: factory.factory.clone(),
            call: Some((pac_script, resolver_rx, client)),
            bridge: ClientBridge::new(
                &factory.services,
                error_observer.clone(),
                NetLogWithSource::default(),
                Arc::new(AtomicBool::new(false)),
            ),
            client_rx,
            resolver,
            services: factory.services.clone(),
            error_observer,
            owner: factory.alive.subscribe(),
            slot,
        }
    }

    async fn run(mut self) {
        self.start();
        let result = self.bridge.serve(&mut self.client_rx, &mut self.owner).await;

        // Nothing is read from the engine after the result.
        self.client_rx.close();
        drop(self.client_rx);
        drop(self.bridge);

        let result = match result {
            Ok(()) => {
                tracing::debug!("PAC script compiled");
                Ok(ProxyResolverMojo::new(
                    self.resolver,
                    self.services,
                    self.error_observer,
                ))
            }
            Err(e) => {
                tracing::debug!(code = e.as_i32(), "CreateResolver failed");
                Err(e)
            }
        };
        self.slot.run(result);
    }

    /// Issues the one `CreateResolver` call this job makes.
    fn start(&mut self) {
        let Some((pac_script, resolver, client)) = self.call.take() else {
            return;
        };

        tracing::debug!(script_len = pac_script.len(), "CreateResolver");
        let call = FactoryCall::CreateResolver {
            pac_script,
            resolver,
            client,
        };
        if self.factory.send(call).is_err() {
            // The dropped client closes `client_rx`, so the job terminates.
            tracing::warn!("PAC engine factory is gone; CreateResolver not delivered");
        }
        self.slot.awaiting_remote();
    }
}

/// Handle to an outstanding [`ProxyResolverFactoryMojo::create_proxy_resolver`]
/// call. Dropping it cancels the request; the callback will not run.
pub struct CreateRequest {
    status: JobStatus,
    abort: AbortHandle,
}

impl CreateRequest {
    /// False once the callback has run.
    pub fn is_pending(&self) -> bool {
        self.status.get() != JobState::Completed
    }
}

impl Drop for CreateRequest {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

impl fmt::Debug for CreateRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateRequest")
            .field("state", &self.status.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::GaiResolver;
    use crate::proxy_resolution::proxy_info::ProxyInfo;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;
    use url::Url;

    const SCRIPT: &str = "function FindProxyForURL(url, host) { return 'DIRECT'; }";

    fn factory() -> (ProxyResolverFactoryMojo, PendingReceiver<FactoryCall>) {
        let (remote, receiver) = mojom::pipe();
        (
            ProxyResolverFactoryMojo::new(remote, Arc::new(GaiResolver::new())),
            receiver,
        )
    }

    fn callback() -> (
        impl FnOnce(CreateResult) + Send + 'static,
        mpsc::UnboundedReceiver<CreateResult>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            move |result| {
                let _ = tx.send(result);
            },
            rx,
        )
    }

    async fn next_call(
        receiver: &mut PendingReceiver<FactoryCall>,
    ) -> (String, PendingReceiver<ResolverCall>, mojom::FactoryRequestClient) {
        match receiver.recv().await {
            Some(FactoryCall::CreateResolver {
                pac_script,
                resolver,
                client,
            }) => (pac_script, resolver, client),
            None => panic!("factory channel closed"),
        }
    }

    #[tokio::test]
    async fn test_invalid_payloads_fail_synchronously() {
        let (factory, mut engine) = factory();
        let calls = Arc::new(AtomicUsize::new(0));

        let payloads = [
            PacFileData::from_utf8(""),
            PacFileData::from_url(Url::parse("http://wpad/wpad.dat").unwrap()),
        ];
        for payload in &payloads {
            let counter = Arc::clone(&calls);
            let result = factory.create_proxy_resolver(payload, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
            assert_eq!(result.unwrap_err(), NetError::PacScriptFailed);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(engine.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_success_yields_working_resolver() {
        let (factory, mut engine) = factory();
        let (cb, mut results) = callback();

        let request = factory
            .create_proxy_resolver(&PacFileData::from_utf8(SCRIPT), cb)
            .unwrap();
        assert!(request.is_pending());

        let (script, mut resolver_rx, client) = next_call(&mut engine).await;
        assert_eq!(script, SCRIPT);
        client.send(ClientEvent::ReportResult(Ok(()))).unwrap();

        let resolver = results.recv().await.unwrap().unwrap();
        assert!(!request.is_pending());
        assert!(client.is_closed());

        tokio::spawn(async move {
            if let Some(ResolverCall::GetProxyForUrl { client, .. }) = resolver_rx.recv().await {
                let _ = client.send(ClientEvent::ReportResult(Ok(ProxyInfo::direct())));
            }
        });
        let info = resolver
            .resolve(&Url::parse("http://example.test/").unwrap())
            .await
            .unwrap();
        assert!(info.is_direct());
    }

    #[tokio::test]
    async fn test_remote_failure_is_forwarded_and_resolver_dropped() {
        let (factory, mut engine) = factory();
        let (cb, mut results) = callback();

        let _request = factory
            .create_proxy_resolver(&PacFileData::from_utf8(SCRIPT), cb)
            .unwrap();
        let (_, mut resolver_rx, client) = next_call(&mut engine).await;
        client
            .send(ClientEvent::ReportResult(Err(NetError::PacScriptFailed)))
            .unwrap();

        let result = results.recv().await.unwrap();
        assert_eq!(result.unwrap_err(), NetError::PacScriptFailed);
        assert!(resolver_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_terminates() {
        let (factory, mut engine) = factory();
        let (cb, mut results) = callback();

        let _request = factory
            .create_proxy_resolver(&PacFileData::from_utf8(SCRIPT), cb)
            .unwrap();
        let (_, _resolver_rx, client) = next_call(&mut engine).await;
        drop(client);

        let result = results.recv().await.unwrap();
        assert_eq!(result.unwrap_err(), NetError::PacScriptTerminated);
        assert!(results.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_missing_engine_terminates() {
        let (factory, engine) = factory();
        drop(engine);

        let result = factory.create(&PacFileData::from_utf8(SCRIPT)).await;
        assert_eq!(result.unwrap_err(), NetError::PacScriptTerminated);
    }

    #[tokio::test]
    async fn test_dropping_request_suppresses_callback() {
        let (factory, mut engine) = factory();
        let (cb, mut results) = callback();

        let request = factory
            .create_proxy_resolver(&PacFileData::from_utf8(SCRIPT), cb)
            .unwrap();
        let (_, _resolver_rx, client) = next_call(&mut engine).await;
        drop(request);

        let _ = client.send(ClientEvent::ReportResult(Ok(())));
        assert!(results.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropping_factory_terminates_creation() {
        let (factory, mut engine) = factory();
        let (cb, mut results) = callback();

        let _request = factory
            .create_proxy_resolver(&PacFileData::from_utf8(SCRIPT), cb)
            .unwrap();
        let (_, _resolver_rx, _client) = next_call(&mut engine).await;
        drop(factory);

        let result = results.recv().await.unwrap();
        assert_eq!(result.unwrap_err(), NetError::PacScriptTerminated);
    }

    #[tokio::test]
    async fn test_expects_pac_bytes() {
        let (remote, _receiver) = mojom::pipe();
        let factory = ProxyResolverFactoryMojo::new(remote, Arc::new(GaiResolver::new()));
        assert!(factory.expects_pac_bytes());
    }
}
