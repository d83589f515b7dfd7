use std::sync::Arc;

use herald_core::{SendContext, SendOption};
use herald_service::{DynService, NotifyError};
use parking_lot::RwLock;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::builder::DispatcherBuilder;
use crate::error::{DispatchError, ServiceFailure};

/// Sends one notification through every registered service at once.
///
/// Each service runs as its own tokio task against a snapshot of the
/// registry taken when [`send`](Self::send) starts, so services progress in
/// parallel on a multi-threaded runtime. Every service runs to
/// completion even when others fail; the returned [`DispatchError`] lists
/// each failure in registration order.
///
/// The registry can be extended while sends are in flight. In-flight sends
/// are unaffected.
#[derive(Default)]
pub struct Dispatcher {
    services: RwLock<Vec<Arc<dyn DynService>>>,
}

impl Dispatcher {
    /// An empty dispatcher. Sending through it succeeds trivially.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// A dispatcher with `services` registered in iteration order.
    pub fn with_services(services: impl IntoIterator<Item = Arc<dyn DynService>>) -> Self {
        let dispatcher = Self::new();
        dispatcher.use_services(services);
        dispatcher
    }

    /// Register one service after the existing ones.
    pub fn use_service(&self, service: Arc<dyn DynService>) {
        self.use_services([service]);
    }

    /// Register services after the existing ones, keeping their order.
    /// Duplicate names are allowed.
    pub fn use_services(&self, services: impl IntoIterator<Item = Arc<dyn DynService>>) {
        let mut registry = self.services.write();
        for service in services {
            debug!(service = service.name(), "registering service");
            registry.push(service);
        }
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    /// Registered service names, in registration order.
    pub fn service_names(&self) -> Vec<String> {
        self.services
            .read()
            .iter()
            .map(|s| s.name().to_owned())
            .collect()
    }

    /// Send through every registered service and wait for all of them.
    ///
    /// `options` are handed to each service untouched. Must be called from
    /// within a tokio runtime. A panicking service panics the caller.
    ///
    /// # Errors
    ///
    /// Returns a [`DispatchError`] naming every service whose send failed,
    /// with the service's own error as the cause.
    #[instrument(skip(self, ctx, message, options), fields(services = tracing::field::Empty))]
    pub async fn send(
        &self,
        ctx: &SendContext,
        subject: &str,
        message: &str,
        options: &[SendOption],
    ) -> Result<(), DispatchError> {
        let services: Vec<Arc<dyn DynService>> = self.services.read().clone();
        tracing::Span::current().record("services", services.len());

        let mut tasks = JoinSet::new();
        for (index, service) in services.iter().cloned().enumerate() {
            let ctx = ctx.clone();
            let subject = subject.to_owned();
            let message = message.to_owned();
            let options = options.to_vec();
            tasks.spawn(async move {
                let result = service.send(&ctx, &subject, &message, &options).await;
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<(), NotifyError>>> =
            std::iter::repeat_with(|| None).take(services.len()).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                Err(err) => warn!(error = %err, "service task cancelled"),
            }
        }

        let failures: Vec<ServiceFailure> = services
            .iter()
            .zip(results)
            .filter_map(|(service, result)| {
                result?.err().map(|source| {
                    warn!(service = service.name(), error = %source, "service send failed");
                    ServiceFailure {
                        service: service.name().to_owned(),
                        source,
                    }
                })
            })
            .collect();

        match DispatchError::from_failures(failures) {
            Some(err) => Err(err),
            None => {
                debug!("all services sent");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("services", &self.service_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use herald_core::with_dry_run;
    use herald_service::{LogService, Service};

    use super::*;

    struct CountingService {
        name: String,
        calls: AtomicUsize,
        fail: bool,
        delay: Option<Duration>,
    }

    impl CountingService {
        fn new(name: &str, fail: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_owned(),
                calls: AtomicUsize::new(0),
                fail,
                delay: None,
            })
        }

        fn delayed(name: &str, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_owned(),
                calls: AtomicUsize::new(0),
                fail: false,
                delay: Some(delay),
            })
        }
    }

    impl Service for CountingService {
        fn name(&self) -> &str {
            &self.name
        }

        async fn send(
            &self,
            _ctx: &SendContext,
            _subject: &str,
            _message: &str,
            _options: &[SendOption],
        ) -> Result<(), NotifyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                Err(NotifyError::NoRecipients)
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn empty_dispatcher_succeeds() {
        let dispatcher = Dispatcher::new();
        assert!(dispatcher.is_empty());
        dispatcher
            .send(&SendContext::new(), "s", "m", &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn every_service_is_called_once() {
        let a = CountingService::new("a", false);
        let b = CountingService::new("b", false);
        let dispatcher = Dispatcher::with_services([
            a.clone() as Arc<dyn DynService>,
            b.clone() as Arc<dyn DynService>,
        ]);

        dispatcher
            .send(&SendContext::new(), "s", "m", &[with_dry_run(true)])
            .await
            .unwrap();
        assert_eq!(a.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_collected_in_registration_order() {
        let ok = CountingService::new("ok", false);
        let dispatcher = Dispatcher::new();
        dispatcher.use_services([
            CountingService::new("first", true) as Arc<dyn DynService>,
            ok.clone() as Arc<dyn DynService>,
            CountingService::new("second", true) as Arc<dyn DynService>,
        ]);

        let err = dispatcher
            .send(&SendContext::new(), "s", "m", &[])
            .await
            .unwrap_err();
        assert_eq!(err.services().collect::<Vec<_>>(), ["first", "second"]);
        assert_eq!(ok.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn services_run_concurrently() {
        let dispatcher = Dispatcher::with_services([
            CountingService::delayed("slow-a", Duration::from_secs(1)) as Arc<dyn DynService>,
            CountingService::delayed("slow-b", Duration::from_secs(1)) as Arc<dyn DynService>,
        ]);

        let start = tokio::time::Instant::now();
        dispatcher
            .send(&SendContext::new(), "s", "m", &[])
            .await
            .unwrap();
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    /// Blocks its thread until every peer has entered `send`.
    struct RendezvousService {
        name: &'static str,
        arrived: Arc<AtomicUsize>,
        peers: usize,
    }

    impl Service for RendezvousService {
        fn name(&self) -> &str {
            self.name
        }

        async fn send(
            &self,
            _ctx: &SendContext,
            _subject: &str,
            _message: &str,
            _options: &[SendOption],
        ) -> Result<(), NotifyError> {
            self.arrived.fetch_add(1, Ordering::SeqCst);
            let deadline = std::time::Instant::now() + Duration::from_secs(5);
            while self.arrived.load(Ordering::SeqCst) < self.peers {
                if std::time::Instant::now() > deadline {
                    return Err(NotifyError::Configuration("peers never arrived".into()));
                }
                std::thread::sleep(Duration::from_millis(1));
            }
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn services_run_in_parallel_on_worker_threads() {
        let arrived = Arc::new(AtomicUsize::new(0));
        let dispatcher = Dispatcher::with_services(["a", "b"].map(|name| {
            Arc::new(RendezvousService {
                name,
                arrived: Arc::clone(&arrived),
                peers: 2,
            }) as Arc<dyn DynService>
        }));

        dispatcher
            .send(&SendContext::new(), "s", "m", &[])
            .await
            .unwrap();
        assert_eq!(arrived.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn duplicate_names_are_kept() {
        let dispatcher = Dispatcher::new();
        dispatcher.use_service(Arc::new(LogService::new("log").with_targets(["a"])));
        dispatcher.use_service(Arc::new(LogService::new("log").with_targets(["b"])));
        assert_eq!(dispatcher.service_names(), ["log", "log"]);
        dispatcher
            .send(&SendContext::new(), "s", "m", &[])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn registration_during_send_does_not_affect_it() {
        let dispatcher = Arc::new(Dispatcher::with_services([
            CountingService::delayed("slow", Duration::from_millis(50)) as Arc<dyn DynService>,
        ]));
        let late = CountingService::new("late", false);

        let sender = {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move { dispatcher.send(&SendContext::new(), "s", "m", &[]).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        dispatcher.use_service(late.clone());

        sender.await.unwrap().unwrap();
        assert_eq!(late.calls.load(Ordering::SeqCst), 0);
        assert_eq!(dispatcher.len(), 2);
    }
}
