use std::sync::Arc;

use herald_service::DynService;

use crate::dispatcher::Dispatcher;

/// Fluent builder for a [`Dispatcher`] with services pre-registered.
///
/// Equivalent to calling [`Dispatcher::use_services`] after construction;
/// useful when the dispatcher is assembled once at startup.
#[derive(Default)]
pub struct DispatcherBuilder {
    services: Vec<Arc<dyn DynService>>,
}

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service. Order of calls is registration order.
    #[must_use]
    pub fn service(mut self, service: Arc<dyn DynService>) -> Self {
        self.services.push(service);
        self
    }

    /// Register several services.
    #[must_use]
    pub fn services(mut self, services: impl IntoIterator<Item = Arc<dyn DynService>>) -> Self {
        self.services.extend(services);
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher::with_services(self.services)
    }
}

#[cfg(test)]
mod tests {
    use herald_service::LogService;

    use super::*;

    #[test]
    fn builder_preserves_order() {
        let dispatcher = DispatcherBuilder::new()
            .service(Arc::new(LogService::new("a")))
            .services([
                Arc::new(LogService::new("b")) as Arc<dyn DynService>,
                Arc::new(LogService::new("c")) as Arc<dyn DynService>,
            ])
            .build();
        assert_eq!(dispatcher.service_names(), ["a", "b", "c"]);
    }

    #[test]
    fn empty_builder_builds_empty_dispatcher() {
        assert!(Dispatcher::builder().build().is_empty());
    }
}
