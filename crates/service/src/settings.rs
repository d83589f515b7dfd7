use std::fmt;
use std::sync::Arc;

use herald_core::{Renderer, SendConfig, SendOption};
use parking_lot::RwLock;

/// Defaults a service applies to every [`SendConfig`] it builds.
///
/// `X` is the service's extension type; its value here is the starting
/// point that per-call [`SendOption::custom`] options then adjust.
#[derive(Clone)]
pub struct ServiceSettings<X> {
    name: String,
    dry_run: bool,
    continue_on_err: bool,
    renderer: Renderer<X>,
    extra: X,
}

impl<X: Clone + 'static> ServiceSettings<X> {
    /// Settings with both flags off and the given renderer.
    pub fn new(
        name: impl Into<String>,
        extra: X,
        renderer: impl Fn(&SendConfig<X>) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            dry_run: false,
            continue_on_err: false,
            renderer: Arc::new(renderer),
            extra,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    #[must_use]
    pub fn with_continue_on_err(mut self, continue_on_err: bool) -> Self {
        self.continue_on_err = continue_on_err;
        self
    }

    /// Replace the message renderer.
    #[must_use]
    pub fn with_renderer(
        mut self,
        renderer: impl Fn(&SendConfig<X>) -> String + Send + Sync + 'static,
    ) -> Self {
        self.renderer = Arc::new(renderer);
        self
    }

    /// Replace the default extension value.
    #[must_use]
    pub fn with_extra(mut self, extra: X) -> Self {
        self.extra = extra;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn continue_on_err(&self) -> bool {
        self.continue_on_err
    }

    pub fn extra(&self) -> &X {
        &self.extra
    }

    /// Build the config for one send call: defaults, then `options` in
    /// order, then one render pass.
    pub fn build_config(
        &self,
        subject: &str,
        message: &str,
        options: &[SendOption],
    ) -> SendConfig<X> {
        let mut config = SendConfig::new(subject, message, self.extra.clone());
        config.dry_run = self.dry_run;
        config.continue_on_err = self.continue_on_err;
        config.apply(options);
        config.render(&self.renderer);
        config
    }
}

impl<X: fmt::Debug> fmt::Debug for ServiceSettings<X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceSettings")
            .field("name", &self.name)
            .field("dry_run", &self.dry_run)
            .field("continue_on_err", &self.continue_on_err)
            .field("extra", &self.extra)
            .finish_non_exhaustive()
    }
}

/// A service's recipient list.
///
/// Recipients may be added while sends are in flight; each send works on a
/// [`snapshot`](Self::snapshot) taken when it starts.
pub struct Recipients<R> {
    inner: RwLock<Vec<R>>,
}

impl<R: Clone> Recipients<R> {
    pub fn new(recipients: impl IntoIterator<Item = R>) -> Self {
        Self {
            inner: RwLock::new(recipients.into_iter().collect()),
        }
    }

    /// Append recipients, keeping duplicates.
    pub fn add(&self, recipients: impl IntoIterator<Item = R>) {
        self.inner.write().extend(recipients);
    }

    /// Replace the whole list.
    pub fn set(&self, recipients: impl IntoIterator<Item = R>) {
        *self.inner.write() = recipients.into_iter().collect();
    }

    pub fn snapshot(&self) -> Vec<R> {
        self.inner.read().clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl<R> Default for Recipients<R> {
    fn default() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }
}

impl<R: fmt::Debug> fmt::Debug for Recipients<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.inner.read().iter()).finish()
    }
}
