use std::fmt;

use herald_service::NotifyError;
use thiserror::Error;

/// A single service's failure, attributed by name.
#[derive(Debug, Error)]
#[error("{service}: {source}")]
pub struct ServiceFailure {
    /// The failing service's [`name`](herald_service::DynService::name).
    pub service: String,
    #[source]
    pub source: NotifyError,
}

/// Every service that failed during one [`Dispatcher::send`](crate::Dispatcher::send)
/// call, in registration order. Never empty.
///
/// Services are identified by name only, so registering two services under
/// the same name makes their failures indistinguishable here.
#[derive(Debug)]
pub struct DispatchError {
    failures: Vec<ServiceFailure>,
}

impl DispatchError {
    pub(crate) fn from_failures(failures: Vec<ServiceFailure>) -> Option<Self> {
        if failures.is_empty() {
            None
        } else {
            Some(Self { failures })
        }
    }

    pub fn failures(&self) -> &[ServiceFailure] {
        &self.failures
    }

    /// Names of the failed services.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.service.as_str())
    }

    /// The first failure recorded for `service`.
    pub fn failure_for(&self, service: &str) -> Option<&NotifyError> {
        self.failures
            .iter()
            .find(|f| f.service == service)
            .map(|f| &f.source)
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Always `false`; present for API symmetry with [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_failures(self) -> Vec<ServiceFailure> {
        self.failures
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} service(s) failed", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{sep}{failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|f| f as &(dyn std::error::Error + 'static))
    }
}
