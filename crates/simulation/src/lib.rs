//! Test doubles for Herald.
//!
//! - [`RecordingService`]: runs the standard recipient fan-out and records
//!   each delivery, with scriptable per-recipient failures
//! - [`FailingService`]: fails every send in a fixed way
//! - [`MockHttpServer`]: loopback HTTP server with canned responses, for
//!   testing HTTP-backed services end to end

pub mod failing;
pub mod mock_http;
pub mod recording;

pub use failing::{FailingService, FailureType};
pub use mock_http::{MockHttpServer, MockResponse, RecordedRequest};
pub use recording::{CapturedDelivery, RecordingService};

/// Everything a test usually needs in one import.
pub mod prelude {
    pub use herald_core::{
        Attachment, SendContext, SendOption, with_attachments, with_continue_on_err,
        with_dry_run, with_metadata,
    };
    pub use herald_dispatcher::{DispatchError, Dispatcher};
    pub use herald_service::{
        DeliveryError, DynService, NotifyError, SendError, Service,
    };

    pub use crate::{
        FailingService, FailureType, MockHttpServer, MockResponse, RecordedRequest,
        RecordingService,
    };
}
