//! Multi-service example: one notification fanned out to several services,
//! one of which is misconfigured.
//!
//! Run with: `RUST_LOG=debug cargo run -p herald-dispatcher --example multi_service`

use std::sync::Arc;
use std::time::Duration;

use herald_core::{Attachment, SendContext, with_attachments, with_continue_on_err};
use herald_dispatcher::Dispatcher;
use herald_service::{DynService, LogService};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let ops = LogService::new("ops-log").with_targets(["#ops", "#oncall"]);
    let audit = LogService::new("audit-log").with_targets(["audit"]);
    // No targets: this service fails with "no recipients configured".
    let broken = LogService::new("unconfigured");

    let dispatcher = Dispatcher::builder()
        .service(Arc::new(ops))
        .services([Arc::new(audit) as Arc<dyn DynService>, Arc::new(broken)])
        .build();

    let report = Attachment::from_bytes(
        &b"disk usage: 97%\n"[..],
        "report.txt",
        "text/plain",
        false,
    );

    let ctx = SendContext::new().with_timeout(Duration::from_secs(10));
    let result = dispatcher
        .send(
            &ctx,
            "Disk almost full",
            "db-01 is at 97% capacity",
            &[with_attachments([report]), with_continue_on_err(true)],
        )
        .await;

    match result {
        Ok(()) => println!("all services delivered"),
        Err(err) => {
            println!("{err}");
            for failure in err.failures() {
                println!("  service {} failed: {}", failure.service, failure.source);
            }
        }
    }
}
