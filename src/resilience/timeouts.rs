//! Cancellable operation envelope.
//!
//! # Responsibilities
//! - Run one driver call on its own task
//! - Race its outcome against the caller's context
//! - Report exactly one terminal outcome to the caller
//!
//! # Design Decisions
//! - Uses Tokio's spawn, oneshot and select facilities
//! - An already-finished context fails before the driver is touched
//! - Driver errors travel back through the handoff like values, so a context
//!   without a deadline never hangs on a failed call
//! - The spawned task is never aborted; a late outcome is dropped

use std::future::Future;
use std::time::Instant;
use tokio::sync::oneshot;
use tracing::Instrument;

use crate::client::types::{ClientError, ClientResult};
use crate::driver::{DriverError, DriverResult};
use crate::observability::metrics;
use crate::resilience::OpContext;

/// Run `call` on a spawned task and wait for it or for `ctx`, whichever
/// comes first.
pub async fn run_cancellable<T, F>(ctx: &OpContext, operation: &'static str, call: F) -> ClientResult<T>
where
    T: Send + 'static,
    F: Future<Output = DriverResult<T>> + Send + 'static,
{
    let ctx = ctx.child();
    let start = Instant::now();

    if let Some(interrupt) = ctx.interrupted() {
        let err = ClientError::interrupted(operation, interrupt, start.elapsed());
        tracing::debug!(operation, error = %err, "Context already done, driver not called");
        metrics::record_operation(operation, err.outcome(), start);
        return Err(err);
    }

    let (tx, rx) = oneshot::channel::<DriverResult<T>>();
    tokio::spawn(
        async move {
            let outcome = call.await;
            if tx.send(outcome).is_err() {
                tracing::debug!(operation, "Caller stopped waiting, discarding outcome");
            }
        }
        .in_current_span(),
    );

    let result = tokio::select! {
        biased;
        interrupt = ctx.done() => Err(ClientError::interrupted(operation, interrupt, start.elapsed())),
        outcome = rx => match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(ClientError::Driver(e)),
            Err(_) => Err(ClientError::Driver(DriverError::Aborted)),
        },
    };

    match &result {
        Ok(_) => {
            tracing::debug!(operation, elapsed_ms = start.elapsed().as_millis() as u64, "Operation completed");
            metrics::record_operation(operation, "ok", start);
        }
        Err(e) => {
            tracing::warn!(operation, error = %e, elapsed_ms = start.elapsed().as_millis() as u64, "Operation failed");
            metrics::record_operation(operation, e.outcome(), start);
        }
    }
    result
}
