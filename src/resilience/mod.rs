//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Client operation:
//!     → context.rs  (caller deadline + cancellation token)
//!     → timeouts.rs (spawn driver call, race it against the context)
//!     → value, driver error, or cancelled/timeout
//! ```
//!
//! # Design Decisions
//! - Every driver call has a caller-supplied bound; none is retried here
//! - Cancellation is cooperative: the caller stops waiting, the call is not killed
//! - Timeouts and cancellations are distinct from driver failures

pub mod context;
pub mod timeouts;

pub use context::{Interrupt, OpContext};
pub use timeouts::run_cancellable;
