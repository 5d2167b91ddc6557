//! Cancellation-aware SurrealDB client library.
//!
//! # Architecture Overview
//!
//! ```text
//!     caller ──▶ SurrealClient ──▶ run_cancellable ──▶ spawned driver call
//!                     │                   │                   │
//!                     │             OpContext fires?          ▼
//!                     │                   │            Driver (HTTP / memory)
//!                     ▼                   ▼                   │
//!                 normalize ◀──── Cancelled / Timeout ◀───────┘
//!                     │
//!                     ▼
//!           Option<T> / Vec<T> / QueryResult
//! ```

// Core subsystems
pub mod client;
pub mod driver;
pub mod normalize;
pub mod resilience;

// Cross-cutting concerns
pub mod config;
pub mod observability;

pub use client::{ClientError, ClientResult, QueryResult, RawResponse, SurrealClient};
pub use config::ClientConfig;
pub use driver::{Driver, DriverError, HttpDriver, MemoryDriver, RecordRef, Vars};
pub use normalize::{Shape, Target};
pub use resilience::{Interrupt, OpContext};
