//! Database driver subsystem.
//!
//! # Data Flow
//! ```text
//! SurrealClient
//!     → resilience::run_cancellable (spawned task per call)
//!     → Driver trait object
//!         → http.rs   (SurrealDB REST endpoints over reqwest)
//!         → memory.rs (in-process store for tests and tooling)
//!     → raw serde_json::Value back to the normalizer
//! ```
//!
//! # Design Decisions
//! - Drivers return untyped values; shape resolution belongs to `normalize`
//! - Key operations always answer with a JSON array of records
//! - `query` answers with the array of per-statement envelopes
//! - Drivers own their session state (token, namespace, database)

pub mod http;
pub mod memory;
pub mod reference;
pub mod statement;
pub mod types;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use http::HttpDriver;
pub use memory::MemoryDriver;
pub use reference::RecordRef;
pub use types::{Credentials, DriverError, DriverResult, Selection};

/// Query variables bound to `$name` placeholders.
pub type Vars = Map<String, Value>;

/// The calls the client issues against a database.
///
/// Implementations must be cheap to share behind an `Arc`; every call may run
/// on its own spawned task and may outlive the caller that issued it.
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Probe the endpoint without touching data.
    async fn health(&self) -> DriverResult<()>;

    /// Authenticate and return the session token.
    async fn signin(&self, credentials: &Credentials) -> DriverResult<String>;

    /// Switch the session to a namespace and database.
    async fn use_ns_db(&self, namespace: &str, database: &str) -> DriverResult<()>;

    async fn create(&self, reference: &RecordRef, payload: Value) -> DriverResult<Value>;

    async fn select(&self, reference: &RecordRef) -> DriverResult<Value>;

    async fn update(&self, reference: &RecordRef, payload: Value) -> DriverResult<Value>;

    async fn delete(&self, reference: &RecordRef) -> DriverResult<Value>;

    /// Run free-form statements; the answer is one envelope per statement.
    async fn query(&self, sql: &str, vars: Vars) -> DriverResult<Value>;
}
