//! Database client.
//!
//! # Data Flow
//! ```text
//! caller (OpContext + reference/payload/query)
//!     → SurrealClient::dispatch  (span, selection gate)
//!     → resilience::run_cancellable (spawned driver call vs context)
//!     → normalize (Option<T> / Vec<T> / QueryResult)
//!     → caller
//! ```
//!
//! # Design Decisions
//! - Construction signs in and applies the configured selection up front;
//!   failures surface synchronously and are never retried
//! - Reading a single record that does not exist yields `Ok(None)`
//! - Deleting a missing record succeeds, so delete is idempotent
//! - Selection switches are serialized against in-flight calls

pub mod context;
pub mod types;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

use crate::config::validation::validate_config;
use crate::config::ClientConfig;
use crate::driver::statement::is_identifier;
use crate::driver::{Credentials, Driver, DriverResult, HttpDriver, RecordRef, Selection, Vars};
use crate::normalize::{decode_many, to_entry, Target};
use crate::observability::metrics;
use crate::resilience::{run_cancellable, OpContext};

pub use context::ConnectionContext;
pub use types::{ClientError, ClientResult, QueryResult, RawResponse};

/// Cancellation-aware client over a [`Driver`].
///
/// ```rust,no_run
/// use std::time::Duration;
/// use surreal_link::{ClientConfig, OpContext, SurrealClient};
///
/// # async fn example() -> surreal_link::ClientResult<()> {
/// let mut config = ClientConfig::default();
/// config.address = "ws://localhost:8000/rpc".into();
/// config.user = "root".into();
/// config.password = "root".into();
/// config.namespace = "test".into();
/// config.database = "test".into();
///
/// let client = SurrealClient::connect(config).await?;
/// let ctx = OpContext::with_timeout(Duration::from_secs(2));
/// let person: Option<serde_json::Value> = client.read_one(&ctx, "person:tobie").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SurrealClient {
    context: Arc<ConnectionContext>,
    config: Arc<ClientConfig>,
}

impl SurrealClient {
    /// Connect over HTTP to `config.address`, sign in and select the
    /// configured namespace and database.
    pub async fn connect(config: ClientConfig) -> ClientResult<Self> {
        validate_config(&config).map_err(config_error)?;
        let driver = HttpDriver::connect(&config.address, &config.timeouts)
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;
        Self::with_driver(Arc::new(driver), config).await
    }

    /// Build a client over an already connected driver.
    ///
    /// Sign-in is skipped when `config.user` is empty.
    pub async fn with_driver(driver: Arc<dyn Driver>, config: ClientConfig) -> ClientResult<Self> {
        validate_config(&config).map_err(config_error)?;

        if !config.user.is_empty() {
            let credentials = Credentials::new(config.user.as_str(), config.password.as_str());
            driver
                .signin(&credentials)
                .await
                .map_err(|e| ClientError::Authentication(e.to_string()))?;
            tracing::debug!(user = %config.user, "Signed in");
        }

        let client = Self {
            context: Arc::new(ConnectionContext::new(driver)),
            config: Arc::new(config),
        };

        let wanted = client.config.selection();
        if wanted.is_set() {
            client.apply_selection(wanted).await?;
        }

        tracing::info!(selection = %client.selection(), "Database client ready");
        Ok(client)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn driver(&self) -> Arc<dyn Driver> {
        self.context.driver()
    }

    /// The namespace and database operations currently run against.
    pub fn selection(&self) -> Selection {
        self.context.selection()
    }

    /// Health check: a bounded read of the empty reference.
    ///
    /// A "not found" answer means the database is up and counts as healthy.
    pub async fn ping(&self) -> ClientResult<()> {
        let ctx = OpContext::with_timeout(Duration::from_secs(self.config.timeouts.health_check_secs));
        let result = match self.read_raw(&ctx, "").await {
            Ok(_) => Ok(()),
            Err(ClientError::Driver(e)) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        };
        metrics::record_health(result.is_ok());
        result
    }

    /// Switch namespace and database.
    ///
    /// Waits for in-flight calls to finish first; bounded by
    /// `timeouts.selection_secs`.
    pub async fn use_namespace_and_database(&self, namespace: &str, database: &str) -> ClientResult<()> {
        let selection = Selection::new(namespace, database);
        if !selection.is_set() {
            return Err(ClientError::InvalidArgument(
                "namespace and database must both be non-empty".into(),
            ));
        }

        let bound = Duration::from_secs(self.config.timeouts.selection_secs);
        tokio::time::timeout(bound, self.apply_selection(selection))
            .await
            .map_err(|_| ClientError::Selection(format!("selection timed out after {:?}", bound)))?
    }

    async fn apply_selection(&self, selection: Selection) -> ClientResult<()> {
        let _exclusive = self.context.exclusive().await;
        let result = self
            .context
            .driver()
            .use_ns_db(&selection.namespace, &selection.database)
            .await;
        metrics::record_selection(result.is_ok());

        result.map_err(|e| ClientError::Selection(e.to_string()))?;
        tracing::info!(namespace = %selection.namespace, database = %selection.database, "Selection changed");
        self.context.set_selection(selection);
        Ok(())
    }

    /// Create a record (`table:id`) or a record with a generated id (`table`).
    pub async fn create<P: Serialize + ?Sized>(
        &self,
        ctx: &OpContext,
        reference: &str,
        payload: &P,
    ) -> ClientResult<RawResponse> {
        let content = Value::Object(to_entry(payload)?);
        let target = RecordRef::parse(reference);
        self.dispatch(ctx, "create", reference, move |driver| async move {
            driver.create(&target, content).await
        })
        .await
        .map(RawResponse::new)
    }

    /// Read and normalize into `Option<T>` or `Vec<T>`.
    ///
    /// The shape follows `R`, not the reference: a record reference read
    /// into a `Vec` yields at most one element, a table reference read into
    /// an `Option` yields its first record.
    pub async fn read<R: Target>(&self, ctx: &OpContext, reference: &str) -> ClientResult<R> {
        let raw = self.read_raw(ctx, reference).await?;
        raw.decode().inspect_err(|e| {
            tracing::warn!(reference, error = %e, "Could not normalize read response");
        })
    }

    pub async fn read_one<T: DeserializeOwned>(&self, ctx: &OpContext, reference: &str) -> ClientResult<Option<T>> {
        self.read(ctx, reference).await
    }

    pub async fn read_many<T: DeserializeOwned>(&self, ctx: &OpContext, reference: &str) -> ClientResult<Vec<T>> {
        self.read(ctx, reference).await
    }

    /// Read without normalizing.
    pub async fn read_raw(&self, ctx: &OpContext, reference: &str) -> ClientResult<RawResponse> {
        let target = RecordRef::parse(reference);
        self.dispatch(ctx, "read", reference, move |driver| async move {
            driver.select(&target).await
        })
        .await
        .map(RawResponse::new)
    }

    /// Replace the content of a record, or of every record in a table.
    pub async fn update<P: Serialize + ?Sized>(
        &self,
        ctx: &OpContext,
        reference: &str,
        payload: &P,
    ) -> ClientResult<RawResponse> {
        let content = Value::Object(to_entry(payload)?);
        let target = RecordRef::parse(reference);
        self.dispatch(ctx, "update", reference, move |driver| async move {
            driver.update(&target, content).await
        })
        .await
        .map(RawResponse::new)
    }

    /// Delete a record or a whole table. Deleting something absent succeeds.
    pub async fn delete(&self, ctx: &OpContext, reference: &str) -> ClientResult<()> {
        let target = RecordRef::parse(reference);
        self.dispatch(ctx, "delete", reference, move |driver| async move {
            driver.delete(&target).await
        })
        .await
        .map(|_| ())
    }

    /// Create a `relation` edge from one record to another.
    ///
    /// Returns the raw statement answers.
    pub async fn relate(
        &self,
        ctx: &OpContext,
        from: &str,
        to: &str,
        relation: &str,
    ) -> ClientResult<RawResponse> {
        if !is_identifier(relation) {
            return Err(ClientError::InvalidArgument(format!(
                "relation name '{}' must be alphanumeric or '_'",
                relation
            )));
        }

        let sql = format!("RELATE $r1->{}->$r2", relation);
        let mut vars = Vars::new();
        vars.insert("r1".to_string(), Value::String(from.to_string()));
        vars.insert("r2".to_string(), Value::String(to.to_string()));

        self.dispatch(ctx, "relate", from, move |driver| async move {
            driver.query(&sql, vars).await
        })
        .await
        .map(RawResponse::new)
    }

    /// Run a free-form query and return the first statement's result.
    pub async fn query(&self, ctx: &OpContext, sql: &str) -> ClientResult<QueryResult> {
        self.query_with(ctx, sql, Vars::new()).await
    }

    /// Like [`query`](Self::query) with `$name` variables bound.
    pub async fn query_with(&self, ctx: &OpContext, sql: &str, vars: Vars) -> ClientResult<QueryResult> {
        let results = self.run_query(ctx, sql, vars).await?;
        Ok(results.into_iter().next().unwrap_or_default())
    }

    /// Run a free-form query and return every statement's result.
    pub async fn query_all(&self, ctx: &OpContext, sql: &str) -> ClientResult<Vec<QueryResult>> {
        self.run_query(ctx, sql, Vars::new()).await
    }

    async fn run_query(&self, ctx: &OpContext, sql: &str, vars: Vars) -> ClientResult<Vec<QueryResult>> {
        let statement = sql.to_string();
        let raw = self
            .dispatch(ctx, "query", "", move |driver| async move {
                driver.query(&statement, vars).await
            })
            .await?;
        Ok(decode_many(raw)?)
    }

    /// Run one driver call under the selection gate and the envelope.
    async fn dispatch<T, F, Fut>(
        &self,
        ctx: &OpContext,
        operation: &'static str,
        reference: &str,
        call: F,
    ) -> ClientResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<dyn Driver>) -> Fut,
        Fut: Future<Output = DriverResult<T>> + Send + 'static,
    {
        let gate = self.context.gate();
        let pending = call(self.context.driver());
        let guarded = async move {
            let _shared = ConnectionContext::enter(gate).await;
            pending.await
        };

        let span = tracing::debug_span!(
            "surreal_op",
            operation,
            reference,
            selection = %self.selection(),
            op_id = %uuid::Uuid::new_v4(),
        );
        run_cancellable(ctx, operation, guarded).instrument(span).await
    }
}

impl std::fmt::Debug for SurrealClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurrealClient")
            .field("address", &self.config.address)
            .field("selection", &self.selection())
            .finish()
    }
}

fn config_error(errors: Vec<crate::config::validation::ValidationError>) -> ClientError {
    let rendered: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
    ClientError::Config(rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemoryDriver;

    fn config(namespace: &str, database: &str) -> ClientConfig {
        ClientConfig {
            user: "root".into(),
            password: "root".into(),
            namespace: namespace.into(),
            database: database.into(),
            ..ClientConfig::default()
        }
    }

    #[tokio::test]
    async fn test_with_driver_applies_selection() {
        let client = SurrealClient::with_driver(Arc::new(MemoryDriver::new()), config("n", "d"))
            .await
            .unwrap();
        assert_eq!(client.selection(), Selection::new("n", "d"));
    }

    #[tokio::test]
    async fn test_bad_credentials_fail_construction() {
        let driver = MemoryDriver::new().with_credentials(Credentials::new("root", "secret"));
        let err = SurrealClient::with_driver(Arc::new(driver), config("n", "d"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_half_selection_rejected() {
        let err = SurrealClient::with_driver(Arc::new(MemoryDriver::new()), config("n", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[tokio::test]
    async fn test_relation_name_checked() {
        let client = SurrealClient::with_driver(Arc::new(MemoryDriver::new()), config("n", "d"))
            .await
            .unwrap();
        let ctx = OpContext::background();
        let err = client
            .relate(&ctx, "a:1", "b:1", "likes; DELETE a")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_ping_with_huge_health_bound() {
        let mut config = config("n", "d");
        config.timeouts.health_check_secs = u64::MAX;
        let client = SurrealClient::with_driver(Arc::new(MemoryDriver::new()), config)
            .await
            .unwrap();
        client.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_non_object_payload_rejected() {
        let client = SurrealClient::with_driver(Arc::new(MemoryDriver::new()), config("n", "d"))
            .await
            .unwrap();
        let ctx = OpContext::background();
        let err = client.create(&ctx, "item:1", &42).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument(_)));
    }
}
