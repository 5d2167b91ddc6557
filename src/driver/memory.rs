//! In-process driver.
//!
//! # Responsibilities
//! - Store records per namespace/database/table
//! - Answer key operations and the small statement set in `statement.rs`
//! - Simulate latency and failures for envelope tests
//!
//! # Design Decisions
//! - Records keep their reference in an `id` field, like the real database
//! - A session must select a namespace and database before touching data
//! - Per-statement failures inside `query` become `ERR` envelopes; parse
//!   failures reject the whole call

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use dashmap::DashMap;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::driver::reference::RecordRef;
use crate::driver::statement::{parse_statements, Statement};
use crate::driver::types::{Credentials, DriverError, DriverResult, Selection};
use crate::driver::{Driver, Vars};

const GENERATED_ID_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TableKey {
    namespace: String,
    database: String,
    table: String,
}

impl TableKey {
    fn new(selection: &Selection, table: &str) -> Self {
        Self {
            namespace: selection.namespace.clone(),
            database: selection.database.clone(),
            table: table.to_string(),
        }
    }
}

/// A driver backed by process memory.
#[derive(Default)]
pub struct MemoryDriver {
    tables: DashMap<TableKey, BTreeMap<String, Value>>,
    session: ArcSwapOption<Selection>,
    credentials: Option<Credentials>,
    latency: Duration,
    failures: AtomicU32,
    calls: AtomicU64,
}

impl MemoryDriver {
    /// A driver that accepts any credentials and answers immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept these credentials at sign-in.
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Delay every call by `latency` before it runs.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next `count` calls fail with a rejection.
    pub fn fail_next(&self, count: u32) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Number of calls that reached the driver.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// The currently selected namespace and database, if any.
    pub fn session(&self) -> Option<Selection> {
        self.session.load_full().map(|s| (*s).clone())
    }

    async fn enter(&self) -> DriverResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let injected = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(DriverError::Rejected("injected failure".into()));
        }
        Ok(())
    }

    fn selected(&self) -> DriverResult<Arc<Selection>> {
        self.session.load_full().ok_or_else(|| {
            DriverError::Rejected("specify a namespace and database to use".into())
        })
    }

    fn create_in(
        &self,
        selection: &Selection,
        reference: &RecordRef,
        content: Value,
    ) -> DriverResult<Vec<Value>> {
        if reference.is_empty() {
            return Err(DriverError::Rejected("cannot create a record without a table".into()));
        }
        let id = match reference.id() {
            Some(id) => id.to_string(),
            None => generate_id(),
        };
        let record_ref = RecordRef::record(reference.table(), &id);
        let record = with_id(content, &record_ref)?;

        let mut table = self
            .tables
            .entry(TableKey::new(selection, reference.table()))
            .or_default();
        if table.contains_key(&id) {
            return Err(DriverError::Rejected(format!(
                "database record `{}` already exists",
                record_ref
            )));
        }
        table.insert(id, record.clone());
        Ok(vec![record])
    }

    fn select_in(&self, selection: &Selection, reference: &RecordRef) -> DriverResult<Vec<Value>> {
        if reference.is_empty() {
            return Err(DriverError::NotFound("empty reference".into()));
        }
        let key = TableKey::new(selection, reference.table());
        let Some(table) = self.tables.get(&key) else {
            return Ok(Vec::new());
        };
        Ok(match reference.id() {
            Some(id) => table.get(id).cloned().into_iter().collect(),
            None => table.values().cloned().collect(),
        })
    }

    fn update_in(
        &self,
        selection: &Selection,
        reference: &RecordRef,
        content: Value,
    ) -> DriverResult<Vec<Value>> {
        if reference.is_empty() {
            return Err(DriverError::Rejected("cannot update a record without a table".into()));
        }
        let mut table = self
            .tables
            .entry(TableKey::new(selection, reference.table()))
            .or_default();

        match reference.id() {
            Some(id) => {
                let record = with_id(content, reference)?;
                table.insert(id.to_string(), record.clone());
                Ok(vec![record])
            }
            None => {
                let mut updated = Vec::with_capacity(table.len());
                for (id, slot) in table.iter_mut() {
                    let record = with_id(content.clone(), &RecordRef::record(reference.table(), id))?;
                    *slot = record.clone();
                    updated.push(record);
                }
                Ok(updated)
            }
        }
    }

    fn delete_in(&self, selection: &Selection, reference: &RecordRef) -> DriverResult<Vec<Value>> {
        if reference.is_empty() {
            return Err(DriverError::NotFound("empty reference".into()));
        }
        let key = TableKey::new(selection, reference.table());
        match reference.id() {
            Some(id) => {
                if let Some(mut table) = self.tables.get_mut(&key) {
                    table.remove(id);
                }
            }
            None => {
                self.tables.remove(&key);
            }
        }
        Ok(Vec::new())
    }

    fn relate_in(
        &self,
        selection: &Selection,
        from: &RecordRef,
        edge: &str,
        to: &RecordRef,
    ) -> DriverResult<Vec<Value>> {
        if from.is_table() || to.is_table() {
            return Err(DriverError::Rejected(
                "relations can only connect individual records".into(),
            ));
        }
        let content = json!({ "in": from.as_str(), "out": to.as_str() });
        self.create_in(selection, &RecordRef::parse(edge), content)
    }

    fn execute(&self, selection: &Selection, statement: &Statement, vars: &Vars) -> DriverResult<Vec<Value>> {
        match statement {
            Statement::Select { target } => self.select_in(selection, &target.bind(vars)?),
            Statement::Create { target, content } => {
                let content = content.clone().unwrap_or_else(|| Value::Object(Map::new()));
                self.create_in(selection, &target.bind(vars)?, content)
            }
            Statement::Delete { target } => self.delete_in(selection, &target.bind(vars)?),
            Statement::Relate { from, edge, to } => {
                self.relate_in(selection, &from.bind(vars)?, edge, &to.bind(vars)?)
            }
        }
    }
}

#[async_trait]
impl Driver for MemoryDriver {
    async fn health(&self) -> DriverResult<()> {
        self.enter().await
    }

    async fn signin(&self, credentials: &Credentials) -> DriverResult<String> {
        self.enter().await?;
        if let Some(expected) = &self.credentials {
            if expected != credentials {
                return Err(DriverError::Unauthorized(
                    "there was a problem with authentication".into(),
                ));
            }
        }
        Ok(format!("memory-{}", uuid::Uuid::new_v4()))
    }

    async fn use_ns_db(&self, namespace: &str, database: &str) -> DriverResult<()> {
        self.enter().await?;
        let selection = Selection::new(namespace, database);
        if !selection.is_set() {
            return Err(DriverError::Rejected(
                "namespace and database must both be given".into(),
            ));
        }
        self.session.store(Some(Arc::new(selection)));
        Ok(())
    }

    async fn create(&self, reference: &RecordRef, payload: Value) -> DriverResult<Value> {
        self.enter().await?;
        let selection = self.selected()?;
        self.create_in(&selection, reference, payload).map(Value::Array)
    }

    async fn select(&self, reference: &RecordRef) -> DriverResult<Value> {
        self.enter().await?;
        if reference.is_empty() {
            return Err(DriverError::NotFound("empty reference".into()));
        }
        let selection = self.selected()?;
        self.select_in(&selection, reference).map(Value::Array)
    }

    async fn update(&self, reference: &RecordRef, payload: Value) -> DriverResult<Value> {
        self.enter().await?;
        let selection = self.selected()?;
        self.update_in(&selection, reference, payload).map(Value::Array)
    }

    async fn delete(&self, reference: &RecordRef) -> DriverResult<Value> {
        self.enter().await?;
        let selection = self.selected()?;
        self.delete_in(&selection, reference).map(Value::Array)
    }

    async fn query(&self, sql: &str, vars: Vars) -> DriverResult<Value> {
        self.enter().await?;
        let selection = self.selected()?;
        let statements = parse_statements(sql)?;

        let mut envelopes = Vec::with_capacity(statements.len());
        for statement in &statements {
            let start = Instant::now();
            let envelope = match self.execute(&selection, statement, &vars) {
                Ok(rows) => json!({
                    "time": format!("{:?}", start.elapsed()),
                    "status": "OK",
                    "result": rows,
                }),
                Err(e) => {
                    tracing::debug!(error = %e, "Statement failed");
                    json!({
                        "time": format!("{:?}", start.elapsed()),
                        "status": "ERR",
                        "result": e.to_string(),
                    })
                }
            };
            envelopes.push(envelope);
        }
        Ok(Value::Array(envelopes))
    }
}

impl std::fmt::Debug for MemoryDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDriver")
            .field("tables", &self.tables.len())
            .field("session", &self.session())
            .field("latency", &self.latency)
            .finish()
    }
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_ID_LEN)
        .map(char::from)
        .collect::<String>()
        .to_ascii_lowercase()
}

fn with_id(content: Value, reference: &RecordRef) -> DriverResult<Value> {
    match content {
        Value::Object(mut map) => {
            map.insert("id".to_string(), Value::String(reference.to_string()));
            Ok(Value::Object(map))
        }
        other => Err(DriverError::Rejected(format!(
            "record content must be an object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn selected_driver() -> MemoryDriver {
        let driver = MemoryDriver::new();
        driver.use_ns_db("n", "d").await.unwrap();
        driver
    }

    #[tokio::test]
    async fn test_requires_selection() {
        let driver = MemoryDriver::new();
        let err = driver.select(&RecordRef::parse("item")).await.unwrap_err();
        assert!(matches!(err, DriverError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_create_sets_id() {
        let driver = selected_driver().await;
        let out = driver
            .create(&RecordRef::parse("item:1"), json!({"name": "a"}))
            .await
            .unwrap();
        assert_eq!(out, json!([{"id": "item:1", "name": "a"}]));
    }

    #[tokio::test]
    async fn test_create_generates_id_for_table() {
        let driver = selected_driver().await;
        let out = driver.create(&RecordRef::parse("item"), json!({})).await.unwrap();
        let id = out[0]["id"].as_str().unwrap();
        assert!(id.starts_with("item:"));
        assert_eq!(id.len(), "item:".len() + GENERATED_ID_LEN);
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let driver = selected_driver().await;
        let r = RecordRef::parse("item:1");
        driver.create(&r, json!({})).await.unwrap();
        let err = driver.create(&r, json!({})).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[tokio::test]
    async fn test_namespaces_are_isolated() {
        let driver = selected_driver().await;
        driver.create(&RecordRef::parse("item:1"), json!({})).await.unwrap();
        driver.use_ns_db("n", "other").await.unwrap();
        let out = driver.select(&RecordRef::parse("item")).await.unwrap();
        assert_eq!(out, json!([]));
    }

    #[tokio::test]
    async fn test_update_table_replaces_every_record() {
        let driver = selected_driver().await;
        driver.create(&RecordRef::parse("item:1"), json!({"v": 1})).await.unwrap();
        driver.create(&RecordRef::parse("item:2"), json!({"v": 2})).await.unwrap();

        let out = driver.update(&RecordRef::parse("item"), json!({"v": 0})).await.unwrap();
        assert_eq!(
            out,
            json!([{"id": "item:1", "v": 0}, {"id": "item:2", "v": 0}])
        );
    }

    #[tokio::test]
    async fn test_query_reports_statement_errors() {
        let driver = selected_driver().await;
        let out = driver
            .query("CREATE item:1; CREATE item:1", Vars::new())
            .await
            .unwrap();
        assert_eq!(out[0]["status"], "OK");
        assert_eq!(out[1]["status"], "ERR");
    }

    #[tokio::test]
    async fn test_fail_next() {
        let driver = selected_driver().await;
        driver.fail_next(1);
        assert!(driver.select(&RecordRef::parse("item")).await.is_err());
        assert!(driver.select(&RecordRef::parse("item")).await.is_ok());
    }

    #[tokio::test]
    async fn test_signin_checks_credentials() {
        let driver = MemoryDriver::new().with_credentials(Credentials::new("root", "root"));
        assert!(driver.signin(&Credentials::new("root", "root")).await.is_ok());
        let err = driver.signin(&Credentials::new("root", "nope")).await.unwrap_err();
        assert!(matches!(err, DriverError::Unauthorized(_)));
    }
}
