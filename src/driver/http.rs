//! HTTP driver for the SurrealDB REST interface.
//!
//! # Responsibilities
//! - Normalize the configured address into an HTTP base URL
//! - Sign in and attach the session token to every request
//! - Map key operations onto `/key/{table}[/{id}]`
//! - Forward free-form statements to `/sql`
//! - Translate HTTP failures into `DriverError`
//!
//! # Design Decisions
//! - Session state (token, namespace, database) lives in `ArcSwapOption`s so
//!   concurrent calls read a consistent snapshot without locking
//! - Key operations unwrap the first statement envelope; `/sql` answers are
//!   returned whole

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::config::TimeoutConfig;
use crate::driver::reference::RecordRef;
use crate::driver::types::{Credentials, DriverError, DriverResult, Selection};
use crate::driver::{Driver, Vars};

/// One statement's answer as sent by the server.
#[derive(Debug, Deserialize)]
struct StatementEnvelope {
    #[serde(default)]
    status: String,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    detail: Option<String>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    information: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SigninBody {
    token: Option<String>,
}

/// Driver speaking to a database over HTTP.
pub struct HttpDriver {
    base: Url,
    http: reqwest::Client,
    token: ArcSwapOption<String>,
    session: ArcSwapOption<Selection>,
}

impl HttpDriver {
    /// Build the driver and verify the endpoint answers its health probe.
    pub async fn connect(address: &str, timeouts: &TimeoutConfig) -> DriverResult<Self> {
        let base = normalize_address(address)?;
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.request_secs))
            .build()
            .map_err(|e| DriverError::Connection(e.to_string()))?;

        let driver = Self {
            base,
            http,
            token: ArcSwapOption::empty(),
            session: ArcSwapOption::empty(),
        };

        driver.health().await.map_err(|e| match e {
            DriverError::Connection(_) => e,
            other => DriverError::Connection(other.to_string()),
        })?;

        tracing::info!(endpoint = %driver.base, "Database endpoint reachable");
        Ok(driver)
    }

    /// The base URL requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.base
    }

    fn url(&self, segments: &[&str]) -> DriverResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| DriverError::Connection(format!("'{}' cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn key_url(&self, reference: &RecordRef) -> DriverResult<Url> {
        if reference.is_empty() {
            return Err(DriverError::NotFound("empty reference".into()));
        }
        match reference.id() {
            Some(id) => self.url(&["key", reference.table(), id]),
            None => self.url(&["key", reference.table()]),
        }
    }

    fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        let mut request = request.header(ACCEPT, "application/json");
        if let Some(session) = self.session.load_full() {
            request = request
                .header("NS", session.namespace.as_str())
                .header("DB", session.database.as_str());
        }
        if let Some(token) = self.token.load_full() {
            request = request.bearer_auth(token.as_str());
        }
        request
    }

    async fn send(&self, request: RequestBuilder) -> DriverResult<Response> {
        let response = self.decorate(request).send().await.map_err(map_transport)?;
        check_status(response).await
    }

    async fn key_call(&self, request: RequestBuilder) -> DriverResult<Value> {
        let response = self.send(request).await?;
        let envelopes: Vec<StatementEnvelope> = response
            .json()
            .await
            .map_err(|e| DriverError::InvalidResponse(e.to_string()))?;

        let Some(first) = envelopes.into_iter().next() else {
            return Ok(Value::Array(Vec::new()));
        };
        if !first.status.eq_ignore_ascii_case("OK") {
            let message = first.detail.unwrap_or_else(|| match first.result {
                Value::String(s) => s,
                other => other.to_string(),
            });
            return Err(DriverError::Rejected(message));
        }
        Ok(first.result)
    }
}

#[async_trait]
impl Driver for HttpDriver {
    async fn health(&self) -> DriverResult<()> {
        let url = self.url(&["health"])?;
        self.send(self.http.get(url)).await?;
        Ok(())
    }

    async fn signin(&self, credentials: &Credentials) -> DriverResult<String> {
        let url = self.url(&["signin"])?;
        let body = json!({ "user": credentials.user, "pass": credentials.pass });
        let response = self.send(self.http.post(url).json(&body)).await?;
        let signin: SigninBody = response
            .json()
            .await
            .map_err(|e| DriverError::InvalidResponse(e.to_string()))?;

        let token = signin
            .token
            .ok_or_else(|| DriverError::InvalidResponse("sign-in answer carried no token".into()))?;
        self.token.store(Some(Arc::new(token.clone())));
        Ok(token)
    }

    async fn use_ns_db(&self, namespace: &str, database: &str) -> DriverResult<()> {
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
        let url = self.key_url(reference)?;
        self.key_call(self.http.post(url).json(&payload)).await
    }

    async fn select(&self, reference: &RecordRef) -> DriverResult<Value> {
        if reference.is_empty() {
            // Nothing to address; still prove the server answers.
            self.health().await?;
            return Err(DriverError::NotFound("empty reference".into()));
        }
        let url = self.key_url(reference)?;
        self.key_call(self.http.get(url)).await
    }

    async fn update(&self, reference: &RecordRef, payload: Value) -> DriverResult<Value> {
        let url = self.key_url(reference)?;
        self.key_call(self.http.put(url).json(&payload)).await
    }

    async fn delete(&self, reference: &RecordRef) -> DriverResult<Value> {
        let url = self.key_url(reference)?;
        self.key_call(self.http.delete(url)).await
    }

    async fn query(&self, sql: &str, vars: Vars) -> DriverResult<Value> {
        let url = self.url(&["sql"])?;
        let params: Vec<(String, String)> = vars
            .into_iter()
            .map(|(k, v)| match v {
                Value::String(s) => (k, s),
                other => (k, other.to_string()),
            })
            .collect();

        let request = self.http.post(url).query(&params).body(sql.to_string());
        let response = self.send(request).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| DriverError::InvalidResponse(e.to_string()))
    }
}

impl std::fmt::Debug for HttpDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDriver")
            .field("endpoint", &self.base.as_str())
            .field("signed_in", &self.token.load().is_some())
            .field("session", &self.session.load_full())
            .finish()
    }
}

/// Turn a configured address into an HTTP base URL.
///
/// Accepts `http(s)://` as-is, rewrites `ws(s)://` to `http(s)://`, drops a
/// trailing `/rpc` and assumes `http://` when no scheme is given.
pub fn normalize_address(address: &str) -> DriverResult<Url> {
    let address = address.trim();
    if address.is_empty() {
        return Err(DriverError::Connection("no address configured".into()));
    }
    let with_scheme = if address.contains("://") {
        address.to_string()
    } else {
        format!("http://{}", address)
    };

    let mut url = Url::parse(&with_scheme)
        .map_err(|e| DriverError::Connection(format!("invalid address '{}': {}", address, e)))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "http",
        "https" | "wss" => "https",
        other => {
            return Err(DriverError::Connection(format!(
                "unsupported scheme '{}' in address '{}'",
                other, address
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| DriverError::Connection(format!("cannot use scheme '{}'", scheme)))?;

    let path = url.path().trim_end_matches('/').to_string();
    let path = path.strip_suffix("/rpc").unwrap_or(&path).to_string();
    url.set_path(&path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn map_transport(err: reqwest::Error) -> DriverError {
    if err.is_connect() {
        DriverError::Connection(err.to_string())
    } else {
        DriverError::Transport(err.to_string())
    }
}

async fn check_status(response: Response) -> DriverResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.information.or(b.description).or(b.details))
        .unwrap_or_else(|| {
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        });

    tracing::debug!(status = %status, message = %message, "Database returned an error status");

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DriverError::Unauthorized(message),
        StatusCode::NOT_FOUND => DriverError::NotFound(message),
        _ => DriverError::Rejected(format!("{}: {}", status.as_u16(), message)),
    })
}
