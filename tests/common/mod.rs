//! Shared utilities for integration testing.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use surreal_link::{ClientConfig, MemoryDriver, SurrealClient};

/// A request as seen by the mock backend.
#[derive(Debug, Clone, Default)]
pub struct MockRequest {
    pub method: String,
    pub path: String,
    pub query: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl MockRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Requests received so far, in arrival order.
pub type RequestLog = Arc<Mutex<Vec<MockRequest>>>;

/// Start a programmable mock backend on an ephemeral port.
///
/// Every request is parsed, logged and answered with the handler's
/// `(status, body)`.
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, RequestLog)
where
    F: Fn(MockRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log: RequestLog = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let requests = log.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    let requests = requests.clone();
                    tokio::spawn(async move {
                        let Some(request) = read_request(&mut socket).await else {
                            return;
                        };
                        requests.lock().unwrap().push(request.clone());
                        let (status, body) = f(request).await;
                        let status_text = match status {
                            200 => "200 OK",
                            400 => "400 Bad Request",
                            401 => "401 Unauthorized",
                            403 => "403 Forbidden",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, log)
}

async fn read_request(socket: &mut TcpStream) -> Option<MockRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (target, String::new()),
    };

    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(MockRequest {
        method,
        path,
        query,
        headers,
        body: String::from_utf8_lossy(&body).to_string(),
    })
}

/// Statement envelope array with one `OK` answer.
pub fn ok_envelope(result: Value) -> String {
    json!([{ "time": "1.2ms", "status": "OK", "result": result }]).to_string()
}

/// Statement envelope array with one `ERR` answer.
pub fn err_envelope(detail: &str) -> String {
    json!([{ "time": "0.4ms", "status": "ERR", "detail": detail }]).to_string()
}

/// Answers like a small SurrealDB instance holding `item:1`.
///
/// Accepts `root`/`root`, requires the bearer token and `NS`/`DB` headers on
/// key and query routes.
pub async fn surreal_like(request: MockRequest) -> (u16, String) {
    let authorized = request.header("authorization") == Some("Bearer token-1");
    let selected = request.header("ns") == Some("n") && request.header("db") == Some("d");

    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/health") => (200, String::new()),
        ("POST", "/signin") => {
            let body: Value = serde_json::from_str(&request.body).unwrap_or(Value::Null);
            if body["user"] == "root" && body["pass"] == "root" {
                (200, json!({ "code": 200, "token": "token-1" }).to_string())
            } else {
                (
                    401,
                    json!({
                        "code": 401,
                        "details": "Authentication failed",
                        "information": "There was a problem with authentication"
                    })
                    .to_string(),
                )
            }
        }
        _ if !authorized => (403, json!({ "code": 403, "information": "not signed in" }).to_string()),
        _ if !selected => (400, json!({ "code": 400, "information": "no namespace" }).to_string()),
        ("GET", "/key/item/1") => (200, ok_envelope(json!([{ "id": "item:1", "name": "a", "count": 1 }]))),
        ("GET", "/key/item") => (
            200,
            ok_envelope(json!([
                { "id": "item:1", "name": "a", "count": 1 },
                { "id": "item:2", "name": "b", "count": 2 }
            ])),
        ),
        ("GET", "/key/empty") => (200, ok_envelope(json!([]))),
        ("POST", "/key/item/1") => (200, err_envelope("Database record `item:1` already exists")),
        ("DELETE", "/key/item/1") => (200, ok_envelope(json!([]))),
        ("POST", "/sql") => (
            200,
            json!([
                { "time": "2ms", "status": "OK", "result": [{ "id": "item:1", "name": "a", "count": 1 }] },
                { "time": "1ms", "status": "ERR", "result": "table `nope` does not exist" }
            ])
            .to_string(),
        ),
        _ => (404, json!({ "code": 404, "details": "Requested resource not found" }).to_string()),
    }
}

/// Configuration with credentials and the `n`/`d` selection.
pub fn test_config(address: &str) -> ClientConfig {
    ClientConfig {
        address: address.to_string(),
        user: "root".into(),
        password: "root".into(),
        namespace: "n".into(),
        database: "d".into(),
        ..ClientConfig::default()
    }
}

/// A client over a memory driver selected on `n`/`d`.
pub async fn memory_client(driver: MemoryDriver) -> (Arc<MemoryDriver>, SurrealClient) {
    let driver = Arc::new(driver);
    let client = SurrealClient::with_driver(driver.clone(), test_config(""))
        .await
        .unwrap();
    (driver, client)
}
