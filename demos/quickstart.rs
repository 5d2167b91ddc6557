//! Walk through the client operations against the in-process driver.
//!
//! ```text
//! cargo run --example quickstart
//! ```

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use surreal_link::{ClientConfig, MemoryDriver, OpContext, SurrealClient};

#[derive(Debug, Serialize, Deserialize)]
struct Person {
    name: String,
    age: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig {
        user: "root".into(),
        password: "root".into(),
        namespace: "demo".into(),
        database: "people".into(),
        ..ClientConfig::default()
    };
    let client = SurrealClient::with_driver(Arc::new(MemoryDriver::new()), config).await?;
    client.ping().await?;

    let ctx = OpContext::with_timeout(Duration::from_secs(2));

    client
        .create(&ctx, "person:tobie", &Person { name: "Tobie".into(), age: 34 })
        .await?;
    client
        .create(&ctx, "person:jaime", &Person { name: "Jaime".into(), age: 29 })
        .await?;
    client.relate(&ctx, "person:tobie", "person:jaime", "knows").await?;

    let tobie: Option<Person> = client.read_one(&ctx, "person:tobie").await?;
    println!("read one: {:?}", tobie);

    let everyone: Vec<Person> = client.read_many(&ctx, "person").await?;
    println!("read many: {:?}", everyone);

    let edges = client.query(&ctx, "SELECT * FROM knows").await?;
    println!("edges ({}, {}): {:?}", edges.status, edges.time, edges.results);

    let expired = OpContext::with_timeout(Duration::ZERO);
    match client.read_one::<Person>(&expired, "person:tobie").await {
        Err(e) if e.is_cancellation() => println!("expired context: {}", e),
        other => println!("unexpected: {:?}", other),
    }

    client.delete(&ctx, "person").await?;
    Ok(())
}
