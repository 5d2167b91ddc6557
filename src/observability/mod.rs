//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! client and resilience layers produce:
//!     → logging.rs (structured log events, one span per operation)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stderr, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
