// Observability Infrastructure for Linkfolio
// Structured logging, operation tracing and lightweight counters.

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

static OPERATION_COUNTER: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNTER: AtomicU64 = AtomicU64::new(0);
static SCRAPE_COUNTER: AtomicU64 = AtomicU64::new(0);
static SCRAPE_FAILURE_COUNTER: AtomicU64 = AtomicU64::new(0);
static WRITE_COUNTER: AtomicU64 = AtomicU64::new(0);
static PERSISTENCE_FAILURE_COUNTER: AtomicU64 = AtomicU64::new(0);

const DEFAULT_FILTER: &str = "linkfolio=warn,error";
const VERBOSE_FILTER: &str = "linkfolio=debug,info";
const QUIET_FILTER: &str = "error";

/// Initialize the logging and tracing infrastructure
/// This should be called once at application startup
pub fn init_logging() -> Result<()> {
    init_logging_with_level(false, false)
}

/// Pick the filter directive for the given verbosity flags
fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if quiet {
        // Quiet always wins, even over RUST_LOG
        EnvFilter::new(QUIET_FILTER)
    } else if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
        })
    } else if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else {
        EnvFilter::new(DEFAULT_FILTER)
    }
}

/// Initialize logging with configurable verbosity
pub fn init_logging_with_level(verbose: bool, quiet: bool) -> Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(!quiet)
        .with_thread_ids(!quiet)
        .with_line_number(!quiet)
        .with_file(!quiet)
        .with_ansi(true);

    match tracing_subscriber::registry()
        .with(filter_for(verbose, quiet))
        .with(fmt_layer)
        .try_init()
    {
        Ok(()) => {
            if !quiet {
                info!("Linkfolio observability initialized");
            }
            Ok(())
        }
        // Already initialized, which is fine in test environments
        Err(_) => Ok(()),
    }
}

/// Operations worth a structured log line and a counter bump
#[derive(Debug, Clone, Serialize)]
pub enum Operation {
    Scrape {
        url: String,
    },
    PortfolioWrite {
        shops: usize,
        services: usize,
    },
    EntryAdded {
        collection: String,
        id: i64,
    },
    EntryUpdated {
        collection: String,
        id: i64,
    },
    EntryRemoved {
        collection: String,
        id: i64,
    },
    Startup {
        version: String,
    },
}

/// Metric types for performance monitoring
#[derive(Debug, Clone)]
pub enum MetricType {
    Counter { name: &'static str, value: u64 },
    Timer { name: &'static str, duration: Duration },
}

/// Operation context for tracing through the system
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub trace_id: Uuid,
    pub span_id: Uuid,
    pub operation: String,
    pub start_time: Instant,
    pub attributes: Vec<(String, String)>,
}

impl OperationContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            span_id: Uuid::new_v4(),
            operation: operation.into(),
            start_time: Instant::now(),
            attributes: Vec::new(),
        }
    }

    pub fn add_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((key.into(), value.into()));
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Log an operation outcome with full context and bump the matching counters
pub fn log_operation<E: Display>(
    ctx: &OperationContext,
    op: &Operation,
    result: &std::result::Result<(), E>,
) {
    let elapsed = ctx.elapsed();
    let attrs = ctx
        .attributes
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");

    match result {
        Ok(()) => {
            info!(
                trace_id = %ctx.trace_id,
                span_id = %ctx.span_id,
                operation = %ctx.operation,
                elapsed_ms = elapsed.as_millis(),
                attributes = %attrs,
                "Operation completed: {:?}", op
            );
            OPERATION_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
        Err(e) => {
            warn!(
                trace_id = %ctx.trace_id,
                span_id = %ctx.span_id,
                operation = %ctx.operation,
                elapsed_ms = elapsed.as_millis(),
                attributes = %attrs,
                error = %e,
                "Operation failed: {:?}", op
            );
            ERROR_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
    }

    match (op, result.is_ok()) {
        (Operation::Scrape { .. }, true) => {
            SCRAPE_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
        (Operation::Scrape { .. }, false) => {
            SCRAPE_COUNTER.fetch_add(1, Ordering::Relaxed);
            SCRAPE_FAILURE_COUNTER.fetch_add(1, Ordering::Relaxed);
        }
        (Operation::PortfolioWrite { .. }, ok) => {
            WRITE_COUNTER.fetch_add(1, Ordering::Relaxed);
            if !ok {
                PERSISTENCE_FAILURE_COUNTER.fetch_add(1, Ordering::Relaxed);
            }
        }
        _ => {}
    }
}

/// Record a metric
pub fn record_metric(metric: MetricType) {
    match metric {
        MetricType::Counter { name, value } => {
            debug!("metric.counter {} = {}", name, value);
        }
        MetricType::Timer { name, duration } => {
            debug!("metric.timer {} = {:?}", name, duration);
        }
    }
}

/// Execute a future with a trace context
pub async fn with_trace_id<F, T, E>(operation: &str, f: F) -> std::result::Result<T, E>
where
    F: std::future::Future<Output = std::result::Result<T, E>>,
    E: Display,
{
    let ctx = OperationContext::new(operation);
    let trace_id = ctx.trace_id;
    let span_id = ctx.span_id;

    debug!(
        trace_id = %trace_id,
        span_id = %span_id,
        "Starting operation: {}", operation
    );

    let start = Instant::now();
    let result = f.await;
    let elapsed = start.elapsed();

    match &result {
        Ok(_) => {
            info!(
                trace_id = %trace_id,
                span_id = %span_id,
                elapsed_ms = elapsed.as_millis(),
                "Operation completed successfully: {}", operation
            );
            record_metric(MetricType::Timer {
                name: "operation.duration",
                duration: elapsed,
            });
        }
        Err(e) => {
            error!(
                trace_id = %trace_id,
                span_id = %span_id,
                elapsed_ms = elapsed.as_millis(),
                error = %e,
                "Operation failed: {}", operation
            );
            record_metric(MetricType::Counter {
                name: "operation.errors",
                value: 1,
            });
        }
    }

    result
}

/// Get current metrics snapshot
pub fn get_metrics() -> serde_json::Value {
    serde_json::json!({
        "operations": {
            "total": OPERATION_COUNTER.load(Ordering::Relaxed),
            "errors": ERROR_COUNTER.load(Ordering::Relaxed),
        },
        "scrapes": {
            "total": SCRAPE_COUNTER.load(Ordering::Relaxed),
            "failures": SCRAPE_FAILURE_COUNTER.load(Ordering::Relaxed),
        },
        "writes": {
            "total": WRITE_COUNTER.load(Ordering::Relaxed),
            "persistence_failures": PERSISTENCE_FAILURE_COUNTER.load(Ordering::Relaxed),
        },
        "timestamp": Utc::now().to_rfc3339(),
    })
}
