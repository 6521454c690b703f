use crate::errors::Result;
use axum::{http::StatusCode, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Gauge, Opts, Registry, TextEncoder};
use std::net::SocketAddr;
use tracing::{error, info};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref MESSAGES_TOTAL: Counter = counter(
        "airwatch_messages_total",
        "Total messages received from the broker"
    );
    pub static ref VALID_MESSAGES_TOTAL: Counter = counter(
        "airwatch_valid_messages_total",
        "Total messages decoded and queued for display"
    );
    pub static ref INVALID_MESSAGES_TOTAL: Counter = counter(
        "airwatch_invalid_messages_total",
        "Total messages dropped because they failed to decode or validate"
    );
    pub static ref INBOX_DROPPED_TOTAL: Counter = counter(
        "airwatch_inbox_dropped_total",
        "Total readings evicted from a full inbox"
    );
    pub static ref INBOX_DEPTH: Gauge = gauge(
        "airwatch_inbox_depth",
        "Readings waiting for the next render cycle"
    );
    pub static ref BROKER_CONNECTED: Gauge = gauge(
        "airwatch_broker_connected",
        "1 while the broker connection is up"
    );
    pub static ref RENDER_CYCLES_TOTAL: Counter = counter(
        "airwatch_render_cycles_total",
        "Total dashboard redraws"
    );
    pub static ref RECONNECT_WAITS_TOTAL: Counter = counter(
        "airwatch_reconnect_waits_total",
        "Total backoff waits after a broker connection error"
    );
}

fn counter(name: &str, help: &str) -> Counter {
    Counter::with_opts(Opts::new(name, help)).expect("valid counter options")
}

fn gauge(name: &str, help: &str) -> Gauge {
    Gauge::with_opts(Opts::new(name, help)).expect("valid gauge options")
}

pub fn init_metrics() -> Result<()> {
    REGISTRY.register(Box::new(MESSAGES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(VALID_MESSAGES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(INVALID_MESSAGES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(INBOX_DROPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(INBOX_DEPTH.clone()))?;
    REGISTRY.register(Box::new(BROKER_CONNECTED.clone()))?;
    REGISTRY.register(Box::new(RENDER_CYCLES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONNECT_WAITS_TOTAL.clone()))?;
    Ok(())
}

pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn create_router() -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(|| async { "ok" }))
}

async fn metrics_handler() -> std::result::Result<String, (StatusCode, String)> {
    gather_metrics().map_err(|e| {
        error!("Failed to encode metrics: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

/// Serves the metrics router until the process exits.
pub async fn serve(addr: SocketAddr) {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind metrics server to {}: {}", addr, e);
            return;
        }
    };

    info!("Metrics server listening on {}", addr);

    if let Err(e) = axum::serve(listener, create_router()).await {
        error!("Metrics server error: {}", e);
    }
}
