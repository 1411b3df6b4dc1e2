use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use lazy_static::lazy_static;
#[cfg(target_os = "linux")]
use prometheus::process_collector::ProcessCollector;
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;
use std::time::Instant;

use crate::http_server::AppState;

lazy_static! {
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests"),
        &["method", "endpoint", "status"]
    )
    .unwrap();
    pub static ref HTTP_REQUEST_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("http_request_duration_seconds", "HTTP request duration in seconds").buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5
        ]),
        &["method", "endpoint"]
    )
    .unwrap();
    pub static ref HTTP_REQUESTS_IN_FLIGHT: IntGauge = IntGauge::new(
        "http_requests_in_flight",
        "Number of HTTP requests currently being processed"
    )
    .unwrap();

    // Sign-in protocol metrics
    pub static ref AUTH_NONCES_ISSUED_TOTAL: IntCounter = IntCounter::new(
        "auth_nonces_issued_total",
        "Total number of sign-in nonces issued"
    )
    .unwrap();
    pub static ref AUTH_SIGN_IN_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("auth_sign_in_total", "Sign-in attempts by outcome"),
        &["outcome"]
    )
    .unwrap();
    pub static ref AUTH_SESSIONS_REVOKED_TOTAL: IntCounter = IntCounter::new(
        "auth_sessions_revoked_total",
        "Total number of sessions revoked on logout"
    )
    .unwrap();
}

#[derive(Debug, Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        #[cfg(target_os = "linux")]
        {
            let process_collector = ProcessCollector::for_self();
            registry.register(Box::new(process_collector)).unwrap();
        }

        registry.register(Box::new(HTTP_REQUESTS_TOTAL.clone())).unwrap();
        registry.register(Box::new(HTTP_REQUEST_DURATION.clone())).unwrap();
        registry.register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone())).unwrap();

        registry.register(Box::new(AUTH_NONCES_ISSUED_TOTAL.clone())).unwrap();
        registry.register(Box::new(AUTH_SIGN_IN_TOTAL.clone())).unwrap();
        registry.register(Box::new(AUTH_SESSIONS_REVOKED_TOTAL.clone())).unwrap();

        Self {
            registry: Arc::new(registry),
        }
    }
}

/// Records the outcome of a `/verify` call: `success` or an error kind.
pub fn record_sign_in(outcome: &str) {
    AUTH_SIGN_IN_TOTAL.with_label_values(&[outcome]).inc();
}

/// Middleware for tracking HTTP metrics. Mount with `route_layer` so the
/// matched route template is available as the endpoint label.
pub async fn track_metrics(req: Request, next: Next) -> Response {
    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = req.method().clone();

    if endpoint == "/metrics" {
        return next.run(req).await;
    }

    HTTP_REQUESTS_IN_FLIGHT.inc();
    let start = Instant::now();

    let response = next.run(req).await;

    HTTP_REQUEST_DURATION
        .with_label_values(&[method.as_str(), &endpoint])
        .observe(start.elapsed().as_secs_f64());

    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method.as_str(), &endpoint, &status])
        .inc();

    HTTP_REQUESTS_IN_FLIGHT.dec();

    response
}

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = state.metrics.registry.gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, String::from("Failed to encode metrics"));
    }

    match String::from_utf8(buffer) {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            tracing::error!("Metrics are not valid UTF-8: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, String::from("Failed to encode metrics"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_exposes_auth_metrics() {
        let metrics = Metrics::new();
        AUTH_NONCES_ISSUED_TOTAL.inc();
        record_sign_in("success");

        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&metrics.registry.gather(), &mut buffer)
            .unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("auth_nonces_issued_total"));
        assert!(text.contains("auth_sign_in_total{outcome=\"success\"}"));
    }
}
