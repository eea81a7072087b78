//! Prometheus metrics for commands, payments and response times.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::core::error::{AppError, Result};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    commands_total: IntCounterVec,
    payments_total: IntCounterVec,
    response_time: HistogramVec,
}

impl Metrics {
    pub fn new() -> std::result::Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let commands_total = IntCounterVec::new(
            Opts::new("commands_total", "Total number of bot commands received"),
            &["command"],
        )?;
        let payments_total = IntCounterVec::new(
            Opts::new("payments_total", "Total number of processed payments"),
            &["provider", "status"],
        )?;
        let response_time = HistogramVec::new(
            HistogramOpts::new("response_time_seconds", "Response time in seconds"),
            &["endpoint"],
        )?;

        registry.register(Box::new(commands_total.clone()))?;
        registry.register(Box::new(payments_total.clone()))?;
        registry.register(Box::new(response_time.clone()))?;

        Ok(Self {
            registry,
            commands_total,
            payments_total,
            response_time,
        })
    }

    pub fn record_command(&self, command: &str) {
        self.commands_total.with_label_values(&[command]).inc();
    }

    pub fn record_payment(&self, provider: &str, status: &str) {
        self.payments_total
            .with_label_values(&[provider, status])
            .inc();
    }

    pub fn observe_response_time(&self, endpoint: &str, elapsed: Duration) {
        self.response_time
            .with_label_values(&[endpoint])
            .observe(elapsed.as_secs_f64());
    }

    pub fn command_count(&self, command: &str) -> u64 {
        self.commands_total.with_label_values(&[command]).get()
    }

    pub fn payment_count(&self, provider: &str, status: &str) -> u64 {
        self.payments_total
            .with_label_values(&[provider, status])
            .get()
    }

    /// Text exposition format for scraping
    pub fn render(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| AppError::Internal(format!("Failed to encode metrics: {}", e)))?;

        String::from_utf8(buffer)
            .map_err(|e| AppError::Internal(format!("Metrics are not valid UTF-8: {}", e)))
    }
}

async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Result<Response> {
    let body = metrics.render()?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response())
}

pub fn routes(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;

    #[test]
    fn test_counters_are_labelled() {
        let metrics = Metrics::new().unwrap();
        metrics.record_command("start");
        metrics.record_command("start");
        metrics.record_payment("stripe", "created");

        assert_eq!(metrics.command_count("start"), 2);
        assert_eq!(metrics.command_count("help"), 0);
        assert_eq!(metrics.payment_count("stripe", "created"), 1);
        assert_eq!(metrics.payment_count("paypal", "created"), 0);
    }

    #[tokio::test]
    async fn test_metrics_endpoint_exposes_text_format() {
        let metrics = Arc::new(Metrics::new().unwrap());
        metrics.record_command("start");
        metrics.observe_response_time("start", Duration::from_millis(12));

        let server = TestServer::new(routes(Arc::clone(&metrics))).unwrap();
        let response = server.get("/metrics").await;

        response.assert_status_ok();
        let body = response.text();
        assert!(body.contains("commands_total{command=\"start\"} 1"));
        assert!(body.contains("response_time_seconds_count{endpoint=\"start\"} 1"));
    }
}
