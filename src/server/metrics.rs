use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all catalog server metrics
const PREFIX: &str = "boxoffice";

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Correction pipeline
    pub static ref CORRECTIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_corrections_total"), "Identity corrections by outcome"),
        &["outcome"]
    ).expect("Failed to create corrections_total metric");

    pub static ref ENRICHMENT_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_enrichment_duration_seconds"),
            "Fetch plus upsert duration in seconds"
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["result"]
    ).expect("Failed to create enrichment_duration_seconds metric");

    pub static ref PROVIDER_RETRIES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_provider_retries_total"), "Retried metadata provider calls"),
        &["call"]
    ).expect("Failed to create provider_retries_total metric");

    pub static ref MOVIES_TOTAL: Gauge = Gauge::new(
        format!("{PREFIX}_movies_total"),
        "Movie rows in the store"
    ).expect("Failed to create movies_total metric");
}

/// Register all metrics. Re-registration errors are ignored so tests can call this repeatedly.
pub fn init_metrics() {
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(CORRECTIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ENRICHMENT_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(PROVIDER_RETRIES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(MOVIES_TOTAL.clone()));

    tracing::info!("Metrics system initialized successfully");
}

pub fn set_movies_total(count: usize) {
    MOVIES_TOTAL.set(count as f64);
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// `outcome` is "success" or an error kind such as "not_found".
pub fn record_correction(outcome: &str) {
    CORRECTIONS_TOTAL.with_label_values(&[outcome]).inc();
}

pub fn record_enrichment(result: &str, duration: Duration) {
    ENRICHMENT_DURATION_SECONDS
        .with_label_values(&[result])
        .observe(duration.as_secs_f64());
}

pub fn record_provider_retry(call: &str) {
    PROVIDER_RETRIES_TOTAL.with_label_values(&[call]).inc();
}

/// Collapse numeric path segments so label cardinality stays bounded.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.trim_start_matches('-').chars().all(|c| c.is_ascii_digit()) {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_default();
            (StatusCode::OK, response)
        }
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_metric(name: &str) -> bool {
        REGISTRY
            .gather()
            .iter()
            .any(|m| m.get_name() == format!("{PREFIX}_{name}"))
    }

    #[test]
    fn test_metrics_initialization() {
        init_metrics();
        init_metrics();
        assert!(find_metric("movies_total"));
    }

    #[test]
    fn test_record_http_request() {
        init_metrics();
        record_http_request("POST", "/v1/movies/correct-id", 200, Duration::from_millis(50));
        assert!(find_metric("http_requests_total"));
        assert!(find_metric("http_request_duration_seconds"));
    }

    #[test]
    fn test_correction_metrics() {
        init_metrics();
        record_correction("success");
        record_correction("not_found");
        record_enrichment("success", Duration::from_millis(300));
        record_provider_retry("credits");

        assert!(CORRECTIONS_TOTAL.with_label_values(&["not_found"]).get() >= 1.0);
        assert!(find_metric("corrections_total"));
        assert!(find_metric("enrichment_duration_seconds"));
        assert!(find_metric("provider_retries_total"));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/v1/movies/550/reenrich"), "/v1/movies/{id}/reenrich");
        assert_eq!(normalize_path("/v1/movies/correct-id"), "/v1/movies/correct-id");
        assert_eq!(normalize_path("/"), "/");
    }
}
