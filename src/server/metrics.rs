use axum::{http::StatusCode, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Metric name prefix for all MAITRI metrics
const PREFIX: &str = "maitri";

lazy_static! {
    // Global Prometheus registry
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

    // Detection Metrics
    pub static ref ANALYSES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_analyses_total"), "Fused emotion decisions by label"),
        &["emotion"]
    ).expect("Failed to create analyses_total metric");

    pub static ref CLASSIFIER_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_classifier_duration_seconds"),
            "Emotion classifier call duration in seconds"
        )
        .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["modality"]
    ).expect("Failed to create classifier_duration_seconds metric");

    pub static ref CLASSIFIER_FAILURES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_classifier_failures_total"),
            "Classifier calls that degraded to a neutral observation"
        ),
        &["modality", "reason"]
    ).expect("Failed to create classifier_failures_total metric");

    // Alert Metrics
    pub static ref ALERTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_alerts_total"), "Alerts raised by level"),
        &["level"]
    ).expect("Failed to create alerts_total metric");

    // Chat Metrics
    pub static ref CHAT_REPLIES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_chat_replies_total"), "Chat replies by source"),
        &["source"]
    ).expect("Failed to create chat_replies_total metric");

    // Storage Metrics
    pub static ref STORAGE_WRITES_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_storage_writes_total"), "Persisted records by backend and kind"),
        &["backend", "kind"]
    ).expect("Failed to create storage_writes_total metric");

    pub static ref STORAGE_FALLBACKS_TOTAL: Counter = Counter::new(
        format!("{PREFIX}_storage_fallbacks_total"),
        "Remote storage failures that fell back to local files"
    ).expect("Failed to create storage_fallbacks_total metric");

    // Error Metrics
    pub static ref ERRORS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_errors_total"), "Total errors by type and endpoint"),
        &["error_type", "endpoint"]
    ).expect("Failed to create errors_total metric");

    pub static ref PROCESS_MEMORY_BYTES: Gauge = Gauge::new(
        format!("{PREFIX}_process_memory_bytes"),
        "Process memory usage in bytes"
    ).expect("Failed to create process_memory_bytes metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(ANALYSES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CLASSIFIER_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(CLASSIFIER_FAILURES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ALERTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(CHAT_REPLIES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(STORAGE_WRITES_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(STORAGE_FALLBACKS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(ERRORS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(PROCESS_MEMORY_BYTES.clone()));

    tracing::info!("Metrics system initialized successfully");
}

/// Collapses request paths into a fixed set of labels (user ids are not labels)
pub fn categorize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/analyze" => "/analyze",
        "/predict" => "/predict",
        "/chat" => "/chat",
        "/save" => "/save",
        p if p.starts_with("/history/") => "/history/{user_id}",
        _ => "other",
    }
}

/// Record an HTTP request
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();

    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

/// Record a fused emotion decision
pub fn record_analysis(emotion: &str) {
    ANALYSES_TOTAL.with_label_values(&[emotion]).inc();
}

/// Record how long a classifier took to answer (successfully or not)
pub fn record_classifier_call(modality: &str, duration: Duration) {
    CLASSIFIER_DURATION_SECONDS
        .with_label_values(&[modality])
        .observe(duration.as_secs_f64());
}

/// Record a classifier that had to be replaced by the neutral fallback
pub fn record_classifier_failure(modality: &str, reason: &str) {
    CLASSIFIER_FAILURES_TOTAL
        .with_label_values(&[modality, reason])
        .inc();
}

/// Record a raised alert
pub fn record_alert(level: &str) {
    ALERTS_TOTAL.with_label_values(&[level]).inc();
}

/// Record where a chat reply came from (`generator` or `template`)
pub fn record_chat_reply(source: &str) {
    CHAT_REPLIES_TOTAL.with_label_values(&[source]).inc();
}

/// Record a persisted record
pub fn record_storage_write(backend: &str, kind: &str) {
    STORAGE_WRITES_TOTAL.with_label_values(&[backend, kind]).inc();
}

/// Record a remote write that fell back to local storage
pub fn record_storage_fallback() {
    STORAGE_FALLBACKS_TOTAL.inc();
}

/// Record an error
pub fn record_error(error_type: &str, endpoint: &str) {
    ERRORS_TOTAL
        .with_label_values(&[error_type, endpoint])
        .inc();
}

/// Update process memory usage
pub fn update_memory_usage() {
    #[cfg(target_os = "linux")]
    {
        if let Ok(status) = std::fs::read_to_string("/proc/self/status") {
            for line in status.lines() {
                if line.starts_with("VmRSS:") {
                    // RSS is reported in kB
                    if let Some(kb_str) = line.split_whitespace().nth(1) {
                        if let Ok(kb) = kb_str.parse::<f64>() {
                            PROCESS_MEMORY_BYTES.set(kb * 1024.0);
                            return;
                        }
                    }
                }
            }
        }
    }
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler() -> impl IntoResponse {
    update_memory_usage();

    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => {
            let response = String::from_utf8(buffer).unwrap_or_else(|_| String::from(""));
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
