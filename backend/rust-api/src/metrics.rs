use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_histogram, register_histogram_vec, register_int_counter_vec,
    register_int_gauge, CounterVec, Encoder, Histogram, HistogramVec, IntCounterVec, IntGauge,
    TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Attempt store
    pub static ref STORE_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "store_operations_total",
        "Total number of attempt store operations",
        &["operation", "status"]
    )
    .unwrap();

    pub static ref STORE_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "store_operation_duration_seconds",
        "Attempt store operation duration in seconds",
        &["operation"],
        vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1]
    )
    .unwrap();

    // Progress cache
    pub static ref CACHE_HIT_RATIO: CounterVec = register_counter_vec!(
        "progress_cache_hit_ratio",
        "Progress cache hit/miss ratio",
        &["result"]
    )
    .unwrap();

    pub static ref PROGRESS_CACHE_ENTRIES: IntGauge = register_int_gauge!(
        "progress_cache_entries",
        "Progress reports currently held in the cache"
    )
    .unwrap();

    // Business Metrics
    pub static ref ATTEMPTS_SCORED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "attempts_scored_total",
        "Total number of scored quiz attempts",
        &["difficulty", "passed"]
    )
    .unwrap();

    pub static ref ATTEMPTS_GATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "attempts_gated_total",
        "Attempts below the learner's tier that earned no points",
        &["difficulty"]
    )
    .unwrap();

    pub static ref ANSWERS_VALIDATED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "answers_validated_total",
        "Total number of validated answers",
        &["family", "correct"]
    )
    .unwrap();

    pub static ref PROGRESS_RECOMPUTE_DURATION_SECONDS: Histogram = register_histogram!(
        "progress_recompute_duration_seconds",
        "Time spent replaying attempt history into a progress report",
        vec![0.00001, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1]
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track attempt store operation with metrics
pub async fn track_store_operation<F, T>(operation: &str, future: F) -> Result<T, anyhow::Error>
where
    F: std::future::Future<Output = Result<T, anyhow::Error>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = if result.is_ok() { "success" } else { "error" };

    STORE_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();

    STORE_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration);

    result
}

pub fn record_attempt_scored(difficulty: &str, passed: bool, gated: bool) {
    ATTEMPTS_SCORED_TOTAL
        .with_label_values(&[difficulty, if passed { "true" } else { "false" }])
        .inc();
    if gated {
        ATTEMPTS_GATED_TOTAL.with_label_values(&[difficulty]).inc();
    }
}

pub fn record_answer_validated(family: &str, correct: bool) {
    ANSWERS_VALIDATED_TOTAL
        .with_label_values(&[family, if correct { "true" } else { "false" }])
        .inc();
}

/// Record cache hit
pub fn record_cache_hit() {
    CACHE_HIT_RATIO.with_label_values(&["hit"]).inc();
}

/// Record cache miss
pub fn record_cache_miss() {
    CACHE_HIT_RATIO.with_label_values(&["miss"]).inc();
}
