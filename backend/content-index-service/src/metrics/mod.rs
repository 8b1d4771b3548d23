//! Prometheus metrics for the content index service.
//!
//! Exposes index collectors and an HTTP handler for the `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Index lookups segmented by cache outcome (hit/miss/error).
    pub static ref CONTENT_INDEX_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "content_index_requests_total",
        "Content index lookups segmented by cache outcome",
        &["outcome"]
    )
    .expect("failed to register content_index_requests_total");

    /// Time spent serving lookups that had to rebuild.
    pub static ref CONTENT_INDEX_REBUILD_DURATION_SECONDS: Histogram = register_histogram!(
        "content_index_rebuild_duration_seconds",
        "Duration of content index lookups that rebuilt the index"
    )
    .expect("failed to register content_index_rebuild_duration_seconds");

    /// Content events segmented by reason and whether they invalidated.
    pub static ref CONTENT_INDEX_INVALIDATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "content_index_invalidations_total",
        "Content events segmented by reason and result",
        &["reason", "result"]
    )
    .expect("failed to register content_index_invalidations_total");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "content_index_http_request_duration_seconds",
        "HTTP request duration segmented by method",
        &["method"]
    )
    .expect("failed to register content_index_http_request_duration_seconds");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
