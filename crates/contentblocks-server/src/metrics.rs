use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

pub static CONTENT_OPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "content_ops_total",
        "Content operations by outcome",
        &["op", "outcome"]
    )
    .unwrap()
});

pub static OP_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "content_op_duration_seconds",
        "Content operation durations",
        &["op"]
    )
    .unwrap()
});

pub fn record(op: &str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    CONTENT_OPS_TOTAL.with_label_values(&[op, outcome]).inc();
}

/// Prometheus text exposition of the default registry.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::new();
    let _ = encoder.encode(&metric_families, &mut buf);
    String::from_utf8(buf).unwrap_or_default()
}
