// course-portal/crates/course-portal/src/metrics.rs

use axum::http::StatusCode;
use axum::response::IntoResponse;
use lazy_static::lazy_static;
use prometheus::{Encoder, Histogram, IntCounter, IntCounterVec, IntGauge, Registry, TextEncoder};
use std::sync::OnceLock;

lazy_static! {
    static ref REGISTRY: Registry = Registry::new();
}

static REQ_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();
static ACTIVE_STREAMS: OnceLock<IntGauge> = OnceLock::new();
static UPLOADS_TOTAL: OnceLock<IntCounter> = OnceLock::new();
static RELAY_LATENCY: OnceLock<Histogram> = OnceLock::new();

pub fn init_metrics() {
    let req_counter = REQ_COUNTER.get_or_init(|| {
        IntCounterVec::new(
            prometheus::opts!("requests_total", "Total requests per route"),
            &["route", "status"],
        )
        .unwrap()
    });

    let active_streams = ACTIVE_STREAMS.get_or_init(|| {
        IntGauge::new("active_streams", "Chat relay streams currently open").unwrap()
    });

    let uploads_total =
        UPLOADS_TOTAL.get_or_init(|| IntCounter::new("uploads_total", "Files accepted for upload").unwrap());

    let relay_latency = RELAY_LATENCY.get_or_init(|| {
        Histogram::with_opts(prometheus::HistogramOpts::new(
            "relay_latency_seconds",
            "Wall-clock duration of backend relay calls",
        ))
        .unwrap()
    });

    REGISTRY.register(Box::new(req_counter.clone())).ok();
    REGISTRY.register(Box::new(active_streams.clone())).ok();
    REGISTRY.register(Box::new(uploads_total.clone())).ok();
    REGISTRY.register(Box::new(relay_latency.clone())).ok();
}

pub fn inc_request(route: &str, status: &str) {
    if let Some(counter) = REQ_COUNTER.get() {
        counter.with_label_values(&[route, status]).inc();
    }
}

pub fn inc_streams() {
    if let Some(gauge) = ACTIVE_STREAMS.get() {
        gauge.inc();
    }
}

pub fn dec_streams() {
    if let Some(gauge) = ACTIVE_STREAMS.get() {
        gauge.dec();
    }
}

pub fn inc_uploads() {
    if let Some(counter) = UPLOADS_TOTAL.get() {
        counter.inc();
    }
}

pub fn observe_relay_latency(duration: f64) {
    if let Some(histogram) = RELAY_LATENCY.get() {
        histogram.observe(duration);
    }
}

pub async fn get_metrics() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer).unwrap();

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4")],
        buffer,
    )
}
