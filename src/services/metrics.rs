use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_histogram, register_histogram_vec, Counter,
    CounterVec, Histogram, HistogramVec, TextEncoder,
};

pub static ORDERS_CREATED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pos_orders_created_total",
        "Total number of orders persisted",
        &["payment_method"]
    )
    .expect("Failed to register pos_orders_created_total")
});

pub static TABS_OPENED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("pos_tabs_opened_total", "Total number of tabs opened")
        .expect("Failed to register pos_tabs_opened_total")
});

pub static TABS_CLOSED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pos_tabs_closed_total",
        "Total number of tabs leaving the open state",
        &["outcome"]
    )
    .expect("Failed to register pos_tabs_closed_total")
});

pub static DB_QUERY_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "pos_db_query_duration_seconds",
        "Database query duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]
    )
    .expect("Failed to register pos_db_query_duration_seconds")
});

pub static ASSISTANT_REQUESTS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pos_assistant_requests_total",
        "Total number of assistant questions processed",
        &["outcome"]
    )
    .expect("Failed to register pos_assistant_requests_total")
});

pub static ASSISTANT_TOOL_CALLS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pos_assistant_tool_calls_total",
        "Total number of reporting tool invocations made by the assistant",
        &["tool"]
    )
    .expect("Failed to register pos_assistant_tool_calls_total")
});

pub static ASSISTANT_REQUEST_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "pos_assistant_request_duration_seconds",
        "End-to-end assistant request duration in seconds",
        vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]
    )
    .expect("Failed to register pos_assistant_request_duration_seconds")
});

/// Initialize all metrics at startup so they appear in scrapes before first use.
pub fn init_metrics() {
    Lazy::force(&ORDERS_CREATED_TOTAL);
    Lazy::force(&TABS_OPENED_TOTAL);
    Lazy::force(&TABS_CLOSED_TOTAL);
    Lazy::force(&DB_QUERY_DURATION);
    Lazy::force(&ASSISTANT_REQUESTS_TOTAL);
    Lazy::force(&ASSISTANT_TOOL_CALLS_TOTAL);
    Lazy::force(&ASSISTANT_REQUEST_DURATION);
    tracing::info!("Metrics initialized");
}

/// Render all registered metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    encoder
        .encode_to_string(&prometheus::gather())
        .unwrap_or_default()
}
