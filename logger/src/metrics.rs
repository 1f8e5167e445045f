use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref MESSAGES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "logger_messages_total",
        "Total messages received from MQTT"
    ))
    .unwrap();
    pub static ref SAVES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "logger_saves_total",
        "Total readings persisted to the database"
    ))
    .unwrap();
    pub static ref SAVE_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "logger_save_failures_total",
        "Total failed persistence attempts"
    ))
    .unwrap();
    pub static ref SKIPPED_SAVES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "logger_skipped_saves_total",
        "Save cycles skipped because sensor data was incomplete"
    ))
    .unwrap();
}

pub fn init_metrics() {
    REGISTRY.register(Box::new(MESSAGES_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(SAVES_TOTAL.clone())).unwrap();
    REGISTRY
        .register(Box::new(SAVE_FAILURES_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(SKIPPED_SAVES_TOTAL.clone()))
        .unwrap();
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
