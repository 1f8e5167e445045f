use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::model::{LatestReading, LoggerStatus};

#[derive(Debug, Default)]
struct Inner {
    reading: LatestReading,
    mqtt_connected: bool,
    last_saved: Option<DateTime<Utc>>,
}

/// Shared latest-reading record. Written by the MQTT message handler and
/// the persister, read by the persister and the status endpoints.
///
/// Wrapped in `Arc` so it can be cheaply cloned into every task.
#[derive(Clone)]
pub struct LoggerState {
    inner: Arc<RwLock<Inner>>,
    save_interval_secs: u64,
}

impl LoggerState {
    pub fn new(save_interval_secs: u64) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            save_interval_secs,
        }
    }

    pub async fn set_temperature(&self, value: f64) {
        self.inner.write().await.reading.temperature = Some(value);
    }

    pub async fn set_humidity(&self, value: f64) {
        self.inner.write().await.reading.humidity = Some(value);
    }

    pub async fn set_pump_status(&self, on: bool) {
        self.inner.write().await.reading.pump_status = on;
    }

    pub async fn set_mode(&self, mode: String) {
        self.inner.write().await.reading.mode = mode;
    }

    pub async fn set_setpoint(&self, value: i32) {
        self.inner.write().await.reading.setpoint = value;
    }

    pub async fn set_connected(&self, connected: bool) {
        self.inner.write().await.mqtt_connected = connected;
    }

    /// Copy of the latest per-field values. Fields may come from
    /// different messages; there is no atomic "reading" concept.
    pub async fn snapshot(&self) -> LatestReading {
        self.inner.read().await.reading.clone()
    }

    pub async fn mark_saved(&self, at: DateTime<Utc>) {
        self.inner.write().await.last_saved = Some(at);
    }

    pub async fn status(&self) -> LoggerStatus {
        let inner = self.inner.read().await;
        LoggerStatus {
            mqtt_connected: inner.mqtt_connected,
            last_data: inner.reading.clone(),
            last_saved: inner.last_saved,
            save_interval_secs: self.save_interval_secs,
        }
    }
}
