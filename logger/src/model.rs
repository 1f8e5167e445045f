use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// One persisted greenhouse reading.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SensorReading {
    pub id: i32,
    pub temperature: f64,
    pub humidity: f64,
    pub pump_status: bool,
    pub mode: String,
    pub setpoint: i32,
    pub recorded_at: DateTime<Utc>,
}

/// Last value seen per topic. Fields are overwritten independently as
/// messages arrive; temperature and humidity start unset so the persister
/// can tell "no data yet" apart from a real reading.
///
/// Serialized camelCase: this struct appears inside the status JSON,
/// which follows the API's camelCase surface rather than the column
/// names of persisted rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestReading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub pump_status: bool,
    pub mode: String,
    pub setpoint: i32,
}

impl Default for LatestReading {
    fn default() -> Self {
        Self {
            temperature: None,
            humidity: None,
            pump_status: false,
            mode: "auto".to_string(),
            setpoint: 75,
        }
    }
}

/// Snapshot returned by the health and logger-status endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggerStatus {
    pub mqtt_connected: bool,
    pub last_data: LatestReading,
    pub last_saved: Option<DateTime<Utc>>,
    pub save_interval_secs: u64,
}

/// One row of the `daily_sensor_summary` view.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub avg_temperature: Option<f64>,
    pub min_temperature: Option<f64>,
    pub max_temperature: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub min_humidity: Option<f64>,
    pub max_humidity: Option<f64>,
    pub reading_count: i64,
    pub pump_on_count: i64,
}
