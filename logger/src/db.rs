use std::time::Duration;

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use tracing::info;

use crate::errors::Result;
use crate::model::{DailySummary, SensorReading};

/// Hard cap on the charting window.
pub const MAX_WINDOW_HOURS: u32 = 24;
/// Row cap for the charting query.
const RECENT_LIMIT: i64 = 500;

pub async fn make_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;

    info!("Database connection established");
    info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations completed");

    Ok(pool)
}

/// Insert one reading; `recorded_at` is assigned by the server.
pub async fn insert_reading(
    pool: &PgPool,
    temperature: f64,
    humidity: f64,
    pump_status: bool,
    mode: &str,
    setpoint: i32,
) -> Result<(i32, DateTime<Utc>)> {
    let row = sqlx::query(
        r#"
        INSERT INTO sensor_readings (temperature, humidity, pump_status, mode, setpoint, recorded_at)
        VALUES ($1, $2, $3, $4, $5, NOW())
        RETURNING id, recorded_at
        "#,
    )
    .bind(temperature)
    .bind(humidity)
    .bind(pump_status)
    .bind(mode)
    .bind(setpoint)
    .fetch_one(pool)
    .await?;

    Ok((row.get("id"), row.get("recorded_at")))
}

/// Rows from the trailing `hours` window, oldest first, capped at 500
/// rows. The window never exceeds 24 hours regardless of the argument.
pub async fn recent_readings(pool: &PgPool, hours: u32) -> Result<Vec<SensorReading>> {
    let hours = hours.min(MAX_WINDOW_HOURS);

    let rows = sqlx::query_as::<_, SensorReading>(
        r#"
        SELECT id, temperature, humidity, pump_status, mode, setpoint, recorded_at
        FROM sensor_readings
        WHERE recorded_at >= NOW() - $1 * INTERVAL '1 hour'
        ORDER BY recorded_at ASC
        LIMIT $2
        "#,
    )
    .bind(f64::from(hours))
    .bind(RECENT_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Pre-aggregated daily rows for the trailing `days` window, newest day
/// first. Aggregation lives in the `daily_sensor_summary` view.
pub async fn daily_stats(pool: &PgPool, days: u32) -> Result<Vec<DailySummary>> {
    let rows = sqlx::query_as::<_, DailySummary>(
        r#"
        SELECT date, avg_temperature, min_temperature, max_temperature,
               avg_humidity, min_humidity, max_humidity,
               reading_count, pump_on_count
        FROM daily_sensor_summary
        WHERE date >= CURRENT_DATE - $1::int
        ORDER BY date DESC
        "#,
    )
    .bind(days as i32)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// All rows between the given bounds inclusive, oldest first. Bounds
/// arrive as date strings and are cast by the server, so a bare date
/// means midnight at the start of that day.
pub async fn export_range(pool: &PgPool, start: &str, end: &str) -> Result<Vec<SensorReading>> {
    let rows = sqlx::query_as::<_, SensorReading>(
        r#"
        SELECT id, temperature, humidity, pump_status, mode, setpoint, recorded_at
        FROM sensor_readings
        WHERE recorded_at BETWEEN $1::timestamptz AND $2::timestamptz
        ORDER BY recorded_at ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Invoke the retention routine. Safe to call repeatedly; an already
/// clean dataset is a no-op.
pub async fn cleanup_old_data(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT cleanup_old_data()").execute(pool).await?;
    Ok(())
}
