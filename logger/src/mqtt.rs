use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS, Transport};
use tracing::{debug, error, info, warn};

use crate::metrics::MESSAGES_TOTAL;
use crate::state::LoggerState;

const TOPIC_TEMPERATURE: &str = "greenhouse/dht22/temperature";
const TOPIC_HUMIDITY: &str = "greenhouse/dht22/humidity";
const TOPIC_PUMP_STATUS: &str = "greenhouse/pump/status";
const TOPIC_MODE: &str = "greenhouse/mode";
const TOPIC_SETPOINT: &str = "greenhouse/setpoint";
const TOPIC_LOGGER_STATUS: &str = "greenhouse/logger/status";

const SUBSCRIBE_TOPICS: [&str; 5] = [
    TOPIC_TEMPERATURE,
    TOPIC_HUMIDITY,
    TOPIC_PUMP_STATUS,
    TOPIC_MODE,
    TOPIC_SETPOINT,
];

/// Held between reconnect attempts after an event-loop error; rumqttc
/// retries the connection on the next poll.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Build the broker client: TLS transport (unless disabled for a local
/// broker) with username/password credentials, 60s keepalive, clean
/// session.
pub fn client(
    host: &str,
    port: u16,
    username: &str,
    password: &str,
    tls: bool,
) -> (AsyncClient, EventLoop) {
    let client_id = format!("greenhouse-logger-{}", uuid::Uuid::new_v4());

    let mut options = MqttOptions::new(client_id, host, port);
    if tls {
        options.set_transport(Transport::tls_with_default_config());
    }
    if !username.is_empty() {
        options.set_credentials(username, password);
    }
    options.set_keep_alive(Duration::from_secs(60));
    options.set_clean_session(true);

    AsyncClient::new(options, 100)
}

/// Drive the event loop forever: resubscribe and announce ourselves on
/// every connect, dispatch inbound messages into `state`, and keep the
/// connectivity flag current across drops.
pub async fn run(client: AsyncClient, mut eventloop: EventLoop, state: LoggerState) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("Connected to MQTT broker");
                state.set_connected(true).await;

                for topic in SUBSCRIBE_TOPICS {
                    match client.subscribe(topic, QoS::AtLeastOnce).await {
                        Ok(()) => info!("Subscribed to {}", topic),
                        Err(e) => error!("Error subscribing to {}: {}", topic, e),
                    }
                }

                // Retained, so dashboards see "online" as soon as they attach.
                if let Err(e) = client
                    .publish(TOPIC_LOGGER_STATUS, QoS::AtLeastOnce, true, "online")
                    .await
                {
                    error!("Failed to publish online status: {}", e);
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                MESSAGES_TOTAL.inc();
                let payload = String::from_utf8_lossy(&publish.payload).into_owned();
                debug!("Received: {} = {}", publish.topic, payload);
                handle_message(&state, &publish.topic, &payload).await;
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                warn!("MQTT client disconnected");
                state.set_connected(false).await;
            }
            Ok(_) => {}
            Err(e) => {
                error!("MQTT connection error: {}", e);
                state.set_connected(false).await;
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

/// Latest-value-wins: each topic overwrites only its own field.
async fn handle_message(state: &LoggerState, topic: &str, payload: &str) {
    match topic {
        TOPIC_TEMPERATURE => state.set_temperature(parse_float(payload)).await,
        TOPIC_HUMIDITY => state.set_humidity(parse_float(payload)).await,
        TOPIC_PUMP_STATUS => state.set_pump_status(parse_bool(payload)).await,
        TOPIC_MODE => state.set_mode(payload.to_string()).await,
        TOPIC_SETPOINT => match payload.trim().parse::<i32>() {
            Ok(value) => state.set_setpoint(value).await,
            Err(_) => warn!("Ignoring non-integer setpoint payload: {:?}", payload),
        },
        other => debug!("Message on unexpected topic {}", other),
    }
}

/// Malformed numeric payloads become NaN rather than being rejected.
fn parse_float(payload: &str) -> f64 {
    payload.trim().parse().unwrap_or(f64::NAN)
}

/// The pump reports "1"/"0", older firmware "true"/"false" in any case.
fn parse_bool(payload: &str) -> bool {
    payload == "1" || payload.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pump_status_payload_parsing() {
        tokio_test::block_on(async {
            let state = LoggerState::new(300);

            handle_message(&state, TOPIC_PUMP_STATUS, "1").await;
            assert!(state.snapshot().await.pump_status);

            handle_message(&state, TOPIC_PUMP_STATUS, "0").await;
            assert!(!state.snapshot().await.pump_status);

            handle_message(&state, TOPIC_PUMP_STATUS, "True").await;
            assert!(state.snapshot().await.pump_status);

            handle_message(&state, TOPIC_PUMP_STATUS, "off").await;
            assert!(!state.snapshot().await.pump_status);
        });
    }

    #[test]
    fn temperature_and_humidity_parse_as_floats() {
        tokio_test::block_on(async {
            let state = LoggerState::new(300);

            handle_message(&state, TOPIC_TEMPERATURE, "26.4").await;
            handle_message(&state, TOPIC_HUMIDITY, "71").await;

            let reading = state.snapshot().await;
            assert_eq!(reading.temperature, Some(26.4));
            assert_eq!(reading.humidity, Some(71.0));
        });
    }

    #[test]
    fn malformed_float_payload_is_stored_as_nan() {
        tokio_test::block_on(async {
            let state = LoggerState::new(300);

            handle_message(&state, TOPIC_TEMPERATURE, "garbage").await;

            let reading = state.snapshot().await;
            assert!(reading.temperature.unwrap().is_nan());
        });
    }

    #[test]
    fn mode_is_stored_raw_and_setpoint_parses_as_integer() {
        tokio_test::block_on(async {
            let state = LoggerState::new(300);

            handle_message(&state, TOPIC_MODE, "manual").await;
            handle_message(&state, TOPIC_SETPOINT, "80").await;

            let reading = state.snapshot().await;
            assert_eq!(reading.mode, "manual");
            assert_eq!(reading.setpoint, 80);
        });
    }

    #[test]
    fn bad_setpoint_payload_keeps_previous_value() {
        tokio_test::block_on(async {
            let state = LoggerState::new(300);

            handle_message(&state, TOPIC_SETPOINT, "78").await;
            handle_message(&state, TOPIC_SETPOINT, "not-a-number").await;

            assert_eq!(state.snapshot().await.setpoint, 78);
        });
    }

    #[test]
    fn unexpected_topic_leaves_state_untouched() {
        tokio_test::block_on(async {
            let state = LoggerState::new(300);

            handle_message(&state, "greenhouse/unknown", "42").await;

            let reading = state.snapshot().await;
            assert!(reading.temperature.is_none());
            assert!(reading.humidity.is_none());
        });
    }
}
