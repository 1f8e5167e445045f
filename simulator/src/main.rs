use std::time::Duration;

use clap::Parser;
use rand::Rng;
use rumqttc::{AsyncClient, MqttOptions, QoS, Transport};
use tracing::{error, info, warn};

/// Publishes fake greenhouse sensor readings for end-to-end testing.
#[derive(Parser, Debug)]
#[command(name = "simulator")]
struct Args {
    #[arg(long, env = "MQTT_HOST", default_value = "localhost")]
    host: String,

    #[arg(long, env = "MQTT_PORT", default_value_t = 8883)]
    port: u16,

    #[arg(long, env = "MQTT_USERNAME", default_value = "")]
    username: String,

    #[arg(long, env = "MQTT_PASSWORD", default_value = "")]
    password: String,

    /// Seconds between publish rounds
    #[arg(long, default_value_t = 10)]
    interval: u64,

    /// Disable TLS, for plain local brokers
    #[arg(long)]
    insecure: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting greenhouse simulator");
    info!(
        "Broker: {}:{}, publishing every {}s",
        args.host, args.port, args.interval
    );

    let mut rng = rand::thread_rng();
    let client_id = format!("greenhouse-sim-{}", rng.gen::<u32>());

    let mut options = MqttOptions::new(&client_id, &args.host, args.port);
    options.set_keep_alive(Duration::from_secs(30));
    options.set_clean_session(true);
    if !args.insecure {
        options.set_transport(Transport::tls_with_default_config());
    }
    if !args.username.is_empty() {
        options.set_credentials(&args.username, &args.password);
    }

    let (client, mut eventloop) = AsyncClient::new(options, 100);

    // Spawn eventloop handler
    tokio::spawn(async move {
        loop {
            if let Err(e) = eventloop.poll().await {
                error!("MQTT eventloop error: {}", e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    });

    tokio::time::sleep(Duration::from_secs(2)).await;
    info!("Connected to MQTT broker, publishing sensor values");

    let mut pump_on = false;
    let mut ticker = tokio::time::interval(Duration::from_secs(args.interval));

    loop {
        ticker.tick().await;

        let temperature: f64 = rng.gen_range(22.0..34.0);
        let humidity: f64 = rng.gen_range(45.0..90.0);

        publish(
            &client,
            "greenhouse/dht22/temperature",
            format!("{:.1}", temperature),
        )
        .await;
        publish(
            &client,
            "greenhouse/dht22/humidity",
            format!("{:.1}", humidity),
        )
        .await;

        // The pump toggles now and then, like the controller would.
        if rng.gen_bool(0.2) {
            pump_on = !pump_on;
            publish(
                &client,
                "greenhouse/pump/status",
                if pump_on { "1" } else { "0" }.to_string(),
            )
            .await;
        }

        if rng.gen_bool(0.05) {
            publish(
                &client,
                "greenhouse/setpoint",
                rng.gen_range(70..80).to_string(),
            )
            .await;
        }

        if rng.gen_bool(0.02) {
            let mode = if rng.gen_bool(0.5) { "auto" } else { "manual" };
            publish(&client, "greenhouse/mode", mode.to_string()).await;
        }
    }
}

async fn publish(client: &AsyncClient, topic: &str, payload: String) {
    match client.publish(topic, QoS::AtLeastOnce, false, payload.clone()).await {
        Ok(()) => info!("Published {} = {}", topic, payload),
        Err(e) => warn!("Failed to publish {}: {}", topic, e),
    }
}
