mod payload;

use clap::Parser;
use rand::Rng;
use rumqttc::{AsyncClient, MqttOptions, QoS};
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "simulator",
    version,
    about = "Publishes synthetic air-quality readings for the dashboard"
)]
struct Args {
    /// MQTT broker host
    #[arg(long, env = "MQTT_BROKER", default_value = "localhost")]
    broker: String,

    /// MQTT broker port
    #[arg(long, env = "MQTT_PORT", default_value_t = 1883)]
    port: u16,

    /// Topic to publish readings on
    #[arg(
        long,
        env = "MQTT_TOPIC",
        default_value = "project/tralalilo_trolia/sensor"
    )]
    topic: String,

    /// Milliseconds between readings
    #[arg(long, env = "INTERVAL_MS", default_value_t = 2000)]
    interval_ms: u64,

    /// Share of messages sent deliberately malformed (0.0 - 1.0)
    #[arg(long, env = "MALFORMED_RATIO", default_value_t = 0.0)]
    malformed_ratio: f64,

    /// Stop after this many messages (runs forever when unset)
    #[arg(long, env = "COUNT")]
    count: Option<u64>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt::init();

    info!("Starting air-quality simulator");
    info!(
        "Broker: {}:{}, Topic: {}, Interval: {}ms",
        args.broker, args.port, args.topic, args.interval_ms
    );

    let client_id = format!("sim-{}", uuid::Uuid::new_v4());

    let mut mqtt_options = MqttOptions::new(&client_id, &args.broker, args.port);
    mqtt_options.set_keep_alive(Duration::from_secs(30));
    mqtt_options.set_clean_session(true);

    let (client, mut eventloop) = AsyncClient::new(mqtt_options, 100);

    // Spawn eventloop handler
    tokio::spawn(async move {
        loop {
            if let Err(e) = eventloop.poll().await {
                error!("MQTT eventloop error: {}", e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    });

    let malformed_ratio = args.malformed_ratio.clamp(0.0, 1.0);
    let mut ticker = tokio::time::interval(Duration::from_millis(args.interval_ms.max(1)));
    let mut sent = 0u64;

    loop {
        ticker.tick().await;

        if args.count.is_some_and(|limit| sent >= limit) {
            break;
        }

        let body = {
            let mut rng = rand::thread_rng();
            if rng.gen_bool(malformed_ratio) {
                warn!("Publishing malformed payload");
                payload::malformed(&mut rng)
            } else {
                let reading = payload::generate(&mut rng);
                match serde_json::to_string(&reading) {
                    Ok(p) => {
                        info!(
                            "{} (pm25={}, score={})",
                            reading.ai_label, reading.pm25, reading.ai_score
                        );
                        p
                    }
                    Err(e) => {
                        error!("Failed to serialize reading: {}", e);
                        continue;
                    }
                }
            }
        };

        match client
            .publish(args.topic.as_str(), QoS::AtLeastOnce, false, body)
            .await
        {
            Ok(_) => sent += 1,
            Err(e) => warn!("Failed to publish: {}", e),
        }
    }

    info!("Published {} messages", sent);
    // Let queued publishes flush before exiting
    tokio::time::sleep(Duration::from_millis(500)).await;
}
