use crate::config::BrokerConfig;
use crate::errors::{Error, Result};
use crate::inbox::Inbox;
use crate::metrics::{
    BROKER_CONNECTED, INVALID_MESSAGES_TOTAL, MESSAGES_TOTAL, RECONNECT_WAITS_TOTAL,
    VALID_MESSAGES_TOTAL,
};
use crate::model::{Reading, SensorPayload};
use crate::validate::validate;
use chrono::{DateTime, Utc};
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, NetworkOptions, Packet, QoS,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// Exponential wait between reconnect attempts.
#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// Returns the wait to use now and doubles the next one, up to the cap.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

/// Shared view of whether the broker session is currently up.
#[derive(Debug, Clone, Default)]
pub struct Connectivity(Arc<AtomicBool>);

impl Connectivity {
    pub fn is_connected(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self, connected: bool) {
        let was = self.0.swap(connected, Ordering::AcqRel);
        BROKER_CONNECTED.set(if connected { 1.0 } else { 0.0 });
        if was != connected {
            if connected {
                info!("Broker connection established");
            } else {
                warn!("Broker connection lost");
            }
        }
    }
}

pub fn mqtt_options(config: &BrokerConfig, client_id: &str) -> MqttOptions {
    let mut mqtt_options = MqttOptions::new(client_id, config.host.clone(), config.port);
    mqtt_options.set_keep_alive(config.keep_alive);
    // Subscriptions are re-issued on every CONNACK, so no broker-side session is kept.
    mqtt_options.set_clean_session(true);
    mqtt_options
}

/// Builds the client and its event loop without touching the network.
pub fn build_client(config: &BrokerConfig, client_id: &str) -> (AsyncClient, EventLoop) {
    let (client, mut eventloop) =
        AsyncClient::new(mqtt_options(config, client_id), REQUEST_CHANNEL_CAPACITY);

    let mut network_options = NetworkOptions::new();
    network_options.set_connection_timeout(config.connect_timeout.as_secs().max(1));
    eventloop.set_network_options(network_options);

    (client, eventloop)
}

/// Drives the broker connection for the lifetime of the process.
///
/// Every publish on the subscribed topic is decoded and queued into `inbox`.
/// Bad payloads and connection errors are logged here and never leave this task.
pub async fn run_feed(
    client: AsyncClient,
    mut eventloop: EventLoop,
    topic: String,
    inbox: Inbox,
    connectivity: Connectivity,
    mut backoff: Backoff,
) {
    info!(
        "Connecting to MQTT broker at {}:{}",
        eventloop.mqtt_options.broker_address().0,
        eventloop.mqtt_options.broker_address().1
    );

    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    connectivity.set(true);
                    backoff.reset();
                    match subscribe(&client, &topic) {
                        Ok(()) => info!("Subscribed to {}", topic),
                        Err(e) => error!("Failed to subscribe to {}: {}", topic, e),
                    }
                } else {
                    warn!("Broker refused connection: {:?}", ack.code);
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                debug!("Subscription acknowledged: {:?}", suback.return_codes);
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                debug!(
                    "Received message on topic {}, size: {} bytes",
                    publish.topic,
                    publish.payload.len()
                );

                if let Err(e) = process_message(&publish.payload, &inbox, Utc::now()) {
                    warn!("Dropped message from {}: {}", publish.topic, e);
                }
            }
            Ok(_) => {}
            Err(e) => {
                connectivity.set(false);
                let delay = backoff.next_delay();
                RECONNECT_WAITS_TOTAL.inc();
                error!(
                    "MQTT error: {}. Reconnecting in {}ms",
                    Error::Connection(e),
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Queues a SUBSCRIBE without waiting on the event loop that is polling it.
fn subscribe(client: &AsyncClient, topic: &str) -> Result<()> {
    client
        .try_subscribe(topic, QoS::AtMostOnce)
        .map_err(Error::Mqtt)
}

/// Decodes one raw payload into a reading stamped with `received_at`.
pub fn decode(payload: &[u8], received_at: DateTime<Utc>) -> Result<Reading> {
    let payload = serde_json::from_slice::<SensorPayload>(payload)?;
    validate(&payload)?;
    Ok(Reading::from_payload(payload, received_at))
}

/// Decodes and queues a single message. Failed payloads are counted and reported
/// to the caller but never queued.
pub fn process_message(payload: &[u8], inbox: &Inbox, received_at: DateTime<Utc>) -> Result<()> {
    MESSAGES_TOTAL.inc();

    match decode(payload, received_at) {
        Ok(reading) => {
            inbox.push(reading);
            VALID_MESSAGES_TOTAL.inc();
            Ok(())
        }
        Err(e) => {
            INVALID_MESSAGES_TOTAL.inc();
            Err(e)
        }
    }
}
