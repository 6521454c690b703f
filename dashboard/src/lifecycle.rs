use crate::config::BrokerConfig;
use crate::errors::Result;
use crate::feed::{build_client, run_feed, Backoff, Connectivity};
use crate::inbox::Inbox;
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::info;

/// Opens the feed connection and starts delivering readings into an inbox.
pub trait Connector {
    type Handle: Send + Sync;

    fn connect(&self, inbox: Inbox) -> Result<Self::Handle>;
}

/// Owns the one feed connection of the process.
///
/// `start` connects on the first call and hands out the same handle on every
/// call after that.
pub struct FeedService<C: Connector> {
    connector: C,
    inbox: Inbox,
    handle: Mutex<Option<Arc<C::Handle>>>,
}

impl<C: Connector> FeedService<C> {
    pub fn new(connector: C, inbox: Inbox) -> Self {
        Self {
            connector,
            inbox,
            handle: Mutex::new(None),
        }
    }

    pub fn start(&self) -> Result<Arc<C::Handle>> {
        let mut slot = self.handle.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = slot.as_ref() {
            return Ok(Arc::clone(handle));
        }

        let handle = Arc::new(self.connector.connect(self.inbox.clone())?);
        *slot = Some(Arc::clone(&handle));
        Ok(handle)
    }
}

/// A live MQTT feed. Dropping it does not stop the listener task; the
/// connection ends with the process.
pub struct FeedHandle {
    pub client_id: String,
    pub connectivity: Connectivity,
    pub task: JoinHandle<()>,
}

pub struct MqttConnector {
    config: BrokerConfig,
    runtime: Handle,
}

impl MqttConnector {
    pub fn new(config: BrokerConfig, runtime: Handle) -> Self {
        Self { config, runtime }
    }
}

impl Connector for MqttConnector {
    type Handle = FeedHandle;

    fn connect(&self, inbox: Inbox) -> Result<FeedHandle> {
        let client_id = format!("airwatch-{}", uuid::Uuid::new_v4());
        info!("Starting feed listener as {}", client_id);

        let (client, eventloop) = build_client(&self.config, &client_id);
        let connectivity = Connectivity::default();
        let backoff = Backoff::new(self.config.reconnect_initial, self.config.reconnect_max);

        let task = self.runtime.spawn(run_feed(
            client,
            eventloop,
            self.config.topic.clone(),
            inbox,
            connectivity.clone(),
            backoff,
        ));

        Ok(FeedHandle {
            client_id,
            connectivity,
            task,
        })
    }
}
