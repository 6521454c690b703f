use anyhow::Context;
use clap::Parser;
use dashboard::config::Config;
use dashboard::inbox::Inbox;
use dashboard::lifecycle::{FeedService, MqttConnector};
use dashboard::metrics;
use dashboard::render::Dashboard;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize logging; stdout belongs to the dashboard
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting Air Watch dashboard");
    info!("MQTT broker: {}:{}", config.broker, config.port);
    info!("Topic: {}", config.topic);

    metrics::init_metrics().context("failed to register metrics")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("airwatch-feed")
        .build()
        .context("failed to build tokio runtime")?;

    if let Some(addr) = config.metrics_addr {
        runtime.spawn(metrics::serve(addr));
    }

    info!("Inbox capacity: {}", config.inbox_capacity);
    let inbox = Inbox::with_capacity(config.inbox_capacity);

    let feed = FeedService::new(
        MqttConnector::new(config.broker(), runtime.handle().clone()),
        inbox.clone(),
    );
    let handle = feed.start().context("failed to start feed listener")?;
    info!("Feed listener running as {}", handle.client_id);

    // The runtime and feed handle stay alive for as long as the loop runs.
    let _runtime = runtime;
    let _feed = feed;
    Dashboard::new(inbox, config.display(), std::io::stdout()).run()
}
