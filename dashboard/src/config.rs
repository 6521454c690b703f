use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_LATITUDE: f64 = -6.249526003104378;
pub const DEFAULT_LONGITUDE: f64 = 107.01397242039592;
pub const DEFAULT_SITE_NAME: &str = "Terminal Bekasi";
pub const DEFAULT_REFRESH_SECS: u64 = 3;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "airwatch",
    version,
    about = "Live air-quality dashboard fed by an MQTT sensor topic"
)]
pub struct Config {
    /// MQTT broker host
    #[arg(long, env = "MQTT_BROKER", default_value = "broker.hivemq.com")]
    pub broker: String,

    /// MQTT broker port
    #[arg(long, env = "MQTT_PORT", default_value_t = 1883)]
    pub port: u16,

    /// Topic the sensor publishes readings to
    #[arg(
        long,
        env = "MQTT_TOPIC",
        default_value = "project/tralalilo_trolia/sensor"
    )]
    pub topic: String,

    /// MQTT keep-alive interval
    #[arg(long, env = "MQTT_KEEP_ALIVE_SECS", default_value_t = 60, value_name = "SECONDS")]
    pub keep_alive_secs: u64,

    /// Timeout for a single connection attempt
    #[arg(long, env = "MQTT_CONNECT_TIMEOUT_SECS", default_value_t = 5, value_name = "SECONDS")]
    pub connect_timeout_secs: u64,

    /// First wait after a broker connection error
    #[arg(long, env = "RECONNECT_INITIAL_MS", default_value_t = 1000, value_name = "MILLIS")]
    pub reconnect_initial_ms: u64,

    /// Upper bound for the reconnect wait
    #[arg(long, env = "RECONNECT_MAX_MS", default_value_t = 30000, value_name = "MILLIS")]
    pub reconnect_max_ms: u64,

    /// Pause between dashboard redraws
    #[arg(long, env = "REFRESH_SECS", default_value_t = DEFAULT_REFRESH_SECS, value_name = "SECONDS")]
    pub refresh_secs: u64,

    /// Maximum readings held between redraws before the oldest are dropped
    #[arg(long, env = "INBOX_CAPACITY", default_value_t = crate::inbox::DEFAULT_CAPACITY)]
    pub inbox_capacity: usize,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9100)
    #[arg(long, env = "METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    /// Name of the monitoring site shown in the header
    #[arg(long, env = "SITE_NAME", default_value = DEFAULT_SITE_NAME)]
    pub site_name: String,

    /// Sensor latitude for the location map
    #[arg(long, env = "SITE_LAT", default_value_t = DEFAULT_LATITUDE, allow_negative_numbers = true)]
    pub latitude: f64,

    /// Sensor longitude for the location map
    #[arg(long, env = "SITE_LON", default_value_t = DEFAULT_LONGITUDE, allow_negative_numbers = true)]
    pub longitude: f64,

    /// Do not show the secondary pollutant panel
    #[arg(long, env = "HIDE_DETAILS")]
    pub hide_details: bool,
}

/// Everything the feed listener needs to reach the broker.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub keep_alive: Duration,
    pub connect_timeout: Duration,
    pub reconnect_initial: Duration,
    pub reconnect_max: Duration,
}

#[derive(Debug, Clone)]
pub struct DisplayConfig {
    pub site_name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub show_details: bool,
    pub refresh: Duration,
}

impl Config {
    pub fn broker(&self) -> BrokerConfig {
        BrokerConfig {
            host: self.broker.clone(),
            port: self.port,
            topic: self.topic.clone(),
            keep_alive: Duration::from_secs(self.keep_alive_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            reconnect_initial: Duration::from_millis(self.reconnect_initial_ms),
            reconnect_max: Duration::from_millis(self.reconnect_max_ms.max(self.reconnect_initial_ms)),
        }
    }

    pub fn display(&self) -> DisplayConfig {
        DisplayConfig {
            site_name: self.site_name.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            show_details: !self.hide_details,
            // At least one second between redraws.
            refresh: Duration::from_secs(self.refresh_secs.max(1)),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            site_name: DEFAULT_SITE_NAME.to_string(),
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            show_details: true,
            refresh: Duration::from_secs(DEFAULT_REFRESH_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["airwatch"]).unwrap();
        let broker = config.broker();
        assert_eq!(broker.host, "broker.hivemq.com");
        assert_eq!(broker.port, 1883);
        assert_eq!(broker.topic, "project/tralalilo_trolia/sensor");
        assert_eq!(broker.keep_alive, Duration::from_secs(60));

        let display = config.display();
        assert_eq!(display.refresh, Duration::from_secs(3));
        assert!(display.show_details);
        assert_eq!(display.latitude, DEFAULT_LATITUDE);
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "airwatch",
            "--broker",
            "localhost",
            "--topic",
            "lab/sensor",
            "--latitude",
            "-7.5",
            "--hide-details",
            "--metrics-addr",
            "127.0.0.1:9100",
        ])
        .unwrap();

        assert_eq!(config.broker().host, "localhost");
        assert_eq!(config.broker().topic, "lab/sensor");
        assert_eq!(config.display().latitude, -7.5);
        assert!(!config.display().show_details);
        assert_eq!(config.metrics_addr.unwrap().port(), 9100);
    }

    #[test]
    fn test_zero_refresh_is_raised_to_one_second() {
        let config = Config::try_parse_from(["airwatch", "--refresh-secs", "0"]).unwrap();
        assert_eq!(config.display().refresh, Duration::from_secs(1));
    }

    #[test]
    fn test_display_default_matches_cli_defaults() {
        let parsed = Config::try_parse_from(["airwatch"]).unwrap().display();
        let default = DisplayConfig::default();

        assert_eq!(parsed.site_name, default.site_name);
        assert_eq!(parsed.refresh, default.refresh);
        assert_eq!(parsed.latitude, default.latitude);
        assert_eq!(parsed.longitude, default.longitude);
        assert_eq!(parsed.show_details, default.show_details);
    }

    #[test]
    fn test_reconnect_max_never_below_initial() {
        let config = Config::try_parse_from([
            "airwatch",
            "--reconnect-initial-ms",
            "5000",
            "--reconnect-max-ms",
            "100",
        ])
        .unwrap();

        let broker = config.broker();
        assert_eq!(broker.reconnect_max, broker.reconnect_initial);
    }
}
