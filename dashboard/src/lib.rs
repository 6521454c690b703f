//! Live air-quality dashboard.
//!
//! A feed listener task decodes MQTT sensor reports into an [`inbox::Inbox`];
//! a synchronous render loop drains it once per cycle into its own
//! [`snapshot::Snapshot`] and redraws the terminal page.

pub mod classify;
pub mod config;
pub mod errors;
pub mod feed;
pub mod inbox;
pub mod lifecycle;
pub mod metrics;
pub mod model;
pub mod render;
pub mod snapshot;
pub mod validate;
