use crate::inbox::Inbox;
use crate::model::Reading;
use chrono::Utc;
use tracing::debug;

/// The reading currently on screen. Owned by the render loop alone.
#[derive(Debug, Clone)]
pub struct Snapshot {
    current: Reading,
    live: bool,
}

impl Snapshot {
    pub fn new() -> Self {
        Self {
            current: Reading::sentinel(Utc::now()),
            live: false,
        }
    }

    pub fn current(&self) -> &Reading {
        &self.current
    }

    /// Whether any reading from the feed has been applied yet.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Replaces the current reading with the newest of `drained`.
    ///
    /// Older entries are discarded rather than merged. The displayed arrival
    /// time never moves backwards, even if the wall clock stepped back between
    /// two readings. Returns whether the snapshot changed.
    pub fn apply(&mut self, drained: Vec<Reading>) -> bool {
        let count = drained.len();
        let Some(mut latest) = drained.into_iter().last() else {
            return false;
        };

        if count > 1 {
            debug!("Skipped {} superseded readings", count - 1);
        }
        if self.live && latest.received_at < self.current.received_at {
            debug!(
                "Arrival time {} precedes {}, keeping the later one",
                latest.received_at, self.current.received_at
            );
            latest.received_at = self.current.received_at;
        }

        self.current = latest;
        self.live = true;
        true
    }

    /// Drains `inbox` and applies what came out.
    pub fn refresh(&mut self, inbox: &Inbox) -> bool {
        self.apply(inbox.drain_all())
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn reading(label: &str, pm25: f64) -> Reading {
        let mut r = Reading::sentinel(Utc::now());
        r.label = label.to_string();
        r.pm25 = pm25;
        r
    }

    #[test]
    fn test_starts_with_sentinel() {
        let snapshot = Snapshot::new();
        assert!(!snapshot.is_live());
        assert_eq!(snapshot.current().label, crate::model::CONNECTING_LABEL);
    }

    #[test]
    fn test_empty_drain_keeps_current() {
        let inbox = Inbox::new();
        let mut snapshot = Snapshot::new();
        inbox.push(reading("BAIK", 10.0));
        assert!(snapshot.refresh(&inbox));

        assert!(!snapshot.refresh(&inbox));
        assert_eq!(snapshot.current().label, "BAIK");
        assert!(snapshot.is_live());
    }

    #[test]
    fn test_last_reading_wins_without_merge() {
        let inbox = Inbox::new();
        let mut snapshot = Snapshot::new();

        let mut first = reading("BAIK", 10.0);
        first.so2 = Some(4.0);
        inbox.push(first);
        inbox.push(reading("TIDAK SEHAT", 90.0));

        assert!(snapshot.refresh(&inbox));
        assert_eq!(snapshot.current().label, "TIDAK SEHAT");
        assert_eq!(snapshot.current().pm25, 90.0);
        assert_eq!(snapshot.current().so2, None);
    }

    #[test]
    fn test_arrival_time_never_goes_backwards() {
        let mut snapshot = Snapshot::new();
        let first = reading("BAIK", 10.0);
        let shown_at = first.received_at;
        snapshot.apply(vec![first]);

        let mut stale_clock = reading("SEDANG", 40.0);
        stale_clock.received_at = shown_at - Duration::seconds(60);
        assert!(snapshot.apply(vec![stale_clock]));

        assert_eq!(snapshot.current().label, "SEDANG");
        assert_eq!(snapshot.current().received_at, shown_at);
    }

    #[test]
    fn test_connecting_label_from_feed_is_live() {
        let mut snapshot = Snapshot::new();
        snapshot.apply(vec![reading(crate::model::CONNECTING_LABEL, 5.0)]);
        assert!(snapshot.is_live());
        assert_eq!(snapshot.current().pm25, 5.0);
    }
}
