//! Headless, typed, topic-based publish/subscribe event bus.
//!
//! Uses [`tokio::sync::broadcast`] channels under the hood so that every
//! subscriber receives every message without any single subscriber blocking
//! the others.  Publishing never blocks, so it is safe to call from the
//! sensor's frame callback.
//!
//! # Topics
//!
//! | Topic | Typical traffic |
//! |---|---|
//! | [`Topic::Kinematics`] | Per-frame joint status snapshots (~30 Hz) |
//! | [`Topic::Recognition`] | Match results and match failures |
//! | [`Topic::SystemAlerts`] | Aborted captures, sensor disconnects |

use kinesis_types::{Event, EventPayload};
use tokio::sync::broadcast;
use tracing::{trace, warn};

/// Default channel capacity (number of buffered events before old ones are
/// dropped for slow subscribers).
pub const DEFAULT_CAPACITY: usize = 256;

/// Enumeration of all routing topics on the event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// High-frequency joint status snapshots.
    Kinematics,
    /// Low-frequency gesture match outcomes.
    Recognition,
    /// Session-level alerts: aborted captures, lost sensor.
    SystemAlerts,
}

impl Topic {
    /// The topic a payload is normally routed to.
    pub fn for_payload(payload: &EventPayload) -> Self {
        match payload {
            EventPayload::Kinematics(_) => Topic::Kinematics,
            EventPayload::MatchCompleted(_) | EventPayload::MatchFailed(_) => Topic::Recognition,
            EventPayload::CaptureAborted { .. } => Topic::SystemAlerts,
        }
    }
}

/// Shared event bus. Clone it cheaply – all clones share the same underlying
/// broadcast channels.
#[derive(Clone, Debug)]
pub struct EventBus {
    kinematics: broadcast::Sender<Event>,
    recognition: broadcast::Sender<Event>,
    system_alerts: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new bus with the given channel capacity.
    ///
    /// The `capacity` is applied to every topic channel independently and
    /// clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (kinematics, _) = broadcast::channel(capacity);
        let (recognition, _) = broadcast::channel(capacity);
        let (system_alerts, _) = broadcast::channel(capacity);
        Self {
            kinematics,
            recognition,
            system_alerts,
        }
    }

    /// Publish `event` to the given [`Topic`] channel.
    ///
    /// Returns the number of active receivers that were handed the event.
    /// Having no subscribers is a normal condition and yields `0`.
    pub fn publish_to(&self, topic: Topic, event: Event) -> usize {
        match self.topic_sender(topic).send(event) {
            Ok(n) => n,
            Err(broadcast::error::SendError(event)) => {
                trace!(?topic, id = %event.id, "no subscribers; event dropped");
                0
            }
        }
    }

    /// Wrap `payload` in an [`Event`] and publish it to its natural topic.
    pub fn emit(&self, source: &str, payload: EventPayload) -> usize {
        let topic = Topic::for_payload(&payload);
        self.publish_to(topic, Event::new(source, payload))
    }

    /// Subscribe to a specific [`Topic`] channel.
    pub fn subscribe_to(&self, topic: Topic) -> TopicReceiver {
        TopicReceiver {
            topic,
            receiver: self.topic_sender(topic).subscribe(),
        }
    }

    /// Number of live subscribers on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topic_sender(topic).receiver_count()
    }

    fn topic_sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Kinematics => &self.kinematics,
            Topic::Recognition => &self.recognition,
            Topic::SystemAlerts => &self.system_alerts,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Topic-based receiver
// ---------------------------------------------------------------------------

/// A receiver bound to a single [`Topic`] channel.
///
/// Obtained via [`EventBus::subscribe_to`].
pub struct TopicReceiver {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl TopicReceiver {
    /// Wait for the next event on this topic.
    ///
    /// Returns:
    /// * `Ok(event)` – a successfully received event.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` messages were dropped.  The caller decides whether to
    ///   continue or abort.
    /// * `Err(broadcast::error::RecvError::Closed)` – the bus has shut down.
    pub async fn recv(&mut self) -> Result<Event, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Wait for the next event, skipping over lag gaps.
    ///
    /// Returns `None` once the bus is closed.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(topic = ?self.topic, lagged_by = n, "TopicReceiver lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking poll for an already-buffered event.
    pub fn try_recv(&mut self) -> Result<Event, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// The [`Topic`] this receiver is bound to.
    pub fn topic(&self) -> Topic {
        self.topic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinesis_types::{Joint, JointReading, StatusSnapshot};

    fn kinematics_event(ts: f64) -> Event {
        Event::new(
            "kinesis-runtime::engine",
            EventPayload::Kinematics(StatusSnapshot {
                timestamp: ts,
                readings: vec![JointReading {
                    joint: Joint::HandRight,
                    position: None,
                    velocity: None,
                    speed: Some(0.4),
                }],
            }),
        )
    }

    #[test]
    fn publish_without_subscribers_returns_zero() {
        let bus = EventBus::default();
        assert_eq!(bus.publish_to(Topic::Kinematics, kinematics_event(0.0)), 0);
    }

    #[test]
    fn payloads_route_to_their_topic() {
        let snapshot = EventPayload::Kinematics(StatusSnapshot::default());
        assert_eq!(Topic::for_payload(&snapshot), Topic::Kinematics);
        let failed = EventPayload::MatchFailed(kinesis_types::KinesisError::NotFound("x".into()));
        assert_eq!(Topic::for_payload(&failed), Topic::Recognition);
        let aborted = EventPayload::CaptureAborted {
            frames_discarded: 3,
            reason: "sensor lost".into(),
        };
        assert_eq!(Topic::for_payload(&aborted), Topic::SystemAlerts);
    }

    /// Two independent subscribers on the same topic both receive the event.
    #[tokio::test]
    async fn topic_multiple_subscribers_receive_same_event() -> Result<(), Box<dyn std::error::Error>> {
        let bus = EventBus::default();
        let mut subscriber1 = bus.subscribe_to(Topic::Kinematics);
        let mut subscriber2 = bus.subscribe_to(Topic::Kinematics);

        let event = kinematics_event(1.0);
        assert_eq!(bus.publish_to(Topic::Kinematics, event.clone()), 2);

        assert_eq!(subscriber1.recv().await?.id, event.id, "subscriber 1 got wrong event");
        assert_eq!(subscriber2.recv().await?.id, event.id, "subscriber 2 got wrong event");
        Ok(())
    }

    /// A subscriber on `Recognition` must not receive events published to
    /// `Kinematics` because they are routed through separate channels.
    #[tokio::test]
    async fn topic_subscriber_does_not_receive_other_topic_events() {
        let bus = EventBus::default();
        let mut results = bus.subscribe_to(Topic::Recognition);

        bus.emit("test", EventPayload::Kinematics(StatusSnapshot::default()));

        let result =
            tokio::time::timeout(std::time::Duration::from_millis(50), results.recv()).await;
        assert!(result.is_err(), "Recognition subscriber must not receive a Kinematics event");
    }

    #[test]
    fn try_recv_sees_buffered_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe_to(Topic::SystemAlerts);
        assert!(rx.try_recv().is_err());

        bus.emit(
            "test",
            EventPayload::CaptureAborted {
                frames_discarded: 0,
                reason: "test".into(),
            },
        );
        let event = rx.try_recv().expect("buffered event");
        assert!(matches!(event.payload, EventPayload::CaptureAborted { .. }));
        assert_eq!(rx.topic(), Topic::SystemAlerts);
    }

    /// Flooding a low-capacity channel while a subscriber sleeps must produce
    /// a `Lagged` error rather than panicking or blocking.
    #[tokio::test]
    async fn topic_channel_lag_on_slow_subscriber() {
        let bus = EventBus::new(8);
        let mut slow_sub = bus.subscribe_to(Topic::Kinematics);

        for i in 0..100 {
            bus.publish_to(Topic::Kinematics, kinematics_event(i as f64));
        }

        let result = slow_sub.recv().await;
        assert!(
            matches!(result, Err(broadcast::error::RecvError::Lagged(_))),
            "expected Lagged error, got: {result:?}"
        );
    }

    #[tokio::test]
    async fn next_skips_lag_and_returns_latest() {
        let bus = EventBus::new(4);
        let mut sub = bus.subscribe_to(Topic::Kinematics);
        for i in 0..10 {
            bus.publish_to(Topic::Kinematics, kinematics_event(i as f64));
        }
        let event = sub.next().await.expect("event after lag");
        match event.payload {
            EventPayload::Kinematics(s) => assert_eq!(s.timestamp, 6.0),
            _ => panic!("unexpected variant"),
        }
    }
}
