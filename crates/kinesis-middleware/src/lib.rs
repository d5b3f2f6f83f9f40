//! `kinesis-middleware` – event delivery.
//!
//! Carries results out of the engine without coupling it to whoever is
//! listening (UI, logger, exporter).
//!
//! # Modules
//!
//! - [`bus`] – Headless, typed, topic-based publish/subscribe event bus built
//!   on Tokio broadcast channels.

pub mod bus;

pub use bus::{EventBus, Topic, TopicReceiver, DEFAULT_CAPACITY};
