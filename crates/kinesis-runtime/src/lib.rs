//! `kinesis-runtime` – gesture recognition and the streaming engine.
//!
//! # Modules
//!
//! - [`recognizer`] – [`GestureRecognizer`][recognizer::GestureRecognizer]:
//!   nearest-template matching (normalise → weighted DTW → minimum) over a
//!   copy-on-write template database.
//! - [`session`] – [`CaptureSession`][session::CaptureSession]: the
//!   `Idle → Capturing → (Completed | Aborted)` capture state machine with a
//!   bounded frame buffer.
//! - [`single_flight`] – [`SingleFlight`][single_flight::SingleFlight]:
//!   rejects a second match while one is still running.
//! - [`engine`] – [`MotionEngine`][engine::MotionEngine]: frame intake,
//!   capture control and background match scheduling, publishing to the
//!   event bus.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: console
//!   logging plus optional OTLP span export.

pub mod engine;
pub mod recognizer;
pub mod session;
pub mod single_flight;
pub mod telemetry;

pub use engine::{EngineConfig, MatchHandle, MotionEngine};
pub use recognizer::{GestureRecognizer, recognize};
pub use session::{CaptureSession, CaptureState, DEFAULT_MAX_CAPTURE_FRAMES};
pub use single_flight::{FlightPermit, SingleFlight};
pub use telemetry::{TracerProviderGuard, init_tracing};
