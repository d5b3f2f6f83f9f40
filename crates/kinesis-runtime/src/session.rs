//! [`CaptureSession`] – the capture state machine.
//!
//! ```text
//!          begin            end (≥ 1 frame)
//!   Idle ─────────► Capturing ───────────────► Completed
//!                      │
//!                      │ abort / sensor lost / end with 0 frames
//!                      ▼
//!                   Aborted
//! ```
//!
//! `Completed` and `Aborted` behave like `Idle`: a new capture may begin
//! from either.  The frame buffer is bounded; once full, the oldest frames
//! are evicted so the most recent `max_frames` frames form the gesture.

use std::collections::VecDeque;

use kinesis_types::{KinesisError, Pose, Sequence};
use tracing::{info, warn};

/// Default capture bound: ten seconds at 30 Hz.
pub const DEFAULT_MAX_CAPTURE_FRAMES: usize = 300;

/// Where the capture session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
    Completed,
    Aborted,
}

/// Buffers frames between "begin capture" and "end capture".
#[derive(Debug)]
pub struct CaptureSession {
    state: CaptureState,
    frames: VecDeque<Pose>,
    max_frames: usize,
    evicted: usize,
}

impl CaptureSession {
    /// `max_frames` is clamped to at least 1.
    pub fn new(max_frames: usize) -> Self {
        Self {
            state: CaptureState::Idle,
            frames: VecDeque::new(),
            max_frames: max_frames.max(1),
            evicted: 0,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_capturing(&self) -> bool {
        self.state == CaptureState::Capturing
    }

    /// Frames buffered so far in the current capture.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Start a new capture.
    ///
    /// # Errors
    ///
    /// [`KinesisError::InvalidInput`] when a capture is already running.
    pub fn begin(&mut self) -> Result<(), KinesisError> {
        if self.is_capturing() {
            return Err(KinesisError::InvalidInput(
                "capture already in progress".to_string(),
            ));
        }
        self.frames.clear();
        self.evicted = 0;
        self.state = CaptureState::Capturing;
        info!("capture started");
        Ok(())
    }

    /// Buffer a copy of `pose` if a capture is running.  Returns whether the
    /// frame was recorded.
    pub fn record(&mut self, pose: &Pose) -> bool {
        if !self.is_capturing() {
            return false;
        }
        self.frames.push_back(pose.clone());
        if self.frames.len() > self.max_frames {
            self.frames.pop_front();
            self.evicted += 1;
            if self.evicted == 1 {
                warn!(max_frames = self.max_frames, "capture buffer full; evicting oldest frames");
            }
        }
        true
    }

    /// Finish the capture and hand over its frames.
    ///
    /// # Errors
    ///
    /// [`KinesisError::InvalidInput`] when no capture is running, or when it
    /// recorded no frames (the session then moves to `Aborted`).
    pub fn end(&mut self) -> Result<Sequence, KinesisError> {
        if !self.is_capturing() {
            return Err(KinesisError::InvalidInput("no capture in progress".to_string()));
        }
        if self.frames.is_empty() {
            self.state = CaptureState::Aborted;
            return Err(KinesisError::InvalidInput(
                "capture ended with no frames".to_string(),
            ));
        }
        self.state = CaptureState::Completed;
        let sequence: Sequence = self.frames.drain(..).collect();
        info!(frames = sequence.len(), evicted = self.evicted, "capture completed");
        Ok(sequence)
    }

    /// Discard the running capture.  Returns how many frames were dropped;
    /// a no-op returning 0 when nothing is being captured.
    pub fn abort(&mut self) -> usize {
        if !self.is_capturing() {
            return 0;
        }
        let dropped = self.frames.len();
        self.frames.clear();
        self.state = CaptureState::Aborted;
        info!(dropped, "capture aborted");
        dropped
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CAPTURE_FRAMES)
    }
}
