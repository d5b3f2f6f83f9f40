//! [`SingleFlight`] – at most one expensive operation in flight.
//!
//! Built on a one-permit [`tokio::sync::Semaphore`].  A caller that wins the
//! permit moves the [`FlightPermit`] into its task; the slot frees itself
//! when that task drops the permit, even if it panics.  A second caller is
//! rejected immediately instead of queueing.
//!
//! # Example
//!
//! ```rust
//! use kinesis_runtime::single_flight::SingleFlight;
//!
//! let flight = SingleFlight::new("match");
//! let permit = flight.try_acquire().unwrap();
//! assert!(flight.try_acquire().is_err());
//! drop(permit);
//! assert!(flight.try_acquire().is_ok());
//! ```

use std::sync::Arc;

use kinesis_types::KinesisError;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Guard handing out a single [`FlightPermit`] at a time.
#[derive(Debug, Clone)]
pub struct SingleFlight {
    name: &'static str,
    slot: Arc<Semaphore>,
}

/// Proof of holding the flight slot.  Dropping it frees the slot.
#[derive(Debug)]
pub struct FlightPermit {
    _permit: OwnedSemaphorePermit,
}

impl SingleFlight {
    /// `name` appears in rejection messages.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slot: Arc::new(Semaphore::new(1)),
        }
    }

    /// Claim the slot without waiting.
    ///
    /// # Errors
    ///
    /// [`KinesisError::ConcurrentOperationRejected`] while another permit is
    /// alive.
    pub fn try_acquire(&self) -> Result<FlightPermit, KinesisError> {
        Arc::clone(&self.slot)
            .try_acquire_owned()
            .map(|permit| FlightPermit { _permit: permit })
            .map_err(|_| {
                KinesisError::ConcurrentOperationRejected(format!("{} already in flight", self.name))
            })
    }

    /// `true` while a permit is held.
    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }
}
