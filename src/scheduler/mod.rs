//! Timer scheduling
//!
//! Every delayed action in this crate (filter debounce, notice countdown
//! ticks, notice deadlines) goes through a [`Scheduler`], so the owner can
//! cancel it and tests can drive it with simulated time.
//!
//! - [`VirtualScheduler`]: deterministic clock advanced by hand
//! - `TokioScheduler` (feature `tokio`): real timers on a `tokio::task::LocalSet`

use std::fmt;
use std::time::Duration;

mod virtual_time;

#[cfg(feature = "tokio")]
mod tokio_local;

pub use virtual_time::VirtualScheduler;

#[cfg(feature = "tokio")]
pub use tokio_local::TokioScheduler;

/// Identifies a scheduled timer for cancellation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub(crate) u64);

impl fmt::Display for TimerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "timer#{}", self.0)
	}
}

/// A single-threaded timer driver
///
/// Implementations must never run a callback synchronously from inside
/// `schedule_once`/`schedule_repeating`, and must never run a callback after
/// its timer has been cancelled.
pub trait Scheduler {
	/// Time elapsed since the scheduler was created
	fn now(&self) -> Duration;

	/// Run `task` once after `delay`
	fn schedule_once(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerId;

	/// Run `task` every `interval`, first after one full interval
	fn schedule_repeating(&self, interval: Duration, task: Box<dyn FnMut()>) -> TimerId;

	/// Cancel a timer; unknown or already-fired ids are ignored
	fn cancel(&self, id: TimerId);
}
