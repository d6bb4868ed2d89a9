//! Simulated-time scheduler

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use super::{Scheduler, TimerId};

/// Shortest interval a repeating timer may use
const MIN_REPEAT_INTERVAL: Duration = Duration::from_millis(1);

enum Task {
	Once(Box<dyn FnOnce()>),
	Repeating {
		interval: Duration,
		task: Box<dyn FnMut()>,
	},
}

struct Entry {
	deadline: Duration,
	seq: u64,
	task: Task,
}

/// Deterministic scheduler driven by [`advance`](Self::advance)
///
/// Timers fire in deadline order; timers sharing a deadline fire in the order
/// they were scheduled. The clock only moves when `advance` is called.
///
/// # Example
///
/// ```
/// use reinhardt_page_state::scheduler::{Scheduler, VirtualScheduler};
/// use std::cell::Cell;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// let scheduler = VirtualScheduler::new();
/// let fired = Rc::new(Cell::new(false));
///
/// let fired_clone = fired.clone();
/// scheduler.schedule_once(
///     Duration::from_millis(300),
///     Box::new(move || fired_clone.set(true)),
/// );
///
/// scheduler.advance(Duration::from_millis(299));
/// assert!(!fired.get());
/// scheduler.advance(Duration::from_millis(1));
/// assert!(fired.get());
/// ```
#[derive(Default)]
pub struct VirtualScheduler {
	now: Cell<Duration>,
	next_id: Cell<u64>,
	next_seq: Cell<u64>,
	queue: RefCell<BTreeSet<(Duration, u64, TimerId)>>,
	entries: RefCell<HashMap<TimerId, Entry>>,
	/// Repeating timer currently executing, and whether it cancelled itself
	running: Cell<Option<TimerId>>,
	running_cancelled: Cell<bool>,
}

impl VirtualScheduler {
	/// Create a scheduler with its clock at zero
	pub fn new() -> Self {
		Self::default()
	}

	/// Move the clock forward by `by`, firing every timer that falls due
	///
	/// Callbacks observe `now()` equal to their own deadline. Timers scheduled
	/// by a callback fire within the same call if their deadline is reached.
	/// Must not be called from inside a timer callback.
	pub fn advance(&self, by: Duration) {
		debug_assert!(
			self.running.get().is_none(),
			"VirtualScheduler::advance called from a timer callback"
		);
		let target = self.now.get() + by;

		loop {
			let next = self.queue.borrow().iter().next().copied();
			let Some(key @ (deadline, _, id)) = next else {
				break;
			};
			if deadline > target {
				break;
			}
			self.queue.borrow_mut().remove(&key);
			let Some(entry) = self.entries.borrow_mut().remove(&id) else {
				continue;
			};
			self.now.set(deadline);

			match entry.task {
				Task::Once(task) => task(),
				Task::Repeating { interval, mut task } => {
					self.running.set(Some(id));
					self.running_cancelled.set(false);
					task();
					self.running.set(None);
					if !self.running_cancelled.get() {
						self.insert(id, deadline + interval, Task::Repeating { interval, task });
					}
				}
			}
		}

		self.now.set(target);
	}

	/// Number of timers still waiting to fire
	pub fn pending(&self) -> usize {
		self.entries.borrow().len()
	}

	/// Deadline of the earliest pending timer
	pub fn next_deadline(&self) -> Option<Duration> {
		self.queue.borrow().iter().next().map(|(deadline, _, _)| *deadline)
	}

	fn allocate_id(&self) -> TimerId {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		TimerId(id)
	}

	fn insert(&self, id: TimerId, deadline: Duration, task: Task) {
		let seq = self.next_seq.get();
		self.next_seq.set(seq + 1);
		self.queue.borrow_mut().insert((deadline, seq, id));
		self.entries
			.borrow_mut()
			.insert(id, Entry { deadline, seq, task });
	}
}

impl Scheduler for VirtualScheduler {
	fn now(&self) -> Duration {
		self.now.get()
	}

	fn schedule_once(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerId {
		let id = self.allocate_id();
		self.insert(id, self.now.get() + delay, Task::Once(task));
		id
	}

	fn schedule_repeating(&self, interval: Duration, task: Box<dyn FnMut()>) -> TimerId {
		let interval = interval.max(MIN_REPEAT_INTERVAL);
		let id = self.allocate_id();
		self.insert(
			id,
			self.now.get() + interval,
			Task::Repeating { interval, task },
		);
		id
	}

	fn cancel(&self, id: TimerId) {
		if self.running.get() == Some(id) {
			self.running_cancelled.set(true);
		}
		if let Some(entry) = self.entries.borrow_mut().remove(&id) {
			self.queue
				.borrow_mut()
				.remove(&(entry.deadline, entry.seq, id));
		}
	}
}

impl std::fmt::Debug for VirtualScheduler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("VirtualScheduler")
			.field("now", &self.now.get())
			.field("pending", &self.pending())
			.finish()
	}
}
