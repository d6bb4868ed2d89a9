//! Tokio-backed scheduler for native event loops

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use super::{Scheduler, TimerId};

type TaskMap = RefCell<HashMap<TimerId, JoinHandle<()>>>;

/// Scheduler that runs timers as `spawn_local` tasks
///
/// Must be used from within a [`tokio::task::LocalSet`]. Dropping the
/// scheduler aborts every outstanding timer.
///
/// # Example
///
/// ```ignore
/// use reinhardt_page_state::scheduler::{Scheduler, TokioScheduler};
///
/// let local = tokio::task::LocalSet::new();
/// local.run_until(async {
///     let scheduler = TokioScheduler::new();
///     scheduler.schedule_once(Duration::from_millis(300), Box::new(|| println!("fired")));
///     tokio::time::sleep(Duration::from_millis(301)).await;
/// }).await;
/// ```
pub struct TokioScheduler {
	origin: Instant,
	next_id: Cell<u64>,
	tasks: Rc<TaskMap>,
}

impl TokioScheduler {
	/// Create a scheduler whose clock starts now
	pub fn new() -> Self {
		Self {
			origin: Instant::now(),
			next_id: Cell::new(0),
			tasks: Rc::new(RefCell::new(HashMap::new())),
		}
	}

	/// Number of timers still waiting to fire
	pub fn pending(&self) -> usize {
		self.tasks.borrow().len()
	}

	fn allocate_id(&self) -> TimerId {
		let id = self.next_id.get();
		self.next_id.set(id + 1);
		TimerId(id)
	}
}

impl Default for TokioScheduler {
	fn default() -> Self {
		Self::new()
	}
}

fn forget_task(tasks: &Weak<TaskMap>, id: TimerId) {
	if let Some(tasks) = tasks.upgrade() {
		tasks.borrow_mut().remove(&id);
	}
}

impl Scheduler for TokioScheduler {
	fn now(&self) -> Duration {
		self.origin.elapsed()
	}

	fn schedule_once(&self, delay: Duration, task: Box<dyn FnOnce()>) -> TimerId {
		let id = self.allocate_id();
		let tasks = Rc::downgrade(&self.tasks);
		let handle = tokio::task::spawn_local(async move {
			tokio::time::sleep(delay).await;
			forget_task(&tasks, id);
			task();
		});
		self.tasks.borrow_mut().insert(id, handle);
		id
	}

	fn schedule_repeating(&self, interval: Duration, mut task: Box<dyn FnMut()>) -> TimerId {
		let id = self.allocate_id();
		let interval = interval.max(Duration::from_millis(1));
		let handle = tokio::task::spawn_local(async move {
			let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
			ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
			loop {
				ticker.tick().await;
				task();
			}
		});
		self.tasks.borrow_mut().insert(id, handle);
		id
	}

	fn cancel(&self, id: TimerId) {
		if let Some(handle) = self.tasks.borrow_mut().remove(&id) {
			handle.abort();
		}
	}
}

impl Drop for TokioScheduler {
	fn drop(&mut self) {
		for (_, handle) in self.tasks.borrow_mut().drain() {
			handle.abort();
		}
	}
}

impl std::fmt::Debug for TokioScheduler {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TokioScheduler")
			.field("pending", &self.pending())
			.finish()
	}
}
