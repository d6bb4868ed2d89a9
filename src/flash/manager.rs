//! Flash lifecycle manager

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use super::notice::{Notice, NoticePayload, remaining_percent};
use crate::props::{PageProps, flash_messages};
use crate::reactive::{ReadSignal, Signal, Subscription};
use crate::scheduler::{Scheduler, TimerId};
use crate::settings::{AutoDismissDefaults, DEFAULT_PROGRESS_INTERVAL_MS, FlashSettings};

/// Flash manager configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashOptions {
	/// Countdown tick interval
	pub progress_interval: Duration,
	/// Per-kind delays for payloads without their own
	pub auto_dismiss: AutoDismissDefaults,
}

impl Default for FlashOptions {
	fn default() -> Self {
		Self {
			progress_interval: Duration::from_millis(DEFAULT_PROGRESS_INTERVAL_MS),
			auto_dismiss: AutoDismissDefaults::default(),
		}
	}
}

impl FlashOptions {
	/// Set the countdown tick interval
	pub fn with_progress_interval(mut self, interval: Duration) -> Self {
		self.progress_interval = interval;
		self
	}

	/// Set the per-kind auto-dismiss defaults
	pub fn with_auto_dismiss(mut self, defaults: AutoDismissDefaults) -> Self {
		self.auto_dismiss = defaults;
		self
	}
}

impl From<&FlashSettings> for FlashOptions {
	fn from(settings: &FlashSettings) -> Self {
		Self {
			progress_interval: Duration::from_millis(settings.progress_interval_ms.max(1)),
			auto_dismiss: settings.auto_dismiss_ms,
		}
	}
}

type NoticeListener = Rc<dyn Fn(&Notice)>;

/// Timers driving one notice's countdown
#[derive(Debug, Clone, Copy)]
struct Countdown {
	progress: TimerId,
	deadline: TimerId,
}

struct Inner {
	scheduler: Rc<dyn Scheduler>,
	options: FlashOptions,
	notices: Signal<Vec<Notice>>,
	/// Every identity admitted so far, dismissed ones included
	seen: RefCell<HashSet<String>>,
	countdowns: RefCell<HashMap<String, Countdown>>,
	listeners: RefCell<Vec<(u64, NoticeListener)>>,
	next_listener: Cell<u64>,
	bindings: RefCell<Vec<Subscription>>,
	disposed: Cell<bool>,
}

impl Inner {
	fn ingest(self: &Rc<Self>, batch: &[NoticePayload]) -> usize {
		if self.disposed.get() {
			return 0;
		}
		let now = self.scheduler.now();
		let mut admitted = Vec::new();
		{
			let mut seen = self.seen.borrow_mut();
			for payload in batch {
				if payload.text.is_empty() {
					tracing::debug!(kind = %payload.kind, "skipping notice without text");
					continue;
				}
				let id = payload.identity();
				if !seen.insert(id.clone()) {
					tracing::debug!(notice_id = %id, "skipping already admitted notice");
					continue;
				}
				let delay = payload
					.auto_dismiss
					.resolve(self.options.auto_dismiss.for_kind(payload.kind));
				admitted.push(Notice::admit(payload, id, delay, now));
			}
		}
		if admitted.is_empty() {
			return 0;
		}

		// Countdowns exist before subscribers see the notices, so a dismissal
		// from a `messages()` subscriber cancels them.
		for notice in &admitted {
			if let Some(duration) = notice.auto_dismiss {
				self.start_countdown(&notice.id, duration);
			}
		}
		self.notices
			.update(|visible| visible.extend(admitted.iter().cloned()));

		let listeners: Vec<NoticeListener> = self
			.listeners
			.borrow()
			.iter()
			.map(|(_, l)| Rc::clone(l))
			.collect();
		for notice in &admitted {
			tracing::debug!(notice_id = %notice.id, kind = %notice.kind, "notice admitted");
			for listener in &listeners {
				listener(notice);
			}
		}
		admitted.len()
	}

	fn start_countdown(self: &Rc<Self>, id: &str, duration: Duration) {
		let started = self.scheduler.now();
		let weak: Weak<Self> = Rc::downgrade(self);

		let progress = {
			let weak = weak.clone();
			let id = id.to_string();
			self.scheduler.schedule_repeating(
				self.options.progress_interval,
				Box::new(move || {
					if let Some(inner) = weak.upgrade() {
						inner.tick(&id, started, duration);
					}
				}),
			)
		};
		let deadline = {
			let id = id.to_string();
			self.scheduler.schedule_once(
				duration,
				Box::new(move || {
					if let Some(inner) = weak.upgrade() {
						tracing::debug!(notice_id = %id, "notice expired");
						inner.remove(&id);
					}
				}),
			)
		};

		tracing::debug!(notice_id = %id, ?duration, "countdown started");
		self.countdowns
			.borrow_mut()
			.insert(id.to_string(), Countdown { progress, deadline });
	}

	fn tick(&self, id: &str, started: Duration, duration: Duration) {
		if self.disposed.get() {
			return;
		}
		let elapsed = self.scheduler.now().saturating_sub(started);
		let remaining = remaining_percent(elapsed, duration);
		let changed = self.notices.with(|visible| {
			visible
				.iter()
				.any(|n| n.id == id && n.remaining_percent != remaining)
		});
		if changed {
			self.notices.update(|visible| {
				if let Some(notice) = visible.iter_mut().find(|n| n.id == id) {
					notice.remaining_percent = remaining;
				}
			});
		}
	}

	fn cancel_countdown(&self, id: &str) {
		let countdown = self.countdowns.borrow_mut().remove(id);
		if let Some(countdown) = countdown {
			self.scheduler.cancel(countdown.progress);
			self.scheduler.cancel(countdown.deadline);
		}
	}

	fn cancel_all_countdowns(&self) {
		let countdowns: Vec<Countdown> = self
			.countdowns
			.borrow_mut()
			.drain()
			.map(|(_, countdown)| countdown)
			.collect();
		for countdown in countdowns {
			self.scheduler.cancel(countdown.progress);
			self.scheduler.cancel(countdown.deadline);
		}
	}

	fn remove(&self, id: &str) -> bool {
		self.cancel_countdown(id);
		let present = self.notices.with(|visible| visible.iter().any(|n| n.id == id));
		if present {
			self.notices.update(|visible| visible.retain(|n| n.id != id));
		}
		present
	}
}

/// Owns the notices currently visible in one UI scope
///
/// Payload entries are admitted once per identity for the lifetime of the
/// manager, so a payload redelivered by a partial reload is not shown twice.
/// Entries without a server-issued id are identified by their content, so a
/// later notice with the same kind and text is treated as already shown.
/// Servers that repeat messages should give each one its own id.
/// Auto-dismissing notices count down on the manager's [`Scheduler`].
///
/// Dropping the manager disposes it.
///
/// # Example
///
/// ```
/// use reinhardt_page_state::flash::{AutoDismiss, FlashManager, FlashOptions, NoticeKind, NoticePayload};
/// use reinhardt_page_state::scheduler::VirtualScheduler;
/// use std::rc::Rc;
/// use std::time::Duration;
///
/// let scheduler = Rc::new(VirtualScheduler::new());
/// let flash = FlashManager::new(scheduler.clone(), FlashOptions::default());
///
/// let saved = NoticePayload::new(NoticeKind::Success, "Saved")
///     .with_id("n1")
///     .with_auto_dismiss(AutoDismiss::After(Duration::from_secs(3)));
/// flash.ingest(&[saved.clone()]);
/// flash.ingest(&[saved]);
/// assert_eq!(flash.messages().get().len(), 1);
///
/// scheduler.advance(Duration::from_secs(3));
/// assert!(flash.messages().get().is_empty());
/// ```
pub struct FlashManager {
	inner: Rc<Inner>,
}

impl FlashManager {
	/// Create a manager whose countdowns run on `scheduler`
	pub fn new(scheduler: Rc<dyn Scheduler>, options: FlashOptions) -> Self {
		Self {
			inner: Rc::new(Inner {
				scheduler,
				options,
				notices: Signal::new(Vec::new()),
				seen: RefCell::new(HashSet::new()),
				countdowns: RefCell::new(HashMap::new()),
				listeners: RefCell::new(Vec::new()),
				next_listener: Cell::new(0),
				bindings: RefCell::new(Vec::new()),
				disposed: Cell::new(false),
			}),
		}
	}

	/// Admit the new entries of a payload batch, returning how many were admitted
	///
	/// Entries with empty text and entries whose identity was admitted before
	/// are skipped. Admitted notices are appended in batch order and handed to
	/// every listener in that order.
	pub fn ingest(&self, batch: &[NoticePayload]) -> usize {
		self.inner.ingest(batch)
	}

	/// Ingest `flash.messages` now and on every redelivery of `props`
	pub fn bind(&self, props: &PageProps) {
		if self.inner.disposed.get() {
			return;
		}
		self.inner.ingest(&props.signal().with(flash_messages));

		let weak = Rc::downgrade(&self.inner);
		let subscription = props.signal().subscribe(move |value| {
			if let Some(inner) = weak.upgrade() {
				inner.ingest(&flash_messages(value));
			}
		});
		self.inner.bindings.borrow_mut().push(subscription);
	}

	/// Remove a notice and cancel its countdown; returns whether it was visible
	pub fn dismiss(&self, id: &str) -> bool {
		if self.inner.disposed.get() {
			return false;
		}
		let removed = self.inner.remove(id);
		if removed {
			tracing::debug!(notice_id = %id, "notice dismissed");
		}
		removed
	}

	/// Remove every notice and cancel every countdown
	pub fn dismiss_all(&self) {
		if self.inner.disposed.get() {
			return;
		}
		self.inner.cancel_all_countdowns();
		if self.inner.notices.with(|visible| !visible.is_empty()) {
			self.inner.notices.set(Vec::new());
		}
	}

	/// Register a listener called once per newly admitted notice
	pub fn on_notice(&self, listener: impl Fn(&Notice) + 'static) -> Subscription {
		let id = self.inner.next_listener.get();
		self.inner.next_listener.set(id + 1);
		self.inner
			.listeners
			.borrow_mut()
			.push((id, Rc::new(listener)));

		let weak = Rc::downgrade(&self.inner);
		Subscription::new(move || {
			if let Some(inner) = weak.upgrade() {
				inner.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
			}
		})
	}

	/// Visible notices in admission order
	pub fn messages(&self) -> ReadSignal<Vec<Notice>> {
		self.inner.notices.read_only()
	}

	/// Whether any notice is visible
	pub fn has_messages(&self) -> ReadSignal<bool> {
		self.inner.notices.read_only().map(|visible| !visible.is_empty())
	}

	/// A visible notice by identity
	pub fn get(&self, id: &str) -> Option<Notice> {
		self.inner
			.notices
			.with(|visible| visible.iter().find(|n| n.id == id).cloned())
	}

	/// Number of notices with a running countdown
	pub fn active_countdowns(&self) -> usize {
		self.inner.countdowns.borrow().len()
	}

	/// Cancel every timer, drop prop bindings and listeners, and ignore further input
	///
	/// Visible notices stay as they are.
	pub fn dispose(&self) {
		if self.inner.disposed.replace(true) {
			return;
		}
		self.inner.cancel_all_countdowns();
		let bindings = std::mem::take(&mut *self.inner.bindings.borrow_mut());
		drop(bindings);
		self.inner.listeners.borrow_mut().clear();
		tracing::debug!("flash manager disposed");
	}

	/// Whether [`dispose`](Self::dispose) has run
	pub fn is_disposed(&self) -> bool {
		self.inner.disposed.get()
	}
}

impl Drop for FlashManager {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl fmt::Debug for FlashManager {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FlashManager")
			.field("visible", &self.inner.notices.with(Vec::len))
			.field("countdowns", &self.inner.countdowns.borrow().len())
			.field("disposed", &self.inner.disposed.get())
			.finish()
	}
}
