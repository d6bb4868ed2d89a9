//! Signal - observable value cell
//!
//! `Signal<T>` holds the latest value of a piece of page state and notifies
//! subscribers synchronously whenever it is written. Components keep their
//! authoritative state in signals and hand out [`ReadSignal`] views so the UI
//! layer can observe, but never mutate, that state.
//!
//! ## Example
//!
//! ```
//! use reinhardt_page_state::reactive::Signal;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let count = Signal::new(0);
//! let seen = Rc::new(Cell::new(0));
//!
//! let seen_clone = seen.clone();
//! let _subscription = count.subscribe(move |value| seen_clone.set(*value));
//!
//! count.set(42);
//! assert_eq!(seen.get(), 42);
//!
//! // Derived views are recomputed on every upstream change
//! let doubled = count.read_only().map(|n| n * 2);
//! count.update(|n| *n += 1);
//! assert_eq!(doubled.get(), 86);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(&T)>;

struct Inner<T: 'static> {
	value: RefCell<T>,
	listeners: RefCell<Vec<(u64, Listener<T>)>>,
	next_listener: Cell<u64>,
	/// Subscriptions this signal holds on its sources (derived signals only)
	upstream: RefCell<Vec<Subscription>>,
}

impl<T: 'static> Inner<T> {
	fn add_listener(self: &Rc<Self>, listener: Listener<T>) -> Subscription {
		let id = self.next_listener.get();
		self.next_listener.set(id + 1);
		self.listeners.borrow_mut().push((id, listener));

		let weak: Weak<Self> = Rc::downgrade(self);
		Subscription::new(move || {
			if let Some(inner) = weak.upgrade() {
				inner.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
			}
		})
	}

	fn notify(&self)
	where
		T: Clone,
	{
		// Snapshot both the value and the listener list so listeners are free
		// to write this signal or (un)subscribe while being notified.
		let value = self.value.borrow().clone();
		let listeners: Vec<Listener<T>> = self
			.listeners
			.borrow()
			.iter()
			.map(|(_, l)| Rc::clone(l))
			.collect();
		for listener in listeners {
			listener(&value);
		}
	}
}

/// A writable observable value
///
/// Cloning a `Signal` yields another handle to the same value; all clones see
/// the same writes and share the same subscribers.
pub struct Signal<T: 'static> {
	inner: Rc<Inner<T>>,
}

impl<T: 'static> Signal<T> {
	/// Create a new signal holding `value`
	pub fn new(value: T) -> Self {
		Self {
			inner: Rc::new(Inner {
				value: RefCell::new(value),
				listeners: RefCell::new(Vec::new()),
				next_listener: Cell::new(0),
				upstream: RefCell::new(Vec::new()),
			}),
		}
	}

	/// Get a clone of the current value
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.inner.value.borrow().clone()
	}

	/// Borrow the current value for the duration of `f`
	///
	/// `f` must not write this signal.
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.inner.value.borrow())
	}

	/// Replace the value and notify subscribers
	pub fn set(&self, value: T)
	where
		T: Clone,
	{
		*self.inner.value.borrow_mut() = value;
		self.inner.notify();
	}

	/// Replace the value only if it differs from the current one
	///
	/// Returns `true` when subscribers were notified.
	pub fn set_if_changed(&self, value: T) -> bool
	where
		T: Clone + PartialEq,
	{
		if *self.inner.value.borrow() == value {
			return false;
		}
		self.set(value);
		true
	}

	/// Mutate the value in place and notify subscribers once
	pub fn update(&self, f: impl FnOnce(&mut T))
	where
		T: Clone,
	{
		f(&mut self.inner.value.borrow_mut());
		self.inner.notify();
	}

	/// Register a listener called with the new value after every write
	pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
		self.inner.add_listener(Rc::new(f))
	}

	/// Get a read-only view sharing this signal's value
	pub fn read_only(&self) -> ReadSignal<T> {
		ReadSignal {
			inner: Rc::clone(&self.inner),
		}
	}

	/// Number of registered listeners
	pub fn subscriber_count(&self) -> usize {
		self.inner.listeners.borrow().len()
	}
}

impl<T: 'static> Clone for Signal<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<T: Default + 'static> Default for Signal<T> {
	fn default() -> Self {
		Self::new(T::default())
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("value", &*self.inner.value.borrow())
			.field("subscribers", &self.inner.listeners.borrow().len())
			.finish()
	}
}

/// A read-only view of a [`Signal`]
pub struct ReadSignal<T: 'static> {
	inner: Rc<Inner<T>>,
}

impl<T: 'static> ReadSignal<T> {
	/// Create a view over a constant value
	///
	/// Useful when a component is fed a snapshot that never changes (tests, SSR).
	pub fn constant(value: T) -> Self {
		Signal::new(value).read_only()
	}

	/// Get a clone of the current value
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.inner.value.borrow().clone()
	}

	/// Borrow the current value for the duration of `f`
	pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
		f(&self.inner.value.borrow())
	}

	/// Register a listener called with the new value after every upstream write
	pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
		self.inner.add_listener(Rc::new(f))
	}

	/// Derive a view recomputed from this one on every change
	///
	/// The derived view keeps its upstream subscription alive for as long as
	/// the view (or a clone of it) exists.
	pub fn map<U, F>(&self, f: F) -> ReadSignal<U>
	where
		T: Clone,
		U: Clone + 'static,
		F: Fn(&T) -> U + 'static,
	{
		self.derive(f, |inner, value| {
			*inner.value.borrow_mut() = value;
			inner.notify();
		})
	}

	/// Like [`map`](Self::map), but only notifies when the derived value changes
	pub fn map_distinct<U, F>(&self, f: F) -> ReadSignal<U>
	where
		T: Clone,
		U: Clone + PartialEq + 'static,
		F: Fn(&T) -> U + 'static,
	{
		self.derive(f, |inner, value| {
			if *inner.value.borrow() == value {
				return;
			}
			*inner.value.borrow_mut() = value;
			inner.notify();
		})
	}

	fn derive<U, F>(&self, f: F, write: fn(&Inner<U>, U)) -> ReadSignal<U>
	where
		T: Clone,
		U: Clone + 'static,
		F: Fn(&T) -> U + 'static,
	{
		let derived = Signal::new(self.with(&f));
		let target = Rc::downgrade(&derived.inner);
		let subscription = self.subscribe(move |value| {
			if let Some(inner) = target.upgrade() {
				write(&inner, f(value));
			}
		});
		// Chained views (`select(..).map(..)`) drop the intermediate handle, so
		// the derived view owns its source.
		let source = Rc::clone(&self.inner);
		derived
			.inner
			.upstream
			.borrow_mut()
			.push(Subscription::new(move || {
				subscription.unsubscribe();
				drop(source);
			}));
		derived.read_only()
	}
}

impl<T: 'static> Clone for ReadSignal<T> {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl<T: fmt::Debug + 'static> fmt::Debug for ReadSignal<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReadSignal")
			.field("value", &*self.inner.value.borrow())
			.finish()
	}
}

impl<T: 'static> From<Signal<T>> for ReadSignal<T> {
	fn from(signal: Signal<T>) -> Self {
		ReadSignal {
			inner: signal.inner,
		}
	}
}

/// Handle to a registered listener
///
/// The listener is removed when the handle is dropped or
/// [`unsubscribe`](Self::unsubscribe) is called. Use [`detach`](Self::detach)
/// to keep it registered for the lifetime of its source.
#[must_use = "dropping a Subscription immediately unregisters its listener"]
pub struct Subscription {
	release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
	pub(crate) fn new(release: impl FnOnce() + 'static) -> Self {
		Self {
			release: Some(Box::new(release)),
		}
	}

	/// Unregister the listener now
	pub fn unsubscribe(mut self) {
		if let Some(release) = self.release.take() {
			release();
		}
	}

	/// Keep the listener registered until its source is dropped
	pub fn detach(mut self) {
		self.release = None;
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(release) = self.release.take() {
			release();
		}
	}
}

impl fmt::Debug for Subscription {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Subscription")
			.field("active", &self.release.is_some())
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_signal_set_and_get() {
		let signal = Signal::new(0);
		signal.set(100);
		assert_eq!(signal.get(), 100);
	}

	#[rstest]
	fn test_signal_clone_shares_value() {
		let signal1 = Signal::new(42);
		let signal2 = signal1.clone();

		signal1.set(7);
		assert_eq!(signal2.get(), 7);
	}

	#[rstest]
	fn test_subscribers_notified_in_registration_order() {
		let signal = Signal::new(0);
		let log = Rc::new(RefCell::new(Vec::new()));

		let log1 = log.clone();
		let _a = signal.subscribe(move |v| log1.borrow_mut().push(("a", *v)));
		let log2 = log.clone();
		let _b = signal.subscribe(move |v| log2.borrow_mut().push(("b", *v)));

		signal.set(1);
		assert_eq!(*log.borrow(), vec![("a", 1), ("b", 1)]);
	}

	#[rstest]
	fn test_dropping_subscription_unregisters() {
		let signal = Signal::new(0);
		let calls = Rc::new(Cell::new(0));

		let calls_clone = calls.clone();
		let subscription = signal.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));
		signal.set(1);
		drop(subscription);
		signal.set(2);

		assert_eq!(calls.get(), 1);
		assert_eq!(signal.subscriber_count(), 0);
	}

	#[rstest]
	fn test_detached_subscription_stays_registered() {
		let signal = Signal::new(0);
		let calls = Rc::new(Cell::new(0));

		let calls_clone = calls.clone();
		signal
			.subscribe(move |_| calls_clone.set(calls_clone.get() + 1))
			.detach();
		signal.set(1);
		signal.set(2);

		assert_eq!(calls.get(), 2);
	}

	#[rstest]
	fn test_listener_may_write_same_signal() {
		let signal = Signal::new(0);
		let writer = signal.clone();
		let _subscription = signal.subscribe(move |v| {
			if *v < 3 {
				writer.set(v + 1);
			}
		});

		signal.set(1);
		assert_eq!(signal.get(), 3);
	}

	#[rstest]
	fn test_set_if_changed_skips_equal_values() {
		let signal = Signal::new("a".to_string());
		let calls = Rc::new(Cell::new(0));
		let calls_clone = calls.clone();
		let _subscription = signal.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));

		assert!(!signal.set_if_changed("a".to_string()));
		assert!(signal.set_if_changed("b".to_string()));
		assert_eq!(calls.get(), 1);
	}

	#[rstest]
	fn test_map_recomputes_and_notifies() {
		let source = Signal::new(2);
		let squared = source.read_only().map(|n| n * n);
		let seen = Rc::new(Cell::new(0));

		let seen_clone = seen.clone();
		let _subscription = squared.subscribe(move |v| seen_clone.set(*v));

		source.set(5);
		assert_eq!(squared.get(), 25);
		assert_eq!(seen.get(), 25);
	}

	#[rstest]
	fn test_map_distinct_skips_equal_results() {
		let source = Signal::new(3);
		let parity = source.read_only().map_distinct(|n| n % 2);
		let calls = Rc::new(Cell::new(0));

		let calls_clone = calls.clone();
		let _subscription = parity.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));

		source.set(5);
		assert_eq!(calls.get(), 0);
		source.set(6);
		assert_eq!(parity.get(), 0);
		assert_eq!(calls.get(), 1);
	}

	#[rstest]
	fn test_chained_views_stay_connected() {
		let source = Signal::new(1);
		let chained = source.read_only().map(|n| n + 1).map(|n| n * 10);

		source.set(4);
		assert_eq!(chained.get(), 50);
	}

	#[rstest]
	fn test_dropped_derived_view_releases_upstream() {
		let source = Signal::new(1);
		let derived = source.read_only().map(|n| n + 1);
		assert_eq!(source.subscriber_count(), 1);

		drop(derived);
		assert_eq!(source.subscriber_count(), 0);
	}
}
