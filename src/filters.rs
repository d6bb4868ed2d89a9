//! Filter field synchronization
//!
//! [`FilterState`] keeps a record of filter field values mirrored from a
//! server-confirmed defaults snapshot. Writes show up in the record at once;
//! the URL catches up either immediately or after a per-field debounce.
//!
//! A field is *active* when its value is not blank and differs from its
//! default. Only active fields reach the query string, and every filter change
//! drops the page parameter so the listing restarts at its first page.
//!
//! ## Example
//!
//! ```
//! use reinhardt_page_state::PageContext;
//! use reinhardt_page_state::filters::{FilterOptions, FilterState};
//! use reinhardt_page_state::navigation::StaticLocation;
//! use reinhardt_page_state::reactive::ReadSignal;
//! use reinhardt_page_state::scheduler::VirtualScheduler;
//! use reinhardt_page_state::testing::RecordingNavigator;
//! use serde_json::json;
//! use std::rc::Rc;
//! use std::time::Duration;
//!
//! let scheduler = Rc::new(VirtualScheduler::new());
//! let navigator = Rc::new(RecordingNavigator::new());
//! let ctx = PageContext::new(
//!     scheduler.clone(),
//!     navigator.clone(),
//!     Rc::new(StaticLocation::new("/users?page=3")),
//! );
//!
//! let defaults = json!({ "search": "", "status": "all" });
//! let filters = FilterState::new(
//!     &ctx,
//!     ReadSignal::constant(defaults.as_object().cloned().unwrap_or_default()),
//!     FilterOptions::default().with_debounce("search", Duration::from_millis(300)),
//! );
//!
//! filters.update("search", "ann");
//! assert_eq!(navigator.visit_count(), 0);
//!
//! scheduler.advance(Duration::from_millis(300));
//! assert_eq!(navigator.last_url().as_deref(), Some("/users?search=ann"));
//! ```

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};
use std::time::Duration;

use serde_json::Value;

use crate::context::PageContext;
use crate::navigation::{NavigationTrigger, Preserve, QueryBuilder, VisitOptions, is_blank};
use crate::props::PageProps;
use crate::reactive::{ReadSignal, Signal, Subscription};
use crate::scheduler::TimerId;
use crate::settings::Settings;

/// Field name to value record
pub type FieldMap = serde_json::Map<String, Value>;

/// Filter synchronization configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
	/// Debounce per field; fields not listed sync immediately
	pub debounce: BTreeMap<String, Duration>,
	/// Options for every visit
	pub navigation: VisitOptions,
	/// Existing query parameters kept across filter changes
	pub preserve: Preserve,
	/// Page parameter dropped on every filter change
	pub page_param: String,
}

impl Default for FilterOptions {
	fn default() -> Self {
		Self {
			debounce: BTreeMap::new(),
			navigation: VisitOptions::default(),
			preserve: Preserve::None,
			page_param: "page".to_string(),
		}
	}
}

impl FilterOptions {
	/// Debounce synchronization of `field`
	pub fn with_debounce(mut self, field: impl Into<String>, delay: Duration) -> Self {
		self.debounce.insert(field.into(), delay);
		self
	}

	/// Set the visit options
	pub fn with_navigation(mut self, navigation: VisitOptions) -> Self {
		self.navigation = navigation;
		self
	}

	/// Reload only the named props
	pub fn with_only<I, S>(mut self, props: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.navigation = self.navigation.with_only(props);
		self
	}

	/// Choose which existing query parameters survive
	pub fn with_preserve(mut self, preserve: Preserve) -> Self {
		self.preserve = preserve;
		self
	}
}

impl From<&Settings> for FilterOptions {
	fn from(settings: &Settings) -> Self {
		let filters = &settings.filters;
		Self {
			debounce: filters
				.debounce_ms
				.iter()
				.map(|(field, ms)| (field.clone(), Duration::from_millis(*ms)))
				.collect(),
			navigation: settings.navigation.clone(),
			preserve: if filters.preserve.is_empty() {
				Preserve::None
			} else {
				Preserve::only(filters.preserve.iter().cloned())
			},
			page_param: filters.page_param.clone(),
		}
	}
}

fn is_active(value: &Value, default: Option<&Value>) -> bool {
	!is_blank(value) && default != Some(value)
}

fn active_count(values: &FieldMap, defaults: &FieldMap) -> usize {
	values
		.iter()
		.filter(|(field, value)| is_active(value, defaults.get(*field)))
		.count()
}

struct Inner {
	ctx: PageContext,
	options: FilterOptions,
	defaults: ReadSignal<FieldMap>,
	/// Defaults the record was last seeded from
	seeded: RefCell<FieldMap>,
	values: Signal<FieldMap>,
	timers: RefCell<HashMap<String, TimerId>>,
	trigger: NavigationTrigger,
	upstream: RefCell<Option<Subscription>>,
	disposed: Cell<bool>,
}

impl Inner {
	fn debounce(self: &Rc<Self>, field: &str, delay: Duration) {
		self.cancel_timer(field);
		let weak: Weak<Self> = Rc::downgrade(self);
		let key = field.to_string();
		let id = self.ctx.scheduler().schedule_once(
			delay,
			Box::new(move || {
				if let Some(inner) = weak.upgrade() {
					inner.timers.borrow_mut().remove(&key);
					inner.visit();
				}
			}),
		);
		tracing::debug!(field, ?delay, timer = %id, "filter sync debounced");
		self.timers.borrow_mut().insert(field.to_string(), id);
	}

	fn cancel_timer(&self, field: &str) {
		let id = self.timers.borrow_mut().remove(field);
		if let Some(id) = id {
			self.ctx.scheduler().cancel(id);
		}
	}

	fn cancel_all_timers(&self) {
		let ids: Vec<TimerId> = self.timers.borrow_mut().drain().map(|(_, id)| id).collect();
		for id in ids {
			self.ctx.scheduler().cancel(id);
		}
	}

	fn url(&self) -> String {
		let defaults = self.defaults.get();
		let values = self.values.get();

		let mut builder = QueryBuilder::new(&self.ctx.href())
			.preserve(self.options.preserve.clone())
			.strip(self.options.page_param.as_str());
		for field in defaults.keys().chain(values.keys()) {
			builder = builder.strip(field.as_str());
		}
		for (field, value) in &values {
			if is_active(value, defaults.get(field)) {
				builder = builder.set_value(field.as_str(), value);
			}
		}
		builder.build()
	}

	/// Every pending debounce is covered by this visit, so all are cancelled
	fn visit(&self) {
		if self.disposed.get() {
			return;
		}
		self.cancel_all_timers();
		let url = self.url();
		self.trigger.navigate(url, &self.options.navigation);
	}

	fn resync(&self, defaults: &FieldMap) {
		if self.disposed.get() {
			return;
		}
		if *self.seeded.borrow() == *defaults {
			return;
		}
		*self.seeded.borrow_mut() = defaults.clone();
		self.cancel_all_timers();
		self.values.set(defaults.clone());
	}
}

/// Filter field record synchronized with the query string
///
/// Dropping the state disposes it.
pub struct FilterState {
	inner: Rc<Inner>,
}

impl FilterState {
	/// Create a record seeded from `defaults`
	///
	/// Whenever `defaults` changes every field is overwritten to match and
	/// pending debounces are dropped. Redelivering equal defaults keeps the
	/// current values.
	pub fn new(ctx: &PageContext, defaults: ReadSignal<FieldMap>, options: FilterOptions) -> Self {
		let inner = Rc::new(Inner {
			ctx: ctx.clone(),
			options,
			values: Signal::new(defaults.get()),
			seeded: RefCell::new(defaults.get()),
			defaults: defaults.clone(),
			timers: RefCell::new(HashMap::new()),
			trigger: ctx.trigger(),
			upstream: RefCell::new(None),
			disposed: Cell::new(false),
		});

		let weak = Rc::downgrade(&inner);
		let subscription = defaults.subscribe(move |defaults| {
			if let Some(inner) = weak.upgrade() {
				inner.resync(defaults);
			}
		});
		*inner.upstream.borrow_mut() = Some(subscription);

		Self { inner }
	}

	/// Create a record whose defaults are the object prop at `key`
	///
	/// A missing or non-object prop yields an empty record.
	pub fn from_props(
		ctx: &PageContext,
		props: &PageProps,
		key: &str,
		options: FilterOptions,
	) -> Self {
		let defaults = props
			.select(key)
			.map_distinct(|value| value.as_object().cloned().unwrap_or_default());
		Self::new(ctx, defaults, options)
	}

	/// Set one field and schedule synchronization
	///
	/// Unknown fields and writes of the current value are ignored.
	pub fn update(&self, field: &str, value: impl Into<Value>) {
		let inner = &self.inner;
		if inner.disposed.get() {
			return;
		}
		let value = value.into();
		match inner.values.with(|values| values.get(field).map(|current| *current == value)) {
			None => {
				tracing::warn!(field, "ignoring update of unknown filter field");
				return;
			}
			Some(true) => {
				tracing::debug!(field, "filter value unchanged");
				return;
			}
			Some(false) => {}
		}

		inner.values.update(|values| {
			values.insert(field.to_string(), value);
		});
		match inner.options.debounce.get(field) {
			Some(delay) if !delay.is_zero() => inner.debounce(field, *delay),
			_ => inner.visit(),
		}
	}

	/// Set several fields at once and synchronize immediately
	pub fn update_many(&self, partial: FieldMap) {
		let inner = &self.inner;
		if inner.disposed.get() {
			return;
		}
		inner.values.update(|values| {
			for (field, value) in partial {
				if values.contains_key(&field) {
					values.insert(field, value);
				} else {
					tracing::warn!(field = %field, "ignoring update of unknown filter field");
				}
			}
		});
		inner.visit();
	}

	/// Restore every field to its default and synchronize immediately
	pub fn reset(&self) {
		let inner = &self.inner;
		if inner.disposed.get() {
			return;
		}
		inner.values.set(inner.defaults.get());
		inner.visit();
	}

	/// Restore one field to its default and synchronize immediately
	pub fn reset_field(&self, field: &str) {
		let inner = &self.inner;
		if inner.disposed.get() {
			return;
		}
		let Some(default) = inner.defaults.with(|defaults| defaults.get(field).cloned()) else {
			tracing::warn!(field, "ignoring reset of unknown filter field");
			return;
		};
		inner.values.update(|values| {
			values.insert(field.to_string(), default);
		});
		inner.visit();
	}

	/// Current field values
	pub fn values(&self) -> ReadSignal<FieldMap> {
		self.inner.values.read_only()
	}

	/// Current value of one field; `Value::Null` when unknown
	pub fn value(&self, field: &str) -> ReadSignal<Value> {
		let field = field.to_string();
		self.inner
			.values
			.read_only()
			.map(move |values| values.get(&field).cloned().unwrap_or(Value::Null))
	}

	/// Whether any field differs from its default
	pub fn is_dirty(&self) -> ReadSignal<bool> {
		let defaults = self.inner.defaults.clone();
		self.inner.values.read_only().map(move |values| {
			defaults.with(|defaults| {
				values
					.iter()
					.any(|(field, value)| defaults.get(field) != Some(value))
			})
		})
	}

	/// Number of fields that are set and differ from their default
	pub fn active_count(&self) -> ReadSignal<usize> {
		let defaults = self.inner.defaults.clone();
		self.inner
			.values
			.read_only()
			.map(move |values| defaults.with(|defaults| active_count(values, defaults)))
	}

	/// Fields with a debounce still pending, in name order
	pub fn pending_fields(&self) -> Vec<String> {
		let mut fields: Vec<String> = self.inner.timers.borrow().keys().cloned().collect();
		fields.sort();
		fields
	}

	/// Whether a visit issued by this record is in flight
	pub fn is_loading(&self) -> ReadSignal<bool> {
		self.inner.trigger.is_loading()
	}

	/// Cancel pending debounces, stop following defaults and stop navigating
	pub fn dispose(&self) {
		let inner = &self.inner;
		if inner.disposed.replace(true) {
			return;
		}
		inner.cancel_all_timers();
		let upstream = inner.upstream.borrow_mut().take();
		drop(upstream);
		inner.trigger.dispose();
		tracing::debug!("filter state disposed");
	}

	/// Whether [`dispose`](Self::dispose) has run
	pub fn is_disposed(&self) -> bool {
		self.inner.disposed.get()
	}
}

impl Drop for FilterState {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl fmt::Debug for FilterState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("FilterState")
			.field("values", &self.inner.values.get())
			.field("pending", &self.pending_fields())
			.field("disposed", &self.inner.disposed.get())
			.finish()
	}
}
