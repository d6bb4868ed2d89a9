//! Sort state for listings
//!
//! The current sort is always the server-confirmed one: [`SortState`] derives
//! its views from the latest snapshot and only requests a new order, it never
//! changes the snapshot itself.

use std::cell::Cell;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::context::PageContext;
use crate::navigation::{NavigationTrigger, Preserve, QueryBuilder, VisitOptions};
use crate::props::PageProps;
use crate::reactive::ReadSignal;
use crate::settings::Settings;

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
	/// Ascending order
	#[default]
	#[serde(rename = "asc", alias = "ascending", alias = "ASC")]
	Ascending,
	/// Descending order
	#[serde(rename = "desc", alias = "descending", alias = "DESC")]
	Descending,
}

impl SortDirection {
	/// Returns the opposite direction
	pub fn toggle(&self) -> Self {
		match self {
			Self::Ascending => Self::Descending,
			Self::Descending => Self::Ascending,
		}
	}

	/// Query parameter value
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Ascending => "asc",
			Self::Descending => "desc",
		}
	}
}

impl fmt::Display for SortDirection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Server-confirmed sort of one listing
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSnapshot {
	/// Sorted field; empty when the listing is unsorted
	pub field: String,
	/// Direction
	pub direction: SortDirection,
}

impl SortSnapshot {
	/// Create a snapshot
	pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
		Self {
			field: field.into(),
			direction,
		}
	}

	/// Sort requested by selecting `field`
	///
	/// Selecting the sorted field flips the direction; any other field starts
	/// ascending.
	pub fn next(&self, field: &str) -> Self {
		if self.field == field {
			Self::new(field, self.direction.toggle())
		} else {
			Self::new(field, SortDirection::Ascending)
		}
	}
}

/// Sort configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOptions {
	/// Query parameter carrying the field
	pub sort_param: String,
	/// Query parameter carrying the direction
	pub direction_param: String,
	/// Page parameter dropped on every sort change
	pub page_param: String,
	/// Options for every visit
	pub navigation: VisitOptions,
}

impl Default for SortOptions {
	fn default() -> Self {
		Self::from(&Settings::default())
	}
}

impl SortOptions {
	/// Set the visit options
	pub fn with_navigation(mut self, navigation: VisitOptions) -> Self {
		self.navigation = navigation;
		self
	}
}

impl From<&Settings> for SortOptions {
	fn from(settings: &Settings) -> Self {
		Self {
			sort_param: settings.sorting.sort_param.clone(),
			direction_param: settings.sorting.direction_param.clone(),
			page_param: settings.sorting.page_param.clone(),
			navigation: settings.navigation.clone(),
		}
	}
}

/// Sort transitions for one listing
///
/// # Example
///
/// ```
/// use reinhardt_page_state::PageContext;
/// use reinhardt_page_state::navigation::StaticLocation;
/// use reinhardt_page_state::reactive::ReadSignal;
/// use reinhardt_page_state::scheduler::VirtualScheduler;
/// use reinhardt_page_state::sorting::{SortDirection, SortOptions, SortSnapshot, SortState};
/// use reinhardt_page_state::testing::RecordingNavigator;
/// use std::rc::Rc;
///
/// let navigator = Rc::new(RecordingNavigator::new());
/// let ctx = PageContext::new(
///     Rc::new(VirtualScheduler::new()),
///     navigator.clone(),
///     Rc::new(StaticLocation::new("/users?page=2")),
/// );
/// let sort = SortState::new(
///     &ctx,
///     ReadSignal::constant(SortSnapshot::new("name", SortDirection::Ascending)),
///     SortOptions::default(),
/// );
///
/// sort.sort_by("name");
/// assert_eq!(navigator.last_url().as_deref(), Some("/users?sort=name&direction=desc"));
/// ```
pub struct SortState {
	ctx: PageContext,
	current: ReadSignal<SortSnapshot>,
	options: SortOptions,
	trigger: NavigationTrigger,
	disposed: Cell<bool>,
}

impl SortState {
	/// Create a sort state following `current`
	pub fn new(ctx: &PageContext, current: ReadSignal<SortSnapshot>, options: SortOptions) -> Self {
		Self {
			ctx: ctx.clone(),
			current,
			options,
			trigger: ctx.trigger(),
			disposed: Cell::new(false),
		}
	}

	/// Create a sort state following the prop at `key`
	pub fn from_props(ctx: &PageContext, props: &PageProps, key: &str, options: SortOptions) -> Self {
		Self::new(ctx, props.select_as::<SortSnapshot>(key), options)
	}

	/// Request the listing sorted by `field`
	///
	/// The new order is only visible once the server confirms it.
	pub fn sort_by(&self, field: &str) {
		if self.disposed.get() {
			return;
		}
		if field.is_empty() {
			tracing::debug!("refusing sort by empty field");
			return;
		}
		let next = self.current.with(|current| current.next(field));
		let url = QueryBuilder::new(&self.ctx.href())
			.preserve(Preserve::All)
			.strip(self.options.page_param.as_str())
			.set(self.options.sort_param.as_str(), next.field.as_str())
			.set(self.options.direction_param.as_str(), next.direction.as_str())
			.build();
		tracing::debug!(field = %next.field, direction = %next.direction, "sort requested");
		self.trigger.navigate(url, &self.options.navigation);
	}

	/// Whether the listing is sorted by `field`
	pub fn is_sorted_by(&self, field: &str) -> bool {
		self.current.with(|current| current.field == field)
	}

	/// Direction of `field` if it is the sorted one
	pub fn direction_for(&self, field: &str) -> Option<SortDirection> {
		self.current
			.with(|current| (current.field == field).then_some(current.direction))
	}

	/// Sorted field
	pub fn field(&self) -> ReadSignal<String> {
		self.current.map(|current| current.field.clone())
	}

	/// Sort direction
	pub fn direction(&self) -> ReadSignal<SortDirection> {
		self.current.map(|current| current.direction)
	}

	/// Latest confirmed sort
	pub fn snapshot(&self) -> SortSnapshot {
		self.current.get()
	}

	/// Whether a visit issued by this state is in flight
	pub fn is_loading(&self) -> ReadSignal<bool> {
		self.trigger.is_loading()
	}

	/// Stop navigating and ignore outstanding visits
	pub fn dispose(&self) {
		if self.disposed.replace(true) {
			return;
		}
		self.trigger.dispose();
	}

	/// Whether [`dispose`](Self::dispose) has run
	pub fn is_disposed(&self) -> bool {
		self.disposed.get()
	}
}

impl Drop for SortState {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl fmt::Debug for SortState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SortState")
			.field("current", &self.current.get())
			.field("disposed", &self.disposed.get())
			.finish()
	}
}
