//! Pagination state for listings
//!
//! The server delivers a paginator snapshot per listing:
//!
//! ```json
//! {
//!   "data": [...],
//!   "current_page": 2, "last_page": 5, "per_page": 15, "total": 70,
//!   "from": 16, "to": 30,
//!   "links": [
//!     { "url": "/users?page=1", "label": "&laquo; Previous", "active": false },
//!     { "url": "/users?page=1", "label": "1", "active": false },
//!     { "url": "/users?page=2", "label": "2", "active": true },
//!     { "url": null, "label": "...", "active": false },
//!     { "url": "/users?page=3", "label": "Next &raquo;", "active": false }
//!   ]
//! }
//! ```
//!
//! [`PaginationState`] derives [`PaginationMeta`] from it and issues page and
//! page-size transitions. Out-of-range requests are refused without a visit.

use std::cell::Cell;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::context::PageContext;
use crate::navigation::{NavigationTrigger, Preserve, QueryBuilder, VisitOptions};
use crate::props::PageProps;
use crate::reactive::ReadSignal;
use crate::settings::Settings;

/// One raw entry of a paginator's `links`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLink {
	/// Target, `None` for separators
	pub url: Option<String>,
	/// Display label
	pub label: String,
	/// Whether this is the current page
	pub active: bool,
}

/// Server-delivered paginator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginatorSnapshot<T> {
	/// Items of the current page
	pub data: Vec<T>,
	/// Current page, 1-based
	pub current_page: u64,
	/// Last page
	pub last_page: u64,
	/// Page size
	pub per_page: u64,
	/// Total number of items
	pub total: u64,
	/// 1-based index of the first item shown
	pub from: Option<u64>,
	/// 1-based index of the last item shown
	pub to: Option<u64>,
	/// Page links, previous/next controls included
	pub links: Vec<RawLink>,
}

impl<T> Default for PaginatorSnapshot<T> {
	fn default() -> Self {
		Self {
			data: Vec::new(),
			current_page: 1,
			last_page: 1,
			per_page: 0,
			total: 0,
			from: None,
			to: None,
			links: Vec::new(),
		}
	}
}

/// One numbered page link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
	/// Page number, `None` for separators
	pub page: Option<u64>,
	/// Display label
	pub label: String,
	/// Whether this is the current page
	pub is_active: bool,
	/// Target
	pub url: Option<String>,
}

/// Page metadata derived from a [`PaginatorSnapshot`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationMeta {
	/// 1-based page being shown
	pub current_page: u64,
	/// Highest page number
	pub last_page: u64,
	/// Items per page
	pub per_page: u64,
	/// Item count across all pages
	pub total: u64,
	/// Index of the first item shown; 0 for an empty page
	pub range_start: u64,
	/// Index of the last item shown; 0 for an empty page
	pub range_end: u64,
	/// Numbered links in delivery order, previous/next controls removed
	pub links: Vec<PageLink>,
}

impl PaginationMeta {
	/// Derive metadata, reading link page numbers from `page_param`
	pub fn from_snapshot<T>(snapshot: &PaginatorSnapshot<T>, page_param: &str) -> Self {
		Self {
			current_page: snapshot.current_page,
			last_page: snapshot.last_page,
			per_page: snapshot.per_page,
			total: snapshot.total,
			range_start: snapshot.from.unwrap_or(0),
			range_end: snapshot.to.unwrap_or(0),
			links: page_links(&snapshot.links, page_param),
		}
	}

	/// Whether there is no previous page
	pub fn is_first_page(&self) -> bool {
		self.current_page <= 1
	}

	/// Whether there is no next page
	pub fn is_last_page(&self) -> bool {
		self.current_page >= self.last_page
	}

	/// Whether there is more than one page
	pub fn has_pages(&self) -> bool {
		self.last_page > 1
	}
}

/// Strip the previous/next controls (first and last entries) and number the rest
fn page_links(raw: &[RawLink], page_param: &str) -> Vec<PageLink> {
	if raw.len() < 2 {
		return Vec::new();
	}
	raw[1..raw.len() - 1]
		.iter()
		.map(|link| PageLink {
			page: link
				.url
				.as_deref()
				.and_then(|url| page_number(url, page_param).or_else(|| link.label.trim().parse().ok())),
			label: link.label.clone(),
			is_active: link.active,
			url: link.url.clone(),
		})
		.collect()
}

fn page_number(href: &str, page_param: &str) -> Option<u64> {
	let url = Url::parse(href)
		.or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(href)))
		.ok()?;
	url.query_pairs()
		.find(|(key, _)| key == page_param)
		.and_then(|(_, value)| value.parse().ok())
}

/// Pagination configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationOptions {
	/// Query parameter carrying the page number
	pub page_param: String,
	/// Query parameter carrying the page size
	pub per_page_param: String,
	/// Options for every visit
	pub navigation: VisitOptions,
}

impl Default for PaginationOptions {
	fn default() -> Self {
		Self::from(&Settings::default())
	}
}

impl PaginationOptions {
	/// Set the visit options
	pub fn with_navigation(mut self, navigation: VisitOptions) -> Self {
		self.navigation = navigation;
		self
	}
}

impl From<&Settings> for PaginationOptions {
	fn from(settings: &Settings) -> Self {
		Self {
			page_param: settings.pagination.page_param.clone(),
			per_page_param: settings.pagination.per_page_param.clone(),
			navigation: settings.navigation.clone(),
		}
	}
}

/// Page transitions for one listing
pub struct PaginationState<T: 'static> {
	ctx: PageContext,
	snapshot: ReadSignal<PaginatorSnapshot<T>>,
	options: PaginationOptions,
	trigger: NavigationTrigger,
	disposed: Cell<bool>,
}

impl<T: Clone + 'static> PaginationState<T> {
	/// Create a pagination state following `snapshot`
	pub fn new(
		ctx: &PageContext,
		snapshot: ReadSignal<PaginatorSnapshot<T>>,
		options: PaginationOptions,
	) -> Self {
		Self {
			ctx: ctx.clone(),
			snapshot,
			options,
			trigger: ctx.trigger(),
			disposed: Cell::new(false),
		}
	}

	/// Create a pagination state following the paginator prop at `key`
	pub fn from_props(ctx: &PageContext, props: &PageProps, key: &str, options: PaginationOptions) -> Self
	where
		T: DeserializeOwned,
	{
		Self::new(ctx, props.select_as::<PaginatorSnapshot<T>>(key), options)
	}

	/// Go to page `page`
	///
	/// Refused when `page` is outside `1..=last_page` or already current.
	pub fn go_to_page(&self, page: u64) {
		if self.disposed.get() {
			return;
		}
		let (current, last, per_page) = self
			.snapshot
			.with(|s| (s.current_page, s.last_page, s.per_page));
		if page < 1 || page > last || page == current {
			tracing::debug!(page, current, last, "refusing page change");
			return;
		}
		self.visit(page, per_page);
	}

	/// Go to the following page unless on the last one
	pub fn next_page(&self) {
		let (current, last) = self.snapshot.with(|s| (s.current_page, s.last_page));
		if current >= last {
			tracing::debug!(current, "already on the last page");
			return;
		}
		self.go_to_page(current + 1);
	}

	/// Go to the preceding page unless on the first one
	pub fn prev_page(&self) {
		let current = self.snapshot.with(|s| s.current_page);
		if current <= 1 {
			tracing::debug!(current, "already on the first page");
			return;
		}
		self.go_to_page(current - 1);
	}

	/// Change the page size, returning to the first page
	pub fn update_per_page(&self, per_page: u64) {
		if self.disposed.get() {
			return;
		}
		if per_page == 0 {
			tracing::debug!("refusing empty page size");
			return;
		}
		self.visit(1, per_page);
	}

	fn visit(&self, page: u64, per_page: u64) {
		let url = QueryBuilder::new(&self.ctx.href())
			.preserve(Preserve::All)
			.set(self.options.page_param.as_str(), page.to_string())
			.set(self.options.per_page_param.as_str(), per_page.to_string())
			.build();
		self.trigger.navigate(url, &self.options.navigation);
	}

	/// Page metadata
	pub fn meta(&self) -> ReadSignal<PaginationMeta> {
		let page_param = self.options.page_param.clone();
		self.snapshot
			.map(move |snapshot| PaginationMeta::from_snapshot(snapshot, &page_param))
	}

	/// Items of the current page
	pub fn items(&self) -> ReadSignal<Vec<T>> {
		self.snapshot.map(|snapshot| snapshot.data.clone())
	}

	/// Whether the current page is the first one
	pub fn is_first_page(&self) -> ReadSignal<bool> {
		self.snapshot.map(|snapshot| snapshot.current_page <= 1)
	}

	/// Whether the current page is the last one
	pub fn is_last_page(&self) -> ReadSignal<bool> {
		self.snapshot
			.map(|snapshot| snapshot.current_page >= snapshot.last_page)
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

impl<T: 'static> Drop for PaginationState<T> {
	fn drop(&mut self) {
		self.disposed.set(true);
		self.trigger.dispose();
	}
}

impl<T: 'static> fmt::Debug for PaginationState<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let (current, last) = self.snapshot.with(|s| (s.current_page, s.last_page));
		f.debug_struct("PaginationState")
			.field("current_page", &current)
			.field("last_page", &last)
			.field("disposed", &self.disposed.get())
			.finish()
	}
}
