//! Filter Synchronization Integration Tests
//!
//! Tests for debounced and immediate filter synchronization, URL construction
//! and re-seeding from server-confirmed defaults.
//!
//! Success Criteria:
//! 1. Rapid updates to a debounced field produce one visit after the quiet period
//! 2. Fields without a debounce sync immediately
//! 3. Only active fields reach the query string
//! 4. Every filter change drops the page parameter
//! 5. A round trip that redelivers the same baseline keeps the applied values
//! 6. Changed defaults re-seed the record

use reinhardt_page_state::PageContext;
use reinhardt_page_state::filters::{FieldMap, FilterOptions, FilterState};
use reinhardt_page_state::navigation::{Location, StaticLocation};
use reinhardt_page_state::props::PageProps;
use reinhardt_page_state::reactive::ReadSignal;
use reinhardt_page_state::scheduler::VirtualScheduler;
use reinhardt_page_state::testing::RecordingNavigator;
use rstest::rstest;
use serde_json::{Value, json};
use std::rc::Rc;
use std::time::Duration;

fn ms(n: u64) -> Duration {
	Duration::from_millis(n)
}

fn fields(value: Value) -> FieldMap {
	value.as_object().cloned().unwrap_or_default()
}

struct Page {
	scheduler: Rc<VirtualScheduler>,
	location: Rc<StaticLocation>,
	navigator: Rc<RecordingNavigator>,
	ctx: PageContext,
}

fn page(href: &str) -> Page {
	let scheduler = Rc::new(VirtualScheduler::new());
	let location = Rc::new(StaticLocation::new(href));
	let navigator = Rc::new(RecordingNavigator::with_location(location.clone()));
	let ctx = PageContext::new(scheduler.clone(), navigator.clone(), location.clone());
	Page {
		scheduler,
		location,
		navigator,
		ctx,
	}
}

fn search_filters(page: &Page) -> FilterState {
	FilterState::new(
		&page.ctx,
		ReadSignal::constant(fields(json!({ "search": "", "status": "all" }))),
		FilterOptions::default().with_debounce("search", ms(300)),
	)
}

/// Tests that three rapid updates produce a single visit
#[rstest]
fn test_rapid_updates_collapse_into_one_visit() {
	let page = page("/users");
	let filters = search_filters(&page);

	filters.update("search", "a");
	page.scheduler.advance(ms(100));
	filters.update("search", "an");
	page.scheduler.advance(ms(100));
	filters.update("search", "ann");
	assert_eq!(filters.value("search").get(), json!("ann"));

	page.scheduler.advance(ms(299));
	assert_eq!(page.navigator.visit_count(), 0);
	assert_eq!(filters.pending_fields(), vec!["search"]);

	page.scheduler.advance(ms(1));
	assert_eq!(page.navigator.urls(), vec!["/users?search=ann"]);
	assert!(filters.pending_fields().is_empty());
}

/// Tests that a field without a debounce syncs with no scheduled delay
#[rstest]
fn test_non_debounced_field_syncs_immediately() {
	let page = page("/users");
	let filters = search_filters(&page);

	filters.update("status", "banned");

	assert_eq!(page.navigator.urls(), vec!["/users?status=banned"]);
	assert_eq!(page.scheduler.pending(), 0);
}

/// Tests that inactive fields never reach the URL
#[rstest]
fn test_only_active_fields_in_url() {
	let page = page("/users");
	let filters = search_filters(&page);

	filters.update("search", "test");
	page.scheduler.advance(ms(300));

	let url = page.navigator.last_url().unwrap();
	assert!(url.contains("search=test"));
	assert!(!url.contains("status"));
}

/// Tests that a stale filter value in the location is replaced
#[rstest]
fn test_stale_location_filters_replaced() {
	let page = page("/users?status=banned&search=old");
	let filters = search_filters(&page);

	filters.update("search", "new");
	page.scheduler.advance(ms(300));

	assert_eq!(page.navigator.last_url().as_deref(), Some("/users?search=new"));
}

/// Tests that synchronizing from page 3 drops the page parameter
#[rstest]
#[case("/users?page=3")]
#[case("/users?search=x&page=3")]
fn test_sync_drops_page(#[case] href: &str) {
	let page = page(href);
	let filters = search_filters(&page);

	filters.update("status", "active");

	let url = page.navigator.last_url().unwrap();
	assert!(!url.contains("page"));
}

/// Tests that reset always visits, even when nothing changed
#[rstest]
fn test_reset_visits() {
	let page = page("/users?status=banned");
	let filters = search_filters(&page);

	filters.reset();
	assert_eq!(page.navigator.urls(), vec!["/users"]);
}

/// Tests that JSON values are encoded the way the server reads them
#[rstest]
fn test_structured_values_encoded() {
	let page = page("/posts");
	let filters = FilterState::new(
		&page.ctx,
		ReadSignal::constant(fields(json!({ "tags": [], "published": null }))),
		FilterOptions::default(),
	);

	filters.update_many(fields(json!({ "tags": ["rust", "web"], "published": true })));
	assert_eq!(
		page.navigator.last_url().as_deref(),
		Some("/posts?published=true&tags%5B%5D=rust&tags%5B%5D=web")
	);
}

/// Tests a full round trip: the server redelivers the unchanged baseline
#[rstest]
fn test_round_trip_keeps_applied_values() {
	let page = page("/users");
	let props = PageProps::new(json!({
		"filters": { "search": "", "status": "all" },
		"users": [],
	}));
	let filters = FilterState::from_props(
		&page.ctx,
		&props,
		"filters",
		FilterOptions::default().with_debounce("search", ms(300)),
	);
	let loading = filters.is_loading();
	let dirty = filters.is_dirty();

	let server = props.clone();
	page.navigator.respond_with(move |_url| {
		server.replace(json!({
			"filters": { "search": "", "status": "all" },
			"users": [{ "id": 1 }],
		}));
	});

	filters.update("status", "active");
	assert!(loading.get());
	page.navigator.complete_next();

	assert!(!loading.get());
	assert_eq!(page.location.href(), "/users?status=active");
	assert_eq!(filters.value("status").get(), json!("active"));
	assert!(dirty.get());
	assert_eq!(filters.active_count().get(), 1);

	filters.update("search", "x");
	page.scheduler.advance(ms(300));
	assert_eq!(
		page.navigator.last_url().as_deref(),
		Some("/users?search=x&status=active")
	);
}

/// Tests that a partial reload of unrelated props keeps pending input
#[rstest]
fn test_partial_reload_keeps_pending_debounce() {
	let page = page("/users");
	let props = PageProps::new(json!({
		"filters": { "search": "", "status": "all" },
		"users": [],
	}));
	let filters = FilterState::from_props(
		&page.ctx,
		&props,
		"filters",
		FilterOptions::default().with_debounce("search", ms(300)),
	);

	filters.update("search", "ann");
	props.merge(fields(json!({ "users": [1, 2] })));
	assert_eq!(filters.value("search").get(), json!("ann"));

	page.scheduler.advance(ms(300));
	assert_eq!(page.navigator.urls(), vec!["/users?search=ann"]);
}

/// Tests that defaults the server actually changed re-seed the record
#[rstest]
fn test_changed_defaults_reseed_record() {
	let page = page("/users");
	let props = PageProps::new(json!({ "filters": { "search": "", "status": "all" } }));
	let filters = FilterState::from_props(
		&page.ctx,
		&props,
		"filters",
		FilterOptions::default().with_debounce("search", ms(300)),
	);
	let dirty = filters.is_dirty();

	let server = props.clone();
	page.navigator.respond_with(move |_url| {
		server.replace(json!({ "filters": { "search": "", "status": "active" } }));
	});

	filters.update("status", "active");
	filters.update("search", "pending");
	page.navigator.complete_next();

	assert_eq!(filters.value("status").get(), json!("active"));
	assert_eq!(filters.value("search").get(), json!(""));
	assert!(filters.pending_fields().is_empty());
	assert!(!dirty.get());
	assert_eq!(filters.active_count().get(), 0);
}

/// Tests that a failed round trip clears the busy flag and keeps local values
#[rstest]
fn test_failed_round_trip() {
	let page = page("/users");
	let filters = search_filters(&page);
	let loading = filters.is_loading();

	filters.update("status", "banned");
	page.navigator.fail_next();

	assert!(!loading.get());
	assert_eq!(filters.value("status").get(), json!("banned"));
	assert_eq!(page.location.href(), "/users");
}
