//! Flash Lifecycle Integration Tests
//!
//! Tests for notice admission, deduplication and the auto-dismiss countdown
//! driven by simulated time.
//!
//! Success Criteria:
//! 1. The same identified payload ingested twice yields one visible notice
//! 2. Auto-dismissing notices disappear once their delay elapses
//! 3. Notices with auto-dismiss disabled stay until dismissed
//! 4. The countdown only decreases and stays within bounds
//!
//! Test Categories:
//! - Category 1: Deduplication
//! - Category 2: Auto-dismiss
//! - Category 3: Props binding

use reinhardt_page_state::flash::{AutoDismiss, FlashManager, FlashOptions, NoticeKind, NoticePayload};
use reinhardt_page_state::props::PageProps;
use reinhardt_page_state::scheduler::VirtualScheduler;
use reinhardt_page_state::settings::AutoDismissDefaults;
use rstest::{fixture, rstest};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

fn ms(n: u64) -> Duration {
	Duration::from_millis(n)
}

#[fixture]
fn scheduler() -> Rc<VirtualScheduler> {
	Rc::new(VirtualScheduler::new())
}

fn manager(scheduler: &Rc<VirtualScheduler>) -> FlashManager {
	FlashManager::new(scheduler.clone(), FlashOptions::default())
}

// ============================================================================
// Category 1: Deduplication
// ============================================================================

/// Tests that an identified payload is admitted once
#[rstest]
fn test_identified_payload_admitted_once(scheduler: Rc<VirtualScheduler>) {
	let flash = manager(&scheduler);
	let payload = NoticePayload::new(NoticeKind::Success, "Profile updated").with_id("flash-1");

	flash.ingest(&[payload.clone()]);
	flash.ingest(&[payload]);

	assert_eq!(flash.messages().get().len(), 1);
	assert_eq!(flash.messages().get()[0].id, "flash-1");
}

/// Tests that payloads without an id are deduplicated by content
#[rstest]
fn test_anonymous_payload_deduplicated_by_content(scheduler: Rc<VirtualScheduler>) {
	let flash = manager(&scheduler);
	let first: NoticePayload =
		serde_json::from_value(json!({ "type": "success", "message": "Saved" })).unwrap();
	let again: NoticePayload =
		serde_json::from_value(json!({ "kind": "success", "text": "Saved" })).unwrap();

	assert_eq!(flash.ingest(&[first]), 1);
	assert_eq!(flash.ingest(&[again]), 0);
}

/// Tests that listeners see every admitted notice exactly once, in order
#[rstest]
fn test_listeners_see_admissions_in_order(scheduler: Rc<VirtualScheduler>) {
	let flash = manager(&scheduler);
	let seen = Rc::new(RefCell::new(Vec::new()));
	let log = seen.clone();
	let _subscription = flash.on_notice(move |notice| log.borrow_mut().push(notice.id.clone()));

	flash.ingest(&[
		NoticePayload::new(NoticeKind::Info, "a").with_id("1"),
		NoticePayload::new(NoticeKind::Info, "b").with_id("2"),
	]);
	flash.ingest(&[
		NoticePayload::new(NoticeKind::Info, "b").with_id("2"),
		NoticePayload::new(NoticeKind::Info, "c").with_id("3"),
	]);

	assert_eq!(*seen.borrow(), vec!["1", "2", "3"]);
}

// ============================================================================
// Category 2: Auto-dismiss
// ============================================================================

/// Tests that a 3000 ms notice is gone after 3000 ms
#[rstest]
fn test_auto_dismiss_after_delay(scheduler: Rc<VirtualScheduler>) {
	let flash = manager(&scheduler);
	flash.ingest(&[NoticePayload::new(NoticeKind::Success, "Saved")
		.with_id("s")
		.with_auto_dismiss(AutoDismiss::After(ms(3_000)))]);
	assert!(flash.get("s").is_some());

	scheduler.advance(ms(2_999));
	assert!(flash.get("s").is_some());

	scheduler.advance(ms(1));
	assert!(flash.get("s").is_none());
	assert!(!flash.has_messages().get());
	assert_eq!(scheduler.pending(), 0);
}

/// Tests that a notice with auto-dismiss disabled survives 10 seconds
#[rstest]
fn test_disabled_auto_dismiss_persists(scheduler: Rc<VirtualScheduler>) {
	let flash = manager(&scheduler);
	flash.ingest(&[NoticePayload::new(NoticeKind::Success, "Read me")
		.with_id("p")
		.with_auto_dismiss(AutoDismiss::Disabled)]);

	scheduler.advance(ms(10_000));

	let notice = flash.get("p").unwrap();
	assert!(!notice.is_auto_dismissing());
	assert_eq!(notice.remaining_percent, 100.0);
}

/// Tests countdown bounds and monotonicity for a 1000 ms notice
#[rstest]
fn test_countdown_decreases_within_bounds(scheduler: Rc<VirtualScheduler>) {
	let flash = manager(&scheduler);
	flash.ingest(&[NoticePayload::new(NoticeKind::Info, "Tick")
		.with_id("t")
		.with_auto_dismiss(AutoDismiss::After(ms(1_000)))]);
	assert_eq!(flash.get("t").unwrap().remaining_percent, 100.0);

	let mut previous = 100.0;
	for _ in 0..10 {
		scheduler.advance(ms(50));
		let remaining = flash.get("t").unwrap().remaining_percent;
		assert!(remaining < previous);
		assert!(remaining > 0.0 && remaining < 100.0);
		previous = remaining;
	}
	assert!((previous - 50.0).abs() < 1e-9);
}

/// Tests that per-kind defaults apply when the payload has no delay
#[rstest]
fn test_per_kind_defaults(scheduler: Rc<VirtualScheduler>) {
	let options = FlashOptions::default().with_auto_dismiss(AutoDismissDefaults {
		success: 1_000,
		info: 0,
		warning: 2_000,
		error: 0,
	});
	let flash = FlashManager::new(scheduler.clone(), options);
	flash.ingest(&[
		NoticePayload::new(NoticeKind::Success, "ok"),
		NoticePayload::new(NoticeKind::Info, "fyi"),
		NoticePayload::new(NoticeKind::Warning, "careful"),
	]);

	scheduler.advance(ms(1_000));
	assert_eq!(flash.messages().get().len(), 2);
	scheduler.advance(ms(1_000));
	let left: Vec<NoticeKind> = flash.messages().get().iter().map(|n| n.kind).collect();
	assert_eq!(left, vec![NoticeKind::Info]);
}

/// Tests that a custom progress interval changes the tick rate
#[rstest]
fn test_custom_progress_interval(scheduler: Rc<VirtualScheduler>) {
	let options = FlashOptions::default().with_progress_interval(ms(250));
	let flash = FlashManager::new(scheduler.clone(), options);
	flash.ingest(&[NoticePayload::new(NoticeKind::Info, "slow")
		.with_id("slow")
		.with_auto_dismiss(AutoDismiss::After(ms(1_000)))]);

	scheduler.advance(ms(200));
	assert_eq!(flash.get("slow").unwrap().remaining_percent, 100.0);
	scheduler.advance(ms(50));
	assert!((flash.get("slow").unwrap().remaining_percent - 75.0).abs() < 1e-9);
}

// ============================================================================
// Category 3: Props binding
// ============================================================================

/// Tests that partial reloads redelivering the same flash do not duplicate it
#[rstest]
fn test_redelivered_flash_not_duplicated(scheduler: Rc<VirtualScheduler>) {
	let flash = manager(&scheduler);
	let props = PageProps::new(json!({
		"flash": { "messages": [{ "id": 9, "kind": "error", "text": "Denied" }] },
	}));
	flash.bind(&props);

	let mut partial = serde_json::Map::new();
	partial.insert("users".to_string(), json!([]));
	props.merge(partial);
	props.replace(props.get());

	assert_eq!(flash.messages().get().len(), 1);
	assert_eq!(flash.messages().get()[0].id, "9");
}

/// Tests that a missing flash payload ingests nothing
#[rstest]
fn test_missing_flash_payload(scheduler: Rc<VirtualScheduler>) {
	let flash = manager(&scheduler);
	let props = PageProps::new(json!({ "auth": { "user": null } }));
	flash.bind(&props);
	assert!(!flash.has_messages().get());
}
