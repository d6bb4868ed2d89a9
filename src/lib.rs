//! # Reinhardt Page State
//!
//! Typed client-side state bindings for server-driven Reinhardt pages.
//!
//! A page receives its props from the server on every round trip. This crate
//! turns those props into small reactive components:
//!
//! - [`flash::FlashManager`] - visible flash notices with dedup and auto-dismiss
//! - [`filters::FilterState`] - filter fields with per-field debounce
//! - [`sorting::SortState`] - sort field/direction toggling
//! - [`pagination::PaginationState`] - page and page-size transitions
//!
//! Components never mutate the server-confirmed state. A transition builds a
//! URL with [`navigation::QueryBuilder`], dispatches it through a
//! [`navigation::NavigationTrigger`], and the views re-derive when the server
//! redelivers props.
//!
//! ## Runtime model
//!
//! Everything is single-threaded and callback driven. Timers go through a
//! [`scheduler::Scheduler`]; [`scheduler::VirtualScheduler`] gives tests full
//! control of time and the `tokio` feature adds a `LocalSet`-based driver.
//! Every component cancels its timers when disposed or dropped.
//!
//! ## Feature Flags
//!
//! - `tokio` - `scheduler::TokioScheduler`
//!
//! ## Quick Example
//!
//! ```
//! use reinhardt_page_state::prelude::*;
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let location = Rc::new(StaticLocation::new("/users?sort=name&direction=asc"));
//! let navigator = Rc::new(RecordingNavigator::with_location(location.clone()));
//! let ctx = PageContext::new(Rc::new(VirtualScheduler::new()), navigator.clone(), location);
//!
//! let props = PageProps::new(json!({ "sort": { "field": "name", "direction": "asc" } }));
//! let sort = SortState::from_props(&ctx, &props, "sort", SortOptions::default());
//!
//! sort.sort_by("name");
//! assert!(sort.is_loading().get());
//! assert_eq!(navigator.last_url().as_deref(), Some("/users?sort=name&direction=desc"));
//! ```

pub mod context;
pub mod error;
pub mod filters;
pub mod flash;
pub mod navigation;
pub mod pagination;
pub mod props;
pub mod reactive;
pub mod scheduler;
pub mod settings;
pub mod sorting;
pub mod testing;

pub use context::PageContext;
pub use error::{PageStateError, Result};
pub use settings::Settings;

/// Common imports
pub mod prelude {
	pub use crate::context::PageContext;
	pub use crate::error::{PageStateError, Result};
	pub use crate::filters::{FieldMap, FilterOptions, FilterState};
	pub use crate::flash::{
		AutoDismiss, FlashManager, FlashOptions, Notice, NoticeAction, NoticeKind, NoticePayload,
	};
	pub use crate::navigation::{
		HistoryMode, Location, NavigationTrigger, Navigator, Preserve, QueryBuilder, StaticLocation,
		Visit, VisitOptions, VisitOutcome,
	};
	pub use crate::pagination::{
		PageLink, PaginationMeta, PaginationOptions, PaginationState, PaginatorSnapshot,
	};
	pub use crate::props::{Breadcrumb, PageProps, SharedProps};
	pub use crate::reactive::{ReadSignal, Signal, Subscription};
	pub use crate::scheduler::{Scheduler, TimerId, VirtualScheduler};
	pub use crate::settings::Settings;
	pub use crate::sorting::{SortDirection, SortOptions, SortSnapshot, SortState};
	pub use crate::testing::RecordingNavigator;

	#[cfg(feature = "tokio")]
	pub use crate::scheduler::TokioScheduler;
}
