//! Flash notices
//!
//! The server redelivers the full `flash.messages` list on every round trip.
//! A [`FlashManager`] turns that stream into the set of notices currently on
//! screen: it admits each entry once, runs the auto-dismiss countdown and
//! notifies listeners of new arrivals.
//!
//! ## Lifecycle
//!
//! ```text
//! admitted ──(auto-dismiss)──> counting down ──> dismissed
//!     └──────────(manual dismiss / dismiss_all)──────┘
//! ```

mod manager;
mod notice;

pub use manager::{FlashManager, FlashOptions};
pub use notice::{AutoDismiss, Notice, NoticeAction, NoticeKind, NoticePayload};
