//! URL construction and round-trip dispatch
//!
//! - [`QueryBuilder`]: pure location + params -> URL function
//! - [`NavigationTrigger`]: dispatches a [`Visit`] through the external
//!   [`Navigator`] and tracks a busy flag
//! - [`Location`]: read-only access to the current location

mod location;
mod query;
mod trigger;

pub use location::{Location, StaticLocation};
pub use query::{Preserve, QueryBuilder, is_blank};
pub use trigger::{HistoryMode, NavigationTrigger, Navigator, Visit, VisitOptions, VisitOutcome};
