//! Observable state primitives
//!
//! Page-state components keep their state in [`Signal`]s and expose
//! [`ReadSignal`] views. Derived views (`meta`, `is_dirty`, ...) are plain
//! recomputations over the latest snapshot, refreshed through
//! [`ReadSignal::map`].
//!
//! Everything here is single-threaded (`Rc`-based); a page scope lives on one
//! event loop.

mod signal;

pub use signal::{ReadSignal, Signal, Subscription};
