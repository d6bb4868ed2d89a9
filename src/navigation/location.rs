//! Current-location access
//!
//! The browser location is the one resource shared by every synchronizing
//! component. Components only ever read it; it changes as a consequence of a
//! round trip performed by the [`Navigator`](super::Navigator).

use std::cell::RefCell;

/// Read access to the current location
pub trait Location {
	/// Current location as an absolute URL or an origin-relative `path?query`
	fn href(&self) -> String;
}

/// A location held in memory
///
/// Used for server-side rendering, where there is no browser location, and by
/// test doubles simulating the navigation collaborator.
#[derive(Debug, Default)]
pub struct StaticLocation {
	href: RefCell<String>,
}

impl StaticLocation {
	/// Create a location pointing at `href`
	pub fn new(href: impl Into<String>) -> Self {
		Self {
			href: RefCell::new(href.into()),
		}
	}

	/// Point the location somewhere else
	pub fn set(&self, href: impl Into<String>) {
		*self.href.borrow_mut() = href.into();
	}
}

impl Location for StaticLocation {
	fn href(&self) -> String {
		self.href.borrow().clone()
	}
}
