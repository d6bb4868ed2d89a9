//! Page context shared by page-state components
//!
//! A [`PageContext`] bundles the collaborators every component of one page
//! scope needs: the timer driver, the navigation primitive and the current
//! location. Each component built from it owns its own timers and state.

use std::fmt;
use std::rc::Rc;

use crate::navigation::{Location, NavigationTrigger, Navigator};
use crate::scheduler::Scheduler;

/// Collaborators for one page scope
#[derive(Clone)]
pub struct PageContext {
	scheduler: Rc<dyn Scheduler>,
	navigator: Rc<dyn Navigator>,
	location: Rc<dyn Location>,
}

impl PageContext {
	/// Create a context from its collaborators
	///
	/// # Example
	///
	/// ```
	/// use reinhardt_page_state::PageContext;
	/// use reinhardt_page_state::navigation::StaticLocation;
	/// use reinhardt_page_state::scheduler::VirtualScheduler;
	/// use reinhardt_page_state::testing::RecordingNavigator;
	/// use std::rc::Rc;
	///
	/// let ctx = PageContext::new(
	///     Rc::new(VirtualScheduler::new()),
	///     Rc::new(RecordingNavigator::new()),
	///     Rc::new(StaticLocation::new("/users")),
	/// );
	/// assert_eq!(ctx.href(), "/users");
	/// ```
	pub fn new(
		scheduler: Rc<dyn Scheduler>,
		navigator: Rc<dyn Navigator>,
		location: Rc<dyn Location>,
	) -> Self {
		Self {
			scheduler,
			navigator,
			location,
		}
	}

	/// Timer driver
	pub fn scheduler(&self) -> &Rc<dyn Scheduler> {
		&self.scheduler
	}

	/// Navigation primitive
	pub fn navigator(&self) -> &Rc<dyn Navigator> {
		&self.navigator
	}

	/// Current location as seen right now
	pub fn href(&self) -> String {
		self.location.href()
	}

	/// Create a navigation trigger with its own busy flag
	pub fn trigger(&self) -> NavigationTrigger {
		NavigationTrigger::new(Rc::clone(&self.navigator))
	}
}

impl fmt::Debug for PageContext {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PageContext")
			.field("href", &self.location.href())
			.field("now", &self.scheduler.now())
			.finish()
	}
}
