//! Test doubles for the navigation collaborator
//!
//! [`RecordingNavigator`] records every visit and keeps it pending until the
//! test resolves it, optionally simulating the server by moving a
//! [`StaticLocation`] and running a responder that redelivers props.
//!
//! ```
//! use reinhardt_page_state::navigation::{NavigationTrigger, VisitOptions};
//! use reinhardt_page_state::testing::RecordingNavigator;
//! use std::rc::Rc;
//!
//! let navigator = Rc::new(RecordingNavigator::new());
//! let trigger = NavigationTrigger::new(navigator.clone());
//!
//! trigger.navigate("/users?page=2", &VisitOptions::default());
//! assert_eq!(navigator.last_url().as_deref(), Some("/users?page=2"));
//!
//! navigator.complete_next();
//! assert!(!trigger.is_loading().get());
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use crate::navigation::{Navigator, StaticLocation, Visit, VisitOptions, VisitOutcome};

type Responder = Rc<dyn Fn(&str)>;

/// A visit as seen by the navigator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedVisit {
	/// Requested URL
	pub url: String,
	/// Options the visit was issued with
	pub options: VisitOptions,
}

/// Navigator that records visits and resolves them on demand
#[derive(Default)]
pub struct RecordingNavigator {
	recorded: RefCell<Vec<RecordedVisit>>,
	pending: RefCell<VecDeque<Visit>>,
	location: Option<Rc<StaticLocation>>,
	responder: RefCell<Option<Responder>>,
}

impl RecordingNavigator {
	/// Create a navigator with no location attached
	pub fn new() -> Self {
		Self::default()
	}

	/// Move `location` to the visited URL whenever a visit completes
	pub fn with_location(location: Rc<StaticLocation>) -> Self {
		Self {
			location: Some(location),
			..Self::default()
		}
	}

	/// Run `responder` with the visited URL before a completion is reported
	///
	/// Typically used to redeliver page props the way the server would.
	pub fn respond_with(&self, responder: impl Fn(&str) + 'static) {
		*self.responder.borrow_mut() = Some(Rc::new(responder));
	}

	/// Every visit issued so far, oldest first
	pub fn visits(&self) -> Vec<RecordedVisit> {
		self.recorded.borrow().clone()
	}

	/// URLs of every visit issued so far
	pub fn urls(&self) -> Vec<String> {
		self.recorded.borrow().iter().map(|v| v.url.clone()).collect()
	}

	/// Number of visits issued so far
	pub fn visit_count(&self) -> usize {
		self.recorded.borrow().len()
	}

	/// URL of the most recent visit
	pub fn last_url(&self) -> Option<String> {
		self.recorded.borrow().last().map(|v| v.url.clone())
	}

	/// Number of visits not yet resolved
	pub fn pending_count(&self) -> usize {
		self.pending.borrow().len()
	}

	/// Complete the oldest pending visit, returning its URL
	pub fn complete_next(&self) -> Option<String> {
		let visit = self.pending.borrow_mut().pop_front()?;
		Some(self.resolve(visit, VisitOutcome::Completed))
	}

	/// Complete the newest pending visit, returning its URL
	pub fn complete_latest(&self) -> Option<String> {
		let visit = self.pending.borrow_mut().pop_back()?;
		Some(self.resolve(visit, VisitOutcome::Completed))
	}

	/// Fail the oldest pending visit, returning its URL
	pub fn fail_next(&self) -> Option<String> {
		let visit = self.pending.borrow_mut().pop_front()?;
		Some(self.resolve(visit, VisitOutcome::Failed))
	}

	/// Complete every pending visit in order
	pub fn complete_all(&self) -> usize {
		let mut count = 0;
		while self.complete_next().is_some() {
			count += 1;
		}
		count
	}

	fn resolve(&self, visit: Visit, outcome: VisitOutcome) -> String {
		let url = visit.url.clone();
		if outcome == VisitOutcome::Completed {
			if let Some(location) = &self.location {
				location.set(url.clone());
			}
			let responder = self.responder.borrow().clone();
			if let Some(responder) = responder {
				responder(&url);
			}
		}
		visit.finish(outcome);
		url
	}
}

impl Navigator for RecordingNavigator {
	fn visit(&self, visit: Visit) {
		self.recorded.borrow_mut().push(RecordedVisit {
			url: visit.url.clone(),
			options: visit.options.clone(),
		});
		self.pending.borrow_mut().push_back(visit);
	}
}

impl fmt::Debug for RecordingNavigator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RecordingNavigator")
			.field("recorded", &self.recorded.borrow())
			.field("pending", &self.pending.borrow().len())
			.finish()
	}
}
