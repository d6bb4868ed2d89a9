//! Navigation trigger
//!
//! Wraps the external round-trip primitive ([`Navigator`]) with the uniform
//! options contract used by every transition and a busy flag.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};

use crate::reactive::{ReadSignal, Signal};

/// How a visit affects the browser history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryMode {
	/// Add a new history entry
	Push,
	/// Replace the current history entry
	#[default]
	Replace,
}

/// Options passed with every visit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitOptions {
	/// Keep the scroll position after the round trip
	pub preserve_scroll: bool,
	/// History handling
	pub history: HistoryMode,
	/// Props to partially reload; `None` reloads every prop
	pub only: Option<Vec<String>>,
}

impl Default for VisitOptions {
	fn default() -> Self {
		Self {
			preserve_scroll: true,
			history: HistoryMode::Replace,
			only: None,
		}
	}
}

impl VisitOptions {
	/// Create options with default values
	pub fn new() -> Self {
		Self::default()
	}

	/// Set scroll preservation
	pub fn with_preserve_scroll(mut self, preserve: bool) -> Self {
		self.preserve_scroll = preserve;
		self
	}

	/// Set history handling
	pub fn with_history(mut self, history: HistoryMode) -> Self {
		self.history = history;
		self
	}

	/// Restrict the round trip to the named props
	pub fn with_only<I, S>(mut self, props: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.only = Some(props.into_iter().map(Into::into).collect());
		self
	}

	/// Whether the visit replaces the current history entry
	pub fn replace(&self) -> bool {
		self.history == HistoryMode::Replace
	}
}

/// How a round trip ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
	/// Fresh props were delivered
	Completed,
	/// The round trip failed or was abandoned
	Failed,
}

type FinishFn = Box<dyn FnOnce(VisitOutcome)>;

/// A round trip request handed to the [`Navigator`]
///
/// The navigator must call [`finish`](Self::finish) when the round trip ends.
/// A visit dropped without being finished counts as [`VisitOutcome::Failed`].
pub struct Visit {
	/// Target URL
	pub url: String,
	/// Visit options
	pub options: VisitOptions,
	on_finish: Option<FinishFn>,
}

impl Visit {
	/// Create a visit with a completion callback
	pub fn new(
		url: impl Into<String>,
		options: VisitOptions,
		on_finish: impl FnOnce(VisitOutcome) + 'static,
	) -> Self {
		Self {
			url: url.into(),
			options,
			on_finish: Some(Box::new(on_finish)),
		}
	}

	/// Report the end of the round trip
	pub fn finish(mut self, outcome: VisitOutcome) {
		if let Some(on_finish) = self.on_finish.take() {
			on_finish(outcome);
		}
	}
}

impl Drop for Visit {
	fn drop(&mut self) {
		if let Some(on_finish) = self.on_finish.take() {
			on_finish(VisitOutcome::Failed);
		}
	}
}

impl fmt::Debug for Visit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Visit")
			.field("url", &self.url)
			.field("options", &self.options)
			.field("finished", &self.on_finish.is_none())
			.finish()
	}
}

/// The external round-trip primitive
///
/// Implementations perform the request and eventually redeliver page props;
/// they are not expected to time out or retry.
pub trait Navigator {
	/// Start a round trip
	fn visit(&self, visit: Visit);
}

struct TriggerState {
	busy: Signal<bool>,
	generation: Cell<u64>,
	disposed: Cell<bool>,
}

/// Issues visits on behalf of one component and tracks its busy flag
///
/// The busy flag follows the most recent visit: a stale completion of an
/// earlier visit does not clear it.
pub struct NavigationTrigger {
	navigator: Rc<dyn Navigator>,
	state: Rc<TriggerState>,
}

impl NavigationTrigger {
	/// Create a trigger dispatching through `navigator`
	pub fn new(navigator: Rc<dyn Navigator>) -> Self {
		Self {
			navigator,
			state: Rc::new(TriggerState {
				busy: Signal::new(false),
				generation: Cell::new(0),
				disposed: Cell::new(false),
			}),
		}
	}

	/// Start a round trip to `url`
	pub fn navigate(&self, url: impl Into<String>, options: &VisitOptions) {
		if self.state.disposed.get() {
			return;
		}
		let url = url.into();
		let generation = self.state.generation.get() + 1;
		self.state.generation.set(generation);
		self.state.busy.set_if_changed(true);
		tracing::debug!(%url, generation, "dispatching visit");

		let state: Weak<TriggerState> = Rc::downgrade(&self.state);
		let visit = Visit::new(url, options.clone(), move |outcome| {
			let Some(state) = state.upgrade() else {
				return;
			};
			if state.disposed.get() || state.generation.get() != generation {
				return;
			}
			tracing::debug!(?outcome, generation, "visit finished");
			state.busy.set_if_changed(false);
		});
		self.navigator.visit(visit);
	}

	/// Whether a visit issued by this trigger is in flight
	pub fn is_loading(&self) -> ReadSignal<bool> {
		self.state.busy.read_only()
	}

	/// Stop dispatching and ignore completions of outstanding visits
	pub fn dispose(&self) {
		self.state.disposed.set(true);
	}

	/// Whether [`dispose`](Self::dispose) has been called
	pub fn is_disposed(&self) -> bool {
		self.state.disposed.get()
	}
}

impl fmt::Debug for NavigationTrigger {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("NavigationTrigger")
			.field("busy", &self.state.busy.get())
			.field("disposed", &self.state.disposed.get())
			.finish()
	}
}
