//! Page props delivered by the server
//!
//! Every round trip redelivers a payload of named props. [`PageProps`] holds
//! the latest payload and derives views of individual props from it;
//! [`SharedProps`] extracts the cross-cutting data every page carries (current
//! user, flash notices, breadcrumb trail).
//!
//! Absent or malformed shared data degrades to empty defaults instead of
//! failing: missing breadcrumbs become an empty trail and a missing or
//! non-sequence flash payload yields no notices.
//!
//! ## Example
//!
//! ```
//! use reinhardt_page_state::props::PageProps;
//! use serde_json::json;
//!
//! let props = PageProps::new(json!({
//!     "auth": { "user": { "name": "Ann" } },
//!     "breadcrumbs": [{ "label": "Home", "url": "/" }, { "label": "Users" }],
//! }));
//!
//! let crumbs = props.crumbs();
//! assert_eq!(crumbs.get().len(), 2);
//!
//! props.replace(json!({}));
//! assert!(crumbs.get().is_empty());
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{PageStateError, Result};
use crate::flash::NoticePayload;
use crate::reactive::{ReadSignal, Signal};

/// One entry of the breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breadcrumb {
	/// Display label
	pub label: String,
	/// Link target; `None` for the current page
	#[serde(default)]
	pub url: Option<String>,
}

/// Cross-cutting data shared by every page
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SharedProps {
	/// `auth.user`, `None` for guests
	pub user: Option<Value>,
	/// `flash.messages`, in delivery order
	pub flash: Vec<NoticePayload>,
	/// `breadcrumbs`, in display order
	pub breadcrumbs: Vec<Breadcrumb>,
}

impl SharedProps {
	/// Extract shared data from a props payload
	pub fn from_props(props: &Value) -> Self {
		Self {
			user: lookup(props, "auth.user").filter(|u| !u.is_null()).cloned(),
			flash: flash_messages(props),
			breadcrumbs: decode_each(lookup(props, "breadcrumbs"), "breadcrumbs"),
		}
	}
}

/// Flash notice payloads carried by a props payload
pub fn flash_messages(props: &Value) -> Vec<NoticePayload> {
	decode_each(lookup(props, "flash.messages"), "flash.messages")
}

/// Decode every element of a sequence, skipping the ones that do not fit
fn decode_each<T: DeserializeOwned>(value: Option<&Value>, key: &str) -> Vec<T> {
	let Some(Value::Array(items)) = value else {
		return Vec::new();
	};
	items
		.iter()
		.filter_map(|item| match T::deserialize(item) {
			Ok(decoded) => Some(decoded),
			Err(error) => {
				tracing::warn!(key, %error, "skipping malformed entry");
				None
			}
		})
		.collect()
}

/// Resolve a dotted key path (`"flash.messages"`) inside a props payload
pub fn lookup<'a>(props: &'a Value, key: &str) -> Option<&'a Value> {
	if key.is_empty() {
		return Some(props);
	}
	key.split('.').try_fold(props, |value, segment| value.get(segment))
}

/// Reactive holder of the latest props payload
#[derive(Debug, Clone)]
pub struct PageProps {
	props: Signal<Value>,
}

impl PageProps {
	/// Create a holder with an initial payload
	pub fn new(initial: Value) -> Self {
		Self {
			props: Signal::new(initial),
		}
	}

	/// Replace the payload after a round trip
	pub fn replace(&self, props: Value) {
		self.props.set(props);
	}

	/// Merge named props into the payload, as a partial reload does
	///
	/// Non-object payloads are replaced by an object holding only `partial`.
	pub fn merge(&self, partial: serde_json::Map<String, Value>) {
		self.props.update(|props| {
			if !props.is_object() {
				*props = Value::Object(serde_json::Map::new());
			}
			if let Value::Object(map) = props {
				map.extend(partial);
			}
		});
	}

	/// Current payload
	pub fn get(&self) -> Value {
		self.props.get()
	}

	/// View of the whole payload
	pub fn signal(&self) -> ReadSignal<Value> {
		self.props.read_only()
	}

	/// View of one prop; `Value::Null` when absent
	///
	/// Subscribers only hear about redeliveries that change this prop.
	pub fn select(&self, key: &str) -> ReadSignal<Value> {
		let key = key.to_string();
		self.props
			.read_only()
			.map_distinct(move |props| lookup(props, &key).cloned().unwrap_or(Value::Null))
	}

	/// Typed view of one prop; `T::default()` when absent or undecodable
	pub fn select_as<T>(&self, key: &str) -> ReadSignal<T>
	where
		T: DeserializeOwned + Default + Clone + 'static,
	{
		let key = key.to_string();
		self.props
			.read_only()
			.map(move |props| match decode_prop(props, &key) {
				Ok(value) => value,
				Err(error) => {
					tracing::warn!(%error, "using default for prop");
					T::default()
				}
			})
	}

	/// Decode one prop of the current payload
	pub fn decode<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
		self.props.with(|props| decode_prop(props, key))
	}

	/// View of the shared cross-cutting data
	pub fn shared(&self) -> ReadSignal<SharedProps> {
		self.props.read_only().map(SharedProps::from_props)
	}

	/// View of the breadcrumb trail
	pub fn crumbs(&self) -> ReadSignal<Vec<Breadcrumb>> {
		self.props
			.read_only()
			.map(|props| decode_each(lookup(props, "breadcrumbs"), "breadcrumbs"))
	}

	/// View of the authenticated user
	pub fn user(&self) -> ReadSignal<Option<Value>> {
		self.props
			.read_only()
			.map(|props| lookup(props, "auth.user").filter(|u| !u.is_null()).cloned())
	}
}

impl Default for PageProps {
	fn default() -> Self {
		Self::new(Value::Object(serde_json::Map::new()))
	}
}

fn decode_prop<T: DeserializeOwned>(props: &Value, key: &str) -> Result<T> {
	let value = lookup(props, key).unwrap_or(&Value::Null);
	T::deserialize(value).map_err(|source| PageStateError::Props {
		key: key.to_string(),
		source,
	})
}
