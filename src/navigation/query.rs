//! Query builder
//!
//! Produces the canonical URL for a state transition from the current
//! location, an allow-list of existing query parameters to keep, and the new
//! parameters of the operation.
//!
//! ## Rules
//!
//! - The path always comes from the current location; the fragment is dropped
//! - Preserved parameters keep their original order, new ones follow in
//!   insertion order
//! - A new parameter replaces any existing parameter of the same name
//! - Empty values are dropped before encoding
//!
//! ## Example
//!
//! ```
//! use reinhardt_page_state::navigation::{Preserve, QueryBuilder};
//!
//! let url = QueryBuilder::new("/users?status=active&page=3")
//!     .preserve(Preserve::All)
//!     .strip("page")
//!     .set("sort", "email")
//!     .set("direction", "asc")
//!     .build();
//!
//! assert_eq!(url, "/users?status=active&sort=email&direction=asc");
//! ```

use std::collections::{BTreeSet, HashSet};

use serde_json::Value;
use url::{Url, form_urlencoded};

use crate::error::{PageStateError, Result};

/// Origin used to resolve origin-relative locations
const PLACEHOLDER_ORIGIN: &str = "http://localhost/";

/// Which existing query parameters survive a transition
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Preserve {
	/// Keep every existing parameter not stripped or overridden
	#[default]
	All,
	/// Keep only the named parameters
	Only(BTreeSet<String>),
	/// Drop every existing parameter
	None,
}

impl Preserve {
	/// Build an allow-list from parameter names
	pub fn only<I, S>(names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self::Only(names.into_iter().map(Into::into).collect())
	}

	fn allows(&self, name: &str) -> bool {
		match self {
			Self::All => true,
			Self::Only(names) => names.contains(base_name(name)),
			Self::None => false,
		}
	}
}

/// `tags[]` and `filter[status]` belong to the logical parameter `tags`/`filter`
fn base_name(name: &str) -> &str {
	name.split('[').next().unwrap_or(name)
}

/// Builder for transition URLs
#[derive(Debug, Clone)]
pub struct QueryBuilder {
	/// `None` stands for the root path with an empty query
	base: Option<Url>,
	preserve: Preserve,
	stripped: HashSet<String>,
	params: Vec<(String, String)>,
}

impl QueryBuilder {
	/// Start from `href`, accepting absolute URLs and origin-relative paths
	///
	/// An href that cannot be parsed at all degrades to the root path.
	pub fn new(href: &str) -> Self {
		match Self::try_new(href) {
			Ok(builder) => builder,
			Err(error) => {
				tracing::warn!(%error, "falling back to root location");
				Self::from_base(None)
			}
		}
	}

	/// Start from `href`, failing if it cannot be parsed
	pub fn try_new(href: &str) -> Result<Self> {
		let url = Url::parse(href)
			.or_else(|_| Url::parse(PLACEHOLDER_ORIGIN).and_then(|origin| origin.join(href)))
			.map_err(|source| PageStateError::InvalidUrl {
				href: href.to_string(),
				source,
			})?;
		Ok(Self::from_base(Some(url)))
	}

	fn from_base(base: Option<Url>) -> Self {
		Self {
			base,
			preserve: Preserve::All,
			stripped: HashSet::new(),
			params: Vec::new(),
		}
	}

	/// Choose which existing parameters to keep (default: all)
	pub fn preserve(mut self, preserve: Preserve) -> Self {
		self.preserve = preserve;
		self
	}

	/// Remove an existing parameter (including its `name[...]` forms)
	pub fn strip(mut self, name: impl Into<String>) -> Self {
		self.stripped.insert(name.into());
		self
	}

	/// Set a parameter; an empty value removes it instead
	pub fn set(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		let name = name.into();
		let value = value.into();
		self.override_param(&name);
		if !value.is_empty() {
			self.params.push((name, value));
		}
		self
	}

	/// Set a parameter from a JSON value
	///
	/// `null`, empty strings and empty arrays remove the parameter. Arrays are
	/// encoded as repeated `name[]` pairs and objects as `name[key]` pairs.
	pub fn set_value(mut self, name: impl Into<String>, value: &Value) -> Self {
		let name = name.into();
		self.override_param(&name);
		encode_value(&name, value, &mut self.params);
		self
	}

	fn override_param(&mut self, name: &str) {
		self.stripped.insert(name.to_string());
		self.params.retain(|(key, _)| base_name(key) != name);
	}

	fn is_stripped(&self, key: &str) -> bool {
		self.stripped.contains(key) || self.stripped.contains(base_name(key))
	}

	/// Render `path` or `path?query`
	pub fn build(&self) -> String {
		let mut pairs: Vec<(String, String)> = self
			.base
			.iter()
			.flat_map(Url::query_pairs)
			.filter(|(key, value)| {
				!value.is_empty() && self.preserve.allows(key) && !self.is_stripped(key)
			})
			.map(|(key, value)| (key.into_owned(), value.into_owned()))
			.collect();
		pairs.extend(self.params.iter().cloned());

		let path = self.base.as_ref().map_or("/", Url::path);
		if pairs.is_empty() {
			return path.to_string();
		}
		let query = form_urlencoded::Serializer::new(String::new())
			.extend_pairs(pairs)
			.finish();
		format!("{path}?{query}")
	}
}

/// Whether a filter value counts as "set" for query purposes
pub fn is_blank(value: &Value) -> bool {
	match value {
		Value::Null => true,
		Value::String(s) => s.is_empty(),
		Value::Array(items) => items.iter().all(is_blank),
		Value::Object(map) => map.values().all(is_blank),
		Value::Bool(_) | Value::Number(_) => false,
	}
}

fn encode_value(name: &str, value: &Value, out: &mut Vec<(String, String)>) {
	match value {
		Value::Null => {}
		Value::String(s) => {
			if !s.is_empty() {
				out.push((name.to_string(), s.clone()));
			}
		}
		Value::Bool(b) => out.push((name.to_string(), b.to_string())),
		Value::Number(n) => out.push((name.to_string(), n.to_string())),
		Value::Array(items) => {
			let key = format!("{name}[]");
			for item in items {
				encode_value(&key, item, out);
			}
		}
		Value::Object(map) => {
			for (sub, item) in map {
				encode_value(&format!("{name}[{sub}]"), item, out);
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use rstest::rstest;
	use serde_json::json;

	#[rstest]
	#[case("/users", "/users")]
	#[case("/users?page=2#top", "/users?page=2")]
	#[case("https://example.com/users?page=2", "/users?page=2")]
	#[case("users", "/users")]
	fn test_path_taken_from_location(#[case] href: &str, #[case] expected: &str) {
		assert_eq!(QueryBuilder::new(href).build(), expected);
	}

	#[rstest]
	fn test_unparseable_href_degrades_to_root() {
		let href = "http://[::1";
		assert!(matches!(
			QueryBuilder::try_new(href),
			Err(PageStateError::InvalidUrl { .. })
		));
		assert_eq!(QueryBuilder::new(href).set("page", "2").build(), "/?page=2");
	}

	#[rstest]
	fn test_strip_removes_only_named_param() {
		let url = QueryBuilder::new("/users?page=3&search=ann")
			.strip("page")
			.build();
		assert_eq!(url, "/users?search=ann");
	}

	#[rstest]
	fn test_allow_list_keeps_named_params() {
		let url = QueryBuilder::new("/users?sort=name&direction=asc&page=3&junk=1")
			.preserve(Preserve::only(["sort", "direction"]))
			.set("search", "ann")
			.build();
		assert_eq!(url, "/users?sort=name&direction=asc&search=ann");
	}

	#[rstest]
	fn test_preserve_none_drops_existing() {
		let url = QueryBuilder::new("/users?sort=name")
			.preserve(Preserve::None)
			.set("page", "2")
			.build();
		assert_eq!(url, "/users?page=2");
	}

	#[rstest]
	fn test_set_overrides_existing_value() {
		let url = QueryBuilder::new("/users?page=3&per_page=10")
			.set("page", "1")
			.set("per_page", "25")
			.build();
		assert_eq!(url, "/users?page=1&per_page=25");
	}

	#[rstest]
	fn test_empty_values_dropped() {
		let url = QueryBuilder::new("/users?search=&status=active")
			.set("page", "")
			.build();
		assert_eq!(url, "/users?status=active");
	}

	#[rstest]
	fn test_set_value_encodes_json() {
		let url = QueryBuilder::new("/items")
			.set_value("tags", &json!(["a", "b"]))
			.set_value("archived", &json!(true))
			.set_value("min", &json!(5))
			.set_value("none", &Value::Null)
			.build();
		assert_eq!(
			url,
			"/items?tags%5B%5D=a&tags%5B%5D=b&archived=true&min=5"
		);
	}

	#[rstest]
	fn test_strip_covers_array_form() {
		let url = QueryBuilder::new("/items?tags%5B%5D=a&tags%5B%5D=b&q=x")
			.strip("tags")
			.build();
		assert_eq!(url, "/items?q=x");
	}

	#[rstest]
	fn test_values_are_percent_encoded() {
		let url = QueryBuilder::new("/users").set("search", "a&b c").build();
		assert_eq!(url, "/users?search=a%26b+c");
	}

	#[rstest]
	#[case(json!(null), true)]
	#[case(json!(""), true)]
	#[case(json!([]), true)]
	#[case(json!(["", null]), true)]
	#[case(json!(0), false)]
	#[case(json!(false), false)]
	#[case(json!("x"), false)]
	fn test_is_blank(#[case] value: Value, #[case] expected: bool) {
		assert_eq!(is_blank(&value), expected);
	}

	proptest! {
		#[test]
		fn prop_stripped_param_never_survives(page in 0u32..10_000, extra in "[a-z]{1,8}") {
			let href = format!("/list?page={page}&q={extra}");
			let url = QueryBuilder::new(&href).strip("page").build();
			prop_assert!(!url.contains("page="));
			let expected = format!("q={}", extra);
			prop_assert!(url.contains(&expected));
		}

		#[test]
		fn prop_set_param_appears_exactly_once(value in "[a-zA-Z0-9]{1,12}") {
			let url = QueryBuilder::new("/list?sort=old&sort=older")
				.set("sort", value.clone())
				.build();
			prop_assert_eq!(url.matches("sort=").count(), 1);
			let expected = format!("sort={}", value);
			prop_assert!(url.ends_with(&expected));
		}
	}
}
