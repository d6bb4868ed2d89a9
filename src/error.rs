//! Error types for page-state bindings
//!
//! Runtime transitions (`sort_by`, `go_to_page`, `update`, ...) never fail: a
//! refused transition is a silent no-op. Errors only surface at the edges where
//! external data enters the crate: settings files, decoded props and URLs.

/// Errors raised while loading settings or decoding server-delivered data
#[derive(Debug, thiserror::Error)]
pub enum PageStateError {
	/// The settings document is not valid TOML or does not match the schema
	#[error("invalid settings: {0}")]
	Settings(#[from] toml::de::Error),

	/// A duration setting holds a value that cannot be used as a timer delay
	#[error("invalid duration for `{field}`: {value}")]
	InvalidDuration {
		/// Setting key
		field: String,
		/// Offending value
		value: String,
	},

	/// A page prop could not be decoded into the requested type
	#[error("failed to decode prop `{key}`: {source}")]
	Props {
		/// Dotted key path of the prop
		key: String,
		/// Underlying decoding error
		#[source]
		source: serde_json::Error,
	},

	/// The current location could not be parsed as a URL
	#[error("invalid location `{href}`: {source}")]
	InvalidUrl {
		/// The location string that failed to parse
		href: String,
		/// Underlying parse error
		#[source]
		source: url::ParseError,
	},
}

/// Result type alias for page-state operations
pub type Result<T> = std::result::Result<T, PageStateError>;
