//! Settings for page-state components
//!
//! All settings have working defaults; a TOML document only needs the keys it
//! overrides.
//!
//! ```toml
//! [flash]
//! progress_interval_ms = 50
//!
//! [flash.auto_dismiss_ms]
//! success = 4000
//! error = 0        # 0 keeps the notice until dismissed
//!
//! [filters]
//! preserve = ["sort", "direction", "per_page"]
//!
//! [filters.debounce_ms]
//! search = 300
//!
//! [navigation]
//! preserve_scroll = true
//! history = "replace"
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PageStateError, Result};
use crate::flash::NoticeKind;
use crate::navigation::VisitOptions;

/// Default countdown tick for auto-dismissing notices
pub const DEFAULT_PROGRESS_INTERVAL_MS: u64 = 50;

/// Top-level settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Flash notice lifecycle
	pub flash: FlashSettings,
	/// Filter synchronization
	pub filters: FilterSettings,
	/// Sort transitions
	pub sorting: SortSettings,
	/// Pagination transitions
	pub pagination: PaginationSettings,
	/// Options applied to every visit
	pub navigation: VisitOptions,
}

impl Settings {
	/// Parse settings from a TOML document
	///
	/// # Examples
	///
	/// ```
	/// use reinhardt_page_state::Settings;
	///
	/// let settings = Settings::from_toml_str(r#"
	///     [filters.debounce_ms]
	///     search = 300
	/// "#).unwrap();
	///
	/// assert_eq!(settings.filters.debounce_ms.get("search"), Some(&300));
	/// assert_eq!(settings.pagination.page_param, "page");
	/// ```
	pub fn from_toml_str(source: &str) -> Result<Self> {
		let settings: Self = toml::from_str(source)?;
		settings.validate()?;
		Ok(settings)
	}

	/// Check values that parse but cannot be used
	pub fn validate(&self) -> Result<()> {
		if self.flash.progress_interval_ms == 0 {
			return Err(PageStateError::InvalidDuration {
				field: "flash.progress_interval_ms".to_string(),
				value: "0".to_string(),
			});
		}
		Ok(())
	}
}

/// Flash notice settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashSettings {
	/// Countdown tick interval in milliseconds
	pub progress_interval_ms: u64,
	/// Auto-dismiss delay per kind for payloads that do not carry one
	pub auto_dismiss_ms: AutoDismissDefaults,
}

impl Default for FlashSettings {
	fn default() -> Self {
		Self {
			progress_interval_ms: DEFAULT_PROGRESS_INTERVAL_MS,
			auto_dismiss_ms: AutoDismissDefaults::default(),
		}
	}
}

/// Per-kind auto-dismiss delays in milliseconds; `0` disables auto-dismiss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoDismissDefaults {
	/// Success notices
	pub success: u64,
	/// Informational notices
	pub info: u64,
	/// Warnings
	pub warning: u64,
	/// Errors
	pub error: u64,
}

impl Default for AutoDismissDefaults {
	fn default() -> Self {
		Self {
			success: 5_000,
			info: 5_000,
			warning: 7_000,
			error: 0,
		}
	}
}

impl AutoDismissDefaults {
	/// Delay for `kind`, `None` when disabled
	pub fn for_kind(&self, kind: NoticeKind) -> Option<Duration> {
		let ms = match kind {
			NoticeKind::Success => self.success,
			NoticeKind::Info => self.info,
			NoticeKind::Warning => self.warning,
			NoticeKind::Error => self.error,
		};
		(ms > 0).then(|| Duration::from_millis(ms))
	}
}

/// Filter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
	/// Debounce delay per field in milliseconds; unlisted fields sync immediately
	pub debounce_ms: BTreeMap<String, u64>,
	/// Existing query parameters kept when filters change
	pub preserve: Vec<String>,
	/// Page parameter removed on every filter change
	pub page_param: String,
}

impl Default for FilterSettings {
	fn default() -> Self {
		Self {
			debounce_ms: BTreeMap::new(),
			preserve: Vec::new(),
			page_param: "page".to_string(),
		}
	}
}

/// Sort settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortSettings {
	/// Query parameter carrying the sort field
	pub sort_param: String,
	/// Query parameter carrying the direction
	pub direction_param: String,
	/// Page parameter removed on every sort change
	pub page_param: String,
}

impl Default for SortSettings {
	fn default() -> Self {
		Self {
			sort_param: "sort".to_string(),
			direction_param: "direction".to_string(),
			page_param: "page".to_string(),
		}
	}
}

/// Pagination settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationSettings {
	/// Query parameter carrying the page number
	pub page_param: String,
	/// Query parameter carrying the page size
	pub per_page_param: String,
}

impl Default for PaginationSettings {
	fn default() -> Self {
		Self {
			page_param: "page".to_string(),
			per_page_param: "per_page".to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::navigation::HistoryMode;
	use rstest::rstest;

	#[rstest]
	fn test_empty_document_uses_defaults() {
		let settings = Settings::from_toml_str("").unwrap();
		assert_eq!(settings, Settings::default());
		assert_eq!(settings.flash.progress_interval_ms, 50);
		assert_eq!(settings.sorting.sort_param, "sort");
		assert_eq!(settings.pagination.per_page_param, "per_page");
	}

	#[rstest]
	fn test_overrides_are_applied() {
		let settings = Settings::from_toml_str(
			r#"
			[flash.auto_dismiss_ms]
			success = 3000
			error = 0

			[filters]
			preserve = ["sort", "direction"]

			[filters.debounce_ms]
			search = 300

			[navigation]
			preserve_scroll = false
			history = "push"
			only = ["users"]
			"#,
		)
		.unwrap();

		assert_eq!(
			settings.flash.auto_dismiss_ms.for_kind(NoticeKind::Success),
			Some(Duration::from_millis(3000))
		);
		assert_eq!(settings.flash.auto_dismiss_ms.for_kind(NoticeKind::Error), None);
		assert_eq!(
			settings.flash.auto_dismiss_ms.for_kind(NoticeKind::Warning),
			Some(Duration::from_millis(7000))
		);
		assert_eq!(settings.filters.preserve, vec!["sort", "direction"]);
		assert_eq!(settings.filters.debounce_ms.get("search"), Some(&300));
		assert!(!settings.navigation.preserve_scroll);
		assert_eq!(settings.navigation.history, HistoryMode::Push);
		assert_eq!(settings.navigation.only, Some(vec!["users".to_string()]));
	}

	#[rstest]
	fn test_zero_progress_interval_rejected() {
		let err = Settings::from_toml_str("[flash]\nprogress_interval_ms = 0").unwrap_err();
		assert!(matches!(err, PageStateError::InvalidDuration { .. }));
	}

	#[rstest]
	fn test_malformed_document_rejected() {
		let err = Settings::from_toml_str("[flash\n").unwrap_err();
		assert!(matches!(err, PageStateError::Settings(_)));
	}
}
