//! Flash notice types
//!
//! [`NoticePayload`] is the server-delivered shape of one notice; [`Notice`]
//! is a payload admitted into a [`FlashManager`](super::FlashManager) with its
//! resolved identity and countdown state.

use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Notice severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
	/// Operation succeeded
	Success,
	/// Operation failed
	#[serde(alias = "danger")]
	Error,
	/// Needs attention
	#[serde(alias = "warn")]
	Warning,
	/// Informational
	#[default]
	Info,
}

impl NoticeKind {
	/// Lowercase name, as used on the wire
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::Error => "error",
			Self::Warning => "warning",
			Self::Info => "info",
		}
	}
}

impl fmt::Display for NoticeKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Call-to-action attached to a notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeAction {
	/// Button label
	pub label: String,
	/// Link target
	pub url: String,
}

/// Auto-dismiss setting carried by a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoDismiss {
	/// Not specified; the manager applies its per-kind default
	#[default]
	Default,
	/// Stay visible until dismissed
	Disabled,
	/// Dismiss after the given delay
	After(Duration),
}

impl AutoDismiss {
	/// Whether the payload left the choice to the manager
	pub fn is_default(&self) -> bool {
		matches!(self, Self::Default)
	}

	/// Resolve against a fallback delay; `None` means no countdown
	pub fn resolve(self, fallback: Option<Duration>) -> Option<Duration> {
		match self {
			Self::Default => fallback,
			Self::Disabled => None,
			Self::After(delay) if delay.is_zero() => None,
			Self::After(delay) => Some(delay),
		}
	}
}

impl Serialize for AutoDismiss {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		match self {
			Self::Default => serializer.serialize_none(),
			Self::Disabled => serializer.serialize_bool(false),
			Self::After(delay) => serializer.serialize_u64(delay.as_millis() as u64),
		}
	}
}

impl<'de> Deserialize<'de> for AutoDismiss {
	/// Accepts a millisecond count, `false`/`0`/`null` (disabled) or `true` (default)
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let value = Value::deserialize(deserializer)?;
		match value {
			Value::Null | Value::Bool(false) => Ok(Self::Disabled),
			Value::Bool(true) => Ok(Self::Default),
			Value::Number(n) => match n.as_f64() {
				Some(ms) if ms > 0.0 => Ok(Self::After(Duration::from_millis(ms.round() as u64))),
				Some(_) => Ok(Self::Disabled),
				None => Err(de::Error::custom("auto-dismiss delay out of range")),
			},
			Value::String(s) => match s.trim().parse::<u64>() {
				Ok(0) => Ok(Self::Disabled),
				Ok(ms) => Ok(Self::After(Duration::from_millis(ms))),
				Err(_) => Err(de::Error::custom(format!("invalid auto-dismiss delay `{s}`"))),
			},
			other => Err(de::Error::custom(format!(
				"invalid auto-dismiss delay `{other}`"
			))),
		}
	}
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
	let value = Option::<Value>::deserialize(deserializer)?;
	Ok(match value {
		Some(Value::String(s)) if !s.is_empty() => Some(s),
		Some(Value::Number(n)) => Some(n.to_string()),
		_ => None,
	})
}

/// One flash notice as delivered in `flash.messages`
///
/// Field names follow the framework's serializer; common aliases (`type`,
/// `message`, `autoDismissMs`, `duration`) are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoticePayload {
	/// Server-issued identifier
	#[serde(default, deserialize_with = "deserialize_id", skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Severity
	#[serde(default, alias = "type", alias = "level")]
	pub kind: NoticeKind,
	/// Main text; payloads with empty text are never displayed
	#[serde(default, alias = "message")]
	pub text: String,
	/// Secondary text
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub detail: Option<String>,
	/// Call-to-action
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub action: Option<NoticeAction>,
	/// Auto-dismiss setting
	#[serde(
		default,
		rename = "auto_dismiss_ms",
		alias = "autoDismissMs",
		alias = "duration",
		skip_serializing_if = "AutoDismiss::is_default"
	)]
	pub auto_dismiss: AutoDismiss,
}

impl NoticePayload {
	/// Create a payload of `kind` with `text`
	pub fn new(kind: NoticeKind, text: impl Into<String>) -> Self {
		Self {
			kind,
			text: text.into(),
			..Self::default()
		}
	}

	/// Set the server identifier
	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}

	/// Set the secondary text
	pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
		self.detail = Some(detail.into());
		self
	}

	/// Attach a call-to-action
	pub fn with_action(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
		self.action = Some(NoticeAction {
			label: label.into(),
			url: url.into(),
		});
		self
	}

	/// Set the auto-dismiss delay
	pub fn with_auto_dismiss(mut self, auto_dismiss: AutoDismiss) -> Self {
		self.auto_dismiss = auto_dismiss;
		self
	}

	/// Identity used for deduplication
	///
	/// The server identifier when present; otherwise a digest of the content
	/// (kind, text, detail, action), so an identical redelivered payload maps
	/// to the same identity. Content identities are remembered as long as the
	/// manager lives, so distinct notices with equal content need server ids.
	pub fn identity(&self) -> String {
		if let Some(id) = &self.id {
			return id.clone();
		}
		let mut hasher = Sha256::new();
		hasher.update(self.kind.as_str().as_bytes());
		for part in [Some(self.text.as_str()), self.detail.as_deref()]
			.into_iter()
			.chain(self.action.iter().flat_map(|a| [Some(a.label.as_str()), Some(a.url.as_str())]))
		{
			hasher.update([0u8]);
			if let Some(part) = part {
				hasher.update(part.as_bytes());
			}
		}
		format!("sha256:{:x}", hasher.finalize())
	}
}

/// A notice currently visible in a [`FlashManager`](super::FlashManager)
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
	/// Identity, unique among visible notices
	pub id: String,
	/// Severity
	pub kind: NoticeKind,
	/// Main text, never empty
	pub text: String,
	/// Secondary text
	pub detail: Option<String>,
	/// Call-to-action
	pub action: Option<NoticeAction>,
	/// Countdown length; `None` for notices that stay until dismissed
	pub auto_dismiss: Option<Duration>,
	/// Share of the countdown left, from 100 down to 0
	pub remaining_percent: f64,
	/// Admission time on the manager's scheduler clock
	pub created_at: Duration,
}

impl Notice {
	pub(crate) fn admit(
		payload: &NoticePayload,
		id: String,
		auto_dismiss: Option<Duration>,
		now: Duration,
	) -> Self {
		Self {
			id,
			kind: payload.kind,
			text: payload.text.clone(),
			detail: payload.detail.clone(),
			action: payload.action.clone(),
			auto_dismiss,
			remaining_percent: 100.0,
			created_at: now,
		}
	}

	/// Whether a countdown runs for this notice
	pub fn is_auto_dismissing(&self) -> bool {
		self.auto_dismiss.is_some()
	}
}

/// Share of a countdown left after `elapsed`
pub(crate) fn remaining_percent(elapsed: Duration, duration: Duration) -> f64 {
	if duration.is_zero() {
		return 0.0;
	}
	let spent = elapsed.as_secs_f64() / duration.as_secs_f64() * 100.0;
	(100.0 - spent).clamp(0.0, 100.0)
}
