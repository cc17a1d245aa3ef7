//! Trigger messages.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message that asks the handler to run one price check.
///
/// The handler does not act on the contents; they only label the log span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMessage {
	/// Where the message came from (e.g. "interval", "cli").
	pub source: String,
	/// Per-source sequence number.
	pub sequence: u64,
}

impl TriggerMessage {
	pub fn new(source: impl Into<String>, sequence: u64) -> Self {
		Self {
			source: source.into(),
			sequence,
		}
	}
}

impl fmt::Display for TriggerMessage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}#{}", self.source, self.sequence)
	}
}
