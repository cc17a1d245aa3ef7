//! Secret string type for private keys and API tokens.
//!
//! Values are zeroed on drop and never printed: `Debug`, `Display` and
//! `Serialize` all emit a redaction marker.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

const REDACTED: &str = "***REDACTED***";

/// String wrapper for credentials loaded from configuration.
#[derive(Clone, Default)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	pub fn new(s: String) -> Self {
		Self(Zeroizing::new(s))
	}

	/// Exposes the secret to a closure, limiting the scope of the borrow.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	/// True when the secret is empty or whitespace only, which is what an
	/// unset `${VAR:-}` substitution produces.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString({})", REDACTED)
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::new(s.to_string())
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for SecretString {}

impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Ok(SecretString::new(s))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	#[test]
	fn test_private_key_never_printed() {
		let key = SecretString::from(ANVIL_KEY);
		assert_eq!(format!("{:?}", key), "SecretString(***REDACTED***)");
		assert_eq!(format!("{}", key), "***REDACTED***");
		assert_eq!(
			serde_json::to_string(&key).unwrap(),
			"\"***REDACTED***\""
		);
	}

	#[test]
	fn test_deserialize_keeps_value() {
		let key: SecretString = serde_json::from_str("\"cg-api-key\"").unwrap();
		assert!(key.with_exposed(|s| s == "cg-api-key"));
	}

	#[test]
	fn test_blank_detection() {
		assert!(SecretString::from("").is_blank());
		assert!(SecretString::from("  \n").is_blank());
		assert!(!SecretString::from(ANVIL_KEY).is_blank());
		assert!(SecretString::default().is_blank());
	}
}
