//! Configuration module for the price notifier.
//!
//! Configuration is read from a TOML file. String values may reference
//! environment variables as `${VAR}` or `${VAR:-default}`; the default
//! configuration binds the RPC endpoint, signing key, Safe address and price
//! API key this way. The parsed configuration is validated before it is
//! returned, so malformed endpoints, keys or addresses are reported at startup.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

#[cfg(feature = "testing")]
pub mod builders;
mod loader;

use notifier_types::{Address, U256};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only, the error's Display dumps the whole input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the notifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity and trigger settings of this notifier instance.
	pub notifier: NotifierConfig,
	/// Blockchain network the transfers are sent on.
	pub network: NetworkConfig,
	/// Configuration for account management.
	pub account: AccountConfig,
	/// Configuration for the price feed.
	pub price: PriceConfig,
	/// Destinations and fee parameters of the two transfers.
	pub transfers: TransfersConfig,
}

/// Configuration specific to the notifier instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifierConfig {
	/// Identifier used in logs.
	pub id: String,
	/// Period of the interval trigger in seconds.
	#[serde(default = "default_trigger_interval_seconds")]
	pub trigger_interval_seconds: u64,
}

fn default_trigger_interval_seconds() -> u64 {
	60
}

/// Connection parameters of the target chain.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// EIP-155 chain id used when signing.
	pub chain_id: u64,
	/// HTTP(S) JSON-RPC endpoint.
	pub rpc_url: String,
}

/// Configuration for account management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the price feed.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of price feed implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
	/// Asset whose price is checked.
	#[serde(default = "default_asset_id")]
	pub asset_id: String,
	/// Currency the price is quoted in.
	#[serde(default = "default_vs_currency")]
	pub vs_currency: String,
}

fn default_asset_id() -> String {
	"ethereum".to_string()
}

fn default_vs_currency() -> String {
	"usd".to_string()
}

/// Destinations and fee parameters of the transfers sent after a quote.
///
/// Addresses and the value are kept as strings so that validation can name
/// the offending field; use the accessor methods for typed values.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransfersConfig {
	/// Destination of the plain transfer.
	pub recipient: String,
	/// Safe contract receiving the second transfer.
	pub safe_address: String,
	/// Amount sent by each transfer, in wei, as a decimal string.
	#[serde(default = "default_value_wei")]
	pub value_wei: String,
	/// Gas limit of each transfer.
	#[serde(default = "default_gas_limit")]
	pub gas_limit: u64,
	/// Gas price of each transfer, in gwei.
	#[serde(default = "default_gas_price_gwei")]
	pub gas_price_gwei: u64,
}

/// 0.01 ether.
fn default_value_wei() -> String {
	"10000000000000000".to_string()
}

fn default_gas_limit() -> u64 {
	21_000
}

fn default_gas_price_gwei() -> u64 {
	50
}

const WEI_PER_GWEI: u128 = 1_000_000_000;

impl TransfersConfig {
	pub fn recipient_address(&self) -> Result<Address, ConfigError> {
		parse_address("transfers.recipient", &self.recipient)
	}

	pub fn safe_contract_address(&self) -> Result<Address, ConfigError> {
		parse_address("transfers.safe_address", &self.safe_address)
	}

	pub fn value(&self) -> Result<U256, ConfigError> {
		U256::from_str_radix(self.value_wei.trim(), 10).map_err(|e| {
			ConfigError::Validation(format!(
				"transfers.value_wei '{}' is not a decimal amount: {}",
				self.value_wei, e
			))
		})
	}

	/// Gas price converted to wei.
	pub fn gas_price_wei(&self) -> u128 {
		self.gas_price_gwei as u128 * WEI_PER_GWEI
	}
}

fn parse_address(field: &str, value: &str) -> Result<Address, ConfigError> {
	let address = Address::from_str(value.trim()).map_err(|e| {
		ConfigError::Validation(format!("{} '{}' is not a valid address: {}", field, value, e))
	})?;
	if address.is_zero() {
		return Err(ConfigError::Validation(format!(
			"{} cannot be the zero address",
			field
		)));
	}
	Ok(address)
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let var_name = var_name.as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => match default_value {
				Some(default) => default.to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply in reverse so earlier offsets stay valid
	let mut result = input.to_string();
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, resolving includes and environment
	/// variables.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration so that every value needed to send a
	/// transfer is known to be well-formed before the first message arrives.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.notifier.id.trim().is_empty() {
			return Err(ConfigError::Validation("Notifier ID cannot be empty".into()));
		}
		if self.notifier.trigger_interval_seconds == 0 {
			return Err(ConfigError::Validation(
				"trigger_interval_seconds must be greater than 0".into(),
			));
		}

		// Network
		if self.network.chain_id == 0 {
			return Err(ConfigError::Validation(
				"network.chain_id must be greater than 0".into(),
			));
		}
		let rpc_url = url::Url::parse(self.network.rpc_url.trim()).map_err(|e| {
			ConfigError::Validation(format!(
				"network.rpc_url '{}' is not a valid URL: {}",
				self.network.rpc_url, e
			))
		})?;
		if !matches!(rpc_url.scheme(), "http" | "https") {
			return Err(ConfigError::Validation(format!(
				"network.rpc_url must use http or https, got '{}'",
				rpc_url.scheme()
			)));
		}

		// Account
		if self.account.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Account primary implementation cannot be empty".into(),
			));
		}
		if !self
			.account
			.implementations
			.contains_key(&self.account.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary account '{}' not found in implementations",
				self.account.primary
			)));
		}

		// Price
		if self.price.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Price primary implementation cannot be empty".into(),
			));
		}
		if !self.price.implementations.contains_key(&self.price.primary) {
			return Err(ConfigError::Validation(format!(
				"Primary price feed '{}' not found in implementations",
				self.price.primary
			)));
		}
		if self.price.asset_id.is_empty() || self.price.vs_currency.is_empty() {
			return Err(ConfigError::Validation(
				"price.asset_id and price.vs_currency cannot be empty".into(),
			));
		}

		// Transfers
		self.transfers.recipient_address()?;
		self.transfers.safe_contract_address()?;
		self.transfers.value()?;
		if self.transfers.gas_limit < 21_000 {
			return Err(ConfigError::Validation(format!(
				"transfers.gas_limit {} is below the 21000 intrinsic cost of a transfer",
				self.transfers.gas_limit
			)));
		}
		if self.transfers.gas_price_gwei == 0 {
			return Err(ConfigError::Validation(
				"transfers.gas_price_gwei must be greater than 0".into(),
			));
		}

		Ok(())
	}
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
