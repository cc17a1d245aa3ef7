//! Configuration builder for creating test and development configurations.

use crate::{AccountConfig, Config, NetworkConfig, NotifierConfig, PriceConfig, TransfersConfig};
use std::collections::HashMap;

/// Well-known development key (first anvil/hardhat account).
pub const DEV_PRIVATE_KEY: &str =
	"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Builder for creating `Config` instances with a fluent API.
///
/// Defaults describe a local anvil chain, the local account with the
/// development key and the mock price feed.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
	notifier_id: String,
	chain_id: u64,
	rpc_url: String,
	private_key: String,
	price_primary: String,
	price_implementation: toml::Value,
	recipient: String,
	safe_address: String,
}

impl Default for ConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigBuilder {
	pub fn new() -> Self {
		Self {
			notifier_id: "test-notifier".to_string(),
			chain_id: 31337,
			rpc_url: "http://127.0.0.1:8545".to_string(),
			private_key: DEV_PRIVATE_KEY.to_string(),
			price_primary: "mock".to_string(),
			price_implementation: toml::Value::Table(toml::Table::new()),
			recipient: "0x7743973Fe6B36500C1e1aADe0A3fe7EE9654e8a4".to_string(),
			safe_address: "0x70997970C51812dc3A010C7d01b50e0d17dc79C8".to_string(),
		}
	}

	pub fn notifier_id(mut self, id: impl Into<String>) -> Self {
		self.notifier_id = id.into();
		self
	}

	pub fn chain_id(mut self, chain_id: u64) -> Self {
		self.chain_id = chain_id;
		self
	}

	pub fn rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
		self.rpc_url = rpc_url.into();
		self
	}

	pub fn private_key(mut self, private_key: impl Into<String>) -> Self {
		self.private_key = private_key.into();
		self
	}

	/// Sets the primary price feed and its implementation table.
	pub fn price_feed(mut self, primary: impl Into<String>, implementation: toml::Value) -> Self {
		self.price_primary = primary.into();
		self.price_implementation = implementation;
		self
	}

	pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
		self.recipient = recipient.into();
		self
	}

	pub fn safe_address(mut self, safe_address: impl Into<String>) -> Self {
		self.safe_address = safe_address.into();
		self
	}

	/// Builds the `Config` without validating it.
	pub fn build(self) -> Config {
		let mut local = toml::Table::new();
		local.insert(
			"private_key".to_string(),
			toml::Value::String(self.private_key),
		);

		Config {
			notifier: NotifierConfig {
				id: self.notifier_id,
				trigger_interval_seconds: 60,
			},
			network: NetworkConfig {
				chain_id: self.chain_id,
				rpc_url: self.rpc_url,
			},
			account: AccountConfig {
				primary: "local".to_string(),
				implementations: HashMap::from([("local".to_string(), toml::Value::Table(local))]),
			},
			price: PriceConfig {
				primary: self.price_primary.clone(),
				implementations: HashMap::from([(self.price_primary, self.price_implementation)]),
				asset_id: "ethereum".to_string(),
				vs_currency: "usd".to_string(),
			},
			transfers: TransfersConfig {
				recipient: self.recipient,
				safe_address: self.safe_address,
				value_wei: "10000000000000000".to_string(),
				gas_limit: 21_000,
				gas_price_gwei: 50,
			},
		}
	}
}
