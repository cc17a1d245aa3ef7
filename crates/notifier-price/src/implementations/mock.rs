//! Mock price feed for local runs and tests.
//!
//! Answers from a configured price table without any network access, and can
//! be told to fail with a given HTTP status to rehearse the failure path.

use crate::{PriceFeedError, PriceFeedFactory, PriceFeedInterface, PriceFeedRegistry};
use async_trait::async_trait;
use notifier_types::{current_timestamp, ImplementationRegistry, PriceQuote, PriceRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

/// Configuration for the mock price feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockPriceFeedConfig {
	/// Prices keyed by `asset_id`, quoted in whatever currency is requested.
	#[serde(default = "default_prices")]
	pub prices: HashMap<String, f64>,
	/// When set, every request fails as if the API answered with this status.
	#[serde(default)]
	pub fail_with_status: Option<u16>,
}

fn default_prices() -> HashMap<String, f64> {
	HashMap::from([("ethereum".to_string(), 2500.0)])
}

impl Default for MockPriceFeedConfig {
	fn default() -> Self {
		Self {
			prices: default_prices(),
			fail_with_status: None,
		}
	}
}

pub struct MockPriceFeed {
	config: MockPriceFeedConfig,
}

impl MockPriceFeed {
	pub fn new(config: MockPriceFeedConfig) -> Self {
		Self { config }
	}
}

#[async_trait]
impl PriceFeedInterface for MockPriceFeed {
	async fn get_price(&self, request: &PriceRequest) -> Result<PriceQuote, PriceFeedError> {
		if let Some(status) = self.config.fail_with_status {
			return Err(PriceFeedError::Status(status));
		}

		// Same shape as the simple price endpoint; unknown assets give `{}`
		let mut raw = Map::new();
		if let Some(price) = self.config.prices.get(&request.asset_id) {
			let mut pair = Map::new();
			pair.insert(request.vs_currency.clone(), json!(price));
			raw.insert(request.asset_id.clone(), Value::Object(pair));
		}
		let raw = Value::Object(raw);

		Ok(PriceQuote {
			asset_id: request.asset_id.clone(),
			vs_currency: request.vs_currency.clone(),
			price: PriceQuote::extract_price(&raw, &request.asset_id, &request.vs_currency),
			raw,
			fetched_at: current_timestamp(),
			source: "mock".to_string(),
		})
	}
}

/// Registry for the mock price feed implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = PriceFeedFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value| -> Result<Box<dyn PriceFeedInterface>, PriceFeedError> {
			let mock_config: MockPriceFeedConfig = config
				.clone()
				.try_into()
				.map_err(|e| PriceFeedError::Configuration(format!("Invalid mock config: {}", e)))?;

			Ok(Box::new(MockPriceFeed::new(mock_config)))
		}
	}
}

impl PriceFeedRegistry for Registry {}
