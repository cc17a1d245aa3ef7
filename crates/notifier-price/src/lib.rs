//! Price feed module for the price notifier.
//!
//! This module provides the interface for fetching a spot price quote and the
//! implementations selectable from configuration: the CoinGecko HTTP API and a
//! mock feed for local runs.

use async_trait::async_trait;
use notifier_types::{ImplementationRegistry, PriceQuote, PriceRequest};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod coingecko;
	pub mod mock;
}

/// Errors that can occur during price feed operations.
#[derive(Debug, Error)]
pub enum PriceFeedError {
	/// The request could not be sent or the response could not be read.
	#[error("Network error: {0}")]
	Network(String),
	/// The price source answered with a status other than 200.
	#[error("API call failed with status code: {0}")]
	Status(u16),
	/// The response body was not valid JSON.
	#[error("Invalid response body: {0}")]
	Parse(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for price feed implementations.
#[async_trait]
pub trait PriceFeedInterface: Send + Sync {
	/// Fetches the current price of `request.asset_id` in `request.vs_currency`.
	///
	/// Succeeds only for a 200 response with a JSON body. The quote's `price`
	/// is `None` when the body does not carry the requested pair.
	async fn get_price(&self, request: &PriceRequest) -> Result<PriceQuote, PriceFeedError>;
}

/// Type alias for price feed factory functions.
pub type PriceFeedFactory = fn(&toml::Value) -> Result<Box<dyn PriceFeedInterface>, PriceFeedError>;

/// Registry trait for price feed implementations.
pub trait PriceFeedRegistry: ImplementationRegistry<Factory = PriceFeedFactory> {}

/// Get all registered price feed implementations as (name, factory) pairs.
pub fn get_all_implementations() -> Vec<(&'static str, PriceFeedFactory)> {
	use implementations::{coingecko, mock};

	vec![
		(coingecko::Registry::NAME, coingecko::Registry::factory()),
		(mock::Registry::NAME, mock::Registry::factory()),
	]
}

/// Service that routes price requests to the primary implementation.
pub struct PriceFeedService {
	implementations: HashMap<String, Arc<dyn PriceFeedInterface>>,
	primary_implementation: String,
}

impl PriceFeedService {
	/// Creates the service; the primary implementation must be present.
	pub fn new(
		implementations: HashMap<String, Arc<dyn PriceFeedInterface>>,
		primary_implementation: String,
	) -> Result<Self, PriceFeedError> {
		if !implementations.contains_key(&primary_implementation) {
			return Err(PriceFeedError::Configuration(format!(
				"Primary implementation '{}' not found in available implementations",
				primary_implementation
			)));
		}

		Ok(Self {
			implementations,
			primary_implementation,
		})
	}

	/// Name of the implementation requests are routed to.
	pub fn primary(&self) -> &str {
		&self.primary_implementation
	}

	/// Fetches a quote from the primary implementation.
	pub async fn get_price(&self, request: &PriceRequest) -> Result<PriceQuote, PriceFeedError> {
		let implementation = self
			.implementations
			.get(&self.primary_implementation)
			.ok_or_else(|| {
				PriceFeedError::Configuration(format!(
					"Primary implementation '{}' not available",
					self.primary_implementation
				))
			})?;

		implementation.get_price(request).await
	}
}
