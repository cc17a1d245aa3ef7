//! Price quote types.

use serde::{Deserialize, Serialize};

/// Request for the price of one asset in one quote currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRequest {
	/// Asset identifier as understood by the price source (e.g. "ethereum").
	pub asset_id: String,
	/// Quote currency (e.g. "usd").
	pub vs_currency: String,
}

impl PriceRequest {
	pub fn new(asset_id: impl Into<String>, vs_currency: impl Into<String>) -> Self {
		Self {
			asset_id: asset_id.into(),
			vs_currency: vs_currency.into(),
		}
	}
}

/// A price quote as returned by a price feed.
///
/// The raw response body is kept alongside the extracted price so it can be
/// logged verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
	pub asset_id: String,
	pub vs_currency: String,
	/// Extracted price, `None` when the body has no `{asset: {currency: n}}` entry.
	pub price: Option<f64>,
	/// Response body as received.
	pub raw: serde_json::Value,
	/// Unix timestamp of the fetch.
	pub fetched_at: u64,
	/// The source of the quote (e.g. "coingecko", "mock").
	pub source: String,
}

impl PriceQuote {
	/// Reads `body[asset_id][vs_currency]` as a number.
	pub fn extract_price(body: &serde_json::Value, asset_id: &str, vs_currency: &str) -> Option<f64> {
		body.get(asset_id)?.get(vs_currency)?.as_f64()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_extract_price_from_simple_price_body() {
		let body = json!({"ethereum": {"usd": 2500}});
		assert_eq!(PriceQuote::extract_price(&body, "ethereum", "usd"), Some(2500.0));
	}

	#[test]
	fn test_extract_price_missing_currency() {
		let body = json!({"ethereum": {"eur": 2300.5}});
		assert_eq!(PriceQuote::extract_price(&body, "ethereum", "usd"), None);
		assert_eq!(PriceQuote::extract_price(&json!({}), "ethereum", "usd"), None);
	}
}
