//! CoinGecko price feed.
//!
//! Queries the `simple/price` endpoint:
//! `GET {base_url}/simple/price?ids=<asset>&vs_currencies=<currency>&x_cg_pro_api_key=<key>`.
//! Only an HTTP 200 with a JSON body counts as a quote.

use crate::{PriceFeedError, PriceFeedFactory, PriceFeedInterface, PriceFeedRegistry};
use async_trait::async_trait;
use notifier_types::{
	current_timestamp, ImplementationRegistry, PriceQuote, PriceRequest, SecretString,
};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const API_KEY_PARAM: &str = "x_cg_pro_api_key";

/// Configuration of `[price.implementations.coingecko]`.
#[derive(Debug, Clone, Deserialize)]
pub struct CoinGeckoConfig {
	/// API key sent as `x_cg_pro_api_key`; omitted from the request when blank.
	#[serde(default)]
	pub api_key: SecretString,
	/// API root, without the `/simple/price` path.
	#[serde(default = "default_base_url")]
	pub base_url: String,
	/// Request timeout. Unset leaves the HTTP client default in place.
	#[serde(default)]
	pub timeout_seconds: Option<u64>,
}

fn default_base_url() -> String {
	DEFAULT_BASE_URL.to_string()
}

pub struct CoinGeckoPriceFeed {
	client: reqwest::Client,
	endpoint: String,
	api_key: Option<SecretString>,
}

impl CoinGeckoPriceFeed {
	pub fn new(config: CoinGeckoConfig) -> Result<Self, PriceFeedError> {
		let mut builder = reqwest::Client::builder();
		if let Some(seconds) = config.timeout_seconds {
			builder = builder.timeout(Duration::from_secs(seconds));
		}
		let client = builder.build().map_err(|e| {
			PriceFeedError::Configuration(format!("Failed to build HTTP client: {}", e))
		})?;

		let api_key = if config.api_key.is_blank() {
			tracing::warn!("No CoinGecko API key configured, requests are sent without one");
			None
		} else {
			Some(config.api_key)
		};

		Ok(Self {
			client,
			endpoint: format!("{}/simple/price", config.base_url.trim_end_matches('/')),
			api_key,
		})
	}
}

#[async_trait]
impl PriceFeedInterface for CoinGeckoPriceFeed {
	async fn get_price(&self, request: &PriceRequest) -> Result<PriceQuote, PriceFeedError> {
		let mut http_request = self.client.get(&self.endpoint).query(&[
			("ids", request.asset_id.as_str()),
			("vs_currencies", request.vs_currency.as_str()),
		]);
		if let Some(api_key) = &self.api_key {
			http_request = api_key.with_exposed(|key| http_request.query(&[(API_KEY_PARAM, key)]));
		}

		// The request URL carries the API key, strip it from every error
		let response = http_request
			.send()
			.await
			.map_err(|e| PriceFeedError::Network(e.without_url().to_string()))?;

		let status = response.status();
		if status != StatusCode::OK {
			return Err(PriceFeedError::Status(status.as_u16()));
		}

		let raw: serde_json::Value = response
			.json()
			.await
			.map_err(|e| PriceFeedError::Parse(e.without_url().to_string()))?;

		Ok(PriceQuote {
			asset_id: request.asset_id.clone(),
			vs_currency: request.vs_currency.clone(),
			price: PriceQuote::extract_price(&raw, &request.asset_id, &request.vs_currency),
			raw,
			fetched_at: current_timestamp(),
			source: "coingecko".to_string(),
		})
	}
}

/// Registry for the CoinGecko price feed implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "coingecko";
	type Factory = PriceFeedFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value| -> Result<Box<dyn PriceFeedInterface>, PriceFeedError> {
			let coingecko_config: CoinGeckoConfig = config.clone().try_into().map_err(|e| {
				PriceFeedError::Configuration(format!("Invalid coingecko config: {}", e))
			})?;

			Ok(Box::new(CoinGeckoPriceFeed::new(coingecko_config)?))
		}
	}
}

impl PriceFeedRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::{
		extract::Query,
		http::StatusCode as AxumStatus,
		response::{IntoResponse, Response},
		routing::get,
		Json, Router,
	};
	use serde_json::json;
	use std::collections::HashMap;

	/// Serves a fake `simple/price` endpoint on an ephemeral port and returns
	/// its base URL.
	async fn spawn_api(router: Router) -> String {
		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		tokio::spawn(async move {
			axum::serve(listener, router).await.unwrap();
		});
		format!("http://{}/api/v3", addr)
	}

	fn feed(base_url: String, api_key: &str) -> CoinGeckoPriceFeed {
		CoinGeckoPriceFeed::new(CoinGeckoConfig {
			api_key: SecretString::from(api_key),
			base_url,
			timeout_seconds: Some(5),
		})
		.unwrap()
	}

	async fn simple_price(Query(params): Query<HashMap<String, String>>) -> Response {
		if params.get(API_KEY_PARAM).map(String::as_str) != Some("cg-test-key") {
			return AxumStatus::UNAUTHORIZED.into_response();
		}
		let asset = params.get("ids").cloned().unwrap_or_default();
		let currency = params.get("vs_currencies").cloned().unwrap_or_default();
		let mut pair = serde_json::Map::new();
		pair.insert(currency, json!(2500));
		let mut body = serde_json::Map::new();
		body.insert(asset, serde_json::Value::Object(pair));
		Json(serde_json::Value::Object(body)).into_response()
	}

	#[tokio::test]
	async fn test_successful_quote() {
		let base_url = spawn_api(Router::new().route("/api/v3/simple/price", get(simple_price))).await;

		let quote = feed(base_url, "cg-test-key")
			.get_price(&PriceRequest::new("ethereum", "usd"))
			.await
			.unwrap();

		assert_eq!(quote.price, Some(2500.0));
		assert_eq!(quote.raw, json!({"ethereum": {"usd": 2500}}));
		assert_eq!(quote.source, "coingecko");
	}

	#[tokio::test]
	async fn test_non_200_status_is_an_error() {
		let base_url = spawn_api(Router::new().route("/api/v3/simple/price", get(simple_price))).await;

		let result = feed(base_url, "wrong-key")
			.get_price(&PriceRequest::new("ethereum", "usd"))
			.await;

		assert!(matches!(result, Err(PriceFeedError::Status(401))));
	}

	#[tokio::test]
	async fn test_non_json_body_is_a_parse_error() {
		let router = Router::new().route("/api/v3/simple/price", get(|| async { "not json" }));
		let base_url = spawn_api(router).await;

		let result = feed(base_url, "cg-test-key")
			.get_price(&PriceRequest::new("ethereum", "usd"))
			.await;

		assert!(matches!(result, Err(PriceFeedError::Parse(_))));
	}

	#[tokio::test]
	async fn test_connection_error_does_not_leak_key() {
		// Nothing listens on port 9 locally
		let result = feed("http://127.0.0.1:9/api/v3".to_string(), "cg-secret-key")
			.get_price(&PriceRequest::new("ethereum", "usd"))
			.await;

		match result {
			Err(PriceFeedError::Network(message)) => assert!(!message.contains("cg-secret-key")),
			other => panic!("expected network error, got {:?}", other),
		}
	}

	#[test]
	fn test_factory_defaults() {
		let config = toml::Value::Table(toml::Table::new());
		assert!(Registry::factory()(&config).is_ok());
	}
}
