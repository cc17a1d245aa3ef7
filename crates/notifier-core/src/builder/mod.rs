//! Builder for constructing notifier engines.
//!
//! Composes a NotifierEngine from the account and price feed implementations
//! named in the configuration, using factory functions looked up by name. The
//! delivery provider defaults to an Alloy HTTP provider for the configured
//! network, checked against the chain id the node reports, and can be
//! replaced, e.g. by an in-memory one in tests.

use crate::engine::NotifierEngine;
use crate::handlers::{TransactionNotifierHandler, TransferPolicy};
use notifier_account::{AccountError, AccountFactory, AccountInterface, AccountService};
use notifier_config::Config;
use notifier_delivery::implementations::evm::alloy::AlloyDelivery;
use notifier_delivery::{DeliveryInterface, DeliveryService};
use notifier_price::{PriceFeedError, PriceFeedFactory, PriceFeedInterface, PriceFeedService};
use notifier_types::{truncate_id, PriceRequest};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during notifier engine construction.
///
/// All of them are raised before the first trigger message is accepted.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for every pluggable component, keyed by implementation
/// name.
pub struct NotifierFactories<AF, PF> {
	pub account_factories: HashMap<String, AF>,
	pub price_factories: HashMap<String, PF>,
}

impl Default for NotifierFactories<AccountFactory, PriceFeedFactory> {
	/// All implementations compiled into the workspace.
	fn default() -> Self {
		Self {
			account_factories: notifier_account::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
			price_factories: notifier_price::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		}
	}
}

/// Builder for constructing a NotifierEngine with pluggable implementations.
pub struct NotifierBuilder {
	config: Config,
	delivery: Option<Box<dyn DeliveryInterface>>,
}

impl NotifierBuilder {
	pub fn new(config: Config) -> Self {
		Self {
			config,
			delivery: None,
		}
	}

	/// Uses `delivery` instead of an HTTP provider for `network.rpc_url`.
	pub fn with_delivery(mut self, delivery: Box<dyn DeliveryInterface>) -> Self {
		self.delivery = Some(delivery);
		self
	}

	/// Validates the configuration and builds the engine.
	pub async fn build<AF, PF>(
		self,
		factories: NotifierFactories<AF, PF>,
	) -> Result<NotifierEngine, BuilderError>
	where
		AF: Fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>,
		PF: Fn(&toml::Value) -> Result<Box<dyn PriceFeedInterface>, PriceFeedError>,
	{
		self.config
			.validate()
			.map_err(|e| BuilderError::Config(e.to_string()))?;

		// Create the primary account
		let primary_account = self.config.account.primary.as_str();
		let account_config = self
			.config
			.account
			.implementations
			.get(primary_account)
			.ok_or_else(|| {
				BuilderError::Config(format!(
					"Primary account '{}' not found in implementations",
					primary_account
				))
			})?;
		let account_factory = factories
			.account_factories
			.get(primary_account)
			.ok_or_else(|| {
				BuilderError::MissingComponent(format!(
					"No account implementation named '{}'",
					primary_account
				))
			})?;
		let account = match account_factory(account_config) {
			Ok(implementation) => {
				tracing::info!(component = "account", implementation = %primary_account, "Loaded");
				Arc::new(AccountService::new(implementation))
			}
			Err(e) => {
				tracing::error!(
					component = "account",
					implementation = %primary_account,
					error = %e,
					"Failed to create account implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create account implementation '{}': {}",
					primary_account, e
				)));
			}
		};

		// Resolve the sender once so a broken signer fails here
		let sender = account.get_address().await.map_err(|e| {
			tracing::error!(component = "account", error = %e, "Failed to get sender address");
			BuilderError::Config(format!("Failed to get sender address: {}", e))
		})?;
		tracing::info!(
			component = "account",
			sender = %truncate_id(&sender.to_string()),
			"Sender resolved"
		);

		// Create the delivery provider
		let chain_id = self.config.network.chain_id;
		let delivery_impl = match self.delivery {
			Some(delivery) => delivery,
			None => {
				// Asks the node for its chain id, a mismatch fails the build
				let delivery = AlloyDelivery::connect(chain_id, &self.config.network.rpc_url)
					.await
					.map_err(|e| {
						tracing::error!(component = "delivery", error = %e, "Failed to connect");
						BuilderError::Config(format!("Failed to create delivery provider: {}", e))
					})?;
				Box::new(delivery) as Box<dyn DeliveryInterface>
			}
		};
		if delivery_impl.chain_id() != chain_id {
			return Err(BuilderError::Config(format!(
				"Delivery provider is bound to chain {} but network.chain_id is {}",
				delivery_impl.chain_id(),
				chain_id
			)));
		}
		tracing::info!(component = "delivery", chain_id = %chain_id, "Loaded");
		let delivery = Arc::new(DeliveryService::new(delivery_impl));

		// Create price feed implementations
		let mut price_impls: HashMap<String, Arc<dyn PriceFeedInterface>> = HashMap::new();
		for (name, config) in &self.config.price.implementations {
			let Some(factory) = factories.price_factories.get(name) else {
				tracing::warn!(component = "price", implementation = %name, "Unknown implementation, skipping");
				continue;
			};
			match factory(config) {
				Ok(implementation) => {
					let is_primary = &self.config.price.primary == name;
					tracing::info!(component = "price", implementation = %name, enabled = %is_primary, "Loaded");
					price_impls.insert(name.clone(), implementation.into());
				}
				Err(e) => {
					tracing::error!(
						component = "price",
						implementation = %name,
						error = %e,
						"Failed to create price feed implementation"
					);
					return Err(BuilderError::Config(format!(
						"Failed to create price feed implementation '{}': {}",
						name, e
					)));
				}
			}
		}

		let price = Arc::new(
			PriceFeedService::new(price_impls, self.config.price.primary.clone())
				.map_err(|e| BuilderError::Config(e.to_string()))?,
		);
		tracing::info!(component = "price", primary = %price.primary(), "Price feed ready");

		let policy = TransferPolicy::from_config(&self.config.transfers)
			.map_err(|e| BuilderError::Config(e.to_string()))?;
		tracing::info!(
			component = "transfers",
			recipient = %policy.recipient,
			safe_address = %policy.safe_address,
			value_wei = %policy.value,
			"Loaded"
		);

		let price_request =
			PriceRequest::new(&self.config.price.asset_id, &self.config.price.vs_currency);
		let handler = Arc::new(TransactionNotifierHandler::new(
			price,
			price_request,
			account,
			delivery,
			policy,
		));

		Ok(NotifierEngine::new(self.config, handler))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::test_support::{spawn_rpc_node, MockChain, MockDelivery};
	use notifier_config::builders::ConfigBuilder;
	use std::sync::Mutex;

	fn mock_delivery() -> Box<dyn DeliveryInterface> {
		Box::new(MockDelivery::new(Arc::new(Mutex::new(MockChain::default()))))
	}

	#[tokio::test]
	async fn test_build_with_registered_factories() {
		let engine = NotifierBuilder::new(ConfigBuilder::new().build())
			.with_delivery(mock_delivery())
			.build(NotifierFactories::default())
			.await
			.unwrap();

		assert_eq!(engine.config().notifier.id, "test-notifier");
		assert_eq!(engine.handler().policy().gas_limit, 21_000);
	}

	#[tokio::test]
	async fn test_default_delivery_checks_node_chain() {
		let rpc_url = spawn_rpc_node(31337).await;
		let result = NotifierBuilder::new(ConfigBuilder::new().rpc_url(rpc_url).build())
			.build(NotifierFactories::default())
			.await;
		assert!(result.is_ok());
	}

	#[tokio::test]
	async fn test_node_on_other_chain_rejected() {
		// Mainnet configured, Sepolia node behind the URL
		let rpc_url = spawn_rpc_node(11155111).await;
		let config = ConfigBuilder::new().chain_id(1).rpc_url(rpc_url).build();
		let result = NotifierBuilder::new(config)
			.build(NotifierFactories::default())
			.await;

		let err = result.err().unwrap();
		assert!(matches!(err, BuilderError::Config(_)));
		assert!(err.to_string().contains("serves chain 11155111"));
	}

	#[tokio::test]
	async fn test_unreachable_node_rejected() {
		let config = ConfigBuilder::new().rpc_url("http://127.0.0.1:9").build();
		let result = NotifierBuilder::new(config)
			.build(NotifierFactories::default())
			.await;
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}

	#[tokio::test]
	async fn test_invalid_config_rejected_before_building() {
		let config = ConfigBuilder::new().safe_address("").build();
		let result = NotifierBuilder::new(config)
			.with_delivery(mock_delivery())
			.build(NotifierFactories::default())
			.await;
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}

	#[tokio::test]
	async fn test_bad_private_key_rejected() {
		let config = ConfigBuilder::new().private_key("0x1234").build();
		let result = NotifierBuilder::new(config)
			.with_delivery(mock_delivery())
			.build(NotifierFactories::default())
			.await;

		let err = result.err().unwrap();
		assert!(err.to_string().contains("Failed to create account implementation 'local'"));
	}

	#[tokio::test]
	async fn test_empty_private_key_rejected() {
		// What an unset `${ETHEREUM_PRIVATE_KEY:-}` resolves to
		let config = ConfigBuilder::new().private_key("").build();
		let result = NotifierBuilder::new(config)
			.with_delivery(mock_delivery())
			.build(NotifierFactories::default())
			.await;

		let err = result.err().unwrap();
		assert!(matches!(err, BuilderError::Config(_)));
		assert!(err.to_string().contains("private key is empty"));
	}

	#[tokio::test]
	async fn test_unregistered_account_implementation() {
		let factories = NotifierFactories {
			account_factories: HashMap::<String, AccountFactory>::new(),
			price_factories: notifier_price::get_all_implementations()
				.into_iter()
				.map(|(name, factory)| (name.to_string(), factory))
				.collect(),
		};
		let result = NotifierBuilder::new(ConfigBuilder::new().build())
			.with_delivery(mock_delivery())
			.build(factories)
			.await;
		assert!(matches!(result, Err(BuilderError::MissingComponent(_))));
	}

	#[tokio::test]
	async fn test_unknown_primary_price_feed() {
		let config = ConfigBuilder::new()
			.price_feed("chainlink", toml::Value::Table(toml::Table::new()))
			.build();
		let result = NotifierBuilder::new(config)
			.with_delivery(mock_delivery())
			.build(NotifierFactories::default())
			.await;
		assert!(matches!(result, Err(BuilderError::Config(_))));
	}

	#[tokio::test]
	async fn test_delivery_chain_mismatch() {
		let delivery = MockDelivery {
			chain_id: 1,
			chain: Arc::new(Mutex::new(MockChain::default())),
		};
		let result = NotifierBuilder::new(ConfigBuilder::new().build())
			.with_delivery(Box::new(delivery))
			.build(NotifierFactories::default())
			.await;

		let err = result.err().unwrap();
		assert!(err.to_string().contains("bound to chain 1"));
	}
}
