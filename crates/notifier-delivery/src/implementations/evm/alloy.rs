//! Alloy-based EVM delivery.
//!
//! Talks JSON-RPC over HTTP through an Alloy root provider: transactions are
//! signed elsewhere, so the provider carries no wallet and no fillers.

use crate::{DeliveryError, DeliveryInterface};
use alloy_network::Ethereum;
use alloy_provider::{Provider, RootProvider};
use async_trait::async_trait;
use notifier_types::{Address, SignedTransaction, TransactionHash};

/// Alloy-based EVM delivery implementation for a single network.
pub struct AlloyDelivery {
	chain_id: u64,
	provider: RootProvider<Ethereum>,
}

impl AlloyDelivery {
	/// Creates the HTTP provider without contacting the node. Prefer
	/// [`AlloyDelivery::connect`], which also checks the chain id.
	pub fn new(chain_id: u64, rpc_url: &str) -> Result<Self, DeliveryError> {
		let url: url::Url = rpc_url.trim().parse().map_err(|e| {
			DeliveryError::Configuration(format!(
				"Invalid RPC URL for chain {}: {}",
				chain_id, e
			))
		})?;

		let provider = RootProvider::<Ethereum>::new_http(url);

		Ok(Self { chain_id, provider })
	}

	/// Creates the HTTP provider and checks that the node serves `chain_id`.
	///
	/// Transfers are signed for the configured chain (EIP-155), so a node on
	/// another chain would reject every one of them.
	pub async fn connect(chain_id: u64, rpc_url: &str) -> Result<Self, DeliveryError> {
		let delivery = Self::new(chain_id, rpc_url)?;

		let node_chain_id = delivery
			.provider
			.get_chain_id()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get chain id: {}", e)))?;

		if node_chain_id != chain_id {
			return Err(DeliveryError::Configuration(format!(
				"RPC endpoint serves chain {} but network.chain_id is {}",
				node_chain_id, chain_id
			)));
		}

		Ok(delivery)
	}
}

#[async_trait]
impl DeliveryInterface for AlloyDelivery {
	fn chain_id(&self) -> u64 {
		self.chain_id
	}

	async fn get_nonce(&self, address: Address) -> Result<u64, DeliveryError> {
		// Pending count so a second transfer in the same invocation does not
		// reuse the nonce of one that has not been mined yet
		self.provider
			.get_transaction_count(address)
			.pending()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get nonce: {}", e)))
	}

	async fn submit(&self, tx: &SignedTransaction) -> Result<TransactionHash, DeliveryError> {
		let pending_tx = self
			.provider
			.send_raw_transaction(&tx.raw)
			.await
			.map_err(|e| {
				if e.as_error_resp().is_some() {
					DeliveryError::Rejected(e.to_string())
				} else {
					DeliveryError::Network(format!("Failed to send transaction: {}", e))
				}
			})?;

		let tx_hash = TransactionHash(*pending_tx.tx_hash());
		tracing::info!(tx_hash = %tx_hash, chain_id = self.chain_id, "Submitted transaction");

		Ok(tx_hash)
	}
}
