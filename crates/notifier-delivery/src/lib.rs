//! Transaction delivery module for the price notifier.
//!
//! This module handles the network side of a transfer: reading the sender's
//! next nonce and submitting already-signed transactions. Confirmation is not
//! awaited; the hash returned by the node is the only result kept.

use async_trait::async_trait;
use notifier_types::{Address, SignedTransaction, TransactionHash};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur during transaction delivery operations.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The node refused the submitted transaction.
	#[error("Transaction rejected: {0}")]
	Rejected(String),
	/// Error that occurs when the provider cannot be configured.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for transaction delivery providers.
#[async_trait]
pub trait DeliveryInterface: Send + Sync {
	/// Chain the provider is connected to.
	fn chain_id(&self) -> u64;

	/// Gets the next nonce for an address, counting pending transactions.
	async fn get_nonce(&self, address: Address) -> Result<u64, DeliveryError>;

	/// Submits a signed transaction and returns the hash reported by the node.
	async fn submit(&self, tx: &SignedTransaction) -> Result<TransactionHash, DeliveryError>;
}

/// Service that manages transaction delivery for the configured network.
pub struct DeliveryService {
	provider: Box<dyn DeliveryInterface>,
}

impl DeliveryService {
	pub fn new(provider: Box<dyn DeliveryInterface>) -> Self {
		Self { provider }
	}

	pub fn chain_id(&self) -> u64 {
		self.provider.chain_id()
	}

	/// Reads the nonce to use for the next transaction from `address`.
	pub async fn get_nonce(&self, address: Address) -> Result<u64, DeliveryError> {
		self.provider.get_nonce(address).await
	}

	/// Submits a signed transaction through the provider.
	pub async fn deliver(&self, tx: &SignedTransaction) -> Result<TransactionHash, DeliveryError> {
		let hash = self.provider.submit(tx).await?;
		if hash != tx.hash {
			// The node's hash is authoritative; a mismatch points at an encoding issue
			tracing::warn!(
				local_hash = %tx.hash,
				node_hash = %hash,
				"Node reported a different transaction hash than computed locally"
			);
		}
		Ok(hash)
	}
}
