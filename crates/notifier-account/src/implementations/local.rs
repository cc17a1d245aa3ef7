//! Local private-key account.
//!
//! Signs EIP-155 legacy transfers with a key held in memory. This matches the
//! fee model of the transfers (a single fixed gas price) and is accepted by
//! every EVM chain.

use crate::{AccountError, AccountFactory, AccountInterface, AccountRegistry};
use alloy_consensus::{SignableTransaction, TxEnvelope, TxLegacy};
use alloy_eips::eip2718::Encodable2718;
use alloy_network::TxSignerSync;
use alloy_primitives::{Bytes, TxKind};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use notifier_types::{
	without_0x_prefix, Address, ImplementationRegistry, SecretString, SignedTransaction,
	TransactionHash, TransferRequest,
};
use serde::Deserialize;

/// Configuration of `[account.implementations.local]`.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalAccountConfig {
	/// Hex encoded secp256k1 private key, `0x` prefix optional.
	pub private_key: SecretString,
}

/// Account backed by a private key held in process memory.
#[derive(Debug)]
pub struct LocalWallet {
	signer: PrivateKeySigner,
}

impl LocalWallet {
	/// Parses the key. Empty or malformed keys are rejected here so that a bad
	/// key never reaches the first transfer.
	pub fn new(private_key: &SecretString) -> Result<Self, AccountError> {
		if private_key.is_blank() {
			return Err(AccountError::InvalidKey("private key is empty".to_string()));
		}

		let signer = private_key
			.with_exposed(|key| without_0x_prefix(key.trim()).parse::<PrivateKeySigner>())
			.map_err(|e| AccountError::InvalidKey(e.to_string()))?;

		Ok(Self { signer })
	}
}

#[async_trait]
impl AccountInterface for LocalWallet {
	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	async fn sign_transaction(
		&self,
		request: &TransferRequest,
	) -> Result<SignedTransaction, AccountError> {
		let mut tx = TxLegacy {
			chain_id: Some(request.chain_id),
			nonce: request.nonce,
			gas_price: request.gas_price,
			gas_limit: request.gas_limit,
			to: TxKind::Call(request.to),
			value: request.value,
			input: Bytes::new(),
		};

		let signature = self
			.signer
			.sign_transaction_sync(&mut tx)
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;

		let envelope = TxEnvelope::from(tx.into_signed(signature));
		let hash = TransactionHash(*envelope.tx_hash());

		tracing::debug!(
			tx_hash = %hash,
			nonce = request.nonce,
			to = %request.to,
			"Signed transfer"
		);

		Ok(SignedTransaction {
			raw: Bytes::from(envelope.encoded_2718()),
			hash,
		})
	}
}

/// Factory function to create a local account from its configuration table.
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	let config: LocalAccountConfig = config
		.clone()
		.try_into()
		.map_err(|e| AccountError::Configuration(format!("Invalid local account config: {}", e)))?;

	Ok(Box::new(LocalWallet::new(&config.private_key)?))
}

/// Registry for the local account implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = AccountFactory;

	fn factory() -> Self::Factory {
		create_account
	}
}

impl AccountRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::{address, keccak256, U256};

	const ANVIL_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
	const ANVIL_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

	fn transfer(nonce: u64) -> TransferRequest {
		TransferRequest {
			chain_id: 31337,
			to: address!("7743973Fe6B36500C1e1aADe0A3fe7EE9654e8a4"),
			value: U256::from(10_000_000_000_000_000u64),
			gas_limit: 21_000,
			gas_price: 50_000_000_000,
			nonce,
		}
	}

	#[tokio::test]
	async fn test_address_derived_from_key() {
		let wallet = LocalWallet::new(&SecretString::from(ANVIL_KEY)).unwrap();
		assert_eq!(wallet.address().await.unwrap(), ANVIL_ADDRESS);

		// Prefix is optional
		let unprefixed = LocalWallet::new(&SecretString::from(&ANVIL_KEY[2..])).unwrap();
		assert_eq!(unprefixed.address().await.unwrap(), ANVIL_ADDRESS);
	}

	#[tokio::test]
	async fn test_signed_transfer_is_legacy_and_hash_matches() {
		let wallet = LocalWallet::new(&SecretString::from(ANVIL_KEY)).unwrap();
		let signed = wallet.sign_transaction(&transfer(0)).await.unwrap();

		// Legacy transactions are a bare RLP list, no type byte
		assert!(signed.raw[0] >= 0xc0);
		assert_eq!(signed.hash.0, keccak256(&signed.raw));
	}

	#[tokio::test]
	async fn test_nonce_changes_hash() {
		let wallet = LocalWallet::new(&SecretString::from(ANVIL_KEY)).unwrap();
		let first = wallet.sign_transaction(&transfer(7)).await.unwrap();
		let second = wallet.sign_transaction(&transfer(8)).await.unwrap();
		assert_ne!(first.hash, second.hash);
	}

	#[test]
	fn test_empty_key_rejected() {
		let err = LocalWallet::new(&SecretString::from("")).unwrap_err();
		assert!(matches!(err, AccountError::InvalidKey(_)));
	}

	#[test]
	fn test_malformed_key_rejected_without_leaking() {
		let err = LocalWallet::new(&SecretString::from("0xnot-a-key")).unwrap_err();
		assert!(matches!(err, AccountError::InvalidKey(_)));
		assert!(!err.to_string().contains("not-a-key"));
	}

	#[test]
	fn test_factory_reads_private_key() {
		let mut table = toml::Table::new();
		table.insert(
			"private_key".to_string(),
			toml::Value::String(ANVIL_KEY.to_string()),
		);
		assert!(create_account(&toml::Value::Table(table)).is_ok());

		let missing = create_account(&toml::Value::Table(toml::Table::new()));
		assert!(matches!(missing, Err(AccountError::Configuration(_))));
	}
}
