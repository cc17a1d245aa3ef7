//! Transaction delivery types for the notifier.
//!
//! This module defines the values that flow between the handler, the account
//! that signs and the delivery provider that submits: the unsigned transfer
//! request, its signed encoding, and the hash the network hands back.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Blockchain transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionHash(pub B256);

impl fmt::Display for TransactionHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<B256> for TransactionHash {
	fn from(hash: B256) -> Self {
		Self(hash)
	}
}

/// Which of the two configured destinations a transfer is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferKind {
	/// Plain transfer to the configured recipient account.
	Recipient,
	/// Transfer to the configured Safe contract.
	Safe,
}

impl fmt::Display for TransferKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TransferKind::Recipient => write!(f, "transfer"),
			TransferKind::Safe => write!(f, "safe_transfer"),
		}
	}
}

/// Unsigned native-asset transfer ready to be signed.
///
/// Built fresh for every send: the nonce is read from the network right
/// before the request is constructed and is never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
	/// Chain the transaction is replay-protected for (EIP-155).
	pub chain_id: u64,
	/// Destination address.
	pub to: Address,
	/// Amount in wei.
	pub value: U256,
	/// Gas limit for the transfer.
	pub gas_limit: u64,
	/// Gas price in wei.
	pub gas_price: u128,
	/// Account sequence number.
	pub nonce: u64,
}

/// A signed, network-encoded transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTransaction {
	/// EIP-2718 encoded bytes accepted by `eth_sendRawTransaction`.
	pub raw: Bytes,
	/// Hash computed locally from the signed payload.
	pub hash: TransactionHash,
}
