//! Price-triggered transfer handler.
//!
//! For every trigger message the handler fetches a price quote and, when the
//! quote call succeeds, sends two native-asset transfers one after the other:
//! first to the configured recipient, then to the configured Safe contract.
//! Failures are contained: a failed quote skips both transfers, a failed
//! transfer does not stop the next one, and `handle` itself never errors.

use notifier_account::{AccountError, AccountService};
use notifier_config::{ConfigError, TransfersConfig};
use notifier_delivery::{DeliveryError, DeliveryService};
use notifier_price::{PriceFeedError, PriceFeedService};
use notifier_types::{
	Address, PriceQuote, PriceRequest, TransactionHash, TransferKind, TransferRequest,
	TriggerMessage, U256,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::instrument;

/// Errors that can occur while sending one transfer, by stage.
#[derive(Debug, Error)]
pub enum TransferError {
	#[error("Failed to resolve sender address: {0}")]
	Sender(AccountError),
	#[error("Failed to fetch nonce: {0}")]
	Nonce(DeliveryError),
	#[error("Failed to sign transaction: {0}")]
	Signing(AccountError),
	#[error("Failed to submit transaction: {0}")]
	Submission(DeliveryError),
}

/// Destinations and fee parameters applied to every transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPolicy {
	pub recipient: Address,
	pub safe_address: Address,
	/// Amount in wei.
	pub value: U256,
	pub gas_limit: u64,
	/// Gas price in wei.
	pub gas_price: u128,
}

impl TransferPolicy {
	pub fn from_config(config: &TransfersConfig) -> Result<Self, ConfigError> {
		Ok(Self {
			recipient: config.recipient_address()?,
			safe_address: config.safe_contract_address()?,
			value: config.value()?,
			gas_limit: config.gas_limit,
			gas_price: config.gas_price_wei(),
		})
	}

	pub fn destination(&self, kind: TransferKind) -> Address {
		match kind {
			TransferKind::Recipient => self.recipient,
			TransferKind::Safe => self.safe_address,
		}
	}
}

/// A transfer accepted by the node. Not awaited for confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedTransfer {
	pub kind: TransferKind,
	pub to: Address,
	pub nonce: u64,
	pub hash: TransactionHash,
}

/// What a single `handle` call did.
#[derive(Debug)]
pub enum HandleOutcome {
	/// The quote could not be obtained; no transfer was attempted.
	QuoteFailed(PriceFeedError),
	/// The quote succeeded and both transfers were attempted, in this order.
	Dispatched {
		quote: PriceQuote,
		transfer: Result<SubmittedTransfer, TransferError>,
		safe_transfer: Result<SubmittedTransfer, TransferError>,
	},
}

impl HandleOutcome {
	/// Number of transfers the node accepted.
	pub fn submitted(&self) -> usize {
		match self {
			HandleOutcome::QuoteFailed(_) => 0,
			HandleOutcome::Dispatched {
				transfer,
				safe_transfer,
				..
			} => [transfer.is_ok(), safe_transfer.is_ok()]
				.into_iter()
				.filter(|ok| *ok)
				.count(),
		}
	}
}

/// Handler that turns a successful price check into two transfers.
///
/// Holds only immutable state, so repeated calls are independent. Callers
/// must not run two `handle` calls for the same account concurrently: nonce
/// lookup and submission are not atomic.
pub struct TransactionNotifierHandler {
	price: Arc<PriceFeedService>,
	price_request: PriceRequest,
	account: Arc<AccountService>,
	delivery: Arc<DeliveryService>,
	policy: TransferPolicy,
}

impl TransactionNotifierHandler {
	pub fn new(
		price: Arc<PriceFeedService>,
		price_request: PriceRequest,
		account: Arc<AccountService>,
		delivery: Arc<DeliveryService>,
		policy: TransferPolicy,
	) -> Self {
		Self {
			price,
			price_request,
			account,
			delivery,
			policy,
		}
	}

	pub fn policy(&self) -> &TransferPolicy {
		&self.policy
	}

	/// Handles one trigger message. Never fails; see [`HandleOutcome`].
	#[instrument(skip_all, fields(message = %message))]
	pub async fn handle(&self, message: &TriggerMessage) -> HandleOutcome {
		let quote = match self.price.get_price(&self.price_request).await {
			Ok(quote) => quote,
			Err(PriceFeedError::Status(status)) => {
				tracing::warn!(status, "API call failed with status code {}", status);
				return HandleOutcome::QuoteFailed(PriceFeedError::Status(status));
			}
			Err(e) => {
				tracing::error!(error = %e, "Error during API call");
				return HandleOutcome::QuoteFailed(e);
			}
		};

		tracing::info!(
			asset = %quote.asset_id,
			currency = %quote.vs_currency,
			price = ?quote.price,
			payload = %quote.raw,
			"API call successful"
		);

		// The second transfer is attempted whatever happened to the first
		let transfer = self.send_transaction().await;
		let safe_transfer = self.send_safe_eth_transfer().await;

		HandleOutcome::Dispatched {
			quote,
			transfer,
			safe_transfer,
		}
	}

	/// Sends the configured amount to the configured recipient.
	pub async fn send_transaction(&self) -> Result<SubmittedTransfer, TransferError> {
		self.send_transfer(TransferKind::Recipient).await
	}

	/// Sends the configured amount to the Safe contract.
	pub async fn send_safe_eth_transfer(&self) -> Result<SubmittedTransfer, TransferError> {
		self.send_transfer(TransferKind::Safe).await
	}

	#[instrument(skip_all, fields(kind = %kind))]
	async fn send_transfer(&self, kind: TransferKind) -> Result<SubmittedTransfer, TransferError> {
		let result = self.try_send(kind).await;

		match (&result, kind) {
			(Ok(sent), TransferKind::Recipient) => {
				tracing::info!(tx_hash = %sent.hash, nonce = sent.nonce, to = %sent.to, "Transaction sent");
			}
			(Ok(sent), TransferKind::Safe) => {
				tracing::info!(tx_hash = %sent.hash, nonce = sent.nonce, to = %sent.to, "Safe ETH transfer transaction sent");
			}
			(Err(e), TransferKind::Recipient) => {
				tracing::error!(error = %e, "Error during transaction");
			}
			(Err(e), TransferKind::Safe) => {
				tracing::error!(error = %e, "Error during Safe ETH transfer");
			}
		}

		result
	}

	async fn try_send(&self, kind: TransferKind) -> Result<SubmittedTransfer, TransferError> {
		let sender = self
			.account
			.get_address()
			.await
			.map_err(TransferError::Sender)?;

		// Read right before signing, never cached between transfers
		let nonce = self
			.delivery
			.get_nonce(sender)
			.await
			.map_err(TransferError::Nonce)?;

		let to = self.policy.destination(kind);
		let request = TransferRequest {
			chain_id: self.delivery.chain_id(),
			to,
			value: self.policy.value,
			gas_limit: self.policy.gas_limit,
			gas_price: self.policy.gas_price,
			nonce,
		};

		let signed = self
			.account
			.sign(&request)
			.await
			.map_err(TransferError::Signing)?;

		let hash = self
			.delivery
			.deliver(&signed)
			.await
			.map_err(TransferError::Submission)?;

		Ok(SubmittedTransfer {
			kind,
			to,
			nonce,
			hash,
		})
	}
}
