//! Message handlers.
//!
//! The notifier registers a single handler: on every trigger it checks the
//! price and, on a successful quote, sends the configured transfers.

pub mod transfer;

pub use transfer::{
	HandleOutcome, SubmittedTransfer, TransactionNotifierHandler, TransferError, TransferPolicy,
};
