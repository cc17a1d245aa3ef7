//! Core of the price notifier.
//!
//! Wires the account, delivery and price feed services into a
//! [`TransactionNotifierHandler`] and drives it from a stream of trigger
//! messages. Each message causes one price check and, when the price API
//! answers with HTTP 200, two transfers from the configured account.

pub mod builder;
pub mod engine;
pub mod handlers;
#[cfg(test)]
mod test_support;

pub use builder::{BuilderError, NotifierBuilder, NotifierFactories};
pub use engine::{spawn_interval_trigger, NotifierEngine};
pub use handlers::{
	HandleOutcome, SubmittedTransfer, TransactionNotifierHandler, TransferError, TransferPolicy,
};
