//! Notifier engine.
//!
//! Receives trigger messages from a channel and hands them to the transfer
//! handler one at a time. Messages are never processed concurrently: two
//! overlapping invocations would read the same pending nonce.

use crate::handlers::{HandleOutcome, TransactionNotifierHandler};
use notifier_config::Config;
use notifier_types::TriggerMessage;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Main notifier engine.
#[derive(Clone)]
pub struct NotifierEngine {
	config: Config,
	handler: Arc<TransactionNotifierHandler>,
}

impl NotifierEngine {
	pub fn new(config: Config, handler: Arc<TransactionNotifierHandler>) -> Self {
		Self { config, handler }
	}

	/// Returns a reference to the configuration.
	pub fn config(&self) -> &Config {
		&self.config
	}

	pub fn handler(&self) -> &Arc<TransactionNotifierHandler> {
		&self.handler
	}

	/// Runs the handler for a single message.
	pub async fn handle_once(&self, message: TriggerMessage) -> HandleOutcome {
		let outcome = self.handler.handle(&message).await;
		tracing::debug!(
			message = %message,
			submitted = outcome.submitted(),
			"Trigger processed"
		);
		outcome
	}

	/// Processes messages until the channel closes or Ctrl+C is received.
	pub async fn run(&self, receiver: mpsc::Receiver<TriggerMessage>) {
		self.run_until(receiver, async {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!(error = %e, "Failed to listen for Ctrl+C, running until the trigger stops");
				std::future::pending::<()>().await;
			}
		})
		.await
	}

	/// Processes messages until the channel closes or `shutdown` completes.
	///
	/// A message being handled when `shutdown` fires is finished first, so a
	/// transfer is never abandoned between signing and submission.
	pub async fn run_until<F>(&self, mut receiver: mpsc::Receiver<TriggerMessage>, shutdown: F)
	where
		F: Future<Output = ()>,
	{
		tracing::info!(notifier_id = %self.config.notifier.id, "Notifier started");
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				message = receiver.recv() => {
					match message {
						Some(message) => {
							self.handle_once(message).await;
						}
						None => {
							tracing::info!("Trigger channel closed");
							break;
						}
					}
				}

				_ = &mut shutdown => {
					tracing::info!("Shutdown signal received");
					break;
				}
			}
		}

		tracing::info!(notifier_id = %self.config.notifier.id, "Notifier stopped");
	}
}

/// Sends a trigger message every `period`, the first one immediately.
///
/// A tick is dropped when the previous message has not been picked up yet, so
/// a slow price check never builds a backlog. The task ends once the
/// receiving side is gone.
pub fn spawn_interval_trigger(
	period: Duration,
	sender: mpsc::Sender<TriggerMessage>,
) -> JoinHandle<()> {
	tokio::spawn(async move {
		let mut interval = tokio::time::interval(period);
		interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
		let mut sequence = 0u64;

		loop {
			interval.tick().await;
			sequence += 1;
			match sender.try_send(TriggerMessage::new("interval", sequence)) {
				Ok(()) => {}
				Err(TrySendError::Full(message)) => {
					tracing::debug!(message = %message, "Previous trigger still pending, skipping tick");
				}
				Err(TrySendError::Closed(_)) => break,
			}
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::builder::{NotifierBuilder, NotifierFactories};
	use crate::test_support::{MockChain, MockDelivery};
	use notifier_config::builders::ConfigBuilder;
	use std::sync::Mutex;

	async fn engine(price: toml::Value, chain: Arc<Mutex<MockChain>>) -> NotifierEngine {
		NotifierBuilder::new(ConfigBuilder::new().price_feed("mock", price).build())
			.with_delivery(Box::new(MockDelivery::new(chain)))
			.build(NotifierFactories::default())
			.await
			.unwrap()
	}

	fn failing_price() -> toml::Value {
		let mut table = toml::Table::new();
		table.insert("fail_with_status".to_string(), toml::Value::Integer(500));
		toml::Value::Table(table)
	}

	#[tokio::test]
	async fn test_run_drains_channel_sequentially() {
		let chain = Arc::new(Mutex::new(MockChain::default()));
		let engine = engine(toml::Value::Table(toml::Table::new()), chain.clone()).await;

		let (sender, receiver) = mpsc::channel(4);
		sender.send(TriggerMessage::new("test", 1)).await.unwrap();
		sender.send(TriggerMessage::new("test", 2)).await.unwrap();
		drop(sender);

		engine.run_until(receiver, std::future::pending()).await;

		// Two transfers per message, nonces 0..4 in submission order
		let chain = chain.lock().unwrap();
		assert_eq!(chain.submitted.len(), 4);
		assert_eq!(chain.next_nonce, 4);
	}

	#[tokio::test]
	async fn test_failed_quote_sends_nothing() {
		let chain = Arc::new(Mutex::new(MockChain::default()));
		let engine = engine(failing_price(), chain.clone()).await;

		let outcome = engine.handle_once(TriggerMessage::new("test", 1)).await;

		assert!(matches!(outcome, HandleOutcome::QuoteFailed(_)));
		assert!(chain.lock().unwrap().submitted.is_empty());
	}

	#[tokio::test]
	async fn test_shutdown_stops_run() {
		let chain = Arc::new(Mutex::new(MockChain::default()));
		let engine = engine(toml::Value::Table(toml::Table::new()), chain.clone()).await;

		// Sender kept alive, so only the shutdown future can end the loop
		let (_sender, receiver) = mpsc::channel::<TriggerMessage>(1);
		engine.run_until(receiver, async {}).await;

		assert_eq!(chain.lock().unwrap().nonce_lookups, 0);
	}

	#[tokio::test(start_paused = true)]
	async fn test_interval_trigger_sequences() {
		let (sender, mut receiver) = mpsc::channel(8);
		let handle = spawn_interval_trigger(Duration::from_secs(60), sender);

		for expected in 1..=3 {
			let message = receiver.recv().await.unwrap();
			assert_eq!(message.source, "interval");
			assert_eq!(message.sequence, expected);
		}

		drop(receiver);
		handle.await.unwrap();
	}

	#[tokio::test(start_paused = true)]
	async fn test_interval_trigger_skips_when_full() {
		let (sender, mut receiver) = mpsc::channel(1);
		let handle = spawn_interval_trigger(Duration::from_secs(10), sender);

		// Let several periods pass without reading
		tokio::time::sleep(Duration::from_secs(35)).await;

		let first = receiver.recv().await.unwrap();
		assert_eq!(first.sequence, 1);
		let next = receiver.recv().await.unwrap();
		assert!(next.sequence > 2);

		handle.abort();
	}
}
