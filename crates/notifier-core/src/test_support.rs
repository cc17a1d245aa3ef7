//! In-memory collaborators shared by the unit tests of this crate.

use async_trait::async_trait;
use axum::{routing::post, Json, Router};
use notifier_delivery::{DeliveryError, DeliveryInterface};
use notifier_types::{Address, SignedTransaction, TransactionHash};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

/// Serves a JSON-RPC endpoint on an ephemeral port that only answers
/// `eth_chainId`, and returns its URL.
pub async fn spawn_rpc_node(chain_id: u64) -> String {
	let router = Router::new().route(
		"/",
		post(move |Json(request): Json<Value>| async move {
			Json(json!({
				"jsonrpc": "2.0",
				"id": request["id"],
				"result": format!("{:#x}", chain_id),
			}))
		}),
	);
	let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
	let addr = listener.local_addr().unwrap();
	tokio::spawn(async move {
		axum::serve(listener, router).await.unwrap();
	});
	format!("http://{}", addr)
}

/// In-memory chain: one account, pending nonce bumped on every accepted
/// submission.
#[derive(Debug, Default)]
pub struct MockChain {
	pub next_nonce: u64,
	pub submitted: Vec<TransactionHash>,
	pub nonce_lookups: usize,
	pub fail_nonce: bool,
	pub reject_submissions: bool,
}

pub struct MockDelivery {
	pub chain_id: u64,
	pub chain: Arc<Mutex<MockChain>>,
}

impl MockDelivery {
	pub fn new(chain: Arc<Mutex<MockChain>>) -> Self {
		Self {
			chain_id: 31337,
			chain,
		}
	}
}

#[async_trait]
impl DeliveryInterface for MockDelivery {
	fn chain_id(&self) -> u64 {
		self.chain_id
	}

	async fn get_nonce(&self, _address: Address) -> Result<u64, DeliveryError> {
		let mut chain = self.chain.lock().unwrap();
		chain.nonce_lookups += 1;
		if chain.fail_nonce {
			return Err(DeliveryError::Network("connection refused".to_string()));
		}
		Ok(chain.next_nonce)
	}

	async fn submit(&self, tx: &SignedTransaction) -> Result<TransactionHash, DeliveryError> {
		let mut chain = self.chain.lock().unwrap();
		if chain.reject_submissions {
			return Err(DeliveryError::Rejected(
				"insufficient funds for gas * price + value".to_string(),
			));
		}
		chain.next_nonce += 1;
		chain.submitted.push(tx.hash);
		Ok(tx.hash)
	}
}
