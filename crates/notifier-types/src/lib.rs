//! Common types module for the price notifier.
//!
//! This module defines the value types shared between the notifier crates:
//! transfer requests and their signed form, price quotes, trigger messages,
//! and the secret wrapper used for keys and API tokens.

/// Transaction delivery types: requests, signed payloads and hashes.
pub mod delivery;
/// Trigger messages delivered to the handler.
pub mod message;
/// Price quote request and response types.
pub mod price;
/// Registry trait for config-selected implementations.
pub mod registry;
/// Redacting, zeroizing string wrapper for credentials.
pub mod secret_string;
/// Utility functions for hex strings and timestamps.
pub mod utils;

pub use delivery::*;
pub use message::TriggerMessage;
pub use price::{PriceQuote, PriceRequest};
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use utils::{current_timestamp, truncate_id, without_0x_prefix};

// Re-exported so downstream crates agree on one primitive type set.
pub use alloy_primitives::{Address, U256};
