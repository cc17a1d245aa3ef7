//! Builders for test and development configurations.

mod config;

pub use config::{ConfigBuilder, DEV_PRIVATE_KEY};
