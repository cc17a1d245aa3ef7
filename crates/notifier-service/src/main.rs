//! Main entry point for the price notifier service.
//!
//! Loads the configuration, builds the notifier engine and feeds it trigger
//! messages: once with `--once`, otherwise on a fixed interval until
//! interrupted. Every trigger checks the price and, on a successful quote,
//! sends the configured transfers.

use clap::Parser;
use notifier_config::Config;
use notifier_core::{spawn_interval_trigger, NotifierBuilder, NotifierFactories};
use notifier_types::TriggerMessage;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;

/// Command-line arguments for the notifier service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Handle a single trigger and exit
	#[arg(long)]
	once: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started notifier");

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.notifier.id);

	let interval = Duration::from_secs(config.notifier.trigger_interval_seconds);
	let engine = NotifierBuilder::new(config)
		.build(NotifierFactories::default())
		.await?;

	if args.once {
		// The outcome is already logged by the handler; failures do not change
		// the exit code
		engine.handle_once(TriggerMessage::new("cli", 1)).await;
	} else {
		// Capacity 1: one tick can wait behind a running check, later ones are dropped
		let (sender, receiver) = mpsc::channel(1);
		let trigger = spawn_interval_trigger(interval, sender);
		tracing::info!(interval_seconds = interval.as_secs(), "Interval trigger started");

		engine.run(receiver).await;
		trigger.abort();
	}

	tracing::info!("Stopped notifier");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_args() {
		let args = Args::try_parse_from(["notifier"]).unwrap();
		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
		assert!(!args.once);
	}

	#[test]
	fn test_once_with_custom_config() {
		let args =
			Args::try_parse_from(["notifier", "-c", "config/notifier.toml", "--once", "-l", "debug"])
				.unwrap();
		assert_eq!(args.config, PathBuf::from("config/notifier.toml"));
		assert_eq!(args.log_level, "debug");
		assert!(args.once);
	}
}
