//! Tracing setup for the CLI.

use tracing_subscriber::EnvFilter;

/// Initializes the subscriber. Verbosity maps to `warn` / `info` /
/// `debug`; an explicit `RUST_LOG` wins.
pub fn init_logging(verbose: u8) {
	let default_level = match verbose {
		0 => "warn",
		1 => "info",
		_ => "debug",
	};
	let filter = EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| EnvFilter::new(format!("cx={default_level},cx_cli={default_level}")));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
