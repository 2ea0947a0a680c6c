//! Blocking HTTP plumbing shared by session and export calls.

use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::debug;

use crate::error::Result;

/// The portal serves browser-targeted pages and has been observed to vary
/// responses on the agent string, so requests identify as a desktop Chrome.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/76.0.3809.87 Safari/537.36";

/// Per-call timeout and transient-retry policy for portal requests.
///
/// The upstream portal can hang a connection indefinitely; every request
/// carries `timeout`, and transient transport failures (connect errors,
/// timeouts) are retried up to `max_retries` times with a linear
/// `retry_backoff` delay between attempts. Non-transient errors and HTTP
/// status codes pass through untouched.
#[derive(Debug, Clone)]
pub struct HttpOptions {
	pub timeout: Duration,
	pub max_retries: u32,
	pub retry_backoff: Duration,
}

impl Default for HttpOptions {
	fn default() -> Self {
		Self {
			timeout: Duration::from_secs(30),
			max_retries: 2,
			retry_backoff: Duration::from_millis(500),
		}
	}
}

/// Builds the shared blocking client: cookie jar enabled (the portal's
/// auth and listing endpoints are cookie-gated), per-call timeout, fixed
/// user agent.
pub(crate) fn build_client(options: &HttpOptions) -> Result<Client> {
	let client = Client::builder()
		.cookie_store(true)
		.timeout(options.timeout)
		.user_agent(USER_AGENT)
		.build()?;
	Ok(client)
}

/// Runs `send`, retrying transient transport failures within the bound.
pub(crate) fn with_retry(
	options: &HttpOptions,
	mut send: impl FnMut() -> reqwest::Result<Response>,
) -> reqwest::Result<Response> {
	let mut attempt = 0;
	loop {
		match send() {
			Ok(response) => return Ok(response),
			Err(err) if attempt < options.max_retries && is_transient(&err) => {
				attempt += 1;
				debug!(target = "cx", error = %err, attempt, "transient transport failure, retrying");
				thread::sleep(options.retry_backoff * attempt);
			}
			Err(err) => return Err(err),
		}
	}
}

fn is_transient(err: &reqwest::Error) -> bool {
	err.is_timeout() || err.is_connect()
}
