//! Credential resolution: flags first, environment second.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use cx::{Credentials, HttpOptions};

use crate::cli::Cli;

const ENV_BASE_URL: &str = "CX_BASE_URL";
const ENV_USERNAME: &str = "CX_USERNAME";
const ENV_PASSWORD: &str = "CX_PASSWORD";

/// Builds portal credentials from CLI flags, falling back to the
/// `CX_BASE_URL` / `CX_USERNAME` / `CX_PASSWORD` environment variables.
pub fn credentials(cli: &Cli) -> Result<Credentials> {
	Ok(Credentials {
		base_url: resolve(cli.base_url.clone(), ENV_BASE_URL)?,
		username: resolve(cli.username.clone(), ENV_USERNAME)?,
		password: resolve(cli.password.clone(), ENV_PASSWORD)?,
	})
}

pub fn http_options(cli: &Cli) -> HttpOptions {
	HttpOptions {
		timeout: Duration::from_secs(cli.timeout_secs),
		..HttpOptions::default()
	}
}

fn resolve(flag: Option<String>, var: &str) -> Result<String> {
	match flag {
		Some(value) => Ok(value),
		None => env::var(var).with_context(|| format!("missing portal setting: pass a flag or set {var}")),
	}
}
