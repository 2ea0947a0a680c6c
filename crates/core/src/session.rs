//! Portal session lifecycle: login, expiry tracking, keep-alive refresh.
//!
//! The portal silently invalidates idle sessions after roughly eighteen
//! minutes. [`SessionManager`] tracks the expiry locally and exposes
//! [`SessionManager::refresh`], which every session-consuming round trip
//! must invoke afterwards: inside the window a cheap heartbeat POST extends
//! the session, past it a full login is performed because the server-side
//! session is presumed dead. Skipping the refresh risks operating on an
//! invalidated session, which the portal surfaces as unrelated HTML-parse
//! failures rather than a clean auth error.

use std::time::{Duration, Instant};

use tracing::{debug, warn};
use url::Url;

use crate::error::{CxError, Result};
use crate::http::{self, HttpOptions};
use crate::token::extract_token;

/// Keep-alive window granted by a successful login or heartbeat.
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(18 * 60);

/// Portal location and login credentials, typically supplied by an
/// external secret provider.
#[derive(Debug, Clone)]
pub struct Credentials {
	pub base_url: String,
	pub username: String,
	pub password: String,
}

/// Observable authentication state of one portal session.
///
/// `expires_at` is monotonically non-decreasing across successful login
/// and refresh calls; `authenticated == false` means no login has
/// succeeded yet or the session was invalidated.
#[derive(Debug, Clone, Copy, Default)]
pub struct Session {
	authenticated: bool,
	expires_at: Option<Instant>,
}

impl Session {
	pub fn is_authenticated(&self) -> bool {
		self.authenticated
	}

	pub fn expires_at(&self) -> Option<Instant> {
		self.expires_at
	}

	/// Whether the keep-alive window has elapsed. An expired session may
	/// still be alive server-side; the check is advisory and local.
	pub fn is_expired(&self) -> bool {
		self.is_expired_at(Instant::now())
	}

	fn is_expired_at(&self, now: Instant) -> bool {
		match self.expires_at {
			Some(expires_at) => now > expires_at,
			None => true,
		}
	}

	fn renew(&mut self, now: Instant) {
		let candidate = now + REFRESH_INTERVAL;
		self.expires_at = Some(match self.expires_at {
			Some(current) => current.max(candidate),
			None => candidate,
		});
		self.authenticated = true;
	}
}

/// One authenticated HTTP session against one portal base URL.
///
/// Owns the underlying connection pool and cookie jar. All state-changing
/// methods take `&mut self`; a manager represents a single identity and is
/// meant to be used from one worker at a time.
pub struct SessionManager {
	client: reqwest::blocking::Client,
	options: HttpOptions,
	credentials: Credentials,
	session: Session,
}

impl SessionManager {
	/// Builds the HTTP client and validates the base URL. Performs no
	/// network I/O; call [`SessionManager::login`] to authenticate.
	pub fn new(credentials: Credentials, options: HttpOptions) -> Result<Self> {
		let trimmed = credentials.base_url.trim_end_matches('/').to_string();
		Url::parse(&trimmed).map_err(|err| CxError::Parse(format!("invalid portal base url: {err}")))?;

		let client = http::build_client(&options)?;
		Ok(Self {
			client,
			options,
			credentials: Credentials {
				base_url: trimmed,
				..credentials
			},
			session: Session::default(),
		})
	}

	pub fn session(&self) -> &Session {
		&self.session
	}

	pub(crate) fn client(&self) -> &reqwest::blocking::Client {
		&self.client
	}

	pub(crate) fn options(&self) -> &HttpOptions {
		&self.options
	}

	pub(crate) fn base(&self) -> &str {
		&self.credentials.base_url
	}

	/// Authenticates against the portal.
	///
	/// Fetches the login page, extracts the hidden anti-forgery token, and
	/// POSTs the credential form. Returns `Ok(true)` on an HTTP-success
	/// response and `Ok(false)` when the portal rejects the credentials,
	/// leaving the session unauthenticated; the caller decides whether to
	/// abort or retry.
	///
	/// # Errors
	///
	/// [`CxError::Parse`] when the login page carries no verification
	/// token, [`CxError::Http`] on transport failure. Neither is retried
	/// beyond the transient transport bound.
	pub fn login(&mut self) -> Result<bool> {
		Ok(self.login_status()?.is_success())
	}

	/// Logs in, treating a rejection as a hard failure.
	pub(crate) fn login_or_fail(&mut self) -> Result<()> {
		let status = self.login_status()?;
		if !status.is_success() {
			return Err(CxError::AuthenticationFailed(status.as_u16()));
		}
		Ok(())
	}

	fn login_status(&mut self) -> Result<reqwest::StatusCode> {
		let login_url = format!("{}/Account/Login", self.base());

		let page = http::with_retry(&self.options, || self.client.get(&login_url).send())?;
		let token = extract_token(&page.text()?)?;

		let form = [
			("__RequestVerificationToken", token.as_str()),
			("Username", self.credentials.username.as_str()),
			("Password", self.credentials.password.as_str()),
			("IsMsLogin", "false"),
			("AcceptTerms", "true"),
		];
		let response = http::with_retry(&self.options, || self.client.post(&login_url).form(&form).send())?;

		let status = response.status();
		if status.is_success() {
			self.session.renew(Instant::now());
			debug!(target = "cx", "login accepted, session window renewed");
		} else {
			self.session.authenticated = false;
			warn!(target = "cx", status = status.as_u16(), "login rejected by portal");
		}
		Ok(status)
	}

	/// Extends the session after a round trip that consumed its lifetime.
	///
	/// Inside the keep-alive window this sends the lightweight heartbeat
	/// POST and pushes the expiry forward; past the window the server has
	/// presumably dropped the session and a full login is performed
	/// instead.
	///
	/// # Errors
	///
	/// [`CxError::AuthenticationFailed`] when a re-login is rejected for
	/// credentials the portal previously accepted, plus the login error
	/// modes.
	pub fn refresh(&mut self) -> Result<()> {
		let now = Instant::now();
		if self.session.is_expired_at(now) {
			debug!(target = "cx", "session window elapsed, performing full login");
			return self.login_or_fail();
		}

		let heartbeat_url = format!("{}/Home/Touchback", self.base());
		http::with_retry(&self.options, || self.client.post(&heartbeat_url).send())?;
		self.session.renew(now);
		debug!(target = "cx", "heartbeat sent, session window extended");
		Ok(())
	}

	/// Test hook: shifts the expiry backwards as if `elapsed` had passed.
	#[cfg(test)]
	fn age_by(&mut self, elapsed: Duration) {
		if let Some(expires_at) = self.session.expires_at {
			self.session.expires_at = expires_at.checked_sub(elapsed);
		}
	}
}
