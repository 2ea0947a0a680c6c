//! Export orchestration: trigger regeneration and retrieve generated files.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bzip2::Compression;
use bzip2::write::BzEncoder;
use tracing::{debug, info, warn};

use crate::catalog::{self, DataExport};
use crate::error::{CxError, Result};
use crate::http::{self, HttpOptions};
use crate::registry::Registry;
use crate::session::{Credentials, Session, SessionManager};
use crate::table::{self, Table};

/// Orchestrates data exports over one authenticated portal session.
///
/// Owns the [`SessionManager`] and the [`Registry`] of known exports.
/// Every network-bearing call refreshes the session afterwards, keeping
/// the keep-alive contract in one place.
///
/// A run request only asks the server to regenerate the export; the
/// server offers no completion signal, so a download issued immediately
/// after a run may still return the previous generation. Callers decide
/// how long to wait.
pub struct ExportClient {
	session: SessionManager,
	registry: Registry,
}

impl ExportClient {
	/// Logs in and performs the initial catalog fetch.
	///
	/// # Errors
	///
	/// [`CxError::AuthenticationFailed`] when the portal rejects the
	/// credentials, plus the login and catalog error modes.
	pub fn connect(credentials: Credentials, options: HttpOptions) -> Result<Self> {
		let mut session = SessionManager::new(credentials, options)?;
		session.login_or_fail()?;

		let exports = catalog::fetch(&mut session)?;
		info!(target = "cx", count = exports.len(), "connected to portal");
		Ok(Self {
			session,
			registry: Registry::from_exports(exports),
		})
	}

	pub fn session(&self) -> &Session {
		self.session.session()
	}

	pub fn registry(&self) -> &Registry {
		&self.registry
	}

	/// Re-fetches the listing and replaces the registry contents.
	pub fn refresh_catalog(&mut self) -> Result<()> {
		let exports = catalog::fetch(&mut self.session)?;
		self.registry.replace_all(exports);
		Ok(())
	}

	/// Requests server-side regeneration of an export.
	///
	/// Proceeds only when the local expiry check judges the session
	/// unexpired (advisory; the server stays authoritative). Fetches the
	/// run window for the export's view, extracts that page's own
	/// anti-forgery token, and POSTs the run request. On acceptance the
	/// registry entry is stamped with `requested_run_at`.
	///
	/// Returns whether the run request was actually sent and accepted.
	/// The session is refreshed afterwards regardless of the outcome.
	pub fn run(&mut self, id: i64) -> Result<bool> {
		let export = self
			.registry
			.find_by_id(id)
			.cloned()
			.ok_or(CxError::UnknownExport(id))?;

		let outcome = self.request_run(&export);
		let refreshed = self.session.refresh();

		let ran = outcome?;
		refreshed?;
		Ok(ran)
	}

	fn request_run(&mut self, export: &DataExport) -> Result<bool> {
		if self.session.session().is_expired() {
			warn!(target = "cx", id = export.id, "session window elapsed, run request skipped");
			return Ok(false);
		}

		let cache_buster = epoch_millis();
		let window_url = format!(
			"{}/Reporting/RunExport_Window?guid={}&_={}",
			self.session.base(),
			export.view_guid,
			cache_buster
		);
		let page = http::with_retry(self.session.options(), || {
			self.session.client().get(&window_url).send()
		})?;
		let token = crate::token::extract_token(&page.text()?)?;

		let run_url = format!("{}/Reporting/RunExport_Window", self.session.base());
		let form = [
			("__RequestVerificationToken", token.as_str()),
			("DynamicViewGUID", export.view_guid.as_str()),
			("DataExportID", ""),
		];
		let response = http::with_retry(self.session.options(), || {
			self.session.client().post(&run_url).form(&form).send()
		})?;

		if !response.status().is_success() {
			warn!(
				target = "cx",
				id = export.id,
				status = response.status().as_u16(),
				"run request rejected"
			);
			return Ok(false);
		}

		let mut updated = export.clone();
		updated.requested_run_at = Some(SystemTime::now());
		self.registry.upsert(updated);
		debug!(target = "cx", id = export.id, "run requested");
		Ok(true)
	}

	/// Downloads the current generated file for an export, returning the
	/// raw bytes.
	///
	/// # Errors
	///
	/// [`CxError::DownloadFailed`] with the HTTP status on a non-success
	/// response; no internal retry beyond the transient transport bound.
	pub fn download(&mut self, id: i64) -> Result<Vec<u8>> {
		self.fetch_export(id).map(|(bytes, _)| bytes)
	}

	/// Downloads an export and persists it under `dir` as
	/// `<epoch_seconds>-<slug>.csv.bz2` (bzip2-compressed CSV), returning
	/// the written path.
	pub fn download_to(&mut self, id: i64, dir: &Path) -> Result<PathBuf> {
		let (bytes, export) = self.fetch_export(id)?;

		let path = dir.join(format!("{}-{}.csv.bz2", epoch_seconds(), export.slug));
		let file = File::create(&path)?;
		let mut encoder = BzEncoder::new(file, Compression::default());
		encoder.write_all(&bytes)?;
		encoder.finish()?;

		info!(target = "cx", id, path = %path.display(), "export persisted");
		Ok(path)
	}

	/// Downloads an export and decodes it as a text-only table.
	pub fn materialize(&mut self, id: i64) -> Result<Table> {
		let bytes = self.download(id)?;
		table::decode_csv(&bytes)
	}

	fn fetch_export(&mut self, id: i64) -> Result<(Vec<u8>, DataExport)> {
		let export = self
			.registry
			.find_by_id(id)
			.cloned()
			.ok_or(CxError::UnknownExport(id))?;

		let url = format!(
			"{}/Reporting/DownloadExport?dataExportID={}&_",
			self.session.base(),
			id
		);
		let response = http::with_retry(self.session.options(), || {
			self.session.client().get(&url).send()
		})?;

		let status = response.status();
		if !status.is_success() {
			return Err(CxError::DownloadFailed(status.as_u16()));
		}

		let bytes = response.bytes()?.to_vec();
		debug!(target = "cx", id, size = bytes.len(), "export downloaded");

		self.session.refresh()?;
		Ok((bytes, export))
	}
}

fn epoch_seconds() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}

fn epoch_millis() -> u128 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_millis()
}
