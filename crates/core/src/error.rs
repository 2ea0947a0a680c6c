//! Error taxonomy for portal interactions.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CxError>;

/// Failures surfaced by the portal client.
///
/// Transport failures and non-success statuses are never downgraded to a
/// logged string and a boolean; every failure mode is a distinct variant
/// the caller can match on.
#[derive(Debug, Error)]
pub enum CxError {
	/// The portal rejected a login POST for a credential it previously
	/// accepted. Recoverable by retrying with fresh credentials.
	#[error("portal rejected login (status {0})")]
	AuthenticationFailed(u16),

	/// An expected element was absent from portal markup. Indicates an
	/// upstream page-structure change; never retried.
	#[error("failed to parse portal page: {0}")]
	Parse(String),

	/// The export listing response was not well-formed JSON or lacked the
	/// expected payload field.
	#[error("malformed export listing: {0}")]
	CatalogFetch(String),

	/// The download endpoint answered with a non-success status.
	#[error("export download failed (status {0})")]
	DownloadFailed(u16),

	/// No data export with this id exists in the registry.
	#[error("unknown data export id {0}")]
	UnknownExport(i64),

	/// Transport-level failure, propagated unchanged. Transient connect
	/// and timeout errors are retried within the configured bound before
	/// this surfaces.
	#[error("http transport error")]
	Http(#[from] reqwest::Error),

	#[error("i/o error")]
	Io(#[from] std::io::Error),

	/// Downloaded bytes could not be decoded as CSV.
	#[error("csv decode error")]
	Csv(#[from] csv::Error),
}
