//! Data-export catalog: listing fetch and entity construction.
//!
//! The portal's reporting area exposes the "data export" definitions the
//! authenticated user may regenerate and download. The listing is a JSON
//! fragment served by a form endpoint; field names below are load-bearing
//! and match the upstream server exactly.

use std::time::SystemTime;

use serde::Deserialize;
use tracing::info;

use crate::error::{CxError, Result};
use crate::http;
use crate::session::SessionManager;

const LISTING_PAGE_SIZE: &str = "200";

/// One entry of the `DataExportList_Read` payload, exactly as served.
///
/// Everything except the id is nullable upstream.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportRecord {
	#[serde(rename = "DataExportID")]
	pub data_export_id: i64,
	#[serde(rename = "DynamicViewName", default)]
	pub dynamic_view_name: Option<String>,
	#[serde(rename = "Name", default)]
	pub name: Option<String>,
	#[serde(rename = "RunByName", default)]
	pub run_by_name: Option<String>,
	#[serde(rename = "DynamicViewGUID", default)]
	pub dynamic_view_guid: Option<String>,
	#[serde(rename = "DynamicViewID", default)]
	pub dynamic_view_id: Option<i64>,
	#[serde(rename = "RunBy", default)]
	pub run_by: Option<i64>,
	#[serde(rename = "JobID", default)]
	pub job_id: Option<i64>,
	#[serde(rename = "Downloadable", default)]
	pub downloadable: Option<bool>,
	#[serde(rename = "LastExportDate", default)]
	pub last_export_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ListingPage {
	#[serde(rename = "Data")]
	data: Vec<ExportRecord>,
}

/// A server-defined report the user can trigger regeneration of and
/// download as tabular data.
///
/// Immutable once materialized from a listing entry, except for
/// `requested_run_at`, which a successful run request stamps.
#[derive(Debug, Clone)]
pub struct DataExport {
	pub id: i64,
	/// Display name of the underlying dynamic view.
	pub display_name: String,
	pub run_by: Option<String>,
	/// Opaque server handle for the view backing this export.
	pub view_id: Option<i64>,
	/// GUID the run endpoint is keyed by.
	pub view_guid: String,
	pub downloadable: bool,
	pub last_export_date: Option<String>,
	/// When a regeneration was last requested through this client. The
	/// server gives no completion signal, so this marks the request, not
	/// readiness.
	pub requested_run_at: Option<SystemTime>,
	/// Filesystem-safe name used for persisted downloads.
	pub slug: String,
}

impl DataExport {
	pub fn from_record(record: ExportRecord) -> Self {
		let display_name = record.dynamic_view_name.or(record.name).unwrap_or_default();
		Self {
			id: record.data_export_id,
			slug: slugify(&display_name),
			display_name,
			run_by: record.run_by_name,
			view_id: record.dynamic_view_id,
			view_guid: record.dynamic_view_guid.unwrap_or_default(),
			downloadable: record.downloadable.unwrap_or(false),
			last_export_date: record.last_export_date,
			requested_run_at: None,
		}
	}
}

/// Derives the filesystem-safe slug for a display name: every character
/// outside `[0-9a-zA-Z]` becomes `-`. Pure and idempotent.
pub fn slugify(name: &str) -> String {
	name.chars()
		.map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
		.collect()
}

/// Fetches the full export listing for the authenticated user.
///
/// Navigates to the reporting landing page first (the listing endpoint is
/// gated on cookies it sets), then POSTs the page-size form. Refreshes the
/// session afterwards.
///
/// # Errors
///
/// [`CxError::CatalogFetch`] when the response is not well-formed JSON or
/// lacks the `Data` array; transport errors propagate unchanged.
pub fn fetch(session: &mut SessionManager) -> Result<Vec<DataExport>> {
	let landing_url = format!("{}/Reporting/DataExport", session.base());
	http::with_retry(session.options(), || session.client().get(&landing_url).send())?;

	let listing_url = format!("{}/Reporting/DataExportList_Read", session.base());
	let form = [("pageSize", LISTING_PAGE_SIZE)];
	let response = http::with_retry(session.options(), || {
		session.client().post(&listing_url).form(&form).send()
	})?;

	let body = response.text()?;
	let page: ListingPage =
		serde_json::from_str(&body).map_err(|err| CxError::CatalogFetch(err.to_string()))?;

	let exports: Vec<DataExport> = page.data.into_iter().map(DataExport::from_record).collect();
	info!(target = "cx", count = exports.len(), "export listing fetched");

	session.refresh()?;
	Ok(exports)
}
