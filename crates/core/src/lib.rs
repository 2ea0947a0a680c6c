//! Client for the Connect Exchange case-management portal.
//!
//! Connect Exchange exposes no formal API: every operation is an HTML form
//! submission or a JSON fragment embedded in a server-rendered page. This
//! crate wraps the two pieces that make automating it tractable:
//!
//! * [`SessionManager`] — one authenticated HTTP session against one portal
//!   base URL, with login, expiry tracking, and keep-alive refresh.
//! * [`ExportClient`] — lists the server-side "data export" report
//!   definitions available to the authenticated user, requests that the
//!   server regenerate one, and retrieves the generated file.
//!
//! All I/O is blocking and synchronous. A client represents a single
//! authenticated identity and mutates its session and registry in place;
//! share one across threads only behind an external mutex. The expected
//! pattern is one client per worker.
//!
//! Report regeneration is asynchronous on the server and exposes no
//! completion signal, so [`ExportClient::download`] after
//! [`ExportClient::run`] may return a previous generation of the file.
//! Waiting out the regeneration is the caller's responsibility.

pub mod catalog;
pub mod error;
pub mod export;
pub mod http;
pub mod registry;
pub mod session;
pub mod table;
pub mod token;

pub use catalog::{DataExport, slugify};
pub use error::{CxError, Result};
pub use export::ExportClient;
pub use http::HttpOptions;
pub use registry::Registry;
pub use session::{Credentials, REFRESH_INTERVAL, Session, SessionManager};
pub use table::Table;
