//! End-to-end flow against a mock portal: connect, list, run, download.

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use cx::{Credentials, CxError, ExportClient, HttpOptions};

const LOGIN_PAGE: &str = r#"<html><body><form method="post">
	<input name="__RequestVerificationToken" type="hidden" value="login-token" />
</form></body></html>"#;

const RUN_WINDOW_PAGE: &str = r#"<div class="t-window">
	<form><input name="__RequestVerificationToken" type="hidden" value="window-token" /></form>
</div>"#;

const LISTING: &str = r#"{"Data": [
	{"DataExportID": 41, "DynamicViewName": "Incident Log", "DynamicViewGUID": "guid-41",
	 "DynamicViewID": 7, "Downloadable": true, "LastExportDate": "/Date(1719244800000)/"},
	{"DataExportID": 77, "DynamicViewName": "Census Weekly", "DynamicViewGUID": "guid-77",
	 "DynamicViewID": 9, "Downloadable": true, "LastExportDate": null}
]}"#;

const CSV_BODY: &str = "CaseID,Opened,Units\n1001,2024-06-01,3\n1002,2024-06-02,12\n";

/// Serves the portal's endpoints and records `METHOD url | body` lines.
struct MockPortal {
	base_url: String,
	log: Arc<Mutex<Vec<String>>>,
}

impl MockPortal {
	fn start() -> Self {
		Self::start_with_window(RUN_WINDOW_PAGE)
	}

	/// Starts a portal whose run window serves `window_page`, so tests can
	/// simulate upstream changes to that page's markup.
	fn start_with_window(window_page: &'static str) -> Self {
		let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
		let base_url = format!("http://{}", server.server_addr().to_ip().unwrap());
		let log = Arc::new(Mutex::new(Vec::new()));

		let requests = Arc::clone(&log);
		thread::spawn(move || {
			for mut request in server.incoming_requests() {
				let line = format!("{} {}", request.method(), request.url());
				let mut body = String::new();
				let _ = request.as_reader().read_to_string(&mut body);
				requests.lock().unwrap().push(format!("{line} | {body}"));

				let response = route(&line, window_page);
				let _ = request.respond(response);
			}
		});

		Self { base_url, log }
	}

	fn requests(&self) -> Vec<String> {
		self.log.lock().unwrap().clone()
	}

	fn connect(&self) -> ExportClient {
		ExportClient::connect(
			Credentials {
				// Trailing slash must be tolerated, the way secret stores
				// tend to hand base URLs out.
				base_url: format!("{}/", self.base_url),
				username: "svc-export".into(),
				password: "hunter2".into(),
			},
			HttpOptions::default(),
		)
		.unwrap()
	}
}

fn route(line: &str, window_page: &str) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
	let (method, url) = line.split_once(' ').unwrap();
	match (method, url) {
		("GET", "/Account/Login") => tiny_http::Response::from_string(LOGIN_PAGE),
		("POST", "/Account/Login") => tiny_http::Response::from_string("welcome"),
		("POST", "/Home/Touchback") => tiny_http::Response::from_string("ok"),
		("GET", "/Reporting/DataExport") => tiny_http::Response::from_string("<html>exports</html>"),
		("POST", "/Reporting/DataExportList_Read") => tiny_http::Response::from_string(LISTING),
		("POST", "/Reporting/RunExport_Window") => tiny_http::Response::from_string("queued"),
		_ if method == "GET" && url.starts_with("/Reporting/RunExport_Window?") => {
			tiny_http::Response::from_string(window_page)
		}
		_ if method == "GET" && url.starts_with("/Reporting/DownloadExport?dataExportID=41") => {
			tiny_http::Response::from_string(CSV_BODY)
		}
		_ if method == "GET" && url.starts_with("/Reporting/DownloadExport?dataExportID=77") => {
			tiny_http::Response::from_string("exploded").with_status_code(500)
		}
		_ => tiny_http::Response::from_string("not found").with_status_code(404),
	}
}

#[test]
fn connect_populates_registry_from_listing() {
	let portal = MockPortal::start();
	let client = portal.connect();

	assert!(client.session().is_authenticated());
	assert_eq!(client.registry().len(), 2);

	let export = client.registry().find_by_id(41).unwrap();
	assert_eq!(export.display_name, "Incident Log");
	assert_eq!(export.slug, "Incident-Log");
	assert_eq!(export.view_guid, "guid-41");
	assert!(export.downloadable);
}

#[test]
fn run_posts_window_token_and_stamps_registry() {
	let portal = MockPortal::start();
	let mut client = portal.connect();

	assert!(client.registry().find_by_id(41).unwrap().requested_run_at.is_none());
	assert!(client.run(41).unwrap());
	assert!(client.registry().find_by_id(41).unwrap().requested_run_at.is_some());

	let requests = portal.requests();
	let window_get = requests
		.iter()
		.find(|r| r.starts_with("GET /Reporting/RunExport_Window?"))
		.expect("run window fetched");
	assert!(window_get.contains("guid=guid-41"), "cache-busted guid query: {window_get}");

	let run_post = requests
		.iter()
		.find(|r| r.starts_with("POST /Reporting/RunExport_Window"))
		.expect("run request posted");
	// The run POST carries the window page's own token, not the login one.
	assert!(run_post.contains("__RequestVerificationToken=window-token"), "{run_post}");
	assert!(run_post.contains("DynamicViewGUID=guid-41"), "{run_post}");
	assert!(run_post.contains("DataExportID="), "{run_post}");
}

#[test]
fn run_refreshes_session_afterwards() {
	let portal = MockPortal::start();
	let mut client = portal.connect();

	let heartbeats_before = count_heartbeats(&portal.requests());
	client.run(41).unwrap();
	assert_eq!(count_heartbeats(&portal.requests()), heartbeats_before + 1);
}

#[test]
fn run_with_tokenless_window_errors_but_still_refreshes() {
	let portal = MockPortal::start_with_window("<div>no form here</div>");
	let mut client = portal.connect();
	let heartbeats_before = count_heartbeats(&portal.requests());

	let err = client.run(41).unwrap_err();
	assert!(matches!(err, CxError::Parse(_)), "got {err:?}");

	// The keep-alive contract holds even when the run attempt dies
	// mid-parse, and the registry entry stays unstamped.
	assert_eq!(count_heartbeats(&portal.requests()), heartbeats_before + 1);
	assert!(client.registry().find_by_id(41).unwrap().requested_run_at.is_none());
}

#[test]
fn run_of_unknown_id_fails_without_touching_the_portal() {
	let portal = MockPortal::start();
	let mut client = portal.connect();
	let requests_before = portal.requests().len();

	let err = client.run(9999).unwrap_err();
	assert!(matches!(err, CxError::UnknownExport(9999)), "got {err:?}");
	assert_eq!(portal.requests().len(), requests_before);
}

#[test]
fn download_returns_raw_bytes() {
	let portal = MockPortal::start();
	let mut client = portal.connect();

	let bytes = client.download(41).unwrap();
	assert_eq!(bytes, CSV_BODY.as_bytes());
}

#[test]
fn download_to_writes_compressed_artifact() {
	let portal = MockPortal::start();
	let mut client = portal.connect();
	let dir = tempfile::tempdir().unwrap();

	let path = client.download_to(41, dir.path()).unwrap();

	let file_name = path.file_name().unwrap().to_str().unwrap();
	let stamp = file_name
		.split_once('-')
		.map(|(stamp, _)| stamp)
		.unwrap();
	stamp.parse::<u64>().expect("epoch-seconds prefix");
	assert!(file_name.ends_with("-Incident-Log.csv.bz2"), "{file_name}");

	let file = std::fs::File::open(&path).unwrap();
	let mut decoded = String::new();
	bzip2::read::BzDecoder::new(file).read_to_string(&mut decoded).unwrap();
	assert_eq!(decoded, CSV_BODY);
}

#[test]
fn failed_download_carries_the_status() {
	let portal = MockPortal::start();
	let mut client = portal.connect();

	let err = client.download(77).unwrap_err();
	assert!(matches!(err, CxError::DownloadFailed(500)), "got {err:?}");
}

#[test]
fn materialize_decodes_text_only_table() {
	let portal = MockPortal::start();
	let mut client = portal.connect();

	let table = client.materialize(41).unwrap();
	assert_eq!(table.columns, vec!["CaseID", "Opened", "Units"]);
	assert_eq!(table.rows[1], vec!["1002", "2024-06-02", "12"]);
}

#[test]
fn refresh_catalog_replaces_registry_contents() {
	let portal = MockPortal::start();
	let mut client = portal.connect();

	client.run(41).unwrap();
	assert!(client.registry().find_by_id(41).unwrap().requested_run_at.is_some());

	// A fresh listing knows nothing of locally stamped run requests.
	client.refresh_catalog().unwrap();
	assert_eq!(client.registry().len(), 2);
	assert!(client.registry().find_by_id(41).unwrap().requested_run_at.is_none());
}

fn count_heartbeats(requests: &[String]) -> usize {
	requests.iter().filter(|r| r.starts_with("POST /Home/Touchback")).count()
}
