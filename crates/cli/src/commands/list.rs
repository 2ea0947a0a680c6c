use anyhow::Result;
use cx::ExportClient;
use serde_json::json;

pub fn execute(client: &ExportClient, as_json: bool) -> Result<()> {
	if as_json {
		let entries: Vec<_> = client
			.registry()
			.iter()
			.map(|export| {
				json!({
					"id": export.id,
					"name": export.display_name,
					"slug": export.slug,
					"runBy": export.run_by,
					"downloadable": export.downloadable,
					"lastExportDate": export.last_export_date,
				})
			})
			.collect();
		println!("{}", serde_json::to_string_pretty(&entries)?);
		return Ok(());
	}

	for export in client.registry().iter() {
		let marker = if export.downloadable { ' ' } else { '!' };
		println!(
			"{:>6}{} {}  (last export: {})",
			export.id,
			marker,
			export.display_name,
			export.last_export_date.as_deref().unwrap_or("never"),
		);
	}
	Ok(())
}
