use anyhow::Result;
use cx::ExportClient;

pub fn execute(client: &mut ExportClient, id: i64, rows: usize) -> Result<()> {
	let table = client.materialize(id)?;

	println!("{}", table.columns.join("\t"));
	for row in table.rows.iter().take(rows) {
		println!("{}", row.join("\t"));
	}
	if table.row_count() > rows {
		eprintln!("... {} of {} rows shown", rows, table.row_count());
	}
	Ok(())
}
