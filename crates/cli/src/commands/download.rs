use std::io::Write;
use std::path::Path;

use anyhow::Result;
use cx::ExportClient;

pub fn execute(client: &mut ExportClient, id: i64, output: Option<&Path>) -> Result<()> {
	match output {
		Some(dir) => {
			let path = client.download_to(id, dir)?;
			println!("{}", path.display());
		}
		None => {
			let bytes = client.download(id)?;
			std::io::stdout().write_all(&bytes)?;
		}
	}
	Ok(())
}
