use anyhow::{Result, bail};
use cx::ExportClient;
use tracing::info;

pub fn execute(client: &mut ExportClient, id: i64) -> Result<()> {
	if client.run(id)? {
		info!(target = "cx_cli", id, "regeneration requested");
		println!("run requested for export {id}; the portal regenerates in the background");
		Ok(())
	} else {
		bail!("portal did not accept the run request for export {id}");
	}
}
