mod download;
mod list;
mod preview;
mod run;

use anyhow::Result;
use cx::ExportClient;
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::config;

pub fn dispatch(cli: Cli) -> Result<()> {
	let credentials = config::credentials(&cli)?;
	let options = config::http_options(&cli);

	info!(target = "cx_cli", base_url = %credentials.base_url, "connecting to portal");
	let mut client = ExportClient::connect(credentials, options)?;

	match cli.command {
		Commands::List { json } => list::execute(&client, json),
		Commands::Run { id } => run::execute(&mut client, id),
		Commands::Download { id, output } => download::execute(&mut client, id, output.as_deref()),
		Commands::Preview { id, rows } => preview::execute(&mut client, id, rows),
	}
}
