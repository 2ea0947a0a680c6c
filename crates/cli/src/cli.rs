use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cx")]
#[command(about = "Connect Exchange data exports from the command line")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Portal base URL (defaults to CX_BASE_URL)
	#[arg(long, global = true, value_name = "URL")]
	pub base_url: Option<String>,

	/// Portal username (defaults to CX_USERNAME)
	#[arg(long, global = true, value_name = "USER")]
	pub username: Option<String>,

	/// Portal password (defaults to CX_PASSWORD)
	#[arg(long, global = true, value_name = "PASS")]
	pub password: Option<String>,

	/// Per-request timeout in seconds
	#[arg(long, global = true, default_value = "30")]
	pub timeout_secs: u64,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// List the data exports available to the authenticated user
	#[command(alias = "ls")]
	List {
		/// Emit the listing as JSON
		#[arg(long)]
		json: bool,
	},

	/// Request server-side regeneration of an export
	Run { id: i64 },

	/// Download an export (raw bytes to stdout, or compressed into a directory)
	#[command(alias = "dl")]
	Download {
		id: i64,
		/// Directory to persist `<epoch>-<slug>.csv.bz2` into
		#[arg(short, long, value_name = "DIR")]
		output: Option<PathBuf>,
	},

	/// Download an export and print the first rows as text
	Preview {
		id: i64,
		/// Number of rows to show
		#[arg(long, default_value = "10")]
		rows: usize,
	},
}
