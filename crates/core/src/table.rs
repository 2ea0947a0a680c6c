//! Text-only tabular decoding of downloaded exports.
//!
//! Convenience adapter for callers that want rows instead of raw bytes.
//! Every cell stays text; no type inference, no knowledge of any export's
//! schema.

use crate::error::Result;

/// A decoded export: header row as column names, data rows as strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
	pub columns: Vec<String>,
	pub rows: Vec<Vec<String>>,
}

impl Table {
	pub fn row_count(&self) -> usize {
		self.rows.len()
	}
}

/// Decodes CSV bytes into a [`Table`].
pub fn decode_csv(bytes: &[u8]) -> Result<Table> {
	let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

	let columns = reader.headers()?.iter().map(str::to_string).collect();

	let mut rows = Vec::new();
	for record in reader.records() {
		let record = record?;
		rows.push(record.iter().map(str::to_string).collect());
	}

	Ok(Table { columns, rows })
}
