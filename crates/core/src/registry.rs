//! Owned, mutable collection of data-export definitions keyed by id.

use crate::catalog::DataExport;

/// In-memory store of the exports known to one client.
///
/// Lookup is a linear scan returning the first match: should the server
/// ever emit duplicate ids, the duplicates are surfaced rather than
/// deduplicated. Insertion order carries no meaning.
#[derive(Debug, Default)]
pub struct Registry {
	items: Vec<DataExport>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_exports(items: Vec<DataExport>) -> Self {
		Self { items }
	}

	/// First export with this id, if any.
	pub fn find_by_id(&self, id: i64) -> Option<&DataExport> {
		self.items.iter().find(|item| item.id == id)
	}

	/// Inserts `export`, or replaces the first stored entry sharing its id
	/// with the incoming one, so freshly stamped run timestamps survive.
	pub fn upsert(&mut self, export: DataExport) {
		match self.items.iter_mut().find(|item| item.id == export.id) {
			Some(existing) => *existing = export,
			None => self.items.push(export),
		}
	}

	/// Discards the current contents in favor of a fresh listing.
	pub fn replace_all(&mut self, items: Vec<DataExport>) {
		self.items = items;
	}

	pub fn iter(&self) -> impl Iterator<Item = &DataExport> {
		self.items.iter()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use std::time::SystemTime;

	use super::*;

	fn export(id: i64, name: &str) -> DataExport {
		DataExport {
			id,
			display_name: name.to_string(),
			run_by: None,
			view_id: None,
			view_guid: format!("guid-{id}"),
			downloadable: true,
			last_export_date: None,
			requested_run_at: None,
			slug: crate::catalog::slugify(name),
		}
	}

	#[test]
	fn round_trips_distinct_ids() {
		let mut registry = Registry::new();
		for id in 1..=20 {
			registry.upsert(export(id, &format!("View {id}")));
		}
		assert_eq!(registry.len(), 20);
		for id in 1..=20 {
			let found = registry.find_by_id(id).unwrap();
			assert_eq!(found.id, id);
			assert_eq!(found.display_name, format!("View {id}"));
		}
	}

	#[test]
	fn absent_id_returns_none() {
		let registry = Registry::from_exports(vec![export(1, "A"), export(2, "B")]);
		assert!(registry.find_by_id(99).is_none());
	}

	#[test]
	fn upsert_replaces_with_incoming_on_conflict() {
		let mut registry = Registry::from_exports(vec![export(7, "Old name")]);

		let mut incoming = export(7, "Old name");
		incoming.requested_run_at = Some(SystemTime::now());
		registry.upsert(incoming);

		assert_eq!(registry.len(), 1);
		assert!(registry.find_by_id(7).unwrap().requested_run_at.is_some());
	}

	#[test]
	fn duplicate_ids_are_surfaced_not_merged() {
		// Built directly from a listing, bypassing upsert, the way a
		// server emitting duplicates would populate the registry.
		let registry = Registry::from_exports(vec![export(3, "First"), export(3, "Second")]);
		assert_eq!(registry.len(), 2);
		assert_eq!(registry.find_by_id(3).unwrap().display_name, "First");
	}
}
