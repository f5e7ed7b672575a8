//! The four coupled lookup tables behind a registry.
//!
//! Everything here is lock-free and takes `&mut self`; the owning
//! [`Registry`](super::Registry) is responsible for holding the tree lock and
//! for forwarding changes to a parent.

use std::collections::BTreeMap;

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;

use super::{Map, RegistryKey};
use crate::error::{RegistryError, Result};

/// Counts produced by a bulk id reassignment, used for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AssumeReport {
	/// Distinct identifiers in the requested mapping.
	pub requested: usize,
	/// Live objects that received an explicitly requested id.
	pub reassigned: usize,
	/// Objects bumped out of their slot and re-homed by forward probing.
	pub displaced: usize,
}

#[derive(Clone)]
pub(crate) struct Tables<I, T> {
	pub(super) by_identifier: Map<I, T>,
	pub(super) by_id: Map<u32, T>,
	pub(super) id_of: Map<T, u32>,
	pub(super) identifier_of: Map<T, I>,
	/// Next id to probe for auto allocation.
	pub(super) counter: u32,
}

impl<I, T> Default for Tables<I, T> {
	fn default() -> Self {
		Self {
			by_identifier: Map::default(),
			by_id: Map::default(),
			id_of: Map::default(),
			identifier_of: Map::default(),
			counter: 0,
		}
	}
}

impl<I: RegistryKey, T: RegistryKey> Tables<I, T> {
	pub(super) fn len(&self) -> usize {
		self.by_identifier.len()
	}

	pub(super) fn id_by_identifier(&self, identifier: &I) -> Option<u32> {
		let object = self.by_identifier.get(identifier)?;
		self.id_of.get(object).copied()
	}

	/// Finds the first free id at or above the counter without mutating.
	///
	/// `freed` is treated as free even if currently occupied; it is the slot of
	/// an entry about to be replaced. Returns `(id, next_counter)`. The counter
	/// cannot move past `u32::MAX`, so that id is only reachable explicitly.
	pub(super) fn probe(&self, freed: Option<u32>) -> Result<(u32, u32)> {
		let mut id = self.counter;
		loop {
			let next = id.checked_add(1).ok_or(RegistryError::IdSpaceExhausted)?;
			if freed == Some(id) || !self.by_id.contains_key(&id) {
				return Ok((id, next));
			}
			id = next;
		}
	}

	/// Inserts a fresh entry. Callers guarantee `identifier` and `id` are free.
	pub(super) fn insert(&mut self, identifier: I, object: T, id: u32) {
		debug_assert!(!self.by_identifier.contains_key(&identifier));
		debug_assert!(!self.by_id.contains_key(&id));

		self.by_identifier.insert(identifier.clone(), object.clone());
		self.by_id.insert(id, object.clone());
		self.id_of.insert(object.clone(), id);
		self.identifier_of.insert(object, identifier);
	}

	/// Removes the entry for `identifier`, freeing its id.
	pub(super) fn remove(&mut self, identifier: &I) -> Option<T> {
		let object = self.by_identifier.remove(identifier)?;
		if let Some(id) = self.id_of.remove(&object) {
			self.by_id.remove(&id);
		}
		self.identifier_of.remove(&object);
		Some(object)
	}

	/// Empties every table, resets the counter and returns the identifiers
	/// that were live.
	pub(super) fn clear(&mut self) -> Vec<I> {
		self.counter = 0;
		self.by_id.clear();
		self.id_of.clear();
		self.identifier_of.clear();
		self.by_identifier.drain().map(|(identifier, _)| identifier).collect()
	}

	/// Snapshot of every live `(identifier, object)` pair.
	pub(super) fn entries(&self) -> Vec<(I, T)> {
		self.by_identifier
			.iter()
			.map(|(identifier, object)| (identifier.clone(), object.clone()))
			.collect()
	}

	pub(super) fn palette(&self) -> BTreeMap<u32, I> {
		self.by_id
			.iter()
			.filter_map(|(id, object)| Some((*id, self.identifier_of.get(object)?.clone())))
			.collect()
	}

	/// Computes the tables that result from adopting `assignments`.
	///
	/// `self` is left untouched and doubles as the pre-batch snapshot of
	/// object→id; the caller commits the returned tables only on success.
	///
	/// Each requested pair moves its object into the new slot. A different
	/// object already sitting in that slot is displaced; if no later pair gives
	/// it a home it is re-inserted by forward probing from one past the highest
	/// id in use once the batch is done. Identifier mappings never change.
	pub(super) fn reassigned(
		&self,
		assignments: IndexMap<I, u32, FxBuildHasher>,
	) -> Result<(Self, AssumeReport)> {
		let mut next = self.clone();
		let mut displaced: IndexSet<T, FxBuildHasher> = IndexSet::default();
		let mut report = AssumeReport {
			requested: assignments.len(),
			..AssumeReport::default()
		};

		for (identifier, new_id) in assignments {
			let Some(object) = next.by_identifier.get(&identifier).cloned() else {
				continue;
			};

			// Vacate the old slot only if no earlier pair has claimed it.
			if let Some(old_id) = self.id_of.get(&object)
				&& next.by_id.get(old_id) == Some(&object)
			{
				next.by_id.remove(old_id);
			}

			next.id_of.insert(object.clone(), new_id);
			if let Some(previous) = next.by_id.insert(new_id, object.clone())
				&& previous != object
			{
				displaced.insert(previous);
			}
			displaced.shift_remove(&object);
			report.reassigned += 1;
		}

		next.counter = next.by_id.keys().max().map_or(0, |max| max.saturating_add(1));

		report.displaced = displaced.len();
		for object in displaced {
			let (id, counter) = next.probe(None)?;
			next.counter = counter;
			next.by_id.insert(id, object.clone());
			next.id_of.insert(object, id);
		}

		Ok((next, report))
	}
}
