use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};

/// Compact id→identifier table of a registry, ordered by id.
///
/// Serializes as a plain map so it can be stored with any serde format and
/// replayed later through [`Registry::assume_ids`](super::Registry::assume_ids).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette<I> {
	slots: BTreeMap<u32, I>,
}

impl<I> Default for Palette<I> {
	fn default() -> Self {
		Self {
			slots: BTreeMap::new(),
		}
	}
}

impl<I> Palette<I> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns the identifier stored at `id`.
	pub fn get(&self, id: u32) -> Option<&I> {
		self.slots.get(&id)
	}

	/// Stores `identifier` at `id`, returning the identifier it replaced.
	pub fn insert(&mut self, id: u32, identifier: I) -> Option<I> {
		self.slots.insert(id, identifier)
	}

	pub fn len(&self) -> usize {
		self.slots.len()
	}

	pub fn is_empty(&self) -> bool {
		self.slots.is_empty()
	}

	/// Iterates `(id, identifier)` in ascending id order.
	pub fn iter(&self) -> impl Iterator<Item = (u32, &I)> + '_ {
		self.slots.iter().map(|(id, identifier)| (*id, identifier))
	}

	/// Identifier→id pairs suitable for `assume_ids`.
	pub fn assignments(&self) -> impl Iterator<Item = (I, u32)> + '_
	where
		I: Clone,
	{
		self.slots.iter().map(|(id, identifier)| (identifier.clone(), *id))
	}

	/// Consumes the palette into identifier→id pairs.
	pub fn into_assignments(self) -> impl Iterator<Item = (I, u32)> {
		self.slots.into_iter().map(|(id, identifier)| (identifier, id))
	}
}

impl<I> From<BTreeMap<u32, I>> for Palette<I> {
	fn from(slots: BTreeMap<u32, I>) -> Self {
		Self { slots }
	}
}

impl<I> FromIterator<(u32, I)> for Palette<I> {
	fn from_iter<It: IntoIterator<Item = (u32, I)>>(iter: It) -> Self {
		Self {
			slots: iter.into_iter().collect(),
		}
	}
}

impl<I> IntoIterator for Palette<I> {
	type Item = (u32, I);
	type IntoIter = btree_map::IntoIter<u32, I>;

	fn into_iter(self) -> Self::IntoIter {
		self.slots.into_iter()
	}
}
