//! Public registry handle: locking, propagation and the lookup API.

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use rustc_hash::FxBuildHasher;
use tracing::{debug, trace};

use super::palette::Palette;
use super::tables::Tables;
use super::upstream::{ParentLink, Transform};
use super::{Map, RegistryKey};
use crate::error::{LookupKind, RegistryError, Result};
use crate::lock::TreeLock;

const DEFAULT_LABEL: &str = "registry";

struct Shared<I, T> {
	label: &'static str,
	lock: TreeLock,
	tables: Mutex<Tables<I, T>>,
	parent: Option<ParentLink<I, T>>,
}

/// Concurrency-safe bidirectional registry.
///
/// Assigns every registered object an identifier of type `I` and a compact
/// `u32` id, both unique within the registry. Cloning the handle shares the
/// same registry.
pub struct Registry<I, T> {
	shared: Arc<Shared<I, T>>,
}

impl<I, T> Clone for Registry<I, T> {
	fn clone(&self) -> Self {
		Self {
			shared: Arc::clone(&self.shared),
		}
	}
}

impl<I: RegistryKey, T: RegistryKey> Default for Registry<I, T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<I: RegistryKey, T: RegistryKey> Registry<I, T> {
	/// Creates an empty root registry with its own tree lock.
	pub fn new() -> Self {
		Self::labeled(DEFAULT_LABEL)
	}

	/// Creates an empty root registry whose log events carry `label`.
	pub fn labeled(label: &'static str) -> Self {
		Self::from_parts(label, TreeLock::new(), None)
	}

	fn from_parts(label: &'static str, lock: TreeLock, parent: Option<ParentLink<I, T>>) -> Self {
		Self {
			shared: Arc::new(Shared {
				label,
				lock,
				tables: Mutex::new(Tables::default()),
				parent,
			}),
		}
	}

	/// Creates a child registry that mirrors its entries into `self`.
	///
	/// The child shares this registry's tree lock. Each identifier the child
	/// registers or unregisters is passed through `transform` and forwarded
	/// here, where it receives an id from this registry's own allocator. The
	/// child may hold a narrower object type than its parent.
	pub fn create_child<L>(&self, transform: impl Fn(&I) -> I + Send + Sync + 'static) -> Registry<I, L>
	where
		L: RegistryKey + Into<T>,
	{
		self.create_child_labeled(self.shared.label, transform)
	}

	/// Like [`Registry::create_child`], with a distinct log label.
	pub fn create_child_labeled<L>(
		&self,
		label: &'static str,
		transform: impl Fn(&I) -> I + Send + Sync + 'static,
	) -> Registry<I, L>
	where
		L: RegistryKey + Into<T>,
	{
		let transform: Transform<I> = Arc::new(transform);
		let link = ParentLink::new(self.clone(), transform);
		Registry::from_parts(label, self.shared.lock.clone(), Some(link))
	}

	/// Registers `object` under `identifier` at the explicit compact `id`.
	///
	/// Fails with [`RegistryError::DuplicateId`] if `id` is held by a live
	/// entry, leaving the registry untouched. A live entry for `identifier`
	/// under another id is replaced. The counter does not move.
	pub fn register_with_id(&self, identifier: I, object: T, id: u32) -> Result<()> {
		let _tree = self.shared.lock.lock();
		let replaced = {
			let mut tables = self.shared.tables.lock();
			if tables.by_id.contains_key(&id) {
				return Err(RegistryError::DuplicateId { id });
			}
			let replaced = tables.remove(&identifier);
			tables.insert(identifier.clone(), object.clone(), id);
			self.enforce_contracts(&tables);
			replaced
		};
		self.finish_register(identifier, object, id, replaced)
	}

	/// Registers `object` under `identifier` with an auto-allocated id.
	///
	/// A live entry for `identifier` is unregistered first. The id is the first
	/// free slot scanning upward from the counter, not the smallest free id.
	/// Returns the allocated id.
	///
	/// If the parent rejects the forwarded entry the local entry is removed
	/// and the error returned. The counter stays past the rolled-back id.
	pub fn register(&self, identifier: I, object: T) -> Result<u32> {
		let _tree = self.shared.lock.lock();
		let (id, replaced) = {
			let mut tables = self.shared.tables.lock();
			let freed = tables.id_by_identifier(&identifier);
			let (id, counter) = tables.probe(freed)?;
			let replaced = tables.remove(&identifier);
			tables.counter = counter;
			tables.insert(identifier.clone(), object.clone(), id);
			self.enforce_contracts(&tables);
			(id, replaced)
		};
		self.finish_register(identifier, object, id, replaced)?;
		Ok(id)
	}

	/// Logs the insertion and forwards it to the parent.
	///
	/// If the parent rejects the forwarded entry the local one is removed again,
	/// so the parent never misses a live child entry.
	fn finish_register(&self, identifier: I, object: T, id: u32, replaced: Option<T>) -> Result<()> {
		let label = self.shared.label;
		if replaced.is_some() {
			debug!(registry = label, id, "identifier re-registered; previous entry evicted");
		} else {
			trace!(registry = label, id, "registered");
		}

		let Some(parent) = &self.shared.parent else {
			return Ok(());
		};
		if replaced.is_some() {
			parent.unregister(&identifier);
		}
		if let Err(err) = parent.register(&identifier, object) {
			self.shared.tables.lock().remove(&identifier);
			return Err(err);
		}
		Ok(())
	}

	/// Returns the object registered under `identifier`.
	pub fn get(&self, identifier: &I) -> Option<T> {
		let _tree = self.shared.lock.lock();
		self.shared.tables.lock().by_identifier.get(identifier).cloned()
	}

	/// Returns the object holding compact `id`.
	pub fn get_by_id(&self, id: u32) -> Option<T> {
		let _tree = self.shared.lock.lock();
		self.shared.tables.lock().by_id.get(&id).cloned()
	}

	/// Returns true if `identifier` has a live entry.
	pub fn contains(&self, identifier: &I) -> bool {
		let _tree = self.shared.lock.lock();
		self.shared.tables.lock().by_identifier.contains_key(identifier)
	}

	/// Returns the identifier `object` is registered under.
	pub fn identifier_of(&self, object: &T) -> Option<I> {
		let _tree = self.shared.lock.lock();
		self.shared.tables.lock().identifier_of.get(object).cloned()
	}

	/// Returns the compact id of `object`.
	///
	/// Fails with [`RegistryError::NotFound`] if `object` is not registered.
	pub fn id_of(&self, object: &T) -> Result<u32> {
		let _tree = self.shared.lock.lock();
		self.shared
			.tables
			.lock()
			.id_of
			.get(object)
			.copied()
			.ok_or(RegistryError::NotFound(LookupKind::Object))
	}

	/// Returns the compact id of the object registered under `identifier`.
	///
	/// Fails with [`RegistryError::NotFound`] if `identifier` is not registered.
	pub fn id_by_identifier(&self, identifier: &I) -> Result<u32> {
		let _tree = self.shared.lock.lock();
		self.shared
			.tables
			.lock()
			.id_by_identifier(identifier)
			.ok_or(RegistryError::NotFound(LookupKind::Identifier))
	}

	/// Removes the entry for `identifier` and returns its object.
	///
	/// The transformed identifier is unregistered from the parent even when
	/// there was no local entry.
	pub fn unregister(&self, identifier: &I) -> Option<T> {
		let _tree = self.shared.lock.lock();
		let (removed, id) = {
			let mut tables = self.shared.tables.lock();
			let id = tables.id_by_identifier(identifier);
			let removed = tables.remove(identifier);
			self.enforce_contracts(&tables);
			(removed, id)
		};
		if let Some(id) = id {
			trace!(registry = self.shared.label, id, "unregistered");
		}
		if let Some(parent) = &self.shared.parent {
			parent.unregister(identifier);
		}
		removed
	}

	/// Removes every entry and resets the id counter to zero.
	///
	/// Each removed identifier is unregistered from the parent.
	pub fn clear(&self) {
		let _tree = self.shared.lock.lock();
		let removed = self.shared.tables.lock().clear();
		debug!(registry = self.shared.label, removed = removed.len(), "cleared");
		if let Some(parent) = &self.shared.parent {
			for identifier in &removed {
				parent.unregister(identifier);
			}
		}
	}

	/// Re-derives compact ids from an identifier→id assignment.
	///
	/// Pairs are applied in iteration order; a repeated identifier keeps its
	/// first position and its last id. Identifiers without a live entry are
	/// skipped. Objects pushed out of their slot and not reassigned themselves
	/// receive a fresh id by forward probing from one past the highest id in
	/// use, so every object stays reachable by id. Identifier mappings and the
	/// parent are not touched. On error nothing changes.
	pub fn assume_ids(&self, assignments: impl IntoIterator<Item = (I, u32)>) -> Result<()> {
		let assignments: IndexMap<I, u32, FxBuildHasher> = assignments.into_iter().collect();
		let _tree = self.shared.lock.lock();
		let mut tables = self.shared.tables.lock();
		let (next, report) = tables.reassigned(assignments)?;
		*tables = next;
		self.enforce_contracts(&tables);
		debug!(
			registry = self.shared.label,
			requested = report.requested,
			reassigned = report.reassigned,
			displaced = report.displaced,
			"assumed ids"
		);
		Ok(())
	}

	/// Snapshot of every live object.
	pub fn values(&self) -> Vec<T> {
		let _tree = self.shared.lock.lock();
		self.shared.tables.lock().by_id.values().cloned().collect()
	}

	/// Copy of the identifier→object table.
	pub fn as_map(&self) -> Map<I, T> {
		let _tree = self.shared.lock.lock();
		self.shared.tables.lock().by_identifier.clone()
	}

	/// Current id→identifier assignment.
	///
	/// Restore it later with `assume_ids(palette.into_assignments())`.
	pub fn palette(&self) -> Palette<I> {
		let _tree = self.shared.lock.lock();
		Palette::from(self.shared.tables.lock().palette())
	}

	/// Number of live entries.
	pub fn len(&self) -> usize {
		let _tree = self.shared.lock.lock();
		self.shared.tables.lock().len()
	}

	/// Returns true if the registry has no live entries.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Calls `f` for each live entry of a snapshot taken under the lock.
	pub fn for_each(&self, mut f: impl FnMut(&I, &T)) {
		for (identifier, object) in self.entries() {
			f(&identifier, &object);
		}
	}

	/// Builds a map with one key per live entry.
	///
	/// Later entries overwrite earlier ones on key collisions; entry order is
	/// unspecified.
	pub fn create_map<K, V>(
		&self,
		mut key: impl FnMut(&I, &T) -> K,
		mut value: impl FnMut(&I, &T) -> V,
	) -> Map<K, V>
	where
		K: Eq + Hash,
	{
		self.entries()
			.iter()
			.map(|(identifier, object)| (key(identifier, object), value(identifier, object)))
			.collect()
	}

	/// Builds a map with any number of keys per live entry. `value` is called
	/// once per key.
	pub fn create_multi_key_map<K, V, Ks>(
		&self,
		mut keys: impl FnMut(&I, &T) -> Ks,
		mut value: impl FnMut(&I, &T) -> V,
	) -> Map<K, V>
	where
		K: Eq + Hash,
		Ks: IntoIterator<Item = K>,
	{
		let mut map = Map::default();
		for (identifier, object) in self.entries() {
			for k in keys(&identifier, &object) {
				map.insert(k, value(&identifier, &object));
			}
		}
		map
	}

	fn entries(&self) -> Vec<(I, T)> {
		let _tree = self.shared.lock.lock();
		self.shared.tables.lock().entries()
	}

	/// Handle to the lock shared by this registry's whole tree.
	pub fn lock(&self) -> &TreeLock {
		&self.shared.lock
	}

	/// Returns true if this registry forwards to a parent.
	pub fn is_child(&self) -> bool {
		self.shared.parent.is_some()
	}

	/// Label attached to this registry's log events.
	pub fn label(&self) -> &'static str {
		self.shared.label
	}

	#[cfg(test)]
	pub(crate) fn with_tables<R>(&self, f: impl FnOnce(&Tables<I, T>) -> R) -> R {
		let _tree = self.shared.lock.lock();
		f(&self.shared.tables.lock())
	}

	#[inline]
	fn enforce_contracts(&self, _tables: &Tables<I, T>) {
		#[cfg(feature = "registry-contracts")]
		if let Err(violation) = super::invariants::check(_tables) {
			panic!("registry `{}` violated: {violation}", self.shared.label);
		}
	}
}

impl<I: RegistryKey, T: RegistryKey> fmt::Debug for Registry<I, T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Registry")
			.field("label", &self.shared.label)
			.field("len", &self.len())
			.field("child", &self.is_child())
			.finish()
	}
}
