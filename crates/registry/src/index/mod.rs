#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! Bidirectional registry index with compact palette ids.
//!
//! # Purpose
//!
//! A [`Registry`] catalogs objects under a caller-chosen identifier and a
//! registry-assigned compact id, and answers lookups in all four directions:
//! identifier→object, id→object, object→identifier and object→id.
//!
//! # Mental Model
//!
//! 1. **Tables:** [`tables::Tables`] holds four coupled hash maps plus an id
//!    counter. It knows nothing about locking or parents.
//! 2. **Handle:** [`Registry`] wraps the tables behind the tree lock and is the
//!    only public entrypoint. Handles are cheap to clone.
//! 3. **Hierarchy:** [`Registry::create_child`] returns a registry that shares
//!    the parent's [`TreeLock`](crate::lock::TreeLock) and forwards every register/unregister upward
//!    under a transformed identifier.
//! 4. **Palette:** [`Registry::palette`] exports id→identifier; feeding it back
//!    through [`Registry::assume_ids`] restores the same compact ids.
//!
//! # Id Allocation
//!
//! Auto registration probes upward from a counter and leaves the counter one
//! past the id it handed out. Freed low ids are not reused until the counter
//! is reset by [`Registry::clear`] or recomputed by [`Registry::assume_ids`].
//! Explicit-id registration never moves the counter.
//!
//! # Concurrency
//!
//! - Every public call holds the tree lock for its whole duration, reads
//!   included.
//! - The lock is re-entrant, so a child's forwarded write to its parent runs
//!   inside the same critical section as the child's own write.
//! - The per-registry tables mutex is never held across a call into another
//!   registry or into a caller closure.
//!
//! # Invariants
//!
//! - identifier→object and object→identifier are mutual inverses.
//!   - Enforced in: [`tables::Tables::insert`], [`tables::Tables::remove`].
//!   - Tested by: [`invariants::check`] in `tests::prop_ops_preserve_bijection`.
//!
//! - id→object and object→id are mutual inverses, with no shared ids.
//!   - Enforced in: [`tables::Tables::reassigned`] (displaced set).
//!   - Tested by: `tests::test_assume_ids_rehomes_displaced`.
//!
//! - The counter never hands out a live id.
//!   - Enforced in: [`tables::Tables::probe`].
//!   - Tested by: `tests::test_auto_ids_skip_explicit_ids`.
//!
//! - A child's live identifiers, transformed, resolve to the same object in
//!   the parent. Maintained on register/unregister only; direct writes to the
//!   parent are not re-validated.
//!   - Enforced in: [`Registry::register_with_id`], [`Registry::unregister`], [`Registry::clear`].
//!   - Tested by: `tests::test_child_propagates_to_parent`.
//!
//! # Object Equality
//!
//! Reverse lookups key on the object's `Eq`/`Hash`. Registering two equal
//! objects under different identifiers aliases them in the reverse tables and
//! the registry cannot tell them apart. Wrap objects in an identity-hashed
//! type when reference semantics are wanted.

mod palette;
mod registry;
pub(crate) mod tables;
mod upstream;

#[cfg(any(test, doc, feature = "registry-contracts"))]
pub(crate) mod invariants;


use std::hash::Hash;

use rustc_hash::FxHashMap;

pub use palette::Palette;
pub use registry::Registry;

/// Hash map used for the registry tables and the maps it hands out.
pub type Map<K, V> = FxHashMap<K, V>;

/// Bound shared by identifier and object types.
///
/// Equality and hashing must be stable for as long as a value is registered;
/// reverse lookups depend on them.
pub trait RegistryKey: Eq + Hash + Clone + Send + Sync + 'static {}
impl<T> RegistryKey for T where T: Eq + Hash + Clone + Send + Sync + 'static {}
