//! Layered bidirectional registries.
//!
//! A [`Registry`] maps each registered object to a caller-supplied identifier
//! and to a compact `u32` id (a palette slot), with lookups in every
//! direction. Child registries mirror their entries into a parent under a
//! transformed identifier, which builds layered namespaces such as a
//! per-plugin registry whose entries also appear, prefixed, in a global one.
//!
//! ```
//! use strata_registry::Registry;
//!
//! let global: Registry<String, u64> = Registry::labeled("global");
//! let plugin = global.create_child::<u64>(|name: &String| format!("plugin:{name}"));
//!
//! let id = plugin.register("stone".to_string(), 7).unwrap();
//! assert_eq!(plugin.get_by_id(id), Some(7));
//! assert_eq!(global.get(&"plugin:stone".to_string()), Some(7));
//! ```
//!
//! See [`index`] for the allocation policy, locking model and invariants.

pub mod error;
pub mod index;
pub mod lock;

pub use error::{LookupKind, RegistryError, Result};
pub use index::{Map, Palette, Registry, RegistryKey};
pub use lock::{TreeGuard, TreeLock};
