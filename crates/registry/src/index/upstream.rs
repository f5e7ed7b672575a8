//! Type-erased link from a child registry to its parent.

use std::sync::Arc;

use super::{Registry, RegistryKey};
use crate::error::Result;

/// Write surface a child needs from its parent.
///
/// Implemented for every `Registry<I, P>` whose object type accepts the
/// child's objects, which lets a child hold a parent of a wider type.
pub(super) trait Upstream<I, T>: Send + Sync {
	fn register(&self, identifier: I, object: T) -> Result<u32>;
	fn unregister(&self, identifier: &I);
}

impl<I, P, T> Upstream<I, T> for Registry<I, P>
where
	I: RegistryKey,
	P: RegistryKey,
	T: Into<P>,
{
	fn register(&self, identifier: I, object: T) -> Result<u32> {
		Registry::register(self, identifier, object.into())
	}

	fn unregister(&self, identifier: &I) {
		Registry::unregister(self, identifier);
	}
}

pub(super) type Transform<I> = Arc<dyn Fn(&I) -> I + Send + Sync>;

/// Parent registry plus the identifier transformation applied on the way up.
pub(super) struct ParentLink<I, T> {
	parent: Arc<dyn Upstream<I, T>>,
	transform: Transform<I>,
}

impl<I: RegistryKey, T: RegistryKey> ParentLink<I, T> {
	pub(super) fn new<P>(parent: Registry<I, P>, transform: Transform<I>) -> Self
	where
		P: RegistryKey,
		T: Into<P>,
	{
		Self {
			parent: Arc::new(parent),
			transform,
		}
	}

	/// Registers the transformed identifier in the parent with an auto id.
	pub(super) fn register(&self, identifier: &I, object: T) -> Result<u32> {
		self.parent.register((self.transform)(identifier), object)
	}

	pub(super) fn unregister(&self, identifier: &I) {
		self.parent.unregister(&(self.transform)(identifier));
	}
}
