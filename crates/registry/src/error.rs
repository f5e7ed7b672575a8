use std::fmt;

/// Which side of a reverse lookup had no live entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LookupKind {
	/// Lookup keyed by identifier.
	Identifier,
	/// Lookup keyed by object.
	Object,
}

impl fmt::Display for LookupKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LookupKind::Identifier => f.write_str("identifier"),
			LookupKind::Object => f.write_str("object"),
		}
	}
}

/// Registry operation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	/// Explicit registration targeted a compact id held by a live entry.
	#[error("compact id {id} is already taken")]
	DuplicateId { id: u32 },

	/// Strict reverse lookup found no live entry.
	#[error("no live entry for the given {0}")]
	NotFound(LookupKind),

	/// Forward probing ran off the end of the compact id space.
	#[error("compact id space exhausted")]
	IdSpaceExhausted,
}

pub type Result<T, E = RegistryError> = std::result::Result<T, E>;
