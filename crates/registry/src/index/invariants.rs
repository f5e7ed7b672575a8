//! Machine-checkable consistency checks for the registry tables.

use super::RegistryKey;
use super::tables::Tables;

/// First invariant found broken by [`check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub(crate) enum Violation {
	#[error("identifier->object and object->identifier are not mutual inverses")]
	IdentifierBijection,
	#[error("id->object and object->id are not mutual inverses")]
	IdBijection,
	#[error("identifier and id tables cover different entries")]
	Coverage,
}

/// Verifies that the four tables describe one consistent entry set.
pub(crate) fn check<I: RegistryKey, T: RegistryKey>(tables: &Tables<I, T>) -> Result<(), Violation> {
	if tables.by_identifier.len() != tables.identifier_of.len() {
		return Err(Violation::IdentifierBijection);
	}
	for (identifier, object) in &tables.by_identifier {
		if tables.identifier_of.get(object) != Some(identifier) {
			return Err(Violation::IdentifierBijection);
		}
	}

	if tables.by_id.len() != tables.id_of.len() {
		return Err(Violation::IdBijection);
	}
	for (id, object) in &tables.by_id {
		if tables.id_of.get(object) != Some(id) {
			return Err(Violation::IdBijection);
		}
	}

	if tables.by_identifier.len() != tables.by_id.len()
		|| tables
			.by_identifier
			.values()
			.any(|object| !tables.id_of.contains_key(object))
	{
		return Err(Violation::Coverage);
	}

	Ok(())
}
