//! Composite resource identifiers.
use crate::{ImportIdSnafu, Result};

/// Separator of composite IDs made of plain identifiers, eg `groupId:listId`.
pub const COMPOSITE_SEPARATOR: &str = ":";

/// Separator of composite IDs made of ARNs, which contain `:` themselves.
pub const ARN_PAIR_SEPARATOR: &str = ",";

/// Splits `id` into exactly `N` non-empty parts.
pub fn split<const N: usize>(id: &str, separator: &str) -> Result<[String; N]> {
    let parts: Vec<&str> = id.split(separator).collect();
    if parts.len() != N || parts.iter().any(|part| part.is_empty()) {
        let expected = (1..=N)
            .map(|i| format!("part{i}"))
            .collect::<Vec<_>>()
            .join(separator);
        return ImportIdSnafu { id, expected }.fail();
    }
    Ok(std::array::from_fn(|i| parts[i].to_owned()))
}

/// Joins parts into a composite ID.
pub fn join(parts: &[&str], separator: &str) -> String {
    parts.join(separator)
}
