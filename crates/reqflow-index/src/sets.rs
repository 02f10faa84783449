//! Set algebra over identifier sets
//!
//! Multi-condition queries combine per-field results: AND via [`intersect`],
//! OR via [`union`], exclusion via [`difference`].

use reqflow_model::ItemId;
use std::collections::BTreeSet;

/// Ordered set of item identifiers
pub type IdSet = BTreeSet<ItemId>;

/// Identifiers present in every set
///
/// An empty slice yields an empty set.
#[must_use]
pub fn intersect(sets: &[IdSet]) -> IdSet {
    let Some(smallest) = sets.iter().min_by_key(|s| s.len()) else {
        return IdSet::new();
    };

    smallest
        .iter()
        .filter(|id| sets.iter().all(|s| s.contains(*id)))
        .cloned()
        .collect()
}

/// Identifiers present in any set
#[must_use]
pub fn union(sets: &[IdSet]) -> IdSet {
    sets.iter().flat_map(|s| s.iter().cloned()).collect()
}

/// Identifiers in `a` but not in `b`
#[must_use]
pub fn difference(a: &IdSet, b: &IdSet) -> IdSet {
    a.difference(b).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> IdSet {
        ids.iter().map(|s| ItemId::new(*s)).collect()
    }

    #[test]
    fn intersect_of_nothing_is_empty() {
        assert!(intersect(&[]).is_empty());
    }

    #[test]
    fn intersect_keeps_common_ids() {
        let result = intersect(&[set(&["1", "2", "3"]), set(&["2", "3", "4"]), set(&["3", "2"])]);
        assert_eq!(result, set(&["2", "3"]));
    }

    #[test]
    fn union_and_difference() {
        let a = set(&["1", "2"]);
        let b = set(&["2", "3"]);
        assert_eq!(union(&[a.clone(), b.clone()]), set(&["1", "2", "3"]));
        assert_eq!(difference(&a, &b), set(&["1"]));
        assert_eq!(difference(&b, &a), set(&["3"]));
    }
}
