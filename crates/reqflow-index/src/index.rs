//! Multi-field inverted index with radix tree value keys
//!
//! Provides [`MultiFieldIndex`] for O(1)-style exact lookups and
//! subtree-walk prefix lookups over lower-cased field values.

use crate::error::IndexError;
use crate::filter::FilterExpr;
use crate::sets::{difference, intersect, union, IdSet};
use radix_trie::{Trie, TrieCommon};
use reqflow_model::{Indexable, ItemId};
use std::collections::HashMap;

/// Inverted index over a collection snapshot
///
/// One radix trie per indexed field maps lower-cased value -> ids. We use
/// radix_trie so that:
/// - Exact lookups walk a single key
/// - Prefix lookups visit only the matching subtree
/// - Substring lookups scan distinct values, never the raw items
///
/// The index is owned by whichever view built it. It is never maintained
/// incrementally: [`MultiFieldIndex::build`] replaces everything.
#[derive(Debug)]
pub struct MultiFieldIndex<T> {
    /// Field name -> value trie
    fields: HashMap<String, FieldIndex>,

    /// Retained records, for resolving ids back to items
    items: HashMap<ItemId, T>,

    /// Every id in the snapshot
    all_ids: IdSet,
}

/// Value trie for one field
#[derive(Debug)]
struct FieldIndex {
    values: Trie<String, IdSet>,
}

impl Default for FieldIndex {
    fn default() -> Self {
        Self { values: Trie::new() }
    }
}

impl FieldIndex {
    fn insert(&mut self, value: String, id: &ItemId) {
        if let Some(ids) = self.values.get_mut(&value) {
            ids.insert(id.clone());
            return;
        }
        let mut ids = IdSet::new();
        ids.insert(id.clone());
        self.values.insert(value, ids);
    }

    fn exact(&self, value: &String) -> IdSet {
        self.values.get(value).cloned().unwrap_or_default()
    }

    fn prefix(&self, prefix: &String) -> IdSet {
        if prefix.is_empty() {
            return self.all();
        }
        let Some(subtrie) = self.values.get_raw_descendant(prefix) else {
            return IdSet::new();
        };
        subtrie
            .iter()
            .filter(|(value, _)| value.starts_with(prefix.as_str()))
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect()
    }

    fn contains(&self, needle: &str) -> IdSet {
        self.values
            .iter()
            .filter(|(value, _)| value.contains(needle))
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect()
    }

    fn all(&self) -> IdSet {
        self.values.values().flat_map(|ids| ids.iter().cloned()).collect()
    }

    fn distinct_values(&self) -> usize {
        self.values.len()
    }
}

/// Size figures for an index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    /// Items in the snapshot
    pub item_count: usize,
    /// Distinct values per indexed field
    pub distinct_values: HashMap<String, usize>,
}

impl<T: Indexable> MultiFieldIndex<T> {
    /// Create empty index
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
            items: HashMap::new(),
            all_ids: IdSet::new(),
        }
    }

    /// Create and build in one step
    ///
    /// # Errors
    /// See [`MultiFieldIndex::build`]
    pub fn from_items<I, S>(items: I, fields: &[S]) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = T>,
        S: AsRef<str>,
    {
        let mut index = Self::new();
        index.build(items, fields)?;
        Ok(index)
    }

    /// Replace the whole index with a fresh scan of `items`
    ///
    /// Values are lower-cased; empty values are not indexed. Runs in
    /// O(n * f) for n items and f fields.
    ///
    /// # Errors
    /// Returns [`IndexError::DuplicateId`] if two items share an id. The
    /// previous index is left untouched in that case.
    pub fn build<I, S>(&mut self, items: I, fields: &[S]) -> Result<(), IndexError>
    where
        I: IntoIterator<Item = T>,
        S: AsRef<str>,
    {
        let mut field_indexes: HashMap<String, FieldIndex> = fields
            .iter()
            .map(|f| (f.as_ref().to_string(), FieldIndex::default()))
            .collect();
        let mut retained = HashMap::new();
        let mut all_ids = IdSet::new();

        for item in items {
            let id = item.id().clone();
            if !all_ids.insert(id.clone()) {
                return Err(IndexError::DuplicateId(id));
            }

            for (field, field_index) in &mut field_indexes {
                for value in item.field_values(field) {
                    if value.is_empty() {
                        continue;
                    }
                    field_index.insert(value.to_lowercase(), &id);
                }
            }

            retained.insert(id, item);
        }

        tracing::debug!(
            items = retained.len(),
            fields = field_indexes.len(),
            "Rebuilt multi-field index"
        );

        self.fields = field_indexes;
        self.items = retained;
        self.all_ids = all_ids;
        Ok(())
    }

    /// Ids whose `field` equals `value`, case-insensitively
    ///
    /// An unindexed field yields an empty set.
    #[must_use]
    pub fn query(&self, field: &str, value: &str) -> IdSet {
        self.field(field)
            .map(|f| f.exact(&value.to_lowercase()))
            .unwrap_or_default()
    }

    /// Ids whose `field` starts with `prefix`, case-insensitively
    #[must_use]
    pub fn query_prefix(&self, field: &str, prefix: &str) -> IdSet {
        self.field(field)
            .map(|f| f.prefix(&prefix.to_lowercase()))
            .unwrap_or_default()
    }

    /// Ids whose `field` contains `substring`, case-insensitively
    ///
    /// Linear in the number of distinct values of `field`.
    #[must_use]
    pub fn query_contains(&self, field: &str, substring: &str) -> IdSet {
        self.field(field)
            .map(|f| f.contains(&substring.to_lowercase()))
            .unwrap_or_default()
    }

    /// Evaluate a predicate tree
    #[must_use]
    pub fn evaluate(&self, expr: &FilterExpr) -> IdSet {
        match expr {
            FilterExpr::Eq { field, value } => self.query(field, value),
            FilterExpr::Prefix { field, value } => self.query_prefix(field, value),
            FilterExpr::Contains { field, value } => self.query_contains(field, value),
            FilterExpr::And(exprs) => {
                if exprs.is_empty() {
                    return self.all_ids.clone();
                }
                let sets: Vec<IdSet> = exprs.iter().map(|e| self.evaluate(e)).collect();
                intersect(&sets)
            }
            FilterExpr::Or(exprs) => {
                let sets: Vec<IdSet> = exprs.iter().map(|e| self.evaluate(e)).collect();
                union(&sets)
            }
            FilterExpr::Not(inner) => difference(&self.all_ids, &self.evaluate(inner)),
        }
    }

    /// Resolve ids back to records, in id order
    ///
    /// Ids not in the snapshot are skipped.
    #[must_use]
    pub fn get_items(&self, ids: &IdSet) -> Vec<&T> {
        ids.iter().filter_map(|id| self.items.get(id)).collect()
    }

    /// Record by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &ItemId) -> Option<&T> {
        self.items.get(id)
    }

    /// Every id in the snapshot
    #[inline]
    #[must_use]
    pub fn all_ids(&self) -> &IdSet {
        &self.all_ids
    }

    /// Whether `field` was indexed by the last build
    #[inline]
    #[must_use]
    pub fn is_indexed(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Indexed field names, sorted
    #[must_use]
    pub fn indexed_fields(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Item count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if index holds no items
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Size figures
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            item_count: self.items.len(),
            distinct_values: self
                .fields
                .iter()
                .map(|(name, f)| (name.clone(), f.distinct_values()))
                .collect(),
        }
    }

    /// Consume the index, returning the retained records
    #[must_use]
    pub fn into_items(self) -> Vec<T> {
        self.items.into_values().collect()
    }

    fn field(&self, field: &str) -> Option<&FieldIndex> {
        let found = self.fields.get(field);
        if found.is_none() {
            tracing::debug!(field, "Query on unindexed field");
        }
        found
    }
}

impl<T: Indexable> Default for MultiFieldIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use reqflow_model::Requirement;

    fn ids(list: &[&str]) -> IdSet {
        list.iter().map(|s| ItemId::new(*s)).collect()
    }

    fn hello_index() -> MultiFieldIndex<Requirement> {
        MultiFieldIndex::from_items(
            vec![
                Requirement::new("1", "Hello World"),
                Requirement::new("2", "Hello There"),
            ],
            &["title"],
        )
        .unwrap()
    }

    #[test]
    fn index_contains_prefix_and_exact() {
        let index = hello_index();

        assert_eq!(index.query_contains("title", "hello"), ids(&["1", "2"]));
        assert_eq!(index.query_prefix("title", "Hello W"), ids(&["1"]));
        assert_eq!(index.query("title", "hello world"), ids(&["1"]));
    }

    #[test]
    fn index_unindexed_field_is_empty() {
        let index = hello_index();
        assert!(index.query("description", "anything").is_empty());
        assert!(index.query_prefix("titel", "h").is_empty());
        assert!(!index.is_indexed("description"));
    }

    #[test]
    fn index_prefix_inside_compressed_node() {
        let index = MultiFieldIndex::from_items(
            vec![
                Requirement::new("1", "authentication"),
                Requirement::new("2", "authorization"),
                Requirement::new("3", "audit"),
            ],
            &["title"],
        )
        .unwrap();

        assert_eq!(index.query_prefix("title", "auth"), ids(&["1", "2"]));
        assert_eq!(index.query_prefix("title", "authe"), ids(&["1"]));
        assert_eq!(index.query_prefix("title", "au"), ids(&["1", "2", "3"]));
        assert_eq!(index.query_prefix("title", ""), ids(&["1", "2", "3"]));
        assert!(index.query_prefix("title", "authx").is_empty());
    }

    #[test]
    fn index_multi_valued_field() {
        let index = MultiFieldIndex::from_items(
            vec![
                Requirement::new("1", "a").with_tags(["UI", "export"]),
                Requirement::new("2", "b").with_tags(["export"]),
            ],
            &["tags"],
        )
        .unwrap();

        assert_eq!(index.query("tags", "EXPORT"), ids(&["1", "2"]));
        assert_eq!(index.query("tags", "ui"), ids(&["1"]));
        assert_eq!(index.stats().distinct_values.get("tags"), Some(&2));
    }

    #[test]
    fn index_rebuild_replaces_everything() {
        let mut index = hello_index();
        index
            .build(vec![Requirement::new("9", "Fresh")], &["title"])
            .unwrap();

        assert!(index.query_contains("title", "hello").is_empty());
        assert_eq!(index.query("title", "fresh"), ids(&["9"]));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn index_duplicate_id_keeps_previous_index() {
        let mut index = hello_index();
        let result = index.build(
            vec![Requirement::new("x", "a"), Requirement::new("x", "b")],
            &["title"],
        );

        assert_eq!(result, Err(IndexError::DuplicateId(ItemId::new("x"))));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn index_get_items_resolves_records() {
        let index = hello_index();
        let items = index.get_items(&ids(&["2", "missing"]));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Hello There");
    }

    #[test]
    fn index_empty_values_not_indexed() {
        let index = MultiFieldIndex::from_items(
            vec![Requirement::new("1", "a"), Requirement::new("2", "b").with_planned_version("v1")],
            &["plannedVersion", "description"],
        )
        .unwrap();

        assert_eq!(index.query_prefix("plannedVersion", ""), ids(&["2"]));
        assert!(index.query_contains("description", "").is_empty());
    }
}
