//! # Material filter
//!
//! An intermediate predicate object assembled from optional search inputs.
//! Storage adapters compile it into a parameterized query; user input is
//! never spliced into query text.
//!
//! Semantics, ANDed across categories:
//! - `name`: case-insensitive substring of the material name.
//! - `author_terms`: every term must match the same linked author on at least
//!   one of first name, paternal surname or maternal surname.
//! - `author_id`: the material is linked to this author.
//! - `tag_ids`: the material is linked to ANY of these tags.
//! - `only_available`: restrict to `available = 1` (unprivileged callers).

use crate::models::{AuthorId, TagId};
use crate::role::Role;
use crate::visibility;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialFilter {
    pub name: Option<String>,
    pub author_terms: Vec<String>,
    pub author_id: Option<AuthorId>,
    pub tag_ids: Vec<TagId>,
    pub only_available: bool,
}

impl MaterialFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blank input leaves the name filter unset.
    pub fn name_contains(mut self, name: Option<&str>) -> Self {
        self.name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);
        self
    }

    pub fn author_query(mut self, query: Option<&str>) -> Self {
        self.author_terms = query.map(tokenize_author_query).unwrap_or_default();
        self
    }

    pub fn by_author(mut self, author_id: AuthorId) -> Self {
        self.author_id = Some(author_id);
        self
    }

    pub fn with_any_tag<I>(mut self, tag_ids: I) -> Self
    where
        I: IntoIterator<Item = TagId>,
    {
        let mut ids: Vec<TagId> = tag_ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        self.tag_ids = ids;
        self
    }

    pub fn visible_to(mut self, role: Role) -> Self {
        self.only_available = visibility::requires_available(role);
        self
    }

    /// True when no content criteria are set (visibility alone does not count).
    pub fn is_unconstrained(&self) -> bool {
        self.name.is_none()
            && self.author_terms.is_empty()
            && self.author_id.is_none()
            && self.tag_ids.is_empty()
    }
}

/// Splits a free-text author query on whitespace, dropping empty tokens.
pub fn tokenize_author_query(query: &str) -> Vec<String> {
    query.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_word_query_becomes_two_terms() {
        let filter = MaterialFilter::new().author_query(Some("  Juan   Perez "));
        assert_eq!(filter.author_terms, vec!["Juan", "Perez"]);
    }

    #[test]
    fn blank_inputs_do_not_constrain() {
        let filter = MaterialFilter::new()
            .name_contains(Some("   "))
            .author_query(Some(" "))
            .with_any_tag(Vec::new());
        assert!(filter.is_unconstrained());
        assert_eq!(filter.name, None);
    }

    #[test]
    fn tag_ids_are_deduplicated() {
        let filter = MaterialFilter::new().with_any_tag([3, 1, 3, 2, 1]);
        assert_eq!(filter.tag_ids, vec![1, 2, 3]);
    }

    #[test]
    fn visibility_follows_role() {
        assert!(MaterialFilter::new().visible_to(Role::Student).only_available);
        assert!(MaterialFilter::new().visible_to(Role::Guest).only_available);
        assert!(!MaterialFilter::new().visible_to(Role::Admin).only_available);
        assert!(!MaterialFilter::new().visible_to(Role::Reviewer).only_available);
    }
}
