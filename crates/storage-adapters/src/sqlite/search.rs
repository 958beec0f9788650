//! Compiles a `MaterialFilter` into one parameterized SQL statement.
//!
//! Every user-supplied value is bound, never spliced into the text. Categories
//! combine with AND; author terms must all match the same linked author; tag
//! ids match when the material carries any of them.

use domains::MaterialFilter;
use sqlx::{QueryBuilder, Sqlite};

use super::fold;

/// `LIKE` pattern matching `term` anywhere, with wildcards in the term escaped.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub fn compile(filter: &MaterialFilter) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new("SELECT m.id FROM materials m WHERE 1 = 1");

    if filter.only_available {
        qb.push(" AND m.available = 1");
    }

    if let Some(name) = &filter.name {
        qb.push(" AND m.name_folded LIKE ")
            .push_bind(contains_pattern(&fold(name)))
            .push(" ESCAPE '\\'");
    }

    if !filter.author_terms.is_empty() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM author_materials am \
             JOIN authors a ON a.id = am.author_id WHERE am.material_id = m.id",
        );
        for term in &filter.author_terms {
            let pattern = contains_pattern(&fold(term));
            qb.push(" AND (a.first_name_folded LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR a.paternal_surname_folded LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR a.maternal_surname_folded LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
        qb.push(")");
    }

    if let Some(author_id) = filter.author_id {
        qb.push(
            " AND EXISTS (SELECT 1 FROM author_materials ab \
             WHERE ab.material_id = m.id AND ab.author_id = ",
        )
        .push_bind(author_id)
        .push(")");
    }

    if !filter.tag_ids.is_empty() {
        qb.push(
            " AND EXISTS (SELECT 1 FROM material_tags mt \
             WHERE mt.material_id = m.id AND mt.tag_id IN (",
        );
        let mut ids = qb.separated(", ");
        for tag_id in &filter.tag_ids {
            ids.push_bind(*tag_id);
        }
        qb.push("))");
    }

    qb.push(" ORDER BY m.id");
    qb
}
