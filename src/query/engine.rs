//! In-process evaluation of a [`CollectionQuery`] over borrowed rows.
//!
//! Used by the memory store; the Postgres store compiles the same query to
//! SQL in [`super::sql`] and must agree with this module row for row.

use std::cmp::Ordering;

use super::{CollectionQuery, Page, Record, Sort};

/// Scope, filter, order and slice `rows`.
///
/// Text matching is a case-insensitive substring test. Ordering falls back to
/// the primary key so that pages never overlap or skip rows.
pub fn execute<'a, R, I>(rows: I, query: &CollectionQuery<R::Field>) -> Page<R>
where
    R: Record + Clone + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let needle = query.text_filter().map(str::to_lowercase);

    let mut matched: Vec<&R> = rows
        .into_iter()
        .filter(|row| row.owner_id() == query.owner_id)
        .filter(|row| row.is_live())
        .filter(|row| query.completed.map_or(true, |c| row.completed() == c))
        .filter(|row| {
            needle
                .as_deref()
                .map_or(true, |n| row.text().to_lowercase().contains(n))
        })
        .collect();

    matched.sort_by(|a, b| compare(*a, *b, query.sort));

    let total_items = matched.len() as u64;
    let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);
    let items = matched
        .into_iter()
        .skip(offset)
        .take(query.page.page_size() as usize)
        .cloned()
        .collect();

    Page::new(items, total_items, query.page)
}

fn compare<R: Record>(a: &R, b: &R, sort: Option<Sort<R::Field>>) -> Ordering {
    let primary = match sort {
        Some(sort) => sort.order.apply(a.compare_by(b, sort.field)),
        None => Ordering::Equal,
    };
    primary.then_with(|| a.id().cmp(&b.id()))
}
