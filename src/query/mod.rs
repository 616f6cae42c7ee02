pub mod engine;
pub mod error;
pub mod sql;

use serde::Serialize;
use std::cmp::Ordering;
use std::fmt::Debug;
use std::str::FromStr;

pub use engine::execute;
pub use error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    /// Nulls rank below every value, so they lead ascending and trail descending.
    pub fn nulls_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "NULLS FIRST",
            SortOrder::Desc => "NULLS LAST",
        }
    }

    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortOrder {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortOrder::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortOrder::Desc)
        } else {
            Err(QueryError::InvalidSortOrder(s.to_string()))
        }
    }
}

/// A column a record type can be ordered by.
pub trait SortField: Copy + Debug + Send + Sync + 'static {
    fn column(self) -> &'static str;

    /// Text columns sort by their lower-cased code points.
    fn is_text(self) -> bool {
        false
    }

    /// Resolve a client-supplied field name.
    fn from_name(name: &str) -> Option<Self>;

    /// Names accepted by [`SortField::from_name`], for error messages.
    fn names() -> &'static [&'static str];
}

/// Case-insensitive text ordering shared by both stores: lower-case, then
/// compare code points.
pub fn fold_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort<F> {
    pub field: F,
    pub order: SortOrder,
}

impl<F: SortField> Sort<F> {
    pub fn parse(field: &str, order: SortOrder) -> Result<Self, QueryError> {
        let field = F::from_name(field).ok_or_else(|| QueryError::UnknownSortField {
            field: field.to_string(),
            allowed: F::names(),
        })?;
        Ok(Self { field, order })
    }
}

/// One page of a collection, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Result<Self, QueryError> {
        if page < 1 {
            return Err(QueryError::InvalidPage(i64::from(page)));
        }
        if page_size < 1 {
            return Err(QueryError::InvalidPageSize(i64::from(page_size)));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// Everything needed to fetch one page of an owner's records.
#[derive(Debug, Clone)]
pub struct CollectionQuery<F> {
    /// Owning user (todos) or todo (tasks). Always applied first.
    pub owner_id: i64,
    pub completed: Option<bool>,
    pub text: Option<String>,
    pub sort: Option<Sort<F>>,
    pub page: PageRequest,
}

impl<F> CollectionQuery<F> {
    pub fn new(owner_id: i64, page: PageRequest) -> Self {
        Self {
            owner_id,
            completed: None,
            text: None,
            sort: None,
            page,
        }
    }

    pub fn completed(mut self, completed: Option<bool>) -> Self {
        self.completed = completed;
        self
    }

    pub fn text(mut self, text: Option<String>) -> Self {
        self.text = text;
        self
    }

    pub fn sort(mut self, sort: Option<Sort<F>>) -> Self {
        self.sort = sort;
        self
    }

    /// The text filter, with an empty string treated as no filter.
    pub fn text_filter(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }
}

/// A listable record: owned by one parent, flagged complete or not, carrying
/// one free-text column.
pub trait Record: Send + Sync {
    type Field: SortField;

    const TABLE: &'static str;
    const OWNER_COLUMN: &'static str;
    const TEXT_COLUMN: &'static str;
    /// SQL predicate hiding rows that no read should see.
    const LIVE_PREDICATE: Option<&'static str> = None;

    fn id(&self) -> i64;
    fn owner_id(&self) -> i64;
    fn completed(&self) -> bool;
    fn text(&self) -> &str;

    fn is_live(&self) -> bool {
        true
    }

    fn compare_by(&self, other: &Self, field: Self::Field) -> Ordering;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_items: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_items,
            request,
        }
    }

    pub fn total_pages(&self) -> u64 {
        self.total_items.div_ceil(u64::from(self.request.page_size()))
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            request: self.request,
        }
    }

    pub fn meta(&self) -> PageMeta {
        PageMeta {
            total_items: self.total_items,
            item_count: self.items.len() as u64,
            items_per_page: self.request.page_size(),
            total_pages: self.total_pages(),
            current_page: self.request.page(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_items: u64,
    pub item_count: u64,
    pub items_per_page: u32,
    pub total_pages: u64,
    pub current_page: u32,
}

/// Response body of every collection endpoint.
#[derive(Debug, Serialize)]
pub struct Paginated<T: Serialize> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T: Serialize> From<Page<T>> for Paginated<T> {
    fn from(page: Page<T>) -> Self {
        let meta = page.meta();
        Self {
            items: page.items,
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_rejects_zero() {
        assert!(matches!(PageRequest::new(0, 10), Err(QueryError::InvalidPage(0))));
        assert!(matches!(PageRequest::new(1, 0), Err(QueryError::InvalidPageSize(0))));
        assert_eq!(PageRequest::new(3, 10).unwrap().offset(), 20);
    }

    #[test]
    fn sort_order_parses_either_case() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest::new(1, 10).unwrap();
        assert_eq!(Page::<()>::new(vec![], 0, request).total_pages(), 0);
        assert_eq!(Page::<()>::new(vec![], 10, request).total_pages(), 1);
        assert_eq!(Page::<()>::new(vec![], 11, request).total_pages(), 2);
    }

    #[test]
    fn meta_serializes_camel_case() {
        let page = Page::new(vec![1, 2], 12, PageRequest::new(2, 5).unwrap());
        let body = serde_json::to_value(Paginated::from(page)).unwrap();
        assert_eq!(
            body["meta"],
            serde_json::json!({
                "totalItems": 12,
                "itemCount": 2,
                "itemsPerPage": 5,
                "totalPages": 3,
                "currentPage": 2
            })
        );
        assert_eq!(body["items"], serde_json::json!([1, 2]));
    }

    #[test]
    fn empty_text_is_no_filter() {
        let query = CollectionQuery::<()>::new(1, PageRequest::new(1, 1).unwrap())
            .text(Some(String::new()));
        assert_eq!(query.text_filter(), None);
    }
}
