// handlers/params.rs - query-string parameters shared by collection endpoints

use serde::Deserialize;
use std::collections::HashMap;
use tracing::warn;

use crate::config::QueryConfig;
use crate::error::ApiError;
use crate::models::{TaskField, TodoField};
use crate::query::{CollectionQuery, PageRequest, QueryError, Sort, SortField, SortOrder};

/// Raw collection parameters. Everything arrives as text so that malformed
/// values become field errors instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    #[serde(alias = "pageSize")]
    pub limit: Option<String>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<String>,
}

impl ListParams {
    /// Todos of `user_id` with the completion state fixed by the route.
    pub fn todo_query(
        &self,
        user_id: i64,
        completed: bool,
        limits: &QueryConfig,
    ) -> Result<CollectionQuery<TodoField>, ApiError> {
        let mut errors = HashMap::new();
        let query = self.build::<TodoField>(user_id, limits, &mut errors);
        finish(query, errors).map(|q| q.completed(Some(completed)).text(self.title.clone()))
    }

    /// Tasks of `todo_id`, optionally narrowed by `completed`.
    pub fn task_query(
        &self,
        todo_id: i64,
        limits: &QueryConfig,
    ) -> Result<CollectionQuery<TaskField>, ApiError> {
        let mut errors = HashMap::new();
        let query = self.build::<TaskField>(todo_id, limits, &mut errors);
        let completed = collect(parse_bool("completed", self.completed.as_deref()), &mut errors);
        finish(query, errors).map(|q| {
            q.completed(completed.flatten())
                .text(self.description.clone())
        })
    }

    fn build<F: SortField>(
        &self,
        owner_id: i64,
        limits: &QueryConfig,
        errors: &mut HashMap<String, String>,
    ) -> Option<CollectionQuery<F>> {
        let page = collect(parse_positive("page", self.page.as_deref(), 1), errors);
        let limit = collect(
            parse_positive("limit", self.limit.as_deref(), limits.default_page_size),
            errors,
        )
        .map(|limit| cap_limit(limit, limits.max_page_size));

        let order = collect(
            self.sort_order
                .as_deref()
                .map(str::parse::<SortOrder>)
                .transpose(),
            errors,
        );
        let field = collect(
            self.sort_by
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|name| Sort::<F>::parse(name, SortOrder::default()))
                .transpose(),
            errors,
        );
        let sort = match (field, order) {
            (Some(sort), Some(order)) => Some(sort.map(|sort| Sort {
                order: order.unwrap_or_default(),
                ..sort
            })),
            _ => None,
        };

        let request = collect(PageRequest::new(page?, limit?), errors)?;
        Some(CollectionQuery::new(owner_id, request).sort(sort?))
    }
}

fn finish<F>(
    query: Option<CollectionQuery<F>>,
    errors: HashMap<String, String>,
) -> Result<CollectionQuery<F>, ApiError> {
    match query {
        Some(query) if errors.is_empty() => Ok(query),
        _ => Err(ApiError::validation_error(
            "Invalid query parameters",
            Some(errors),
        )),
    }
}

fn collect<T>(result: Result<T, QueryError>, errors: &mut HashMap<String, String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            errors.insert(err.field().to_string(), err.to_string());
            None
        }
    }
}

fn parse_positive(field: &'static str, raw: Option<&str>, default: u32) -> Result<u32, QueryError> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(default);
    };

    let value: i64 = raw.parse().map_err(|_| QueryError::InvalidNumber {
        field,
        value: raw.to_string(),
    })?;

    match u32::try_from(value) {
        Ok(v) if v > 0 => Ok(v),
        _ if field == "page" => Err(QueryError::InvalidPage(value)),
        _ => Err(QueryError::InvalidPageSize(value)),
    }
}

fn parse_bool(field: &'static str, raw: Option<&str>) -> Result<Option<bool>, QueryError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(v) if v.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(v) => Err(QueryError::InvalidBoolean {
            field,
            value: v.to_string(),
        }),
    }
}

fn cap_limit(limit: u32, max: u32) -> u32 {
    if limit > max {
        warn!("Requested limit {} exceeds maximum {}; capping", limit, max);
        max
    } else {
        limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        let query = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        let uri: axum::http::Uri = format!("/x?{}", query).parse().unwrap();
        axum::extract::Query::<ListParams>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn defaults_apply_when_absent() {
        let limits = testing::config().query;
        let query = ListParams::default().todo_query(1, false, &limits).unwrap();

        assert_eq!(query.page.page(), 1);
        assert_eq!(query.page.page_size(), limits.default_page_size);
        assert!(query.sort.is_none());
        assert_eq!(query.completed, Some(false));
    }

    #[test]
    fn page_size_alias_and_sorting_are_accepted() {
        let limits = testing::config().query;
        let query = params(&[("page", "2"), ("pageSize", "5"), ("sortBy", "date"), ("sortOrder", "desc")])
            .todo_query(1, true, &limits)
            .unwrap();

        assert_eq!(query.page.offset(), 5);
        let sort = query.sort.unwrap();
        assert_eq!(sort.field, TodoField::CreatedAt);
        assert_eq!(sort.order, SortOrder::Desc);
    }

    #[test]
    fn oversized_limit_is_capped() {
        let limits = testing::config().query;
        let query = params(&[("limit", "100000")]).todo_query(1, false, &limits).unwrap();
        assert_eq!(query.page.page_size(), limits.max_page_size);
    }

    #[test]
    fn every_bad_parameter_is_reported() {
        let limits = testing::config().query;
        let err = params(&[
            ("page", "0"),
            ("limit", "abc"),
            ("sortBy", "password"),
            ("sortOrder", "sideways"),
            ("completed", "maybe"),
        ])
        .task_query(1, &limits)
        .unwrap_err();

        let ApiError::ValidationError { field_errors: Some(errors), .. } = err else {
            panic!("expected validation error");
        };
        for field in ["page", "limit", "sortBy", "sortOrder", "completed"] {
            assert!(errors.contains_key(field), "missing {}", field);
        }
    }

    #[test]
    fn bad_sort_field_is_reported_alongside_bad_order() {
        let limits = testing::config().query;
        let err = params(&[("sortBy", "password"), ("sortOrder", "sideways")])
            .todo_query(1, false, &limits)
            .unwrap_err();

        let field_errors = &err.to_json()["field_errors"];
        assert!(field_errors["sortBy"].is_string());
        assert!(field_errors["sortOrder"].is_string());
    }

    #[test]
    fn unknown_sort_field_is_a_validation_error() {
        let limits = testing::config().query;
        let err = params(&[("sortBy", "title")]).task_query(1, &limits).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_json()["field_errors"]["sortBy"].is_string());
    }

    #[test]
    fn task_filters_are_read() {
        let limits = testing::config().query;
        let query = params(&[("completed", "TRUE"), ("description", "milk")])
            .task_query(3, &limits)
            .unwrap();

        assert_eq!(query.owner_id, 3);
        assert_eq!(query.completed, Some(true));
        assert_eq!(query.text_filter(), Some("milk"));
    }
}
