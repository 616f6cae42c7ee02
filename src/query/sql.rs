//! Compiles a [`CollectionQuery`] to parameterised Postgres SQL.

use super::{CollectionQuery, PageRequest, Record, Sort, SortField};

#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i64),
    Bool(bool),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<SqlParam>,
}

/// `SELECT *` for one page of the query.
pub fn select<R: Record>(query: &CollectionQuery<R::Field>) -> SqlResult {
    let (where_clause, params) = where_clause::<R>(query);
    let query = [
        format!("SELECT * FROM \"{}\"", R::TABLE),
        format!("WHERE {}", where_clause),
        order_clause::<R::Field>(query.sort),
        limit_clause(&query.page),
    ]
    .join(" ");

    SqlResult { query, params }
}

/// `COUNT(*)` of the filtered set, before pagination.
pub fn count<R: Record>(query: &CollectionQuery<R::Field>) -> SqlResult {
    let (where_clause, params) = where_clause::<R>(query);
    let query = format!(
        "SELECT COUNT(*) AS count FROM \"{}\" WHERE {}",
        R::TABLE,
        where_clause
    );

    SqlResult { query, params }
}

struct WhereBuilder {
    conditions: Vec<String>,
    params: Vec<SqlParam>,
}

impl WhereBuilder {
    fn new() -> Self {
        Self {
            conditions: vec![],
            params: vec![],
        }
    }

    fn bind(&mut self, column: &str, operator: &str, param: SqlParam) {
        self.params.push(param);
        self.conditions
            .push(format!("\"{}\" {} ${}", column, operator, self.params.len()));
    }

    fn raw(&mut self, condition: &str) {
        self.conditions.push(condition.to_string());
    }

    fn finish(self) -> (String, Vec<SqlParam>) {
        (self.conditions.join(" AND "), self.params)
    }
}

fn where_clause<R: Record>(query: &CollectionQuery<R::Field>) -> (String, Vec<SqlParam>) {
    let mut builder = WhereBuilder::new();

    // Owner scope always comes first.
    builder.bind(R::OWNER_COLUMN, "=", SqlParam::Int(query.owner_id));

    if let Some(predicate) = R::LIVE_PREDICATE {
        builder.raw(predicate);
    }
    if let Some(completed) = query.completed {
        builder.bind("completed", "=", SqlParam::Bool(completed));
    }
    if let Some(text) = query.text_filter() {
        builder.bind(R::TEXT_COLUMN, "ILIKE", SqlParam::Text(like_pattern(text)));
    }

    builder.finish()
}

fn order_clause<F: SortField>(sort: Option<Sort<F>>) -> String {
    match sort {
        Some(sort) if sort.field.column() == "id" => {
            format!("ORDER BY \"id\" {}", sort.order.to_sql())
        }
        Some(sort) => format!(
            "ORDER BY {} {} {}, \"id\" ASC",
            sort_key(sort.field),
            sort.order.to_sql(),
            sort.order.nulls_sql()
        ),
        None => "ORDER BY \"id\" ASC".to_string(),
    }
}

/// Text keys are lower-cased under the column collation, then compared
/// bytewise so the order matches [`super::fold_cmp`].
fn sort_key<F: SortField>(field: F) -> String {
    if field.is_text() {
        format!("lower(\"{}\") COLLATE \"C\"", field.column())
    } else {
        format!("\"{}\"", field.column())
    }
}

fn limit_clause(page: &PageRequest) -> String {
    format!("LIMIT {} OFFSET {}", page.page_size(), page.offset())
}

/// Wrap `text` for a substring `ILIKE`, escaping its wildcards.
fn like_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::{Task, TaskField};
    use crate::models::todo::{Todo, TodoField};
    use crate::query::SortOrder;

    fn page(page: u32, size: u32) -> PageRequest {
        PageRequest::new(page, size).unwrap()
    }

    #[test]
    fn todo_page_with_every_clause() {
        let query = CollectionQuery::new(42, page(3, 10))
            .completed(Some(false))
            .text(Some("shop".to_string()))
            .sort(Some(Sort { field: TodoField::Title, order: SortOrder::Desc }));

        let sql = select::<Todo>(&query);
        assert_eq!(
            sql.query,
            "SELECT * FROM \"todos\" WHERE \"user_id\" = $1 AND \"completed\" = $2 \
             AND \"title\" ILIKE $3 ORDER BY lower(\"title\") COLLATE \"C\" DESC NULLS LAST, \"id\" ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            sql.params,
            vec![
                SqlParam::Int(42),
                SqlParam::Bool(false),
                SqlParam::Text("%shop%".to_string())
            ]
        );
    }

    #[test]
    fn task_count_hides_deleted_rows() {
        let query = CollectionQuery::<TaskField>::new(7, page(1, 5));
        let sql = count::<Task>(&query);
        assert_eq!(
            sql.query,
            "SELECT COUNT(*) AS count FROM \"tasks\" WHERE \"todo_id\" = $1 AND \"deleted_at\" IS NULL"
        );
        assert_eq!(sql.params, vec![SqlParam::Int(7)]);
    }

    #[test]
    fn default_order_is_primary_key() {
        let sql = select::<Todo>(&CollectionQuery::new(1, page(1, 10)));
        assert!(sql.query.contains("ORDER BY \"id\" ASC LIMIT 10 OFFSET 0"));
    }

    #[test]
    fn only_text_columns_are_case_folded() {
        let by_due = CollectionQuery::new(1, page(1, 10))
            .sort(Some(Sort { field: TaskField::DueDate, order: SortOrder::Asc }));
        assert!(select::<Task>(&by_due)
            .query
            .contains("ORDER BY \"due_date\" ASC NULLS FIRST, \"id\" ASC"));

        let by_text = CollectionQuery::new(1, page(1, 10))
            .sort(Some(Sort { field: TaskField::Description, order: SortOrder::Asc }));
        assert!(select::<Task>(&by_text)
            .query
            .contains("ORDER BY lower(\"description\") COLLATE \"C\" ASC NULLS FIRST"));
    }

    #[test]
    fn sorting_by_id_needs_no_tie_break() {
        let query = CollectionQuery::new(1, page(1, 10))
            .sort(Some(Sort { field: TodoField::Id, order: SortOrder::Desc }));
        assert!(select::<Todo>(&query).query.contains("ORDER BY \"id\" DESC LIMIT"));
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
    }

    #[test]
    fn empty_text_adds_no_condition() {
        let query = CollectionQuery::<TodoField>::new(1, page(1, 10)).text(Some(String::new()));
        let sql = count::<Todo>(&query);
        assert!(!sql.query.contains("ILIKE"));
        assert_eq!(sql.params.len(), 1);
    }
}
