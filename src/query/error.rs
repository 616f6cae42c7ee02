use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("page must be a positive integer, got {0}")]
    InvalidPage(i64),

    #[error("limit must be a positive integer, got {0}")]
    InvalidPageSize(i64),

    #[error("cannot sort by '{field}'; expected one of: {}", allowed.join(", "))]
    UnknownSortField {
        field: String,
        allowed: &'static [&'static str],
    },

    #[error("sortOrder must be ASC or DESC, got '{0}'")]
    InvalidSortOrder(String),

    #[error("{field} must be true or false, got '{value}'")]
    InvalidBoolean { field: &'static str, value: String },

    #[error("{field} must be an integer, got '{value}'")]
    InvalidNumber { field: &'static str, value: String },
}

impl QueryError {
    /// Query parameter the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            QueryError::InvalidPage(_) => "page",
            QueryError::InvalidPageSize(_) => "limit",
            QueryError::UnknownSortField { .. } => "sortBy",
            QueryError::InvalidSortOrder(_) => "sortOrder",
            QueryError::InvalidBoolean { field, .. } => field,
            QueryError::InvalidNumber { field, .. } => field,
        }
    }
}
