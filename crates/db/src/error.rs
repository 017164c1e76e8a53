use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid value {value:?} in column {column}")]
    InvalidColumn { column: &'static str, value: String },
}

impl DbError {
    pub(crate) fn invalid(column: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidColumn {
            column,
            value: value.into(),
        }
    }
}
