use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DescribeError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid resource URI: {0}")]
    InvalidResource(String),

    #[error("Catalog row has no field `{0}`")]
    MissingField(String),

    #[error("Field `{field}` is {found}, expected {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Field `{field}` has unsupported column type {type_name}")]
    UnsupportedType { field: String, type_name: String },

    #[error("Unexpected catalog shape: {0}")]
    CatalogShape(String),

    #[error("Deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
