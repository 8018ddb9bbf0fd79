//! Query execution seam between the catalog collectors and the database.
//!
//! Collectors only ever see [`Row`]s with label-based access; the concrete
//! driver behind [`QueryExecutor`] is free to change (and is replaced by a
//! scripted executor in tests).

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Column, PgPool, Row as _, TypeInfo, ValueRef};

use crate::error::DescribeError;

/// A named catalog statement. The name shows up in logs and lets test
/// executors route statements without matching on SQL text.
#[derive(Debug, Clone, Copy)]
pub struct CatalogQuery {
    pub name: &'static str,
    pub sql: &'static str,
}

/// A single decoded cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
}

impl Value {
    fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Int(_) => "an integer",
            Value::Text(_) => "text",
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// One result row with lookup by column label.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    labels: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(labels: Vec<String>, values: Vec<Value>) -> Self {
        Self { labels, values }
    }

    pub fn get(&self, label: &str) -> Result<&Value, DescribeError> {
        self.labels
            .iter()
            .position(|l| l == label)
            .and_then(|idx| self.values.get(idx))
            .ok_or_else(|| DescribeError::MissingField(label.to_string()))
    }

    pub fn text(&self, label: &str) -> Result<String, DescribeError> {
        match self.get(label)? {
            Value::Text(s) => Ok(s.clone()),
            other => Err(type_error(label, "text", other)),
        }
    }

    pub fn opt_text(&self, label: &str) -> Result<Option<String>, DescribeError> {
        match self.get(label)? {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.clone())),
            other => Err(type_error(label, "text", other)),
        }
    }

    pub fn int(&self, label: &str) -> Result<i64, DescribeError> {
        match self.get(label)? {
            Value::Int(n) => Ok(*n),
            other => Err(type_error(label, "an integer", other)),
        }
    }

    pub fn opt_int(&self, label: &str) -> Result<Option<i64>, DescribeError> {
        match self.get(label)? {
            Value::Null => Ok(None),
            Value::Int(n) => Ok(Some(*n)),
            other => Err(type_error(label, "an integer", other)),
        }
    }

    pub fn bool(&self, label: &str) -> Result<bool, DescribeError> {
        match self.get(label)? {
            Value::Bool(b) => Ok(*b),
            other => Err(type_error(label, "a boolean", other)),
        }
    }
}

fn type_error(label: &str, expected: &'static str, found: &Value) -> DescribeError {
    DescribeError::FieldType {
        field: label.to_string(),
        expected,
        found: found.kind(),
    }
}

/// Executes catalog statements. Parameters are always sent as bind values.
///
/// An empty result is `Ok(vec![])`; only a failed statement is an error.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: CatalogQuery, params: &[&str])
        -> Result<Vec<Row>, DescribeError>;
}

/// [`QueryExecutor`] backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl QueryExecutor for PgExecutor {
    async fn execute(
        &self,
        query: CatalogQuery,
        params: &[&str],
    ) -> Result<Vec<Row>, DescribeError> {
        tracing::trace!(query = query.name, ?params, "executing catalog query");

        let mut statement = sqlx::query(query.sql);
        for param in params {
            statement = statement.bind(*param);
        }
        let rows = statement.fetch_all(&self.pool).await?;

        rows.iter().map(decode_row).collect()
    }
}

fn decode_row(row: &PgRow) -> Result<Row, DescribeError> {
    let mut labels = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());

    for column in row.columns() {
        let idx = column.ordinal();
        let label = column.name().to_string();

        let value = if row.try_get_raw(idx)?.is_null() {
            Value::Null
        } else {
            match column.type_info().name() {
                "BOOL" => Value::Bool(row.try_get(idx)?),
                "INT2" => Value::Int(i64::from(row.try_get::<i16, _>(idx)?)),
                "INT4" => Value::Int(i64::from(row.try_get::<i32, _>(idx)?)),
                "INT8" => Value::Int(row.try_get(idx)?),
                "\"CHAR\"" | "CHAR" => {
                    let code: i8 = row.try_get(idx)?;
                    Value::Text(char::from(code as u8).to_string())
                }
                "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Value::Text(row.try_get(idx)?),
                other => {
                    return Err(DescribeError::UnsupportedType {
                        field: label,
                        type_name: other.to_string(),
                    })
                }
            }
        };

        labels.push(label);
        values.push(value);
    }

    Ok(Row::new(labels, values))
}
