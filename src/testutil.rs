use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::DescribeError;
use crate::executor::{CatalogQuery, QueryExecutor, Row, Value};

/// Build a row from `(label, value)` pairs.
pub fn row(cells: &[(&str, Value)]) -> Row {
    Row::new(
        cells.iter().map(|(label, _)| label.to_string()).collect(),
        cells.iter().map(|(_, value)| value.clone()).collect(),
    )
}

/// A `columns` row with no comment, default or precision metadata.
pub fn column_row(name: &str, data_type: &str, nullable: bool, position: i64) -> Row {
    row(&[
        ("column_name", name.into()),
        ("data_type", data_type.into()),
        ("is_nullable", nullable.into()),
        ("column_default", Value::Null),
        ("ordinal_position", position.into()),
        ("character_maximum_length", Value::Null),
        ("numeric_precision", Value::Null),
        ("numeric_scale", Value::Null),
        ("column_comment", Value::Null),
    ])
}

/// A `constraints` row for a non-foreign-key constraint over one column.
pub fn key_row(name: &str, kind: &str, column: &str) -> Row {
    row(&[
        ("constraint_name", name.into()),
        ("constraint_type", kind.into()),
        ("column_name", column.into()),
        ("foreign_table_schema", Value::Null),
        ("foreign_table_name", Value::Null),
        ("foreign_column_name", Value::Null),
        ("check_clause", Value::Null),
    ])
}

enum Response {
    Rows(Vec<Row>),
    Fail(String),
}

struct Script {
    query: &'static str,
    params: Vec<String>,
    response: Response,
}

/// Scripted executor. Statements are matched by query name and bound
/// parameters; anything unscripted returns no rows.
#[derive(Default)]
pub struct MockExecutor {
    scripts: Vec<Script>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, query: &'static str, params: &[&str], rows: Vec<Row>) -> Self {
        self.scripts.push(Script {
            query,
            params: params.iter().map(|p| p.to_string()).collect(),
            response: Response::Rows(rows),
        });
        self
    }

    pub fn fail(mut self, query: &'static str, params: &[&str], message: &str) -> Self {
        self.scripts.push(Script {
            query,
            params: params.iter().map(|p| p.to_string()).collect(),
            response: Response::Fail(message.to_string()),
        });
        self
    }

    /// Every `(query name, params)` executed so far, in order.
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for MockExecutor {
    async fn execute(
        &self,
        query: CatalogQuery,
        params: &[&str],
    ) -> Result<Vec<Row>, DescribeError> {
        let params: Vec<String> = params.iter().map(|p| p.to_string()).collect();
        self.calls
            .lock()
            .unwrap()
            .push((query.name.to_string(), params.clone()));

        let script = self
            .scripts
            .iter()
            .find(|s| s.query == query.name && s.params == params);
        match script.map(|s| &s.response) {
            Some(Response::Rows(rows)) => Ok(rows.clone()),
            Some(Response::Fail(message)) => Err(DescribeError::Connection(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}
