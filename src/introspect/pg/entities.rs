use crate::error::DescribeError;
use crate::executor::{CatalogQuery, QueryExecutor, Row};
use crate::report::EntityKind;

const TABLES: CatalogQuery = CatalogQuery {
    name: "tables",
    sql: r#"
        SELECT t.table_schema::text AS table_schema,
               t.table_name::text AS table_name,
               pg_size_pretty(pg_total_relation_size(c.oid)) AS table_size,
               c.reltuples::int8 AS estimated_rows,
               obj_description(c.oid, 'pg_class') AS table_comment
        FROM information_schema.tables t
        JOIN pg_catalog.pg_namespace n ON n.nspname = t.table_schema
        JOIN pg_catalog.pg_class c ON c.relnamespace = n.oid AND c.relname = t.table_name
        WHERE t.table_type = 'BASE TABLE'
          AND t.table_schema NOT LIKE 'pg\_%'
          AND t.table_schema <> 'information_schema'
        ORDER BY t.table_schema, t.table_name
        "#,
};

const VIEWS: CatalogQuery = CatalogQuery {
    name: "views",
    sql: r#"
        SELECT t.table_schema::text AS table_schema,
               t.table_name::text AS table_name,
               v.view_definition::text AS view_definition,
               obj_description(
                   (quote_ident(t.table_schema) || '.' || quote_ident(t.table_name))::regclass,
                   'pg_class'
               ) AS view_comment
        FROM information_schema.tables t
        LEFT JOIN information_schema.views v
            ON v.table_schema = t.table_schema AND v.table_name = t.table_name
        WHERE t.table_type = 'VIEW'
          AND t.table_schema NOT LIKE 'pg\_%'
          AND t.table_schema <> 'information_schema'
        ORDER BY t.table_schema, t.table_name
        "#,
};

/// A table or view as listed, before its columns and the rest are collected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListedEntity {
    Table {
        schema: String,
        name: String,
        comment: Option<String>,
        size: String,
        estimated_rows: i64,
    },
    View {
        schema: String,
        name: String,
        comment: Option<String>,
        definition: Option<String>,
    },
}

impl ListedEntity {
    pub fn schema(&self) -> &str {
        match self {
            ListedEntity::Table { schema, .. } | ListedEntity::View { schema, .. } => schema,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ListedEntity::Table { name, .. } | ListedEntity::View { name, .. } => name,
        }
    }
}

/// List all user tables or views ordered by `(schema, name)`.
pub async fn query_entities(
    executor: &dyn QueryExecutor,
    kind: EntityKind,
) -> Result<Vec<ListedEntity>, DescribeError> {
    let query = match kind {
        EntityKind::Table => TABLES,
        EntityKind::View => VIEWS,
    };
    let rows = executor.execute(query, &[]).await?;

    rows.iter()
        .map(|row| match kind {
            EntityKind::Table => table_from_row(row),
            EntityKind::View => view_from_row(row),
        })
        .collect()
}

fn table_from_row(row: &Row) -> Result<ListedEntity, DescribeError> {
    Ok(ListedEntity::Table {
        schema: row.text("table_schema")?,
        name: row.text("table_name")?,
        comment: row.opt_text("table_comment")?,
        size: row.opt_text("table_size")?.unwrap_or_default(),
        estimated_rows: row.opt_int("estimated_rows")?.unwrap_or(0),
    })
}

fn view_from_row(row: &Row) -> Result<ListedEntity, DescribeError> {
    Ok(ListedEntity::View {
        schema: row.text("table_schema")?,
        name: row.text("table_name")?,
        comment: row.opt_text("view_comment")?,
        definition: row.opt_text("view_definition")?,
    })
}
