use crate::error::DescribeError;
use crate::executor::{CatalogQuery, QueryExecutor};
use crate::report::IndexDescriptor;

const INDEXES: CatalogQuery = CatalogQuery {
    name: "indexes",
    sql: r#"
        SELECT i.indexname::text AS index_name,
               i.indexdef AS index_definition,
               pg_size_pretty(pg_relation_size(c.oid)) AS index_size,
               ix.indisunique AS is_unique,
               ix.indisprimary AS is_primary
        FROM pg_catalog.pg_indexes i
        JOIN pg_catalog.pg_namespace n ON n.nspname = i.schemaname
        JOIN pg_catalog.pg_class c ON c.relnamespace = n.oid AND c.relname = i.indexname
        JOIN pg_catalog.pg_index ix ON ix.indexrelid = c.oid
        WHERE i.schemaname = $1 AND i.tablename = $2
        ORDER BY i.indexname
        "#,
};

/// Collect the indexes of one table, ordered by index name.
///
/// Uniqueness and primary-key flags come from `pg_index`, not from parsing
/// the definition text.
pub async fn query_indexes(
    executor: &dyn QueryExecutor,
    schema: &str,
    table_name: &str,
) -> Result<Vec<IndexDescriptor>, DescribeError> {
    let rows = executor.execute(INDEXES, &[schema, table_name]).await?;

    rows.iter()
        .map(|row| {
            Ok(IndexDescriptor {
                name: row.text("index_name")?,
                definition: row.text("index_definition")?,
                size: row.text("index_size")?,
                is_unique: row.bool("is_unique")?,
                is_primary: row.bool("is_primary")?,
            })
        })
        .collect()
}
