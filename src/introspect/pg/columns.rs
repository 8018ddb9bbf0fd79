use crate::error::DescribeError;
use crate::executor::{CatalogQuery, QueryExecutor, Row};
use crate::report::ColumnDescriptor;

const COLUMNS: CatalogQuery = CatalogQuery {
    name: "columns",
    sql: r#"
        SELECT c.column_name::text AS column_name,
               c.data_type::text AS data_type,
               c.is_nullable = 'YES' AS is_nullable,
               c.column_default::text AS column_default,
               c.ordinal_position::int4 AS ordinal_position,
               c.character_maximum_length::int4 AS character_maximum_length,
               c.numeric_precision::int4 AS numeric_precision,
               c.numeric_scale::int4 AS numeric_scale,
               pgd.description AS column_comment
        FROM information_schema.columns c
        JOIN pg_catalog.pg_namespace n ON n.nspname = c.table_schema
        JOIN pg_catalog.pg_class cl ON cl.relnamespace = n.oid AND cl.relname = c.table_name
        JOIN pg_catalog.pg_attribute a ON a.attrelid = cl.oid AND a.attname = c.column_name
        LEFT JOIN pg_catalog.pg_description pgd
            ON pgd.objoid = cl.oid
            AND pgd.classoid = 'pg_catalog.pg_class'::regclass
            AND pgd.objsubid = a.attnum
        WHERE c.table_schema = $1 AND c.table_name = $2
        ORDER BY c.ordinal_position
        "#,
};

/// Collect the columns of one table or view, ordered by position.
pub async fn query_columns(
    executor: &dyn QueryExecutor,
    schema: &str,
    entity: &str,
) -> Result<Vec<ColumnDescriptor>, DescribeError> {
    let rows = executor.execute(COLUMNS, &[schema, entity]).await?;

    let mut columns: Vec<ColumnDescriptor> = Vec::with_capacity(rows.len());
    for row in &rows {
        let column = column_from_row(row)?;

        // A join that fans out would repeat positions
        let previous = columns.last().map_or(0, |c| c.position);
        if column.position <= previous {
            return Err(DescribeError::CatalogShape(format!(
                "column `{}` of {schema}.{entity} has position {} after {previous}",
                column.name, column.position
            )));
        }
        columns.push(column);
    }

    Ok(columns)
}

fn column_from_row(row: &Row) -> Result<ColumnDescriptor, DescribeError> {
    Ok(ColumnDescriptor {
        name: row.text("column_name")?,
        data_type: row.text("data_type")?,
        nullable: row.bool("is_nullable")?,
        default: row.opt_text("column_default")?,
        position: row.int("ordinal_position")?,
        comment: row.opt_text("column_comment")?.unwrap_or_default(),
        max_length: row.opt_int("character_maximum_length")?,
        numeric_precision: row.opt_int("numeric_precision")?,
        numeric_scale: row.opt_int("numeric_scale")?,
    })
}
