use crate::error::DescribeError;
use crate::executor::{CatalogQuery, QueryExecutor};
use crate::report::{DependencyDescriptor, DependencyKind};

/// Walks from the view's rewrite rule to the relations it references.
/// Only normal dependencies (`deptype = 'n'`) on tables, views and
/// materialized views count; the view itself is excluded.
const DEPENDENCIES: CatalogQuery = CatalogQuery {
    name: "dependencies",
    sql: r#"
        SELECT DISTINCT
               source_ns.nspname::text AS source_schema,
               source_table.relname::text AS source_table,
               source_table.relkind::text AS source_type
        FROM pg_catalog.pg_depend d
        JOIN pg_catalog.pg_rewrite r ON r.oid = d.objid
        JOIN pg_catalog.pg_class view_class ON view_class.oid = r.ev_class
        JOIN pg_catalog.pg_namespace view_ns ON view_ns.oid = view_class.relnamespace
        JOIN pg_catalog.pg_class source_table ON source_table.oid = d.refobjid
        JOIN pg_catalog.pg_namespace source_ns ON source_ns.oid = source_table.relnamespace
        WHERE view_ns.nspname = $1
          AND view_class.relname = $2
          AND d.classid = 'pg_catalog.pg_rewrite'::regclass
          AND d.refclassid = 'pg_catalog.pg_class'::regclass
          AND d.deptype = 'n'
          AND source_table.relkind IN ('r', 'v', 'm')
          AND source_table.oid <> view_class.oid
        ORDER BY source_schema, source_table
        "#,
};

/// Resolve the distinct base relations a view reads from.
pub async fn query_dependencies(
    executor: &dyn QueryExecutor,
    schema: &str,
    view_name: &str,
) -> Result<Vec<DependencyDescriptor>, DescribeError> {
    let rows = executor.execute(DEPENDENCIES, &[schema, view_name]).await?;

    let mut dependencies: Vec<DependencyDescriptor> = Vec::with_capacity(rows.len());
    for row in &rows {
        let dependency = DependencyDescriptor {
            schema: row.text("source_schema")?,
            name: row.text("source_table")?,
            kind: DependencyKind::from_relkind(&row.text("source_type")?),
        };
        if dependency.schema == schema && dependency.name == view_name {
            continue;
        }
        if !dependencies.contains(&dependency) {
            dependencies.push(dependency);
        }
    }

    Ok(dependencies)
}
