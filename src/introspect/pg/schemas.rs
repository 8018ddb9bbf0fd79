use crate::error::DescribeError;
use crate::executor::{CatalogQuery, QueryExecutor};
use crate::report::{Schema, SchemaKind};

const SCHEMAS: CatalogQuery = CatalogQuery {
    name: "schemas",
    sql: r#"
        SELECT n.nspname::text AS schema_name,
               pg_get_userbyid(n.nspowner)::text AS schema_owner,
               CASE
                   WHEN n.nspname LIKE 'pg\_%' THEN 'system'
                   WHEN n.nspname = 'information_schema' THEN 'system'
                   ELSE 'user'
               END AS schema_type
        FROM pg_catalog.pg_namespace n
        WHERE n.nspname NOT LIKE 'pg\_%'
          AND n.nspname <> 'information_schema'
        ORDER BY n.nspname
        "#,
};

/// List every non-system schema, ordered by name.
pub async fn query_schemas(executor: &dyn QueryExecutor) -> Result<Vec<Schema>, DescribeError> {
    let rows = executor.execute(SCHEMAS, &[]).await?;

    rows.iter()
        .map(|row| {
            let kind = match row.text("schema_type")?.as_str() {
                "system" => SchemaKind::System,
                _ => SchemaKind::User,
            };
            Ok(Schema {
                name: row.text("schema_name")?,
                owner: row.text("schema_owner")?,
                kind,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{row, MockExecutor};

    #[tokio::test]
    async fn test_query_schemas() {
        let executor = MockExecutor::new().on(
            "schemas",
            &[],
            vec![
                row(&[
                    ("schema_name", "app".into()),
                    ("schema_owner", "postgres".into()),
                    ("schema_type", "user".into()),
                ]),
                row(&[
                    ("schema_name", "public".into()),
                    ("schema_owner", "pg_database_owner".into()),
                    ("schema_type", "user".into()),
                ]),
            ],
        );

        let schemas = query_schemas(&executor).await.unwrap();
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[0].name, "app");
        assert_eq!(schemas[1].owner, "pg_database_owner");
        assert!(schemas.iter().all(|s| s.kind == SchemaKind::User));
    }

    #[tokio::test]
    async fn test_no_schemas_is_empty() {
        let executor = MockExecutor::new();
        assert!(query_schemas(&executor).await.unwrap().is_empty());
    }
}
