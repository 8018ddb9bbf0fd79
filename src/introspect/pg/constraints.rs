use indexmap::IndexMap;

use crate::error::DescribeError;
use crate::executor::{CatalogQuery, QueryExecutor, Row};
use crate::report::{ConstraintDescriptor, ConstraintKind, ForeignKeyReference};

/// One row per participating column, scoped to the table through
/// `conrelid` (CHECK and FOREIGN KEY names are only unique per table).
/// Foreign-key targets pair `conkey[i]` with `confkey[i]`, so a composite
/// key yields N rows rather than N².
const CONSTRAINTS: CatalogQuery = CatalogQuery {
    name: "constraints",
    sql: r#"
        SELECT con.conname::text AS constraint_name,
               CASE con.contype
                   WHEN 'p' THEN 'PRIMARY KEY'
                   WHEN 'f' THEN 'FOREIGN KEY'
                   WHEN 'u' THEN 'UNIQUE'
                   WHEN 'c' THEN 'CHECK'
               END AS constraint_type,
               att.attname::text AS column_name,
               ref_ns.nspname::text AS foreign_table_schema,
               ref_rel.relname::text AS foreign_table_name,
               ref_att.attname::text AS foreign_column_name,
               CASE WHEN con.contype = 'c'
                   THEN substring(pg_get_constraintdef(con.oid) FROM 7)
               END AS check_clause
        FROM pg_catalog.pg_constraint con
        JOIN pg_catalog.pg_class rel ON rel.oid = con.conrelid
        JOIN pg_catalog.pg_namespace ns ON ns.oid = rel.relnamespace
        LEFT JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, position) ON true
        LEFT JOIN pg_catalog.pg_attribute att
            ON att.attrelid = con.conrelid AND att.attnum = k.attnum
        LEFT JOIN pg_catalog.pg_class ref_rel ON ref_rel.oid = con.confrelid
        LEFT JOIN pg_catalog.pg_namespace ref_ns ON ref_ns.oid = ref_rel.relnamespace
        LEFT JOIN pg_catalog.pg_attribute ref_att
            ON ref_att.attrelid = con.confrelid
            AND ref_att.attnum = con.confkey[k.position::int4]
        WHERE ns.nspname = $1 AND rel.relname = $2
          AND con.contype IN ('p', 'f', 'u', 'c')
        ORDER BY constraint_type, con.conname, k.position
        "#,
};

/// Collect the constraints of one table in discovery order
/// (type, then name, then column position).
pub async fn query_constraints(
    executor: &dyn QueryExecutor,
    schema: &str,
    table_name: &str,
) -> Result<Vec<ConstraintDescriptor>, DescribeError> {
    let rows = executor.execute(CONSTRAINTS, &[schema, table_name]).await?;
    accumulate(&rows)
}

struct ConstraintAccumulator {
    kind: ConstraintKind,
    columns: Vec<String>,
    reference: Option<ForeignKeyReference>,
    check_clause: Option<String>,
}

fn accumulate(rows: &[Row]) -> Result<Vec<ConstraintDescriptor>, DescribeError> {
    let mut constraints: IndexMap<String, ConstraintAccumulator> = IndexMap::new();

    for row in rows {
        let name = row.text("constraint_name")?;
        let label = row.text("constraint_type")?;
        let kind = ConstraintKind::from_catalog(&label).ok_or_else(|| {
            DescribeError::CatalogShape(format!("constraint `{name}` has unknown type {label}"))
        })?;

        let acc = constraints
            .entry(name)
            .or_insert_with(|| ConstraintAccumulator {
                kind,
                columns: Vec::new(),
                reference: None,
                check_clause: None,
            });

        if let Some(column) = row.opt_text("column_name")? {
            if !acc.columns.contains(&column) {
                acc.columns.push(column);
            }
        }

        if acc.kind == ConstraintKind::ForeignKey && acc.reference.is_none() {
            acc.reference = foreign_key_reference(row)?;
        }

        if acc.kind == ConstraintKind::Check && acc.check_clause.is_none() {
            acc.check_clause = row.opt_text("check_clause")?;
        }
    }

    let constraints = constraints
        .into_iter()
        .filter(|(name, acc)| {
            if acc.columns.is_empty() {
                // implicit NOT NULL checks name no column
                tracing::trace!("Skipping constraint {name} without columns");
                return false;
            }
            true
        })
        .map(|(name, acc)| ConstraintDescriptor {
            name,
            kind: acc.kind,
            columns: acc.columns,
            reference: acc.reference,
            check_clause: acc.check_clause,
        })
        .collect();

    Ok(constraints)
}

fn foreign_key_reference(row: &Row) -> Result<Option<ForeignKeyReference>, DescribeError> {
    let Some(table) = row.opt_text("foreign_table_name")? else {
        return Ok(None);
    };
    Ok(Some(ForeignKeyReference {
        schema: row.opt_text("foreign_table_schema")?.unwrap_or_default(),
        table,
        column: row.opt_text("foreign_column_name")?.unwrap_or_default(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Value;
    use crate::testutil::{key_row, row, MockExecutor};

    fn fk_row(name: &str, column: &str, target: (&str, &str, &str)) -> Row {
        row(&[
            ("constraint_name", name.into()),
            ("constraint_type", "FOREIGN KEY".into()),
            ("column_name", column.into()),
            ("foreign_table_schema", target.0.into()),
            ("foreign_table_name", target.1.into()),
            ("foreign_column_name", target.2.into()),
            ("check_clause", Value::Null),
        ])
    }

    #[tokio::test]
    async fn test_primary_and_unique() {
        let executor = MockExecutor::new().on(
            "constraints",
            &["app", "users"],
            vec![
                key_row("users_pkey", "PRIMARY KEY", "id"),
                key_row("users_email_key", "UNIQUE", "email"),
            ],
        );

        let constraints = query_constraints(&executor, "app", "users").await.unwrap();
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].name, "users_pkey");
        assert_eq!(constraints[0].kind, ConstraintKind::PrimaryKey);
        assert_eq!(constraints[0].columns, vec!["id"]);
        assert_eq!(constraints[1].kind, ConstraintKind::Unique);
        assert_eq!(constraints[1].columns, vec!["email"]);
        assert!(constraints.iter().all(|c| c.reference.is_none()));
    }

    #[test]
    fn test_composite_foreign_key_has_one_reference() {
        let rows = vec![
            fk_row("line_order_fk", "order_id", ("app", "orders", "id")),
            fk_row("line_order_fk", "order_region", ("app", "orders", "region")),
        ];

        let constraints = accumulate(&rows).unwrap();
        assert_eq!(constraints.len(), 1);

        let fk = &constraints[0];
        assert_eq!(fk.kind, ConstraintKind::ForeignKey);
        assert_eq!(fk.columns, vec!["order_id", "order_region"]);
        assert_eq!(
            fk.reference,
            Some(ForeignKeyReference {
                schema: "app".to_string(),
                table: "orders".to_string(),
                column: "id".to_string(),
            })
        );
    }

    #[test]
    fn test_discovery_order_is_preserved() {
        // Catalog order is type then name; the accumulator must not re-sort.
        let rows = vec![
            key_row("z_check", "CHECK", "qty"),
            key_row("b_pk", "PRIMARY KEY", "id"),
            key_row("a_uq", "UNIQUE", "code"),
            key_row("b_pk", "PRIMARY KEY", "region"),
        ];

        let constraints = accumulate(&rows).unwrap();
        let names: Vec<&str> = constraints.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["z_check", "b_pk", "a_uq"]);
        assert_eq!(constraints[1].columns, vec!["id", "region"]);
    }

    #[test]
    fn test_check_clause_and_columnless_checks() {
        let rows = vec![
            row(&[
                ("constraint_name", "2200_16386_2_not_null".into()),
                ("constraint_type", "CHECK".into()),
                ("column_name", Value::Null),
                ("foreign_table_schema", Value::Null),
                ("foreign_table_name", Value::Null),
                ("foreign_column_name", Value::Null),
                ("check_clause", "email IS NOT NULL".into()),
            ]),
            row(&[
                ("constraint_name", "qty_positive".into()),
                ("constraint_type", "CHECK".into()),
                ("column_name", "qty".into()),
                ("foreign_table_schema", Value::Null),
                ("foreign_table_name", Value::Null),
                ("foreign_column_name", Value::Null),
                ("check_clause", "(qty > 0)".into()),
            ]),
        ];

        let constraints = accumulate(&rows).unwrap();
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].name, "qty_positive");
        assert_eq!(constraints[0].check_clause.as_deref(), Some("(qty > 0)"));
    }

    #[test]
    fn test_fanned_out_rows_do_not_duplicate_columns() {
        let rows = vec![
            key_row("users_pkey", "PRIMARY KEY", "id"),
            key_row("users_pkey", "PRIMARY KEY", "id"),
        ];
        assert_eq!(accumulate(&rows).unwrap()[0].columns, vec!["id"]);
    }

    #[test]
    fn test_unknown_constraint_type() {
        let rows = vec![key_row("no_overlap", "EXCLUDE", "during")];
        assert!(matches!(
            accumulate(&rows),
            Err(DescribeError::CatalogShape(_))
        ));
    }

    /// Needs a scratch server: set PGDESCRIBE_TEST_DATABASE_URL to run.
    #[tokio::test]
    async fn test_same_named_constraints_stay_on_their_table() {
        let Ok(url) = std::env::var("PGDESCRIBE_TEST_DATABASE_URL") else {
            return;
        };
        let pool = sqlx::PgPool::connect(&url).await.unwrap();
        sqlx::raw_sql(indoc::indoc! {"
            DROP SCHEMA IF EXISTS pgdescribe_scope CASCADE;
            CREATE SCHEMA pgdescribe_scope;
            CREATE TABLE pgdescribe_scope.users (id integer PRIMARY KEY);
            CREATE TABLE pgdescribe_scope.accounts (id integer PRIMARY KEY);
            CREATE TABLE pgdescribe_scope.orders (
                qty integer,
                user_id integer,
                CONSTRAINT positive CHECK (qty > 0),
                CONSTRAINT owner_fk FOREIGN KEY (user_id) REFERENCES pgdescribe_scope.users (id)
            );
            CREATE TABLE pgdescribe_scope.items (
                price integer,
                account_id integer,
                CONSTRAINT positive CHECK (price > 0),
                CONSTRAINT owner_fk FOREIGN KEY (account_id) REFERENCES pgdescribe_scope.accounts (id)
            );
        "})
        .execute(&pool)
        .await
        .unwrap();

        let executor = crate::executor::PgExecutor::new(pool.clone());
        let orders = query_constraints(&executor, "pgdescribe_scope", "orders")
            .await
            .unwrap();
        let items = query_constraints(&executor, "pgdescribe_scope", "items")
            .await
            .unwrap();

        sqlx::raw_sql("DROP SCHEMA pgdescribe_scope CASCADE")
            .execute(&pool)
            .await
            .unwrap();

        let find = |constraints: &[ConstraintDescriptor], name: &str| {
            constraints.iter().find(|c| c.name == name).cloned().unwrap()
        };

        let positive = find(&orders, "positive");
        assert_eq!(positive.columns, vec!["qty"]);
        assert_eq!(positive.check_clause.as_deref(), Some("((qty > 0))"));
        assert_eq!(find(&items, "positive").columns, vec!["price"]);

        let orders_fk = find(&orders, "owner_fk");
        assert_eq!(orders_fk.columns, vec!["user_id"]);
        assert_eq!(orders_fk.reference.unwrap().table, "users");

        let items_fk = find(&items, "owner_fk");
        assert_eq!(items_fk.columns, vec!["account_id"]);
        assert_eq!(
            items_fk.reference,
            Some(ForeignKeyReference {
                schema: "pgdescribe_scope".to_string(),
                table: "accounts".to_string(),
                column: "id".to_string(),
            })
        );
    }
}
