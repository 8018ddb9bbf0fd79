mod columns;
mod constraints;
mod dependencies;
mod entities;
mod indexes;
mod schemas;

pub use columns::query_columns;
pub use constraints::query_constraints;
pub use dependencies::query_dependencies;
pub use entities::{query_entities, ListedEntity};
pub use indexes::query_indexes;
pub use schemas::query_schemas;

use crate::error::DescribeError;
use crate::executor::QueryExecutor;
use crate::report::{EntityRecord, TableRecord, ViewRecord};

/// Run every collector for one listed entity, one after another, and merge
/// the results. Any collector error fails the whole entity; no partial
/// record is ever built.
pub async fn assemble_entity(
    executor: &dyn QueryExecutor,
    listed: ListedEntity,
) -> Result<EntityRecord, DescribeError> {
    match listed {
        ListedEntity::Table {
            schema,
            name,
            comment,
            size,
            estimated_rows,
        } => {
            let columns = query_columns(executor, &schema, &name).await?;
            let constraints = query_constraints(executor, &schema, &name).await?;
            let indexes = query_indexes(executor, &schema, &name).await?;
            Ok(EntityRecord::Table(TableRecord {
                schema,
                name,
                comment,
                size,
                estimated_rows,
                columns,
                constraints,
                indexes,
            }))
        }
        ListedEntity::View {
            schema,
            name,
            comment,
            definition,
        } => {
            let columns = query_columns(executor, &schema, &name).await?;
            let dependencies = query_dependencies(executor, &schema, &name).await?;
            Ok(EntityRecord::View(ViewRecord {
                schema,
                name,
                comment,
                definition,
                columns,
                dependencies,
            }))
        }
    }
}
