//! Builds the per-database [`Report`]: schemas first, then the entity list,
//! then every entity assembled and merged in listing order.

use std::time::Duration;

use futures::{StreamExt, TryStreamExt};
use tokio::time::Instant;
use tracing::Instrument;

use crate::error::DescribeError;
use crate::executor::QueryExecutor;
use crate::introspect::pg::{self, ListedEntity};
use crate::report::{EntityKind, EntityRecord, FailedEntity, Report};

/// What to do with entities whose collection failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Leave them out silently (apart from the log line).
    Drop,
    /// Leave them out of the entity list but name them under `skipped`.
    #[default]
    Annotate,
}

#[derive(Debug, Clone)]
pub struct DescribeOptions {
    /// Entities assembled at once. The executor must support concurrent use
    /// for values above 1.
    pub concurrency: usize,
    pub failure_policy: FailurePolicy,
    /// Budget for the whole invocation, checked before each entity starts.
    pub deadline: Option<Duration>,
}

impl Default for DescribeOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            failure_policy: FailurePolicy::default(),
            deadline: None,
        }
    }
}

/// Result of assembling a single entity.
#[derive(Debug)]
pub enum EntityOutcome {
    Assembled(EntityRecord),
    Failed(FailedEntity),
}

/// Describe every user table in `database`.
pub async fn describe_tables(
    executor: &dyn QueryExecutor,
    database: &str,
    options: &DescribeOptions,
) -> Result<Report, DescribeError> {
    describe(executor, database, EntityKind::Table, options).await
}

/// Describe every user view in `database`.
pub async fn describe_views(
    executor: &dyn QueryExecutor,
    database: &str,
    options: &DescribeOptions,
) -> Result<Report, DescribeError> {
    describe(executor, database, EntityKind::View, options).await
}

pub async fn describe(
    executor: &dyn QueryExecutor,
    database: &str,
    kind: EntityKind,
    options: &DescribeOptions,
) -> Result<Report, DescribeError> {
    let span = tracing::info_span!("describe", database, kind = %kind);
    build_report(executor, database, kind, options)
        .instrument(span)
        .await
        .inspect_err(|e| {
            tracing::error!("Error describing {} for database {database}: {e}", kind.plural());
        })
}

async fn build_report(
    executor: &dyn QueryExecutor,
    database: &str,
    kind: EntityKind,
    options: &DescribeOptions,
) -> Result<Report, DescribeError> {
    tracing::info!("Describing {} for database {database}", kind.plural());
    let deadline = options.deadline.map(|budget| (Instant::now() + budget, budget));

    let schemas = pg::query_schemas(executor).await?;
    let listed = pg::query_entities(executor, kind).await?;
    tracing::debug!(
        "Found {} schemas and {} {}",
        schemas.len(),
        listed.len(),
        kind.plural()
    );

    let outcomes: Vec<EntityOutcome> = futures::stream::iter(listed)
        .map(|entity| async move {
            if let Some((at, budget)) = deadline {
                if Instant::now() >= at {
                    return Err(DescribeError::DeadlineExceeded(budget));
                }
            }
            Ok(assemble(executor, database, entity).await)
        })
        .buffered(options.concurrency.max(1))
        .try_collect()
        .await?;

    let mut entities = Vec::with_capacity(outcomes.len());
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            EntityOutcome::Assembled(record) => entities.push(record),
            EntityOutcome::Failed(failed) => {
                if options.failure_policy == FailurePolicy::Annotate {
                    skipped.push(failed);
                }
            }
        }
    }

    let report = Report::new(database, kind, schemas, entities, skipped);
    tracing::info!(
        "Described {} {} ({} skipped)",
        report.total(),
        kind.plural(),
        report.skipped().len()
    );
    Ok(report)
}

/// Assemble one entity, turning a collector failure into
/// [`EntityOutcome::Failed`] instead of an error.
pub async fn assemble(
    executor: &dyn QueryExecutor,
    database: &str,
    entity: ListedEntity,
) -> EntityOutcome {
    let schema = entity.schema().to_string();
    let name = entity.name().to_string();
    tracing::debug!("Assembling {schema}.{name}");

    match pg::assemble_entity(executor, entity).await {
        Ok(record) => EntityOutcome::Assembled(record),
        Err(e) => {
            tracing::error!(
                schema = %schema,
                entity = %name,
                error = %e,
                "Error getting schema for {database}.{schema}.{name}"
            );
            EntityOutcome::Failed(FailedEntity {
                schema,
                name,
                error: e.to_string(),
            })
        }
    }
}
