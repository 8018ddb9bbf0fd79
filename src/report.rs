use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Which kind of entity a report describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Table,
    View,
}

impl EntityKind {
    /// Key under which the entity list is serialized.
    pub fn plural(&self) -> &'static str {
        match self {
            EntityKind::Table => "tables",
            EntityKind::View => "views",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Table => f.write_str("table"),
            EntityKind::View => f.write_str("view"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaKind {
    User,
    System,
}

/// A namespace in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    pub name: String,
    pub owner: String,
    pub kind: SchemaKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    /// Catalog ordinal; starts at 1, may have gaps left by dropped columns.
    pub position: i64,
    pub comment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_precision: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric_scale: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConstraintKind {
    #[serde(rename = "PRIMARY KEY")]
    PrimaryKey,
    #[serde(rename = "FOREIGN KEY")]
    ForeignKey,
    #[serde(rename = "UNIQUE")]
    Unique,
    #[serde(rename = "CHECK")]
    Check,
}

impl ConstraintKind {
    /// Parse the `information_schema.table_constraints.constraint_type` label.
    pub fn from_catalog(label: &str) -> Option<Self> {
        match label {
            "PRIMARY KEY" => Some(ConstraintKind::PrimaryKey),
            "FOREIGN KEY" => Some(ConstraintKind::ForeignKey),
            "UNIQUE" => Some(ConstraintKind::Unique),
            "CHECK" => Some(ConstraintKind::Check),
            _ => None,
        }
    }
}

/// Target of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyReference {
    pub schema: String,
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstraintDescriptor {
    pub name: String,
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<ForeignKeyReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub check_clause: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub definition: String,
    pub size: String,
    pub is_unique: bool,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Table,
    View,
    #[serde(rename = "materialized view")]
    MaterializedView,
    Unknown,
}

impl DependencyKind {
    /// Map a `pg_class.relkind` code.
    pub fn from_relkind(code: &str) -> Self {
        match code {
            "r" => DependencyKind::Table,
            "v" => DependencyKind::View,
            "m" => DependencyKind::MaterializedView,
            _ => DependencyKind::Unknown,
        }
    }
}

/// A base relation a view reads from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyDescriptor {
    pub schema: String,
    pub name: String,
    pub kind: DependencyKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRecord {
    pub schema: String,
    pub name: String,
    pub comment: Option<String>,
    /// Human-readable total relation size (table, indexes and TOAST).
    pub size: String,
    /// Planner estimate from `pg_class.reltuples`, not a live count. May be
    /// stale, and is `-1` on recent servers for tables never analyzed.
    pub estimated_rows: i64,
    pub columns: Vec<ColumnDescriptor>,
    pub constraints: Vec<ConstraintDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewRecord {
    pub schema: String,
    pub name: String,
    pub comment: Option<String>,
    /// `None` when the catalog withholds the query text from the current role.
    pub definition: Option<String>,
    pub columns: Vec<ColumnDescriptor>,
    pub dependencies: Vec<DependencyDescriptor>,
}

/// One fully described table or view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EntityRecord {
    Table(TableRecord),
    View(ViewRecord),
}

impl EntityRecord {
    pub fn schema(&self) -> &str {
        match self {
            EntityRecord::Table(t) => &t.schema,
            EntityRecord::View(v) => &v.schema,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            EntityRecord::Table(t) => &t.name,
            EntityRecord::View(v) => &v.name,
        }
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        match self {
            EntityRecord::Table(t) => &t.columns,
            EntityRecord::View(v) => &v.columns,
        }
    }
}

/// An entity whose collection failed and was left out of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEntity {
    pub schema: String,
    pub name: String,
    pub error: String,
}

/// The structural snapshot returned by one `describe_*` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    database: String,
    kind: EntityKind,
    schemas: Vec<Schema>,
    entities: Vec<EntityRecord>,
    skipped: Vec<FailedEntity>,
}

impl Report {
    pub fn new(
        database: impl Into<String>,
        kind: EntityKind,
        schemas: Vec<Schema>,
        entities: Vec<EntityRecord>,
        skipped: Vec<FailedEntity>,
    ) -> Self {
        Self {
            database: database.into(),
            kind,
            schemas,
            entities,
            skipped,
        }
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn schemas(&self) -> &[Schema] {
        &self.schemas
    }

    pub fn entities(&self) -> &[EntityRecord] {
        &self.entities
    }

    pub fn skipped(&self) -> &[FailedEntity] {
        &self.skipped
    }

    /// Always the length of the entity list actually produced.
    pub fn total(&self) -> usize {
        self.entities.len()
    }
}

impl Serialize for Report {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.skipped.is_empty() { 4 } else { 5 };
        let mut state = serializer.serialize_struct("Report", fields)?;
        state.serialize_field("database", &self.database)?;
        state.serialize_field("schemas", &self.schemas)?;
        match self.kind {
            EntityKind::Table => state.serialize_field("tables", &self.entities)?,
            EntityKind::View => state.serialize_field("views", &self.entities)?,
        }
        state.serialize_field("total", &self.total())?;
        if self.skipped.is_empty() {
            state.skip_field("skipped")?;
        } else {
            state.serialize_field("skipped", &self.skipped)?;
        }
        state.end()
    }
}
