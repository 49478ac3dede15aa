use serde::{Deserialize, Serialize};

use super::datatype::NormalizedType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    ForeignKey,
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferentialAction {
    NoAction,
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub name: String,
    pub data_type: NormalizedType,
    pub native_type: String,
    pub nullable: bool,
    pub primary_key: bool,
    pub identity: bool,
    pub max_length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub default_value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaConstraint {
    pub name: String,
    pub kind: ConstraintKind,
    pub table: String,
    pub columns: Vec<String>,
    pub referenced_table: Option<String>,
    pub referenced_columns: Vec<String>,
    pub on_delete: Option<ReferentialAction>,
    pub on_update: Option<ReferentialAction>,
    pub check_expression: Option<String>,
}

impl SchemaConstraint {
    /// Invariant (§3): FK referenced-columns cardinality equals owning
    /// columns cardinality.
    #[must_use]
    pub fn has_consistent_fk_arity(&self) -> bool {
        self.kind != ConstraintKind::ForeignKey || self.columns.len() == self.referenced_columns.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaIndex {
    pub name: String,
    pub table: String,
    pub columns: Vec<String>,
    pub unique: bool,
    pub clustered: bool,
    pub filter_expression: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaTable {
    pub name: String,
    pub schema_namespace: String,
    pub columns: Vec<SchemaColumn>,
    pub indexes: Vec<SchemaIndex>,
    pub constraints: Vec<SchemaConstraint>,
}

impl SchemaTable {
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&SchemaColumn> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn primary_key(&self) -> Option<&SchemaConstraint> {
        self.constraints.iter().find(|c| c.kind == ConstraintKind::PrimaryKey)
    }

    /// Invariant (§3): at most one primary-key constraint; column names
    /// unique within table.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        let pk_count = self.constraints.iter().filter(|c| c.kind == ConstraintKind::PrimaryKey).count();
        if pk_count > 1 {
            return false;
        }
        let mut seen = std::collections::BTreeSet::new();
        self.columns.iter().all(|c| seen.insert(c.name.to_ascii_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaView {
    pub name: String,
    pub schema_namespace: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaProcedure {
    pub name: String,
    pub schema_namespace: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaFunction {
    pub name: String,
    pub schema_namespace: String,
    pub definition: String,
    pub return_type: Option<String>,
    pub parameters: Vec<String>,
}

/// Immutable snapshot of one database's structure. Produced by a provider
/// adapter's `introspect` (current schema) or the external target-schema
/// builder (target schema); nothing downstream mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSchema {
    pub provider: String,
    pub database_name: String,
    pub analyzed_at: String,
    pub tables: Vec<SchemaTable>,
    pub views: Vec<SchemaView>,
    pub indexes: Vec<SchemaIndex>,
    pub constraints: Vec<SchemaConstraint>,
    pub procedures: Vec<SchemaProcedure>,
    pub functions: Vec<SchemaFunction>,
}

impl DatabaseSchema {
    #[must_use]
    pub fn table(&self, schema_namespace: &str, name: &str) -> Option<&SchemaTable> {
        self.tables.iter().find(|t| {
            t.schema_namespace.eq_ignore_ascii_case(schema_namespace) && t.name.eq_ignore_ascii_case(name)
        })
    }

    #[must_use]
    pub fn empty(provider: impl Into<String>, database_name: impl Into<String>, analyzed_at: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            database_name: database_name.into(),
            analyzed_at: analyzed_at.into(),
            tables: Vec::new(),
            views: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
            procedures: Vec::new(),
            functions: Vec::new(),
        }
    }
}
