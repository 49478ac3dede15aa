use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Create,
    Alter,
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectKind {
    Table,
    Column,
    Constraint,
    Index,
    View,
    Procedure,
    Function,
    CustomScript,
}

/// Risk level is ordinal and aggregated by max (`Safe < Warning < Risky`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Safe,
    Warning,
    Risky,
}

impl RiskLevel {
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if other > self { other } else { self }
    }

    #[must_use]
    pub fn max_of<I: IntoIterator<Item = Self>>(levels: I) -> Self {
        levels.into_iter().fold(Self::Safe, Self::max)
    }
}

/// A single atomic schema mutation, the unit the differ emits and the
/// planner/executor consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaChange {
    pub operation: OperationKind,
    pub object_kind: ObjectKind,
    pub qualified_name: String,
    pub schema_namespace: String,
    pub description: String,
    pub risk_level: RiskLevel,
    pub properties: BTreeMap<String, String>,
    pub sql_command: String,
    pub rollback_sql: Option<String>,
    pub dependencies: Vec<String>,
}

impl SchemaChange {
    #[must_use]
    pub fn has_property(&self, key: &str) -> bool {
        self.properties.get(key).is_some_and(|v| v == "true")
    }

    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Decodes a JSON-encoded property, used by differ-populated changes to
    /// carry the full column/constraint/index/object definition an emitter
    /// needs to synthesize DDL, since `qualified_name`/`description` alone
    /// aren't enough to render a `CREATE TABLE` or `ALTER COLUMN`.
    #[must_use]
    pub fn decode_property<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.properties.get(key).and_then(|v| serde_json::from_str(v).ok())
    }

    pub fn set_json_property<T: serde::Serialize>(&mut self, key: impl Into<String>, value: &T) {
        if let Ok(json) = serde_json::to_string(value) {
            self.set_property(key, json);
        }
    }

    /// Splits `"table.member"` into `(table, member)` at the first dot, used
    /// to recover the owning table name from a column/index qualified name.
    #[must_use]
    pub fn split_qualified(qualified_name: &str) -> (&str, &str) {
        qualified_name.split_once('.').unwrap_or(("", qualified_name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub code: String,
    pub message: String,
    pub object_reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    pub code: String,
    pub message: String,
    pub object_reference: String,
    pub risk_level: Option<RiskLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub changes: Vec<SchemaChange>,
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub name: String,
    pub description: String,
    pub category: String,
    pub risk_level: RiskLevel,
    pub affected_objects: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub safe_count: usize,
    pub warning_count: usize,
    pub risky_count: usize,
    pub factors: Vec<RiskFactor>,
    pub overall_risk_level: RiskLevel,
    pub requires_approval: bool,
    pub requires_dual_approval: bool,
}

impl RiskAssessment {
    /// Maps to the §6 exit codes for a deployment that completed without
    /// error: 0=Safe, 1=Warning (single approver), 2=Risky (dual approval).
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self.overall_risk_level {
            RiskLevel::Safe => 0,
            RiskLevel::Warning => 1,
            RiskLevel::Risky => 2,
        }
    }
}
