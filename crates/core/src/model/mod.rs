mod change;
mod datatype;
mod plan;
mod schema;
mod script;

pub use change::{
    ObjectKind, OperationKind, RiskAssessment, RiskFactor, RiskLevel, SchemaChange,
    ValidationError, ValidationResult, ValidationWarning,
};
pub use datatype::{CategoryCompatibility, NormalizedType, TypeCategory, category_compatibility};
pub use plan::{DeploymentPhase, DeploymentPlan};
pub use schema::{
    ConstraintKind, DatabaseSchema, ReferentialAction, SchemaColumn, SchemaConstraint,
    SchemaFunction, SchemaIndex, SchemaProcedure, SchemaTable, SchemaView,
};
pub use script::{CustomScript, ScriptKind};
