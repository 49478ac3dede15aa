//! Core schema diff, risk assessment, planning, and execution contracts
//! shared by every provider dialect crate and the CLI.

pub mod adapter;
pub mod backup;
pub mod config;
pub mod diff;
pub mod emitter;
pub mod error;
pub mod executor;
pub mod model;
pub mod planner;
pub mod risk;
pub mod scripts;

pub use adapter::{
    BackupRequest, ConnectionStringBuilder, ProviderAdapter, QueryResult, QueryRow, TransientKind,
    classify_transient, with_retry,
};
pub use backup::{compute_backup_path, enforce_retention, has_content};
pub use config::{
    BackupConfig, ConnectionConfig, DeploymentConfig, Environment, OperationMode, ProviderKind,
    RetryConfig, ValidationLevel,
};
pub use diff::{DiffConfig, DiffEngine, find_cycles};
pub use emitter::{RenderedStatement, SqlEmitter, compile_scripts};
pub use error::{Error, Result};
pub use executor::{DeploymentResult, Executor, OperationState, PhaseResult, should_use_transaction};
pub use model::{
    CategoryCompatibility, ConstraintKind, CustomScript, DatabaseSchema, DeploymentPhase,
    DeploymentPlan, NormalizedType, ObjectKind, OperationKind, ReferentialAction, RiskAssessment,
    RiskFactor, RiskLevel, SchemaChange, SchemaColumn, SchemaConstraint, SchemaFunction,
    SchemaIndex, SchemaProcedure, SchemaTable, SchemaView, ScriptKind, TypeCategory,
    ValidationError, ValidationResult, ValidationWarning, category_compatibility,
};
pub use planner::{PHASE_NAMES, Planner, phase_for};
pub use risk::assess;
pub use scripts::{
    find_script_cycles, ingest_directory, parse_script, provider_incompatibilities,
    scripts_to_changes, validate_script,
};
