use serde::{Deserialize, Serialize};

use super::change::RiskLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScriptKind {
    Ddl,
    Dml,
    Procedure,
    Function,
    View,
    Index,
    Trigger,
    Data,
    Migration,
    Custom,
}

impl ScriptKind {
    /// Default phase placement (§4.4) when a script declares no explicit
    /// phase-pinning header.
    #[must_use]
    pub fn default_phase(self) -> u8 {
        match self {
            Self::Ddl => 16,
            Self::Dml => 22,
            Self::Data => 24,
            Self::Migration => 28,
            Self::Procedure | Self::Function => 28,
            Self::View => 27,
            Self::Index => 24,
            Self::Trigger => 12,
            Self::Custom => 22,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomScript {
    pub file_path: String,
    pub name: String,
    pub kind: ScriptKind,
    pub content: String,
    pub risk_level: RiskLevel,
    pub execution_order: i64,
    pub transactional: bool,
    pub retryable: bool,
    pub dependencies: Vec<String>,
    pub rollback_script: Option<String>,
    pub schema_namespace: Option<String>,
    pub pinned_phase: Option<u8>,
}

impl CustomScript {
    #[must_use]
    pub fn target_phase(&self) -> u8 {
        self.pinned_phase.unwrap_or_else(|| self.kind.default_phase())
    }
}
