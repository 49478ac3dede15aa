use serde::{Deserialize, Serialize};

use super::change::{RiskLevel, SchemaChange};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPhase {
    pub number: u8,
    pub name: String,
    pub operations: Vec<SchemaChange>,
    pub risk_level: RiskLevel,
    pub requires_approval: bool,
    pub can_rollback: bool,
}

impl DeploymentPhase {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeploymentPlan {
    pub phases: Vec<DeploymentPhase>,
}

impl DeploymentPlan {
    #[must_use]
    pub fn non_empty_phases(&self) -> impl Iterator<Item = &DeploymentPhase> {
        self.phases.iter().filter(|p| !p.is_empty())
    }

    #[must_use]
    pub fn total_operations(&self) -> usize {
        self.phases.iter().map(|p| p.operations.len()).sum()
    }
}
