use crate::{
    adapter::ProviderAdapter,
    config::{DeploymentConfig, RetryConfig},
    error::{Error, Result},
    model::{DeploymentPhase, DeploymentPlan, ObjectKind, RiskLevel},
};

/// Per-operation execution state (§4.6). Terminal states are `Committed`,
/// `Failed`, and `RolledBack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationState {
    Pending,
    Running,
    Committed,
    Retrying,
    Failed,
    RolledBack,
}

#[derive(Debug, Clone)]
pub struct PhaseResult {
    pub phase_number: u8,
    pub state: OperationState,
}

#[derive(Debug, Clone, Default)]
pub struct DeploymentResult {
    pub phase_results: Vec<PhaseResult>,
    pub rolled_back_phases: Vec<u8>,
    pub post_validation_passed: bool,
}

const NON_TRANSACTIONAL_MARKERS: [&str; 2] = ["CREATE_INDEX", "DROP_INDEX"];

fn phase_marker(phase: &DeploymentPhase) -> Option<&'static str> {
    if phase.operations.iter().all(|op| op.object_kind == ObjectKind::Index) && !phase.operations.is_empty() {
        Some(NON_TRANSACTIONAL_MARKERS[0])
    } else {
        None
    }
}

/// §4.6 step 3c: use a transaction iff the phase has >=2 ops, or the phase
/// risk is Risky, or the phase is not one of the backup/validation/index
/// phases that must run outside a transaction on most engines.
#[must_use]
pub fn should_use_transaction(phase: &DeploymentPhase) -> bool {
    if phase.operations.len() >= 2 {
        return true;
    }
    if phase.risk_level == RiskLevel::Risky {
        return true;
    }
    phase.number != 1 && phase.number != 2 && phase.number != 29 && phase_marker(phase).is_none()
}

pub struct Executor<'a> {
    adapter: &'a mut dyn ProviderAdapter,
    config: &'a DeploymentConfig,
}

impl<'a> Executor<'a> {
    #[must_use]
    pub fn new(adapter: &'a mut dyn ProviderAdapter, config: &'a DeploymentConfig) -> Self {
        Self { adapter, config }
    }

    /// §4.6 full flow: prerequisite + connection checks happen before this
    /// is called (the CLI owns them); this runs phases in order, retries
    /// per-operation, and triggers the rollback protocol on failure.
    #[tracing::instrument(skip_all, fields(phases = plan.phases.len()))]
    pub fn execute_plan(&mut self, plan: &DeploymentPlan) -> Result<DeploymentResult> {
        let mut result = DeploymentResult::default();
        let mut committed_phases: Vec<&DeploymentPhase> = Vec::new();

        for phase in &plan.phases {
            if phase.is_empty() {
                continue;
            }

            if phase.requires_approval && !self.config.approval_bypassed() {
                return Err(Error::RiskPolicy {
                    phase: phase.name.clone(),
                    reason: "phase requires approval and approval bypass is not enabled".to_string(),
                });
            }

            match self.execute_phase(phase) {
                Ok(()) => {
                    result.phase_results.push(PhaseResult { phase_number: phase.number, state: OperationState::Committed });
                    committed_phases.push(phase);
                }
                Err(err) => {
                    result.phase_results.push(PhaseResult { phase_number: phase.number, state: OperationState::Failed });
                    result.rolled_back_phases = self.rollback_committed(&committed_phases);
                    return Err(err);
                }
            }
        }

        result.post_validation_passed = self.adapter.test_connection();
        Ok(result)
    }

    fn execute_phase(&mut self, phase: &DeploymentPhase) -> Result<()> {
        let use_transaction = should_use_transaction(phase);
        if use_transaction {
            self.adapter.begin_transaction()?;
        }

        for op in &phase.operations {
            let max_attempts = if op.risk_level == RiskLevel::Safe { self.config.retry.retry_attempts.max(1) } else { 1 };
            let retry = self.config.retry;
            let sql = op.sql_command.clone();
            let result = crate::adapter::with_retry("execute operation", &retry, max_attempts, |_attempt| {
                self.adapter.execute(&sql).map(|_| ()).map_err(|e| (e.to_string(), None))
            });

            if let Err(err) = result {
                if use_transaction {
                    let _ = self.adapter.rollback();
                }
                return Err(err);
            }
        }

        if use_transaction {
            self.adapter.commit()?;
        }
        Ok(())
    }

    /// Rolls back successfully committed phases in reverse order, each in
    /// its own transaction, skipping phases where `can_rollback=false`.
    /// A rollback failure is logged and does not abort the remaining
    /// rollback attempts (§9 design note).
    fn rollback_committed(&mut self, committed_phases: &[&DeploymentPhase]) -> Vec<u8> {
        let mut rolled_back = Vec::new();

        for phase in committed_phases.iter().rev() {
            if !phase.can_rollback {
                tracing::warn!(phase = phase.number, "skipping rollback: phase has no rollback SQL");
                continue;
            }

            if let Err(err) = self.rollback_phase(phase) {
                tracing::error!(phase = phase.number, error = %err, "rollback failed for phase, continuing");
                continue;
            }
            rolled_back.push(phase.number);
        }

        rolled_back
    }

    fn rollback_phase(&mut self, phase: &DeploymentPhase) -> Result<()> {
        self.adapter.begin_transaction()?;
        for op in phase.operations.iter().rev() {
            let Some(rollback_sql) = &op.rollback_sql else {
                self.adapter.rollback()?;
                return Err(Error::Rollback { phase: phase.name.clone(), message: format!("operation `{}` has no rollback SQL", op.qualified_name) });
            };
            if let Err(err) = self.adapter.execute(rollback_sql) {
                let _ = self.adapter.rollback();
                return Err(Error::Rollback { phase: phase.name.clone(), message: err.to_string() });
            }
        }
        self.adapter.commit()
    }
}

#[must_use]
pub fn retry_backoff_secs(retry: &RetryConfig, attempt: u32) -> u32 {
    retry.retry_interval_sec * attempt
}
