use std::collections::{BTreeMap, BTreeSet};

use crate::model::{
    CustomScript, DeploymentPhase, DeploymentPlan, ObjectKind, OperationKind, RiskLevel,
    SchemaChange,
};

/// Fixed 29-phase names, in order. `PHASE_NAMES[0]` is phase 1.
pub const PHASE_NAMES: [&str; 29] = [
    "Pre-deployment Validation",
    "Database Backup",
    "Drop Views",
    "Drop Procedures",
    "Drop Functions",
    "Drop Foreign Keys",
    "Drop Check Constraints",
    "Drop Unique Constraints",
    "Drop Non-Clustered Indexes",
    "Drop Clustered Indexes",
    "Drop Primary Keys",
    "Drop Triggers",
    "Drop Columns",
    "Drop Tables",
    "Create Tables",
    "Add Columns",
    "Alter Column Types",
    "Alter Nullability",
    "Alter Defaults",
    "Create Primary Keys",
    "Create Unique Constraints",
    "Create Check Constraints",
    "Create Clustered Indexes",
    "Create Non-Clustered Indexes",
    "Create Unique Indexes",
    "Create Foreign Keys",
    "Create Views",
    "Create Procedures & Functions",
    "Post-deployment Validation",
];

const TOTAL_PHASES: u8 = 29;

/// Assigns a fixed-sequence change to its phase number (1-indexed), per the
/// §6 filter table. Synthetic phases (1, 2, 29) are populated by the
/// executor, not by differ-produced changes, so they never match here.
#[must_use]
pub fn phase_for(change: &SchemaChange) -> u8 {
    use ObjectKind::{Column, Constraint, CustomScript as CustomScriptKind, Function, Index, Procedure, Table, View};
    use OperationKind::{Alter, Create, Drop};

    match (change.operation, change.object_kind) {
        (Drop, View) => 3,
        (Drop, Procedure) => 4,
        (Drop, Function) => 5,
        (Drop, Constraint) => match change.property("constraint_type") {
            Some("FK") => 6,
            Some("CK") => 7,
            Some("UQ") => 8,
            Some("PK") => 11,
            _ => 8,
        },
        (Drop, Index) => {
            if change.has_property("is_clustered") { 10 } else { 9 }
        }
        (Alter, Column) if change.property("change_type") == Some("drop") => 13,
        (Drop, Table) => 14,
        (Create, Table) => 15,
        (Alter, Column) if change.property("change_type") == Some("add") => 16,
        (Alter, Column) if change.property("change_type") == Some("type_change") => 17,
        (Alter, Column) if change.property("change_type") == Some("nullability") => 18,
        (Alter, Column) if change.property("change_type") == Some("default") => 19,
        (Create, Constraint) => match change.property("constraint_type") {
            Some("PK") => 20,
            Some("UQ") => 21,
            Some("CK") => 22,
            Some("FK") => 26,
            _ => 22,
        },
        (Create, Index) => {
            if change.has_property("is_clustered") {
                23
            } else if change.has_property("is_unique") && change.property("is_unique") == Some("true") {
                25
            } else {
                24
            }
        }
        (Create, View) => 27,
        (_, Procedure | Function) => 28,
        (_, CustomScriptKind) => 22,
        _ => 22,
    }
}

#[derive(Debug, Default)]
pub struct Planner;

impl Planner {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Builds the fixed 29-phase plan from a differ-produced change list and
    /// custom-script operations (§4.4). Phases with no operations are kept
    /// for observability and skipped at execution.
    #[must_use]
    #[tracing::instrument(skip_all, fields(changes = changes.len(), scripts = scripts.len()))]
    pub fn build(&self, changes: Vec<SchemaChange>, scripts: &[CustomScript]) -> DeploymentPlan {
        let mut buckets: Vec<Vec<SchemaChange>> = (0..TOTAL_PHASES).map(|_| Vec::new()).collect();

        for change in changes {
            let phase = phase_for(&change);
            buckets[(phase - 1) as usize].push(change);
        }

        for script in scripts {
            let phase = script.target_phase().clamp(1, TOTAL_PHASES);
            buckets[(phase - 1) as usize].push(custom_script_change(script));
        }

        let phases = buckets
            .into_iter()
            .enumerate()
            .map(|(index, ops)| build_phase(index as u8 + 1, ops))
            .collect();

        DeploymentPlan { phases }
    }
}

fn custom_script_change(script: &CustomScript) -> SchemaChange {
    let mut change = SchemaChange {
        operation: OperationKind::Create,
        object_kind: ObjectKind::CustomScript,
        qualified_name: script.name.clone(),
        schema_namespace: script.schema_namespace.clone().unwrap_or_default(),
        description: format!("custom script `{}`", script.name),
        risk_level: script.risk_level,
        properties: BTreeMap::new(),
        sql_command: script.content.clone(),
        rollback_sql: script.rollback_script.clone(),
        dependencies: script.dependencies.clone(),
    };
    change.set_property("transactional", script.transactional.to_string());
    change.set_property("retryable", script.retryable.to_string());
    change
}

fn build_phase(number: u8, mut ops: Vec<SchemaChange>) -> DeploymentPhase {
    ops = topological_sort(ops);
    let risk_level = RiskLevel::max_of(ops.iter().map(|o| o.risk_level));
    let has_destructive_op = ops.iter().any(|o| o.operation == OperationKind::Drop);
    let requires_approval = risk_level >= RiskLevel::Warning || has_destructive_op;
    let can_rollback = !ops.is_empty() && ops.iter().all(|o| o.rollback_sql.is_some());

    DeploymentPhase {
        number,
        name: PHASE_NAMES[(number - 1) as usize].to_string(),
        operations: ops,
        risk_level,
        requires_approval,
        can_rollback,
    }
}

/// Orders operations within a phase by Kahn's algorithm over
/// `change.dependencies` restricted to objects present in this bucket,
/// breaking ties by object name so output is deterministic (§4.4 step 1-2).
fn topological_sort(ops: Vec<SchemaChange>) -> Vec<SchemaChange> {
    let names: BTreeSet<&str> = ops.iter().map(|o| o.qualified_name.as_str()).collect();
    let mut indegree: BTreeMap<String, usize> = ops.iter().map(|o| (o.qualified_name.clone(), 0)).collect();
    let mut dependents: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for op in &ops {
        for dep in &op.dependencies {
            if names.contains(dep.as_str()) {
                *indegree.get_mut(&op.qualified_name).unwrap() += 1;
                dependents.entry(dep.clone()).or_default().push(op.qualified_name.clone());
            }
        }
    }

    let mut by_name: BTreeMap<String, SchemaChange> = ops.into_iter().map(|o| (o.qualified_name.clone(), o)).collect();
    let mut ready: BTreeSet<String> = indegree.iter().filter(|&(_, &d)| d == 0).map(|(n, _)| n.clone()).collect();
    let mut ordered = Vec::with_capacity(by_name.len());

    while let Some(name) = ready.iter().next().cloned() {
        ready.remove(&name);
        if let Some(op) = by_name.remove(&name) {
            if let Some(next) = dependents.get(&name) {
                for dependent in next {
                    if let Some(d) = indegree.get_mut(dependent) {
                        *d -= 1;
                        if *d == 0 {
                            ready.insert(dependent.clone());
                        }
                    }
                }
            }
            ordered.push(op);
        }
    }

    // Any remaining entries are part of a cycle the validator should already
    // have rejected; append them in name order so no operation is dropped.
    for (_, op) in by_name {
        ordered.push(op);
    }

    ordered
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::ObjectKind;

    fn change(operation: OperationKind, object_kind: ObjectKind, name: &str, deps: &[&str]) -> SchemaChange {
        SchemaChange {
            operation,
            object_kind,
            qualified_name: name.to_string(),
            schema_namespace: "dbo".to_string(),
            description: String::new(),
            risk_level: RiskLevel::Safe,
            properties: BTreeMap::new(),
            sql_command: String::new(),
            rollback_sql: None,
            dependencies: deps.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn create_table_lands_in_phase_15() {
        let c = change(OperationKind::Create, ObjectKind::Table, "orders", &[]);
        assert_eq!(phase_for(&c), 15);
    }

    #[test]
    fn drop_view_lands_before_create_table() {
        let drop_view = change(OperationKind::Drop, ObjectKind::View, "v_orders", &[]);
        assert_eq!(phase_for(&drop_view), 3);
        assert!(phase_for(&drop_view) < phase_for(&change(OperationKind::Create, ObjectKind::Table, "orders", &[])));
    }

    #[test]
    fn build_assigns_every_change_to_exactly_one_phase() {
        let changes = vec![
            change(OperationKind::Create, ObjectKind::Table, "orders", &[]),
            change(OperationKind::Drop, ObjectKind::View, "v_orders", &[]),
        ];
        let plan = Planner::new().build(changes, &[]);
        assert_eq!(plan.total_operations(), 2);
        assert_eq!(plan.phases.len(), 29);
    }

    #[test]
    fn topological_sort_orders_dependencies_first() {
        let ops = vec![
            change(OperationKind::Create, ObjectKind::Table, "orders", &["customers"]),
            change(OperationKind::Create, ObjectKind::Table, "customers", &[]),
        ];
        let sorted = topological_sort(ops);
        let positions: Vec<&str> = sorted.iter().map(|o| o.qualified_name.as_str()).collect();
        assert_eq!(positions, vec!["customers", "orders"]);
    }
}
