use std::collections::{BTreeMap, BTreeSet};

use crate::model::SchemaChange;

/// Builds an adjacency map from `change.dependencies` (edges point from a
/// change to the objects it requires to exist first) and walks it with DFS
/// plus a recursion set, the portable way to find cycles without pointer
/// graphs (§9 design note).
#[must_use]
pub fn find_cycles(changes: &[SchemaChange]) -> Vec<Vec<String>> {
    let mut adjacency: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for change in changes {
        let entry = adjacency.entry(change.qualified_name.as_str()).or_default();
        for dep in &change.dependencies {
            entry.push(dep.as_str());
        }
    }

    let mut visited = BTreeSet::new();
    let mut cycles = Vec::new();

    for &node in adjacency.keys() {
        if !visited.contains(node) {
            let mut stack = Vec::new();
            let mut on_stack = BTreeSet::new();
            walk(node, &adjacency, &mut visited, &mut on_stack, &mut stack, &mut cycles);
        }
    }

    cycles
}

fn walk<'a>(
    node: &'a str,
    adjacency: &BTreeMap<&'a str, Vec<&'a str>>,
    visited: &mut BTreeSet<&'a str>,
    on_stack: &mut BTreeSet<&'a str>,
    stack: &mut Vec<&'a str>,
    cycles: &mut Vec<Vec<String>>,
) {
    visited.insert(node);
    on_stack.insert(node);
    stack.push(node);

    if let Some(neighbors) = adjacency.get(node) {
        for &neighbor in neighbors {
            if on_stack.contains(neighbor) {
                let start = stack.iter().position(|n| *n == neighbor).unwrap_or(0);
                let mut cycle: Vec<String> = stack[start..].iter().map(|s| (*s).to_string()).collect();
                cycle.push(neighbor.to_string());
                cycles.push(cycle);
            } else if !visited.contains(neighbor) {
                walk(neighbor, adjacency, visited, on_stack, stack, cycles);
            }
        }
    }

    stack.pop();
    on_stack.remove(node);
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::{ObjectKind, OperationKind, RiskLevel};

    fn change(name: &str, deps: &[&str]) -> SchemaChange {
        SchemaChange {
            operation: OperationKind::Create,
            object_kind: ObjectKind::Table,
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
    fn no_cycle_for_acyclic_graph() {
        let changes = vec![change("a", &["b"]), change("b", &[])];
        assert!(find_cycles(&changes).is_empty());
    }

    #[test]
    fn detects_direct_cycle() {
        let changes = vec![change("a", &["b"]), change("b", &["a"])];
        assert!(!find_cycles(&changes).is_empty());
    }

    #[test]
    fn detects_self_cycle() {
        let changes = vec![change("a", &["a"])];
        assert!(!find_cycles(&changes).is_empty());
    }
}
