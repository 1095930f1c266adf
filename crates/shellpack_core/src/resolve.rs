//! Topological sort of the enabled packages into a load order.

use std::collections::{HashMap, VecDeque};

use itertools::Itertools;
use tracing::warn;

use crate::package::split_dependency;
use crate::registry::{PackageFilter, Registry};

/// The dependency graph contains a cycle. Everything still on a cycle after
/// the sort is listed, so the user sees the whole knot at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleError {
    pub nodes: Vec<String>,
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dependency cycle between packages: {}",
            self.nodes.iter().join(", ")
        )
    }
}

impl std::error::Error for CycleError {}

/// Compute a total order in which every dependency precedes its dependents.
///
/// Deterministic for a fixed registry: the initial zero-in-degree set is
/// processed in lexicographic name order and nodes are appended as their
/// in-degree drops to zero. An unsatisfied version constraint or an
/// undeclared dependency only warns; the edge is dropped and the dependent
/// still appears in the order.
pub fn resolve(registry: &Registry) -> Result<Vec<String>, CycleError> {
    let nodes = registry.names(PackageFilter::Enabled);

    // Forward adjacency (dependency -> dependents) and in-degrees, so a
    // finished node can release its dependents in O(1) per edge.
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = nodes.iter().map(|n| (n.as_str(), 0)).collect();

    for name in &nodes {
        let Some((_, config)) = registry.lookup(name) else {
            continue;
        };
        for spec in &config.depends {
            let (dependency, constraint) = split_dependency(spec);
            if let Some(want) = constraint {
                check_constraint(registry, name, dependency, want);
            }
            let enabled = registry
                .lookup(dependency)
                .is_some_and(|(package, _)| !package.disabled);
            if !enabled {
                warn!("{name} depends on {dependency}, which is not declared; ignoring");
                continue;
            }
            dependents.entry(dependency).or_default().push(name);
            *in_degree.get_mut(name.as_str()).expect("node is registered") += 1;
        }
    }

    let mut queue: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| *name)
        .sorted()
        .collect();

    let mut order = Vec::with_capacity(nodes.len());
    while let Some(name) = queue.pop_front() {
        order.push(name.to_string());
        for dependent in dependents.get(name).into_iter().flatten() {
            let degree = in_degree.get_mut(dependent).expect("node is registered");
            *degree -= 1;
            if *degree == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() < nodes.len() {
        let nodes = in_degree
            .iter()
            .filter(|(_, degree)| **degree > 0)
            .map(|(name, _)| name.to_string())
            .sorted()
            .collect();
        return Err(CycleError { nodes });
    }
    Ok(order)
}

/// Constraints are advisory: a mismatch against the declared tag warns but
/// never blocks resolution.
fn check_constraint(registry: &Registry, dependent: &str, dependency: &str, want: &str) {
    let Some((package, _)) = registry.lookup(dependency) else {
        return;
    };
    if let Some(tag) = package.ref_spec.tag()
        && tag != want
    {
        warn!("{dependent} depends on {dependency}@{want} but {dependency} is declared with tag={tag}");
    }
}
