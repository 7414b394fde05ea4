//! Ordering of transforms.
//!
//! Provides:
//! - Edge derivation from the pairwise `before`/`after` predicates
//! - Conflict removal (a pair ordered both ways is left unordered)
//! - Topological sorting (Kahn's algorithm, stable on declaration order)
//! - Placement of after-compile passes at the end

use crate::core::error::{ScheduleError, ScheduleResult};
use crate::transform::transformer::Transformer;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap};
use std::sync::Arc;

/// Edges `(a, b)` meaning "transform `a` runs before transform `b`", by index
/// into `transforms`, with conflicting pairs removed.
pub fn ordering_edges(transforms: &[Arc<dyn Transformer>]) -> BTreeSet<(usize, usize)> {
    let mut edges = BTreeSet::new();
    for (i, a) in transforms.iter().enumerate() {
        for (j, b) in transforms.iter().enumerate() {
            if i != j && (a.before(b.as_ref()) || b.after(a.as_ref())) {
                edges.insert((i, j));
            }
        }
    }

    let conflicts: Vec<(usize, usize)> = edges
        .iter()
        .filter(|&&(a, b)| edges.contains(&(b, a)))
        .copied()
        .collect();
    for (a, b) in conflicts {
        if a < b {
            log::debug!(
                "dropping conflicting order between {} and {}",
                transforms[a].name(),
                transforms[b].name()
            );
        }
        edges.remove(&(a, b));
    }

    edges
}

/// Order `transforms` for execution.
///
/// Ordinary transforms are sorted topologically; among transforms that are
/// ready at the same time the one declared first runs first. After-compile
/// transforms follow, in declaration order.
pub fn sort(transforms: &[Arc<dyn Transformer>]) -> ScheduleResult<Vec<Arc<dyn Transformer>>> {
    let (deferred, ordinary): (Vec<_>, Vec<_>) = transforms
        .iter()
        .cloned()
        .partition(|t| t.after_compile());

    let edges = ordering_edges(&ordinary);

    let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(ordinary.len(), edges.len());
    let nodes: Vec<NodeIndex> = (0..ordinary.len()).map(|i| graph.add_node(i)).collect();
    for &(a, b) in &edges {
        graph.add_edge(nodes[a], nodes[b], ());
    }

    let mut in_degree: Vec<usize> = nodes
        .iter()
        .map(|&n| graph.neighbors_directed(n, Direction::Incoming).count())
        .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &degree)| degree == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(transforms.len());
    while let Some(Reverse(i)) = ready.pop() {
        order.push(Arc::clone(&ordinary[i]));
        for neighbor in graph.neighbors_directed(nodes[i], Direction::Outgoing) {
            let j = graph[neighbor];
            in_degree[j] -= 1;
            if in_degree[j] == 0 {
                ready.push(Reverse(j));
            }
        }
    }

    if order.len() != ordinary.len() {
        let remaining: Vec<String> = in_degree
            .iter()
            .enumerate()
            .filter(|&(_, &degree)| degree > 0)
            .map(|(i, _)| ordinary[i].name().to_string())
            .collect();
        return Err(ScheduleError::CycleDetected {
            transforms: remaining,
        });
    }

    order.extend(deferred);
    log::debug!(
        "transform order: {:?}",
        order.iter().map(|t| t.name()).collect::<Vec<_>>()
    );
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transformer::{FnTransformer, TransformResult};

    fn pass(name: &str) -> FnTransformer {
        FnTransformer::new(name, |_| TransformResult::Unchanged)
    }

    fn shared(passes: Vec<FnTransformer>) -> Vec<Arc<dyn Transformer>> {
        passes
            .into_iter()
            .map(|p| Arc::new(p) as Arc<dyn Transformer>)
            .collect()
    }

    fn names(order: &[Arc<dyn Transformer>]) -> Vec<&str> {
        order.iter().map(|t| t.name()).collect()
    }

    #[test]
    fn test_chain_with_after_compile_last() {
        // declared out of order on purpose
        let transforms = shared(vec![
            pass("z").after_compile_only(),
            pass("y").runs_before("z"),
            pass("x").runs_before("y"),
        ]);
        let order = sort(&transforms).unwrap();
        assert_eq!(names(&order), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_after_predicate_creates_edge() {
        let transforms = shared(vec![pass("b").runs_after("a"), pass("a")]);
        assert_eq!(names(&sort(&transforms).unwrap()), vec!["a", "b"]);
    }

    #[test]
    fn test_conflicting_pair_is_dropped() {
        let transforms = shared(vec![
            pass("p").runs_before("q"),
            pass("q").runs_before("p"),
        ]);
        assert!(ordering_edges(&transforms).is_empty());

        let order = sort(&transforms).unwrap();
        let order = names(&order);
        assert!(order == vec!["p", "q"] || order == vec!["q", "p"]);
    }

    #[test]
    fn test_conflict_via_before_and_after() {
        let transforms = shared(vec![pass("p").runs_after("q"), pass("q").runs_after("p")]);
        assert!(ordering_edges(&transforms).is_empty());
        assert_eq!(sort(&transforms).unwrap().len(), 2);
    }

    #[test]
    fn test_unconstrained_keep_declaration_order() {
        let transforms = shared(vec![pass("c"), pass("a"), pass("b")]);
        assert_eq!(names(&sort(&transforms).unwrap()), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let transforms = shared(vec![
            pass("a").runs_before("b"),
            pass("b").runs_before("c"),
            pass("c").runs_before("a"),
            pass("free"),
        ]);
        match sort(&transforms) {
            Err(ScheduleError::CycleDetected { transforms }) => {
                assert_eq!(transforms, vec!["a", "b", "c"]);
            }
            Ok(order) => panic!("expected a cycle, got {:?}", names(&order)),
        }
    }

    #[test]
    fn test_after_compile_keep_relative_order() {
        let transforms = shared(vec![
            pass("verify_b").after_compile_only(),
            pass("main"),
            pass("verify_a").after_compile_only().runs_before("main"),
        ]);
        assert_eq!(
            names(&sort(&transforms).unwrap()),
            vec!["main", "verify_b", "verify_a"]
        );
    }
}
