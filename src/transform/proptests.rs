//! Property-based tests for transform ordering.

use super::scheduler::sort;
use super::transformer::{FnTransformer, TransformResult, Transformer};
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::Arc;

/// A random ordering problem over transforms `t0..tn`.
///
/// `edges` only go from a lower to a higher label so the declared order is
/// acyclic; `conflicts` add the reverse of some pairs. Transforms are
/// declared in `declared` order.
#[derive(Debug, Clone)]
struct Problem {
    edges: BTreeSet<(usize, usize)>,
    conflicts: BTreeSet<(usize, usize)>,
    deferred: Vec<bool>,
    declared: Vec<usize>,
}

impl Problem {
    fn transforms(&self) -> Vec<Arc<dyn Transformer>> {
        self.declared
            .iter()
            .map(|&label| {
                let mut pass = FnTransformer::new(format!("t{}", label), |_| {
                    TransformResult::Unchanged
                });
                for &(a, b) in self.edges.iter().chain(&self.conflicts) {
                    if a == label {
                        pass = pass.runs_before(format!("t{}", b));
                    }
                }
                if self.deferred[label] {
                    pass = pass.after_compile_only();
                }
                Arc::new(pass) as Arc<dyn Transformer>
            })
            .collect()
    }

    fn conflicting(&self, a: usize, b: usize) -> bool {
        self.conflicts.contains(&(b, a))
    }
}

fn problem_strategy() -> impl Strategy<Value = Problem> {
    (1usize..8).prop_flat_map(|n| {
        let pairs = prop::collection::btree_set((0..n, 0..n), 0..(n * 2));
        let flips = prop::collection::btree_set((0..n, 0..n), 0..n);
        let deferred = prop::collection::vec(prop::bool::weighted(0.2), n);
        let declared = Just((0..n).collect::<Vec<_>>()).prop_shuffle();
        (pairs, flips, deferred, declared).prop_map(|(pairs, flips, deferred, declared)| {
            let edges: BTreeSet<(usize, usize)> = pairs
                .into_iter()
                .filter(|(a, b)| a < b)
                .collect();
            let conflicts = flips
                .into_iter()
                .filter(|(a, b)| a > b && edges.contains(&(*b, *a)))
                .collect();
            Problem {
                edges,
                conflicts,
                deferred,
                declared,
            }
        })
    })
}

fn position(order: &[Arc<dyn Transformer>], label: usize) -> usize {
    let name = format!("t{}", label);
    order
        .iter()
        .position(|t| t.name() == name)
        .unwrap_or(usize::MAX)
}

proptest! {
    #[test]
    fn prop_sort_is_a_permutation(problem in problem_strategy()) {
        let transforms = problem.transforms();
        let order = sort(&transforms).unwrap();

        let mut expected: Vec<&str> = transforms.iter().map(|t| t.name()).collect();
        let mut actual: Vec<&str> = order.iter().map(|t| t.name()).collect();
        expected.sort_unstable();
        actual.sort_unstable();
        prop_assert_eq!(expected, actual);
    }

    #[test]
    fn prop_non_conflicting_edges_are_respected(problem in problem_strategy()) {
        let order = sort(&problem.transforms()).unwrap();
        for &(a, b) in &problem.edges {
            if problem.deferred[a] || problem.deferred[b] || problem.conflicting(a, b) {
                continue;
            }
            prop_assert!(
                position(&order, a) < position(&order, b),
                "t{} should run before t{}", a, b
            );
        }
    }

    #[test]
    fn prop_after_compile_last_in_declaration_order(problem in problem_strategy()) {
        let order = sort(&problem.transforms()).unwrap();
        let ordinary = problem.deferred.iter().filter(|d| !**d).count();

        let tail: Vec<&str> = order[ordinary..].iter().map(|t| t.name()).collect();
        let expected: Vec<String> = problem
            .declared
            .iter()
            .filter(|&&label| problem.deferred[label])
            .map(|label| format!("t{}", label))
            .collect();
        prop_assert_eq!(tail, expected);
        prop_assert!(order[..ordinary].iter().all(|t| !t.after_compile()));
    }
}
