//! Property-based tests for clause folding and any-match using proptest.

use proptest::prelude::*;
use sifter::{
    apply_to_slice, compile_clause, compile_where, ArgumentOptions, ClauseNode, Comparison,
    Connector, Hooks, OrderKey, QueryArguments, Queryable,
};

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone, Queryable)]
struct Part {
    #[query(Scalar)]
    weight: i64,
}

#[derive(Debug, Clone, Queryable)]
struct Bin {
    #[query(Scalar)]
    label: String,
    #[query(Scalar)]
    weight: i64,
    #[query(List)]
    parts: Vec<Part>,
}

fn bin_strategy() -> impl Strategy<Value = Bin> {
    (
        "[a-c]{0,4}",
        -50i64..50,
        prop::collection::vec(-50i64..50, 0..5),
    )
        .prop_map(|(label, weight, parts)| Bin {
            label,
            weight,
            parts: parts.into_iter().map(|weight| Part { weight }).collect(),
        })
}

/// A leaf clause on `weight` and the plain Rust test it stands for.
#[derive(Debug, Clone)]
struct Leaf {
    comparison: Comparison,
    operand: i64,
}

impl Leaf {
    fn node(&self, connector: Connector) -> ClauseNode {
        ClauseNode::leaf("weight", self.comparison, [self.operand.to_string()])
            .with_connector(connector)
    }

    fn eval(&self, weight: i64) -> bool {
        match self.comparison {
            Comparison::Equal => weight == self.operand,
            Comparison::NotEqual => weight != self.operand,
            Comparison::GreaterThan => weight > self.operand,
            Comparison::GreaterThanOrEqual => weight >= self.operand,
            Comparison::LessThan => weight < self.operand,
            _ => weight <= self.operand,
        }
    }
}

fn leaf_strategy() -> impl Strategy<Value = Leaf> {
    (
        prop_oneof![
            Just(Comparison::Equal),
            Just(Comparison::NotEqual),
            Just(Comparison::GreaterThan),
            Just(Comparison::GreaterThanOrEqual),
            Just(Comparison::LessThan),
            Just(Comparison::LessThanOrEqual),
        ],
        -50i64..50,
    )
        .prop_map(|(comparison, operand)| Leaf {
            comparison,
            operand,
        })
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// All-AND sequences fold to a conjunction, all-OR to a disjunction.
    #[test]
    fn uniform_connectors_fold(
        leaves in prop::collection::vec(leaf_strategy(), 1..6),
        item in bin_strategy(),
    ) {
        let and_nodes: Vec<_> = leaves.iter().map(|l| l.node(Connector::And)).collect();
        let or_nodes: Vec<_> = leaves.iter().map(|l| l.node(Connector::Or)).collect();

        let all = compile_where::<Bin>(&and_nodes, Hooks::new()).unwrap();
        let any = compile_where::<Bin>(&or_nodes, Hooks::new()).unwrap();

        prop_assert_eq!(all.matches(&item), leaves.iter().all(|l| l.eval(item.weight)));
        prop_assert_eq!(any.matches(&item), leaves.iter().any(|l| l.eval(item.weight)));
    }

    /// Mixed connectors fold left to right using each node's predecessor.
    #[test]
    fn mixed_connectors_fold_left(
        leaves in prop::collection::vec((leaf_strategy(), any::<bool>()), 1..6),
        item in bin_strategy(),
    ) {
        let nodes: Vec<_> = leaves
            .iter()
            .map(|(l, or)| l.node(if *or { Connector::Or } else { Connector::And }))
            .collect();
        let compiled = compile_where::<Bin>(&nodes, Hooks::new()).unwrap();

        let mut expected = leaves[0].0.eval(item.weight);
        for window in leaves.windows(2) {
            let previous_or = window[0].1;
            let next = window[1].0.eval(item.weight);
            expected = if previous_or { expected || next } else { expected && next };
        }
        prop_assert_eq!(compiled.matches(&item), expected);
    }

    /// Negating a group negates its combined result.
    #[test]
    fn negated_group_is_not_of_group(
        leaves in prop::collection::vec((leaf_strategy(), any::<bool>()), 0..5),
        item in bin_strategy(),
    ) {
        let children: Vec<_> = leaves
            .iter()
            .map(|(l, or)| l.node(if *or { Connector::Or } else { Connector::And }))
            .collect();

        let plain = compile_where::<Bin>(&[ClauseNode::group(children.clone())], Hooks::new()).unwrap();
        let negated =
            compile_where::<Bin>(&[ClauseNode::group(children).negated()], Hooks::new()).unwrap();

        prop_assert_eq!(negated.matches(&item), !plain.matches(&item));
        if leaves.is_empty() {
            prop_assert!(!plain.matches(&item));
        }
    }

    /// Between with equal bounds is Equal.
    #[test]
    fn between_equal_bounds_is_equal(v in -50i64..50, item in bin_strategy()) {
        let token = Some(v.to_string());
        let between = compile_clause::<Bin>("weight", Comparison::Between, &[token.clone(), token.clone()], false).unwrap();
        let equal = compile_clause::<Bin>("weight", Comparison::Equal, &[token], false).unwrap();
        prop_assert_eq!(between.matches(&item), equal.matches(&item));
    }

    /// Any-match is the OR of the element predicate over the collection.
    #[test]
    fn any_match_is_or_over_elements(leaf in leaf_strategy(), item in bin_strategy()) {
        let token = [Some(leaf.operand.to_string())];
        let any = compile_clause::<Bin>("parts[weight]", leaf.comparison, &token, false).unwrap();
        let expected = item.parts.iter().any(|p| leaf.eval(p.weight));
        prop_assert_eq!(any.matches(&item), expected);
        if item.parts.is_empty() {
            prop_assert!(!any.matches(&item));
        }
    }

    /// Paging with any order key never fails and never grows the result.
    #[test]
    fn ordered_paging_succeeds(
        items in prop::collection::vec(bin_strategy(), 0..20),
        skip in 0usize..25,
        take in 0usize..25,
        by_label in any::<bool>(),
    ) {
        let key = if by_label { OrderKey::asc("label") } else { OrderKey::desc("weight") };
        let args = QueryArguments::new().order_by(key).skip(skip).take(take);
        let found = apply_to_slice(&items, &args, Hooks::new(), &ArgumentOptions::new()).unwrap();
        prop_assert_eq!(found.len(), items.len().saturating_sub(skip).min(take));
    }
}
