//! Tests for partition hypotheses: counting, splitting, pruning and identity

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::{fixture, rstest};

use hyptree::domain::{
    build_tree, DomainError, ErrorKind, Hypothesis, Member, NodeId, Partition, Tree,
};

struct Fixture {
    tree: Tree,
    names: HashMap<String, NodeId>,
}

impl Fixture {
    fn node(&self, name: &str) -> Member {
        Member::Node(self.names[name])
    }

    fn leaf(&self, names: &[&str]) -> Member {
        Partition::of_nodes(names.iter().map(|n| self.names[*n])).into()
    }

    fn render(&self, hypothesis: &Hypothesis) -> String {
        hypothesis.named(&self.tree).to_string()
    }

    /// Nested hypothesis over a depth 5, branch 4 tree:
    /// `[[r00, [r010, r011, [r0120..r0123], r013], r02, r03], r1, r2, [r30..r33]]`
    fn nested(&self) -> Hypothesis {
        let inner = Partition::new(vec![
            self.node("r010"),
            self.node("r011"),
            self.leaf(&["r0120", "r0121", "r0122", "r0123"]),
            self.node("r013"),
        ]);
        let left = Partition::new(vec![
            self.node("r00"),
            inner.into(),
            self.node("r02"),
            self.node("r03"),
        ]);
        let root = Partition::new(vec![
            left.into(),
            self.node("r1"),
            self.node("r2"),
            self.leaf(&["r30", "r31", "r32", "r33"]),
        ]);
        Hypothesis::from_partition(&self.tree, root).unwrap()
    }

    fn flat(&self) -> Hypothesis {
        let root = Partition::of_nodes(["r0", "r1", "r2", "r3"].iter().map(|n| self.names[*n]));
        Hypothesis::from_partition(&self.tree, root).unwrap()
    }
}

#[fixture]
fn fx() -> Fixture {
    let tree = build_tree(5, 4);
    let names = tree.name_index();
    Fixture { tree, names }
}

// ============================================================
// Counting
// ============================================================

#[rstest]
fn given_nested_hypothesis_when_counting_then_matches_structure(fx: Fixture) {
    let hyp = fx.nested();

    assert_eq!(hyp.count_leaf_splits(), 2);
    assert_eq!(hyp.count_splittable_leaf_nodes(&fx.tree), 12);
    assert_eq!(hyp.leaf_nodes().len(), 16);
}

#[rstest]
fn given_flat_hypothesis_when_counting_then_root_is_the_only_leaf(fx: Fixture) {
    let hyp = fx.flat();

    assert_eq!(hyp.count_leaf_splits(), 1);
    assert_eq!(hyp.count_splittable_leaf_nodes(&fx.tree), 4);
    assert_eq!(fx.render(&hyp), "[r0, r1, r2, r3]");
}

#[test]
fn given_empty_hypothesis_when_counting_then_zero() {
    let tree = build_tree(3, 3);
    let hyp = Hypothesis::empty();

    assert!(hyp.is_empty());
    assert_eq!(hyp.count_leaf_splits(), 0);
    assert_eq!(hyp.count_splittable_leaf_nodes(&tree), 0);
    assert!(hyp.leaf_nodes().is_empty());
    assert_eq!(hyp.named(&tree).to_string(), "[]");
}

// ============================================================
// Pruning
// ============================================================

#[rstest]
#[case(0, "[[r00, [r010, r011, [r0120, r0121, r0122, r0123], r013], r02, r03], r1, r2, r3]")]
#[case(1, "[[r00, [r010, r011, r012, r013], r02, r03], r1, r2, [r30, r31, r32, r33]]")]
fn given_nested_hypothesis_when_pruning_then_leaf_collapses_into_origin(
    fx: Fixture,
    #[case] leaf_index: usize,
    #[case] expected: &str,
) {
    let hyp = fx.nested();
    let before = fx.render(&hyp);

    let pruned = hyp.prune_at(leaf_index, &fx.tree).unwrap();

    assert_eq!(fx.render(&pruned), expected);
    assert_eq!(fx.render(&hyp), before);
}

#[rstest]
fn given_every_leaf_index_when_pruning_then_each_succeeds(fx: Fixture) {
    let hyp = fx.nested();
    for leaf_index in 0..hyp.count_leaf_splits() {
        let pruned = hyp.prune_at(leaf_index, &fx.tree).unwrap();
        assert_eq!(pruned.leaf_nodes().len(), hyp.leaf_nodes().len() - 3);
    }
}

#[rstest]
fn given_out_of_range_leaf_index_when_pruning_then_addressing_error(fx: Fixture) {
    let hyp = fx.nested();

    let err = hyp.prune_at(2, &fx.tree).unwrap_err();

    assert_eq!(err, DomainError::LeafIndexOutOfRange { index: 2, count: 2 });
    assert_eq!(err.kind(), ErrorKind::Addressing);
}

#[rstest]
fn given_flat_hypothesis_when_pruning_only_leaf_then_empty(fx: Fixture) {
    let pruned = fx.flat().prune_at(0, &fx.tree).unwrap();

    assert!(pruned.is_empty());
    assert_eq!(pruned.tree_id(), None);
}

#[test]
fn given_empty_hypothesis_when_pruning_randomly_then_structural_error() {
    let tree = build_tree(3, 3);
    let mut rng = StdRng::seed_from_u64(0);

    let err = Hypothesis::empty().random_prune(&tree, &mut rng).unwrap_err();

    assert_eq!(err, DomainError::EmptyHypothesis);
    assert_eq!(err.kind(), ErrorKind::StructuralPrecondition);
    assert_eq!(
        Hypothesis::empty().prune_at(0, &tree),
        Err(DomainError::EmptyHypothesis)
    );
}

#[rstest]
fn given_deep_clone_when_mutating_clone_then_original_untouched(fx: Fixture) {
    let hyp = fx.nested();
    let original = hyp.root().unwrap();
    let mut rng = StdRng::seed_from_u64(3);

    let mut clone = original.deep_clone();
    assert_eq!(clone.count_leaf_splits(), original.count_leaf_splits());
    assert_eq!(
        clone.count_splittable_leaf_nodes(&fx.tree),
        original.count_splittable_leaf_nodes(&fx.tree)
    );
    assert_eq!(clone.leaf_nodes(), original.leaf_nodes());

    clone.split_node(0, 2, &fx.tree, &mut rng).unwrap();

    assert_ne!(clone.leaf_nodes(), original.leaf_nodes());
    assert_eq!(original.count_splittable_leaf_nodes(&fx.tree), 12);
}

// ============================================================
// Splitting
// ============================================================

#[rstest]
fn given_every_node_index_when_splitting_then_one_node_becomes_four(fx: Fixture) {
    let hyp = fx.nested();
    let before = fx.render(&hyp);
    let mut rng = StdRng::seed_from_u64(11);

    for node_index in 0..hyp.count_splittable_leaf_nodes(&fx.tree) {
        let grown = hyp.split_at(node_index, 4, &fx.tree, &mut rng).unwrap();
        assert_eq!(grown.leaf_nodes().len(), hyp.leaf_nodes().len() + 3);
        assert!(grown.count_leaf_splits() >= hyp.count_leaf_splits());
    }
    assert_eq!(fx.render(&hyp), before);
}

#[rstest]
fn given_first_index_when_splitting_then_first_root_level_node_expands(fx: Fixture) {
    let mut rng = StdRng::seed_from_u64(5);

    let grown = fx.nested().split_at(0, 4, &fx.tree, &mut rng).unwrap();

    assert_eq!(
        fx.render(&grown),
        "[[r00, [r010, r011, [r0120, r0121, r0122, r0123], r013], r02, r03], [r10, r11, r12, r13], r2, [r30, r31, r32, r33]]"
    );
    assert_eq!(grown.count_leaf_splits(), 3);
}

#[rstest]
fn given_out_of_range_node_index_when_splitting_then_addressing_error(fx: Fixture) {
    let mut rng = StdRng::seed_from_u64(5);

    let err = fx.nested().split_at(12, 2, &fx.tree, &mut rng).unwrap_err();

    assert_eq!(err, DomainError::NodeIndexOutOfRange { index: 12, count: 12 });
    assert_eq!(err.kind(), ErrorKind::Addressing);
}

#[rstest]
fn given_arity_above_branching_when_splitting_then_too_few_children(fx: Fixture) {
    let mut rng = StdRng::seed_from_u64(5);

    let err = fx.flat().split_at(0, 5, &fx.tree, &mut rng).unwrap_err();

    assert!(matches!(err, DomainError::TooFewChildren { available: 4, requested: 5, .. }));
    assert_eq!(err.kind(), ErrorKind::StructuralPrecondition);
}

#[rstest]
fn given_flat_hypothesis_when_splitting_then_pruning_then_restored(fx: Fixture) {
    let hyp = fx.flat();
    let mut rng = StdRng::seed_from_u64(17);

    for node_index in 0..4 {
        let grown = hyp.split_at(node_index, 2, &fx.tree, &mut rng).unwrap();
        assert_eq!(grown.count_leaf_splits(), 1);

        let restored = grown.prune_at(0, &fx.tree).unwrap();
        assert_eq!(fx.render(&restored), fx.render(&hyp));
        assert_eq!(restored, hyp);
    }
}

#[test]
fn given_wide_tree_when_first_split_then_one_leaf_with_four_splittable_nodes() {
    let tree = build_tree(5, 10);
    let mut rng = StdRng::seed_from_u64(42);

    let hyp = Hypothesis::first_split(&tree, 4, &mut rng).unwrap();

    assert_eq!(hyp.count_leaf_splits(), 1);
    assert_eq!(hyp.count_splittable_leaf_nodes(&tree), 4);
    let children = tree.children(tree.root());
    assert!(hyp.leaf_nodes().iter().all(|id| children.contains(id)));
}

#[test]
fn given_empty_hypothesis_when_splitting_randomly_then_first_split() {
    let tree = build_tree(3, 3);
    let mut rng = StdRng::seed_from_u64(8);

    let hyp = Hypothesis::empty().random_split(&tree, 2, &mut rng).unwrap();

    assert_eq!(hyp.count_leaf_splits(), 1);
    assert_eq!(hyp.leaf_nodes().len(), 2);
    assert_eq!(hyp.tree_id(), Some(tree.id()));
}

#[test]
fn given_only_bottom_nodes_when_splitting_randomly_then_nothing_to_split() {
    let tree = build_tree(2, 3);
    let mut rng = StdRng::seed_from_u64(8);
    let hyp = Hypothesis::first_split(&tree, 2, &mut rng).unwrap();

    let err = hyp.random_split(&tree, 2, &mut rng).unwrap_err();

    assert_eq!(err, DomainError::NothingToSplit);
}

#[test]
fn given_zero_arity_when_splitting_then_invalid_arity() {
    let tree = build_tree(3, 3);
    let mut rng = StdRng::seed_from_u64(8);
    assert_eq!(
        Hypothesis::first_split(&tree, 0, &mut rng).unwrap_err(),
        DomainError::InvalidArity
    );
}

// ============================================================
// Tree identity
// ============================================================

#[test]
fn given_hypothesis_of_other_tree_when_editing_then_foreign_tree() {
    let tree = build_tree(3, 3);
    let other = build_tree(3, 3);
    let mut rng = StdRng::seed_from_u64(1);
    let hyp = Hypothesis::first_split(&tree, 2, &mut rng).unwrap();

    assert!(matches!(
        hyp.random_split(&other, 2, &mut rng),
        Err(DomainError::ForeignTree { .. })
    ));
    assert!(matches!(
        hyp.prune_at(0, &other),
        Err(DomainError::ForeignTree { .. })
    ));
}

#[test]
fn given_node_outside_tree_when_wrapping_partition_then_unknown_node() {
    let small = build_tree(2, 2);
    let big = build_tree(4, 4);
    let foreign = *big.leaf_nodes().last().unwrap();

    let result = Hypothesis::from_partition(&small, Partition::of_nodes([foreign]));

    assert_eq!(result.unwrap_err(), DomainError::UnknownNode);
}

// ============================================================
// Identity by flattened node set
// ============================================================

#[rstest]
fn given_same_nodes_in_different_nesting_when_comparing_then_equal(fx: Fixture) {
    let nested = Hypothesis::from_partition(
        &fx.tree,
        Partition::new(vec![fx.node("r0"), fx.leaf(&["r10", "r11"])]),
    )
    .unwrap();
    let flat = Hypothesis::from_partition(
        &fx.tree,
        Partition::new(vec![fx.leaf(&["r0"]), fx.node("r10"), fx.node("r11")]),
    )
    .unwrap();

    assert_eq!(nested, flat);
    let set: HashSet<_> = [nested, flat].into_iter().collect();
    assert_eq!(set.len(), 1);
}

#[rstest]
fn given_different_nodes_when_comparing_then_not_equal(fx: Fixture) {
    assert_ne!(fx.nested(), fx.flat());
    assert_ne!(fx.flat(), Hypothesis::empty());
}

// ============================================================
// Random edit sequences
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_random_edits_keep_counts_consistent(seed in any::<u64>(), steps in 1usize..40) {
        let tree = build_tree(4, 3);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut hyp = Hypothesis::empty();

        for step in 0..steps {
            let can_split = hyp.is_empty() || hyp.count_splittable_leaf_nodes(&tree) > 0;
            hyp = if !hyp.is_empty() && (!can_split || step % 3 == 2) {
                hyp.random_prune(&tree, &mut rng).unwrap()
            } else {
                hyp.random_split(&tree, 2, &mut rng).unwrap()
            };

            if hyp.is_empty() {
                prop_assert_eq!(hyp.count_leaf_splits(), 0);
            } else {
                prop_assert!(hyp.count_leaf_splits() >= 1);
                prop_assert!(hyp.leaf_nodes().len() >= 2);
                prop_assert!(hyp.count_splittable_leaf_nodes(&tree) <= hyp.leaf_nodes().len());
            }
        }
    }
}
