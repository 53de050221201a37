//! Tests for the search space and hypothesis walk services

use rand::rngs::StdRng;
use rand::SeedableRng;
use rstest::rstest;

use hyptree::application::services::{cluster_counts, survey, HypothesisWalk, SearchSpace, StepKind};
use hyptree::application::ApplicationError;
use hyptree::config::Settings;
use hyptree::domain::{build_tree, build_tree_with, Hypothesis};
use hyptree::util::testing;

// ============================================================
// SearchSpace
// ============================================================

#[test]
fn given_seeded_rng_when_building_space_then_reproducible() {
    testing::init_test_setup();
    let a = SearchSpace::random(3, 3, &mut StdRng::seed_from_u64(4));
    let b = SearchSpace::random(3, 3, &mut StdRng::seed_from_u64(4));

    let data_a: Vec<f64> = a.tree().breadth_first().map(|(_, n)| n.data).collect();
    let data_b: Vec<f64> = b.tree().breadth_first().map(|(_, n)| n.data).collect();

    assert_eq!(data_a, data_b);
    assert!(data_a.iter().all(|v| (0.0..1.0).contains(v)));
}

#[test]
fn given_constant_data_when_ranking_then_ties_keep_enumeration_order() {
    let space = SearchSpace::from_tree(build_tree_with::<f64, _>(3, 3, |_| 0.5));

    let best = space.best_partitions(2, 3);

    let names: Vec<_> = best.iter().map(|s| space.tree().names(&s.nodes)).collect();
    assert_eq!(names, ["r", "r0, r1", "r0, r10, r11"]);
}

#[test]
fn given_partition_when_scoring_then_mean_of_node_data() {
    let space = SearchSpace::from_tree(build_tree_with::<f64, _>(2, 2, |n| n.child_num as f64));
    let children = space.tree().children(space.tree().root()).to_vec();

    assert_eq!(space.score(&children), 0.5);
    assert_eq!(space.score(&[]), 0.0);
}

#[rstest]
#[case(3, 3, 2, 49)]
#[case(3, 4, 3, 501)]
fn given_space_when_scanning_then_every_partition_is_counted(
    #[case] depth: usize,
    #[case] branch_count: usize,
    #[case] split_num: usize,
    #[case] expected: usize,
) {
    let space = SearchSpace::random(depth, branch_count, &mut StdRng::seed_from_u64(0));

    let (count, best) = space.scan(split_num, 10);

    assert_eq!(count, expected);
    assert_eq!(best.len(), 10);
    assert!(best.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn given_unbounded_top_when_scanning_then_returns_every_partition_ranked() {
    let space = SearchSpace::random(3, 3, &mut StdRng::seed_from_u64(9));

    let (count, best) = space.scan(2, usize::MAX);

    assert_eq!(count, 49);
    assert_eq!(best.len(), 49);
    assert!(best.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(space.best_partitions(2, usize::MAX).len(), 49);
}

#[test]
fn given_grid_when_surveying_then_one_row_per_combination() {
    let mut rng = StdRng::seed_from_u64(2);

    let rows = survey(&[2, 3], &[2, 3], &[1, 2], &mut rng);

    assert_eq!(rows.len(), 8);
    let row = rows
        .iter()
        .find(|r| r.depth == 3 && r.branch_count == 3 && r.split_num == 2)
        .unwrap();
    assert_eq!(row.partition_count, 49);
    assert!(!row.best_names.is_empty());
}

// ============================================================
// HypothesisWalk
// ============================================================

#[test]
fn given_settings_when_walking_then_trail_has_requested_length() {
    let settings = Settings {
        walk: hyptree::config::WalkConfig {
            steps: 25,
            prune_probability: 0.3,
        },
        ..Settings::default()
    };
    let tree = build_tree(settings.depth, settings.branch_count);
    let walk = HypothesisWalk::from_settings(&settings).unwrap();

    let trail = walk.run(&tree, &mut StdRng::seed_from_u64(6)).unwrap();

    assert_eq!(trail.len(), 25);
    assert_eq!(trail[0].kind, StepKind::Split);
    for step in &trail {
        assert_eq!(step.leaf_splits, step.hypothesis.count_leaf_splits());
        assert_eq!(
            step.splittable_nodes,
            step.hypothesis.count_splittable_leaf_nodes(&tree)
        );
    }
}

#[test]
fn given_never_prune_when_walking_shallow_tree_then_pruning_is_forced() {
    let tree = build_tree(2, 3);
    let walk = HypothesisWalk::new(2, 4, 0.0).unwrap();

    let trail = walk.run(&tree, &mut StdRng::seed_from_u64(6)).unwrap();

    let kinds: Vec<_> = trail.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        [StepKind::Split, StepKind::Prune, StepKind::Split, StepKind::Prune]
    );
}

#[test]
fn given_arity_above_root_children_when_walking_then_unsplittable() {
    let tree = build_tree(3, 2);
    let walk = HypothesisWalk::new(3, 5, 0.3).unwrap();

    let result = walk.run(&tree, &mut StdRng::seed_from_u64(1));

    assert!(matches!(
        result,
        Err(ApplicationError::Unsplittable { split_num: 3, .. })
    ));
}

#[test]
fn given_repeated_hypotheses_when_clustering_then_counted_largest_first() {
    let tree = build_tree(2, 3);
    let mut rng = StdRng::seed_from_u64(0);
    let a = Hypothesis::first_split(&tree, 3, &mut rng).unwrap();
    let b = Hypothesis::first_split(&tree, 2, &mut rng).unwrap();
    let empty = Hypothesis::empty();
    let seen = vec![b.clone(), a.clone(), empty.clone(), a.clone(), a.clone(), empty.clone()];

    let clusters = cluster_counts(&seen);

    assert_eq!(clusters.len(), 3);
    assert_eq!(clusters[0], (a, 3));
    assert_eq!(clusters[1], (empty, 2));
    assert_eq!(clusters[2], (b, 1));
}
