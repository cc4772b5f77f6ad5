//! End-to-end training tests.

use approx::assert_relative_eq;
use cartboost::tree::split::{ese, leaf_totals, search_level, Location};
use cartboost::*;
use ndarray::{array, Array2};

mod common;
use common::*;

#[test]
fn test_staircase_single_split() {
    let ds = Dataset::builder()
        .dense(array![[1.0], [2.0], [3.0], [4.0]])
        .labels(array![-1.0, -1.0, 1.0, 1.0])
        .build()
        .unwrap();
    let mut model = GBDT::new(create_test_config(1, 1, 1)).unwrap();
    model.fit(&ds, None).unwrap();

    let tree = &model.trees()[0];
    assert_eq!(tree.root().feature, Some(0));
    assert_eq!(tree.root().threshold, 3.0);
    assert!(tree.node(2).unwrap().gamma < 0.0);
    assert!(tree.node(3).unwrap().gamma > 0.0);
    assert_eq!(model.get_indices(&[1.0]), vec![2]);
    assert_eq!(model.get_indices(&[2.0]), vec![2]);
    assert_eq!(model.get_indices(&[3.0]), vec![3]);
    assert_eq!(model.get_indices(&[4.0]), vec![3]);
}

#[test]
fn test_sparse_indicator_of_positives_is_root_split() {
    let n = 32;
    let dense = create_dense_features(n, 2, 11);
    let sparse: Vec<Vec<u32>> = (0..n).map(|i| if i % 3 == 0 { vec![1] } else { vec![0] }).collect();
    let labels = ndarray::Array1::from_shape_fn(n, |i| if i % 3 == 0 { 1.0 } else { -1.0 });
    let ds = Dataset::new(dense, sparse, labels, None).unwrap();

    let mut model = GBDT::new(create_test_config(3, 1, 2)).unwrap();
    model.fit(&ds, None).unwrap();

    let root = model.trees()[0].root();
    let sparse_feature = root.feature.unwrap();
    assert!(sparse_feature >= ds.nr_field());
    // either indicator separates the classes perfectly
    for i in 0..n {
        let (leaf, _) = model.trees()[0].predict(&ds.feature_vector(i));
        let depth_one_ancestor = leaf >> (leaf.ilog2() - 1);
        let went_right = depth_one_ancestor == 3;
        let has_feature = ds.feature_vector(i)[sparse_feature] == 1.0;
        assert_eq!(went_right, has_feature);
    }
}

#[test]
fn test_split_score_matches_direct_partition() {
    // unsorted values, uneven residuals; the best cut leaves four on the left
    let values = [3.0f32, 0.5, 4.0, 1.5, 2.0, 5.0];
    let residuals = [0.2f32, 0.9, -0.4, 0.7, 0.1, -0.8];
    let ds = Dataset::builder()
        .dense(Array2::from_shape_vec((6, 1), values.to_vec()).unwrap())
        .labels(array![1.0, 1.0, -1.0, 1.0, 1.0, -1.0])
        .build()
        .unwrap();
    let locations: Vec<Location> = residuals.iter().map(|&r| Location::new(r)).collect();
    let metas = leaf_totals(&locations, 1, 1);
    let defenders = search_level(&ds, &locations, &metas, 1);

    let mut direct_best = (f64::MIN, 0.0f32);
    for &t in &values {
        let (mut sl, mut nl, mut sr, mut nr) = (0.0f64, 0u32, 0.0f64, 0u32);
        for (&v, &r) in values.iter().zip(&residuals) {
            if v < t {
                sl += r as f64;
                nl += 1;
            } else {
                sr += r as f64;
                nr += 1;
            }
        }
        if nl > 0 && nr > 0 && ese(sl, nl, sr, nr) > direct_best.0 {
            direct_best = (ese(sl, nl, sr, nr), t);
        }
    }
    assert_eq!(direct_best.1, 4.0);

    let best = defenders.forward(0, 0).ese.max(defenders.backward(0, 0).ese);
    assert_relative_eq!(best, direct_best.0, epsilon = 1e-9);

    let mut tree = Tree::with_depth(1).unwrap();
    tree.fit(&ds, &residuals).unwrap();
    assert_eq!(tree.root().feature, Some(0));
    assert_eq!(tree.root().threshold, 4.0);
}

#[test]
fn test_training_loss_decreases() {
    let ds = create_mixed_dataset(300, 21);
    let mut model = GBDT::new(create_test_config(3, 8, 2)).unwrap();
    let history = model.fit(&ds, None).unwrap();

    let losses = history.train_losses();
    assert_eq!(losses.len(), 8);
    assert!(losses[0] < std::f64::consts::LN_2);
    for pair in losses[..4].windows(2) {
        assert!(pair[1] < pair[0], "loss went up: {:?}", losses);
    }
    assert!(losses[7] < losses[0]);

    let scores = model.predict_dataset(&ds).unwrap();
    assert_predictions_valid(&scores);
    assert!(accuracy(&scores, ds.labels()) > 0.8);
}

#[test]
fn test_validation_loss_tracked() {
    let train = create_mixed_dataset(400, 31);
    let valid = create_mixed_dataset(150, 41);
    let mut model = GBDT::new(create_test_config(2, 5, 1)).unwrap();
    let history = model.fit(&train, Some(&valid)).unwrap();

    assert!(history.records().iter().all(|r| r.valid_loss.is_some()));
    let first = history.records()[0].valid_loss.unwrap();
    let best = history.best_valid_round().unwrap().valid_loss.unwrap();
    assert!(best <= first);
    assert!(first < std::f64::consts::LN_2);

    let scores = model.predict_dataset(&valid).unwrap();
    let direct = valid_loss_from_scores(&scores, &valid);
    assert_relative_eq!(history.last().unwrap().valid_loss.unwrap(), direct, epsilon = 1e-9);
}

fn valid_loss_from_scores(scores: &ndarray::Array1<f32>, ds: &Dataset) -> f64 {
    cartboost::boosting::mean_logloss(ds.labels(), scores.as_slice().unwrap())
}

#[test]
fn test_thread_count_does_not_change_model() {
    let ds = create_mixed_dataset(200, 51);

    let mut single = GBDT::new(create_test_config(4, 4, 1)).unwrap();
    single.fit(&ds, None).unwrap();
    let mut multi = GBDT::new(create_test_config(4, 4, 4)).unwrap();
    multi.fit(&ds, None).unwrap();

    assert_eq!(single.trees(), multi.trees());
    assert_eq!(single.bias(), multi.bias());
}

#[test]
fn test_leaf_indices_agree_with_tree_predict() {
    let ds = create_mixed_dataset(120, 61);
    let mut model = GBDT::new(create_test_config(3, 3, 2)).unwrap();
    model.fit(&ds, None).unwrap();

    let leaves = model.leaf_indices(&ds).unwrap();
    for i in 0..ds.nr_instance() {
        let x = ds.feature_vector(i);
        for (t, tree) in model.trees().iter().enumerate() {
            let (leaf, gamma) = tree.predict(&x);
            assert_eq!(leaves[[i, t]], leaf);
            assert!(tree.node(leaf).unwrap().is_terminal());
            assert_eq!(tree.node(leaf).unwrap().gamma, gamma);
        }
    }
}

#[test]
fn test_validation_with_fewer_sparse_fields() {
    let train = create_mixed_dataset(100, 71);
    let valid = Dataset::builder()
        .dense(Array2::zeros((3, 3)))
        .labels(array![1.0, -1.0, 1.0])
        .build()
        .unwrap();
    assert_eq!(valid.nr_sparse_field(), 0);

    let mut model = GBDT::new(create_test_config(2, 2, 1)).unwrap();
    let history = model.fit(&train, Some(&valid)).unwrap();
    assert!(history.last().unwrap().valid_loss.unwrap().is_finite());
    assert_eq!(model.leaf_indices(&valid).unwrap().dim(), (3, 2));
}

#[test]
fn test_empty_training_set_rejected() {
    let empty = Dataset::builder()
        .dense(Array2::zeros((0, 2)))
        .labels(ndarray::Array1::zeros(0))
        .build()
        .unwrap();
    let mut model = GBDT::new(Config::default()).unwrap();
    assert!(model.fit(&empty, None).is_err());
}
