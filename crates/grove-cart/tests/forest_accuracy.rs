//! Accuracy and contract tests for forests of CART trees.
//!
//! These guard against algorithmic changes that would degrade classification
//! quality on a deterministic synthetic dataset.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

use grove_cart::CartLearner;
use grove_forest::{EnsembleConfig, ErrorKind, ForestError, Matrix, RandomForest};

// ---------------------------------------------------------------------------
// Helper: deterministic synthetic classification dataset
// ---------------------------------------------------------------------------

/// Generate an `n_samples`-row, 10-feature, 3-class dataset.
///
/// Features 0-2 are informative (class * 3.0 + noise in [0, 0.5]).
/// Features 3-9 are pure noise in [0, 0.5].
/// Samples are assigned round-robin across classes.
fn make_classification(n_samples: usize, seed: u64) -> (Matrix, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n_features = 10;
    let n_classes = 3;

    let mut values = Vec::with_capacity(n_samples * n_features);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let class = i % n_classes;
        labels.push(class);
        for f in 0..n_features {
            let base = if f < 3 { class as f64 * 3.0 } else { 0.0 };
            values.push(base + rng.r#gen::<f64>() * 0.5);
        }
    }
    (Matrix::new(values, n_samples, n_features).unwrap(), labels)
}

fn accuracy(predicted: &[usize], expected: &[usize]) -> f64 {
    let correct = predicted.iter().zip(expected).filter(|(p, e)| p == e).count();
    correct as f64 / expected.len() as f64
}

// ---------------------------------------------------------------------------
// Accuracy
// ---------------------------------------------------------------------------

/// Held-out accuracy with 50 trees must exceed 0.9.
#[test]
fn holdout_accuracy_above_threshold() {
    let (train_x, train_y) = make_classification(300, 42);
    let (test_x, test_y) = make_classification(90, 7);

    let config = EnsembleConfig::new(50, 4).unwrap().with_seed(42);
    let mut forest = RandomForest::new(config, CartLearner::new());
    forest.fit(&train_x, &train_y, 4).unwrap();

    let predicted = forest.predict(&test_x, 4).unwrap();
    let acc = accuracy(&predicted, &test_y);
    assert!(acc > 0.9, "holdout accuracy {acc} <= 0.9");
}

/// A depth-limited forest still learns the informative columns.
#[test]
fn shallow_forest_accuracy() {
    let (x, y) = make_classification(300, 42);
    let config = EnsembleConfig::new(30, 5)
        .unwrap()
        .with_max_depth(Some(3))
        .unwrap()
        .with_seed(1);
    let mut forest = RandomForest::new(config, CartLearner::new());
    forest.fit(&x, &y, 2).unwrap();

    let acc = accuracy(&forest.predict(&x, 2).unwrap(), &y);
    assert!(acc > 0.85, "training accuracy {acc} <= 0.85");
}

// ---------------------------------------------------------------------------
// Contract
// ---------------------------------------------------------------------------

#[test]
fn end_to_end_ten_by_four() {
    let rows: Vec<Vec<f64>> = (0..10)
        .map(|i| {
            let offset = if i < 5 { 0.0 } else { 5.0 };
            (0..4).map(|f| offset + (i * 4 + f) as f64 * 0.1).collect()
        })
        .collect();
    let x = Matrix::from_rows(&rows).unwrap();
    let y: Vec<u32> = (0..10).map(|i| u32::from(i >= 5)).collect();

    let config = EnsembleConfig::new(5, 2).unwrap().with_seed(42);
    let mut forest = RandomForest::new(config, CartLearner::new());
    forest.fit(&x, &y, 2).unwrap();

    assert_eq!(forest.n_trees(), 5);
    let predictions = forest.predict(&x, 2).unwrap();
    assert_eq!(predictions.len(), 10);
    assert!(predictions.iter().all(|&p| p == 0 || p == 1));

    let proba = forest.predict_proba(&x, 2).unwrap();
    for row in proba.rows() {
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn identical_runs_identical_output() {
    let (x, y) = make_classification(120, 3);
    let run = || {
        let config = EnsembleConfig::new(20, 3).unwrap().with_seed(11);
        let mut forest = RandomForest::new(config, CartLearner::new());
        forest.fit(&x, &y, 3).unwrap();
        forest.predict_proba(&x, 3).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn worker_limit_does_not_change_probabilities() {
    let (x, y) = make_classification(120, 3);
    let config = EnsembleConfig::new(24, 3).unwrap().with_seed(5);

    let mut single = RandomForest::new(config.clone(), CartLearner::new());
    single.fit(&x, &y, 1).unwrap();
    let mut wide = RandomForest::new(config, CartLearner::new());
    wide.fit(&x, &y, 8).unwrap();

    let a = single.predict_proba(&x, 1).unwrap();
    let b = wide.predict_proba(&x, 8).unwrap();
    for (p, q) in a.as_slice().iter().zip(b.as_slice()) {
        assert!((p - q).abs() <= 1e-9);
    }
}

#[test]
fn shape_contract() {
    let (x, y) = make_classification(10, 0);
    let x = x.select_columns(&[0, 1, 2, 3, 4]);
    let mut forest = RandomForest::new(EnsembleConfig::new(5, 3).unwrap(), CartLearner::new());
    forest.fit(&x, &y, 2).unwrap();

    assert_eq!(forest.predict(&Matrix::zeros(3, 5), 2).unwrap().len(), 3);
    let err = forest.predict(&Matrix::zeros(3, 6), 2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Shape);
}

#[test]
fn tree_failure_surfaces_as_worker_error() {
    let (x, y) = make_classification(30, 0);
    let learner = CartLearner::new().with_min_samples_leaf(0);
    let mut forest = RandomForest::new(EnsembleConfig::new(4, 2).unwrap(), learner);
    let err = forest.fit(&x, &y, 2).unwrap_err();
    assert!(matches!(err, ForestError::WorkerFailure { tree_index: 0, .. }));
    assert!(!forest.is_fitted());
}

#[test]
fn persisted_forest_predicts_identically() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cart_forest.bin");

    let (x, y) = make_classification(90, 9);
    let config = EnsembleConfig::new(10, 4).unwrap().with_seed(2);
    let mut forest = RandomForest::new(config, CartLearner::new());
    forest.fit(&x, &y, 2).unwrap();
    forest.save(&path).unwrap();

    let loaded: RandomForest<CartLearner, usize> =
        RandomForest::load(&path, CartLearner::new()).unwrap();
    assert_eq!(
        loaded.predict_proba(&x, 2).unwrap(),
        forest.predict_proba(&x, 2).unwrap()
    );
}

#[test]
fn adjacent_float_features_give_finite_probabilities() {
    let x = Matrix::from_rows(&[vec![1.0000000000000002], vec![1.0000000000000004]]).unwrap();
    let labels = vec![0usize, 1];
    for max_depth in [None, Some(4)] {
        let config = EnsembleConfig::new(3, 1)
            .unwrap()
            .with_max_depth(max_depth)
            .unwrap()
            .with_seed(7);
        let mut forest = RandomForest::new(config, CartLearner::new());
        forest.fit(&x, &labels, 2).unwrap();
        let proba = forest
            .predict_proba(&Matrix::from_rows(&[vec![2.0]]).unwrap(), 2)
            .unwrap();
        let row = proba.row(0);
        assert!(row.iter().all(|p| p.is_finite()));
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
