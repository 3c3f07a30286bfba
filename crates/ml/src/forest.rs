// Path: crates/ml/src/forest.rs

//! Bagged ensemble of CART trees.

use crate::tree::{argmax, validate_training_set, DecisionTreeClassifier};
use crate::MlError;
use flora_types::config::{Criterion, ModelParameters};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Random forest classifier.
///
/// Each tree is fit on a bootstrap sample (drawn with replacement, same size
/// as the training set) and considers `floor(sqrt(n_features))` random
/// features at every split. Prediction is a hard majority vote; ties go to
/// the lowest class index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    n_estimators: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    criterion: Criterion,
    random_state: Option<u64>,
    trees: Vec<DecisionTreeClassifier>,
    n_features: usize,
    n_classes: usize,
}

impl RandomForestClassifier {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            criterion: Criterion::Gini,
            random_state: None,
            trees: Vec::new(),
            n_features: 0,
            n_classes: 0,
        }
    }

    pub fn from_parameters(params: &ModelParameters) -> Self {
        Self::new(params.n_estimators)
            .with_max_depth(params.max_depth)
            .with_min_samples_split(params.min_samples_split)
            .with_criterion(params.criterion)
            .with_random_state(params.random_state)
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Seeds tree `i` with `random_state + i`. `None` draws fresh entropy.
    pub fn with_random_state(mut self, random_state: Option<u64>) -> Self {
        self.random_state = random_state;
        self
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    pub fn trees(&self) -> &[DecisionTreeClassifier] {
        &self.trees
    }

    pub fn fit(&mut self, x: &[Vec<f64>], y: &[usize]) -> Result<(), MlError> {
        if self.n_estimators == 0 {
            return Err(MlError::InvalidInput(
                "n_estimators must be at least 1".into(),
            ));
        }
        let (n_features, n_classes) = validate_training_set(x, y)?;
        let n_samples = x.len();
        let max_features = ((n_features as f64).sqrt().floor() as usize).max(1);

        let mut trees = Vec::with_capacity(self.n_estimators);
        for i in 0..self.n_estimators {
            let mut rng = match self.random_state {
                Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(i as u64)),
                None => StdRng::from_entropy(),
            };

            let mut bx = Vec::with_capacity(n_samples);
            let mut by = Vec::with_capacity(n_samples);
            for _ in 0..n_samples {
                let idx = rng.gen_range(0..n_samples);
                if let (Some(row), Some(&label)) = (x.get(idx), y.get(idx)) {
                    bx.push(row.clone());
                    by.push(label);
                }
            }

            let mut tree = DecisionTreeClassifier::new()
                .with_criterion(self.criterion)
                .with_max_depth(self.max_depth)
                .with_min_samples_split(self.min_samples_split)
                .with_max_features(Some(max_features));
            tree.fit_with_rng(&bx, &by, &mut rng)?;
            trees.push(tree);
        }

        self.trees = trees;
        self.n_features = n_features;
        self.n_classes = n_classes;
        Ok(())
    }

    pub fn predict_one(&self, row: &[f64]) -> Result<usize, MlError> {
        if self.trees.is_empty() {
            return Err(MlError::NotFitted);
        }
        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            let class = tree.predict_one(row)?;
            if let Some(v) = votes.get_mut(class) {
                *v += 1;
            }
        }
        Ok(argmax(&votes))
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<usize>, MlError> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }

    /// Mean accuracy on `(x, y)`.
    pub fn score(&self, x: &[Vec<f64>], y: &[usize]) -> Result<f64, MlError> {
        let predictions = self.predict(x)?;
        crate::metrics::accuracy_score(y, &predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Three well-separated clusters in four dimensions.
    fn clusters() -> (Vec<Vec<f64>>, Vec<usize>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for class in 0..3usize {
            let base = class as f64 * 10.0;
            for j in 0..15 {
                let jitter = j as f64 * 0.1;
                x.push(vec![base + jitter, base - jitter, base + 2.0 * jitter, base]);
                y.push(class);
            }
        }
        (x, y)
    }

    #[test]
    fn fits_and_scores_clusters() {
        let (x, y) = clusters();
        let mut forest = RandomForestClassifier::new(15).with_random_state(Some(42));
        forest.fit(&x, &y).unwrap();
        assert_eq!(forest.trees().len(), 15);
        assert_eq!(forest.n_classes(), 3);
        assert_eq!(forest.score(&x, &y).unwrap(), 1.0);
        assert_eq!(forest.predict_one(&[20.5, 19.5, 21.0, 20.0]).unwrap(), 2);
    }

    #[test]
    fn seeded_fits_are_reproducible() {
        let (x, y) = clusters();
        let mut a = RandomForestClassifier::new(5).with_random_state(Some(7));
        let mut b = RandomForestClassifier::new(5).with_random_state(Some(7));
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn from_parameters_carries_hyperparameters() {
        let params = ModelParameters {
            n_estimators: 3,
            max_depth: Some(1),
            random_state: Some(1),
            ..Default::default()
        };
        let (x, y) = clusters();
        let mut forest = RandomForestClassifier::from_parameters(&params);
        forest.fit(&x, &y).unwrap();
        assert!(forest.trees().iter().all(|t| t.depth() <= 1));
    }

    #[test]
    fn rejects_empty_forest_and_unfitted_predict() {
        let (x, y) = clusters();
        assert!(RandomForestClassifier::new(0).fit(&x, &y).is_err());
        assert!(matches!(
            RandomForestClassifier::new(3).predict_one(&[0.0; 4]),
            Err(MlError::NotFitted)
        ));
    }
}
