// Path: crates/ml/src/tree.rs

//! CART decision tree classifier.
//!
//! Splits are axis-aligned thresholds placed halfway between consecutive
//! distinct feature values; a sample goes left when `value <= threshold`.

use crate::MlError;
use flora_types::config::Criterion;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// A node in a fitted tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        class: usize,
        n_samples: usize,
    },
}

impl TreeNode {
    /// Leaves have depth 0.
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Split { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

fn impurity(criterion: Criterion, counts: &[usize], total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    match criterion {
        Criterion::Gini => {
            1.0 - counts
                .iter()
                .map(|&c| {
                    let p = c as f64 / n;
                    p * p
                })
                .sum::<f64>()
        }
        Criterion::Entropy => -counts
            .iter()
            .filter(|&&c| c > 0)
            .map(|&c| {
                let p = c as f64 / n;
                p * p.log2()
            })
            .sum::<f64>(),
    }
}

/// Index of the largest count; ties go to the lowest index.
pub(crate) fn argmax(counts: &[usize]) -> usize {
    let mut best = 0;
    let mut best_count = 0;
    for (class, &count) in counts.iter().enumerate() {
        if count > best_count {
            best = class;
            best_count = count;
        }
    }
    best
}

struct Split {
    feature: usize,
    threshold: f64,
    impurity: f64,
}

struct Builder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [usize],
    n_classes: usize,
    n_features: usize,
    criterion: Criterion,
    max_depth: Option<usize>,
    min_samples_split: usize,
    max_features: Option<usize>,
}

impl Builder<'_> {
    fn class_counts(&self, indices: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &i in indices {
            if let Some(c) = self.y.get(i).and_then(|&label| counts.get_mut(label)) {
                *c += 1;
            }
        }
        counts
    }

    fn value(&self, row: usize, feature: usize) -> f64 {
        self.x
            .get(row)
            .and_then(|r| r.get(feature))
            .copied()
            .unwrap_or(f64::NAN)
    }

    fn best_split_for_feature(
        &self,
        indices: &[usize],
        feature: usize,
        parent: &[usize],
    ) -> Option<Split> {
        let mut pairs: Vec<(f64, usize)> = indices
            .iter()
            .map(|&i| (self.value(i, feature), self.y.get(i).copied().unwrap_or(0)))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = pairs.len();
        let mut left = vec![0usize; self.n_classes];
        let mut best: Option<Split> = None;
        for (pos, &(value, label)) in pairs.iter().enumerate() {
            if let Some(c) = left.get_mut(label) {
                *c += 1;
            }
            let Some(&(next, _)) = pairs.get(pos + 1) else {
                break;
            };
            if next <= value {
                continue;
            }
            let n_left = pos + 1;
            let n_right = n - n_left;
            let right: Vec<usize> = parent
                .iter()
                .zip(&left)
                .map(|(p, l)| p.saturating_sub(*l))
                .collect();
            let weighted = (n_left as f64 * impurity(self.criterion, &left, n_left)
                + n_right as f64 * impurity(self.criterion, &right, n_right))
                / n as f64;

            let mut threshold = value + (next - value) / 2.0;
            if threshold >= next {
                threshold = value;
            }
            if best.as_ref().map_or(true, |b| weighted < b.impurity) {
                best = Some(Split {
                    feature,
                    threshold,
                    impurity: weighted,
                });
            }
        }
        best
    }

    fn best_split(
        &self,
        indices: &[usize],
        parent: &[usize],
        parent_impurity: f64,
        features: &[usize],
    ) -> Option<Split> {
        features
            .iter()
            .filter_map(|&f| self.best_split_for_feature(indices, f, parent))
            .filter(|s| s.impurity < parent_impurity - 1e-12)
            .fold(None, |best: Option<Split>, s| match best {
                Some(b) if b.impurity <= s.impurity => Some(b),
                _ => Some(s),
            })
    }

    fn candidate_features(&self, rng: &mut StdRng) -> Vec<usize> {
        match self.max_features {
            Some(k) if k < self.n_features => {
                let mut picked = rand::seq::index::sample(rng, self.n_features, k).into_vec();
                picked.sort_unstable();
                picked
            }
            _ => (0..self.n_features).collect(),
        }
    }

    fn build(&self, indices: &[usize], depth: usize, rng: &mut StdRng) -> TreeNode {
        let counts = self.class_counts(indices);
        let n_samples = indices.len();
        let leaf = TreeNode::Leaf {
            class: argmax(&counts),
            n_samples,
        };

        let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
        let at_max_depth = self.max_depth.is_some_and(|d| depth >= d);
        if pure || at_max_depth || n_samples < self.min_samples_split {
            return leaf;
        }

        let parent_impurity = impurity(self.criterion, &counts, n_samples);
        let candidates = self.candidate_features(rng);
        // When the random subset holds no usable split, widen to all features.
        let split = self
            .best_split(indices, &counts, parent_impurity, &candidates)
            .or_else(|| {
                let all: Vec<usize> = (0..self.n_features).collect();
                if candidates.len() < all.len() {
                    self.best_split(indices, &counts, parent_impurity, &all)
                } else {
                    None
                }
            });
        let Some(split) = split else {
            return leaf;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| self.value(i, split.feature) <= split.threshold);
        if left_idx.is_empty() || right_idx.is_empty() {
            return leaf;
        }

        TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: Box::new(self.build(&left_idx, depth + 1, rng)),
            right: Box::new(self.build(&right_idx, depth + 1, rng)),
        }
    }
}

/// Validates a training set and returns `(n_features, n_classes)`.
pub(crate) fn validate_training_set(x: &[Vec<f64>], y: &[usize]) -> Result<(usize, usize), MlError> {
    let first = x
        .first()
        .ok_or_else(|| MlError::InvalidInput("cannot fit on zero samples".into()))?;
    if x.len() != y.len() {
        return Err(MlError::InvalidInput(format!(
            "X and y must have same number of samples, got {} and {}",
            x.len(),
            y.len()
        )));
    }
    let n_features = first.len();
    if n_features == 0 {
        return Err(MlError::InvalidInput("samples have no features".into()));
    }
    if x.iter().any(|row| row.len() != n_features) {
        return Err(MlError::InvalidInput(
            "all samples must have the same number of features".into(),
        ));
    }
    if x.iter().flatten().any(|v| !v.is_finite()) {
        return Err(MlError::InvalidInput(
            "feature values must be finite".into(),
        ));
    }
    let n_classes = y.iter().max().map_or(0, |m| m + 1);
    Ok((n_features, n_classes))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    criterion: Criterion,
    max_depth: Option<usize>,
    min_samples_split: usize,
    max_features: Option<usize>,
    root: Option<TreeNode>,
    n_features: usize,
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionTreeClassifier {
    pub fn new() -> Self {
        Self {
            criterion: Criterion::Gini,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            root: None,
            n_features: 0,
        }
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Values below 2 are treated as 2.
    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split.max(2);
        self
    }

    /// Number of features drawn at random for each split; `None` uses all.
    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features.map(|k| k.max(1));
        self
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, TreeNode::depth)
    }

    pub fn fit(&mut self, x: &[Vec<f64>], y: &[usize]) -> Result<(), MlError> {
        self.fit_with_rng(x, y, &mut StdRng::seed_from_u64(0))
    }

    /// Fits the tree, drawing per-split feature subsets from `rng`.
    pub fn fit_with_rng(
        &mut self,
        x: &[Vec<f64>],
        y: &[usize],
        rng: &mut StdRng,
    ) -> Result<(), MlError> {
        let (n_features, n_classes) = validate_training_set(x, y)?;
        let builder = Builder {
            x,
            y,
            n_classes,
            n_features,
            criterion: self.criterion,
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: self.max_features,
        };
        let all: Vec<usize> = (0..x.len()).collect();
        self.root = Some(builder.build(&all, 0, rng));
        self.n_features = n_features;
        Ok(())
    }

    pub fn predict_one(&self, row: &[f64]) -> Result<usize, MlError> {
        let mut node = self.root.as_ref().ok_or(MlError::NotFitted)?;
        if row.len() != self.n_features {
            return Err(MlError::InvalidInput(format!(
                "expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        loop {
            match node {
                TreeNode::Leaf { class, .. } => return Ok(*class),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let v = row.get(*feature).copied().unwrap_or(f64::NAN);
                    node = if v <= *threshold { left } else { right };
                }
            }
        }
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<usize>, MlError> {
        x.iter().map(|row| self.predict_one(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable() -> (Vec<Vec<f64>>, Vec<usize>) {
        let x = vec![
            vec![1.0, 5.0],
            vec![1.5, 4.0],
            vec![2.0, 6.0],
            vec![8.0, 5.0],
            vec![8.5, 4.5],
            vec![9.0, 6.0],
        ];
        (x, vec![0, 0, 0, 1, 1, 1])
    }

    #[test]
    fn gini_and_entropy_of_pure_and_even_sets() {
        assert_eq!(impurity(Criterion::Gini, &[4, 0], 4), 0.0);
        assert!((impurity(Criterion::Gini, &[2, 2], 4) - 0.5).abs() < 1e-12);
        assert!((impurity(Criterion::Entropy, &[2, 2], 4) - 1.0).abs() < 1e-12);
        assert_eq!(impurity(Criterion::Entropy, &[0, 3], 3), 0.0);
    }

    #[test]
    fn argmax_breaks_ties_low() {
        assert_eq!(argmax(&[2, 5, 5]), 1);
        assert_eq!(argmax(&[0, 0]), 0);
    }

    #[test]
    fn learns_single_threshold() {
        let (x, y) = separable();
        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.depth(), 1);
        match tree.root().unwrap() {
            TreeNode::Split {
                feature, threshold, ..
            } => {
                assert_eq!(*feature, 0);
                assert!((*threshold - 5.0).abs() < 1e-12);
            }
            other => panic!("expected split, got {other:?}"),
        }
        assert_eq!(tree.predict(&x).unwrap(), y);
    }

    #[test]
    fn entropy_criterion_fits_too() {
        let (x, y) = separable();
        let mut tree = DecisionTreeClassifier::new().with_criterion(Criterion::Entropy);
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.predict(&[vec![0.0, 0.0], vec![10.0, 0.0]]).unwrap(), vec![0, 1]);
    }

    #[test]
    fn max_depth_zero_is_a_stump_leaf() {
        let (x, y) = separable();
        let mut tree = DecisionTreeClassifier::new().with_max_depth(Some(0));
        tree.fit(&x, &y).unwrap();
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict_one(&[9.0, 9.0]).unwrap(), 0);
    }

    #[test]
    fn rejects_bad_input() {
        let mut tree = DecisionTreeClassifier::new();
        assert!(tree.fit(&[], &[]).is_err());
        assert!(tree.fit(&[vec![1.0]], &[0, 1]).is_err());
        assert!(tree.fit(&[vec![f64::NAN]], &[0]).is_err());
        assert!(matches!(tree.predict_one(&[1.0]), Err(MlError::NotFitted)));

        let (x, y) = separable();
        tree.fit(&x, &y).unwrap();
        assert!(tree.predict_one(&[1.0]).is_err());
    }
}
