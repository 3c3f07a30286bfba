// Path: crates/ml/src/preprocessing.rs
use crate::{Matrix, MlError};
use serde::{Deserialize, Serialize};

fn check_width(x: &[Vec<f64>], expected: usize) -> Result<(), MlError> {
    match x.iter().position(|row| row.len() != expected) {
        Some(pos) => Err(MlError::InvalidInput(format!(
            "expected {expected} features, got {} at row {pos}",
            x.get(pos).map(Vec::len).unwrap_or_default()
        ))),
        None => Ok(()),
    }
}

/// Standardises features to zero mean and unit variance.
///
/// Uses the population standard deviation. A column with zero variance is
/// centred but not divided.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Option<Vec<f64>>,
    scale: Option<Vec<f64>>,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }

    pub fn n_features(&self) -> Option<usize> {
        self.mean.as_ref().map(Vec::len)
    }

    pub fn mean(&self) -> Option<&[f64]> {
        self.mean.as_deref()
    }

    pub fn scale(&self) -> Option<&[f64]> {
        self.scale.as_deref()
    }

    pub fn fit(&mut self, x: &[Vec<f64>]) -> Result<(), MlError> {
        let first = x
            .first()
            .ok_or_else(|| MlError::InvalidInput("cannot fit a scaler on zero samples".into()))?;
        let width = first.len();
        check_width(x, width)?;

        let n = x.len() as f64;
        let mut mean = vec![0.0; width];
        for row in x {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; width];
        for row in x {
            for ((acc, v), m) in var.iter_mut().zip(row).zip(&mean) {
                *acc += (v - m) * (v - m);
            }
        }
        let scale = var
            .into_iter()
            .map(|s| {
                let std = (s / n).sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        self.mean = Some(mean);
        self.scale = Some(scale);
        Ok(())
    }

    pub fn transform(&self, x: &[Vec<f64>]) -> Result<Matrix, MlError> {
        let (Some(mean), Some(scale)) = (&self.mean, &self.scale) else {
            return Err(MlError::NotFitted);
        };
        check_width(x, mean.len())?;
        Ok(x.iter()
            .map(|row| {
                row.iter()
                    .zip(mean)
                    .zip(scale)
                    .map(|((v, m), s)| (v - m) / s)
                    .collect()
            })
            .collect())
    }

    pub fn fit_transform(&mut self, x: &[Vec<f64>]) -> Result<Matrix, MlError> {
        self.fit(x)?;
        self.transform(x)
    }
}

/// Maps string labels to dense class indices in sorted order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn fit(&mut self, labels: &[String]) {
        let mut classes = labels.to_vec();
        classes.sort();
        classes.dedup();
        self.classes = classes;
    }

    pub fn transform(&self, labels: &[String]) -> Result<Vec<usize>, MlError> {
        labels
            .iter()
            .map(|l| {
                self.classes
                    .binary_search(l)
                    .map_err(|_| MlError::InvalidInput(format!("unseen label: {l}")))
            })
            .collect()
    }

    pub fn fit_transform(&mut self, labels: &[String]) -> Result<Vec<usize>, MlError> {
        self.fit(labels);
        self.transform(labels)
    }

    pub fn inverse_transform(&self, indices: &[usize]) -> Result<Vec<String>, MlError> {
        indices
            .iter()
            .map(|&i| {
                self.classes
                    .get(i)
                    .cloned()
                    .ok_or_else(|| MlError::InvalidInput(format!("unknown class index: {i}")))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaler_standardises_columns() {
        let x = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let mut scaler = StandardScaler::new();
        let out = scaler.fit_transform(&x).unwrap();
        assert_eq!(scaler.mean().unwrap(), &[2.0, 10.0]);
        assert_eq!(out[0], vec![-1.0, 0.0]);
        assert_eq!(out[1], vec![1.0, 0.0]);
    }

    #[test]
    fn scaler_errors() {
        let scaler = StandardScaler::new();
        assert!(matches!(
            scaler.transform(&[vec![1.0]]),
            Err(MlError::NotFitted)
        ));

        let mut scaler = StandardScaler::new();
        assert!(scaler.fit(&[]).is_err());
        scaler.fit(&[vec![1.0, 2.0], vec![2.0, 3.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&[vec![1.0, 2.0, 3.0]]),
            Err(MlError::InvalidInput(_))
        ));
    }

    #[test]
    fn label_encoder_sorts_classes() {
        let labels: Vec<String> = ["b", "a", "c", "a"].iter().map(|s| s.to_string()).collect();
        let mut enc = LabelEncoder::new();
        let y = enc.fit_transform(&labels).unwrap();
        assert_eq!(enc.classes(), &["a", "b", "c"]);
        assert_eq!(y, vec![1, 0, 2, 0]);
        assert_eq!(enc.inverse_transform(&[2]).unwrap(), vec!["c".to_string()]);
        assert!(enc.inverse_transform(&[7]).is_err());
        assert!(enc.transform(&["z".to_string()]).is_err());
    }
}
