// Path: crates/ml/src/metrics.rs
use crate::MlError;

/// Fraction of positions where `y_pred` equals `y_true`.
pub fn accuracy_score<T: PartialEq>(y_true: &[T], y_pred: &[T]) -> Result<f64, MlError> {
    if y_true.len() != y_pred.len() {
        return Err(MlError::InvalidInput(format!(
            "y_true and y_pred have different lengths: {} vs {}",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(MlError::InvalidInput(
            "cannot score an empty prediction set".into(),
        ));
    }
    let correct = y_true.iter().zip(y_pred).filter(|(t, p)| t == p).count();
    Ok(correct as f64 / y_true.len() as f64)
}
