// Path: crates/ml/src/model_selection.rs
use crate::MlError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row positions assigned to each side of a split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Validates the split fraction and returns `(n_train, n_test)`.
///
/// The test side gets `ceil(test_size * n_samples)` rows.
fn validate_split(n_samples: usize, test_size: f64) -> Result<(usize, usize), MlError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(MlError::InvalidInput(format!(
            "test_size must be between 0 and 1, got {test_size}"
        )));
    }
    let n_test = (test_size * n_samples as f64).ceil() as usize;
    let n_train = n_samples.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(MlError::InvalidInput(format!(
            "With n_samples={n_samples} and test_size={test_size}, one of the \
             resulting sets would be empty (n_train={n_train}, n_test={n_test})"
        )));
    }
    Ok((n_train, n_test))
}

/// Shuffles `0..n_samples` with a seeded `StdRng` and cuts it in two.
/// The same seed always yields the same partition.
pub fn train_test_split_indices(
    n_samples: usize,
    test_size: f64,
    random_state: u64,
) -> Result<SplitIndices, MlError> {
    let (_, n_test) = validate_split(n_samples, test_size)?;
    let mut indices: Vec<usize> = (0..n_samples).collect();
    let mut rng = StdRng::seed_from_u64(random_state);
    indices.shuffle(&mut rng);
    let train = indices.split_off(n_test);
    Ok(SplitIndices {
        train,
        test: indices,
    })
}

/// Splits paired samples and targets. Returns `(x_train, x_test, y_train, y_test)`.
#[allow(clippy::type_complexity)]
pub fn train_test_split<X: Clone, Y: Clone>(
    x: &[X],
    y: &[Y],
    test_size: f64,
    random_state: u64,
) -> Result<(Vec<X>, Vec<X>, Vec<Y>, Vec<Y>), MlError> {
    if x.len() != y.len() {
        return Err(MlError::InvalidInput(format!(
            "X and y must have same number of samples, got {} and {}",
            x.len(),
            y.len()
        )));
    }
    let split = train_test_split_indices(x.len(), test_size, random_state)?;
    let pick_x = |idx: &[usize]| idx.iter().filter_map(|&i| x.get(i).cloned()).collect();
    let pick_y = |idx: &[usize]| idx.iter().filter_map(|&i| y.get(i).cloned()).collect();
    Ok((
        pick_x(&split.train),
        pick_x(&split.test),
        pick_y(&split.train),
        pick_y(&split.test),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iris_sized_split() {
        let split = train_test_split_indices(150, 0.2, 42).unwrap();
        assert_eq!(split.test.len(), 30);
        assert_eq!(split.train.len(), 120);

        let mut all: Vec<_> = split.train.iter().chain(&split.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..150).collect::<Vec<_>>());
    }

    #[test]
    fn test_side_is_rounded_up() {
        let split = train_test_split_indices(10, 0.25, 0).unwrap();
        assert_eq!(split.test.len(), 3);
        assert_eq!(split.train.len(), 7);
    }

    #[test]
    fn same_seed_same_partition() {
        let a = train_test_split_indices(50, 0.3, 7).unwrap();
        let b = train_test_split_indices(50, 0.3, 7).unwrap();
        let c = train_test_split_indices(50, 0.3, 8).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn rejects_degenerate_fractions() {
        for bad in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(train_test_split_indices(150, bad, 42).is_err(), "{bad}");
        }
        // ceil(0.99 * 10) = 10 leaves no training rows.
        assert!(train_test_split_indices(10, 0.99, 42).is_err());
        assert!(train_test_split_indices(1, 0.5, 42).is_err());
    }

    #[test]
    fn keeps_pairs_aligned() {
        let x: Vec<usize> = (0..20).collect();
        let y: Vec<String> = x.iter().map(|i| format!("label-{i}")).collect();
        let (xtr, xte, ytr, yte) = train_test_split(&x, &y, 0.2, 42).unwrap();
        for (xi, yi) in xtr.iter().zip(&ytr).chain(xte.iter().zip(&yte)) {
            assert_eq!(yi, &format!("label-{xi}"));
        }
        assert!(train_test_split(&x, &y[..3], 0.2, 42).is_err());
    }
}
