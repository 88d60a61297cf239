//! Seeded train/test split

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::{Result, WeatherInsightsError};

/// Rows partitioned into a training and a held-out part
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub x_train: Vec<Vec<f64>>,
    pub x_test: Vec<Vec<f64>>,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
    /// Source row of each training row
    pub train_indices: Vec<usize>,
    /// Source row of each test row
    pub test_indices: Vec<usize>,
}

/// Number of held-out rows for `n` rows, rounded up
#[must_use]
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    (test_fraction * n as f64).ceil() as usize
}

/// Shuffle the row indices with `seed` and hold out the first
/// `ceil(test_fraction * n)` of them.
///
/// The same seed over the same number of rows always gives the same split.
pub fn train_test_split(
    x: &[Vec<f64>],
    y: &[u8],
    test_fraction: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    if x.len() != y.len() {
        return Err(WeatherInsightsError::validation(format!(
            "Feature rows ({}) and targets ({}) differ in length",
            x.len(),
            y.len()
        )));
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(WeatherInsightsError::validation(format!(
            "Test fraction must be between 0 and 1 (exclusive), got {test_fraction}"
        )));
    }

    let n = x.len();
    let n_test = test_size(n, test_fraction);
    if n_test == 0 || n_test >= n {
        return Err(WeatherInsightsError::validation(format!(
            "Cannot split {n} rows with test fraction {test_fraction}: \
             need at least one training and one test row"
        )));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_indices = indices[..n_test].to_vec();
    let train_indices = indices[n_test..].to_vec();

    let take_rows = |idx: &[usize]| idx.iter().map(|&i| x[i].clone()).collect::<Vec<_>>();
    let take_targets = |idx: &[usize]| idx.iter().map(|&i| y[i]).collect::<Vec<_>>();

    Ok(TrainTestSplit {
        x_train: take_rows(&train_indices),
        x_test: take_rows(&test_indices),
        y_train: take_targets(&train_indices),
        y_test: take_targets(&test_indices),
        train_indices,
        test_indices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn data(n: usize) -> (Vec<Vec<f64>>, Vec<u8>) {
        let x = (0..n).map(|i| vec![i as f64]).collect();
        let y = (0..n).map(|i| (i % 2) as u8).collect();
        (x, y)
    }

    #[rstest]
    #[case(10, 0.2, 2)]
    #[case(11, 0.2, 3)]
    #[case(3, 0.5, 2)]
    #[case(50, 0.25, 13)]
    fn test_test_size_rounds_up(#[case] n: usize, #[case] fraction: f64, #[case] expected: usize) {
        assert_eq!(test_size(n, fraction), expected);
        let (x, y) = data(n);
        let split = train_test_split(&x, &y, fraction, 42).unwrap();
        assert_eq!(split.x_test.len(), expected);
        assert_eq!(split.x_train.len(), n - expected);
    }

    #[test]
    fn test_split_is_deterministic_per_seed() {
        let (x, y) = data(40);
        let a = train_test_split(&x, &y, 0.2, 42).unwrap();
        let b = train_test_split(&x, &y, 0.2, 42).unwrap();
        assert_eq!(a, b);

        let c = train_test_split(&x, &y, 0.2, 7).unwrap();
        assert_ne!(a.test_indices, c.test_indices);
    }

    #[test]
    fn test_split_is_a_partition() {
        let (x, y) = data(25);
        let split = train_test_split(&x, &y, 0.3, 1).unwrap();
        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(&split.test_indices)
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..25).collect::<Vec<_>>());

        for (row, &i) in split.x_test.iter().zip(&split.test_indices) {
            assert_eq!(row[0], i as f64);
        }
        for (&target, &i) in split.y_train.iter().zip(&split.train_indices) {
            assert_eq!(target, y[i]);
        }
    }

    #[rstest]
    #[case(0.0)]
    #[case(1.0)]
    #[case(-0.1)]
    #[case(f64::NAN)]
    fn test_invalid_fraction(#[case] fraction: f64) {
        let (x, y) = data(10);
        assert!(train_test_split(&x, &y, fraction, 42).is_err());
    }

    #[test]
    fn test_too_few_rows() {
        let (x, y) = data(1);
        assert!(train_test_split(&x, &y, 0.2, 42).is_err());
        let (x, y) = data(0);
        assert!(train_test_split(&x, &y, 0.2, 42).is_err());
    }

    #[test]
    fn test_length_mismatch() {
        let (x, _) = data(5);
        assert!(train_test_split(&x, &[0, 1], 0.2, 42).is_err());
    }
}
