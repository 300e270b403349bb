use crate::domain::errors::{PredictionError, PredictionResult};
use crate::domain::ml::feature_registry::FeatureVector;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How rows are assigned to the held-out test set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Uniform sample without replacement, seeded. Ignores time order, so
    /// later matches can leak into training.
    #[default]
    Random,
    /// The most recent rows (by day offset) are held out.
    Chronological,
}

impl FromStr for SplitPolicy {
    type Err = PredictionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random" => Ok(SplitPolicy::Random),
            "chronological" | "time" | "temporal" => Ok(SplitPolicy::Chronological),
            _ => Err(PredictionError::schema(format!(
                "invalid split policy: {}. Must be 'random' or 'chronological'",
                s
            ))),
        }
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitPolicy::Random => f.write_str("random"),
            SplitPolicy::Chronological => f.write_str("chronological"),
        }
    }
}

/// Disjoint, exhaustive partition of an encoded corpus.
///
/// `train_indices` / `test_indices` point back into the rows passed to
/// `train_test_split`, both in ascending order.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainTestSplit {
    pub x_train: Vec<FeatureVector>,
    pub y_train: Vec<f64>,
    pub x_test: Vec<FeatureVector>,
    pub y_test: Vec<f64>,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Splits `(x, y)` holding out `round(test_fraction * n)` rows.
///
/// Deterministic for a given `seed`. Both partitions must end up non-empty.
pub fn train_test_split(
    x: &[FeatureVector],
    y: &[f64],
    test_fraction: f64,
    seed: u64,
    policy: SplitPolicy,
) -> PredictionResult<TrainTestSplit> {
    if x.len() != y.len() {
        return Err(PredictionError::schema(format!(
            "feature rows ({}) and targets ({}) differ in length",
            x.len(),
            y.len()
        )));
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PredictionError::insufficient(format!(
            "test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }

    let n = x.len();
    let n_test = (test_fraction * n as f64).round() as usize;
    if n_test == 0 || n_test >= n {
        return Err(PredictionError::insufficient(format!(
            "{} rows cannot be split with test fraction {} ({} test rows)",
            n, test_fraction, n_test
        )));
    }

    let mut is_test = vec![false; n];
    match policy {
        SplitPolicy::Random => {
            let mut rng = StdRng::seed_from_u64(seed);
            for idx in rand::seq::index::sample(&mut rng, n, n_test) {
                is_test[idx] = true;
            }
        }
        SplitPolicy::Chronological => {
            let mut order: Vec<usize> = (0..n).collect();
            // Stable: ties keep input order, so later rows win the test slots.
            order.sort_by_key(|&i| x[i].days_since_start);
            for &idx in &order[n - n_test..] {
                is_test[idx] = true;
            }
        }
    }

    let mut split = TrainTestSplit {
        x_train: Vec::with_capacity(n - n_test),
        y_train: Vec::with_capacity(n - n_test),
        x_test: Vec::with_capacity(n_test),
        y_test: Vec::with_capacity(n_test),
        train_indices: Vec::with_capacity(n - n_test),
        test_indices: Vec::with_capacity(n_test),
    };
    for (idx, held_out) in is_test.into_iter().enumerate() {
        if held_out {
            split.x_test.push(x[idx].clone());
            split.y_test.push(y[idx]);
            split.test_indices.push(idx);
        } else {
            split.x_train.push(x[idx].clone());
            split.y_train.push(y[idx]);
            split.train_indices.push(idx);
        }
    }
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn rows(n: usize) -> (Vec<FeatureVector>, Vec<f64>) {
        let x = (0..n)
            .map(|i| FeatureVector {
                days_since_start: i as u32,
                indicators: vec![1, 0],
            })
            .collect();
        let y = (0..n).map(|i| i as f64).collect();
        (x, y)
    }

    #[test]
    fn test_random_split_sizes_disjoint_exhaustive() {
        let (x, y) = rows(100);
        let split = train_test_split(&x, &y, 0.2, 42, SplitPolicy::Random).unwrap();

        assert_eq!(split.x_test.len(), 20);
        assert_eq!(split.y_test.len(), 20);
        assert_eq!(split.x_train.len(), 80);
        assert_eq!(split.y_train.len(), 80);

        let train: HashSet<usize> = split.train_indices.iter().copied().collect();
        let test: HashSet<usize> = split.test_indices.iter().copied().collect();
        assert!(train.is_disjoint(&test));
        assert_eq!(train.union(&test).count(), 100);

        // Rows stay paired with their targets
        for (fv, target) in split.x_test.iter().zip(&split.y_test) {
            assert_eq!(fv.days_since_start as f64, *target);
        }
    }

    #[test]
    fn test_random_split_is_deterministic_per_seed() {
        let (x, y) = rows(50);
        let a = train_test_split(&x, &y, 0.3, 7, SplitPolicy::Random).unwrap();
        let b = train_test_split(&x, &y, 0.3, 7, SplitPolicy::Random).unwrap();
        let c = train_test_split(&x, &y, 0.3, 8, SplitPolicy::Random).unwrap();

        assert_eq!(a, b);
        assert_ne!(a.test_indices, c.test_indices);
    }

    #[test]
    fn test_chronological_holds_out_latest() {
        let (mut x, y) = rows(10);
        x.reverse();
        let split = train_test_split(&x, &y, 0.2, 0, SplitPolicy::Chronological).unwrap();

        // Reversed input: the latest days sit at indices 0 and 1
        assert_eq!(split.test_indices, vec![0, 1]);
        let latest_train = split.x_train.iter().map(|v| v.days_since_start).max().unwrap();
        let earliest_test = split.x_test.iter().map(|v| v.days_since_start).min().unwrap();
        assert!(latest_train < earliest_test);
    }

    #[test]
    fn test_split_rejects_degenerate_partitions() {
        let (x, y) = rows(2);
        assert!(matches!(
            train_test_split(&x, &y, 0.2, 42, SplitPolicy::Random),
            Err(PredictionError::InsufficientData { .. })
        ));
        let (x, y) = rows(10);
        assert!(matches!(
            train_test_split(&x, &y, 1.0, 42, SplitPolicy::Random),
            Err(PredictionError::InsufficientData { .. })
        ));
        assert!(matches!(
            train_test_split(&x, &y[..9], 0.2, 42, SplitPolicy::Random),
            Err(PredictionError::Schema { .. })
        ));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("Random".parse::<SplitPolicy>().unwrap(), SplitPolicy::Random);
        assert_eq!(
            "chronological".parse::<SplitPolicy>().unwrap(),
            SplitPolicy::Chronological
        );
        assert!("kfold".parse::<SplitPolicy>().is_err());
    }
}
