use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{DataError, DataResult};

/// Row indices of a train/test split, each ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Deterministic train/test split over row indices.
///
/// With `stratify`, each class contributes `round(count * test_size)` rows to
/// the test side so both sides keep the class balance. Without it, the test
/// side holds `ceil(n * test_size)` rows.
pub fn train_test_split(
    labels: &[u8],
    test_size: f64,
    seed: u64,
    stratify: bool,
) -> DataResult<Split> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(DataError::InvalidParam {
            name: "test_size",
            msg: format!("must be in (0, 1), got {test_size}"),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut test = Vec::new();
    let mut train = Vec::new();

    if stratify {
        let mut classes: Vec<u8> = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        for class in classes {
            let mut idx: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, l)| **l == class)
                .map(|(i, _)| i)
                .collect();
            if idx.len() < 2 {
                return Err(DataError::InvalidParam {
                    name: "stratify",
                    msg: format!("class {class} has {} row(s); need at least 2", idx.len()),
                });
            }
            idx.shuffle(&mut rng);
            let n_test = ((idx.len() as f64 * test_size).round() as usize).clamp(1, idx.len() - 1);
            test.extend_from_slice(&idx[..n_test]);
            train.extend_from_slice(&idx[n_test..]);
        }
    } else {
        let mut idx: Vec<usize> = (0..labels.len()).collect();
        idx.shuffle(&mut rng);
        let n_test = (labels.len() as f64 * test_size).ceil() as usize;
        test.extend_from_slice(&idx[..n_test]);
        train.extend_from_slice(&idx[n_test..]);
    }

    test.sort_unstable();
    train.sort_unstable();
    Ok(Split { train, test })
}
