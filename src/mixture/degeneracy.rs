//! Detection of collapsed candidates.
//!
//! A Gaussian component whose standard deviation shrinks towards zero drives
//! the likelihood to infinity without describing a real cluster. A candidate
//! showing such a component is discarded by the restart driver.

use crate::params::MixedParams;
use crate::selection::Selection;

/// Smallest standard deviation a non-degenerate candidate may have.
pub const DEGENERACY_THRESHOLD: f64 = 1e-6;

/// Whether `params` has a selected continuous variable whose standard
/// deviation, in some cluster, is below [`DEGENERACY_THRESHOLD`].
///
/// Always `false` when no continuous variable is selected. A `NaN`
/// deviation counts as degenerate.
pub fn is_degenerate(params: &MixedParams, selection: &Selection) -> bool {
    if selection.continuous().is_empty() {
        return false;
    }
    params.sd.iter().any(|&s| !(s >= DEGENERACY_THRESHOLD))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CategoricalData, ContinuousData, MixedData};
    use ndarray::{array, Array2};

    fn data() -> MixedData {
        let c = ContinuousData::from_options(&[
            vec![Some(0.0), Some(1.0)],
            vec![Some(1.0), Some(0.0)],
        ])
        .unwrap();
        MixedData::new(Some(c), None, None).unwrap()
    }

    fn with_sd(sd: Array2<f64>) -> MixedParams {
        let (g, p) = sd.dim();
        MixedParams::new(
            ndarray::Array1::from_elem(g, 1.0 / g as f64),
            Array2::zeros((g, p)),
            sd,
            vec![],
        )
    }

    #[test]
    fn test_single_tiny_sd_is_degenerate() {
        let sel = Selection::all(&data());
        let p = with_sd(array![[1.0, 2.0], [5e-7, 1.0]]);
        assert!(is_degenerate(&p, &sel));
    }

    #[test]
    fn test_small_but_valid_sd_is_not_degenerate() {
        let sel = Selection::all(&data());
        let p = with_sd(Array2::from_elem((2, 2), 1e-5));
        assert!(!is_degenerate(&p, &sel));
    }

    #[test]
    fn test_nan_sd_is_degenerate() {
        let sel = Selection::all(&data());
        let p = with_sd(array![[1.0, f64::NAN], [1.0, 1.0]]);
        assert!(is_degenerate(&p, &sel));
    }

    #[test]
    fn test_skipped_without_selected_continuous() {
        let data = data();
        let sel = Selection::from_flags(&[0, 0], &data).unwrap();
        let p = with_sd(Array2::zeros((2, 0)));
        assert!(!is_degenerate(&p, &sel));

        let q = CategoricalData::from_codes(&[vec![0], vec![1]], &[2]).unwrap();
        let cat_only = MixedData::new(None, Some(q), None).unwrap();
        assert!(!is_degenerate(&p, &Selection::all(&cat_only)));
    }
}
