//! Information criteria of a fitted mixture.
//!
//! Both criteria are on the log-likelihood scale, so larger is better:
//!
//! ```text
//! BIC = ln L − ½ ν ln N
//! ICL = BIC + Σᵢ ln tᵢ,ẑᵢ
//! ```
//!
//! where ν is the number of free parameters and ẑᵢ the MAP cluster of row i.
//! ICL additionally penalizes fuzzy partitions.

use crate::data::MixedData;
use crate::selection::Selection;
use ndarray::ArrayView2;

/// Number of free parameters of a model with `g` clusters.
///
/// Proportions cost g − 1. A continuous variable costs 2g when selected and
/// 2 otherwise. A categorical variable with m modalities costs g(m − 1) when
/// selected and m − 1 otherwise.
pub fn n_free_parameters(data: &MixedData, selection: &Selection, g: usize) -> usize {
    let mut nu = g.saturating_sub(1);
    for j in 0..data.n_continuous() {
        nu += if selection.is_continuous_selected(j) { 2 * g } else { 2 };
    }
    if let Some(cat) = data.categorical() {
        for j in 0..cat.n_cols() {
            let free = cat.n_modalities(j) - 1;
            nu += if selection.is_categorical_selected(j) {
                g * free
            } else {
                free
            };
        }
    }
    nu
}

/// Bayesian information criterion.
pub fn bic(loglik: f64, n_params: usize, n_rows: usize) -> f64 {
    loglik - 0.5 * n_params as f64 * (n_rows as f64).ln()
}

/// Integrated completed likelihood from a BIC value and the final partition.
pub fn icl(bic: f64, tik: ArrayView2<'_, f64>, z_map: &[usize]) -> f64 {
    bic + z_map
        .iter()
        .enumerate()
        .map(|(i, &k)| tik[[i, k]].ln())
        .sum::<f64>()
}
