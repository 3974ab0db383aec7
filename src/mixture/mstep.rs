//! Parameter re-estimation from responsibilities (M-step).
//!
//! - πₖ = Σᵢ tᵢₖ / Σᵢ Σₖ' tᵢₖ'
//! - for a selected continuous variable, with wᵢ = tᵢₖ on observed rows only:
//!   μₖⱼ = Σ wᵢ xᵢⱼ / Σ wᵢ and σₖⱼ = √(Σ wᵢ (xᵢⱼ − μₖⱼ)² / Σ wᵢ)
//! - for a selected categorical variable: αₖⱼ[h] ∝ Σ_{i : xᵢⱼ = h} ωᵢ tᵢₖ,
//!   ωᵢ being the row weight, normalized over modalities.
//!
//! Unobserved rows are skipped rather than multiplied by zero, so whatever
//! sits at a missing position (an outlier, `NaN`) cannot leak into μ or σ.

use crate::data::MixedData;
use crate::error::{Error, Result};
use crate::params::MixedParams;
use crate::selection::Selection;
use ndarray::{Array2, ArrayView2, Axis};

/// Re-estimate `params` in place from `resp` (N × g).
///
/// An emptied cluster (zero total responsibility for a proportion, a
/// variable's observed rows, or a categorical table row) returns
/// [`Error::EmptyCluster`] and leaves `params` untouched.
pub fn m_step(
    data: &MixedData,
    selection: &Selection,
    resp: ArrayView2<'_, f64>,
    params: &mut MixedParams,
) -> Result<()> {
    let g = resp.ncols();

    let sizes = resp.sum_axis(Axis(0));
    if let Some(k) = sizes.iter().position(|&s| !(s > 0.0)) {
        return Err(Error::EmptyCluster { cluster: k });
    }
    let pi = &sizes / sizes.sum();

    let n_cont = selection.continuous().len();
    let mut mu = Array2::zeros((g, n_cont));
    let mut sd = Array2::zeros((g, n_cont));
    if let Some(cont) = data.continuous() {
        for (loc, &j) in selection.continuous().iter().enumerate() {
            let x = cont.column(j);
            let observed = cont.observed_column(j);
            for k in 0..g {
                let t = resp.column(k);
                let mut sw = 0.0;
                let mut swx = 0.0;
                for i in 0..x.len() {
                    if observed[i] {
                        sw += t[i];
                        swx += t[i] * x[i];
                    }
                }
                if !(sw > 0.0) {
                    return Err(Error::EmptyCluster { cluster: k });
                }
                let m = swx / sw;
                let mut ss = 0.0;
                for i in 0..x.len() {
                    if observed[i] {
                        ss += t[i] * (x[i] - m).powi(2);
                    }
                }
                mu[[k, loc]] = m;
                sd[[k, loc]] = (ss / sw).sqrt();
            }
        }
    }

    let mut alpha = Vec::with_capacity(selection.categorical().len());
    if let Some(cat) = data.categorical() {
        let weights = data.weights();
        for &j in selection.categorical() {
            let mut table = Array2::zeros((g, cat.n_modalities(j)));
            for (h, rows) in cat.members(j).iter().enumerate() {
                for &i in rows {
                    for k in 0..g {
                        table[[k, h]] += weights[i] * resp[[i, k]];
                    }
                }
            }
            for (k, mut row) in table.rows_mut().into_iter().enumerate() {
                let s = row.sum();
                if !(s > 0.0) {
                    return Err(Error::EmptyCluster { cluster: k });
                }
                row /= s;
            }
            alpha.push(table);
        }
    }

    params.pi = pi;
    params.mu = mu;
    params.sd = sd;
    params.alpha = alpha;
    Ok(())
}
