//! Log-joint densities and posterior responsibilities (E-step).
//!
//! For cluster k and observation i:
//!
//! ```text
//! ℓᵢₖ = ln πₖ + Σ_{j ∈ selected continuous, observed} ln N(xᵢⱼ | μₖⱼ, σₖⱼ)
//!             + Σ_{j ∈ selected categorical} ln αₖⱼ[xᵢⱼ]
//! ```
//!
//! A missing continuous value contributes exactly zero, so a row with no
//! observed selected variable falls back to the prior `ln πₖ`.
//!
//! Responsibilities are obtained with a per-row log-sum-exp:
//!
//! ```text
//! mᵢ   = maxₖ ℓᵢₖ
//! tᵢₖ  = exp(ℓᵢₖ − mᵢ) / Σₖ exp(ℓᵢₖ − mᵢ)
//! ln L = Σᵢ [ mᵢ + ln Σₖ exp(ℓᵢₖ − mᵢ) ]
//! ```

use crate::data::MixedData;
use crate::error::{Error, Result};
use crate::params::MixedParams;
use crate::selection::Selection;
use ndarray::{Array2, ArrayView2, ArrayViewMut1, Zip};

/// ln(√(2π)).
const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_7;

/// Log-density of N(mu, sd²) at x.
#[inline]
pub fn log_gaussian(x: f64, mu: f64, sd: f64) -> f64 {
    let z = (x - mu) / sd;
    -0.5 * z * z - sd.ln() - LN_SQRT_2PI
}

/// Add the Gaussian log-density of every observed entry of a column to
/// `acc`. Unobserved rows get a zero contribution.
pub(crate) fn add_masked_log_gaussian(
    acc: &mut ArrayViewMut1<'_, f64>,
    data: &MixedData,
    variable: usize,
    mu: f64,
    sd: f64,
) {
    let Some(cont) = data.continuous() else {
        return;
    };
    Zip::from(acc)
        .and(cont.column(variable))
        .and(cont.observed_column(variable))
        .for_each(|a, &x, &o| {
            let term = if o { log_gaussian(x, mu, sd) } else { 0.0 };
            *a += term;
        });
}

/// Sum of the masked Gaussian log-density of one continuous variable.
pub(crate) fn masked_log_gaussian_sum(data: &MixedData, variable: usize, mu: f64, sd: f64) -> f64 {
    data.continuous().map_or(0.0, |cont| {
        cont.column(variable)
            .iter()
            .zip(cont.observed_column(variable))
            .filter(|(_, &o)| o)
            .map(|(&x, _)| log_gaussian(x, mu, sd))
            .sum()
    })
}

/// Raw per-cluster log-joint densities, N × g.
#[derive(Debug, Clone)]
pub struct LogJoint {
    values: Array2<f64>,
}

impl LogJoint {
    /// Allocate for `n` observations and `g` clusters.
    pub fn new(n: usize, g: usize) -> Self {
        Self {
            values: Array2::zeros((n, g)),
        }
    }

    /// Recompute every column from `params`.
    pub fn fill(&mut self, data: &MixedData, selection: &Selection, params: &MixedParams) {
        for (k, mut col) in self.values.columns_mut().into_iter().enumerate() {
            col.fill(params.pi[k].ln());

            for (loc, &j) in selection.continuous().iter().enumerate() {
                add_masked_log_gaussian(
                    &mut col,
                    data,
                    j,
                    params.mu[[k, loc]],
                    params.sd[[k, loc]],
                );
            }

            if let Some(cat) = data.categorical() {
                for (loc, &j) in selection.categorical().iter().enumerate() {
                    for (h, rows) in cat.members(j).iter().enumerate() {
                        let log_alpha = params.alpha[loc][[k, h]].ln();
                        for &i in rows {
                            col[i] += log_alpha;
                        }
                    }
                }
            }
        }
    }

    /// View of the densities.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Normalize into `resp` and return the log-likelihood of the selected block.
    ///
    /// Fails when a row has zero density under every cluster, or when a
    /// density is not a number; `resp` is left partially written then.
    pub fn normalize(&self, resp: &mut Responsibilities) -> Result<f64> {
        let mut loglik = 0.0;
        for (i, (lrow, mut trow)) in self
            .values
            .rows()
            .into_iter()
            .zip(resp.tik.rows_mut())
            .enumerate()
        {
            let row_max = lrow.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
            if !row_max.is_finite() {
                return Err(Error::NonFiniteLikelihood { row: i });
            }
            Zip::from(&mut trow)
                .and(&lrow)
                .for_each(|t, &l| *t = (l - row_max).exp());
            let row_sum = trow.sum();
            let contribution = row_max + row_sum.ln();
            if !contribution.is_finite() {
                return Err(Error::NonFiniteLikelihood { row: i });
            }
            trow /= row_sum;
            loglik += contribution;
        }
        resp.loglik = loglik;
        Ok(loglik)
    }
}

/// Normalized posterior responsibilities, N × g, and the log-likelihood they
/// were computed with.
#[derive(Debug, Clone)]
pub struct Responsibilities {
    tik: Array2<f64>,
    loglik: f64,
}

impl Responsibilities {
    /// Allocate for `n` observations and `g` clusters.
    pub fn new(n: usize, g: usize) -> Self {
        Self {
            tik: Array2::zeros((n, g)),
            loglik: f64::NEG_INFINITY,
        }
    }

    /// View of the responsibilities.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.tik.view()
    }

    /// Log-likelihood of the last normalization.
    pub fn loglik(&self) -> f64 {
        self.loglik
    }

    /// MAP cluster of every row; ties go to the lowest cluster index.
    pub fn map_classification(&self) -> Vec<usize> {
        self.tik
            .rows()
            .into_iter()
            .map(|row| {
                let mut best = 0;
                for (k, &t) in row.iter().enumerate() {
                    if t > row[best] {
                        best = k;
                    }
                }
                best
            })
            .collect()
    }
}

/// Scratch buffers owned by one fitting run.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Raw log-joint densities.
    pub log_joint: LogJoint,
    /// Responsibilities normalized from `log_joint`.
    pub resp: Responsibilities,
}

impl Workspace {
    /// Allocate for `n` observations and `g` clusters.
    pub fn new(n: usize, g: usize) -> Self {
        Self {
            log_joint: LogJoint::new(n, g),
            resp: Responsibilities::new(n, g),
        }
    }

    /// Full E-step: densities, then normalization. Returns the log-likelihood.
    pub fn e_step(
        &mut self,
        data: &MixedData,
        selection: &Selection,
        params: &MixedParams,
    ) -> Result<f64> {
        self.log_joint.fill(data, selection, params);
        self.log_joint.normalize(&mut self.resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CategoricalData, ContinuousData};
    use ndarray::{array, Array1};
    use proptest::prelude::*;

    fn mixed() -> MixedData {
        let c = ContinuousData::from_options(&[
            vec![Some(0.0)],
            vec![None],
            vec![Some(10.0)],
        ])
        .unwrap();
        let q = CategoricalData::from_codes(&[vec![0], vec![1], vec![1]], &[2]).unwrap();
        MixedData::new(Some(c), Some(q), None).unwrap()
    }

    fn params() -> MixedParams {
        MixedParams::new(
            array![0.4, 0.6],
            array![[0.0], [10.0]],
            array![[1.0], [2.0]],
            vec![array![[0.9, 0.1], [0.2, 0.8]]],
        )
    }

    #[test]
    fn test_log_gaussian_standard_normal() {
        let expected = -(2.0 * std::f64::consts::PI).sqrt().ln();
        assert!((log_gaussian(0.0, 0.0, 1.0) - expected).abs() < 1e-12);
        assert!((log_gaussian(1.0, 0.0, 1.0) - (expected - 0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_log_joint_matches_hand_computation() {
        let data = mixed();
        let sel = Selection::all(&data);
        let p = params();
        let mut lj = LogJoint::new(3, 2);
        lj.fill(&data, &sel, &p);

        let v = lj.view();
        let want = 0.4f64.ln() + log_gaussian(0.0, 0.0, 1.0) + 0.9f64.ln();
        assert!((v[[0, 0]] - want).abs() < 1e-12);

        // Missing continuous value: only prior + categorical term.
        let want = 0.6f64.ln() + 0.8f64.ln();
        assert!((v[[1, 1]] - want).abs() < 1e-12);
    }

    #[test]
    fn test_missing_row_without_categorical_falls_back_to_prior() {
        let c = ContinuousData::from_options(&[vec![Some(1.0)], vec![None]]).unwrap();
        let data = MixedData::new(Some(c), None, None).unwrap();
        let sel = Selection::all(&data);
        let p = MixedParams::new(array![0.3, 0.7], array![[0.0], [5.0]], array![[1.0], [1.0]], vec![]);

        let mut ws = Workspace::new(2, 2);
        ws.e_step(&data, &sel, &p).unwrap();
        let t = ws.resp.view();
        assert!((t[[1, 0]] - 0.3).abs() < 1e-12);
        assert!((t[[1, 1]] - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_loglik_is_log_of_mixture_density() {
        let c = ContinuousData::from_options(&[vec![Some(0.5)]]).unwrap();
        let data = MixedData::new(Some(c), None, None).unwrap();
        let sel = Selection::all(&data);
        let p = MixedParams::new(array![0.5, 0.5], array![[0.0], [1.0]], array![[1.0], [1.0]], vec![]);

        let mut ws = Workspace::new(1, 2);
        let ll = ws.e_step(&data, &sel, &p).unwrap();
        let dens = 0.5 * log_gaussian(0.5, 0.0, 1.0).exp() + 0.5 * log_gaussian(0.5, 1.0, 1.0).exp();
        assert!((ll - dens.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_extreme_densities_do_not_underflow() {
        let c = ContinuousData::from_options(&[vec![Some(1e4)]]).unwrap();
        let data = MixedData::new(Some(c), None, None).unwrap();
        let sel = Selection::all(&data);
        let p = MixedParams::new(array![0.5, 0.5], array![[0.0], [1.0]], array![[0.01], [0.01]], vec![]);

        let mut ws = Workspace::new(1, 2);
        let ll = ws.e_step(&data, &sel, &p).unwrap();
        assert!(ll.is_finite());
        assert!((ws.resp.view()[[0, 1]] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_probability_everywhere_is_error() {
        let q = CategoricalData::from_codes(&[vec![1]], &[2]).unwrap();
        let data = MixedData::new(None, Some(q), None).unwrap();
        let sel = Selection::all(&data);
        let p = MixedParams::new(
            array![0.5, 0.5],
            Array2::zeros((2, 0)),
            Array2::zeros((2, 0)),
            vec![array![[1.0, 0.0], [1.0, 0.0]]],
        );
        let mut ws = Workspace::new(1, 2);
        assert_eq!(
            ws.e_step(&data, &sel, &p).unwrap_err(),
            Error::NonFiniteLikelihood { row: 0 }
        );
    }

    #[test]
    fn test_map_ties_go_to_lowest_index() {
        let mut resp = Responsibilities::new(2, 3);
        resp.tik = array![[0.25, 0.5, 0.25], [0.4, 0.2, 0.4]];
        assert_eq!(resp.map_classification(), vec![1, 0]);
    }

    proptest! {
        #[test]
        fn responsibilities_rows_sum_to_one(
            xs in proptest::collection::vec(-50.0f64..50.0, 1..40),
            mus in proptest::collection::vec(-20.0f64..20.0, 2..5),
            sd in 0.05f64..5.0,
        ) {
            let g = mus.len();
            let n = xs.len();
            let c = ContinuousData::new(
                Array2::from_shape_vec((n, 1), xs).unwrap(),
                Array2::from_elem((n, 1), true),
            ).unwrap();
            let data = MixedData::new(Some(c), None, None).unwrap();
            let sel = Selection::all(&data);
            let p = MixedParams::new(
                Array1::from_elem(g, 1.0 / g as f64),
                Array2::from_shape_vec((g, 1), mus).unwrap(),
                Array2::from_elem((g, 1), sd),
                vec![],
            );

            let mut ws = Workspace::new(n, g);
            ws.e_step(&data, &sel, &p).unwrap();
            for row in ws.resp.view().rows() {
                prop_assert!((row.sum() - 1.0).abs() < 1e-9);
                prop_assert!(row.iter().all(|&t| (0.0..=1.0).contains(&t)));
            }
        }
    }
}
