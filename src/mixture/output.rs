//! Assembly of the fitted model from the winning candidate.
//!
//! Selected variables take their per-cluster parameters from the candidate.
//! Unselected variables get one global estimate, replicated into every
//! cluster row, and contribute their global log-likelihood once:
//!
//! - continuous: population mean and standard deviation of the observed
//!   values, plus Σ_observed ln N(xᵢ | μ, σ). A deviation below
//!   [`DEGENERACY_THRESHOLD`] is a collapse, as for a selected variable,
//!   and no model is reported.
//! - categorical: weighted modality frequencies fₕ = Wₕ / W, plus Σₕ Wₕ ln fₕ
//!
//! The total log-likelihood adds the selected-block log-likelihood of a final
//! E-step, whose responsibilities also give the MAP classification.

use super::degeneracy::DEGENERACY_THRESHOLD;
use super::density::{masked_log_gaussian_sum, Workspace};
use crate::criteria;
use crate::data::MixedData;
use crate::params::{mean_and_sd, MixedParams};
use crate::selection::Selection;
use log::{debug, warn};
use ndarray::{Array1, Array2};

/// A fitted mixture model.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FittedModel {
    /// Selection flags the model was fitted with, continuous first.
    pub omega: Vec<bool>,
    /// Mixing proportions, length g.
    pub pi: Array1<f64>,
    /// Means, g × (all continuous variables).
    pub mu: Array2<f64>,
    /// Standard deviations, g × (all continuous variables).
    pub sd: Array2<f64>,
    /// One g × (modalities) table per categorical variable.
    pub alpha: Vec<Array2<f64>>,
    /// Total log-likelihood.
    pub loglik: f64,
    /// Bayesian information criterion (larger is better).
    pub bic: f64,
    /// Integrated completed likelihood (larger is better).
    pub icl: f64,
    /// Share of the candidate pool found degenerate.
    pub degeneracy_rate: f64,
    /// Final responsibilities, N × g.
    pub tik: Array2<f64>,
    /// MAP cluster of every row.
    pub z_map: Vec<usize>,
}

impl FittedModel {
    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.pi.len()
    }
}

/// Result of a fit: a model, or the report that too many candidates degenerated.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FitOutcome {
    /// A usable model.
    Fitted(FittedModel),
    /// Restarts exhausted; no parameters are reported.
    Exhausted {
        /// Degenerate candidates counted.
        n_degenerate: usize,
        /// Size of the candidate pool.
        n_candidates: usize,
    },
}

impl FitOutcome {
    /// Degeneracy rate: the model's rate, or 1 when exhausted.
    pub fn degeneracy_rate(&self) -> f64 {
        match self {
            FitOutcome::Fitted(m) => m.degeneracy_rate,
            FitOutcome::Exhausted { .. } => 1.0,
        }
    }

    /// The fitted model, if any.
    pub fn model(&self) -> Option<&FittedModel> {
        match self {
            FitOutcome::Fitted(m) => Some(m),
            FitOutcome::Exhausted { .. } => None,
        }
    }

    /// Take the fitted model, if any.
    pub fn into_model(self) -> Option<FittedModel> {
        match self {
            FitOutcome::Fitted(m) => Some(m),
            FitOutcome::Exhausted { .. } => None,
        }
    }

    /// Whether a model was produced.
    pub fn is_fitted(&self) -> bool {
        matches!(self, FitOutcome::Fitted(_))
    }
}

/// Build the fitted model from `params`, unless `n_degenerate` reached `n_keep`.
pub(crate) fn assemble(
    data: &MixedData,
    selection: &Selection,
    params: &MixedParams,
    ws: &mut Workspace,
    n_degenerate: usize,
    n_candidates: usize,
    n_keep: usize,
) -> FitOutcome {
    let exhausted = FitOutcome::Exhausted {
        n_degenerate,
        n_candidates,
    };
    if n_degenerate >= n_keep {
        warn!("{n_degenerate} of {n_candidates} candidates degenerate; no model reported");
        return exhausted;
    }

    let g = params.n_clusters();
    let mut loglik_global = 0.0;

    let pc = data.n_continuous();
    let mut mu = Array2::ones((g, pc));
    let mut sd = Array2::ones((g, pc));
    if let Some(cont) = data.continuous() {
        let mut loc = 0;
        for j in 0..pc {
            if selection.is_continuous_selected(j) {
                mu.column_mut(j).assign(&params.mu.column(loc));
                sd.column_mut(j).assign(&params.sd.column(loc));
                loc += 1;
            } else {
                let (m, s) = mean_and_sd(&cont.observed_values(j));
                if !(s >= DEGENERACY_THRESHOLD) {
                    warn!("unselected continuous variable {j} has deviation {s:e}; no model reported");
                    return exhausted;
                }
                mu.column_mut(j).fill(m);
                sd.column_mut(j).fill(s);
                loglik_global += masked_log_gaussian_sum(data, j, m, s);
            }
        }
    }

    let mut alpha = Vec::with_capacity(data.n_categorical());
    if let Some(cat) = data.categorical() {
        let mut loc = 0;
        for j in 0..cat.n_cols() {
            if selection.is_categorical_selected(j) {
                alpha.push(params.alpha[loc].clone());
                loc += 1;
            } else {
                let totals: Array1<f64> = cat
                    .members(j)
                    .iter()
                    .map(|rows| data.weight_of(rows))
                    .collect();
                let freq = &totals / totals.sum();
                let mut table = Array2::zeros((g, freq.len()));
                for mut row in table.rows_mut() {
                    row.assign(&freq);
                }
                loglik_global += totals
                    .iter()
                    .zip(freq.iter())
                    .filter(|(&w, _)| w > 0.0)
                    .map(|(&w, &f)| w * f.ln())
                    .sum::<f64>();
                alpha.push(table);
            }
        }
    }

    let loglik_selected = match ws.e_step(data, selection, params) {
        Ok(ll) => ll,
        Err(e) => {
            warn!("final E-step failed ({e}); no model reported");
            return exhausted;
        }
    };
    let loglik = loglik_selected + loglik_global;
    let tik = ws.resp.view().to_owned();
    let z_map = ws.resp.map_classification();

    let nu = criteria::n_free_parameters(data, selection, g);
    let bic = criteria::bic(loglik, nu, data.n_rows());
    let icl = criteria::icl(bic, tik.view(), &z_map);
    debug!("fitted g={g}: loglik={loglik:.4}, bic={bic:.4}, icl={icl:.4}");

    FitOutcome::Fitted(FittedModel {
        omega: selection.omega().to_vec(),
        pi: params.pi.clone(),
        mu,
        sd,
        alpha,
        loglik,
        bic,
        icl,
        degeneracy_rate: n_degenerate as f64 / n_candidates as f64,
        tik,
        z_map,
    })
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;
    use crate::mixture::Strategy;
    use ndarray::array;

    fn model() -> FittedModel {
        FittedModel {
            omega: vec![true, false],
            pi: array![0.25, 0.75],
            mu: array![[0.5, 2.0], [8.0, 2.0]],
            sd: array![[1.0, 0.5], [1.5, 0.5]],
            alpha: vec![array![[0.5, 0.5], [0.125, 0.875]]],
            loglik: -12.5,
            bic: -20.0,
            icl: -21.0,
            degeneracy_rate: 0.25,
            tik: array![[1.0, 0.0], [0.5, 0.5], [0.0, 1.0]],
            z_map: vec![0, 0, 1],
        }
    }

    #[test]
    fn test_fit_outcome_json_roundtrip() {
        let fitted = FitOutcome::Fitted(model());
        let json = serde_json::to_string(&fitted).unwrap();
        let back: FitOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fitted);
        assert_eq!(back.model().unwrap().n_clusters(), 2);

        let exhausted = FitOutcome::Exhausted {
            n_degenerate: 7,
            n_candidates: 10,
        };
        let json = serde_json::to_string(&exhausted).unwrap();
        assert_eq!(serde_json::from_str::<FitOutcome>(&json).unwrap(), exhausted);
    }

    #[test]
    fn test_strategy_json_roundtrip() {
        let strategy = Strategy::new()
            .with_n_candidates(40)
            .with_n_keep(8)
            .with_tol_keep(0.25)
            .with_seed(99);
        let json = serde_json::to_string(&strategy).unwrap();
        let back: Strategy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, strategy);
        assert_eq!(back.n_candidates(), 40);
        assert_eq!(back.n_keep(), 8);
    }
}
