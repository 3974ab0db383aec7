//! Parameter sets of a mixed mixture model.
//!
//! A [`MixedParams`] holds only the cluster-specific part of a model: the
//! mixing proportions, a mean and standard deviation per cluster for each
//! *selected* continuous variable, and a probability table per cluster for
//! each *selected* categorical variable. Parameters of unselected variables
//! are computed once, at output time.
//!
//! Columns of `mu`/`sd` and entries of `alpha` follow the order of
//! [`Selection::continuous`] and [`Selection::categorical`].

use crate::data::MixedData;
use crate::error::{Error, Result};
use crate::selection::Selection;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_distr::Exp1;

/// Cluster-specific parameters of one candidate.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MixedParams {
    /// Mixing proportions, length g.
    pub pi: Array1<f64>,
    /// Means, g × (selected continuous variables).
    pub mu: Array2<f64>,
    /// Standard deviations, g × (selected continuous variables).
    pub sd: Array2<f64>,
    /// One g × (modalities) probability table per selected categorical variable.
    pub alpha: Vec<Array2<f64>>,
}

impl MixedParams {
    /// Wrap externally computed parameters. Shapes are checked with
    /// [`MixedParams::check`] when the set is handed to a fit.
    pub fn new(pi: Array1<f64>, mu: Array2<f64>, sd: Array2<f64>, alpha: Vec<Array2<f64>>) -> Self {
        Self { pi, mu, sd, alpha }
    }

    /// Draw a random starting point.
    ///
    /// Proportions start uniform. Each mean is the value of a random
    /// observation of that variable, each standard deviation the global
    /// standard deviation of the variable (1 when it is constant). Each
    /// categorical row is a draw from a flat Dirichlet.
    pub fn random(data: &MixedData, selection: &Selection, g: usize, rng: &mut impl Rng) -> Self {
        let n_cont = selection.continuous().len();
        let mut mu = Array2::zeros((g, n_cont));
        let mut sd = Array2::ones((g, n_cont));

        if let Some(cont) = data.continuous() {
            for (loc, &j) in selection.continuous().iter().enumerate() {
                let keep = cont.observed_values(j);
                let (_, spread) = mean_and_sd(&keep);
                let spread = if spread > 0.0 { spread } else { 1.0 };
                for k in 0..g {
                    mu[[k, loc]] = keep[rng.random_range(0..keep.len())];
                    sd[[k, loc]] = spread;
                }
            }
        }

        let mut alpha = Vec::with_capacity(selection.categorical().len());
        if let Some(cat) = data.categorical() {
            for &j in selection.categorical() {
                let m = cat.n_modalities(j);
                let mut table = Array2::zeros((g, m));
                for mut row in table.rows_mut() {
                    for a in row.iter_mut() {
                        *a = rng.sample::<f64, _>(Exp1);
                    }
                    let s = row.sum();
                    row /= s;
                }
                alpha.push(table);
            }
        }

        Self {
            pi: Array1::from_elem(g, 1.0 / g as f64),
            mu,
            sd,
            alpha,
        }
    }

    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.pi.len()
    }

    /// Check the shapes against a dataset and selection.
    pub fn check(&self, data: &MixedData, selection: &Selection, g: usize) -> Result<()> {
        if self.pi.len() != g {
            return Err(Error::DimensionMismatch {
                expected: g,
                found: self.pi.len(),
            });
        }
        let shape = (g, selection.continuous().len());
        for m in [&self.mu, &self.sd] {
            if m.dim() != shape {
                return Err(Error::DimensionMismatch {
                    expected: shape.0 * shape.1,
                    found: m.len(),
                });
            }
        }
        if self.alpha.len() != selection.categorical().len() {
            return Err(Error::DimensionMismatch {
                expected: selection.categorical().len(),
                found: self.alpha.len(),
            });
        }
        if let Some(cat) = data.categorical() {
            for (table, &j) in self.alpha.iter().zip(selection.categorical()) {
                let m = cat.n_modalities(j);
                if table.dim() != (g, m) {
                    return Err(Error::DimensionMismatch {
                        expected: g * m,
                        found: table.len(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Population (maximum-likelihood) mean and standard deviation.
pub(crate) fn mean_and_sd(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, var.sqrt())
}
