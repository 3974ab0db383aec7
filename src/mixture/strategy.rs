//! Multi-restart fitting.
//!
//! EM only finds a local maximum, and a bad start can collapse a component.
//! The strategy therefore:
//!
//! 1. draws `n_candidates` random starting points;
//! 2. runs every candidate for `iter_small` iterations, counting the ones
//!    that degenerate;
//! 3. gives up when `n_keep` or more candidates degenerated;
//! 4. runs the `n_keep` best survivors until the log-likelihood gain drops
//!    below `tol_keep` (at most `iter_keep` iterations);
//! 5. reports the candidate with the highest log-likelihood.

use super::engine::MixedEm;
use super::output::FitOutcome;
use crate::data::MixedData;
use crate::error::{Error, Result};
use crate::selection::Selection;
use log::{debug, warn};
use rand::prelude::*;

/// Restart and convergence settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Strategy {
    /// Random starting points drawn.
    n_candidates: usize,
    /// Iterations of the trial run of each candidate.
    iter_small: usize,
    /// Candidates kept for the long run; also the tolerated degenerate count.
    n_keep: usize,
    /// Maximum iterations of a long run.
    iter_keep: usize,
    /// Log-likelihood gain under which a long run stops.
    tol_keep: f64,
    /// Random seed.
    seed: Option<u64>,
}

impl Strategy {
    /// Default settings: 250 candidates, 20 trial iterations, 50 kept,
    /// at most 1000 long-run iterations, tolerance 1e-6.
    pub fn new() -> Self {
        Self {
            n_candidates: 250,
            iter_small: 20,
            n_keep: 50,
            iter_keep: 1000,
            tol_keep: 1e-6,
            seed: None,
        }
    }

    /// Set the number of random starting points.
    pub fn with_n_candidates(mut self, n: usize) -> Self {
        self.n_candidates = n;
        self
    }

    /// Set the trial-run length.
    pub fn with_iter_small(mut self, iter: usize) -> Self {
        self.iter_small = iter;
        self
    }

    /// Set the number of candidates kept for the long run.
    pub fn with_n_keep(mut self, n: usize) -> Self {
        self.n_keep = n;
        self
    }

    /// Set the maximum long-run length.
    pub fn with_iter_keep(mut self, iter: usize) -> Self {
        self.iter_keep = iter;
        self
    }

    /// Set the long-run tolerance.
    pub fn with_tol_keep(mut self, tol: f64) -> Self {
        self.tol_keep = tol;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of random starting points.
    pub fn n_candidates(&self) -> usize {
        self.n_candidates
    }

    /// Candidates kept for the long run.
    pub fn n_keep(&self) -> usize {
        self.n_keep
    }

    fn validate(&self) -> Result<()> {
        if self.n_candidates == 0 {
            return Err(Error::InvalidParameter {
                name: "n_candidates",
                message: "must be > 0",
            });
        }
        if self.n_keep == 0 || self.n_keep > self.n_candidates {
            return Err(Error::InvalidParameter {
                name: "n_keep",
                message: "must be in 1..=n_candidates",
            });
        }
        if !(self.tol_keep >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "tol_keep",
                message: "must be >= 0",
            });
        }
        Ok(())
    }

    /// Fit a `g`-cluster model of `data` with the given selection.
    ///
    /// Invalid settings or inputs are errors. Degenerate candidates are
    /// not: when too many collapse the outcome is [`FitOutcome::Exhausted`].
    pub fn fit(&self, data: &MixedData, selection: Selection, g: usize) -> Result<FitOutcome> {
        self.validate()?;

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };
        let mut em = MixedEm::with_random_candidates(
            data,
            selection,
            g,
            self.n_candidates,
            self.n_keep,
            &mut rng,
        )?;

        let all: Vec<usize> = (0..self.n_candidates).collect();
        let trials = em.run_many(&all, self.iter_small, 0.0);
        for t in &trials {
            if t.degenerate {
                em.record_degenerate();
            }
        }
        debug!(
            "trial runs: {} of {} candidates degenerate",
            em.n_degenerate(),
            self.n_candidates
        );
        if em.n_degenerate() >= self.n_keep {
            return Ok(em.output());
        }

        let mut ranked: Vec<usize> = all.into_iter().filter(|&i| !trials[i].degenerate).collect();
        ranked.sort_by(|&a, &b| trials[b].loglik.total_cmp(&trials[a].loglik));
        ranked.truncate(self.n_keep);

        let finals = em.run_many(&ranked, self.iter_keep, self.tol_keep);
        let mut best: Option<(usize, f64)> = None;
        for (&idx, summary) in ranked.iter().zip(&finals) {
            debug!(
                "candidate {idx}: loglik={:.4} after {} iterations{}",
                summary.loglik,
                summary.iterations,
                if summary.degenerate { " (degenerate)" } else { "" }
            );
            if !summary.degenerate && best.map_or(true, |(_, ll)| summary.loglik > ll) {
                best = Some((idx, summary.loglik));
            }
        }

        match best {
            Some((idx, _)) => {
                em.switch_active(idx)?;
                Ok(em.output())
            }
            None => {
                warn!("every kept candidate degenerated during the long run");
                Ok(FitOutcome::Exhausted {
                    n_degenerate: em.n_degenerate(),
                    n_candidates: self.n_candidates,
                })
            }
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ContinuousData;

    fn two_groups() -> MixedData {
        let rows: Vec<Vec<Option<f64>>> = [-0.3, 0.0, 0.1, 0.4, 9.7, 10.0, 10.2, 10.4]
            .iter()
            .map(|&x| vec![Some(x)])
            .collect();
        MixedData::new(Some(ContinuousData::from_options(&rows).unwrap()), None, None).unwrap()
    }

    #[test]
    fn test_fit_two_groups() {
        let data = two_groups();
        let outcome = Strategy::new()
            .with_n_candidates(20)
            .with_n_keep(10)
            .with_seed(42)
            .fit(&data, Selection::all(&data), 2)
            .unwrap();

        let model = outcome.model().expect("a model");
        let z = &model.z_map;
        assert!(z[..4].iter().all(|&k| k == z[0]));
        assert!(z[4..].iter().all(|&k| k == z[4]));
        assert_ne!(z[0], z[4]);
        assert!(model.degeneracy_rate < 1.0);
    }

    #[test]
    fn test_deterministic_with_seed() {
        let data = two_groups();
        let strategy = Strategy::new().with_n_candidates(10).with_n_keep(3).with_seed(7);
        let a = strategy.fit(&data, Selection::all(&data), 2).unwrap();
        let b = strategy.fit(&data, Selection::all(&data), 2).unwrap();
        assert_eq!(a, b, "same seed should give same result");
    }

    #[test]
    fn test_invalid_settings() {
        let data = two_groups();
        let too_many_kept = Strategy::new().with_n_candidates(3).with_n_keep(4);
        assert!(too_many_kept.fit(&data, Selection::all(&data), 2).is_err());

        let bad_g = Strategy::new().with_n_candidates(3).with_n_keep(1);
        assert!(bad_g.fit(&data, Selection::all(&data), 9).is_err());
    }

    #[test]
    fn test_exhausted_when_every_start_collapses() {
        // A constant variable: the first M-step sets every deviation to zero.
        let rows: Vec<Vec<Option<f64>>> = (0..6).map(|_| vec![Some(5.0)]).collect();
        let data =
            MixedData::new(Some(ContinuousData::from_options(&rows).unwrap()), None, None).unwrap();

        let outcome = Strategy::new()
            .with_n_candidates(10)
            .with_n_keep(2)
            .with_seed(1)
            .fit(&data, Selection::all(&data), 2)
            .unwrap();

        assert_eq!(
            outcome,
            FitOutcome::Exhausted {
                n_degenerate: 10,
                n_candidates: 10
            }
        );
        assert_eq!(outcome.degeneracy_rate(), 1.0);
    }

    #[test]
    fn test_constant_unselected_variable_yields_no_model() {
        let rows: Vec<Vec<Option<f64>>> = [0.0, 0.1, 0.2, 9.8, 9.9, 10.0]
            .iter()
            .map(|&x| vec![Some(x), Some(3.0)])
            .collect();
        let data =
            MixedData::new(Some(ContinuousData::from_options(&rows).unwrap()), None, None).unwrap();
        let sel = Selection::from_flags(&[1, 0], &data).unwrap();

        let outcome = Strategy::new()
            .with_n_candidates(20)
            .with_n_keep(10)
            .with_seed(42)
            .fit(&data, sel, 2)
            .unwrap();

        assert!(!outcome.is_fitted());
        assert_eq!(outcome.degeneracy_rate(), 1.0);
    }
}
