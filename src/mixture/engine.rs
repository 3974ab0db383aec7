//! Candidate pool and the E/M operations acting on the active candidate.
//!
//! [`MixedEm`] owns a fixed pool of independently initialized parameter
//! sets. Exactly one is *active*, addressed by index; every E-step, M-step
//! and degeneracy check applies to it. The dataset and selection are shared
//! read-only, so candidates can also be run side by side, each with a
//! private [`Workspace`] (see [`MixedEm::run_many`]).

use super::degeneracy::is_degenerate;
use super::density::Workspace;
use super::mstep::m_step;
use super::output::{assemble, FitOutcome};
use crate::data::MixedData;
use crate::error::{Error, Result};
use crate::params::MixedParams;
use crate::selection::Selection;
use log::trace;
use ndarray::ArrayView2;
use rand::Rng;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// What happened while running EM on one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Log-likelihood of the selected block at the final parameters
    /// (`-inf` when degenerate).
    pub loglik: f64,
    /// Completed E/M iterations.
    pub iterations: usize,
    /// Whether the candidate collapsed.
    pub degenerate: bool,
}

impl RunSummary {
    fn degenerate(iterations: usize) -> Self {
        Self {
            loglik: f64::NEG_INFINITY,
            iterations,
            degenerate: true,
        }
    }
}

/// Run EM on one parameter set until `max_iter` iterations or until the
/// log-likelihood increases by less than `tol`.
///
/// An emptied cluster, a non-finite likelihood or a collapsed deviation
/// stops the run and marks it degenerate.
pub(crate) fn run_candidate(
    data: &MixedData,
    selection: &Selection,
    params: &mut MixedParams,
    ws: &mut Workspace,
    max_iter: usize,
    tol: f64,
) -> RunSummary {
    let mut previous = f64::NEG_INFINITY;
    let mut iterations = 0;

    while iterations < max_iter {
        let loglik = match ws.e_step(data, selection, params) {
            Ok(ll) => ll,
            Err(e) => {
                trace!("E-step failed after {iterations} iterations: {e}");
                return RunSummary::degenerate(iterations);
            }
        };
        trace!("iteration {iterations}: loglik={loglik:.6}");
        if iterations > 0 && loglik - previous < tol {
            break;
        }
        if let Err(e) = m_step(data, selection, ws.resp.view(), params) {
            trace!("M-step failed after {iterations} iterations: {e}");
            return RunSummary::degenerate(iterations);
        }
        iterations += 1;
        if is_degenerate(params, selection) {
            trace!("standard deviation collapsed after {iterations} iterations");
            return RunSummary::degenerate(iterations);
        }
        previous = loglik;
    }

    match ws.e_step(data, selection, params) {
        Ok(loglik) => RunSummary {
            loglik,
            iterations,
            degenerate: false,
        },
        Err(_) => RunSummary::degenerate(iterations),
    }
}

/// Pool of candidate parameter sets for one (selection, g) configuration.
#[derive(Debug, Clone)]
pub struct MixedEm<'a> {
    data: &'a MixedData,
    selection: Selection,
    g: usize,
    n_keep: usize,
    candidates: Vec<MixedParams>,
    active: usize,
    workspace: Workspace,
    n_degenerate: usize,
}

impl<'a> MixedEm<'a> {
    /// Build from externally initialized candidates.
    ///
    /// `n_keep` is the number of degenerate candidates tolerated: once
    /// [`MixedEm::n_degenerate`] reaches it, [`MixedEm::output`] reports
    /// exhaustion. The first candidate starts active.
    pub fn new(
        data: &'a MixedData,
        selection: Selection,
        g: usize,
        candidates: Vec<MixedParams>,
        n_keep: usize,
    ) -> Result<Self> {
        let n = data.n_rows();
        if g == 0 || g > n {
            return Err(Error::InvalidClusterCount {
                requested: g,
                n_items: n,
            });
        }
        if candidates.is_empty() {
            return Err(Error::InvalidParameter {
                name: "candidates",
                message: "the pool needs at least one candidate",
            });
        }
        if n_keep == 0 {
            return Err(Error::InvalidParameter {
                name: "n_keep",
                message: "must be > 0",
            });
        }
        selection.check(data)?;
        for c in &candidates {
            c.check(data, &selection, g)?;
        }

        Ok(Self {
            data,
            selection,
            g,
            n_keep,
            candidates,
            active: 0,
            workspace: Workspace::new(n, g),
            n_degenerate: 0,
        })
    }

    /// Build with `n_candidates` random starting points.
    pub fn with_random_candidates(
        data: &'a MixedData,
        selection: Selection,
        g: usize,
        n_candidates: usize,
        n_keep: usize,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        selection.check(data)?;
        let candidates = (0..n_candidates)
            .map(|_| MixedParams::random(data, &selection, g, rng))
            .collect();
        Self::new(data, selection, g, candidates, n_keep)
    }

    /// Make candidate `index` the target of subsequent operations.
    pub fn switch_active(&mut self, index: usize) -> Result<()> {
        if index >= self.candidates.len() {
            return Err(Error::InvalidParameter {
                name: "index",
                message: "candidate index out of range",
            });
        }
        self.active = index;
        Ok(())
    }

    /// Index of the active candidate.
    pub fn active(&self) -> usize {
        self.active
    }

    /// Parameters of the active candidate.
    pub fn params(&self) -> &MixedParams {
        &self.candidates[self.active]
    }

    /// Parameters of candidate `index`.
    pub fn candidate(&self, index: usize) -> Option<&MixedParams> {
        self.candidates.get(index)
    }

    /// Size of the pool.
    pub fn n_candidates(&self) -> usize {
        self.candidates.len()
    }

    /// Number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.g
    }

    /// The selection this pool was built for.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// E-step on the active candidate. Returns the selected-block log-likelihood.
    pub fn e_step(&mut self) -> Result<f64> {
        self.workspace
            .e_step(self.data, &self.selection, &self.candidates[self.active])
    }

    /// M-step on the active candidate from the last responsibilities.
    pub fn m_step(&mut self) -> Result<()> {
        m_step(
            self.data,
            &self.selection,
            self.workspace.resp.view(),
            &mut self.candidates[self.active],
        )
    }

    /// Degeneracy check of the active candidate.
    pub fn is_degenerate(&self) -> bool {
        is_degenerate(&self.candidates[self.active], &self.selection)
    }

    /// Count one more degenerate candidate.
    pub fn record_degenerate(&mut self) {
        self.n_degenerate += 1;
    }

    /// Number of candidates found degenerate so far.
    pub fn n_degenerate(&self) -> usize {
        self.n_degenerate
    }

    /// Raw log-joint densities of the last E-step.
    pub fn log_joint(&self) -> ArrayView2<'_, f64> {
        self.workspace.log_joint.view()
    }

    /// Responsibilities of the last E-step.
    pub fn responsibilities(&self) -> ArrayView2<'_, f64> {
        self.workspace.resp.view()
    }

    /// Run EM on the active candidate; see [`RunSummary`].
    pub fn run(&mut self, max_iter: usize, tol: f64) -> RunSummary {
        run_candidate(
            self.data,
            &self.selection,
            &mut self.candidates[self.active],
            &mut self.workspace,
            max_iter,
            tol,
        )
    }

    /// Run EM on the candidates at `indices`, each with a private workspace.
    ///
    /// Summaries are returned in the order of `indices`. A candidate listed
    /// more than once is run once and its summary repeated at every position.
    /// An index outside the pool is reported as a degenerate run with zero
    /// iterations. With the `parallel` feature the runs are spread over the
    /// rayon pool; results do not depend on it.
    pub fn run_many(&mut self, indices: &[usize], max_iter: usize, tol: f64) -> Vec<RunSummary> {
        let data = self.data;
        let selection = &self.selection;
        let (n, g) = (data.n_rows(), self.g);

        let mut wanted: Vec<Vec<usize>> = vec![Vec::new(); self.candidates.len()];
        for (pos, &idx) in indices.iter().enumerate() {
            if let Some(slots) = wanted.get_mut(idx) {
                slots.push(pos);
            }
        }
        let wanted = &wanted;

        let run = |(idx, params): (usize, &mut MixedParams)| {
            if wanted[idx].is_empty() {
                return None;
            }
            let mut ws = Workspace::new(n, g);
            Some((idx, run_candidate(data, selection, params, &mut ws, max_iter, tol)))
        };

        #[cfg(feature = "parallel")]
        let done: Vec<(usize, RunSummary)> = self
            .candidates
            .par_iter_mut()
            .enumerate()
            .filter_map(run)
            .collect();

        #[cfg(not(feature = "parallel"))]
        let done: Vec<(usize, RunSummary)> = self
            .candidates
            .iter_mut()
            .enumerate()
            .filter_map(run)
            .collect();

        let mut out = vec![RunSummary::degenerate(0); indices.len()];
        for (idx, summary) in done {
            for &pos in &wanted[idx] {
                out[pos] = summary;
            }
        }
        out
    }

    /// Assemble the fitted model from the active candidate.
    pub fn output(&mut self) -> FitOutcome {
        assemble(
            self.data,
            &self.selection,
            &self.candidates[self.active],
            &mut self.workspace,
            self.n_degenerate,
            self.candidates.len(),
            self.n_keep,
        )
    }
}
