//! Mixture-model clustering of mixed continuous/categorical data.
//!
//! ## The Model
//!
//! Each observation is drawn from one of g clusters. Given its cluster,
//! variables are independent: a continuous variable is Gaussian, a
//! categorical variable is multinomial over its modalities.
//!
//! ```text
//! P(x) = Σₖ πₖ × Πⱼ N(xⱼ | μₖⱼ, σₖⱼ) × Πⱼ αₖⱼ[xⱼ]
//! ```
//!
//! A per-variable selection flag decides whether a variable is
//! *discriminative* (cluster-specific parameters) or not (one global
//! parameter set shared by all clusters). Unselected variables do not
//! influence the partition; their parameters are estimated once, at output.
//!
//! ## Missing Values and Weights
//!
//! A missing continuous value contributes nothing to the density of its row
//! and nothing to the re-estimated parameters. Row weights count an
//! observation several times (aggregated data) in the categorical tables.
//!
//! ## EM and Restarts
//!
//! 1. **E-step** ([`density`]): log-joint densities per cluster, normalized
//!    with log-sum-exp into responsibilities
//! 2. **M-step** ([`mstep`]): weighted re-estimation of π, μ, σ and α
//! 3. **Degeneracy** ([`degeneracy`]): candidates with a collapsed σ are discarded
//!
//! A pool of random candidates ([`MixedEm`]) is trial-run, the best ones are
//! run to convergence ([`Strategy`]) and the winner is assembled into a
//! [`FittedModel`].
//!
//! ## Usage
//!
//! ```rust
//! use mixsel::data::{CategoricalData, ContinuousData, MixedData};
//! use mixsel::mixture::Strategy;
//! use mixsel::Selection;
//!
//! let continuous = ContinuousData::from_options(&[
//!     vec![Some(0.0)],
//!     vec![Some(0.2)],
//!     vec![None],
//!     vec![Some(10.0)],
//!     vec![Some(10.3)],
//!     vec![Some(9.9)],
//! ])
//! .unwrap();
//! let categorical =
//!     CategoricalData::from_codes(&[vec![0], vec![0], vec![0], vec![1], vec![1], vec![1]], &[2])
//!         .unwrap();
//! let data = MixedData::new(Some(continuous), Some(categorical), None).unwrap();
//!
//! let outcome = Strategy::new()
//!     .with_n_candidates(20)
//!     .with_n_keep(10)
//!     .with_seed(42)
//!     .fit(&data, Selection::all(&data), 2)
//!     .unwrap();
//!
//! let model = outcome.model().unwrap();
//! assert_eq!(model.z_map[0], model.z_map[1]);
//! assert_ne!(model.z_map[0], model.z_map[3]);
//! ```

pub mod degeneracy;
pub mod density;
mod engine;
pub mod mstep;
mod output;
mod strategy;

pub use degeneracy::{is_degenerate, DEGENERACY_THRESHOLD};
pub use density::{log_gaussian, LogJoint, Responsibilities, Workspace};
pub use engine::{MixedEm, RunSummary};
pub use mstep::m_step;
pub use output::{FitOutcome, FittedModel};
pub use strategy::Strategy;
