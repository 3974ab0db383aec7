//! # mixsel
//!
//! Mixture-model clustering for datasets mixing continuous and categorical
//! variables, with missing continuous values, row weights and a
//! per-variable selection of the variables that drive the partition.
//!
//! The fitting engine lives in [`mixture`]; datasets are built with
//! [`data`]; [`criteria`] scores fitted models.
//!
//! ```rust
//! use mixsel::{ContinuousData, MixedData, Selection, Strategy};
//!
//! let rows: Vec<Vec<Option<f64>>> = [0.0, 0.1, 0.3, 8.0, 8.2, 8.1]
//!     .iter()
//!     .map(|&x| vec![Some(x)])
//!     .collect();
//! let data = MixedData::new(Some(ContinuousData::from_options(&rows).unwrap()), None, None).unwrap();
//!
//! let outcome = Strategy::new()
//!     .with_n_candidates(20)
//!     .with_n_keep(10)
//!     .with_seed(1)
//!     .fit(&data, Selection::all(&data), 2)
//!     .unwrap();
//! assert!(outcome.is_fitted());
//! ```

#![forbid(unsafe_code)]

pub mod criteria;
pub mod data;
/// Error types used across `mixsel`.
pub mod error;
pub mod mixture;
pub mod params;
pub mod selection;


pub use data::{CategoricalData, ContinuousData, MixedData};
pub use error::{Error, Result};
pub use mixture::{FitOutcome, FittedModel, MixedEm, Strategy};
pub use params::MixedParams;
pub use selection::Selection;
