//! Mixed datasets: continuous values with missingness, categorical modalities, row weights.
//!
//! A [`MixedData`] is built once and only read afterwards. Continuous
//! variables carry an explicit "is observed" mask; the value stored at an
//! unobserved position is never read by the estimators (it may be `NaN`).
//! Categorical variables are fully observed and are stored as, for each
//! modality, the list of rows holding it. The lists of one variable
//! partition the rows exactly once.
//!
//! ```rust
//! use mixsel::data::{CategoricalData, ContinuousData, MixedData};
//!
//! let continuous = ContinuousData::from_options(&[
//!     vec![Some(0.1)],
//!     vec![None],
//!     vec![Some(9.8)],
//! ])
//! .unwrap();
//! let categorical = CategoricalData::from_codes(&[vec![0], vec![1], vec![1]], &[2]).unwrap();
//!
//! let data = MixedData::new(Some(continuous), Some(categorical), None).unwrap();
//! assert_eq!(data.n_rows(), 3);
//! assert_eq!(data.n_variables(), 2);
//! ```

use crate::error::{Error, Result};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

/// Continuous block: an N×Pc value matrix and its observed mask.
#[derive(Debug, Clone)]
pub struct ContinuousData {
    values: Array2<f64>,
    observed: Array2<bool>,
}

impl ContinuousData {
    /// Build from a value matrix and an observed mask of the same shape.
    pub fn new(values: Array2<f64>, observed: Array2<bool>) -> Result<Self> {
        if values.dim() != observed.dim() {
            return Err(Error::DimensionMismatch {
                expected: values.len(),
                found: observed.len(),
            });
        }
        if values.nrows() == 0 || values.ncols() == 0 {
            return Err(Error::EmptyInput);
        }
        for (j, mask) in observed.columns().into_iter().enumerate() {
            if !mask.iter().any(|&o| o) {
                return Err(Error::NoObservedValues { variable: j });
            }
        }
        if values
            .iter()
            .zip(observed.iter())
            .any(|(&x, &o)| o && !x.is_finite())
        {
            return Err(Error::InvalidParameter {
                name: "values",
                message: "observed continuous values must be finite",
            });
        }
        Ok(Self { values, observed })
    }

    /// Build from a value matrix where `NaN` marks a missing value.
    pub fn from_nan(values: Array2<f64>) -> Result<Self> {
        let observed = values.mapv(|x| !x.is_nan());
        Self::new(values, observed)
    }

    /// Build from rows of optional values; `None` marks a missing value.
    pub fn from_options(rows: &[Vec<Option<f64>>]) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::EmptyInput);
        }
        let d = rows[0].len();
        let mut values = Array2::zeros((rows.len(), d));
        let mut observed = Array2::from_elem((rows.len(), d), false);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: row.len(),
                });
            }
            for (j, cell) in row.iter().enumerate() {
                if let Some(x) = cell {
                    values[[i, j]] = *x;
                    observed[[i, j]] = true;
                }
            }
        }
        Self::new(values, observed)
    }

    /// Number of observations.
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    /// Number of continuous variables.
    pub fn n_cols(&self) -> usize {
        self.values.ncols()
    }

    /// Full value matrix.
    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    /// Full observed mask.
    pub fn observed(&self) -> ArrayView2<'_, bool> {
        self.observed.view()
    }

    /// Values of variable `j`.
    pub fn column(&self, j: usize) -> ArrayView1<'_, f64> {
        self.values.column(j)
    }

    /// Observed mask of variable `j`.
    pub fn observed_column(&self, j: usize) -> ArrayView1<'_, bool> {
        self.observed.column(j)
    }

    /// Observed values of variable `j`, in row order.
    pub fn observed_values(&self, j: usize) -> Vec<f64> {
        self.column(j)
            .iter()
            .zip(self.observed_column(j))
            .filter(|(_, &o)| o)
            .map(|(&x, _)| x)
            .collect()
    }
}

/// Categorical block: for each variable and modality, the rows holding it.
#[derive(Debug, Clone)]
pub struct CategoricalData {
    n_rows: usize,
    n_modalities: Vec<usize>,
    members: Vec<Vec<Vec<usize>>>,
}

impl CategoricalData {
    /// Build from row-major codes, `codes[i][j]` being the modality of row `i`
    /// for variable `j`, with `n_modalities[j]` levels for variable `j`.
    pub fn from_codes(codes: &[Vec<usize>], n_modalities: &[usize]) -> Result<Self> {
        if codes.is_empty() || n_modalities.is_empty() {
            return Err(Error::EmptyInput);
        }
        let d = n_modalities.len();
        if n_modalities.contains(&0) {
            return Err(Error::InvalidParameter {
                name: "n_modalities",
                message: "every categorical variable needs at least one modality",
            });
        }

        let mut members: Vec<Vec<Vec<usize>>> =
            n_modalities.iter().map(|&m| vec![Vec::new(); m]).collect();
        for (i, row) in codes.iter().enumerate() {
            if row.len() != d {
                return Err(Error::DimensionMismatch {
                    expected: d,
                    found: row.len(),
                });
            }
            for (j, &code) in row.iter().enumerate() {
                if code >= n_modalities[j] {
                    return Err(Error::ModalityOutOfRange {
                        variable: j,
                        code,
                        n_modalities: n_modalities[j],
                    });
                }
                members[j][code].push(i);
            }
        }

        Ok(Self {
            n_rows: codes.len(),
            n_modalities: n_modalities.to_vec(),
            members,
        })
    }

    /// Number of observations.
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of categorical variables.
    pub fn n_cols(&self) -> usize {
        self.n_modalities.len()
    }

    /// Number of modalities of variable `j`.
    pub fn n_modalities(&self, j: usize) -> usize {
        self.n_modalities[j]
    }

    /// Per-modality row lists of variable `j`.
    pub fn members(&self, j: usize) -> &[Vec<usize>] {
        &self.members[j]
    }
}

/// A dataset with an optional continuous block, an optional categorical
/// block and per-row weights.
#[derive(Debug, Clone)]
pub struct MixedData {
    continuous: Option<ContinuousData>,
    categorical: Option<CategoricalData>,
    weights: Array1<f64>,
}

impl MixedData {
    /// Assemble a dataset. Missing `weights` default to 1 for every row.
    pub fn new(
        continuous: Option<ContinuousData>,
        categorical: Option<CategoricalData>,
        weights: Option<Array1<f64>>,
    ) -> Result<Self> {
        let n = match (&continuous, &categorical) {
            (None, None) => return Err(Error::EmptyInput),
            (Some(c), None) => c.n_rows(),
            (None, Some(q)) => q.n_rows(),
            (Some(c), Some(q)) => {
                if c.n_rows() != q.n_rows() {
                    return Err(Error::DimensionMismatch {
                        expected: c.n_rows(),
                        found: q.n_rows(),
                    });
                }
                c.n_rows()
            }
        };

        let weights = match weights {
            Some(w) => {
                if w.len() != n {
                    return Err(Error::DimensionMismatch {
                        expected: n,
                        found: w.len(),
                    });
                }
                if w.iter().any(|&x| !x.is_finite() || x < 0.0) {
                    return Err(Error::InvalidParameter {
                        name: "weights",
                        message: "row weights must be finite and non-negative",
                    });
                }
                if !w.iter().any(|&x| x > 0.0) {
                    return Err(Error::InvalidParameter {
                        name: "weights",
                        message: "at least one row weight must be positive",
                    });
                }
                w
            }
            None => Array1::ones(n),
        };

        Ok(Self {
            continuous,
            categorical,
            weights,
        })
    }

    /// Number of observations.
    pub fn n_rows(&self) -> usize {
        self.weights.len()
    }

    /// Number of continuous variables (0 without a continuous block).
    pub fn n_continuous(&self) -> usize {
        self.continuous.as_ref().map_or(0, ContinuousData::n_cols)
    }

    /// Number of categorical variables (0 without a categorical block).
    pub fn n_categorical(&self) -> usize {
        self.categorical.as_ref().map_or(0, CategoricalData::n_cols)
    }

    /// Total number of variables, continuous first.
    pub fn n_variables(&self) -> usize {
        self.n_continuous() + self.n_categorical()
    }

    /// Continuous block, if any.
    pub fn continuous(&self) -> Option<&ContinuousData> {
        self.continuous.as_ref()
    }

    /// Categorical block, if any.
    pub fn categorical(&self) -> Option<&CategoricalData> {
        self.categorical.as_ref()
    }

    /// Per-row weights.
    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    /// Sum of the weights of `rows`.
    pub fn weight_of(&self, rows: &[usize]) -> f64 {
        rows.iter().map(|&i| self.weights[i]).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_options_builds_mask() {
        let c = ContinuousData::from_options(&[
            vec![Some(1.0), None],
            vec![Some(2.0), Some(3.0)],
        ])
        .unwrap();
        assert_eq!(c.n_rows(), 2);
        assert!(!c.observed()[[0, 1]]);
        assert_eq!(c.observed_values(1), vec![3.0]);
    }

    #[test]
    fn test_from_nan_marks_missing() {
        let c = ContinuousData::from_nan(array![[1.0], [f64::NAN], [2.0]]).unwrap();
        assert_eq!(c.observed_values(0), vec![1.0, 2.0]);
    }

    #[test]
    fn test_fully_missing_column_rejected() {
        let result = ContinuousData::from_options(&[vec![Some(1.0), None], vec![Some(2.0), None]]);
        assert_eq!(result.unwrap_err(), Error::NoObservedValues { variable: 1 });
    }

    #[test]
    fn test_codes_partition_rows() {
        let q = CategoricalData::from_codes(&[vec![0, 2], vec![1, 2], vec![0, 0]], &[2, 3]).unwrap();
        let first: Vec<Vec<usize>> = vec![vec![0, 2], vec![1]];
        let second: Vec<Vec<usize>> = vec![vec![2], vec![], vec![0, 1]];
        assert_eq!(q.members(0).to_vec(), first);
        assert_eq!(q.members(1).to_vec(), second);
        let total: usize = q.members(1).iter().map(Vec::len).sum();
        assert_eq!(total, 3);
    }

    #[test]
    fn test_code_out_of_range() {
        let err = CategoricalData::from_codes(&[vec![3]], &[2]).unwrap_err();
        assert!(matches!(err, Error::ModalityOutOfRange { code: 3, .. }));
    }

    #[test]
    fn test_row_count_mismatch() {
        let c = ContinuousData::from_options(&[vec![Some(1.0)], vec![Some(2.0)]]).unwrap();
        let q = CategoricalData::from_codes(&[vec![0]], &[1]).unwrap();
        assert!(MixedData::new(Some(c), Some(q), None).is_err());
    }

    #[test]
    fn test_negative_weight_rejected() {
        let q = CategoricalData::from_codes(&[vec![0], vec![1]], &[2]).unwrap();
        let result = MixedData::new(None, Some(q), Some(array![1.0, -1.0]));
        assert!(result.is_err());
    }

    #[test]
    fn test_all_zero_weights_rejected() {
        let q = CategoricalData::from_codes(&[vec![0], vec![1]], &[2]).unwrap();
        let err = MixedData::new(None, Some(q.clone()), Some(array![0.0, 0.0])).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "weights", .. }));
        assert!(MixedData::new(None, Some(q), Some(array![0.0, 0.5])).is_ok());
    }

    #[test]
    fn test_default_weights_are_one() {
        let q = CategoricalData::from_codes(&[vec![0], vec![1]], &[2]).unwrap();
        let data = MixedData::new(None, Some(q), None).unwrap();
        assert_eq!(data.weights().to_vec(), vec![1.0, 1.0]);
        assert_eq!(data.n_continuous(), 0);
        assert_eq!(data.weight_of(&[0, 1]), 2.0);
    }
}
