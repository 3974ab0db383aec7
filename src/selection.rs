//! Per-variable selection flags (omega).
//!
//! A selected variable is *discriminative*: it gets one parameter set per
//! cluster. An unselected variable is modeled by a single set of parameters
//! shared by every cluster. The flags are ordered continuous variables
//! first, then categorical variables, and never change after construction.

use crate::data::MixedData;
use crate::error::{Error, Result};

/// Selection vector split into continuous and categorical locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    omega: Vec<bool>,
    n_continuous: usize,
    continuous: Vec<usize>,
    categorical: Vec<usize>,
}

impl Selection {
    /// Build a selection for `data`. `omega` must have one flag per variable.
    pub fn new(omega: Vec<bool>, data: &MixedData) -> Result<Self> {
        if omega.len() != data.n_variables() {
            return Err(Error::InvalidSelection {
                expected: data.n_variables(),
                found: omega.len(),
            });
        }
        let n_continuous = data.n_continuous();
        let continuous = (0..n_continuous).filter(|&j| omega[j]).collect();
        let categorical = (0..data.n_categorical())
            .filter(|&j| omega[n_continuous + j])
            .collect();
        Ok(Self {
            omega,
            n_continuous,
            continuous,
            categorical,
        })
    }

    /// Build a selection from 0/1 flags.
    pub fn from_flags(flags: &[u8], data: &MixedData) -> Result<Self> {
        if flags.iter().any(|&f| f > 1) {
            return Err(Error::InvalidParameter {
                name: "omega",
                message: "selection flags must be 0 or 1",
            });
        }
        Self::new(flags.iter().map(|&f| f == 1).collect(), data)
    }

    /// Select every variable of `data`.
    pub fn all(data: &MixedData) -> Self {
        let n_continuous = data.n_continuous();
        let n_categorical = data.n_categorical();
        Self {
            omega: vec![true; n_continuous + n_categorical],
            n_continuous,
            continuous: (0..n_continuous).collect(),
            categorical: (0..n_categorical).collect(),
        }
    }

    /// Check that this selection fits the layout of `data`.
    pub fn check(&self, data: &MixedData) -> Result<()> {
        if self.omega.len() != data.n_variables() {
            return Err(Error::InvalidSelection {
                expected: data.n_variables(),
                found: self.omega.len(),
            });
        }
        if self.n_continuous != data.n_continuous() {
            return Err(Error::SelectionLayout {
                expected: data.n_continuous(),
                found: self.n_continuous,
            });
        }
        Ok(())
    }

    /// The raw flags, continuous first.
    pub fn omega(&self) -> &[bool] {
        &self.omega
    }

    /// Number of continuous variables of the dataset this was built for.
    pub fn n_continuous(&self) -> usize {
        self.n_continuous
    }

    /// Indices of the selected continuous variables.
    pub fn continuous(&self) -> &[usize] {
        &self.continuous
    }

    /// Indices of the selected categorical variables.
    pub fn categorical(&self) -> &[usize] {
        &self.categorical
    }

    /// Whether continuous variable `j` is selected.
    pub fn is_continuous_selected(&self, j: usize) -> bool {
        self.omega[j]
    }

    /// Whether categorical variable `j` is selected.
    pub fn is_categorical_selected(&self, j: usize) -> bool {
        self.omega[self.n_continuous + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CategoricalData, ContinuousData};

    fn data() -> MixedData {
        let c = ContinuousData::from_options(&[
            vec![Some(0.0), Some(1.0)],
            vec![Some(1.0), Some(2.0)],
        ])
        .unwrap();
        let q = CategoricalData::from_codes(&[vec![0], vec![1]], &[2]).unwrap();
        MixedData::new(Some(c), Some(q), None).unwrap()
    }

    #[test]
    fn test_split_locations() {
        let s = Selection::from_flags(&[0, 1, 1], &data()).unwrap();
        assert_eq!(s.continuous(), &[1]);
        assert_eq!(s.categorical(), &[0]);
        assert!(!s.is_continuous_selected(0));
        assert!(s.is_categorical_selected(0));
        assert_eq!(s.n_continuous(), 2);
    }

    #[test]
    fn test_length_mismatch() {
        let err = Selection::new(vec![true], &data()).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidSelection {
                expected: 3,
                found: 1
            }
        );
    }

    #[test]
    fn test_flags_must_be_binary() {
        assert!(Selection::from_flags(&[0, 2, 1], &data()).is_err());
    }
}
