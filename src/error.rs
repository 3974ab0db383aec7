use core::fmt;

/// Result alias for `mixsel`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by dataset construction and mixture fitting.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty.
    EmptyInput,

    /// Dimension mismatch between two inputs.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of observations.
        n_items: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },

    /// Selection vector does not match the dataset.
    InvalidSelection {
        /// Number of variables in the dataset.
        expected: usize,
        /// Length of the supplied selection vector.
        found: usize,
    },

    /// Selection vector was built for a different continuous/categorical split.
    SelectionLayout {
        /// Continuous variables in the dataset.
        expected: usize,
        /// Continuous variables the selection was built for.
        found: usize,
    },

    /// A categorical code is not below the modality count of its variable.
    ModalityOutOfRange {
        /// Categorical variable index.
        variable: usize,
        /// Offending code.
        code: usize,
        /// Number of modalities of the variable.
        n_modalities: usize,
    },

    /// A continuous variable has no observed value.
    NoObservedValues {
        /// Continuous variable index.
        variable: usize,
    },

    /// A cluster received zero total responsibility during the M-step.
    EmptyCluster {
        /// Cluster index.
        cluster: usize,
    },

    /// Every cluster density of an observation collapsed to zero.
    NonFiniteLikelihood {
        /// Observation index.
        row: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::InvalidSelection { expected, found } => {
                write!(
                    f,
                    "selection vector has {found} entries but the data has {expected} variables"
                )
            }
            Error::SelectionLayout { expected, found } => write!(
                f,
                "selection was built for {found} continuous variables but the data has {expected}"
            ),
            Error::ModalityOutOfRange {
                variable,
                code,
                n_modalities,
            } => write!(
                f,
                "categorical variable {variable}: code {code} out of range (0..{n_modalities})"
            ),
            Error::NoObservedValues { variable } => {
                write!(f, "continuous variable {variable} has no observed value")
            }
            Error::EmptyCluster { cluster } => {
                write!(f, "cluster {cluster} received no responsibility")
            }
            Error::NonFiniteLikelihood { row } => {
                write!(f, "non-finite log-likelihood at row {row}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
