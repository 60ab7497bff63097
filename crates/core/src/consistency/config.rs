use alloc::string::ToString;
use core::fmt::{Display, Formatter};
use core::str::FromStr;

use typed_builder::TypedBuilder;

use super::error::Error;
use super::policy::IsolationLevel;
use crate::graph::Strategy;

/// Which reachability strategy backs the check, and whether the list-value
/// arbitration pass runs.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    #[default]
    TreeClock,
    VectorClock,
    BruteForce,
    /// Tree clocks plus arbitration edges recovered from observed lists.
    ListValues,
}

impl Algorithm {
    #[must_use]
    pub const fn strategy(self) -> Strategy {
        match self {
            Self::TreeClock | Self::ListValues => Strategy::TreeClock,
            Self::VectorClock => Strategy::VectorClock,
            Self::BruteForce => Strategy::Search,
        }
    }

    #[must_use]
    pub const fn uses_lists(self) -> bool {
        matches!(self, Self::ListValues)
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TreeClock => write!(f, "tree-clock"),
            Self::VectorClock => write!(f, "vector-clock"),
            Self::BruteForce => write!(f, "brute-force"),
            Self::ListValues => write!(f, "list-values"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tree-clock" | "tc" => Ok(Self::TreeClock),
            "vector-clock" | "vc" => Ok(Self::VectorClock),
            "brute-force" | "bf" => Ok(Self::BruteForce),
            "list" | "list-values" => Ok(Self::ListValues),
            _ => Err(Error::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Parameters of a single check.
///
/// ```rust
/// use tapcheck_core::{Algorithm, Config, IsolationLevel};
///
/// let config = Config::builder()
///     .isolation(IsolationLevel::ReadAtomic)
///     .algorithm(Algorithm::VectorClock)
///     .build();
/// assert!(!config.visualize);
/// ```
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, TypedBuilder)]
pub struct Config {
    pub isolation: IsolationLevel,
    #[builder(default)]
    pub algorithm: Algorithm,
    /// Collect the violating transaction pairs and triples in the report.
    #[builder(default)]
    pub visualize: bool,
}
