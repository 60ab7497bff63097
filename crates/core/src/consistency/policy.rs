use alloc::string::ToString;
use core::fmt::{Display, Formatter};
use core::str::FromStr;

use super::error::Error;
use super::tap::Tap;

/// The isolation level a history is checked against.
///
/// Levels are ordered by strength; a stronger level prohibits every pattern
/// a weaker one does.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IsolationLevel {
    ReadCommitted,
    ReadAtomic,
    TransactionalCausal,
}

impl IsolationLevel {
    pub const ALL: [Self; 3] = [
        Self::ReadCommitted,
        Self::ReadAtomic,
        Self::TransactionalCausal,
    ];

    /// Whether `tap` is forbidden at this level.
    #[must_use]
    pub const fn prohibits(self, tap: Tap) -> bool {
        self as u8 >= Self::weakest_prohibiting(tap) as u8
    }

    /// The weakest level at which `tap` is a violation.
    #[must_use]
    pub const fn weakest_prohibiting(tap: Tap) -> Self {
        match tap {
            Tap::ThinAirRead
            | Tap::AbortedRead
            | Tap::FutureRead
            | Tap::NotMyOwnWrite
            | Tap::NotMyLastWrite
            | Tap::IntermediateRead
            | Tap::CyclicCO
            | Tap::NonMonoReadCO
            | Tap::NonMonoReadAO => Self::ReadCommitted,
            Tap::NonRepeatableRead | Tap::FracturedReadCO | Tap::FracturedReadAO => {
                Self::ReadAtomic
            }
            Tap::COConflictAO | Tap::ConflictAO => Self::TransactionalCausal,
        }
    }

    /// Every pattern forbidden at this level, in code order.
    pub fn prohibited(self) -> impl Iterator<Item = Tap> {
        Tap::ALL.into_iter().filter(move |&tap| self.prohibits(tap))
    }
}

impl Display for IsolationLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ReadCommitted => write!(f, "RC"),
            Self::ReadAtomic => write!(f, "RA"),
            Self::TransactionalCausal => write!(f, "TCC"),
        }
    }
}

impl FromStr for IsolationLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rc" | "read-committed" | "read_committed" => Ok(Self::ReadCommitted),
            "ra" | "read-atomic" | "read_atomic" => Ok(Self::ReadAtomic),
            "tcc" | "transactional-causal" | "transactional_causal" | "causal" => {
                Ok(Self::TransactionalCausal)
            }
            _ => Err(Error::UnknownIsolationLevel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prohibited_set_sizes() {
        assert_eq!(IsolationLevel::ReadCommitted.prohibited().count(), 9);
        assert_eq!(IsolationLevel::ReadAtomic.prohibited().count(), 12);
        assert_eq!(IsolationLevel::TransactionalCausal.prohibited().count(), 14);
    }

    #[test]
    fn test_levels_nest() {
        for tap in Tap::ALL {
            if IsolationLevel::ReadCommitted.prohibits(tap) {
                assert!(IsolationLevel::ReadAtomic.prohibits(tap));
            }
            if IsolationLevel::ReadAtomic.prohibits(tap) {
                assert!(IsolationLevel::TransactionalCausal.prohibits(tap));
            }
        }
        assert!(IsolationLevel::ReadCommitted.prohibits(Tap::NonMonoReadAO));
        assert!(!IsolationLevel::ReadCommitted.prohibits(Tap::FracturedReadCO));
        assert!(!IsolationLevel::ReadAtomic.prohibits(Tap::ConflictAO));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("RC".parse(), Ok(IsolationLevel::ReadCommitted));
        assert_eq!("read-atomic".parse(), Ok(IsolationLevel::ReadAtomic));
        assert_eq!("tcc".parse(), Ok(IsolationLevel::TransactionalCausal));
        assert_eq!(
            "si".parse::<IsolationLevel>(),
            Err(Error::UnknownIsolationLevel("si".into()))
        );
    }
}
