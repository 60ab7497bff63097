use core::fmt::{Display, Formatter};

/// Transactional anomaly patterns.
///
/// Each variant is a forbidden causal structure. The stable code (`TAP-a`
/// through `TAP-n`) follows declaration order, which is also the sort order.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[cfg_attr(feature = "schemars", derive(::schemars::JsonSchema))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tap {
    /// A read of a value no transaction ever wrote.
    ThinAirRead,
    /// A read of a value only an aborted transaction wrote.
    AbortedRead,
    /// A read of a value its own transaction writes later.
    FutureRead,
    /// A read that ignores the transaction's own earlier write.
    NotMyOwnWrite,
    /// A read that returns an own write other than the latest one.
    NotMyLastWrite,
    /// A read of a write its transaction overwrote before committing.
    IntermediateRead,
    /// Two transactions that observe each other.
    CyclicCO,
    /// A read that goes back in time with respect to an earlier read.
    NonMonoReadCO,
    NonMonoReadAO,
    /// Two reads of one variable in a transaction that disagree.
    NonRepeatableRead,
    /// A transaction sees only part of another transaction's writes.
    FracturedReadCO,
    FracturedReadAO,
    /// A read of a write that a causally later write overwrote.
    COConflictAO,
    ConflictAO,
}

impl Tap {
    pub const ALL: [Self; 14] = [
        Self::ThinAirRead,
        Self::AbortedRead,
        Self::FutureRead,
        Self::NotMyOwnWrite,
        Self::NotMyLastWrite,
        Self::IntermediateRead,
        Self::CyclicCO,
        Self::NonMonoReadCO,
        Self::NonMonoReadAO,
        Self::NonRepeatableRead,
        Self::FracturedReadCO,
        Self::FracturedReadAO,
        Self::COConflictAO,
        Self::ConflictAO,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ThinAirRead => "ThinAirRead",
            Self::AbortedRead => "AbortedRead",
            Self::FutureRead => "FutureRead",
            Self::NotMyOwnWrite => "NotMyOwnWrite",
            Self::NotMyLastWrite => "NotMyLastWrite",
            Self::IntermediateRead => "IntermediateRead",
            Self::CyclicCO => "CyclicCO",
            Self::NonMonoReadCO => "NonMonoReadCO",
            Self::NonMonoReadAO => "NonMonoReadAO",
            Self::NonRepeatableRead => "NonRepeatableRead",
            Self::FracturedReadCO => "FracturedReadCO",
            Self::FracturedReadAO => "FracturedReadAO",
            Self::COConflictAO => "COConflictAO",
            Self::ConflictAO => "ConflictAO",
        }
    }

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ThinAirRead => "TAP-a",
            Self::AbortedRead => "TAP-b",
            Self::FutureRead => "TAP-c",
            Self::NotMyOwnWrite => "TAP-d",
            Self::NotMyLastWrite => "TAP-e",
            Self::IntermediateRead => "TAP-f",
            Self::CyclicCO => "TAP-g",
            Self::NonMonoReadCO => "TAP-h",
            Self::NonMonoReadAO => "TAP-i",
            Self::NonRepeatableRead => "TAP-j",
            Self::FracturedReadCO => "TAP-k",
            Self::FracturedReadAO => "TAP-l",
            Self::COConflictAO => "TAP-m",
            Self::ConflictAO => "TAP-n",
        }
    }
}

impl Display for Tap {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}({})", self.name(), self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_declaration_order() {
        for (i, tap) in Tap::ALL.iter().enumerate() {
            let expected = char::from(b'a' + u8::try_from(i).unwrap());
            assert_eq!(tap.code(), format!("TAP-{expected}"));
        }
        assert!(Tap::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_display() {
        assert_eq!(Tap::ThinAirRead.to_string(), "ThinAirRead(TAP-a)");
        assert_eq!(Tap::ConflictAO.to_string(), "ConflictAO(TAP-n)");
    }
}
