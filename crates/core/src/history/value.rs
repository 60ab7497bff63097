//! Values stored in and observed from variables.
//!
//! Scalar histories write and read plain values. List-append histories write
//! single elements and read whole lists; a read of a list is matched against
//! the append of its last element, and the list itself tells which appends it
//! observed and in which order.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::{Hash, Hasher};

/// A value a variable can hold.
///
/// `Default::default()` is the zero value: what a variable holds before any
/// write. Reads and writes of the zero value are never matched as write-read
/// pairs.
pub trait Value: Clone + Eq + Hash + Default + Debug {
    /// Writes observed by a read of this value, oldest first.
    fn observed(&self) -> Vec<Self> {
        vec![self.clone()]
    }

    fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl Value for u64 {}
impl Value for i64 {}
impl Value for u32 {}
impl Value for String {}

/// Value of a list-append history.
///
/// Equality and hashing only look at the last element, so `Read([1, 2])`
/// equals `Append(2)` and the empty read equals the zero value.
#[cfg_attr(feature = "serde", derive(::serde::Serialize, ::serde::Deserialize))]
#[derive(Debug, Clone)]
pub enum ListValue<E> {
    Append(E),
    Read(Vec<E>),
}

impl<E> ListValue<E> {
    #[must_use]
    pub fn last(&self) -> Option<&E> {
        match self {
            Self::Append(element) => Some(element),
            Self::Read(elements) => elements.last(),
        }
    }

    #[must_use]
    pub fn elements(&self) -> &[E] {
        match self {
            Self::Append(element) => core::slice::from_ref(element),
            Self::Read(elements) => elements,
        }
    }
}

impl<E> Default for ListValue<E> {
    fn default() -> Self {
        Self::Read(Vec::new())
    }
}

impl<E: PartialEq> PartialEq for ListValue<E> {
    fn eq(&self, other: &Self) -> bool {
        self.last() == other.last()
    }
}

impl<E: Eq> Eq for ListValue<E> {}

impl<E: Hash> Hash for ListValue<E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.last().hash(state);
    }
}

impl<E> Value for ListValue<E>
where
    E: Clone + Eq + Hash + Debug,
{
    fn observed(&self) -> Vec<Self> {
        self.elements().iter().cloned().map(Self::Append).collect()
    }

    fn is_zero(&self) -> bool {
        self.last().is_none()
    }
}

#[cfg(test)]
mod tests {
    use hashbrown::HashSet;

    use super::*;

    #[test]
    fn test_scalar_observes_itself() {
        assert_eq!(7u64.observed(), vec![7]);
        assert!(0u64.is_zero());
        assert!(!7u64.is_zero());
    }

    #[test]
    fn test_list_matches_last_append() {
        assert_eq!(ListValue::Read(vec![1, 2]), ListValue::Append(2));
        assert_ne!(ListValue::Read(vec![1, 2]), ListValue::Append(1));
        assert_eq!(ListValue::<u64>::Read(vec![]), ListValue::default());

        let set: HashSet<(&str, ListValue<u64>)> = [("x", ListValue::Append(2))].into();
        assert!(set.contains(&("x", ListValue::Read(vec![1, 2]))));
    }

    #[test]
    fn test_list_observed_in_order() {
        let read = ListValue::Read(vec![3, 1, 2]);
        assert_eq!(
            read.observed()
                .iter()
                .map(|v| v.last().copied())
                .collect::<Vec<_>>(),
            vec![Some(3), Some(1), Some(2)]
        );
        assert!(ListValue::<u64>::default().is_zero());
        assert!(ListValue::<u64>::default().observed().is_empty());
    }
}
