//! Clause identifiers used by resolution proofs

use crate::memory::Offset;
use static_assertions::const_assert;
use std::{
    convert::{TryFrom, TryInto},
    fmt,
    mem::size_of,
};

/// An index uniquely identifying a clause during one proof session.
///
/// Input clauses and derived clauses share one sequence: each root and each
/// chain takes the next identifier.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Default)]
pub struct ClauseId {
    pub index: ClauseIdentifierType,
}

/// The type that backs [ClauseId](struct.ClauseId.html).
pub type ClauseIdentifierType = u32;

impl ClauseId {
    /// Create the clause identifier with the given index.
    pub fn new(index: ClauseIdentifierType) -> ClauseId {
        ClauseId { index }
    }
    /// Create the clause identifier with the given usize index.
    /// # Panics
    /// Panics if the index does not fit.
    pub fn from_usize(index: usize) -> ClauseId {
        requires!(ClauseIdentifierType::try_from(index).is_ok());
        ClauseId::new(index as ClauseIdentifierType)
    }
    /// Create an iterator from clause identifiers `start` up to (excluding) `end`.
    pub fn range(start: impl Offset, end: impl Offset) -> impl Iterator<Item = ClauseId> {
        (start.as_offset()..end.as_offset()).map(ClauseId::from_usize)
    }
    /// The identifier following this one.
    pub fn next(self) -> ClauseId {
        requires!(self.index < ClauseIdentifierType::max_value());
        ClauseId::new(self.index + 1)
    }
}

impl Offset for ClauseId {
    fn as_offset(&self) -> usize {
        self.index.try_into().unwrap_or(usize::max_value())
    }
}

impl fmt::Display for ClauseId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

/// State the sizes of data types.
#[allow(dead_code)]
fn assert_primitive_sizes() {
    const_assert!(size_of::<crate::literal::Literal>() == 4);
    const_assert!(size_of::<crate::literal::Variable>() == 4);
    const_assert!(size_of::<ClauseId>() == 4);
}
