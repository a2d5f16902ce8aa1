//! Error type shared by constructors and detached cursors.

use core::fmt;

/// Failures reported by `HashMap` constructors and by `Cursor` /
/// `SplitCursor` traversal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MapError {
    /// A constructor parameter was out of range (for example a NaN or
    /// non-positive load factor).
    InvalidArgument(String),
    /// The map changed structurally after the cursor captured its
    /// mutation counter.
    ConcurrentModification,
    /// The cursor was advanced past its last entry.
    NoSuchElement,
    /// `Cursor::remove` was called without a preceding successful `next`,
    /// or twice for the same entry.
    IllegalState,
    /// A cursor was handed a map other than the one that created it.
    WrongMap,
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            MapError::ConcurrentModification => {
                f.write_str("map was structurally modified during traversal")
            }
            MapError::NoSuchElement => f.write_str("cursor is exhausted"),
            MapError::IllegalState => f.write_str("no current entry to remove"),
            MapError::WrongMap => f.write_str("cursor used with a different map"),
        }
    }
}

impl std::error::Error for MapError {}
