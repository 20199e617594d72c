//! The polling watermark.

use std::fmt;

/// Highest message id already observed by the polling loop.
///
/// A cursor only ever moves forward: [`advance`](Self::advance) ignores a
/// missing value and any value that is not strictly greater than the current
/// one, so replaying an older server watermark can never cause messages to be
/// fetched twice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor(u64);

impl Cursor {
    /// The cursor used for the baseline fetch.
    pub const START: Self = Self(0);

    /// Creates a cursor at the given position.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw watermark.
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Moves the cursor to `next` if it is present and newer.
    ///
    /// Returns `true` if the cursor changed.
    pub fn advance(&mut self, next: Option<u64>) -> bool {
        match next {
            Some(next) if next > self.0 => {
                self.0 = next;
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Cursor> for u64 {
    fn from(cursor: Cursor) -> Self {
        cursor.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_forward() {
        let mut cursor = Cursor::START;
        assert!(cursor.advance(Some(100)));
        assert_eq!(cursor.value(), 100);
        assert!(cursor.advance(Some(105)));
        assert_eq!(cursor.value(), 105);
    }

    #[test]
    fn test_missing_value_keeps_position() {
        let mut cursor = Cursor::new(42);
        assert!(!cursor.advance(None));
        assert_eq!(cursor.value(), 42);
    }

    #[test]
    fn test_never_moves_backward() {
        let mut cursor = Cursor::new(42);
        assert!(!cursor.advance(Some(7)));
        assert!(!cursor.advance(Some(42)));
        assert_eq!(cursor, Cursor::new(42));
    }
}
