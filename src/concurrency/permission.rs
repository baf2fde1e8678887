//! Lock modes.

use std::fmt;

/// The access a transaction asks for when it fetches a page.
///
/// `Shared` is the reader lock (many holders), `Exclusive` the writer
/// lock (one holder, no readers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    Shared,
    Exclusive,
}

impl Permission {
    #[inline]
    pub fn is_exclusive(self) -> bool {
        self == Permission::Exclusive
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Permission::Shared => write!(f, "SHARED"),
            Permission::Exclusive => write!(f, "EXCLUSIVE"),
        }
    }
}
