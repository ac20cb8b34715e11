//! Parse errors.

use core::fmt;

/// Give up after this many errors; the rest are unlikely to be real.
pub const MAX_ERRORS: usize = 64;

#[derive(Debug, Clone)]
pub struct ParseError {
    pub line: i64,
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "parse error at line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ParseError {}
