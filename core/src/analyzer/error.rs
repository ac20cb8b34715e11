//! Errors reported by the typing passes.

use core::fmt;

#[derive(Debug, Clone)]
pub struct TypeError {
    pub line: i64,
    pub message: String,
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line >= 0 {
            write!(f, "type error at line {}: {}", self.line, self.message)
        } else {
            write!(f, "type error: {}", self.message)
        }
    }
}

impl std::error::Error for TypeError {}
