// ABOUTME: Error types for lexing, parsing, and evaluation failures

use thiserror::Error;

// ===== Arity constant strings (eliminates allocations in error paths) =====
pub const ARITY_ONE: &str = "1";
pub const ARITY_ZERO_OR_ONE: &str = "0 or 1";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum KuzurError {
    /// Unrecognized character during lexing
    #[error("unexpected character {ch:?} at position {pos}")]
    Lex { ch: char, pos: usize },

    /// Unexpected token during parsing
    #[error("{message} at position {pos}")]
    Syntax { message: String, pos: usize },

    /// Lookup of an unbound identifier
    #[error("undefined variable '{0}'")]
    Name(String),

    /// Wrong number of arguments on a call
    #[error("{function}: expected {expected} argument{}, got {actual}", if *.expected == "1" { "" } else { "s" })]
    Arity {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Operation applied to values of the wrong kind
    #[error("{0}")]
    Type(String),

    /// Division or modulo by integer zero
    #[error("{0}")]
    Arithmetic(String),

    /// Non-local signal escaping its catching frame, or an internal invariant
    /// violation
    #[error("{0}")]
    Runtime(String),
}

impl KuzurError {
    pub fn syntax(message: impl Into<String>, pos: usize) -> Self {
        KuzurError::Syntax {
            message: message.into(),
            pos,
        }
    }

    pub fn arity(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        KuzurError::Arity {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        KuzurError::Type(message.into())
    }

    pub fn arithmetic(message: impl Into<String>) -> Self {
        KuzurError::Arithmetic(message.into())
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        KuzurError::Runtime(message.into())
    }
}
