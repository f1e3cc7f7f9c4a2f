//! Modeled error type and error codes
//!
//! Resume functions raise `ErrorInfo` values; the driver catches them at the
//! loop boundary and routes them through the handler stack. Catch frames
//! receive the same value wrapped as `Val::Error`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Generic runtime failure inside a resume function
pub const RUNTIME_ERROR: &str = "RuntimeError";

/// Strict variable lookup on a name the frame never bound
pub const KEY_NOT_FOUND: &str = "KeyNotFound";

/// Sequence access outside its bounds
pub const INDEX_OUT_OF_RANGE: &str = "IndexOutOfRange";

/// A runtime assertion did not hold
pub const ASSERT_ERROR: &str = "AssertError";

/// A resume function was dispatched at a position it does not define
pub const UNKNOWN_POS: &str = "UnknownPos";

/// A callable received the wrong number of arguments
pub const WRONG_ARG_COUNT: &str = "WrongArgCount";

/// A callable received an argument of the wrong type
pub const WRONG_ARG_TYPE: &str = "WrongArgType";

/// Error with a stable code and a human-readable message
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
