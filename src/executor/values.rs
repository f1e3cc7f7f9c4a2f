//! Runtime value types

use super::errors::ErrorInfo;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Runtime value type
///
/// Values live in frame variable maps and travel through `ret`/`resolve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v")]
pub enum Val {
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Val>),
    Obj(HashMap<String, Val>),
    /// Error value with code and message
    Error(ErrorInfo),
}

impl Val {
    /// Check if value is truthy (for conditionals)
    pub fn is_truthy(&self) -> bool {
        match self {
            Val::Bool(b) => *b,
            Val::Null => false,
            _ => true,
        }
    }

    /// Read the value as a number, if it is one
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Val::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// Read the value as a string slice, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Val::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<ErrorInfo> for Val {
    fn from(err: ErrorInfo) -> Self {
        Val::Error(err)
    }
}
