//! Domain models for the vetconnect system.

mod appointment;
mod pet;
mod record;

pub use appointment::*;
pub use pet::*;
pub use record::*;

use thiserror::Error;

/// A string did not match any variant of a domain enum.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
