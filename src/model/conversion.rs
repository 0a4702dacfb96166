//! Conversion — the outcome of one successful request.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Path, Unit};

/// A completed conversion of `value` from one unit into another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversion {
    pub value: f64,
    pub from: Unit,
    pub to: Unit,
    pub result: f64,
    /// Route the result was computed along.
    pub path: Path,
}

/// Renders `<value> <from> = <result> <to>`.
impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} = {} {}", self.value, self.from, self.result, self.to)
    }
}
