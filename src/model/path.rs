//! Path — a sequence of units joined by direct conversion rates.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::Unit;

/// A conversion route: `start -> ... -> goal`.
///
/// Every consecutive pair is expected to be a direct edge of the graph the
/// path was found in. A path always holds at least one unit; a single-unit
/// path is the identity conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Unit>", into = "Vec<Unit>")]
pub struct Path {
    units: SmallVec<[Unit; 4]>,
}

impl Path {
    pub fn single(unit: Unit) -> Self {
        let mut units = SmallVec::new();
        units.push(unit);
        Self { units }
    }

    /// Build a path from an explicit unit sequence. Returns `None` when the
    /// sequence is empty.
    pub fn from_units<I, U>(units: I) -> Option<Self>
    where
        I: IntoIterator<Item = U>,
        U: Into<Unit>,
    {
        let units: SmallVec<[Unit; 4]> = units.into_iter().map(Into::into).collect();
        if units.is_empty() { None } else { Some(Self { units }) }
    }

    /// Number of units on the path, endpoints included.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Number of direct conversions the path applies.
    pub fn hop_count(&self) -> usize {
        self.units.len() - 1
    }

    pub fn start(&self) -> &Unit {
        self.units.first().expect("Path always has at least one unit")
    }

    pub fn end(&self) -> &Unit {
        self.units.last().expect("Path always has at least one unit")
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    /// Consecutive `(from, to)` pairs along the path.
    pub fn hops(&self) -> impl Iterator<Item = (&Unit, &Unit)> {
        self.units.windows(2).map(|pair| (&pair[0], &pair[1]))
    }
}

impl TryFrom<Vec<Unit>> for Path {
    type Error = &'static str;

    fn try_from(units: Vec<Unit>) -> Result<Self, Self::Error> {
        Self::from_units(units).ok_or("a path needs at least one unit")
    }
}

impl From<Path> for Vec<Unit> {
    fn from(path: Path) -> Self {
        path.units.into_vec()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, unit) in self.units.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{unit}")?;
        }
        Ok(())
    }
}
