//! RateTriple — one declared direct conversion rate.

use serde::{Deserialize, Serialize};

use super::Unit;

/// `1 from = rate to`, as read from one line of a rate table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTriple {
    pub from: Unit,
    pub to: Unit,
    pub rate: f64,
}

impl RateTriple {
    pub fn new(from: impl Into<Unit>, to: impl Into<Unit>, rate: f64) -> Self {
        Self { from: from.into(), to: to.into(), rate }
    }
}

impl<A, B> From<(A, B, f64)> for RateTriple
where
    A: Into<Unit>,
    B: Into<Unit>,
{
    fn from((from, to, rate): (A, B, f64)) -> Self {
        Self::new(from, to, rate)
    }
}
