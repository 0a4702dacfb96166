//! # Rate Graph
//!
//! Bidirectional weighted adjacency built from declared rate triples.
//!
//! Every declared edge `A -> B = r` is stored together with its inverse
//! `B -> A = 1/r`, so traversal never has to derive a rate at query time.
//! Neighbor maps are ordered by unit name, which makes every walk over the
//! graph deterministic.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::model::{RateTriple, Unit};
use crate::{Error, Result};

/// Direct conversion factors out of one unit: `neighbor -> factor`.
pub type Neighbors = BTreeMap<Unit, f64>;

/// Immutable-after-build conversion graph.
///
/// Invariant: for every unit `U` and every neighbor `V` of `U`, `V` is a unit
/// of the graph and `rate(V, U) == 1 / rate(U, V)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateGraph {
    adjacency: BTreeMap<Unit, Neighbors>,
    /// unordered pair → triple in the orientation it was declared
    declared: BTreeMap<(Unit, Unit), RateTriple>,
}

impl RateGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a sequence of triples.
    ///
    /// Stops at the first invalid triple; a partially built graph is never
    /// returned.
    pub fn from_triples<I, T>(triples: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<RateTriple>,
    {
        let mut graph = Self::new();
        for triple in triples {
            graph.insert(triple.into())?;
        }
        debug!(units = graph.unit_count(), edges = graph.edge_count(), "built rate graph");
        Ok(graph)
    }

    /// Insert one declared rate and its inverse.
    ///
    /// Redeclaring a pair replaces the earlier rate in both directions.
    pub fn insert(&mut self, triple: RateTriple) -> Result<()> {
        let RateTriple { from, to, rate } = &triple;
        let inverse = 1.0 / rate;
        if !(rate.is_finite() && *rate > 0.0 && inverse.is_finite()) {
            return Err(Error::InvalidRate {
                from: from.to_string(),
                to: to.to_string(),
                rate: *rate,
            });
        }
        if from == to {
            return Err(Error::SelfReference { unit: from.to_string() });
        }

        if let Some(previous) = self.rate(from.as_str(), to.as_str()) {
            if previous != *rate {
                warn!(%from, %to, previous, rate, "conflicting rate redeclared, keeping the later one");
            }
        }

        self.adjacency.entry(from.clone()).or_default().insert(to.clone(), *rate);
        self.adjacency.entry(to.clone()).or_default().insert(from.clone(), inverse);

        let key = if from < to { (from.clone(), to.clone()) } else { (to.clone(), from.clone()) };
        self.declared.insert(key, triple);
        Ok(())
    }

    pub fn contains(&self, unit: &str) -> bool {
        self.adjacency.contains_key(unit)
    }

    /// The graph's own key for `name`.
    pub fn unit(&self, name: &str) -> Option<&Unit> {
        self.adjacency.get_key_value(name).map(|(unit, _)| unit)
    }

    /// Direct neighbors of `unit`, or `None` if the unit is unknown.
    pub fn neighbors(&self, unit: &str) -> Option<&Neighbors> {
        self.adjacency.get(unit)
    }

    /// Direct factor `from -> to`, if the two units share an edge.
    pub fn rate(&self, from: &str, to: &str) -> Option<f64> {
        self.adjacency.get(from)?.get(to).copied()
    }

    /// All units, sorted by name.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.adjacency.keys()
    }

    /// Declared rates, one per unit pair, in the orientation they were
    /// declared. Ordered by the pair's sorted unit names.
    pub fn declared(&self) -> impl Iterator<Item = &RateTriple> {
        self.declared.values()
    }

    pub fn unit_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Number of declared unit pairs (each stored as two directed edges).
    pub fn edge_count(&self) -> usize {
        self.declared.len()
    }

    /// Check the mirrored-edge invariant over the whole graph.
    ///
    /// `tolerance` is relative: `r_uv * r_vu` must be within it of 1.
    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        self.adjacency.iter().all(|(u, neighbors)| {
            neighbors.iter().all(|(v, r_uv)| {
                self.rate(v.as_str(), u.as_str())
                    .is_some_and(|r_vu| (r_uv * r_vu - 1.0).abs() <= tolerance)
            })
        })
    }
}
