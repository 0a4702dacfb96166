//! # Route Search & Evaluation
//!
//! Finds a chain of direct rates linking two units and folds the rates along
//! it into one factor.
//!
//! The default search is depth-first with backtracking: neighbors are tried
//! in unit-name order and the first route that reaches the goal wins. It does
//! not look for the shortest route. `SearchStrategy::BreadthFirst` does, and
//! may therefore report a different route when several exist.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::graph::RateGraph;
use crate::model::{Path, Unit};
use crate::{Error, Result};

// ============================================================================
// Strategy
// ============================================================================

/// How to look for a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchStrategy {
    /// First route found, neighbors in name order.
    #[default]
    DepthFirst,
    /// Route with the fewest hops.
    BreadthFirst,
}

impl SearchStrategy {
    pub fn find_path(self, graph: &RateGraph, start: &str, goal: &str) -> Result<Option<Path>> {
        match self {
            Self::DepthFirst => find_path(graph, start, goal),
            Self::BreadthFirst => find_shortest_path(graph, start, goal),
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DepthFirst => f.write_str("depth-first"),
            Self::BreadthFirst => f.write_str("breadth-first"),
        }
    }
}

impl FromStr for SearchStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "depth-first" | "dfs" => Ok(Self::DepthFirst),
            "breadth-first" | "bfs" => Ok(Self::BreadthFirst),
            other => Err(Error::Config(format!("unknown search strategy: {other}"))),
        }
    }
}

// ============================================================================
// Depth-first search
// ============================================================================

/// Units visited on the way to the current one, in order.
struct Trail<'g> {
    units: Vec<&'g Unit>,
    members: HashSet<&'g str>,
}

impl<'g> Trail<'g> {
    fn new() -> Self {
        Self { units: Vec::new(), members: HashSet::new() }
    }

    fn contains(&self, unit: &str) -> bool {
        self.members.contains(unit)
    }

    fn push(&mut self, unit: &'g Unit) {
        self.units.push(unit);
        self.members.insert(unit.as_str());
    }

    fn pop(&mut self) {
        if let Some(unit) = self.units.pop() {
            self.members.remove(unit.as_str());
        }
    }

    /// Push `unit` for the lifetime of the returned guard.
    fn step(&mut self, unit: &'g Unit) -> Step<'_, 'g> {
        self.push(unit);
        Step { trail: self, keep: false }
    }
}

/// Scoped trail entry: pops its unit on drop unless [`Step::keep`] was called.
struct Step<'t, 'g> {
    trail: &'t mut Trail<'g>,
    keep: bool,
}

impl<'g> Step<'_, 'g> {
    fn trail(&mut self) -> &mut Trail<'g> {
        self.trail
    }

    fn keep(mut self) {
        self.keep = true;
    }
}

impl Drop for Step<'_, '_> {
    fn drop(&mut self) {
        if !self.keep {
            self.trail.pop();
        }
    }
}

/// Find some route from `start` to `goal`.
///
/// Returns `Ok(None)` when the units are not connected, and
/// `Err(Error::UnitNotFound)` when either unit is not in the graph. When
/// `start == goal` the route is the single unit itself.
pub fn find_path(graph: &RateGraph, start: &str, goal: &str) -> Result<Option<Path>> {
    let (start, goal) = endpoints(graph, start, goal)?;
    if start == goal {
        return Ok(Some(Path::single(start.clone())));
    }

    let mut trail = Trail::new();
    let found = descend(graph, start, goal, &mut trail);
    debug!(%start, %goal, found, hops = trail.units.len().saturating_sub(1), "depth-first search");

    if !found {
        return Ok(None);
    }
    Ok(Path::from_units(trail.units.into_iter().cloned()))
}

fn descend<'g>(graph: &'g RateGraph, current: &'g Unit, goal: &'g Unit, trail: &mut Trail<'g>) -> bool {
    // Symmetric graph: every neighbor is itself a key.
    let Some(neighbors) = graph.neighbors(current.as_str()) else {
        return false;
    };

    if neighbors.contains_key(goal.as_str()) {
        trail.push(current);
        trail.push(goal);
        return true;
    }

    if trail.contains(current.as_str()) {
        return false;
    }

    trace!(unit = %current, depth = trail.units.len(), "expanding");
    let mut step = trail.step(current);
    for next in neighbors.keys() {
        if descend(graph, next, goal, step.trail()) {
            step.keep();
            return true;
        }
    }
    false
}

// ============================================================================
// Breadth-first search
// ============================================================================

/// Find a route with the fewest hops from `start` to `goal`.
///
/// Same contract as [`find_path`]. Among equally short routes the one
/// reached first in unit-name order wins.
pub fn find_shortest_path(graph: &RateGraph, start: &str, goal: &str) -> Result<Option<Path>> {
    let (start, goal) = endpoints(graph, start, goal)?;
    if start == goal {
        return Ok(Some(Path::single(start.clone())));
    }

    // unit → unit it was first reached from
    let mut parent: HashMap<&Unit, &Unit> = HashMap::new();
    let mut queue: VecDeque<&Unit> = VecDeque::from([start]);
    parent.insert(start, start);

    while let Some(tip) = queue.pop_front() {
        let Some(neighbors) = graph.neighbors(tip.as_str()) else { continue };
        for next in neighbors.keys() {
            if parent.contains_key(next) {
                continue;
            }
            parent.insert(next, tip);
            if next == goal {
                let path = unwind(&parent, start, goal)?;
                debug!(%start, %goal, hops = path.hop_count(), "breadth-first search");
                return Ok(Some(path));
            }
            queue.push_back(next);
        }
    }

    debug!(%start, %goal, "breadth-first search found no route");
    Ok(None)
}

/// Follow `parent` links back from `goal` to `start`.
///
/// A chain that stops short of `start`, or loops without reaching it, is a
/// `BrokenPath` naming the unit where the walk got stuck.
fn unwind<'g>(
    parent: &HashMap<&'g Unit, &'g Unit>,
    start: &'g Unit,
    goal: &'g Unit,
) -> Result<Path> {
    let broken = |at: &Unit| Error::BrokenPath { from: at.to_string(), to: start.to_string() };

    let mut units = vec![goal.clone()];
    let mut cursor = goal;
    while cursor != start {
        let &prev = parent.get(cursor).ok_or_else(|| broken(cursor))?;
        if units.len() > parent.len() {
            return Err(broken(cursor));
        }
        cursor = prev;
        units.push(cursor.clone());
    }
    units.reverse();
    Path::from_units(units).ok_or_else(|| broken(goal))
}

// ============================================================================
// Evaluation
// ============================================================================

/// Apply every rate along `path` to `value`.
///
/// Plain floating-point multiplication; rounding error grows with the number
/// of hops. Fails with `Error::BrokenPath` if two consecutive units of the
/// path share no edge in `graph`.
pub fn evaluate(value: f64, path: &Path, graph: &RateGraph) -> Result<f64> {
    path.hops().try_fold(value, |acc, (from, to)| {
        graph
            .rate(from.as_str(), to.as_str())
            .map(|rate| acc * rate)
            .ok_or_else(|| Error::BrokenPath { from: from.to_string(), to: to.to_string() })
    })
}

/// Cumulative factor of `path`: `evaluate(1.0, path, graph)`.
pub fn factor(path: &Path, graph: &RateGraph) -> Result<f64> {
    evaluate(1.0, path, graph)
}

/// Resolve both endpoints to the graph's own `Unit` keys.
fn endpoints<'g>(graph: &'g RateGraph, start: &str, goal: &str) -> Result<(&'g Unit, &'g Unit)> {
    let resolve = |name: &str| graph.unit(name).ok_or_else(|| Error::UnitNotFound(name.to_string()));
    Ok((resolve(start)?, resolve(goal)?))
}
