//! # rate-graph — Unit Conversion over Sparse Rate Tables
//!
//! Converts a value between two named units when only some unit pairs have a
//! known direct rate. Rates form a bidirectional weighted graph; a conversion
//! is a walk through that graph with the edge factors multiplied together.
//!
//! ## Design Principles
//!
//! 1. **Build once, read forever**: `RateGraph` is immutable after loading
//! 2. **Clean DTOs**: `Unit`, `Path`, `RateTriple`, `Conversion` cross all boundaries
//! 3. **Loader owns nothing**: text → triples is a pure function of the input
//! 4. **Search is stateless**: every query carries its own trail
//!
//! ## Quick Start
//!
//! ```rust
//! use rate_graph::{Converter, RateGraph, RateTriple, SearchStrategy};
//!
//! # fn example() -> rate_graph::Result<()> {
//! let graph = RateGraph::from_triples([
//!     RateTriple::new("m", "cm", 100.0),
//!     RateTriple::new("cm", "mm", 10.0),
//! ])?;
//!
//! let converter = Converter::new(graph, SearchStrategy::DepthFirst);
//! let conversion = converter.convert(5.0, "m", "mm")?;
//! assert_eq!(conversion.to_string(), "5 m = 5000 mm");
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Search Strategies
//!
//! | Strategy | Guarantee |
//! |----------|-----------|
//! | `DepthFirst` (default) | first route found, neighbors tried in name order |
//! | `BreadthFirst` | fewest hops |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod graph;
pub mod loader;
pub mod search;
pub mod config;
pub mod export;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{Unit, Path, RateTriple, Conversion};
pub use graph::RateGraph;
pub use loader::{RateLoader, LoadedRates, SkippedLine, MalformedPolicy};
pub use search::{find_path, find_shortest_path, evaluate, factor, SearchStrategy};
pub use config::ConverterConfig;
pub use export::export_rate_table;

use tracing::debug;

// ============================================================================
// Top-level Converter handle
// ============================================================================

/// The primary entry point. A `Converter` owns a built rate graph and
/// answers conversion requests against it.
///
/// The graph is never mutated after construction, so a single converter can
/// be shared between threads.
#[derive(Debug, Clone)]
pub struct Converter {
    graph: RateGraph,
    strategy: SearchStrategy,
}

impl Converter {
    /// Create a converter over an already built graph.
    pub fn new(graph: RateGraph, strategy: SearchStrategy) -> Self {
        Self { graph, strategy }
    }

    /// Load the configured rate table and build the graph.
    ///
    /// Fails fast: an invalid configuration, an unreadable source, a
    /// malformed line (under the abort policy) or a table with no rates at
    /// all is an error.
    pub fn from_config(config: &ConverterConfig) -> Result<Self> {
        config.validate()?;
        let loaded = config.loader().read_path(&config.rates_path)?;
        if loaded.triples.is_empty() {
            return Err(Error::NoRatesLoaded { path: config.rates_path.clone() });
        }
        let graph = RateGraph::from_triples(loaded.triples)?;
        debug!(
            path = %config.rates_path.display(),
            units = graph.unit_count(),
            edges = graph.edge_count(),
            skipped = loaded.skipped.len(),
            "rate graph ready"
        );
        Ok(Self::new(graph, config.strategy))
    }

    /// Find a route from `from` to `to` using the configured strategy.
    pub fn find_path(&self, from: &str, to: &str) -> Result<Option<Path>> {
        self.strategy.find_path(&self.graph, from, to)
    }

    /// Convert `value` expressed in `from` into `to`.
    pub fn convert(&self, value: f64, from: &str, to: &str) -> Result<Conversion> {
        let path = self.find_path(from, to)?.ok_or_else(|| Error::NoPath {
            from: from.to_string(),
            to: to.to_string(),
        })?;
        let result = evaluate(value, &path, &self.graph)?;
        Ok(Conversion {
            value,
            from: Unit::from(from),
            to: Unit::from(to),
            result,
            path,
        })
    }

    pub fn graph(&self) -> &RateGraph {
        &self.graph
    }

    pub fn strategy(&self) -> SearchStrategy {
        self.strategy
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Malformed line {line}: {reason}: {content:?}")]
    MalformedLine { line: usize, reason: String, content: String },

    #[error("Malformed rate on line {line}: {token:?} is not a positive number")]
    MalformedRate { line: usize, token: String },

    #[error("Invalid rate {rate} for {from} -> {to}: must be finite and positive")]
    InvalidRate { from: String, to: String, rate: f64 },

    #[error("Self-referencing rate: {unit} -> {unit}")]
    SelfReference { unit: String },

    #[error("could not open file {}: {source}", path.display())]
    SourceUnavailable {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No rates loaded from {}", path.display())]
    NoRatesLoaded { path: std::path::PathBuf },

    #[error("Unit not found: {0}")]
    UnitNotFound(String),

    #[error("conversion route not found")]
    NoPath { from: String, to: String },

    #[error("Broken path: no direct rate from {from} to {to}")]
    BrokenPath { from: String, to: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
