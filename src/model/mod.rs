//! # Conversion Model
//!
//! Clean DTOs shared by the loader, the graph, the search and the front end.
//!
//! Design rule: this module is pure data. No I/O, no logging, no graph
//! lookups.

pub mod unit;
pub mod path;
pub mod triple;
pub mod conversion;

pub use unit::Unit;
pub use path::Path;
pub use triple::RateTriple;
pub use conversion::Conversion;
