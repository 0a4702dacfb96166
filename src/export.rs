//! Rate table export — write a graph back out as delimited text.
//!
//! Produces one line per declared unit pair, in the orientation the pair was
//! declared, so the output loads back into an identical graph:
//!
//! ```text
//! RateGraph → export_rate_table() → m;cm;100
//!                                   cm;mm;10
//! ```

use std::io::Write;

use crate::graph::RateGraph;
use crate::Result;

/// Write every declared rate of `graph` to `writer`.
///
/// Inverse edges are implied by the format and are not written. Returns the
/// number of lines written.
pub fn export_rate_table(graph: &RateGraph, writer: &mut dyn Write, delimiter: char) -> Result<usize> {
    let mut lines = 0;
    for triple in graph.declared() {
        writeln!(writer, "{}{delimiter}{}{delimiter}{}", triple.from, triple.to, format_rate(triple.rate))?;
        lines += 1;
    }
    writer.flush()?;
    Ok(lines)
}

/// Shortest text that parses back to exactly `rate`.
fn format_rate(rate: f64) -> String {
    format!("{rate}")
}
