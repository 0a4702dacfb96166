//! Rate table loader — turns delimited text lines into rate triples.
//!
//! One line per declared rate:
//!
//! ```text
//! m;cm;100
//! cm;mm;10
//! ```
//!
//! Fields past the third are ignored. Blank lines are skipped. Everything
//! else that fails to parse is handled by the configured [`MalformedPolicy`].

use std::fs::File;
use std::io::{BufRead, BufReader};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::model::RateTriple;
use crate::{Error, Result};

/// Field separator used by default.
pub const DEFAULT_DELIMITER: char = ';';

/// What to do with a line that does not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Stop loading and return the line's error.
    #[default]
    Abort,
    /// Log the line, record it in [`LoadedRates::skipped`] and continue.
    Skip,
}

/// A line dropped under [`MalformedPolicy::Skip`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number.
    pub line: usize,
    pub reason: String,
}

/// Result of reading a whole rate table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedRates {
    pub triples: Vec<RateTriple>,
    pub skipped: Vec<SkippedLine>,
}

/// Line-oriented rate table reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLoader {
    delimiter: char,
    policy: MalformedPolicy,
}

impl Default for RateLoader {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER, MalformedPolicy::default())
    }
}

impl RateLoader {
    pub fn new(delimiter: char, policy: MalformedPolicy) -> Self {
        Self { delimiter, policy }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn policy(&self) -> MalformedPolicy {
        self.policy
    }

    /// Parse one line. `Ok(None)` for a blank line.
    ///
    /// `line_no` is 1-based and only used for error reporting.
    pub fn parse_line(&self, line_no: usize, line: &str) -> Result<Option<RateTriple>> {
        if line.trim().is_empty() {
            return Ok(None);
        }

        let fields: Vec<&str> = line.split(self.delimiter).map(str::trim).collect();
        if fields.len() < 3 {
            return Err(malformed(line_no, format!("expected 3 fields, got {}", fields.len()), line));
        }

        let (from, to, token) = (fields[0], fields[1], fields[2]);
        if from.is_empty() || to.is_empty() {
            return Err(malformed(line_no, "empty unit name".into(), line));
        }
        if from == to {
            return Err(malformed(line_no, format!("unit {from} is rated against itself"), line));
        }

        let rate = parse_rate(token).ok_or_else(|| Error::MalformedRate {
            line: line_no,
            token: token.to_string(),
        })?;

        Ok(Some(RateTriple::new(from, to, rate)))
    }

    /// Read every line of `reader`.
    pub fn read<R: BufRead>(&self, reader: R) -> Result<LoadedRates> {
        let mut loaded = LoadedRates::default();

        for (idx, raw) in reader.split(b'\n').enumerate() {
            let line_no = idx + 1;
            let raw = raw?;
            match decode_line(line_no, raw).and_then(|line| self.parse_line(line_no, &line)) {
                Ok(Some(triple)) => loaded.triples.push(triple),
                Ok(None) => {}
                Err(err) if self.policy == MalformedPolicy::Skip && is_line_error(&err) => {
                    warn!(line = line_no, error = %err, "skipping malformed rate line");
                    loaded.skipped.push(SkippedLine { line: line_no, reason: err.to_string() });
                }
                Err(err) => return Err(err),
            }
        }

        debug!(
            triples = loaded.triples.len(),
            skipped = loaded.skipped.len(),
            "read rate table"
        );
        Ok(loaded)
    }

    /// Parse a rate table held in memory.
    pub fn read_str(&self, text: &str) -> Result<LoadedRates> {
        self.read(text.as_bytes())
    }

    /// Open and read a rate table file.
    pub fn read_path(&self, path: &std::path::Path) -> Result<LoadedRates> {
        let file = File::open(path).map_err(|source| Error::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened rate table");
        self.read(BufReader::new(file))
    }
}

/// Positive, finite rates only. Rejects anything `f64::from_str` would turn
/// into zero, NaN or infinity.
fn parse_rate(token: &str) -> Option<f64> {
    token
        .parse::<f64>()
        .ok()
        .filter(|rate| rate.is_finite() && *rate > 0.0 && (1.0 / rate).is_finite())
}

/// Bytes of one line, minus the `\n` separator and an optional `\r`.
fn decode_line(line_no: usize, mut raw: Vec<u8>) -> Result<String> {
    if raw.last() == Some(&b'\r') {
        raw.pop();
    }
    String::from_utf8(raw).map_err(|err| {
        malformed(line_no, "not valid UTF-8".into(), &String::from_utf8_lossy(err.as_bytes()))
    })
}

fn malformed(line: usize, reason: String, content: &str) -> Error {
    Error::MalformedLine { line, reason, content: content.to_string() }
}

fn is_line_error(err: &Error) -> bool {
    matches!(err, Error::MalformedLine { .. } | Error::MalformedRate { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_line() {
        let triple = RateLoader::default().parse_line(1, "m;cm;100").unwrap();
        assert_eq!(triple, Some(RateTriple::new("m", "cm", 100.0)));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let triple = RateLoader::default().parse_line(1, "kg;g;1000;mass;whatever").unwrap();
        assert_eq!(triple, Some(RateTriple::new("kg", "g", 1000.0)));
    }

    #[test]
    fn test_two_fields_is_malformed_line() {
        let err = RateLoader::default().parse_line(7, "m;cm").unwrap_err();
        match err {
            Error::MalformedLine { line, reason, content } => {
                assert_eq!(line, 7);
                assert_eq!(reason, "expected 3 fields, got 2");
                assert_eq!(content, "m;cm");
            }
            other => panic!("expected MalformedLine, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_rate_tokens() {
        let loader = RateLoader::default();
        for token in ["abc", "", "0", "-2", "NaN", "inf", "1e999"] {
            let err = loader.parse_line(3, &format!("a;b;{token}")).unwrap_err();
            assert!(
                matches!(&err, Error::MalformedRate { line: 3, token: t } if t == token),
                "token {token:?} gave {err:?}",
            );
        }
    }

    #[test]
    fn test_whitespace_and_crlf_trimmed() {
        let triple = RateLoader::default().parse_line(1, " ft ; in ; 12 \r").unwrap();
        assert_eq!(triple, Some(RateTriple::new("ft", "in", 12.0)));
    }

    #[test]
    fn test_empty_unit_and_self_reference() {
        let loader = RateLoader::default();
        assert!(matches!(loader.parse_line(1, ";cm;100"), Err(Error::MalformedLine { .. })));
        assert!(matches!(loader.parse_line(1, "m;m;1"), Err(Error::MalformedLine { .. })));
    }

    #[test]
    fn test_custom_delimiter() {
        let loader = RateLoader::new(',', MalformedPolicy::Abort);
        let loaded = loader.read_str("lb,oz,16\noz,g,28.349523125\n").unwrap();
        assert_eq!(loaded.triples.len(), 2);
        assert_eq!(loaded.triples[1], RateTriple::new("oz", "g", 28.349523125));
    }

    #[test]
    fn test_trailing_newline_adds_nothing() {
        let loaded = RateLoader::default().read_str("m;cm;100\ncm;mm;10\n\n").unwrap();
        assert_eq!(loaded.triples.len(), 2);
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn test_abort_policy_stops_at_first_bad_line() {
        let err = RateLoader::default().read_str("m;cm;100\nbroken\ncm;mm;x\n").unwrap_err();
        assert!(matches!(err, Error::MalformedLine { line: 2, .. }));
    }

    #[test]
    fn test_skip_policy_records_bad_lines() {
        let loader = RateLoader::new(';', MalformedPolicy::Skip);
        let loaded = loader.read_str("m;cm;100\nbroken\ncm;mm;x\ncm;mm;10\n").unwrap();
        assert_eq!(
            loaded.triples,
            vec![RateTriple::new("m", "cm", 100.0), RateTriple::new("cm", "mm", 10.0)],
        );
        let lines: Vec<usize> = loaded.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![2, 3]);
    }

    const LATIN1_ROW: &[u8] = b"m;cm;100\n\xb5m;m;0.000001\ncm;mm;10\n";

    #[test]
    fn test_undecodable_line_aborts_with_line_number() {
        let err = RateLoader::default().read(LATIN1_ROW).unwrap_err();
        match err {
            Error::MalformedLine { line, reason, content } => {
                assert_eq!(line, 2);
                assert_eq!(reason, "not valid UTF-8");
                assert_eq!(content, "\u{FFFD}m;m;0.000001");
            }
            other => panic!("expected MalformedLine, got {other:?}"),
        }
    }

    #[test]
    fn test_undecodable_line_is_skippable() {
        let loaded = RateLoader::new(';', MalformedPolicy::Skip).read(LATIN1_ROW).unwrap();
        assert_eq!(
            loaded.triples,
            vec![RateTriple::new("m", "cm", 100.0), RateTriple::new("cm", "mm", 10.0)],
        );
        assert_eq!(loaded.skipped.len(), 1);
        assert_eq!(loaded.skipped[0].line, 2);
        assert!(loaded.skipped[0].reason.contains("not valid UTF-8"));
    }

    #[test]
    fn test_crlf_file_reads_cleanly() {
        let loaded = RateLoader::default().read_str("m;cm;100\r\n\r\ncm;mm;10\r\n").unwrap();
        assert_eq!(loaded.triples.len(), 2);
        assert!(loaded.skipped.is_empty());
    }

    #[test]
    fn test_missing_file() {
        let path = std::path::Path::new("/nonexistent/rates.txt");
        let err = RateLoader::default().read_path(path).unwrap_err();
        assert!(err.to_string().starts_with("could not open file"));
    }
}
