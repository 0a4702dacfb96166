//! End-to-end tests for loading rate tables from disk.
//!
//! Exercises the loader, the malformed-line policies, configuration files
//! and `Converter::from_config` startup failures against the fixtures in
//! `tests/fixtures/`.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use rate_graph::{
    export_rate_table, Converter, ConverterConfig, Error, MalformedPolicy, RateGraph, RateLoader,
    SearchStrategy,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn config_for(name: &str) -> ConverterConfig {
    ConverterConfig { rates_path: fixture(name), ..ConverterConfig::default() }
}

// ============================================================================
// 1. Well-formed table
// ============================================================================

#[test]
fn test_load_fixture_table() {
    let converter = Converter::from_config(&config_for("rates.txt")).unwrap();
    let graph = converter.graph();
    assert_eq!(graph.edge_count(), 10);
    assert_eq!(graph.unit_count(), 12);
    assert!(graph.is_symmetric(1e-12));

    let conversion = converter.convert(5.0, "m", "mm").unwrap();
    assert_eq!(conversion.to_string(), "5 m = 5000 mm");
}

// ============================================================================
// 2. Malformed lines: abort vs skip
// ============================================================================

#[test]
fn test_abort_policy_fails_startup() {
    let err = Converter::from_config(&config_for("broken.txt")).unwrap_err();
    match err {
        Error::MalformedLine { line, content, .. } => {
            assert_eq!(line, 2);
            assert_eq!(content, "cm;mm");
        }
        other => panic!("expected MalformedLine, got {other:?}"),
    }
}

#[test]
fn test_skip_policy_keeps_good_lines() {
    let loader = RateLoader::new(';', MalformedPolicy::Skip);
    let loaded = loader.read_path(&fixture("broken.txt")).unwrap();
    assert_eq!(loaded.triples.len(), 3);
    let skipped: Vec<usize> = loaded.skipped.iter().map(|s| s.line).collect();
    assert_eq!(skipped, vec![2, 4]);

    let config = ConverterConfig {
        on_malformed: MalformedPolicy::Skip,
        ..config_for("broken.txt")
    };
    let converter = Converter::from_config(&config).unwrap();
    assert_eq!(converter.convert(2.0, "kg", "g").unwrap().result, 2000.0);
}

// ============================================================================
// 3. Missing and empty sources fail fast
// ============================================================================

#[test]
fn test_missing_source() {
    let err = Converter::from_config(&config_for("does-not-exist.txt")).unwrap_err();
    assert!(matches!(err, Error::SourceUnavailable { .. }));
    assert!(err.to_string().starts_with("could not open file"));
}

#[test]
fn test_empty_source() {
    let err = Converter::from_config(&config_for("empty.txt")).unwrap_err();
    assert!(matches!(err, Error::NoRatesLoaded { .. }));
}

// ============================================================================
// 4. Configuration file
// ============================================================================

#[test]
fn test_config_file_resolves_relative_rates_path() {
    let config = ConverterConfig::load(&fixture("converter.toml")).unwrap();
    assert_eq!(config.rates_path, fixture("rates.txt"));
    assert_eq!(config.strategy, SearchStrategy::BreadthFirst);

    let converter = Converter::from_config(&config).unwrap();
    assert_eq!(converter.strategy(), SearchStrategy::BreadthFirst);
    let path = converter.find_path("mi", "yd").unwrap().unwrap();
    assert_eq!(path.hop_count(), 2);
}

#[test]
fn test_config_built_in_code_is_validated() {
    for delimiter in ['e', '-', ' '] {
        let config = ConverterConfig { delimiter, ..config_for("rates.txt") };
        let err = Converter::from_config(&config).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "delimiter {delimiter:?} accepted");
    }
}

#[test]
fn test_missing_config_file() {
    let err = ConverterConfig::load(&fixture("nope.toml")).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

// ============================================================================
// 5. Export round trip through the file format
// ============================================================================

#[test]
fn test_export_matches_loaded_table() {
    let converter = Converter::from_config(&config_for("rates.txt")).unwrap();

    let mut out = Vec::new();
    let lines = export_rate_table(converter.graph(), &mut out, ';').unwrap();
    assert_eq!(lines, 10);

    let text = String::from_utf8(out).unwrap();
    let reloaded = RateGraph::from_triples(RateLoader::default().read_str(&text).unwrap().triples).unwrap();
    assert_eq!(&reloaded, converter.graph());
}
