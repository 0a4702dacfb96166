//! `rateconv` — convert values between units listed in a rate table.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rate_graph::{
    export_rate_table, factor, Converter, ConverterConfig, Error, MalformedPolicy, RateGraph,
    SearchStrategy,
};

/// Exit status when the units are valid but not connected.
const EXIT_NO_ROUTE: u8 = 2;

#[derive(Parser)]
#[command(name = "rateconv")]
#[command(about = "Convert values between units using a table of direct rates", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Rate table to load (overrides the configuration file)
    #[arg(short, long, global = true)]
    rates: Option<PathBuf>,

    /// Field separator of the rate table
    #[arg(short, long, global = true)]
    delimiter: Option<char>,

    /// Skip malformed lines instead of aborting
    #[arg(long, global = true)]
    skip_malformed: bool,

    /// Route search: depth-first or breadth-first
    #[arg(short, long, global = true)]
    strategy: Option<SearchStrategy>,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a value; missing arguments are asked for on stdin
    Convert {
        /// Unit the value is expressed in
        #[arg(short, long)]
        from: Option<String>,

        /// Unit to convert into
        #[arg(short, long)]
        to: Option<String>,

        /// Value to convert
        #[arg(long, allow_negative_numbers = true, value_parser = parse_finite)]
        value: Option<f64>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Show the route between two units and its factor
    Route {
        #[arg(short, long)]
        from: String,

        #[arg(short, long)]
        to: String,
    },

    /// List every unit in the rate table
    Units,

    /// Write the normalized rate table to stdout
    Export,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > verbose flag > default (warn)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        match cli.verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = resolve_config(&cli)?;
    let converter = Converter::from_config(&config)?;
    let graph = converter.graph();

    match cli.command {
        Commands::Convert { from, to, value, format } => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut prompt = io::stdout();

            let from = match from {
                Some(unit) => unit,
                None => prompt_unit(&mut input, &mut prompt, "starting", graph)?,
            };
            let to = match to {
                Some(unit) => unit,
                None => prompt_unit(&mut input, &mut prompt, "goal", graph)?,
            };
            let value = match value {
                Some(value) => value,
                None => prompt_value(&mut input, &mut prompt)?,
            };

            match converter.convert(value, &from, &to) {
                Ok(conversion) => match format {
                    OutputFormat::Text => println!("{conversion}"),
                    OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&conversion)?),
                },
                Err(err @ Error::NoPath { .. }) => {
                    println!("{err}");
                    return Ok(ExitCode::from(EXIT_NO_ROUTE));
                }
                Err(err) => return Err(err.into()),
            }
        }

        Commands::Route { from, to } => match converter.find_path(&from, &to)? {
            Some(path) => {
                println!("{path}");
                println!("factor: {}", factor(&path, graph)?);
            }
            None => {
                println!("{}", Error::NoPath { from, to });
                return Ok(ExitCode::from(EXIT_NO_ROUTE));
            }
        },

        Commands::Units => {
            for unit in graph.units() {
                println!("{unit}");
            }
        }

        Commands::Export => {
            let mut out = io::stdout().lock();
            export_rate_table(graph, &mut out, config.delimiter)?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Configuration file (if any) with command-line overrides applied.
fn resolve_config(cli: &Cli) -> Result<ConverterConfig> {
    let mut config = match &cli.config {
        Some(path) => ConverterConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => ConverterConfig::default(),
    };

    if let Some(rates) = &cli.rates {
        config.rates_path = rates.clone();
    }
    if let Some(delimiter) = cli.delimiter {
        config.delimiter = delimiter;
    }
    if cli.skip_malformed {
        config.on_malformed = MalformedPolicy::Skip;
    }
    if let Some(strategy) = cli.strategy {
        config.strategy = strategy;
    }

    config.validate()?;
    Ok(config)
}

/// Ask for a unit until the answer names a unit of `graph`.
fn prompt_unit<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    label: &str,
    graph: &RateGraph,
) -> Result<String> {
    loop {
        write!(output, "Enter {label} unit: ")?;
        output.flush()?;
        let line = read_answer(input)?;
        let unit = line.trim();
        if graph.contains(unit) {
            return Ok(unit.to_string());
        }
        if !unit.is_empty() {
            writeln!(output, "unknown unit: {unit}")?;
        }
    }
}

/// Ask for a finite number until one is given.
fn prompt_value<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<f64> {
    loop {
        write!(output, "Enter value for conversion: ")?;
        output.flush()?;
        let line = read_answer(input)?;
        match parse_finite(&line) {
            Ok(value) => return Ok(value),
            Err(_) => writeln!(output, "not a number: {}", line.trim())?,
        }
    }
}

/// A finite `f64`; `NaN` and infinities are rejected.
fn parse_finite(text: &str) -> std::result::Result<f64, String> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(format!("not a finite number: {}", text.trim())),
    }
}

fn read_answer<R: BufRead>(input: &mut R) -> Result<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("input closed before an answer was given");
    }
    Ok(line)
}
