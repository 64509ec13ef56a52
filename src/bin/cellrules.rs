//! cellrules CLI - run spreadsheet rule configurations against rows
//!
//! Rows are read as JSON lines, one object per row mapping column letters to
//! cell text. Results are written to stdout as JSON lines.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use cellrules::{ParserConfig, ParserEngine, SupplierConfig};
use clap::{Parser, Subcommand};
use indexmap::IndexMap;
use serde_json::{json, Value as JsonValue};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cellrules")]
#[command(
    version,
    about = "Declarative rule interpreter for supplier spreadsheets",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, merge and compile a configuration without parsing rows
    Validate {
        /// Parser configuration (JSON or YAML)
        #[arg(short, long, default_value = "parser.yaml")]
        config: PathBuf,

        /// Supplier configurations to merge into the lookup tables
        #[arg(short, long)]
        supplier: Vec<PathBuf>,
    },

    /// Parse rows and print their properties
    Parse {
        /// Parser configuration (JSON or YAML)
        #[arg(short, long, default_value = "parser.yaml")]
        config: PathBuf,

        /// Supplier configurations to merge into the lookup tables
        #[arg(short, long)]
        supplier: Vec<PathBuf>,

        /// JSON lines file of rows, `-` for stdin
        #[arg(short, long, default_value = "-")]
        rows: PathBuf,

        /// Include the diagnostic trace in the output
        #[arg(short, long)]
        trace: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { config, supplier } => validate(config, supplier),
        Commands::Parse {
            config,
            supplier,
            rows,
            trace,
        } => parse(config, supplier, rows, trace),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Load the parser configuration and merge every supplier into it.
fn load_config(config: &Path, suppliers: &[PathBuf]) -> Result<ParserConfig, String> {
    let mut parser_config = ParserConfig::load_from_file(config).map_err(|e| e.to_string())?;

    for path in suppliers {
        let supplier = SupplierConfig::load_from_file(path)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        parser_config.merge_supplier(&supplier);
    }

    Ok(parser_config)
}

fn validate(config: PathBuf, suppliers: Vec<PathBuf>) -> Result<(), String> {
    println!("🔍 Validating {}...", config.display());

    let parser_config = load_config(&config, &suppliers)?;
    let engine = ParserEngine::new(&parser_config).map_err(|e| e.to_string())?;

    for column in engine.columns() {
        let actions = engine.rule(column).map(|r| r.actions().len()).unwrap_or(0);
        println!("  ✓ column {}: {} actions", column, actions);
    }
    println!("  ✓ {} lookup tables", parser_config.lookups.len());
    println!("✅ Configuration is valid!");

    Ok(())
}

fn parse(
    config: PathBuf,
    suppliers: Vec<PathBuf>,
    rows: PathBuf,
    trace: bool,
) -> Result<(), String> {
    let parser_config = load_config(&config, &suppliers)?;
    let engine = ParserEngine::new(&parser_config).map_err(|e| e.to_string())?;

    let reader: Box<dyn BufRead> = if rows.as_os_str() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&rows)
            .map_err(|e| format!("Failed to open rows file {}: {}", rows.display(), e))?;
        Box::new(BufReader::new(file))
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let mut parsed = 0usize;

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Failed to read rows: {}", e))?;
        if line.trim().is_empty() {
            continue;
        }

        let row = parse_row_line(&line)
            .map_err(|e| format!("Row {}: invalid JSON: {}", line_no + 1, e))?;
        let result = engine.parse_row(&row);

        let record = if trace {
            json!({ "properties": result.properties, "trace": result.trace })
        } else {
            json!({ "properties": result.properties })
        };
        writeln!(out, "{}", record).map_err(|e| format!("Failed to write output: {}", e))?;
        parsed += 1;
    }

    out.flush().map_err(|e| format!("Failed to write output: {}", e))?;
    tracing::info!(rows = parsed, "parsed rows");

    Ok(())
}

/// Decode one JSON lines row. Numbers and booleans become their text form;
/// nulls are blank cells.
fn parse_row_line(line: &str) -> Result<IndexMap<String, String>, serde_json::Error> {
    let cells: IndexMap<String, JsonValue> = serde_json::from_str(line)?;
    Ok(cells
        .into_iter()
        .filter_map(|(column, value)| match value {
            JsonValue::Null => None,
            JsonValue::String(s) => Some((column, s)),
            other => Some((column, other.to_string())),
        })
        .collect())
}
