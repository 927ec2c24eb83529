//! kpiboard CLI - Sales KPI metrics from CSV uploads
//!
//! # Main Commands
//!
//! ```bash
//! kpiboard report sales.csv            # Print metrics as a text report
//! kpiboard report sales.csv --json     # Full report as JSON
//! kpiboard serve                       # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! kpiboard parse sales.csv             # Just parse CSV to JSON rows
//! kpiboard validate sales.csv          # Check columns, dates and numbers
//! ```

use clap::{Parser, Subcommand};
use kpiboard::config::Settings;
use kpiboard::metrics::format::{format_amount, format_currency, format_percent};
use kpiboard::metrics::normalize;
use kpiboard::metrics::pipeline::{analyze_file, format_delimiter, Report};
use kpiboard::metrics::Granularity;
use kpiboard::parser::{parse_file, DEFAULT_DELIMITER};
use kpiboard::validation::validate;
use kpiboard::LOG_BROADCASTER;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "kpiboard")]
#[command(about = "Sales KPI metrics from semicolon-delimited CSV files", long_about = None)]
struct Cli {
    /// Silence pipeline progress logs
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics for a CSV file
    Report {
        /// Input CSV file
        input: PathBuf,

        /// Sales-over-time bucket: daily, weekly or monthly
        #[arg(short, long)]
        granularity: Option<Granularity>,

        /// Number of top customers to list
        #[arg(short = 'n', long)]
        top: Option<usize>,

        /// CSV delimiter, or "auto" to detect it (default: ';')
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Emit the full report as JSON
        #[arg(long)]
        json: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse a CSV file and output JSON rows
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter, or "auto" to detect it (default: ';')
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check that a CSV file would be accepted
    Validate {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter, or "auto" to detect it (default: ';')
        #[arg(short, long)]
        delimiter: Option<String>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: KPIBOARD_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    if cli.quiet {
        LOG_BROADCASTER.set_echo(false);
    }
    let settings = Settings::from_env();

    let result = match cli.command {
        Commands::Report {
            input,
            granularity,
            top,
            delimiter,
            json,
            output,
        } => cmd_report(
            &settings,
            &input,
            granularity,
            top,
            delimiter.as_deref(),
            json,
            output.as_deref(),
        ),

        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter.as_deref(), output.as_deref()),

        Commands::Validate { input, delimiter } => cmd_validate(&input, delimiter.as_deref()),

        Commands::Serve { port } => {
            let settings = Settings {
                port: port.unwrap_or(settings.port),
                ..settings
            };
            kpiboard::server::start_server(settings).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// `None` → default `;`, `"auto"` → detect, otherwise a single character.
fn parse_delimiter(arg: Option<&str>) -> Result<Option<char>, Box<dyn std::error::Error>> {
    match arg {
        None => Ok(Some(DEFAULT_DELIMITER)),
        Some(s) if s.eq_ignore_ascii_case("auto") => Ok(None),
        Some("\\t") | Some("tab") => Ok(Some('\t')),
        Some(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Some(c)),
                _ => Err(format!("delimiter must be a single character or 'auto', got '{}'", s).into()),
            }
        }
    }
}

fn cmd_report(
    settings: &Settings,
    input: &Path,
    granularity: Option<Granularity>,
    top: Option<usize>,
    delimiter: Option<&str>,
    json: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = settings.report_options();
    if let Some(g) = granularity {
        options.granularity = g;
    }
    if let Some(n) = top {
        options.top_customers = n;
    }
    options.delimiter = parse_delimiter(delimiter)?;

    let report = analyze_file(input, &options)?;

    let rendered = if json {
        serde_json::to_string_pretty(&report)?
    } else {
        render_text(&report)
    };
    write_output(&rendered, output)
}

fn render_text(report: &Report) -> String {
    let m = &report.metrics;
    let mut out = Vec::new();

    out.push("Performance Indicator Dashboard".to_string());
    out.push(format!(
        "Source: {} rows, encoding {}, delimiter '{}'",
        report.csv_info.row_count,
        report.csv_info.encoding,
        format_delimiter(report.csv_info.delimiter)
    ));
    out.push(String::new());
    out.push(format!("Total Sales:              {}", format_amount(m.total_sales)));
    out.push(format!("Total Revenue:            {}", format_currency(m.total_revenue)));
    out.push(format!("Customer Retention Rate:  {}", format_percent(m.retention_rate)));
    out.push(format!("Average Growth Rate:      {}", format_percent(m.average_growth_rate)));

    out.push(String::new());
    out.push(format!("Sales Performance Over Time ({})", m.sales_over_time.granularity));
    if m.sales_over_time.points.is_empty() {
        out.push("  (no data)".to_string());
    }
    for point in &m.sales_over_time.points {
        out.push(format!("  {:<12} {}", point.period, format_amount(point.sales)));
    }

    out.push(String::new());
    out.push("Sales by Region".to_string());
    if m.sales_by_region.is_empty() {
        out.push("  (no data)".to_string());
    }
    for (region, sales) in &m.sales_by_region {
        out.push(format!("  {:<20} {}", region, format_amount(*sales)));
    }

    out.push(String::new());
    out.push(format!("Top {} Customers by Revenue", m.top_customers_by_revenue.len()));
    for (rank, customer) in m.top_customers_by_revenue.iter().enumerate() {
        out.push(format!(
            "  {}. {:<16} {}",
            rank + 1,
            customer.customer_id,
            format_currency(customer.revenue)
        ));
    }

    out.join("\n")
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<&str>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let table = parse_file(input, parse_delimiter(delimiter)?)?;

    eprintln!("   Encoding: {}", table.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(table.delimiter));
    eprintln!("   Columns: {}", table.headers.join(", "));
    eprintln!("✅ Parsed {} records", table.row_count());

    let json = serde_json::to_string_pretty(&table.preview(table.row_count()))?;
    write_output(&json, output)
}

fn cmd_validate(input: &Path, delimiter: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let table = parse_file(input, parse_delimiter(delimiter)?)?;
    let valid = validate(table)?;
    let dataset = normalize(&valid)?;

    eprintln!(
        "✅ {} records accepted ({})",
        dataset.len(),
        if dataset.growth_rate_supplied() {
            "Growth Rate supplied"
        } else {
            "Growth Rate derived from Revenue"
        }
    );
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
