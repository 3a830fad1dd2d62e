use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tou_savings::{config::Config, evaluate, loader::IntervalLoader};

#[derive(Parser)]
#[command(name = "tou-savings", version)]
#[command(about = "Compare flat-rate and time-of-use costs for a meter interval export", long_about = None)]
struct Cli {
    /// Interval export to read. Asked for interactively when omitted.
    csv: Option<PathBuf>,

    /// TOML file overriding rates, holidays and the export layout
    #[arg(short, long, env = "TOU_SAVINGS_CONFIG")]
    config: Option<PathBuf>,

    /// Number of lines before the header row
    #[arg(long)]
    preamble_lines: Option<usize>,
}

fn prompt_for_path() -> Result<PathBuf> {
    print!("Enter the path to your CSV file: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("Failed to read the file path")?;
    let path = line.trim();
    if path.is_empty() {
        bail!("No input file given");
    }
    Ok(PathBuf::from(path))
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_toml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            error!("{e}");
        }
        bail!("Invalid configuration ({} problems)", errors.len());
    }
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(lines) = cli.preamble_lines {
        config.preamble_lines = lines;
    }

    let csv_path = match cli.csv {
        Some(path) => path,
        None => prompt_for_path()?,
    };
    let file = File::open(&csv_path)
        .with_context(|| format!("Cannot open '{}'", csv_path.display()))?;

    let calendar = config.holiday_calendar();
    info!(
        path = %csv_path.display(),
        preamble_lines = config.preamble_lines,
        holidays = calendar.len(),
        "Reading export"
    );

    let mut outcome = IntervalLoader::from(&config)
        .load(file)
        .with_context(|| format!("Failed to read {}", csv_path.display()))?;

    let report = evaluate(&mut outcome.intervals, &calendar, &config.rates, config.unclassified);
    if report.unclassified.intervals != 0 {
        warn!(
            intervals = report.unclassified.intervals,
            kwh = report.unclassified.kwh,
            "Some intervals match no tariff window"
        );
    }

    println!("{report}");
    Ok(())
}
