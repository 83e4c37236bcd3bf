//! bids-guidelines - check BIDS datasets against reporting guidelines
//!
//! Every applicable guideline gets a `tally/total` line and the dataset gets
//! one aggregate score.

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, FromArgMatches, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use guidelines_core::catalog::{convert, GuidelineCatalog};
use guidelines_core::config::AuditConfig;
use guidelines_core::dataset::BidsLayout;
use guidelines_core::engine::{DatasetEvaluation, Evaluator, RuleSet, Standard};
use guidelines_core::report;

/// Children of a batch directory that are never datasets
const BATCH_SKIP: &[&str] = &["docs", "tools"];

/// Header rows above the table in the published COBIDAS sheet
const DEFAULT_SKIP_ROWS: usize = 13;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Guideline standards accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum GuidelinesArg {
    #[value(name = "COBIDAS")]
    Cobidas,
    #[value(name = "CLAIM")]
    Claim,
    #[value(name = "CRED-nf")]
    CredNf,
}

impl From<GuidelinesArg> for Standard {
    fn from(arg: GuidelinesArg) -> Self {
        match arg {
            GuidelinesArg::Cobidas => Standard::Cobidas,
            GuidelinesArg::Claim => Standard::Claim,
            GuidelinesArg::CredNf => Standard::CredNf,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "bids-guidelines",
    about = "Check a BIDS dataset against neuroimaging reporting guidelines",
    version,
    disable_version_flag = true,
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// BIDS dataset directory (or a directory of datasets with --batch)
    #[arg(required = true)]
    bids_directory: Option<PathBuf>,

    /// Guidelines to check against
    #[arg(short = 'g', long, value_enum, ignore_case = true)]
    guidelines: Option<GuidelinesArg>,

    /// Catalog YAML overriding the built-in catalog
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Configuration file (default: user config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Treat BIDS_DIRECTORY as a directory of datasets
    #[arg(long)]
    batch: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// Set log level
    #[arg(long, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the registered rules of a standard
    Rules {
        /// Guidelines to list
        #[arg(short = 'g', long, value_enum, ignore_case = true, default_value = "COBIDAS")]
        guidelines: GuidelinesArg,

        /// Catalog YAML overriding the built-in catalog
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Regenerate a catalog YAML from a tab-separated guideline table
    Convert {
        /// Tab-separated export of the guideline sheet
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Leading lines to skip before the header row
        #[arg(long, default_value_t = DEFAULT_SKIP_ROWS)]
        skip_rows: usize,
    },
}

/// Initialize tracing from --log-level; RUST_LOG takes precedence
fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_cli() -> Cli {
    let command = Cli::command().arg(
        clap::Arg::new("version")
            .short('v')
            .long("version")
            .help("Print version")
            .action(ArgAction::Version),
    );

    let matches = command.get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

/// Print a configuration error and exit non-zero
fn fail(error: impl std::fmt::Display) -> ! {
    eprintln!("Error: {error}");
    std::process::exit(1);
}

fn main() -> Result<()> {
    let cli = parse_cli();

    initialize_tracing(&cli.log_level);

    match cli.command {
        Some(Command::Rules {
            guidelines,
            catalog,
        }) => rules_command(guidelines.into(), catalog),
        Some(Command::Convert {
            input,
            output,
            skip_rows,
        }) => convert_command(&input, output.as_deref(), skip_rows),
        None => {
            let Some(bids_directory) = cli.bids_directory else {
                fail("a BIDS directory is required");
            };

            let mut config = AuditConfig::discover(cli.config.as_deref()).unwrap_or_else(|e| fail(e));
            if let Some(guidelines) = cli.guidelines {
                config.standard = guidelines.into();
            }
            if cli.catalog.is_some() {
                config.catalog = cli.catalog;
            }
            config.batch |= cli.batch;

            check_command(&bids_directory, &config, cli.json)
        }
    }
}

/// Catalog and rule set for a run; any failure is a configuration error
fn prepare(config: &AuditConfig) -> (GuidelineCatalog, RuleSet) {
    let catalog = config.load_catalog().unwrap_or_else(|e| fail(e));
    info!("Loaded {} guideline entries", catalog.len());

    let ruleset = RuleSet::for_standard(config.standard, &catalog).unwrap_or_else(|e| fail(e));
    info!("Registered {} {} rules", ruleset.len(), ruleset.standard());

    (catalog, ruleset)
}

fn check_command(bids_directory: &Path, config: &AuditConfig, json: bool) -> Result<()> {
    let (catalog, ruleset) = prepare(config);
    let evaluator = Evaluator::new(&catalog);

    if !config.batch {
        let layout = BidsLayout::open(bids_directory, &config.exclude).unwrap_or_else(|e| fail(e));
        let evaluation = evaluator.evaluate_all(&ruleset, &layout);
        return print_evaluation(bids_directory, &evaluation, json);
    }

    if !bids_directory.exists() {
        fail(format!(
            "The specified BIDS directory '{}' does not exist.",
            bids_directory.display()
        ));
    }
    if !bids_directory.is_dir() {
        fail(format!(
            "The specified path '{}' is not a directory.",
            bids_directory.display()
        ));
    }

    let mut reports = Vec::new();
    for dataset in batch_datasets(bids_directory)? {
        let layout = match BidsLayout::open(&dataset, &config.exclude) {
            Ok(layout) => layout,
            Err(e) => {
                warn!("Skipping dataset {:?}: {}", dataset, e);
                continue;
            }
        };

        let evaluation = evaluator.evaluate_all(&ruleset, &layout);
        if json {
            reports.push(report::render_json(&dataset, &evaluation));
        } else {
            print!("{}", report::render_text(&dataset, &evaluation));
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    Ok(())
}

/// Dataset directories directly under a batch root, sorted by name
fn batch_datasets(root: &Path) -> Result<Vec<PathBuf>> {
    let mut datasets = Vec::new();

    for entry in fs::read_dir(root).with_context(|| format!("Failed to read {}", root.display()))? {
        let entry = entry?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();

        if !path.is_dir() || name.starts_with('.') || BATCH_SKIP.contains(&name.as_str()) {
            debug!("Not a dataset: {:?}", path);
            continue;
        }
        datasets.push(path);
    }

    datasets.sort();
    info!("Found {} datasets under {:?}", datasets.len(), root);

    Ok(datasets)
}

fn print_evaluation(dataset: &Path, evaluation: &DatasetEvaluation, json: bool) -> Result<()> {
    if json {
        let value = report::render_json(dataset, evaluation);
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", report::render_text(dataset, evaluation));
    }
    Ok(())
}

// Table row structure for rule display
#[derive(Tabled)]
struct RuleTableRow {
    #[tabled(rename = "Guideline")]
    id: String,
    #[tabled(rename = "Scope")]
    scope: String,
    #[tabled(rename = "Label")]
    label: String,
}

fn rules_command(standard: Standard, catalog: Option<PathBuf>) -> Result<()> {
    let config = AuditConfig {
        standard,
        catalog,
        ..AuditConfig::default()
    };
    let (catalog, ruleset) = prepare(&config);

    let rows: Vec<RuleTableRow> = ruleset
        .iter()
        .map(|rule| RuleTableRow {
            id: rule.id().to_string(),
            scope: rule.scope(),
            label: catalog.label(rule.id()).to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("{} {} rules\n", rows.len(), ruleset.standard());
    println!("{table}");

    Ok(())
}

fn convert_command(input: &Path, output: Option<&Path>, skip_rows: usize) -> Result<()> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read guideline table {}", input.display()))?;

    let document = convert::convert_table(&content, skip_rows).unwrap_or_else(|e| fail(e));
    let yaml = convert::to_yaml(&document)?;

    match output {
        Some(path) => {
            fs::write(path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} guidelines to {:?}", document.guidelines.len(), path);
        }
        None => print!("{yaml}"),
    }

    Ok(())
}
