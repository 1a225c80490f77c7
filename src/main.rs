use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use bump_dictionary::{
    load_dictionary, save_dictionary,
    reporter::{ReportError, ReportFormat, TransformationReporter, UpgradeReport},
    DictionaryIoError, RegistryError, SchemaRegistry, UpgradeOutcome, UpgradePipeline, UpgradeStatus,
};
use clap::{Parser, ValueEnum};
use thiserror::Error;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "bump-dictionary")]
#[command(about = "Bump data dictionaries to the latest version of the data dictionary schema")]
struct Args {
    /// Path to a data dictionary JSON file
    data_dictionary: PathBuf,

    /// Path to save the output JSON file
    #[arg(default_value = "updated_dictionary.json")]
    output: PathBuf,

    /// 0 = errors only; 1 = errors, warnings and informational messages; 3 = everything, including debug messages
    #[arg(short, long, value_enum, default_value_t = Verbosity::Info)]
    verbosity: Verbosity,

    /// Overwrite the output file if it already exists
    #[arg(short = 'f', long)]
    overwrite: bool,

    /// How to render the outcome of the upgrade
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report_format: ReportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Verbosity {
    #[value(name = "0")]
    Error,
    #[value(name = "1")]
    Info,
    #[value(name = "3")]
    Debug,
}

impl Verbosity {
    fn filter(self) -> &'static str {
        match self {
            Verbosity::Error => "error",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
        }
    }
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Io(#[from] DictionaryIoError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbosity);

    match run(&args) {
        Ok(status) => ExitCode::from(status.exit_code()),
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// RUST_LOG, when set, takes precedence over --verbosity
fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .init();
}

fn run(args: &Args) -> Result<UpgradeStatus, CliError> {
    let dictionary = load_dictionary(&args.data_dictionary)?;

    let pipeline = UpgradePipeline::new(&SchemaRegistry::new())?;
    let outcome = pipeline.run(dictionary);

    let reporter = TransformationReporter::new().with_format(args.report_format);
    let report = reporter.generate_report(&outcome, pipeline.source_version(), pipeline.target_version());

    if let UpgradeOutcome::Success { dictionary, changes } = &outcome {
        for change in changes {
            debug!(
                "{}: {} {} -> {}",
                change.column,
                change.rule_id,
                change.source_field,
                change.target_field.as_deref().unwrap_or("(removed)")
            );
        }
        save_dictionary(dictionary, &args.output, args.overwrite)?;
    }

    emit_report(&reporter, &report, args)?;
    Ok(outcome.status())
}

fn emit_report(reporter: &TransformationReporter, report: &UpgradeReport, args: &Args) -> Result<(), CliError> {
    let rendered = reporter.format_report(report)?;

    if reporter.format() != ReportFormat::Console {
        println!("{}", rendered);
        return Ok(());
    }

    match report.status {
        UpgradeStatus::Success => {
            info!("{}", rendered);
            info!("Output saved to {}", args.output.display());
        }
        _ => error!("{}", rendered),
    }
    Ok(())
}
