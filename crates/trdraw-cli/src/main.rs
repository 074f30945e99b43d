use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use glob::glob;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use trdraw_core::{BoundsPolicy, DecodeStatus, DecoderConfig, Report};

const EXAMPLES: &str = "Examples:\n  trdraw raw decode run.raw --time-bins 24 -o report.json\n  trdraw raw decode run.raw --config decoder.json --stdout --digits\n  trdraw raw decode payload.bin --payload --time-bins 30 --stdout --pretty";

#[derive(Parser, Debug)]
#[command(name = "trdraw")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TRDRAW_BUILD_COMMIT"), ")"))]
#[command(
    about = "Offline decoder for TRD raw readout streams.",
    long_about = None,
    after_help = EXAMPLES
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on raw readout captures.
    Raw {
        #[command(subcommand)]
        command: RawCommands,
    },
}

#[derive(Subcommand, Debug)]
enum RawCommands {
    /// Decode a raw capture and write a versioned JSON report.
    #[command(after_help = EXAMPLES)]
    Decode(DecodeArgs),
}

#[derive(clap::Args, Debug)]
struct DecodeArgs {
    /// Path to a raw capture (a glob must match exactly one file)
    input: PathBuf,

    /// Output report path (JSON)
    #[arg(short = 'o', long, required_unless_present = "stdout")]
    report: Option<PathBuf>,

    /// Write JSON report to stdout
    #[arg(long, conflicts_with = "report")]
    stdout: bool,

    /// Number of time bins per pad
    #[arg(long, value_name = "N")]
    time_bins: Option<u32>,

    /// Decoder configuration file (JSON); flags override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Subsystem whose records are decoded
    #[arg(long, value_name = "NAME")]
    subsystem: Option<String>,

    /// Treat the input as bare payload bytes without equipment records
    #[arg(long)]
    payload: bool,

    /// Read past a block's declared end before stopping
    #[arg(long)]
    lenient: bool,

    /// Include every decoded digit in the report
    #[arg(long)]
    digits: bool,

    /// Pretty-print JSON output
    #[arg(long, conflicts_with = "compact")]
    pretty: bool,

    /// Compact JSON output (default)
    #[arg(long)]
    compact: bool,

    /// Suppress non-error output
    #[arg(long)]
    quiet: bool,

    /// Exit with a non-zero code if decoding stopped early
    #[arg(long)]
    strict: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Raw { command } => match command {
            RawCommands::Decode(args) => {
                init_logging(cli.verbose, args.quiet);
                cmd_raw_decode(args)
            }
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_raw_decode(args: DecodeArgs) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;
    let report_path = if args.stdout {
        None
    } else {
        Some(args.report.clone().ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };

    if let Some(report_path) = report_path.as_ref() {
        ensure_distinct_output(report_path, &input_abs)?;
    }

    let config = decoder_config(&args)?;
    if config.time_bins.is_none() {
        return Err(CliError::new(
            "number of time bins not configured",
            Some("pass --time-bins N or set \"time_bins\" in --config".to_string()),
        ));
    }
    log::info!(
        "decoding {} (subsystem {}, {} time bins)",
        resolved_input.display(),
        config.subsystem,
        config.time_bins.unwrap_or_default()
    );

    let mut rep = if args.payload {
        trdraw_core::analyze_payload_file(&resolved_input, &config)
    } else {
        trdraw_core::analyze_raw_file(&resolved_input, &config)
    }
    .context("raw stream decoding failed")?;
    stamp_report(&mut rep)?;
    let json = serialize_report(&rep, args.pretty, args.compact)?;

    match report_path {
        None => print!("{}", json),
        Some(report) => {
            if let Some(parent) = report.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&report, json)
                .with_context(|| format!("Failed to write report: {}", report.display()))?;
            if !args.quiet {
                eprintln!(
                    "OK: {} digits in {} blocks -> {}",
                    rep.digits_total,
                    rep.blocks.len(),
                    report.display()
                );
            }
        }
    }

    if rep.status == DecodeStatus::Aborted {
        let reason = rep.error.as_deref().unwrap_or("unknown reason");
        if args.strict {
            return Err(CliError::new(
                format!("decoding stopped early: {}", reason),
                Some("inspect the report's blocks to locate the damaged data".to_string()),
            ));
        }
        log::warn!("decoding stopped early: {}", reason);
    }
    Ok(())
}

/// Merge `--config` with the command-line flags, flags winning.
fn decoder_config(args: &DecodeArgs) -> Result<DecoderConfig, CliError> {
    let mut config = match args.config.as_deref() {
        Some(path) => DecoderConfig::load(path).map_err(|err| {
            CliError::new(
                format!("invalid decoder config '{}': {}", path.display(), err),
                Some("expected a JSON object, e.g. {\"time_bins\": 24}".to_string()),
            )
        })?,
        None => DecoderConfig::default(),
    };

    if let Some(time_bins) = args.time_bins {
        if time_bins == 0 {
            return Err(CliError::new(
                "--time-bins must be greater than zero",
                None,
            ));
        }
        config.time_bins = Some(time_bins);
    }
    if let Some(subsystem) = args.subsystem.as_ref() {
        config.subsystem = subsystem.clone();
    }
    if args.lenient {
        config.bounds = BoundsPolicy::Lenient;
    }
    if args.digits {
        config.include_digits = true;
    }
    Ok(config)
}

fn stamp_report(rep: &mut Report) -> Result<(), CliError> {
    rep.generated_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("Failed to format report timestamp")?;
    rep.tool.version = format!(
        "{}+{}",
        env!("CARGO_PKG_VERSION"),
        env!("TRDRAW_BUILD_COMMIT")
    );
    Ok(())
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let parent = match report_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // A missing output directory is created later and cannot hold the input.
    let Ok(report_dir) = fs::canonicalize(parent) else {
        return Ok(());
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path: {}", report_path.display()))?;
    if report_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!(
                "report path must differ from input: {}",
                report_path.display()
            ),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("pass the path of a raw capture".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass the path of a raw capture".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        ));
    }
    if matches.len() > 1 {
        let mut message = format!(
            "multiple files match pattern '{}' ({} matches)",
            pattern,
            matches.len()
        );
        let listed = matches
            .iter()
            .take(3)
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        message.push_str("; matches: ");
        message.push_str(&listed);
        if matches.len() > 3 {
            message.push_str(", ...");
        }
        return Err(CliError::new(
            message,
            Some("pass a single capture file, or run once per file".to_string()),
        ));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
