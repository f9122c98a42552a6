use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dissect_core::{LayerRegistry, LayerType, Report};
use glob::glob;
use hex::FromHexError;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "dissect")]
#[command(version)]
#[command(long_version = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("DISSECT_BUILD_COMMIT"),
    ", ",
    env!("DISSECT_BUILD_DATE"),
    ")"
))]
#[command(
    about = "Layered decoder for captured network frames (Ethernet II / ARP).",
    long_about = None,
    after_help = "Examples:\n  dissect pcap decode capture.pcapng -o report.json\n  dissect pcap analyze capture.pcap --stdout --pretty\n  dissect hex '0001 0800 0604 0001 aabbccddeeff c0a80001 112233445566 c0a80002' --first-layer arp"
)]
struct Cli {
    /// Log decoder diagnostics to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on PCAP/PCAPNG inputs.
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
    /// Decode one frame given as hex and print its JSON report.
    Hex {
        /// Hex bytes; whitespace, ':' and '-' separators are ignored
        hex: String,

        /// Layer type of the first header
        #[arg(long, value_enum, default_value_t = FirstLayer::Ethernet)]
        first_layer: FirstLayer,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Decode every frame of a capture file into a versioned JSON report.
    #[command(visible_alias = "analyse", alias = "analyze")]
    #[command(
        after_help = "Examples:\n  dissect pcap decode capture.pcapng -o report.json\n  dissect pcap analyse capture.pcap --stdout\n  dissect pcap decode 'captures/*.pcapng' -o report.json --strict"
    )]
    Decode {
        /// Path (or single-match glob) to a .pcap or .pcapng file
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Exit with a non-zero code if any frame failed to decode
        #[arg(long)]
        strict: bool,

        /// List frames that failed to decode after analysis
        #[arg(long)]
        list_failures: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum FirstLayer {
    Ethernet,
    Arp,
}

impl From<FirstLayer> for LayerType {
    fn from(value: FirstLayer) -> Self {
        match value {
            FirstLayer::Ethernet => LayerType::ETHERNET,
            FirstLayer::Arp => LayerType::ARP,
        }
    }
}

struct DecodeOptions {
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
    strict: bool,
    list_failures: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Pcap { command } => match command {
            PcapCommands::Decode {
                input,
                report,
                stdout,
                pretty,
                compact,
                quiet,
                strict,
                list_failures,
            } => {
                init_logging(cli.verbose, quiet);
                cmd_pcap_decode(DecodeOptions {
                    input,
                    report,
                    stdout,
                    pretty,
                    compact,
                    quiet,
                    strict,
                    list_failures,
                })
            }
        },
        Commands::Hex {
            hex,
            first_layer,
            pretty,
        } => {
            init_logging(cli.verbose, false);
            cmd_hex(&hex, first_layer.into(), pretty)
        }
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

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
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
        CliError::new(format!("{:#}", err), None)
    }
}

fn cmd_pcap_decode(opts: DecodeOptions) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&opts.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;

    let report_path = if opts.stdout {
        None
    } else {
        let path = opts.report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?;
        ensure_distinct_output(&path, &input_abs)?;
        Some(path)
    };

    let registry = LayerRegistry::with_builtin_layers();
    let rep = dissect_core::analyze_pcap_file(&resolved_input, &registry)
        .context("PCAP/PCAPNG decoding failed")?;
    let json = serialize_report(&rep, opts.pretty, opts.compact)?;

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
            if !opts.quiet {
                eprintln!(
                    "OK: {} packets ({} complete, {} partial, {} failed) -> {}",
                    rep.totals.packets,
                    rep.totals.complete,
                    rep.totals.partial,
                    rep.totals.failed,
                    report.display()
                );
            }
        }
    }

    if let Some(err) = &rep.source_error {
        if !opts.quiet {
            eprintln!("warning: capture cut short: {}", err);
        }
    }
    if opts.list_failures && !opts.quiet {
        print_failures(&rep);
    }
    if opts.strict {
        if let Some(err) = &rep.source_error {
            return Err(CliError::new(
                format!("capture cut short after {} packet(s): {}", rep.totals.packets, err),
                Some("the report holds the packets read before the error".to_string()),
            ));
        }
    }
    if opts.strict && has_failures(&rep) {
        return Err(CliError::new(
            format!(
                "{} packet(s) failed to decode",
                rep.totals.partial + rep.totals.failed
            ),
            Some("use --list-failures to inspect".to_string()),
        ));
    }
    Ok(())
}

fn cmd_hex(hex: &str, first: LayerType, pretty: bool) -> Result<(), CliError> {
    let data = parse_hex(hex)?;
    let registry = LayerRegistry::with_builtin_layers();
    let rep = dissect_core::analyze_bytes("<hex>", &data, first, &registry);
    let json = serialize_report(&rep, pretty, false)?;
    println!("{}", json);
    Ok(())
}

fn ensure_distinct_output(report_path: &Path, input_abs: &Path) -> Result<(), CliError> {
    let report_dir = report_path
        .parent()
        .map(|parent| {
            if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            }
        })
        // A directory that does not exist yet cannot hold the input.
        .filter(|parent| parent.exists())
        .map(fs::canonicalize)
        .transpose()
        .with_context(|| format!("Failed to resolve output path: {}", report_path.display()))?;
    let Some(report_dir) = report_dir else {
        return Ok(());
    };
    let file_name = report_path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?;
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

fn has_failures(rep: &Report) -> bool {
    rep.totals.partial + rep.totals.failed > 0
}

fn print_failures(rep: &Report) {
    eprintln!("Decode failures:");
    for packet in &rep.packets {
        if let Some(error) = &packet.error {
            eprintln!(
                "  #{} {} @{}: {}",
                packet.index, error.layer, error.offset, error.message
            );
        }
    }
}

fn parse_hex(input: &str) -> Result<Vec<u8>, CliError> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();

    hex::decode(&digits).map_err(|err| match err {
        FromHexError::OddLength => CliError::new(
            format!("odd number of hex digits ({})", digits.chars().count()),
            Some("each byte needs two hex digits".to_string()),
        ),
        FromHexError::InvalidHexCharacter { c, index } => CliError::new(
            format!("invalid hex byte: unexpected '{}' at digit {}", c, index),
            Some("use digits 0-9 and a-f".to_string()),
        ),
        other => CliError::new(format!("invalid hex input: {}", other), None),
    })
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
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

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if count > 3 {
                listed.push_str(", ...");
            }
            Err(CliError::new(
                format!(
                    "multiple files match pattern '{}' ({} matches); matches: {}",
                    pattern, count, listed
                ),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
