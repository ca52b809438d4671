//! package-nominal: nominal package dimension calculator
//!
//! Runs a single calculation from a JSON input file, or serves the
//! calculator to AI assistants over MCP.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use package_nominal::config::{self, Config};
use package_nominal::export::ExportSession;
use package_nominal::mcp::server::McpServer;
use package_nominal::nominal::{
    compute, CalculationRequest, LeadHeightRatio, OptionOverrides, PartTypeMode, Unit,
};

/// Nominal package dimension calculator.
///
/// Averages min/max tolerance ranges into nominal dimensions and derives
/// lead, die and BGA geometry from them.
#[derive(Parser, Debug)]
#[command(name = "package-nominal")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "CONFIG_FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity (only show errors)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the MCP server on stdio (default)
    Serve,
    /// Calculate nominals for one package and print the summary
    Calc(CalcArgs),
}

#[derive(clap::Args, Debug)]
struct CalcArgs {
    /// JSON input file with dimensions, part type, mount and options ("-" for stdin)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Unit the tolerance ranges are entered in (mm, inches)
    #[arg(long, value_parser = parse_unit)]
    unit: Option<Unit>,

    /// Lead height ratio used when lead height is not given (1/2, 2/3)
    #[arg(long, value_parser = parse_ratio)]
    ratio: Option<LeadHeightRatio>,

    /// Die calculation mode (Standard, Diode, Flag)
    #[arg(long, value_parser = parse_mode)]
    mode: Option<PartTypeMode>,

    /// Split package thickness into BGA overmold and laminate
    #[arg(long)]
    bga: bool,

    /// Include the die calculation
    #[arg(long)]
    die: bool,

    /// Skip the standoff-adjusted thickness and lead height
    #[arg(long)]
    no_standoff: bool,

    /// Flag length in mm (Flag mode)
    #[arg(long, allow_hyphen_values = true)]
    flag_length: Option<String>,

    /// Flag width in mm (Flag mode)
    #[arg(long, allow_hyphen_values = true)]
    flag_width: Option<String>,

    /// Append the summary to this file
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Reference designator written above an exported summary
    #[arg(long, value_name = "REF_DES")]
    ref_des: Option<String>,

    /// Print the full result as JSON instead of the summary text
    #[arg(long)]
    json: bool,
}

impl CalcArgs {
    /// Options set on the command line.
    fn overrides(&self) -> OptionOverrides {
        OptionOverrides {
            unit: self.unit,
            include_standoff_in_thickness: self.no_standoff.then_some(false),
            lead_height_ratio: self.ratio,
            include_die_calculation: self.die.then_some(true),
            part_type_mode: self.mode,
            bga_mode: self.bga.then_some(true),
            flag_length: self.flag_length.clone(),
            flag_width: self.flag_width.clone(),
        }
    }
}

fn parse_unit(s: &str) -> Result<Unit, String> {
    Unit::try_from(s.to_string())
}

fn parse_ratio(s: &str) -> Result<LeadHeightRatio, String> {
    LeadHeightRatio::try_from(s.to_string())
}

fn parse_mode(s: &str) -> Result<PartTypeMode, String> {
    PartTypeMode::from_str_loose(s)
        .ok_or_else(|| format!("invalid mode '{s}', expected Standard, Diode or Flag"))
}

/// Determines the log level from CLI arguments.
#[allow(clippy::match_same_arms)] // Explicit "warn" arm for clarity
fn get_log_level(verbose: u8, quiet: bool, config_level: &str) -> Level {
    if quiet {
        return Level::ERROR;
    }

    match verbose {
        0 => match config_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::WARN, // Default to warn for unknown levels
        },
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Initialises the tracing subscriber for logging.
fn init_tracing(level: Level) {
    let filter = EnvFilter::from_default_env().add_directive(level.into());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads the calculation request from a file, or stdin for "-".
fn read_request(path: &Path) -> Result<CalculationRequest, String> {
    let contents = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("failed to read stdin: {e}"))?;
        buf
    } else {
        std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read {}: {e}", path.display()))?
    };

    serde_json::from_str(&contents).map_err(|e| format!("invalid input {}: {e}", path.display()))
}

fn run_calc(args: &CalcArgs, cfg: &Config) -> ExitCode {
    let mut request = match read_request(&args.input) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    request.warn_unknown_codes();

    // Command-line flags win over the input file's options
    request.options = std::mem::take(&mut request.options).merge(args.overrides());
    let (inputs, options) = request.into_parts(cfg.defaults.to_options());

    let computation = compute(&inputs, &options);
    for (dimension, field_error) in &computation.errors {
        eprintln!("Warning: {dimension}: {field_error}, shown as 0.000");
    }

    if args.json {
        match serde_json::to_string_pretty(&computation) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!(error = %e, "Failed to serialise result");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", computation.report);
    }

    let target = args.export.clone().or_else(|| cfg.export.target.clone());
    let Some(ref_des) = args.ref_des.as_deref() else {
        if args.export.is_some() {
            eprintln!("Error: --export requires --ref-des");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    };

    let mut session = ExportSession::new(target);
    match session.export(ref_des, &computation.report) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Export failed: {e}");
            if e.needs_new_target() {
                eprintln!("Select a new file with --export <FILE>");
            }
            ExitCode::FAILURE
        }
    }
}

fn run_server(cfg: Config) -> ExitCode {
    // Display GPL license notice (required by GPLv3 Section 5d)
    eprintln!(
        "package-nominal {}  Copyright (C) 2026  The Embedded Society",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!("This program comes with ABSOLUTELY NO WARRANTY.");
    eprintln!("This is free software, licensed under GPL-3.0-or-later.");
    eprintln!();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting package-nominal MCP server"
    );

    let allowed_paths = if cfg.allowed_paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        cfg.allowed_paths
    };
    info!(allowed_paths = ?allowed_paths, "Allowed export paths configured");

    let defaults = cfg.defaults.to_options();
    let session = ExportSession::new(cfg.export.target);
    let mut server = McpServer::new(allowed_paths, defaults, session);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    info!("MCP server ready, waiting for client connection...");
    match runtime.block_on(server.run()) {
        Ok(()) => {
            info!("Server shut down gracefully");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Server error");
            ExitCode::FAILURE
        }
    }
}

/// Entry point for package-nominal.
fn main() -> ExitCode {
    let args = Args::parse();

    let cfg = match config::load_config(args.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(get_log_level(args.verbose, args.quiet, &cfg.logging.level));

    match args.command {
        Some(Command::Calc(ref calc)) => run_calc(calc, &cfg),
        Some(Command::Serve) | None => run_server(cfg),
    }
}
