#![deny(unsafe_op_in_unsafe_fn)]
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use airbuddy_logging::LoggingConfig;
use airbuddy_wifi::cli::{
    CaptureArgs, Cli, Commands, DecodeIeArgs, LinkModeArg, LoggingArgs, OutputFormat, ParseArgs,
    ScanArgs,
};
use airbuddy_wifi::{
    ie, scan_once, CaptureConfig, CaptureReport, CaptureSession, DualPhaseCapture,
    InformationElement, LinkMode, LinkSample, LinkSummary, ScanCell,
};
use anyhow::{bail, Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};

/// Success payload. Serialised straight to text rather than through
/// `serde_json::Value`, which cannot hold 128-bit integers.
#[derive(Serialize)]
struct Envelope<'a, T> {
    status: &'a str,
    message: String,
    data: &'a T,
}

#[derive(Serialize)]
struct ParsedDumps {
    beacons: Vec<ScanCell>,
    link: LinkSummary,
    links: Vec<LinkSample>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let format = cli.output_format;
    let root = resolve_root(cli.root.clone());

    let logging = match &root {
        Some(root) => airbuddy_logging::read_config(root),
        None => LoggingConfig::stderr_only(),
    };
    let log_root = root.clone().unwrap_or_else(|| PathBuf::from("."));
    let guards = match airbuddy_logging::init("airbuddy-wifi", &log_root, &logging) {
        Ok(guards) => Some(guards),
        Err(err) => {
            eprintln!("logging disabled: {err:#}");
            None
        }
    };

    if let Err(err) = run(cli, root).await {
        emit_error(format, &err);
        // exit() skips destructors; flush the file writers first
        drop(guards);
        std::process::exit(1);
    }
}

/// `--root`, then `AIRBUDDY_ROOT`. Without either, only stderr logging.
fn resolve_root(input: Option<PathBuf>) -> Option<PathBuf> {
    input.or_else(|| env::var_os("AIRBUDDY_ROOT").map(PathBuf::from))
}

async fn run(cli: Cli, root: Option<PathBuf>) -> Result<()> {
    let format = cli.output_format;
    let mut config = CaptureConfig::from_env();
    if cli.sudo {
        config.use_sudo = true;
    }

    match cli.command {
        Commands::Scan(args) => {
            let (message, data) = handle_scan(config, args).await?;
            emit_success(format, message, &data)
        }
        Commands::Capture(args) => {
            let (message, data) = handle_capture(config, args).await?;
            emit_success(format, message, &data)
        }
        Commands::DecodeIe(args) => {
            let (message, data) = handle_decode_ie(args)?;
            emit_success(format, message, &data)
        }
        Commands::Parse(args) => {
            let (message, data) = handle_parse(args)?;
            emit_success(format, message, &data)
        }
        Commands::Logging(args) => {
            let (message, data) = handle_logging(root.as_deref(), args)?;
            emit_success(format, message, &data)
        }
    }
}

async fn handle_scan(
    mut config: CaptureConfig,
    args: ScanArgs,
) -> Result<(String, Vec<ScanCell>)> {
    if let Some(iface) = args.iface {
        config.interface = iface;
    }
    config.validate()?;

    let cells = scan_once(&config).await;
    let message = format!("{} cells on {}", cells.len(), config.interface);
    Ok((message, cells))
}

async fn handle_capture(
    mut config: CaptureConfig,
    args: CaptureArgs,
) -> Result<(String, CaptureReport)> {
    if let Some(iface) = args.iface {
        config.interface = iface;
    }
    let wait = match (args.link_wait_secs, config.link_mode) {
        (Some(secs), _) => Duration::from_secs(secs),
        (None, LinkMode::Delayed { wait }) => wait,
        (None, LinkMode::Continuous) => {
            Duration::from_secs(airbuddy_wifi::config::DEFAULT_LINK_WAIT_SECS)
        }
    };
    config.link_mode = match args.link_mode {
        Some(LinkModeArg::Delayed) => LinkMode::Delayed { wait },
        Some(LinkModeArg::Continuous) => LinkMode::Continuous,
        None => match config.link_mode {
            LinkMode::Delayed { .. } => LinkMode::Delayed { wait },
            LinkMode::Continuous => LinkMode::Continuous,
        },
    };
    config.validate()?;

    let capture = DualPhaseCapture::start(&config);
    tokio::time::sleep(Duration::from_secs(args.duration_secs)).await;
    let report = capture.resolve().await;

    let message = format!(
        "{} cells, {} link samples on {}",
        report.beacons.len(),
        report.links.len(),
        report.interface
    );
    Ok((message, report))
}

fn handle_decode_ie(args: DecodeIeArgs) -> Result<(String, InformationElement)> {
    let element = ie::try_decode_hex(&args.hex)?;
    let message = format!("element {} ({})", element.element_id, element.type_name);
    Ok((message, element))
}

fn handle_parse(args: ParseArgs) -> Result<(String, ParsedDumps)> {
    let scan_text = fs::read_to_string(&args.scan_file)
        .with_context(|| format!("reading {}", args.scan_file.display()))?;
    let link_text = match &args.link_file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
        }
        None => String::new(),
    };

    let session = CaptureSession::from_outputs(&scan_text, &link_text);
    let message = format!(
        "{} cells, connected to {}",
        session.cells.len(),
        if session.link.is_connected() {
            session.link.bssid.as_str()
        } else {
            "nothing"
        }
    );
    let data = ParsedDumps {
        beacons: session.cells,
        link: session.link,
        links: session.samples,
    };
    Ok((message, data))
}

fn handle_logging(root: Option<&Path>, args: LoggingArgs) -> Result<(String, LoggingConfig)> {
    let Some(root) = root else {
        bail!("logging config needs --root or AIRBUDDY_ROOT");
    };
    let mut cfg = airbuddy_logging::read_config(root);
    if let Some(level) = args.level {
        cfg.level = level;
    }
    if let Some(enabled) = args.enabled {
        cfg.enabled = enabled;
    }
    airbuddy_logging::write_config_atomic(root, &cfg)?;
    airbuddy_logging::apply(&cfg)?;

    let path = airbuddy_logging::config_path(root);
    Ok((format!("logging config written to {}", path.display()), cfg))
}

fn emit_success<T: Serialize>(format: OutputFormat, message: String, data: &T) -> Result<()> {
    emit_payload(format, "ok", message, data)
}

fn emit_error(format: OutputFormat, err: &anyhow::Error) {
    let details: Vec<String> = err.chain().map(|cause| cause.to_string()).collect();
    let payload = json!({
        "status": "error",
        "message": err.to_string(),
        "details": details,
        "data": Value::Null,
    });

    match format {
        OutputFormat::Json => println!("{}", payload),
        OutputFormat::Text => {
            eprintln!("Error: {}", err);
            for detail in details.iter().skip(1) {
                eprintln!("  -> {}", detail);
            }
        }
    }
}

fn emit_payload<T: Serialize>(
    format: OutputFormat,
    status: &str,
    message: String,
    data: &T,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let payload = Envelope {
                status,
                message,
                data,
            };
            println!("{}", serde_json::to_string(&payload)?);
        }
        OutputFormat::Text => {
            println!("{message}");
            println!("{}", serde_json::to_string_pretty(data)?);
        }
    }
    Ok(())
}
