use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "airbuddy-wifi",
    author,
    version,
    about = "Wi-Fi environment telemetry for an airbuddy node"
)]
pub struct Cli {
    /// Install root; enables file logging under <root>/logs
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Output format for command responses
    #[arg(
        long = "output",
        value_enum,
        default_value_t = OutputFormat::Json,
        global = true
    )]
    pub output_format: OutputFormat,

    /// Run iwlist/iw through `sudo -n`
    #[arg(long, global = true)]
    pub sudo: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan, then query the link once, and print the correlated cells
    Scan(ScanArgs),
    /// Scan while probing the link, resolve after a fixed duration
    Capture(CaptureArgs),
    /// Decode a single information element given as hex
    DecodeIe(DecodeIeArgs),
    /// Parse previously captured scan and link dumps
    Parse(ParseArgs),
    /// Update the persistent logging config under --root
    Logging(LoggingArgs),
}

#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Wireless interface (defaults to AIRBUDDY_IFACE or wlan0)
    #[arg(long)]
    pub iface: Option<String>,
}

#[derive(Args, Debug)]
pub struct CaptureArgs {
    /// Wireless interface (defaults to AIRBUDDY_IFACE or wlan0)
    #[arg(long)]
    pub iface: Option<String>,

    /// How long to let both branches run before resolving
    #[arg(long = "duration-secs", default_value_t = 5)]
    pub duration_secs: u64,

    /// Link probing mode (defaults to AIRBUDDY_LINK_MODE or continuous)
    #[arg(long = "link-mode", value_enum)]
    pub link_mode: Option<LinkModeArg>,

    /// Delay before the single query in delayed mode
    #[arg(long = "link-wait-secs")]
    pub link_wait_secs: Option<u64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LinkModeArg {
    Delayed,
    Continuous,
}

#[derive(Args, Debug)]
pub struct DecodeIeArgs {
    /// Element bytes as hex, id and length included (e.g. 0B040500800000)
    pub hex: String,
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// File holding `iwlist <iface> scanning` output
    #[arg(long = "scan-file")]
    pub scan_file: PathBuf,

    /// File holding `iw dev <iface> link` output (single or polled)
    #[arg(long = "link-file")]
    pub link_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct LoggingArgs {
    /// Level directive, e.g. `info` or `wifi=debug,proc=trace`
    #[arg(long)]
    pub level: Option<String>,

    /// Turn logging on or off
    #[arg(long)]
    pub enabled: Option<bool>,
}
