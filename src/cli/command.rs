use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use log::Level;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")\nbitstream ",
    env!("BITSTREAM_VERSION"),
);

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = LONG_VERSION,
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Tools for packing, unpacking and dumping bit-level streams",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat warnings as fatal errors (fail on first warning).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn fail_level(&self) -> Level {
        if self.strict { Level::Warn } else { Level::Error }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print every byte of a file as hex.
    Dump(DumpArgs),

    /// Pack a text of '0'/'1' characters into bytes.
    Pack(PackArgs),

    /// Print the data bits of a packed file.
    Unpack(UnpackArgs),

    /// Recover DCT coefficients from a quantized 8x8 block.
    Dequantize(DequantizeArgs),
}

#[derive(Debug, Args)]
pub struct DumpArgs {
    /// Input file (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Bytes per output line, 0 for a single line.
    #[arg(long, value_name = "N", default_value_t = 16)]
    pub columns: usize,
}

#[derive(Debug, Args)]
pub struct PackArgs {
    /// Text of '0'/'1' characters, whitespace ignored (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Packed output file.
    #[arg(long, short, value_name = "PATH")]
    pub output: PathBuf,

    /// Do not write the padding sidecar next to the output.
    #[arg(long)]
    pub no_sidecar: bool,
}

#[derive(Debug, Args)]
pub struct UnpackArgs {
    /// Packed input file (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Padding bits of the last byte (default: read from the sidecar).
    #[arg(long, value_name = "BITS")]
    pub padding: Option<u8>,

    /// Print unsigned values of this many bits instead of single bits.
    #[arg(long, value_name = "BITS", value_parser = clap::value_parser!(u32).range(1..=64))]
    pub width: Option<u32>,

    /// Insert a space after every N bits (ignored with --width).
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub group: usize,

    /// Output file (default: stdout).
    #[arg(long, short, value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct DequantizeArgs {
    /// Quality factor 1-100 (default: first number of the input).
    #[arg(long, short, value_name = "Q")]
    pub quality: Option<u32>,

    /// 64 quantized coefficients in row-major order (default: stdin).
    #[arg(value_name = "INPUT", default_value = "-")]
    pub input: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    /// Convert LogLevel to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}
