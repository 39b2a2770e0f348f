//! CLI argument parsing for ns-filter
//!
//! This module provides the command-line interface using clap derive macros.
//!
//! # Options
//!
//! - `--config` / `-c`: Configuration file path (default: ns-filter.yaml, env: NSFILTER_CONFIG)
//! - `--input` / `-i`: Input batch file, `-` for stdin (default: -)
//! - `--output` / `-o`: Output file (default: stdout)
//! - `--content-type` / `-t`: Content type of the batch (env: NSFILTER_CONTENT_TYPE)
//! - `--expression` / `-e`: Segment pattern (env: NSFILTER_EXPRESSION)
//! - `--tag`: Destination tag key (env: NSFILTER_TAG)
//! - `--scan-mode`: exhaustive/legacy (env: NSFILTER_SCAN_MODE)
//! - `--validate`: Validate configuration and compile the pattern
//! - `--meta`: Print processor metadata
//! - `--policy`: Print the configuration policy
//! - `--serve`: Run the HTTP adapter
//! - `--port` / `-p`: Server port (env: NSFILTER_PORT)
//! - `--bind-address`: Server bind address (env: NSFILTER_BIND_ADDRESS)
//! - `--log-level` / `-l`: Log level (trace/debug/info/warn/error, env: NSFILTER_LOG_LEVEL)
//! - `--log-format`: Log line format (text/json, env: NSFILTER_LOG_FORMAT)
//! - `--output-format`: Output format for validate/meta/policy (text/json/yaml)
//!
//! # Precedence
//!
//! Configuration values are resolved in the following order (highest to lowest priority):
//! 1. CLI arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::codec::CONTENT_TYPE_JSON;
use crate::policy::{ConfigValue, OPTION_EXPRESSION, OPTION_SCAN_MODE, OPTION_TAG};
use crate::transformer::ScanMode;

/// ns-filter - move matching metric namespace segments into tags
///
/// Reads a metric batch, removes every namespace segment matching the
/// expression, and stores it as a tag. Writes the batch back out in the
/// same format.
#[derive(Parser, Debug)]
#[command(name = "ns-filter")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "ns-filter.yaml",
        env = "NSFILTER_CONFIG"
    )]
    pub config: PathBuf,

    /// Input batch file, '-' reads stdin
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub input: PathBuf,

    /// Output file, stdout if omitted
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Content type of the input batch
    #[arg(
        short = 't',
        long,
        value_name = "TYPE",
        default_value = CONTENT_TYPE_JSON,
        env = "NSFILTER_CONTENT_TYPE"
    )]
    pub content_type: String,

    /// Pattern matched against whole namespace segments (overrides config file)
    #[arg(short, long, value_name = "REGEX", env = "NSFILTER_EXPRESSION")]
    pub expression: Option<String>,

    /// Tag key receiving relocated segments (overrides config file)
    #[arg(long, value_name = "KEY", env = "NSFILTER_TAG")]
    pub tag: Option<String>,

    /// Scan mode (overrides config file)
    #[arg(long, value_enum, env = "NSFILTER_SCAN_MODE")]
    pub scan_mode: Option<ScanModeArg>,

    /// Validate configuration and compile the pattern, then exit
    #[arg(long)]
    pub validate: bool,

    /// Print processor metadata and exit
    #[arg(long, conflicts_with_all = ["validate", "policy", "serve"])]
    pub meta: bool,

    /// Print the configuration policy and exit
    #[arg(long, conflicts_with_all = ["validate", "serve"])]
    pub policy: bool,

    /// Serve the processor over HTTP
    #[arg(long, conflicts_with = "validate")]
    pub serve: bool,

    /// Server port (overrides config file)
    #[arg(short, long, value_name = "PORT", env = "NSFILTER_PORT")]
    pub port: Option<u16>,

    /// Server bind address (overrides config file)
    /// Supported values: IP addresses (0.0.0.0, 127.0.0.1, ::1) or "localhost"
    #[arg(long, value_name = "ADDRESS", env = "NSFILTER_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Log level
    #[arg(
        short,
        long,
        value_enum,
        default_value = "info",
        env = "NSFILTER_LOG_LEVEL"
    )]
    pub log_level: LogLevel,

    /// Log line format
    #[arg(long, value_enum, default_value = "text", env = "NSFILTER_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Output format for --validate, --meta and --policy
    #[arg(long, value_enum, default_value = "text")]
    pub output_format: OutputFormat,
}

impl Cli {
    /// Processor options given on the command line
    pub fn processor_overrides(&self) -> Vec<(&'static str, ConfigValue)> {
        let mut overrides = Vec::new();
        if let Some(ref expression) = self.expression {
            overrides.push((OPTION_EXPRESSION, ConfigValue::from(expression.as_str())));
        }
        if let Some(ref tag) = self.tag {
            overrides.push((OPTION_TAG, ConfigValue::from(tag.as_str())));
        }
        if let Some(mode) = self.scan_mode {
            overrides.push((
                OPTION_SCAN_MODE,
                ConfigValue::from(ScanMode::from(mode).as_str()),
            ));
        }
        overrides
    }

    /// Whether the input should be read from stdin
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }
}

/// Scan mode options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScanModeArg {
    /// Examine every segment once
    Exhaustive,
    /// Skip the segment following each match
    Legacy,
}

impl From<ScanModeArg> for ScanMode {
    fn from(arg: ScanModeArg) -> Self {
        match arg {
            ScanModeArg::Exhaustive => ScanMode::Exhaustive,
            ScanModeArg::Legacy => ScanMode::Legacy,
        }
    }
}

/// Log level options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level - default
    Info,
    /// Warn level
    Warn,
    /// Error level - least verbose
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Log line format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

/// Output format options for validate, meta and policy modes
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Yaml => write!(f, "yaml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Trace.to_string(), "trace");
        assert_eq!(LogLevel::Debug.to_string(), "debug");
        assert_eq!(LogLevel::Info.to_string(), "info");
        assert_eq!(LogLevel::Warn.to_string(), "warn");
        assert_eq!(LogLevel::Error.to_string(), "error");
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["ns-filter"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("ns-filter.yaml"));
        assert!(cli.reads_stdin());
        assert_eq!(cli.content_type, CONTENT_TYPE_JSON);
        assert_eq!(cli.log_level, LogLevel::Info);
        assert_eq!(cli.log_format, LogFormat::Text);
        assert_eq!(cli.output_format, OutputFormat::Text);
        assert!(cli.processor_overrides().is_empty());
    }

    #[test]
    fn test_processor_overrides() {
        let cli = Cli::try_parse_from([
            "ns-filter",
            "-e",
            "[0-9]+",
            "--tag",
            "id",
            "--scan-mode",
            "legacy",
        ])
        .unwrap();

        assert_eq!(
            cli.processor_overrides(),
            vec![
                ("expression", ConfigValue::from("[0-9]+")),
                ("tag", ConfigValue::from("id")),
                ("scan_mode", ConfigValue::from("legacy")),
            ]
        );
    }

    #[test]
    fn test_serve_options() {
        let cli = Cli::try_parse_from([
            "ns-filter",
            "--serve",
            "-p",
            "9191",
            "--bind-address",
            "127.0.0.1",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert!(cli.serve);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.port, Some(9191));
        assert_eq!(cli.bind_address.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn test_meta_conflicts_with_serve() {
        assert!(Cli::try_parse_from(["ns-filter", "--meta", "--serve"]).is_err());
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!(OutputFormat::Yaml.to_string(), "yaml");
    }
}
