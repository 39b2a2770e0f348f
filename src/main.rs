//! ns-filter - metric namespace filter
//!
//! Runs one processor invocation over a file or stdin, or serves the
//! processor over HTTP with `--serve`.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::info;

use ns_filter::cli::{Cli, LogFormat, OutputFormat};
use ns_filter::config::Config;
use ns_filter::policy::ConfigPolicy;
use ns_filter::processor::{PluginMeta, Processor};
use ns_filter::server;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    ns_filter::init_logging(&cli.log_level.to_string(), cli.log_format == LogFormat::Json)?;

    let mut config = Config::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    if let Some(ref bind_address) = cli.bind_address {
        config.server.bind_address = bind_address.clone();
    }
    config.processor = config.processor_options(cli.processor_overrides());

    let processor = Processor::new();

    if cli.meta {
        return print_meta(&processor.meta(), cli.output_format);
    }

    if cli.policy {
        return print_policy(processor.config_policy(), cli.output_format);
    }

    if cli.validate {
        return validate(&processor, &config, cli.output_format);
    }

    if cli.serve {
        info!(version = env!("CARGO_PKG_VERSION"), "Starting ns-filter server");
        let port = cli.port.unwrap_or(config.server.port);
        return server::run(config, port).await;
    }

    process_once(&cli, &processor, &config)
}

/// Read the batch, run the processor, write the result
fn process_once(cli: &Cli, processor: &Processor, config: &Config) -> Result<()> {
    let content = if cli.reads_stdin() {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read(&cli.input)
            .with_context(|| format!("Failed to read {}", cli.input.display()))?
    };

    let output = processor.process(&cli.content_type, &content, &config.processor)?;

    match cli.output {
        Some(ref path) => std::fs::write(path, &output.content)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&output.content)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Validate the effective options and compile the pattern
fn validate(processor: &Processor, config: &Config, format: OutputFormat) -> Result<()> {
    let filter = processor.build_filter(&config.processor)?;

    #[derive(Serialize)]
    struct Report<'a> {
        valid: bool,
        expression: &'a str,
        tag: &'a str,
        scan_mode: String,
    }

    let report = Report {
        valid: true,
        expression: filter.pattern().as_str(),
        tag: filter.tag(),
        scan_mode: filter.scan_mode().to_string(),
    };

    match format {
        OutputFormat::Text => {
            println!("Configuration is valid");
            println!("  expression: {}", report.expression);
            println!("  tag:        {}", report.tag);
            println!("  scan_mode:  {}", report.scan_mode);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&report)?),
    }
    Ok(())
}

fn print_meta(meta: &PluginMeta, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("name:    {}", meta.name);
            println!("version: {}", meta.version);
            println!("type:    {}", meta.kind);
            println!("accept:  {}", meta.accept_content_types.join(", "));
            println!("return:  {}", meta.return_content_types.join(", "));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(meta)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(meta)?),
    }
    Ok(())
}

fn print_policy(policy: &ConfigPolicy, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("scope: {}", policy.scope);
            for rule in &policy.rules {
                let required = if rule.required { "required" } else { "optional" };
                match rule.default {
                    Some(default) => println!(
                        "  {:<12} {:<8} {:<9} default={}  {}",
                        rule.key,
                        rule.kind.as_str(),
                        required,
                        default,
                        rule.description
                    ),
                    None => println!(
                        "  {:<12} {:<8} {:<9} {}",
                        rule.key,
                        rule.kind.as_str(),
                        required,
                        rule.description
                    ),
                }
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(policy)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(policy)?),
    }
    Ok(())
}
