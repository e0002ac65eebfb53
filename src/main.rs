//! reqpulse CLI entry point

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use reqpulse::config::cli::Cli;
use reqpulse::config::toml::{merge_cli_with_config, parse_toml_file};
use reqpulse::config::{cli_convert, validator, Config};
use reqpulse::engine::http::HttpEngine;
use reqpulse::output::json::{write_json_report, JsonReport};
use reqpulse::output::text::print_report;
use reqpulse::{ConfigError, Coordinator};
use std::process;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Exit code for configuration errors
const EXIT_CONFIG: i32 = 2;

/// Exit code for failures after the configuration was accepted
const EXIT_RUNTIME: i32 = 1;

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("{}", Cli::command().render_usage());
            eprintln!("For more information, try '--help'.");
            process::exit(EXIT_CONFIG);
        }
    };

    init_tracing(config.runtime.debug);

    println!("reqpulse v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print_configuration(&config);

    if config.runtime.dry_run {
        println!();
        println!("Dry run mode - configuration validated successfully");
        return;
    }

    if let Err(e) = run(config) {
        eprintln!("Error: {:#}", e);
        process::exit(EXIT_RUNTIME);
    }
}

/// Build and validate the run configuration (TOML file first, CLI on top)
fn load_config(cli: &Cli) -> Result<Config, ConfigError> {
    let config = match cli.config {
        Some(ref path) => merge_cli_with_config(cli, parse_toml_file(path)?)?,
        None => cli_convert::build_config_from_cli(cli)?,
    };
    validator::validate_config(&config)?;
    Ok(config)
}

/// Structured logs go to stderr; `RUST_LOG` overrides the default level
fn init_tracing(debug: bool) {
    let default_directive = if debug { "reqpulse=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;

    runtime.block_on(async move {
        let engine = HttpEngine::new(&config.request, config.workload.concurrency)?;
        let json_output = config.output.json_output.clone();
        let coordinator = Coordinator::new(config, engine)?;

        let interrupt = CancellationToken::new();
        let signal = interrupt.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, finishing run");
                signal.cancel();
            }
        });

        let outcome = coordinator.run(interrupt).await?;
        debug!(reason = %outcome.reason, "run finished");
        print_report(&outcome.statistics);

        if let Some(path) = json_output {
            let report = JsonReport::new(&outcome.statistics, outcome.reason);
            write_json_report(&path, &report)?;
            println!();
            println!("JSON report written to {}", path.display());
        }

        Ok(())
    })
}

/// Print configuration summary
fn print_configuration(config: &Config) {
    println!("Configuration:");
    println!("  Target: {} {}", config.request.method, config.request.url.as_deref().unwrap_or_default());
    println!("  Concurrency: {}", config.workload.concurrency);
    if let Some(mode) = config.workload.completion_mode {
        println!("  Completion: {}", mode);
    }
    println!("  Buckets: {}", config.workload.buckets);

    if config.workload.pre_heat {
        println!("  Pre-heat: waiting for all workers before start");
    }
    if let Some(pause) = config.workload.sleep_interval() {
        println!("  Sleep interval: {}ms", pause.as_millis());
    }

    for header in &config.request.headers {
        println!("  Header: {}", header);
    }
    if let Some(ref body) = config.request.body {
        println!("  Body: {} bytes", body.len());
    }
    if let Some(ref proxy) = config.request.proxy {
        println!("  Proxy: {}", proxy);
    }
    println!("  Timeout: {}s", config.request.timeout_secs);
    println!("  TLS verification: {}", if config.request.verify_tls { "on" } else { "off" });

    if config.output.no_live {
        println!("  Progress: off");
    } else {
        println!("  Progress: every {}s", config.output.print_interval().as_secs());
    }
}
