// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use clap::{Parser, Subcommand};
use nk_abi::{GeneratorConfig, Severity};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nk-abi-gen")]
#[command(about = "Generate Odin size assertions for the Nuklear binding")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to $NK_ABI_CONFIG, then ./nk-abi.yaml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure native sizes and write the assertion file (default)
    Generate {
        /// Assertion file to write
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Odin package name
        #[arg(short, long)]
        package: Option<String>,

        /// Replay sizes from a layout report instead of probing
        #[arg(long, value_name = "FILE")]
        layouts: Option<PathBuf>,
    },

    /// Record native sizes as a JSON layout report
    Measure {
        /// Report file (stdout if omitted)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Fail if the committed assertion file is out of date
    Check {
        /// Assertion file to check
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Odin package name the file was generated with
        #[arg(short, long)]
        package: Option<String>,

        /// Replay sizes from a layout report instead of probing
        #[arg(long, value_name = "FILE")]
        layouts: Option<PathBuf>,
    },

    /// Check the registry against itself and the Nuklear header
    Lint {
        /// Header to scan (defaults to the configured header)
        #[arg(long, value_name = "FILE")]
        header: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries command output; diagnostics go to stderr
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("[ERROR] {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = GeneratorConfig::discover(cli.config.as_deref())?;

    let command = cli.command.unwrap_or(Commands::Generate {
        output: None,
        package: None,
        layouts: None,
    });

    match command {
        Commands::Generate {
            output,
            package,
            layouts,
        } => {
            let report = nk_abi_gen::generate(&config, output, package, layouts.as_deref())?;
            report.summary();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Measure { output } => {
            let json = nk_abi_gen::measure(&config, output.as_deref())?;
            if output.is_none() {
                println!("{json}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check {
            file,
            package,
            layouts,
        } => {
            let drift = nk_abi_gen::check(&config, file, package, layouts.as_deref())?;
            if drift.is_clean() {
                println!("[OK] Assertion file is up to date");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("[ERROR] Assertion file is out of date:");
                print!("{drift}");
                println!("Run `nk-abi-gen generate` and commit the result.");
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Lint { header } => {
            let report = nk_abi_gen::lint(&config, header)?;
            for finding in &report.findings {
                println!("  {finding}");
            }
            if let Some(scanned) = report.header_types {
                println!("  Scanned {scanned} header types");
            }
            println!(
                "[{}] {} errors, {} warnings",
                if report.has_errors() { "ERROR" } else { "OK" },
                report.count(Severity::Error),
                report.count(Severity::Warning)
            );
            Ok(if report.has_errors() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
    }
}
