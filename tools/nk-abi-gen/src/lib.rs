// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subcommands of `nk-abi-gen`.
//!
//! Each command takes the loaded [`GeneratorConfig`] plus its own overrides
//! and returns a value the binary prints; none of them exit the process.

use anyhow::Context;
use nk_abi::{
    diff_documents, write_atomically, CProbe, Drift, EmitReport, Emitter, GeneratorConfig,
    LayoutReport, LayoutTable, LintReport, Registry,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Sizes from a recorded layout report, or measured by the C probe.
pub fn load_sizes(
    config: &GeneratorConfig,
    registry: &Registry,
    layouts: Option<&Path>,
) -> anyhow::Result<LayoutTable> {
    match layouts {
        Some(path) => {
            tracing::info!("Replaying layout report {}", path.display());
            let report = LayoutReport::load(path)
                .with_context(|| format!("Failed to load layout report {}", path.display()))?;
            if let Some(compiler) = &report.compiler {
                tracing::debug!("Report was measured with `{}`", compiler);
            }
            Ok(report.table())
        }
        None => {
            let probe = CProbe::new(config.probe.clone())?;
            tracing::info!("Measuring native layouts with `{}`", probe.compiler());
            probe
                .measure(registry)
                .context("Failed to measure native layouts")
        }
    }
}

/// `generate`: write the assertion file.
pub fn generate(
    config: &GeneratorConfig,
    output: Option<PathBuf>,
    package: Option<String>,
    layouts: Option<&Path>,
) -> anyhow::Result<EmitReport> {
    let registry = Registry::nuklear();
    let output = output.unwrap_or_else(|| config.output.clone());
    let package = package.unwrap_or_else(|| config.package.clone());

    let emitter = Emitter::new(&registry, package)?;
    let sizes = load_sizes(config, &registry, layouts)?;
    let report = emitter.emit_to_path(&sizes, &output)?;
    Ok(report)
}

/// `measure`: record native sizes as a layout report.
///
/// Writes to `output` when given; the JSON is returned either way.
pub fn measure(config: &GeneratorConfig, output: Option<&Path>) -> anyhow::Result<String> {
    let registry = Registry::nuklear();
    let probe = CProbe::new(config.probe.clone())?;
    let sizes = probe
        .measure(&registry)
        .context("Failed to measure native layouts")?;

    let report = LayoutReport::measure(
        &registry,
        &sizes,
        config.package.clone(),
        Some(probe.compiler()),
    )?;
    let json = report.to_json()?;

    if let Some(path) = output {
        write_atomically(path, format!("{json}\n").as_bytes())
            .with_context(|| format!("Failed to write layout report {}", path.display()))?;
        tracing::info!(
            "[OK] Recorded {} layouts to {}",
            report.entries.len(),
            path.display()
        );
    }
    Ok(json)
}

/// `check`: compare the committed assertion file with a fresh rendering.
pub fn check(
    config: &GeneratorConfig,
    file: Option<PathBuf>,
    package: Option<String>,
    layouts: Option<&Path>,
) -> anyhow::Result<Drift> {
    let registry = Registry::nuklear();
    let file = file.unwrap_or_else(|| config.output.clone());
    let package = package.unwrap_or_else(|| config.package.clone());

    let committed = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let sizes = load_sizes(config, &registry, layouts)?;
    let regenerated = Emitter::new(&registry, package)?.render(&sizes)?;

    Ok(diff_documents(&committed, &regenerated))
}

/// `lint`: registry consistency, plus completeness when a header is found.
pub fn lint(config: &GeneratorConfig, header: Option<PathBuf>) -> anyhow::Result<LintReport> {
    let registry = Registry::nuklear();

    let header_path = header.or_else(|| locate_header(config));
    let header_text = match &header_path {
        Some(path) => {
            tracing::info!("Scanning header {}", path.display());
            Some(
                fs::read_to_string(path)
                    .with_context(|| format!("Failed to read header {}", path.display()))?,
            )
        }
        None => {
            tracing::warn!(
                "`{}` not found in any include dir; skipping completeness checks",
                config.probe.header
            );
            None
        }
    };

    let report = LintReport::run(&registry, header_text.as_deref(), &config.lint)?;
    Ok(report)
}

/// First include dir holding the configured header.
fn locate_header(config: &GeneratorConfig) -> Option<PathBuf> {
    config
        .probe
        .include_dirs
        .iter()
        .map(|dir| dir.join(&config.probe.header))
        .find(|path| path.is_file())
}
