// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! C layout probe.
//!
//! Sizes must come from the compiler that builds Nuklear, under the same
//! defines and flags, so they are measured rather than computed: the registry
//! is rendered into a tiny C program that prints `sizeof` of every entry,
//! compiled with the configured compiler and run on the host.
//!
//! Each `sizeof` sits on its own source line. When the probe fails to compile
//! (typically "invalid application of 'sizeof' to incomplete type"), the
//! diagnostic's line number identifies the registry entry at fault.
//!
//! The probe runs on the host, so for cross builds measure on the target with
//! `nk-abi-gen measure` and replay the resulting layout report.

use crate::config::ProbeConfig;
use crate::error::{LayoutError, Result};
use crate::oracle::LayoutTable;
use crate::registry::Registry;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::process::Command;
use tera::Tera;

const PROBE_TEMPLATE: &str = include_str!("templates/probe.c.tera");
const PROBE_SOURCE: &str = "probe.c";

#[derive(Debug, Serialize)]
struct Define {
    name: String,
    value: Option<String>,
}

impl Define {
    fn parse(raw: &str) -> Self {
        match raw.split_once('=') {
            Some((name, value)) => Self {
                name: name.trim().to_string(),
                value: Some(value.trim().to_string()),
            },
            None => Self {
                name: raw.trim().to_string(),
                value: None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ProbeEntry {
    index: usize,
    native: String,
}

/// Rendered probe program and the source line of each registry entry.
#[derive(Debug, Clone)]
pub struct ProbeSource {
    pub text: String,
    entry_lines: HashMap<usize, usize>,
}

impl ProbeSource {
    /// Registry index whose `sizeof` is on 1-based `line`.
    pub fn entry_at_line(&self, line: usize) -> Option<usize> {
        self.entry_lines.get(&line).copied()
    }
}

/// The native compilation environment, as a size oracle factory.
pub struct CProbe {
    config: ProbeConfig,
    tera: Tera,
    entry_line: Regex,
    size_line: Regex,
    diagnostic: Regex,
}

impl CProbe {
    pub fn new(config: ProbeConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(PROBE_SOURCE, PROBE_TEMPLATE)?;

        Ok(Self {
            config,
            tera,
            entry_line: Regex::new(r#"^\s*printf\("%u %llu\\n", (\d+)u,"#)?,
            size_line: Regex::new(r"^(\d+) (\d+)$")?,
            // gcc/clang `probe.c:12:5: error: ...`, msvc `probe.c(12): error ...`
            diagnostic: Regex::new(r"probe\.c[:(](\d+)[^\n]*\berror\b")?,
        })
    }

    /// Compiler command this probe will invoke.
    pub fn compiler(&self) -> String {
        self.config.resolved_compiler()
    }

    /// Render the probe program for `registry`.
    pub fn render(&self, registry: &Registry) -> Result<ProbeSource> {
        let defines: Vec<Define> = self.config.defines.iter().map(|d| Define::parse(d)).collect();
        let entries: Vec<ProbeEntry> = registry
            .iter()
            .enumerate()
            .map(|(index, binding)| ProbeEntry {
                index,
                native: binding.native.spelling(),
            })
            .collect();

        let mut ctx = tera::Context::new();
        ctx.insert("defines", &defines);
        ctx.insert("header", &self.config.header);
        ctx.insert("entries", &entries);
        let text = self.tera.render(PROBE_SOURCE, &ctx)?;

        let entry_lines = text
            .lines()
            .enumerate()
            .filter_map(|(i, line)| {
                let caps = self.entry_line.captures(line)?;
                let index = caps[1].parse::<usize>().ok()?;
                Some((i + 1, index))
            })
            .collect();

        Ok(ProbeSource { text, entry_lines })
    }

    /// Compile and run the probe, returning the size of every entry.
    pub fn measure(&self, registry: &Registry) -> Result<LayoutTable> {
        let source = self.render(registry)?;

        let scratch = tempfile::Builder::new().prefix("nk-abi-probe-").tempdir()?;
        let src_path = scratch.path().join(PROBE_SOURCE);
        let exe_path = scratch
            .path()
            .join(format!("probe{}", std::env::consts::EXE_SUFFIX));
        fs::write(&src_path, &source.text)?;

        self.compile(&src_path, &exe_path, registry, &source)?;
        let stdout = self.run(&exe_path)?;
        let table = self.parse_sizes(&stdout, registry)?;

        tracing::info!(
            "[OK] Measured {} native types with `{}`",
            registry.len(),
            self.compiler()
        );
        Ok(table)
    }

    fn compile(
        &self,
        src_path: &Path,
        exe_path: &Path,
        registry: &Registry,
        source: &ProbeSource,
    ) -> Result<()> {
        let compiler = self.compiler();
        let mut words = compiler.split_whitespace();
        let program = words.next().unwrap_or("cc");

        let mut cmd = Command::new(program);
        cmd.args(words).args(&self.config.flags);
        for dir in &self.config.include_dirs {
            cmd.arg("-I").arg(dir);
        }
        cmd.arg("-o").arg(exe_path).arg(src_path);

        tracing::debug!("Compiling layout probe: {:?}", cmd);
        let output = cmd.output().map_err(|source| LayoutError::CompilerUnavailable {
            compiler: compiler.clone(),
            source,
        })?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        Err(self.diagnose(&compiler, &stderr, registry, source))
    }

    /// Blame the first registry entry a compiler error points at.
    fn diagnose(
        &self,
        compiler: &str,
        stderr: &str,
        registry: &Registry,
        source: &ProbeSource,
    ) -> LayoutError {
        let mut blamed = stderr.lines().filter_map(|line| {
            let caps = self.diagnostic.captures(line)?;
            let index = source.entry_at_line(caps[1].parse().ok()?)?;
            let binding = registry.as_slice().get(index)?;
            Some((binding, line.trim()))
        });

        match blamed.next() {
            Some((binding, diagnostic)) => {
                for (other, _) in blamed {
                    tracing::error!("[ERROR] also unresolvable: {}", other);
                }
                LayoutError::unresolvable(binding.native.spelling(), binding.foreign, diagnostic)
            }
            None => LayoutError::ProbeCompile {
                compiler: compiler.to_string(),
                stderr: stderr.to_string(),
            },
        }
    }

    fn run(&self, exe_path: &Path) -> Result<String> {
        let output = Command::new(exe_path).output()?;
        if !output.status.success() {
            return Err(LayoutError::ProbeRun {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        String::from_utf8(output.stdout)
            .map_err(|e| LayoutError::ProbeOutput(format!("output is not UTF-8: {e}")))
    }

    /// Parse `<entry> <size>` lines into a table covering every entry.
    fn parse_sizes(&self, stdout: &str, registry: &Registry) -> Result<LayoutTable> {
        let bindings = registry.as_slice();
        let mut sizes: Vec<Option<u64>> = vec![None; bindings.len()];

        for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let caps = self
                .size_line
                .captures(line)
                .ok_or_else(|| LayoutError::ProbeOutput(format!("unexpected line `{line}`")))?;
            let index: usize = caps[1]
                .parse()
                .map_err(|_| LayoutError::ProbeOutput(format!("bad entry index in `{line}`")))?;
            let size: u64 = caps[2]
                .parse()
                .map_err(|_| LayoutError::ProbeOutput(format!("bad size in `{line}`")))?;
            let slot = sizes.get_mut(index).ok_or_else(|| {
                LayoutError::ProbeOutput(format!("entry {index} is outside the registry"))
            })?;
            *slot = Some(size);
        }

        let mut table = LayoutTable::new();
        for (binding, size) in bindings.iter().zip(sizes) {
            let size = size.ok_or_else(|| {
                LayoutError::ProbeOutput(format!("no size printed for {binding}"))
            })?;
            table.insert(&binding.native, size);
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::SizeOracle;
    use crate::registry::{NativeType, TypeBinding};

    fn probe() -> CProbe {
        CProbe::new(ProbeConfig {
            compiler: Some("cc".to_string()),
            defines: vec![
                "NK_INCLUDE_FIXED_TYPES".to_string(),
                "NK_BUFFER_DEFAULT_INITIAL_SIZE=4096".to_string(),
            ],
            ..ProbeConfig::default()
        })
        .expect("probe")
    }

    fn registry() -> Registry {
        Registry::new(vec![
            TypeBinding::new(NativeType::struct_named("nk_rect"), "Rect"),
            TypeBinding::new(NativeType::typedef_named("nk_handle"), "Handle"),
            TypeBinding::new(NativeType::union_named("nk_page_data"), "Page_Data"),
        ])
    }

    #[test]
    fn test_render_one_sizeof_per_entry() {
        let source = probe().render(&registry()).expect("render");

        assert!(source.text.contains("#define NK_INCLUDE_FIXED_TYPES\n"));
        assert!(source.text.contains("#define NK_BUFFER_DEFAULT_INITIAL_SIZE 4096\n"));
        assert!(source.text.contains("#include \"nuklear.h\""));
        assert_eq!(source.text.matches("sizeof(").count(), 3);
        assert!(source.text.contains("sizeof(union nk_page_data)"));

        let lines: Vec<&str> = source.text.lines().collect();
        for index in 0..3 {
            let line = (1..=lines.len())
                .find(|l| source.entry_at_line(*l) == Some(index))
                .expect("entry line");
            assert!(lines[line - 1].contains(&format!(" {index}u,")));
        }
    }

    #[test]
    fn test_diagnose_blames_entry_line() {
        let probe = probe();
        let registry = registry();
        let source = probe.render(&registry).expect("render");
        let line = (1..200)
            .find(|l| source.entry_at_line(*l) == Some(1))
            .expect("line of entry 1");
        let stderr = format!(
            "/tmp/x/probe.c:{line}:54: error: invalid application of 'sizeof' to incomplete type 'nk_handle'\n"
        );

        match probe.diagnose("cc", &stderr, &registry, &source) {
            LayoutError::UnresolvableType {
                native,
                foreign,
                reason,
            } => {
                assert_eq!(native, "nk_handle");
                assert_eq!(foreign, "Handle");
                assert!(reason.contains("incomplete type"));
            }
            other => panic!("expected UnresolvableType, got {other:?}"),
        }
    }

    #[test]
    fn test_diagnose_unrelated_error() {
        let probe = probe();
        let registry = registry();
        let source = probe.render(&registry).expect("render");
        let stderr = "probe.c:6:10: fatal error: nuklear.h: No such file or directory\n";
        assert!(matches!(
            probe.diagnose("cc", stderr, &registry, &source),
            LayoutError::ProbeCompile { .. }
        ));
    }

    #[test]
    fn test_parse_sizes() {
        let probe = probe();
        let registry = registry();
        let table = probe
            .parse_sizes("0 16\n1 8\n2 56\n", &registry)
            .expect("parse");
        assert_eq!(table.size_of(&NativeType::struct_named("nk_rect")), Some(16));
        assert_eq!(table.size_of(&NativeType::union_named("nk_page_data")), Some(56));
    }

    #[test]
    fn test_parse_sizes_rejects_gaps_and_garbage() {
        let probe = probe();
        let registry = registry();
        assert!(matches!(
            probe.parse_sizes("0 16\n2 56\n", &registry),
            Err(LayoutError::ProbeOutput(_))
        ));
        assert!(matches!(
            probe.parse_sizes("0 16\nsegfault\n", &registry),
            Err(LayoutError::ProbeOutput(_))
        ));
        assert!(matches!(
            probe.parse_sizes("7 16\n", &registry),
            Err(LayoutError::ProbeOutput(_))
        ));
    }
}
