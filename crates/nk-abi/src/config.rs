// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Generator configuration.
//!
//! Loaded from `nk-abi.yaml` (or the file named by `NK_ABI_CONFIG`); every
//! field has a default, so an absent file means "Nuklear next to the current
//! directory, built with the binding's usual defines".
//!
//! ```yaml
//! package: nuklear
//! output: bindings/nuklear/assertions.odin
//! probe:
//!   header: nuklear.h
//!   include_dirs: [vendor/nuklear]
//!   defines: [NK_INCLUDE_FIXED_TYPES, NK_INCLUDE_STANDARD_BOOL]
//! lint:
//!   ignore: [nk_draw_list]
//! ```
//!
//! Relative paths are resolved against the directory holding the file.

use crate::error::{LayoutError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "nk-abi.yaml";

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "NK_ABI_CONFIG";

/// Defines the Odin binding builds Nuklear with; they change struct layouts.
pub const DEFAULT_DEFINES: &[&str] = &[
    "NK_INCLUDE_FIXED_TYPES",
    "NK_INCLUDE_STANDARD_BOOL",
    "NK_INCLUDE_COMMAND_USERDATA",
    "NK_KEYSTATE_BASED_INPUT",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Odin package the assertion file belongs to.
    pub package: String,
    /// Destination of the assertion file.
    pub output: PathBuf,
    pub probe: ProbeConfig,
    pub lint: LintConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            package: "nuklear".to_string(),
            output: PathBuf::from("assertions.odin"),
            probe: ProbeConfig::default(),
            lint: LintConfig::default(),
        }
    }
}

/// How to build the layout probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProbeConfig {
    /// C compiler command; falls back to `$CC`, then `cc`.
    pub compiler: Option<String>,
    /// Header declaring the native types, as written in `#include "..."`.
    pub header: String,
    pub include_dirs: Vec<PathBuf>,
    /// `NAME` or `NAME=VALUE`, emitted as `#define`s ahead of the header.
    pub defines: Vec<String>,
    /// Extra compiler flags (target, packing, ...).
    pub flags: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            compiler: None,
            header: "nuklear.h".to_string(),
            include_dirs: vec![PathBuf::from(".")],
            defines: DEFAULT_DEFINES.iter().map(|d| (*d).to_string()).collect(),
            flags: Vec::new(),
        }
    }
}

impl ProbeConfig {
    /// Compiler command: config, then `$CC`, then `cc`.
    pub fn resolved_compiler(&self) -> String {
        self.compiler
            .clone()
            .filter(|c| !c.trim().is_empty())
            .or_else(|| std::env::var("CC").ok().filter(|c| !c.trim().is_empty()))
            .unwrap_or_else(|| "cc".to_string())
    }
}

/// Registry completeness lint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LintConfig {
    /// Only header types with this prefix are expected in the registry.
    pub prefix: String,
    /// Scanning stops at the first line containing this text.
    pub implementation_marker: Option<String>,
    /// Header types deliberately not mirrored by the binding.
    pub ignore: Vec<String>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            prefix: "nk_".to_string(),
            implementation_marker: Some("#ifdef NK_IMPLEMENTATION".to_string()),
            ignore: Vec::new(),
        }
    }
}

impl GeneratorConfig {
    /// Parse YAML; `origin` only labels errors and anchors relative paths.
    pub fn from_yaml(yaml: &str, origin: &Path) -> Result<Self> {
        let mut config: GeneratorConfig =
            serde_yaml::from_str(yaml).map_err(|e| LayoutError::Config {
                path: origin.to_path_buf(),
                message: e.to_string(),
            })?;

        if let Some(base) = origin.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.rebase(base);
        }
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!("Loading config from: {:?}", path);
        let yaml = fs::read_to_string(path).map_err(|e| LayoutError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&yaml, path)
    }

    /// Explicit path, then `$NK_ABI_CONFIG`, then `./nk-abi.yaml`, then defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Self::load(Path::new(&path));
        }
        let default = Path::new(DEFAULT_CONFIG_FILE);
        if default.is_file() {
            return Self::load(default);
        }
        tracing::debug!("No configuration file, using defaults");
        Ok(Self::default())
    }

    fn rebase(&mut self, base: &Path) {
        if self.output.is_relative() {
            self.output = base.join(&self.output);
        }
        for dir in &mut self.probe.include_dirs {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}
