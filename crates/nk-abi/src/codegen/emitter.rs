// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Assertion file emitter.
//!
//! Output is a pure function of the registry order and the oracle's sizes:
//!
//! ```text
//! package nuklear
//!
//! #assert(size_of(Rect) == 16)
//! #assert(size_of(RectI) == 8)
//! ```
//!
//! The whole document is rendered in memory before the destination is
//! touched, and it is swapped in with a rename, so a failed run never leaves
//! a truncated file that would silently check only a prefix of the types.

use crate::codegen::odin_backend::{is_identifier, package_header, AssertionLine};
use crate::error::{LayoutError, Result};
use crate::oracle::SizeOracle;
use crate::registry::Registry;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Turns a registry into an Odin assertion file.
#[derive(Debug, Clone)]
pub struct Emitter<'r> {
    registry: &'r Registry,
    package: String,
}

impl<'r> Emitter<'r> {
    pub fn new(registry: &'r Registry, package: impl Into<String>) -> Result<Self> {
        let package = package.into();
        if !is_identifier(&package) {
            return Err(LayoutError::InvalidPackage(package));
        }
        Ok(Self { registry, package })
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// One assertion per registry entry, in registry order.
    pub fn assertions<'s>(
        &'s self,
        oracle: &'s dyn SizeOracle,
    ) -> impl Iterator<Item = Result<AssertionLine<'s>>> + 's {
        self.registry.iter().map(move |binding| {
            let byte_size = oracle.resolve(binding)?;
            tracing::debug!("{} = {} bytes", binding, byte_size);
            Ok(AssertionLine {
                foreign_name: binding.foreign,
                byte_size,
            })
        })
    }

    /// Render the full document, aborting on the first unresolvable entry.
    pub fn render(&self, oracle: &dyn SizeOracle) -> Result<String> {
        let mut document = package_header(&self.package);
        document.push_str("\n\n");

        for line in self.assertions(oracle) {
            let line = line?;
            document.push_str(&line.to_string());
            document.push('\n');
        }

        Ok(document)
    }

    /// Render and atomically replace `path` with the result.
    pub fn emit_to_path(&self, oracle: &dyn SizeOracle, path: &Path) -> Result<EmitReport> {
        let document = self.render(oracle)?;
        let unchanged = fs::read(path).is_ok_and(|existing| existing == document.as_bytes());

        write_atomically(path, document.as_bytes())?;

        tracing::info!(
            "[OK] Wrote {} assertions to {}",
            self.registry.len(),
            path.display()
        );
        Ok(EmitReport {
            path: path.to_path_buf(),
            package: self.package.clone(),
            assertions: self.registry.len(),
            bytes: document.len(),
            unchanged,
        })
    }
}

/// Mode of a newly created output file, before the umask.
#[cfg(unix)]
const NEW_FILE_MODE: u32 = 0o644;

/// Write `contents` to a sibling temporary file, then rename it over `path`.
///
/// On any failure the temporary file is removed and `path` keeps its previous
/// contents (or stays absent). An existing file keeps its permissions; a new
/// one is created `0644` minus the umask.
pub fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let existing = fs::metadata(path)
        .ok()
        .filter(|meta| meta.is_file())
        .map(|meta| meta.permissions());

    let mut builder = tempfile::Builder::new();
    builder.prefix(".nk-abi-").suffix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if existing.is_none() {
            builder.permissions(fs::Permissions::from_mode(NEW_FILE_MODE));
        }
    }
    let mut staged = builder
        .tempfile_in(dir)
        .map_err(|e| LayoutError::write_failure(path, e))?;

    staged
        .write_all(contents)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| LayoutError::write_failure(path, e))?;

    if let Some(permissions) = existing {
        staged
            .as_file()
            .set_permissions(permissions)
            .map_err(|e| LayoutError::write_failure(path, e))?;
    }

    staged
        .persist(path)
        .map_err(|e| LayoutError::write_failure(path, e.error))?;

    Ok(())
}

/// Outcome of one emission run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitReport {
    pub path: PathBuf,
    pub package: String,
    pub assertions: usize,
    pub bytes: usize,
    /// The previous file had exactly the same contents.
    pub unchanged: bool,
}

impl EmitReport {
    pub fn summary(&self) {
        println!("\n{}", "=".repeat(60));
        println!("  Layout Assertion Report");
        println!("{}", "=".repeat(60));
        println!();
        println!("  [OK] Package:       {}", self.package);
        println!("  [OK] Assertions:    {}", self.assertions);
        println!("  [OK] Written:       {} ({} bytes)", self.path.display(), self.bytes);
        if self.unchanged {
            println!("  [OK] No layout drift since the previous run");
        } else {
            println!("  [!!] Output changed; review and commit the new file");
        }
        println!();
        println!("{}", "=".repeat(60));
    }
}
