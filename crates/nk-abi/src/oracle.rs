// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native size queries.
//!
//! The emitter never knows a size on its own: every number it writes comes
//! from a [`SizeOracle`], which in production is a [`LayoutTable`] filled by
//! compiling and running the C layout probe (see [`crate::probe`]), or a
//! [`LayoutReport`] captured from such a run on another machine.

use crate::error::{LayoutError, Result};
use crate::registry::{normalize_spelling, NativeType, Registry, TypeBinding};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// `size_of(native type)` as seen by the native compiler.
pub trait SizeOracle {
    /// Size in bytes, tail padding included, or `None` if the type is unknown.
    fn size_of(&self, ty: &NativeType) -> Option<u64>;

    /// Size of a registry entry, failing with `UnresolvableType`.
    ///
    /// A reported size of zero is rejected too: C has no complete zero-sized
    /// composite, so zero only shows up for opaque placeholders.
    fn resolve(&self, binding: &TypeBinding) -> Result<u64> {
        match self.size_of(&binding.native) {
            Some(0) => Err(LayoutError::unresolvable(
                binding.native.spelling(),
                binding.foreign,
                "zero-sized; the type is opaque or only forward-declared",
            )),
            Some(size) => Ok(size),
            None => Err(LayoutError::unresolvable(
                binding.native.spelling(),
                binding.foreign,
                "no complete definition visible to the native compiler",
            )),
        }
    }
}

/// Measured sizes keyed by C spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutTable {
    sizes: HashMap<String, u64>,
}

impl LayoutTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, ty: &NativeType, size: u64) -> Option<u64> {
        self.sizes.insert(ty.spelling(), size)
    }

    pub fn insert_spelling(&mut self, spelling: &str, size: u64) -> Option<u64> {
        self.sizes.insert(normalize_spelling(spelling), size)
    }

    #[must_use]
    pub fn with(mut self, ty: NativeType, size: u64) -> Self {
        self.insert(&ty, size);
        self
    }

    pub fn get_spelling(&self, spelling: &str) -> Option<u64> {
        self.sizes.get(&normalize_spelling(spelling)).copied()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

impl SizeOracle for LayoutTable {
    fn size_of(&self, ty: &NativeType) -> Option<u64> {
        self.sizes.get(&ty.spelling()).copied()
    }
}

/// One measured registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub native: String,
    pub foreign: String,
    pub size: u64,
}

/// Serialisable record of a measurement run, in registry order.
///
/// Lets sizes measured where the library is actually built (e.g. on the
/// target) drive generation on a host that cannot run the probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutReport {
    pub package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,
    pub entries: Vec<ReportEntry>,
}

impl LayoutReport {
    /// Resolve every registry entry, stopping at the first unresolvable one.
    pub fn measure(
        registry: &Registry,
        oracle: &dyn SizeOracle,
        package: impl Into<String>,
        compiler: Option<String>,
    ) -> Result<Self> {
        let entries = registry
            .iter()
            .map(|binding| {
                Ok(ReportEntry {
                    native: binding.native.spelling(),
                    foreign: binding.foreign.to_string(),
                    size: oracle.resolve(binding)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            package: package.into(),
            compiler,
            entries,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Sizes of this report as an oracle.
    ///
    /// A native type listed twice with different sizes keeps the last one;
    /// `tracing` reports the conflict.
    pub fn table(&self) -> LayoutTable {
        let mut table = LayoutTable::new();
        for entry in &self.entries {
            if let Some(previous) = table.insert_spelling(&entry.native, entry.size) {
                if previous != entry.size {
                    tracing::warn!(
                        "layout report lists `{}` as both {} and {} bytes",
                        entry.native,
                        previous,
                        entry.size
                    );
                }
            }
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> Registry {
        Registry::new(vec![
            TypeBinding::new(NativeType::struct_named("GeometryRect"), "Rect"),
            TypeBinding::new(NativeType::typedef_named("ColorHandle"), "Handle"),
        ])
    }

    #[test]
    fn test_resolve_known_size() {
        let table = LayoutTable::new().with(NativeType::struct_named("GeometryRect"), 16);
        let binding = TypeBinding::new(NativeType::struct_named("GeometryRect"), "Rect");
        assert_eq!(table.resolve(&binding).ok(), Some(16));
    }

    #[test]
    fn test_resolve_missing_is_unresolvable() {
        let table = LayoutTable::new();
        let binding = TypeBinding::new(NativeType::struct_named("nk_context"), "Context");
        match table.resolve(&binding) {
            Err(LayoutError::UnresolvableType {
                native, foreign, ..
            }) => {
                assert_eq!(native, "struct nk_context");
                assert_eq!(foreign, "Context");
            }
            other => panic!("expected UnresolvableType, got {other:?}"),
        }
    }

    #[test]
    fn test_resolve_zero_size_is_unresolvable() {
        let table = LayoutTable::new().with(NativeType::struct_named("nk_opaque"), 0);
        let binding = TypeBinding::new(NativeType::struct_named("nk_opaque"), "Opaque");
        assert!(matches!(
            table.resolve(&binding),
            Err(LayoutError::UnresolvableType { .. })
        ));
    }

    #[test]
    fn test_spelling_whitespace_is_normalized() {
        let mut table = LayoutTable::new();
        table.insert_spelling("struct   GeometryRect", 16);
        assert_eq!(
            table.size_of(&NativeType::struct_named("GeometryRect")),
            Some(16)
        );
        assert_eq!(table.get_spelling(" struct GeometryRect "), Some(16));
    }

    #[test]
    fn test_report_keeps_registry_order() {
        let table = LayoutTable::new()
            .with(NativeType::typedef_named("ColorHandle"), 4)
            .with(NativeType::struct_named("GeometryRect"), 16);
        let report = LayoutReport::measure(&sample_registry(), &table, "nuklear", None)
            .expect("measure");

        let foreign: Vec<_> = report.entries.iter().map(|e| e.foreign.as_str()).collect();
        assert_eq!(foreign, ["Rect", "Handle"]);

        let json = report.to_json().expect("serialize");
        assert!(!json.contains("compiler"));
        let loaded = LayoutReport::from_json(&json).expect("parse");
        assert_eq!(loaded.table(), table);
    }

    #[test]
    fn test_report_measure_fails_fast() {
        let table = LayoutTable::new().with(NativeType::struct_named("GeometryRect"), 16);
        let err = LayoutReport::measure(&sample_registry(), &table, "nuklear", None)
            .expect_err("ColorHandle is missing");
        assert!(err.to_string().contains("Handle"));
    }
}
