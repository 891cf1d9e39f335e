// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # nk-abi
//!
//! Layout parity between the Nuklear C library and its Odin binding.
//!
//! The Odin binding redeclares every Nuklear struct it touches. If one of
//! those declarations drifts from what the C compiler actually laid out
//! (a new field upstream, a different define, another platform's padding),
//! every access across the boundary reads the wrong bytes and nothing fails
//! at build time. This crate closes that gap by generating
//! `assertions.odin`:
//!
//! ```text
//! package nuklear
//!
//! #assert(size_of(Rect) == 16)
//! #assert(size_of(Handle) == 8)
//! ...
//! ```
//!
//! where each size is measured by the C compiler that builds Nuklear. The
//! Odin compiler evaluates the assertions and refuses to build a binding
//! whose types disagree.
//!
//! # Quick Start
//!
//! ```no_run
//! use nk_abi::{CProbe, Emitter, GeneratorConfig, Registry};
//!
//! # fn main() -> nk_abi::Result<()> {
//! let config = GeneratorConfig::discover(None)?;
//! let registry = Registry::nuklear();
//!
//! let sizes = CProbe::new(config.probe.clone())?.measure(&registry)?;
//! let report = Emitter::new(&registry, &config.package)?.emit_to_path(&sizes, &config.output)?;
//! report.summary();
//! # Ok(())
//! # }
//! ```

pub mod codegen;
pub mod config;
pub mod error;
pub mod lint;
pub mod oracle;
pub mod primitives;
pub mod probe;
pub mod registry;

pub use codegen::{
    diff_documents, write_atomically, AssertionLine, Drift, EmitReport, Emitter, EndingDrift,
};
pub use config::{GeneratorConfig, LintConfig, ProbeConfig};
pub use error::{LayoutError, Result};
pub use lint::{LintFinding, LintReport, Severity};
pub use oracle::{LayoutReport, LayoutTable, SizeOracle};
pub use primitives::Primitives;
pub use probe::CProbe;
pub use registry::{NativeKind, NativeType, Registry, TypeBinding, NUKLEAR_BINDINGS};
