// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

pub mod drift;
pub mod emitter;
pub mod odin_backend;

pub use drift::{diff_documents, Drift, DriftLine, EndingDrift};
pub use emitter::{write_atomically, EmitReport, Emitter};
pub use odin_backend::{is_identifier, package_header, AssertionLine};
