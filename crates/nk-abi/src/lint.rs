// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry lint.
//!
//! The emitter deliberately accepts whatever the registry says; this module is
//! where suspicious entries are reported instead:
//!
//! - the same native type registered twice (redundant, not unsafe);
//! - two native types sharing one Odin name;
//! - Odin names that are not identifiers;
//! - with a header: public composite types the registry misses, and registry
//!   entries the header no longer defines.

use crate::codegen::odin_backend::is_identifier;
use crate::config::LintConfig;
use crate::error::Result;
use crate::registry::{NativeKind, Registry};
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("WARNING"),
            Severity::Error => f.write_str("ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LintFinding {
    /// Same native type registered more than once (0-based positions).
    DuplicateNative {
        native: String,
        foreign: Vec<String>,
        positions: Vec<usize>,
    },
    /// Several native types bound to one Odin name.
    DuplicateForeign {
        foreign: String,
        natives: Vec<String>,
    },
    InvalidForeignName {
        native: String,
        foreign: String,
    },
    /// Public header type with no registry entry.
    MissingFromRegistry { native: String },
    /// Registry entry the header does not define.
    UnknownToHeader { native: String, foreign: String },
}

impl LintFinding {
    pub fn severity(&self) -> Severity {
        match self {
            LintFinding::DuplicateNative { .. }
            | LintFinding::DuplicateForeign { .. }
            | LintFinding::MissingFromRegistry { .. } => Severity::Warning,
            LintFinding::InvalidForeignName { .. } | LintFinding::UnknownToHeader { .. } => {
                Severity::Error
            }
        }
    }
}

impl fmt::Display for LintFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = self.severity();
        match self {
            LintFinding::DuplicateNative {
                native,
                foreign,
                positions,
            } => write!(
                f,
                "{severity} [{native}]: registered {} times (entries {:?}, as {})",
                positions.len(),
                positions,
                foreign.join(", ")
            ),
            LintFinding::DuplicateForeign { foreign, natives } => write!(
                f,
                "{severity} [{foreign}]: bound to several native types: {}",
                natives.join(", ")
            ),
            LintFinding::InvalidForeignName { native, foreign } => write!(
                f,
                "{severity} [{native}]: `{foreign}` is not a valid Odin identifier"
            ),
            LintFinding::MissingFromRegistry { native } => {
                write!(f, "{severity} [{native}]: defined in the header but not registered")
            }
            LintFinding::UnknownToHeader { native, foreign } => write!(
                f,
                "{severity} [{native}]: registered as `{foreign}` but not defined in the header"
            ),
        }
    }
}

/// Checks that need only the registry.
pub fn lint_registry(registry: &Registry) -> Vec<LintFinding> {
    let mut findings = Vec::new();

    let mut by_native: Vec<(String, Vec<usize>)> = Vec::new();
    let mut by_foreign: Vec<(&str, Vec<String>)> = Vec::new();

    for (position, binding) in registry.iter().enumerate() {
        let spelling = binding.native.spelling();

        if !is_identifier(binding.foreign) {
            findings.push(LintFinding::InvalidForeignName {
                native: spelling.clone(),
                foreign: binding.foreign.to_string(),
            });
        }

        match by_native.iter_mut().find(|(native, _)| *native == spelling) {
            Some((_, positions)) => positions.push(position),
            None => by_native.push((spelling.clone(), vec![position])),
        }

        match by_foreign.iter_mut().find(|(foreign, _)| *foreign == binding.foreign) {
            Some((_, natives)) => {
                if !natives.contains(&spelling) {
                    natives.push(spelling);
                }
            }
            None => by_foreign.push((binding.foreign, vec![spelling])),
        }
    }

    let bindings = registry.as_slice();
    for (native, positions) in by_native.into_iter().filter(|(_, p)| p.len() > 1) {
        findings.push(LintFinding::DuplicateNative {
            native,
            foreign: positions
                .iter()
                .map(|p| bindings[*p].foreign.to_string())
                .collect(),
            positions,
        });
    }
    for (foreign, natives) in by_foreign.into_iter().filter(|(_, n)| n.len() > 1) {
        findings.push(LintFinding::DuplicateForeign {
            foreign: foreign.to_string(),
            natives,
        });
    }

    findings
}

/// A composite type defined in the native header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderType {
    pub kind: NativeKind,
    pub name: String,
    /// `struct tag` of a tagged typedef, which the registry may use instead.
    pub alias: Option<String>,
}

impl HeaderType {
    pub fn spelling(&self) -> String {
        match self.kind {
            NativeKind::Struct => format!("struct {}", self.name),
            NativeKind::Union => format!("union {}", self.name),
            NativeKind::Typedef => self.name.clone(),
        }
    }

    fn spellings(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.spelling()).chain(self.alias.iter().cloned())
    }
}

/// A function-like macro whose body defines a token-pasted composite type,
/// e.g. `#define NK_CONFIG_STACK(type,size) struct nk_config_stack_##type {`.
#[derive(Debug, Clone)]
struct MacroTemplate {
    kind: NativeKind,
    params: Vec<String>,
    /// Name pieces between `##`; a piece naming a parameter is substituted.
    pieces: Vec<String>,
}

impl MacroTemplate {
    fn expand(&self, args: &[&str]) -> Option<String> {
        let name = self
            .pieces
            .iter()
            .map(|piece| match self.params.iter().position(|p| p == piece) {
                Some(index) => args.get(index).copied(),
                None => Some(piece.as_str()),
            })
            .collect::<Option<String>>()?;
        is_c_identifier(&name).then_some(name)
    }
}

fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Finds public struct/union definitions in a C header.
pub struct HeaderScanner {
    config: LintConfig,
    block_comment: Regex,
    line_comment: Regex,
    tagged: Regex,
    typedef: Regex,
    typedef_name: Regex,
    macro_definition: Regex,
    pasted_type: Regex,
    invocation: Regex,
}

impl HeaderScanner {
    pub fn new(config: LintConfig) -> Result<Self> {
        Ok(Self {
            config,
            block_comment: Regex::new(r"(?s)/\*.*?\*/")?,
            line_comment: Regex::new(r"//[^\n]*")?,
            tagged: Regex::new(r"\b(struct|union)\s+([A-Za-z_]\w*)\s*\{")?,
            typedef: Regex::new(r"\btypedef\s+(struct|union)\s*([A-Za-z_]\w*)?\s*\{")?,
            typedef_name: Regex::new(r"^\s*([A-Za-z_]\w*)\s*;")?,
            macro_definition: Regex::new(
                r"(?m)^[ \t]*#[ \t]*define[ \t]+([A-Za-z_]\w*)\(([^)]*)\)((?:[^\n]*\\\r?\n)*[^\n]*)",
            )?,
            pasted_type: Regex::new(r"\b(struct|union)\s+([A-Za-z_][\w#]*##[\w#]*)\s*\{")?,
            invocation: Regex::new(r"\b([A-Za-z_]\w*)\s*\(([^()]*)\)")?,
        })
    }

    /// Definitions in header order, filtered by prefix and ignore list.
    pub fn scan(&self, header: &str) -> Vec<HeaderType> {
        let public = match &self.config.implementation_marker {
            Some(marker) => header.find(marker.as_str()).map_or(header, |at| &header[..at]),
            None => header,
        };
        let without_blocks = self.block_comment.replace_all(public, " ");
        let without_comments = self.line_comment.replace_all(&without_blocks, "");
        let templates = self.macro_templates(&without_comments);
        let source = self.macro_definition.replace_all(&without_comments, "");

        let mut found = Vec::new();
        let mut typedef_tags = HashSet::new();

        for caps in self.typedef.captures_iter(&source) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(close) = matching_brace(&source, whole.end() - 1) else {
                continue;
            };
            let Some(name) = self.typedef_name.captures(&source[close..]) else {
                continue;
            };
            let alias = caps.get(2).map(|tag| format!("{} {}", &caps[1], tag.as_str()));
            if let Some(alias) = &alias {
                typedef_tags.insert(alias.clone());
            }
            found.push((
                whole.start(),
                HeaderType {
                    kind: NativeKind::Typedef,
                    name: name[1].to_string(),
                    alias,
                },
            ));
        }

        for caps in self.tagged.captures_iter(&source) {
            let kind = if &caps[1] == "union" {
                NativeKind::Union
            } else {
                NativeKind::Struct
            };
            let ty = HeaderType {
                kind,
                name: caps[2].to_string(),
                alias: None,
            };
            if typedef_tags.contains(&ty.spelling()) {
                continue;
            }
            let start = caps.get(0).map_or(0, |m| m.start());
            found.push((start, ty));
        }

        for caps in self.invocation.captures_iter(&source) {
            let Some(template) = templates.get(&caps[1]) else {
                continue;
            };
            let args: Vec<&str> = caps[2].split(',').map(str::trim).collect();
            let Some(name) = template.expand(&args) else {
                continue;
            };
            let start = caps.get(0).map_or(0, |m| m.start());
            found.push((
                start,
                HeaderType {
                    kind: template.kind,
                    name,
                    alias: None,
                },
            ));
        }

        found.sort_by_key(|(start, _)| *start);

        let mut seen = HashSet::new();
        found
            .into_iter()
            .map(|(_, ty)| ty)
            .filter(|ty| self.is_public(ty))
            .filter(|ty| seen.insert(ty.spelling()))
            .collect()
    }

    /// Macros that stamp out named structs or unions via `##`.
    fn macro_templates(&self, source: &str) -> HashMap<String, MacroTemplate> {
        let mut templates = HashMap::new();
        for caps in self.macro_definition.captures_iter(source) {
            let Some(body) = self.pasted_type.captures(&caps[3]) else {
                continue;
            };
            let kind = if &body[1] == "union" {
                NativeKind::Union
            } else {
                NativeKind::Struct
            };
            let template = MacroTemplate {
                kind,
                params: caps[2].split(',').map(|p| p.trim().to_string()).collect(),
                pieces: body[2].split("##").map(|p| p.trim().to_string()).collect(),
            };
            tracing::debug!("Type-defining macro {}: {:?}", &caps[1], template.pieces);
            templates.insert(caps[1].to_string(), template);
        }
        templates
    }

    fn is_public(&self, ty: &HeaderType) -> bool {
        let ignored = self
            .config
            .ignore
            .iter()
            .any(|i| *i == ty.name || ty.spellings().any(|s| s == *i));
        ty.name.starts_with(&self.config.prefix) && !ignored
    }
}

/// Byte index just past the `}` closing the `{` at `open`.
fn matching_brace(source: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, byte) in source.as_bytes()[open..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Diff the registry against the types a header defines.
pub fn lint_completeness(registry: &Registry, header_types: &[HeaderType]) -> Vec<LintFinding> {
    let registered: HashSet<String> = registry.iter().map(|b| b.native.spelling()).collect();
    let defined: HashSet<String> = header_types.iter().flat_map(HeaderType::spellings).collect();

    let mut findings: Vec<LintFinding> = header_types
        .iter()
        .filter(|ty| !ty.spellings().any(|s| registered.contains(&s)))
        .map(|ty| LintFinding::MissingFromRegistry {
            native: ty.spelling(),
        })
        .collect();

    let mut reported = HashSet::new();
    for binding in registry.iter() {
        let spelling = binding.native.spelling();
        if !defined.contains(&spelling) && reported.insert(spelling.clone()) {
            findings.push(LintFinding::UnknownToHeader {
                native: spelling,
                foreign: binding.foreign.to_string(),
            });
        }
    }

    findings
}

/// All findings of one lint run.
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    pub findings: Vec<LintFinding>,
    /// Number of header types scanned, when a header was given.
    pub header_types: Option<usize>,
}

impl LintReport {
    /// Run the registry checks, plus completeness when `header` is given.
    pub fn run(registry: &Registry, header: Option<&str>, config: &LintConfig) -> Result<Self> {
        let mut findings = lint_registry(registry);
        let mut header_types = None;

        if let Some(header) = header {
            let scanner = HeaderScanner::new(config.clone())?;
            let types = scanner.scan(header);
            tracing::info!("Scanned {} public composite types", types.len());
            header_types = Some(types.len());
            findings.extend(lint_completeness(registry, &types));
        }

        Ok(Self {
            findings,
            header_types,
        })
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity() == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }
}
