// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Line diff between a committed assertion file and a regenerated one.
//!
//! Because emission order follows registry order, a layout change shows up as
//! a handful of replaced lines rather than a reshuffled file.

use std::fmt;

/// A line present on only one side of the diff (1-based line number).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriftLine {
    pub line: usize,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Drift {
    /// Lines of the committed file that regeneration no longer produces.
    pub removed: Vec<DriftLine>,
    /// Lines regeneration produces that the committed file lacks.
    pub added: Vec<DriftLine>,
    /// Byte-level difference the line diff cannot show.
    pub endings: Option<EndingDrift>,
}

/// Line-terminator differences between otherwise comparable documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndingDrift {
    /// The committed file uses CRLF line endings.
    LineEndings,
    /// The final newline is missing on one side.
    TrailingNewline,
}

impl fmt::Display for EndingDrift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndingDrift::LineEndings => f.write_str("line endings differ (expected LF)"),
            EndingDrift::TrailingNewline => f.write_str("trailing newline differs"),
        }
    }
}

impl Drift {
    pub fn is_clean(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty() && self.endings.is_none()
    }
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for removed in &self.removed {
            writeln!(f, "-{:>5}: {}", removed.line, removed.text)?;
        }
        for added in &self.added {
            writeln!(f, "+{:>5}: {}", added.line, added.text)?;
        }
        if let Some(endings) = self.endings {
            writeln!(f, "!      {endings}")?;
        }
        Ok(())
    }
}

/// Longest-common-subsequence diff of two documents.
pub fn diff_documents(committed: &str, regenerated: &str) -> Drift {
    let old: Vec<&str> = committed.lines().collect();
    let new: Vec<&str> = regenerated.lines().collect();

    // lcs[i][j] = LCS length of old[i..] and new[j..]
    let mut lcs = vec![vec![0usize; new.len() + 1]; old.len() + 1];
    for i in (0..old.len()).rev() {
        for j in (0..new.len()).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut drift = Drift::default();
    let (mut i, mut j) = (0, 0);
    while i < old.len() && j < new.len() {
        if old[i] == new[j] {
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            drift.removed.push(DriftLine {
                line: i + 1,
                text: old[i].to_string(),
            });
            i += 1;
        } else {
            drift.added.push(DriftLine {
                line: j + 1,
                text: new[j].to_string(),
            });
            j += 1;
        }
    }
    drift.removed.extend(old[i..].iter().enumerate().map(|(k, text)| DriftLine {
        line: i + k + 1,
        text: (*text).to_string(),
    }));
    drift.added.extend(new[j..].iter().enumerate().map(|(k, text)| DriftLine {
        line: j + k + 1,
        text: (*text).to_string(),
    }));

    drift.endings = if committed == regenerated {
        None
    } else if committed.contains('\r') != regenerated.contains('\r') {
        Some(EndingDrift::LineEndings)
    } else if committed.ends_with('\n') != regenerated.ends_with('\n') {
        Some(EndingDrift::TrailingNewline)
    } else {
        None
    };

    drift
}
