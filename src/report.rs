//! Result types, warning and trace sinks, and note assembly.

use serde::{Deserialize, Serialize};

/// A reachability annotation for one conditional's line range.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PathNote {
    pub start_line: u32,
    pub end_line: u32,
    pub reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// De-duplicate notes on `{startLine, endLine, reachable}`, preserving the
/// first occurrence and the path-enumeration order.
#[must_use]
pub fn dedup_notes(notes: Vec<PathNote>) -> Vec<PathNote> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = Vec::with_capacity(notes.len());
    for note in notes {
        if seen.insert((note.start_line, note.end_line, note.reachable)) {
            out.push(note);
        }
    }
    out
}

/// Collector for non-fatal warnings. Every entry is also logged.
#[derive(Debug, Default)]
pub struct Warnings {
    items: Vec<String>,
}

impl Warnings {
    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(target: "pathcheck", "{message}");
        self.items.push(message);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.items
    }
}

/// Per-stage trace, collected only when the `logging` option is on.
#[derive(Debug)]
pub struct Trace {
    enabled: bool,
    entries: Vec<String>,
}

impl Trace {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Vec::new(),
        }
    }

    pub fn stage(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(target: "pathcheck", "{message}");
        if self.enabled {
            self.entries.push(message);
        }
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.entries
    }
}
