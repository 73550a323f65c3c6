//! Byte ranges into the text an AST was parsed from.
//!
//! Translation never depends on spans. Lowering copies them into errors so a
//! caller can point at the offending source; nodes built by lifting carry
//! `SourceSpan::default()`.

use serde::{Deserialize, Serialize};

/// Half-open byte range `[start, end)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: usize,
    pub end: usize,
}

impl SourceSpan {
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Whether this span was synthesized rather than parsed.
    pub const fn is_synthetic(&self) -> bool {
        self.start == 0 && self.end == 0
    }
}
