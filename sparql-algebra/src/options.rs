//! Lowering options
//!
//! `LowerOptions` controls how an AST is lowered: whether `GRAPH` blocks are
//! embedded into the patterns they contain, whether blank nodes in patterns
//! become variables, and which prefixes and base IRI are known before the
//! query's own prologue is read.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Options for AST to algebra lowering
///
/// Serializes with the camelCase keys `quads`, `blankToVariable`, `prefixes`
/// and `baseIRI`. Missing keys take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LowerOptions {
    /// Embed enclosing graph names into patterns and paths
    pub quads: bool,
    /// Replace blank nodes in patterns with fresh variables
    pub blank_to_variable: bool,
    /// Prefixes registered before the query prologue
    pub prefixes: FxHashMap<String, String>,
    /// Base IRI used until the query declares its own
    #[serde(rename = "baseIRI", skip_serializing_if = "Option::is_none")]
    pub base_iri: Option<String>,
}

impl LowerOptions {
    /// Create new lowering options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable quad mode
    pub fn with_quads(mut self, quads: bool) -> Self {
        self.quads = quads;
        self
    }

    /// Enable or disable the blank-to-variable pass
    pub fn with_blank_to_variable(mut self, enabled: bool) -> Self {
        self.blank_to_variable = enabled;
        self
    }

    /// Register a prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>, iri: impl Into<String>) -> Self {
        self.prefixes.insert(prefix.into(), iri.into());
        self
    }

    /// Set the base IRI
    pub fn with_base_iri(mut self, base: impl Into<String>) -> Self {
        self.base_iri = Some(base.into());
        self
    }

    /// Parse options from a JSON object
    ///
    /// # Example
    ///
    /// ```
    /// use sparql_algebra::options::LowerOptions;
    ///
    /// let opts = LowerOptions::from_json(r#"{"quads": true, "baseIRI": "http://ex.org/"}"#).unwrap();
    /// assert!(opts.quads);
    /// assert!(!opts.blank_to_variable);
    /// assert_eq!(opts.base_iri.as_deref(), Some("http://ex.org/"));
    /// ```
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
