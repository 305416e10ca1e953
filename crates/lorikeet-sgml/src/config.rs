//! Parser configuration.

use serde::{Deserialize, Serialize};

/// Default cap on consecutive `<script>` executions that originate from
/// injected input.
pub const MAX_ARTIFICIAL_SCRIPT_EXECUTIONS: usize = 32;

/// Options recognized by the parser.
///
/// The defaults describe a tolerant, browser-like HTML parse. Missing fields in
/// a deserialized configuration take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Fold element, attribute, keyword and entity names for lookup.
    pub case_insensitive: bool,
    /// Tolerate a `/` immediately before the `>` of a start tag.
    pub html5_compat: bool,
    /// Use the XML 1.0 name character classes instead of the ASCII-only ones.
    pub accept_xml_1_0_names: bool,
    /// Honor `<meta http-equiv="Content-Type" content="...; charset=...">`.
    pub enable_meta_charenc_switching: bool,
    /// Deliver comment declarations to the `comment` callback.
    pub report_comments: bool,
    /// Promote every warning to an error.
    pub treat_warnings_as_errors: bool,
    /// Abort the parse on the first reported error.
    pub die_on_first_error: bool,
    /// Maximum number of consecutive script executions triggered by injected
    /// input before further ones are suppressed.
    pub max_artificial_script_executions: usize,
    /// Warn when a parameter entity reference is not closed by `;`.
    pub strict_references: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            html5_compat: true,
            accept_xml_1_0_names: false,
            enable_meta_charenc_switching: true,
            report_comments: true,
            treat_warnings_as_errors: false,
            die_on_first_error: false,
            max_artificial_script_executions: MAX_ARTIFICIAL_SCRIPT_EXECUTIONS,
            strict_references: false,
        }
    }
}
