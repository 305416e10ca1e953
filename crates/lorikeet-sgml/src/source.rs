//! Document input description.

use std::io::Read;

/// A byte stream to parse together with what is known about it.
pub struct Source<'a> {
    /// The bytes of the document.
    pub byte_stream: Box<dyn Read + 'a>,
    /// Character encoding label, empty if unknown.
    pub charenc: String,
    /// Identifier used in diagnostics.
    pub system_ident: String,
    /// Base against which external identifiers are resolved.
    pub base_uri: String,
}

impl<'a> Source<'a> {
    /// A source over any reader, with unknown encoding.
    pub fn from_reader<R: Read + 'a>(reader: R) -> Self {
        Self {
            byte_stream: Box::new(reader),
            charenc: String::new(),
            system_ident: String::new(),
            base_uri: String::new(),
        }
    }

    /// A source over an in-memory byte slice.
    #[must_use]
    pub fn from_bytes(bytes: &'a [u8]) -> Self {
        Self::from_reader(bytes)
    }

    /// A source over a string, declared as UTF-8.
    #[must_use]
    pub fn from_text(text: &'a str) -> Self {
        Self::from_bytes(text.as_bytes()).with_charenc("UTF-8")
    }

    /// Set the character encoding hint.
    #[must_use]
    pub fn with_charenc(mut self, charenc: &str) -> Self {
        self.charenc = charenc.to_string();
        self
    }

    /// Set the identifier used in diagnostics. Also used as base URI if none
    /// has been set.
    #[must_use]
    pub fn with_system_ident(mut self, system_ident: &str) -> Self {
        self.system_ident = system_ident.to_string();
        if self.base_uri.is_empty() {
            self.base_uri = system_ident.to_string();
        }
        self
    }

    /// Set the base URI.
    #[must_use]
    pub fn with_base_uri(mut self, base_uri: &str) -> Self {
        self.base_uri = base_uri.to_string();
        self
    }
}
