//! External identifier resolution.

use std::fs::File;
use std::io::{BufReader, Read};

use lorikeet_common::ident::{resolve_system_ident, to_file_path};

use crate::error::ResolveError;

/// The result of resolving an external identifier.
pub struct Resolved {
    /// The resource's bytes.
    pub byte_stream: Box<dyn Read>,
    /// Character encoding label of the resource, empty if unknown.
    pub charenc: String,
    /// Where the resource was actually found.
    pub resolved_uri: String,
}

/// Maps public/system identifiers to byte streams.
pub trait Resolver {
    /// Resolve an external identifier relative to `base_uri`.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if the resource cannot be provided.
    fn resolve(
        &mut self,
        public_ident: &str,
        system_ident: &str,
        base_uri: &str,
    ) -> Result<Resolved, ResolveError>;
}

/// A resolver that never finds anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullResolver;

impl Resolver for NullResolver {
    fn resolve(
        &mut self,
        public_ident: &str,
        system_ident: &str,
        _base_uri: &str,
    ) -> Result<Resolved, ResolveError> {
        Err(ResolveError::NotFound {
            public_ident: public_ident.to_string(),
            system_ident: system_ident.to_string(),
        })
    }
}

/// Resolves system identifiers to local files. Public identifiers are ignored.
#[derive(Debug, Default, Clone)]
pub struct FileResolver {
    default_charenc: String,
}

impl FileResolver {
    /// A resolver that reports `default_charenc` for every file it opens.
    #[must_use]
    pub fn new(default_charenc: &str) -> Self {
        Self {
            default_charenc: default_charenc.to_string(),
        }
    }
}

impl Resolver for FileResolver {
    fn resolve(
        &mut self,
        public_ident: &str,
        system_ident: &str,
        base_uri: &str,
    ) -> Result<Resolved, ResolveError> {
        if system_ident.is_empty() {
            return Err(ResolveError::NotFound {
                public_ident: public_ident.to_string(),
                system_ident: String::new(),
            });
        }
        let uri = resolve_system_ident(system_ident, base_uri);
        if uri.contains("://") && !uri.starts_with("file://") {
            return Err(ResolveError::Unsupported(uri));
        }
        let file = File::open(to_file_path(&uri)).map_err(|source| ResolveError::Io {
            uri: uri.clone(),
            source,
        })?;
        Ok(Resolved {
            byte_stream: Box::new(BufReader::new(file)),
            charenc: self.default_charenc.clone(),
            resolved_uri: uri,
        })
    }
}
