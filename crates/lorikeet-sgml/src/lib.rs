//! Tolerant SGML/HTML document parser.
//!
//! # Scope
//!
//! This crate implements:
//! - **Transcoding input** - byte streams decoded through `encoding_rs`, with
//!   injection of artificial text and mid-stream encoding switches
//!   ([`input`])
//!   - Entity replacement sources layered over the document
//!   - Line/column tracking for diagnostics
//!
//! - **Declaration subsets** - stand-alone DTDs and doctype internal subsets
//!   ([`parse_dtd`])
//!   - `ENTITY` declarations, parameter entity references, comments
//!
//! - **Document body** ([`SgmlParser`])
//!   - Tags, attributes, comments, processing instructions, the doctype
//!   - Character references and the HTML 4 character entities
//!   - `script`/`style` raw text with `document.write` injection
//!   - `<meta>` character encoding switching
//!
//! # Not Yet Implemented
//!
//! - `ELEMENT`, `ATTLIST` and `NOTATION` declarations
//! - `IGNORE`, `CDATA` and `RCDATA` marked sections
//! - External parameter entities
//! - Tag inference from a DTD

/// Parse events and the callback interface.
pub mod callbacks;
/// Parser options.
pub mod config;
/// Entity model and the HTML character entity table.
pub mod entity;
/// Error types.
pub mod error;
/// Transcoding input buffer and the entity source stack.
pub mod input;
/// Name character classes.
pub mod names;
/// External identifier resolution.
pub mod resolver;
/// Document sources.
pub mod source;

mod context;
mod dtd;
mod marked_section;
mod parser;

pub use callbacks::{Attr, Callbacks, DocWriter, Event, EventRecorder};
pub use config::{MAX_ARTIFICIAL_SCRIPT_EXECUTIONS, ParserConfig};
pub use dtd::parse_dtd;
pub use entity::{DtdDefinitions, Entity, EntityTable, EntityType, EntityValue, lookup_entity};
pub use error::{InputError, ParseError, ResolveError, TranscoderError};
pub use parser::SgmlParser;
pub use resolver::{FileResolver, NullResolver, Resolved, Resolver};
pub use source::Source;
