//! Common utilities for the Lorikeet parser.
//!
//! This crate provides shared infrastructure used by the parser core and the CLI:
//! - **Diagnostics** - the reporting channel for warnings and errors, with a
//!   colored terminal sink and an in-memory collector
//! - **Identifier resolution** - joining system identifiers against a base URI

pub mod diagnostic;
pub mod ident;

pub use diagnostic::{CollectingLogger, ConsoleLogger, Diagnostic, Logger, Severity};
