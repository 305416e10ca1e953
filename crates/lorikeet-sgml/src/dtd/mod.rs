//! Declaration subset parser.
//!
//! Parses the declarations of a stand-alone DTD or of a document type
//! declaration's internal subset into a [`DtdDefinitions`].
//!
//! # Scope
//!
//! - `ENTITY` declarations, internal and external, general and parameter
//! - comment declarations and processing instructions
//! - parameter entity references between declarations and inside them
//! - `INCLUDE`/`TEMP` marked sections
//!
//! # Not Yet Implemented
//!
//! - `ELEMENT`, `ATTLIST` and `NOTATION` declarations
//! - `IGNORE`, `CDATA` and `RCDATA` marked sections
//! - external parameter entities
//! - parameter entity references inside literals

mod decl;
mod entity_decl;

use lorikeet_common::Logger;
use strum_macros::Display;

use crate::config::ParserConfig;
use crate::context::ParseContext;
use crate::entity::DtdDefinitions;
use crate::error::ParseError;
use crate::marked_section::{MarkedSections, SectionClose};
use crate::names::is_space;
use crate::resolver::Resolver;
use crate::source::Source;

/// Which declaration subset is being parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SubsetKind {
    /// A stand-alone DTD. Ends at end of input.
    Document,
    /// The internal subset of a doctype declaration. Ends at `]`.
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
enum DtdState {
    NextDecl,
    MarkupDeclarationOpen,
    ParameterReference,
    CloseBracket,
    Done,
}

pub(crate) struct DtdParser<'c, 'p, 'a> {
    ctx: &'c mut ParseContext<'p, 'a>,
    defs: &'c mut DtdDefinitions,
    kind: SubsetKind,
    state: DtdState,
    base_level: usize,
    marked_sections: MarkedSections,
}

impl<'c, 'p, 'a> DtdParser<'c, 'p, 'a> {
    pub(crate) fn new(
        ctx: &'c mut ParseContext<'p, 'a>,
        defs: &'c mut DtdDefinitions,
        kind: SubsetKind,
    ) -> Self {
        let base_level = ctx.level();
        Self {
            ctx,
            defs,
            kind,
            state: DtdState::NextDecl,
            base_level,
            marked_sections: MarkedSections::default(),
        }
    }

    /// Parse declarations until the subset ends.
    pub(crate) fn run(&mut self) -> Result<(), ParseError> {
        loop {
            match self.state {
                DtdState::NextDecl => self.handle_next_decl_state()?,
                DtdState::MarkupDeclarationOpen => self.handle_markup_declaration_open_state()?,
                DtdState::ParameterReference => self.handle_parameter_reference_state()?,
                DtdState::CloseBracket => self.handle_close_bracket_state()?,
                DtdState::Done => return Ok(()),
            }
        }
    }

    const fn switch_to(&mut self, new_state: DtdState) {
        self.state = new_state;
    }

    fn handle_next_decl_state(&mut self) -> Result<(), ParseError> {
        match self.ctx.get()? {
            Some('<') => self.switch_to(DtdState::MarkupDeclarationOpen),
            Some('%') => self.switch_to(DtdState::ParameterReference),
            Some(']') => self.switch_to(DtdState::CloseBracket),
            Some(c) if is_space(c) => {}
            Some(c) => {
                self.ctx
                    .error(format!("Unexpected character '{c}' in declaration subset"))?;
            }
            None => {
                if self.ctx.input.at_source_boundary() && self.ctx.level() > self.base_level {
                    self.ctx.input.pop_source();
                    let level = self.ctx.level();
                    for _ in 0..self.marked_sections.abandon_deeper_than(level) {
                        self.ctx.error("Marked section not closed in the entity where it started")?;
                    }
                } else {
                    self.finish_at_end_of_input()?;
                }
            }
        }
        Ok(())
    }

    fn finish_at_end_of_input(&mut self) -> Result<(), ParseError> {
        for _ in 0..self.marked_sections.abandon_all() {
            self.ctx.error("Unterminated marked section")?;
        }
        if self.kind == SubsetKind::Internal {
            self.ctx.error("Unterminated internal subset")?;
        }
        self.switch_to(DtdState::Done);
        Ok(())
    }

    /// After `<`.
    fn handle_markup_declaration_open_state(&mut self) -> Result<(), ParseError> {
        self.switch_to(DtdState::NextDecl);
        match self.ctx.get()? {
            Some('!') => self.markup_declaration(),
            Some('?') => {
                // Processing instructions carry no declarations.
                let _ = self.ctx.processing_instruction()?;
                Ok(())
            }
            Some(_) => self.ctx.error("Invalid markup in declaration subset"),
            None => self.ctx.error("Unterminated markup declaration"),
        }
    }

    /// After `%`.
    fn handle_parameter_reference_state(&mut self) -> Result<(), ParseError> {
        self.switch_to(DtdState::NextDecl);
        match self.ctx.peek()? {
            Some(c) if self.ctx.is_name_start(c) => self.parameter_reference(true),
            _ => self.ctx.error("Invalid parameter entity reference"),
        }
    }

    /// After `]`: either `]]>` closing a marked section or the end of the
    /// internal subset.
    fn handle_close_bracket_state(&mut self) -> Result<(), ParseError> {
        self.switch_to(DtdState::NextDecl);
        if self.ctx.next_is(']')? {
            self.ctx.skip()?;
            if !self.ctx.eat('>')? {
                return self.ctx.error("Invalid marked section end");
            }
            return match self.marked_sections.close(self.ctx.level()) {
                SectionClose::Closed => Ok(()),
                SectionClose::ClosedAcrossEntities => self
                    .ctx
                    .error("Marked section ended in a different entity than it started"),
                SectionClose::NotOpen => self
                    .ctx
                    .error("Marked section end outside of marked section"),
            };
        }

        if self.kind == SubsetKind::Document {
            return self.ctx.error("Unexpected ']' in declaration subset");
        }
        for _ in 0..self.marked_sections.abandon_all() {
            self.ctx.error("Unterminated marked section")?;
        }
        if self.ctx.level() != self.base_level {
            self.ctx
                .error("Internal subset ended in a different entity than it started")?;
            // The rest of the entity belongs to no subset.
            self.ctx.input.pop_to_level(self.base_level);
        }
        self.switch_to(DtdState::Done);
        Ok(())
    }
}

/// Parse a stand-alone DTD and return the entities it declares.
///
/// # Errors
///
/// Returns [`ParseError::Unimplemented`] for declarations this parser does not
/// support, [`ParseError::Input`] if the byte stream fails and
/// [`ParseError::Fatal`] on the first error when `die_on_first_error` is set.
pub fn parse_dtd(
    source: Source<'_>,
    resolver: &mut dyn Resolver,
    logger: &mut dyn Logger,
    config: &ParserConfig,
) -> Result<DtdDefinitions, ParseError> {
    let mut ctx = ParseContext::new(source, config, resolver, logger)?;
    let mut defs = DtdDefinitions::new(config.case_insensitive);
    DtdParser::new(&mut ctx, &mut defs, SubsetKind::Document).run()?;
    Ok(defs)
}
