//! Document body parser.
//!
//! Drives the [`Callbacks`] from the character stream of a document. The
//! parser is tolerant: malformed markup is reported through the logger and a
//! well-defined fallback is applied, usually treating the offending
//! characters as text.
//!
//! # Scope
//!
//! - start tags with quoted, bare and valueless attributes
//! - end tags, comments, processing instructions
//! - the document type declaration and its internal subset
//! - character references and general entity references
//! - `script` and `style` raw text, with `document.write` injection
//! - the `<meta http-equiv="Content-Type">` character encoding switch
//! - `INCLUDE`/`TEMP` marked sections
//!
//! # Not Yet Implemented
//!
//! - `IGNORE`, `CDATA` and `RCDATA` marked sections
//! - loading the external DTD subset named by the doctype
//! - tag inference (omitted start and end tags)

mod helpers;
mod markup;
mod meta;
mod raw_text;
mod reference;
mod tag;

use std::collections::HashMap;

use lorikeet_common::Logger;
use strum_macros::Display;

use crate::callbacks::Callbacks;
use crate::config::ParserConfig;
use crate::context::ParseContext;
use crate::entity::DtdDefinitions;
use crate::error::ParseError;
use crate::marked_section::{MarkedSections, SectionClose};
use crate::resolver::Resolver;
use crate::source::Source;

use helpers::{ElementDef, GenEntity};

/// An SGML/HTML document parser.
///
/// A parser holds only configuration; every call to [`parse`](Self::parse)
/// starts from scratch, so one parser can be reused for many documents.
///
/// # Example
///
/// ```
/// use lorikeet_common::CollectingLogger;
/// use lorikeet_sgml::{Event, EventRecorder, NullResolver, ParserConfig, SgmlParser, Source};
///
/// let mut events = EventRecorder::new();
/// let mut logger = CollectingLogger::new();
/// SgmlParser::new(ParserConfig::default())
///     .parse(Source::from_text("<p>caf&eacute;</p>"), &mut events, &mut NullResolver, &mut logger)
///     .unwrap();
/// assert_eq!(events.text(), "café");
/// assert_eq!(logger.error_count(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SgmlParser {
    config: ParserConfig,
}

impl SgmlParser {
    /// A parser with the given configuration.
    #[must_use]
    pub const fn new(config: ParserConfig) -> Self {
        Self { config }
    }

    /// The configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse one document, emitting events to `callbacks` and problems to
    /// `logger`.
    ///
    /// Reaching the end of input is not an error. Recoverable problems are
    /// only logged.
    ///
    /// # Errors
    ///
    /// - [`ParseError::Input`] if the byte stream fails
    /// - [`ParseError::Unimplemented`] if the document uses a construct whose
    ///   semantics are not supported
    /// - [`ParseError::Fatal`] on the first error when `die_on_first_error` is
    ///   set
    pub fn parse(
        &self,
        source: Source<'_>,
        callbacks: &mut dyn Callbacks,
        resolver: &mut dyn Resolver,
        logger: &mut dyn Logger,
    ) -> Result<(), ParseError> {
        let ctx = ParseContext::new(source, &self.config, resolver, logger)?;
        BodyParser::new(ctx, callbacks).run()
    }
}

/// States of the body parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum BodyState {
    /// Character data.
    Pcdata,
    /// After `<`.
    TagOpen,
    /// After `</`.
    EndTagOpen,
    /// After `<!`.
    MarkupDeclarationOpen,
    /// After `<?`.
    ProcessingInstruction,
    /// After `&`.
    Reference,
    /// After `]`, looking for `]]>`.
    CloseBracket,
    /// End of input has been handled.
    Done,
}

pub(crate) struct BodyParser<'p, 'a> {
    ctx: ParseContext<'p, 'a>,
    callbacks: &'p mut dyn Callbacks,
    state: BodyState,
    /// Pending character data, delivered before any other event.
    text: String,
    /// No start or end tag has been seen yet.
    in_prolog: bool,
    seen_doctype: bool,
    /// Whether the `<` that opened the current tag came from the byte stream.
    tag_from_real_input: bool,
    /// Entities declared in the doctype's internal subset.
    doctype_def: DtdDefinitions,
    entity_cache: HashMap<String, GenEntity>,
    element_cache: HashMap<String, ElementDef>,
    marked_sections: MarkedSections,
    artificial_script_executions: usize,
}

impl<'p, 'a> BodyParser<'p, 'a> {
    pub(crate) fn new(ctx: ParseContext<'p, 'a>, callbacks: &'p mut dyn Callbacks) -> Self {
        let doctype_def = DtdDefinitions::new(ctx.config.case_insensitive);
        Self {
            ctx,
            callbacks,
            state: BodyState::Pcdata,
            text: String::new(),
            in_prolog: true,
            seen_doctype: false,
            tag_from_real_input: true,
            doctype_def,
            entity_cache: HashMap::new(),
            element_cache: HashMap::new(),
            marked_sections: MarkedSections::default(),
            artificial_script_executions: 0,
        }
    }

    pub(crate) fn run(&mut self) -> Result<(), ParseError> {
        loop {
            match self.state {
                BodyState::Pcdata => self.handle_pcdata_state()?,
                BodyState::TagOpen => self.handle_tag_open_state()?,
                BodyState::EndTagOpen => self.handle_end_tag_open_state()?,
                BodyState::MarkupDeclarationOpen => self.handle_markup_declaration_open_state()?,
                BodyState::ProcessingInstruction => self.handle_processing_instruction_state()?,
                BodyState::Reference => self.handle_reference_state()?,
                BodyState::CloseBracket => self.handle_close_bracket_state()?,
                BodyState::Done => return Ok(()),
            }
        }
    }

    fn handle_pcdata_state(&mut self) -> Result<(), ParseError> {
        let real = self.ctx.input.next_char_is_real();
        match self.ctx.get()? {
            Some('<') => {
                self.tag_from_real_input = real;
                self.switch_to(BodyState::TagOpen);
            }
            Some('&') => self.switch_to(BodyState::Reference),
            Some(']') => self.switch_to(BodyState::CloseBracket),
            Some(c) => self.text.push(c),
            None => self.handle_end_of_input()?,
        }
        Ok(())
    }

    fn handle_end_of_input(&mut self) -> Result<(), ParseError> {
        self.flush_text();
        for _ in 0..self.marked_sections.abandon_all() {
            self.ctx.error("Unterminated marked section")?;
        }
        self.switch_to(BodyState::Done);
        Ok(())
    }

    /// After `<`.
    fn handle_tag_open_state(&mut self) -> Result<(), ParseError> {
        match self.ctx.get()? {
            Some('/') => self.switch_to(BodyState::EndTagOpen),
            Some('!') => self.switch_to(BodyState::MarkupDeclarationOpen),
            Some('?') => self.switch_to(BodyState::ProcessingInstruction),
            Some(c) if self.ctx.is_name_start(c) => {
                self.switch_to(BodyState::Pcdata);
                let name = self.ctx.read_name(c)?;
                self.start_tag(name)?;
            }
            // Only a name start character opens a tag. Anything else makes
            // the `<` plain text.
            Some(_) => {
                self.ctx.unget();
                self.text.push('<');
                self.switch_to(BodyState::Pcdata);
            }
            None => {
                self.text.push('<');
                self.switch_to(BodyState::Pcdata);
            }
        }
        Ok(())
    }

    /// After `</`.
    fn handle_end_tag_open_state(&mut self) -> Result<(), ParseError> {
        self.switch_to(BodyState::Pcdata);
        match self.ctx.get()? {
            Some('>') => self.ctx.error_adj("Empty end tag", 3),
            Some(c) if self.ctx.is_name_start(c) => {
                let name = self.ctx.read_name(c)?;
                self.end_tag(&name)
            }
            Some(_) => {
                self.ctx.unget();
                self.text.push_str("</");
                Ok(())
            }
            None => {
                self.text.push_str("</");
                Ok(())
            }
        }
    }

    /// After `<?`.
    fn handle_processing_instruction_state(&mut self) -> Result<(), ParseError> {
        self.switch_to(BodyState::Pcdata);
        if let Some(text) = self.ctx.processing_instruction()? {
            self.flush_text();
            self.callbacks.proc_instr(&text);
        }
        Ok(())
    }

    /// After `]`. Only `]]>` is significant.
    fn handle_close_bracket_state(&mut self) -> Result<(), ParseError> {
        self.switch_to(BodyState::Pcdata);
        if !self.ctx.next_is(']')? {
            self.text.push(']');
            return Ok(());
        }
        self.ctx.skip()?;
        if !self.ctx.next_is('>')? {
            // The second `]` may itself start a `]]>`.
            self.ctx.unget();
            self.text.push(']');
            return Ok(());
        }
        self.ctx.skip()?;

        match self.marked_sections.close(self.ctx.level()) {
            SectionClose::Closed => Ok(()),
            SectionClose::ClosedAcrossEntities => self
                .ctx
                .error("Marked section ended in a different entity than it started"),
            SectionClose::NotOpen => {
                self.text.push_str("]]>");
                self.ctx
                    .error_adj("Marked section end outside of marked section", 3)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use lorikeet_common::CollectingLogger;

    use super::*;
    use crate::callbacks::{Attr, Event, EventRecorder};
    use crate::resolver::NullResolver;

    fn parse(input: &str) -> (Vec<Event>, CollectingLogger) {
        parse_with(input, ParserConfig::default())
    }

    fn parse_with(input: &str, config: ParserConfig) -> (Vec<Event>, CollectingLogger) {
        let mut recorder = EventRecorder::new();
        let mut logger = CollectingLogger::new();
        SgmlParser::new(config)
            .parse(Source::from_text(input), &mut recorder, &mut NullResolver, &mut logger)
            .unwrap();
        (recorder.events, logger)
    }

    fn text(text: &str) -> Event {
        Event::Text {
            text: text.to_string(),
        }
    }

    #[test]
    fn test_plain_text() {
        let (events, logger) = parse("hello world");
        assert_eq!(events, vec![text("hello world")]);
        assert!(logger.diagnostics.is_empty());
    }

    #[test]
    fn test_simple_element() {
        let (events, _) = parse("<p>x</p>");
        assert_eq!(
            events,
            vec![
                Event::ElemBegin {
                    name: "p".to_string(),
                    attrs: vec![]
                },
                text("x"),
                Event::ElemEnd {
                    name: "p".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_invalid_tag_start_is_text() {
        let (events, logger) = parse("<1> < a");
        assert_eq!(events, vec![text("<1> < a")]);
        assert!(logger.diagnostics.is_empty());
    }

    #[test]
    fn test_less_than_sequence() {
        let (events, _) = parse("<<b>");
        assert_eq!(events[0], text("<"));
        assert!(matches!(&events[1], Event::ElemBegin { name, .. } if name == "b"));
    }

    #[test]
    fn test_empty_end_tag() {
        let (events, logger) = parse("a</>b");
        assert_eq!(events, vec![text("ab")]);
        assert_eq!(logger.messages(), vec!["Empty end tag"]);
    }

    #[test]
    fn test_end_tag_open_without_name_is_text() {
        let (events, logger) = parse("a</ b");
        assert_eq!(events, vec![text("a</ b")]);
        assert!(logger.diagnostics.is_empty());
    }

    #[test]
    fn test_stray_marked_section_end_is_kept() {
        let (events, logger) = parse("a]]>b");
        assert_eq!(events, vec![text("a]]>b")]);
        assert_eq!(
            logger.messages(),
            vec!["Marked section end outside of marked section"]
        );
    }

    #[test]
    fn test_brackets_without_close() {
        let (events, logger) = parse("x[0]] ]]]>");
        assert_eq!(events, vec![text("x[0]] ]]]>")]);
        assert_eq!(logger.error_count(), 1);
    }

    #[test]
    fn test_processing_instruction() {
        let (events, _) = parse("a<?php echo 1 ?>b");
        assert_eq!(
            events,
            vec![
                text("a"),
                Event::ProcInstr {
                    text: "php echo 1 ?".to_string()
                },
                text("b"),
            ]
        );
    }

    #[test]
    fn test_include_marked_section() {
        let (events, logger) = parse("<![ INCLUDE [<b>x</b>]]>");
        assert_eq!(events.len(), 3);
        assert!(logger.diagnostics.is_empty(), "{:?}", logger.messages());
    }

    #[test]
    fn test_unterminated_marked_section() {
        let (_, logger) = parse("<![[ one <![TEMP[ two");
        assert_eq!(
            logger.messages(),
            vec!["Unterminated marked section", "Unterminated marked section"]
        );
    }

    #[test]
    fn test_cdata_marked_section_is_unimplemented() {
        let mut recorder = EventRecorder::new();
        let mut logger = CollectingLogger::new();
        let result = SgmlParser::default().parse(
            Source::from_text("<![CDATA[ <x> ]]>"),
            &mut recorder,
            &mut NullResolver,
            &mut logger,
        );
        assert!(matches!(result, Err(ParseError::Unimplemented("CDATA marked sections"))));
    }

    #[test]
    fn test_attributes_reach_callback_in_order() {
        let (events, _) = parse(r#"<a href="x" id=y checked>"#);
        assert_eq!(
            events,
            vec![Event::ElemBegin {
                name: "a".to_string(),
                attrs: vec![
                    Attr::new("href", "x"),
                    Attr::new("id", "y"),
                    Attr::new("checked", ""),
                ],
            }]
        );
    }

    #[test]
    fn test_die_on_first_error() {
        let config = ParserConfig {
            die_on_first_error: true,
            ..ParserConfig::default()
        };
        let mut recorder = EventRecorder::new();
        let mut logger = CollectingLogger::new();
        let result = SgmlParser::new(config).parse(
            Source::from_text("a&bogus;b"),
            &mut recorder,
            &mut NullResolver,
            &mut logger,
        );
        assert!(matches!(result, Err(ParseError::Fatal(_))));
        assert!(recorder.events.is_empty());
    }
}
