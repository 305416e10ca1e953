//! Helpers shared by the declarations of a subset.
//!
//! Declaration space may contain white space, `--...--` comments and
//! parameter entity references. Words and literals stop at the characters that
//! are significant to declaration syntax and push back the one character of
//! lookahead they needed, so nothing past a delimiter is ever consumed.

use super::DtdParser;
use crate::entity::{EntityType, EntityValue};
use crate::error::ParseError;
use crate::input::EntityKind;
use crate::marked_section::MarkedSectionKind;
use crate::names::is_space;

// =============================================================================
// Declaration Dispatch
// =============================================================================

impl DtdParser<'_, '_, '_> {
    /// After `<!`.
    pub(super) fn markup_declaration(&mut self) -> Result<(), ParseError> {
        match self.ctx.peek()? {
            Some('-') => {
                self.ctx.skip()?;
                if self.ctx.eat('-')? {
                    let _ = self.ctx.comment_declaration()?;
                    Ok(())
                } else {
                    self.ctx.error("Invalid comment declaration")?;
                    self.ctx.skip_declaration()
                }
            }
            Some('[') => {
                self.ctx.skip()?;
                self.marked_section_start()
            }
            Some('>') => self.ctx.skip(),
            Some(c) if self.ctx.is_name_start(c) => {
                self.ctx.skip()?;
                let keyword = self.ctx.read_name(c)?;
                self.dispatch_declaration(&keyword)
            }
            _ => {
                self.ctx.error("Invalid markup declaration")?;
                self.ctx.skip_declaration()
            }
        }
    }

    fn dispatch_declaration(&mut self, keyword: &str) -> Result<(), ParseError> {
        if self.ctx.keyword_eq(keyword, "ENTITY") {
            self.entity_declaration()
        } else if self.ctx.keyword_eq(keyword, "ELEMENT") {
            Err(ParseError::Unimplemented("ELEMENT declarations"))
        } else if self.ctx.keyword_eq(keyword, "ATTLIST") {
            Err(ParseError::Unimplemented("ATTLIST declarations"))
        } else if self.ctx.keyword_eq(keyword, "NOTATION") {
            Err(ParseError::Unimplemented("NOTATION declarations"))
        } else {
            self.ctx
                .error(format!("Unknown declaration type '{keyword}'"))?;
            self.ctx.skip_declaration()
        }
    }

    /// After `<![`.
    fn marked_section_start(&mut self) -> Result<(), ParseError> {
        let level = self.ctx.level();
        let mut keywords = Vec::new();
        loop {
            let _ = self.skip_decl_space(level)?;
            let word = self.eat_decl_word()?;
            if word.is_empty() {
                break;
            }
            keywords.push(word);
        }
        if !self.ctx.eat('[')? {
            self.ctx.error("Invalid marked section declaration")?;
            return self.ctx.skip_declaration();
        }

        let (kind, unknown) = MarkedSectionKind::classify(&keywords, self.ctx.config.case_insensitive);
        for keyword in unknown {
            self.ctx
                .error(format!("Unknown marked section keyword '{keyword}'"))?;
        }
        kind.check_supported()?;
        self.marked_sections.open(level);
        Ok(())
    }
}

// =============================================================================
// Declaration Space
// =============================================================================

impl DtdParser<'_, '_, '_> {
    /// Skip white space, comments and parameter entity references inside a
    /// declaration that started at entity level `decl_level`. Returns whether
    /// anything was skipped.
    pub(super) fn skip_decl_space(&mut self, decl_level: usize) -> Result<bool, ParseError> {
        let mut skipped = false;
        loop {
            match self.ctx.get()? {
                Some(c) if is_space(c) => skipped = true,
                Some('-') => {
                    if !self.ctx.next_is('-')? {
                        self.ctx.unget();
                        return Ok(skipped);
                    }
                    self.ctx.skip()?;
                    skipped = true;
                    if !self.skip_decl_comment()? {
                        return Ok(skipped);
                    }
                }
                Some('%') => {
                    match self.ctx.peek()? {
                        Some(c) if self.ctx.is_name_start(c) => {}
                        _ => {
                            self.ctx.unget();
                            return Ok(skipped);
                        }
                    }
                    skipped = true;
                    self.parameter_reference(false)?;
                }
                Some(_) => {
                    self.ctx.unget();
                    return Ok(skipped);
                }
                None => {
                    if self.ctx.input.at_source_boundary() && self.ctx.level() > decl_level {
                        self.ctx.input.pop_source();
                        skipped = true;
                    } else {
                        return Ok(skipped);
                    }
                }
            }
        }
    }

    /// Skip a comment whose opening `--` has been consumed. Returns `false` if
    /// the input ended first.
    fn skip_decl_comment(&mut self) -> Result<bool, ParseError> {
        loop {
            match self.ctx.get()? {
                Some('-') => {
                    if self.ctx.eat('-')? {
                        return Ok(true);
                    }
                }
                Some(_) => {}
                None => {
                    self.ctx.error("Unterminated comment in declaration")?;
                    return Ok(false);
                }
            }
        }
    }

    /// Expand `%name;`. The `%` has been consumed and a name start character
    /// is next.
    pub(super) fn parameter_reference(&mut self, allow_proc_instr: bool) -> Result<(), ParseError> {
        let Some(first) = self.ctx.get()? else {
            return Ok(());
        };
        let name = self.ctx.read_name(first)?;
        if !self.ctx.eat(';')? && self.ctx.config.strict_references {
            self.ctx
                .warn(format!("Parameter entity reference '%{name}' not terminated by ';'"))?;
        }

        let Some(entity) = self.defs.parameter.get(&name).cloned() else {
            return self
                .ctx
                .error(format!("Undefined parameter entity '%{name};'"));
        };
        if self.ctx.input.is_open(&entity.name, EntityKind::Parameter) {
            return self
                .ctx
                .error(format!("Recursive reference to entity '%{name};'"));
        }
        if entity.entity_type == EntityType::ProcessingInstruction {
            if !allow_proc_instr {
                self.ctx.error(format!(
                    "Processing instruction entity '%{name};' not allowed here"
                ))?;
            }
            return Ok(());
        }
        match entity.value {
            EntityValue::Internal(text) => {
                self.ctx
                    .input
                    .push_entity(&entity.name, EntityKind::Parameter, &text, false);
                Ok(())
            }
            EntityValue::External { .. } => Err(ParseError::Unimplemented("External parameter entities")),
        }
    }
}

// =============================================================================
// Words and Literals
// =============================================================================

impl DtdParser<'_, '_, '_> {
    /// Read a bare word: everything up to white space, a quote, one of
    /// `[ ] < = > ?`, or the `--` that starts a comment.
    pub(super) fn eat_decl_word(&mut self) -> Result<String, ParseError> {
        let mut word = String::new();
        loop {
            match self.ctx.get()? {
                None => break,
                Some(c)
                    if is_space(c)
                        || matches!(c, '[' | ']' | '<' | '=' | '>' | '?' | '"' | '\'') =>
                {
                    self.ctx.unget();
                    break;
                }
                Some('-') if self.ctx.next_is('-')? => {
                    self.ctx.unget();
                    break;
                }
                Some(c) => word.push(c),
            }
        }
        Ok(word)
    }

    /// Read a quoted literal. The next character must be a quote. Returns
    /// `None` if the literal is unterminated.
    pub(super) fn eat_quoted_str(&mut self) -> Result<Option<String>, ParseError> {
        let Some(quote) = self.ctx.get()? else {
            return Ok(None);
        };
        let mut text = String::new();
        loop {
            match self.ctx.get()? {
                Some(c) if c == quote => return Ok(Some(text)),
                Some('%') => {
                    if matches!(self.ctx.peek()?, Some(c) if self.ctx.is_name_start(c)) {
                        return Err(ParseError::Unimplemented(
                            "Parameter entity references in literals",
                        ));
                    }
                    text.push('%');
                }
                Some(c) => text.push(c),
                None => {
                    self.ctx.error("Unterminated literal")?;
                    return Ok(None);
                }
            }
        }
    }

    /// Finish a declaration: skip declaration space and consume the closing
    /// `>`. Anything else before it is garbage, reported once.
    pub(super) fn end_decl(&mut self, decl_name: &str, decl_level: usize) -> Result<(), ParseError> {
        let mut garbage_reported = false;
        loop {
            let _ = self.skip_decl_space(decl_level)?;
            match self.ctx.get()? {
                Some('>') => break,
                Some(_) => {
                    if !garbage_reported {
                        garbage_reported = true;
                        self.ctx
                            .error(format!("Garbage in {decl_name} declaration"))?;
                    }
                }
                None => {
                    return self
                        .ctx
                        .error(format!("Unterminated {decl_name} declaration"));
                }
            }
        }
        if self.ctx.level() != decl_level {
            self.ctx
                .error("Declaration ended in a different entity than it started")?;
        }
        Ok(())
    }
}
