//! Markup declarations in the document body: comments, the document type
//! declaration and marked sections.

use super::{BodyParser, BodyState};
use crate::dtd::{DtdParser, SubsetKind};
use crate::error::ParseError;
use crate::marked_section::MarkedSectionKind;

impl BodyParser<'_, '_> {
    /// After `<!`.
    pub(super) fn handle_markup_declaration_open_state(&mut self) -> Result<(), ParseError> {
        self.switch_to(BodyState::Pcdata);
        match self.ctx.peek()? {
            Some('-') => {
                self.ctx.skip()?;
                if self.ctx.eat('-')? {
                    self.comment()
                } else {
                    self.text.push_str("<!-");
                    Ok(())
                }
            }
            Some('[') => {
                self.ctx.skip()?;
                self.marked_section_start()
            }
            // `<!>` is an empty comment declaration.
            Some('>') => self.ctx.skip(),
            Some(c) if self.ctx.is_name_start(c) => {
                self.ctx.skip()?;
                let keyword = self.ctx.read_name(c)?;
                if self.ctx.keyword_eq(&keyword, "DOCTYPE") {
                    self.doctype_declaration()
                } else {
                    self.ctx
                        .error_adj("Declaration not allowed in document body", keyword.len() as u64 + 2)?;
                    self.ctx.skip_declaration()
                }
            }
            _ => {
                self.text.push_str("<!");
                Ok(())
            }
        }
    }

    /// After `<!--`.
    fn comment(&mut self) -> Result<(), ParseError> {
        let text = self.ctx.comment_declaration()?;
        if self.ctx.config.report_comments {
            self.flush_text();
            self.callbacks.comment(&text);
        }
        Ok(())
    }

    /// After `<![`. Only sections whose content is parsed normally are
    /// supported; their content simply continues in the body.
    fn marked_section_start(&mut self) -> Result<(), ParseError> {
        let level = self.ctx.level();
        let mut keywords = Vec::new();
        loop {
            let _ = self.ctx.skip_space()?;
            match self.ctx.peek()? {
                Some(c) if self.ctx.is_name_start(c) => {
                    self.ctx.skip()?;
                    keywords.push(self.ctx.read_name(c)?);
                }
                _ => break,
            }
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

    /// After `<!DOCTYPE`.
    fn doctype_declaration(&mut self) -> Result<(), ParseError> {
        if self.seen_doctype {
            self.ctx.error("Duplicate DOCTYPE declaration")?;
            return self.ctx.skip_declaration();
        }
        if !self.in_prolog {
            self.ctx.error("DOCTYPE declaration after the first element")?;
            return self.ctx.skip_declaration();
        }
        self.seen_doctype = true;

        let _ = self.ctx.skip_space()?;
        let name = match self.ctx.peek()? {
            Some(c) if self.ctx.is_name_start(c) => {
                self.ctx.skip()?;
                self.ctx.read_name(c)?
            }
            _ => {
                self.ctx.error("Missing document type name")?;
                String::new()
            }
        };

        let _ = self.ctx.skip_space()?;
        let (public_ident, system_ident) = self.external_identifier()?;

        self.flush_text();
        self.callbacks
            .doctype_begin(&name, public_ident.as_deref(), system_ident.as_deref());

        let _ = self.ctx.skip_space()?;
        if self.ctx.eat('[')? {
            DtdParser::new(&mut self.ctx, &mut self.doctype_def, SubsetKind::Internal).run()?;
            // References seen before the subset may now resolve differently.
            self.entity_cache.clear();
        }

        let mut garbage_reported = false;
        loop {
            let _ = self.ctx.skip_space()?;
            match self.ctx.get()? {
                Some('>') => break,
                Some(_) => {
                    if !garbage_reported {
                        garbage_reported = true;
                        self.ctx.error("Garbage in DOCTYPE declaration")?;
                    }
                }
                None => {
                    self.ctx.error("Unterminated DOCTYPE declaration")?;
                    break;
                }
            }
        }
        self.callbacks.doctype_end();
        Ok(())
    }

    /// `PUBLIC "pubid" ["sysid"]` or `SYSTEM ["sysid"]`, if present.
    fn external_identifier(&mut self) -> Result<(Option<String>, Option<String>), ParseError> {
        let keyword = match self.ctx.peek()? {
            Some(c) if self.ctx.is_name_start(c) => {
                self.ctx.skip()?;
                self.ctx.read_name(c)?
            }
            _ => return Ok((None, None)),
        };

        let is_public = self.ctx.keyword_eq(&keyword, "PUBLIC");
        if !is_public && !self.ctx.keyword_eq(&keyword, "SYSTEM") {
            self.ctx
                .error(format!("Invalid keyword '{keyword}' in DOCTYPE declaration"))?;
            return Ok((None, None));
        }

        let mut public_ident = None;
        if is_public {
            let _ = self.ctx.skip_space()?;
            public_ident = self.optional_literal()?;
            if public_ident.is_none() {
                self.ctx.error("Missing public identifier in DOCTYPE declaration")?;
            }
        }
        let _ = self.ctx.skip_space()?;
        let system_ident = self.optional_literal()?;
        Ok((public_ident, system_ident))
    }

    fn optional_literal(&mut self) -> Result<Option<String>, ParseError> {
        if matches!(self.ctx.peek()?, Some('"' | '\'')) {
            self.ctx.quoted_literal()
        } else {
            Ok(None)
        }
    }
}
