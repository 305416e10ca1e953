//! Character references and general entity references.
//!
//! `&#NNN;` and `&#xHHH;` decode to one character. Values that are not
//! Unicode scalar values, including surrogates and accumulator overflow, are
//! reported and become U+FFFD. `&name;` expands a general entity. An
//! undefined name is reported and the reference is kept as text, with the `;`
//! only if one was written.

use super::helpers::GenEntity;
use super::{BodyParser, BodyState};
use crate::entity::EntityType;
use crate::error::ParseError;
use crate::input::{EntityKind, InputBuffer, default_transcoder, transcoder_for};

/// Where a reference occurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ReferenceContext {
    Content,
    AttributeValue,
}

impl BodyParser<'_, '_> {
    /// After `&` in content.
    pub(super) fn handle_reference_state(&mut self) -> Result<(), ParseError> {
        self.switch_to(BodyState::Pcdata);
        match self.ctx.peek()? {
            Some('#') => {
                self.ctx.skip()?;
                let text = self.character_reference()?;
                self.text.push_str(&text);
                Ok(())
            }
            Some(c) if self.ctx.is_name_start(c) => self.entity_reference_in_content(),
            _ => {
                self.text.push('&');
                Ok(())
            }
        }
    }

    /// After `&` in an attribute value. The expansion is appended to `value`.
    pub(super) fn reference_in_attribute(&mut self, value: &mut String) -> Result<(), ParseError> {
        match self.ctx.peek()? {
            Some('#') => {
                self.ctx.skip()?;
                let text = self.character_reference()?;
                value.push_str(&text);
                Ok(())
            }
            Some(c) if self.ctx.is_name_start(c) => {
                let (name, terminated) = self.reference_name()?;
                match self.general_entity(&name) {
                    GenEntity::Undefined => {
                        self.undefined_entity(&name, terminated, ReferenceContext::AttributeValue, value)
                    }
                    GenEntity::SimpleText(text) | GenEntity::Parsed { text, .. } => {
                        value.push_str(&text);
                        Ok(())
                    }
                    GenEntity::ProcInstr(_) => self.ctx.error(format!(
                        "Processing instruction entity '&{name};' not allowed in attribute value"
                    )),
                    GenEntity::External { .. } => self.ctx.error(format!(
                        "External entity '&{name};' not allowed in attribute value"
                    )),
                }
            }
            _ => {
                value.push('&');
                Ok(())
            }
        }
    }

    /// After `&#`. Returns the text the reference stands for.
    fn character_reference(&mut self) -> Result<String, ParseError> {
        let hex = matches!(self.ctx.peek()?, Some('x' | 'X'));
        let marker = if hex { self.ctx.get()? } else { None };
        let radix = if hex { 16 } else { 10 };

        let mut digits = String::new();
        let mut value: Option<u32> = Some(0);
        while let Some(c) = self.ctx.peek()? {
            let Some(digit) = c.to_digit(radix) else {
                break;
            };
            self.ctx.skip()?;
            digits.push(c);
            value = value
                .and_then(|v| v.checked_mul(radix))
                .and_then(|v| v.checked_add(digit));
        }

        if digits.is_empty() {
            let mut literal = String::from("&#");
            literal.extend(marker);
            self.ctx.error("Character reference without digits")?;
            return Ok(literal);
        }
        let terminated = self.ctx.eat(';')?;

        if let Some(c) = value.and_then(char::from_u32) {
            return Ok(c.to_string());
        }
        let written = format!(
            "&#{}{digits}{}",
            marker.map(String::from).unwrap_or_default(),
            if terminated { ";" } else { "" }
        );
        let adjust = written.chars().count() as u64;
        self.ctx
            .error_adj(format!("Invalid character reference '{written}'"), adjust)?;
        Ok('\u{FFFD}'.to_string())
    }

    /// Read an entity name and the optional `;` after it.
    fn reference_name(&mut self) -> Result<(String, bool), ParseError> {
        let Some(first) = self.ctx.get()? else {
            return Ok((String::new(), false));
        };
        let name = self.ctx.read_name(first)?;
        let terminated = self.ctx.eat(';')?;
        Ok((name, terminated))
    }

    fn undefined_entity(
        &mut self,
        name: &str,
        terminated: bool,
        context: ReferenceContext,
        out: &mut String,
    ) -> Result<(), ParseError> {
        let literal = format!("&{name}{}", if terminated { ";" } else { "" });
        out.push_str(&literal);
        let adjust = literal.chars().count() as u64;
        let message = match context {
            ReferenceContext::Content => format!("Undefined entity '&{name};'"),
            ReferenceContext::AttributeValue => {
                format!("Undefined entity '&{name};' in attribute value")
            }
        };
        self.ctx.error_adj(message, adjust)
    }

    fn entity_reference_in_content(&mut self) -> Result<(), ParseError> {
        let (name, terminated) = self.reference_name()?;
        match self.general_entity(&name) {
            GenEntity::Undefined => {
                let mut literal = String::new();
                self.undefined_entity(&name, terminated, ReferenceContext::Content, &mut literal)?;
                self.text.push_str(&literal);
                Ok(())
            }
            GenEntity::SimpleText(text) => {
                self.text.push_str(&text);
                Ok(())
            }
            GenEntity::Parsed { name, text } => self.push_general_entity(&name, &text),
            GenEntity::ProcInstr(text) => {
                self.flush_text();
                self.callbacks.proc_instr(&text);
                Ok(())
            }
            GenEntity::External {
                name,
                entity_type,
                public_ident,
                system_ident,
            } => {
                let Some(text) =
                    self.fetch_external_entity(&name, public_ident.as_deref(), system_ident.as_deref())?
                else {
                    return Ok(());
                };
                match entity_type {
                    EntityType::Cdata | EntityType::Sdata => {
                        self.text.push_str(&text);
                        Ok(())
                    }
                    EntityType::ProcessingInstruction => {
                        self.flush_text();
                        self.callbacks.proc_instr(&text);
                        Ok(())
                    }
                    EntityType::Regular => self.push_general_entity(&name, &text),
                }
            }
        }
    }

    /// Continue parsing inside the replacement text of `name`.
    fn push_general_entity(&mut self, name: &str, text: &str) -> Result<(), ParseError> {
        if self.ctx.input.is_open(name, EntityKind::General) {
            return self
                .ctx
                .error(format!("Recursive reference to entity '&{name};'"));
        }
        self.ctx
            .input
            .push_entity(name, EntityKind::General, text, true);
        Ok(())
    }

    /// Resolve and decode an external entity. Returns `None` after reporting
    /// a failure.
    fn fetch_external_entity(
        &mut self,
        name: &str,
        public_ident: Option<&str>,
        system_ident: Option<&str>,
    ) -> Result<Option<String>, ParseError> {
        let resolved = match self.ctx.resolver.resolve(
            public_ident.unwrap_or_default(),
            system_ident.unwrap_or_default(),
            &self.ctx.base_uri,
        ) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.ctx
                    .error(format!("Failed to resolve external entity '{name}': {e}"))?;
                return Ok(None);
            }
        };

        let transcoder = if resolved.charenc.is_empty() {
            default_transcoder()
        } else {
            transcoder_for(&resolved.charenc).unwrap_or_else(|_| default_transcoder())
        };
        let mut buffer = InputBuffer::new(resolved.byte_stream, transcoder);
        let text = buffer.read_to_string()?;
        if buffer.has_transcode_issues() {
            self.ctx.error(format!(
                "Invalid byte sequence in external entity '{name}' ({})",
                resolved.resolved_uri
            ))?;
        }
        Ok(Some(text))
    }
}
