//! `script` and `style` content.
//!
//! Content runs up to the first `</` followed by the element's own name
//! (ASCII case-insensitively) and a character that cannot continue a name.
//! Nothing in between is markup.

use super::BodyParser;
use crate::callbacks::{Attr, DocWriter};
use crate::error::ParseError;
use crate::names::is_space;

impl BodyParser<'_, '_> {
    pub(super) fn raw_text_element(
        &mut self,
        name: &str,
        attrs: &[Attr],
        is_script: bool,
    ) -> Result<(), ParseError> {
        let mut content = String::new();
        let mut terminated = false;
        while let Some(c) = self.ctx.get()? {
            if c == '<' && self.ctx.eat('/')? {
                if self.match_raw_text_end_tag(name, &mut content)? {
                    terminated = true;
                    break;
                }
            } else {
                content.push(c);
            }
        }
        if !terminated {
            let kind = if is_script { "script" } else { "style" };
            self.ctx.error(format!("Unterminated {kind} element"))?;
        }

        if is_script {
            self.run_script(attrs, &content)
        } else {
            self.callbacks.style(attrs, &content);
            Ok(())
        }
    }

    /// After `</` inside raw text. On a match the end tag is consumed and
    /// `true` returned; otherwise the characters read so far are appended to
    /// `content`.
    fn match_raw_text_end_tag(&mut self, name: &str, content: &mut String) -> Result<bool, ParseError> {
        let mut seen = String::from("</");
        for expected in name.chars() {
            match self.ctx.peek()? {
                Some(c) if c.eq_ignore_ascii_case(&expected) => {
                    self.ctx.skip()?;
                    seen.push(c);
                }
                _ => {
                    content.push_str(&seen);
                    return Ok(false);
                }
            }
        }
        if matches!(self.ctx.peek()?, Some(c) if self.ctx.is_name_char(c)) {
            content.push_str(&seen);
            return Ok(false);
        }

        let mut garbage_reported = false;
        loop {
            match self.ctx.get()? {
                Some('>') | None => return Ok(true),
                Some(c) if is_space(c) => {}
                Some(_) => {
                    if !garbage_reported {
                        garbage_reported = true;
                        self.ctx.error("Garbage in end tag")?;
                    }
                }
            }
        }
    }

    /// Hand a script to the callback and splice its `document.write` output
    /// in after the element.
    ///
    /// A script whose start tag came from injected input counts towards the
    /// artificial execution limit; one from the byte stream resets it.
    fn run_script(&mut self, attrs: &[Attr], content: &str) -> Result<(), ParseError> {
        if self.tag_from_real_input {
            self.artificial_script_executions = 0;
        } else {
            self.artificial_script_executions += 1;
            if self.artificial_script_executions > self.ctx.config.max_artificial_script_executions {
                return self
                    .ctx
                    .error("Too many consecutive script executions from injected input");
            }
        }

        let mut doc_writer = DocWriter::default();
        self.callbacks.script(attrs, content, &mut doc_writer);
        let output = doc_writer.take();
        if !output.is_empty() {
            self.ctx.input.inject(&output);
        }
        Ok(())
    }
}
