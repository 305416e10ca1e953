//! Start and end tags.

use super::BodyParser;
use crate::callbacks::Attr;
use crate::error::ParseError;
use crate::names::is_space;

impl BodyParser<'_, '_> {
    /// Parse the rest of a start tag whose name has been read, then deliver
    /// it.
    pub(super) fn start_tag(&mut self, name: String) -> Result<(), ParseError> {
        let Some(attrs) = self.attributes()? else {
            return self.ctx.error("Unterminated start tag");
        };

        self.flush_text();
        self.in_prolog = false;
        if self.ctx.config.enable_meta_charenc_switching && name.eq_ignore_ascii_case("meta") {
            self.apply_meta_charset(&attrs);
        }

        let def = self.element_def(&name);
        if def.use_special_cdata_content_handler {
            self.raw_text_element(&name, &attrs, def.consider_content_as_script)
        } else {
            self.callbacks.elem_begin(&name, &attrs);
            Ok(())
        }
    }

    /// Read `name[=value]` pairs up to the end of the tag. Returns `None` if
    /// the input ends inside the tag.
    fn attributes(&mut self) -> Result<Option<Vec<Attr>>, ParseError> {
        let mut attrs: Vec<Attr> = Vec::new();
        let mut garbage_reported = false;
        loop {
            let _ = self.ctx.skip_space()?;
            match self.ctx.get()? {
                Some('>') => return Ok(Some(attrs)),
                Some('/') if self.ctx.config.html5_compat && self.ctx.next_is('>')? => {
                    self.ctx.skip()?;
                    return Ok(Some(attrs));
                }
                Some('<') => {
                    self.ctx.unget();
                    self.ctx.warn("Unclosed start tag")?;
                    return Ok(Some(attrs));
                }
                Some(c) if self.ctx.is_name_start(c) => {
                    let attr_name = self.ctx.read_name(c)?;
                    let _ = self.ctx.skip_space()?;
                    let value = if self.ctx.eat('=')? {
                        let _ = self.ctx.skip_space()?;
                        match self.attribute_value()? {
                            Some(value) => value,
                            None => return Ok(None),
                        }
                    } else {
                        String::new()
                    };
                    self.add_attribute(&mut attrs, attr_name, value)?;
                }
                Some(_) => {
                    if !garbage_reported {
                        garbage_reported = true;
                        self.ctx.error("Garbage in start tag")?;
                    }
                }
                None => return Ok(None),
            }
        }
    }

    /// A later attribute with the same name is reported and dropped.
    fn add_attribute(
        &mut self,
        attrs: &mut Vec<Attr>,
        name: String,
        value: String,
    ) -> Result<(), ParseError> {
        let key = self.ctx.fold(&name);
        if attrs.iter().any(|attr| self.ctx.fold(&attr.name) == key) {
            return self.ctx.error(format!("Duplicate attribute '{name}'"));
        }
        attrs.push(Attr { name, value });
        Ok(())
    }

    /// Read an attribute value after `=`. Quoted values expand references;
    /// bare values run to white space or the end of the tag.
    fn attribute_value(&mut self) -> Result<Option<String>, ParseError> {
        let mut value = String::new();
        if let Some(quote @ ('"' | '\'')) = self.ctx.peek()? {
            self.ctx.skip()?;
            loop {
                match self.ctx.get()? {
                    Some(c) if c == quote => return Ok(Some(value)),
                    Some('&') => self.reference_in_attribute(&mut value)?,
                    Some(c) => value.push(c),
                    None => return Ok(None),
                }
            }
        }

        while let Some(c) = self.ctx.peek()? {
            if is_space(c) || c == '>' || c == '<' {
                break;
            }
            self.ctx.skip()?;
            value.push(c);
        }
        // `<a href=x/>` closes the tag at `/>` in HTML5 mode.
        if self.ctx.config.html5_compat && value.ends_with('/') && self.ctx.next_is('>')? {
            let _ = value.pop();
        }
        Ok(Some(value))
    }

    /// Parse the rest of an end tag whose name has been read, then deliver
    /// it.
    pub(super) fn end_tag(&mut self, name: &str) -> Result<(), ParseError> {
        let mut garbage_reported = false;
        loop {
            match self.ctx.get()? {
                Some('>') => break,
                Some(c) if is_space(c) => {}
                Some(_) => {
                    if !garbage_reported {
                        garbage_reported = true;
                        self.ctx.error("Garbage in end tag")?;
                    }
                }
                None => return self.ctx.error("Unterminated end tag"),
            }
        }
        self.flush_text();
        self.in_prolog = false;
        self.callbacks.elem_end(name);
        Ok(())
    }
}
