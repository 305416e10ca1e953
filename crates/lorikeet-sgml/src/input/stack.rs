//! Entity replacement sources layered over the input buffer.
//!
//! Expanding an entity pushes its replacement text as a new source. A source
//! is either the replacement text of a named entity or anonymous injected text.
//! A *seamless* source is popped transparently when exhausted and reading
//! continues in the enclosing source. A non-seamless source reports end of
//! input when exhausted and stays on the stack until the caller pops it, so
//! that no token can silently run from one source into the next.

use strum_macros::Display;

use super::{InputBuffer, LineLoc, TranscodeIssue, Transcoder};
use crate::error::InputError;

/// Namespace of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EntityKind {
    /// `&name;` in document content.
    #[strum(serialize = "general")]
    General,
    /// `%name;` in declarations.
    #[strum(serialize = "parameter")]
    Parameter,
}

#[derive(Debug)]
enum Origin {
    Entity { name: String, kind: EntityKind },
    Injected,
}

#[derive(Debug)]
struct EntitySource {
    origin: Origin,
    text: Vec<char>,
    pos: usize,
    seamless: bool,
}

impl EntitySource {
    const fn is_exhausted(&self) -> bool {
        self.pos >= self.text.len()
    }
}

#[derive(Clone, Copy)]
enum Taken {
    Base,
    Source,
}

/// The parser's view of the input: the document buffer plus expanded entities.
pub struct InputStack<'a> {
    base: InputBuffer<'a>,
    sources: Vec<EntitySource>,
    last: Option<Taken>,
}

impl<'a> InputStack<'a> {
    /// Wrap the document buffer.
    #[must_use]
    pub const fn new(base: InputBuffer<'a>) -> Self {
        Self {
            base,
            sources: Vec::new(),
            last: None,
        }
    }

    /// Look at the next character without consuming it.
    ///
    /// Returns `None` at end of input, and also at the end of a non-seamless
    /// source that has not been popped yet.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] if the byte stream fails.
    pub fn peek(&mut self) -> Result<Option<char>, InputError> {
        for source in self.sources.iter().rev() {
            if !source.is_exhausted() {
                return Ok(Some(source.text[source.pos]));
            }
            if !source.seamless {
                return Ok(None);
            }
        }
        self.base.peek()
    }

    /// Consume the next character. See [`peek`](Self::peek) for when `None`
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] if the byte stream fails.
    pub fn get(&mut self) -> Result<Option<char>, InputError> {
        while let Some(top) = self.sources.last_mut() {
            if !top.is_exhausted() {
                let c = top.text[top.pos];
                top.pos += 1;
                self.last = Some(Taken::Source);
                return Ok(Some(c));
            }
            if !top.seamless {
                self.last = None;
                return Ok(None);
            }
            let _ = self.sources.pop();
        }
        let c = self.base.get()?;
        self.last = c.map(|_| Taken::Base);
        Ok(c)
    }

    /// Consume a character the caller has just peeked.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] if the byte stream fails.
    ///
    /// # Panics
    ///
    /// Panics if there is nothing to consume.
    pub fn drop(&mut self) -> Result<(), InputError> {
        match self.get()? {
            Some(_) => Ok(()),
            None => panic!("InputStack::drop() called at end of input"),
        }
    }

    /// Give back the character consumed by the immediately preceding `get` or
    /// `drop`.
    ///
    /// # Panics
    ///
    /// Panics if the previous mutating operation was not a successful `get` or
    /// `drop`.
    pub fn unget(&mut self) {
        match self.last.take() {
            Some(Taken::Source) => {
                if let Some(top) = self.sources.last_mut() {
                    top.pos -= 1;
                }
            }
            Some(Taken::Base) => self.base.unget(),
            None => panic!("InputStack::unget() must directly follow get() or drop()"),
        }
    }

    /// Append characters to `buffer` until `delimiter`, `max_count`
    /// characters, or end of the current source. Returns how many were copied.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] if the byte stream fails.
    pub fn read_until(
        &mut self,
        buffer: &mut String,
        max_count: usize,
        delimiter: char,
    ) -> Result<usize, InputError> {
        let mut count = 0;
        loop {
            let Some(top) = self.sources.last_mut() else {
                count += self.base.read_until(buffer, max_count - count, delimiter)?;
                break;
            };
            if top.is_exhausted() {
                if !top.seamless {
                    break;
                }
                let _ = self.sources.pop();
                continue;
            }
            let available = &top.text[top.pos..];
            let span = available
                .iter()
                .take(max_count - count)
                .position(|&c| c == delimiter)
                .unwrap_or_else(|| available.len().min(max_count - count));
            buffer.extend(&available[..span]);
            top.pos += span;
            count += span;
            if span < available.len() || count == max_count {
                break;
            }
        }
        self.last = None;
        Ok(count)
    }

    /// Splice text in at the read position. At document level the text goes
    /// into the buffer's injection layer; inside an entity it becomes an
    /// anonymous seamless source.
    pub fn inject(&mut self, text: &str) {
        self.last = None;
        if self.sources.is_empty() {
            self.base.inject(text.chars());
        } else if !text.is_empty() {
            self.sources.push(EntitySource {
                origin: Origin::Injected,
                text: text.chars().collect(),
                pos: 0,
                seamless: true,
            });
        }
    }

    /// Push the replacement text of entity `name` as a new source.
    pub fn push_entity(&mut self, name: &str, kind: EntityKind, text: &str, seamless: bool) {
        self.last = None;
        self.sources.push(EntitySource {
            origin: Origin::Entity {
                name: name.to_string(),
                kind,
            },
            text: text.chars().collect(),
            pos: 0,
            seamless,
        });
    }

    /// Pop the innermost source.
    ///
    /// # Panics
    ///
    /// Panics if no entity source is open.
    pub fn pop_source(&mut self) {
        self.last = None;
        assert!(
            self.sources.pop().is_some(),
            "InputStack::pop_source() with no open source"
        );
    }

    /// Pop sources until no more than `level` named entities are open. Their
    /// unread text is discarded.
    pub fn pop_to_level(&mut self, level: usize) {
        while self.level() > level {
            self.pop_source();
        }
    }

    /// Whether reading stopped at the end of a non-seamless source (as opposed
    /// to the end of the document).
    #[must_use]
    pub fn at_source_boundary(&self) -> bool {
        self.sources
            .last()
            .is_some_and(|top| top.is_exhausted() && !top.seamless)
    }

    /// Entity replacement level: the number of named entities currently open.
    #[must_use]
    pub fn level(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s.origin, Origin::Entity { .. }))
            .count()
    }

    /// Whether entity `name` of the given kind is currently being expanded.
    #[must_use]
    pub fn is_open(&self, name: &str, kind: EntityKind) -> bool {
        self.sources.iter().any(|s| match &s.origin {
            Origin::Entity { name: n, kind: k } => n == name && *k == kind,
            Origin::Injected => false,
        })
    }

    /// Whether the next character comes from live decoding of the byte stream.
    #[must_use]
    pub fn next_char_is_real(&self) -> bool {
        for source in self.sources.iter().rev() {
            if !source.is_exhausted() || !source.seamless {
                return false;
            }
        }
        self.base.next_char_is_real()
    }

    /// Position in the document.
    #[must_use]
    pub const fn get_line_loc(&self) -> LineLoc {
        self.base.get_line_loc()
    }

    /// Name of the active character encoding.
    #[must_use]
    pub fn charenc(&self) -> &'static str {
        self.base.charenc()
    }

    /// Replace the document buffer's transcoder.
    pub fn switch_transcoder(&mut self, transcoder: Box<dyn Transcoder>) {
        self.last = None;
        self.base.switch_transcoder(transcoder);
    }

    /// Take pending malformed-input notices from the document buffer.
    pub fn take_transcode_issues(&mut self) -> Vec<TranscodeIssue> {
        self.base.take_transcode_issues()
    }

    /// Whether malformed-input notices are waiting.
    #[must_use]
    pub fn has_transcode_issues(&self) -> bool {
        self.base.has_transcode_issues()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::transcoder_for;

    fn stack(text: &str) -> InputStack<'_> {
        InputStack::new(InputBuffer::new(
            Box::new(text.as_bytes()),
            transcoder_for("utf-8").unwrap(),
        ))
    }

    fn drain(input: &mut InputStack<'_>) -> String {
        let mut out = String::new();
        while let Some(c) = input.get().unwrap() {
            out.push(c);
        }
        out
    }

    #[test]
    fn test_seamless_source_continues_into_base() {
        let mut input = stack("world");
        input.push_entity("greet", EntityKind::General, "hello ", true);
        assert_eq!(input.level(), 1);
        assert!(!input.next_char_is_real());
        assert_eq!(drain(&mut input), "hello world");
        assert_eq!(input.level(), 0);
    }

    #[test]
    fn test_non_seamless_source_stops_at_boundary() {
        let mut input = stack("rest");
        input.push_entity("pe", EntityKind::Parameter, "ab", false);
        assert_eq!(drain(&mut input), "ab");
        assert!(input.at_source_boundary());
        assert_eq!(input.peek().unwrap(), None);
        input.pop_source();
        assert!(!input.at_source_boundary());
        assert_eq!(drain(&mut input), "rest");
    }

    #[test]
    fn test_unget_inside_source() {
        let mut input = stack("");
        input.push_entity("e", EntityKind::General, "xy", false);
        assert_eq!(input.get().unwrap(), Some('x'));
        input.unget();
        assert_eq!(input.get().unwrap(), Some('x'));
        assert_eq!(input.get().unwrap(), Some('y'));
        assert_eq!(input.peek().unwrap(), None);
        input.unget();
        assert_eq!(input.get().unwrap(), Some('y'));
    }

    #[test]
    fn test_unget_after_popping_seamless_source() {
        let mut input = stack("b");
        input.push_entity("e", EntityKind::General, "a", true);
        assert_eq!(input.get().unwrap(), Some('a'));
        assert_eq!(input.get().unwrap(), Some('b'));
        input.unget();
        assert_eq!(input.get().unwrap(), Some('b'));
    }

    #[test]
    fn test_open_entity_tracking() {
        let mut input = stack("");
        input.push_entity("a", EntityKind::Parameter, "x", false);
        assert!(input.is_open("a", EntityKind::Parameter));
        assert!(!input.is_open("a", EntityKind::General));
        input.pop_source();
        assert!(!input.is_open("a", EntityKind::Parameter));
    }

    #[test]
    fn test_pop_to_level_discards_unread_text() {
        let mut input = stack("base");
        input.push_entity("a", EntityKind::Parameter, "x", false);
        input.push_entity("b", EntityKind::Parameter, "yz", false);
        assert_eq!(input.get().unwrap(), Some('y'));
        input.pop_to_level(0);
        assert_eq!(input.level(), 0);
        assert_eq!(drain(&mut input), "base");
    }

    #[test]
    fn test_injected_source_does_not_count_as_level() {
        let mut input = stack("z");
        input.push_entity("e", EntityKind::General, "ab", true);
        assert_eq!(input.get().unwrap(), Some('a'));
        input.inject("X");
        assert_eq!(input.level(), 1);
        assert_eq!(drain(&mut input), "Xbz");
    }

    #[test]
    fn test_read_until_stops_at_non_seamless_end() {
        let mut input = stack("tail>");
        input.push_entity("pe", EntityKind::Parameter, "head", false);
        let mut out = String::new();
        assert_eq!(input.read_until(&mut out, 100, '>').unwrap(), 4);
        assert_eq!(out, "head");
        input.pop_source();
        assert_eq!(input.read_until(&mut out, 100, '>').unwrap(), 4);
        assert_eq!(out, "headtail");
    }

    #[test]
    fn test_read_until_crosses_seamless_end() {
        let mut input = stack("tail>");
        input.push_entity("e", EntityKind::General, "head", true);
        let mut out = String::new();
        assert_eq!(input.read_until(&mut out, 100, '>').unwrap(), 8);
        assert_eq!(out, "headtail");
    }
}
