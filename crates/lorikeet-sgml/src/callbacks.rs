//! The structural event surface the parser emits to.
//!
//! The parser never branches on what a callback does; every method has a
//! no-op default so a consumer only overrides what it needs.

use serde::Serialize;

/// An attribute of a start tag, in source order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attr {
    /// Name as written.
    pub name: String,
    /// Value after entity expansion. Empty for an attribute without `=`.
    pub value: String,
}

impl Attr {
    /// Create an attribute.
    #[must_use]
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Sink for `document.write` output produced while a script runs.
///
/// Whatever is written is spliced into the input immediately after the
/// `</script>` end tag once the `script` callback returns.
#[derive(Debug, Default)]
pub struct DocWriter {
    buffer: String,
}

impl DocWriter {
    /// Queue `text` for insertion into the document.
    pub fn write(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Queue `text` followed by a line feed.
    pub fn writeln(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    pub(crate) fn take(&mut self) -> String {
        std::mem::take(&mut self.buffer)
    }
}

/// Receiver of parse events.
#[allow(unused_variables)]
pub trait Callbacks {
    /// A `<!DOCTYPE ...>` declaration starts. Its internal subset, if any, is
    /// processed between this call and [`doctype_end`](Self::doctype_end).
    fn doctype_begin(&mut self, name: &str, public_ident: Option<&str>, system_ident: Option<&str>) {}

    /// The doctype declaration is complete.
    fn doctype_end(&mut self) {}

    /// A start tag, with its attributes in source order.
    fn elem_begin(&mut self, name: &str, attrs: &[Attr]) {}

    /// An end tag.
    fn elem_end(&mut self, name: &str) {}

    /// A run of character data.
    fn text(&mut self, text: &str) {}

    /// A comment declaration, with all of its comments concatenated.
    fn comment(&mut self, text: &str) {}

    /// A processing instruction, without the `<?` and `>` delimiters.
    fn proc_instr(&mut self, text: &str) {}

    /// A `script` element. Text written to `doc_writer` is parsed next.
    fn script(&mut self, attrs: &[Attr], content: &str, doc_writer: &mut DocWriter) {}

    /// A `style` element.
    fn style(&mut self, attrs: &[Attr], content: &str) {}
}

/// One recorded callback invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// `doctype_begin`
    DoctypeBegin {
        /// Document type name.
        name: String,
        /// `PUBLIC` identifier.
        public_ident: Option<String>,
        /// `SYSTEM` identifier.
        system_ident: Option<String>,
    },
    /// `doctype_end`
    DoctypeEnd,
    /// `elem_begin`
    ElemBegin {
        /// Element name as written.
        name: String,
        /// Attributes in source order.
        attrs: Vec<Attr>,
    },
    /// `elem_end`
    ElemEnd {
        /// Element name as written.
        name: String,
    },
    /// `text`
    Text {
        /// The character data.
        text: String,
    },
    /// `comment`
    Comment {
        /// Comment text.
        text: String,
    },
    /// `proc_instr`
    ProcInstr {
        /// Instruction text.
        text: String,
    },
    /// `script`
    Script {
        /// Attributes of the start tag.
        attrs: Vec<Attr>,
        /// Raw element content.
        content: String,
    },
    /// `style`
    Style {
        /// Attributes of the start tag.
        attrs: Vec<Attr>,
        /// Raw element content.
        content: String,
    },
}

/// [`Callbacks`] implementation that records every event.
#[derive(Debug, Default, Clone)]
pub struct EventRecorder {
    /// Events in the order they were emitted.
    pub events: Vec<Event>,
}

impl EventRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenation of all text events.
    #[must_use]
    pub fn text(&self) -> String {
        self.events
            .iter()
            .filter_map(|event| match event {
                Event::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl Callbacks for EventRecorder {
    fn doctype_begin(&mut self, name: &str, public_ident: Option<&str>, system_ident: Option<&str>) {
        self.events.push(Event::DoctypeBegin {
            name: name.to_string(),
            public_ident: public_ident.map(str::to_string),
            system_ident: system_ident.map(str::to_string),
        });
    }

    fn doctype_end(&mut self) {
        self.events.push(Event::DoctypeEnd);
    }

    fn elem_begin(&mut self, name: &str, attrs: &[Attr]) {
        self.events.push(Event::ElemBegin {
            name: name.to_string(),
            attrs: attrs.to_vec(),
        });
    }

    fn elem_end(&mut self, name: &str) {
        self.events.push(Event::ElemEnd {
            name: name.to_string(),
        });
    }

    fn text(&mut self, text: &str) {
        self.events.push(Event::Text {
            text: text.to_string(),
        });
    }

    fn comment(&mut self, text: &str) {
        self.events.push(Event::Comment {
            text: text.to_string(),
        });
    }

    fn proc_instr(&mut self, text: &str) {
        self.events.push(Event::ProcInstr {
            text: text.to_string(),
        });
    }

    fn script(&mut self, attrs: &[Attr], content: &str, _doc_writer: &mut DocWriter) {
        self.events.push(Event::Script {
            attrs: attrs.to_vec(),
            content: content.to_string(),
        });
    }

    fn style(&mut self, attrs: &[Attr], content: &str) {
        self.events.push(Event::Style {
            attrs: attrs.to_vec(),
            content: content.to_string(),
        });
    }
}
