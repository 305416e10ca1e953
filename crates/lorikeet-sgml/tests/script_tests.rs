//! Integration tests for script execution and `document.write` injection.

use lorikeet_common::CollectingLogger;
use lorikeet_sgml::{
    Attr, Callbacks, DocWriter, Event, EventRecorder, NullResolver, ParserConfig, SgmlParser, Source,
};

/// Records events and answers every script from a fixed table of outputs.
struct Writer {
    recorder: EventRecorder,
    outputs: Vec<(&'static str, &'static str)>,
    executions: usize,
}

impl Writer {
    fn new(outputs: &[(&'static str, &'static str)]) -> Self {
        Self {
            recorder: EventRecorder::new(),
            outputs: outputs.to_vec(),
            executions: 0,
        }
    }
}

impl Callbacks for Writer {
    fn elem_begin(&mut self, name: &str, attrs: &[Attr]) {
        self.recorder.elem_begin(name, attrs);
    }

    fn elem_end(&mut self, name: &str) {
        self.recorder.elem_end(name);
    }

    fn text(&mut self, text: &str) {
        Callbacks::text(&mut self.recorder, text);
    }

    fn script(&mut self, attrs: &[Attr], content: &str, doc_writer: &mut DocWriter) {
        self.executions += 1;
        let mut scratch = DocWriter::default();
        self.recorder.script(attrs, content, &mut scratch);
        if let Some((_, output)) = self.outputs.iter().find(|(source, _)| *source == content) {
            doc_writer.write(output);
        }
    }
}

/// Each `w` script keeps writing another one until its budget runs out.
struct Chain {
    per_real_script: usize,
    remaining: usize,
    executions: usize,
}

impl Callbacks for Chain {
    fn script(&mut self, _attrs: &[Attr], content: &str, doc_writer: &mut DocWriter) {
        self.executions += 1;
        if content != "w" {
            self.remaining = self.per_real_script;
        } else if self.remaining == 0 {
            return;
        } else {
            self.remaining -= 1;
        }
        doc_writer.write("<script>w</script>");
    }
}

fn parse(input: &str, callbacks: &mut dyn Callbacks) -> CollectingLogger {
    let mut logger = CollectingLogger::new();
    SgmlParser::new(ParserConfig::default())
        .parse(Source::from_text(input), callbacks, &mut NullResolver, &mut logger)
        .unwrap();
    logger
}

fn text(text: &str) -> Event {
    Event::Text {
        text: text.to_string(),
    }
}

#[test]
fn test_split_end_tag_in_script_literal() {
    let mut recorder = EventRecorder::new();
    let logger = parse("<script>var x = '</scr' + 'ipt>';</script>", &mut recorder);
    assert_eq!(
        recorder.events,
        vec![Event::Script {
            attrs: vec![],
            content: "var x = '</scr' + 'ipt>';".to_string()
        }]
    );
    assert!(logger.diagnostics.is_empty());
}

#[test]
fn test_written_markup_is_parsed_after_script() {
    let mut writer = Writer::new(&[("w", "<em>x</em>")]);
    let logger = parse("<p>a<script>w</script>b</p>", &mut writer);
    assert_eq!(
        writer.recorder.events,
        vec![
            Event::ElemBegin {
                name: "p".to_string(),
                attrs: vec![]
            },
            text("a"),
            Event::Script {
                attrs: vec![],
                content: "w".to_string()
            },
            Event::ElemBegin {
                name: "em".to_string(),
                attrs: vec![]
            },
            text("x"),
            Event::ElemEnd {
                name: "em".to_string()
            },
            text("b"),
            Event::ElemEnd {
                name: "p".to_string()
            },
        ]
    );
    assert!(logger.diagnostics.is_empty());
}

#[test]
fn test_written_script_runs() {
    let mut writer = Writer::new(&[("outer", "<script>inner</script>"), ("inner", "done")]);
    let logger = parse("<script>outer</script>", &mut writer);
    assert_eq!(writer.executions, 2);
    assert_eq!(writer.recorder.text(), "done");
    assert!(logger.diagnostics.is_empty());
}

#[test]
fn test_script_with_attributes() {
    let mut recorder = EventRecorder::new();
    let _ = parse(r#"<script type="text/javascript" src=a.js></script>"#, &mut recorder);
    assert_eq!(
        recorder.events,
        vec![Event::Script {
            attrs: vec![
                Attr::new("type", "text/javascript"),
                Attr::new("src", "a.js")
            ],
            content: String::new()
        }]
    );
}

#[test]
fn test_self_writing_script_is_capped() {
    let mut writer = Writer::new(&[("x", "<script>x</script>")]);
    let logger = parse("<script>x</script>", &mut writer);
    assert_eq!(writer.executions, 1 + 32);
    assert_eq!(
        logger.messages(),
        vec!["Too many consecutive script executions from injected input"]
    );
}

#[test]
fn test_cap_is_configurable() {
    let mut writer = Writer::new(&[("x", "<script>x</script>")]);
    let mut logger = CollectingLogger::new();
    let config = ParserConfig {
        max_artificial_script_executions: 3,
        ..ParserConfig::default()
    };
    SgmlParser::new(config)
        .parse(Source::from_text("<script>x</script>"), &mut writer, &mut NullResolver, &mut logger)
        .unwrap();
    assert_eq!(writer.executions, 4);
    assert_eq!(logger.error_count(), 1);
}

#[test]
fn test_real_script_resets_the_cap() {
    let mut chain = Chain {
        per_real_script: 20,
        remaining: 0,
        executions: 0,
    };
    let logger = parse("<script>a</script><script>b</script>", &mut chain);
    assert_eq!(chain.executions, 2 + 21 + 21);
    assert!(logger.diagnostics.is_empty(), "{:?}", logger.messages());
}
