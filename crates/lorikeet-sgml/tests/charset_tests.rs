//! Integration tests for input decoding and the `<meta>` encoding switch.

use lorikeet_common::CollectingLogger;
use lorikeet_sgml::{Event, EventRecorder, NullResolver, ParserConfig, SgmlParser, Source};

const META_UTF8: &[u8] = br#"<meta http-equiv="Content-Type" content="text/html; charset=UTF-8">"#;

fn parse_bytes(bytes: &[u8], charenc: &str, config: ParserConfig) -> (Vec<Event>, CollectingLogger) {
    let mut recorder = EventRecorder::new();
    let mut logger = CollectingLogger::new();
    SgmlParser::new(config)
        .parse(
            Source::from_bytes(bytes).with_charenc(charenc),
            &mut recorder,
            &mut NullResolver,
            &mut logger,
        )
        .unwrap();
    (recorder.events, logger)
}

fn texts(events: &[Event]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn latin1_then_utf8() -> Vec<u8> {
    let mut bytes = b"caf\xE9".to_vec();
    bytes.extend_from_slice(META_UTF8);
    bytes.extend_from_slice(b"caf\xC3\xA9");
    bytes
}

#[test]
fn test_meta_switches_decoding() {
    let (events, logger) = parse_bytes(&latin1_then_utf8(), "ISO-8859-1", ParserConfig::default());
    assert_eq!(texts(&events), vec!["café", "café"]);
    assert!(logger.diagnostics.is_empty(), "{:?}", logger.messages());
}

#[test]
fn test_meta_switch_after_multibyte_text() {
    // A UTF-8 page labelled ISO-8859-1: "é" decodes to two characters before
    // the meta tag corrects the encoding.
    let mut bytes = "<title>café</title>".as_bytes().to_vec();
    bytes.extend_from_slice(META_UTF8);
    bytes.extend_from_slice(b"after");
    let (events, logger) = parse_bytes(&bytes, "ISO-8859-1", ParserConfig::default());
    assert_eq!(texts(&events), vec!["cafÃ©", "after"]);
    assert!(logger.diagnostics.is_empty(), "{:?}", logger.messages());
}

#[test]
fn test_lowercase_meta_switches_with_case_sensitive_names() {
    let config = ParserConfig {
        case_insensitive: false,
        ..ParserConfig::default()
    };
    let mut bytes = b"caf\xE9".to_vec();
    bytes.extend_from_slice(br#"<meta http-equiv="content-type" content="text/html; charset=utf-8">"#);
    bytes.extend_from_slice(b"caf\xC3\xA9");
    let (events, logger) = parse_bytes(&bytes, "ISO-8859-1", config);
    assert_eq!(texts(&events), vec!["café", "café"]);
    assert!(logger.diagnostics.is_empty(), "{:?}", logger.messages());
}

#[test]
fn test_meta_switch_disabled() {
    let config = ParserConfig {
        enable_meta_charenc_switching: false,
        ..ParserConfig::default()
    };
    let (events, logger) = parse_bytes(&latin1_then_utf8(), "ISO-8859-1", config);
    assert_eq!(texts(&events), vec!["café", "cafÃ©"]);
    assert!(logger.diagnostics.is_empty());
}

#[test]
fn test_meta_naming_active_encoding_is_a_no_op() {
    let mut bytes = META_UTF8.to_vec();
    bytes.extend_from_slice("naïve".as_bytes());
    let (events, logger) = parse_bytes(&bytes, "utf-8", ParserConfig::default());
    assert_eq!(texts(&events), vec!["naïve"]);
    assert!(logger.diagnostics.is_empty());
}

#[test]
fn test_meta_with_unknown_charset_is_ignored() {
    let mut bytes =
        br#"<meta http-equiv="Content-Type" content="text/html; charset=x-no-such-thing">"#.to_vec();
    bytes.extend_from_slice(b"caf\xC3\xA9");
    let (events, logger) = parse_bytes(&bytes, "UTF-8", ParserConfig::default());
    assert_eq!(texts(&events), vec!["café"]);
    assert!(logger.diagnostics.is_empty());
}

#[test]
fn test_malformed_utf8_is_replaced_and_reported() {
    let (events, logger) = parse_bytes(b"a\xFFb", "UTF-8", ParserConfig::default());
    assert_eq!(texts(&events), vec!["a\u{FFFD}b"]);
    assert_eq!(
        logger.messages(),
        vec!["Invalid byte sequence for character encoding 'UTF-8'"]
    );
}

#[test]
fn test_missing_encoding_defaults_to_utf8() {
    let (events, logger) = parse_bytes("é".as_bytes(), "", ParserConfig::default());
    assert_eq!(texts(&events), vec!["é"]);
    assert!(logger.diagnostics.is_empty());
}

#[test]
fn test_unknown_encoding_falls_back_to_utf8() {
    let (events, logger) = parse_bytes("é".as_bytes(), "klingon", ParserConfig::default());
    assert_eq!(texts(&events), vec!["é"]);
    assert_eq!(logger.warning_count(), 1);
}

#[test]
fn test_diagnostic_positions() {
    let mut recorder = EventRecorder::new();
    let mut logger = CollectingLogger::new();
    SgmlParser::default()
        .parse(
            Source::from_text("line one\n  &bogus; x").with_system_ident("doc.html"),
            &mut recorder,
            &mut NullResolver,
            &mut logger,
        )
        .unwrap();
    let diagnostic = &logger.diagnostics[0];
    assert_eq!(diagnostic.system_ident, "doc.html");
    assert_eq!(diagnostic.line, 2);
    assert_eq!(diagnostic.column, 2);
}
