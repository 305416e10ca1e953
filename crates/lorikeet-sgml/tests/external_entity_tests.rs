//! Integration tests for external entities and resolvers.

use std::collections::HashMap;
use std::io::Cursor;

use lorikeet_common::CollectingLogger;
use lorikeet_sgml::{
    Event, EventRecorder, FileResolver, NullResolver, ParseError, ParserConfig, ResolveError, Resolved,
    Resolver, SgmlParser, Source, parse_dtd,
};

/// Serves system identifiers from memory and remembers what was asked for.
#[derive(Default)]
struct MapResolver {
    files: HashMap<String, (Vec<u8>, String)>,
    requests: Vec<(String, String, String)>,
}

impl MapResolver {
    fn with(mut self, system_ident: &str, bytes: &[u8], charenc: &str) -> Self {
        let _ = self
            .files
            .insert(system_ident.to_string(), (bytes.to_vec(), charenc.to_string()));
        self
    }
}

impl Resolver for MapResolver {
    fn resolve(
        &mut self,
        public_ident: &str,
        system_ident: &str,
        base_uri: &str,
    ) -> Result<Resolved, ResolveError> {
        self.requests.push((
            public_ident.to_string(),
            system_ident.to_string(),
            base_uri.to_string(),
        ));
        let (bytes, charenc) = self.files.get(system_ident).ok_or_else(|| ResolveError::NotFound {
            public_ident: public_ident.to_string(),
            system_ident: system_ident.to_string(),
        })?;
        Ok(Resolved {
            byte_stream: Box::new(Cursor::new(bytes.clone())),
            charenc: charenc.clone(),
            resolved_uri: format!("mem:{system_ident}"),
        })
    }
}

fn parse(source: Source<'_>, resolver: &mut dyn Resolver) -> (EventRecorder, CollectingLogger) {
    let mut recorder = EventRecorder::new();
    let mut logger = CollectingLogger::new();
    SgmlParser::new(ParserConfig::default())
        .parse(source, &mut recorder, resolver, &mut logger)
        .unwrap();
    (recorder, logger)
}

#[test]
fn test_external_entity_is_parsed_in_place() {
    let mut resolver = MapResolver::default().with("chap.txt", b"<b>hi</b>", "UTF-8");
    let (recorder, logger) = parse(
        Source::from_text(r#"<!DOCTYPE d [<!ENTITY chap SYSTEM "chap.txt">]>[&chap;]"#).with_base_uri("file:///docs/"),
        &mut resolver,
    );
    assert_eq!(recorder.text(), "[hi]");
    assert!(recorder.events.contains(&Event::ElemBegin {
        name: "b".to_string(),
        attrs: vec![]
    }));
    assert!(logger.diagnostics.is_empty(), "{:?}", logger.messages());
    assert_eq!(
        resolver.requests,
        vec![(String::new(), "chap.txt".to_string(), "file:///docs/".to_string())]
    );
}

#[test]
fn test_external_entity_fetched_once_per_reference() {
    let mut resolver = MapResolver::default().with("x", b"X", "UTF-8");
    let (recorder, _) = parse(
        Source::from_text(r#"<!DOCTYPE d [<!ENTITY x PUBLIC "-//X//EN" "x">]>&x;&x;"#),
        &mut resolver,
    );
    assert_eq!(recorder.text(), "XX");
    assert_eq!(resolver.requests.len(), 2);
    assert_eq!(resolver.requests[0].0, "-//X//EN");
}

#[test]
fn test_external_entity_uses_its_own_encoding() {
    let mut resolver = MapResolver::default().with("latin.txt", b"\xE9t\xE9", "ISO-8859-1");
    let (recorder, logger) = parse(
        Source::from_text(r#"<!DOCTYPE d [<!ENTITY s SYSTEM "latin.txt">]>&s;"#),
        &mut resolver,
    );
    assert_eq!(recorder.text(), "été");
    assert!(logger.diagnostics.is_empty());
}

#[test]
fn test_external_cdata_entity_is_text() {
    let mut resolver = MapResolver::default().with("raw", b"<not-a-tag>", "UTF-8");
    let (recorder, _) = parse(
        Source::from_text(r#"<!DOCTYPE d [<!ENTITY r SYSTEM "raw" CDATA>]>&r;"#),
        &mut resolver,
    );
    assert_eq!(recorder.text(), "<not-a-tag>");
}

#[test]
fn test_unresolvable_external_entity() {
    let (recorder, logger) = parse(
        Source::from_text(r#"<!DOCTYPE d [<!ENTITY m SYSTEM "nope">]>a&m;b"#),
        &mut NullResolver,
    );
    assert_eq!(recorder.text(), "ab");
    assert_eq!(logger.error_count(), 1);
    assert!(logger.messages()[0].starts_with("Failed to resolve external entity 'm'"));
}

#[test]
fn test_file_resolver_reads_relative_to_document() {
    let dir = std::env::temp_dir().join(format!("lorikeet-external-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("greeting.ent"), "hello <i>there</i>").unwrap();
    let doc = dir.join("doc.html");
    let system_ident = doc.to_string_lossy().into_owned();

    let mut resolver = FileResolver::new("UTF-8");
    let (recorder, logger) = parse(
        Source::from_text(r#"<!DOCTYPE d [<!ENTITY g SYSTEM "greeting.ent">]>&g;"#)
            .with_system_ident(&system_ident),
        &mut resolver,
    );
    assert_eq!(recorder.text(), "hello there");
    assert!(logger.diagnostics.is_empty(), "{:?}", logger.messages());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_parse_dtd_collects_entities() {
    let mut logger = CollectingLogger::new();
    let defs = parse_dtd(
        Source::from_text(
            r#"<!-- entities --> <!ENTITY % core '<!ENTITY copy2 "(c)">'> %core; <!ENTITY logo SYSTEM "logo.gif">"#,
        ),
        &mut NullResolver,
        &mut logger,
        &ParserConfig::default(),
    )
    .unwrap();
    assert!(defs.parameter.get("core").is_some());
    assert_eq!(
        defs.general.get("copy2").and_then(|e| e.replacement_text()),
        Some("(c)")
    );
    assert!(defs.general.get("logo").is_some_and(|e| e.is_external()));
    assert!(logger.diagnostics.is_empty(), "{:?}", logger.messages());
}

#[test]
fn test_parse_dtd_element_declaration_is_unimplemented() {
    let mut logger = CollectingLogger::new();
    let result = parse_dtd(
        Source::from_text("<!ELEMENT p - O (#PCDATA)>"),
        &mut NullResolver,
        &mut logger,
        &ParserConfig::default(),
    );
    assert!(matches!(result, Err(ParseError::Unimplemented(_))));
}
