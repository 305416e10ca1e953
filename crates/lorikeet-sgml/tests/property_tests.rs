//! Property tests: the parser accepts arbitrary input.

use lorikeet_common::CollectingLogger;
use lorikeet_sgml::{EventRecorder, NullResolver, ParseError, ParserConfig, SgmlParser, Source};
use quickcheck_macros::quickcheck;

fn run(bytes: &[u8], charenc: &str) -> (Result<(), ParseError>, EventRecorder, CollectingLogger) {
    let mut recorder = EventRecorder::new();
    let mut logger = CollectingLogger::new();
    let result = SgmlParser::new(ParserConfig::default()).parse(
        Source::from_bytes(bytes).with_charenc(charenc),
        &mut recorder,
        &mut NullResolver,
        &mut logger,
    );
    (result, recorder, logger)
}

/// Markup-heavy input built from `seed`, so that generated strings exercise
/// tags and declarations rather than mostly plain text.
fn markupish(seed: &[u8]) -> String {
    const PIECES: &[&str] = &[
        "<", ">", "</", "<!", "<!--", "--", "<?", "&", "&#", "&#x", ";", "]]>", "<![", "[", "]",
        "\"", "'", "=", " ", "\n", "p", "script", "style", "DOCTYPE", "ENTITY", "INCLUDE", "amp",
        "%", "é", "/",
    ];
    seed.iter()
        .map(|b| PIECES[usize::from(*b) % PIECES.len()])
        .collect()
}

#[quickcheck]
fn prop_arbitrary_text_never_faults(input: String) -> bool {
    let (result, _, _) = run(input.as_bytes(), "UTF-8");
    result.is_ok() || result.is_err_and(|e| e.is_unimplemented())
}

#[quickcheck]
fn prop_arbitrary_bytes_never_fault(input: Vec<u8>, latin1: bool) -> bool {
    let charenc = if latin1 { "ISO-8859-1" } else { "UTF-8" };
    let (result, _, _) = run(&input, charenc);
    result.is_ok() || result.is_err_and(|e| e.is_unimplemented())
}

#[quickcheck]
fn prop_markup_never_faults(seed: Vec<u8>) -> bool {
    let input = markupish(&seed);
    let (result, _, _) = run(input.as_bytes(), "UTF-8");
    result.is_ok() || result.is_err_and(|e| e.is_unimplemented())
}

#[quickcheck]
fn prop_parsing_is_deterministic(seed: Vec<u8>) -> bool {
    let input = markupish(&seed);
    let (first, first_events, first_log) = run(input.as_bytes(), "UTF-8");
    let (second, second_events, second_log) = run(input.as_bytes(), "UTF-8");
    first.is_ok() == second.is_ok()
        && first_events.events == second_events.events
        && first_log.diagnostics == second_log.diagnostics
}

#[quickcheck]
fn prop_plain_text_round_trips(input: String) -> bool {
    let plain: String = input.chars().filter(|c| !matches!(c, '<' | '&' | ']' | '\u{FEFF}')).collect();
    let (result, recorder, logger) = run(plain.as_bytes(), "UTF-8");
    result.is_ok() && recorder.text() == plain && logger.diagnostics.is_empty()
}
