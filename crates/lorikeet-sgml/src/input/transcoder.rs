//! Byte to character decoders.
//!
//! A [`Transcoder`] turns raw bytes into characters incrementally. The input
//! buffer owns exactly one at a time and may replace it mid-stream, so a
//! transcoder must be usable on an arbitrary chunk boundary.

use encoding_rs::{DecoderResult, Encoding, UTF_8};

use crate::error::TranscoderError;

/// Incremental byte to character decoder.
pub trait Transcoder {
    /// Canonical name of the character encoding currently being decoded.
    fn name(&self) -> &'static str;

    /// Decode `input`, appending characters to `output`.
    ///
    /// Malformed byte sequences are replaced by `U+FFFD`; the index in `output`
    /// of every such replacement is appended to `malformed`. `last` signals the
    /// end of the byte stream, after which the transcoder is not used again.
    fn decode(&mut self, input: &[u8], last: bool, output: &mut Vec<char>, malformed: &mut Vec<usize>);

    /// A new transcoder for the same encoding, in its initial state and
    /// without byte order mark handling.
    fn restart(&self) -> Box<dyn Transcoder>;
}

/// [`Transcoder`] backed by an `encoding_rs` decoder.
pub struct EncodingTranscoder {
    decoder: encoding_rs::Decoder,
}

impl EncodingTranscoder {
    /// Decoder for `encoding` that ignores byte order marks.
    #[must_use]
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder_without_bom_handling(),
        }
    }

    /// Decoder for `encoding` that lets a leading byte order mark override it.
    #[must_use]
    pub fn with_bom_sniffing(encoding: &'static Encoding) -> Self {
        Self {
            decoder: encoding.new_decoder(),
        }
    }
}

impl Transcoder for EncodingTranscoder {
    fn name(&self) -> &'static str {
        self.decoder.encoding().name()
    }

    fn decode(
        &mut self,
        mut input: &[u8],
        last: bool,
        output: &mut Vec<char>,
        malformed: &mut Vec<usize>,
    ) {
        let mut scratch = String::new();
        loop {
            scratch.clear();
            let needed = self
                .decoder
                .max_utf8_buffer_length_without_replacement(input.len())
                .unwrap_or(input.len().saturating_mul(3))
                .max(16);
            scratch.reserve(needed);
            let (result, read) =
                self.decoder
                    .decode_to_string_without_replacement(input, &mut scratch, last);
            output.extend(scratch.chars());
            input = &input[read..];
            match result {
                DecoderResult::InputEmpty => break,
                DecoderResult::OutputFull => {}
                DecoderResult::Malformed(_, _) => {
                    malformed.push(output.len());
                    output.push(char::REPLACEMENT_CHARACTER);
                }
            }
        }
    }

    fn restart(&self) -> Box<dyn Transcoder> {
        Box::new(Self::new(self.decoder.encoding()))
    }
}

/// Look up a transcoder by character encoding label.
///
/// Labels follow the WHATWG Encoding Standard, so `ISO-8859-1` and `latin1`
/// resolve to `windows-1252`.
///
/// # Errors
///
/// Returns [`TranscoderError::Unavailable`] if the label is unknown.
pub fn transcoder_for(label: &str) -> Result<Box<dyn Transcoder>, TranscoderError> {
    encoding_for(label).map(|encoding| Box::new(EncodingTranscoder::new(encoding)) as Box<dyn Transcoder>)
}

/// Like [`transcoder_for`], but a byte order mark at the start of the stream
/// takes precedence over the label.
///
/// # Errors
///
/// Returns [`TranscoderError::Unavailable`] if the label is unknown.
pub fn initial_transcoder_for(label: &str) -> Result<Box<dyn Transcoder>, TranscoderError> {
    encoding_for(label)
        .map(|encoding| Box::new(EncodingTranscoder::with_bom_sniffing(encoding)) as Box<dyn Transcoder>)
}

/// The transcoder used when no usable encoding was specified.
#[must_use]
pub fn default_transcoder() -> Box<dyn Transcoder> {
    Box::new(EncodingTranscoder::with_bom_sniffing(UTF_8))
}

/// Canonical name for an encoding label, if the label is known.
#[must_use]
pub fn canonical_name(label: &str) -> Option<&'static str> {
    encoding_for(label).ok().map(Encoding::name)
}

fn encoding_for(label: &str) -> Result<&'static Encoding, TranscoderError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| TranscoderError::Unavailable(label.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(label: &str, bytes: &[u8]) -> (String, Vec<usize>) {
        let mut transcoder = transcoder_for(label).unwrap();
        let mut out = Vec::new();
        let mut malformed = Vec::new();
        transcoder.decode(bytes, true, &mut out, &mut malformed);
        (out.into_iter().collect(), malformed)
    }

    #[test]
    fn test_latin1_label_decodes_high_bytes() {
        let (text, malformed) = decode_all("ISO-8859-1", b"caf\xE9");
        assert_eq!(text, "café");
        assert!(malformed.is_empty());
    }

    #[test]
    fn test_utf8_malformed_sequence_is_replaced() {
        let (text, malformed) = decode_all("utf-8", b"a\xFFb");
        assert_eq!(text, "a\u{FFFD}b");
        assert_eq!(malformed, vec![1]);
    }

    #[test]
    fn test_split_multibyte_sequence_across_chunks() {
        let mut transcoder = transcoder_for("utf-8").unwrap();
        let mut out = Vec::new();
        let mut malformed = Vec::new();
        transcoder.decode(b"x\xC3", false, &mut out, &mut malformed);
        transcoder.decode(b"\xA9y", true, &mut out, &mut malformed);
        assert_eq!(out.into_iter().collect::<String>(), "x©y");
        assert!(malformed.is_empty());
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(
            transcoder_for("no-such-charset").err(),
            Some(TranscoderError::Unavailable("no-such-charset".to_string()))
        );
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name(" utf8 "), Some("UTF-8"));
        assert_eq!(canonical_name("latin1"), Some("windows-1252"));
        assert_eq!(canonical_name("bogus"), None);
    }
}
