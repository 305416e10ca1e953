//! Transcoding input buffer.
//!
//! Raw bytes are pulled from the byte stream in chunks, decoded by the active
//! [`Transcoder`] and consumed one character at a time. On top of the live,
//! decoded data the buffer keeps a stack of injected segments: characters that
//! the parser itself spliced into the stream (entity replacement text,
//! `document.write` output, push-back). Injected characters are read before
//! anything else and are never subject to a later transcoder switch.

/// Stack of entity replacement sources layered over the buffer.
pub mod stack;
/// Byte to character decoders.
pub mod transcoder;

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::io::{ErrorKind, Read};

use encoding_rs::Encoding;

pub use stack::{EntityKind, InputStack};
pub use transcoder::{
    EncodingTranscoder, Transcoder, canonical_name, default_transcoder, initial_transcoder_for,
    transcoder_for,
};

use crate::error::InputError;

/// Number of raw bytes requested from the byte stream per read.
pub const RAW_CHUNK_SIZE: usize = 4096;

/// A position in the decoded input, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineLoc {
    /// Line number, starting at 1.
    pub line_num: u64,
    /// Column index, starting at 0.
    pub column_idx: u64,
}

impl Default for LineLoc {
    fn default() -> Self {
        Self {
            line_num: 1,
            column_idx: 0,
        }
    }
}

impl LineLoc {
    const fn advance(&mut self, c: char) {
        if c == '\n' {
            self.line_num += 1;
            self.column_idx = 0;
        } else {
            self.column_idx += 1;
        }
    }
}

/// A malformed byte sequence that was consumed as `U+FFFD`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeIssue {
    /// Encoding that rejected the bytes.
    pub charenc: &'static str,
    /// Where the replacement character was read.
    pub loc: LineLoc,
}

struct Segment {
    data: Vec<char>,
    pos: usize,
}

impl Segment {
    const fn is_exhausted(&self) -> bool {
        self.pos >= self.data.len()
    }
}

/// What the most recent `get`/`drop` consumed, for `unget`.
#[derive(Clone, Copy)]
enum Taken {
    Live,
    Artificial(char),
}

/// Decoding buffer over a byte stream.
pub struct InputBuffer<'a> {
    reader: Box<dyn Read + 'a>,
    transcoder: Box<dyn Transcoder>,
    /// Raw bytes that produced the current live chunk.
    raw_chunk: Vec<u8>,
    /// Length of a byte order mark at the start of `raw_chunk` that the
    /// transcoder consumed without output.
    chunk_bom_len: usize,
    decoding_started: bool,
    /// Decoded characters of the current chunk. The first `live_base` entries
    /// are carried over from the previous chunk so that `unget` keeps working
    /// across a refill.
    live: Vec<char>,
    live_pos: usize,
    live_base: usize,
    /// Indices into `live` that hold a replacement for malformed bytes.
    malformed: VecDeque<usize>,
    decoder_finished: bool,
    injected: Vec<Segment>,
    last: Option<Taken>,
    loc: LineLoc,
    prev_loc: LineLoc,
    issues: Vec<TranscodeIssue>,
}

impl<'a> InputBuffer<'a> {
    /// Create a buffer that decodes `reader` with `transcoder`.
    #[must_use]
    pub fn new(reader: Box<dyn Read + 'a>, transcoder: Box<dyn Transcoder>) -> Self {
        Self {
            reader,
            transcoder,
            raw_chunk: Vec::new(),
            chunk_bom_len: 0,
            decoding_started: false,
            live: Vec::new(),
            live_pos: 0,
            live_base: 0,
            malformed: VecDeque::new(),
            decoder_finished: false,
            injected: Vec::new(),
            last: None,
            loc: LineLoc::default(),
            prev_loc: LineLoc::default(),
            issues: Vec::new(),
        }
    }

    /// Name of the active character encoding.
    #[must_use]
    pub fn charenc(&self) -> &'static str {
        self.transcoder.name()
    }

    /// Look at the next character without consuming it. `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] if the byte stream fails.
    pub fn peek(&mut self) -> Result<Option<char>, InputError> {
        while let Some(segment) = self.injected.last() {
            if !segment.is_exhausted() {
                return Ok(Some(segment.data[segment.pos]));
            }
            let _ = self.injected.pop();
        }
        if !self.fill()? {
            return Ok(None);
        }
        Ok(Some(self.live[self.live_pos]))
    }

    /// Consume the next character. `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] if the byte stream fails.
    pub fn get(&mut self) -> Result<Option<char>, InputError> {
        while let Some(segment) = self.injected.last_mut() {
            if !segment.is_exhausted() {
                let c = segment.data[segment.pos];
                segment.pos += 1;
                self.last = Some(Taken::Artificial(c));
                return Ok(Some(c));
            }
            let _ = self.injected.pop();
        }
        if !self.fill()? {
            self.last = None;
            return Ok(None);
        }
        let index = self.live_pos;
        let c = self.live[index];
        self.live_pos += 1;
        self.note_malformed(index);
        self.prev_loc = self.loc;
        self.loc.advance(c);
        self.last = Some(Taken::Live);
        Ok(Some(c))
    }

    /// Consume the next character, which the caller knows to exist.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] if the byte stream fails.
    ///
    /// # Panics
    ///
    /// Panics if the input is exhausted.
    pub fn drop(&mut self) -> Result<(), InputError> {
        match self.get()? {
            Some(_) => Ok(()),
            None => panic!("InputBuffer::drop() called at end of input"),
        }
    }

    /// Give back the character consumed by the immediately preceding `get` or
    /// `drop`. Peeking in between is allowed.
    ///
    /// # Panics
    ///
    /// Panics if the previous mutating operation was not a successful `get` or
    /// `drop`.
    pub fn unget(&mut self) {
        match self.last.take() {
            Some(Taken::Live) => {
                self.live_pos -= 1;
                self.loc = self.prev_loc;
            }
            Some(Taken::Artificial(c)) => self.injected.push(Segment {
                data: vec![c],
                pos: 0,
            }),
            None => panic!("InputBuffer::unget() must directly follow get() or drop()"),
        }
    }

    /// Append characters to `buffer` until `delimiter`, `max_count`
    /// characters, or end of input. The delimiter is not consumed. Returns the
    /// number of characters copied.
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
        while count < max_count {
            if let Some(segment) = self.injected.last_mut() {
                if segment.is_exhausted() {
                    let _ = self.injected.pop();
                    continue;
                }
                let available = &segment.data[segment.pos..];
                let span = copy_span(available, max_count - count, delimiter, buffer);
                segment.pos += span;
                count += span;
                if span < available.len() {
                    break;
                }
                continue;
            }
            if !self.fill()? {
                break;
            }
            let start = self.live_pos;
            let span = copy_span(&self.live[start..], max_count - count, delimiter, buffer);
            for index in start..start + span {
                self.note_malformed(index);
                self.loc.advance(self.live[index]);
            }
            self.live_pos += span;
            count += span;
            if self.live_pos < self.live.len() {
                break;
            }
        }
        self.last = None;
        Ok(count)
    }

    /// Splice `data` into the stream at the current read position, ahead of
    /// everything that is already pending.
    pub fn inject<I: IntoIterator<Item = char>>(&mut self, data: I) {
        let data: Vec<char> = data.into_iter().collect();
        self.last = None;
        if !data.is_empty() {
            self.injected.push(Segment { data, pos: 0 });
        }
    }

    /// Whether the next character will come from live decoding rather than
    /// from injected data.
    #[must_use]
    pub fn next_char_is_real(&self) -> bool {
        self.injected.iter().all(Segment::is_exhausted)
    }

    /// Current position of the read cursor in the decoded byte stream.
    ///
    /// Injected characters do not move the position.
    #[must_use]
    pub const fn get_line_loc(&self) -> LineLoc {
        self.loc
    }

    /// Take the malformed-input notices accumulated since the last call.
    pub fn take_transcode_issues(&mut self) -> Vec<TranscodeIssue> {
        std::mem::take(&mut self.issues)
    }

    /// Whether there are malformed-input notices waiting.
    #[must_use]
    pub fn has_transcode_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Replace the active transcoder for all bytes not yet consumed.
    ///
    /// Live characters that were decoded but not consumed are re-decoded with
    /// the new transcoder, starting at the raw byte offset of the first
    /// unconsumed character. The offset is found by decoding the chunk again
    /// with a fresh instance of the old encoding, so the old encoding must be
    /// stateless for it to be exact.
    pub fn switch_transcoder(&mut self, mut transcoder: Box<dyn Transcoder>) {
        self.last = None;
        if self.live_pos < self.live.len() && !self.raw_chunk.is_empty() {
            // Carried-over characters belong to the previous chunk.
            let keep = self.live_pos.max(self.live_base);
            let offset = self.chunk_bom_len
                + prefix_byte_len(
                    self.transcoder.restart(),
                    &self.raw_chunk[self.chunk_bom_len..],
                    keep - self.live_base,
                );
            let mut redecoded = self.live[..keep].to_vec();
            let mut malformed = Vec::new();
            transcoder.decode(&self.raw_chunk[offset..], false, &mut redecoded, &mut malformed);

            let live_pos = self.live_pos;
            let carried = self.malformed.iter().copied().filter(|&i| i >= live_pos && i < keep);
            self.malformed = carried.chain(malformed).collect();
            self.live = redecoded;
            self.live_base = keep;
            let _ = self.raw_chunk.drain(..offset);
            self.chunk_bom_len = 0;
        }
        self.transcoder = transcoder;
    }

    /// Decode the remainder of the stream into a string.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::Read`] if the byte stream fails.
    pub fn read_to_string(&mut self) -> Result<String, InputError> {
        let mut out = String::new();
        while let Some(c) = self.get()? {
            out.push(c);
        }
        Ok(out)
    }

    /// Make sure `live` has an unconsumed character. Returns `false` once the
    /// stream and the decoder are exhausted.
    fn fill(&mut self) -> Result<bool, InputError> {
        while self.live_pos >= self.live.len() {
            if self.decoder_finished {
                return Ok(false);
            }
            let mut raw = vec![0; RAW_CHUNK_SIZE];
            let read = loop {
                match self.reader.read(&mut raw) {
                    Ok(n) => break n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => return Err(InputError::Read(e)),
                }
            };
            raw.truncate(read);
            let last = read == 0;

            let mut live: Vec<char> = self.live.last().copied().into_iter().collect();
            let base = live.len();
            let mut malformed = Vec::new();
            self.transcoder.decode(&raw, last, &mut live, &mut malformed);

            self.chunk_bom_len = if self.decoding_started {
                0
            } else {
                self.stripped_bom_len(&raw, &live)
            };
            self.decoding_started |= read > 0;
            self.decoder_finished = last;
            self.raw_chunk = raw;
            self.live = live;
            self.live_pos = base;
            self.live_base = base;
            self.malformed = malformed.into();
        }
        Ok(true)
    }

    /// Length of the byte order mark at the start of the first chunk, if the
    /// transcoder sniffed it instead of decoding it to `U+FEFF`.
    fn stripped_bom_len(&self, raw: &[u8], decoded: &[char]) -> usize {
        match Encoding::for_bom(raw) {
            Some((encoding, len))
                if encoding.name() == self.transcoder.name() && decoded.first() != Some(&'\u{FEFF}') =>
            {
                len
            }
            _ => 0,
        }
    }

    fn note_malformed(&mut self, index: usize) {
        while let Some(&front) = self.malformed.front() {
            if front > index {
                break;
            }
            let _ = self.malformed.pop_front();
            if front == index {
                self.issues.push(TranscodeIssue {
                    charenc: self.transcoder.name(),
                    loc: self.loc,
                });
            }
        }
    }
}

/// Number of leading bytes of `raw` that `decoder` turns into `chars`
/// characters.
fn prefix_byte_len(mut decoder: Box<dyn Transcoder>, raw: &[u8], chars: usize) -> usize {
    if chars == 0 {
        return 0;
    }
    let mut output = Vec::new();
    let mut malformed = Vec::new();
    for (i, byte) in raw.iter().enumerate() {
        decoder.decode(std::slice::from_ref(byte), false, &mut output, &mut malformed);
        match output.len().cmp(&chars) {
            Ordering::Less => {}
            Ordering::Equal => return i + 1,
            // The byte ended a malformed sequence and also decoded on its own.
            Ordering::Greater => return i,
        }
    }
    raw.len()
}

/// Copy characters from `available` into `buffer` up to `max` or the first
/// `delimiter`. Returns how many were copied.
fn copy_span(available: &[char], max: usize, delimiter: char, buffer: &mut String) -> usize {
    let span = available
        .iter()
        .take(max)
        .position(|&c| c == delimiter)
        .unwrap_or_else(|| available.len().min(max));
    buffer.extend(&available[..span]);
    span
}
