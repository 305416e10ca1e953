//! State shared by the body parser and the declaration subset parser.
//!
//! A [`ParseContext`] owns the input stack and borrows the collaborators of
//! one parse: configuration, resolver and logger. All diagnostics go through
//! [`ParseContext::report`], which is the single place where warnings are
//! promoted to errors and errors become fatal.

use lorikeet_common::{Diagnostic, Logger, Severity};

use crate::config::ParserConfig;
use crate::error::ParseError;
use crate::input::{InputBuffer, InputStack, LineLoc, default_transcoder, initial_transcoder_for};
use crate::names::{NameSyntax, fold, is_space, keyword_eq};
use crate::resolver::Resolver;
use crate::source::Source;

pub(crate) struct ParseContext<'p, 'a> {
    pub(crate) input: InputStack<'a>,
    pub(crate) config: &'p ParserConfig,
    pub(crate) resolver: &'p mut dyn Resolver,
    logger: &'p mut dyn Logger,
    pub(crate) system_ident: String,
    pub(crate) base_uri: String,
    names: NameSyntax,
}

// =============================================================================
// Construction
// =============================================================================

impl<'p, 'a> ParseContext<'p, 'a> {
    /// Open `source` with the transcoder named by its encoding hint. An
    /// unknown hint falls back to UTF-8 with a warning.
    pub(crate) fn new(
        source: Source<'a>,
        config: &'p ParserConfig,
        resolver: &'p mut dyn Resolver,
        logger: &'p mut dyn Logger,
    ) -> Result<Self, ParseError> {
        let Source {
            byte_stream,
            charenc,
            system_ident,
            base_uri,
        } = source;

        let (transcoder, fallback_warning) = if charenc.trim().is_empty() {
            (default_transcoder(), None)
        } else {
            match initial_transcoder_for(&charenc) {
                Ok(transcoder) => (transcoder, None),
                Err(e) => (default_transcoder(), Some(format!("{e}, using UTF-8"))),
            }
        };

        let mut ctx = Self {
            input: InputStack::new(InputBuffer::new(byte_stream, transcoder)),
            config,
            resolver,
            logger,
            system_ident,
            base_uri,
            names: NameSyntax::from_flag(config.accept_xml_1_0_names),
        };
        if let Some(message) = fallback_warning {
            ctx.warn(message)?;
        }
        Ok(ctx)
    }
}

// =============================================================================
// Input/Character Helpers
// =============================================================================

impl ParseContext<'_, '_> {
    pub(crate) fn peek(&mut self) -> Result<Option<char>, ParseError> {
        Ok(self.input.peek()?)
    }

    /// Consume the next character. Malformed input decoded along the way is
    /// reported here.
    pub(crate) fn get(&mut self) -> Result<Option<char>, ParseError> {
        let c = self.input.get()?;
        if self.input.has_transcode_issues() {
            self.report_transcode_issues()?;
        }
        Ok(c)
    }

    /// Consume a character that was just peeked.
    pub(crate) fn skip(&mut self) -> Result<(), ParseError> {
        let _ = self.get()?;
        Ok(())
    }

    pub(crate) fn unget(&mut self) {
        self.input.unget();
    }

    pub(crate) fn next_is(&mut self, expected: char) -> Result<bool, ParseError> {
        Ok(self.peek()? == Some(expected))
    }

    /// Consume the next character if it is `expected`.
    pub(crate) fn eat(&mut self, expected: char) -> Result<bool, ParseError> {
        if self.next_is(expected)? {
            self.skip()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Skip separator characters. Returns whether any were skipped.
    pub(crate) fn skip_space(&mut self) -> Result<bool, ParseError> {
        let mut skipped = false;
        while let Some(c) = self.peek()? {
            if !is_space(c) {
                break;
            }
            self.skip()?;
            skipped = true;
        }
        Ok(skipped)
    }

    pub(crate) const fn is_name_start(&self, c: char) -> bool {
        self.names.is_name_start(c)
    }

    pub(crate) const fn is_name_char(&self, c: char) -> bool {
        self.names.is_name_char(c)
    }

    /// Read the rest of a name whose first character has been consumed.
    pub(crate) fn read_name(&mut self, first: char) -> Result<String, ParseError> {
        let mut name = String::from(first);
        while let Some(c) = self.peek()? {
            if !self.is_name_char(c) {
                break;
            }
            self.skip()?;
            name.push(c);
        }
        Ok(name)
    }

    pub(crate) fn fold(&self, name: &str) -> String {
        fold(name, self.config.case_insensitive)
    }

    pub(crate) fn keyword_eq(&self, name: &str, keyword: &str) -> bool {
        keyword_eq(name, keyword, self.config.case_insensitive)
    }

    pub(crate) fn level(&self) -> usize {
        self.input.level()
    }
}

// =============================================================================
// Error Handling
// =============================================================================

impl ParseContext<'_, '_> {
    pub(crate) fn warn(&mut self, message: impl Into<String>) -> Result<(), ParseError> {
        self.report(Severity::Warning, message.into(), 0)
    }

    pub(crate) fn error(&mut self, message: impl Into<String>) -> Result<(), ParseError> {
        self.report(Severity::Error, message.into(), 0)
    }

    /// Warn with the column moved back by `col_index_adj`, to point at the
    /// start of the offending token.
    pub(crate) fn warn_adj(
        &mut self,
        message: impl Into<String>,
        col_index_adj: u64,
    ) -> Result<(), ParseError> {
        self.report(Severity::Warning, message.into(), col_index_adj)
    }

    pub(crate) fn error_adj(
        &mut self,
        message: impl Into<String>,
        col_index_adj: u64,
    ) -> Result<(), ParseError> {
        self.report(Severity::Error, message.into(), col_index_adj)
    }

    fn report(
        &mut self,
        severity: Severity,
        message: String,
        col_index_adj: u64,
    ) -> Result<(), ParseError> {
        let mut loc = self.input.get_line_loc();
        loc.column_idx = loc.column_idx.saturating_sub(col_index_adj);
        self.report_at(loc, severity, message)
    }

    fn report_at(
        &mut self,
        loc: LineLoc,
        severity: Severity,
        message: String,
    ) -> Result<(), ParseError> {
        let severity = match severity {
            Severity::Warning if self.config.treat_warnings_as_errors => Severity::Error,
            other => other,
        };
        let diagnostic = Diagnostic {
            system_ident: self.system_ident.clone(),
            line: loc.line_num,
            column: loc.column_idx,
            severity,
            message,
        };
        if severity == Severity::Error && self.config.die_on_first_error {
            self.logger.log(diagnostic.clone());
            return Err(ParseError::Fatal(diagnostic));
        }
        self.logger.log(diagnostic);
        Ok(())
    }

    fn report_transcode_issues(&mut self) -> Result<(), ParseError> {
        for issue in self.input.take_transcode_issues() {
            self.report_at(
                issue.loc,
                Severity::Error,
                format!("Invalid byte sequence for character encoding '{}'", issue.charenc),
            )?;
        }
        Ok(())
    }
}

// =============================================================================
// Shared Declaration Helpers
// =============================================================================

impl ParseContext<'_, '_> {
    /// Read a comment declaration whose opening `<!--` has been consumed.
    ///
    /// A comment declaration may hold several `--...--` comments separated by
    /// white space; their contents are concatenated.
    pub(crate) fn comment_declaration(&mut self) -> Result<String, ParseError> {
        let mut text = String::new();
        loop {
            loop {
                match self.get()? {
                    Some('-') => {
                        if self.eat('-')? {
                            break;
                        }
                        text.push('-');
                    }
                    Some(c) => text.push(c),
                    None => {
                        self.error("Unterminated comment")?;
                        return Ok(text);
                    }
                }
            }

            let mut garbage_reported = false;
            loop {
                match self.get()? {
                    Some('>') => return Ok(text),
                    Some(c) if is_space(c) => {}
                    Some('-') if self.next_is('-')? => {
                        self.skip()?;
                        break;
                    }
                    Some(_) => {
                        if !garbage_reported {
                            garbage_reported = true;
                            self.error("Garbage in comment declaration")?;
                        }
                    }
                    None => {
                        self.error("Unterminated comment declaration")?;
                        return Ok(text);
                    }
                }
            }
        }
    }

    /// Read a processing instruction whose opening `<?` has been consumed, up
    /// to the next `>`. Returns `None` if the input ends first.
    pub(crate) fn processing_instruction(&mut self) -> Result<Option<String>, ParseError> {
        let mut text = String::new();
        loop {
            let _ = self.input.read_until(&mut text, usize::MAX, '>')?;
            match self.get()? {
                Some('>') => return Ok(Some(text)),
                Some(c) => text.push(c),
                None => {
                    self.error("Unterminated processing instruction")?;
                    return Ok(None);
                }
            }
        }
    }

    /// Read a quoted literal. The next character must be the opening quote.
    /// Returns `None` if the input ends before the closing quote.
    pub(crate) fn quoted_literal(&mut self) -> Result<Option<String>, ParseError> {
        let Some(quote) = self.get()? else {
            return Ok(None);
        };
        let mut text = String::new();
        loop {
            match self.get()? {
                Some(c) if c == quote => return Ok(Some(text)),
                Some(c) => text.push(c),
                None => {
                    self.error("Unterminated literal")?;
                    return Ok(None);
                }
            }
        }
    }

    /// Skip the rest of a declaration that is not understood, up to the `>`
    /// that closes it. Quoted literals and bracketed subsets are skipped as a
    /// whole.
    pub(crate) fn skip_declaration(&mut self) -> Result<(), ParseError> {
        let mut depth = 0usize;
        let mut quote: Option<char> = None;
        loop {
            let Some(c) = self.get()? else {
                return self.error("Unterminated declaration");
            };
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '"' | '\'') => quote = Some(c),
                (None, '[') => depth += 1,
                (None, ']') => depth = depth.saturating_sub(1),
                (None, '>') if depth == 0 => return Ok(()),
                (None, _) => {}
            }
        }
    }
}
