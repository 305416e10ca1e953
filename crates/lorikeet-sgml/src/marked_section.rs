//! Marked section keywords and the stack of open sections.

use strum_macros::{Display, EnumString};

use crate::error::ParseError;
use crate::names::fold;

/// Effective status of a marked section after keyword precedence is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum MarkedSectionKind {
    #[strum(serialize = "IGNORE")]
    Ignore,
    #[strum(serialize = "CDATA")]
    Cdata,
    #[strum(serialize = "RCDATA")]
    Rcdata,
    /// `INCLUDE`, `TEMP`, or no keyword at all.
    #[strum(serialize = "INCLUDE")]
    Include,
}

/// Keywords that may open a marked section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
enum Keyword {
    Ignore,
    Cdata,
    Rcdata,
    Include,
    Temp,
}

impl From<Keyword> for MarkedSectionKind {
    fn from(keyword: Keyword) -> Self {
        match keyword {
            Keyword::Ignore => Self::Ignore,
            Keyword::Cdata => Self::Cdata,
            Keyword::Rcdata => Self::Rcdata,
            Keyword::Include | Keyword::Temp => Self::Include,
        }
    }
}

impl MarkedSectionKind {
    /// Classify a keyword run by precedence IGNORE > CDATA > RCDATA >
    /// INCLUDE/TEMP. Returns the kind and the keywords that were not
    /// recognized.
    pub(crate) fn classify<'k>(
        keywords: &'k [String],
        case_insensitive: bool,
    ) -> (Self, Vec<&'k str>) {
        let mut kind = Self::Include;
        let mut unknown = Vec::new();
        for keyword in keywords {
            let Ok(parsed) = fold(keyword, case_insensitive).parse::<Keyword>() else {
                unknown.push(keyword.as_str());
                continue;
            };
            let candidate = Self::from(parsed);
            if candidate.precedence() > kind.precedence() {
                kind = candidate;
            }
        }
        (kind, unknown)
    }

    const fn precedence(self) -> u8 {
        match self {
            Self::Ignore => 3,
            Self::Cdata => 2,
            Self::Rcdata => 1,
            Self::Include => 0,
        }
    }

    /// Sections whose content is parsed normally are supported. The others
    /// change how content is recognized and are refused.
    pub(crate) fn check_supported(self) -> Result<(), ParseError> {
        match self {
            Self::Include => Ok(()),
            Self::Ignore => Err(ParseError::Unimplemented("IGNORE marked sections")),
            Self::Cdata => Err(ParseError::Unimplemented("CDATA marked sections")),
            Self::Rcdata => Err(ParseError::Unimplemented("RCDATA marked sections")),
        }
    }
}

/// Outcome of a `]]>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SectionClose {
    Closed,
    /// The section was opened inside an entity other than the current one.
    ClosedAcrossEntities,
    NotOpen,
}

/// Open marked sections, each recorded with the entity level it started at.
#[derive(Debug, Default)]
pub(crate) struct MarkedSections {
    open: Vec<usize>,
}

impl MarkedSections {
    pub(crate) fn open(&mut self, level: usize) {
        self.open.push(level);
    }

    pub(crate) fn close(&mut self, level: usize) -> SectionClose {
        match self.open.pop() {
            None => SectionClose::NotOpen,
            Some(opened) if opened == level => SectionClose::Closed,
            Some(_) => SectionClose::ClosedAcrossEntities,
        }
    }

    /// Forget sections opened deeper than `level`. Returns how many.
    pub(crate) fn abandon_deeper_than(&mut self, level: usize) -> usize {
        let keep = self.open.iter().take_while(|&&opened| opened <= level).count();
        let abandoned = self.open.len() - keep;
        self.open.truncate(keep);
        abandoned
    }

    /// Forget all sections. Returns how many were open.
    pub(crate) fn abandon_all(&mut self) -> usize {
        let count = self.open.len();
        self.open.clear();
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| (*w).to_string()).collect()
    }

    #[test]
    fn test_precedence() {
        let words = keywords(&["include", "rcdata", "ignore", "cdata"]);
        assert_eq!(MarkedSectionKind::classify(&words, true).0, MarkedSectionKind::Ignore);
        let words = keywords(&["TEMP", "RCDATA"]);
        assert_eq!(MarkedSectionKind::classify(&words, true).0, MarkedSectionKind::Rcdata);
        assert_eq!(MarkedSectionKind::classify(&[], true).0, MarkedSectionKind::Include);
    }

    #[test]
    fn test_unknown_keywords() {
        let words = keywords(&["INCLUDE", "MAYBE"]);
        let (kind, unknown) = MarkedSectionKind::classify(&words, true);
        assert_eq!(kind, MarkedSectionKind::Include);
        assert_eq!(unknown, vec!["MAYBE"]);
        let words = keywords(&["ignore"]);
        assert_eq!(MarkedSectionKind::classify(&words, false).1, vec!["ignore"]);
    }

    #[test]
    fn test_unsupported_kinds() {
        assert!(MarkedSectionKind::Include.check_supported().is_ok());
        let err = MarkedSectionKind::Ignore.check_supported().unwrap_err();
        assert_eq!(err.to_string(), "IGNORE marked sections are not yet implemented");
    }

    #[test]
    fn test_close_levels() {
        let mut sections = MarkedSections::default();
        assert_eq!(sections.close(0), SectionClose::NotOpen);
        sections.open(0);
        sections.open(1);
        assert_eq!(sections.close(0), SectionClose::ClosedAcrossEntities);
        assert_eq!(sections.close(0), SectionClose::Closed);
        sections.open(0);
        sections.open(2);
        sections.open(2);
        assert_eq!(sections.abandon_deeper_than(1), 2);
        assert_eq!(sections.abandon_all(), 1);
        assert_eq!(sections.abandon_all(), 0);
    }
}
