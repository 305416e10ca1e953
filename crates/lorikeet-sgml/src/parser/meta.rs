//! `<meta http-equiv="Content-Type" content="text/html; charset=...">`.
//!
//! The switch happens right after the `>` of the meta tag, before its
//! attributes are delivered, so everything after the tag is decoded with the
//! declared encoding. A charset with no available transcoder is ignored
//! silently.

use super::BodyParser;
use crate::callbacks::Attr;
use crate::input::{canonical_name, transcoder_for};
use crate::names::is_space;

impl BodyParser<'_, '_> {
    pub(super) fn apply_meta_charset(&mut self, attrs: &[Attr]) {
        let Some(charset) = meta_charset(attrs) else {
            return;
        };
        match canonical_name(charset) {
            Some(name) if name == self.ctx.input.charenc() => {}
            Some(_) => {
                if let Ok(transcoder) = transcoder_for(charset) {
                    self.ctx.input.switch_transcoder(transcoder);
                }
            }
            None => {}
        }
    }
}

/// The charset declared by a meta tag's attributes, if it declares one.
fn meta_charset(attrs: &[Attr]) -> Option<&str> {
    let is_content_type = attrs.iter().any(|attr| {
        attr.name.eq_ignore_ascii_case("http-equiv")
            && attr.value.trim().eq_ignore_ascii_case("Content-Type")
    });
    if !is_content_type {
        return None;
    }
    let content = attrs
        .iter()
        .find(|attr| attr.name.eq_ignore_ascii_case("content"))?;
    charset_from_content(&content.value)
}

/// Extract the token after `charset=` (case-insensitive), stopping at white
/// space or `;`.
fn charset_from_content(content: &str) -> Option<&str> {
    let start = content.to_ascii_lowercase().find("charset=")? + "charset=".len();
    let rest = content[start..].trim_start();
    let rest = rest.trim_start_matches(['"', '\'']);
    let end = rest
        .find(|c: char| is_space(c) || matches!(c, ';' | '"' | '\''))
        .unwrap_or(rest.len());
    let charset = &rest[..end];
    (!charset.is_empty()).then_some(charset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Vec<Attr> {
        pairs.iter().map(|(n, v)| Attr::new(n, v)).collect()
    }

    #[test]
    fn test_charset_from_content() {
        assert_eq!(charset_from_content("text/html; charset=UTF-8"), Some("UTF-8"));
        assert_eq!(charset_from_content("text/html;CHARSET= latin1 ;x"), Some("latin1"));
        assert_eq!(charset_from_content("text/html; charset=\"koi8-r\""), Some("koi8-r"));
        assert_eq!(charset_from_content("text/html"), None);
        assert_eq!(charset_from_content("text/html; charset="), None);
    }

    #[test]
    fn test_requires_content_type_http_equiv() {
        let declared = attrs(&[
            ("HTTP-EQUIV", "content-type"),
            ("content", "text/html; charset=utf-8"),
        ]);
        assert_eq!(meta_charset(&declared), Some("utf-8"));

        let refresh = attrs(&[("http-equiv", "refresh"), ("content", "5; charset=utf-8")]);
        assert_eq!(meta_charset(&refresh), None);

        let no_content = attrs(&[("http-equiv", "Content-Type")]);
        assert_eq!(meta_charset(&no_content), None);
    }
}
