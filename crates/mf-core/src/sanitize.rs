//! HTML sanitization for user-submitted posts.
//!
//! Post bodies keep a small allow-list of formatting tags and are wrapped in
//! a preformatted block so line breaks survive. Titles and author names are
//! reduced to plain text; templates escape them on output.

use std::collections::HashSet;

use ammonia::Builder;
use once_cell::sync::Lazy;

/// Tags a post body may keep. No attributes are allowed on any of them.
pub const CONTENT_TAGS: &[&str] = &["pre", "code", "b", "i", "strong", "em", "p", "br"];

/// Elements removed together with everything inside them.
const DROPPED_WITH_CONTENT: &[&str] = &["script", "style"];

static CONTENT_CLEANER: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::empty();
    builder
        .tags(CONTENT_TAGS.iter().copied().collect::<HashSet<_>>())
        .clean_content_tags(DROPPED_WITH_CONTENT.iter().copied().collect::<HashSet<_>>());
    builder
});

static TEXT_CLEANER: Lazy<Builder<'static>> = Lazy::new(|| {
    let mut builder = Builder::empty();
    builder.clean_content_tags(DROPPED_WITH_CONTENT.iter().copied().collect::<HashSet<_>>());
    builder
});

/// Where a sanitized body will be stored; each has its own wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostKind {
    Thread,
    Reply,
}

impl PostKind {
    fn wrap(self, body: &str) -> String {
        match self {
            PostKind::Thread => format!("<pre class=\"responsive\">{body}</pre>"),
            PostKind::Reply => format!("<pre>{body}</pre>"),
        }
    }
}

/// Strips everything outside the allow-list. Returns None when nothing
/// but whitespace remains.
pub fn sanitize_content(raw: &str, kind: PostKind) -> Option<String> {
    let cleaned = CONTENT_CLEANER.clean(raw).to_string();
    if cleaned.trim().is_empty() {
        return None;
    }
    Some(kind.wrap(&cleaned))
}

/// Removes every tag and decodes entities, leaving plain trimmed text.
pub fn sanitize_text(raw: &str) -> String {
    let cleaned = TEXT_CLEANER.clean(raw).to_string();
    html_escape::decode_html_entities(&cleaned).trim().to_string()
}

/// Like [`sanitize_text`], but an empty result means "no value".
pub fn sanitize_optional_text(raw: &str) -> Option<String> {
    let text = sanitize_text(raw);
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_loses_script_entirely() {
        assert_eq!(sanitize_text("<script>alert(1)</script>"), "");
    }

    #[test]
    fn test_text_keeps_inner_text_and_decodes_entities() {
        assert_eq!(sanitize_text("<b>Hello</b> &amp; bye"), "Hello & bye");
        assert_eq!(sanitize_text("  1 < 2  "), "1 < 2");
    }

    #[test]
    fn test_optional_text_maps_blank_to_none() {
        assert_eq!(sanitize_optional_text("   "), None);
        assert_eq!(sanitize_optional_text("<i></i>"), None);
        assert_eq!(sanitize_optional_text("dana"), Some("dana".to_string()));
    }

    #[test]
    fn test_reply_content_keeps_allowed_tags_and_drops_script() {
        let content = sanitize_content("<b>hi</b><script>bad</script>", PostKind::Reply);
        assert_eq!(content.as_deref(), Some("<pre><b>hi</b></pre>"));
    }

    #[test]
    fn test_thread_content_uses_responsive_wrapper() {
        let content = sanitize_content("hello", PostKind::Thread);
        assert_eq!(content.as_deref(), Some("<pre class=\"responsive\">hello</pre>"));
    }

    #[test]
    fn test_attributes_are_stripped() {
        let content = sanitize_content(
            "<p onclick=\"x()\" style=\"color:red\">text</p><a href=\"http://evil\">link</a>",
            PostKind::Reply,
        );
        assert_eq!(content.as_deref(), Some("<pre><p>text</p>link</pre>"));
    }

    #[test]
    fn test_content_that_sanitizes_to_nothing_is_rejected() {
        assert_eq!(sanitize_content("<script>only()</script>", PostKind::Thread), None);
        assert_eq!(sanitize_content("   ", PostKind::Reply), None);
    }
}
