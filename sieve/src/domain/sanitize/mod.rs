//! HTML sanitizer
//!
//! Cleans user-supplied markup before it is rendered in the console:
//! dangerous elements are removed with their content, event handlers and
//! script URLs are stripped from the remaining tags.
//!
//! ## Usage
//!
//! ```
//! use sieve::domain::sanitize::{Sanitizer, escape_html};
//!
//! let sanitizer = Sanitizer::default();
//! let clean = sanitizer.sanitize(r#"<p onclick="x()">hi</p><script>alert(1)</script>"#);
//! assert_eq!(clean, "<p>hi</p>");
//! assert_eq!(escape_html("<b>"), "&lt;b&gt;");
//! ```

mod attributes;

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use attributes::filter_attributes;

/// Elements removed together with everything inside them
pub const DEFAULT_BLOCKED_TAGS: &[&str] = &[
    "script",
    "style",
    "iframe",
    "object",
    "embed",
    "frame",
    "frameset",
    "applet",
    "base",
    "meta",
    "link",
    "form",
    // SVG animation can rewrite href on a sibling element
    "animate",
    "set",
    "animatemotion",
    "animatetransform",
];

/// Upper bound on cleaning passes before the input is escaped wholesale
const MAX_PASSES: usize = 16;

static COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?(?:-->|$)").expect("Invalid regex"));

/// Quoted attribute values may contain `>`
static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<(/?)([a-zA-Z][a-zA-Z0-9:-]*)((?:[^>"']|"[^"]*"|'[^']*')*?)(/?)>"#)
        .expect("Invalid regex")
});

static ANY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[a-zA-Z!][^>]*>").expect("Invalid regex"));

static SCRIPT_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(?:script|style)\s*>").expect("Invalid regex")
});

#[derive(Error, Debug)]
pub enum SanitizeError {
    #[error("Invalid tag name: {0}")]
    InvalidTag(String),

    /// Tag names are validated first, so this only fires when the combined
    /// blocklist pattern exceeds the regex size limit.
    #[error("Failed to compile sanitizer pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Sanitizer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SanitizeOptions {
    pub blocked_tags: Vec<String>,
    /// Keep `data:image/*` URLs (SVG excluded) in `src`/`href`.
    pub allow_data_images: bool,
}

impl Default for SanitizeOptions {
    fn default() -> Self {
        Self {
            blocked_tags: DEFAULT_BLOCKED_TAGS.iter().map(|t| t.to_string()).collect(),
            allow_data_images: false,
        }
    }
}

/// Compiled sanitizer. Build once, reuse for many inputs.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    element: Option<Regex>,
    lone_tag: Option<Regex>,
    allow_data_images: bool,
}

impl Sanitizer {
    pub fn new(options: &SanitizeOptions) -> Result<Self, SanitizeError> {
        let mut names = Vec::with_capacity(options.blocked_tags.len());
        for tag in &options.blocked_tags {
            let tag = tag.trim();
            if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return Err(SanitizeError::InvalidTag(tag.to_string()));
            }
            names.push(regex::escape(&tag.to_ascii_lowercase()));
        }

        let (element, lone_tag) = if names.is_empty() {
            (None, None)
        } else {
            let alternation = names.join("|");
            let element = Regex::new(&format!(
                r"(?is)<(?:{alternation})\b[^>]*>.*?</(?:{alternation})\s*>"
            ))?;
            let lone_tag = Regex::new(&format!(r"(?i)</?(?:{alternation})\b[^>]*>"))?;
            (Some(element), Some(lone_tag))
        };

        tracing::debug!(blocked = names.len(), "Sanitizer compiled");

        Ok(Self {
            element,
            lone_tag,
            allow_data_images: options.allow_data_images,
        })
    }

    /// Remove dangerous markup, keeping the rest intact.
    ///
    /// Passes repeat until the output is stable, since removing one tag can
    /// join its neighbours into another. The result is therefore a fixed
    /// point: sanitizing it again returns it unchanged.
    pub fn sanitize(&self, input: &str) -> String {
        let mut html = input.to_string();
        for _ in 0..MAX_PASSES {
            let next = self.sanitize_pass(&html);
            if next == html {
                return next;
            }
            html = next;
        }

        tracing::warn!(passes = MAX_PASSES, "Sanitizer did not settle, escaping input");
        escape_html(&html)
    }

    fn sanitize_pass(&self, input: &str) -> String {
        let mut html = COMMENT.replace_all(input, "").into_owned();

        if let (Some(element), Some(lone_tag)) = (&self.element, &self.lone_tag) {
            html = element.replace_all(&html, "").into_owned();
            html = lone_tag.replace_all(&html, "").into_owned();
        }

        // Every `<` left outside a rebuilt tag is escaped, so unterminated
        // tags cannot reach the browser.
        let mut out = String::with_capacity(html.len());
        let mut last = 0;
        for caps in TAG.captures_iter(&html) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            out.push_str(&html[last..whole.start()].replace('<', "&lt;"));
            out.push_str(&self.rebuild_tag(&caps));
            last = whole.end();
        }
        out.push_str(&html[last..].replace('<', "&lt;"));
        out
    }

    fn rebuild_tag(&self, caps: &Captures) -> String {
        let name = &caps[2];
        if !caps[1].is_empty() {
            return format!("</{}>", name);
        }
        let attrs = filter_attributes(&caps[3], self.allow_data_images);
        format!("<{}{}{}>", name, attrs, &caps[4])
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        // Built-in tag list is always valid
        Self::new(&SanitizeOptions::default()).expect("default sanitizer options are valid")
    }
}

static DEFAULT_SANITIZER: LazyLock<Sanitizer> = LazyLock::new(Sanitizer::default);

/// Sanitize with the default options
pub fn sanitize_html(input: &str) -> String {
    DEFAULT_SANITIZER.sanitize(input)
}

/// Escape text for safe inclusion in HTML
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Remove every tag, keeping text. Script and style bodies are dropped too.
///
/// Runs until nothing more is removed; a `<` that survives is escaped so the
/// text cannot open a tag when rendered.
pub fn strip_tags(input: &str) -> String {
    let mut text = input.to_string();
    for _ in 0..MAX_PASSES {
        let next = strip_pass(&text);
        if next == text {
            break;
        }
        text = next;
    }
    text.replace('<', "&lt;")
}

fn strip_pass(input: &str) -> String {
    let html = COMMENT.replace_all(input, "");
    let html = SCRIPT_LIKE.replace_all(&html, "");
    ANY_TAG.replace_all(&html, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_script_with_content() {
        let out = sanitize_html("<div>a<script type=\"text/javascript\">alert(1)</script>b</div>");
        assert_eq!(out, "<div>ab</div>");
    }

    #[test]
    fn removes_blocked_tags_case_insensitively() {
        let out = sanitize_html("<IFRAME src=\"https://evil\"></IFRAME><p>x</p>");
        assert_eq!(out, "<p>x</p>");
    }

    #[test]
    fn removes_unclosed_blocked_tags() {
        let out = sanitize_html("<p>x</p><script src=//evil.js>");
        assert_eq!(out, "<p>x</p>");
    }

    #[test]
    fn strips_event_handlers() {
        let out = sanitize_html(r#"<img src="a.png" onerror="alert(1)"/>"#);
        assert_eq!(out, r#"<img src="a.png"/>"#);
    }

    #[test]
    fn strips_javascript_links() {
        let out = sanitize_html(r#"<a href="javascript:alert(1)" class="btn">go</a>"#);
        assert_eq!(out, r#"<a class="btn">go</a>"#);
    }

    #[test]
    fn removes_comments() {
        assert_eq!(sanitize_html("a<!-- <script>x</script> -->b"), "ab");
        assert_eq!(sanitize_html("a<!-- unterminated"), "a");
    }

    #[test]
    fn keeps_safe_markup() {
        let html = r#"<p class="note"><b>Bold</b> <a href="https://example.com">link</a></p>"#;
        assert_eq!(sanitize_html(html), html);
    }

    #[test]
    fn sanitize_is_idempotent() {
        let dirty = r#"<div onmouseover="x()"><style>*{}</style><a href=" javascript:y()">t</a></div>"#;
        let once = sanitize_html(dirty);
        assert_eq!(sanitize_html(&once), once);
        assert!(!once.contains("javascript"));
        assert!(!once.contains("onmouseover"));
    }

    #[test]
    fn custom_blocked_tags() {
        let options = SanitizeOptions {
            blocked_tags: vec!["marquee".to_string()],
            allow_data_images: true,
        };
        let sanitizer = Sanitizer::new(&options).unwrap();
        assert_eq!(sanitizer.sanitize("<marquee>hi</marquee>ok"), "ok");
        assert_eq!(
            sanitizer.sanitize(r#"<img src="data:image/png;base64,AAAA">"#),
            r#"<img src="data:image/png;base64,AAAA">"#
        );
    }

    #[test]
    fn empty_blocklist_still_strips_attributes() {
        let options = SanitizeOptions {
            blocked_tags: vec![],
            allow_data_images: false,
        };
        let sanitizer = Sanitizer::new(&options).unwrap();
        assert_eq!(sanitizer.sanitize("<b onclick=x>t</b>"), "<b>t</b>");
    }

    #[test]
    fn invalid_tag_rejected() {
        let options = SanitizeOptions {
            blocked_tags: vec!["scr|ipt".to_string()],
            allow_data_images: false,
        };
        assert!(matches!(
            Sanitizer::new(&options),
            Err(SanitizeError::InvalidTag(_))
        ));
    }

    #[test]
    fn escape_html_entities() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn strip_tags_keeps_text() {
        assert_eq!(
            strip_tags("<p>Hello <b>world</b><script>evil()</script></p><!-- c -->"),
            "Hello world"
        );
    }

    fn assert_clean(input: &str) -> String {
        let once = sanitize_html(input);
        let lower = once.to_ascii_lowercase();
        assert!(!lower.contains("<script"), "script survived in {:?}", once);
        assert!(!lower.contains("javascript:"), "script URL survived in {:?}", once);
        assert_eq!(sanitize_html(&once), once, "not stable for {:?}", input);
        once
    }

    #[test]
    fn tag_rebuilt_by_removal_is_removed() {
        assert_eq!(assert_clean("<scr<script>ipt src=//evil.js>"), "");
        assert_eq!(
            assert_clean("<<b>script>alert(1)<</b>/script>"),
            "&lt;<b>script>alert(1)&lt;</b>/script>"
        );
    }

    #[test]
    fn nested_blocked_tags() {
        assert_eq!(assert_clean("<script><script>x</script></script>"), "");
        assert_eq!(assert_clean("<p><style><style>*{}</style></style>t</p>"), "<p>t</p>");
    }

    #[test]
    fn unterminated_tag_is_escaped() {
        assert_eq!(assert_clean("<script src=x"), "&lt;script src=x");
        assert_eq!(assert_clean("a <img src=x onerror=alert(1)"), "a &lt;img src=x onerror=alert(1)");
    }

    #[test]
    fn quoted_gt_does_not_end_tag() {
        assert_eq!(
            assert_clean(r#"<img title="a>b" onerror="alert(1)">"#),
            r#"<img title="a>b">"#
        );
    }

    #[test]
    fn svg_animation_removed() {
        let html = r#"<svg><a><animate attributeName="href" values="javascript:alert(1)"/><text>x</text></a></svg>"#;
        assert_eq!(assert_clean(html), "<svg><a><text>x</text></a></svg>");
        assert_eq!(
            assert_clean(r#"<svg><set attributeName="href" to="javascript:alert(1)"/></svg>"#),
            "<svg></svg>"
        );
    }

    #[test]
    fn strip_tags_removes_rebuilt_tags() {
        assert_eq!(strip_tags("<<b>script>alert(1)<</b>/script>"), "");
        assert_eq!(strip_tags("a < b"), "a &lt; b");
        assert_eq!(strip_tags("<p>x</p><script src=x"), "x&lt;script src=x");
    }

    #[test]
    fn pattern_error_display() {
        let err = SanitizeError::from(Regex::new("(").unwrap_err());
        assert!(err.to_string().starts_with("Failed to compile sanitizer pattern"));
    }
}
