//! Message rendering and input validation.
//!
//! Untrusted text is always HTML-escaped before any markup is substituted, so
//! a message can never inject tags of its own. The inline transforms are
//! applied in a fixed order:
//!
//! 1. `\n` → `<br>`
//! 2. `**bold**` → `<strong>bold</strong>`
//! 3. `*italic*` → `<em>italic</em>` (after bold has consumed its delimiters)
//! 4. `` `code` `` → `<code>code</code>`
//! 5. bare `http(s)://` URLs → anchors, only when [`FormatOptions::allow_links`] is set

pub mod timestamp;

pub use timestamp::{format_timestamp, parse_timestamp, relative_time, TimestampStyle};

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("italic pattern is valid"));
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`(.*?)`").expect("code pattern is valid"));
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<]+").expect("url pattern is valid"));
static LINE_BREAK_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("br pattern is valid"));
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Options for [`format`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Turn bare URLs into anchors.
    pub allow_links: bool,
    /// Truncate the raw text to this many characters and append `...`.
    pub max_length: Option<usize>,
}

impl FormatOptions {
    /// Options for assistant replies: links enabled.
    pub fn assistant() -> Self {
        Self {
            allow_links: true,
            max_length: None,
        }
    }

    /// Options for echoing user input: links disabled.
    pub fn user() -> Self {
        Self::default()
    }
}

/// Escape `& < > " '` as HTML entities.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render message text as safe, lightly styled markup.
pub fn format(content: &str, options: &FormatOptions) -> String {
    if content.is_empty() {
        return String::new();
    }

    let escaped = match options.max_length {
        Some(max) if content.chars().count() > max => {
            let truncated: String = content.chars().take(max).collect();
            format!("{}...", escape_html(&truncated))
        }
        _ => escape_html(content),
    };

    let text = escaped.replace('\n', "<br>");
    let text = BOLD.replace_all(&text, "<strong>$1</strong>");
    let text = ITALIC.replace_all(&text, "<em>$1</em>");
    let text = CODE.replace_all(&text, "<code>$1</code>");

    if options.allow_links {
        URL.replace_all(
            &text,
            r#"<a href="$0" target="_blank" rel="noopener noreferrer">$0</a>"#,
        )
        .into_owned()
    } else {
        text.into_owned()
    }
}

/// Recover plain text from formatted markup.
///
/// `<br>` becomes a newline, other tags are removed and entities unescaped.
pub fn strip_formatting(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let text = LINE_BREAK_TAG.replace_all(text, "\n");
    let text = TAG.replace_all(&text, "");

    // &amp; last so "&amp;lt;" yields "&lt;" rather than "<".
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

/// Character count of the text once formatting is stripped.
pub fn plain_text_length(text: &str) -> usize {
    strip_formatting(text).chars().count()
}

/// Constraints for [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationConstraints {
    pub min_length: usize,
    pub max_length: usize,
    pub required: bool,
}

impl Default for ValidationConstraints {
    fn default() -> Self {
        Self {
            min_length: 0,
            max_length: 500,
            required: false,
        }
    }
}

/// Outcome of [`validate`]. Errors keep the order in which checks ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub length: usize,
}

/// Check message content against length and presence constraints.
///
/// Lengths are measured on the trimmed plain text.
pub fn validate(content: &str, constraints: &ValidationConstraints) -> ValidationReport {
    let plain = strip_formatting(content);
    let plain = plain.trim();
    let length = plain.chars().count();
    let mut errors = Vec::new();

    if constraints.required && plain.is_empty() {
        errors.push("Message cannot be empty".to_string());
    }
    if length < constraints.min_length {
        errors.push(format!(
            "Message must be at least {} characters",
            constraints.min_length
        ));
    }
    if length > constraints.max_length {
        errors.push(format!(
            "Message cannot exceed {} characters",
            constraints.max_length
        ));
    }

    ValidationReport {
        valid: errors.is_empty(),
        errors,
        length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_all_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_format_script_is_inert() {
        let out = format("<script>alert(1)</script>", &FormatOptions::assistant());
        assert!(!out.contains("<script>"));
        assert_eq!(out, "&lt;script&gt;alert(1)&lt;/script&gt;");
    }

    #[test]
    fn test_format_bold_then_code() {
        assert_eq!(
            format("**bold** and `code`", &FormatOptions::user()),
            "<strong>bold</strong> and <code>code</code>"
        );
    }

    #[test]
    fn test_format_italic_not_confused_with_bold() {
        assert_eq!(
            format("**strong** and *soft*", &FormatOptions::user()),
            "<strong>strong</strong> and <em>soft</em>"
        );
    }

    #[test]
    fn test_format_line_breaks() {
        assert_eq!(format("one\ntwo", &FormatOptions::user()), "one<br>two");
    }

    #[test]
    fn test_format_links_only_when_allowed() {
        let text = "see https://example.com/docs?a=1&b=2 now";

        let user = format(text, &FormatOptions::user());
        assert!(!user.contains("<a "));

        let assistant = format(text, &FormatOptions::assistant());
        assert_eq!(
            assistant,
            "see <a href=\"https://example.com/docs?a=1&amp;b=2\" target=\"_blank\" \
             rel=\"noopener noreferrer\">https://example.com/docs?a=1&amp;b=2</a> now"
        );
    }

    #[test]
    fn test_format_link_stops_at_line_break() {
        let out = format("http://a.example\nnext", &FormatOptions::assistant());
        assert!(out.contains(r#"href="http://a.example""#));
        assert!(out.ends_with("<br>next"));
    }

    #[test]
    fn test_format_truncates_before_escaping() {
        let options = FormatOptions {
            allow_links: false,
            max_length: Some(5),
        };
        assert_eq!(format("a&b<c>defgh", &options), "a&amp;b&lt;c...");
        assert_eq!(format("short", &options), "short");
    }

    #[test]
    fn test_format_empty() {
        assert_eq!(format("", &FormatOptions::assistant()), "");
    }

    #[test]
    fn test_strip_formatting_round_trip() {
        let formatted = format("**bold** and `code`", &FormatOptions::user());
        assert_eq!(strip_formatting(&formatted), "bold and code");
    }

    #[test]
    fn test_strip_formatting_line_breaks_and_entities() {
        assert_eq!(
            strip_formatting("a<br>b<BR/>&lt;tag&gt; &amp;lt;"),
            "a\nb\n<tag> &lt;"
        );
    }

    #[test]
    fn test_plain_text_length_counts_characters() {
        assert_eq!(plain_text_length("<strong>åäö</strong>"), 3);
        assert_eq!(plain_text_length("&amp;"), 1);
    }

    #[test]
    fn test_validate_required_empty() {
        let constraints = ValidationConstraints {
            required: true,
            ..Default::default()
        };
        let report = validate("   ", &constraints);
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Message cannot be empty"]);
        assert_eq!(report.length, 0);
    }

    #[test]
    fn test_validate_too_long() {
        let report = validate(&"x".repeat(501), &ValidationConstraints::default());
        assert!(!report.valid);
        assert_eq!(report.errors, vec!["Message cannot exceed 500 characters"]);
        assert_eq!(report.length, 501);
    }

    #[test]
    fn test_validate_errors_keep_order() {
        let constraints = ValidationConstraints {
            min_length: 3,
            max_length: 500,
            required: true,
        };
        let report = validate("", &constraints);
        assert_eq!(
            report.errors,
            vec![
                "Message cannot be empty",
                "Message must be at least 3 characters"
            ]
        );
    }

    #[test]
    fn test_validate_measures_plain_text() {
        let report = validate("<strong>hej</strong>", &ValidationConstraints::default());
        assert!(report.valid);
        assert_eq!(report.length, 3);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_escaped_text_has_no_markup(input in ".{0,200}") {
                let escaped = escape_html(&input);
                for c in ['<', '>', '"', '\''] {
                    prop_assert!(!escaped.contains(c), "escaped output contains {:?}", c);
                }
            }

            #[test]
            fn prop_strip_undoes_escape(input in ".{0,200}") {
                prop_assert_eq!(strip_formatting(&escape_html(&input)), input);
            }

            #[test]
            fn prop_user_format_never_emits_foreign_tags(input in "[<>a-z/ *`\n]{0,80}") {
                let out = format(&input, &FormatOptions::user());
                let stripped_known = out
                    .replace("<br>", "")
                    .replace("<strong>", "")
                    .replace("</strong>", "")
                    .replace("<em>", "")
                    .replace("</em>", "")
                    .replace("<code>", "")
                    .replace("</code>", "");
                prop_assert!(!stripped_known.contains('<'));
            }
        }
    }
}
