//! Audit report extraction.
//!
//! The automation engine writes its HTML report through a text node, so the
//! file that lands in the Drive is sometimes entity-escaped and sometimes
//! surrounded by wrapper text. [`Extraction::parse`] recovers the document
//! between `<!DOCTYPE html>` and the last `</html>`. The result is not
//! sanitised; callers render it inside a sandboxed frame.

const ESCAPED_DOCTYPE: &str = "&lt;!doctype html";
const DOCTYPE: &str = "<!doctype html>";
const CLOSING_TAG: &str = "</html>";
const PREVIEW_CHARS: usize = 500;

/// Outcome of a report extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Doctype through the last closing tag.
    Complete(String),
    /// Doctype found but no closing tag after it; everything from the doctype on.
    Partial(String),
    /// No doctype at all; the input unchanged.
    Fallback(String),
}

impl Extraction {
    pub fn parse(raw: &str) -> Self {
        let decoded;
        let text = if raw.to_ascii_lowercase().contains(ESCAPED_DOCTYPE) {
            decoded = decode_entities(raw);
            decoded.as_str()
        } else {
            raw
        };

        // ASCII lowercasing keeps byte offsets aligned with `text`
        let lower = text.to_ascii_lowercase();
        let Some(start) = lower.find(DOCTYPE) else {
            if !raw.is_empty() {
                tracing::warn!(
                    input_len = raw.len(),
                    preview = %preview(raw),
                    "Report extraction failed: no doctype marker found"
                );
            }
            return Extraction::Fallback(raw.to_string());
        };

        match lower.rfind(CLOSING_TAG) {
            Some(end) if end > start => {
                Extraction::Complete(text[start..end + CLOSING_TAG.len()].to_string())
            }
            _ => {
                tracing::debug!(start, "Report has no closing html tag, keeping partial document");
                Extraction::Partial(text[start..].to_string())
            }
        }
    }

    pub fn html(&self) -> &str {
        match self {
            Extraction::Complete(html) | Extraction::Partial(html) | Extraction::Fallback(html) => {
                html
            }
        }
    }

    pub fn into_html(self) -> String {
        match self {
            Extraction::Complete(html) | Extraction::Partial(html) | Extraction::Fallback(html) => {
                html
            }
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Extraction::Fallback(_))
    }
}

/// Recover a renderable HTML document from a report blob.
pub fn extract_report(raw: &str) -> String {
    Extraction::parse(raw).into_html()
}

/// Decode the five standard entities. `&amp;` goes last so `&amp;lt;` stays `&lt;`.
fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

fn preview(s: &str) -> String {
    s.chars().take(PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_returned_as_is() {
        assert_eq!(extract_report(""), "");
        assert!(Extraction::parse("").is_fallback());
    }

    #[test]
    fn wrapper_text_is_stripped() {
        let raw = "n8n output: <!DOCTYPE html><html><body>diff</body></html>\n-- end";
        assert_eq!(
            Extraction::parse(raw),
            Extraction::Complete("<!DOCTYPE html><html><body>diff</body></html>".to_string())
        );
    }

    #[test]
    fn last_closing_tag_wins() {
        let raw = "<!DOCTYPE html><html><pre>&lt;/html&gt; in text</html></pre></html>trailer";
        assert_eq!(
            extract_report(raw),
            "<!DOCTYPE html><html><pre>&lt;/html&gt; in text</html></pre></html>"
        );
    }

    #[test]
    fn doctype_match_is_case_insensitive() {
        let result = Extraction::parse("<!doctype HTML>X</html>");
        assert_eq!(result, Extraction::Complete("<!doctype HTML>X</html>".to_string()));
    }

    #[test]
    fn missing_closing_tag_keeps_partial_document() {
        let raw = "prefix <!DOCTYPE html><html><body>cut off";
        assert_eq!(
            Extraction::parse(raw),
            Extraction::Partial("<!DOCTYPE html><html><body>cut off".to_string())
        );
    }

    #[test]
    fn closing_tag_before_doctype_is_ignored() {
        let raw = "</html> junk <!DOCTYPE html><p>x";
        assert_eq!(extract_report(raw), "<!DOCTYPE html><p>x");
    }

    #[test]
    fn escaped_report_is_decoded_before_searching() {
        let raw = "{\"data\":\"&lt;!DOCTYPE html&gt;&lt;p class=&quot;a&quot;&gt;it&#39;s&lt;/p&gt;&lt;/html&gt;\"}";
        assert_eq!(
            extract_report(raw),
            "<!DOCTYPE html><p class=\"a\">it's</p></html>"
        );
    }

    #[test]
    fn ampersand_is_decoded_last() {
        let raw = "&lt;!DOCTYPE html&gt;&amp;lt;b&amp;gt;&lt;/html&gt;";
        assert_eq!(extract_report(raw), "<!DOCTYPE html>&lt;b&gt;</html>");
    }

    #[test]
    fn escaped_entities_without_doctype_fall_back_to_raw() {
        let raw = "&lt;p&gt;no document here&lt;/p&gt;";
        let result = Extraction::parse(raw);
        assert!(result.is_fallback());
        assert_eq!(result.html(), raw);
    }

    #[test]
    fn decoding_first_gives_the_same_document() {
        let escaped = "junk &lt;!DOCTYPE html&gt;&lt;body&gt;A&lt;/body&gt;&lt;/html&gt; tail";
        assert_eq!(extract_report(&decode_entities(escaped)), extract_report(escaped));
    }

    #[test]
    fn prefix_and_suffix_do_not_leak_into_the_document() {
        let body = "<html><body>Rev B vs Rev C</body>";
        for (prefix, suffix) in [("", ""), ("abc</p>", "<footer>"), ("<!-- x -->", "\n\n")] {
            let raw = format!("{prefix}<!DOCTYPE html>{body}</html>{suffix}");
            assert_eq!(extract_report(&raw), format!("<!DOCTYPE html>{body}</html>"));
        }
    }

    #[test]
    fn multibyte_text_around_markers_is_safe() {
        let raw = "Größe ✓ <!DOCTYPE html><p>Ventil Ø50</p></html> ✓";
        assert_eq!(extract_report(raw), "<!DOCTYPE html><p>Ventil Ø50</p></html>");
    }
}
