//! Frame meta-tag codec
//!
//! A frame is an HTML document whose behaviour lives entirely in meta tags:
//! ```text
//! <meta property="fc:frame:image" content="https://..." />
//! <meta property="fc:frame:button:1" content="Pay" />
//! ```
//! The payment processor replies with such a document. The server decodes the
//! handful of tags it relays and encodes its own frames with the same shape.

use thiserror::Error;

/// Maximum document size accepted for decoding (1 MB)
pub const MAX_DOCUMENT_SIZE: usize = 1024 * 1024;

pub const FRAME_IMAGE: &str = "fc:frame:image";
pub const FRAME_POST_URL: &str = "fc:frame:post_url";
pub const FRAME_BUTTON: &str = "fc:frame:button:1";
pub const FRAME_BUTTON_ACTION: &str = "fc:frame:button:1:action";
pub const FRAME_BUTTON_TARGET: &str = "fc:frame:button:1:target";
pub const OG_TITLE: &str = "og:title";

/// Errors that can occur during decoding
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodecError {
    #[error("Document too large: {0} bytes (max: {MAX_DOCUMENT_SIZE})")]
    DocumentTooLarge(usize),

    #[error("Missing meta tag: {0}")]
    MissingTag(&'static str),
}

/// A single `<meta property=... content=...>` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTag {
    pub property: String,
    pub content: String,
}

/// Frame fields relayed from a payment processor response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentFrame {
    pub title: String,
    pub image: String,
    pub button_label: String,
    pub button_action: String,
    pub button_target: String,
    pub post_url: String,
}

impl PaymentFrame {
    /// Decode the relayed fields from a processor document
    ///
    /// The image and button label are required; the rest default to empty.
    pub fn decode(html: &str) -> Result<Self, CodecError> {
        let tags = decode(html)?;
        let get = |property: &str| find(&tags, property).unwrap_or_default().to_string();

        let image = find(&tags, FRAME_IMAGE).ok_or(CodecError::MissingTag(FRAME_IMAGE))?;
        let button_label = find(&tags, FRAME_BUTTON).ok_or(CodecError::MissingTag(FRAME_BUTTON))?;

        Ok(Self {
            title: get(OG_TITLE),
            image: image.to_string(),
            button_label: button_label.to_string(),
            button_action: get(FRAME_BUTTON_ACTION),
            button_target: get(FRAME_BUTTON_TARGET),
            post_url: get(FRAME_POST_URL),
        })
    }
}

/// Decode every meta tag carrying a `property` (or `name`) and `content`
pub fn decode(html: &str) -> Result<Vec<MetaTag>, CodecError> {
    if html.len() > MAX_DOCUMENT_SIZE {
        return Err(CodecError::DocumentTooLarge(html.len()));
    }

    // ASCII lowercasing keeps byte offsets aligned with `html`
    let lower = html.to_ascii_lowercase();
    let mut tags = Vec::new();
    let mut pos = 0;

    while let Some(found) = lower[pos..].find("<meta") {
        let attrs_start = pos + found + "<meta".len();
        let (attrs, consumed) = parse_attributes(&html[attrs_start..]);
        pos = attrs_start + consumed;

        let property = attrs
            .iter()
            .find(|(k, _)| k == "property" || k == "name")
            .map(|(_, v)| v.clone());
        let content = attrs
            .iter()
            .find(|(k, _)| k == "content")
            .map(|(_, v)| v.clone());

        if let (Some(property), Some(content)) = (property, content) {
            tags.push(MetaTag { property, content });
        }
    }

    Ok(tags)
}

/// First content for `property`
pub fn find<'a>(tags: &'a [MetaTag], property: &str) -> Option<&'a str> {
    tags.iter()
        .find(|t| t.property == property)
        .map(|t| t.content.as_str())
}

/// Encode one meta tag
pub fn encode(property: &str, content: &str) -> String {
    format!(
        r#"<meta property="{}" content="{}" />"#,
        escape(property),
        escape(content)
    )
}

/// Escape text for an HTML attribute or text node
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Parse attributes up to the closing `>` of a tag.
///
/// Returns the lowercased attribute names with unescaped values, and the
/// number of bytes consumed (including the `>` when present).
fn parse_attributes(src: &str) -> (Vec<(String, String)>, usize) {
    let mut attrs = Vec::new();
    let mut chars = src.char_indices().peekable();

    loop {
        while matches!(chars.peek(), Some((_, c)) if c.is_whitespace() || *c == '/') {
            chars.next();
        }

        let Some(&(start, c)) = chars.peek() else {
            return (attrs, src.len());
        };
        if c == '>' {
            return (attrs, start + 1);
        }

        let mut end = start;
        while let Some(&(i, c)) = chars.peek() {
            if c.is_whitespace() || c == '=' || c == '>' || c == '/' {
                break;
            }
            end = i + c.len_utf8();
            chars.next();
        }
        let name = src[start..end].to_ascii_lowercase();

        while matches!(chars.peek(), Some((_, c)) if c.is_whitespace()) {
            chars.next();
        }

        if !matches!(chars.peek(), Some((_, '='))) {
            if !name.is_empty() {
                attrs.push((name, String::new()));
            }
            continue;
        }
        chars.next();

        while matches!(chars.peek(), Some((_, c)) if c.is_whitespace()) {
            chars.next();
        }

        let value = match chars.peek().copied() {
            Some((i, quote @ ('"' | '\''))) => {
                chars.next();
                let value_start = i + 1;
                let mut value_end = src.len();
                for (j, c) in chars.by_ref() {
                    if c == quote {
                        value_end = j;
                        break;
                    }
                }
                &src[value_start..value_end.max(value_start)]
            }
            Some((i, _)) => {
                let mut value_end = i;
                while let Some(&(j, c)) = chars.peek() {
                    if c.is_whitespace() || c == '>' {
                        break;
                    }
                    value_end = j + c.len_utf8();
                    chars.next();
                }
                &src[i..value_end]
            }
            None => "",
        };

        attrs.push((name, unescape(value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROCESSOR_DOC: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <META property="og:title" content="Pay to drive" />
    <meta property="fc:frame" content="vNext" />
    <meta property="fc:frame:image" content="https://pay.example/img?a=1&amp;b=2" />
    <meta property='fc:frame:button:1' content='Pay 0.1 USDC' >
    <meta property="fc:frame:button:1:action" content="tx">
    <meta property="fc:frame:button:1:target" content="https://pay.example/tx/99" />
    <meta name="fc:frame:post_url" content="https://frames.example/callback/A" />
  </head>
</html>"#;

    #[test]
    fn test_decode_payment_frame() {
        let frame = PaymentFrame::decode(PROCESSOR_DOC).expect("decode failed");

        assert_eq!(frame.title, "Pay to drive");
        assert_eq!(frame.image, "https://pay.example/img?a=1&b=2");
        assert_eq!(frame.button_label, "Pay 0.1 USDC");
        assert_eq!(frame.button_action, "tx");
        assert_eq!(frame.button_target, "https://pay.example/tx/99");
        assert_eq!(frame.post_url, "https://frames.example/callback/A");
    }

    #[test]
    fn test_missing_image_is_rejected() {
        let doc = r#"<meta property="fc:frame:button:1" content="Pay" />"#;
        assert_eq!(
            PaymentFrame::decode(doc),
            Err(CodecError::MissingTag(FRAME_IMAGE))
        );
    }

    #[test]
    fn test_gt_inside_quoted_value() {
        let doc = r#"<meta property="og:title" content="a > b"><meta property="x" content=y>"#;
        let tags = decode(doc).expect("decode failed");

        assert_eq!(find(&tags, OG_TITLE), Some("a > b"));
        assert_eq!(find(&tags, "x"), Some("y"));
    }

    #[test]
    fn test_truncated_document() {
        let tags = decode(r#"<meta property="og:title" content="cut"#).expect("decode failed");
        assert_eq!(find(&tags, OG_TITLE), Some("cut"));
    }

    #[test]
    fn test_document_too_large() {
        let doc = " ".repeat(MAX_DOCUMENT_SIZE + 1);
        assert!(matches!(decode(&doc), Err(CodecError::DocumentTooLarge(_))));
    }

    #[test]
    fn test_encode_escapes_content() {
        let tag = encode(FRAME_BUTTON, r#"Say "hi" & <go>"#);
        assert_eq!(
            tag,
            r#"<meta property="fc:frame:button:1" content="Say &quot;hi&quot; &amp; &lt;go&gt;" />"#
        );

        let tags = decode(&tag).expect("decode failed");
        assert_eq!(find(&tags, FRAME_BUTTON), Some(r#"Say "hi" & <go>"#));
    }
}
