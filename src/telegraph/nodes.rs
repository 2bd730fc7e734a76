//! Conversion from the pipeline's HTML subset to the publishing platform's
//! node tree, which is what actually goes over the wire.
//!
//! Page size limits apply to the serialized node JSON, not to the source
//! HTML, so this module is also the single place the rest of the crate asks
//! "how big is this page really".

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::RecapError;

/// Tags the publishing platform accepts. Everything else is stripped and
/// its children lifted into the parent.
const SUPPORTED_TAGS: &[&str] = &[
    "a",
    "aside",
    "b",
    "blockquote",
    "br",
    "code",
    "em",
    "h3",
    "h4",
    "hr",
    "i",
    "li",
    "ol",
    "p",
    "pre",
    "s",
    "small",
    "strong",
    "u",
    "ul",
];

const VOID_TAGS: &[&str] = &["br", "hr"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Text(String),
    Element(NodeElement),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeElement {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attrs: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Node>>,
}

impl NodeElement {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: None,
            children: None,
        }
    }

    fn push_child(&mut self, child: Node) {
        self.children.get_or_insert_with(Vec::new).push(child);
    }
}

/// Parse the HTML subset the pipeline emits into platform nodes.
///
/// The parser is deliberately forgiving: unknown tags are dropped (children
/// kept), stray closing tags are ignored, unclosed elements are closed at
/// end of input. The only hard error is a tag left unterminated at end of
/// input.
pub fn html_to_nodes(html: &str) -> Result<Vec<Node>, RecapError> {
    let mut roots: Vec<Node> = Vec::new();
    let mut stack: Vec<NodeElement> = Vec::new();
    let mut text = String::new();
    let mut rest = html;

    fn flush_text(text: &mut String, stack: &mut [NodeElement], roots: &mut Vec<Node>) {
        if text.is_empty() {
            return;
        }
        let node = Node::Text(unescape_entities(text));
        text.clear();
        match stack.last_mut() {
            Some(parent) => parent.push_child(node),
            None => roots.push(node),
        }
    }

    fn close_element(stack: &mut Vec<NodeElement>, roots: &mut Vec<Node>) {
        if let Some(element) = stack.pop() {
            let node = Node::Element(element);
            match stack.last_mut() {
                Some(parent) => parent.push_child(node),
                None => roots.push(node),
            }
        }
    }

    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('>') else {
            return Err(RecapError::Parse(
                "unterminated tag in page content".to_string(),
            ));
        };
        let raw_tag = &after[..close];
        rest = &after[close + 1..];

        flush_text(&mut text, &mut stack, &mut roots);

        if let Some(name) = raw_tag.strip_prefix('/') {
            let name = normalize_tag(name.trim());
            // Ignore closers for tags we stripped on the way in.
            if !SUPPORTED_TAGS.contains(&name.as_str()) {
                continue;
            }
            if stack.iter().any(|e| e.tag == name) {
                while let Some(top) = stack.last() {
                    let matched = top.tag == name;
                    close_element(&mut stack, &mut roots);
                    if matched {
                        break;
                    }
                }
            }
            continue;
        }

        let trimmed = raw_tag.trim_end_matches('/').trim();
        let (name, attr_src) = match trimmed.split_once(char::is_whitespace) {
            Some((name, attrs)) => (name, attrs),
            None => (trimmed, ""),
        };
        let name = normalize_tag(name);
        if !SUPPORTED_TAGS.contains(&name.as_str()) {
            continue;
        }

        let mut element = NodeElement::new(&name);
        if let Some(href) = parse_attr(attr_src, "href") {
            element
                .attrs
                .get_or_insert_with(BTreeMap::new)
                .insert("href".to_string(), href);
        }

        if VOID_TAGS.contains(&name.as_str()) {
            let node = Node::Element(element);
            match stack.last_mut() {
                Some(parent) => parent.push_child(node),
                None => roots.push(node),
            }
        } else {
            stack.push(element);
        }
    }

    text.push_str(rest);
    flush_text(&mut text, &mut stack, &mut roots);
    while !stack.is_empty() {
        close_element(&mut stack, &mut roots);
    }

    Ok(roots)
}

/// Serialize HTML to the node-JSON wire form.
pub fn content_json(html: &str) -> Result<String, RecapError> {
    let nodes = html_to_nodes(html)?;
    serde_json::to_string(&nodes)
        .map_err(|e| RecapError::Parse(format!("failed to serialize page nodes: {e}")))
}

/// The wire size of the content once serialized. Falls back to the raw
/// character length when the content does not parse, mirroring how callers
/// must stay conservative rather than fail the size check.
#[must_use]
pub fn serialized_size(html: &str) -> usize {
    content_json(html).map_or(html.len(), |json| json.len())
}

/// Concatenated text content of the parsed nodes, tags stripped.
#[must_use]
pub fn collect_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => {
                if let Some(children) = &e.children {
                    out.push_str(&collect_text(children));
                }
            }
        }
    }
    out
}

fn normalize_tag(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    // The platform renders only two heading levels.
    match lower.as_str() {
        "h1" | "h2" => "h3".to_string(),
        "h5" | "h6" => "h4".to_string(),
        other => other.to_string(),
    }
}

fn parse_attr(attr_src: &str, wanted: &str) -> Option<String> {
    let idx = attr_src.find(wanted)?;
    let after = attr_src[idx + wanted.len()..].trim_start();
    let after = after.strip_prefix('=')?.trim_start();
    let quote = after.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let inner = &after[1..];
    let end = inner.find(quote)?;
    Some(unescape_entities(&inner[..end]))
}

fn unescape_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_paragraphs() {
        let nodes = html_to_nodes("<p>one</p><p>two</p>").unwrap();
        assert_eq!(nodes.len(), 2);
        let json = serde_json::to_string(&nodes).unwrap();
        assert_eq!(
            json,
            r#"[{"tag":"p","children":["one"]},{"tag":"p","children":["two"]}]"#
        );
    }

    #[test]
    fn test_nested_inline_markup_and_links() {
        let nodes =
            html_to_nodes(r#"<p>see <a href="https://example.com">the <b>docs</b></a></p>"#)
                .unwrap();
        let json = serde_json::to_string(&nodes).unwrap();
        assert_eq!(
            json,
            r#"[{"tag":"p","children":["see ",{"tag":"a","attrs":{"href":"https://example.com"},"children":["the ",{"tag":"b","children":["docs"]}]}]}]"#
        );
    }

    #[test]
    fn test_void_tags_have_no_children() {
        let nodes = html_to_nodes("<p>a</p><hr><p>b<br>c</p>").unwrap();
        let json = serde_json::to_string(&nodes).unwrap();
        assert!(json.contains(r#"{"tag":"hr"}"#));
        assert!(json.contains(r#"{"tag":"br"}"#));
    }

    #[test]
    fn test_headings_are_clamped_to_platform_levels() {
        let nodes = html_to_nodes("<h2>big</h2><h6>small</h6>").unwrap();
        let json = serde_json::to_string(&nodes).unwrap();
        assert!(json.contains(r#""tag":"h3""#));
        assert!(json.contains(r#""tag":"h4""#));
    }

    #[test]
    fn test_unknown_tags_are_stripped_but_content_kept() {
        let nodes = html_to_nodes("<div><p>kept</p></div>").unwrap();
        let json = serde_json::to_string(&nodes).unwrap();
        assert_eq!(json, r#"[{"tag":"p","children":["kept"]}]"#);
    }

    #[test]
    fn test_entities_unescaped_in_text_nodes() {
        let nodes = html_to_nodes("<p>a &amp; b &lt;tag&gt;</p>").unwrap();
        assert_eq!(collect_text(&nodes), "a & b <tag>");
    }

    #[test]
    fn test_unterminated_tag_is_an_error() {
        assert!(html_to_nodes("<p>truncated<a href=").is_err());
    }

    #[test]
    fn test_serialized_size_tracks_json_not_source() {
        // Markup overhead means serialized size differs from source length.
        let html = "<p>hello</p>";
        let size = serialized_size(html);
        assert_eq!(size, content_json(html).unwrap().len());
        assert!(size > html.len());
    }

    #[test]
    fn test_unclosed_elements_are_closed_at_end() {
        let nodes = html_to_nodes("<p>dangling").unwrap();
        let json = serde_json::to_string(&nodes).unwrap();
        assert_eq!(json, r#"[{"tag":"p","children":["dangling"]}]"#);
    }
}
