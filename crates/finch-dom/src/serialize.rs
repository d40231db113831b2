//! Canonical tree dump used by parser test fixtures.
//!
//! Every non-root node becomes one line:
//!
//! ```text
//! | <html>
//! |   <head>
//! |   <body>
//! |     "Hello"
//! ```
//!
//! The format is compared byte-for-byte against an external fixture corpus,
//! so it must not change.

use std::fmt::Write;

use crate::{DomTree, NodeId, NodeType};

impl DomTree {
    /// The one-line rendering of a single node: `<name>` for elements, a
    /// quoted literal for text, and the empty string for the Document.
    #[must_use]
    pub fn pretty(&self, id: NodeId) -> String {
        match self.get(id).map(|node| &node.node_type) {
            Some(NodeType::Element(data)) => format!("<{}>", data.tag_name),
            Some(NodeType::Text(data)) => escape_text(data),
            Some(NodeType::Document) | None => String::new(),
        }
    }

    /// Serialize the whole tree in the fixture format. The Document itself is
    /// not listed; its children are at depth 0.
    #[must_use]
    pub fn to_test_string(&self) -> String {
        let mut out = String::new();
        for (id, depth) in self.descendants(NodeId::ROOT) {
            let _ = writeln!(out, "| {}{}", "  ".repeat(depth), self.pretty(id));
        }
        out
    }
}

/// Render text content as a double-quoted literal.
///
/// `"` and `\` are backslash-escaped, common control characters use their
/// short escapes, and any other control character is written as `\uXXXX`.
#[must_use]
pub fn escape_text(data: &str) -> String {
    let mut out = String::with_capacity(data.len() + 2);
    out.push('"');
    for c in data.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\x0C' => out.push_str("\\f"),
            '\x0B' => out.push_str("\\v"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElementData;

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("plain"), "\"plain\"");
        assert_eq!(escape_text("a\nb"), "\"a\\nb\"");
        assert_eq!(escape_text("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(escape_text("back\\slash"), "\"back\\\\slash\"");
        assert_eq!(escape_text("\u{1}"), "\"\\u0001\"");
        assert_eq!(escape_text("caf\u{e9}"), "\"caf\u{e9}\"");
    }

    #[test]
    fn test_pretty_per_node_kind() {
        let mut tree = DomTree::new();
        let div = tree.alloc(NodeType::Element(ElementData::new("div")));
        let text = tree.alloc(NodeType::Text("x".to_string()));
        assert_eq!(tree.pretty(NodeId::ROOT), "");
        assert_eq!(tree.pretty(div), "<div>");
        assert_eq!(tree.pretty(text), "\"x\"");
    }

    #[test]
    fn test_to_test_string_indents_by_depth() {
        let mut tree = DomTree::new();
        let html = tree.alloc(NodeType::Element(ElementData::new("html")));
        let body = tree.alloc(NodeType::Element(ElementData::new("body")));
        let text = tree.alloc(NodeType::Text("hi".to_string()));
        tree.append_child(NodeId::ROOT, html);
        tree.append_child(html, body);
        tree.append_child(body, text);

        assert_eq!(tree.to_test_string(), "| <html>\n|   <body>\n|     \"hi\"\n");
    }

    #[test]
    fn test_empty_tree_serializes_to_nothing() {
        assert_eq!(DomTree::new().to_test_string(), "");
    }
}
