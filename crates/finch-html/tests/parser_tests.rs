//! Integration tests for the HTML parser.

use finch_common::warning::MAX_KEY_LEN;
use finch_dom::{DomTree, NodeId, NodeType};
use finch_html::{
    ActiveFormattingElement, HTMLParser, InsertionMode, parse_document, parse_document_with_issues,
};
use strum::IntoEnumIterator;

/// Helper to parse HTML and return the DOM tree
fn parse(html: &str) -> DomTree {
    parse_document(html).expect("input should tokenize")
}

/// Helper to parse HTML and return the canonical dump
fn dump(html: &str) -> String {
    parse(html).to_test_string()
}

/// Expected dump of a document whose body holds `body_lines`, each already
/// indented relative to the body.
fn document_with_body(body_lines: &[&str]) -> String {
    let mut expected = String::from("| <html>\n|   <head>\n|   <body>\n");
    for line in body_lines {
        expected.push_str("|     ");
        expected.push_str(line);
        expected.push('\n');
    }
    expected
}

/// Helper to get element by tag name (first match, depth-first)
fn find_element(tree: &DomTree, from: NodeId, tag: &str) -> Option<NodeId> {
    if let Some(data) = tree.as_element(from)
        && data.tag_name == tag
    {
        return Some(from);
    }
    for &child_id in tree.children(from) {
        if let Some(found) = find_element(tree, child_id, tag) {
            return Some(found);
        }
    }
    None
}

/// Helper to get text content of a node (concatenated)
fn text_content(tree: &DomTree, id: NodeId) -> String {
    let mut result = String::new();
    if let Some(node) = tree.get(id) {
        match &node.node_type {
            NodeType::Text(data) => result.push_str(data),
            _ => {
                for &child_id in tree.children(id) {
                    result.push_str(&text_content(tree, child_id));
                }
            }
        }
    }
    result
}

/// Tag names of the open elements, bottom first. The Document is skipped.
fn open_tag_names(parser: &HTMLParser) -> Vec<String> {
    parser
        .open_elements()
        .iter()
        .filter_map(|&id| parser.tree().tag_name(id).map(str::to_string))
        .collect()
}

/// Step the parser until the token stream is exhausted.
fn step_to_end(parser: &mut HTMLParser) {
    while parser.step().expect("input should tokenize") {}
}

// ========== document scaffolding ==========

#[test]
fn test_document_structure() {
    let tree = parse("<!DOCTYPE html><html><head></head><body>Hi</body></html>");

    let root = tree.get(NodeId::ROOT).unwrap();
    assert!(matches!(root.node_type, NodeType::Document));
    assert_eq!(tree.to_test_string(), document_with_body(&["\"Hi\""]));
}

#[test]
fn test_implicit_html_head_body() {
    assert_eq!(dump("Hello"), document_with_body(&["\"Hello\""]));
}

#[test]
fn test_empty_input_is_a_bare_document() {
    let tree = parse("");
    assert_eq!(tree.len(), 1);
    assert!(tree.children(NodeId::ROOT).is_empty());
    assert_eq!(tree.to_test_string(), "");
}

#[test]
fn test_doctype_only_document() {
    let tree = parse("<!DOCTYPE html>\n");
    assert!(tree.children(NodeId::ROOT).is_empty());
    assert_eq!(tree.document_element(), None);
}

#[test]
fn test_head_element_is_empty() {
    let tree = parse("<head></head><p>x");
    let html = tree.document_element().unwrap();
    let head = find_element(&tree, html, "head").unwrap();
    assert!(tree.children(head).is_empty());
    assert_eq!(tree.children(html).len(), 2);
    assert_eq!(tree.body(), Some(tree.children(html)[1]));
}

#[test]
fn test_html_and_body_attributes_are_kept() {
    let tree = parse(r#"<html lang="en"><body class=main>x"#);
    let html = tree.document_element().unwrap();
    let body = tree.body().unwrap();
    assert_eq!(tree.as_element(html).unwrap().attrs.get("lang"), Some("en"));
    assert_eq!(tree.as_element(body).unwrap().attrs.get("class"), Some("main"));
}

#[test]
fn test_comments_are_dropped() {
    let tree = parse("<!-- c --><p>x<!-- d -->y");
    let p = find_element(&tree, NodeId::ROOT, "p").unwrap();
    assert_eq!(tree.children(p).len(), 1);
    assert_eq!(text_content(&tree, p), "xy");
}

// ========== in body ==========

#[test]
fn test_paragraph_closed_by_paragraph() {
    assert_eq!(
        dump("<p>a<p>b"),
        document_with_body(&["<p>", "  \"a\"", "<p>", "  \"b\""])
    );
}

#[test]
fn test_block_closes_paragraph() {
    assert_eq!(
        dump("<p>a<div>b</div>"),
        document_with_body(&["<p>", "  \"a\"", "<div>", "  \"b\""])
    );
}

#[test]
fn test_headings_do_not_nest() {
    assert_eq!(
        dump("<h1>a<h2>b"),
        document_with_body(&["<h1>", "  \"a\"", "<h2>", "  \"b\""])
    );
}

#[test]
fn test_end_tag_closes_paragraph() {
    assert_eq!(
        dump("<p>a</p>b"),
        document_with_body(&["<p>", "  \"a\"", "\"b\""])
    );
}

#[test]
fn test_end_tag_only_closes_paragraphs() {
    // </div> finds its div but only a p would be popped.
    assert_eq!(
        dump("<div>a</div>b"),
        document_with_body(&["<div>", "  \"ab\""])
    );
}

#[test]
fn test_end_tag_without_open_element_is_ignored() {
    let (tree, issues) = parse_document_with_issues("<p>a</span>b").unwrap();
    let p = find_element(&tree, NodeId::ROOT, "p").unwrap();
    assert_eq!(text_content(&tree, p), "ab");
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].token_index, 2);
    assert!(issues[0].message.contains("</span>"));
}

#[test]
fn test_void_elements_are_leaves() {
    let tree = parse("<p>a<br>b<img src=x></img>c<input type=text>d<hr>e");
    for (id, _) in tree.descendants(NodeId::ROOT) {
        if let Some(name) = tree.tag_name(id)
            && matches!(name, "br" | "img" | "input" | "hr")
        {
            assert!(tree.children(id).is_empty(), "<{name}> has children");
        }
    }
    assert_eq!(
        tree.to_test_string(),
        document_with_body(&[
            "<p>",
            "  \"a\"",
            "  <br>",
            "  \"b\"",
            "  <img>",
            "  \"c\"",
            "  <input>",
            "  \"d\"",
            "<hr>",
            "\"e\"",
        ])
    );
}

#[test]
fn test_element_attributes() {
    let tree = parse(r#"<div id="main" class='a b' hidden>x</div>"#);
    let div = find_element(&tree, NodeId::ROOT, "div").unwrap();
    let attrs = &tree.as_element(div).unwrap().attrs;
    assert_eq!(attrs.get("id"), Some("main"));
    assert_eq!(attrs.get("class"), Some("a b"));
    assert_eq!(attrs.get("hidden"), Some(""));
    assert_eq!(attrs.len(), 3);
}

#[test]
fn test_second_body_start_tag_is_ignored() {
    let (tree, issues) = parse_document_with_issues("<body>a<body>b").unwrap();
    assert_eq!(tree.to_test_string(), document_with_body(&["\"ab\""]));
    assert_eq!(issues.len(), 1);
    assert!(issues[0].message.contains("<body>"));
}

// ========== text coalescing ==========

#[test]
fn test_adjacent_text_is_merged() {
    let tree = parse("<body>\nx");
    let body = tree.body().unwrap();
    assert_eq!(tree.children(body).len(), 1);
    assert_eq!(tree.as_text(tree.children(body)[0]), Some("\nx"));
}

#[test]
fn test_text_coalescing_can_be_disabled() {
    let tree = HTMLParser::new("<body>\nx".to_string())
        .with_text_coalescing(false)
        .run()
        .unwrap();
    let body = tree.body().unwrap();
    let texts: Vec<_> = tree
        .children(body)
        .iter()
        .filter_map(|&id| tree.as_text(id))
        .collect();
    assert_eq!(texts, vec!["\n", "x"]);
}

// ========== adoption agency ==========

#[test]
fn test_misnested_formatting_around_block() {
    assert_eq!(
        dump("<b>1<p>2</b>3"),
        document_with_body(&[
            "<b>",
            "  \"1\"",
            "<p>",
            "  <b>",
            "    \"2\"",
            "  \"3\"",
        ])
    );
}

#[test]
fn test_misnested_inline_formatting() {
    assert_eq!(
        dump("<b><i>x</b>y</i>z"),
        document_with_body(&[
            "<b>",
            "  <i>",
            "    \"x\"",
            "<i>",
            "  \"y\"",
            "\"z\"",
        ])
    );
}

#[test]
fn test_adoption_copies_attributes() {
    let tree = parse(r#"<a href="/x">1<div>2</a>3"#);
    let body = tree.body().unwrap();
    let div = find_element(&tree, body, "div").unwrap();
    let inner_a = tree.children(div)[0];

    assert_eq!(tree.tag_name(inner_a), Some("a"));
    assert_eq!(tree.as_element(inner_a).unwrap().attrs.get("href"), Some("/x"));
    assert_eq!(text_content(&tree, inner_a), "2");
    assert_eq!(tree.as_text(tree.children(div)[1]), Some("3"));
}

#[test]
fn test_reopened_formatting_element_is_active() {
    let mut parser = HTMLParser::new("<b><i>x</b>".to_string());
    step_to_end(&mut parser);

    assert_eq!(open_tag_names(&parser), vec!["html", "body", "i"]);
    let [ActiveFormattingElement::Element { node_id }] = parser.active_formatting_elements()
    else {
        panic!("expected exactly one active formatting element");
    };
    assert_eq!(parser.tree().tag_name(*node_id), Some("i"));
}

#[test]
fn test_formatting_end_tag_without_open_element() {
    let (tree, issues) = parse_document_with_issues("<p>a</b>b").unwrap();
    assert_eq!(
        tree.to_test_string(),
        document_with_body(&["<p>", "  \"ab\""])
    );
    assert_eq!(issues.len(), 1);
}

// ========== tables ==========

#[test]
fn test_table_scaffolding() {
    assert_eq!(
        dump("<table><td>x"),
        document_with_body(&[
            "<table>",
            "  <tbody>",
            "    <tr>",
            "      <td>",
            "        \"x\"",
        ])
    );
}

#[test]
fn test_table_cells_and_rows() {
    assert_eq!(
        dump("<table><tr><td>a<td>b<tr><td>c</table>after"),
        document_with_body(&[
            "<table>",
            "  <tbody>",
            "    <tr>",
            "      <td>",
            "        \"a\"",
            "      <td>",
            "        \"b\"",
            "    <tr>",
            "      <td>",
            "        \"c\"",
            "\"after\"",
        ])
    );
}

#[test]
fn test_explicit_table_sections() {
    assert_eq!(
        dump("<table><thead><tr><th>h</th></tr></thead><tbody><tr><td>d</td></tr></tbody></table>"),
        document_with_body(&[
            "<table>",
            "  <thead>",
            "    <tr>",
            "      <th>",
            "        \"h\"",
            "  <tbody>",
            "    <tr>",
            "      <td>",
            "        \"d\"",
        ])
    );
}

#[test]
fn test_text_directly_in_table_is_dropped() {
    let (tree, issues) =
        parse_document_with_issues("<table>x<tr><td>y</td></tr></table>").unwrap();
    assert_eq!(
        tree.to_test_string(),
        document_with_body(&[
            "<table>",
            "  <tbody>",
            "    <tr>",
            "      <td>",
            "        \"y\"",
        ])
    );
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].token_index, 1);
}

#[test]
fn test_dropped_text_is_not_quoted_in_issues() {
    let input = format!("<table>{}", "x".repeat(100_000));
    let (_, issues) = parse_document_with_issues(&input).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].message, "text dropped in \"InTable\" insertion mode");
    assert!(issues[0].message.len() < MAX_KEY_LEN);
}

#[test]
fn test_formatting_end_tag_splits_table_out_of_cell() {
    let mut parser = HTMLParser::new("<i><table><td></i>x".to_string());
    step_to_end(&mut parser);

    assert_eq!(parser.insertion_mode(), InsertionMode::InTable);
    assert_eq!(open_tag_names(&parser), vec!["html", "body", "table"]);
    assert_eq!(parser.issues().len(), 1);
    assert_eq!(
        parser.tree().to_test_string(),
        document_with_body(&[
            "<i>",
            "<table>",
            "  <i>",
            "    <tbody>",
            "      <tr>",
            "        <td>",
        ])
    );
}

#[test]
fn test_nested_table_resets_to_outer_cell() {
    assert_eq!(
        dump("<table><td><table><td>x</table>y</table>z"),
        document_with_body(&[
            "<table>",
            "  <tbody>",
            "    <tr>",
            "      <td>",
            "        <table>",
            "          <tbody>",
            "            <tr>",
            "              <td>",
            "                \"x\"",
            "        \"y\"",
            "\"z\"",
        ])
    );
}

#[test]
fn test_table_closes_paragraph() {
    assert_eq!(
        dump("<p>a<table><td>b</table>"),
        document_with_body(&[
            "<p>",
            "  \"a\"",
            "<table>",
            "  <tbody>",
            "    <tr>",
            "      <td>",
            "        \"b\"",
        ])
    );
}

#[test]
fn test_cell_scopes_active_formatting_elements() {
    let mut parser = HTMLParser::new("<table><td><b>x".to_string());
    step_to_end(&mut parser);
    assert_eq!(parser.insertion_mode(), InsertionMode::InCell);
    assert_eq!(parser.active_formatting_elements().len(), 2);
    assert_eq!(
        parser.active_formatting_elements()[0],
        ActiveFormattingElement::Marker
    );

    let mut parser = HTMLParser::new("<table><td><b>x</td>".to_string());
    step_to_end(&mut parser);
    assert_eq!(parser.insertion_mode(), InsertionMode::InRow);
    assert!(parser.active_formatting_elements().is_empty());
    assert_eq!(open_tag_names(&parser), vec!["html", "body", "table", "tbody", "tr"]);
}

#[test]
fn test_insertion_modes_while_building_a_table() {
    let mut parser = HTMLParser::new("<table><tr><td>x</td></tr></table>".to_string());
    let mut modes = vec![parser.insertion_mode()];
    while parser.step().unwrap() {
        if modes.last() != Some(&parser.insertion_mode()) {
            modes.push(parser.insertion_mode());
        }
    }
    if modes.last() != Some(&parser.insertion_mode()) {
        modes.push(parser.insertion_mode());
    }

    let names: Vec<_> = modes.iter().map(ToString::to_string).collect();
    assert_eq!(
        names,
        vec![
            "Initial",
            "BeforeHtml",
            "BeforeHead",
            "AfterHead",
            "InBody",
            "InTable",
            "InTableBody",
            "InRow",
            "InCell",
            "InRow",
            "InTableBody",
            "InBody",
        ]
    );
}

#[test]
fn test_insertion_mode_names_are_distinct() {
    let names: Vec<_> = InsertionMode::iter().map(|mode| mode.to_string()).collect();
    assert_eq!(names.len(), 10);
    for (i, name) in names.iter().enumerate() {
        assert!(!names[i + 1..].contains(name), "duplicate mode name {name}");
    }
    assert_eq!(names.first().map(String::as_str), Some("Initial"));
    assert_eq!(names.last().map(String::as_str), Some("InCell"));
}

// ========== invariants ==========

#[test]
fn test_open_elements_stay_attached() {
    let inputs = [
        "<p>a<div>b<span>c</span></div>",
        "<b>1<p>2</b>3",
        "<table><tr><td><i>x</td><td>y</table>z",
        "<h1><h2>x</h2></h1>",
    ];
    for input in inputs {
        let mut parser = HTMLParser::new(input.to_string());
        loop {
            assert_eq!(parser.open_elements()[0], NodeId::ROOT);
            for &id in parser.open_elements() {
                assert!(
                    id == NodeId::ROOT || parser.tree().is_descendant_of(id, NodeId::ROOT),
                    "open element detached while parsing {input:?}"
                );
            }
            if !parser.step().unwrap() {
                break;
            }
        }
    }
}

#[test]
fn test_serialization_is_idempotent() {
    let input = "<div><b>x<p>y</b></div><table><td>z</table>";
    let tree = parse(input);
    assert_eq!(tree.to_test_string(), tree.to_test_string());
    assert_eq!(tree.to_test_string(), dump(input));
}

#[test]
fn test_text_is_escaped_in_dump() {
    assert_eq!(
        dump("say \"hi\"\\"),
        document_with_body(&["\"say \\\"hi\\\"\\\\\""])
    );
}

// ========== errors ==========

#[test]
fn test_unterminated_comment_fails() {
    let err = parse_document("<p>a<!-- never closed").unwrap_err();
    assert_eq!(err.position(), 4);
}

#[test]
fn test_step_reports_tokenizer_error() {
    let mut parser = HTMLParser::new("<p>< p>".to_string());
    assert!(parser.step().is_ok());
    let mut result = Ok(true);
    while let Ok(true) = result {
        result = parser.step();
    }
    assert!(result.is_err());
}
