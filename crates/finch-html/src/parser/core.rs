use strum_macros::{Display, EnumIter};

use finch_common::warning::warn_once;
use finch_dom::{AttributesMap, DomTree, ElementData, NodeId, NodeType};

use super::tag_sets::{
    closes_paragraph, is_formatting_element, is_heading, is_special_element, is_void_element,
};
use crate::tokenizer::{Attribute, HTMLTokenizer, Token, TokenizeError};

/// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
///
/// "The insertion mode is a state variable that controls the primary operation
/// of the tree construction stage."
///
/// Only the modes needed for document scaffolding, body content and tables
/// are implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum InsertionMode {
    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    Initial,
    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    BeforeHtml,
    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    BeforeHead,
    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    InHead,
    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    AfterHead,
    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    InBody,
    /// [§ 13.2.6.4.9 The "in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intable)
    InTable,
    /// [§ 13.2.6.4.13 The "in table body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intablebody)
    InTableBody,
    /// [§ 13.2.6.4.14 The "in row" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inrow)
    InRow,
    /// [§ 13.2.6.4.15 The "in cell" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incell)
    InCell,
}

/// What the driver does with the current token after a mode handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Flow {
    /// The token was consumed; fetch the next one.
    Advance,
    /// "Reprocess the token" under the (new) insertion mode.
    Reprocess,
}

/// A recoverable structural anomaly met while building the tree.
///
/// These never stop parsing; they are collected so callers can inspect how
/// the input was repaired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIssue {
    /// Description of what was ignored or repaired.
    pub message: String,
    /// Index into the token stream where this issue was encountered.
    pub token_index: usize,
}

/// [§ 13.2.4.3 The list of active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#the-list-of-active-formatting-elements)
///
/// "The list of active formatting elements... is used to handle mis-nested
/// formatting element tags."
///
/// Entries refer to nodes owned by the tree; removing an entry never removes
/// the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveFormattingElement {
    /// A formatting element that was opened and not yet closed.
    Element {
        /// The element in the tree.
        node_id: NodeId,
    },
    /// "A marker is an entry in the list of active formatting elements that is
    /// distinct from any element."
    ///
    /// Pushed when a table cell opens, so formatting from outside the cell
    /// is scoped away from its content.
    Marker,
}

/// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
///
/// The tree builder. It pulls tokens from its own [`HTMLTokenizer`] one at a
/// time and dispatches each on the current insertion mode.
#[derive(Debug)]
pub struct HTMLParser {
    /// Source of tokens, pulled lazily.
    tokenizer: HTMLTokenizer,

    /// The token being processed. `None` once the input is exhausted.
    current_token: Option<Token>,

    /// Whether the first token has been requested yet.
    started: bool,

    /// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
    pub(super) insertion_mode: InsertionMode,

    /// [§ 13.2.4.3 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
    ///
    /// Always starts with the Document (`NodeId::ROOT`), which is never popped.
    pub(super) stack_of_open_elements: Vec<NodeId>,

    /// [§ 13.2.4.3 The list of active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#the-list-of-active-formatting-elements)
    pub(super) active_formatting_elements: Vec<ActiveFormattingElement>,

    /// The tree under construction.
    /// `NodeId::ROOT` (index 0) is the Document node.
    pub(super) tree: DomTree,

    /// Number of tokens consumed so far.
    token_index: usize,

    /// Parse issues encountered during parsing.
    issues: Vec<ParseIssue>,

    /// Merge text into a directly preceding Text sibling.
    coalesce_text: bool,
}

impl HTMLParser {
    /// Create a parser for `input`. Nothing is tokenized until the parser runs.
    #[must_use]
    pub fn new(input: String) -> Self {
        Self {
            tokenizer: HTMLTokenizer::new(input),
            current_token: None,
            started: false,
            insertion_mode: InsertionMode::Initial,
            stack_of_open_elements: vec![NodeId::ROOT],
            active_formatting_elements: Vec::new(),
            tree: DomTree::new(),
            token_index: 0,
            issues: Vec::new(),
            coalesce_text: true,
        }
    }

    /// Choose whether adjacent text merges into one Text node (the default).
    ///
    /// When disabled, every Text and Space token becomes its own Text node.
    #[must_use]
    pub fn with_text_coalescing(mut self, enabled: bool) -> Self {
        self.coalesce_text = enabled;
        self
    }

    /// The current insertion mode.
    #[must_use]
    pub const fn insertion_mode(&self) -> InsertionMode {
        self.insertion_mode
    }

    /// The stack of open elements, bottom (the Document) first.
    #[must_use]
    pub fn open_elements(&self) -> &[NodeId] {
        &self.stack_of_open_elements
    }

    /// The list of active formatting elements, oldest first.
    #[must_use]
    pub fn active_formatting_elements(&self) -> &[ActiveFormattingElement] {
        &self.active_formatting_elements
    }

    /// The tree built so far.
    #[must_use]
    pub const fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Get all parse issues encountered so far.
    #[must_use]
    pub fn issues(&self) -> &[ParseIssue] {
        &self.issues
    }

    /// Process the current token once.
    ///
    /// Returns `Ok(false)` when the token stream is exhausted. A step either
    /// consumes the token or switches mode and keeps it for the next step.
    ///
    /// # Errors
    ///
    /// Returns the tokenizer's error when the next token cannot be read.
    pub fn step(&mut self) -> Result<bool, TokenizeError> {
        if !self.started {
            self.started = true;
            self.current_token = self.tokenizer.next_token()?;
        }
        let Some(token) = self.current_token.take() else {
            return Ok(false);
        };
        match self.process_token(&token) {
            Flow::Reprocess => self.current_token = Some(token),
            Flow::Advance => {
                self.token_index += 1;
                self.current_token = self.tokenizer.next_token()?;
            }
        }
        Ok(self.current_token.is_some())
    }

    /// Run the parser and return the tree.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenizeError`] if the input cannot be tokenized. No
    /// partial tree is returned in that case.
    pub fn run(mut self) -> Result<DomTree, TokenizeError> {
        while self.step()? {}
        Ok(self.tree)
    }

    /// Run the parser and return both the tree and any parse issues.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenizeError`] if the input cannot be tokenized.
    pub fn run_with_issues(mut self) -> Result<(DomTree, Vec<ParseIssue>), TokenizeError> {
        while self.step()? {}
        Ok((self.tree, self.issues))
    }

    /// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction-dispatcher)
    fn process_token(&mut self, token: &Token) -> Flow {
        match self.insertion_mode {
            InsertionMode::Initial => self.handle_initial_mode(token),
            InsertionMode::BeforeHtml => self.handle_before_html_mode(token),
            InsertionMode::BeforeHead => self.handle_before_head_mode(token),
            InsertionMode::InHead => self.handle_in_head_mode(token),
            InsertionMode::AfterHead => self.handle_after_head_mode(token),
            InsertionMode::InBody => self.handle_in_body_mode(token),
            InsertionMode::InTable => self.handle_in_table_mode(token),
            InsertionMode::InTableBody => self.handle_in_table_body_mode(token),
            InsertionMode::InRow => self.handle_in_row_mode(token),
            InsertionMode::InCell => self.handle_in_cell_mode(token),
        }
    }

    fn switch_to(&mut self, mode: InsertionMode) {
        if self.insertion_mode != mode {
            log::trace!(
                target: "finch_html::parser",
                "insertion mode {} -> {mode}",
                self.insertion_mode
            );
        }
        self.insertion_mode = mode;
    }

    /// Record a parse issue and report it through the shared warning channel.
    pub(super) fn parse_warning(&mut self, message: String) {
        let _ = warn_once("HTML Parser", &message);
        self.issues.push(ParseIssue {
            message,
            token_index: self.token_index,
        });
    }

    /// [§ 13.2.4.3 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#current-node)
    ///
    /// "The current node is the bottommost node in this stack of open elements."
    pub(super) fn current_node(&self) -> NodeId {
        self.stack_of_open_elements
            .last()
            .copied()
            .unwrap_or(NodeId::ROOT)
    }

    /// Get the tag name of a node (local name of the element).
    pub(super) fn get_tag_name(&self, id: NodeId) -> Option<&str> {
        self.tree.tag_name(id)
    }

    /// Convert token attributes to the `AttributesMap` used by `ElementData`.
    fn attributes_to_map(attributes: &[Attribute]) -> AttributesMap {
        attributes.iter().cloned().collect()
    }

    /// [§ 13.2.6.1 Creating and inserting nodes](https://html.spec.whatwg.org/multipage/parsing.html#create-an-element-for-the-token)
    ///
    /// Allocates a detached element.
    pub(super) fn create_element(&mut self, tag_name: &str, attrs: AttributesMap) -> NodeId {
        self.tree.alloc(NodeType::Element(ElementData {
            tag_name: tag_name.to_string(),
            attrs,
        }))
    }

    /// Append a new element to the current node without pushing it.
    fn append_element(&mut self, tag_name: &str, attributes: &[Attribute]) -> NodeId {
        let element_id = self.create_element(tag_name, Self::attributes_to_map(attributes));
        let parent_id = self.current_node();
        self.tree.append_child(parent_id, element_id);
        element_id
    }

    /// [§ 13.2.6.1 Insert an HTML element](https://html.spec.whatwg.org/multipage/parsing.html#insert-an-html-element)
    ///
    /// Append a new element to the current node and push it onto the stack
    /// of open elements.
    pub(super) fn insert_html_element(&mut self, tag_name: &str, attrs: AttributesMap) -> NodeId {
        let element_id = self.create_element(tag_name, attrs);
        let parent_id = self.current_node();
        self.tree.append_child(parent_id, element_id);
        self.stack_of_open_elements.push(element_id);
        element_id
    }

    /// Insert an element for a start tag token's name and attributes.
    fn insert_element_for_token(&mut self, tag_name: &str, attributes: &[Attribute]) -> NodeId {
        self.insert_html_element(tag_name, Self::attributes_to_map(attributes))
    }

    /// [§ 13.2.6.1 Insert a character](https://html.spec.whatwg.org/multipage/parsing.html#insert-a-character)
    ///
    /// "If there is a Text node immediately before the adjusted insertion
    /// location, then append data to that Text node's data." Otherwise a new
    /// Text node is appended to the current node.
    fn insert_text(&mut self, data: &str) {
        let parent_id = self.current_node();
        if self.coalesce_text
            && let Some(last_id) = self.tree.last_child(parent_id)
            && let Some(node) = self.tree.get_mut(last_id)
            && let NodeType::Text(ref mut text) = node.node_type
        {
            text.push_str(data);
            return;
        }
        let text_id = self.tree.alloc(NodeType::Text(data.to_string()));
        self.tree.append_child(parent_id, text_id);
    }

    /// Pop elements from the stack of open elements until one with the given
    /// tag name has been popped.
    ///
    /// Does nothing when no such element is open. Returns whether anything
    /// was popped.
    pub(super) fn pop_until(&mut self, tag_name: &str) -> bool {
        self.pop_until_one_of(&[tag_name])
    }

    /// Pop elements until one whose tag name is in `tag_names` has been popped.
    /// Does nothing when none of them is open.
    fn pop_until_one_of(&mut self, tag_names: &[&str]) -> bool {
        let position = self
            .stack_of_open_elements
            .iter()
            .rposition(|&id| self.get_tag_name(id).is_some_and(|n| tag_names.contains(&n)));
        match position {
            Some(index) => {
                self.stack_of_open_elements.truncate(index);
                true
            }
            None => false,
        }
    }

    /// [§ 13.2.4.2](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-table-scope)
    ///
    /// "has an element in table scope": the search stops at `html`, `table`
    /// and `template`.
    fn has_element_in_table_scope(&self, tag_name: &str) -> bool {
        const TABLE_SCOPE: &[&str] = &["html", "table", "template"];
        for &node_id in self.stack_of_open_elements.iter().rev() {
            if let Some(node_tag) = self.get_tag_name(node_id) {
                if node_tag == tag_name {
                    return true;
                }
                if TABLE_SCOPE.contains(&node_tag) {
                    return false;
                }
            }
        }
        false
    }

    /// [§ 13.2.6.4.15 Close the cell](https://html.spec.whatwg.org/multipage/parsing.html#close-the-cell)
    ///
    /// "Pop elements from the stack of open elements stack until a td element
    /// or a th element has been popped from the stack."
    /// "Clear the list of active formatting elements up to the last marker."
    fn close_the_cell(&mut self) {
        let _ = self.pop_until_one_of(&["td", "th"]);
        self.clear_active_formatting_elements_to_last_marker();
    }

    /// [§ 13.2.4.3](https://html.spec.whatwg.org/multipage/parsing.html#clear-the-list-of-active-formatting-elements-up-to-the-last-marker)
    ///
    /// "Remove entries until a marker has been removed or the list is empty."
    fn clear_active_formatting_elements_to_last_marker(&mut self) {
        while let Some(entry) = self.active_formatting_elements.pop() {
            if entry == ActiveFormattingElement::Marker {
                break;
            }
        }
    }

    /// Record a newly opened formatting element.
    pub(super) fn push_active_formatting_element(&mut self, node_id: NodeId) {
        self.active_formatting_elements
            .push(ActiveFormattingElement::Element { node_id });
    }

    /// Drop the list entry for `node_id`, if any. The node itself stays in
    /// the tree.
    pub(super) fn remove_from_active_formatting_elements(&mut self, node_id: NodeId) {
        self.active_formatting_elements
            .retain(|entry| *entry != ActiveFormattingElement::Element { node_id });
    }

    /// [§ 13.2.4.1 Reset the insertion mode appropriately](https://html.spec.whatwg.org/multipage/parsing.html#reset-the-insertion-mode-appropriately)
    ///
    /// Walk the stack from the current node down and pick the mode of the
    /// nearest table-structure element, or "in body" when there is none.
    pub(super) fn reset_insertion_mode_appropriately(&mut self) {
        let mode = self
            .stack_of_open_elements
            .iter()
            .rev()
            .find_map(|&node_id| match self.get_tag_name(node_id) {
                Some("td" | "th") => Some(InsertionMode::InCell),
                Some("tr") => Some(InsertionMode::InRow),
                Some("tbody" | "thead" | "tfoot") => Some(InsertionMode::InTableBody),
                Some("table") => Some(InsertionMode::InTable),
                Some("body" | "html") | None => Some(InsertionMode::InBody),
                Some(_) => None,
            })
            .unwrap_or(InsertionMode::InBody);
        self.switch_to(mode);
    }

    /// Tokens a table-structure mode has no rule for are dropped.
    ///
    /// NOTE: The full algorithm foster-parents such content in front of the
    /// table; this parser discards it.
    fn drop_table_token(&mut self, token: &Token) {
        if !matches!(token, Token::Space { .. }) {
            self.parse_warning(format!(
                "{} dropped in \"{}\" insertion mode",
                token.summary(),
                self.insertion_mode
            ));
        }
    }

    /// [§ 13.2.6.4.7 "in body" - Any other end tag](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    ///
    /// Walk the stack from the current node down. An element with the token's
    /// name closes the nearest open `p` element and ends the walk. Any other
    /// special element ends the walk and the token is ignored. Reaching the
    /// bottom of the stack ignores the token.
    ///
    /// NOTE: Only `p` is ever popped here; the matched element itself stays
    /// open unless it sits above that `p`.
    pub(super) fn any_other_end_tag(&mut self, tag_name: &str) {
        for index in (0..self.stack_of_open_elements.len()).rev() {
            let Some(node_tag) = self.get_tag_name(self.stack_of_open_elements[index]) else {
                continue;
            };
            if node_tag == tag_name {
                let _ = self.pop_until("p");
                return;
            }
            if is_special_element(node_tag) {
                let message = format!("end tag </{tag_name}> stopped at <{node_tag}> and ignored");
                self.parse_warning(message);
                return;
            }
        }
        self.parse_warning(format!("end tag </{tag_name}> has no open element"));
    }

    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    ///
    /// "Switch the insertion mode to "before html", then reprocess the token."
    fn handle_initial_mode(&mut self, _token: &Token) -> Flow {
        self.switch_to(InsertionMode::BeforeHtml);
        Flow::Reprocess
    }

    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    fn handle_before_html_mode(&mut self, token: &Token) -> Flow {
        match token {
            // "A DOCTYPE token" / "A comment token" / whitespace
            // Ignored: the tree has no node kinds for them.
            Token::Space { .. }
            | Token::Comment { .. }
            | Token::Cdata { .. }
            | Token::Doctype { .. } => Flow::Advance,

            // "A start tag whose tag name is "html""
            // "Create an element for the token... Append it to the Document
            // object. Put this element in the stack of open elements."
            Token::StartTag {
                name, attributes, ..
            } if name == "html" => {
                let _ = self.insert_element_for_token(name, attributes);
                self.switch_to(InsertionMode::BeforeHead);
                Flow::Advance
            }

            // "Anything else"
            // "Create an html element... Switch the insertion mode to
            // "before head", then reprocess the token."
            _ => {
                let _ = self.insert_html_element("html", AttributesMap::new());
                self.switch_to(InsertionMode::BeforeHead);
                Flow::Reprocess
            }
        }
    }

    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    fn handle_before_head_mode(&mut self, token: &Token) -> Flow {
        match token {
            Token::Space { .. }
            | Token::Comment { .. }
            | Token::Cdata { .. }
            | Token::Doctype { .. } => Flow::Advance,

            // "A start tag whose tag name is "head""
            // "Insert an HTML element for the token."
            // "Switch the insertion mode to "in head"."
            Token::StartTag {
                name, attributes, ..
            } if name == "head" => {
                let _ = self.insert_element_for_token(name, attributes);
                self.switch_to(InsertionMode::InHead);
                Flow::Advance
            }

            // "Anything else"
            // NOTE: The head is appended empty and never becomes the current
            // node, so the token is reprocessed straight in "after head".
            _ => {
                let _ = self.append_element("head", &[]);
                self.switch_to(InsertionMode::AfterHead);
                Flow::Reprocess
            }
        }
    }

    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    ///
    /// NOTE: Head content is not modelled. The head element is closed as soon
    /// as any token arrives; only an end tag "head" is consumed.
    fn handle_in_head_mode(&mut self, token: &Token) -> Flow {
        if self.current_node() != NodeId::ROOT {
            let _ = self.stack_of_open_elements.pop();
        }
        self.switch_to(InsertionMode::AfterHead);
        if token.is_end_tag("head") {
            Flow::Advance
        } else {
            Flow::Reprocess
        }
    }

    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    fn handle_after_head_mode(&mut self, token: &Token) -> Flow {
        match token {
            Token::Space { .. }
            | Token::Comment { .. }
            | Token::Cdata { .. }
            | Token::Doctype { .. } => Flow::Advance,

            // "A start tag whose tag name is "body""
            // "Insert an HTML element for the token."
            // "Switch the insertion mode to "in body"."
            Token::StartTag {
                name, attributes, ..
            } if name == "body" => {
                let _ = self.insert_element_for_token(name, attributes);
                self.switch_to(InsertionMode::InBody);
                Flow::Advance
            }

            // "Anything else"
            // "Insert an HTML element for a "body" start tag token with no
            // attributes. Switch the insertion mode to "in body". Reprocess
            // the current token."
            _ => {
                let _ = self.insert_html_element("body", AttributesMap::new());
                self.switch_to(InsertionMode::InBody);
                Flow::Reprocess
            }
        }
    }

    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    fn handle_in_body_mode(&mut self, token: &Token) -> Flow {
        // "If the stack of open elements has a p element in button scope, then
        // close a p element."
        // NOTE: No scope check; any open p is closed.
        if let Token::StartTag { name, .. } = token
            && closes_paragraph(name)
        {
            let _ = self.pop_until("p");
        }

        match token {
            // "Any other character token"
            // "Insert the character."
            Token::Text { data } => self.insert_text(data),
            Token::Space { data } => self.insert_text(data.encode_utf8(&mut [0; 4])),

            // Comments, CDATA sections and DOCTYPEs have no node kind here.
            Token::Comment { .. } | Token::Cdata { .. } | Token::Doctype { .. } => {}

            // "A start tag whose tag name is "html"" / "body" / "head"
            // "Parse error." Simplified: ignore attribute merging.
            Token::StartTag { name, .. } if matches!(name.as_str(), "html" | "head" | "body") => {
                self.parse_warning(format!("start tag <{name}> ignored in body"));
            }

            // "A start tag whose tag name is one of: "area", "br", "embed",
            // "img", "keygen", "wbr""
            // "Insert an HTML element for the token. Immediately pop the
            // current node off the stack of open elements."
            Token::StartTag {
                name, attributes, ..
            } if is_void_element(name) => {
                let _ = self.append_element(name, attributes);
            }

            // "A start tag whose tag name is "table""
            // "Insert an HTML element for the token."
            // "Switch the insertion mode to "in table"."
            Token::StartTag {
                name, attributes, ..
            } if name == "table" => {
                let _ = self.insert_element_for_token(name, attributes);
                self.switch_to(InsertionMode::InTable);
            }

            // "A start tag whose tag name is one of: "h1", "h2", "h3", "h4", "h5", "h6""
            // "If the current node is an HTML element whose tag name is one of
            // "h1", "h2", "h3", "h4", "h5", or "h6", then this is a parse
            // error; pop the current node off the stack of open elements."
            // "Insert an HTML element for the token."
            Token::StartTag {
                name, attributes, ..
            } if is_heading(name) => {
                if self.get_tag_name(self.current_node()).is_some_and(is_heading) {
                    let _ = self.stack_of_open_elements.pop();
                }
                let _ = self.insert_element_for_token(name, attributes);
            }

            // "Any other start tag"
            // "Insert an HTML element for the token."
            // Formatting elements are also "pushed onto the list of active
            // formatting elements".
            Token::StartTag {
                name, attributes, ..
            } => {
                let element_id = self.insert_element_for_token(name, attributes);
                if is_formatting_element(name) {
                    self.push_active_formatting_element(element_id);
                }
            }

            // "An end tag whose tag name is "table""
            Token::EndTag { name } if name == "table" => {
                if self.pop_until("table") {
                    self.reset_insertion_mode_appropriately();
                } else {
                    self.parse_warning("end tag </table> has no open table".to_string());
                }
            }

            // "An end tag whose tag name is one of: "a", "b", "big", "code",
            // "em", "font", "i", "nobr", "s", "small", "strike", "strong",
            // "tt", "u""
            // "Run the adoption agency algorithm for the token."
            Token::EndTag { name } if is_formatting_element(name) => {
                if !self.run_adoption_agency(name) {
                    self.any_other_end_tag(name);
                }
            }

            // "Any other end tag"
            Token::EndTag { name } => self.any_other_end_tag(name),
        }
        Flow::Advance
    }

    /// [§ 13.2.6.4.9 The "in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intable)
    fn handle_in_table_mode(&mut self, token: &Token) -> Flow {
        match token {
            // "A start tag whose tag name is one of: "td", "th", "tr""
            // "Insert an HTML element for a "tbody" start tag token with no
            // attributes, then switch the insertion mode to "in table body"."
            // "Reprocess the current token."
            Token::StartTag { name, .. } if matches!(name.as_str(), "td" | "th" | "tr") => {
                let _ = self.insert_html_element("tbody", AttributesMap::new());
                self.switch_to(InsertionMode::InTableBody);
                Flow::Reprocess
            }

            // "A start tag whose tag name is one of: "tbody", "tfoot", "thead""
            // "Insert an HTML element for the token, then switch the insertion
            // mode to "in table body"."
            Token::StartTag {
                name, attributes, ..
            } if matches!(name.as_str(), "tbody" | "thead" | "tfoot") => {
                let _ = self.insert_element_for_token(name, attributes);
                self.switch_to(InsertionMode::InTableBody);
                Flow::Advance
            }

            // "An end tag whose tag name is "table""
            // "Pop elements from this stack until a table element has been
            // popped from the stack."
            // "Reset the insertion mode appropriately."
            Token::EndTag { name } if name == "table" => {
                if self.pop_until("table") {
                    self.reset_insertion_mode_appropriately();
                }
                Flow::Advance
            }

            // "Anything else"
            _ => {
                self.drop_table_token(token);
                Flow::Advance
            }
        }
    }

    /// [§ 13.2.6.4.13 The "in table body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intablebody)
    fn handle_in_table_body_mode(&mut self, token: &Token) -> Flow {
        match token {
            // "A start tag whose tag name is "tr""
            // "Insert an HTML element for the token, then switch the insertion
            // mode to "in row"."
            Token::StartTag {
                name, attributes, ..
            } if name == "tr" => {
                let _ = self.insert_element_for_token(name, attributes);
                self.switch_to(InsertionMode::InRow);
                Flow::Advance
            }

            // "A start tag whose tag name is one of: "th", "td""
            // "Insert an HTML element for a "tr" start tag token with no
            // attributes, then switch the insertion mode to "in row"."
            // "Reprocess the current token."
            Token::StartTag { name, .. } if matches!(name.as_str(), "th" | "td") => {
                let _ = self.insert_html_element("tr", AttributesMap::new());
                self.switch_to(InsertionMode::InRow);
                Flow::Reprocess
            }

            // "An end tag whose tag name is one of: "tbody", "tfoot", "thead""
            // "Pop the current node from the stack of open elements. Switch
            // the insertion mode to "in table"."
            Token::EndTag { name } if matches!(name.as_str(), "tbody" | "thead" | "tfoot") => {
                if self.has_element_in_table_scope(name) {
                    let _ = self.pop_until(name);
                    self.switch_to(InsertionMode::InTable);
                }
                Flow::Advance
            }

            // "A start tag whose tag name is one of: "tbody", "tfoot", "thead""
            // Close the current section and reprocess in "in table".
            Token::StartTag { name, .. }
                if matches!(name.as_str(), "tbody" | "thead" | "tfoot") =>
            {
                if self.pop_until_one_of(&["tbody", "thead", "tfoot"]) {
                    self.switch_to(InsertionMode::InTable);
                    Flow::Reprocess
                } else {
                    self.handle_in_table_mode(token)
                }
            }

            // "Anything else"
            // "Process the token using the rules for the "in table" insertion mode."
            _ => self.handle_in_table_mode(token),
        }
    }

    /// [§ 13.2.6.4.14 The "in row" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inrow)
    fn handle_in_row_mode(&mut self, token: &Token) -> Flow {
        match token {
            // "A start tag whose tag name is one of: "th", "td""
            // "Insert an HTML element for the token, then switch the insertion
            // mode to "in cell"."
            // "Insert a marker at the end of the list of active formatting elements."
            Token::StartTag {
                name, attributes, ..
            } if matches!(name.as_str(), "th" | "td") => {
                let _ = self.insert_element_for_token(name, attributes);
                self.active_formatting_elements
                    .push(ActiveFormattingElement::Marker);
                self.switch_to(InsertionMode::InCell);
                Flow::Advance
            }

            // "A start tag whose tag name is "tr"": close the row, then
            // reprocess in "in table body".
            Token::StartTag { name, .. } if name == "tr" => {
                if self.has_element_in_table_scope("tr") {
                    let _ = self.pop_until("tr");
                    self.switch_to(InsertionMode::InTableBody);
                    Flow::Reprocess
                } else {
                    self.drop_table_token(token);
                    Flow::Advance
                }
            }

            // "An end tag whose tag name is "tr""
            // "Pop the current node (which will be a tr element) from the
            // stack of open elements. Switch the insertion mode to "in table body"."
            Token::EndTag { name } if name == "tr" => {
                if self.has_element_in_table_scope("tr") {
                    let _ = self.pop_until("tr");
                    self.switch_to(InsertionMode::InTableBody);
                }
                Flow::Advance
            }

            Token::EndTag { name } if name == "table" => self.handle_in_table_mode(token),

            // NOTE: Everything else in a row is dropped.
            _ => {
                self.drop_table_token(token);
                Flow::Advance
            }
        }
    }

    /// [§ 13.2.6.4.15 The "in cell" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incell)
    fn handle_in_cell_mode(&mut self, token: &Token) -> Flow {
        match token {
            // "An end tag whose tag name is one of: "td", "th""
            // "Pop elements from the stack of open elements stack until an HTML
            // element with the same tag name as the token has been popped."
            // "Switch the insertion mode to "in row"."
            Token::EndTag { name } if matches!(name.as_str(), "td" | "th") => {
                if self.has_element_in_table_scope(name) {
                    self.close_the_cell();
                    self.switch_to(InsertionMode::InRow);
                } else {
                    self.parse_warning(format!("end tag </{name}> has no open cell"));
                }
                Flow::Advance
            }

            // "A start tag whose tag name is one of: "caption", "col",
            // "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr""
            // "An end tag whose tag name is one of: "table", "tbody", "tfoot",
            // "thead", "tr""
            // "Close the cell (see below) and reprocess the token."
            Token::StartTag { name, .. } if matches!(name.as_str(), "td" | "th" | "tr") => {
                self.close_cell_and_reprocess(token)
            }
            Token::EndTag { name } if matches!(name.as_str(), "tr" | "table") => {
                self.close_cell_and_reprocess(token)
            }

            // "Anything else"
            // "Process the token using the rules for the "in body" insertion mode."
            _ => self.handle_in_body_mode(token),
        }
    }

    fn close_cell_and_reprocess(&mut self, token: &Token) -> Flow {
        if self.has_element_in_table_scope("td") || self.has_element_in_table_scope("th") {
            self.close_the_cell();
            self.switch_to(InsertionMode::InRow);
            Flow::Reprocess
        } else {
            self.handle_in_body_mode(token)
        }
    }
}
