//! A reduced form of the adoption agency algorithm.
//!
//! [§ 13.2.6.4.7 Adoption agency algorithm](https://html.spec.whatwg.org/multipage/parsing.html#adoption-agency-algorithm)
//!
//! The full algorithm runs an outer loop of up to eight iterations and an
//! inner loop that clones every formatting element between the formatting
//! element and the furthest block. This version makes a single pass: it
//! relocates the furthest block and wraps its content in one fresh copy of
//! the closed formatting element.

use finch_dom::{AttributesMap, NodeId};

use super::HTMLParser;
use super::tag_sets::{is_formatting_element, is_special_element};

impl HTMLParser {
    /// Run the adoption agency for the end tag `subject`.
    ///
    /// Returns `false` when no open element is named `subject`; the caller
    /// then falls back to the generic end tag handling. Returns `true` once
    /// the stack and tree have been repaired.
    pub(super) fn run_adoption_agency(&mut self, subject: &str) -> bool {
        // STEP 1: Find the innermost open element named subject.
        let Some(index) = self
            .stack_of_open_elements
            .iter()
            .rposition(|&id| self.get_tag_name(id) == Some(subject))
        else {
            return false;
        };

        // STEP 2: "Remove formatting element from the stack of open elements",
        //         together with everything opened after it.
        let removed = self.stack_of_open_elements.split_off(index);
        let formatting_element = removed[0];
        for &node_id in &removed {
            self.remove_from_active_formatting_elements(node_id);
        }

        // STEP 3: "Let furthest block be the topmost node in the stack of open
        //          elements that is lower in the stack than formatting element,
        //          and is an element in the special category."
        let furthest_block = removed[1..]
            .iter()
            .copied()
            .find(|&id| self.get_tag_name(id).is_some_and(is_special_element));

        if let Some(furthest_block) = furthest_block {
            // "Let common ancestor be the element immediately above formatting
            // element in the stack of open elements."
            let common_ancestor = self
                .tree
                .parent(formatting_element)
                .unwrap_or(NodeId::ROOT);

            // "Insert whatever last node ended up being in the previous step at
            // the appropriate place for inserting a node, but using common
            // ancestor as the override target."
            // append_child refuses moves that would create a cycle.
            self.tree.append_child(common_ancestor, furthest_block);

            // "Create an element for the token for which formatting element
            // was created."
            let attrs = self.attributes_of(formatting_element);
            let new_element = self.create_element(subject, attrs);

            // "Take all of the child nodes of furthest block and append them
            // to the element created in the last step."
            self.tree.move_children(furthest_block, new_element);

            // "Append that new element to furthest block."
            self.tree.append_child(furthest_block, new_element);

            self.stack_of_open_elements.push(furthest_block);

            // Relocating a table-structure furthest block can leave the mode
            // out of step with the stack.
            self.reset_insertion_mode_appropriately();
            return true;
        }

        // STEP 4: No furthest block. Reopen the innermost element that was
        //         closed along with the formatting element.
        if let Some(&innermost) = removed.last()
            && innermost != formatting_element
        {
            let Some(tag_name) = self.get_tag_name(innermost).map(str::to_string) else {
                return true;
            };
            let attrs = self.attributes_of(innermost);
            let reopened = self.insert_html_element(&tag_name, attrs);
            if is_formatting_element(&tag_name) {
                self.push_active_formatting_element(reopened);
            }
        }

        true
    }

    /// Element attributes of `node_id`, empty for non-elements.
    fn attributes_of(&self, node_id: NodeId) -> AttributesMap {
        self.tree
            .as_element(node_id)
            .map(|data| data.attrs.clone())
            .unwrap_or_default()
    }
}
