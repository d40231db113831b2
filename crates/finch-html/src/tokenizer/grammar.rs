//! The token grammar: an ordered list of anchored patterns.
//!
//! At each cursor position the alternatives are tried in order and the first
//! one that matches produces the token. Nothing is backtracked once a token
//! has been emitted.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::token::{Attribute, Token};

/// 1. One whitespace control character.
static SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[\t\n\x0C\r]").expect("space pattern is valid"));

/// 2. A maximal run of anything but `<`.
static TEXT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\A[^<]+").expect("text pattern is valid"));

/// 3. Comment, shortest match.
static COMMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A<!--((?s:.*?))-->").expect("comment pattern is valid"));

/// 4. CDATA section, shortest match.
static CDATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\A<!\[CDATA\[((?s:.*?))\]\]>").expect("cdata pattern is valid")
});

/// 5. Doctype with optional external identifier and internal subset.
///
/// Groups: 1 name; 2/3 public id; 4/5 system id after a public id;
/// 6/7 system id after `SYSTEM`; 8 internal subset.
static DOCTYPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\A<!(?i:doctype)\s+([^\s>\[]+)",
        r#"(?:\s+(?i:public)\s+(?:"([^"]*)"|'([^']*)')(?:\s+(?:"([^"]*)"|'([^']*)'))?"#,
        r#"|\s+(?i:system)\s+(?:"([^"]*)"|'([^']*)'))?"#,
        r"\s*(?:\[([^\]]*)\])?\s*>",
    ))
    .expect("doctype pattern is valid")
});

/// 6. Start or end tag.
///
/// Groups: 1 the closing `/`; 2 name; 3 raw attribute region; 4 self-closing `/`.
static TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\A<(?:(/)\s*)?([A-Za-z][^\s/>]*)",
        r#"((?:\s*[^\s"'>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)"#,
        r"\s*(/)?\s*>",
    ))
    .expect("tag pattern is valid")
});

/// One `key[=value]` pair inside a tag's attribute region.
///
/// Groups: 1 name; 2 double-quoted value; 3 single-quoted value; 4 unquoted value.
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute pattern is valid")
});

/// Match one token at the start of `input`.
///
/// Returns the token and the number of bytes it consumed, or `None` if no
/// alternative matches.
pub(super) fn match_token(input: &str) -> Option<(Token, usize)> {
    if let Some(m) = SPACE.find(input) {
        let data = m.as_str().chars().next()?;
        return Some((Token::Space { data }, m.end()));
    }
    if let Some(m) = TEXT.find(input) {
        let data = m.as_str().to_string();
        return Some((Token::Text { data }, m.end()));
    }
    if let Some(caps) = COMMENT.captures(input) {
        let data = group(&caps, 1).unwrap_or_default();
        return Some((Token::Comment { data }, caps[0].len()));
    }
    if let Some(caps) = CDATA.captures(input) {
        let data = group(&caps, 1).unwrap_or_default();
        return Some((Token::Cdata { data }, caps[0].len()));
    }
    if let Some(caps) = DOCTYPE.captures(input) {
        let token = Token::Doctype {
            name: caps[1].to_ascii_lowercase(),
            public_identifier: group(&caps, 2).or_else(|| group(&caps, 3)),
            system_identifier: group(&caps, 4)
                .or_else(|| group(&caps, 5))
                .or_else(|| group(&caps, 6))
                .or_else(|| group(&caps, 7)),
            internal_subset: group(&caps, 8),
        };
        return Some((token, caps[0].len()));
    }
    if let Some(caps) = TAG.captures(input) {
        let name = caps[2].to_ascii_lowercase();
        let token = if caps.get(1).is_some() {
            Token::EndTag { name }
        } else {
            Token::StartTag {
                name,
                self_closing: caps.get(4).is_some(),
                attributes: parse_attributes(caps.get(3).map_or("", |m| m.as_str())),
            }
        };
        return Some((token, caps[0].len()));
    }
    None
}

/// Split a raw attribute region into name/value pairs.
///
/// Names are lowercased; values are kept verbatim without their quotes. When a
/// name repeats, the first occurrence wins.
pub(super) fn parse_attributes(raw: &str) -> Vec<Attribute> {
    let mut attributes: Vec<Attribute> = Vec::new();
    for caps in ATTRIBUTE.captures_iter(raw) {
        let name = caps[1].to_ascii_lowercase();
        if attributes.iter().any(|attr| attr.name == name) {
            continue;
        }
        let value = group(&caps, 2)
            .or_else(|| group(&caps, 3))
            .or_else(|| group(&caps, 4))
            .unwrap_or_default();
        attributes.push(Attribute::new(name, value));
    }
    attributes
}

fn group(caps: &Captures<'_>, index: usize) -> Option<String> {
    caps.get(index).map(|m| m.as_str().to_string())
}
