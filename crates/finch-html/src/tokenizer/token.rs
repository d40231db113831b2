use core::fmt;

pub use finch_dom::Attribute;

/// A lexical event produced by the tokenizer.
///
/// The tokenizer emits exactly one of these per call, in source order. Tag
/// tokens are split into [`Token::StartTag`] and [`Token::EndTag`] once, when
/// the token is matched, so the tree builder never re-derives the closing
/// flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A single whitespace control character: tab, LF, FF or CR.
    Space {
        /// The whitespace character.
        data: char,
    },

    /// A maximal run of characters that contains no `<`.
    Text {
        /// The raw text. Character references are not decoded.
        data: String,
    },

    /// `<!-- ... -->`
    Comment {
        /// Everything between `<!--` and the first `-->`.
        data: String,
    },

    /// `<![CDATA[ ... ]]>`
    Cdata {
        /// Everything between `<![CDATA[` and the first `]]>`.
        data: String,
    },

    /// `<!DOCTYPE name [PUBLIC "..." ["..."] | SYSTEM "..."] [[...]]>`
    Doctype {
        /// The document type name, lowercased.
        name: String,
        /// The quoted literal after `PUBLIC`, without quotes.
        public_identifier: Option<String>,
        /// The quoted system literal, without quotes.
        system_identifier: Option<String>,
        /// The bracketed internal subset, without brackets.
        internal_subset: Option<String>,
    },

    /// An opening tag such as `<a href="x">` or `<br/>`.
    StartTag {
        /// The tag name, lowercased.
        name: String,
        /// Whether the tag ended in `/>`.
        self_closing: bool,
        /// Attributes in source order. Duplicate names are dropped, so the
        /// first occurrence wins.
        attributes: Vec<Attribute>,
    },

    /// A closing tag such as `</a>`. Any attributes are consumed and dropped.
    EndTag {
        /// The tag name, lowercased.
        name: String,
    },
}

impl Token {
    /// Create a start tag token with no attributes.
    #[must_use]
    pub fn start_tag(name: &str) -> Self {
        Self::StartTag {
            name: name.to_string(),
            self_closing: false,
            attributes: Vec::new(),
        }
    }

    /// Create an end tag token.
    #[must_use]
    pub fn end_tag(name: &str) -> Self {
        Self::EndTag {
            name: name.to_string(),
        }
    }

    /// Returns true if this is a start tag with the given name.
    #[must_use]
    pub fn is_start_tag(&self, tag_name: &str) -> bool {
        matches!(self, Self::StartTag { name, .. } if name == tag_name)
    }

    /// Returns true if this is an end tag with the given name.
    #[must_use]
    pub fn is_end_tag(&self, tag_name: &str) -> bool {
        matches!(self, Self::EndTag { name } if name == tag_name)
    }

    /// The tag name of a start or end tag.
    #[must_use]
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Self::StartTag { name, .. } | Self::EndTag { name } => Some(name),
            _ => None,
        }
    }

    /// Short description of the token: its kind, plus the name for tags.
    ///
    /// Text, comment and declaration payloads are left out.
    #[must_use]
    pub fn summary(&self) -> String {
        match self {
            Self::Space { .. } => "whitespace".to_string(),
            Self::Text { .. } => "text".to_string(),
            Self::Comment { .. } => "comment".to_string(),
            Self::Cdata { .. } => "CDATA section".to_string(),
            Self::Doctype { .. } => "DOCTYPE".to_string(),
            Self::StartTag { name, .. } => format!("start tag <{name}>"),
            Self::EndTag { name } => format!("end tag </{name}>"),
        }
    }

    /// Attributes of a start tag; empty for every other token.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        match self {
            Self::StartTag { attributes, .. } => attributes,
            _ => &[],
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Space { data } => match data {
                '\n' => write!(f, "Space(\\n)"),
                '\t' => write!(f, "Space(\\t)"),
                '\r' => write!(f, "Space(\\r)"),
                _ => write!(f, "Space(\\f)"),
            },
            Self::Text { data } => write!(f, "Text({data:?})"),
            Self::Comment { data } => write!(f, "<!--{data}-->"),
            Self::Cdata { data } => write!(f, "<![CDATA[{data}]]>"),
            Self::Doctype {
                name,
                public_identifier,
                system_identifier,
                internal_subset,
            } => {
                write!(f, "DOCTYPE {name}")?;
                if let Some(pub_id) = public_identifier {
                    write!(f, " PUBLIC \"{pub_id}\"")?;
                }
                if let Some(sys_id) = system_identifier {
                    write!(f, " SYSTEM \"{sys_id}\"")?;
                }
                if let Some(subset) = internal_subset {
                    write!(f, " [{subset}]")?;
                }
                Ok(())
            }
            Self::StartTag {
                name,
                self_closing,
                attributes,
            } => {
                write!(f, "<{name}")?;
                for attr in attributes {
                    write!(f, " {}=\"{}\"", attr.name, attr.value)?;
                }
                if *self_closing {
                    write!(f, " /")?;
                }
                write!(f, ">")
            }
            Self::EndTag { name } => write!(f, "</{name}>"),
        }
    }
}
