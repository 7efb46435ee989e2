// Copyright 2025 the Loupe Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small CSS-like selector subset.
//!
//! ## Grammar
//!
//! A selector is one or more compounds separated by whitespace (the descendant combinator).
//! A compound is any combination of:
//!
//! - a tag name or `*` (first, optional),
//! - `#id`,
//! - `.class` (repeatable),
//! - `[attr]` or `[attr=value]` (value optionally single- or double-quoted).
//!
//! A [`SelectorSet`] is a union of selectors; commas inside a source string separate
//! alternatives, the same as in CSS.
//!
//! ```
//! use loupe_dom::{Document, Element, SelectorSet};
//!
//! let mut doc = Document::new();
//! let body = doc.body();
//! let gallery = doc.insert(Some(body), Element::new("div").with_class("gallery"));
//! let img = doc.insert(Some(gallery), Element::new("img").with_attr("data-zoom", ""));
//!
//! let set = SelectorSet::parse(&[".gallery img[data-zoom]"]).unwrap();
//! assert!(set.matches(&doc, img));
//! assert!(!set.matches(&doc, gallery));
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use crate::Document;
use crate::error::DomError;
use crate::types::{Element, ElementId};

#[derive(Clone, Debug, PartialEq, Eq)]
enum AttrMatch {
    Present(String),
    Equals(String, String),
}

/// One compound selector, e.g. `img.hero[data-zoom]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

impl Compound {
    fn matches(&self, el: &Element) -> bool {
        if let Some(tag) = &self.tag
            && *tag != el.tag
        {
            return false;
        }
        if let Some(id) = &self.id
            && el.attr("id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|a| match a {
            AttrMatch::Present(name) => el.attr(name).is_some(),
            AttrMatch::Equals(name, value) => el.attr(name) == Some(value.as_str()),
        })
    }
}

/// A parsed selector: compounds joined by descendant combinators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    // Left to right, outermost first.
    compounds: Vec<Compound>,
}

impl Selector {
    /// Parse a single selector (no commas).
    pub fn parse(source: &str) -> Result<Self, DomError> {
        let err = |reason| DomError::InvalidSelector {
            selector: source.into(),
            reason,
        };
        let mut compounds = Vec::new();
        for part in source.split_whitespace() {
            compounds.push(parse_compound(part).map_err(err)?);
        }
        if compounds.is_empty() {
            return Err(err("empty selector"));
        }
        Ok(Self { compounds })
    }

    /// True if `id` matches this selector in `doc`.
    ///
    /// Descendant compounds are matched against ancestors, nearest first.
    pub fn matches(&self, doc: &Document, id: ElementId) -> bool {
        let Some((last, rest)) = self.compounds.split_last() else {
            return false;
        };
        let Some(el) = doc.element(id) else {
            return false;
        };
        if !last.matches(el) {
            return false;
        }
        let mut remaining = rest.iter().rev().peekable();
        let mut cur = doc.parent(id);
        while let Some(p) = cur {
            let Some(compound) = remaining.peek() else {
                break;
            };
            if doc.element(p).is_some_and(|e| compound.matches(e)) {
                let _ = remaining.next();
            }
            cur = doc.parent(p);
        }
        remaining.peek().is_none()
    }
}

/// A union of selectors.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectorSet {
    selectors: Vec<Selector>,
}

impl SelectorSet {
    /// Parse a list of selector strings. Each string may itself contain
    /// comma-separated alternatives.
    pub fn parse<S: AsRef<str>>(sources: &[S]) -> Result<Self, DomError> {
        let mut selectors = Vec::new();
        for source in sources {
            for alt in source.as_ref().split(',') {
                selectors.push(Selector::parse(alt)?);
            }
        }
        Ok(Self { selectors })
    }

    /// Number of alternatives.
    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    /// True if the set has no alternatives (it then matches nothing).
    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    /// True if any alternative matches `id`.
    pub fn matches(&self, doc: &Document, id: ElementId) -> bool {
        self.selectors.iter().any(|s| s.matches(doc, id))
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &[char], mut i: usize) -> (String, usize) {
    let start = i;
    while i < chars.len() && is_ident_char(chars[i]) {
        i += 1;
    }
    (chars[start..i].iter().collect(), i)
}

fn parse_compound(part: &str) -> Result<Compound, &'static str> {
    let chars: Vec<char> = part.chars().collect();
    let mut out = Compound::default();
    let mut i = 0;

    if chars.first() == Some(&'*') {
        i = 1;
    } else if chars.first().is_some_and(|c| is_ident_char(*c)) {
        let (tag, next) = take_ident(&chars, 0);
        out.tag = Some(tag.to_ascii_lowercase());
        i = next;
    }

    while i < chars.len() {
        match chars[i] {
            '#' => {
                let (id, next) = take_ident(&chars, i + 1);
                if id.is_empty() {
                    return Err("expected an id after `#`");
                }
                out.id = Some(id);
                i = next;
            }
            '.' => {
                let (class, next) = take_ident(&chars, i + 1);
                if class.is_empty() {
                    return Err("expected a class name after `.`");
                }
                out.classes.push(class);
                i = next;
            }
            '[' => {
                let (name, next) = take_ident(&chars, i + 1);
                if name.is_empty() {
                    return Err("expected an attribute name after `[`");
                }
                i = next;
                match chars.get(i) {
                    Some(']') => {
                        out.attrs.push(AttrMatch::Present(name));
                        i += 1;
                    }
                    Some('=') => {
                        i += 1;
                        let quote = chars.get(i).copied().filter(|c| *c == '"' || *c == '\'');
                        let value: String;
                        if let Some(q) = quote {
                            let start = i + 1;
                            let Some(len) = chars[start..].iter().position(|c| *c == q) else {
                                return Err("unterminated attribute value");
                            };
                            value = chars[start..start + len].iter().collect();
                            i = start + len + 1;
                        } else {
                            let (v, next) = take_ident(&chars, i);
                            value = v;
                            i = next;
                        }
                        if chars.get(i) != Some(&']') {
                            return Err("expected `]`");
                        }
                        out.attrs.push(AttrMatch::Equals(name, value));
                        i += 1;
                    }
                    _ => return Err("expected `]` or `=`"),
                }
            }
            '>' | '+' | '~' => return Err("only the descendant combinator is supported"),
            _ => return Err("unexpected character"),
        }
    }
    Ok(out)
}
