// Copyright 2025 the Dismissal Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small CSS selector subset.
//!
//! Supported: type (`button`), universal (`*`), `#id`, `.class`, `[attr]`,
//! `[attr=value]` (value bare or quoted), the descendant combinator (whitespace),
//! the child combinator (`>`), and selector lists separated by `,`.
//!
//! ```
//! use dismissal_dom::Selector;
//!
//! let sel = Selector::parse("nav > .menu [data-close], #cancel").unwrap();
//! assert_eq!(sel.len(), 2);
//! assert!(Selector::parse("div >").is_err());
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use crate::document::Document;
use crate::types::ElementId;

/// Reasons a selector string could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    /// The selector (or one entry of a list) was empty.
    #[error("empty selector")]
    Empty,
    /// A character that is not part of the supported grammar.
    #[error("unexpected character {ch:?} at byte {pos}")]
    UnexpectedChar {
        /// The offending character.
        ch: char,
        /// Byte offset into the source string.
        pos: usize,
    },
    /// An attribute selector was not closed with `]`.
    #[error("unterminated attribute selector")]
    UnterminatedAttribute,
    /// A quoted attribute value was not closed.
    #[error("unterminated string in attribute selector")]
    UnterminatedString,
    /// A combinator with nothing on its right-hand side.
    #[error("combinator is missing its right-hand side")]
    DanglingCombinator,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Simple {
    Tag(String),
    Id(String),
    Class(String),
    Attr { name: String, value: Option<String> },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    parts: Vec<Simple>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// One entry of a selector list: compounds joined by combinators, left to right.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Complex {
    head: Compound,
    tail: Vec<(Combinator, Compound)>,
}

/// A parsed selector list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    alternatives: Vec<Complex>,
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut alternatives = Vec::new();
        for (offset, entry) in split_list(source) {
            alternatives.push(parse_complex(entry, offset)?);
        }
        if alternatives.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(Self { alternatives })
    }

    /// Number of alternatives in the list.
    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    /// Always false for a successfully parsed selector.
    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    /// Whether `el` matches any alternative.
    pub fn matches(&self, doc: &Document, el: ElementId) -> bool {
        self.alternatives.iter().any(|c| c.matches(doc, el))
    }
}

impl core::str::FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Complex {
    fn matches(&self, doc: &Document, el: ElementId) -> bool {
        // Walk right to left: the rightmost compound is the subject.
        let mut chain: Vec<(Option<Combinator>, &Compound)> = Vec::with_capacity(self.tail.len() + 1);
        chain.push((None, &self.head));
        for (comb, compound) in &self.tail {
            chain.push((Some(*comb), compound));
        }
        match_from(doc, el, &chain)
    }
}

/// `chain[last]` must match `el`; its combinator says how to reach the rest.
fn match_from(doc: &Document, el: ElementId, chain: &[(Option<Combinator>, &Compound)]) -> bool {
    let Some(((comb, compound), rest)) = chain.split_last() else {
        return true;
    };
    if !compound.matches(doc, el) {
        return false;
    }
    match comb {
        None => true,
        Some(Combinator::Child) => doc
            .parent_of(el)
            .is_some_and(|parent| match_from(doc, parent, rest)),
        Some(Combinator::Descendant) => {
            let mut cursor = doc.parent_of(el);
            while let Some(ancestor) = cursor {
                if match_from(doc, ancestor, rest) {
                    return true;
                }
                cursor = doc.parent_of(ancestor);
            }
            false
        }
    }
}

impl Compound {
    fn matches(&self, doc: &Document, el: ElementId) -> bool {
        self.parts.iter().all(|part| match part {
            Simple::Tag(tag) => doc.tag(el).is_some_and(|t| t.eq_ignore_ascii_case(tag)),
            Simple::Id(id) => doc.attribute(el, "id") == Some(id.as_str()),
            Simple::Class(class) => doc.has_class(el, class),
            Simple::Attr { name, value: None } => doc.attribute(el, name).is_some(),
            Simple::Attr {
                name,
                value: Some(v),
            } => doc.attribute(el, name) == Some(v.as_str()),
        })
    }
}

/// Split on top-level commas, keeping byte offsets for diagnostics.
fn split_list(source: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    let mut depth = 0_u32;
    for (i, ch) in source.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                out.push((start, &source[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    out.push((start, &source[start..]));
    out
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    base: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) -> bool {
        let before = self.pos;
        while let Some(ch) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += ch.len_utf8();
        }
        self.pos != before
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.unexpected());
        }
        Ok(String::from(&self.src[start..self.pos]))
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::UnexpectedChar {
                ch,
                pos: self.base + self.pos,
            },
            None => SelectorError::Empty,
        }
    }
}

fn parse_complex(entry: &str, base: usize) -> Result<Complex, SelectorError> {
    let mut cur = Cursor {
        src: entry,
        pos: 0,
        base,
    };
    cur.skip_ws();
    if cur.peek().is_none() {
        return Err(SelectorError::Empty);
    }
    let head = parse_compound(&mut cur)?;
    let mut tail = Vec::new();
    loop {
        let had_ws = cur.skip_ws();
        let comb = match cur.peek() {
            None => break,
            Some('>') => {
                cur.bump();
                cur.skip_ws();
                Combinator::Child
            }
            Some(_) if had_ws => Combinator::Descendant,
            Some(_) => return Err(cur.unexpected()),
        };
        if cur.peek().is_none() {
            return Err(SelectorError::DanglingCombinator);
        }
        tail.push((comb, parse_compound(&mut cur)?));
    }
    Ok(Complex { head, tail })
}

fn parse_compound(cur: &mut Cursor<'_>) -> Result<Compound, SelectorError> {
    let mut compound = Compound::default();
    let mut universal = false;
    match cur.peek() {
        Some('*') => {
            cur.bump();
            universal = true;
        }
        Some(ch) if is_ident_char(ch) => compound.parts.push(Simple::Tag(cur.ident()?)),
        _ => {}
    }
    loop {
        match cur.peek() {
            Some('#') => {
                cur.bump();
                compound.parts.push(Simple::Id(cur.ident()?));
            }
            Some('.') => {
                cur.bump();
                compound.parts.push(Simple::Class(cur.ident()?));
            }
            Some('[') => {
                cur.bump();
                compound.parts.push(parse_attr(cur)?);
            }
            _ => break,
        }
    }
    if compound.parts.is_empty() && !universal {
        return Err(cur.unexpected());
    }
    Ok(compound)
}

fn parse_attr(cur: &mut Cursor<'_>) -> Result<Simple, SelectorError> {
    cur.skip_ws();
    let name = cur.ident()?;
    cur.skip_ws();
    let value = match cur.bump() {
        Some(']') => return Ok(Simple::Attr { name, value: None }),
        Some('=') => {
            cur.skip_ws();
            match cur.peek() {
                Some(q @ ('"' | '\'')) => {
                    cur.bump();
                    let start = cur.pos;
                    loop {
                        match cur.bump() {
                            Some(c) if c == q => break,
                            Some(_) => {}
                            None => return Err(SelectorError::UnterminatedString),
                        }
                    }
                    String::from(&cur.src[start..cur.pos - 1])
                }
                _ => cur.ident()?,
            }
        }
        Some(ch) => {
            return Err(SelectorError::UnexpectedChar {
                ch,
                pos: cur.base + cur.pos - ch.len_utf8(),
            });
        }
        None => return Err(SelectorError::UnterminatedAttribute),
    };
    cur.skip_ws();
    match cur.bump() {
        Some(']') => Ok(Simple::Attr {
            name,
            value: Some(value),
        }),
        _ => Err(SelectorError::UnterminatedAttribute),
    }
}
