//! CSS selector subset used by the matcher cascades.
//!
//! Supported: type and universal selectors, `#id`, `.class`, attribute
//! selectors with `=`, `*=`, `^=`, `$=` and `~=`, the `:focus` pseudo-class,
//! descendant and child combinators, and comma separated lists.

use crate::document::{Document, NodeId};
use crate::error::SelectorError;
use std::fmt;
use std::str::FromStr;

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    /// Compounds left to right, each with the combinator linking it to the
    /// previous one. The first combinator is unused.
    parts: Vec<(Combinator, Compound)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Id(String),
    Class(String),
    Attr {
        name: String,
        test: Option<(AttrOp, String)>,
    },
    Focus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Contains,
    Prefix,
    Suffix,
    Includes,
}

impl Selector {
    pub fn parse(source: &str) -> Result<Self, SelectorError> {
        let mut parser = Parser::new(source);
        let alternatives = parser.selector_list()?;
        Ok(Self {
            source: source.trim().to_string(),
            alternatives,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the node is an element matched by any alternative.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        doc.is_element(node)
            && self
                .alternatives
                .iter()
                .any(|complex| complex.matches_at(doc, node, complex.parts.len() - 1))
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Selector::parse(source)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl Complex {
    fn matches_at(&self, doc: &Document, node: NodeId, idx: usize) -> bool {
        let (combinator, compound) = &self.parts[idx];
        if !compound.matches(doc, node) {
            return false;
        }
        if idx == 0 {
            return true;
        }
        match combinator {
            Combinator::Child => doc
                .parent(node)
                .is_some_and(|parent| self.matches_at(doc, parent, idx - 1)),
            Combinator::Descendant => doc
                .ancestors(node)
                .any(|ancestor| self.matches_at(doc, ancestor, idx - 1)),
        }
    }
}

impl Compound {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(element) = doc.element(node) else {
            return false;
        };
        if let Some(tag) = &self.tag
            && element.name() != tag
        {
            return false;
        }
        self.conditions.iter().all(|condition| match condition {
            Condition::Id(id) => element.attr("id") == Some(id.as_str()),
            Condition::Class(class) => element.has_class(class),
            Condition::Attr { name, test } => match (element.attr(name), test) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some((op, expected))) => op.test(actual, expected),
            },
            Condition::Focus => doc.focused() == Some(node),
        })
    }
}

impl AttrOp {
    fn test(self, actual: &str, expected: &str) -> bool {
        match self {
            AttrOp::Equals => actual == expected,
            AttrOp::Contains => !expected.is_empty() && actual.contains(expected),
            AttrOp::Prefix => !expected.is_empty() && actual.starts_with(expected),
            AttrOp::Suffix => !expected.is_empty() && actual.ends_with(expected),
            AttrOp::Includes => actual.split_whitespace().any(|word| word == expected),
        }
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    /// Skip whitespace, reporting whether any was consumed.
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn expect(&mut self, expected: char) -> Result<(), SelectorError> {
        match self.bump() {
            Some(ch) if ch == expected => Ok(()),
            Some(ch) => Err(SelectorError::Unexpected {
                ch,
                pos: self.pos - 1,
            }),
            None => Err(SelectorError::UnexpectedEnd),
        }
    }

    fn unexpected(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::Unexpected { ch, pos: self.pos },
            None => SelectorError::UnexpectedEnd,
        }
    }

    fn selector_list(&mut self) -> Result<Vec<Complex>, SelectorError> {
        let mut list = Vec::new();
        loop {
            self.skip_ws();
            list.push(self.complex()?);
            self.skip_ws();
            match self.peek() {
                None => return Ok(list),
                Some(',') => self.pos += 1,
                Some(_) => return Err(self.unexpected()),
            }
        }
    }

    fn complex(&mut self) -> Result<Complex, SelectorError> {
        let mut parts = vec![(Combinator::Descendant, self.compound()?)];
        loop {
            let had_ws = self.skip_ws();
            match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    parts.push((Combinator::Child, self.compound()?));
                }
                Some(_) if had_ws => parts.push((Combinator::Descendant, self.compound()?)),
                Some(_) => return Err(self.unexpected()),
            }
        }
        Ok(Complex { parts })
    }

    fn compound(&mut self) -> Result<Compound, SelectorError> {
        let start = self.pos;
        let mut compound = Compound::default();
        let mut universal = false;
        match self.peek() {
            Some('*') => {
                self.pos += 1;
                universal = true;
            }
            Some(ch) if is_ident_char(ch) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.conditions.push(Condition::Id(self.ident()?));
                }
                Some('.') => {
                    self.pos += 1;
                    compound.conditions.push(Condition::Class(self.ident()?));
                }
                Some('[') => {
                    self.pos += 1;
                    compound.conditions.push(self.attribute()?);
                }
                Some(':') => {
                    self.pos += 1;
                    let name = self.ident()?;
                    if !name.eq_ignore_ascii_case("focus") {
                        return Err(SelectorError::UnsupportedPseudo(name));
                    }
                    compound.conditions.push(Condition::Focus);
                }
                _ => break,
            }
        }
        if !universal && compound.tag.is_none() && compound.conditions.is_empty() {
            return Err(match self.peek() {
                None | Some(',') => SelectorError::Empty(start),
                Some(_) => self.unexpected(),
            });
        }
        Ok(compound)
    }

    fn attribute(&mut self) -> Result<Condition, SelectorError> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let op = match self.bump() {
            Some(']') => return Ok(Condition::Attr { name, test: None }),
            Some('=') => AttrOp::Equals,
            Some(ch @ ('*' | '^' | '$' | '~')) => {
                self.expect('=')?;
                match ch {
                    '*' => AttrOp::Contains,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Includes,
                }
            }
            Some(ch) => {
                return Err(SelectorError::Unexpected {
                    ch,
                    pos: self.pos - 1,
                });
            }
            None => return Err(SelectorError::UnexpectedEnd),
        };
        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => self.quoted(quote)?,
            _ => self.ident()?,
        };
        self.skip_ws();
        self.expect(']')?;
        Ok(Condition::Attr {
            name,
            test: Some((op, value)),
        })
    }

    fn quoted(&mut self, quote: char) -> Result<String, SelectorError> {
        let start = self.pos;
        self.pos += 1;
        let mut value = String::new();
        loop {
            match self.bump() {
                Some(ch) if ch == quote => return Ok(value),
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => return Err(SelectorError::UnterminatedString(start)),
                },
                Some(ch) => value.push(ch),
                None => return Err(SelectorError::UnterminatedString(start)),
            }
        }
    }

    fn ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.unexpected());
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '-' || ch == '_' || !ch.is_ascii()
}
