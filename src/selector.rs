//! Selector subset used by filter configs and page queries.
//!
//! A selector is a chain of compounds such as `#myUL li` or
//! `#meal[type_id='2']`, joined by whitespace (any ancestor) or `>` (the
//! parent). A compound holds an optional tag, an optional id, classes and
//! attribute tests.

use super::*;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttrTest {
    Present(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Compound {
    pub(crate) tag: Option<String>,
    pub(crate) id: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) attrs: Vec<AttrTest>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, element: &Element) -> bool {
        self.tag
            .as_deref()
            .is_none_or(|tag| element.tag_name.eq_ignore_ascii_case(tag))
            && self
                .id
                .as_deref()
                .is_none_or(|id| element.attr("id") == Some(id))
            && self.classes.iter().all(|class| element.has_class(class))
            && self.attrs.iter().all(|test| match test {
                AttrTest::Present(name) => element.attr(name).is_some(),
                AttrTest::Equals(name, value) => element.attr(name) == Some(value.as_str()),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Relation {
    Ancestor,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Selector {
    /// The compound the matched element itself must satisfy.
    pub(crate) subject: Compound,
    /// Outer compounds, nearest first, each with its relation to the one
    /// before it.
    pub(crate) context: Vec<(Relation, Compound)>,
}

impl Selector {
    pub(crate) fn parse(source: &str) -> Result<Self> {
        SelectorCursor::new(source).selector()
    }

    /// The id when the selector is a bare `#id`, which the id index answers.
    pub(crate) fn bare_id(&self) -> Option<&str> {
        let Compound {
            tag: None,
            id: Some(id),
            classes,
            attrs,
        } = &self.subject
        else {
            return None;
        };
        (classes.is_empty() && attrs.is_empty() && self.context.is_empty()).then_some(id.as_str())
    }

    pub(crate) fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        dom.element(node)
            .is_some_and(|element| self.subject.matches(element))
            && context_matches(dom, node, &self.context)
    }
}

fn context_matches(dom: &Dom, node: NodeId, context: &[(Relation, Compound)]) -> bool {
    let Some(((relation, compound), outer)) = context.split_first() else {
        return true;
    };
    let fits = |candidate: NodeId| {
        dom.element(candidate)
            .is_some_and(|element| compound.matches(element))
            && context_matches(dom, candidate, outer)
    };
    match relation {
        Relation::Parent => dom.parent(node).is_some_and(fits),
        Relation::Ancestor => {
            let mut cursor = dom.parent(node);
            while let Some(candidate) = cursor {
                if fits(candidate) {
                    return true;
                }
                cursor = dom.parent(candidate);
            }
            false
        }
    }
}

struct SelectorCursor<'a> {
    source: &'a str,
    chars: Peekable<Chars<'a>>,
}

impl<'a> SelectorCursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().peekable(),
        }
    }

    fn unsupported(&self) -> Error {
        Error::UnsupportedSelector(self.source.to_string())
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    /// Skips whitespace and reports whether any was present.
    fn skip_ws(&mut self) -> bool {
        let mut skipped = false;
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
            skipped = true;
        }
        skipped
    }

    fn selector(mut self) -> Result<Selector> {
        self.skip_ws();
        let mut compounds = vec![self.compound()?];
        let mut relations = Vec::new();
        loop {
            let spaced = self.skip_ws();
            let relation = match self.peek() {
                None => break,
                Some('>') => {
                    self.chars.next();
                    self.skip_ws();
                    Relation::Parent
                }
                Some(_) if spaced => Relation::Ancestor,
                Some(_) => return Err(self.unsupported()),
            };
            relations.push(relation);
            compounds.push(self.compound()?);
        }

        let subject = compounds.pop().ok_or_else(|| self.unsupported())?;
        let context = relations.into_iter().rev().zip(compounds.into_iter().rev()).collect();
        Ok(Selector { subject, context })
    }

    fn compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        if self.peek().is_some_and(is_name_char) {
            compound.tag = Some(self.name()?.to_ascii_lowercase());
        }
        loop {
            match self.peek() {
                Some('#') if compound.id.is_none() => {
                    self.chars.next();
                    compound.id = Some(self.name()?);
                }
                Some('.') => {
                    self.chars.next();
                    compound.classes.push(self.name()?);
                }
                Some('[') => {
                    self.chars.next();
                    compound.attrs.push(self.attr_test()?);
                }
                Some(ch) if ch.is_whitespace() || ch == '>' => break,
                None => break,
                Some(_) => return Err(self.unsupported()),
            }
        }
        if compound.is_empty() {
            return Err(self.unsupported());
        }
        Ok(compound)
    }

    fn name(&mut self) -> Result<String> {
        let mut name = String::new();
        while let Some(ch) = self.peek().filter(|ch| is_name_char(*ch)) {
            name.push(ch);
            self.chars.next();
        }
        if name.is_empty() {
            return Err(self.unsupported());
        }
        Ok(name)
    }

    fn attr_test(&mut self) -> Result<AttrTest> {
        self.skip_ws();
        let name = self.name()?.to_ascii_lowercase();
        self.skip_ws();
        if self.eat(']') {
            return Ok(AttrTest::Present(name));
        }
        if !self.eat('=') {
            return Err(self.unsupported());
        }
        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('\'' | '"')) => {
                self.chars.next();
                let mut value = String::new();
                loop {
                    match self.chars.next() {
                        Some(ch) if ch == quote => break,
                        Some(ch) => value.push(ch),
                        None => return Err(self.unsupported()),
                    }
                }
                value
            }
            _ => self.name()?,
        };
        self.skip_ws();
        if !self.eat(']') {
            return Err(self.unsupported());
        }
        Ok(AttrTest::Equals(name, value))
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}
