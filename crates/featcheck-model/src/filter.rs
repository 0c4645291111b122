//! Requirement filter expressions.
//!
//! A small LDAP-style predicate language evaluated against capability
//! attributes:
//!
//! ```text
//! filter     = "(" filtercomp ")"
//! filtercomp = and / or / not / item
//! and        = "&" 1*filter
//! or         = "|" 1*filter
//! not        = "!" filter
//! item       = attr "=*"              ; presence
//!            / attr "=" pattern       ; equality, substring when pattern has an unescaped *
//!            / attr "~=" value        ; approximate: case and whitespace insensitive
//!            / attr ">=" value
//!            / attr "<=" value
//! ```
//!
//! Values may escape `(`, `)`, `*` and `\` with a backslash. Attribute names
//! match case-insensitively. Text attributes compare as versions when both
//! sides parse as versions and lexicographically otherwise; integer and
//! float attributes compare numerically; a list attribute matches when any
//! of its elements matches.

use crate::descriptor::AttributeValue;
use crate::error::ModelError;
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A parsed filter expression together with its source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Filter {
    text: String,
    root: FilterNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
    Not(Box<FilterNode>),
    Item { attribute: String, op: FilterOp },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterOp {
    Present,
    Equal(String),
    /// Pattern pieces split at each unescaped `*`; always at least two.
    Substring(Vec<String>),
    Approx(String),
    GreaterEq(String),
    LessEq(String),
}

impl Filter {
    pub fn root(&self) -> &FilterNode {
        &self.root
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn matches(&self, attributes: &BTreeMap<String, AttributeValue>) -> bool {
        self.root.matches(attributes)
    }
}

impl FilterNode {
    pub fn matches(&self, attributes: &BTreeMap<String, AttributeValue>) -> bool {
        match self {
            FilterNode::And(nodes) => nodes.iter().all(|node| node.matches(attributes)),
            FilterNode::Or(nodes) => nodes.iter().any(|node| node.matches(attributes)),
            FilterNode::Not(node) => !node.matches(attributes),
            FilterNode::Item { attribute, op } => {
                lookup(attributes, attribute).is_some_and(|value| op.matches(value))
            }
        }
    }
}

fn lookup<'a>(
    attributes: &'a BTreeMap<String, AttributeValue>,
    name: &str,
) -> Option<&'a AttributeValue> {
    attributes.get(name).or_else(|| {
        attributes
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

impl FilterOp {
    fn matches(&self, value: &AttributeValue) -> bool {
        if let AttributeValue::List(items) = value {
            return items.iter().any(|item| self.matches(item));
        }
        match self {
            FilterOp::Present => true,
            FilterOp::Equal(operand) => equals(value, operand),
            FilterOp::Approx(operand) => match value {
                AttributeValue::Text(text) => normalize(text) == normalize(operand),
                _ => equals(value, operand),
            },
            FilterOp::Substring(pieces) => glob_matches(&value.to_string(), pieces),
            FilterOp::GreaterEq(operand) => {
                compare(value, operand).is_some_and(|ord| ord != Ordering::Less)
            }
            FilterOp::LessEq(operand) => {
                compare(value, operand).is_some_and(|ord| ord != Ordering::Greater)
            }
        }
    }
}

fn as_version(text: &str) -> Option<Version> {
    if text.trim().is_empty() {
        return None;
    }
    text.parse().ok()
}

fn compare(value: &AttributeValue, operand: &str) -> Option<Ordering> {
    match value {
        AttributeValue::Long(n) => operand.trim().parse::<i64>().ok().map(|o| n.cmp(&o)),
        AttributeValue::Double(d) => operand
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(|o| d.partial_cmp(&o)),
        AttributeValue::Text(text) => match (as_version(text), as_version(operand)) {
            (Some(left), Some(right)) => Some(left.cmp(&right)),
            _ => Some(text.as_str().cmp(operand)),
        },
        AttributeValue::Bool(_) | AttributeValue::List(_) => None,
    }
}

fn equals(value: &AttributeValue, operand: &str) -> bool {
    match value {
        AttributeValue::Bool(b) => operand
            .trim()
            .eq_ignore_ascii_case(if *b { "true" } else { "false" }),
        AttributeValue::Text(text) if text == operand => true,
        _ => compare(value, operand) == Some(Ordering::Equal),
    }
}

fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn glob_matches(text: &str, pieces: &[String]) -> bool {
    let Some((first, rest)) = pieces.split_first() else {
        return false;
    };
    let Some((last, middle)) = rest.split_last() else {
        return text == first;
    };
    let Some(rest) = text.strip_prefix(first.as_str()) else {
        return false;
    };
    let Some(mut cursor) = rest.strip_suffix(last.as_str()) else {
        return false;
    };
    for piece in middle {
        match cursor.find(piece.as_str()) {
            Some(idx) => cursor = &cursor[idx + piece.len()..],
            None => return false,
        }
    }
    true
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, reason: impl Into<String>) -> ModelError {
        ModelError::InvalidFilter {
            input: self.input.to_string(),
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ModelError> {
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected `{expected}`, found `{c}`"))),
            None => Err(self.error(format!("expected `{expected}`, found end of input"))),
        }
    }

    fn parse_filter(&mut self) -> Result<FilterNode, ModelError> {
        self.skip_ws();
        self.expect('(')?;
        self.skip_ws();
        let node = match self.peek() {
            Some('&') => {
                self.bump();
                FilterNode::And(self.parse_operands()?)
            }
            Some('|') => {
                self.bump();
                FilterNode::Or(self.parse_operands()?)
            }
            Some('!') => {
                self.bump();
                FilterNode::Not(Box::new(self.parse_filter()?))
            }
            _ => self.parse_item()?,
        };
        self.skip_ws();
        self.expect(')')?;
        Ok(node)
    }

    fn parse_operands(&mut self) -> Result<Vec<FilterNode>, ModelError> {
        let mut operands = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() != Some('(') {
                break;
            }
            operands.push(self.parse_filter()?);
        }
        if operands.is_empty() {
            return Err(self.error("composite filter needs at least one operand"));
        }
        Ok(operands)
    }

    fn parse_item(&mut self) -> Result<FilterNode, ModelError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '=' | '~' | '<' | '>' | '(' | ')') {
                break;
            }
            self.bump();
        }
        let attribute = self.input[start..self.pos].trim().to_string();
        if attribute.is_empty() {
            return Err(self.error("missing attribute name"));
        }

        let op = match self.bump() {
            Some('=') => {
                let (pieces, wildcard) = self.parse_value()?;
                if !wildcard {
                    FilterOp::Equal(pieces.concat())
                } else if pieces.len() == 2 && pieces.iter().all(String::is_empty) {
                    FilterOp::Present
                } else {
                    FilterOp::Substring(pieces)
                }
            }
            Some('~') => {
                self.expect('=')?;
                FilterOp::Approx(self.parse_plain_value()?)
            }
            Some('>') => {
                self.expect('=')?;
                FilterOp::GreaterEq(self.parse_plain_value()?)
            }
            Some('<') => {
                self.expect('=')?;
                FilterOp::LessEq(self.parse_plain_value()?)
            }
            _ => return Err(self.error("expected one of `=`, `~=`, `>=`, `<=`")),
        };
        Ok(FilterNode::Item { attribute, op })
    }

    fn parse_plain_value(&mut self) -> Result<String, ModelError> {
        let (pieces, wildcard) = self.parse_value()?;
        if wildcard {
            return Err(self.error("wildcards are only allowed with `=`"));
        }
        Ok(pieces.concat())
    }

    /// Reads up to the closing `)`, splitting at unescaped `*`.
    fn parse_value(&mut self) -> Result<(Vec<String>, bool), ModelError> {
        let mut pieces = vec![String::new()];
        let mut wildcard = false;
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated value")),
                Some(')') => break,
                Some('(') => return Err(self.error("unescaped `(` in value")),
                Some('\\') => {
                    self.bump();
                    let Some(escaped) = self.bump() else {
                        return Err(self.error("dangling escape"));
                    };
                    if let Some(piece) = pieces.last_mut() {
                        piece.push(escaped);
                    }
                }
                Some('*') => {
                    self.bump();
                    wildcard = true;
                    pieces.push(String::new());
                }
                Some(c) => {
                    self.bump();
                    if let Some(piece) = pieces.last_mut() {
                        piece.push(c);
                    }
                }
            }
        }
        Ok((pieces, wildcard))
    }
}

impl FromStr for Filter {
    type Err = ModelError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim();
        let mut parser = Parser {
            input: text,
            pos: 0,
        };
        let root = parser.parse_filter()?;
        parser.skip_ws();
        if parser.pos != text.len() {
            return Err(parser.error("trailing input after filter"));
        }
        Ok(Self {
            text: text.to_string(),
            root,
        })
    }
}

impl TryFrom<String> for Filter {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Filter> for String {
    fn from(value: Filter) -> Self {
        value.text
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
