//! Builds the typed argument list handed to command handlers.
use super::*;
use crate::parse::evaluate;

/// One argument of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    Int(u32),
    /// raw, unevaluated command text
    Text(String),
}

/// An ordered, owned argument sequence. A failed parse never produces an ArgList,
/// so every ArgList a handler sees is well formed from head to tail.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArgList(Vec<ArgumentValue>);

impl ArgList {
    pub fn new() -> Self { ArgList(Vec::new()) }
    /// A list holding the raw text as its only element (nothing at all for empty text).
    pub fn text(raw: &str) -> Self {
        if raw.is_empty() {
            ArgList::new()
        } else {
            ArgList(vec![ArgumentValue::Text(raw.to_string())])
        }
    }
    pub fn head(&self) -> Option<&ArgumentValue> { self.0.first() }
    /// The integer at position `index`, if there is one.
    pub fn int(&self, index: usize) -> Option<u32> {
        match self.0.get(index) {
            Some(ArgumentValue::Int(v)) => Some(*v),
            _ => None,
        }
    }
    /// The text at position `index`, if there is one.
    pub fn text_at(&self, index: usize) -> Option<&str> {
        match self.0.get(index) {
            Some(ArgumentValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }
    pub fn iter(&self) -> std::slice::Iter<'_, ArgumentValue> { self.0.iter() }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    fn push(&mut self, v: ArgumentValue) { self.0.push(v) }
}

impl<'a> IntoIterator for &'a ArgList {
    type Item = &'a ArgumentValue;
    type IntoIter = std::slice::Iter<'a, ArgumentValue>;
    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

/// Evaluate each space separated expression in `text`.
/// Segments are separated by exactly one space; if any segment fails to evaluate then
/// the whole list fails.
pub fn parse_arguments(text: &str) -> Result<ArgList, Error> {
    let mut args = ArgList::new();
    let mut rest = text;
    while !rest.is_empty() {
        let e = evaluate(rest)?;
        args.push(ArgumentValue::Int(e.value));
        rest = &rest[e.consumed..];
        match rest.strip_prefix(' ') {
            Some(remainder) => rest = remainder,
            None => break,
        }
    }
    Ok(args)
}
