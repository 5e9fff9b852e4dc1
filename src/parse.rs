//! The expression engine behind every numeric command argument.
//!
//! Text is tokenized up to the first space, the tokens are arranged into a [ParseTree]
//! and the tree is evaluated bottom-up using unsigned 32-bit wrapping arithmetic.
//!
//! Grammar:
//! ```text
//!  expr    = sum ["=" expr]
//!  sum     = product [("+" | "-") product]
//!  product = atom [("*" | "/") atom]
//!  atom    = number | identifier
//!  number  = /[0-9]+/ | /0[xX][0-9a-fA-F]+/ | /\$[0-9a-fA-F]+/ | /0[bB][01]+/
//!  identifier = /[A-Za-z_][A-Za-z0-9_]*/
//! ```
//! Identifiers are recognized but there is no symbol table behind them, so evaluating
//! one always fails.
use super::*;
use std::fmt::Display;
use std::{iter::Peekable, str::Chars, vec::IntoIter};

type TokenIter = Peekable<IntoIter<Token>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Assign,
    Add,
    Subtract,
    Multiply,
    Divide,
}
impl Operator {
    fn from_char(c: char) -> Option<Operator> {
        match c {
            '=' => Some(Operator::Assign),
            '+' => Some(Operator::Add),
            '-' => Some(Operator::Subtract),
            '*' => Some(Operator::Multiply),
            '/' => Some(Operator::Divide),
            _ => None,
        }
    }
    pub fn symbol(&self) -> char {
        match self {
            Operator::Assign => '=',
            Operator::Add => '+',
            Operator::Subtract => '-',
            Operator::Multiply => '*',
            Operator::Divide => '/',
        }
    }
    /// Combine the already evaluated operands.
    pub fn apply(&self, current: u32, next: u32) -> Result<u32, Error> {
        match self {
            Operator::Assign => Ok(next),
            Operator::Add => Ok(current.wrapping_add(next)),
            Operator::Subtract => Ok(current.wrapping_sub(next)),
            Operator::Multiply => Ok(current.wrapping_mul(next)),
            Operator::Divide => current.checked_div(next).ok_or_else(|| eval_err!("division by zero")),
        }
    }
}

/// A classified lexeme. `Error` never comes out of the lexer; the parser uses it to mark
/// a spot in the tree where an operand was required but none could be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    UInt(u32),
    Operator(Operator),
    Identifier(String),
    Error,
}
impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::UInt(v) => write!(f, "{}", v),
            Token::Operator(op) => write!(f, "{}", op.symbol()),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::Error => write!(f, "<error>"),
        }
    }
}

/// Output of the lexer: the tokens plus the number of bytes of input they cover.
#[derive(Debug)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub consumed: usize,
}

/// Each expression is parsed into a tree of ParseTree nodes. Leaves hold numbers,
/// identifiers or error markers; inner nodes hold an operator and own both operands.
#[derive(Debug)]
pub struct ParseTree {
    pub token: Token,
    left: Option<Box<ParseTree>>,
    right: Option<Box<ParseTree>>,
}
impl ParseTree {
    pub fn new(token: Token, left: Option<ParseTree>, right: Option<ParseTree>) -> Self {
        ParseTree {
            token,
            left: left.map(Box::new),
            right: right.map(Box::new),
        }
    }
    pub fn leaf(token: Token) -> Self { ParseTree::new(token, None, None) }
    pub fn is_error(&self) -> bool { self.token == Token::Error }
    /// Evaluate the tree depth-first. Both operands of an operator are always evaluated
    /// before either failure is reported.
    pub fn eval(&self) -> Result<u32, Error> {
        match &self.token {
            Token::UInt(v) => Ok(*v),
            Token::Operator(op) => {
                let lhs = ParseTree::eval_child(&self.left, op);
                let rhs = ParseTree::eval_child(&self.right, op);
                op.apply(lhs?, rhs?)
            }
            Token::Identifier(name) => Err(eval_err!("unknown identifier \"{}\"", name)),
            Token::Error => Err(syntax_err!("missing operand")),
        }
    }
    fn eval_child(child: &Option<Box<ParseTree>>, op: &Operator) -> Result<u32, Error> {
        match child {
            Some(node) => node.eval(),
            None => Err(syntax_err!(format!("missing operand for \"{}\"", op.symbol()))),
        }
    }
}
impl Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => write!(f, "({} {} {})", left, self.token, right),
            _ => write!(f, "{}", self.token),
        }
    }
}

/// The result of evaluating the expression at the front of some text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub value: u32,
    /// bytes of the text that belonged to the expression
    pub consumed: usize,
}

/// Evaluate the expression at the start of `text`. The expression ends at the first space.
pub fn evaluate(text: &str) -> Result<Evaluation, Error> {
    let lexed = tokenize(text)?;
    let tree = parse(lexed.tokens);
    if tree.is_error() {
        return Err(syntax_err!(format!("can't parse \"{}\"", &text[..lexed.consumed])));
    }
    let value = tree.eval()?;
    Ok(Evaluation {
        value,
        consumed: lexed.consumed,
    })
}

/// Arrange tokens into a tree. An empty token stream, or tokens left over after a
/// complete expression, produce a root holding Token::Error.
pub fn parse(tokens: Vec<Token>) -> ParseTree {
    let mut token_iter = tokens.into_iter().peekable();
    if token_iter.peek().is_none() {
        return ParseTree::leaf(Token::Error);
    }
    let root = parse_expr(&mut token_iter);
    if token_iter.peek().is_some() {
        return ParseTree::leaf(Token::Error);
    }
    root
}
/// Parse an expr (right associative assignment).
/// ```text
///     expr ::= sum ["=" expr]
/// ```
fn parse_expr(token_iter: &mut TokenIter) -> ParseTree {
    let left = parse_sum(token_iter);
    if let Some(op) = token_iter.next_if_eq(&Token::Operator(Operator::Assign)) {
        let right = parse_expr(token_iter);
        return ParseTree::new(op, Some(left), Some(right));
    }
    left
}
/// Parse a sum.
/// ```text
///     sum ::= product [addop product]
/// ```
fn parse_sum(token_iter: &mut TokenIter) -> ParseTree {
    let mut node = parse_product(token_iter);
    while let Some(op) =
        token_iter.next_if(|t| matches!(t, Token::Operator(Operator::Add) | Token::Operator(Operator::Subtract)))
    {
        let right = parse_product(token_iter);
        node = ParseTree::new(op, Some(node), Some(right));
    }
    node
}
/// Parse a product.
/// ```text
///     product ::= atom [mulop atom]
/// ```
fn parse_product(token_iter: &mut TokenIter) -> ParseTree {
    let mut node = parse_atom(token_iter);
    while let Some(op) =
        token_iter.next_if(|t| matches!(t, Token::Operator(Operator::Multiply) | Token::Operator(Operator::Divide)))
    {
        let right = parse_atom(token_iter);
        node = ParseTree::new(op, Some(node), Some(right));
    }
    node
}
fn parse_atom(token_iter: &mut TokenIter) -> ParseTree {
    match token_iter.next_if(|t| matches!(t, Token::UInt(_) | Token::Identifier(_))) {
        Some(token) => ParseTree::leaf(token),
        // an operand is missing here; leave the offending token for the caller
        None => ParseTree::leaf(Token::Error),
    }
}

/// Tokenize the given string up to the first space.
pub fn tokenize(input: &str) -> Result<Lexed, Error> {
    let mut chars = input.chars();
    let mut current = chars.next();
    let mut output = Vec::new();
    while let Some(ch) = current {
        if ch == ' ' {
            // a space always ends the expression; whatever follows belongs to the caller
            break;
        }
        let token = match ch {
            '0' => {
                current = chars.next();
                match current {
                    Some('x') | Some('X') => {
                        current = chars.next();
                        get_number_from_radix(16, "0x", &mut current, &mut chars)
                    }
                    Some('b') | Some('B') => {
                        current = chars.next();
                        get_number_from_radix(2, "0b", &mut current, &mut chars)
                    }
                    _ => get_number_from_digits(10, "0", 0, &mut current, &mut chars),
                }
            }
            '1'..='9' => get_number_from_radix(10, "", &mut current, &mut chars),
            '$' => {
                current = chars.next();
                get_number_from_radix(16, "$", &mut current, &mut chars)
            }
            c if c.is_ascii_alphabetic() || c == '_' => Ok(get_identifier(&mut current, &mut chars)),
            c => match Operator::from_char(c) {
                Some(op) => {
                    current = chars.next();
                    Ok(Token::Operator(op))
                }
                None => Err(format!("unexpected character '{}'", c)),
            },
        };
        match token {
            Ok(token) => output.push(token),
            Err(msg) => return Err(syntax_err!(msg)),
        }
    }
    let consumed = input.len() - chars.as_str().len() - current.map_or(0, |c| c.len_utf8());
    Ok(Lexed {
        tokens: output,
        consumed,
    })
}
fn get_number_from_radix(radix: u32, prefix: &str, current: &mut Option<char>, chars: &mut Chars) -> Result<Token, String> {
    if (*current).and_then(|c| c.to_digit(radix)).is_none() {
        return Err(format!("missing digit(s) after \"{}\"", prefix));
    }
    get_number_from_digits(radix, prefix, 0, current, chars)
}
fn get_number_from_digits(
    radix: u32, prefix: &str, mut num: u32, current: &mut Option<char>, chars: &mut Chars,
) -> Result<Token, String> {
    let mut raw = prefix.to_string();
    while let Some(c) = *current {
        let digit = match c.to_digit(radix) {
            Some(digit) => digit,
            None if c.is_ascii_alphanumeric() || c == '_' => {
                return Err(format!("malformed numeral \"{}{}\"", raw, c));
            }
            None => break,
        };
        raw.push(c);
        // literals wider than 32 bits keep their low 32 bits
        num = num.wrapping_mul(radix).wrapping_add(digit);
        *current = chars.next();
    }
    Ok(Token::UInt(num))
}
fn get_identifier(current: &mut Option<char>, chars: &mut Chars) -> Token {
    let mut raw = String::new();
    while let Some(ch) = *current {
        if !ch.is_ascii_alphanumeric() && ch != '_' {
            break;
        }
        raw.push(ch);
        *current = chars.next();
    }
    Token::Identifier(raw)
}
