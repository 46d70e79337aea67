//! # Expression Evaluator
//!
//! A minimal evaluator for the threshold rules and applicability predicates
//! authored in the model documents.
//!
//! Only integers, booleans and size categories exist; there is no floating
//! point. Arithmetic is checked.
//!
//! ```text
//! expr    := or
//! or      := and (("or" | "||") and)*
//! and     := not (("and" | "&&") not)*
//! not     := ("not" | "!") not | cmp
//! cmp     := sum (("==" | "!=" | "<" | "<=" | ">" | ">=") sum)?
//! sum     := product (("+" | "-") product)*
//! product := unary (("*" | "/" | "%") unary)*
//! unary   := "-" unary | atom
//! atom    := INT | "true" | "false" | PATH | "(" expr ")"
//! PATH    := IDENT ("::" IDENT)*
//! ```
//!
//! A path resolves to a scope variable first; otherwise its last segment is
//! looked up as a size category, so `SystemSize::Medium` and `Medium` are the
//! same value.

use crate::error::ExprError;
use crate::size::{SizeCategory, SizeScale};
use std::collections::BTreeMap;
use std::fmt;

/// Scope variable holding the summed input weights.
pub const SYSTEM_SIZE_NUMBER: &str = "system_size_number";

/// Scope variable holding the computed size category.
pub const SYSTEM_SIZE: &str = "system_size";

// =============================================================================
// VALUES AND SCOPE
// =============================================================================

/// A runtime value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int(i64),
    Bool(bool),
    Size(SizeCategory),
}

impl Value {
    /// Name of the value's type, used in error messages.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "integer",
            Value::Bool(_) => "boolean",
            Value::Size(_) => "size category",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Size(category) => write!(f, "{category}"),
        }
    }
}

/// The variables an expression can see.
///
/// The computed size is handed to predicates through the scope; the loaded
/// model is never mutated.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    scale: &'a SizeScale,
    variables: BTreeMap<String, Value>,
}

impl<'a> Scope<'a> {
    /// Create an empty scope over the given size scale.
    #[must_use]
    pub fn new(scale: &'a SizeScale) -> Self {
        Self {
            scale,
            variables: BTreeMap::new(),
        }
    }

    /// Bind `system_size_number`.
    #[must_use]
    pub fn with_number(mut self, number: i64) -> Self {
        self.variables
            .insert(SYSTEM_SIZE_NUMBER.to_string(), Value::Int(number));
        self
    }

    /// Bind `system_size`.
    #[must_use]
    pub fn with_size(mut self, size: SizeCategory) -> Self {
        self.variables
            .insert(SYSTEM_SIZE.to_string(), Value::Size(size));
        self
    }

    /// Bind an arbitrary variable.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    /// The size scale category literals resolve against.
    #[must_use]
    pub fn scale(&self) -> &SizeScale {
        self.scale
    }

    fn resolve(&self, path: &str) -> Result<Value, ExprError> {
        if let Some(value) = self.variables.get(path) {
            return Ok(value.clone());
        }
        let last = path.rsplit("::").next().unwrap_or(path);
        self.scale
            .get(last)
            .map(Value::Size)
            .ok_or_else(|| ExprError::UnknownIdentifier(path.to_string()))
    }
}

// =============================================================================
// AST
// =============================================================================

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

/// A compiled expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Int(i64),
    Bool(bool),
    Path(String),
    Not(Box<Expr>),
    Neg(Box<Expr>),
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Compile expression text.
pub fn compile(source: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: source.len(),
    };
    let expr = parser.parse_or()?;
    if let Some((offset, token)) = parser.tokens.get(parser.pos) {
        return Err(ExprError::Syntax {
            offset: *offset,
            message: format!("unexpected {token}"),
        });
    }
    Ok(expr)
}

impl Expr {
    /// Evaluate against a scope.
    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<Value, ExprError> {
        match self {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Path(path) => scope.resolve(path),
            Expr::Not(inner) => Ok(Value::Bool(!inner.evaluate_bool(scope)?)),
            Expr::Neg(inner) => inner
                .evaluate_int(scope)?
                .checked_neg()
                .map(Value::Int)
                .ok_or(ExprError::Overflow),
            Expr::Binary { op, lhs, rhs } => evaluate_binary(*op, lhs, rhs, scope),
        }
    }

    /// Evaluate and require a boolean result.
    pub fn evaluate_bool(&self, scope: &Scope<'_>) -> Result<bool, ExprError> {
        match self.evaluate(scope)? {
            Value::Bool(b) => Ok(b),
            other => Err(ExprError::TypeMismatch {
                expected: "boolean",
                found: other.type_name(),
            }),
        }
    }

    /// Evaluate and require an integer result.
    pub fn evaluate_int(&self, scope: &Scope<'_>) -> Result<i64, ExprError> {
        match self.evaluate(scope)? {
            Value::Int(n) => Ok(n),
            other => Err(ExprError::TypeMismatch {
                expected: "integer",
                found: other.type_name(),
            }),
        }
    }
}

fn evaluate_binary(
    op: BinOp,
    lhs: &Expr,
    rhs: &Expr,
    scope: &Scope<'_>,
) -> Result<Value, ExprError> {
    match op {
        // Short-circuit: the right side is only evaluated when it matters.
        BinOp::Or => Ok(Value::Bool(
            lhs.evaluate_bool(scope)? || rhs.evaluate_bool(scope)?,
        )),
        BinOp::And => Ok(Value::Bool(
            lhs.evaluate_bool(scope)? && rhs.evaluate_bool(scope)?,
        )),
        BinOp::Eq | BinOp::Ne => {
            let equal = match (lhs.evaluate(scope)?, rhs.evaluate(scope)?) {
                (Value::Int(a), Value::Int(b)) => a == b,
                (Value::Bool(a), Value::Bool(b)) => a == b,
                (Value::Size(a), Value::Size(b)) => a == b,
                (a, b) => return Err(mismatch(&a, &b)),
            };
            Ok(Value::Bool(if op == BinOp::Eq { equal } else { !equal }))
        }
        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = match (lhs.evaluate(scope)?, rhs.evaluate(scope)?) {
                (Value::Int(a), Value::Int(b)) => a.cmp(&b),
                (Value::Size(a), Value::Size(b)) => a.cmp(&b),
                (Value::Bool(_), _) | (_, Value::Bool(_)) => {
                    return Err(ExprError::TypeMismatch {
                        expected: "integer or size category",
                        found: "boolean",
                    });
                }
                (a, b) => return Err(mismatch(&a, &b)),
            };
            Ok(Value::Bool(match op {
                BinOp::Lt => ordering.is_lt(),
                BinOp::Le => ordering.is_le(),
                BinOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            }))
        }
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => {
            let a = lhs.evaluate_int(scope)?;
            let b = rhs.evaluate_int(scope)?;
            let result = match op {
                BinOp::Add => a.checked_add(b),
                BinOp::Sub => a.checked_sub(b),
                BinOp::Mul => a.checked_mul(b),
                BinOp::Div | BinOp::Rem if b == 0 => return Err(ExprError::DivisionByZero),
                BinOp::Div => a.checked_div(b),
                _ => a.checked_rem(b),
            };
            result.map(Value::Int).ok_or(ExprError::Overflow)
        }
    }
}

fn mismatch(expected: &Value, found: &Value) -> ExprError {
    ExprError::TypeMismatch {
        expected: expected.type_name(),
        found: found.type_name(),
    }
}

// =============================================================================
// LEXER
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Int(i64),
    Path(String),
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
    Bang,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Int(n) => write!(f, "integer `{n}`"),
            Token::Path(p) => write!(f, "`{p}`"),
            Token::LParen => f.write_str("`(`"),
            Token::RParen => f.write_str("`)`"),
            Token::Plus => f.write_str("`+`"),
            Token::Minus => f.write_str("`-`"),
            Token::Star => f.write_str("`*`"),
            Token::Slash => f.write_str("`/`"),
            Token::Percent => f.write_str("`%`"),
            Token::EqEq => f.write_str("`==`"),
            Token::NotEq => f.write_str("`!=`"),
            Token::Lt => f.write_str("`<`"),
            Token::Le => f.write_str("`<=`"),
            Token::Gt => f.write_str("`>`"),
            Token::Ge => f.write_str("`>=`"),
            Token::AndAnd => f.write_str("`&&`"),
            Token::OrOr => f.write_str("`||`"),
            Token::Bang => f.write_str("`!`"),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn tokenize(source: &str) -> Result<Vec<(usize, Token)>, ExprError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;
        let start = i;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let digits = &source[start..i];
            let value = digits.parse::<i64>().map_err(|_| ExprError::Syntax {
                offset: start,
                message: format!("integer literal `{digits}` out of range"),
            })?;
            tokens.push((start, Token::Int(value)));
            continue;
        }

        if is_ident_start(c) {
            loop {
                while i < bytes.len() && is_ident_continue(bytes[i] as char) {
                    i += 1;
                }
                let qualified = bytes.get(i..i + 2) == Some(b"::".as_slice())
                    && bytes.get(i + 2).is_some_and(|b| is_ident_start(*b as char));
                if !qualified {
                    break;
                }
                i += 2;
            }
            tokens.push((start, Token::Path(source[start..i].to_string())));
            continue;
        }

        let next = bytes.get(i + 1).map(|b| *b as char);
        let (token, width) = match (c, next) {
            ('(', _) => (Token::LParen, 1),
            (')', _) => (Token::RParen, 1),
            ('+', _) => (Token::Plus, 1),
            ('-', _) => (Token::Minus, 1),
            ('*', _) => (Token::Star, 1),
            ('/', _) => (Token::Slash, 1),
            ('%', _) => (Token::Percent, 1),
            ('=', Some('=')) => (Token::EqEq, 2),
            ('!', Some('=')) => (Token::NotEq, 2),
            ('!', _) => (Token::Bang, 1),
            ('<', Some('=')) => (Token::Le, 2),
            ('<', _) => (Token::Lt, 1),
            ('>', Some('=')) => (Token::Ge, 2),
            ('>', _) => (Token::Gt, 1),
            ('&', Some('&')) => (Token::AndAnd, 2),
            ('|', Some('|')) => (Token::OrOr, 2),
            _ => {
                let found = source[start..].chars().next().unwrap_or(c);
                return Err(ExprError::Syntax {
                    offset: start,
                    message: format!("unexpected character `{found}`"),
                });
            }
        };
        tokens.push((start, token));
        i += width;
    }

    Ok(tokens)
}

// =============================================================================
// PARSER
// =============================================================================

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |(o, _)| *o)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Path(p)) if p == keyword)
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_and()?;
        while matches!(self.peek(), Some(Token::OrOr)) || self.peek_keyword("or") {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = binary(BinOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_not()?;
        while matches!(self.peek(), Some(Token::AndAnd)) || self.peek_keyword("and") {
            self.advance();
            let rhs = self.parse_not()?;
            lhs = binary(BinOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, ExprError> {
        if matches!(self.peek(), Some(Token::Bang)) || self.peek_keyword("not") {
            self.advance();
            let inner = self.parse_not()?;
            return Ok(Expr::Not(Box::new(inner)));
        }
        self.parse_cmp()
    }

    fn parse_cmp(&mut self) -> Result<Expr, ExprError> {
        let lhs = self.parse_sum()?;
        let op = match self.peek() {
            Some(Token::EqEq) => BinOp::Eq,
            Some(Token::NotEq) => BinOp::Ne,
            Some(Token::Lt) => BinOp::Lt,
            Some(Token::Le) => BinOp::Le,
            Some(Token::Gt) => BinOp::Gt,
            Some(Token::Ge) => BinOp::Ge,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_sum()?;
        Ok(binary(op, lhs, rhs))
    }

    fn parse_sum(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_product()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinOp::Add,
                Some(Token::Minus) => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_product()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_product(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinOp::Mul,
                Some(Token::Slash) => BinOp::Div,
                Some(Token::Percent) => BinOp::Rem,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> Result<Expr, ExprError> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Int(n)) => Ok(Expr::Int(n)),
            Some(Token::Path(p)) => match p.as_str() {
                "true" => Ok(Expr::Bool(true)),
                "false" => Ok(Expr::Bool(false)),
                "and" | "or" | "not" => Err(ExprError::Syntax {
                    offset,
                    message: format!("unexpected keyword `{p}`"),
                }),
                _ => Ok(Expr::Path(p)),
            },
            Some(Token::LParen) => {
                let inner = self.parse_or()?;
                let close = self.offset();
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    _ => Err(ExprError::Syntax {
                        offset: close,
                        message: "expected `)`".to_string(),
                    }),
                }
            }
            Some(token) => Err(ExprError::Syntax {
                offset,
                message: format!("unexpected {token}"),
            }),
            None => Err(ExprError::Syntax {
                offset,
                message: "unexpected end of expression".to_string(),
            }),
        }
    }
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

// =============================================================================
// TESTS
// =============================================================================
