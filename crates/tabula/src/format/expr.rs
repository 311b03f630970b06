//! The formula expression language.
//!
//! ```text
//! expr    := term (("+" | "-") term)*
//! term    := unary (("*" | "/") unary)*
//! unary   := "-" unary | primary
//! primary := NUMBER | STRING | IDENT | IDENT "(" args ")" | "(" expr ")"
//! ```
//!
//! Identifiers name source fields and may be written bare (`price`) or in
//! braces (`{price}`). Functions: `sum`, `avg`, `min`, `max`, `concat`,
//! `round(x, digits)`.

use tabula_core::{Error, Result, Row, Value};

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Field(String),
    Neg(Box<Expr>),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Func,
        args: Vec<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    Sum,
    Avg,
    Min,
    Max,
    Concat,
    Round,
}

impl Func {
    fn from_name(name: &str) -> Option<Func> {
        Some(match name.to_ascii_lowercase().as_str() {
            "sum" => Func::Sum,
            "avg" | "average" => Func::Avg,
            "min" => Func::Min,
            "max" => Func::Max,
            "concat" => Func::Concat,
            "round" => Func::Round,
            _ => return None,
        })
    }
}

impl Expr {
    /// Parses `src`. An empty (or all-whitespace) source parses to the sum of
    /// `source_fields`.
    pub fn parse(src: &str, source_fields: &[String]) -> Result<Expr> {
        if src.trim().is_empty() {
            return Ok(Expr::Call {
                func: Func::Sum,
                args: source_fields.iter().cloned().map(Expr::Field).collect(),
            });
        }

        let tokens = lex(src)?;
        let mut parser = Parser { tokens, pos: 0 };
        let expr = parser.parse_expr()?;
        if let Some(token) = parser.peek() {
            return Err(Error::expression_evaluation_failed(format!(
                "unexpected token `{token}` in `{src}`"
            )));
        }
        Ok(expr)
    }

    /// Evaluates against `row`. Only fields listed in `source_fields` may be
    /// read.
    pub fn eval(&self, row: &Row, source_fields: &[String]) -> Result<Evaluated> {
        match self {
            Expr::Number(v) => Ok(Evaluated::Number(*v)),
            Expr::Str(v) => Ok(Evaluated::Text(v.clone())),
            Expr::Field(name) => {
                if !source_fields.iter().any(|f| f == name) {
                    return Err(Error::expression_evaluation_failed(format!(
                        "`{name}` is not a source field of this formula"
                    )));
                }
                Ok(Evaluated::from(row.value(name)))
            }
            Expr::Neg(expr) => Ok(Evaluated::Number(-expr.eval(row, source_fields)?.number()?)),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = lhs.eval(row, source_fields)?.number()?;
                let rhs = rhs.eval(row, source_fields)?.number()?;
                let value = match op {
                    BinaryOp::Add => lhs + rhs,
                    BinaryOp::Sub => lhs - rhs,
                    BinaryOp::Mul => lhs * rhs,
                    BinaryOp::Div => {
                        if rhs == 0.0 {
                            return Err(Error::expression_evaluation_failed("division by zero"));
                        }
                        lhs / rhs
                    }
                };
                Ok(Evaluated::Number(value))
            }
            Expr::Call { func, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.eval(row, source_fields))
                    .collect::<Result<Vec<_>>>()?;
                call(*func, args)
            }
        }
    }
}

fn call(func: Func, args: Vec<Evaluated>) -> Result<Evaluated> {
    match func {
        Func::Concat => Ok(Evaluated::Text(
            args.iter().map(Evaluated::text).collect::<Vec<_>>().concat(),
        )),
        Func::Sum => {
            let mut total = 0.0;
            for arg in &args {
                total += arg.number()?;
            }
            Ok(Evaluated::Number(total))
        }
        Func::Avg => {
            let present: Vec<&Evaluated> = args.iter().filter(|a| !a.is_null()).collect();
            if present.is_empty() {
                return Err(Error::expression_evaluation_failed("avg of no values"));
            }
            let mut total = 0.0;
            for arg in &present {
                total += arg.number()?;
            }
            Ok(Evaluated::Number(total / present.len() as f64))
        }
        Func::Min | Func::Max => {
            let mut best: Option<f64> = None;
            for arg in args.iter().filter(|a| !a.is_null()) {
                let v = arg.number()?;
                best = Some(match best {
                    None => v,
                    Some(b) if func == Func::Min => b.min(v),
                    Some(b) => b.max(v),
                });
            }
            best.map(Evaluated::Number).ok_or_else(|| {
                Error::expression_evaluation_failed("min/max of no values")
            })
        }
        Func::Round => {
            let [value, digits] = args.as_slice() else {
                return Err(Error::expression_evaluation_failed(
                    "round expects (value, digits)",
                ));
            };
            let factor = 10f64.powi(digits.number()? as i32);
            Ok(Evaluated::Number((value.number()? * factor).round() / factor))
        }
    }
}

/// Result of evaluating a formula for one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluated {
    Null,
    Number(f64),
    Text(String),
}

impl Evaluated {
    fn is_null(&self) -> bool {
        matches!(self, Evaluated::Null)
    }

    /// Numeric view; null counts as zero.
    fn number(&self) -> Result<f64> {
        match self {
            Evaluated::Null => Ok(0.0),
            Evaluated::Number(v) => Ok(*v),
            Evaluated::Text(v) => v.trim().parse::<f64>().map_err(|_| {
                Error::expression_evaluation_failed(format!("`{v}` is not a number"))
            }),
        }
    }

    fn text(&self) -> String {
        match self {
            Evaluated::Null => String::new(),
            Evaluated::Number(v) => render_number(*v),
            Evaluated::Text(v) => v.clone(),
        }
    }

    pub fn render(&self) -> String {
        self.text()
    }
}

impl From<&Value> for Evaluated {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Evaluated::Null,
            Value::String(v) => Evaluated::Text(v.clone()),
            other => other.as_f64().map(Evaluated::Number).unwrap_or(Evaluated::Null),
        }
    }
}

/// Renders a float without binary noise: at most ten decimals, trailing zeros
/// trimmed.
fn render_number(v: f64) -> String {
    if !v.is_finite() {
        return String::new();
    }
    let mut out = format!("{v:.10}");
    if out.contains('.') {
        while out.ends_with('0') {
            out.pop();
        }
        if out.ends_with('.') {
            out.pop();
        }
    }
    if out == "-0" {
        out = "0".to_string();
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Number(v) => write!(f, "{v}"),
            Token::Str(v) => write!(f, "'{v}'"),
            Token::Ident(v) => f.write_str(v),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Star => f.write_str("*"),
            Token::Slash => f.write_str("/"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Comma => f.write_str(","),
        }
    }
}

fn ident_ch(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '.'
}

fn lex(src: &str) -> Result<Vec<Token>> {
    let mut tokens = vec![];
    let mut chars = src.chars().peekable();

    while let Some(ch) = chars.next() {
        let token = match ch {
            ch if ch.is_whitespace() => continue,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            ',' => Token::Comma,
            '{' => {
                let mut ident = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => ident.push(ch),
                        None => {
                            return Err(Error::expression_evaluation_failed(
                                "unterminated `{` in formula",
                            ))
                        }
                    }
                }
                Token::Ident(ident.trim().to_string())
            }
            quote @ ('\'' | '"') => {
                let mut s = String::new();
                loop {
                    match chars.next() {
                        Some(ch) if ch == quote => break,
                        Some(ch) => s.push(ch),
                        None => {
                            return Err(Error::expression_evaluation_failed(
                                "unterminated string literal in formula",
                            ))
                        }
                    }
                }
                Token::Str(s)
            }
            ch if ch.is_ascii_digit() => {
                let mut num = String::from(ch);
                while let Some(&next) = chars.peek() {
                    if next.is_ascii_digit() || next == '.' {
                        num.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = num.parse::<f64>().map_err(|_| {
                    Error::expression_evaluation_failed(format!("invalid number `{num}`"))
                })?;
                Token::Number(value)
            }
            ch if ident_ch(ch) => {
                let mut ident = String::from(ch);
                while let Some(&next) = chars.peek() {
                    if ident_ch(next) {
                        ident.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                Token::Ident(ident)
            }
            ch => {
                return Err(Error::expression_evaluation_failed(format!(
                    "unexpected character `{ch}` in formula"
                )))
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_term()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.eat(&Token::Minus) {
            return Ok(Expr::Neg(Box::new(self.parse_unary()?)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        match self.next() {
            Some(Token::Number(v)) => Ok(Expr::Number(v)),
            Some(Token::Str(v)) => Ok(Expr::Str(v)),
            Some(Token::LParen) => {
                let expr = self.parse_expr()?;
                if !self.eat(&Token::RParen) {
                    return Err(Error::expression_evaluation_failed("expected `)`"));
                }
                Ok(expr)
            }
            Some(Token::Ident(name)) => {
                if !self.eat(&Token::LParen) {
                    return Ok(Expr::Field(name));
                }
                let func = Func::from_name(&name).ok_or_else(|| {
                    Error::expression_evaluation_failed(format!("unknown function `{name}`"))
                })?;
                let mut args = vec![];
                if !self.eat(&Token::RParen) {
                    loop {
                        args.push(self.parse_expr()?);
                        if self.eat(&Token::Comma) {
                            continue;
                        }
                        if self.eat(&Token::RParen) {
                            break;
                        }
                        return Err(Error::expression_evaluation_failed(
                            "expected `,` or `)` in argument list",
                        ));
                    }
                }
                Ok(Expr::Call { func, args })
            }
            Some(token) => Err(Error::expression_evaluation_failed(format!(
                "unexpected token `{token}`"
            ))),
            None => Err(Error::expression_evaluation_failed(
                "unexpected end of formula",
            )),
        }
    }
}
