//! `/calc <expression>`: local arithmetic.
//!
//! Supports `+ - * / % ^`, parentheses, unary signs and decimal literals. `^` binds
//! tighter than unary minus and associates to the right, so `-2^2` is `-4`.

use async_trait::async_trait;
use freya_core::plugin::{Plugin, PluginResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;
use std::fmt;

/// Deepest nesting of parentheses, signs and exponents the parser will follow.
const MAX_DEPTH: usize = 256;

static TRIGGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^/calc\s+(.+)").expect("calc trigger is a valid pattern"));

#[derive(Debug, Clone, PartialEq)]
pub enum CalcError {
    UnexpectedChar(char, usize),
    UnexpectedEnd,
    UnexpectedToken(usize),
    DivisionByZero,
    NotFinite,
    TooDeep,
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedChar(c, pos) => write!(f, "Unexpected character '{}' at position {}", c, pos + 1),
            Self::UnexpectedEnd => write!(f, "Expression ended unexpectedly"),
            Self::UnexpectedToken(pos) => write!(f, "Unexpected input at position {}", pos + 1),
            Self::DivisionByZero => write!(f, "Division by zero"),
            Self::NotFinite => write!(f, "Result is not a finite number"),
            Self::TooDeep => write!(f, "Expression is nested more than {} levels deep", MAX_DEPTH),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Op(char),
    Open,
    Close,
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| CalcError::UnexpectedToken(start))?;
                tokens.push((Token::Number(value), start));
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push((Token::Op(c), i));
                i += 1;
            }
            '×' => {
                tokens.push((Token::Op('*'), i));
                i += 1;
            }
            '÷' => {
                tokens.push((Token::Op('/'), i));
                i += 1;
            }
            '(' => {
                tokens.push((Token::Open, i));
                i += 1;
            }
            ')' => {
                tokens.push((Token::Close, i));
                i += 1;
            }
            other => return Err(CalcError::UnexpectedChar(other, i)),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(token, _)| *token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|(_, at)| *at).unwrap_or_default()
    }

    fn expression(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                '*' => value * rhs,
                _ if rhs == 0.0 => return Err(CalcError::DivisionByZero),
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    // Every recursive path (parentheses, repeated signs, exponents) passes through here.
    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        let at = self.offset();
        match self.advance() {
            Some(Token::Number(value)) => Ok(value),
            Some(Token::Open) => {
                let value = self.expression()?;
                match self.advance() {
                    Some(Token::Close) => Ok(value),
                    Some(_) => Err(CalcError::UnexpectedToken(self.tokens[self.pos - 1].1)),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(_) => Err(CalcError::UnexpectedToken(at)),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

/// Evaluates an arithmetic expression.
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::UnexpectedEnd);
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    if parser.pos < parser.tokens.len() {
        return Err(CalcError::UnexpectedToken(parser.offset()));
    }
    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }
    Ok(value)
}

/// Formats a result without float noise: integers print without a fraction and
/// other values are rounded to 10 decimal places.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let rounded = format!("{:.10}", value);
    rounded.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[derive(Default)]
pub struct CalcPlugin;

impl CalcPlugin {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Plugin for CalcPlugin {
    fn name(&self) -> &str {
        "calc"
    }

    fn description(&self) -> &str {
        "Evaluates a mathematical expression. Usage: /calc [expression]"
    }

    fn trigger(&self) -> &Regex {
        &TRIGGER
    }

    fn loading_message(&self) -> Option<&str> {
        Some("Calculating...")
    }

    async fn execute(&self, args: &[String]) -> anyhow::Result<PluginResult> {
        let Some(expression) = args.first() else {
            return Ok(PluginResult::failure("Please provide an expression to evaluate."));
        };
        Ok(match evaluate(expression) {
            Ok(value) => {
                let result = format_number(value);
                PluginResult::success(
                    format!("{} = {}", expression, result),
                    json!({ "expression": expression, "result": value }),
                )
            }
            Err(e) => PluginResult::failure(format!("Could not evaluate \"{}\": {}", expression, e)),
        })
    }
}
