//! Arithmetic entry for amount cells.
//!
//! Two forms are accepted: a plain expression over numeric literals with
//! `+ - * /`, unary signs and parentheses (`(12 + 3) * 2`), or a relative
//! edit that starts with an operator followed by a number (`+10`, `-5`,
//! `*1.1`, `/2`) and applies to the current value.

const OPERATORS: [char; 4] = ['+', '-', '*', '/'];

/// Evaluates `input` against `base`. Returns `None` for anything that is not
/// a well-formed expression or does not produce a finite number.
pub fn evaluate(input: &str, base: f64) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some((op, rhs)) = split_relative(trimmed) {
        let rhs = evaluate(rhs, 0.0)?;
        let base = if base.is_finite() { base } else { 0.0 };
        let value = match op {
            '+' => base + rhs,
            '-' => base - rhs,
            '*' => base * rhs,
            '/' if rhs == 0.0 => return None,
            '/' => base / rhs,
            _ => return None,
        };
        return value.is_finite().then_some(value);
    }

    let mut parser = Parser::new(trimmed);
    let value = parser.expression()?;
    parser.skip_whitespace();
    if !parser.at_end() {
        return None;
    }
    value.is_finite().then_some(value)
}

fn split_relative(input: &str) -> Option<(char, &str)> {
    let mut chars = input.chars();
    let op = chars.next().filter(|c| OPERATORS.contains(c))?;
    let rest = chars.as_str();
    let starts_with_digit = rest
        .trim_start()
        .chars()
        .next()
        .map(|c| c.is_ascii_digit())
        .unwrap_or(false);
    starts_with_digit.then(|| (op, rest.trim()))
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

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        while self
            .chars
            .get(self.pos)
            .map(|c| c.is_whitespace())
            .unwrap_or(false)
        {
            self.pos += 1;
        }
    }

    fn expression(&mut self) -> Option<f64> {
        let mut value = self.term()?;
        while let Some(op) = self.peek().filter(|c| matches!(c, '+' | '-')) {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Some(value)
    }

    fn term(&mut self) -> Option<f64> {
        let mut value = self.factor()?;
        while let Some(op) = self.peek().filter(|c| matches!(c, '*' | '/')) {
            self.pos += 1;
            let rhs = self.factor()?;
            value = if op == '*' { value * rhs } else { value / rhs };
        }
        Some(value)
    }

    fn factor(&mut self) -> Option<f64> {
        match self.peek()? {
            '+' => {
                self.pos += 1;
                self.factor()
            }
            '-' => {
                self.pos += 1;
                self.factor().map(|v| -v)
            }
            '(' => {
                self.pos += 1;
                let value = self.expression()?;
                if self.peek()? != ')' {
                    return None;
                }
                self.pos += 1;
                Some(value)
            }
            c if c.is_ascii_digit() || c == '.' => self.number(),
            _ => None,
        }
    }

    fn number(&mut self) -> Option<f64> {
        let start = self.pos;
        let mut seen_dot = false;
        while let Some(&c) = self.chars.get(self.pos) {
            if c.is_ascii_digit() {
                self.pos += 1;
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.pos += 1;
            } else {
                break;
            }
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        if literal == "." {
            return None;
        }
        literal.parse().ok()
    }
}
