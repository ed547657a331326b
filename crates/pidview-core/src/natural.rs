//! Numeric-aware, case-insensitive string ordering.
//!
//! Runs of ASCII digits compare by numeric value, so `Rev 9` sorts before
//! `Rev 10`. Everything else compares by lowercased character. Strings that
//! are equal under those rules fall back to a plain byte comparison, which
//! keeps the ordering total.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Num(String),
    Text(char),
}

struct Tokens<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Tokens<'a> {
    fn new(s: &'a str) -> Self {
        Self {
            chars: s.chars().peekable(),
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let c = self.chars.next()?;
        if !c.is_ascii_digit() {
            return Some(Token::Text(c.to_lowercase().next().unwrap_or(c)));
        }
        let mut digits = String::from(c);
        while let Some(&d) = self.chars.peek() {
            if !d.is_ascii_digit() {
                break;
            }
            digits.push(d);
            self.chars.next();
        }
        Some(Token::Num(digits))
    }
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn cmp_token(a: &Token, b: &Token) -> Ordering {
    match (a, b) {
        (Token::Num(x), Token::Num(y)) => cmp_digits(x, y),
        (Token::Num(_), Token::Text(_)) => Ordering::Less,
        (Token::Text(_), Token::Num(_)) => Ordering::Greater,
        (Token::Text(x), Token::Text(y)) => x.cmp(y),
    }
}

/// Compare two strings the way a person reads file and folder names.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = Tokens::new(a);
    let mut right = Tokens::new(b);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => match cmp_token(&x, &y) {
                Ordering::Equal => continue,
                other => return other,
            },
        }
    }
}
