//! Turns source text into a flat token stream.

use crate::diagnostics::DiagnosticSink;
use crate::token::{keyword, Literal, Token, TokenKind};

/// Scans `source` into a token stream, reporting any lexical errors to
/// `sink` and continuing past them so a single bad character doesn't hide
/// every other error in the file.
pub fn scan_tokens(source: &str, sink: &dyn DiagnosticSink) -> Vec<Token> {
    Scanner::new(source).scan(sink)
}

struct Scanner {
    chars: Vec<char>,
    start: usize,
    current: usize,
    line: usize,
    tokens: Vec<Token>,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            start: 0,
            current: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    fn scan(mut self, sink: &dyn DiagnosticSink) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(sink);
        }
        self.tokens
            .push(Token::new(TokenKind::Endof, "", Literal::None, self.line));
        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        c
    }

    fn peek(&self) -> char {
        self.chars.get(self.current).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.chars.get(self.current + 1).copied().unwrap_or('\0')
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.chars[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn lexeme(&self) -> String {
        self.chars[self.start..self.current].iter().collect()
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_token_literal(kind, Literal::None);
    }

    fn add_token_literal(&mut self, kind: TokenKind, literal: Literal) {
        let lexeme = self.lexeme();
        self.tokens.push(Token::new(kind, lexeme, literal, self.line));
    }

    fn scan_token(&mut self, sink: &dyn DiagnosticSink) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            ';' => self.add_token(TokenKind::Semicolon),
            '*' => self.add_token(TokenKind::Star),
            '!' => {
                let kind = if self.matches('=') { TokenKind::BangEqual } else { TokenKind::Bang };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.matches('=') { TokenKind::EqualEqual } else { TokenKind::Equal };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.matches('=') { TokenKind::LessEqual } else { TokenKind::Less };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.matches('=') { TokenKind::GreaterEqual } else { TokenKind::Greater };
                self.add_token(kind);
            }
            '/' => {
                if self.matches('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,
            '"' => self.string(sink),
            _ if c.is_ascii_digit() => self.number(),
            _ if c == '_' || c.is_ascii_alphabetic() => self.identifier(),
            _ => sink.error(self.line, &format!("Unexpected character: {c}")),
        }
    }

    fn string(&mut self, sink: &dyn DiagnosticSink) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            sink.error(self.line, "Unterminated string.");
            return;
        }

        self.advance(); // closing quote
        let value: String = self.chars[self.start + 1..self.current - 1].iter().collect();
        self.add_token_literal(TokenKind::String, Literal::String(value));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let text = self.lexeme();
        let value: f64 = text.parse().expect("scanned digits always form a valid f64");
        self.add_token_literal(TokenKind::Number, Literal::Number(value));
    }

    fn identifier(&mut self) {
        while self.peek() == '_' || self.peek().is_ascii_alphanumeric() {
            self.advance();
        }
        let text = self.lexeme();
        match keyword(&text) {
            Some(TokenKind::Boolean) => {
                let value = text == "true";
                self.add_token_literal(TokenKind::Boolean, Literal::Boolean(value));
            }
            Some(kind) => self.add_token(kind),
            None => self.add_token(TokenKind::Identifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingSink;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let sink = CollectingSink::new();
        scan_tokens(source, &sink).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_punctuation() {
        assert_eq!(
            kinds("(){},.-+;*"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Semicolon,
                TokenKind::Star,
                TokenKind::Endof,
            ]
        );
    }

    #[test]
    fn scans_two_char_operators() {
        assert_eq!(
            kinds("!= == <= >= < > ! ="),
            vec![
                TokenKind::BangEqual,
                TokenKind::EqualEqual,
                TokenKind::LessEqual,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Bang,
                TokenKind::Equal,
                TokenKind::Endof,
            ]
        );
    }

    #[test]
    fn skips_line_comments() {
        assert_eq!(kinds("// a comment\n1"), vec![TokenKind::Number, TokenKind::Endof]);
    }

    #[test]
    fn scans_string_literal() {
        let sink = CollectingSink::new();
        let tokens = scan_tokens("\"hi there\"", &sink);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].literal, Literal::String("hi there".to_owned()));
    }

    #[test]
    fn reports_unterminated_string() {
        let sink = CollectingSink::new();
        scan_tokens("\"unterminated", &sink);
        assert!(sink.had_error());
    }

    #[test]
    fn scans_number_literal() {
        let sink = CollectingSink::new();
        let tokens = scan_tokens("3.14", &sink);
        assert_eq!(tokens[0].literal, Literal::Number(3.14));
    }

    #[test]
    fn scans_keywords_and_identifiers() {
        assert_eq!(
            kinds("var x and false"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::And,
                TokenKind::Boolean,
                TokenKind::Endof,
            ]
        );
    }

    #[test]
    fn tracks_line_numbers_across_newlines() {
        let sink = CollectingSink::new();
        let tokens = scan_tokens("1\n2\n3", &sink);
        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 3]);
    }
}
