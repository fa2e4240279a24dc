//! Lex a gene reaction rule string into a series of tokens for later parsing

use std::collections::VecDeque;

use thiserror::Error;

use crate::io::gpr_parse::token::Token;

pub struct Lexer {
    source: Vec<char>,
    tokens: VecDeque<Token>,
    start: usize,
    current: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            tokens: VecDeque::new(),
            start: 0,
            current: 0,
        }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, LexerError> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token()?;
        }

        self.tokens.push_back(Token::Eof);
        Ok(self.tokens.into_iter().collect())
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let c: char = self.advance();
        match c {
            // Single Character Tokens
            '(' => self.add_token(Token::LeftParen),
            ')' => self.add_token(Token::RightParen),
            // Identifiers and Operators
            'a'..='z' | 'A'..='Z' | '_' => self.read_identifier()?,
            // Whitespace
            ' ' | '\r' | '\n' | '\t' => {}
            other => return Err(LexerError::InvalidCharacter(other)),
        };
        Ok(())
    }

    fn advance(&mut self) -> char {
        let char_at_current = self.source[self.current];
        self.current += 1;
        char_at_current
    }

    fn read_identifier(&mut self) -> Result<(), LexerError> {
        while Lexer::is_identifier_char(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        match text.as_str() {
            "and" | "And" | "AND" => self.add_token(Token::And),
            "or" | "Or" | "OR" => self.add_token(Token::Or),
            // Negation has no meaning in gene reaction rules here
            "not" | "Not" | "NOT" => return Err(LexerError::UnsupportedOperator(text)),
            gene => self.add_token(Token::Identifier(gene.to_string())),
        }
        Ok(())
    }

    fn is_identifier_char(c: char) -> bool {
        matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_')
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            return '\0';
        }
        self.source[self.current]
    }

    fn add_token(&mut self, token: Token) {
        self.tokens.push_back(token);
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum LexerError {
    /// A character that cannot appear in a gene reaction rule
    #[error("invalid character {0:?} in gene reaction rule")]
    InvalidCharacter(char),
    /// An operator the rule grammar does not support
    #[error("unsupported operator {0:?} in gene reaction rule")]
    UnsupportedOperator(String),
}
