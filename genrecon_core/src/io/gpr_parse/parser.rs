use indexmap::IndexMap;
use thiserror::Error;

use crate::io::gpr_parse::token::Token;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::model::{Gpr, GprOperation};

/*
GPR Grammar ("and" binds tighter than "or"):
expression -> disjunction ;
disjunction -> conjunction ( "or" conjunction )* ;
conjunction -> primary ( "and" primary )* ;
primary -> GENE | "(" expression ")" ;

e.g. ( Gene1 and Gene2 ) or Gene3
 */

/// Gene reaction rule parser
pub struct GprParser<'gm> {
    /// Vector of tokens from the rule string
    tokens: Vec<Token>,
    /// Current token being processed
    current: usize,
    /// Map containing the Genes referenced so far
    gene_map: &'gm mut IndexMap<String, Gene>,
}

impl<'gm> GprParser<'gm> {
    /// Create a new GprParser
    pub fn new(tokens: Vec<Token>, gene_map: &mut IndexMap<String, Gene>) -> GprParser {
        GprParser {
            tokens,
            current: 0,
            gene_map,
        }
    }

    // region Parsing Functions

    /// Parse the token vector into a GPR AST
    pub fn parse(&mut self) -> Result<Gpr, ParseError> {
        let gpr = self.disjunction()?;
        if !self.is_at_end() {
            // The entire expression must be consumed
            return Err(ParseError::EarlyTermination);
        }
        Ok(gpr)
    }

    fn disjunction(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.conjunction()?;
        while self.match_token(&[Token::Or]) {
            let right = self.conjunction()?;
            expr = Gpr::Operation(GprOperation::Or {
                left: Box::new(expr),
                right: Box::new(right),
            });
        }
        Ok(expr)
    }

    fn conjunction(&mut self) -> Result<Gpr, ParseError> {
        let mut expr = self.primary()?;
        while self.match_token(&[Token::And]) {
            let right = self.primary()?;
            expr = Gpr::Operation(GprOperation::And {
                left: Box::new(expr),
                right: Box::new(right),
            });
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Gpr, ParseError> {
        if let Some(identifier) = self.match_identifier() {
            self.insert_if_needed(&identifier);
            return Ok(Gpr::new_gene_node(&identifier));
        }

        if self.match_token(&[Token::LeftParen]) {
            let expr = self.disjunction()?;
            self.consume(Token::RightParen, "Expect ')' after expression.")?;
            return Ok(expr);
        }

        Err(ParseError::ExpectedExpression)
    }

    // endregion Parsing Functions

    // region parsing helper functions

    /// Check whether the token at the current position matches one of the
    /// provided `tokens`, if it does advance [`self.current`] and return
    /// true, otherwise return false
    fn match_token(&mut self, tokens: &[Token]) -> bool {
        for t in tokens {
            if self.check(t) {
                self.advance();
                return true;
            }
        }
        false
    }

    /// Similar to [`Self::match_token`], but for matching an identifier
    /// token. If the current token is an identifier return its gene id,
    /// otherwise return None
    fn match_identifier(&mut self) -> Option<String> {
        if let Token::Identifier(id) = self.peek() {
            let id = id.clone();
            self.advance();
            return Some(id);
        }
        None
    }

    /// Check whether the current token matches the provided `token`
    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    /// Advance `self.current` one position unless at end of the token Vec
    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    /// Check whether the parser is at the end of the token Vec
    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    /// Get a reference to the current token
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    /// Check whether the current token matches an input token, if it matches
    /// advance to the next token, and if it doesn't return an error. Used
    /// mainly for matching parenthesis.
    fn consume(&mut self, token: Token, msg: &str) -> Result<(), ParseError> {
        if self.check(&token) {
            self.advance();
            return Ok(());
        }
        Err(ParseError::MissingToken(msg.to_string()))
    }

    // endregion parsing helper functions

    /// Check if a gene id exists as a key in the gene map, and insert a new
    /// gene with that id if it doesn't
    fn insert_if_needed(&mut self, gene_id: &str) {
        if !self.gene_map.contains_key(gene_id) {
            self.gene_map
                .insert(gene_id.to_string(), Gene::new(gene_id));
        }
    }
}

/// Enum representing possible parse errors
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    /// A gene id or parenthesized group was expected but not found
    #[error("expected a gene id or parenthesized group")]
    ExpectedExpression,
    /// A required token was missing
    #[error("{0}")]
    MissingToken(String),
    /// Parsing finished before the whole rule was consumed
    #[error("trailing tokens after the end of the rule")]
    EarlyTermination,
}
