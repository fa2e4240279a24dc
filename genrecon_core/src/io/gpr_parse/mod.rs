//! Module for parsing gene reaction rule strings into AST values

use indexmap::IndexMap;
use thiserror::Error;

use crate::io::gpr_parse::lexer::LexerError;
use crate::io::gpr_parse::parser::ParseError;
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::model::Gpr;

mod lexer;
pub mod parser;
mod token;

/// Parse a gene reaction rule string into a GPR Tree
///
/// # Parameters
/// - `input`: &str representing the gene reaction rule
/// - `gene_map`: map of gene id strings to genes; genes named by the rule
///   but absent from the map are inserted
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use genrecon_core::io::gpr_parse::parse_gpr;
/// let gpr: &str = "Rv0001 and Rv0002";
/// let mut gene_map = IndexMap::new();
/// let gpr_tree = parse_gpr(gpr, &mut gene_map).unwrap();
/// assert!(gene_map.contains_key("Rv0001"));
/// ```
pub fn parse_gpr(
    input: &str,
    gene_map: &mut IndexMap<String, Gene>,
) -> Result<Gpr, GprParseError> {
    // Convert the rule string into tokens
    let tokens = lexer::Lexer::new(input).scan_tokens()?;

    // Now parse those tokens into a GPR tree
    let mut parser = parser::GprParser::new(tokens, gene_map);
    let gpr = parser.parse()?;
    Ok(gpr)
}

/// Enum representing possible lex and parse errors
#[derive(Debug, Error)]
pub enum GprParseError {
    /// Lexing Error
    #[error("error occurred during lexing (conversion of rule string to tokens): {0}")]
    LexingError(#[from] LexerError),
    /// Parsing Error
    #[error("error occurred during parsing (conversion of tokens to GPR tree): {0}")]
    ParsingError(#[from] ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::model::GprOperation;

    #[test]
    fn parse_nested_rule() {
        let mut gene_map: IndexMap<String, Gene> = IndexMap::new();
        let gpr = parse_gpr("Rv0001 and (Rv0002 or Rv0003)", &mut gene_map).unwrap();

        // All three genes were registered in discovery order
        assert_eq!(
            gene_map.keys().collect::<Vec<_>>(),
            vec!["Rv0001", "Rv0002", "Rv0003"]
        );

        match gpr {
            Gpr::Operation(GprOperation::And { left, right }) => {
                assert_eq!(*left, Gpr::GeneNode("Rv0001".to_string()));
                match *right {
                    Gpr::Operation(GprOperation::Or { left, right }) => {
                        assert_eq!(*left, Gpr::GeneNode("Rv0002".to_string()));
                        assert_eq!(*right, Gpr::GeneNode("Rv0003".to_string()));
                    }
                    other => panic!("incorrect parse: {:?}", other),
                }
            }
            other => panic!("incorrect parse: {:?}", other),
        }
    }

    #[test]
    fn and_binds_tighter_than_or() {
        let mut gene_map: IndexMap<String, Gene> = IndexMap::new();
        let gpr = parse_gpr("Rv0001 and Rv0002 or Rv0003", &mut gene_map).unwrap();
        assert_eq!(format!("{}", gpr), "((Rv0001 and Rv0002) or Rv0003)");

        let mut gene_map: IndexMap<String, Gene> = IndexMap::new();
        let gpr = parse_gpr("Rv0001 or Rv0002 and Rv0003", &mut gene_map).unwrap();
        assert_eq!(format!("{}", gpr), "(Rv0001 or (Rv0002 and Rv0003))");
    }

    #[test]
    fn round_trip_through_rendering() {
        let mut gene_map: IndexMap<String, Gene> = IndexMap::new();
        let gpr = parse_gpr("(b3916 or b1723)", &mut gene_map).unwrap();
        let rendered = gpr.to_string_id();

        let mut second_map: IndexMap<String, Gene> = IndexMap::new();
        let reparsed = parse_gpr(&rendered, &mut second_map).unwrap();
        assert_eq!(gpr, reparsed);
    }

    #[test]
    fn malformed_rules_error() {
        let mut gene_map: IndexMap<String, Gene> = IndexMap::new();
        assert!(parse_gpr("(Rv0001 or", &mut gene_map).is_err());
        assert!(parse_gpr("Rv0001 Rv0002", &mut gene_map).is_err());
        assert!(parse_gpr("or Rv0001", &mut gene_map).is_err());
    }
}
