/// Tokens produced by lexing a gene reaction rule string
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    LeftParen,
    RightParen,
    And,
    Or,
    Identifier(String),
    Eof,
}
