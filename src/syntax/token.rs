use std::fmt::Display;

/// A single lexeme of the language.
///
/// Valued variants carry their payload, everything else is a marker. Equality
/// is derived, so two tokens compare equal when the variant and payload agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Number(i64),
    Id(String),
    String(String),
    Char(char),

    Class,
    Return,
    If,
    Else,
    Def,
    Print,
    And,
    Or,
    Not,
    None,
    True,
    False,

    Eq,
    NotEq,
    LessOrEq,
    GreaterOrEq,

    Newline,
    Indent,
    Dedent,
    Eof,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(value) => write!(f, "Number{{{value}}}"),
            Token::Id(value) => write!(f, "Id{{{value}}}"),
            Token::String(value) => write!(f, "String{{{value}}}"),
            Token::Char(value) => write!(f, "Char{{{value}}}"),
            marker => write!(f, "{marker:?}"),
        }
    }
}
