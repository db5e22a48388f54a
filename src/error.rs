use std::io;

use thiserror::Error;

/// Errors raised while turning source text into tokens, including failed
/// `expect` calls issued by the parser against the token cursor.
#[derive(Debug, Error)]
pub enum LexerError {
    #[error("Unrecognized escape sequence \\{0}")]
    UnrecognizedEscape(char),
    #[error("Unrecognized escape sequence at end of string")]
    UnterminatedEscape,
    #[error("Unexpected end of line")]
    UnexpectedEndOfLine,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("number literal out of range: {0}")]
    NumberOutOfRange(String),
    #[error("invalid input: {0}")]
    InvalidToken(String),
    #[error("expected {expected}, found {found}")]
    Expectation { expected: String, found: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors raised while recognizing the grammar.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found}")]
    UnexpectedToken { expected: String, found: String },
    #[error("undefined class '{0}'")]
    UndefinedClass(String),
    #[error("invalid assignment target")]
    InvalidAssignmentTarget,
    #[error(transparent)]
    Lexer(#[from] LexerError),
}

/// Errors raised during evaluation. All of them abort the run.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("'{0}' does not name a class instance")]
    NotAnInstance(String),
    #[error("only class instances have fields")]
    FieldsOnNonInstance,
    #[error("method '{name}' taking {args} argument(s) does not exist")]
    MethodNotFound { name: String, args: usize },
    #[error("unknown class '{0}'")]
    UnknownClass(String),
    #[error("cannot compare objects for equality")]
    IncomparableEquality,
    #[error("cannot compare objects for ordering")]
    IncomparableOrdering,
    #[error("unsupported operand types for '{0}'")]
    UnsupportedOperands(char),
    #[error("division by zero")]
    DivisionByZero,
    #[error("operand of 'not' must be a Bool")]
    NotExpectsBool,
    #[error("'{0}' must return a Bool")]
    DunderMustReturnBool(&'static str),
    #[error("'return' outside of a method")]
    ReturnOutsideMethod,
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Any failure the interpreter pipeline can surface to a caller.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
