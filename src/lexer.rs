use std::io::BufRead;

use crate::{error::LexerError, syntax::token::Token};

type Result<T> = std::result::Result<T, LexerError>;

/// Spaces per indentation level.
const INDENT_WIDTH: usize = 2;

/// Converts source text into the token sequence the parser consumes.
///
/// The whole input is tokenized up front; `current_token`/`next_token`
/// expose a cursor that sticks at `Eof` once it gets there.
pub struct Lexer {
    tokens: Vec<Token>,
    current: usize,
}

impl Lexer {
    pub fn new(input: impl BufRead) -> Result<Self> {
        let tokens = Tokenizer::new().run(input)?;
        Ok(Self { tokens, current: 0 })
    }

    pub fn current_token(&self) -> &Token {
        &self.tokens[self.current]
    }

    /// Advances and returns the new current token. Past the end, every call
    /// keeps returning `Eof`.
    pub fn next_token(&mut self) -> &Token {
        if self.current + 1 < self.tokens.len() {
            self.current += 1;
        }
        self.current_token()
    }

    /// Fails unless the current token equals `expected`, payload included.
    pub fn expect(&self, expected: &Token) -> Result<()> {
        if self.current_token() == expected {
            Ok(())
        } else {
            Err(self.expectation(expected.to_string()))
        }
    }

    pub fn expect_next(&mut self, expected: &Token) -> Result<()> {
        self.next_token();
        self.expect(expected)
    }

    /// Fails unless the current token is an identifier; returns its name.
    pub fn expect_id(&self) -> Result<&str> {
        match self.current_token() {
            Token::Id(name) => Ok(name),
            _ => Err(self.expectation("Id".to_string())),
        }
    }

    pub fn expect_next_id(&mut self) -> Result<&str> {
        self.next_token();
        self.expect_id()
    }

    fn expectation(&self, expected: String) -> LexerError {
        LexerError::Expectation {
            expected,
            found: self.current_token().to_string(),
        }
    }
}

struct Tokenizer {
    tokens: Vec<Token>,
    previous_indent: usize,
}

impl Tokenizer {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            previous_indent: 0,
        }
    }

    fn run(mut self, input: impl BufRead) -> Result<Vec<Token>> {
        for line in input.lines() {
            self.scan_line(&line?)?;
        }
        for _ in 0..self.previous_indent {
            self.tokens.push(Token::Dedent);
        }
        self.tokens.push(Token::Eof);
        Ok(self.tokens)
    }

    fn scan_line(&mut self, line: &str) -> Result<()> {
        let line = strip_comment(line);
        if line.chars().all(|c| c == ' ') {
            return Ok(());
        }

        let chars: Vec<char> = line.chars().collect();
        let spaces = chars.iter().take_while(|&&c| c == ' ').count();
        self.emit_indentation(spaces / INDENT_WIDTH);
        self.scan_tokens(&chars, spaces)?;
        self.tokens.push(Token::Newline);
        Ok(())
    }

    fn emit_indentation(&mut self, indent: usize) {
        if indent > self.previous_indent {
            for _ in 0..indent - self.previous_indent {
                self.tokens.push(Token::Indent);
            }
        } else {
            for _ in 0..self.previous_indent - indent {
                self.tokens.push(Token::Dedent);
            }
        }
        self.previous_indent = indent;
    }

    fn scan_tokens(&mut self, chars: &[char], start: usize) -> Result<()> {
        let mut i = start;
        while i < chars.len() {
            let c = chars[i];
            if c == ' ' {
                i += 1;
            } else if c == '\\' {
                i = self.scan_backslash(chars, i);
            } else if is_operation_char(c) {
                let word: String = chars[i..]
                    .iter()
                    .take_while(|&&c| is_operation_char(c))
                    .collect();
                i += word.len();
                self.append_word(&word)?;
            } else if c == '_' || c.is_ascii_alphanumeric() {
                // Numbers and identifiers share the run; `append_word`
                // decides which one it was.
                let word: String = chars[i..]
                    .iter()
                    .take_while(|&&c| c == '_' || c.is_ascii_alphanumeric())
                    .collect();
                i += word.len();
                self.append_word(&word)?;
            } else if c == '\'' || c == '"' {
                i = self.scan_string(chars, i)?;
            } else {
                // not part of any token class
                i += 1;
            }
        }
        Ok(())
    }

    // Outside string literals a backslash and a follower from the escape set
    // come through as raw `Char` tokens; any other follower is rescanned on
    // its own.
    fn scan_backslash(&mut self, chars: &[char], start: usize) -> usize {
        self.tokens.push(Token::Char('\\'));
        let mut i = start;
        if i + 1 < chars.len() {
            let follower = chars[i + 1];
            i += 1;
            match follower {
                'n' | 't' | 'r' | '"' | '\\' => self.tokens.push(Token::Char(follower)),
                _ => i -= 1,
            }
        }
        i + 1
    }

    // A quote counts as closing only when the character before it is not a
    // backslash.
    fn scan_string(&mut self, chars: &[char], start: usize) -> Result<usize> {
        let quote = chars[start];
        let mut begin = start + 1;
        let close = loop {
            match chars[begin..].iter().position(|&c| c == quote) {
                None => return Err(LexerError::UnterminatedString),
                Some(offset) => {
                    let pos = begin + offset;
                    if chars[pos - 1] != '\\' {
                        break pos;
                    }
                    begin = pos + 1;
                }
            }
        };

        let inner: String = chars[start + 1..close].iter().collect();
        self.tokens.push(Token::String(unescape(&inner)?));
        Ok(close + 1)
    }

    // Classifies an accumulated word: keyword, multi-char operator, run of
    // single-char operators, number, identifier, in that order.
    fn append_word(&mut self, word: &str) -> Result<()> {
        if let Some(token) = keyword_token(word) {
            self.tokens.push(token);
            return Ok(());
        }
        if let Some(token) = operator_token(word) {
            self.tokens.push(token);
            return Ok(());
        }
        if word.chars().all(is_operation_char) {
            for c in word.chars() {
                self.tokens.push(Token::Char(c));
            }
            return Ok(());
        }
        if word.chars().all(|c| c.is_ascii_digit()) {
            let value = word
                .parse()
                .map_err(|_| LexerError::NumberOutOfRange(word.to_string()))?;
            self.tokens.push(Token::Number(value));
            return Ok(());
        }
        if is_identifier(word) {
            self.tokens.push(Token::Id(word.to_string()));
            return Ok(());
        }
        Err(LexerError::InvalidToken(word.to_string()))
    }
}

/// Truncates the line at the first `#` outside both quote kinds. The two
/// kinds toggle independently: a `'` inside `"…"` does not open a region.
fn strip_comment(line: &str) -> &str {
    let mut single_quote = false;
    let mut double_quote = false;
    for (index, c) in line.char_indices() {
        match c {
            '\'' if !double_quote => single_quote = !single_quote,
            '"' if !single_quote => double_quote = !double_quote,
            '#' if !single_quote && !double_quote => return &line[..index],
            _ => {}
        }
    }
    line
}

/// Collapses escape sequences inside a string literal's payload.
fn unescape(text: &str) -> Result<String> {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some('\\') => result.push('\\'),
                Some(other) => return Err(LexerError::UnrecognizedEscape(other)),
                None => return Err(LexerError::UnterminatedEscape),
            },
            '\n' | '\r' => return Err(LexerError::UnexpectedEndOfLine),
            _ => result.push(c),
        }
    }
    Ok(result)
}

fn keyword_token(word: &str) -> Option<Token> {
    match word {
        "class" => Some(Token::Class),
        "return" => Some(Token::Return),
        "if" => Some(Token::If),
        "else" => Some(Token::Else),
        "def" => Some(Token::Def),
        "print" => Some(Token::Print),
        "and" => Some(Token::And),
        "or" => Some(Token::Or),
        "not" => Some(Token::Not),
        "None" => Some(Token::None),
        "True" => Some(Token::True),
        "False" => Some(Token::False),
        _ => None,
    }
}

fn operator_token(word: &str) -> Option<Token> {
    match word {
        "==" => Some(Token::Eq),
        "!=" => Some(Token::NotEq),
        "<=" => Some(Token::LessOrEq),
        ">=" => Some(Token::GreaterOrEq),
        _ => None,
    }
}

fn is_operation_char(c: char) -> bool {
    matches!(
        c,
        '.' | ',' | '(' | ')' | '>' | '<' | ':' | '=' | '+' | '-' | '*' | '/' | '!' | '?'
    )
}

fn is_identifier(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}
