//! # Script Lexer
//!
//! Turns script text into located tokens. Comments start with `#` and run to the end
//! of the line. A word starting with a dash and a letter is an option flag; any other
//! word is a number when it parses as one, and a name otherwise. Keywords are
//! reserved: a keyword meant as a value has to be quoted.
//!
//! Every token is traced under this module's log target.

use crate::core::diagnostics::{ScriptError, SourceLocation};
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Tool,
    Input,
    Choice,
    Default,
    Case,
    Select,
    Every,
}

impl Keyword {
    fn from_word(word: &str) -> Option<Self> {
        match word {
            "tool" | "service" => Some(Self::Tool),
            "input" => Some(Self::Input),
            "choice" => Some(Self::Choice),
            "default" => Some(Self::Default),
            "case" => Some(Self::Case),
            "select" => Some(Self::Select),
            "every" => Some(Self::Every),
            _ => None,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Tool => "tool",
            Self::Input => "input",
            Self::Choice => "choice",
            Self::Default => "default",
            Self::Case => "case",
            Self::Select => "select",
            Self::Every => "every",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Keyword(Keyword),
    Name(String),
    Number(String),
    Str(String),
    Flag(String),
    LeftBrace,
    RightBrace,
    Colon,
    Semicolon,
    Comma,
    Bar,
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => write!(f, "'{}'", keyword),
            Self::Name(name) => write!(f, "name \"{}\"", name),
            Self::Number(number) => write!(f, "number {}", number),
            Self::Str(s) => write!(f, "string \"{}\"", s),
            Self::Flag(flag) => write!(f, "option \"{}\"", flag),
            Self::LeftBrace => f.write_str("'{'"),
            Self::RightBrace => f.write_str("'}'"),
            Self::Colon => f.write_str("':'"),
            Self::Semicolon => f.write_str("';'"),
            Self::Comma => f.write_str("','"),
            Self::Bar => f.write_str("'|'"),
            Self::Eof => f.write_str("end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_blanks_and_comments(&mut self) {
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while self.chars.peek().is_some_and(|&c| c != '\n') {
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ScriptError> {
        self.skip_blanks_and_comments();
        let location = self.location();

        let Some(&c) = self.chars.peek() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                location,
            });
        };

        let kind = match c {
            '{' | '}' | ':' | ';' | ',' | '|' => {
                self.bump();
                match c {
                    '{' => TokenKind::LeftBrace,
                    '}' => TokenKind::RightBrace,
                    ':' => TokenKind::Colon,
                    ';' => TokenKind::Semicolon,
                    ',' => TokenKind::Comma,
                    _ => TokenKind::Bar,
                }
            }
            '"' | '\'' => TokenKind::Str(self.quoted_string(c, location)?),
            c if is_word_char(c) => self.word(),
            other => {
                return Err(ScriptError::Syntax {
                    message: format!("unexpected character '{}'", other),
                    location,
                });
            }
        };

        Ok(Token { kind, location })
    }

    fn quoted_string(&mut self, quote: char, start: SourceLocation) -> Result<String, ScriptError> {
        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(ScriptError::Syntax {
                        message: "unterminated string".to_string(),
                        location: start,
                    });
                }
                Some(c) if c == quote => return Ok(value),
                Some('\\') => {
                    let escaped = self.bump().ok_or_else(|| ScriptError::Syntax {
                        message: "unterminated string".to_string(),
                        location: start,
                    })?;
                    value.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        other => other,
                    });
                }
                Some(c) => value.push(c),
            }
        }
    }

    fn word(&mut self) -> TokenKind {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if !is_word_char(c) {
                break;
            }
            word.push(c);
            self.bump();
        }

        if is_flag_word(&word) {
            TokenKind::Flag(word)
        } else if let Some(keyword) = Keyword::from_word(&word) {
            TokenKind::Keyword(keyword)
        } else if word.parse::<f64>().is_ok() {
            TokenKind::Number(word)
        } else {
            TokenKind::Name(word)
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | '=' | '+' | '~' | '$' | '@' | '%' | '*' | '?' | '!' | '\\')
}

fn is_flag_word(word: &str) -> bool {
    let rest = word.trim_start_matches('-');
    let dashes = word.len() - rest.len();
    (1..=2).contains(&dashes) && rest.chars().next().is_some_and(char::is_alphabetic)
}

/// Splits a whole script into tokens, ending with [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, ScriptError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        log::trace!("{}: {}", token.location, token.kind);
        let at_end = token.kind == TokenKind::Eof;
        tokens.push(token);
        if at_end {
            return Ok(tokens);
        }
    }
}
