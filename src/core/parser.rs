// src/core/parser.rs

use crate::{
    constants::ALL_PSEUDO_LABEL,
    core::{
        diagnostics::{ScriptError, SourceLocation},
        lexer::{Keyword, Token, TokenKind, tokenize},
    },
    models::{OptionEntry, VariantKind},
};

/// The calls a script reader makes while it walks a script.
///
/// The reader only checks the grammar; every semantic decision is left to the driver.
pub trait ScriptDriver {
    /// Called once before the first element, to set up the main options block.
    fn begin_script(&mut self, location: SourceLocation) -> Result<(), ScriptError>;
    fn set_service(&mut self, name: &str, location: SourceLocation) -> Result<(), ScriptError>;
    fn append_input_source(&mut self, source: &str, location: SourceLocation) -> Result<(), ScriptError>;
    fn declare_choice(&mut self, name: &str, location: SourceLocation) -> Result<(), ScriptError>;
    fn declare_input(&mut self, name: &str, location: SourceLocation) -> Result<(), ScriptError>;
    fn add_label(
        &mut self,
        kind: VariantKind,
        variant: &str,
        label: &str,
        location: SourceLocation,
    ) -> Result<(), ScriptError>;
    fn register_default_label(&mut self, choice: &str, label: &str, location: SourceLocation) -> Result<(), ScriptError>;
    fn register_option(&mut self, option: OptionEntry, location: SourceLocation) -> Result<(), ScriptError>;
    fn open_case(&mut self, subject: &str, location: SourceLocation) -> Result<(), ScriptError>;
    fn begin_case_alternative(&mut self, location: SourceLocation) -> Result<(), ScriptError>;
    fn register_case_label(&mut self, label: &str, location: SourceLocation) -> Result<(), ScriptError>;
    /// Called after an alternative's labels, before its elements.
    fn open_case_alternative_body(&mut self, location: SourceLocation) -> Result<(), ScriptError>;
    fn end_case_alternative(&mut self, location: SourceLocation) -> Result<(), ScriptError>;
    fn close_case(&mut self, location: SourceLocation) -> Result<(), ScriptError>;
    fn select(&mut self, name: &str, label: &str, location: SourceLocation) -> Result<(), ScriptError>;
}

/// Reads a whole script, driving `driver`. Returns the location of the end of the script.
pub fn parse_script<D: ScriptDriver>(source: &str, driver: &mut D) -> Result<SourceLocation, ScriptError> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        tokens,
        position: 0,
        driver,
    };
    parser.script()
}

struct Parser<'d, D: ScriptDriver> {
    tokens: Vec<Token>,
    position: usize,
    driver: &'d mut D,
}

impl<D: ScriptDriver> Parser<'_, D> {
    // The token list always ends with `Eof`, which is never consumed.
    fn peek_nth(&self, n: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.position + n).min(last)]
    }

    fn peek(&self) -> &Token {
        self.peek_nth(0)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expecting: &str) -> ScriptError {
        let token = self.peek();
        ScriptError::Syntax {
            message: format!("unexpected {}, expecting {}", token.kind, expecting),
            location: token.location,
        }
    }

    fn expect(&mut self, kind: &TokenKind, expecting: &str) -> Result<Token, ScriptError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expecting))
        }
    }

    /// A name, as used for services, choices, inputs and labels.
    fn expect_name(&mut self, expecting: &str) -> Result<(String, SourceLocation), ScriptError> {
        match &self.peek().kind {
            TokenKind::Name(name) | TokenKind::Number(name) => {
                let name = name.clone();
                let location = self.advance().location;
                Ok((name, location))
            }
            _ => Err(self.unexpected(expecting)),
        }
    }

    fn at_value(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Name(_) | TokenKind::Number(_) | TokenKind::Str(_)
        )
    }

    /// A name, a number, or adjacent strings concatenated. The flag tells whether
    /// the value was a bare name.
    fn value(&mut self, expecting: &str) -> Result<(String, SourceLocation, bool), ScriptError> {
        let location = self.peek().location;
        match self.peek().kind.clone() {
            TokenKind::Name(name) => {
                self.advance();
                Ok((name, location, true))
            }
            TokenKind::Number(number) => {
                self.advance();
                Ok((number, location, false))
            }
            TokenKind::Str(_) => {
                let mut value = String::new();
                while let TokenKind::Str(s) = &self.peek().kind {
                    value.push_str(s);
                    self.advance();
                }
                Ok((value, location, false))
            }
            _ => Err(self.unexpected(expecting)),
        }
    }

    fn script(&mut self) -> Result<SourceLocation, ScriptError> {
        let start = self.peek().location;
        self.driver.begin_script(start)?;
        while !self.check(&TokenKind::Eof) {
            self.element()?;
        }
        Ok(self.peek().location)
    }

    fn element(&mut self) -> Result<(), ScriptError> {
        match &self.peek().kind {
            TokenKind::Keyword(Keyword::Tool) => self.tool(),
            TokenKind::Keyword(Keyword::Input) => self.input(),
            TokenKind::Keyword(Keyword::Choice) => self.choice(),
            TokenKind::Keyword(Keyword::Case) => self.case(),
            TokenKind::Keyword(Keyword::Select) => self.select(),
            TokenKind::Keyword(Keyword::Every) => self.every(),
            TokenKind::Flag(_) => self.option(),
            TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            _ => Err(self.unexpected("a statement or an option")),
        }
    }

    fn tool(&mut self) -> Result<(), ScriptError> {
        self.advance();
        self.eat(&TokenKind::Colon);
        let (name, location) = self.expect_name("a service name")?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        self.driver.set_service(&name, location)
    }

    fn input(&mut self) -> Result<(), ScriptError> {
        self.advance();
        if self.eat(&TokenKind::Colon) {
            let (source, location, _) = self.value("an input source")?;
            self.expect(&TokenKind::Semicolon, "';'")?;
            return self.driver.append_input_source(&source, location);
        }

        let (value, location, is_name) = self.value("an input source or an input name")?;
        if is_name && self.eat(&TokenKind::LeftBrace) {
            self.driver.declare_input(&value, location)?;
            self.labels(VariantKind::Input, &value)?;
            self.expect(&TokenKind::RightBrace, "'}'")?;
            self.expect(&TokenKind::Semicolon, "';'")?;
            return Ok(());
        }
        if is_name && self.eat(&TokenKind::Colon) {
            self.driver.declare_input(&value, location)?;
            self.labels(VariantKind::Input, &value)?;
            self.expect(&TokenKind::Semicolon, "';'")?;
            return Ok(());
        }
        self.expect(&TokenKind::Semicolon, "';', '{' or ':'")?;
        self.driver.append_input_source(&value, location)
    }

    fn labels(&mut self, kind: VariantKind, variant: &str) -> Result<(), ScriptError> {
        loop {
            let (label, location) = self.expect_name(&format!("a {} {}", kind, kind.member_noun()))?;
            self.driver.add_label(kind, variant, &label, location)?;
            let before_default = self.peek_nth(1).kind == TokenKind::Keyword(Keyword::Default);
            let separated = match self.peek().kind {
                TokenKind::Comma => !before_default,
                TokenKind::Bar => true,
                _ => false,
            };
            if !separated {
                return Ok(());
            }
            self.advance();
        }
    }

    fn default_label(&mut self, choice: &str) -> Result<(), ScriptError> {
        self.expect(&TokenKind::Keyword(Keyword::Default), "'default'")?;
        self.eat(&TokenKind::Colon);
        let (label, location) = self.expect_name("a default label")?;
        self.driver.register_default_label(choice, &label, location)
    }

    fn choice(&mut self) -> Result<(), ScriptError> {
        self.advance();
        let (name, location) = self.expect_name("a choice name")?;
        self.driver.declare_choice(&name, location)?;

        if self.eat(&TokenKind::LeftBrace) {
            self.labels(VariantKind::Choice, &name)?;
            self.expect(&TokenKind::RightBrace, "'}'")?;
            if self.check(&TokenKind::Keyword(Keyword::Default)) {
                self.default_label(&name)?;
            }
        } else {
            self.expect(&TokenKind::Colon, "'{' or ':'")?;
            self.labels(VariantKind::Choice, &name)?;
            if self.eat(&TokenKind::Comma) {
                self.default_label(&name)?;
            }
        }
        self.expect(&TokenKind::Semicolon, "';'")?;
        Ok(())
    }

    fn option(&mut self) -> Result<(), ScriptError> {
        let token = self.advance();
        let location = token.location;
        let TokenKind::Flag(flag) = token.kind else {
            return Err(ScriptError::Syntax {
                message: "expecting an option".to_string(),
                location,
            });
        };

        let value = if self.at_value() {
            let is_string = matches!(self.peek().kind, TokenKind::Str(_));
            let (mut value, _, _) = self.value("an option value")?;
            // `name:name` values, as in `-part-name P1:Soprano`.
            let next_is_name = matches!(
                self.peek_nth(1).kind,
                TokenKind::Name(_) | TokenKind::Number(_)
            );
            if !is_string && self.check(&TokenKind::Colon) && next_is_name {
                self.advance();
                let (rest, _) = self.expect_name("a value after ':'")?;
                value = format!("{}:{}", value, rest);
            }
            Some(value)
        } else {
            None
        };

        self.driver
            .register_option(OptionEntry::new(flag, value), location)
    }

    fn case(&mut self) -> Result<(), ScriptError> {
        self.advance();
        let (subject, location) = self.expect_name("a choice or input name")?;
        self.driver.open_case(&subject, location)?;

        let closing = if self.eat(&TokenKind::LeftBrace) {
            TokenKind::RightBrace
        } else {
            self.expect(&TokenKind::Colon, "'{' or ':'")?;
            TokenKind::Semicolon
        };

        while !self.check(&closing) {
            if self.check(&TokenKind::Eof) {
                return Err(self.unexpected(&format!("a case alternative or {}", closing)));
            }
            self.alternative()?;
        }
        let end = self.advance().location;
        self.driver.close_case(end)
    }

    fn alternative(&mut self) -> Result<(), ScriptError> {
        let start = self.peek().location;
        self.driver.begin_case_alternative(start)?;
        loop {
            let (label, location) = self.expect_name("a case label")?;
            self.driver.register_case_label(&label, location)?;
            if !(self.eat(&TokenKind::Bar) || self.eat(&TokenKind::Comma)) {
                break;
            }
        }
        let colon = self.expect(&TokenKind::Colon, "':' after the case labels")?;
        self.driver.open_case_alternative_body(colon.location)?;

        while !self.check(&TokenKind::Semicolon) {
            if self.check(&TokenKind::Eof) {
                return Err(self.unexpected("';' ending the case alternative"));
            }
            self.element()?;
        }
        let end = self.advance().location;
        self.driver.end_case_alternative(end)
    }

    fn select(&mut self) -> Result<(), ScriptError> {
        self.advance();
        let (name, location) = self.expect_name("a choice or input name")?;
        self.eat(&TokenKind::Colon);
        let (label, _) = self.expect_name("a label or 'all'")?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        self.driver.select(&name, &label, location)
    }

    fn every(&mut self) -> Result<(), ScriptError> {
        self.advance();
        let (name, location) = self.expect_name("a choice or input name")?;
        self.expect(&TokenKind::Semicolon, "';'")?;
        self.driver.select(&name, ALL_PSEUDO_LABEL, location)
    }
}
