use crate::RewriteError;

/// A permissive SPARQL tokenizer.
///
/// It only distinguishes what is needed to locate comments, prefix declarations and triple
/// patterns. Every token keeps its byte range so that the query can be edited in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Comment,
    Iri,
    PrefixedName,
    Var,
    BlankNode,
    String,
    Number,
    Word,
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Semicolon,
    Comma,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn text<'a>(&self, query: &'a str) -> &'a str {
        &query[self.start..self.end]
    }
}

pub(crate) fn tokenize(query: &str) -> Result<Vec<Token>, RewriteError> {
    let mut lexer = Lexer {
        input: query,
        position: 0,
    };
    let mut tokens = Vec::new();
    let mut depth: Vec<(TokenKind, usize)> = Vec::new();
    while let Some(token) = lexer.next_token()? {
        match token.kind {
            TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => {
                depth.push((token.kind, token.start));
            }
            TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                let expected = match token.kind {
                    TokenKind::RBrace => TokenKind::LBrace,
                    TokenKind::RParen => TokenKind::LParen,
                    _ => TokenKind::LBracket,
                };
                match depth.pop() {
                    Some((open, _)) if open == expected => {}
                    _ => {
                        return Err(RewriteError::syntax(
                            token.start,
                            format!("unbalanced '{}'", token.text(query)),
                        ))
                    }
                }
            }
            _ => {}
        }
        tokens.push(token);
    }
    if let Some((_, start)) = depth.pop() {
        return Err(RewriteError::syntax(
            start,
            format!("'{}' is never closed", &query[start..=start]),
        ));
    }
    Ok(tokens)
}

struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl Lexer<'_> {
    fn rest(&self) -> &str {
        &self.input[self.position..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn bump_while(&mut self, predicate: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&predicate) {
            self.bump();
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>, RewriteError> {
        self.bump_while(char::is_whitespace);
        let start = self.position;
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let kind = match c {
            '#' => {
                self.bump_while(|c| c != '\n' && c != '\r');
                TokenKind::Comment
            }
            '<' => {
                if self.try_iri() {
                    TokenKind::Iri
                } else {
                    self.bump();
                    TokenKind::Other
                }
            }
            '"' | '\'' => {
                self.string(c)?;
                self.literal_suffix();
                TokenKind::String
            }
            '?' | '$' if self.peek_second().is_some_and(is_name_char) => {
                self.bump();
                self.bump_while(is_name_char);
                TokenKind::Var
            }
            '_' if self.peek_second() == Some(':') => {
                self.bump();
                self.bump();
                self.bump_while(is_name_char);
                TokenKind::BlankNode
            }
            c if c.is_ascii_digit()
                || (matches!(c, '+' | '-' | '.')
                    && self.peek_second().is_some_and(|c| c.is_ascii_digit())) =>
            {
                self.number();
                TokenKind::Number
            }
            c if c.is_alphabetic() || c == '_' || c == ':' => self.name(),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '.' => self.single(TokenKind::Dot),
            ';' => self.single(TokenKind::Semicolon),
            ',' => self.single(TokenKind::Comma),
            _ => self.single(TokenKind::Other),
        };
        Ok(Some(Token {
            kind,
            start,
            end: self.position,
        }))
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    /// Consumes an IRI reference if the input at the current position is one.
    fn try_iri(&mut self) -> bool {
        for (offset, c) in self.rest().char_indices().skip(1) {
            match c {
                '>' => {
                    self.position += offset + 1;
                    return true;
                }
                '<' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => return false,
                c if c.is_whitespace() => return false,
                _ => {}
            }
        }
        false
    }

    fn string(&mut self, quote: char) -> Result<(), RewriteError> {
        let start = self.position;
        let long: String = [quote; 3].iter().collect();
        if self.rest().starts_with(&long) {
            self.position += 3;
            loop {
                if self.rest().starts_with(&long) {
                    self.position += 3;
                    // A long string may end with up to two extra quote characters.
                    self.bump_while(|c| c == quote);
                    return Ok(());
                }
                match self.bump() {
                    Some('\\') => {
                        self.bump();
                    }
                    Some(_) => {}
                    None => return Err(RewriteError::syntax(start, "unterminated string")),
                }
            }
        }
        self.bump();
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => return Ok(()),
                Some('\n' | '\r') | None => {
                    return Err(RewriteError::syntax(start, "unterminated string"))
                }
                Some(_) => {}
            }
        }
    }

    /// Consumes a language tag or a datatype directly following a string.
    fn literal_suffix(&mut self) {
        if self.peek() == Some('@') && self.peek_second().is_some_and(|c| c.is_ascii_alphabetic())
        {
            self.bump();
            self.bump_while(|c| c.is_ascii_alphanumeric() || c == '-');
        } else if self.rest().starts_with("^^") {
            self.position += 2;
            if self.peek() == Some('<') {
                self.try_iri();
            } else {
                self.name();
            }
        }
    }

    fn number(&mut self) {
        if matches!(self.peek(), Some('+' | '-')) {
            self.bump();
        }
        self.bump_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            self.bump_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            self.bump_while(|c| c.is_ascii_digit());
        }
    }

    /// Consumes a keyword or a prefixed name. A trailing dot belongs to the enclosing pattern.
    fn name(&mut self) -> TokenKind {
        let start = self.position;
        self.bump_while(|c| is_name_char(c) || matches!(c, '.' | ':' | '%'));
        while self.position > start && self.input[..self.position].ends_with('.') {
            self.position -= 1;
        }
        if self.input[start..self.position].contains(':') {
            TokenKind::PrefixedName
        } else {
            TokenKind::Word
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '\u{00B7}'
}
