use crate::error::LexError;
use crate::token::{Span, Spanned, Token};

pub struct Lexer {
    chars: Vec<char>,
    /// Precomputed byte offset for each char index.
    /// `byte_offsets[i]` = byte offset of `chars[i]` in the original `&str`.
    /// `byte_offsets[chars.len()]` = total byte length (sentinel for EOF).
    byte_offsets: Vec<usize>,
    pos: usize,
    /// Open `(` count; newlines inside parentheses never end a statement.
    paren_depth: usize,
    prev_significant: Option<Token>,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        // Build a lookup table: char index → byte offset.
        let mut byte_offsets = Vec::with_capacity(chars.len() + 1);
        let mut offset = 0;
        for ch in &chars {
            byte_offsets.push(offset);
            offset += ch.len_utf8();
        }
        byte_offsets.push(offset); // sentinel for EOF
        Lexer {
            chars,
            byte_offsets,
            pos: 0,
            paren_depth: 0,
            prev_significant: None,
        }
    }

    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let is_eof = spanned.token == Token::EOF;
            match &spanned.token {
                Token::Newline => {
                    if self.newline_continues() {
                        continue;
                    }
                }
                Token::Comment(_) => {
                    if self.newline_continues() {
                        continue;
                    }
                }
                Token::LParen => {
                    self.paren_depth += 1;
                    self.prev_significant = Some(Token::LParen);
                }
                Token::RParen => {
                    self.paren_depth = self.paren_depth.saturating_sub(1);
                    self.prev_significant = Some(Token::RParen);
                }
                _ => {
                    self.prev_significant = Some(spanned.token.clone());
                }
            }
            tokens.push(spanned);
            if is_eof {
                break;
            }
        }
        Ok(tokens)
    }

    /// A newline is swallowed inside parentheses, and after a token that
    /// leaves the current line incomplete (`a +` ↵ `b`).
    fn newline_continues(&self) -> bool {
        self.paren_depth > 0
            || self
                .prev_significant
                .as_ref()
                .is_some_and(|t| t.continues_line())
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Convert a char index to a byte offset.
    fn byte_pos_of(&self, char_idx: usize) -> usize {
        self.byte_offsets[char_idx.min(self.chars.len())]
    }

    fn spanned(&self, token: Token, start: usize) -> Spanned {
        Spanned {
            token,
            span: Span {
                start: self.byte_pos_of(start),
                end: self.byte_pos_of(self.pos),
            },
        }
    }

    /// Consume `len` chars and emit `token`.
    fn single(&mut self, token: Token, start: usize, len: usize) -> Result<Spanned, LexError> {
        self.pos += len;
        Ok(self.spanned(token, start))
    }

    fn next_token(&mut self) -> Result<Spanned, LexError> {
        self.skip_whitespace();

        if self.pos >= self.chars.len() {
            let end = self.byte_pos_of(self.pos);
            return Ok(Spanned {
                token: Token::EOF,
                span: Span { start: end, end },
            });
        }

        let start = self.pos;
        let ch = self.chars[self.pos];
        let next = self.peek_at(1);
        let third = self.peek_at(2);

        match ch {
            '\n' => self.single(Token::Newline, start, 1),
            '/' if next == Some('/') => self.lex_comment(start),
            '/' if next == Some('*') => {
                self.skip_block_comment(start)?;
                self.next_token()
            }
            '/' if next == Some('=') => self.single(Token::SlashEq, start, 2),
            '/' => self.single(Token::Slash, start, 1),
            '*' if next == Some('*') => self.single(Token::StarStar, start, 2),
            '*' if next == Some('=') => self.single(Token::StarEq, start, 2),
            '*' => self.single(Token::Star, start, 1),
            '%' if next == Some('=') => self.single(Token::PercentEq, start, 2),
            '%' => self.single(Token::Percent, start, 1),
            '+' if next == Some('=') => self.single(Token::PlusEq, start, 2),
            '+' => self.single(Token::Plus, start, 1),
            '-' if next == Some('=') => self.single(Token::MinusEq, start, 2),
            '-' => self.single(Token::Minus, start, 1),
            '<' if next == Some('=') => self.single(Token::LtEq, start, 2),
            '<' => self.single(Token::Lt, start, 1),
            '>' if next == Some('=') => self.single(Token::GtEq, start, 2),
            '>' => self.single(Token::Gt, start, 1),
            '=' if next == Some('=') && third == Some('=') => self.single(Token::EqEq, start, 3),
            '=' if next == Some('=') => self.single(Token::EqEq, start, 2),
            '=' => self.single(Token::Eq, start, 1),
            '!' if next == Some('=') && third == Some('=') => self.single(Token::BangEq, start, 3),
            '!' if next == Some('=') => self.single(Token::BangEq, start, 2),
            '!' => self.single(Token::Bang, start, 1),
            '&' if next == Some('&') => self.single(Token::AndAnd, start, 2),
            '|' if next == Some('|') => self.single(Token::OrOr, start, 2),
            '?' => self.single(Token::Question, start, 1),
            ':' => self.single(Token::Colon, start, 1),
            ',' => self.single(Token::Comma, start, 1),
            ';' => self.single(Token::Semicolon, start, 1),
            '(' => self.single(Token::LParen, start, 1),
            ')' => self.single(Token::RParen, start, 1),
            '{' => self.single(Token::LBrace, start, 1),
            '}' => self.single(Token::RBrace, start, 1),
            '.' if next.is_some_and(|c| c.is_ascii_digit()) => self.lex_number(start),
            '.' => self.single(Token::Dot, start, 1),
            '"' | '\'' => self.lex_string(start),
            c if c.is_ascii_digit() => self.lex_number(start),
            c if c.is_ascii_alphabetic() || c == '_' || c == '$' => self.lex_ident(start),
            _ => Err(LexError::UnexpectedChar { ch, pos: self.byte_pos_of(start) }),
        }
    }

    fn lex_comment(&mut self, start: usize) -> Result<Spanned, LexError> {
        self.pos += 2; // skip //
        let text_start = self.pos;
        while self.pos < self.chars.len() && self.chars[self.pos] != '\n' {
            self.pos += 1;
        }
        let text: String = self.chars[text_start..self.pos].iter().collect();
        Ok(self.spanned(Token::Comment(text.trim().to_string()), start))
    }

    fn skip_block_comment(&mut self, start: usize) -> Result<(), LexError> {
        self.pos += 2; // skip /*
        loop {
            match self.advance() {
                Some('*') if self.peek_at(0) == Some('/') => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => {}
                None => return Err(LexError::UnterminatedComment { pos: self.byte_pos_of(start) }),
            }
        }
    }

    fn lex_string(&mut self, start: usize) -> Result<Spanned, LexError> {
        let Some(quote) = self.advance() else {
            return Err(LexError::UnterminatedString { pos: self.byte_pos_of(start) });
        };
        let mut s = String::new();
        loop {
            match self.advance() {
                Some(c) if c == quote => break,
                Some('\\') => match self.advance() {
                    Some('n') => s.push('\n'),
                    Some('t') => s.push('\t'),
                    Some(c) => s.push(c),
                    None => return Err(LexError::UnterminatedString { pos: self.byte_pos_of(start) }),
                },
                Some('\n') | None => {
                    return Err(LexError::UnterminatedString { pos: self.byte_pos_of(start) });
                }
                Some(c) => s.push(c),
            }
        }
        Ok(self.spanned(Token::StringLit(s), start))
    }

    fn lex_number(&mut self, start: usize) -> Result<Spanned, LexError> {
        if self.chars[self.pos] == '0' && matches!(self.peek_at(1), Some('x' | 'X')) {
            return self.lex_hex(start);
        }

        let mut seen_dot = false;
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch.is_ascii_digit() {
                self.pos += 1;
            } else if ch == '.' && !seen_dot {
                seen_dot = true;
                self.pos += 1;
            } else {
                break;
            }
        }

        // Exponent: only consumed when followed by digits (`1e3`, `2.5E-4`).
        if matches!(self.peek_at(0), Some('e' | 'E')) {
            let sign = usize::from(matches!(self.peek_at(1), Some('+' | '-')));
            if self.peek_at(1 + sign).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1 + sign;
                while self.peek_at(0).is_some_and(|c| c.is_ascii_digit()) {
                    self.pos += 1;
                }
            }
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        self.reject_ident_suffix(&text, start)?;
        let num: f64 = text.parse().map_err(|_| LexError::InvalidNumber {
            text: text.clone(),
            pos: self.byte_pos_of(start),
        })?;
        Ok(self.spanned(Token::Number(num), start))
    }

    fn lex_hex(&mut self, start: usize) -> Result<Spanned, LexError> {
        self.pos += 2; // skip 0x
        while self.peek_at(0).is_some_and(|c| c.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        self.reject_ident_suffix(&text, start)?;
        let digits = &text[2..];
        if digits.is_empty() {
            return Err(LexError::InvalidNumber {
                text,
                pos: self.byte_pos_of(start),
            });
        }
        // Literals wider than 64 bits become the nearest float, as in JavaScript.
        let num = match u64::from_str_radix(digits, 16) {
            Ok(n) => n as f64,
            Err(_) => digits
                .chars()
                .filter_map(|c| c.to_digit(16))
                .fold(0.0, |acc, d| acc * 16.0 + f64::from(d)),
        };
        Ok(self.spanned(Token::Number(num), start))
    }

    /// `3abc` is not a number followed by an identifier.
    fn reject_ident_suffix(&mut self, text: &str, start: usize) -> Result<(), LexError> {
        if self.peek_at(0).is_some_and(|c| c.is_ascii_alphanumeric() || c == '_') {
            let mut bad = text.to_string();
            while let Some(c) = self.peek_at(0).filter(|c| c.is_ascii_alphanumeric() || *c == '_') {
                bad.push(c);
                self.pos += 1;
            }
            return Err(LexError::InvalidNumber { text: bad, pos: self.byte_pos_of(start) });
        }
        Ok(())
    }

    fn lex_ident(&mut self, start: usize) -> Result<Spanned, LexError> {
        while self.pos < self.chars.len() {
            let ch = self.chars[self.pos];
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '$' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let token = match text.as_str() {
            "let" => Token::Let,
            "const" => Token::Const,
            "var" => Token::Var,
            "return" => Token::Return,
            "if" => Token::If,
            "else" => Token::Else,
            "throw" => Token::Throw,
            "true" => Token::True,
            "false" => Token::False,
            _ => Token::Ident(text),
        };
        Ok(self.spanned(token, start))
    }
}
