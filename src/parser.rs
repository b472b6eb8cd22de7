use crate::ast::*;
use crate::error::ParseError;
use crate::token::{Span, Spanned, Token};

/// How deep blocks, `if` bodies, parentheses, call arguments, unary and
/// right-associative operators may nest.
pub const MAX_NESTING: usize = 64;
/// Largest expression tree height, counting every operator a chain like
/// `a + b + c` stacks up.
pub const MAX_EXPR_HEIGHT: usize = 512;

pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
    /// Height of the expression most recently returned by a `parse_*` method.
    height: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Spanned>) -> Self {
        Parser {
            tokens,
            pos: 0,
            depth: 0,
            height: 0,
        }
    }

    // ── Helpers ──────────────────────────────────────────────

    fn peek(&self) -> Token {
        self.tokens[self.pos].token.clone()
    }

    fn peek_at(&self, offset: usize) -> Token {
        let idx = self.pos + offset;
        if idx < self.tokens.len() {
            self.tokens[idx].token.clone()
        } else {
            Token::EOF
        }
    }

    fn span(&self) -> Span {
        self.tokens[self.pos].span
    }

    /// End offset of the most recently consumed token.
    fn prev_end(&self) -> usize {
        self.tokens[self.pos.saturating_sub(1)].span.end
    }

    fn advance(&mut self) -> Spanned {
        let s = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        s
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek(), Token::EOF)
    }

    fn check(&self, expected: &Token) -> bool {
        std::mem::discriminant(&self.tokens[self.pos].token) == std::mem::discriminant(expected)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        if self.is_at_end() {
            ParseError::UnexpectedEOF {
                expected: expected.into(),
                pos: self.span().start,
            }
        } else {
            ParseError::UnexpectedToken {
                expected: expected.into(),
                found: self.peek(),
                span: self.span(),
            }
        }
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, ParseError>) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError::TooDeep {
                limit: MAX_NESTING,
                span: self.span(),
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Record a node built over children at most `below` high.
    fn grow(&mut self, below: usize, span: Span) -> Result<(), ParseError> {
        if below >= MAX_EXPR_HEIGHT {
            return Err(ParseError::TooDeep {
                limit: MAX_EXPR_HEIGHT,
                span,
            });
        }
        self.height = below + 1;
        Ok(())
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<Spanned, ParseError> {
        if self.check(expected) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Token::Ident(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Token::Newline) {
            self.advance();
        }
    }

    /// Skip newlines and return any comments found.
    fn skip_newlines_collecting_comments(&mut self) -> Vec<String> {
        let mut comments = Vec::new();
        loop {
            match self.peek() {
                Token::Newline | Token::Semicolon => {
                    self.advance();
                }
                Token::Comment(text) => {
                    comments.push(text);
                    self.advance();
                }
                _ => break,
            }
        }
        comments
    }

    /// A statement ends at `;`, a newline, a comment, `}` or end of input.
    /// Statements closed by a `}` need no separator.
    fn expect_terminator(&mut self) -> Result<(), ParseError> {
        if self.pos > 0 && self.tokens[self.pos - 1].token == Token::RBrace {
            self.eat(&Token::Semicolon);
            return Ok(());
        }
        match self.peek() {
            Token::Semicolon => {
                self.advance();
                Ok(())
            }
            Token::Newline | Token::Comment(_) | Token::RBrace | Token::EOF => Ok(()),
            _ => Err(self.unexpected("';' or end of line")),
        }
    }

    fn at_statement_end(&self) -> bool {
        matches!(
            self.peek(),
            Token::Semicolon | Token::Newline | Token::Comment(_) | Token::RBrace | Token::EOF
        )
    }

    // ── Program ──────────────────────────────────────────────

    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let statements = self.parse_statement_list(false)?;
        if !self.is_at_end() {
            return Err(self.unexpected("statement"));
        }
        Ok(Program { statements })
    }

    /// Parse statements up to `}` (inside a block) or end of input.
    fn parse_statement_list(&mut self, in_block: bool) -> Result<Vec<Statement>, ParseError> {
        let mut statements = Vec::new();
        loop {
            for c in self.skip_newlines_collecting_comments() {
                statements.push(Statement::Comment(c));
            }
            if self.is_at_end() || (in_block && self.check(&Token::RBrace)) {
                break;
            }
            statements.push(self.parse_statement()?);
            self.expect_terminator()?;
        }
        Ok(statements)
    }

    // ── Statements ───────────────────────────────────────────

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek() {
            Token::Comment(text) => {
                self.advance();
                Ok(Statement::Comment(text))
            }
            Token::Let => self.parse_declaration(DeclKind::Let),
            Token::Const => self.parse_declaration(DeclKind::Const),
            Token::Var => self.parse_declaration(DeclKind::Var),
            Token::Return => self.parse_return(),
            Token::If => self.parse_if(),
            Token::LBrace => self.parse_block(),
            Token::Throw => self.parse_throw(),
            Token::Ident(_) => match assign_op(&self.peek_at(1)) {
                Some(op) => self.parse_assignment(op),
                None => self.parse_expression_statement(),
            },
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_declaration(&mut self, kind: DeclKind) -> Result<Statement, ParseError> {
        let start_span = self.span().start;
        self.advance(); // let / const / var
        let name = self.expect_ident()?;
        self.expect(&Token::Eq, "'=' (declarations need an initial value)")?;
        let value = self.parse_expr()?;
        Ok(Statement::Declare {
            kind,
            name,
            value,
            span_start: start_span,
            span_end: self.prev_end(),
        })
    }

    fn parse_assignment(&mut self, op: AssignOp) -> Result<Statement, ParseError> {
        let start_span = self.span().start;
        let target = self.expect_ident()?;
        self.advance(); // the assignment operator
        let value = self.parse_expr()?;
        Ok(Statement::Assign {
            target,
            op,
            value,
            span_start: start_span,
            span_end: self.prev_end(),
        })
    }

    fn parse_return(&mut self) -> Result<Statement, ParseError> {
        let start_span = self.span().start;
        self.advance(); // return
        let value = if self.at_statement_end() {
            None
        } else {
            Some(self.parse_expr()?)
        };
        Ok(Statement::Return {
            value,
            span_start: start_span,
            span_end: self.prev_end(),
        })
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        let start_span = self.span().start;
        self.advance(); // if
        self.expect(&Token::LParen, "'(' after if")?;
        let condition = self.parse_expr()?;
        self.expect(&Token::RParen, "')' after if condition")?;
        self.skip_newlines();
        let then_branch = Box::new(self.nested(Self::parse_statement)?);

        // `else` may follow on the same line, after a `;`, or on the next line.
        let saved = self.pos;
        self.eat(&Token::Semicolon);
        self.skip_newlines();
        let else_branch = if self.eat(&Token::Else) {
            self.skip_newlines();
            Some(Box::new(self.nested(Self::parse_statement)?))
        } else {
            self.pos = saved;
            None
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
            span_start: start_span,
            span_end: self.prev_end(),
        })
    }

    fn parse_block(&mut self) -> Result<Statement, ParseError> {
        let start_span = self.span().start;
        self.expect(&Token::LBrace, "'{'")?;
        let body = self.nested(|p| p.parse_statement_list(true))?;
        self.expect(&Token::RBrace, "'}'")?;
        Ok(Statement::Block {
            body,
            span_start: start_span,
            span_end: self.prev_end(),
        })
    }

    fn parse_throw(&mut self) -> Result<Statement, ParseError> {
        let start_span = self.span().start;
        self.advance(); // throw
        let value = match self.peek() {
            Token::StringLit(text) => {
                self.advance();
                ThrowValue::Text(text)
            }
            _ if self.at_statement_end() => return Err(self.unexpected("value after throw")),
            _ => ThrowValue::Value(self.parse_expr()?),
        };
        Ok(Statement::Throw {
            value,
            span_start: start_span,
            span_end: self.prev_end(),
        })
    }

    fn parse_expression_statement(&mut self) -> Result<Statement, ParseError> {
        let start_span = self.span().start;
        let expr = self.parse_expr()?;
        Ok(Statement::Expression {
            expr,
            span_start: start_span,
            span_end: self.prev_end(),
        })
    }

    // ── Expressions ─────────────────────────────────────────

    pub fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let condition = self.parse_or()?;
        let mut below = self.height;
        let span = self.span();
        if !self.eat(&Token::Question) {
            return Ok(condition);
        }
        let then_expr = self.nested(Self::parse_conditional)?;
        below = below.max(self.height);
        self.expect(&Token::Colon, "':' in conditional expression")?;
        let else_expr = self.nested(Self::parse_conditional)?;
        self.grow(below.max(self.height), span)?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_and()?;
        loop {
            let span = self.span();
            if !self.eat(&Token::OrOr) {
                break;
            }
            let below = self.height;
            let right = self.parse_and()?;
            self.grow(below.max(self.height), span)?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut left = self.parse_equality()?;
        loop {
            let span = self.span();
            if !self.eat(&Token::AndAnd) {
                break;
            }
            let below = self.height;
            let right = self.parse_equality()?;
            self.grow(below.max(self.height), span)?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    /// Left-associative binary level: `next (op next)*`.
    fn parse_binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, ParseError>,
        op_for: fn(&Token) -> Option<BinaryOp>,
    ) -> Result<Expr, ParseError> {
        let mut left = next(self)?;
        while let Some(op) = op_for(&self.peek()) {
            let span = self.span();
            self.advance();
            let below = self.height;
            let right = next(self)?;
            self.grow(below.max(self.height), span)?;
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_comparison, |t| match t {
            Token::EqEq => Some(BinaryOp::Eq),
            Token::BangEq => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_additive, |t| match t {
            Token::Lt => Some(BinaryOp::Lt),
            Token::LtEq => Some(BinaryOp::LtEq),
            Token::Gt => Some(BinaryOp::Gt),
            Token::GtEq => Some(BinaryOp::GtEq),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_multiplicative, |t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        self.parse_binary_level(Self::parse_exponent, |t| match t {
            Token::Star => Some(BinaryOp::Mul),
            Token::Slash => Some(BinaryOp::Div),
            Token::Percent => Some(BinaryOp::Rem),
            _ => None,
        })
    }

    /// `**` is right-associative; its operands may carry a unary sign.
    fn parse_exponent(&mut self) -> Result<Expr, ParseError> {
        let base = self.parse_unary()?;
        let below = self.height;
        let span = self.span();
        if !self.eat(&Token::StarStar) {
            return Ok(base);
        }
        let exponent = self.nested(Self::parse_exponent)?;
        self.grow(below.max(self.height), span)?;
        Ok(Expr::Binary {
            op: BinaryOp::Pow,
            left: Box::new(base),
            right: Box::new(exponent),
        })
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek() {
            Token::Minus => UnaryOp::Neg,
            Token::Plus => UnaryOp::Plus,
            Token::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let span = self.span();
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        self.grow(self.height, span)?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.check(&Token::Dot) {
                let (path, span_start) = match &expr {
                    Expr::Identifier { name, span_start, .. } => (name.clone(), *span_start),
                    Expr::Member { path, span_start, .. } => (path.clone(), *span_start),
                    _ => return Err(self.unexpected("operator")),
                };
                self.advance();
                let property = self.expect_ident()?;
                expr = Expr::Member {
                    path: format!("{path}.{property}"),
                    span_start,
                    span_end: self.prev_end(),
                };
            } else if self.check(&Token::LParen) {
                let (function, span_start) = match &expr {
                    Expr::Identifier { name, span_start, .. } => (name.clone(), *span_start),
                    Expr::Member { path, span_start, .. } => (path.clone(), *span_start),
                    _ => return Err(self.unexpected("operator")),
                };
                let span = self.span();
                self.advance();
                let (args, below) = self.parse_call_args()?;
                self.expect(&Token::RParen, "')' after arguments")?;
                self.grow(below, span)?;
                expr = Expr::Call {
                    function,
                    args,
                    span_start,
                    span_end: self.prev_end(),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Arguments up to (not including) `)`, with the height of the tallest.
    fn parse_call_args(&mut self) -> Result<(Vec<Expr>, usize), ParseError> {
        let mut args = Vec::new();
        let mut tallest = 0;
        if !self.check(&Token::RParen) {
            args.push(self.nested(Self::parse_expr)?);
            tallest = self.height;
            while self.eat(&Token::Comma) {
                if self.check(&Token::RParen) {
                    break; // trailing comma
                }
                args.push(self.nested(Self::parse_expr)?);
                tallest = tallest.max(self.height);
            }
        }
        Ok((args, tallest))
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let span = self.span();
        self.height = 1;
        match self.peek() {
            Token::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Token::True => {
                self.advance();
                Ok(Expr::Bool(true))
            }
            Token::False => {
                self.advance();
                Ok(Expr::Bool(false))
            }
            Token::Ident(name) => {
                self.advance();
                Ok(Expr::Identifier {
                    name,
                    span_start: span.start,
                    span_end: span.end,
                })
            }
            Token::LParen => {
                self.advance();
                let inner = self.nested(Self::parse_expr)?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(self.unexpected("expression")),
        }
    }
}

fn assign_op(token: &Token) -> Option<AssignOp> {
    match token {
        Token::Eq => Some(AssignOp::Set),
        Token::PlusEq => Some(AssignOp::Add),
        Token::MinusEq => Some(AssignOp::Sub),
        Token::StarEq => Some(AssignOp::Mul),
        Token::SlashEq => Some(AssignOp::Div),
        Token::PercentEq => Some(AssignOp::Rem),
        _ => None,
    }
}
