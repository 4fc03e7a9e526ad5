use crate::ast::{BinaryOp, Expr, Param, Program, Stmt, Type, UnaryOp};
use crate::error::MetricError;
use crate::lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse(&mut self) -> Result<Program, MetricError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            // Bare separators between top-level statements carry no meaning
            if self.match_kind(&TokenKind::StatementSeparator) {
                continue;
            }
            statements.push(self.statement()?);
            self.match_kind(&TokenKind::StatementSeparator);
        }

        Ok(statements)
    }

    // ------------------------------------------------------------------
    // statements
    // ------------------------------------------------------------------

    fn statement(&mut self) -> Result<Stmt, MetricError> {
        const EXPECTED: &str =
            "Expected 'let', 'print', 'if', 'while', 'set', 'def', 'return', or comment statement";

        match self.peek_kind() {
            Some(TokenKind::Let) => self.let_statement(),
            Some(TokenKind::Print) => self.print_statement(),
            Some(TokenKind::If) => self.control_flow_statement(TokenKind::If, "if"),
            Some(TokenKind::While) => self.control_flow_statement(TokenKind::While, "while"),
            Some(TokenKind::Set) => self.set_statement(),
            Some(TokenKind::Comment) => {
                self.advance();
                Ok(Stmt::Comment)
            }
            Some(TokenKind::Def) => self.function_declaration(),
            Some(TokenKind::Return) => self.return_statement(),
            _ => Err(self.error_here(EXPECTED)),
        }
    }

    fn let_statement(&mut self) -> Result<Stmt, MetricError> {
        self.advance(); // 'let'

        let name = self
            .identifier_name()
            .ok_or_else(|| self.error_here("Expected 'let identifier type = expression'"))?;

        let type_annotation = self.parse_type()?;

        if !self.match_kind(&TokenKind::Equals) {
            return Err(self.error_here("Expected '=' after type annotation"));
        }

        let expression = self.expression()?;
        Ok(Stmt::Let {
            name,
            type_annotation,
            expression,
        })
    }

    fn print_statement(&mut self) -> Result<Stmt, MetricError> {
        self.advance(); // 'print'
        let expression = self.expression()?;
        Ok(Stmt::Print(expression))
    }

    fn set_statement(&mut self) -> Result<Stmt, MetricError> {
        self.advance(); // 'set'

        let name = self
            .identifier_name()
            .ok_or_else(|| self.error_here("Expected 'set identifier = expression'"))?;

        if self.match_kind(&TokenKind::LeftBracket) {
            // set list[index] = value
            let index = self.expression()?;
            if !self.match_kind(&TokenKind::RightBracket) {
                return Err(self.error_here("Expected ']' after list index"));
            }
            if !self.match_kind(&TokenKind::Equals) {
                return Err(self.error_here("Expected '=' after list index"));
            }
            let value = self.expression()?;
            return Ok(Stmt::ListAssignment {
                list_name: name,
                index,
                value,
            });
        }

        if !self.match_kind(&TokenKind::Equals) {
            return Err(self.error_here("Expected 'set identifier = expression'"));
        }
        let expression = self.expression()?;
        Ok(Stmt::Set { name, expression })
    }

    fn control_flow_statement(
        &mut self,
        keyword: TokenKind,
        name: &str,
    ) -> Result<Stmt, MetricError> {
        self.advance(); // 'if' / 'while'

        if self.is_at_end() {
            return Err(self.error_here(&format!("Expected expression after '{}'", name)));
        }
        let condition = self.expression()?;

        if !self.match_kind(&TokenKind::StatementSeparator) {
            return Err(self.error_here(&format!("Expected newline after '{}' condition", name)));
        }
        if !self.match_kind(&TokenKind::Indent) {
            return Err(self.error_here(&format!("Expected indented block after '{}'", name)));
        }

        let body = self.indented_block()?;

        if !self.match_kind(&TokenKind::Dedent) {
            return Err(self.error_here(&format!("Expected dedent after '{}' body", name)));
        }

        match keyword {
            TokenKind::If => Ok(Stmt::If { condition, body }),
            _ => Ok(Stmt::While { condition, body }),
        }
    }

    /// Body statements up to the matching DEDENT. Stray separators and
    /// nested indent markers inside the block are skipped.
    fn indented_block(&mut self) -> Result<Vec<Stmt>, MetricError> {
        let mut statements = Vec::new();

        while !self.is_at_end() && !self.check(&TokenKind::Dedent) {
            if self.match_kind(&TokenKind::StatementSeparator) {
                continue;
            }
            if self.match_kind(&TokenKind::Indent) {
                continue;
            }
            statements.push(self.statement()?);
        }

        Ok(statements)
    }

    fn function_declaration(&mut self) -> Result<Stmt, MetricError> {
        self.advance(); // 'def'

        let name = self
            .identifier_name()
            .ok_or_else(|| self.error_here("Expected function name"))?;

        if !self.match_kind(&TokenKind::LeftParen) {
            return Err(self.error_here("Expected '(' after function name"));
        }

        let parameters = self.parameter_list()?;

        if !self.match_kind(&TokenKind::RightParen) {
            return Err(self.error_here("Expected ')' after parameters"));
        }
        if !self.match_kind(&TokenKind::Returns) {
            return Err(self.error_here("Expected 'returns'"));
        }
        if self.is_at_end() {
            return Err(self.error_here("Expected return type"));
        }
        let return_type = self.parse_type()?;

        if !self.match_kind(&TokenKind::StatementSeparator) {
            return Err(self.error_here("Expected newline after function signature"));
        }
        if !self.match_kind(&TokenKind::Indent) {
            return Err(self.error_here("Expected indented function body"));
        }

        let mut body = Vec::new();
        while !self.is_at_end() && !self.check(&TokenKind::Dedent) {
            body.push(self.statement()?);
            self.match_kind(&TokenKind::StatementSeparator);
        }

        if !self.match_kind(&TokenKind::Dedent) {
            return Err(self.error_here("Expected dedent after function body"));
        }

        Ok(Stmt::FunctionDeclaration {
            name,
            parameters,
            return_type,
            body,
        })
    }

    fn parameter_list(&mut self) -> Result<Vec<Param>, MetricError> {
        let mut parameters = Vec::new();

        if self.check(&TokenKind::RightParen) {
            return Ok(parameters);
        }

        loop {
            let message = if parameters.is_empty() {
                "Expected parameter name"
            } else {
                "Expected parameter name after comma"
            };
            let name = self
                .identifier_name()
                .ok_or_else(|| self.error_here(message))?;

            if self.is_at_end() {
                return Err(self.error_here("Expected parameter type"));
            }
            let type_annotation = self.parse_type()?;
            parameters.push(Param {
                name,
                type_annotation,
            });

            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }

        Ok(parameters)
    }

    fn return_statement(&mut self) -> Result<Stmt, MetricError> {
        self.advance(); // 'return'
        if self.is_at_end() {
            return Err(self.error_here("Expected 'return expression'"));
        }
        let expression = self.expression()?;
        Ok(Stmt::Return(expression))
    }

    fn parse_type(&mut self) -> Result<Type, MetricError> {
        if self.is_at_end() {
            return Err(self.error_here("Expected type"));
        }

        if self.match_kind(&TokenKind::List) {
            if !self.match_kind(&TokenKind::Of) {
                return Err(self.error_here("Expected 'of' after 'list'"));
            }
            let element = self.scalar_type_annotation()?;
            return Ok(Type::List(Box::new(element)));
        }

        self.scalar_type_annotation()
    }

    fn scalar_type_annotation(&mut self) -> Result<Type, MetricError> {
        let parsed = match self.peek_kind() {
            Some(TokenKind::IntegerType) => Some(Type::Integer),
            Some(TokenKind::BooleanType) => Some(Type::Boolean),
            Some(TokenKind::FloatType) => Some(Type::Float),
            _ => None,
        };

        match parsed {
            Some(t) => {
                self.advance();
                Ok(t)
            }
            None => {
                Err(self.error_here("Expected type annotation (integer, boolean, or float)"))
            }
        }
    }

    // ------------------------------------------------------------------
    // expressions, lowest precedence first
    // ------------------------------------------------------------------

    fn expression(&mut self) -> Result<Expr, MetricError> {
        self.logical_or()
    }

    fn logical_or(&mut self) -> Result<Expr, MetricError> {
        let mut expr = self.logical_and()?;

        while self.match_kind(&TokenKind::Or) {
            let right = self.logical_and()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator: BinaryOp::Or,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr, MetricError> {
        let mut expr = self.unary_logical()?;

        while self.match_kind(&TokenKind::And) {
            let right = self.unary_logical()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator: BinaryOp::And,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary_logical(&mut self) -> Result<Expr, MetricError> {
        if self.match_kind(&TokenKind::Not) {
            // Right-associative so `not not x` nests
            let operand = self.unary_logical()?;
            return Ok(Expr::Unary {
                operator: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, MetricError> {
        let mut expr = self.additive()?;

        loop {
            let operator = match self.peek_kind() {
                Some(TokenKind::Less) => BinaryOp::Less,
                Some(TokenKind::Greater) => BinaryOp::Greater,
                Some(TokenKind::LessEqual) => BinaryOp::LessEqual,
                Some(TokenKind::GreaterEqual) => BinaryOp::GreaterEqual,
                Some(TokenKind::EqualEqual) => BinaryOp::Equal,
                Some(TokenKind::NotEqual) => BinaryOp::NotEqual,
                _ => break,
            };
            self.advance();
            let right = self.additive()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn additive(&mut self) -> Result<Expr, MetricError> {
        let mut expr = self.multiplicative()?;

        loop {
            let operator = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn multiplicative(&mut self) -> Result<Expr, MetricError> {
        let mut expr = self.factor()?;

        loop {
            let operator = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Multiply,
                Some(TokenKind::Slash) => BinaryOp::Divide,
                Some(TokenKind::Percent) => BinaryOp::Modulus,
                _ => break,
            };
            self.advance();
            let right = self.factor()?;
            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, MetricError> {
        const EXPECTED: &str =
            "Expected integer, float, identifier, boolean, or opening parenthesis";

        let kind = match self.peek_kind() {
            Some(kind) => kind.clone(),
            None => return Err(self.error_here(EXPECTED)),
        };

        match kind {
            TokenKind::Integer(value) => {
                self.advance();
                Ok(Expr::IntegerLiteral(value))
            }
            TokenKind::Float(value) => {
                self.advance();
                Ok(Expr::FloatLiteral(value))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::BooleanLiteral(true))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::BooleanLiteral(false))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.match_kind(&TokenKind::LeftParen) {
                    self.finish_call(name)
                } else if self.match_kind(&TokenKind::LeftBracket) {
                    let index = self.expression()?;
                    if !self.match_kind(&TokenKind::RightBracket) {
                        return Err(self.error_here("Expected ']' after list index"));
                    }
                    Ok(Expr::ListAccess {
                        list_expr: Box::new(Expr::Variable(name)),
                        index: Box::new(index),
                    })
                } else {
                    Ok(Expr::Variable(name))
                }
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                if !self.match_kind(&TokenKind::RightParen) {
                    return Err(self.error_here("Expected closing parenthesis"));
                }
                Ok(expr)
            }
            TokenKind::LeftBracket => {
                self.advance();
                self.list_literal()
            }
            TokenKind::Repeat => {
                self.advance();
                if !self.match_kind(&TokenKind::LeftParen) {
                    return Err(self.error_here("Expected '(' after 'repeat'"));
                }
                let value = self.expression()?;
                if !self.match_kind(&TokenKind::Comma) {
                    return Err(self.error_here("Expected ',' after repeat value"));
                }
                let count = self.expression()?;
                if !self.match_kind(&TokenKind::RightParen) {
                    return Err(self.error_here("Expected ')' after repeat arguments"));
                }
                Ok(Expr::RepeatCall {
                    value: Box::new(value),
                    count: Box::new(count),
                })
            }
            TokenKind::Len => {
                self.advance();
                if !self.match_kind(&TokenKind::LeftParen) {
                    return Err(self.error_here("Expected '(' after 'len'"));
                }
                let list_expr = self.expression()?;
                if !self.match_kind(&TokenKind::RightParen) {
                    return Err(self.error_here("Expected ')' after len argument"));
                }
                Ok(Expr::LenCall(Box::new(list_expr)))
            }
            _ => Err(self.error_here(EXPECTED)),
        }
    }

    fn finish_call(&mut self, name: String) -> Result<Expr, MetricError> {
        let mut arguments = Vec::new();

        if !self.check(&TokenKind::RightParen) {
            loop {
                arguments.push(self.expression()?);
                if !self.match_kind(&TokenKind::Comma) {
                    break;
                }
            }
        }

        if !self.match_kind(&TokenKind::RightParen) {
            return Err(self.error_here("Expected ')' after function arguments"));
        }

        Ok(Expr::FunctionCall { name, arguments })
    }

    fn list_literal(&mut self) -> Result<Expr, MetricError> {
        let mut elements = Vec::new();

        // An empty literal parses; the type checker rejects it later
        if self.match_kind(&TokenKind::RightBracket) {
            return Ok(Expr::ListLiteral(elements));
        }

        loop {
            elements.push(self.expression()?);
            if !self.match_kind(&TokenKind::Comma) {
                break;
            }
        }

        if !self.match_kind(&TokenKind::RightBracket) {
            return Err(self.error_here("Expected ']' after list elements"));
        }

        Ok(Expr::ListLiteral(elements))
    }

    // ------------------------------------------------------------------
    // cursor helpers
    // ------------------------------------------------------------------

    fn is_at_end(&self) -> bool {
        self.current >= self.tokens.len()
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.current).map(|t| &t.kind)
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    /// If the cursor has an identifier, consume it and return its name.
    fn identifier_name(&mut self) -> Option<String> {
        match self.peek_kind() {
            Some(TokenKind::Identifier(name)) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => None,
        }
    }

    /// Parse error at the current token, or at the last token when the
    /// stream is exhausted.
    fn error_here(&self, message: &str) -> MetricError {
        let token = self
            .tokens
            .get(self.current)
            .or_else(|| self.tokens.last());
        match token {
            Some(token) => MetricError::parse_error_at(token.pos, message.to_string()),
            None => MetricError::parse_error(message.to_string()),
        }
    }
}

/// Parse a token sequence into a program.
pub fn parse(tokens: Vec<Token>) -> Result<Program, MetricError> {
    Parser::new(tokens).parse()
}
