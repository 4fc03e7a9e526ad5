use crate::error::{MetricError, Position};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Payload-carrying leaves
    Integer(i64),
    Float(f64),
    Identifier(String),

    // Keywords
    Let,
    Print,
    True,
    False,
    If,
    While,
    Set,
    IntegerType,
    BooleanType,
    FloatType,
    Def,
    Returns,
    Return,
    List,
    Of,
    Repeat,
    Len,
    And,
    Or,
    Not,

    // Operators and punctuation
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    Equals,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    EqualEqual,
    NotEqual,
    Comma,
    Comment,

    // Layout pseudo-tokens
    Indent,
    Dedent,
    StatementSeparator,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

impl Token {
    pub fn new(kind: TokenKind, pos: Position) -> Self {
        Self { kind, pos }
    }
}

pub struct Lexer {
    source: String,
    tokens: Vec<Token>,
    indent_stack: Vec<usize>,
    keywords: HashMap<&'static str, TokenKind>,
}

impl Lexer {
    pub fn new(source: String) -> Self {
        let mut keywords = HashMap::new();
        keywords.insert("let", TokenKind::Let);
        keywords.insert("print", TokenKind::Print);
        keywords.insert("true", TokenKind::True);
        keywords.insert("false", TokenKind::False);
        keywords.insert("if", TokenKind::If);
        keywords.insert("while", TokenKind::While);
        keywords.insert("set", TokenKind::Set);
        keywords.insert("integer", TokenKind::IntegerType);
        keywords.insert("boolean", TokenKind::BooleanType);
        keywords.insert("float", TokenKind::FloatType);
        keywords.insert("def", TokenKind::Def);
        keywords.insert("returns", TokenKind::Returns);
        keywords.insert("return", TokenKind::Return);
        keywords.insert("list", TokenKind::List);
        keywords.insert("of", TokenKind::Of);
        keywords.insert("repeat", TokenKind::Repeat);
        keywords.insert("len", TokenKind::Len);
        keywords.insert("and", TokenKind::And);
        keywords.insert("or", TokenKind::Or);
        keywords.insert("not", TokenKind::Not);

        Self {
            source,
            tokens: Vec::new(),
            indent_stack: vec![0],
            keywords,
        }
    }

    pub fn scan_tokens(mut self) -> Result<Vec<Token>, MetricError> {
        let lines: Vec<String> = self.source.split('\n').map(str::to_string).collect();
        let mut last_line = 1;

        for (line_idx, line) in lines.iter().enumerate() {
            let line_num = line_idx + 1;
            if line.trim().is_empty() {
                continue;
            }
            last_line = line_num;

            self.handle_indentation(line, line_num)?;
            self.scan_line(line, line_num)?;

            // Statement separator unless this is the final non-empty line
            let more_to_come = lines[line_idx + 1..].iter().any(|l| !l.trim().is_empty());
            if more_to_come {
                self.tokens.push(Token::new(
                    TokenKind::StatementSeparator,
                    Position::new(line_num, line.len() + 1),
                ));
            }
        }

        while self.indent_stack.len() > 1 {
            self.indent_stack.pop();
            self.tokens
                .push(Token::new(TokenKind::Dedent, Position::new(last_line, 1)));
        }

        Ok(self.tokens)
    }

    fn handle_indentation(&mut self, line: &str, line_num: usize) -> Result<(), MetricError> {
        let indent_level = line.chars().take_while(|&c| c == ' ').count();

        if indent_level % 4 != 0 {
            let first_bad_col = (indent_level / 4) * 4 + 1;
            return Err(MetricError::tokenizer_error(
                Position::new(line_num, first_bad_col),
                "Invalid indentation: expected multiples of 4 spaces".to_string(),
            ));
        }

        let depth = indent_level / 4;
        let top = *self.indent_stack.last().unwrap_or(&0);

        if depth > top {
            if depth != top + 1 {
                return Err(MetricError::tokenizer_error(
                    Position::new(line_num, 1),
                    format!("Invalid indentation: expected {} spaces", (top + 1) * 4),
                ));
            }
            self.indent_stack.push(depth);
            self.tokens
                .push(Token::new(TokenKind::Indent, Position::new(line_num, 1)));
        } else if depth < top {
            while self.indent_stack.len() > 1 && *self.indent_stack.last().unwrap() > depth {
                self.indent_stack.pop();
                self.tokens
                    .push(Token::new(TokenKind::Dedent, Position::new(line_num, 1)));
            }
            let landed = *self.indent_stack.last().unwrap();
            if landed != depth {
                return Err(MetricError::tokenizer_error(
                    Position::new(line_num, 1),
                    format!("Invalid indentation: expected {} spaces", landed * 4),
                ));
            }
        }

        Ok(())
    }

    fn scan_line(&mut self, line: &str, line_num: usize) -> Result<(), MetricError> {
        let chars: Vec<char> = line.chars().collect();
        let mut i = line.chars().take_while(|&c| c == ' ').count();

        while i < chars.len() {
            let c = chars[i];
            let pos = Position::new(line_num, i + 1);

            match c {
                ' ' => {
                    i += 1;
                }
                '#' => {
                    // Rest of the line is a comment; one token stands in for it
                    self.tokens.push(Token::new(TokenKind::Comment, pos));
                    break;
                }
                '=' if chars.get(i + 1) == Some(&'=') => {
                    self.tokens.push(Token::new(TokenKind::EqualEqual, pos));
                    i += 2;
                }
                '!' if chars.get(i + 1) == Some(&'=') => {
                    self.tokens.push(Token::new(TokenKind::NotEqual, pos));
                    i += 2;
                }
                '<' if chars.get(i + 1) == Some(&'=') => {
                    self.tokens.push(Token::new(TokenKind::LessEqual, pos));
                    i += 2;
                }
                '>' if chars.get(i + 1) == Some(&'=') => {
                    self.tokens.push(Token::new(TokenKind::GreaterEqual, pos));
                    i += 2;
                }
                '-' if chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) => {
                    i = self.scan_number(&chars, i, line_num)?;
                }
                '+' => {
                    self.tokens.push(Token::new(TokenKind::Plus, pos));
                    i += 1;
                }
                '-' => {
                    self.tokens.push(Token::new(TokenKind::Minus, pos));
                    i += 1;
                }
                '*' => {
                    self.tokens.push(Token::new(TokenKind::Star, pos));
                    i += 1;
                }
                '/' => {
                    self.tokens.push(Token::new(TokenKind::Slash, pos));
                    i += 1;
                }
                '%' => {
                    self.tokens.push(Token::new(TokenKind::Percent, pos));
                    i += 1;
                }
                '(' => {
                    self.tokens.push(Token::new(TokenKind::LeftParen, pos));
                    i += 1;
                }
                ')' => {
                    self.tokens.push(Token::new(TokenKind::RightParen, pos));
                    i += 1;
                }
                '=' => {
                    self.tokens.push(Token::new(TokenKind::Equals, pos));
                    i += 1;
                }
                '<' => {
                    self.tokens.push(Token::new(TokenKind::Less, pos));
                    i += 1;
                }
                '>' => {
                    self.tokens.push(Token::new(TokenKind::Greater, pos));
                    i += 1;
                }
                ',' => {
                    self.tokens.push(Token::new(TokenKind::Comma, pos));
                    i += 1;
                }
                '[' => {
                    self.tokens.push(Token::new(TokenKind::LeftBracket, pos));
                    i += 1;
                }
                ']' => {
                    self.tokens.push(Token::new(TokenKind::RightBracket, pos));
                    i += 1;
                }
                c if c.is_ascii_digit() => {
                    i = self.scan_number(&chars, i, line_num)?;
                }
                c if c.is_alphabetic() => {
                    let start = i;
                    while i < chars.len() && chars[i].is_alphabetic() {
                        i += 1;
                    }
                    let identifier: String = chars[start..i].iter().collect();
                    let kind = self
                        .keywords
                        .get(identifier.as_str())
                        .cloned()
                        .unwrap_or(TokenKind::Identifier(identifier));
                    self.tokens
                        .push(Token::new(kind, Position::new(line_num, start + 1)));
                }
                '\t' => {
                    return Err(MetricError::tokenizer_error(
                        pos,
                        "Unexpected character: '\\t'".to_string(),
                    ));
                }
                c => {
                    return Err(MetricError::tokenizer_error(
                        pos,
                        format!("Unexpected character: '{}'", c),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Scan an integer or float literal starting at `start`; a leading minus
    /// is folded into the literal. Returns the position after the literal.
    fn scan_number(
        &mut self,
        chars: &[char],
        start: usize,
        line_num: usize,
    ) -> Result<usize, MetricError> {
        let mut i = start;
        if chars[i] == '-' {
            i += 1;
        }

        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }

        let pos = Position::new(line_num, start + 1);

        if i < chars.len() && chars[i] == '.' {
            let dot = i;
            i += 1;
            let decimal_start = i;
            while i < chars.len() && chars[i].is_ascii_digit() {
                i += 1;
            }
            if i == decimal_start {
                return Err(MetricError::tokenizer_error(
                    Position::new(line_num, dot + 1),
                    "Invalid float: missing digits after decimal point".to_string(),
                ));
            }
            let text: String = chars[start..i].iter().collect();
            let value = text.parse::<f64>().map_err(|_| {
                MetricError::tokenizer_error(pos, format!("Invalid float literal: {}", text))
            })?;
            self.tokens.push(Token::new(TokenKind::Float(value), pos));
        } else {
            let text: String = chars[start..i].iter().collect();
            let value = text.parse::<i64>().map_err(|_| {
                MetricError::tokenizer_error(pos, format!("Invalid integer literal: {}", text))
            })?;
            self.tokens.push(Token::new(TokenKind::Integer(value), pos));
        }

        Ok(i)
    }
}

/// Tokenize source text, inserting INDENT/DEDENT/STATEMENT_SEPARATOR
/// pseudo-tokens from the 4-space indentation structure.
pub fn tokenize(source: &str) -> Result<Vec<Token>, MetricError> {
    Lexer::new(source.to_string()).scan_tokens()
}
