use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use std::fmt;

/// 1-based source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Tokenizer,
    Style,
    Parse,
    TypeCheck,
    Evaluation,
}

impl ErrorKind {
    fn label(&self) -> &'static str {
        match self {
            ErrorKind::Tokenizer => "Tokenizer Error",
            ErrorKind::Style => "Style Error",
            ErrorKind::Parse => "Parse Error",
            ErrorKind::TypeCheck => "TypeCheck Error",
            ErrorKind::Evaluation => "Evaluation Error",
        }
    }
}

/// One structured error shape for every pipeline stage.
///
/// Tokenizer and style errors always carry a position; the checker and
/// evaluator work on a position-free AST, so theirs may not.
#[derive(Debug, Clone)]
pub struct MetricError {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Option<Position>,
}

impl MetricError {
    pub fn new(kind: ErrorKind, position: Option<Position>, message: String) -> Self {
        Self {
            kind,
            message,
            position,
        }
    }

    pub fn tokenizer_error(position: Position, message: String) -> Self {
        Self::new(ErrorKind::Tokenizer, Some(position), message)
    }

    pub fn style_error(position: Position, message: String) -> Self {
        Self::new(ErrorKind::Style, Some(position), message)
    }

    pub fn parse_error(message: String) -> Self {
        Self::new(ErrorKind::Parse, None, message)
    }

    pub fn parse_error_at(position: Position, message: String) -> Self {
        Self::new(ErrorKind::Parse, Some(position), message)
    }

    pub fn type_error(message: String) -> Self {
        Self::new(ErrorKind::TypeCheck, None, message)
    }

    pub fn eval_error(message: String) -> Self {
        Self::new(ErrorKind::Evaluation, None, message)
    }

    /// Byte offset of the position within `source`, for ariadne labels.
    fn offset_in(&self, source: &str) -> Option<usize> {
        let pos = self.position?;
        let mut offset = 0;
        for (line_idx, line) in source.split('\n').enumerate() {
            if line_idx + 1 == pos.line {
                let col = (pos.column - 1).min(line.len());
                return Some(offset + col);
            }
            offset += line.len() + 1;
        }
        None
    }

    pub fn report(&self, source: &str, filename: Option<&str>) {
        let filename = filename.unwrap_or("<metric>");

        let color = match self.kind {
            ErrorKind::Tokenizer => Color::Red,
            ErrorKind::Style => Color::Cyan,
            ErrorKind::Parse => Color::Yellow,
            ErrorKind::TypeCheck => Color::Blue,
            ErrorKind::Evaluation => Color::Magenta,
        };

        let offset = self.offset_in(source).unwrap_or(0);

        let mut report_builder = Report::build(ReportKind::Error, filename, offset)
            .with_message(format!("{}: {}", self.kind.label().fg(color), self.message));

        if self.position.is_some() {
            report_builder = report_builder.with_label(
                Label::new((filename, offset..offset + 1))
                    .with_message(&self.message)
                    .with_color(color),
            );
        }

        let _ = report_builder
            .finish()
            .eprint((filename, Source::from(source)));
    }
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.position {
            Some(pos) => write!(
                f,
                "[Line {}, Column {}] {} | {}",
                pos.line,
                pos.column,
                self.kind.label(),
                self.message
            ),
            None => write!(f, "{} | {}", self.kind.label(), self.message),
        }
    }
}

impl std::error::Error for MetricError {}
