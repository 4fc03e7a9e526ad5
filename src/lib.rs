// Metric Language Interpreter Library
//
// This is the core library for the Metric language interpreter, a small
// strictly-typed language with significant indentation, a whitespace linter,
// and an evaluator that counts the operations a program performs.

// Public modules
pub mod ast;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod runner;
pub mod style;
pub mod typecheck;
pub mod value;

// Re-export commonly used items
pub use ast::{BinaryOp, Expr, Param, Program, Stmt, Type, UnaryOp};
pub use error::{ErrorKind, MetricError, Position};
pub use evaluator::{Environment, Flow};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use typecheck::TypeChecker;
pub use value::Value;

// Re-export main functions
pub use evaluator::execute;
pub use lexer::tokenize;
pub use parser::parse;
pub use runner::run;
pub use style::validate_style;
pub use typecheck::type_check;
