use crate::error::MetricError;
use crate::evaluator::execute;
use crate::lexer::tokenize;
use crate::parser::parse;
use crate::style::validate_style;
use crate::typecheck::type_check;
use std::time::Instant;

/// Rich diagnostic first, then the one-line contract form in red.
fn report_failure(error: &MetricError, source: &str, filename: Option<&str>) {
    error.report(source, filename);
    eprintln!("\x1b[31m{}\x1b[0m", error);
}

/// Run a program through the full pipeline: tokenize, lint, parse, type
/// check, execute. Prints execution time and the operation count on success;
/// reports the error and returns `false` on failure.
pub fn run(source: &str, filename: Option<&str>) -> bool {
    let tokens = match tokenize(source) {
        Ok(tokens) => tokens,
        Err(error) => {
            report_failure(&error, source, filename);
            return false;
        }
    };

    if let Err(error) = validate_style(source, &tokens) {
        report_failure(&error, source, filename);
        return false;
    }

    let program = match parse(tokens) {
        Ok(program) => program,
        Err(error) => {
            report_failure(&error, source, filename);
            return false;
        }
    };

    if let Err(error) = type_check(&program) {
        report_failure(&error, source, filename);
        return false;
    }

    let start = Instant::now();
    match execute(&program) {
        Ok((_, operation_count)) => {
            println!("Execution time: {:.4} seconds", start.elapsed().as_secs_f64());
            println!("Operation count: {}", operation_count);
            true
        }
        Err(error) => {
            report_failure(&error, source, filename);
            false
        }
    }
}
