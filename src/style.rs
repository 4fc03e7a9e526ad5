use crate::error::{MetricError, Position};
use crate::lexer::Token;

const STATEMENT_KEYWORDS: [&str; 7] = ["let", "print", "if", "while", "set", "def", "return"];
const OPERATORS: [char; 9] = ['+', '-', '*', '/', '%', '=', '<', '>', '!'];

/// Validate whitespace and formatting rules. Runs after tokenizing and
/// before parsing; a failure aborts the pipeline. The token stream is part
/// of the call contract, but every rule reads the raw source.
pub fn validate_style(source: &str, _tokens: &[Token]) -> Result<(), MetricError> {
    validate_not_empty(source)?;
    validate_line_endings(source)?;
    validate_leading_trailing_newlines(source)?;
    validate_newlines(source)?;
    validate_line_whitespace(source)?;
    validate_multiple_statements_per_line(source)?;
    validate_token_spacing(source)?;
    validate_comment_spacing(source)?;
    validate_comma_spacing(source)?;
    Ok(())
}

fn style_error(line: usize, column: usize, message: impl Into<String>) -> MetricError {
    MetricError::style_error(Position::new(line, column), message.into())
}

fn validate_not_empty(source: &str) -> Result<(), MetricError> {
    if source.trim().is_empty() {
        return Err(style_error(1, 1, "Program must not be empty"));
    }
    Ok(())
}

fn validate_line_endings(source: &str) -> Result<(), MetricError> {
    let chars: Vec<char> = source.chars().collect();
    for (position, &character) in chars.iter().enumerate() {
        if character != '\r' {
            continue;
        }
        let before = &chars[..position];
        let line_number = before.iter().filter(|&&c| c == '\n').count() + 1;
        let column_number = match before.iter().rposition(|&c| c == '\n') {
            Some(last_newline) => position - last_newline,
            None => position + 1,
        };
        return Err(style_error(
            line_number,
            column_number,
            "Carriage return newlines not allowed; use \\n only",
        ));
    }
    Ok(())
}

fn validate_leading_trailing_newlines(source: &str) -> Result<(), MetricError> {
    if source.is_empty() {
        return Ok(());
    }
    if source.starts_with('\n') {
        return Err(style_error(1, 1, "Leading newlines not allowed"));
    }
    if source.ends_with('\n') {
        // The trailing '\n' opens a new empty line; report that line
        let line_no = source.chars().filter(|&c| c == '\n').count() + 1;
        return Err(style_error(line_no, 1, "Trailing newlines not allowed"));
    }
    Ok(())
}

fn validate_newlines(source: &str) -> Result<(), MetricError> {
    let mut consecutive = 0;
    let mut line_num = 1;
    for c in source.chars() {
        if c == '\n' {
            consecutive += 1;
            if consecutive > 2 {
                return Err(style_error(
                    line_num,
                    1,
                    "Too many consecutive newlines: maximum 2 allowed",
                ));
            }
            line_num += 1;
        } else {
            consecutive = 0;
        }
    }
    Ok(())
}

fn validate_line_whitespace(source: &str) -> Result<(), MetricError> {
    for (line_idx, line) in source.split('\n').enumerate() {
        let line_num = line_idx + 1;

        if line.ends_with(' ') {
            let column = line.trim_end().chars().count() + 1;
            return Err(style_error(line_num, column, "Trailing spaces not allowed"));
        }

        let leading_spaces = line.chars().take_while(|&c| c == ' ').count();
        if leading_spaces > 0 && leading_spaces % 4 != 0 {
            let first_bad_col = (leading_spaces / 4) * 4 + 1;
            return Err(style_error(
                line_num,
                first_bad_col,
                "Indentation must be in multiples of 4 spaces",
            ));
        }
    }
    Ok(())
}

fn validate_multiple_statements_per_line(source: &str) -> Result<(), MetricError> {
    for (line_idx, line) in source.split('\n').enumerate() {
        let line_num = line_idx + 1;
        let code_part = line.split('#').next().unwrap_or("");
        if code_part.trim().is_empty() {
            continue;
        }

        let mut keyword_count = 0;
        let mut current_pos = 0;
        for word in code_part.split_whitespace() {
            let word_pos = match line[current_pos..].find(word) {
                Some(offset) => current_pos + offset,
                None => continue,
            };
            if STATEMENT_KEYWORDS.contains(&word) {
                keyword_count += 1;
                if keyword_count == 2 {
                    return Err(style_error(
                        line_num,
                        word_pos + 1,
                        "Statements must be separated by a newline",
                    ));
                }
            }
            current_pos = word_pos + word.len();
        }
    }
    Ok(())
}

fn validate_token_spacing(source: &str) -> Result<(), MetricError> {
    for (line_idx, line) in source.split('\n').enumerate() {
        let line_num = line_idx + 1;
        let code_part = line.split('#').next().unwrap_or("");
        if code_part.trim().is_empty() {
            continue;
        }
        check_multiple_spaces_in_line(code_part, line_num)?;
        check_operator_spacing_in_line(code_part, line_num)?;
        check_identifier_number_spacing_in_line(code_part, line_num)?;
    }
    Ok(())
}

/// At most one space between tokens; indentation is exempt.
fn check_multiple_spaces_in_line(line: &str, line_num: usize) -> Result<(), MetricError> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = chars.iter().take_while(|&&c| c == ' ').count();

    while i + 1 < chars.len() {
        if chars[i] == ' ' && chars[i + 1] == ' ' {
            // First space of the run is the violation
            return Err(style_error(
                line_num,
                i + 1,
                "Multiple spaces not allowed between tokens",
            ));
        }
        i += 1;
    }
    Ok(())
}

fn check_operator_spacing_in_line(line: &str, line_num: usize) -> Result<(), MetricError> {
    let chars: Vec<char> = line.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if OPERATORS.contains(&c) && i > 0 && chars[i - 1].is_alphanumeric() {
            return Err(style_error(
                line_num,
                i + 1,
                format!("Expected space before operator '{}'", c),
            ));
        }
    }
    Ok(())
}

fn check_identifier_number_spacing_in_line(line: &str, line_num: usize) -> Result<(), MetricError> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_alphabetic() {
            let start = i;
            while i < chars.len() && chars[i].is_alphabetic() {
                i += 1;
            }
            if i < chars.len() && chars[i].is_alphanumeric() {
                let identifier: String = chars[start..i].iter().collect();
                return Err(style_error(
                    line_num,
                    i + 1,
                    format!("Expected space after identifier '{}'", identifier),
                ));
            }
        } else if chars[i].is_ascii_digit() {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            if i < chars.len() && chars[i].is_alphanumeric() {
                let number: String = chars[start..i].iter().collect();
                return Err(style_error(
                    line_num,
                    i + 1,
                    format!("Expected space after number '{}'", number),
                ));
            }
        } else {
            i += 1;
        }
    }
    Ok(())
}

fn validate_comment_spacing(source: &str) -> Result<(), MetricError> {
    for (line_idx, line) in source.split('\n').enumerate() {
        let line_num = line_idx + 1;
        let chars: Vec<char> = line.chars().collect();
        let comment_pos = match chars.iter().position(|&c| c == '#') {
            Some(pos) if pos > 0 => pos,
            _ => continue,
        };

        // Exactly one space between code and '#'
        if chars[comment_pos - 1] != ' ' || (comment_pos > 1 && chars[comment_pos - 2] == ' ') {
            return Err(style_error(
                line_num,
                comment_pos + 1,
                "Comments must be separated from code by exactly one space",
            ));
        }
    }
    Ok(())
}

fn validate_comma_spacing(source: &str) -> Result<(), MetricError> {
    for (line_idx, line) in source.split('\n').enumerate() {
        let line_num = line_idx + 1;
        let code_part = line.split('#').next().unwrap_or("");
        let chars: Vec<char> = code_part.chars().collect();

        for (i, &c) in chars.iter().enumerate() {
            if c != ',' {
                continue;
            }
            if i > 0 && chars[i - 1] == ' ' {
                return Err(style_error(line_num, i + 1, "Space before comma not allowed"));
            }
            if i + 1 >= chars.len() || chars[i + 1] != ' ' {
                return Err(style_error(line_num, i + 1, "Space required after comma"));
            }
        }
    }
    Ok(())
}
