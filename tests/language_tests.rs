// End-to-end pipeline tests: source text through tokenizer, style linter,
// parser, type checker, and evaluator, asserting on the values printed and
// the operation cost.

use metric::error::{ErrorKind, MetricError};
use metric::value::Value;

fn run(source: &str) -> Result<(Vec<Value>, i64), MetricError> {
    let tokens = metric::tokenize(source)?;
    metric::validate_style(source, &tokens)?;
    let program = metric::parse(tokens)?;
    metric::type_check(&program)?;
    metric::execute(&program)
}

fn run_ok(source: &str) -> (Vec<Value>, i64) {
    match run(source) {
        Ok(result) => result,
        Err(error) => panic!("program failed: {}", error),
    }
}

#[test]
fn integer_arithmetic_and_cost() {
    let (results, cost) = run_ok("let x integer = 5\nlet y integer = 10\nprint x + y");
    assert_eq!(results, vec![Value::Int(15)]);
    // 2 variable reads + 1 binop + 2 let writes + 1 print
    assert_eq!(cost, 6);
}

#[test]
fn list_element_assignment() {
    let (results, cost) = run_ok("let nums list of integer = [1, 2, 3]\nset nums[1] = 99\nprint nums");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].to_string(), "[1, 99, 3]");
    assert_eq!(cost, 5);
}

#[test]
fn if_taken_branch_prints() {
    let (results, _) = run_ok("let n integer = 5\nif n > 3\n    print n");
    assert_eq!(results, vec![Value::Int(5)]);
}

#[test]
fn if_skipped_branch_prints_nothing() {
    let (results, _) = run_ok("let n integer = 2\nif n > 3\n    print n");
    assert!(results.is_empty());
}

#[test]
fn function_call_and_cost() {
    let (results, cost) =
        run_ok("def add(x integer, y integer) returns integer\n    return x + y\nprint add(3, 4)");
    assert_eq!(results, vec![Value::Int(7)]);
    // call + 2 parameter reads + 1 binop + 1 print
    assert_eq!(cost, 5);
}

#[test]
fn malformed_indentation_is_a_tokenizer_error() {
    let error = run("let x integer = 5\n   print x").unwrap_err();
    assert_eq!(error.kind, ErrorKind::Tokenizer);
    assert!(error.message.contains("Invalid indentation"));
}

#[test]
fn out_of_bounds_access_fails_at_runtime() {
    let source = "let nums list of integer = [1, 2, 3]\nprint nums[5]";

    // The program is statically valid
    let tokens = metric::tokenize(source).unwrap();
    let program = metric::parse(tokens).unwrap();
    assert!(metric::type_check(&program).is_ok());

    let error = run(source).unwrap_err();
    assert_eq!(error.kind, ErrorKind::Evaluation);
    assert!(error.message.contains("out of bounds"));
}

#[test]
fn integer_division_floors() {
    let (results, _) = run_ok("print -7 / 2");
    assert_eq!(results, vec![Value::Int(-4)]);

    let (results, _) = run_ok("print 7 / 2");
    assert_eq!(results, vec![Value::Int(3)]);
}

#[test]
fn modulus_follows_floor_division() {
    let (results, _) = run_ok("print -7 % 2");
    assert_eq!(results, vec![Value::Int(1)]);
}

#[test]
fn float_promotion_and_display() {
    let (results, _) = run_ok("let x float = 2.5\nprint x * 2");
    assert_eq!(results[0].to_string(), "5.0");

    let (results, _) = run_ok("print 7.0 / 2");
    assert_eq!(results[0].to_string(), "3.5");
}

#[test]
fn and_short_circuits() {
    let (results, cost) = run_ok("let x boolean = false\nprint x and true");
    assert_eq!(results, vec![Value::Bool(false)]);
    // let write + variable read + short-circuit result + print
    assert_eq!(cost, 4);
}

#[test]
fn or_short_circuits() {
    let (results, cost) = run_ok("let x boolean = true\nprint x or false");
    assert_eq!(results, vec![Value::Bool(true)]);
    assert_eq!(cost, 4);
}

#[test]
fn while_loop_counts_every_condition_test() {
    let (results, cost) = run_ok("let i integer = 0\nwhile i < 3\n    set i = i + 1\nprint i");
    assert_eq!(results, vec![Value::Int(3)]);
    // let: 1
    // 4 condition tests (3 true, 1 false) at 3 each: read + binop + test
    // 3 body runs at 3 each: read + binop + set write
    // print: read + print
    assert_eq!(cost, 24);
}

#[test]
fn prints_inside_functions_are_not_collected() {
    let (results, cost) = run_ok(
        "def f(n integer) returns integer\n    print n\n    return n + 1\nprint f(41)",
    );
    assert_eq!(results, vec![Value::Int(42)]);
    assert_eq!(cost, 6);
}

#[test]
fn if_body_bindings_leak_into_enclosing_scope() {
    let (results, _) = run_ok("let n integer = 5\nif n > 3\n    let m integer = 1\nprint m");
    assert_eq!(results, vec![Value::Int(1)]);
}

#[test]
fn second_let_in_loop_body_fails() {
    let error = run("let i integer = 0\nwhile i < 2\n    let x integer = 1\n    set i = i + 1")
        .unwrap_err();
    assert_eq!(error.kind, ErrorKind::Evaluation);
    assert_eq!(error.message, "Variable already bound: x");
}

#[test]
fn integer_overflow_fails_at_runtime() {
    let error = run("print 9223372036854775807 + 1").unwrap_err();
    assert_eq!(error.kind, ErrorKind::Evaluation);
    assert_eq!(error.message, "Integer overflow");

    let error = run("print -9223372036854775808 / -1").unwrap_err();
    assert_eq!(error.kind, ErrorKind::Evaluation);
    assert_eq!(error.message, "Integer overflow");
}

#[test]
fn large_integer_comparison_is_exact() {
    let (results, _) = run_ok("print 9007199254740993 > 9007199254740992");
    assert_eq!(results, vec![Value::Bool(true)]);
}

#[test]
fn division_by_zero_fails() {
    let error = run("print 5 / 0").unwrap_err();
    assert_eq!(error.kind, ErrorKind::Evaluation);
    assert_eq!(error.message, "Division by zero");
}

#[test]
fn repeat_and_len() {
    let (results, _) = run_ok("let xs list of integer = repeat(0, 3)\nprint len(xs)");
    assert_eq!(results, vec![Value::Int(3)]);
}

#[test]
fn style_failure_aborts_before_parsing() {
    let error = run("let x integer = 5 ").unwrap_err();
    assert_eq!(error.kind, ErrorKind::Style);
    assert_eq!(error.message, "Trailing spaces not allowed");
    assert_eq!(
        error.to_string(),
        "[Line 1, Column 18] Style Error | Trailing spaces not allowed"
    );
}

#[test]
fn empty_program_is_rejected_by_the_linter() {
    let error = run("").unwrap_err();
    assert_eq!(error.kind, ErrorKind::Style);
    assert_eq!(error.message, "Program must not be empty");
}

#[test]
fn undeclared_variable_is_a_static_error() {
    let error = run("print x").unwrap_err();
    assert_eq!(error.kind, ErrorKind::TypeCheck);
    assert_eq!(error.message, "Variable 'x' is not declared");
    assert_eq!(error.to_string(), "TypeCheck Error | Variable 'x' is not declared");
}

#[test]
fn comments_execute_as_no_ops() {
    let (results, cost) = run_ok("# compute\nlet x integer = 2 # two\nprint x");
    assert_eq!(results, vec![Value::Int(2)]);
    assert_eq!(cost, 3);
}

#[test]
fn tokenizer_error_display_carries_position() {
    let error = run("let x integer = 5\n   print x").unwrap_err();
    assert_eq!(
        error.to_string(),
        "[Line 2, Column 1] Tokenizer Error | Invalid indentation: expected multiples of 4 spaces"
    );
}
