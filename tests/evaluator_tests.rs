// Evaluator tests over hand-built ASTs: arithmetic semantics, the cost
// model, and runtime error messages.

use metric::ast::{BinaryOp, Expr, Param, Stmt, Type};
use metric::error::{ErrorKind, MetricError};
use metric::evaluator::{evaluate_expression, execute, Environment};
use metric::value::Value;

fn int(n: i64) -> Expr {
    Expr::IntegerLiteral(n)
}

fn float(n: f64) -> Expr {
    Expr::FloatLiteral(n)
}

fn var(name: &str) -> Expr {
    Expr::Variable(name.to_string())
}

fn binary(left: Expr, operator: BinaryOp, right: Expr) -> Expr {
    Expr::Binary {
        left: Box::new(left),
        operator,
        right: Box::new(right),
    }
}

fn let_stmt(name: &str, type_annotation: Type, expression: Expr) -> Stmt {
    Stmt::Let {
        name: name.to_string(),
        type_annotation,
        expression,
    }
}

fn run_err(program: &[Stmt]) -> MetricError {
    let error = execute(program).expect_err("expected an evaluation error");
    assert_eq!(error.kind, ErrorKind::Evaluation);
    error
}

#[test]
fn division_floors_toward_negative_infinity() {
    let cases = [(-7, 2, -4), (7, 2, 3), (7, -2, -4), (-7, -2, 3)];
    for (a, b, expected) in cases {
        let (results, _) =
            execute(&[Stmt::Print(binary(int(a), BinaryOp::Divide, int(b)))]).unwrap();
        assert_eq!(results, vec![Value::Int(expected)], "{} / {}", a, b);
    }
}

#[test]
fn modulus_takes_the_divisor_sign() {
    let cases = [(-7, 2, 1), (7, 2, 1), (7, -2, -1), (-7, -2, -1)];
    for (a, b, expected) in cases {
        let (results, _) =
            execute(&[Stmt::Print(binary(int(a), BinaryOp::Modulus, int(b)))]).unwrap();
        assert_eq!(results, vec![Value::Int(expected)], "{} % {}", a, b);
    }
}

#[test]
fn arithmetic_overflow_is_an_error_not_a_panic() {
    let cases = [
        binary(int(i64::MAX), BinaryOp::Add, int(1)),
        binary(int(i64::MIN), BinaryOp::Subtract, int(1)),
        binary(int(i64::MAX), BinaryOp::Multiply, int(2)),
        binary(int(i64::MIN), BinaryOp::Divide, int(-1)),
        binary(int(i64::MIN), BinaryOp::Modulus, int(-1)),
    ];
    for expr in cases {
        let error = run_err(&[Stmt::Print(expr.clone())]);
        assert_eq!(error.message, "Integer overflow", "{:?}", expr);
    }
}

#[test]
fn large_integers_compare_exactly() {
    // 2^53 + 1 and 2^53 are equal as f64
    let (results, _) = execute(&[Stmt::Print(binary(
        int(9007199254740993),
        BinaryOp::Greater,
        int(9007199254740992),
    ))])
    .unwrap();
    assert_eq!(results, vec![Value::Bool(true)]);

    let (results, _) = execute(&[Stmt::Print(binary(
        int(i64::MIN),
        BinaryOp::Less,
        int(i64::MAX),
    ))])
    .unwrap();
    assert_eq!(results, vec![Value::Bool(true)]);
}

#[test]
fn mixed_arithmetic_produces_floats() {
    let (results, _) =
        execute(&[Stmt::Print(binary(int(7), BinaryOp::Divide, float(2.0)))]).unwrap();
    assert_eq!(results, vec![Value::Float(3.5)]);
}

#[test]
fn division_and_modulus_by_zero() {
    let error = run_err(&[Stmt::Print(binary(int(5), BinaryOp::Divide, int(0)))]);
    assert_eq!(error.message, "Division by zero");

    let error = run_err(&[Stmt::Print(binary(int(5), BinaryOp::Modulus, int(0)))]);
    assert_eq!(error.message, "Modulus by zero");
}

#[test]
fn variable_reads_cost_one() {
    let program = [
        let_stmt("x", Type::Integer, int(5)),
        Stmt::Print(var("x")),
    ];
    let (results, cost) = execute(&program).unwrap();
    assert_eq!(results, vec![Value::Int(5)]);
    // let write + read + print
    assert_eq!(cost, 3);
}

#[test]
fn literals_cost_nothing() {
    let (results, cost) = execute(&[Stmt::Print(int(5))]).unwrap();
    assert_eq!(results, vec![Value::Int(5)]);
    assert_eq!(cost, 1);
}

#[test]
fn list_construction_costs_one() {
    let program = [
        let_stmt(
            "xs",
            Type::List(Box::new(Type::Integer)),
            Expr::ListLiteral(vec![int(1), int(2), int(3)]),
        ),
        Stmt::Print(Expr::LenCall(Box::new(var("xs")))),
    ];
    let (results, cost) = execute(&program).unwrap();
    assert_eq!(results, vec![Value::Int(3)]);
    // literal + let write + read + len + print
    assert_eq!(cost, 5);
}

#[test]
fn list_access_is_bounds_checked() {
    let program = [
        let_stmt(
            "xs",
            Type::List(Box::new(Type::Integer)),
            Expr::ListLiteral(vec![int(1), int(2), int(3)]),
        ),
        Stmt::Print(Expr::ListAccess {
            list_expr: Box::new(var("xs")),
            index: Box::new(int(5)),
        }),
    ];
    let error = run_err(&program);
    assert_eq!(error.message, "List index 5 out of bounds (length 3)");
}

#[test]
fn negative_index_is_out_of_bounds() {
    let program = [
        let_stmt(
            "xs",
            Type::List(Box::new(Type::Integer)),
            Expr::ListLiteral(vec![int(1)]),
        ),
        Stmt::Print(Expr::ListAccess {
            list_expr: Box::new(var("xs")),
            index: Box::new(int(-1)),
        }),
    ];
    let error = run_err(&program);
    assert_eq!(error.message, "List index -1 out of bounds (length 1)");
}

#[test]
fn list_assignment_bounds_message() {
    let program = [
        let_stmt(
            "xs",
            Type::List(Box::new(Type::Integer)),
            Expr::ListLiteral(vec![int(1), int(2), int(3)]),
        ),
        Stmt::ListAssignment {
            list_name: "xs".to_string(),
            index: int(7),
            value: int(0),
        },
    ];
    let error = run_err(&program);
    assert_eq!(error.message, "List index 7 out of bounds (list length: 3)");
}

#[test]
fn repeat_builds_a_list() {
    let program = [Stmt::Print(Expr::RepeatCall {
        value: Box::new(Expr::BooleanLiteral(true)),
        count: Box::new(int(3)),
    })];
    let (results, _) = execute(&program).unwrap();
    assert_eq!(results, vec![Value::List(vec![Value::Bool(true); 3])]);
}

#[test]
fn repeat_count_cannot_be_negative() {
    let program = [Stmt::Print(Expr::RepeatCall {
        value: Box::new(int(1)),
        count: Box::new(int(-2)),
    })];
    let error = run_err(&program);
    assert_eq!(error.message, "Repeat count cannot be negative");
}

#[test]
fn undefined_variable_read() {
    let error = run_err(&[Stmt::Print(var("x"))]);
    assert_eq!(error.message, "Undefined variable: x");
}

#[test]
fn rebinding_a_name_fails() {
    let program = [
        let_stmt("x", Type::Integer, int(1)),
        let_stmt("x", Type::Integer, int(2)),
    ];
    let error = run_err(&program);
    assert_eq!(error.message, "Variable already bound: x");
}

#[test]
fn set_requires_an_existing_binding() {
    let error = run_err(&[Stmt::Set {
        name: "x".to_string(),
        expression: int(1),
    }]);
    assert_eq!(error.message, "Cannot set undefined variable: x");
}

#[test]
fn calling_an_undefined_function() {
    let error = run_err(&[Stmt::Print(Expr::FunctionCall {
        name: "g".to_string(),
        arguments: vec![],
    })]);
    assert_eq!(error.message, "Undefined function: g");
}

#[test]
fn function_bodies_must_reach_a_return() {
    let program = [
        Stmt::FunctionDeclaration {
            name: "f".to_string(),
            parameters: vec![],
            return_type: Type::Integer,
            body: vec![Stmt::Print(int(1))],
        },
        Stmt::Print(Expr::FunctionCall {
            name: "f".to_string(),
            arguments: vec![],
        }),
    ];
    let error = run_err(&program);
    assert_eq!(error.message, "Function 'f' did not return a value");
}

#[test]
fn return_stops_the_function_body() {
    let program = [
        Stmt::FunctionDeclaration {
            name: "f".to_string(),
            parameters: vec![Param {
                name: "n".to_string(),
                type_annotation: Type::Integer,
            }],
            return_type: Type::Integer,
            body: vec![
                Stmt::Return(var("n")),
                Stmt::Print(int(9)),
            ],
        },
        Stmt::Print(Expr::FunctionCall {
            name: "f".to_string(),
            arguments: vec![int(1)],
        }),
    ];
    let (results, _) = execute(&program).unwrap();
    assert_eq!(results, vec![Value::Int(1)]);
}

#[test]
fn short_circuit_skips_the_right_operand() {
    // The right side would fail if evaluated
    let expr = binary(Expr::BooleanLiteral(false), BinaryOp::And, var("missing"));
    let (results, cost) = execute(&[Stmt::Print(expr)]).unwrap();
    assert_eq!(results, vec![Value::Bool(false)]);
    // short-circuit result + print
    assert_eq!(cost, 2);
}

#[test]
fn runtime_condition_checks() {
    let error = run_err(&[Stmt::If {
        condition: int(1),
        body: vec![],
    }]);
    assert_eq!(error.message, "If condition must be boolean");

    let error = run_err(&[Stmt::While {
        condition: int(1),
        body: vec![],
    }]);
    assert_eq!(error.message, "While condition must be boolean");
}

#[test]
fn float_display_keeps_a_decimal_point() {
    let (results, _) = execute(&[Stmt::Print(float(5.0))]).unwrap();
    assert_eq!(results[0].to_string(), "5.0");
}

#[test]
fn expression_evaluation_against_an_environment() {
    let env = Environment::empty().add("x", Value::Int(5));
    let value = evaluate_expression(&env, &var("x")).unwrap();
    assert_eq!(value, Value::Int(5));
    assert_eq!(env.cost(), 1);
}

#[test]
fn environments_are_copy_on_write() {
    let base = Environment::empty().add("x", Value::Int(1));
    let updated = base.set("x", Value::Int(2)).unwrap();
    assert_eq!(base.find("x"), Some(&Value::Int(1)));
    assert_eq!(updated.find("x"), Some(&Value::Int(2)));
}
