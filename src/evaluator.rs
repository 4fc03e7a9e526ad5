use crate::ast::{BinaryOp, Expr, Param, Stmt, UnaryOp};
use crate::error::MetricError;
use crate::value::Value;
use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

/// A user-defined function as registered at execution time.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub name: String,
    pub parameters: Vec<Param>,
    pub body: Vec<Stmt>,
}

/// Persistent environment mapping names to runtime values and functions.
///
/// Bindings are copy-on-write: every mutation returns a fresh `Environment`.
/// The operation-cost counter is the one piece of shared state; each derived
/// environment holds the same `Rc<Cell<i64>>`, so every scope sees one
/// running total.
#[derive(Debug, Clone)]
pub struct Environment {
    values: HashMap<String, Value>,
    functions: HashMap<String, Function>,
    cost: Rc<Cell<i64>>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::empty()
    }
}

impl Environment {
    pub fn empty() -> Self {
        Self {
            values: HashMap::new(),
            functions: HashMap::new(),
            cost: Rc::new(Cell::new(0)),
        }
    }

    /// Fresh bindings for a function call: no variables, but the caller's
    /// function table and cost counter carry over.
    fn child(&self) -> Self {
        Self {
            values: HashMap::new(),
            functions: self.functions.clone(),
            cost: Rc::clone(&self.cost),
        }
    }

    pub fn increment_cost(&self) {
        self.cost.set(self.cost.get() + 1);
    }

    pub fn cost(&self) -> i64 {
        self.cost.get()
    }

    pub fn add(&self, name: &str, value: Value) -> Environment {
        let mut next = self.clone();
        next.values.insert(name.to_string(), value);
        next
    }

    pub fn set(&self, name: &str, value: Value) -> Result<Environment, MetricError> {
        if !self.values.contains_key(name) {
            return Err(MetricError::eval_error(format!(
                "Variable not found: {}",
                name
            )));
        }
        let mut next = self.clone();
        next.values.insert(name.to_string(), value);
        Ok(next)
    }

    pub fn set_list_element(
        &self,
        name: &str,
        index: i64,
        value: Value,
    ) -> Result<Environment, MetricError> {
        let current = self.values.get(name).ok_or_else(|| {
            MetricError::eval_error(format!("Variable not found: {}", name))
        })?;
        let elements = match current {
            Value::List(elements) => elements,
            _ => {
                return Err(MetricError::eval_error(format!(
                    "Variable '{}' is not a list",
                    name
                )))
            }
        };
        if index < 0 || index as usize >= elements.len() {
            return Err(MetricError::eval_error(format!(
                "List index {} out of bounds (list length: {})",
                index,
                elements.len()
            )));
        }
        if !value.is_scalar() {
            return Err(MetricError::eval_error(
                "Cannot assign list to list element".to_string(),
            ));
        }

        let mut new_list = elements.clone();
        new_list[index as usize] = value;
        let mut next = self.clone();
        next.values.insert(name.to_string(), Value::List(new_list));
        Ok(next)
    }

    pub fn add_function(&self, function: Function) -> Environment {
        let mut next = self.clone();
        next.functions.insert(function.name.clone(), function);
        next
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn find(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn mem(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

/// Result of running one statement: either the environment flows on to the
/// next statement, or a `return` short-circuits out of the enclosing call.
#[derive(Debug)]
pub enum Flow {
    Continue(Environment),
    Return(Value),
}

// ---------------------------------------------------------------------------
// expression evaluation
// ---------------------------------------------------------------------------

fn ensure_numeric(value: &Value) -> Result<(), MetricError> {
    match value {
        Value::Int(_) | Value::Float(_) => Ok(()),
        other => Err(MetricError::eval_error(format!(
            "Expected number, got {}",
            other.type_name()
        ))),
    }
}

fn ensure_boolean(value: &Value) -> Result<bool, MetricError> {
    match value {
        Value::Bool(b) => Ok(*b),
        other => Err(MetricError::eval_error(format!(
            "Expected boolean, got {}",
            other.type_name()
        ))),
    }
}

fn ensure_integer(value: &Value) -> Result<i64, MetricError> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(MetricError::eval_error(format!(
            "Expected integer, got {}",
            other.type_name()
        ))),
    }
}

/// Floored quotient, matching the language's integer division semantics
/// (`-7 / 2` is `-4`, not `-3`). `None` when the quotient is not
/// representable (`i64::MIN / -1`).
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let quotient = a.checked_div(b)?;
    if a % b != 0 && (a < 0) != (b < 0) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}

/// Remainder paired with `floor_div`: the result takes the divisor's sign.
fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let remainder = a.checked_rem(b)?;
    if remainder != 0 && (remainder < 0) != (b < 0) {
        Some(remainder + b)
    } else {
        Some(remainder)
    }
}

fn overflow() -> MetricError {
    MetricError::eval_error("Integer overflow".to_string())
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(n) => *n,
        _ => 0.0,
    }
}

pub fn evaluate_expression(env: &Environment, expr: &Expr) -> Result<Value, MetricError> {
    match expr {
        // Literals cost nothing
        Expr::IntegerLiteral(n) => Ok(Value::Int(*n)),
        Expr::FloatLiteral(n) => Ok(Value::Float(*n)),
        Expr::BooleanLiteral(b) => Ok(Value::Bool(*b)),

        Expr::Variable(name) => {
            env.increment_cost();
            match env.find(name) {
                Some(value) => Ok(value.clone()),
                None => Err(MetricError::eval_error(format!(
                    "Undefined variable: {}",
                    name
                ))),
            }
        }

        Expr::Unary { operator, operand } => {
            let operand_val = evaluate_expression(env, operand)?;
            env.increment_cost();
            match operator {
                UnaryOp::Not => Ok(Value::Bool(!ensure_boolean(&operand_val)?)),
            }
        }

        Expr::Binary {
            left,
            operator,
            right,
        } => evaluate_binary(env, left, *operator, right),

        Expr::FunctionCall { name, arguments } => evaluate_function_call(env, name, arguments),

        Expr::ListLiteral(elements) => {
            // Construction costs 1; elements pay their own way inside
            env.increment_cost();
            let mut result = Vec::with_capacity(elements.len());
            for element in elements {
                let element_val = evaluate_expression(env, element)?;
                if !element_val.is_scalar() {
                    return Err(MetricError::eval_error(format!(
                        "List elements must be integer, boolean, or float, got {}",
                        element_val.type_name()
                    )));
                }
                result.push(element_val);
            }
            Ok(Value::List(result))
        }

        Expr::ListAccess { list_expr, index } => {
            let list_val = evaluate_expression(env, list_expr)?;
            let index_val = evaluate_expression(env, index)?;
            let elements = match &list_val {
                Value::List(elements) => elements,
                _ => {
                    return Err(MetricError::eval_error(
                        "Cannot index into non-list value".to_string(),
                    ))
                }
            };
            let idx = match index_val {
                Value::Int(n) => n,
                _ => {
                    return Err(MetricError::eval_error(
                        "List index must be integer".to_string(),
                    ))
                }
            };
            if idx < 0 || idx as usize >= elements.len() {
                return Err(MetricError::eval_error(format!(
                    "List index {} out of bounds (length {})",
                    idx,
                    elements.len()
                )));
            }
            env.increment_cost();
            Ok(elements[idx as usize].clone())
        }

        Expr::RepeatCall { value, count } => {
            let value_val = evaluate_expression(env, value)?;
            let count_val = evaluate_expression(env, count)?;
            let count = match count_val {
                Value::Int(n) => n,
                _ => {
                    return Err(MetricError::eval_error(
                        "Repeat count must be integer".to_string(),
                    ))
                }
            };
            if count < 0 {
                return Err(MetricError::eval_error(
                    "Repeat count cannot be negative".to_string(),
                ));
            }
            if !value_val.is_scalar() {
                return Err(MetricError::eval_error(format!(
                    "Repeat value must be integer, boolean, or float, got {}",
                    value_val.type_name()
                )));
            }
            env.increment_cost();
            Ok(Value::List(vec![value_val; count as usize]))
        }

        Expr::LenCall(list_expr) => {
            let list_val = evaluate_expression(env, list_expr)?;
            let elements = match &list_val {
                Value::List(elements) => elements,
                other => {
                    return Err(MetricError::eval_error(format!(
                        "Expected list, got {}",
                        other.type_name()
                    )))
                }
            };
            env.increment_cost();
            Ok(Value::Int(elements.len() as i64))
        }
    }
}

fn evaluate_binary(
    env: &Environment,
    left: &Expr,
    operator: BinaryOp,
    right: &Expr,
) -> Result<Value, MetricError> {
    let left_val = evaluate_expression(env, left)?;

    // Short-circuit logic: the skipped branch still costs 1 for producing
    // the short-circuited result.
    if operator == BinaryOp::And {
        let left_bool = ensure_boolean(&left_val)?;
        if !left_bool {
            env.increment_cost();
            return Ok(Value::Bool(false));
        }
        let right_val = evaluate_expression(env, right)?;
        let right_bool = ensure_boolean(&right_val)?;
        env.increment_cost();
        return Ok(Value::Bool(left_bool && right_bool));
    }
    if operator == BinaryOp::Or {
        let left_bool = ensure_boolean(&left_val)?;
        if left_bool {
            env.increment_cost();
            return Ok(Value::Bool(true));
        }
        let right_val = evaluate_expression(env, right)?;
        let right_bool = ensure_boolean(&right_val)?;
        env.increment_cost();
        return Ok(Value::Bool(left_bool || right_bool));
    }

    let right_val = evaluate_expression(env, right)?;
    env.increment_cost();

    match operator {
        BinaryOp::Add => arithmetic(&left_val, &right_val, i64::checked_add, |a, b| a + b),
        BinaryOp::Subtract => arithmetic(&left_val, &right_val, i64::checked_sub, |a, b| a - b),
        BinaryOp::Multiply => arithmetic(&left_val, &right_val, i64::checked_mul, |a, b| a * b),
        BinaryOp::Divide => {
            ensure_numeric(&left_val)?;
            ensure_numeric(&right_val)?;
            if as_f64(&right_val) == 0.0 {
                return Err(MetricError::eval_error("Division by zero".to_string()));
            }
            match (&left_val, &right_val) {
                (Value::Int(a), Value::Int(b)) => {
                    floor_div(*a, *b).map(Value::Int).ok_or_else(overflow)
                }
                _ => Ok(Value::Float(as_f64(&left_val) / as_f64(&right_val))),
            }
        }
        BinaryOp::Modulus => {
            ensure_numeric(&left_val)?;
            ensure_numeric(&right_val)?;
            if as_f64(&right_val) == 0.0 {
                return Err(MetricError::eval_error("Modulus by zero".to_string()));
            }
            match (&left_val, &right_val) {
                (Value::Int(a), Value::Int(b)) => {
                    floor_mod(*a, *b).map(Value::Int).ok_or_else(overflow)
                }
                _ => {
                    let a = as_f64(&left_val);
                    let b = as_f64(&right_val);
                    Ok(Value::Float(a - (a / b).floor() * b))
                }
            }
        }
        BinaryOp::Less => comparison(&left_val, &right_val, Ordering::is_lt),
        BinaryOp::Greater => comparison(&left_val, &right_val, Ordering::is_gt),
        BinaryOp::LessEqual => comparison(&left_val, &right_val, Ordering::is_le),
        BinaryOp::GreaterEqual => comparison(&left_val, &right_val, Ordering::is_ge),
        BinaryOp::Equal => Ok(Value::Bool(left_val == right_val)),
        BinaryOp::NotEqual => Ok(Value::Bool(left_val != right_val)),
        BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
    }
}

fn arithmetic(
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, MetricError> {
    ensure_numeric(left)?;
    ensure_numeric(right)?;
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_op(*a, *b).map(Value::Int).ok_or_else(overflow),
        _ => Ok(Value::Float(float_op(as_f64(left), as_f64(right)))),
    }
}

/// Integer pairs compare exactly; anything involving a float goes through
/// `f64`, where an incomparable result (NaN) is false.
fn comparison(
    left: &Value,
    right: &Value,
    op: fn(Ordering) -> bool,
) -> Result<Value, MetricError> {
    ensure_numeric(left)?;
    ensure_numeric(right)?;
    let ordering = match (left, right) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        _ => as_f64(left).partial_cmp(&as_f64(right)),
    };
    Ok(Value::Bool(ordering.is_some_and(op)))
}

fn evaluate_function_call(
    env: &Environment,
    name: &str,
    arguments: &[Expr],
) -> Result<Value, MetricError> {
    if !env.has_function(name) {
        return Err(MetricError::eval_error(format!(
            "Undefined function: {}",
            name
        )));
    }

    // Arguments first, left to right; their costs accumulate on their own
    let mut arg_vals = Vec::with_capacity(arguments.len());
    for argument in arguments {
        arg_vals.push(evaluate_expression(env, argument)?);
    }

    // The call itself
    env.increment_cost();

    let function = env.functions[name].clone();
    let mut func_env = env.child();
    for (param, arg_val) in function.parameters.iter().zip(arg_vals) {
        func_env = func_env.add(&param.name, arg_val);
    }

    // Print output inside a function still goes to stdout, but is not
    // collected into the program's print results.
    let mut discarded = Vec::new();
    for stmt in &function.body {
        match execute_statement(func_env, stmt, &mut discarded)? {
            Flow::Continue(next) => func_env = next,
            Flow::Return(value) => return Ok(value),
        }
    }

    Err(MetricError::eval_error(format!(
        "Function '{}' did not return a value",
        name
    )))
}

// ---------------------------------------------------------------------------
// statement execution
// ---------------------------------------------------------------------------

pub fn execute_statement(
    env: Environment,
    stmt: &Stmt,
    out: &mut Vec<Value>,
) -> Result<Flow, MetricError> {
    match stmt {
        Stmt::Let { name, expression, .. } => {
            if env.mem(name) {
                return Err(MetricError::eval_error(format!(
                    "Variable already bound: {}",
                    name
                )));
            }
            let value = evaluate_expression(&env, expression)?;
            let env = env.add(name, value);
            env.increment_cost();
            Ok(Flow::Continue(env))
        }

        Stmt::Print(expression) => {
            let value = evaluate_expression(&env, expression)?;
            env.increment_cost();
            println!("{}", value);
            out.push(value);
            Ok(Flow::Continue(env))
        }

        Stmt::Set { name, expression } => {
            if !env.mem(name) {
                return Err(MetricError::eval_error(format!(
                    "Cannot set undefined variable: {}",
                    name
                )));
            }
            let value = evaluate_expression(&env, expression)?;
            let env = env.set(name, value)?;
            env.increment_cost();
            Ok(Flow::Continue(env))
        }

        Stmt::ListAssignment {
            list_name,
            index,
            value,
        } => {
            if !env.mem(list_name) {
                return Err(MetricError::eval_error(format!(
                    "Cannot set undefined variable: {}",
                    list_name
                )));
            }
            let index_val = evaluate_expression(&env, index)?;
            let idx = ensure_integer(&index_val)
                .map_err(|_| MetricError::eval_error("List index must be integer".to_string()))?;
            let element_val = evaluate_expression(&env, value)?;
            let env = env.set_list_element(list_name, idx, element_val)?;
            env.increment_cost();
            Ok(Flow::Continue(env))
        }

        Stmt::If { condition, body } => {
            let cond_val = evaluate_expression(&env, condition)?;
            let cond = ensure_boolean(&cond_val)
                .map_err(|_| MetricError::eval_error("If condition must be boolean".to_string()))?;
            env.increment_cost(); // condition test
            if !cond {
                return Ok(Flow::Continue(env));
            }
            // No block scope: bindings made in the body survive it
            let mut current = env;
            for body_stmt in body {
                match execute_statement(current, body_stmt, out)? {
                    Flow::Continue(next) => current = next,
                    flow => return Ok(flow),
                }
            }
            Ok(Flow::Continue(current))
        }

        Stmt::While { condition, body } => {
            let mut current = env;
            loop {
                let cond_val = evaluate_expression(&current, condition)?;
                let cond = ensure_boolean(&cond_val).map_err(|_| {
                    MetricError::eval_error("While condition must be boolean".to_string())
                })?;
                current.increment_cost(); // every test, the failing one included
                if !cond {
                    break;
                }
                for body_stmt in body {
                    match execute_statement(current, body_stmt, out)? {
                        Flow::Continue(next) => current = next,
                        flow => return Ok(flow),
                    }
                }
            }
            Ok(Flow::Continue(current))
        }

        Stmt::Comment => Ok(Flow::Continue(env)),

        Stmt::FunctionDeclaration {
            name,
            parameters,
            body,
            ..
        } => {
            if env.has_function(name) {
                return Err(MetricError::eval_error(format!(
                    "Function already declared: {}",
                    name
                )));
            }
            let env = env.add_function(Function {
                name: name.clone(),
                parameters: parameters.clone(),
                body: body.clone(),
            });
            Ok(Flow::Continue(env))
        }

        Stmt::Return(expression) => {
            let value = evaluate_expression(&env, expression)?;
            Ok(Flow::Return(value))
        }
    }
}

/// Execute a type-checked program from an empty environment.
///
/// Returns every value a top-level `print` produced, in order, together
/// with the total operation cost.
pub fn execute(program: &[Stmt]) -> Result<(Vec<Value>, i64), MetricError> {
    let mut env = Environment::empty();
    let mut results = Vec::new();

    for statement in program {
        match execute_statement(env, statement, &mut results)? {
            Flow::Continue(next) => env = next,
            Flow::Return(_) => {
                return Err(MetricError::eval_error(
                    "Return statement outside of function".to_string(),
                ))
            }
        }
    }

    Ok((results, env.cost()))
}
