use crate::ast::{BinaryOp, Expr, Stmt, Type, UnaryOp};
use crate::error::MetricError;
use std::collections::HashMap;

/// Static checker for a program. Walks the AST once, maintaining a symbol
/// table for variables and a signature table for functions.
pub struct TypeChecker {
    symbol_table: HashMap<String, Type>,
    function_table: HashMap<String, (Vec<Type>, Type)>,
    current_return_type: Option<Type>,
}

impl Default for TypeChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeChecker {
    pub fn new() -> Self {
        Self {
            symbol_table: HashMap::new(),
            function_table: HashMap::new(),
            current_return_type: None,
        }
    }

    pub fn check_program(&mut self, program: &[Stmt]) -> Result<(), MetricError> {
        for statement in program {
            self.check_statement(statement)?;
        }
        Ok(())
    }

    fn check_statement(&mut self, stmt: &Stmt) -> Result<(), MetricError> {
        match stmt {
            Stmt::Let {
                name,
                type_annotation,
                expression,
            } => {
                if self.symbol_table.contains_key(name) {
                    return Err(MetricError::type_error(format!(
                        "Variable '{}' is already declared",
                        name
                    )));
                }
                let expr_type = self.check_expression(expression)?;
                if expr_type != *type_annotation {
                    return Err(MetricError::type_error(format!(
                        "Type mismatch: cannot assign {} to variable '{}' of type {}",
                        expr_type, name, type_annotation
                    )));
                }
                self.symbol_table.insert(name.clone(), type_annotation.clone());
                Ok(())
            }
            Stmt::Set { name, expression } => {
                let var_type = match self.symbol_table.get(name) {
                    Some(t) => t.clone(),
                    None => {
                        return Err(MetricError::type_error(format!(
                            "Variable '{}' is not declared",
                            name
                        )))
                    }
                };
                let expr_type = self.check_expression(expression)?;
                if expr_type != var_type {
                    return Err(MetricError::type_error(format!(
                        "Type mismatch: cannot assign {} to variable '{}' of type {}",
                        expr_type, name, var_type
                    )));
                }
                Ok(())
            }
            Stmt::ListAssignment {
                list_name,
                index,
                value,
            } => {
                let var_type = match self.symbol_table.get(list_name) {
                    Some(t) => t.clone(),
                    None => {
                        return Err(MetricError::type_error(format!(
                            "Variable '{}' is not declared",
                            list_name
                        )))
                    }
                };
                let element_type = match var_type {
                    Type::List(element) => *element,
                    other => {
                        return Err(MetricError::type_error(format!(
                            "Cannot index into non-list variable '{}' of type {}",
                            list_name, other
                        )))
                    }
                };

                let index_type = self.check_expression(index)?;
                if index_type != Type::Integer {
                    return Err(MetricError::type_error(format!(
                        "List index must be integer, got {}",
                        index_type
                    )));
                }

                let value_type = self.check_expression(value)?;
                if value_type != element_type {
                    return Err(MetricError::type_error(format!(
                        "Type mismatch: cannot assign {} to list element of type {}",
                        value_type, element_type
                    )));
                }
                Ok(())
            }
            Stmt::Print(expression) => {
                self.check_expression(expression)?;
                Ok(())
            }
            Stmt::If { condition, body } => {
                self.check_condition(condition, "If")?;
                self.check_program(body)
            }
            Stmt::While { condition, body } => {
                self.check_condition(condition, "While")?;
                self.check_program(body)
            }
            Stmt::Comment => Ok(()),
            Stmt::FunctionDeclaration {
                name,
                parameters,
                return_type,
                body,
            } => self.check_function_declaration(name, parameters, return_type, body),
            Stmt::Return(expression) => {
                let expected = match &self.current_return_type {
                    Some(t) => t.clone(),
                    None => {
                        return Err(MetricError::type_error(
                            "Return statement must be inside a function".to_string(),
                        ))
                    }
                };
                let expr_type = self.check_expression(expression)?;
                if expr_type != expected {
                    return Err(MetricError::type_error(format!(
                        "Return type mismatch: expected {}, got {}",
                        expected, expr_type
                    )));
                }
                Ok(())
            }
        }
    }

    fn check_condition(&mut self, condition: &Expr, statement_name: &str) -> Result<(), MetricError> {
        let cond_type = self.check_expression(condition)?;
        if cond_type != Type::Boolean {
            return Err(MetricError::type_error(format!(
                "{} condition must be boolean, got {}",
                statement_name, cond_type
            )));
        }
        Ok(())
    }

    fn check_function_declaration(
        &mut self,
        name: &str,
        parameters: &[crate::ast::Param],
        return_type: &Type,
        body: &[Stmt],
    ) -> Result<(), MetricError> {
        if self.function_table.contains_key(name) {
            return Err(MetricError::type_error(format!(
                "Function '{}' is already declared",
                name
            )));
        }

        let param_types: Vec<Type> = parameters
            .iter()
            .map(|p| p.type_annotation.clone())
            .collect();
        self.function_table
            .insert(name.to_string(), (param_types, return_type.clone()));

        // Function bodies see a fresh scope seeded with the parameters;
        // the enclosing table is restored afterwards.
        let saved_symbol_table = self.symbol_table.clone();
        for param in parameters {
            if self.symbol_table.contains_key(&param.name) {
                return Err(MetricError::type_error(format!(
                    "Parameter '{}' conflicts with existing variable",
                    param.name
                )));
            }
            self.symbol_table
                .insert(param.name.clone(), param.type_annotation.clone());
        }

        let saved_return_type = self.current_return_type.take();
        self.current_return_type = Some(return_type.clone());

        let result = self.check_program(body);

        self.symbol_table = saved_symbol_table;
        self.current_return_type = saved_return_type;
        result?;

        if !contains_return(body) {
            return Err(MetricError::type_error(format!(
                "Function '{}' must have a return statement",
                name
            )));
        }

        Ok(())
    }

    fn check_expression(&mut self, expr: &Expr) -> Result<Type, MetricError> {
        match expr {
            Expr::IntegerLiteral(_) => Ok(Type::Integer),
            Expr::BooleanLiteral(_) => Ok(Type::Boolean),
            Expr::FloatLiteral(_) => Ok(Type::Float),
            Expr::Variable(name) => match self.symbol_table.get(name) {
                Some(t) => Ok(t.clone()),
                None => Err(MetricError::type_error(format!(
                    "Variable '{}' is not declared",
                    name
                ))),
            },
            Expr::Unary { operator, operand } => {
                let operand_type = self.check_expression(operand)?;
                match operator {
                    UnaryOp::Not => {
                        if operand_type != Type::Boolean {
                            return Err(MetricError::type_error(format!(
                                "Operator 'not' requires boolean operand, got {}",
                                operand_type
                            )));
                        }
                        Ok(Type::Boolean)
                    }
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left_type = self.check_expression(left)?;
                let right_type = self.check_expression(right)?;
                self.check_binary_op(*operator, &left_type, &right_type)
            }
            Expr::FunctionCall { name, arguments } => {
                let (param_types, return_type) = match self.function_table.get(name) {
                    Some(signature) => signature.clone(),
                    None => {
                        return Err(MetricError::type_error(format!(
                            "Function '{}' is not declared",
                            name
                        )))
                    }
                };

                if arguments.len() != param_types.len() {
                    return Err(MetricError::type_error(format!(
                        "Function '{}' expects {} arguments, got {}",
                        name,
                        param_types.len(),
                        arguments.len()
                    )));
                }

                // No implicit widening at call boundaries: integer does not
                // promote to float here the way arithmetic does.
                for (i, (argument, expected)) in arguments.iter().zip(&param_types).enumerate() {
                    let arg_type = self.check_expression(argument)?;
                    if arg_type != *expected {
                        return Err(MetricError::type_error(format!(
                            "Argument {} to function '{}': expected {}, got {}",
                            i + 1,
                            name,
                            expected,
                            arg_type
                        )));
                    }
                }

                Ok(return_type)
            }
            Expr::ListLiteral(elements) => {
                if elements.is_empty() {
                    return Err(MetricError::type_error(
                        "Cannot infer type of empty list literal".to_string(),
                    ));
                }

                let first_type = self.check_expression(&elements[0])?;
                for (i, element) in elements.iter().enumerate().skip(1) {
                    let element_type = self.check_expression(element)?;
                    if element_type != first_type {
                        return Err(MetricError::type_error(format!(
                            "List elements must be homogeneous: element 0 is {}, element {} is {}",
                            first_type, i, element_type
                        )));
                    }
                }

                if first_type.is_list() {
                    return Err(MetricError::type_error(
                        "Nested lists are not supported".to_string(),
                    ));
                }

                Ok(Type::List(Box::new(first_type)))
            }
            Expr::ListAccess { list_expr, index } => {
                let list_type = self.check_expression(list_expr)?;
                let element_type = match list_type {
                    Type::List(element) => *element,
                    other => {
                        return Err(MetricError::type_error(format!(
                            "Cannot index into non-list expression of type {}",
                            other
                        )))
                    }
                };

                let index_type = self.check_expression(index)?;
                if index_type != Type::Integer {
                    return Err(MetricError::type_error(format!(
                        "List index must be integer, got {}",
                        index_type
                    )));
                }

                Ok(element_type)
            }
            Expr::RepeatCall { value, count } => {
                let value_type = self.check_expression(value)?;
                if value_type.is_list() {
                    return Err(MetricError::type_error(
                        "Cannot repeat a list value".to_string(),
                    ));
                }

                let count_type = self.check_expression(count)?;
                if count_type != Type::Integer {
                    return Err(MetricError::type_error(format!(
                        "Repeat count must be integer, got {}",
                        count_type
                    )));
                }

                Ok(Type::List(Box::new(value_type)))
            }
            Expr::LenCall(list_expr) => {
                let list_type = self.check_expression(list_expr)?;
                if !list_type.is_list() {
                    return Err(MetricError::type_error(format!(
                        "Cannot get length of non-list expression of type {}",
                        list_type
                    )));
                }
                Ok(Type::Integer)
            }
        }
    }

    fn check_binary_op(
        &self,
        operator: BinaryOp,
        left_type: &Type,
        right_type: &Type,
    ) -> Result<Type, MetricError> {
        match operator {
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
                self.require_numeric(operator, left_type, right_type)?;
                // Promotion: float wins when either side is float
                if *left_type == Type::Float || *right_type == Type::Float {
                    Ok(Type::Float)
                } else {
                    Ok(Type::Integer)
                }
            }
            BinaryOp::Modulus => {
                if *left_type != Type::Integer || *right_type != Type::Integer {
                    return Err(MetricError::type_error(format!(
                        "Operator {} requires integer operands",
                        operator
                    )));
                }
                Ok(Type::Integer)
            }
            BinaryOp::Less | BinaryOp::Greater | BinaryOp::LessEqual | BinaryOp::GreaterEqual => {
                self.require_numeric(operator, left_type, right_type)?;
                Ok(Type::Boolean)
            }
            BinaryOp::Equal | BinaryOp::NotEqual => {
                if left_type != right_type {
                    return Err(MetricError::type_error(format!(
                        "Operator {} requires operands of same type",
                        operator
                    )));
                }
                Ok(Type::Boolean)
            }
            BinaryOp::And | BinaryOp::Or => {
                if *left_type != Type::Boolean || *right_type != Type::Boolean {
                    return Err(MetricError::type_error(format!(
                        "Operator {} requires boolean operands",
                        operator
                    )));
                }
                Ok(Type::Boolean)
            }
        }
    }

    fn require_numeric(
        &self,
        operator: BinaryOp,
        left_type: &Type,
        right_type: &Type,
    ) -> Result<(), MetricError> {
        if !left_type.is_numeric() || !right_type.is_numeric() {
            return Err(MetricError::type_error(format!(
                "Operator {} requires numeric operands",
                operator
            )));
        }
        Ok(())
    }
}

/// True when a statement sequence contains a `return`, looking inside
/// nested `if`/`while` bodies as well.
fn contains_return(statements: &[Stmt]) -> bool {
    statements.iter().any(|stmt| match stmt {
        Stmt::Return(_) => true,
        Stmt::If { body, .. } | Stmt::While { body, .. } => contains_return(body),
        _ => false,
    })
}

/// Type check a parsed program.
pub fn type_check(program: &[Stmt]) -> Result<(), MetricError> {
    TypeChecker::new().check_program(program)
}
