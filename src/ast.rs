use std::fmt;

/// Static types. Lists wrap a scalar element type only; the checker rejects
/// nesting, so the `Box` never holds another `List` after a successful check.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Integer,
    Boolean,
    Float,
    List(Box<Type>),
}

impl Type {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Integer | Type::Float)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Type::List(_))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Type::Integer => write!(f, "integer"),
            Type::Boolean => write!(f, "boolean"),
            Type::Float => write!(f, "float"),
            Type::List(element) => write!(f, "list of {}", element),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulus => "%",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        };
        write!(f, "{}", symbol)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntegerLiteral(i64),
    FloatLiteral(f64),
    BooleanLiteral(bool),
    Variable(String),
    Unary {
        operator: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        left: Box<Expr>,
        operator: BinaryOp,
        right: Box<Expr>,
    },
    FunctionCall {
        name: String,
        arguments: Vec<Expr>,
    },
    ListLiteral(Vec<Expr>),
    ListAccess {
        list_expr: Box<Expr>,
        index: Box<Expr>,
    },
    RepeatCall {
        value: Box<Expr>,
        count: Box<Expr>,
    },
    LenCall(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_annotation: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        name: String,
        type_annotation: Type,
        expression: Expr,
    },
    Set {
        name: String,
        expression: Expr,
    },
    ListAssignment {
        list_name: String,
        index: Expr,
        value: Expr,
    },
    Print(Expr),
    If {
        condition: Expr,
        body: Vec<Stmt>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    Comment,
    FunctionDeclaration {
        name: String,
        parameters: Vec<Param>,
        return_type: Type,
        body: Vec<Stmt>,
    },
    Return(Expr),
}

/// A program is an ordered sequence of top-level statements.
pub type Program = Vec<Stmt>;
