use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Árbol de una expresión diferida. No se evalúa al construirse.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Escalar constante (número, string, bool, null).
    Literal(Value),
    /// Nombre a resolver contra la tabla, `N` o el entorno de definición.
    Symbol(String),
    /// `[a, b, ...]`: se aplana como `c(...)`.
    Vector(Vec<Expr>),
    Neg(Box<Expr>),
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Call { function: String, args: Vec<Expr> },
}
