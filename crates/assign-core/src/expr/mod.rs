//! Expresiones diferidas.
//!
//! Un argumento se captura como código fuente parseado (`Expr`) junto con una
//! referencia explícita a su entorno de definición (`Env`). Nada se evalúa al
//! capturar: la evaluación es siempre una llamada explícita a
//! `DeferredExpr::evaluate` con un `EvalContext`, que puede traer una tabla o
//! no traer datos (`EvalContext::detached`, usado por el validador para
//! intentar el factoring).

pub mod ast;
pub mod eval;
pub mod parser;

use std::sync::Arc;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::errors::{ParseError, RuntimeEvaluationError};
use crate::model::DataTable;

pub use ast::{BinaryOp, Expr};
pub use eval::evaluate;
pub use parser::parse_expression;

/// Entorno léxico de definición: bindings disponibles cuando el nombre no
/// es una columna de la tabla. Clonar es barato (Arc); `with` es
/// copy-on-write.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Env {
    bindings: Arc<IndexMap<String, Value>>,
}

impl Env {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Arc::make_mut(&mut self.bindings).insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Contexto de evaluación en tiempo de ejecución.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvalContext<'a> {
    table: Option<&'a DataTable>,
}

impl<'a> EvalContext<'a> {
    /// Contexto sobre una tabla: columnas como bindings y `N` = filas.
    pub fn over(table: &'a DataTable) -> Self {
        Self { table: Some(table) }
    }

    /// Contexto sin datos.
    pub fn detached() -> Self {
        Self { table: None }
    }

    pub fn table(&self) -> Option<&'a DataTable> {
        self.table
    }
}

/// Forma sintáctica de un argumento, decidida sobre el árbol y no sobre el
/// valor evaluado.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgShape {
    /// Nombre desnudo (`block`).
    Reference,
    /// Escalar constante (`0.5`, `"block"`).
    Literal,
    /// Cualquier otra cosa: vectores, llamadas, aritmética.
    Sequence,
}

/// Argumento capturado sin evaluar.
#[derive(Debug, Clone, PartialEq)]
pub struct DeferredExpr {
    source: String,
    expr: Expr,
    env: Env,
}

impl DeferredExpr {
    pub fn parse(source: &str, env: Env) -> Result<Self, ParseError> {
        let expr = parse_expression(source)?;
        Ok(Self { source: source.trim().to_string(),
                  expr,
                  env })
    }

    /// Captura un valor ya construido; un array queda como vector literal.
    pub fn from_value(value: Value, env: Env) -> Self {
        let source = value.to_string();
        let expr = match value {
            Value::Array(items) => Expr::Vector(items.into_iter().map(Expr::Literal).collect()),
            scalar => Expr::Literal(scalar),
        };
        Self { source, expr, env }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn shape(&self) -> ArgShape {
        match &self.expr {
            Expr::Symbol(_) => ArgShape::Reference,
            Expr::Literal(_) => ArgShape::Literal,
            _ => ArgShape::Sequence,
        }
    }

    /// Nombre referenciado si el argumento es una referencia desnuda.
    pub fn as_reference(&self) -> Option<&str> {
        match &self.expr {
            Expr::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn evaluate(&self, context: &EvalContext<'_>) -> Result<Value, RuntimeEvaluationError> {
        evaluate(&self.expr, &self.env, context)
    }

    /// Intenta evaluar sin datos.
    pub fn evaluate_detached(&self) -> Result<Value, RuntimeEvaluationError> {
        self.evaluate(&EvalContext::detached())
    }
}
