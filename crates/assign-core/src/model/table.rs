//! Tabla de datos columnar, inmutable y copy-on-write.
//!
//! Las celdas son `serde_json::Value` (el core no interpreta su semántica).
//! Cada columna vive detrás de un `Arc`, de modo que `with_column` devuelve
//! una tabla nueva que comparte las columnas no tocadas con la original. La
//! tabla de entrada de un step nunca se modifica.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::TableError;

/// Columna compartida.
pub type Column = Arc<[Value]>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataTable {
    columns: IndexMap<String, Column>,
    n_rows: usize,
}

impl DataTable {
    /// Tabla sin columnas ni filas.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tabla sin columnas con `n_rows` filas (sólo expone `N`).
    pub fn with_rows(n_rows: usize) -> Self {
        Self { columns: IndexMap::new(),
               n_rows }
    }

    /// Construye una tabla a partir de columnas en orden. Todas deben tener
    /// la misma longitud; la primera fija el número de filas.
    pub fn from_columns<I, S>(columns: I) -> Result<Self, TableError>
        where I: IntoIterator<Item = (S, Vec<Value>)>,
              S: Into<String>
    {
        let mut table = Self::new();
        for (i, (name, values)) in columns.into_iter().enumerate() {
            let name = name.into();
            if i == 0 {
                table.n_rows = values.len();
            }
            if table.columns.contains_key(&name) {
                return Err(TableError::DuplicateColumn(name));
            }
            table.check_length(&name, values.len())?;
            table.columns.insert(name, Arc::from(values));
        }
        Ok(table)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Nombres de columnas en orden de inserción.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Devuelve una tabla nueva con `name` añadida al final. Si la columna ya
    /// existe, se reemplazan sus valores conservando su posición.
    pub fn with_column(&self, name: impl Into<String>, values: Vec<Value>) -> Result<Self, TableError> {
        let name = name.into();
        self.check_length(&name, values.len())?;
        let mut next = self.clone();
        next.columns.insert(name, Arc::from(values));
        Ok(next)
    }

    fn check_length(&self, name: &str, found: usize) -> Result<(), TableError> {
        if found != self.n_rows {
            return Err(TableError::ColumnLength { column: name.to_string(),
                                                  expected: self.n_rows,
                                                  found });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> DataTable {
        DataTable::from_columns(vec![("id", vec![json!(1), json!(2), json!(3)]),
                                     ("block", vec![json!("a"), json!("a"), json!("b")])]).expect("valid table")
    }

    #[test]
    fn with_column_is_copy_on_write() {
        let base = sample();
        let next = base.with_column("Z", vec![json!(0), json!(1), json!(0)]).expect("append");
        assert_eq!(base.n_cols(), 2);
        assert_eq!(next.n_cols(), 3);
        assert!(Arc::ptr_eq(base.column("id").unwrap(), next.column("id").unwrap()));
        assert_eq!(next.column_names().collect::<Vec<_>>(), vec!["id", "block", "Z"]);
    }

    #[test]
    fn replacing_keeps_position() {
        let next = sample().with_column("id", vec![json!(7), json!(8), json!(9)]).expect("replace");
        assert_eq!(next.column_names().collect::<Vec<_>>(), vec!["id", "block"]);
        assert_eq!(next.column("id").unwrap()[0], json!(7));
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = DataTable::from_columns(vec![("a", vec![json!(1)]), ("b", vec![json!(1), json!(2)])]).unwrap_err();
        assert_eq!(err, TableError::ColumnLength { column: "b".into(), expected: 1, found: 2 });
        let err = sample().with_column("Z", vec![json!(0)]).unwrap_err();
        assert!(matches!(err, TableError::ColumnLength { expected: 3, found: 1, .. }));
    }

    #[test]
    fn rows_only_table_exposes_count() {
        let t = DataTable::with_rows(6);
        assert_eq!(t.n_rows(), 6);
        assert_eq!(t.n_cols(), 0);
    }
}
