//! Macro para escribir argumentos con sintaxis de llamada.
//!
//! ```ignore
//! let args = args! { blocks = "block", prob = "0.3", assignment_variable = "Z" };
//! ```

/// Construye un `Arguments` a partir de pares `nombre = "código"`.
#[macro_export]
macro_rules! args {
    () => {
        $crate::declaration::Arguments::new()
    };
    ($($name:ident = $src:expr),+ $(,)?) => {
        $crate::declaration::Arguments::new()$(.arg(stringify!($name), $src))+
    };
}

#[cfg(test)]
mod tests {
    #[test]
    fn args_macro_keeps_order() {
        let args = args! { blocks = "block", prob = "0.3" };
        assert_eq!(args.names().collect::<Vec<_>>(), vec!["blocks", "prob"]);
        assert!(args!().is_empty());
    }
}
