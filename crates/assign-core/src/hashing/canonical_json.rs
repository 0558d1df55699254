//! JSON canónico: claves de objetos ordenadas, sin espacios.
//!
//! Dos `Value` semánticamente iguales (mismo contenido, distinto orden de
//! claves) producen el mismo string, y por tanto el mismo hash.

use serde_json::Value;

pub fn to_canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        // Escalares: la serialización de serde_json ya es compacta y estable.
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_json_sorts_nested_keys() {
        let v = json!({"b": {"y": 1, "x": [2, {"d": null, "c": "s"}]}, "a": true});
        assert_eq!(to_canonical_json(&v), r#"{"a":true,"b":{"x":[2,{"c":"s","d":null}],"y":1}}"#);
    }
}
