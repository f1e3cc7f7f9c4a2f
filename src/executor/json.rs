//! Val ⇄ JSON conversion
//!
//! Used at the application boundary: results and errors leave the engine as
//! JSON, and embedders hand JSON arguments in as runtime values. Error values
//! flatten to plain `{code, message}` objects on the way out; JSON input
//! always produces data values.

use super::values::Val;
use anyhow::{bail, Result};
use serde_json::{json, Value};

/// Convert a JSON value into a runtime value
pub fn json_to_val(value: &Value) -> Result<Val> {
    Ok(match value {
        Value::Null => Val::Null,
        Value::Bool(b) => Val::Bool(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) => Val::Num(f),
            None => bail!("number {} does not fit a runtime value", n),
        },
        Value::String(s) => Val::Str(s.clone()),
        Value::Array(items) => Val::List(
            items
                .iter()
                .map(json_to_val)
                .collect::<Result<Vec<_>>>()?,
        ),
        Value::Object(map) => Val::Obj(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), json_to_val(v)?)))
                .collect::<Result<_>>()?,
        ),
    })
}

/// Convert a runtime value into JSON
pub fn val_to_json(value: &Val) -> Result<Value> {
    Ok(match value {
        Val::Null => Value::Null,
        Val::Bool(b) => Value::Bool(*b),
        Val::Num(n) => match serde_json::Number::from_f64(*n) {
            Some(num) => Value::Number(num),
            None => bail!("non-finite number {} has no JSON form", n),
        },
        Val::Str(s) => Value::String(s.clone()),
        Val::List(items) => Value::Array(
            items
                .iter()
                .map(val_to_json)
                .collect::<Result<Vec<_>>>()?,
        ),
        Val::Obj(map) => {
            let mut obj = serde_json::Map::new();
            for (k, v) in map {
                obj.insert(k.clone(), val_to_json(v)?);
            }
            Value::Object(obj)
        }
        Val::Error(err) => json!({ "code": err.code, "message": err.message }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::errors::ErrorInfo;
    use maplit::hashmap;

    #[test]
    fn test_json_to_val_nested() {
        let json: Value = serde_json::from_str(r#"{"n": 2.5, "items": [true, null, "x"]}"#).unwrap();
        let val = json_to_val(&json).unwrap();

        let Val::Obj(map) = val else {
            unreachable!("Expected Obj, got something else");
        };
        assert_eq!(map["n"], Val::Num(2.5));
        assert_eq!(
            map["items"],
            Val::List(vec![Val::Bool(true), Val::Null, Val::Str("x".into())])
        );
    }

    #[test]
    fn test_val_to_json_error_flattens() {
        let val = Val::Obj(hashmap! {
            "err".to_string() => Val::Error(ErrorInfo::new("RuntimeError", "boom")),
        });
        let json = val_to_json(&val).unwrap();
        assert_eq!(json["err"]["code"], "RuntimeError");
        assert_eq!(json["err"]["message"], "boom");
    }

    #[test]
    fn test_val_to_json_rejects_non_finite() {
        assert!(val_to_json(&Val::Num(f64::NAN)).is_err());
    }
}
