use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Target representation of one coerced field.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CoerceKind {
    Str,
    Float,
    Int,
    Bool,
    /// Unix epoch milliseconds, the canonical timestamp representation.
    TimestampMs,
    /// Unix epoch seconds in the raw response, canonicalised to milliseconds.
    TimestampSeconds,
}

/// One instruction translating a raw response field into a canonically named, typed
/// field for the external typed layer.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize)]
pub struct CoercionInstruction {
    /// Field name in the raw exchange response.
    pub source: String,
    /// Canonical unified field name.
    pub target: String,
    pub kind: CoerceKind,
}

/// Nil-safe raw response field access: exact key first, then its camelCase spelling.
///
/// Exchange payloads disagree on casing; canonical renaming happens downstream, so raw
/// map access tolerates both.
pub fn get_field<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let map = value.as_object()?;
    map.get(key)
        .or_else(|| map.get(snake_to_camel(key).as_str()))
        .filter(|value| !value.is_null())
}

/// `filled_amount` -> `filledAmount`.
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Apply an instruction list to a raw response map, producing a canonically named map.
///
/// Missing and null source fields are omitted rather than propagated.
pub fn apply(instructions: &[CoercionInstruction], raw: &Value) -> Value {
    let mut out = Map::with_capacity(instructions.len());
    for instruction in instructions {
        if let Some(coerced) = get_field(raw, &instruction.source)
            .and_then(|value| coerce(instruction.kind, value))
        {
            out.insert(instruction.target.clone(), coerced);
        }
    }
    Value::Object(out)
}

fn coerce(kind: CoerceKind, value: &Value) -> Option<Value> {
    match kind {
        CoerceKind::Str => match value {
            Value::String(s) => Some(Value::String(s.clone())),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        CoerceKind::Float => match value {
            Value::Number(n) => n.as_f64().and_then(float_value),
            Value::String(s) => s.parse::<f64>().ok().and_then(float_value),
            _ => None,
        },
        CoerceKind::Int => match value {
            Value::Number(n) => n.as_i64().map(Value::from),
            Value::String(s) => s.parse::<i64>().ok().map(Value::from),
            _ => None,
        },
        CoerceKind::Bool => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::String(s) => match s.as_str() {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
            _ => None,
        },
        CoerceKind::TimestampMs => as_i64(value).map(Value::from),
        CoerceKind::TimestampSeconds => as_i64(value).map(|secs| Value::from(secs * 1000)),
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|float| float as i64)),
        Value::String(s) => s
            .parse::<i64>()
            .ok()
            .or_else(|| s.parse::<f64>().ok().map(|float| float as i64)),
        _ => None,
    }
}

fn float_value(float: f64) -> Option<Value> {
    serde_json::Number::from_f64(float).map(Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_field_falls_back_to_camel_case() {
        let raw = json!({"filledAmount": "1.5", "price": 100});
        assert_eq!(get_field(&raw, "filled_amount"), Some(&json!("1.5")));
        assert_eq!(get_field(&raw, "price"), Some(&json!(100)));
        assert_eq!(get_field(&raw, "missing"), None);
    }

    #[test]
    fn test_get_field_treats_null_as_absent() {
        let raw = json!({"price": null});
        assert_eq!(get_field(&raw, "price"), None);
    }

    #[test]
    fn test_apply_instruction_list() {
        let instructions = vec![
            CoercionInstruction {
                source: "last_price".into(),
                target: "last".into(),
                kind: CoerceKind::Float,
            },
            CoercionInstruction {
                source: "ts".into(),
                target: "timestamp".into(),
                kind: CoerceKind::TimestampSeconds,
            },
            CoercionInstruction {
                source: "missing".into(),
                target: "never".into(),
                kind: CoerceKind::Str,
            },
        ];

        let raw = json!({"lastPrice": "42000.5", "ts": 1700000000});
        let coerced = apply(&instructions, &raw);
        assert_eq!(
            coerced,
            json!({"last": 42000.5, "timestamp": 1700000000000i64})
        );
    }
}
