use serde_json::{Map, Value, json};
use uniex_spec::ResponseTransformer;

/// Apply a declarative response transformer to a parsed response body.
pub fn apply(transformer: &ResponseTransformer, value: Value) -> Value {
    match transformer {
        ResponseTransformer::UnwrapSingleElementList => unwrap_single_element_list(value),
        ResponseTransformer::OrderBookFromFlatList => order_book_from_flat_list(value),
        ResponseTransformer::ExtractPath { path } => extract_path(value, path),
        ResponseTransformer::ExtractPathUnwrap { path } => {
            let extracted = extract_path(value, path);
            match extracted {
                Value::Array(ref items) if items.is_empty() => Value::Null,
                other => unwrap_single_element_list(other),
            }
        }
    }
}

/// `[x]` -> `x`; anything else passes through.
fn unwrap_single_element_list(value: Value) -> Value {
    match value {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    }
}

/// Walk nested keys, stopping at the first missing key and returning the last
/// reachable value. Downstream transformers rely on this rather than a null result.
fn extract_path(value: Value, path: &[String]) -> Value {
    let mut current = value;
    for key in path {
        match current {
            Value::Object(mut map) => match map.remove(key.as_str()) {
                Some(next) => current = next,
                None => return Value::Object(map),
            },
            other => return other,
        }
    }
    current
}

/// Regroup a flat list of levels carrying a `side` field into
/// `{bids: [[price, size]..], asks: [[price, size]..]}`, bids sorted descending and
/// asks ascending by price.
fn order_book_from_flat_list(value: Value) -> Value {
    let Value::Array(levels) = value else {
        return value;
    };

    let mut bids = Vec::new();
    let mut asks = Vec::new();

    for level in &levels {
        let Some(side) = level.get("side").and_then(Value::as_str) else {
            continue;
        };
        let price = number_field(level, &["price", "px"]);
        let size = number_field(level, &["size", "amount", "qty"]);
        let (Some(price), Some(size)) = (price, size) else {
            continue;
        };

        match side.to_ascii_lowercase().as_str() {
            "buy" | "bid" | "bids" => bids.push((price, size)),
            "sell" | "ask" | "asks" => asks.push((price, size)),
            _ => {}
        }
    }

    bids.sort_by(|a, b| b.0.total_cmp(&a.0));
    asks.sort_by(|a, b| a.0.total_cmp(&b.0));

    let levels_to_value = |levels: Vec<(f64, f64)>| {
        levels
            .into_iter()
            .map(|(price, size)| json!([price, size]))
            .collect::<Vec<_>>()
    };

    let mut book = Map::new();
    book.insert("bids".into(), Value::Array(levels_to_value(bids)));
    book.insert("asks".into(), Value::Array(levels_to_value(asks)));
    Value::Object(book)
}

fn number_field(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        value.get(key).and_then(|field| match field {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
    })
}
