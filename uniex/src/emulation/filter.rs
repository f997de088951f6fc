use serde_json::Value;

pub use uniex_spec::get_field;

/// Timestamp-ish field of a raw entry: integer, float or numeric string.
pub fn field_i64(entry: &Value, key: &str) -> Option<i64> {
    match get_field(entry, key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// String field of a raw entry, numbers rendered to strings for id comparisons.
pub fn field_string(entry: &Value, key: &str) -> Option<String> {
    match get_field(entry, key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Lowercased order/ledger status with the `cancelled` spelling folded into `canceled`.
pub fn normalized_status(entry: &Value) -> Option<String> {
    let status = get_field(entry, "status")?.as_str()?.to_lowercase();
    Some(match status.as_str() {
        "cancelled" => "canceled".to_string(),
        _ => status,
    })
}

/// Drop entries whose `key` field is missing or earlier than `since`.
pub fn filter_by_since(entries: Vec<Value>, since: i64, key: &str) -> Vec<Value> {
    entries
        .into_iter()
        .filter(|entry| field_i64(entry, key).is_some_and(|value| value >= since))
        .collect()
}

/// Take `limit` entries, inferring sort direction from the first and last `key` fields.
///
/// `from_start` records whether a `since` bound was applied: with one, the window
/// anchors at the oldest retained entries; without, it anchors at the newest.
pub fn filter_by_limit(entries: Vec<Value>, limit: usize, key: &str, from_start: bool) -> Vec<Value> {
    if entries.len() <= limit {
        return entries;
    }

    let ascending = match (
        entries.first().and_then(|entry| field_i64(entry, key)),
        entries.last().and_then(|entry| field_i64(entry, key)),
    ) {
        (Some(first), Some(last)) => first <= last,
        _ => true,
    };

    let take_head = ascending == from_start;
    if take_head {
        entries.into_iter().take(limit).collect()
    } else {
        let skip = entries.len() - limit;
        entries.into_iter().skip(skip).collect()
    }
}

/// Apply optional since and limit windows over a raw entry list.
pub fn filter_by_since_limit(
    entries: Vec<Value>,
    since: Option<i64>,
    limit: Option<usize>,
    key: &str,
) -> Vec<Value> {
    let from_start = since.is_some();
    let entries = match since {
        Some(since) => filter_by_since(entries, since, key),
        None => entries,
    };
    match limit {
        Some(limit) => filter_by_limit(entries, limit, key, from_start),
        None => entries,
    }
}

/// Sort entries newest-first by a timestamp field; entries without one sink to the end.
pub fn sort_by_timestamp_desc(entries: &mut [Value], key: &str) {
    entries.sort_by_key(|entry| std::cmp::Reverse(field_i64(entry, key).unwrap_or(i64::MIN)));
}
