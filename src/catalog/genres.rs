use serde_json::Value;

/// Normalizes a raw `Genres` cell into an ordered list of trimmed genre names.
///
/// Accepts a delimited string (`"Fantasy, Fiction"`), a bracketed list string as
/// produced when Python lists are exported to text (`"['Fantasy', 'Fiction']"`),
/// or a JSON array. Absent or falsy cells yield an empty list.
pub fn normalize_genres(raw: Option<&Value>) -> Vec<String> {
    match raw {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Vec::new(),
        Some(Value::String(text)) => split_genres(text),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .filter(|g| !g.is_empty())
            .collect(),
        Some(Value::Number(n)) => vec![n.to_string()],
        Some(_) => Vec::new(),
    }
}

/// Splits a comma-delimited genre string. Empty segments are dropped.
fn split_genres(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        return inner
            .split(',')
            .map(|g| g.trim().trim_matches(|c| c == '\'' || c == '"').trim())
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect();
    }
    trimmed
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}
