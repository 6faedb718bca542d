//! schema.org JSON-LD discovery and lenient value coercion.
//!
//! Marketplace JSON-LD is sloppy: numbers arrive as strings, strings carry
//! units, nesting varies by site. The accessors here accept whatever is
//! there and coerce with the same leniency the sites were parsed with
//! originally, so a malformed block degrades a field instead of the page.

use scraper::{Html, Selector};
use serde_json::Value;

/// First JSON-LD block whose `@type` is one of `types`, in document order.
/// With `search_arrays`, a top-level array is searched element-wise too.
pub fn find_typed(doc: &Html, types: &[&str], search_arrays: bool) -> Option<Value> {
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    for script in doc.select(&selector) {
        let raw = script.text().collect::<String>();
        let Ok(data) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        if block_type_matches(&data, types) {
            return Some(data);
        }
        if search_arrays
            && let Value::Array(items) = &data
            && let Some(hit) = items.iter().find(|item| block_type_matches(item, types))
        {
            return Some(hit.clone());
        }
    }
    None
}

fn block_type_matches(value: &Value, types: &[&str]) -> bool {
    value
        .get("@type")
        .and_then(Value::as_str)
        .is_some_and(|t| types.contains(&t))
}

/// Walk a path of object keys.
pub fn value_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// String at a path, `None` when missing, null, or empty.
pub fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    value_at(value, path)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Integer at a path with `parseInt` semantics: numbers truncate toward
/// zero, strings contribute their leading integer prefix.
pub fn int_at(value: &Value, path: &[&str]) -> Option<i64> {
    as_int(value_at(value, path)?)
}

pub fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_int_prefix(s),
        _ => None,
    }
}

fn parse_int_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// A nonnegative integer at a path, clamped into `u32` for canonical fields.
pub fn u32_at(value: &Value, path: &[&str]) -> Option<u32> {
    int_at(value, path).map(|n| u32::try_from(n).unwrap_or(0))
}

/// First path that coerces to a nonzero integer. Zero counts as absent, the
/// way a `||` chain treats it.
pub fn first_int(value: &Value, paths: &[&[&str]]) -> Option<i64> {
    paths
        .iter()
        .find_map(|path| int_at(value, path).filter(|n| *n != 0))
}

/// First path with a non-empty string.
pub fn first_str<'a>(value: &'a Value, paths: &[&[&str]]) -> Option<&'a str> {
    paths.iter().find_map(|path| str_at(value, path))
}

/// Coerce a JSON-LD `image` value (string or array) to a URL list. Only
/// string entries survive.
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_typed_block_among_others() {
        let html = r#"
            <script type="application/ld+json">{"@type":"BreadcrumbList"}</script>
            <script type="application/ld+json">not json at all</script>
            <script type="application/ld+json">{"@type":"Car","name":"2023 Kia EV6"}</script>
        "#;
        let doc = Html::parse_document(html);
        let block = find_typed(&doc, &["Car", "Vehicle"], false).unwrap();
        assert_eq!(str_at(&block, &["name"]), Some("2023 Kia EV6"));
    }

    #[test]
    fn searches_top_level_arrays_when_asked() {
        let html = r#"
            <script type="application/ld+json">
              [{"@type":"WebPage"},{"@type":"Vehicle","name":"2022 Nissan Leaf SV"}]
            </script>
        "#;
        let doc = Html::parse_document(html);
        assert!(find_typed(&doc, &["Car", "Vehicle"], false).is_none());
        let block = find_typed(&doc, &["Car", "Vehicle"], true).unwrap();
        assert_eq!(str_at(&block, &["name"]), Some("2022 Nissan Leaf SV"));
    }

    #[test]
    fn int_coercion_matches_parse_int() {
        assert_eq!(as_int(&serde_json::json!(39000)), Some(39000));
        assert_eq!(as_int(&serde_json::json!(39000.9)), Some(39000));
        assert_eq!(as_int(&serde_json::json!("39000")), Some(39000));
        assert_eq!(as_int(&serde_json::json!("39,000")), Some(39));
        assert_eq!(as_int(&serde_json::json!("  42 km")), Some(42));
        assert_eq!(as_int(&serde_json::json!("-7d")), Some(-7));
        assert_eq!(as_int(&serde_json::json!("km 42")), None);
        assert_eq!(as_int(&serde_json::json!(null)), None);
    }

    #[test]
    fn nested_paths_and_lists() {
        let block = serde_json::json!({
            "offers": {"price": "45999.00"},
            "seller": {"address": {"addressLocality": "Calgary"}},
            "image": ["https://a.jpg", {"@type": "ImageObject"}, "https://b.jpg"]
        });
        assert_eq!(int_at(&block, &["offers", "price"]), Some(45999));
        assert_eq!(
            str_at(&block, &["seller", "address", "addressLocality"]),
            Some("Calgary")
        );
        assert_eq!(
            string_list(block.get("image").unwrap()),
            vec!["https://a.jpg", "https://b.jpg"]
        );
    }
}
