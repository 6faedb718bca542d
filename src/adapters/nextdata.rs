//! `__NEXT_DATA__` bootstrap payloads on Next.js-built storefronts.

use scraper::{Html, Selector};
use serde_json::Value;

/// The `props.pageProps` object of the page's `__NEXT_DATA__` script, if the
/// page has one and it parses.
pub fn page_props(doc: &Html) -> Option<Value> {
    let selector = Selector::parse("script#__NEXT_DATA__").ok()?;
    let script = doc.select(&selector).next()?;
    let raw = script.text().collect::<String>();
    let data: Value = serde_json::from_str(&raw).ok()?;
    data.get("props")?.get("pageProps").cloned()
}

/// First non-null key under `pageProps`, for the `vehicle`-or-`car` style
/// payloads these sites use.
pub fn first_present(props: &Value, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .find_map(|key| props.get(key).filter(|v| !v.is_null()).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_page_props() {
        let html = r#"
            <script id="__NEXT_DATA__" type="application/json">
              {"props":{"pageProps":{"vehicle":{"make":"Kia"}}}}
            </script>
        "#;
        let doc = Html::parse_document(html);
        let props = page_props(&doc).unwrap();
        let vehicle = first_present(&props, &["vehicle", "car"]).unwrap();
        assert_eq!(vehicle["make"], "Kia");
    }

    #[test]
    fn null_keys_fall_through() {
        let props = serde_json::json!({"vehicle": null, "listing": {"make":"Ford"}});
        let hit = first_present(&props, &["vehicle", "listing"]).unwrap();
        assert_eq!(hit["make"], "Ford");
    }

    #[test]
    fn absent_script_is_none() {
        let doc = Html::parse_document("<html><body></body></html>");
        assert!(page_props(&doc).is_none());
    }
}
