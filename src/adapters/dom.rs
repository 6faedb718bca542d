//! Small DOM helpers shared by the site adapters.
//!
//! Marketplace markup is unstable, so every lookup runs a priority list of
//! CSS selectors and settles for the first hit. Two fallback policies exist
//! and they are not interchangeable: `text_of_first` commits to the first
//! *element* found even if its text is empty, while `first_nonempty_text`
//! keeps trying selectors until one yields visible text.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use crate::adapters::page::Page;

/// First element matching any selector, in priority order.
pub fn first_element<'a>(doc: &'a Html, selectors: &[&str]) -> Option<ElementRef<'a>> {
    for raw in selectors {
        if let Ok(selector) = Selector::parse(raw)
            && let Some(element) = doc.select(&selector).next()
        {
            return Some(element);
        }
    }
    None
}

/// Concatenated descendant text, trimmed.
pub fn text_of(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Trimmed text of the first matching element; `Some("")` when the element
/// exists but says nothing.
pub fn text_of_first(doc: &Html, selectors: &[&str]) -> Option<String> {
    first_element(doc, selectors).map(|el| text_of(&el))
}

/// Trimmed text of the first selector that yields non-empty text.
pub fn first_nonempty_text(doc: &Html, selectors: &[&str]) -> Option<String> {
    for raw in selectors {
        if let Ok(selector) = Selector::parse(raw)
            && let Some(element) = doc.select(&selector).next()
        {
            let text = text_of(&element);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// The digits of `text` read as one number: "$39,500 CAD" -> 39500.
/// No digits (or an absurd overflow) comes out as 0.
pub fn int_from_digits(text: &str) -> u32 {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// First usable image-source attribute. `srcset`-style attributes are
/// reduced to their first whitespace-delimited candidate URL.
pub fn image_source(element: &ElementRef, attrs: &[&str]) -> Option<String> {
    for attr in attrs {
        if let Some(value) = element.value().attr(attr) {
            let value = if attr.contains("srcset") {
                value.split(' ').next().unwrap_or_default()
            } else {
                value
            };
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Resolve protocol-relative and rooted URLs against the page origin.
/// Other values pass through untouched.
pub fn absolutize(src: &str, page: &Page) -> String {
    if let Some(rest) = src.strip_prefix("//") {
        return format!("https://{rest}");
    }
    if src.starts_with('/') {
        return format!("{}{}", page.origin(), src);
    }
    src.to_string()
}

/// Spec-sheet labels become lookup keys: lowercased, whitespace removed
/// ("Body Type" -> "bodytype").
pub fn attr_key(label: &str) -> String {
    label.to_lowercase().split_whitespace().collect()
}

/// Drop repeated URLs, keeping first occurrences in order.
pub fn dedup_preserving_order(photos: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    photos
        .into_iter()
        .filter(|photo| seen.insert(photo.clone()))
        .collect()
}
