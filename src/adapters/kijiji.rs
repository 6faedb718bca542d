//! Kijiji / Kijiji Autos adapter.
//!
//! Covers both the classic `/v-cars-trucks/...` ads and the newer Kijiji
//! Autos paths. Ads from private sellers often have no structured data at
//! all, so the DOM fallback reads the attribute list (`Kilometres: 45,000`
//! rows and `dt`/`dd` pairs) instead of a spec sheet.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use url::Url;

use crate::adapters::page::Page;
use crate::adapters::{SiteAdapter, dom, jsonld, title};
use crate::catalog;
use crate::listing::Listing;

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(v-)?((cars|autos)-?(trucks|camions)?|vehicles?)/")
        .expect("valid section pattern")
});
static AD_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d{8,}").expect("valid ad id pattern"));
static FULLSIZE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\$_\d+\.JPG").expect("valid photo size pattern"));

const SOURCE: &str = "kijiji.ca";

pub struct Kijiji;

impl SiteAdapter for Kijiji {
    fn name(&self) -> &'static str {
        "Kijiji"
    }

    fn hostname(&self) -> &'static str {
        "kijiji.ca"
    }

    fn source(&self) -> &'static str {
        SOURCE
    }

    fn is_listing_page(&self, url: &Url) -> bool {
        let path = url.path();
        SECTION_RE.is_match(path) && AD_ID_RE.is_match(path)
    }

    fn is_ev_listing(&self, page: &Page) -> bool {
        let doc = page.document();
        if let Some(fuel) =
            dom::text_of_first(&doc, &[r#"[class*="fuel"], [data-testid*="fuel"]"#])
            && fuel.to_lowercase().contains("electric")
        {
            return true;
        }
        let title = dom::text_of_first(&doc, &["h1"]).unwrap_or_default();
        let description =
            dom::text_of_first(&doc, &[r#"[class*="description"]"#]).unwrap_or_default();
        catalog::is_likely_ev(&format!("{title} {description}"))
    }

    fn extract(&self, page: &Page) -> Option<Listing> {
        let doc = page.document();
        if let Some(block) = jsonld::find_typed(&doc, &["Car", "Vehicle", "Product"], false) {
            return Some(from_json_ld(&block, page));
        }
        Some(from_dom(&doc, page))
    }
}

fn from_json_ld(block: &Value, page: &Page) -> Listing {
    let name = jsonld::str_at(block, &["name"]).unwrap_or_default();
    let parts = title::parse_title(name);

    let year = if parts.year > 0 {
        parts.year
    } else {
        block
            .get("vehicleModelDate")
            .and_then(jsonld::as_int)
            .and_then(|y| i32::try_from(y).ok())
            .unwrap_or(0)
    };
    let make = if parts.make.is_empty() {
        jsonld::str_at(block, &["brand", "name"]).unwrap_or_default().to_string()
    } else {
        parts.make
    };
    let model = if parts.model.is_empty() {
        jsonld::str_at(block, &["model"]).unwrap_or_default().to_string()
    } else {
        parts.model
    };

    Listing {
        year,
        make,
        model,
        trim: parts.trim,
        price: jsonld::first_int(block, &[&["offers", "price"], &["price"]])
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(0),
        odo: jsonld::u32_at(block, &["mileageFromOdometer", "value"]).unwrap_or(0),
        dealer: jsonld::str_at(block, &["seller", "name"])
            .unwrap_or("Private Seller")
            .to_string(),
        location: jsonld::str_at(block, &["seller", "address", "addressLocality"])
            .unwrap_or_default()
            .to_string(),
        photos: block.get("image").map(jsonld::string_list).unwrap_or_default(),
        url: page.url().to_string(),
        source: SOURCE.to_string(),
        ..Listing::default()
    }
}

fn from_dom(doc: &Html, page: &Page) -> Listing {
    let heading = dom::text_of_first(doc, &["h1"]).unwrap_or_default();
    let parts = title::parse_title(&heading);

    let attrs = extract_attributes(doc);
    let odo = ["kilometres", "mileage", "odometer"]
        .iter()
        .find_map(|key| attrs.get(*key))
        .map(|value| dom::int_from_digits(value))
        .unwrap_or(0);

    let dealer = dom::text_of_first(
        doc,
        &[
            r#"[class*="seller-name"], [class*="dealerName"]"#,
            r#"[data-testid="seller-info"]"#,
        ],
    )
    .filter(|text| !text.is_empty())
    .unwrap_or_else(|| "Private Seller".to_string());

    let location = dom::text_of_first(
        doc,
        &[r#"[class*="location"], [data-testid="location"]"#, "address"],
    )
    .unwrap_or_default();

    Listing {
        year: parts.year,
        make: parts.make,
        model: parts.model,
        trim: parts.trim,
        price: extract_price(doc),
        odo,
        dealer,
        location,
        photos: extract_photos(doc),
        url: page.url().to_string(),
        source: SOURCE.to_string(),
        ..Listing::default()
    }
}

fn extract_price(doc: &Html) -> u32 {
    let Some(element) = dom::first_element(
        doc,
        &[
            r#"[class*="price"], [data-testid="price"]"#,
            r#"[itemprop="price"]"#,
        ],
    ) else {
        return 0;
    };
    let text: String = element.text().collect();
    let text = if text.trim().is_empty() {
        element.value().attr("content").unwrap_or_default().to_string()
    } else {
        text
    };
    dom::int_from_digits(&text)
}

/// Key-value rows from the ad's attribute list, keyed by the label with
/// whitespace removed ("Body Type" -> "bodytype").
fn extract_attributes(doc: &Html) -> HashMap<String, String> {
    let mut attrs = HashMap::new();

    if let Ok(selector) = Selector::parse(r#"[class*="attributeList"] li, [class*="specs"] li"#) {
        for item in doc.select(&selector) {
            let text: String = item.text().collect();
            let mut halves = text.split(':');
            let key = halves.next().map(str::trim).unwrap_or_default();
            let value = halves.next().map(str::trim).unwrap_or_default();
            if !key.is_empty() && !value.is_empty() {
                attrs.insert(dom::attr_key(key), value.to_string());
            }
        }
    }

    if let Ok(selector) = Selector::parse("dt") {
        for dt in doc.select(&selector) {
            if let Some(dd) = dt.next_siblings().find_map(ElementRef::wrap)
                && dd.value().name() == "dd"
            {
                let key: String = dt.text().collect();
                let value: String = dd.text().collect();
                let key = key.trim();
                let value = value.trim();
                if !key.is_empty() && !value.is_empty() {
                    attrs.insert(dom::attr_key(key), value.to_string());
                }
            }
        }
    }

    attrs
}

fn extract_photos(doc: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(r#"[class*="gallery"] img, [class*="image"] img"#) else {
        return Vec::new();
    };
    let mut photos: Vec<String> = doc
        .select(&selector)
        .filter_map(|img| dom::image_source(&img, &["src", "data-src", "data-lazy"]))
        // Kijiji CDN names encode the size; $_57 is the full-size variant.
        .map(|src| FULLSIZE_RE.replace(&src, regex::NoExpand("$_57.JPG")).into_owned())
        .filter(|src| !src.contains("placeholder") && !src.contains("avatar"))
        .collect();
    photos.truncate(10);
    photos
}
