//! AutoTrader.ca adapter.
//!
//! Listings usually carry a schema.org `Car` block; the DOM fallback leans
//! on AutoTrader's `data-testid` attributes with class-substring selectors
//! behind them. The listing URL itself encodes the city and province, which
//! covers pages that render the dealer address late.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use crate::adapters::page::Page;
use crate::adapters::{SiteAdapter, dom, jsonld, title};
use crate::catalog;
use crate::listing::Listing;

static LISTING_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/a/[^/]+/[^/]+/[^/]+/[^/]+/[\d_]+").expect("valid listing path pattern")
});
static LOCATION_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/a/[^/]+/[^/]+/([^/]+)/([^/]+)/").expect("valid location path pattern")
});
static VIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[A-HJ-NPR-Z0-9]{17}").expect("valid vin pattern"));

const SOURCE: &str = "autotrader.ca";

pub struct AutoTrader;

impl SiteAdapter for AutoTrader {
    fn name(&self) -> &'static str {
        "AutoTrader"
    }

    fn hostname(&self) -> &'static str {
        "autotrader.ca"
    }

    fn source(&self) -> &'static str {
        SOURCE
    }

    fn is_listing_page(&self, url: &Url) -> bool {
        // Listing paths look like /a/make/model/city/province/12345_67890
        LISTING_PATH_RE.is_match(url.path())
    }

    fn is_ev_listing(&self, page: &Page) -> bool {
        let doc = page.document();
        if let Some(fuel) =
            dom::first_nonempty_text(&doc, &[r#"[data-testid="fuelType"]"#, ".fuel-type"])
            && fuel.to_lowercase().contains("electric")
        {
            return true;
        }
        let heading = dom::text_of_first(&doc, &["h1"]).unwrap_or_default();
        catalog::is_likely_ev(&heading)
    }

    fn extract(&self, page: &Page) -> Option<Listing> {
        let doc = page.document();
        if let Some(block) = jsonld::find_typed(&doc, &["Car", "Vehicle"], true) {
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
        jsonld::first_int(block, &[&["vehicleModelDate"], &["modelDate"]])
            .and_then(|y| i32::try_from(y).ok())
            .unwrap_or(0)
    };
    let make = if parts.make.is_empty() {
        jsonld::first_str(block, &[&["brand", "name"], &["manufacturer", "name"]])
            .unwrap_or_default()
            .to_string()
    } else {
        parts.make
    };
    let model = if parts.model.is_empty() {
        jsonld::str_at(block, &["model"]).unwrap_or_default().to_string()
    } else {
        parts.model
    };

    let photos = block.get("image").map(jsonld::string_list).unwrap_or_default();

    Listing {
        year,
        make,
        model,
        trim: parts.trim,
        price: jsonld::u32_at(block, &["offers", "price"]).unwrap_or(0),
        odo: jsonld::u32_at(block, &["mileageFromOdometer", "value"]).unwrap_or(0),
        dealer: jsonld::str_at(block, &["seller", "name"])
            .unwrap_or_default()
            .to_string(),
        location: jsonld::str_at(block, &["seller", "address", "addressLocality"])
            .unwrap_or_default()
            .to_string(),
        photos,
        vin: jsonld::str_at(block, &["vehicleIdentificationNumber"]).map(str::to_string),
        url: page.url().to_string(),
        source: SOURCE.to_string(),
        ..Listing::default()
    }
}

fn from_dom(doc: &Html, page: &Page) -> Listing {
    let price_text = dom::text_of_first(
        doc,
        &[
            r#"[data-testid="price"]"#,
            ".price-amount",
            r#"[class*="price"]"#,
        ],
    )
    .unwrap_or_default();

    let heading = dom::text_of_first(doc, &["h1", r#"[data-testid="listing-title"]"#])
        .unwrap_or_default();
    let parts = title::parse_title(&heading);

    let odo_text = dom::text_of_first(
        doc,
        &[
            r#"[data-testid="mileage"]"#,
            r#"[class*="mileage"]"#,
            r#"[class*="odometer"]"#,
        ],
    )
    .unwrap_or_default();

    let dealer = dom::text_of_first(
        doc,
        &[
            r#"[data-testid="dealer-name"]"#,
            ".dealer-name",
            r#"[class*="dealer"]"#,
        ],
    )
    .unwrap_or_default();

    let location = dom::first_nonempty_text(
        doc,
        &[
            r#"[data-testid="location"]"#,
            r#"[data-testid="dealer-location"]"#,
            r#"[class*="dealer-address"]"#,
            r#"[class*="dealerAddress"]"#,
            r#"[class*="location"]"#,
            "address",
            r#"[itemprop="address"]"#,
        ],
    )
    .or_else(|| location_from_path(page.url()))
    .unwrap_or_default();

    Listing {
        year: parts.year,
        make: parts.make,
        model: parts.model,
        trim: parts.trim,
        price: dom::int_from_digits(&price_text),
        odo: dom::int_from_digits(&odo_text),
        dealer,
        location,
        photos: extract_photos(doc, page),
        vin: extract_vin(doc),
        url: page.url().to_string(),
        source: SOURCE.to_string(),
        ..Listing::default()
    }
}

/// The URL path carries the sale location: /a/make/model/city/province/id.
fn location_from_path(url: &Url) -> Option<String> {
    let caps = LOCATION_PATH_RE.captures(url.path())?;
    let city = percent_decode_str(&caps[1]).decode_utf8_lossy().replace('-', " ");
    let city = title_case(&city);
    let province = percent_decode_str(&caps[2]).decode_utf8_lossy().to_uppercase();
    Some(format!("{city}, {province}"))
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut boundary = true;
    for c in text.chars() {
        if boundary {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        boundary = !(c.is_alphanumeric() || c == '_');
    }
    out
}

fn extract_photos(doc: &Html, page: &Page) -> Vec<String> {
    let selectors = [
        r#"[data-testid="gallery"] img"#,
        ".gallery-image img",
        r#"[class*="gallery"] img"#,
        r#"[class*="mediaviewer"] img"#,
        r#"[class*="photo"] img"#,
        "picture source",
        "picture img",
    ];

    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let photos: Vec<String> = doc
            .select(&selector)
            .filter_map(|el| {
                dom::image_source(
                    &el,
                    &["src", "srcset", "data-src", "data-lazy", "data-srcset"],
                )
            })
            .map(|src| dom::absolutize(&src, page))
            .filter(|src| {
                !src.contains("placeholder") && !src.contains("data:image") && src.contains("http")
            })
            .collect();
        if !photos.is_empty() {
            let mut photos = dom::dedup_preserving_order(photos);
            photos.truncate(10);
            return photos;
        }
    }
    Vec::new()
}

fn extract_vin(doc: &Html) -> Option<String> {
    let text = dom::text_of_first(doc, &[r#"[data-testid="vin"]"#]).or_else(|| {
        // No dedicated element; take the first small node that mentions a VIN.
        let selector = Selector::parse("*").ok()?;
        doc.select(&selector)
            .map(|el| el.text().collect::<String>())
            .find(|text| text.to_lowercase().contains("vin") && text.chars().count() < 50)
    })?;
    VIN_RE
        .find(&text)
        .map(|m| m.as_str().to_uppercase())
}
