//! CanadaDrives.ca adapter.
//!
//! Another Next.js storefront, close to Clutch: `pageProps.vehicle` (or
//! `pageProps.listing`) first, DOM second. Sales are online-only, so the
//! dealer is fixed and the DOM path has no location to read.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use crate::adapters::page::Page;
use crate::adapters::{SiteAdapter, dom, jsonld, nextdata, title};
use crate::catalog;
use crate::listing::Listing;

static LISTING_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(used-cars|vehicles)/[\w-]+-\d+").expect("valid listing path pattern")
});
static KM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3},?\d{3})\s*km").expect("valid km pattern"));

const SOURCE: &str = "canadadrives.ca";

pub struct CanadaDrives;

impl SiteAdapter for CanadaDrives {
    fn name(&self) -> &'static str {
        "CanadaDrives"
    }

    fn hostname(&self) -> &'static str {
        "canadadrives.ca"
    }

    fn source(&self) -> &'static str {
        SOURCE
    }

    fn is_listing_page(&self, url: &Url) -> bool {
        LISTING_PATH_RE.is_match(url.path())
    }

    fn is_ev_listing(&self, page: &Page) -> bool {
        let doc = page.document();
        if let Some(fuel) = dom::text_of_first(&doc, &[r#"[class*="fuel"]"#])
            && fuel.to_lowercase().contains("electric")
        {
            return true;
        }
        let heading = dom::text_of_first(&doc, &["h1"]).unwrap_or_default();
        catalog::is_likely_ev(&heading)
    }

    fn extract(&self, page: &Page) -> Option<Listing> {
        let doc = page.document();
        if let Some(props) = nextdata::page_props(&doc)
            && let Some(vehicle) = nextdata::first_present(&props, &["vehicle", "listing"])
        {
            return Some(from_next_data(&vehicle, page));
        }
        Some(from_dom(&doc, page))
    }
}

fn from_next_data(vehicle: &Value, page: &Page) -> Listing {
    Listing {
        year: vehicle
            .get("year")
            .and_then(jsonld::as_int)
            .and_then(|y| i32::try_from(y).ok())
            .unwrap_or(0),
        make: jsonld::str_at(vehicle, &["make"]).unwrap_or_default().to_string(),
        model: jsonld::str_at(vehicle, &["model"]).unwrap_or_default().to_string(),
        trim: jsonld::str_at(vehicle, &["trim"]).unwrap_or_default().to_string(),
        price: jsonld::first_int(vehicle, &[&["price"], &["salePrice"]])
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(0),
        odo: jsonld::first_int(vehicle, &[&["odometer"], &["kilometres"]])
            .and_then(|o| u32::try_from(o).ok())
            .unwrap_or(0),
        dealer: "Canada Drives".to_string(),
        location: jsonld::str_at(vehicle, &["location"]).unwrap_or("Online").to_string(),
        photos: nextdata::first_present(vehicle, &["images", "photos"])
            .map(|images| jsonld::string_list(&images))
            .unwrap_or_default(),
        vin: jsonld::str_at(vehicle, &["vin"]).map(str::to_string),
        url: page.url().to_string(),
        source: SOURCE.to_string(),
        ..Listing::default()
    }
}

fn from_dom(doc: &Html, page: &Page) -> Listing {
    let heading = dom::text_of_first(doc, &["h1"]).unwrap_or_default();
    let parts = title::parse_title(&heading);

    let price_text = dom::text_of_first(doc, &[r#"[class*="price"], [data-testid="price"]"#])
        .unwrap_or_default();

    let specs = extract_specs(doc);
    let odo = body_kilometres(doc)
        .or_else(|| specs.get("odometer").map(|value| dom::int_from_digits(value)))
        .or_else(|| specs.get("kilometres").map(|value| dom::int_from_digits(value)))
        .unwrap_or(0);

    Listing {
        year: parts.year,
        make: parts.make,
        model: parts.model,
        trim: parts.trim,
        price: dom::int_from_digits(&price_text),
        odo,
        dealer: "Canada Drives".to_string(),
        location: "Online".to_string(),
        photos: extract_photos(doc),
        url: page.url().to_string(),
        source: SOURCE.to_string(),
        ..Listing::default()
    }
}

/// Spec rows split on a colon; rows with more than one colon are noise.
fn extract_specs(doc: &Html) -> HashMap<String, String> {
    let mut specs = HashMap::new();
    let Ok(selector) = Selector::parse(r#"[class*="spec"], [class*="detail"]"#) else {
        return specs;
    };
    for item in doc.select(&selector) {
        let text: String = item.text().collect();
        let parts: Vec<&str> = text.split(':').collect();
        if let [key, value] = parts.as_slice() {
            specs.insert(dom::attr_key(key.trim()), value.trim().to_string());
        }
    }
    specs
}

fn body_kilometres(doc: &Html) -> Option<u32> {
    let selector = Selector::parse("body").ok()?;
    let body = doc.select(&selector).next()?;
    let text: String = body.text().collect();
    let caps = KM_RE.captures(&text)?;
    caps[1].replace(',', "").parse().ok()
}

fn extract_photos(doc: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(r#"[class*="gallery"] img, [class*="image"] img"#) else {
        return Vec::new();
    };
    let mut photos: Vec<String> = doc
        .select(&selector)
        .filter_map(|img| dom::image_source(&img, &["src", "data-src"]))
        .filter(|src| !src.contains("placeholder"))
        .collect();
    photos.truncate(10);
    photos
}
