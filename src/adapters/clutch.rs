//! Clutch.ca adapter.
//!
//! Clutch is an online retailer built on Next.js, so the primary source is
//! the `__NEXT_DATA__` payload under `pageProps.vehicle`. There is no dealer
//! network: the dealer is always "Clutch" and a listing without a delivery
//! city is sold from "Online".

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

static LISTING_PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/vehicles/[\w-]*\d+").expect("valid listing path pattern"));
static KM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d{1,3},?\d{3})\s*km").expect("valid km pattern"));

const SOURCE: &str = "clutch.ca";

pub struct Clutch;

impl SiteAdapter for Clutch {
    fn name(&self) -> &'static str {
        "Clutch"
    }

    fn hostname(&self) -> &'static str {
        "clutch.ca"
    }

    fn source(&self) -> &'static str {
        SOURCE
    }

    fn is_listing_page(&self, url: &Url) -> bool {
        // Both /vehicles/76427 and /vehicles/2023-chevrolet-bolt-ev-123456
        LISTING_PATH_RE.is_match(url.path())
    }

    fn is_ev_listing(&self, page: &Page) -> bool {
        let doc = page.document();
        if let Some(badge) =
            dom::text_of_first(&doc, &[r#"[class*="fuel"], [class*="electric"]"#])
            && badge.to_lowercase().contains("electric")
        {
            return true;
        }
        let heading = dom::text_of_first(&doc, &["h1"]).unwrap_or_default();
        catalog::is_likely_ev(&heading)
    }

    fn extract(&self, page: &Page) -> Option<Listing> {
        let doc = page.document();
        if let Some(props) = nextdata::page_props(&doc)
            && let Some(vehicle) = nextdata::first_present(&props, &["vehicle", "car"])
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
        price: jsonld::first_int(vehicle, &[&["price"], &["allInPrice"]])
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(0),
        odo: jsonld::first_int(vehicle, &[&["odometer"], &["mileage"]])
            .and_then(|o| u32::try_from(o).ok())
            .unwrap_or(0),
        dealer: "Clutch".to_string(),
        location: jsonld::str_at(vehicle, &["location", "city"])
            .unwrap_or("Online")
            .to_string(),
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
        .unwrap_or(0);

    Listing {
        year: parts.year,
        make: parts.make,
        model: parts.model,
        trim: parts.trim,
        price: dom::int_from_digits(&price_text),
        odo,
        dealer: "Clutch".to_string(),
        location: delivery_city(doc).unwrap_or_else(|| "Online".to_string()),
        photos: extract_photos(doc, page),
        url: page.url().to_string(),
        source: SOURCE.to_string(),
        ..Listing::default()
    }
}

fn extract_specs(doc: &Html) -> HashMap<String, String> {
    let mut specs = HashMap::new();
    let (Ok(item_sel), Ok(label_sel), Ok(value_sel)) = (
        Selector::parse(r#"[class*="spec"], [class*="detail"], [class*="attribute"]"#),
        Selector::parse(r#"[class*="label"], dt, span:first-child"#),
        Selector::parse(r#"[class*="value"], dd, span:last-child"#),
    ) else {
        return specs;
    };
    for item in doc.select(&item_sel) {
        let label = item
            .select(&label_sel)
            .next()
            .map(|el| dom::text_of(&el).to_lowercase())
            .unwrap_or_default();
        let value = item
            .select(&value_sel)
            .next()
            .map(|el| dom::text_of(&el))
            .unwrap_or_default();
        if !label.is_empty() && !value.is_empty() {
            specs.insert(dom::attr_key(&label), value);
        }
    }
    specs
}

/// The odometer usually only appears as free text like "45,000 km".
fn body_kilometres(doc: &Html) -> Option<u32> {
    let selector = Selector::parse("body").ok()?;
    let body = doc.select(&selector).next()?;
    let text: String = body.text().collect();
    let caps = KM_RE.captures(&text)?;
    caps[1].replace(',', "").parse().ok()
}

fn delivery_city(doc: &Html) -> Option<String> {
    let selectors = [
        r#"[class*="location"]"#,
        r#"[class*="delivery"]"#,
        r#"[class*="available-in"]"#,
        r#"[class*="city"]"#,
    ];
    for raw in selectors {
        if let Some(element) = dom::first_element(doc, &[raw]) {
            let raw_text: String = element.text().collect();
            let trimmed = raw_text.trim();
            if !trimmed.is_empty() && !raw_text.contains("Delivery") {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

fn extract_photos(doc: &Html, page: &Page) -> Vec<String> {
    let selectors = [
        r#"[class*="gallery"] img"#,
        r#"[class*="carousel"] img"#,
        r#"[class*="Gallery"] img"#,
        r#"[class*="slider"] img"#,
        "picture img",
    ];

    for raw in selectors {
        let Ok(selector) = Selector::parse(raw) else {
            continue;
        };
        let photos: Vec<String> = doc
            .select(&selector)
            .filter_map(|img| dom::image_source(&img, &["src", "data-src"]))
            .map(|src| dom::absolutize(&src, page))
            .filter(|src| !src.contains("placeholder") && !src.contains("data:image"))
            .collect();
        if !photos.is_empty() {
            let mut photos = dom::dedup_preserving_order(photos);
            photos.truncate(10);
            return photos;
        }
    }
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> Page {
        Page::new(
            Url::parse("https://www.clutch.ca/vehicles/2023-chevrolet-bolt-ev-76427").unwrap(),
            html.to_string(),
        )
    }

    #[test]
    fn listing_paths_match() {
        let adapter = Clutch;
        for path in ["/vehicles/76427", "/vehicles/2023-chevrolet-bolt-ev-123456"] {
            let url = Url::parse(&format!("https://www.clutch.ca{path}")).unwrap();
            assert!(adapter.is_listing_page(&url), "{path}");
        }
        let browse = Url::parse("https://www.clutch.ca/vehicles").unwrap();
        assert!(!adapter.is_listing_page(&browse));
    }

    #[test]
    fn next_data_wins_over_the_dom() {
        let html = r#"<html><body>
            <h1>Totally different title</h1>
            <script id="__NEXT_DATA__" type="application/json">
              {"props":{"pageProps":{"vehicle":{
                "year":2023,"make":"Chevrolet","model":"Bolt EV","trim":"2LT",
                "price":38999,"odometer":21000,
                "location":{"city":"Halifax"},
                "images":["https://cdn.clutch.ca/1.jpg"],
                "vin":"1G1FY6S08P4100001"}}}}
            </script></body></html>"#;
        let listing = Clutch.extract(&page(html)).unwrap();
        assert_eq!(listing.year, 2023);
        assert_eq!(listing.model, "Bolt EV");
        assert_eq!(listing.price, 38999);
        assert_eq!(listing.odo, 21000);
        assert_eq!(listing.dealer, "Clutch");
        assert_eq!(listing.location, "Halifax");
        assert_eq!(listing.photos, vec!["https://cdn.clutch.ca/1.jpg".to_string()]);
        assert_eq!(listing.vin.as_deref(), Some("1G1FY6S08P4100001"));
    }

    #[test]
    fn dom_fallback_reads_body_kilometres_and_delivery_city() {
        let html = r#"<html><body>
            <h1>2022 Hyundai Kona Electric Preferred</h1>
            <div class="price">$31,499 all-in</div>
            <p>Driven 38,500 km. Inspected and reconditioned.</p>
            <div class="delivery-banner">Delivery to your door</div>
            <div class="available-in">Moncton</div>
        </body></html>"#;
        let listing = Clutch.extract(&page(html)).unwrap();
        assert_eq!(listing.year, 2022);
        assert_eq!(listing.make, "Hyundai");
        assert_eq!(listing.model, "Kona Electric");
        assert_eq!(listing.trim, "Preferred");
        assert_eq!(listing.price, 31499);
        assert_eq!(listing.odo, 38500);
        assert_eq!(listing.location, "Moncton");
    }

    #[test]
    fn missing_city_means_online() {
        let html = "<html><body><h1>2023 Kia EV6 Wind</h1></body></html>";
        let listing = Clutch.extract(&page(html)).unwrap();
        assert_eq!(listing.location, "Online");
        assert_eq!(listing.dealer, "Clutch");
    }
}
