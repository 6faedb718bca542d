//! CarGurus.ca adapter.
//!
//! CarGurus pages carry up to three data sources, tried in order: a
//! schema.org block, a `listingData`/`vehicleData` object assigned inline in
//! a script tag, and finally the DOM. Titles are prefixed with "Used" or
//! "Certified", which has to go before the year/make/model split.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

use crate::adapters::page::Page;
use crate::adapters::{SiteAdapter, dom, jsonld, title};
use crate::catalog;
use crate::listing::Listing;

static INVENTORY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(Cars/inventorylisting|inventory)/").expect("valid inventory pattern")
});
static VDP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/vdp/\d+").expect("valid vdp pattern"));
static SALE_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)used|new|certified").expect("valid sale word pattern"));
static EMBEDDED_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:listingData|vehicleData)\s*[=:]\s*(\{[^;]+\})")
        .expect("valid embedded data pattern")
});
static SPACE_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static ADDRESS_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Address:?\s*").expect("valid address prefix pattern"));

const SOURCE: &str = "cargurus.ca";

pub struct CarGurus;

impl SiteAdapter for CarGurus {
    fn name(&self) -> &'static str {
        "CarGurus"
    }

    fn hostname(&self) -> &'static str {
        "cargurus.ca"
    }

    fn source(&self) -> &'static str {
        SOURCE
    }

    fn is_listing_page(&self, url: &Url) -> bool {
        let path = url.path();
        INVENTORY_RE.is_match(path) || VDP_RE.is_match(path)
    }

    fn is_ev_listing(&self, page: &Page) -> bool {
        let doc = page.document();
        if let Some(fuel) = dom::text_of_first(&doc, &[r#"[data-cg-ft="fuel_type"]"#])
            && fuel.to_lowercase().contains("electric")
        {
            return true;
        }
        let heading = dom::text_of_first(&doc, &["h1"]).unwrap_or_default();
        catalog::is_likely_ev(&heading)
    }

    fn extract(&self, page: &Page) -> Option<Listing> {
        let doc = page.document();
        if let Some(block) = jsonld::find_typed(&doc, &["Car", "Vehicle"], false) {
            return Some(from_json_ld(&block, page));
        }
        if let Some(data) = embedded_data(&doc) {
            return Some(from_embedded(&data, page));
        }
        Some(from_dom(&doc, page))
    }
}

/// "Used 2023 Chevrolet Bolt EV" parses like any other title once the sale
/// words are stripped.
fn parse_title(raw: &str) -> title::TitleParts {
    let clean = SALE_WORD_RE.replace_all(raw, "");
    title::parse_title(clean.trim())
}

fn embedded_data(doc: &Html) -> Option<Value> {
    let selector = Selector::parse("script").ok()?;
    for script in doc.select(&selector) {
        let text: String = script.text().collect();
        if !text.contains("listingData") && !text.contains("vehicleData") {
            continue;
        }
        if let Some(caps) = EMBEDDED_DATA_RE.captures(&text)
            && let Ok(data) = serde_json::from_str::<Value>(&caps[1])
        {
            return Some(data);
        }
    }
    None
}

fn from_json_ld(block: &Value, page: &Page) -> Listing {
    let name = jsonld::str_at(block, &["name"]).unwrap_or_default();
    let parts = parse_title(name);

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
        price: jsonld::u32_at(block, &["offers", "price"]).unwrap_or(0),
        odo: jsonld::u32_at(block, &["mileageFromOdometer", "value"]).unwrap_or(0),
        dealer: jsonld::str_at(block, &["seller", "name"]).unwrap_or_default().to_string(),
        location: jsonld::str_at(block, &["seller", "address", "addressLocality"])
            .unwrap_or_default()
            .to_string(),
        photos: block.get("image").map(jsonld::string_list).unwrap_or_default(),
        url: page.url().to_string(),
        source: SOURCE.to_string(),
        ..Listing::default()
    }
}

fn from_embedded(data: &Value, page: &Page) -> Listing {
    Listing {
        year: data
            .get("year")
            .and_then(jsonld::as_int)
            .and_then(|y| i32::try_from(y).ok())
            .unwrap_or(0),
        make: jsonld::str_at(data, &["make"]).unwrap_or_default().to_string(),
        model: jsonld::str_at(data, &["model"]).unwrap_or_default().to_string(),
        trim: jsonld::str_at(data, &["trim"]).unwrap_or_default().to_string(),
        price: jsonld::first_int(data, &[&["price"], &["listPrice"]])
            .and_then(|p| u32::try_from(p).ok())
            .unwrap_or(0),
        odo: jsonld::first_int(data, &[&["mileage"], &["odometer"]])
            .and_then(|o| u32::try_from(o).ok())
            .unwrap_or(0),
        dealer: jsonld::str_at(data, &["dealerName"]).unwrap_or_default().to_string(),
        location: jsonld::first_str(data, &[&["dealerCity"], &["dealerLocation"]])
            .unwrap_or_default()
            .to_string(),
        photos: data.get("images").map(jsonld::string_list).unwrap_or_default(),
        url: page.url().to_string(),
        source: SOURCE.to_string(),
        ..Listing::default()
    }
}

fn from_dom(doc: &Html, page: &Page) -> Listing {
    let heading = dom::text_of_first(doc, &[r#"h1[class*="listing"]"#, "h1"]).unwrap_or_default();
    let parts = parse_title(&heading);

    let price_text = dom::text_of_first(doc, &[r#"[class*="price"], [data-cg-ft="price"]"#])
        .unwrap_or_default();
    let odo_text = dom::text_of_first(doc, &[r#"[data-cg-ft="mileage"], [class*="mileage"]"#])
        .unwrap_or_default();
    let dealer = dom::text_of_first(doc, &[r#"[class*="dealer-name"], [data-cg-ft="dealer"]"#])
        .unwrap_or_default();

    Listing {
        year: parts.year,
        make: parts.make,
        model: parts.model,
        trim: parts.trim,
        price: dom::int_from_digits(&price_text),
        odo: dom::int_from_digits(&odo_text),
        dealer,
        location: dealer_address(doc).unwrap_or_default(),
        photos: extract_photos(doc),
        url: page.url().to_string(),
        source: SOURCE.to_string(),
        ..Listing::default()
    }
}

fn dealer_address(doc: &Html) -> Option<String> {
    let text = dom::first_nonempty_text(
        doc,
        &[
            r#"[class*="dealer-location"]"#,
            r#"[class*="dealerLocation"]"#,
            r#"[class*="dealer-address"]"#,
            r#"[class*="address"]"#,
            r#"[data-cg-ft="dealer-address"]"#,
            r#"[itemprop="address"]"#,
        ],
    )?;
    let collapsed = SPACE_RUN_RE.replace_all(&text, " ");
    Some(ADDRESS_PREFIX_RE.replace(&collapsed, "").into_owned())
}

fn extract_photos(doc: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(r#"[class*="gallery"] img, [class*="media"] img"#) else {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn page(html: &str) -> Page {
        Page::new(
            Url::parse("https://www.cargurus.ca/Cars/inventorylisting/vdp.action?listing=1")
                .unwrap(),
            html.to_string(),
        )
    }

    #[test]
    fn inventory_and_vdp_paths_match() {
        let adapter = CarGurus;
        for path in [
            "/Cars/inventorylisting/viewDetailsFilterViewInventoryListing.action",
            "/inventory/m4",
            "/vdp/329751234",
        ] {
            let url = Url::parse(&format!("https://www.cargurus.ca{path}")).unwrap();
            assert!(adapter.is_listing_page(&url), "{path}");
        }
        let home = Url::parse("https://www.cargurus.ca/").unwrap();
        assert!(!adapter.is_listing_page(&home));
    }

    #[test]
    fn sale_words_are_stripped_before_parsing() {
        let parts = parse_title("Used 2021 Tesla Model 3 Standard Range Plus");
        assert_eq!(parts.year, 2021);
        assert_eq!(parts.make, "Tesla");
        assert_eq!(parts.model, "Model 3");
        assert_eq!(parts.trim, "Standard Range Plus");
    }

    #[test]
    fn embedded_listing_data_is_parsed_out_of_scripts() {
        let html = r#"<html><body>
            <script>window.analytics = {};</script>
            <script>
              var listingData = {"year":2022,"make":"Kia","model":"EV6",
                "trim":"GT-Line","listPrice":45999,"mileage":30500,
                "dealerName":"Kia West","dealerCity":"Coquitlam",
                "images":["https://static.cargurus.ca/1.jpg"]};
            </script></body></html>"#;
        let listing = CarGurus.extract(&page(html)).unwrap();
        assert_eq!(listing.year, 2022);
        assert_eq!(listing.model, "EV6");
        assert_eq!(listing.trim, "GT-Line");
        assert_eq!(listing.price, 45999);
        assert_eq!(listing.odo, 30500);
        assert_eq!(listing.dealer, "Kia West");
        assert_eq!(listing.location, "Coquitlam");
        assert_eq!(listing.photos.len(), 1);
    }

    #[test]
    fn dealer_address_is_collapsed_and_unprefixed() {
        let doc = Html::parse_document(
            r#"<div class="dealer-location">Address:
                  123 Main St,
                  Kelowna, BC</div>"#,
        );
        assert_eq!(
            dealer_address(&doc).as_deref(),
            Some("123 Main St, Kelowna, BC")
        );
    }
}
