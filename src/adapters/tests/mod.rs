use std::fs;

use url::Url;

use crate::adapters::{Page, adapter_for, adapters};

#[test]
fn test_dispatch_covers_every_registered_host() {
    for adapter in adapters() {
        let host = format!("www.{}", adapter.hostname());
        let found = adapter_for(&host).expect("registered host should dispatch");
        assert_eq!(found.name(), adapter.name());
    }
}

#[test]
fn test_dispatch_handles_subdomains_and_strangers() {
    assert_eq!(adapter_for("suv.autotrader.ca").map(|a| a.name()), Some("AutoTrader"));
    assert_eq!(adapter_for("www.kijiji.ca").map(|a| a.name()), Some("Kijiji"));
    assert!(adapter_for("www.example.com").is_none());
    assert!(adapter_for("").is_none());
}

#[test]
fn test_autotrader_structured_listing() {
    let page = load_fixture(
        "autotrader_jsonld.html",
        "https://www.autotrader.ca/a/chevrolet/bolt%20euv/red%20deer/ab/5_64933218_20230110",
    );
    let adapter = adapter_for("www.autotrader.ca").unwrap();

    assert!(adapter.is_listing_page(page.url()));
    assert!(adapter.is_ev_listing(&page));

    let listing = adapter.extract(&page).unwrap();
    assert_eq!(listing.year, 2023);
    assert_eq!(listing.make, "Chevrolet");
    assert_eq!(listing.model, "Bolt EUV");
    assert_eq!(listing.trim, "Premier");
    assert_eq!(listing.price, 37998);
    assert_eq!(listing.odo, 21450);
    assert_eq!(listing.dealer, "Red Deer Chevrolet");
    assert_eq!(listing.location, "Red Deer");
    assert_eq!(listing.photos.len(), 2);
    assert_eq!(listing.vin.as_deref(), Some("1G1FZ6S00P4100213"));
    assert_eq!(listing.source, "autotrader.ca");
    assert!(listing.url.contains("autotrader.ca"));
}

#[test]
fn test_autotrader_dom_fallback() {
    let page = load_fixture(
        "autotrader_dom.html",
        "https://www.autotrader.ca/a/hyundai/ioniq%205/grande-prairie/ab/5_64758293_20220930",
    );
    let adapter = adapter_for("autotrader.ca").unwrap();

    assert!(adapter.is_ev_listing(&page));
    let listing = adapter.extract(&page).unwrap();

    assert_eq!(listing.year, 2022);
    assert_eq!(listing.make, "Hyundai");
    assert_eq!(listing.model, "Ioniq 5");
    assert_eq!(listing.trim, "Preferred AWD");
    assert_eq!(listing.price, 41888);
    assert_eq!(listing.odo, 34120);
    assert_eq!(listing.dealer, "Go Auto Outlet");
    // No address on the page, so the city comes out of the URL.
    assert_eq!(listing.location, "Grande Prairie, AB");
    // Placeholder dropped, relative paths resolved, duplicate collapsed.
    assert_eq!(
        listing.photos,
        vec![
            "https://photos.autotrader.ca/ioniq5/front.jpg".to_string(),
            "https://www.autotrader.ca/photos/ioniq5/side.jpg".to_string(),
        ]
    );
    assert_eq!(listing.vin.as_deref(), Some("5NMS2DAJ7NH412345"));
}

#[test]
fn test_kijiji_private_ad() {
    let page = load_fixture(
        "kijiji_dom.html",
        "https://www.kijiji.ca/v-cars-trucks/red-deer/2020-chevrolet-bolt-ev-premier/1671234567",
    );
    let adapter = adapter_for("www.kijiji.ca").unwrap();

    assert!(adapter.is_listing_page(page.url()));
    assert!(adapter.is_ev_listing(&page));

    let listing = adapter.extract(&page).unwrap();
    assert_eq!(listing.year, 2020);
    assert_eq!(listing.model, "Bolt EV");
    assert_eq!(listing.trim, "Premier");
    // Price element is empty; the content attribute carries the number.
    assert_eq!(listing.price, 24500);
    assert_eq!(listing.odo, 61000);
    assert_eq!(listing.dealer, "Private Seller");
    assert_eq!(listing.location, "Red Deer, AB");
    assert_eq!(
        listing.photos,
        vec![
            "https://i.ebayimg.com/00/s/MTIwMFgxNjAw/z/abc/$_57.JPG".to_string(),
            "https://i.ebayimg.com/00/s/MTIwMFgxNjAw/z/def/$_57.JPG".to_string(),
        ]
    );
    assert_eq!(listing.source, "kijiji.ca");
}

#[test]
fn test_cargurus_used_prefix() {
    let page = load_fixture(
        "cargurus_jsonld.html",
        "https://www.cargurus.ca/Cars/inventorylisting/viewDetailsFilterViewInventoryListing.action",
    );
    let adapter = adapter_for("www.cargurus.ca").unwrap();

    assert!(adapter.is_listing_page(page.url()));
    assert!(adapter.is_ev_listing(&page));

    let listing = adapter.extract(&page).unwrap();
    assert_eq!(listing.year, 2021);
    assert_eq!(listing.make, "Tesla");
    assert_eq!(listing.model, "Model 3");
    assert_eq!(listing.trim, "Standard Range Plus");
    assert_eq!(listing.price, 42990);
    assert_eq!(listing.odo, 40200);
    assert_eq!(listing.dealer, "Downtown Motors");
    assert_eq!(listing.location, "Toronto");
    // A bare string image becomes a one-element list.
    assert_eq!(
        listing.photos,
        vec!["https://static.cargurus.ca/images/listings/model3.jpg".to_string()]
    );
}

fn load_fixture(name: &str, url: &str) -> Page {
    let html = fs::read_to_string(format!("src/adapters/tests/fixtures/{name}"))
        .expect("Failed to read test fixture");
    Page::new(Url::parse(url).expect("fixture url"), html)
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_adapters_never_panic_on_arbitrary_html(html in ".*") {
            let url = Url::parse("https://www.autotrader.ca/a/x/y/calgary/ab/5_123").unwrap();
            let page = Page::new(url, html);
            for adapter in adapters() {
                let _ = adapter.is_ev_listing(&page);
                let _ = adapter.extract(&page);
            }
        }

        #[test]
        fn test_dispatch_never_panics(host in ".*") {
            let _ = adapter_for(&host);
        }
    }
}
