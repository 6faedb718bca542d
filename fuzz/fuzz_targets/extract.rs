#![no_main]

use libfuzzer_sys::fuzz_target;
use url::Url;

use evscout::adapters::{self, Page};
use evscout::adapters::title::parse_title;

fuzz_target!(|data: &[u8]| {
    // Convert raw bytes to string, handling invalid UTF-8 gracefully
    let html = String::from_utf8_lossy(data).to_string();

    let url =
        Url::parse("https://www.autotrader.ca/a/chevrolet/bolt-ev/calgary/ab/5_100").unwrap();
    let page = Page::new(url, html.clone());

    // Adapters must never panic regardless of page content
    for adapter in adapters::adapters() {
        let _ = adapter.is_ev_listing(&page);
        let _ = adapter.extract(&page);
    }

    let _ = parse_title(&html);
});
