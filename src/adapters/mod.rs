//! Site adapters for the supported marketplaces.
//!
//! Each adapter knows one site: how its listing URLs look, how to tell an
//! EV listing from the rest of the inventory, and where the vehicle data
//! lives on the page. Extraction prefers structured data (schema.org
//! JSON-LD, Next.js `__NEXT_DATA__`, inline script objects) and only falls
//! back to DOM scraping when none is present, so a site redesign degrades
//! the output instead of breaking it.

pub mod autotrader;
pub mod canadadrives;
pub mod cargurus;
pub mod clutch;
pub mod dom;
pub mod jsonld;
pub mod kijiji;
pub mod nextdata;
pub mod page;
pub mod title;

#[cfg(test)]
mod tests;

use url::Url;

pub use page::Page;

use crate::listing::Listing;

pub trait SiteAdapter: Send + Sync {
    /// Human-readable adapter name, used in logs.
    fn name(&self) -> &'static str;

    /// Hostname fragment the adapter claims, without the `www.` prefix.
    fn hostname(&self) -> &'static str;

    /// Value stamped into [`Listing::source`] for saved cars.
    fn source(&self) -> &'static str;

    /// Whether the URL points at a single vehicle listing rather than a
    /// search or browse page.
    fn is_listing_page(&self, url: &Url) -> bool;

    /// Whether the listing is for an electric vehicle.
    fn is_ev_listing(&self, page: &Page) -> bool;

    /// Pull a [`Listing`] out of the page. `None` means the page had
    /// nothing recognizable, not that extraction errored.
    fn extract(&self, page: &Page) -> Option<Listing>;
}

static ADAPTERS: &[&dyn SiteAdapter] = &[
    &autotrader::AutoTrader,
    &kijiji::Kijiji,
    &clutch::Clutch,
    &cargurus::CarGurus,
    &canadadrives::CanadaDrives,
];

/// All registered adapters, in dispatch order.
pub fn adapters() -> &'static [&'static dyn SiteAdapter] {
    ADAPTERS
}

/// Find the adapter responsible for a host. Subdomains dispatch to their
/// parent site, so `suv.autotrader.ca` still routes to AutoTrader.
pub fn adapter_for(host: &str) -> Option<&'static dyn SiteAdapter> {
    let host = host.strip_prefix("www.").unwrap_or(host);
    ADAPTERS
        .iter()
        .copied()
        .find(|adapter| host.contains(adapter.hostname()))
}
