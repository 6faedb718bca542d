//! Extraction pipeline.
//!
//! Ties the adapter registry to a fetched page: dispatch on host, gate on
//! listing URL and EV-ness, then extract. The settle delay gives pages that
//! hydrate client-side a moment before the EV check reads the DOM.

use std::time::Duration;

use tracing::{debug, instrument};

use crate::adapters::{self, Page};
use crate::config::Config;
use crate::listing::Listing;
use crate::store::Mode;

pub struct Extractor {
    mode: Mode,
    settle: Duration,
}

impl Extractor {
    pub fn new(mode: Mode, settle: Duration) -> Self {
        Self { mode, settle }
    }

    pub fn from_config(config: &Config, mode: Mode) -> Self {
        Self::new(mode, config.settle_delay())
    }

    /// Run the full detect/gate/extract sequence on one page.
    ///
    /// `None` covers every way a page can drop out: unknown host, not a
    /// listing page, non-EV in EV-only mode, or nothing extractable.
    #[instrument(skip_all, fields(url = %page.url()))]
    pub async fn run(&self, page: &Page) -> Option<Listing> {
        let Some(adapter) = adapters::adapter_for(page.host()) else {
            debug!("No adapter for host {}", page.host());
            return None;
        };
        if !adapter.is_listing_page(page.url()) {
            debug!("{}: not a listing page", adapter.name());
            return None;
        }

        tokio::time::sleep(self.settle).await;

        let is_ev = adapter.is_ev_listing(page);
        if self.mode == Mode::Ev && !is_ev {
            debug!("{}: skipping non-EV listing in EV-only mode", adapter.name());
            return None;
        }

        let mut listing = adapter.extract(page)?;
        listing.is_ev = is_ev;
        debug!(
            "{}: extracted {} {} {}",
            adapter.name(),
            listing.year,
            listing.make,
            listing.model
        );
        Some(listing)
    }
}
