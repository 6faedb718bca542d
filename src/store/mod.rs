//! Persistence for the saved-car collection.
//!
//! The [`Store`] trait is the seam the service layer talks through; the
//! shipped implementation is [`JsonStore`], a single JSON document on disk.
//! Saved cars keep the extracted listing intact (flattened into the same
//! object, matching the exported document shape) and add bookkeeping:
//! identity, save time, star flag, and a per-day price history.

pub mod json;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use json::JsonStore;

use crate::listing::{Listing, RemoteStart, de_remote_start};
use crate::scoring::Weights;

/// Which listings the pipeline keeps: EVs only, or everything it can parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Ev,
    #[default]
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub mode: Mode,
}

/// One observed price on one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub price: u32,
    pub date: NaiveDate,
}

/// A listing after saving: the extracted fields plus store bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCar {
    #[serde(flatten)]
    pub listing: Listing,
    /// Epoch milliseconds at save time.
    pub id: i64,
    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub price_history: Vec<PricePoint>,
    /// Full-size source URLs, kept when `photos` was replaced by thumbnails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_photo_urls: Option<Vec<String>>,
}

/// Partial update for a saved car. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarPatch {
    pub year: Option<i32>,
    pub make: Option<String>,
    pub model: Option<String>,
    pub trim: Option<String>,
    pub price: Option<u32>,
    pub odo: Option<u32>,
    pub range: Option<u32>,
    pub length: Option<u32>,
    pub trim_level: Option<u8>,
    pub distance: Option<u8>,
    pub damage: Option<u8>,
    pub heat_pump: Option<bool>,
    #[serde(deserialize_with = "de_remote_start")]
    pub remote_start: Option<RemoteStart>,
    pub dealer: Option<String>,
    pub location: Option<String>,
    pub vin: Option<String>,
    pub starred: Option<bool>,
}

impl CarPatch {
    /// Copy the present fields onto the car. Price history is the store's
    /// job and is handled before this runs.
    fn apply(self, car: &mut SavedCar) {
        let listing = &mut car.listing;
        if let Some(year) = self.year {
            listing.year = year;
        }
        if let Some(make) = self.make {
            listing.make = make;
        }
        if let Some(model) = self.model {
            listing.model = model;
        }
        if let Some(trim) = self.trim {
            listing.trim = trim;
        }
        if let Some(price) = self.price {
            listing.price = price;
        }
        if let Some(odo) = self.odo {
            listing.odo = odo;
        }
        if let Some(range) = self.range {
            listing.range = Some(range);
        }
        if let Some(length) = self.length {
            listing.length = Some(length);
        }
        if let Some(trim_level) = self.trim_level {
            listing.trim_level = Some(trim_level);
        }
        if let Some(distance) = self.distance {
            listing.distance = Some(distance);
        }
        if let Some(damage) = self.damage {
            listing.damage = Some(damage);
        }
        if let Some(heat_pump) = self.heat_pump {
            listing.heat_pump = Some(heat_pump);
        }
        if let Some(remote_start) = self.remote_start {
            listing.remote_start = Some(remote_start);
        }
        if let Some(dealer) = self.dealer {
            listing.dealer = dealer;
        }
        if let Some(location) = self.location {
            listing.location = location;
        }
        if let Some(vin) = self.vin {
            listing.vin = Some(vin);
        }
        if let Some(starred) = self.starred {
            car.starred = starred;
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("car {0} not found")]
    NotFound(i64),
    #[error("a car with url '{0}' is already saved")]
    Duplicate(String),
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("store serialization: {0}")]
    Serde(#[from] serde_json::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// All saved cars, in save order.
    async fn cars(&self) -> Result<Vec<SavedCar>, StoreError>;

    /// Save a freshly extracted listing. Rejects a second save of the same
    /// non-empty URL with [`StoreError::Duplicate`].
    async fn save_car(
        &self,
        listing: Listing,
        original_photo_urls: Option<Vec<String>>,
    ) -> Result<SavedCar, StoreError>;

    /// Apply a partial update. A changed positive price lands in the price
    /// history: the same day's entry is replaced, otherwise a new point is
    /// appended.
    async fn update_car(&self, id: i64, patch: CarPatch) -> Result<SavedCar, StoreError>;

    /// Remove a car. Deleting an unknown id is not an error.
    async fn delete_car(&self, id: i64) -> Result<(), StoreError>;

    async fn find_by_url(&self, url: &str) -> Result<Option<SavedCar>, StoreError>;

    /// Whether any saved car has exactly this URL.
    async fn is_saved(&self, url: &str) -> Result<bool, StoreError>;

    async fn toggle_star(&self, id: i64) -> Result<SavedCar, StoreError>;

    /// Stored weights, or [`Weights::standard`] when none were saved yet.
    async fn weights(&self) -> Result<Weights, StoreError>;

    async fn save_weights(&self, weights: Weights) -> Result<(), StoreError>;

    async fn settings(&self) -> Result<Settings, StoreError>;

    async fn save_settings(&self, settings: Settings) -> Result<Settings, StoreError>;

    /// Swap in a full collection, e.g. from an imported backup.
    async fn replace_all(&self, cars: Vec<SavedCar>, weights: Weights) -> Result<(), StoreError>;
}
