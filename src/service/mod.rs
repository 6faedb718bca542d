//! Typed command layer over the collection.
//!
//! Every way of driving the system funnels through [`Service`]: the CLI
//! subcommands call it directly, and raw JSON messages in the tagged
//! `{"type": "SAVE_CAR", ...}` wire shape go through [`Service::dispatch`].
//! Replies are data, never panics; an unrecognized message type comes back
//! as an error reply.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::backup::{self, BackupDocument};
use crate::config::Config;
use crate::listing::Listing;
use crate::photos;
use crate::scoring::{self, Weights};
use crate::store::{CarPatch, Mode, SavedCar, Settings, Store, StoreError};

/// Message types [`Service::dispatch`] recognizes.
const MESSAGE_TYPES: &[&str] = &[
    "SAVE_CAR",
    "UPDATE_CAR",
    "DELETE_CAR",
    "GET_CARS",
    "CHECK_URL",
    "GET_WEIGHTS",
    "SAVE_WEIGHTS",
    "EXPORT_DATA",
    "IMPORT_DATA",
    "GET_SETTINGS",
    "SAVE_SETTINGS",
];

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    SaveCar {
        car: Listing,
    },
    #[serde(rename_all = "camelCase")]
    UpdateCar {
        car_id: i64,
        updates: CarPatch,
    },
    #[serde(rename_all = "camelCase")]
    DeleteCar {
        car_id: i64,
    },
    GetCars,
    CheckUrl {
        url: String,
    },
    GetWeights,
    SaveWeights {
        weights: Weights,
    },
    ExportData,
    ImportData {
        data: Value,
    },
    GetSettings,
    SaveSettings {
        settings: SettingsPatch,
    },
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub mode: Option<Mode>,
}

impl SettingsPatch {
    pub fn apply(self, settings: Settings) -> Settings {
        Settings {
            mode: self.mode.unwrap_or(settings.mode),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Reply {
    Saved { success: bool, car: SavedCar },
    Cars { cars: Vec<SavedCar> },
    UrlKnown { saved: bool },
    Weights { weights: Weights },
    Settings { settings: Settings },
    SettingsSaved { success: bool, settings: Settings },
    Export(BackupDocument),
    Done { success: bool },
    Failed { success: bool, error: String },
    UnknownType { error: String },
}

impl Reply {
    fn ok() -> Self {
        Reply::Done { success: true }
    }

    fn fail(err: impl ToString) -> Self {
        Reply::Failed {
            success: false,
            error: err.to_string(),
        }
    }
}

/// A saved car paired with its score under the active weights.
#[derive(Debug, Clone)]
pub struct RankedCar {
    pub car: SavedCar,
    pub score: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStats {
    pub total: usize,
    pub starred: usize,
    /// Rounded mean of the per-car scores; `None` for an empty collection.
    pub average_score: Option<u8>,
}

pub struct Service {
    store: Arc<dyn Store>,
    thumbnail_timeout: Duration,
}

impl Service {
    pub fn new(store: Arc<dyn Store>, thumbnail_timeout: Duration) -> Self {
        Self {
            store,
            thumbnail_timeout,
        }
    }

    pub fn from_config(store: Arc<dyn Store>, config: &Config) -> Self {
        Self::new(store, config.thumbnail_timeout())
    }

    /// Handle a raw JSON message. Unknown or missing `type` yields an error
    /// reply; a known type with a malformed payload yields a failure reply.
    pub async fn dispatch(&self, raw: Value) -> Reply {
        let known = raw
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|t| MESSAGE_TYPES.contains(&t));
        if !known {
            return Reply::UnknownType {
                error: "Unknown message type".to_string(),
            };
        }
        match serde_json::from_value::<Request>(raw) {
            Ok(request) => self.handle(request).await,
            Err(err) => Reply::fail(err),
        }
    }

    pub async fn handle(&self, request: Request) -> Reply {
        match request {
            Request::SaveCar { car } => self.save_car(car).await,
            Request::UpdateCar { car_id, updates } => {
                match self.store.update_car(car_id, updates).await {
                    Ok(car) => Reply::Saved { success: true, car },
                    Err(err) => Reply::fail(err),
                }
            }
            Request::DeleteCar { car_id } => match self.store.delete_car(car_id).await {
                Ok(()) => {
                    info!("Deleted car {car_id}");
                    Reply::ok()
                }
                Err(err) => Reply::fail(err),
            },
            Request::GetCars => match self.store.cars().await {
                Ok(cars) => Reply::Cars { cars },
                Err(err) => Reply::fail(err),
            },
            Request::CheckUrl { url } => match self.store.is_saved(&url).await {
                Ok(saved) => Reply::UrlKnown { saved },
                Err(err) => Reply::fail(err),
            },
            Request::GetWeights => match self.store.weights().await {
                Ok(weights) => Reply::Weights { weights },
                Err(err) => Reply::fail(err),
            },
            Request::SaveWeights { weights } => match self.store.save_weights(weights).await {
                Ok(()) => Reply::ok(),
                Err(err) => Reply::fail(err),
            },
            Request::ExportData => match backup::export(self.store.as_ref()).await {
                Ok(document) => Reply::Export(document),
                Err(err) => Reply::fail(err),
            },
            Request::ImportData { data } => {
                match backup::import(self.store.as_ref(), data).await {
                    Ok(count) => {
                        info!("Imported {count} cars");
                        Reply::ok()
                    }
                    Err(err) => Reply::fail(err),
                }
            }
            Request::GetSettings => match self.store.settings().await {
                Ok(settings) => Reply::Settings { settings },
                Err(err) => Reply::fail(err),
            },
            Request::SaveSettings { settings: patch } => {
                let current = match self.store.settings().await {
                    Ok(settings) => settings,
                    Err(err) => return Reply::fail(err),
                };
                match self.store.save_settings(patch.apply(current)).await {
                    Ok(settings) => Reply::SettingsSaved {
                        success: true,
                        settings,
                    },
                    Err(err) => Reply::fail(err),
                }
            }
        }
    }

    /// Persist an extracted listing, replacing its photos with inline
    /// thumbnails and keeping the original URLs alongside.
    async fn save_car(&self, car: Listing) -> Reply {
        let originals = car.photos.clone();
        let mut listing = car;
        listing.photos = photos::thumbnails(&originals, self.thumbnail_timeout).await;
        debug!(
            "Converted {} of {} photos to thumbnails",
            listing.photos.len(),
            originals.len()
        );

        match self.store.save_car(listing, Some(originals)).await {
            Ok(car) => Reply::Saved { success: true, car },
            Err(err) => Reply::fail(err),
        }
    }

    /// All saved cars scored under the active weights, best first.
    pub async fn ranked_cars(&self) -> Result<Vec<RankedCar>, StoreError> {
        let cars = self.store.cars().await?;
        let weights = self.store.weights().await?;
        let listings: Vec<Listing> = cars.iter().map(|car| car.listing.clone()).collect();
        Ok(scoring::rank(&listings, &weights)
            .into_iter()
            .map(|(index, score)| RankedCar {
                car: cars[index].clone(),
                score,
            })
            .collect())
    }

    pub async fn stats(&self) -> Result<CollectionStats, StoreError> {
        let ranked = self.ranked_cars().await?;
        let total = ranked.len();
        let starred = ranked.iter().filter(|entry| entry.car.starred).count();
        let average_score = if total == 0 {
            None
        } else {
            let sum: u32 = ranked.iter().map(|entry| u32::from(entry.score)).sum();
            Some((f64::from(sum) / total as f64).round() as u8)
        };
        Ok(CollectionStats {
            total,
            starred,
            average_score,
        })
    }
}
