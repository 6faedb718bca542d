//! JSON-document store.
//!
//! One file holds the whole collection: cars, weights, settings. Mutations
//! go through a write lock and land on disk via a temp-file rename, so a
//! crash mid-write leaves the previous document intact.

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::debug;

use super::{CarPatch, PricePoint, SavedCar, Settings, Store, StoreError};
use crate::listing::Listing;
use crate::scoring::Weights;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoreData {
    cars: Vec<SavedCar>,
    /// `None` until the user first adjusts weights; reads fall back to
    /// [`Weights::standard`].
    weights: Option<Weights>,
    settings: Settings,
}

pub struct JsonStore {
    path: PathBuf,
    state: RwLock<StoreData>,
}

impl JsonStore {
    /// Open the document at `path`, starting empty when the file does not
    /// exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let data = match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == ErrorKind::NotFound => StoreData::default(),
            Err(err) => return Err(err.into()),
        };
        debug!("Opened store at {}", path.display());
        Ok(Self {
            path,
            state: RwLock::new(data),
        })
    }

    async fn persist(&self, data: &StoreData) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(data)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &bytes).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for JsonStore {
    async fn cars(&self) -> Result<Vec<SavedCar>, StoreError> {
        Ok(self.state.read().await.cars.clone())
    }

    async fn save_car(
        &self,
        listing: Listing,
        original_photo_urls: Option<Vec<String>>,
    ) -> Result<SavedCar, StoreError> {
        let mut state = self.state.write().await;
        if !listing.url.is_empty()
            && state.cars.iter().any(|car| car.listing.url == listing.url)
        {
            return Err(StoreError::Duplicate(listing.url));
        }

        let now = Utc::now();
        // Ids are save timestamps; bump past collisions from same-millisecond
        // saves so deletes and updates stay unambiguous.
        let mut id = now.timestamp_millis();
        while state.cars.iter().any(|car| car.id == id) {
            id += 1;
        }

        let price_history = vec![PricePoint {
            price: listing.price,
            date: now.date_naive(),
        }];
        let car = SavedCar {
            listing,
            id,
            added_at: now,
            starred: false,
            price_history,
            original_photo_urls,
        };
        state.cars.push(car.clone());
        self.persist(&state).await?;
        Ok(car)
    }

    async fn update_car(&self, id: i64, patch: CarPatch) -> Result<SavedCar, StoreError> {
        let mut state = self.state.write().await;
        let car = state
            .cars
            .iter_mut()
            .find(|car| car.id == id)
            .ok_or(StoreError::NotFound(id))?;

        if let Some(new_price) = patch.price
            && new_price > 0
            && new_price != car.listing.price
        {
            let today = Utc::now().date_naive();
            match car.price_history.iter_mut().find(|point| point.date == today) {
                Some(point) => point.price = new_price,
                None => car.price_history.push(PricePoint {
                    price: new_price,
                    date: today,
                }),
            }
        }

        patch.apply(car);
        let updated = car.clone();
        self.persist(&state).await?;
        Ok(updated)
    }

    async fn delete_car(&self, id: i64) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.cars.retain(|car| car.id != id);
        self.persist(&state).await
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<SavedCar>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .cars
            .iter()
            .find(|car| car.listing.url == url)
            .cloned())
    }

    async fn is_saved(&self, url: &str) -> Result<bool, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .cars
            .iter()
            .any(|car| car.listing.url == url))
    }

    async fn toggle_star(&self, id: i64) -> Result<SavedCar, StoreError> {
        let mut state = self.state.write().await;
        let car = state
            .cars
            .iter_mut()
            .find(|car| car.id == id)
            .ok_or(StoreError::NotFound(id))?;
        car.starred = !car.starred;
        let updated = car.clone();
        self.persist(&state).await?;
        Ok(updated)
    }

    async fn weights(&self) -> Result<Weights, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .weights
            .unwrap_or_else(Weights::standard))
    }

    async fn save_weights(&self, weights: Weights) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.weights = Some(weights);
        self.persist(&state).await
    }

    async fn settings(&self) -> Result<Settings, StoreError> {
        Ok(self.state.read().await.settings)
    }

    async fn save_settings(&self, settings: Settings) -> Result<Settings, StoreError> {
        let mut state = self.state.write().await;
        state.settings = settings;
        self.persist(&state).await?;
        Ok(settings)
    }

    async fn replace_all(&self, cars: Vec<SavedCar>, weights: Weights) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.cars = cars;
        state.weights = Some(weights);
        self.persist(&state).await
    }
}
