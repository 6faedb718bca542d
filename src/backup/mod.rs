//! Versioned export/import of the whole collection.
//!
//! The document shape is `{version, exportedAt, cars, weights}`. Import is
//! all-or-nothing: a document without a `cars` array is rejected before the
//! store is touched, and absent weights fall back to the standard set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::scoring::Weights;
use crate::store::{SavedCar, Store, StoreError};

/// Format version written into every export.
pub const FORMAT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub cars: Vec<SavedCar>,
    pub weights: Weights,
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("backup document has no cars array")]
    MissingCars,
    #[error("malformed backup document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Snapshot the collection and the active weights.
pub async fn export(store: &dyn Store) -> Result<BackupDocument, StoreError> {
    Ok(BackupDocument {
        version: FORMAT_VERSION.to_string(),
        exported_at: Utc::now(),
        cars: store.cars().await?,
        weights: store.weights().await?,
    })
}

/// Replace the collection with the contents of `document`, returning the
/// number of cars imported.
pub async fn import(store: &dyn Store, document: Value) -> Result<usize, ImportError> {
    let Some(cars) = document.get("cars").filter(|value| value.is_array()) else {
        return Err(ImportError::MissingCars);
    };
    let cars: Vec<SavedCar> = serde_json::from_value(cars.clone())?;
    let weights = match document.get("weights") {
        Some(value) if !value.is_null() => serde_json::from_value(value.clone())?,
        _ => Weights::standard(),
    };

    let count = cars.len();
    store.replace_all(cars, weights).await?;
    info!("Imported {count} cars");
    Ok(count)
}
