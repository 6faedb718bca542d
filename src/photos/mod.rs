//! Thumbnail conversion for saved listings.
//!
//! Saved cars keep a handful of small inline thumbnails instead of remote
//! photo URLs, so the collection stays viewable after a listing is pulled.
//! Conversions run concurrently but results come back in photo order, and a
//! photo that cannot be fetched, decoded, or converted in time is dropped
//! rather than failing the save.

use std::time::Duration;

use base64::Engine;
use image::imageops::FilterType;
use once_cell::sync::Lazy;
use reqwest::Client;
use thiserror::Error;
use tracing::warn;

use crate::fetcher::client::USER_AGENT;

/// Longest edge of a generated thumbnail, in pixels.
const MAX_EDGE: u32 = 200;
const JPEG_QUALITY: u8 = 60;
/// Only the first few photos are converted to keep stored cars small.
const MAX_PHOTOS: usize = 3;

static IMAGE_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .connect_timeout(Duration::from_secs(5))
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to build HTTP client")
});

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("http error {0}")]
    Http(reqwest::StatusCode),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Convert the first photos of a listing into base64 JPEG data URLs.
///
/// Each conversion is bounded by `timeout`; failures and timeouts are logged
/// and skipped, so the result may be shorter than the input (or empty).
pub async fn thumbnails(urls: &[String], timeout: Duration) -> Vec<String> {
    let tasks: Vec<_> = urls
        .iter()
        .take(MAX_PHOTOS)
        .cloned()
        .map(|url| {
            tokio::spawn(async move {
                match tokio::time::timeout(timeout, thumbnail(&url)).await {
                    Ok(Ok(data_url)) => Some(data_url),
                    Ok(Err(err)) => {
                        warn!("Thumbnail conversion failed for {url}: {err}");
                        None
                    }
                    Err(_) => {
                        warn!("Thumbnail conversion timed out for {url}");
                        None
                    }
                }
            })
        })
        .collect();

    let mut out = Vec::new();
    for task in tasks {
        if let Ok(Some(data_url)) = task.await {
            out.push(data_url);
        }
    }
    out
}

async fn thumbnail(url: &str) -> Result<String, ThumbnailError> {
    let response = IMAGE_CLIENT
        .get(url)
        .send()
        .await
        .map_err(|e| ThumbnailError::Fetch(e.to_string()))?;
    if !response.status().is_success() {
        return Err(ThumbnailError::Http(response.status()));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| ThumbnailError::Fetch(e.to_string()))?;
    encode_thumbnail(&bytes)
}

fn encode_thumbnail(bytes: &[u8]) -> Result<String, ThumbnailError> {
    // JPEG has no alpha channel, so flatten straight to RGB
    let image = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = image.dimensions();
    let (target_w, target_h) = scaled_dimensions(width, height);
    let image = if (target_w, target_h) == (width, height) {
        image
    } else {
        image::imageops::resize(&image, target_w, target_h, FilterType::Triangle)
    };

    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    image.write_with_encoder(encoder)?;
    Ok(format!(
        "data:image/jpeg;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&buf)
    ))
}

/// Shrink to fit the longest edge into [`MAX_EDGE`], never upscaling.
fn scaled_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width > height && width > MAX_EDGE {
        (MAX_EDGE, (height * MAX_EDGE / width).max(1))
    } else if height > MAX_EDGE {
        ((width * MAX_EDGE / height).max(1), MAX_EDGE)
    } else {
        (width, height)
    }
}
