//! evscout saves used-vehicle listings from Canadian marketplaces and ranks
//! them with a weighted scoring model. Site adapters pull structured data out
//! of listing pages (JSON-LD, Next.js payloads, embedded scripts) and fall
//! back to DOM heuristics when a site ships none.

pub mod adapters;
pub mod backup;
pub mod catalog;
pub mod config;
pub mod extract;
pub mod fetcher;
pub mod listing;
pub mod photos;
pub mod scoring;
pub mod service;
pub mod store;
