pub mod client;
pub mod errors;
pub mod pipeline;

pub use client::fetch;
pub use errors::FetchError;
