pub mod client;
pub mod documents;
pub mod models;

pub use client::AirQualityClient;
pub use documents::DocumentStore;
