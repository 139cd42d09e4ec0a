//! The remote platform API: typed response envelopes and the HTTP client.

pub mod client;
pub mod types;

pub use client::PlatformClient;
