//! Air quality service for Aeris
//!
//! Fetches readings from the WAQI feed, normalizes every response shape
//! into a single record type, and detects an approximate location from
//! the public IP.

pub mod client;
pub mod location;
pub mod normalize;
pub mod types;

pub use client::FeedClient;
pub use location::{locate_by_ip, IpLocation};
pub use normalize::normalize;
pub use types::*;
