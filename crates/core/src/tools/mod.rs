//! HTTP clients for the external services the agents call.

pub mod medium;
pub mod unsplash;
pub mod web_search;

pub use medium::MediumClient;
pub use unsplash::UnsplashClient;
pub use web_search::{SearchClient, SearxClient};
