// src/core/mod.rs
//! Backend access: the API contract and its HTTP client

pub mod api;
pub mod service_client;

pub use api::MessagingApi;
pub use service_client::{ApiClient, DEFAULT_TIMEOUT_SECS};
