//! HTTP client machinery

pub mod client;

pub use client::{
    FetchOptions, FetchOutcome, FetchedResponse, HttpClientConfig, RetryingClient, StatusClass,
};
