//! Bounded-concurrency batch HTTP fetching.
//!
//! A fixed pool of workers claims URLs from a shared cursor, runs each one under
//! its own timeout and writes the outcome into the slot of the URL it came from,
//! so results always come back in input order.

pub mod cli;
pub mod debug;
pub mod error;
pub mod network;
pub mod request;
pub mod utils;

use once_cell::sync::Lazy;
use reqwest::Client;

pub use debug::{is_debug, set_debug};
pub use error::{FetchError, RequestFailure, Result};
pub use network::{HttpTransport, HttpVersion, ProxyConfig, Response, Transport};
pub use request::{
    fetch_all, fetch_pool, fetch_requests, set_global_proxy, Dispatcher, FetchOptions, MaxConcurrency, RequestItem,
    RequestMeta, ResponseBody, ResultRecord, TransportOptions, DEFAULT_TIMEOUT_MS,
};

// Shared client, so connections are pooled across batches.
pub(crate) static GLOBAL_CLIENT: Lazy<Client> = Lazy::new(|| {
    network::client::client_builder()
        .build()
        .expect("Failed to create HTTP client")
});
