// src/network/mod.rs
pub mod client;
pub mod http_version;
pub mod proxy_config;
pub mod transport;

pub use client::HttpTransport;
pub use http_version::HttpVersion;
pub use proxy_config::ProxyConfig;
pub use transport::{Response, Transport};
