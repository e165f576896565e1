// request/mod.rs

pub mod concurrency;
pub mod config;
pub mod executor;
pub mod request_item;
pub mod result_record;

pub use concurrency::{fetch_all, fetch_pool, fetch_requests, Dispatcher};
pub use config::{set_global_proxy, FetchOptions, MaxConcurrency, DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT_MS};
pub use executor::execute_single_request;
pub use request_item::{RequestItem, TransportOptions};
pub use result_record::{RequestMeta, ResponseBody, ResultRecord};
