use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use once_cell::sync::Lazy;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::{FetchError, Result};
use crate::network::ProxyConfig;
use crate::request::TransportOptions;

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_CONCURRENCY: usize = 6;

const CONCURRENCY_CONSTRAINT: &str = "maxConcurrency must be an integer >= 1";

// Fallback proxy for requests that name none.
pub(crate) static GLOBAL_PROXY: Lazy<Mutex<Option<ProxyConfig>>> = Lazy::new(|| Mutex::new(None));

pub async fn set_global_proxy(proxy: Option<ProxyConfig>) {
    let mut global = GLOBAL_PROXY.lock().await;
    *global = proxy;
}

/// A validated concurrency cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MaxConcurrency(NonZeroUsize);

impl MaxConcurrency {
    pub fn new(value: usize) -> Result<Self> {
        NonZeroUsize::new(value)
            .map(MaxConcurrency)
            .ok_or_else(|| FetchError::invalid(CONCURRENCY_CONSTRAINT))
    }

    /// Accepts only integer literals; "1.5", "-3" and "hello" are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| FetchError::invalid(CONCURRENCY_CONSTRAINT))
            .and_then(MaxConcurrency::try_from)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<i64> for MaxConcurrency {
    type Error = FetchError;

    fn try_from(value: i64) -> Result<Self> {
        let value = usize::try_from(value).map_err(|_| FetchError::invalid(CONCURRENCY_CONSTRAINT))?;
        MaxConcurrency::new(value)
    }
}

impl TryFrom<f64> for MaxConcurrency {
    type Error = FetchError;

    fn try_from(value: f64) -> Result<Self> {
        if !value.is_finite() || value.fract() != 0.0 || value < 1.0 || value > usize::MAX as f64 {
            return Err(FetchError::invalid(CONCURRENCY_CONSTRAINT));
        }
        MaxConcurrency::new(value as usize)
    }
}

impl FromStr for MaxConcurrency {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self> {
        MaxConcurrency::parse(s)
    }
}

/// Batch-wide settings for one dispatch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub max_concurrency: usize,
    pub timeout_ms: u64,
    pub transport: TransportOptions,
    /// Cancelling this token fails every pending and future request in the batch.
    pub cancel: Option<CancellationToken>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            transport: TransportOptions::default(),
            cancel: None,
        }
    }
}

impl FetchOptions {
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency,
            ..Default::default()
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<MaxConcurrency> {
        if self.timeout_ms == 0 {
            return Err(FetchError::invalid("timeout must be a positive number of milliseconds"));
        }
        MaxConcurrency::new(self.max_concurrency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint_error() -> FetchError {
        FetchError::InvalidArgument(CONCURRENCY_CONSTRAINT.to_string())
    }

    #[test]
    fn rejects_non_positive_and_non_integer_concurrency() {
        for raw in ["0", "-3", "1.5", "hello", ""] {
            assert_eq!(MaxConcurrency::parse(raw), Err(constraint_error()), "input {:?}", raw);
        }
        assert_eq!(MaxConcurrency::try_from(1.5_f64), Err(constraint_error()));
        assert_eq!(MaxConcurrency::try_from(f64::NAN), Err(constraint_error()));
        assert_eq!(MaxConcurrency::try_from(-3_i64), Err(constraint_error()));
        assert_eq!(MaxConcurrency::new(0), Err(constraint_error()));
    }

    #[test]
    fn accepts_positive_integers() {
        assert_eq!(MaxConcurrency::parse(" 4 ").unwrap().get(), 4);
        assert_eq!(MaxConcurrency::try_from(2.0_f64).unwrap().get(), 2);
        assert_eq!("10".parse::<MaxConcurrency>().unwrap().get(), 10);
    }

    #[test]
    fn error_message_names_the_constraint() {
        let err = FetchOptions::new(0).validate().unwrap_err();
        assert!(err.to_string().contains("maxConcurrency must be an integer >= 1"));
    }

    #[test]
    fn defaults() {
        let opts = FetchOptions::default();
        assert_eq!(opts.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(opts.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert!(FetchOptions::new(3).with_timeout_ms(0).validate().is_err());
    }
}
