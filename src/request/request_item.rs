use reqwest::Method;
use serde_json::Value;

use crate::network::{HttpVersion, ProxyConfig};

/// Options handed through to the transport. Opaque to the dispatcher.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransportOptions {
    pub method: Option<Method>,
    pub headers: Vec<(String, String)>,
    /// Query string for GET/DELETE, JSON body otherwise.
    pub params: Option<Value>,
    pub body: Option<String>,
    pub proxy: Option<ProxyConfig>,
    pub http_version: Option<HttpVersion>,
    pub ssl_verify: Option<bool>,
}

impl TransportOptions {
    /// Fills unset fields from `defaults`. Headers from `defaults` come first so
    /// that our own headers win when the transport inserts them in order.
    pub fn or(&self, defaults: &TransportOptions) -> TransportOptions {
        let mut headers = defaults.headers.clone();
        headers.extend(self.headers.iter().cloned());
        TransportOptions {
            method: self.method.clone().or_else(|| defaults.method.clone()),
            headers,
            params: self.params.clone().or_else(|| defaults.params.clone()),
            body: self.body.clone().or_else(|| defaults.body.clone()),
            proxy: self.proxy.clone().or_else(|| defaults.proxy.clone()),
            http_version: self.http_version.or(defaults.http_version),
            ssl_verify: self.ssl_verify.or(defaults.ssl_verify),
        }
    }
}

/// One entry of a batch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestItem {
    pub url: String,
    /// Overrides the batch timeout for this request only.
    pub timeout_ms: Option<u64>,
    pub tag: Option<String>,
    pub options: TransportOptions,
}

impl RequestItem {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_options(mut self, options: TransportOptions) -> Self {
        self.options = options;
        self
    }

    pub(crate) fn method_name(&self) -> &str {
        self.options.method.as_ref().map_or("GET", |m| m.as_str())
    }
}

impl From<&str> for RequestItem {
    fn from(url: &str) -> Self {
        RequestItem::new(url)
    }
}

impl From<String> for RequestItem {
    fn from(url: String) -> Self {
        RequestItem::new(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_options_win_over_batch_defaults() {
        let defaults = TransportOptions {
            method: Some(Method::POST),
            headers: vec![("x-batch".into(), "1".into()), ("x-shared".into(), "batch".into())],
            ssl_verify: Some(false),
            ..Default::default()
        };
        let own = TransportOptions {
            headers: vec![("x-shared".into(), "item".into())],
            http_version: Some(HttpVersion::Http1Only),
            ..Default::default()
        };

        let merged = own.or(&defaults);
        assert_eq!(merged.method, Some(Method::POST));
        assert_eq!(merged.http_version, Some(HttpVersion::Http1Only));
        assert_eq!(merged.ssl_verify, Some(false));
        assert_eq!(merged.headers.last().unwrap(), &("x-shared".to_string(), "item".to_string()));
        assert_eq!(merged.headers.len(), 3);
    }
}
