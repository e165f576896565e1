use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT_ENCODING};
use reqwest::{Client, Method, RequestBuilder};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::RequestFailure;
use crate::network::{HttpVersion, ProxyConfig, Response, Transport};
use crate::request::config::GLOBAL_PROXY;
use crate::request::RequestItem;
use crate::GLOBAL_CLIENT;

pub(crate) const USER_AGENT: &str = concat!("rusty-fetch/", env!("CARGO_PKG_VERSION"), " reqwest/0.11");

pub(crate) fn client_builder() -> reqwest::ClientBuilder {
    Client::builder()
        .gzip(true)
        .brotli(true)
        .deflate(true)
        .user_agent(USER_AGENT)
}

/// Builds a one-off client for requests whose proxy, protocol or TLS settings
/// differ from the shared client.
pub(crate) fn create_client(
    url: &str,
    proxy_config: Option<&ProxyConfig>,
    http_version: HttpVersion,
    ssl_verify: bool,
) -> Result<Client, RequestFailure> {
    let mut builder = http_version.apply_to_builder(client_builder());
    if !ssl_verify {
        builder = builder.danger_accept_invalid_certs(true);
    }
    if let Some(proxy_config) = proxy_config {
        builder = proxy_config.apply_to_builder(builder, url)?;
    }
    Ok(builder.build()?)
}

/// [`Transport`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Uses the process-wide client so connections are pooled across batches.
    pub fn shared() -> Self {
        Self::new(GLOBAL_CLIENT.clone())
    }

    async fn build(&self, request: &RequestItem) -> Result<RequestBuilder, RequestFailure> {
        let opts = &request.options;
        let proxy = match &opts.proxy {
            Some(p) => Some(p.clone()),
            None => GLOBAL_PROXY.lock().await.clone(),
        };
        let http_version = opts.http_version.unwrap_or_default();
        let ssl_verify = opts.ssl_verify.unwrap_or(true);

        let client = if proxy.is_some() || http_version.needs_dedicated_client() || !ssl_verify {
            create_client(&request.url, proxy.as_ref(), http_version, ssl_verify)?
        } else {
            self.client.clone()
        };

        let method = opts.method.clone().unwrap_or(Method::GET);
        let mut builder = client.request(method.clone(), &request.url);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
        for (name, value) in &opts.headers {
            match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
                (Ok(h_name), Ok(h_val)) => {
                    headers.insert(h_name, h_val);
                }
                _ => warn!(url = %request.url, header = %name, "skipping malformed header"),
            }
        }
        builder = builder.headers(headers);

        // GET/DELETE carry params in the query string, everything else as JSON.
        if let Some(params) = &opts.params {
            builder = match method {
                Method::GET | Method::DELETE => match params.as_object() {
                    Some(obj) => {
                        let pairs: Vec<(String, String)> = obj
                            .iter()
                            .map(|(k, v)| match v {
                                serde_json::Value::String(s) => (k.clone(), s.clone()),
                                other => (k.clone(), other.to_string()),
                            })
                            .collect();
                        builder.query(&pairs)
                    }
                    None => builder,
                },
                _ => builder.json(params),
            };
        }

        if let Some(body) = &opts.body {
            builder = builder.body(body.clone());
        }

        Ok(builder)
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::shared()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn perform(&self, request: &RequestItem, cancel: &CancellationToken) -> Result<Response, RequestFailure> {
        let builder = self.build(request).await?;

        let exchange = async {
            let res = builder.send().await?;
            let status = res.status();
            let headers = res.headers().clone();
            let body = res.bytes().await?;
            Ok::<_, RequestFailure>(Response::new(status, body).with_headers(headers))
        };

        tokio::select! {
            _ = cancel.cancelled() => Err(RequestFailure::Cancelled),
            res = exchange => res,
        }
    }
}
