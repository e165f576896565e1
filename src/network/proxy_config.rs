use reqwest::{ClientBuilder, Proxy};
use url::Url;

use crate::error::RequestFailure;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProxyConfig {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// `Some(false)` stops reqwest from picking up proxies from the environment.
    pub trust_env: Option<bool>,
}

impl ProxyConfig {
    /// One proxy for every scheme.
    pub fn from_url(proxy_url: impl Into<String>, username: Option<String>, password: Option<String>) -> Self {
        Self {
            all: Some(proxy_url.into()),
            username,
            password,
            ..Default::default()
        }
    }

    /// Separate proxies for plain and TLS traffic.
    pub fn from_parts(http: Option<String>, https: Option<String>) -> Self {
        Self { http, https, ..Default::default() }
    }

    fn authenticated_url(&self, proxy_url: &str) -> Result<String, RequestFailure> {
        if self.username.is_none() {
            return Ok(proxy_url.to_string());
        }
        let mut parsed = Url::parse(proxy_url).map_err(|e| RequestFailure::Proxy(e.to_string()))?;
        if let Some(user) = &self.username {
            parsed
                .set_username(user)
                .map_err(|_| RequestFailure::Proxy(format!("cannot set username on {}", proxy_url)))?;
        }
        parsed
            .set_password(self.password.as_deref())
            .map_err(|_| RequestFailure::Proxy(format!("cannot set password on {}", proxy_url)))?;
        Ok(parsed.to_string())
    }

    /// The proxy URL, credentials applied, that `target` should go through.
    pub(crate) fn select(&self, target: &str) -> Result<Option<String>, RequestFailure> {
        if let Some(all) = &self.all {
            return self.authenticated_url(all).map(Some);
        }

        let scheme = Url::parse(target)
            .map(|u| u.scheme().to_string())
            .map_err(|e| RequestFailure::Network(format!("invalid URL {}: {}", target, e)))?;
        let chosen = match scheme.as_str() {
            "http" => self.http.as_deref(),
            "https" => self.https.as_deref(),
            _ => None,
        };
        chosen.map(|p| self.authenticated_url(p)).transpose()
    }

    /// Installs the proxy matching `target`'s scheme on a client built for that target.
    pub(crate) fn apply_to_builder(&self, mut builder: ClientBuilder, target: &str) -> Result<ClientBuilder, RequestFailure> {
        if self.trust_env == Some(false) {
            builder = builder.no_proxy();
        }
        if let Some(proxy_url) = self.select(target)? {
            builder = builder.proxy(Proxy::all(proxy_url)?);
        }
        Ok(builder)
    }
}
