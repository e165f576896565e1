// src/network/http_version.rs
use std::fmt;
use std::str::FromStr;

use reqwest::ClientBuilder;

use crate::error::FetchError;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum HttpVersion {
    #[default]
    Auto,                // negotiate
    Http1Only,           // HTTP/1.1 only
    Http2,               // prefer HTTP/2, fall back to HTTP/1.1
    Http2PriorKnowledge, // HTTP/2 without fallback
}

impl HttpVersion {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVersion::Auto => "AUTO",
            HttpVersion::Http1Only => "HTTP1_ONLY",
            HttpVersion::Http2 => "HTTP2",
            HttpVersion::Http2PriorKnowledge => "HTTP2_PRIOR_KNOWLEDGE",
        }
    }

    pub fn supports_http2(&self) -> bool {
        !matches!(self, HttpVersion::Http1Only)
    }

    /// Whether the shared client can serve this version or a dedicated one must be built.
    pub(crate) fn needs_dedicated_client(&self) -> bool {
        matches!(self, HttpVersion::Http1Only | HttpVersion::Http2PriorKnowledge)
    }

    pub(crate) fn apply_to_builder(&self, builder: ClientBuilder) -> ClientBuilder {
        match self {
            HttpVersion::Auto | HttpVersion::Http2 => builder,
            HttpVersion::Http1Only => builder.http1_only(),
            HttpVersion::Http2PriorKnowledge => builder.http2_prior_knowledge(),
        }
    }
}

impl fmt::Display for HttpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpVersion {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "AUTO" | "" => Ok(HttpVersion::Auto),
            "HTTP1" | "HTTP1.1" | "HTTP1_ONLY" => Ok(HttpVersion::Http1Only),
            "HTTP2" => Ok(HttpVersion::Http2),
            "HTTP2_PRIOR_KNOWLEDGE" | "FORCE_HTTP2" | "HTTP2_ONLY" => Ok(HttpVersion::Http2PriorKnowledge),
            _ => Err(FetchError::invalid(format!(
                "invalid HTTP version '{}', expected one of AUTO, HTTP1_ONLY, HTTP2, HTTP2_PRIOR_KNOWLEDGE",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases_case_insensitively() {
        assert_eq!("http1.1".parse::<HttpVersion>().unwrap(), HttpVersion::Http1Only);
        assert_eq!("force_http2".parse::<HttpVersion>().unwrap(), HttpVersion::Http2PriorKnowledge);
        assert_eq!("".parse::<HttpVersion>().unwrap(), HttpVersion::Auto);
        assert!("spdy".parse::<HttpVersion>().is_err());
    }

    #[test]
    fn only_forced_versions_need_their_own_client() {
        assert!(!HttpVersion::Auto.needs_dedicated_client());
        assert!(!HttpVersion::Http2.needs_dedicated_client());
        assert!(HttpVersion::Http1Only.needs_dedicated_client());
        assert!(!HttpVersion::Http1Only.supports_http2());
    }
}
