use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Decoded response payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(s) => Some(s),
            ResponseBody::Json(_) => None,
        }
    }
}

impl fmt::Display for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Text(s) => f.write_str(s),
            ResponseBody::Json(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RequestMeta {
    /// `"<start> -> <end>"` in local time.
    pub request_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// Normalized outcome of one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub url: String,
    pub ok: bool,
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<ResponseBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
    pub meta: RequestMeta,
}

impl ResultRecord {
    pub(crate) fn failure(url: &str, error: String, elapsed_ms: u64, meta: RequestMeta) -> Self {
        Self {
            url: url.to_string(),
            ok: false,
            status_code: None,
            body: None,
            headers: None,
            error: Some(error),
            elapsed_ms,
            meta,
        }
    }
}
