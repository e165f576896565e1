//! Helpers for the `rusty-fetch` binary.

use crate::error::{FetchError, Result};
use crate::request::ResultRecord;

pub const USAGE: &str = "\
Usage: rusty-fetch <maxConcurrency> '<urls>'
  <maxConcurrency>: integer >= 1
  <urls>: JSON array OR comma-separated list

Examples:
  rusty-fetch 2 https://example.com,https://google.com
  rusty-fetch 3 '[\"https://example.com\",\"https://google.com\"]'";

/// A JSON array of strings, or else a comma-separated list with blanks dropped.
pub fn parse_urls(arg: &str) -> Vec<String> {
    if let Ok(urls) = serde_json::from_str::<Vec<String>>(arg) {
        return urls;
    }
    arg.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// `"Name: value"` to a header pair.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim().to_string(), value.trim().to_string())),
        _ => Err(FetchError::invalid(format!("header must look like 'Name: value', got '{}'", raw))),
    }
}

/// Rejects a zero timeout before any request is built.
pub fn parse_timeout_ms(ms: u64) -> Result<u64> {
    if ms == 0 {
        return Err(FetchError::invalid("--timeout-ms must be a positive number of milliseconds."));
    }
    Ok(ms)
}

pub fn render_line(index: usize, record: &ResultRecord) -> String {
    if !record.ok {
        let reason = record
            .error
            .clone()
            .or_else(|| record.status_code.map(|s| s.to_string()))
            .unwrap_or_default();
        return format!("[{}] ❌  {}  ->  ERROR: {}", index, record.url, reason);
    }

    let preview = record.body.as_ref().map(|b| b.to_string()).unwrap_or_default();
    format!(
        "[{}] ✅  {}  (status: {}, {}ms) -> {}",
        index,
        record.url,
        record.status_code.unwrap_or_default(),
        record.elapsed_ms,
        preview
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{RequestMeta, ResponseBody};

    #[test]
    fn urls_from_json_or_commas() {
        assert_eq!(parse_urls(r#"["http://a","http://b"]"#), vec!["http://a", "http://b"]);
        assert_eq!(parse_urls(" http://a , ,http://b,"), vec!["http://a", "http://b"]);
        assert!(parse_urls(" , ").is_empty());
        // not an array of strings, so it is split on commas
        assert_eq!(parse_urls("[1,2]"), vec!["[1", "2]"]);
    }

    #[test]
    fn zero_timeout_is_a_usage_error() {
        assert!(matches!(parse_timeout_ms(0), Err(FetchError::InvalidArgument(_))));
        assert_eq!(parse_timeout_ms(250), Ok(250));
    }

    #[test]
    fn headers_need_a_name() {
        assert_eq!(
            parse_header("Authorization: Bearer x:y").unwrap(),
            ("Authorization".to_string(), "Bearer x:y".to_string())
        );
        assert!(parse_header(": nope").is_err());
        assert!(parse_header("no-colon").is_err());
    }

    #[test]
    fn renders_success_and_failure() {
        let ok = ResultRecord {
            url: "http://a".into(),
            ok: true,
            status_code: Some(200),
            body: Some(ResponseBody::Json(serde_json::json!({"k": 1}))),
            headers: None,
            error: None,
            elapsed_ms: 12,
            meta: RequestMeta::default(),
        };
        assert_eq!(render_line(0, &ok), r#"[0] ✅  http://a  (status: 200, 12ms) -> {"k":1}"#);

        let failed = ResultRecord {
            ok: false,
            status_code: None,
            body: None,
            error: Some("Request timeout after 10 ms".into()),
            ..ok
        };
        assert_eq!(render_line(3, &failed), "[3] ❌  http://a  ->  ERROR: Request timeout after 10 ms");
    }
}
