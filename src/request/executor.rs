use std::time::{Duration, Instant, SystemTime};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::debug::debug_log;
use crate::error::RequestFailure;
use crate::network::{Response, Transport};
use crate::request::{RequestItem, RequestMeta, ResponseBody, ResultRecord};
use crate::utils::{elapsed_ms, format_span, millis};

fn decode(response: &Response) -> Result<ResponseBody, RequestFailure> {
    if response.is_json() {
        Ok(ResponseBody::Json(response.json()?))
    } else {
        Ok(ResponseBody::Text(response.text()))
    }
}

/// Runs one request under its own timeout and turns whatever happens into a
/// [`ResultRecord`]. Never fails.
///
/// The token handed to the transport is a child of `parent`, so cancelling the
/// batch reaches every in-flight request. It is cancelled and dropped on every
/// exit path, which detaches it from the parent again.
pub async fn execute_single_request(
    transport: &dyn Transport,
    item: &RequestItem,
    timeout: Duration,
    parent: Option<&CancellationToken>,
) -> ResultRecord {
    let started_at = SystemTime::now();
    let start = Instant::now();

    let token = parent.map_or_else(CancellationToken::new, CancellationToken::child_token);
    let _guard = token.clone().drop_guard();

    let outcome = tokio::select! {
        biased;
        _ = token.cancelled() => Err(RequestFailure::Cancelled),
        _ = tokio::time::sleep(timeout) => {
            token.cancel();
            Err(RequestFailure::Timeout(millis(timeout)))
        }
        res = transport.perform(item, &token) => res,
    }
    .and_then(|response| decode(&response).map(|body| (response, body)));

    let elapsed_ms = elapsed_ms(start);
    let meta = RequestMeta {
        request_time: format_span(started_at, SystemTime::now()),
        tag: item.tag.clone(),
    };

    let record = match outcome {
        Ok((response, body)) => {
            let ok = response.is_success();
            let status = response.status.as_u16();
            debug!(url = %item.url, status, elapsed_ms, "request completed");
            ResultRecord {
                url: item.url.clone(),
                ok,
                status_code: Some(status),
                body: Some(body),
                headers: Some(response.flat_headers()),
                error: (!ok).then(|| format!("HTTP status error: {}", status)),
                elapsed_ms,
                meta,
            }
        }
        Err(failure) => {
            warn!(url = %item.url, timeout = failure.is_timeout(), elapsed_ms, "request failed: {}", failure);
            ResultRecord::failure(&item.url, failure.to_string(), elapsed_ms, meta)
        }
    };

    debug_log(item.method_name(), item, &record);
    record
}
