use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use once_cell::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{FetchError, Result};
use crate::network::{HttpTransport, Transport};
use crate::request::executor::execute_single_request;
use crate::request::{FetchOptions, MaxConcurrency, RequestItem, ResultRecord};

/// Claims the next unprocessed index, or `None` once the batch is exhausted.
fn claim(cursor: &AtomicUsize, len: usize) -> Option<usize> {
    let index = cursor.fetch_add(1, Ordering::SeqCst);
    (index < len).then_some(index)
}

/// Runs `task(i)` for every `i < len` on at most `workers` concurrent workers
/// and returns the outputs in index order.
///
/// Workers are plain futures joined here, so none outlives the call. The cursor
/// and slots belong to this call alone.
pub(crate) async fn run_pool<T, F, Fut>(len: usize, workers: MaxConcurrency, task: F) -> Vec<T>
where
    F: Fn(usize) -> Fut,
    Fut: Future<Output = T>,
{
    let slots: Vec<OnceCell<T>> = (0..len).map(|_| OnceCell::new()).collect();
    let cursor = AtomicUsize::new(0);
    let worker_count = workers.get().min(len);

    let pool = (0..worker_count).map(|worker| {
        let (slots, cursor, task) = (&slots, &cursor, &task);
        async move {
            while let Some(index) = claim(cursor, len) {
                debug!(worker, index, "claimed");
                let output = task(index).await;
                if slots[index].set(output).is_err() {
                    unreachable!("index {} claimed twice", index);
                }
            }
        }
    });
    join_all(pool).await;

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.into_inner()
                .unwrap_or_else(|| unreachable!("index {} was never filled", index))
        })
        .collect()
}

fn ensure_non_empty(len: usize) -> Result<()> {
    if len == 0 {
        return Err(FetchError::invalid("urls must be a non-empty list"));
    }
    Ok(())
}

/// Worker pool bound to one transport and one set of batch options.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    options: FetchOptions,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, options: FetchOptions) -> Self {
        Self { transport, options }
    }

    /// Dispatcher over the shared `reqwest` client.
    pub fn http(options: FetchOptions) -> Self {
        Self::new(Arc::new(HttpTransport::shared()), options)
    }

    pub async fn fetch_all<S: AsRef<str>>(&self, urls: &[S]) -> Result<Vec<ResultRecord>> {
        let items = urls.iter().map(|u| RequestItem::new(u.as_ref())).collect();
        self.fetch_requests(items).await
    }

    /// Fetches every item and returns one record per item, in input order.
    /// Only invalid arguments fail the call; request failures become records.
    pub async fn fetch_requests(&self, items: Vec<RequestItem>) -> Result<Vec<ResultRecord>> {
        ensure_non_empty(items.len())?;
        let workers = self.options.validate()?;
        if let Some(index) = items.iter().position(|item| item.timeout_ms == Some(0)) {
            return Err(FetchError::invalid(format!(
                "timeout for request {} must be a positive number of milliseconds",
                index
            )));
        }

        let items: Vec<RequestItem> = items
            .into_iter()
            .map(|item| {
                let options = item.options.or(&self.options.transport);
                RequestItem { options, ..item }
            })
            .collect();

        let started = Instant::now();
        info!(
            requests = items.len(),
            workers = workers.get().min(items.len()),
            timeout_ms = self.options.timeout_ms,
            "dispatching batch"
        );

        let transport = self.transport.as_ref();
        let cancel = self.options.cancel.as_ref();
        let batch_timeout = self.options.timeout();
        let items = &items;
        let results = run_pool(items.len(), workers, move |index| {
            let item = &items[index];
            let timeout = item.timeout_ms.map_or(batch_timeout, Duration::from_millis);
            execute_single_request(transport, item, timeout, cancel)
        })
        .await;

        let failed = results.iter().filter(|r| !r.ok).count();
        info!(
            succeeded = results.len() - failed,
            failed,
            elapsed_ms = crate::utils::elapsed_ms(started),
            "batch finished"
        );
        Ok(results)
    }
}

/// Fetches `urls` over the shared HTTP client. See [`Dispatcher::fetch_requests`].
pub async fn fetch_all<S: AsRef<str>>(urls: &[S], options: FetchOptions) -> Result<Vec<ResultRecord>> {
    Dispatcher::http(options).fetch_all(urls).await
}

/// Per-item variant of [`fetch_all`].
pub async fn fetch_requests(items: Vec<RequestItem>, options: FetchOptions) -> Result<Vec<ResultRecord>> {
    Dispatcher::http(options).fetch_requests(items).await
}

/// Bare pool: hands each URL to `transport_fn` and returns whatever it produced,
/// in input order, without timeouts or normalization.
pub async fn fetch_pool<S, F, Fut, T>(urls: &[S], max_concurrency: usize, transport_fn: F) -> Result<Vec<T>>
where
    S: AsRef<str>,
    F: Fn(String) -> Fut,
    Fut: Future<Output = T>,
{
    ensure_non_empty(urls.len())?;
    let workers = MaxConcurrency::new(max_concurrency)?;
    Ok(run_pool(urls.len(), workers, |index| transport_fn(urls[index].as_ref().to_string())).await)
}
