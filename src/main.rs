use std::process;
use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use reqwest::Method;
use rusty_fetch::cli::{parse_header, parse_timeout_ms, parse_urls, render_line, USAGE};
use rusty_fetch::{
    fetch_all, set_debug, FetchError, FetchOptions, HttpVersion, MaxConcurrency, ProxyConfig, TransportOptions, DEFAULT_TIMEOUT_MS,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Maximum number of requests in flight (integer >= 1)
    max_concurrency: String,

    /// JSON array of URLs or a comma-separated list
    urls: String,

    /// Per-request timeout in milliseconds
    #[arg(short, long, env = "RUSTY_FETCH_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,

    /// HTTP method for every request
    #[arg(short = 'X', long)]
    method: Option<String>,

    /// Extra request header, "Name: value"; repeatable
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// AUTO, HTTP1_ONLY, HTTP2 or HTTP2_PRIOR_KNOWLEDGE
    #[arg(long, default_value = "AUTO")]
    http_version: HttpVersion,

    /// Proxy URL used for every scheme
    #[arg(long, env = "RUSTY_FETCH_PROXY")]
    proxy: Option<String>,

    /// Skip TLS certificate verification
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Print each result as a JSON line
    #[arg(long)]
    json: bool,

    /// Dump every response; optional target is "console", a file or a directory
    #[arg(long, num_args = 0..=1)]
    debug: Option<Option<String>>,
}

fn usage_error(msg: &str) -> ! {
    eprintln!("Error: {}\n", msg);
    eprintln!("{}", USAGE);
    process::exit(1);
}

fn transport_options(args: &Args) -> TransportOptions {
    let method = args.method.as_deref().map(|m| {
        Method::from_bytes(m.to_uppercase().as_bytes()).unwrap_or_else(|_| usage_error(&format!("invalid method '{}'", m)))
    });
    let headers = args
        .headers
        .iter()
        .map(|h| parse_header(h).unwrap_or_else(|e| usage_error(&e.to_string())))
        .collect();

    TransportOptions {
        method,
        headers,
        proxy: args.proxy.clone().map(|p| ProxyConfig::from_url(p, None, None)),
        http_version: Some(args.http_version),
        ssl_verify: args.insecure.then_some(false),
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();

    let max_concurrency = MaxConcurrency::parse(&args.max_concurrency)
        .unwrap_or_else(|_| usage_error("<maxConcurrency> must be an integer >= 1."));
    let urls = parse_urls(&args.urls);
    if urls.is_empty() {
        usage_error("<urls> must be a non-empty list of URLs.");
    }
    let timeout_ms = parse_timeout_ms(args.timeout_ms).unwrap_or_else(|e| usage_error(&e.to_string()));

    if let Some(target) = &args.debug {
        set_debug(true, target.as_deref());
    }

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, cancelling outstanding requests");
                cancel.cancel();
            }
        });
    }

    let options = FetchOptions::new(max_concurrency.get())
        .with_timeout_ms(timeout_ms)
        .with_transport(transport_options(&args))
        .with_cancel(cancel);

    let start = Instant::now();
    let results = match fetch_all(&urls, options).await {
        Ok(results) => results,
        Err(e @ FetchError::InvalidArgument(_)) => usage_error(&e.to_string()),
    };

    for (i, record) in results.iter().enumerate() {
        if args.json {
            println!("{}", serde_json::to_string(record)?);
        } else {
            println!("{}", render_line(i, record));
        }
    }

    let ms = start.elapsed().as_secs_f64() * 1000.0;
    println!("\n⏱️  Done in {:.2} ms (concurrency = {})", ms, max_concurrency.get());
    info!(total = results.len(), failed = results.iter().filter(|r| !r.ok).count(), "done");
    Ok(())
}
