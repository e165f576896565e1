use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::{info, warn};

use crate::request::{RequestItem, ResultRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DebugTarget {
    Console,
    File(String),
}

#[derive(Clone, Debug)]
struct DebugConfig {
    enabled: bool,
    target: DebugTarget,
}

static DEBUG_CONFIG: Lazy<RwLock<DebugConfig>> = Lazy::new(|| {
    RwLock::new(DebugConfig { enabled: false, target: DebugTarget::Console })
});

impl DebugTarget {
    /// `"console"` or empty means the log; a directory means `<dir>/debug.log`.
    pub fn resolve(target: Option<&str>) -> DebugTarget {
        match target {
            Some(t) if t.is_empty() || t.eq_ignore_ascii_case("console") => DebugTarget::Console,
            Some(t) => {
                let path = Path::new(t);
                if path.is_dir() {
                    DebugTarget::File(path.join("debug.log").to_string_lossy().to_string())
                } else {
                    DebugTarget::File(t.to_string())
                }
            }
            None => DebugTarget::Console,
        }
    }
}

/// Turns per-response dumps on or off.
pub fn set_debug(enabled: bool, target: Option<&str>) {
    let mut cfg = DEBUG_CONFIG.write().unwrap_or_else(PoisonError::into_inner);
    cfg.enabled = enabled;
    cfg.target = DebugTarget::resolve(target);
}

pub fn is_debug() -> bool {
    DEBUG_CONFIG.read().unwrap_or_else(PoisonError::into_inner).enabled
}

pub(crate) fn debug_log(method: &str, item: &RequestItem, record: &ResultRecord) {
    let cfg = DEBUG_CONFIG.read().unwrap_or_else(PoisonError::into_inner).clone();
    if !cfg.enabled {
        return;
    }

    let tag = item.tag.as_deref().unwrap_or("no-tag");
    let mut msg = format!(
        "\n==== [{}] ====\nMethod: {}\nURL: {}\nStatus: {}\n",
        tag,
        method,
        record.url,
        record.status_code.map_or_else(|| "-".to_string(), |s| s.to_string()),
    );
    msg.push_str(&format!("Elapsed: {} ms\n", record.elapsed_ms));
    if let Some(headers) = &record.headers {
        msg.push_str(&format!("Headers: {:?}\n", headers));
    }
    if let Some(body) = &record.body {
        msg.push_str(&format!("Response: {}\n", body));
    }
    if let Some(err) = &record.error {
        msg.push_str(&format!("Error: {}\n", err));
    }
    if let Some(proxy) = item.options.proxy.as_ref().and_then(|p| p.all.as_deref()) {
        msg.push_str(&format!("Proxy: {}\n", proxy));
    }

    match &cfg.target {
        DebugTarget::Console => info!(target: "rusty_fetch::debug", "{}", msg),
        DebugTarget::File(path) => {
            let written = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut f| writeln!(f, "{}", msg));
            if let Err(e) = written {
                warn!(path = %path, "failed to write debug log: {}", e);
            }
        }
    }
}
