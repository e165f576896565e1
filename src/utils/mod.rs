pub mod time;

pub use time::{elapsed_ms, format_datetime, format_span, millis};
