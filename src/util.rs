use std::time::Duration;

const HEADER_RULE: &str = "--------------------------";

/// Wrap a message in the banner used for step boundaries.
pub fn header_message(header: &str) -> String {
    format!("{HEADER_RULE}  {header}  {HEADER_RULE}")
}

/// Right-pad `label` with dots to `width` and append the message.
pub fn message_pad_right(label: &str, message: impl std::fmt::Display, width: usize) -> String {
    format!("{label:.<width$}: {message}")
}

pub fn elapsed_seconds(elapsed: Duration) -> f64 {
    elapsed.as_millis() as f64 / 1000.0
}

pub fn build_version() -> String {
    format!(
        "{} Version: {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}
