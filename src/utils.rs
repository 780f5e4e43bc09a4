//! Shared helpers and constants.

use chrono::Utc;

pub const APP_NAME: &str = "streamnest_backend";

pub fn now_utc_iso() -> String {
    Utc::now().to_rfc3339()
}

pub fn print_banner() {
    println!("{} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));
}
