#![doc(test(attr(deny(warnings))))]

//! xfinance core: budget periods, pay-cycle income refresh, and per-period
//! aggregation over a per-user JSON document store.

pub mod auth;
pub mod budget;
pub mod config;
pub mod core;
pub mod errors;
pub mod onboarding;
pub mod period;
pub mod store;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    init_with_filter(None);
}

/// Like [`init`], with a fallback filter directive for when `RUST_LOG` is
/// unset.
pub fn init_with_filter(filter: Option<&str>) {
    INIT_TRACING.call_once(|| {
        utils::init_tracing(filter);
        tracing::info!("xfinance core tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init_with_filter(Some("xfinance_core=debug"));
    }
}
