pub mod index;

use crate::app_config::AppConfig;
use crate::rate_limit::CooldownLimiter;
use crate::storage::EntryStore;
use std::sync::Arc;

/// Shared state handed to every handler via `web::Data`. Explicit context
/// instead of ambient globals, so tests can inject their own store and
/// limiter.
pub struct AppState {
    pub store: Arc<dyn EntryStore>,
    pub limiter: CooldownLimiter,
    pub config: AppConfig,
}

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4.0.1/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    index::configure(conf);
}
