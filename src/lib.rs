pub mod app_config;
pub mod csrf;
pub mod entry;
pub mod fingerprint;
pub mod rate_limit;
pub mod storage;
pub mod validation;
pub mod web;
