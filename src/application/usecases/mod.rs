//! 엔진 진입점별 유스케이스.

pub mod backups;
pub mod credentials;
pub mod hosted_config;
pub mod inspect_settings;
pub mod models;
pub mod reconcile_provider;
mod registry_pair;
pub mod setup;
