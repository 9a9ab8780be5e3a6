pub mod auth;
pub mod config;
pub mod diary;
pub mod draft;
pub mod mood;
pub mod practice;
pub mod stats;

use std::sync::Arc;

use stillpoint_core::{ApiClient, Config, KeyringTokenStore};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Single-threaded runtime for one command's remote calls.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

pub fn api_client(config: &Config) -> Result<ApiClient, Box<dyn std::error::Error>> {
    Ok(ApiClient::new(&config.api, Arc::new(KeyringTokenStore::new()))?)
}
