// src/config.rs

use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Progress service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub log_dir: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://driveprep.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8090".to_string());

        let log_dir = env::var("LOG_DIR")
            .unwrap_or_else(|_| "logs".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            log_dir,
        }
    }
}

/// Device-side settings: where the progress service lives and where the local
/// progress blob is kept.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub data_dir: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        dotenv().ok();

        let api_url = env::var("DRIVEPREP_API_URL")
            .unwrap_or_else(|_| "http://localhost:8090".to_string());

        let data_dir = env::var("DRIVEPREP_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(".driveprep"));

        Self { api_url, data_dir }
    }
}
