//! Runtime configuration read from the environment (and an optional `.env` file).
//!
//! - `HOST` / `PORT`: bind IP and port, default `0.0.0.0:8080`
//! - `APP_DB_PATH`: SQLite file, default `data/performance.db`
//! - `ADMIN_PASSWORD`: manager password accepted by `/api/login`
//! - `AUTH_TOKEN`: static token handed out on login and required on protected routes

use std::{env, net::SocketAddr, path::PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DB_PATH: &str = "data/performance.db";
pub const DEFAULT_ADMIN_PASSWORD: &str = "Sabuji";
pub const DEFAULT_AUTH_TOKEN: &str = "Sabuji-Token";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub admin_password: String,
    pub auth_token: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port,
            db_path: env::var("APP_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH)),
            admin_password: non_empty_var("ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            auth_token: non_empty_var("AUTH_TOKEN")
                .unwrap_or_else(|| DEFAULT_AUTH_TOKEN.to_string()),
        }
    }

    pub fn bind_address(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            admin_password: DEFAULT_ADMIN_PASSWORD.to_string(),
            auth_token: DEFAULT_AUTH_TOKEN.to_string(),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}
