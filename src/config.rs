// src/config.rs

use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

/// Connection settings delivered by the secret store collaborator, one JSON
/// document in the `DB_SECRET` environment variable.
#[derive(Debug, Clone, Deserialize)]
pub struct DbSecret {
    pub username: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub dbname: String,
}

impl DbSecret {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.dbname
        )
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Identity token lifetime in seconds.
    pub jwt_expiration: u64,
    /// One-time code lifetime in minutes.
    pub otp_ttl_minutes: i64,
    pub rust_log: String,
}

impl Config {
    /// Loads configuration from the environment once, during the startup
    /// phase. `DATABASE_URL` wins when set; otherwise the `DB_SECRET` JSON
    /// document supplies the connection parts.
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                let raw = env::var("DB_SECRET")
                    .expect("either DATABASE_URL or DB_SECRET must be set");
                let secret: DbSecret =
                    serde_json::from_str(&raw).expect("DB_SECRET must be valid JSON");
                secret.connection_url()
            }
        };

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);

        let otp_ttl_minutes = env::var("OTP_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            otp_ttl_minutes,
            rust_log,
        }
    }
}
