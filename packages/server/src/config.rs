use std::env;
use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid port number: {0}")]
    InvalidPort(#[from] ParseIntError),
    #[error("Port {0} is out of valid range (1-65535)")]
    PortOutOfRange(u16),
    #[error("JWT_SECRET must be set and non-empty")]
    MissingJwtSecret,
}

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub cors_origin: String,
    pub database_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub jwt_secret: String,
    pub token_expiry_mins: i64,
    pub seed_admin_email: Option<String>,
    pub seed_admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port_str = env::var("PORT").unwrap_or_else(|_| "4040".to_string());
        let port = port_str.parse::<u16>()?;
        if port == 0 {
            return Err(ConfigError::PortOutOfRange(port));
        }

        let cors_origin =
            env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let database_path = env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| tandem_core::tandem_dir().join("tandem.db"));

        let uploads_dir = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| tandem_core::constants::uploads_dir());

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| ConfigError::MissingJwtSecret)?;
        if jwt_secret.is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }

        let token_expiry_mins = env::var("TOKEN_EXPIRY_MINS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Ok(Config {
            port,
            cors_origin,
            database_path,
            uploads_dir,
            jwt_secret,
            token_expiry_mins,
            seed_admin_email: env::var("ADMIN_EMAIL").ok(),
            seed_admin_password: env::var("ADMIN_PASSWORD").ok(),
        })
    }
}
