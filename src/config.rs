// src/config.rs
use axum::http::{HeaderValue, Method};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;

use crate::services::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL, GeminiConfig};

pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "https://basic-chatbot-xi.vercel.app/";
pub const DEFAULT_ALLOWED_METHODS: &str = "GET,POST";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("GOOGLE_API_KEY environment variable is not set")]
    MissingApiKey,

    #[error("invalid {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("invalid CORS origin: {0:?}")]
    InvalidOrigin(String),

    #[error("invalid CORS method: {0:?}")]
    InvalidMethod(String),
}

/// Which methods a cross-origin caller may use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowedMethods {
    Any,
    List(Vec<Method>),
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Origins exactly as configured; nothing is normalised.
    pub allowed_origins: Vec<HeaderValue>,
    pub allowed_methods: AllowedMethods,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub google_api_key: String,
    pub model: String,
    pub api_base: String,
    pub host: IpAddr,
    pub port: u16,
    pub cors: CorsConfig,
}

impl Config {
    /// Load from the process environment. Call `dotenvy::dotenv()` first to
    /// pick up a local `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let google_api_key = var("GOOGLE_API_KEY").ok_or(ConfigError::MissingApiKey)?;

        let host = match var("HOST") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "HOST",
                value: raw,
            })?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };

        let port = match var("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let origins =
            var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string());
        let methods =
            var("CORS_ALLOWED_METHODS").unwrap_or_else(|| DEFAULT_ALLOWED_METHODS.to_string());

        Ok(Self {
            google_api_key: google_api_key.trim().to_string(),
            model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base: var("GEMINI_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            host,
            port,
            cors: CorsConfig {
                allowed_origins: parse_origins(&origins)?,
                allowed_methods: parse_methods(&methods)?,
            },
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            api_key: self.google_api_key.clone(),
            model: self.model.clone(),
            api_base: self.api_base.clone(),
        }
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

pub fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    // Credentials are allowed, so a wildcard origin is never valid.
    split_list(raw)
        .map(|origin| {
            if origin == "*" {
                return Err(ConfigError::InvalidOrigin(origin.to_string()));
            }
            HeaderValue::from_str(origin)
                .map_err(|_| ConfigError::InvalidOrigin(origin.to_string()))
        })
        .collect()
}

pub fn parse_methods(raw: &str) -> Result<AllowedMethods, ConfigError> {
    if raw.trim() == "*" {
        return Ok(AllowedMethods::Any);
    }
    split_list(raw)
        .map(|m| {
            if m == "*" {
                return Err(ConfigError::InvalidMethod(m.to_string()));
            }
            Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| ConfigError::InvalidMethod(m.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(AllowedMethods::List)
}
