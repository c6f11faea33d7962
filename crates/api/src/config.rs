//! Environment-driven server configuration.

use std::net::SocketAddr;

use chrono::{FixedOffset, Offset, Utc};
use thiserror::Error;

use neurocore_reporting::ExportLimit;

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is not valid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Postgres URL; `None` keeps every store in memory.
    pub database_url: Option<String>,
    pub export_limit: ExportLimit,
    /// Offset in which day/week/month boundaries and series dates are computed.
    pub report_offset: FixedOffset,
    pub image_base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            database_url: None,
            export_limit: ExportLimit::default(),
            report_offset: Utc.fix(),
            image_base_url: "http://localhost:8080/images".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = ApiConfig::default();

        if let Some(raw) = lookup("BIND_ADDR") {
            config.bind_addr = raw.parse().map_err(|e| invalid("BIND_ADDR", e))?;
        }

        match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => config.jwt_secret = secret,
            None => tracing::warn!("JWT_SECRET not set; using insecure dev default"),
        }

        let persistent = match lookup("USE_PERSISTENT_STORES") {
            Some(raw) => raw
                .trim()
                .parse::<bool>()
                .map_err(|e| invalid("USE_PERSISTENT_STORES", e))?,
            None => false,
        };
        if persistent {
            let url = lookup("DATABASE_URL")
                .filter(|s| !s.is_empty())
                .ok_or(ConfigError::Missing("DATABASE_URL"))?;
            config.database_url = Some(url);
        }

        if let Some(raw) = lookup("EXPORT_ROW_LIMIT") {
            let rows: usize = raw.trim().parse().map_err(|e| invalid("EXPORT_ROW_LIMIT", e))?;
            config.export_limit = ExportLimit::new(rows);
        }

        if let Some(raw) = lookup("REPORT_UTC_OFFSET_MINUTES") {
            let minutes: i32 = raw
                .trim()
                .parse()
                .map_err(|e| invalid("REPORT_UTC_OFFSET_MINUTES", e))?;
            config.report_offset = minutes
                .checked_mul(60)
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| invalid("REPORT_UTC_OFFSET_MINUTES", "out of range"))?;
        }

        if let Some(url) = lookup("IMAGE_BASE_URL").filter(|s| !s.is_empty()) {
            config.image_base_url = url.trim_end_matches('/').to_string();
        }

        Ok(config)
    }
}

fn invalid(var: &'static str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        reason: reason.to_string(),
    }
}
