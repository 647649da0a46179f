use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

use crate::core::service::InviteSettings;
use crate::domain::coordinate::Coordinate;
use crate::domain::model::OrderBy;
use crate::utils::error::{InviteError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, Validate,
};

pub const DEFAULT_CONFIG_FILE: &str = "party-invite.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSection,
    #[serde(default)]
    pub http: HttpConfig,
    pub filter: FilterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSection {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_base_location")]
    pub base_location: String,
    pub location_near_to_km: i64,
    #[serde(default = "default_order_by")]
    pub order_by: String,
    pub workers: Option<usize>,
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_upload_mb() -> usize {
    10
}

fn default_base_location() -> String {
    "dublin".to_string()
}

fn default_order_by() -> String {
    OrderBy::CustomerId.as_str().to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            request_timeout_secs: default_request_timeout_secs(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration file and applies environment overrides on top of it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::from_file(&path).map_err(|e| {
            e.context(format!("error to read config, path: {}", path.as_ref().display()))
        })?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the value of the environment variable; unknown variables stay as-is.
    fn substitute_env_vars(content: &str) -> String {
        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// Applies `APP_NAME`, `HTTP_PORT`, `BASE_LOCATION` and `LOCATION_NEAR_TO` overrides.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("APP_NAME") {
            self.app.name = name;
        }
        if let Some(port) = lookup("HTTP_PORT") {
            self.http.port = parse_override("HTTP_PORT", &port)?;
        }
        if let Some(base_location) = lookup("BASE_LOCATION") {
            self.filter.base_location = base_location;
        }
        if let Some(near_to) = lookup("LOCATION_NEAR_TO") {
            self.filter.location_near_to_km = parse_override("LOCATION_NEAR_TO", &near_to)?;
        }
        Ok(())
    }

    pub fn base_location(&self) -> Result<Coordinate> {
        Coordinate::named(&self.filter.base_location).ok_or_else(|| {
            InviteError::InvalidConfigValueError {
                field: "filter.base_location".to_string(),
                value: self.filter.base_location.clone(),
                reason: "Unknown location, supported: dublin".to_string(),
            }
        })
    }

    pub fn threshold_km(&self) -> Decimal {
        Decimal::from(self.filter.location_near_to_km)
    }

    pub fn order_by(&self) -> Result<OrderBy> {
        self.filter.order_by.parse()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.request_timeout_secs)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.http.max_upload_mb << 20
    }

    pub fn workers(&self) -> usize {
        self.filter.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn invite_settings(&self) -> Result<InviteSettings> {
        Ok(InviteSettings::new(self.base_location()?, self.threshold_km())
            .with_order_by(self.order_by()?)
            .with_timeout(self.request_timeout()))
    }
}

fn parse_override<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| InviteError::InvalidConfigValueError {
            field: key.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("app.name", &self.app.name)?;
        validate_positive_number("http.port", self.http.port, 1)?;
        validate_positive_number("http.request_timeout_secs", self.http.request_timeout_secs, 1)?;
        validate_range("http.max_upload_mb", self.http.max_upload_mb, 1, 512)?;
        self.base_location()?;
        validate_positive_number("filter.location_near_to_km", self.filter.location_near_to_km, 1)?;
        self.order_by()?;
        if let Some(workers) = self.filter.workers {
            validate_range("filter.workers", workers, 1, 1024)?;
        }

        tracing::info!("Configuration validation passed");
        Ok(())
    }
}
