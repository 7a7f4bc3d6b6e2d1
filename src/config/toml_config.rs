use crate::adapters::http::DEFAULT_API_BASE;
use crate::app::presenter::{DEFAULT_PAGE_SIZE, EXTERNAL_ROW_LIMIT};
use crate::core::estimator::{Currency, DEFAULT_PRICE};
use crate::domain::model::SearchMode;
use crate::utils::error::{Result, TrackerError};
use crate::utils::validation::{
    validate_non_negative, validate_positive_number, validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub estimator: EstimatorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub default_mode: SearchMode,
    #[serde(default = "default_external_row_limit")]
    pub external_row_limit: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    #[serde(default = "default_price")]
    pub default_price: f64,
    #[serde(default)]
    pub currency: Currency,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_external_row_limit() -> usize {
    EXTERNAL_ROW_LIMIT
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_price() -> f64 {
    DEFAULT_PRICE
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_mode: SearchMode::Local,
            external_row_limit: default_external_row_limit(),
            page_size: default_page_size(),
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            default_price: default_price(),
            currency: Currency::Usd,
        }
    }
}

impl TomlConfig {
    /// Loads and parses a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| TrackerError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid");

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.api.base_url)?;
        if let Some(timeout) = self.api.timeout_seconds {
            validate_positive_number("api.timeout_seconds", timeout as usize, 1)?;
        }
        validate_positive_number("search.external_row_limit", self.search.external_row_limit, 1)?;
        validate_positive_number("search.page_size", self.search.page_size, 1)?;
        validate_non_negative("estimator.default_price", self.estimator.default_price)?;
        Ok(())
    }
}
