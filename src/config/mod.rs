#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::estimator::Currency;
use crate::domain::model::SearchMode;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use toml_config::TomlConfig;

/// Effective settings: file values with command line overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base: String,
    pub timeout_seconds: Option<u64>,
    pub default_mode: SearchMode,
    pub external_row_limit: usize,
    pub page_size: usize,
    pub default_price: f64,
    pub currency: Currency,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_file_config(TomlConfig::default())
    }
}

impl Settings {
    pub fn from_file_config(file: TomlConfig) -> Self {
        Self {
            api_base: file.api.base_url,
            timeout_seconds: file.api.timeout_seconds,
            default_mode: file.search.default_mode,
            external_row_limit: file.search.external_row_limit,
            page_size: file.search.page_size,
            default_price: file.estimator.default_price,
            currency: file.estimator.currency,
        }
    }

    pub fn with_overrides(mut self, api_base: Option<String>, timeout_seconds: Option<u64>) -> Self {
        if let Some(base) = api_base {
            self.api_base = base;
        }
        if timeout_seconds.is_some() {
            self.timeout_seconds = timeout_seconds;
        }
        self
    }

    fn as_toml(&self) -> TomlConfig {
        let mut file = TomlConfig::default();
        file.api.base_url = self.api_base.clone();
        file.api.timeout_seconds = self.timeout_seconds;
        file.search.default_mode = self.default_mode;
        file.search.external_row_limit = self.external_row_limit;
        file.search.page_size = self.page_size;
        file.estimator.default_price = self.default_price;
        file.estimator.currency = self.currency;
        file
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        self.as_toml().validate()
    }
}

impl ConfigProvider for Settings {
    fn api_base(&self) -> &str {
        &self.api_base
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win_over_file() {
        let file = TomlConfig::from_toml_str(
            "[api]\nbase_url = \"http://file-host/api\"\ntimeout_seconds = 30\n",
        )
        .unwrap();

        let settings = Settings::from_file_config(file)
            .with_overrides(Some("http://flag-host/api".to_string()), None);

        assert_eq!(settings.api_base(), "http://flag-host/api");
        assert_eq!(settings.timeout_seconds(), Some(30));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let settings = Settings::default().with_overrides(Some("localhost".to_string()), None);
        assert!(settings.validate().is_err());
    }
}
