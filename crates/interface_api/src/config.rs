//! API configuration

use serde::Deserialize;

use core_kernel::Currency;
use domain_returns::ReturnSettings;
use infra_db::DEFAULT_DATABASE_URL;

/// API configuration
///
/// Every field has a default, so a partial environment still loads.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level
    pub log_level: String,
    /// Submit credit notes on finalize even when the return does not ask to
    pub credit_note_auto_submit: bool,
    /// Account head fragment identifying VAT tax rows
    pub vat_account_marker: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_level: "info".to_string(),
            credit_note_auto_submit: false,
            vat_account_marker: ReturnSettings::default().vat_account_marker,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_`-prefixed environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Settings for the return service
    pub fn return_settings(&self) -> ReturnSettings {
        ReturnSettings {
            currency: Currency::SAR,
            submit_credit_notes_on_finalize: self.credit_note_auto_submit,
            vat_account_marker: self.vat_account_marker.clone(),
        }
    }
}
