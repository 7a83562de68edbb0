//! Configuration management
//!
//! Settings are resolved in the following priority order:
//! 1. Environment variables
//! 2. hc-gateway.toml configuration file
//! 3. Defaults
//!
//! Inside the config file, `${VAR_NAME}` expands to the value of the
//! corresponding environment variable.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::Error;

/// LLM configuration (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; an empty key disables the smart-reply pass
    pub api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL (optional, for custom endpoints)
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: None,
        }
    }
}

impl LlmConfig {
    /// Whether enough is configured to call the API
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

fn default_model() -> String {
    "gpt-4".to_string()
}

/// Twilio WhatsApp configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TwilioConfig {
    /// Account SID
    #[serde(default)]
    pub account_sid: String,

    /// Auth token (also used for webhook signature verification)
    #[serde(default)]
    pub auth_token: String,

    /// Sender number, in `whatsapp:+...` form
    #[serde(default = "default_whatsapp_number")]
    pub whatsapp_number: String,

    /// Verify the X-Twilio-Signature header on inbound webhooks
    #[serde(default)]
    pub validate_signatures: bool,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: String::new(),
            auth_token: String::new(),
            whatsapp_number: default_whatsapp_number(),
            validate_signatures: false,
        }
    }
}

impl TwilioConfig {
    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty()
    }
}

fn default_whatsapp_number() -> String {
    "whatsapp:+14155238886".to_string()
}

/// Instagram (Meta Graph API) configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstagramConfig {
    /// Page access token
    #[serde(default)]
    pub access_token: String,

    /// Instagram page ID
    #[serde(default)]
    pub page_id: String,

    /// Shared secret echoed during webhook verification
    #[serde(default)]
    pub verify_token: String,
}

impl InstagramConfig {
    pub fn is_configured(&self) -> bool {
        !self.access_token.is_empty() && !self.page_id.is_empty()
    }
}

/// Stripe checkout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    /// Secret API key
    #[serde(default)]
    pub secret_key: String,

    /// ISO currency code for checkout sessions
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Redirect after successful payment
    #[serde(default = "default_success_url")]
    pub success_url: String,

    /// Redirect after cancelled payment
    #[serde(default = "default_cancel_url")]
    pub cancel_url: String,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            currency: default_currency(),
            success_url: default_success_url(),
            cancel_url: default_cancel_url(),
        }
    }
}

impl StripeConfig {
    pub fn is_configured(&self) -> bool {
        !self.secret_key.is_empty()
    }
}

fn default_currency() -> String {
    "aed".to_string()
}

fn default_success_url() -> String {
    "https://yourdomain.com/payment/success".to_string()
}

fn default_cancel_url() -> String {
    "https://yourdomain.com/payment/cancel".to_string()
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Port for the HTTP server
    #[serde(default = "default_api_port")]
    pub port: u16,

    /// Allowed CORS origins; empty means permissive
    #[serde(default)]
    pub allowed_origins: Option<Vec<String>>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
            allowed_origins: None,
        }
    }
}

fn default_api_port() -> u16 {
    8000
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Optional flat JSON appointment journal
    #[serde(default)]
    pub appointments_file: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            appointments_file: None,
        }
    }
}

fn default_db_path() -> String {
    "data/healthcare.db".to_string()
}

/// Service catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Path to the services JSON document
    #[serde(default = "default_services_path")]
    pub services_path: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            services_path: default_services_path(),
        }
    }
}

fn default_services_path() -> String {
    "config/services.json".to_string()
}

/// Main configuration for hc-gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub twilio: TwilioConfig,

    #[serde(default)]
    pub instagram: InstagramConfig,

    #[serde(default)]
    pub stripe: StripeConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Expand `${VAR_NAME}` sequences to environment variable values.
    ///
    /// A missing variable expands to the empty string.
    fn expand_env_vars(value: &str) -> String {
        let mut result = String::new();
        let mut chars = value.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // consume '{'

                let mut var_name = String::new();
                while let Some(&c) = chars.peek() {
                    if c == '}' {
                        chars.next(); // consume '}'
                        break;
                    }
                    var_name.push(chars.next().unwrap());
                }

                if let Ok(env_value) = std::env::var(&var_name) {
                    result.push_str(&env_value);
                }
            } else {
                result.push(c);
            }
        }

        result
    }

    /// Load configuration from a TOML file.
    ///
    /// `${VAR_NAME}` sequences in the file are expanded before parsing,
    /// then environment-variable overrides are applied on top.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();

        let toml_content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let expanded_content = Self::expand_env_vars(&toml_content);

        let mut config: Config = toml::from_str(&expanded_content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from the default locations.
    ///
    /// Tries `./hc-gateway.toml` first, then falls back to environment
    /// variables only.
    pub fn load() -> crate::Result<Self> {
        if Path::new("hc-gateway.toml").exists() {
            return Self::from_toml_file("hc-gateway.toml");
        }

        Self::from_env()
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment-variable overrides on top of the current values
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            if !model.is_empty() {
                self.llm.model = model;
            }
        }
        if let Ok(base_url) = std::env::var("LLM_BASE_URL") {
            if !base_url.is_empty() {
                self.llm.base_url = Some(base_url);
            }
        }

        if let Ok(sid) = std::env::var("TWILIO_ACCOUNT_SID") {
            self.twilio.account_sid = sid;
        }
        if let Ok(token) = std::env::var("TWILIO_AUTH_TOKEN") {
            self.twilio.auth_token = token;
        }
        if let Ok(number) = std::env::var("TWILIO_WHATSAPP_NUMBER") {
            if !number.is_empty() {
                self.twilio.whatsapp_number = number;
            }
        }

        if let Ok(token) = std::env::var("META_ACCESS_TOKEN") {
            self.instagram.access_token = token;
        }
        if let Ok(page_id) = std::env::var("INSTAGRAM_PAGE_ID") {
            self.instagram.page_id = page_id;
        }
        if let Ok(token) = std::env::var("INSTAGRAM_VERIFY_TOKEN") {
            self.instagram.verify_token = token;
        }

        if let Ok(key) = std::env::var("STRIPE_SECRET_KEY") {
            self.stripe.secret_key = key;
        }

        if let Ok(port) = std::env::var("API_PORT") {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }
        if let Ok(origins) = std::env::var("API_ALLOWED_ORIGINS") {
            self.api.allowed_origins =
                Some(origins.split(',').map(|s| s.trim().to_string()).collect());
        }

        if let Ok(path) = std::env::var("DB_PATH") {
            self.store.db_path = path;
        }
        if let Ok(path) = std::env::var("APPOINTMENTS_FILE") {
            self.store.appointments_file = Some(path);
        }

        if let Ok(path) = std::env::var("SERVICES_PATH") {
            self.catalog.services_path = path;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.api.port, 8000);
        assert_eq!(config.store.db_path, "data/healthcare.db");
        assert_eq!(config.catalog.services_path, "config/services.json");
        assert_eq!(config.stripe.currency, "aed");
        assert_eq!(config.llm.model, "gpt-4");
        assert!(!config.llm.is_configured());
        assert!(!config.twilio.is_configured());
    }

    #[test]
    fn test_expand_env_vars() {
        unsafe {
            std::env::set_var("HC_GATEWAY_TEST_VAR", "test_value");
        }

        let result = Config::expand_env_vars("prefix_${HC_GATEWAY_TEST_VAR}_suffix");
        assert_eq!(result, "prefix_test_value_suffix");

        // Missing variables expand to nothing
        let result = Config::expand_env_vars("prefix_${NONEXISTENT_VAR}_suffix");
        assert_eq!(result, "prefix__suffix");

        unsafe {
            std::env::remove_var("HC_GATEWAY_TEST_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_no_braces() {
        let result = Config::expand_env_vars("no_vars_here");
        assert_eq!(result, "no_vars_here");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_content = r#"
[llm]
api_key = "sk-test"
model = "gpt-4o"

[twilio]
account_sid = "AC123"
auth_token = "token123"
validate_signatures = true

[instagram]
access_token = "meta_token"
page_id = "1234"
verify_token = "secret"

[stripe]
secret_key = "sk_live"
currency = "usd"

[api]
port = 9000

[store]
db_path = "/tmp/test.db"
appointments_file = "/tmp/appointments.json"

[catalog]
services_path = "/tmp/services.json"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert!(config.llm.is_configured());
        assert_eq!(config.twilio.account_sid, "AC123");
        assert!(config.twilio.validate_signatures);
        assert_eq!(config.instagram.verify_token, "secret");
        assert_eq!(config.stripe.currency, "usd");
        assert_eq!(config.api.port, 9000);
        assert_eq!(
            config.store.appointments_file.as_deref(),
            Some("/tmp/appointments.json")
        );
        assert_eq!(config.catalog.services_path, "/tmp/services.json");
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("[api]\nport = 8080\n").unwrap();
        assert_eq!(config.api.port, 8080);
        assert_eq!(config.store.db_path, "data/healthcare.db");
        assert_eq!(config.twilio.whatsapp_number, "whatsapp:+14155238886");
    }
}
