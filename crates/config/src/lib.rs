use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const APP_NAME: &str = "fbr-einvoice-relay";
const KEYCHAIN_SERVICE: &str = "pk.fbr.einvoice.credentials";

/// Which Invoice Authority environment the relay talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Sandbox,
    Production,
}

impl Mode {
    /// Anything other than "production" selects the sandbox.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "production" => Mode::Production,
            "sandbox" | "" => Mode::Sandbox,
            other => {
                tracing::warn!(mode = %other, "Unknown FBR mode, falling back to sandbox");
                Mode::Sandbox
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Sandbox => "sandbox",
            Mode::Production => "production",
        }
    }

    fn token_env_var(&self) -> &'static str {
        match self {
            Mode::Sandbox => "FBR_SANDBOX_TOKEN",
            Mode::Production => "FBR_PRODUCTION_TOKEN",
        }
    }

    pub fn token_secret_key(&self) -> &'static str {
        match self {
            Mode::Sandbox => "fbr_sandbox_token",
            Mode::Production => "fbr_production_token",
        }
    }
}

/// Strict parsing for operator input; only the two known names are accepted.
impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Mode::Sandbox),
            "production" => Ok(Mode::Production),
            other => Err(format!("unknown mode '{other}', expected sandbox or production")),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub mode: Mode,
    pub sandbox_url: Option<String>,
    pub production_url: Option<String>,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_route")]
    pub route: String,
    /// Unset means the HTTP client's own default (no timeout).
    pub request_timeout_secs: Option<u64>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            sandbox_url: None,
            production_url: None,
            bind_addr: default_bind_addr(),
            route: default_route(),
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_kind")]
    pub kind: String, // "fbr" | "mock"
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
        }
    }
}

fn default_provider_kind() -> String {
    "fbr".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_route() -> String {
    "/api/send-invoice".to_string()
}

/// Everything the relay needs for the active mode, fixed at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct RelaySettings {
    pub mode: Mode,
    pub endpoint: Option<String>,
    pub default_token: Option<String>,
}

impl fmt::Debug for RelaySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelaySettings")
            .field("mode", &self.mode)
            .field("endpoint", &self.endpoint)
            .field(
                "default_token",
                &self.default_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl AppConfig {
    /// Apply environment overrides on top of the stored file config.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("FBR_MODE") {
            self.relay.mode = Mode::parse_lenient(&mode);
        }
        if let Some(url) = lookup("FBR_SANDBOX_URL") {
            self.relay.sandbox_url = Some(url);
        }
        if let Some(url) = lookup("FBR_PRODUCTION_URL") {
            self.relay.production_url = Some(url);
        }
        if let Some(addr) = lookup("RELAY_BIND_ADDR") {
            self.relay.bind_addr = addr;
        }
        if let Some(route) = lookup("RELAY_ROUTE") {
            self.relay.route = route;
        }
        if let Some(kind) = lookup("RELAY_PROVIDER") {
            self.provider.kind = kind;
        }
    }

    /// Resolve the endpoint and default token for the active mode only.
    ///
    /// `token_lookup` receives the env var name and the keychain key for the
    /// active mode and returns the token if either source has one.
    pub fn relay_settings<F>(&self, token_lookup: F) -> RelaySettings
    where
        F: Fn(&str, &str) -> Option<String>,
    {
        let mode = self.relay.mode;
        let endpoint = match mode {
            Mode::Sandbox => self.relay.sandbox_url.clone(),
            Mode::Production => self.relay.production_url.clone(),
        }
        .filter(|u| !u.trim().is_empty());

        let default_token = token_lookup(mode.token_env_var(), mode.token_secret_key())
            .filter(|t| !t.is_empty());

        RelaySettings {
            mode,
            endpoint,
            default_token,
        }
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

pub fn load() -> Result<AppConfig> {
    let cfg: AppConfig = confy::load(APP_NAME, None).context("Failed to load app config")?;
    Ok(cfg)
}

pub fn store(cfg: &AppConfig) -> Result<()> {
    confy::store(APP_NAME, None, cfg).context("Failed to store app config")?;
    Ok(())
}

/// Load the stored config file and environment overrides, then resolve the
/// settings for the active mode. Tokens come from the environment first and
/// the OS keychain second.
pub fn load_from_environment() -> (AppConfig, RelaySettings) {
    let mut cfg = load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Using default config");
        AppConfig::default()
    });
    cfg.apply_overrides(env_lookup);

    let settings = cfg.relay_settings(|env_var, secret_key| {
        env_lookup(env_var).or_else(|| get_secret(secret_key).ok())
    });
    (cfg, settings)
}

/// Store a secret in the OS keychain
pub fn store_secret(key: &str, value: &str) -> Result<()> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    entry.set_password(value)?;
    Ok(())
}

/// Retrieve a secret from the OS keychain
pub fn get_secret(key: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    let password = entry.get_password()?;
    Ok(password)
}
