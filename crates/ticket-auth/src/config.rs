//! Ticket configuration
//!
//! Loaded from a YAML file such as:
//!
//! ```yaml
//! site_secret: "${TICKET_SITE_SECRET}"
//! method: symmetric
//! time_guard_seconds: 7200
//! debug_trace: false
//! keypair:
//!   public_key: /etc/lms/public.pem
//!   private_key: /etc/lms/private.pem
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cipher::{CipherError, TicketMethod};
use crate::keypair::{KeypairError, PemFiles};
use crate::symmetric::KEY_LEN;

/// Component under which the time guard is stored
pub const SETTINGS_COMPONENT: &str = "auth/ticket";

/// Name of the time guard setting
pub const TIME_GUARD_SETTING: &str = "tickettimeguard";

/// Time guard used when nothing is configured (2 hours)
pub const DEFAULT_TIME_GUARD: u64 = 2 * 60 * 60;

/// Upper bound for a configured time guard (one year)
pub const MAX_TIME_GUARD: u64 = 365 * 24 * 60 * 60;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Site secret too short: base64 form has {0} characters, at least 32 required")]
    WeakSecret(usize),

    #[error("Asymmetric method selected but no keypair configured")]
    MissingKeypair,

    #[error("Invalid value '{value}' for setting {name}")]
    InvalidSetting { name: String, value: String },

    #[error(transparent)]
    Keypair(#[from] KeypairError),

    #[error(transparent)]
    Cipher(#[from] CipherError),
}

/// Paths of the site keypair PEM files
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypairPaths {
    pub public_key: PathBuf,
    pub private_key: PathBuf,
}

/// Deployment-wide ticket settings
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketConfig {
    /// Site-wide secret the symmetric key is derived from
    /// (supports ${ENV_VAR} expansion)
    #[serde(default)]
    pub site_secret: String,

    #[serde(default)]
    pub method: TicketMethod,

    /// How long a ticket should be honoured after issue
    #[serde(default = "default_time_guard")]
    pub time_guard_seconds: u64,

    /// Trace decrypted ticket content while decoding
    #[serde(default)]
    pub debug_trace: bool,

    /// Required for the asymmetric method unless a keypair source is injected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypair: Option<KeypairPaths>,
}

fn default_time_guard() -> u64 {
    DEFAULT_TIME_GUARD
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            site_secret: String::new(),
            method: TicketMethod::default(),
            time_guard_seconds: DEFAULT_TIME_GUARD,
            debug_trace: false,
            keypair: None,
        }
    }
}

impl std::fmt::Debug for TicketConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TicketConfig")
            .field("site_secret", &"<redacted>")
            .field("method", &self.method)
            .field("time_guard_seconds", &self.time_guard_seconds)
            .field("debug_trace", &self.debug_trace)
            .field("keypair", &self.keypair)
            .finish()
    }
}

impl TicketConfig {
    pub fn new(site_secret: impl Into<String>) -> Self {
        Self {
            site_secret: site_secret.into(),
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: TicketMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_keypair(mut self, public_key: PathBuf, private_key: PathBuf) -> Self {
        self.keypair = Some(KeypairPaths {
            public_key,
            private_key,
        });
        self
    }

    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }

    /// Parse config from a YAML string and expand the secret
    ///
    /// Checks the time guard. Key material is checked by [`TicketConfig::validate`],
    /// so a file holding only settings loads without a secret.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: TicketConfig =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.site_secret = expand_env_vars(&config.site_secret);
        check_time_guard(config.time_guard_seconds)?;
        Ok(config)
    }

    /// Validate everything a codec needs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.method == TicketMethod::Symmetric {
            let encoded_len = STANDARD.encode(self.site_secret.as_bytes()).len();
            if encoded_len < KEY_LEN {
                return Err(ConfigError::WeakSecret(encoded_len));
            }
        }

        check_time_guard(self.time_guard_seconds)?;
        Ok(())
    }

    /// The configured time guard, rejected when zero or above [`MAX_TIME_GUARD`]
    pub fn time_guard(&self) -> Result<Duration, ConfigError> {
        check_time_guard(self.time_guard_seconds)?;
        Ok(Duration::seconds(self.time_guard_seconds as i64))
    }

    pub fn keypair_source(&self) -> Option<PemFiles> {
        self.keypair
            .as_ref()
            .map(|paths| PemFiles::new(paths.public_key.clone(), paths.private_key.clone()))
    }
}

fn check_time_guard(seconds: u64) -> Result<(), ConfigError> {
    if seconds == 0 || seconds > MAX_TIME_GUARD {
        return Err(ConfigError::InvalidSetting {
            name: TIME_GUARD_SETTING.to_string(),
            value: seconds.to_string(),
        });
    }
    Ok(())
}

/// Read access to the host application's plugin settings
pub trait SettingsStore: Send + Sync {
    fn get(&self, component: &str, name: &str) -> Option<String>;
}

/// In-memory settings, keyed by (component, name)
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: HashMap<(String, String), String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, component: &str, name: &str, value: impl Into<String>) -> Self {
        self.values
            .insert((component.to_string(), name.to_string()), value.into());
        self
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, component: &str, name: &str) -> Option<String> {
        self.values
            .get(&(component.to_string(), name.to_string()))
            .cloned()
    }
}

/// The configured ticket time guard
///
/// Falls back to [`DEFAULT_TIME_GUARD`] when the setting is absent or blank.
/// Only reports the value: rejecting old tickets is up to the caller.
pub fn time_guard(store: &dyn SettingsStore) -> Result<Duration, ConfigError> {
    let seconds = match store.get(SETTINGS_COMPONENT, TIME_GUARD_SETTING) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidSetting {
                    name: TIME_GUARD_SETTING.to_string(),
                    value: raw.clone(),
                })?
        }
        _ => DEFAULT_TIME_GUARD,
    };

    check_time_guard(seconds)?;
    Ok(Duration::seconds(seconds as i64))
}

/// Substitute `${VAR}` references with the environment; unset variables
/// become empty
pub fn expand_env_vars(input: &str) -> String {
    let pattern = regex_lite::Regex::new(r"\$\{([^}]+)\}").expect("static pattern");

    pattern
        .replace_all(input, |caps: &regex_lite::Captures<'_>| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
site_secret: "a-site-secret-long-enough-for-aes"
"#;
        let config = TicketConfig::parse(yaml).unwrap();

        assert_eq!(config.method, TicketMethod::Symmetric);
        assert_eq!(config.time_guard_seconds, DEFAULT_TIME_GUARD);
        assert_eq!(config.time_guard().unwrap(), Duration::hours(2));
        assert!(!config.debug_trace);
        assert!(config.keypair.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
site_secret: "unused-for-asymmetric"
method: asymmetric
time_guard_seconds: 600
debug_trace: true
keypair:
  public_key: /etc/lms/public.pem
  private_key: /etc/lms/private.pem
"#;
        let config = TicketConfig::parse(yaml).unwrap();

        assert_eq!(config.method, TicketMethod::Asymmetric);
        assert_eq!(config.time_guard().unwrap(), Duration::minutes(10));
        assert!(config.debug_trace);
        assert_eq!(
            config.keypair,
            Some(KeypairPaths {
                public_key: PathBuf::from("/etc/lms/public.pem"),
                private_key: PathBuf::from("/etc/lms/private.pem"),
            })
        );
        assert!(config.keypair_source().is_some());
    }

    #[test]
    fn test_short_secret_rejected() {
        let config = TicketConfig::parse("site_secret: short\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::WeakSecret(8))));

        // The asymmetric method does not use the secret
        let config = TicketConfig::parse("method: asymmetric\n").unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_settings_only_config_loads_without_secret() {
        let config = TicketConfig::parse("time_guard_seconds: 1800\n").unwrap();

        assert_eq!(config.time_guard().unwrap(), Duration::minutes(30));
        assert!(matches!(config.validate(), Err(ConfigError::WeakSecret(0))));
    }

    #[test]
    fn test_out_of_range_time_guard_rejected_by_both_getters() {
        let mut config = TicketConfig::new("a-site-secret-long-enough-for-aes");
        config.time_guard_seconds = MAX_TIME_GUARD + 1;
        assert!(matches!(
            config.time_guard(),
            Err(ConfigError::InvalidSetting { .. })
        ));

        config.time_guard_seconds = MAX_TIME_GUARD;
        assert_eq!(
            config.time_guard().unwrap(),
            Duration::seconds(MAX_TIME_GUARD as i64)
        );

        let store = MemorySettings::new().with(
            SETTINGS_COMPONENT,
            TIME_GUARD_SETTING,
            (MAX_TIME_GUARD + 1).to_string(),
        );
        assert!(matches!(
            time_guard(&store),
            Err(ConfigError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_invalid_time_guard_rejected() {
        let yaml = "site_secret: a-site-secret-long-enough-for-aes\ntime_guard_seconds: 0\n";
        assert!(matches!(
            TicketConfig::parse(yaml),
            Err(ConfigError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_unknown_method_rejected() {
        let yaml = "site_secret: a-site-secret-long-enough-for-aes\nmethod: rot13\n";
        assert!(matches!(
            TicketConfig::parse(yaml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_secret_env_expansion() {
        std::env::set_var("TICKET_CONFIG_TEST_SECRET", "secret-from-the-environment-xyz");

        let config = TicketConfig::parse("site_secret: \"${TICKET_CONFIG_TEST_SECRET}\"\n").unwrap();
        assert_eq!(config.site_secret, "secret-from-the-environment-xyz");

        std::env::remove_var("TICKET_CONFIG_TEST_SECRET");
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("TICKET_EXPAND_A", "alpha");

        assert_eq!(expand_env_vars("${TICKET_EXPAND_A}"), "alpha");
        assert_eq!(expand_env_vars("x_${TICKET_EXPAND_A}_y"), "x_alpha_y");
        assert_eq!(expand_env_vars("plain"), "plain");
        assert_eq!(expand_env_vars("${TICKET_EXPAND_UNSET_VAR}"), "");

        std::env::remove_var("TICKET_EXPAND_A");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "site_secret: a-site-secret-long-enough-for-aes").unwrap();
        writeln!(file, "time_guard_seconds: 3600").unwrap();

        let config = TicketConfig::load(file.path()).unwrap();
        assert_eq!(config.time_guard().unwrap(), Duration::hours(1));

        let missing = TicketConfig::load(Path::new("/nonexistent/ticket.yml"));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = TicketConfig::new("do-not-print-this-secret-anywhere");
        let rendered = format!("{:?}", config);

        assert!(!rendered.contains("do-not-print"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_time_guard_from_settings() {
        let store = MemorySettings::new().with(SETTINGS_COMPONENT, TIME_GUARD_SETTING, "900");
        assert_eq!(time_guard(&store).unwrap(), Duration::minutes(15));
    }

    #[test]
    fn test_time_guard_defaults_when_unset() {
        assert_eq!(
            time_guard(&MemorySettings::new()).unwrap(),
            Duration::seconds(DEFAULT_TIME_GUARD as i64)
        );

        let blank = MemorySettings::new().with(SETTINGS_COMPONENT, TIME_GUARD_SETTING, "  ");
        assert_eq!(
            time_guard(&blank).unwrap(),
            Duration::seconds(DEFAULT_TIME_GUARD as i64)
        );
    }

    #[test]
    fn test_time_guard_invalid_setting() {
        let store = MemorySettings::new().with(SETTINGS_COMPONENT, TIME_GUARD_SETTING, "two hours");
        let err = time_guard(&store).unwrap_err();

        assert!(err.to_string().contains("two hours"));
    }
}
