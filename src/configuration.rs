use std::fmt;

use crate::error::ConfigError;

/// Secret used when no signing secret is configured in a local environment.
/// Never accepted in production.
pub const DEVELOPMENT_JWT_SECRET: &str = "local-dev-jwt-secret";

const BCRYPT_MIN_COST: u32 = 4;
const BCRYPT_MAX_COST: u32 = 31;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub application: ApplicationSettings,
    #[serde(default)]
    pub jwt: JwtSettings,
    #[serde(default)]
    pub password: PasswordSettings,
    #[serde(default)]
    pub tables: TableSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub database: Option<DatabaseSettings>,
    #[serde(default)]
    pub log: LogSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Required; there is no default, so a deploy that omits it fails to
    /// start instead of running on the development secret.
    pub environment: Environment,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Production,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Token signing settings
#[derive(serde::Deserialize, Clone, Default)]
pub struct JwtSettings {
    #[serde(default)]
    pub secret: Option<String>,
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where the signing secret came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretSource {
    Configured,
    DevelopmentFallback,
}

/// HMAC signing secret, resolved once at startup
#[derive(Clone)]
pub struct SigningSecret {
    value: String,
    source: SecretSource,
}

impl SigningSecret {
    pub fn configured(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            source: SecretSource::Configured,
        }
    }

    pub fn development_fallback() -> Self {
        Self {
            value: DEVELOPMENT_JWT_SECRET.to_string(),
            source: SecretSource::DevelopmentFallback,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.value.as_bytes()
    }

    pub fn source(&self) -> SecretSource {
        self.source
    }

    pub fn is_development_fallback(&self) -> bool {
        self.source == SecretSource::DevelopmentFallback
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSecret")
            .field("value", &"<redacted>")
            .field("source", &self.source)
            .finish()
    }
}

impl JwtSettings {
    /// Resolve the signing secret for the given environment.
    ///
    /// Production fails closed: a missing or blank secret, or the
    /// development fallback value, is a configuration error.
    pub fn signing_secret(&self, environment: Environment) -> Result<SigningSecret, ConfigError> {
        let configured = self
            .secret
            .as_deref()
            .map(str::trim)
            .filter(|secret| !secret.is_empty());

        match (configured, environment) {
            (Some(DEVELOPMENT_JWT_SECRET), Environment::Production) => Err(ConfigError::InvalidValue(
                "jwt.secret must not be the development fallback in production".to_string(),
            )),
            (Some(secret), _) => Ok(SigningSecret::configured(secret)),
            (None, Environment::Local) => {
                tracing::warn!(
                    "No JWT secret configured; using the development fallback secret. \
                     Do not run this configuration in production."
                );
                Ok(SigningSecret::development_fallback())
            }
            (None, Environment::Production) => Err(ConfigError::MissingRequired(
                "jwt.secret (or JWT_SECRET) is required in production".to_string(),
            )),
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct PasswordSettings {
    #[serde(default = "default_bcrypt_cost")]
    pub cost: u32,
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for PasswordSettings {
    fn default() -> Self {
        Self {
            cost: default_bcrypt_cost(),
        }
    }
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct TableSettings {
    #[serde(default = "default_users_table")]
    pub users: String,
    #[serde(default = "default_notes_table")]
    pub notes: String,
}

fn default_users_table() -> String {
    "users".to_string()
}

fn default_notes_table() -> String {
    "notes".to_string()
}

impl Default for TableSettings {
    fn default() -> Self {
        Self {
            users: default_users_table(),
            notes: default_notes_table(),
        }
    }
}

#[derive(serde::Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(serde::Deserialize, Clone, Debug, Default)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct LogSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json_logs")]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logs() -> bool {
    true
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json_logs(),
        }
    }
}

impl Settings {
    /// Checks that do not depend on the signing secret
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(BCRYPT_MIN_COST..=BCRYPT_MAX_COST).contains(&self.password.cost) {
            return Err(ConfigError::InvalidValue(format!(
                "password.cost must be between {} and {}",
                BCRYPT_MIN_COST, BCRYPT_MAX_COST
            )));
        }

        if self.tables.users.trim().is_empty() || self.tables.notes.trim().is_empty() {
            return Err(ConfigError::InvalidValue("table names must not be empty".to_string()));
        }

        if self.tables.users == self.tables.notes {
            return Err(ConfigError::InvalidValue(
                "users and notes tables must be distinct".to_string(),
            ));
        }

        if self.store.backend == StoreBackend::Postgres && self.database.is_none() {
            return Err(ConfigError::MissingRequired(
                "database settings are required for the postgres store".to_string(),
            ));
        }

        Ok(())
    }
}

/// Load settings from `configuration.{yaml,toml,json}` (optional), then
/// `APP_*` environment variables (`APP_APPLICATION__PORT=8080`), then the
/// plain `JWT_SECRET`, `USERS_TABLE` and `NOTES_TABLE` variables.
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.port", 8000)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
        .set_override_option("tables.users", std::env::var("USERS_TABLE").ok())?
        .set_override_option("tables.notes", std::env::var("NOTES_TABLE").ok())?
        .build()?;
    settings.try_deserialize::<Settings>()
}
