use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::{DEFAULT_EXPANSION_TIERS_KM, MAX_EXPANSION_TIERS};
use crate::models::{ReputationPolicy, VisibilityPolicy, NEUTRAL_REPUTATION};
use crate::services::Collections;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    pub appwrite: Option<AppwriteSettings>,
    pub database: Option<DatabaseSettings>,
    #[serde(default)]
    pub collection: CollectionSettings,
    #[serde(default)]
    pub geocoder: GeocoderSettings,
    pub auth: AuthSettings,
    #[serde(default)]
    pub reputation: ReputationSettings,
    #[serde(default)]
    pub visibility: VisibilitySettings,
    #[serde(default)]
    pub pickup: PickupSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Which document store backend to run against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Appwrite,
    Postgres,
    #[default]
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppwriteSettings {
    pub endpoint: String,
    pub api_key: String,
    pub project_id: String,
    pub database_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectionSettings {
    #[serde(default = "default_users")]
    pub users: String,
    #[serde(default = "default_books")]
    pub books: String,
    #[serde(default = "default_feedback")]
    pub feedback: String,
    #[serde(default = "default_requests")]
    pub requests: String,
    #[serde(default = "default_ngo_requests")]
    pub ngo_requests: String,
    #[serde(default = "default_chats")]
    pub chats: String,
    #[serde(default = "default_messages")]
    pub messages: String,
    #[serde(default = "default_distributions")]
    pub distributions: String,
    #[serde(default = "default_distribution_comments")]
    pub distribution_comments: String,
}

impl Default for CollectionSettings {
    fn default() -> Self {
        Self {
            users: default_users(),
            books: default_books(),
            feedback: default_feedback(),
            requests: default_requests(),
            ngo_requests: default_ngo_requests(),
            chats: default_chats(),
            messages: default_messages(),
            distributions: default_distributions(),
            distribution_comments: default_distribution_comments(),
        }
    }
}

fn default_users() -> String { "users".to_string() }
fn default_books() -> String { "books".to_string() }
fn default_feedback() -> String { "feedback".to_string() }
fn default_requests() -> String { "requests".to_string() }
fn default_ngo_requests() -> String { "ngo_requests".to_string() }
fn default_chats() -> String { "chats".to_string() }
fn default_messages() -> String { "messages".to_string() }
fn default_distributions() -> String { "distributions".to_string() }
fn default_distribution_comments() -> String { "distribution_comments".to_string() }

impl From<CollectionSettings> for Collections {
    fn from(c: CollectionSettings) -> Self {
        Self {
            users: c.users,
            books: c.books,
            feedback: c.feedback,
            requests: c.requests,
            ngo_requests: c.ngo_requests,
            chats: c.chats,
            messages: c.messages,
            distributions: c.distributions,
            distribution_comments: c.distribution_comments,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderSettings {
    #[serde(default = "default_geocoder_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geocoder_timeout")]
    pub timeout_secs: u64,
}

impl Default for GeocoderSettings {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geocoder_timeout(),
        }
    }
}

fn default_geocoder_url() -> String { "https://nominatim.openstreetmap.org".to_string() }
fn default_user_agent() -> String { format!("EduCycle/{}", env!("CARGO_PKG_VERSION")) }
fn default_geocoder_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReputationSettings {
    #[serde(default = "default_mismatch_penalty")]
    pub mismatch_penalty: f64,
    #[serde(default = "default_rating_floor")]
    pub rating_floor: f64,
}

impl Default for ReputationSettings {
    fn default() -> Self {
        Self {
            mismatch_penalty: default_mismatch_penalty(),
            rating_floor: default_rating_floor(),
        }
    }
}

fn default_mismatch_penalty() -> f64 { 1.5 }
fn default_rating_floor() -> f64 { 1.0 }

impl From<&ReputationSettings> for ReputationPolicy {
    fn from(s: &ReputationSettings) -> Self {
        Self {
            mismatch_penalty: s.mismatch_penalty,
            rating_floor: s.rating_floor,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisibilitySettings {
    #[serde(default = "default_mismatch_weight")]
    pub mismatch_weight: f64,
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

impl Default for VisibilitySettings {
    fn default() -> Self {
        Self {
            mismatch_weight: default_mismatch_weight(),
            min_score: default_min_score(),
        }
    }
}

fn default_mismatch_weight() -> f64 { 0.5 }
fn default_min_score() -> f64 { 1.0 }

impl From<&VisibilitySettings> for VisibilityPolicy {
    fn from(s: &VisibilitySettings) -> Self {
        Self {
            mismatch_weight: s.mismatch_weight,
            min_score: s.min_score,
            neutral_reputation: NEUTRAL_REPUTATION,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PickupSettings {
    #[serde(default = "default_radius")]
    pub default_radius_km: f64,
    #[serde(default = "default_max_radius")]
    pub max_radius_km: f64,
    #[serde(default = "default_expansion_tiers")]
    pub expansion_tiers_km: Vec<f64>,
}

impl Default for PickupSettings {
    fn default() -> Self {
        Self {
            default_radius_km: default_radius(),
            max_radius_km: default_max_radius(),
            expansion_tiers_km: default_expansion_tiers(),
        }
    }
}

fn default_radius() -> f64 { 5.0 }
fn default_max_radius() -> f64 { 200.0 }
fn default_expansion_tiers() -> Vec<f64> { DEFAULT_EXPANSION_TIERS_KM.to_vec() }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration files (config/default.toml, then config/local.toml)
    /// 3. Environment variables (prefixed with EDUCYCLE__)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., EDUCYCLE__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?;

        substitute_env_vars(settings)?.try_deserialize::<Self>()?.validated()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        settings.try_deserialize::<Self>()?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let tiers = &self.pickup.expansion_tiers_km;
        if tiers.len() > MAX_EXPANSION_TIERS {
            return Err(ConfigError::Message(format!(
                "pickup.expansion_tiers_km allows at most {} tiers, got {}",
                MAX_EXPANSION_TIERS,
                tiers.len()
            )));
        }
        if tiers.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(ConfigError::Message(
                "pickup.expansion_tiers_km must be positive".to_string(),
            ));
        }
        Ok(self)
    }
}

fn environment() -> Environment {
    Environment::with_prefix("EDUCYCLE")
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("pickup.expansion_tiers_km")
        .try_parsing(true)
}

/// Override secrets from their conventional environment variables
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("database.url", "DATABASE_URL"),
        ("auth.jwt_secret", "EDUCYCLE_JWT_SECRET"),
        ("appwrite.endpoint", "APPWRITE_ENDPOINT"),
        ("appwrite.api_key", "APPWRITE_API_KEY"),
        ("appwrite.project_id", "APPWRITE_PROJECT_ID"),
        ("appwrite.database_id", "APPWRITE_DATABASE_ID"),
    ];

    let mut builder = Config::builder().add_source(settings);

    for (key, var) in overrides {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}
