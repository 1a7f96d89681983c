use std::env;
use std::env::current_dir;
use std::fmt::Display;
use std::time::Duration;

use config::Config;
use config::ConfigError;
use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

use crate::challenge_client::ChallengeClient;
use crate::subscriber_client::SubscriberClient;

/// Global configuration. See `get_configuration`.
#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub subscriber_api: SubscriberApiSettings,
    pub challenge: ChallengeSettings,
    pub rate_limit: RateLimitSettings,
    pub forms: FormsSettings,
    pub environment: Environment,
}

/// Server configuration
#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    /// Should be localhost on dev machine, 0.0.0.0 on prod
    pub host: String,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,

    /// Header set by the hosting platform to the caller's address. Checked
    /// before `x-forwarded-for`.
    pub client_ip_header: String,
}

/// The upstream email-marketing API that stores subscribers and contact
/// messages
#[derive(Deserialize, Clone)]
pub struct SubscriberApiSettings {
    pub base_url: String,

    /// Left optional so that a missing token is reported per request
    /// (`server_misconfigured`) instead of refusing to start
    pub api_token: Option<Secret<String>>,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl SubscriberApiSettings {
    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    pub fn client(self) -> Result<SubscriberClient, reqwest::Error> {
        let timeout = self.timeout();
        SubscriberClient::new(self.base_url, self.api_token, timeout)
    }
}

/// The anti-automation widget's server-side verification endpoint
#[derive(Deserialize, Clone)]
pub struct ChallengeSettings {
    pub verify_url: String,

    /// Enforcement is switched on by the presence of this value alone
    pub secret_key: Option<Secret<String>>,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl ChallengeSettings {
    /// Secret that always passes verification; used outside production so
    /// the flow can be exercised without live credentials.
    pub const TEST_SECRET: &'static str = "1x0000000000000000000000000000000AA";

    pub fn timeout(&self) -> Duration { Duration::from_millis(self.timeout_milliseconds) }

    /// `None` when no secret is configured, i.e. challenges are not enforced.
    pub fn client(
        self,
        environment: &Environment,
    ) -> Result<Option<ChallengeClient>, reqwest::Error> {
        let timeout = self.timeout();
        let Some(configured) = self.secret_key else {
            return Ok(None);
        };
        let secret = match environment {
            Environment::Production => configured,
            Environment::Local => Secret::new(Self::TEST_SECRET.to_string()),
        };
        ChallengeClient::new(self.verify_url, secret, timeout).map(Some)
    }
}

#[derive(Deserialize, Clone)]
pub struct RateLimitSettings {
    /// How often expired windows are dropped from memory
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub sweep_interval_seconds: u64,
}

impl RateLimitSettings {
    pub fn sweep_interval(&self) -> Duration { Duration::from_secs(self.sweep_interval_seconds) }
}

#[derive(Deserialize, Clone)]
pub struct FormsSettings {
    pub newsletter: FormSettings,
    pub contact: FormSettings,
}

/// Per-form quota and segmentation
#[derive(Deserialize, Clone)]
pub struct FormSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub rate_limit_max: u32,

    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub rate_limit_window_seconds: u64,

    /// Numeric upstream group new entries are assigned to
    #[serde(default)]
    pub group_id: Option<u64>,
}

impl FormSettings {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Local,
    Production,
}

impl Display for Environment {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Environment::Local => "local",
                Environment::Production => "production",
            }
        )
    }
}

/// Only production is special; `staging`, `test` or anything else runs with
/// the local settings.
impl From<&str> for Environment {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Local,
        }
    }
}

/// `APP_ENVIRONMENT`, else `ENVIRONMENT`, else local
fn current_environment() -> Environment {
    env::var("APP_ENVIRONMENT")
        .or_else(|_| env::var("ENVIRONMENT"))
        .map(|e| Environment::from(e.as_str()))
        .unwrap_or(Environment::Local)
}

/// Flat variables recognised by the existing deployment. These win over
/// everything else; `RATE_LIMIT_*` apply to both forms.
fn deployment_overrides() -> Vec<(&'static str, String)> {
    let mut overrides = vec![];
    let mut set = |var: &str, keys: &[&'static str]| {
        if let Ok(value) = env::var(var) {
            overrides.extend(keys.iter().map(|key| (*key, value.clone())));
        }
    };
    set("API_TOKEN", &["subscriber_api.api_token"]);
    set("CHALLENGE_SECRET", &["challenge.secret_key"]);
    set(
        "RATE_LIMIT_MAX",
        &["forms.newsletter.rate_limit_max", "forms.contact.rate_limit_max"],
    );
    set(
        "RATE_LIMIT_WINDOW_SECONDS",
        &[
            "forms.newsletter.rate_limit_window_seconds",
            "forms.contact.rate_limit_window_seconds",
        ],
    );
    // a non-numeric group id is ignored rather than fatal
    if let Some(group_id) = env::var("GROUP_ID")
        .ok()
        .and_then(|g| g.trim().parse::<u64>().ok())
    {
        overrides.push(("forms.newsletter.group_id", group_id.to_string()));
    }
    overrides
}

/// Load yaml configuration files at `<project_root>/configuration`, then
/// `APP_*` env vars, then the flat deployment variables.
///
/// All fields without a default must be present, otherwise initialisation
/// fails immediately and the server does not start.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let cfg_dir = current_dir()
        .map_err(|e| ConfigError::Foreign(Box::new(e)))?
        .join("configuration");

    let env = current_environment();

    let mut builder = Config::builder()
        .add_source(config::File::from(cfg_dir.join("base.yaml")))
        .add_source(config::File::from(cfg_dir.join(format!("{env}.yaml"))))
        .add_source(
            // env vars are -always- parsed as String, hence `serde-aux` above
            //
            // `APP_APPLICATION__PORT=5001` -> `Settings.application.port`
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .set_override("environment", env.to_string())?;

    for (key, value) in deployment_overrides() {
        builder = builder.set_override(key, value)?;
    }

    builder.build()?.try_deserialize::<Settings>()
}
