//! Configuration loading and validation.

use std::fmt;
use std::path::Path;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::error::{PlacebotError, Result};

/// Top-level placebot configuration.
///
/// A `users` list and a `zones` mapping, plus optional tuning sections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub users: Vec<UserConfig>,

    /// Zones in declaration order. Earlier zones win when several have
    /// pending corrections.
    #[serde(default, deserialize_with = "ordered_zones")]
    pub zones: Vec<(String, ZoneConfig)>,

    #[serde(default)]
    pub canvas: CanvasConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub endpoints: EndpointsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One agent's credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub user: String,
    #[serde(default)]
    pub pass: Option<String>,
    #[serde(default)]
    pub pass_env: Option<String>,
}

impl UserConfig {
    /// Resolve the password: check `pass` first, then the `pass_env` environment variable.
    pub fn resolve_pass(&self) -> Option<String> {
        resolve_secret_field(&self.pass, &self.pass_env)
    }
}

/// A target image placed on the board.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneConfig {
    #[serde(default)]
    pub skip: bool,

    /// Top-left corner of the image on the board, as `[x, y]`.
    #[serde(default)]
    pub position: [i32; 2],

    /// Draw strategy selector. Empty means `bitmap`.
    #[serde(default)]
    pub draw: String,

    /// Fill strategy selector. Empty means `spiral`.
    #[serde(default)]
    pub fill: String,

    /// Target image in the hex-digit text format.
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanvasConfig {
    /// Board side length in cells.
    #[serde(default = "default_extent")]
    pub extent: usize,

    /// Interval between full board refreshes.
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,

    /// How often agents poll for the first snapshot.
    #[serde(default = "default_ready_poll_ms")]
    pub ready_poll_ms: u64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            extent: default_extent(),
            refresh_secs: default_refresh_secs(),
            ready_poll_ms: default_ready_poll_ms(),
        }
    }
}

fn default_extent() -> usize {
    1000
}

fn default_refresh_secs() -> u64 {
    180
}

fn default_ready_poll_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Wait before asking again when no zone needs a correction.
    #[serde(default = "default_idle_retry_secs")]
    pub idle_retry_secs: u64,

    /// Delay between consecutive agent logins.
    #[serde(default = "default_login_stagger_ms")]
    pub login_stagger_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            idle_retry_secs: default_idle_retry_secs(),
            login_stagger_ms: default_login_stagger_ms(),
        }
    }
}

fn default_idle_retry_secs() -> u64 {
    1
}

fn default_login_stagger_ms() -> u64 {
    1000
}

/// Remote service location.
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Pause before retrying a request the server answered with 429 or 5xx.
    #[serde(default = "default_retry_pause_ms")]
    pub retry_pause_ms: u64,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            retry_pause_ms: default_retry_pause_ms(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.reddit.com".into()
}

fn default_retry_pause_ms() -> u64 {
    1000
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/56.0.2924.87 Safari/537.36".into()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(default)]
    pub level: Option<String>,

    /// Per-crate log level overrides (e.g. "placebot_client=debug").
    #[serde(default)]
    pub filters: Vec<String>,

    /// Output target: "stderr" (default) or "stdout".
    #[serde(default = "default_log_output")]
    pub output: String,
}

fn default_log_format() -> String {
    "plain".into()
}

fn default_log_output() -> String {
    "stderr".into()
}

/// Deserialize a zone mapping into a list, keeping the file's key order.
fn ordered_zones<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, ZoneConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct ZonesVisitor;

    impl<'de> Visitor<'de> for ZonesVisitor {
        type Value = Vec<(String, ZoneConfig)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a mapping of zone names to zone definitions")
        }

        fn visit_unit<E: serde::de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut zones = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, zone)) = map.next_entry::<String, ZoneConfig>()? {
                if zones.iter().any(|(existing, _)| *existing == name) {
                    return Err(serde::de::Error::custom(format!("duplicate zone '{name}'")));
                }
                zones.push((name, zone));
            }
            Ok(zones)
        }
    }

    deserializer.deserialize_any(ZonesVisitor)
}

/// Resolve a secret: check the direct value first, then the env-var reference.
pub fn resolve_secret_field(direct: &Option<String>, env_var: &Option<String>) -> Option<String> {
    if let Some(val) = direct {
        if !val.is_empty() {
            return Some(val.clone());
        }
    }
    if let Some(env) = env_var {
        if let Ok(val) = std::env::var(env) {
            if !val.is_empty() {
                return Some(val);
            }
        }
    }
    None
}

/// Substitute `${ENV_VAR}` patterns in a string with their environment variable values.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(anyhow::Error::from)?;
    Ok(re
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| {
                warn!(var = var_name, "Environment variable not set, substituting empty string");
                String::new()
            })
        })
        .into_owned())
}

impl Config {
    /// Load config from a YAML or JSON5 file, substituting `${ENV_VAR}` references.
    ///
    /// `.yaml` / `.yml` files are parsed as YAML, everything else as JSON5.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PlacebotError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let raw = std::fs::read_to_string(path)?;
        let substituted = substitute_env_vars(&raw)?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        debug!(
            path = %path.display(),
            format = if is_yaml { "yaml" } else { "json5" },
            "Loading config"
        );
        if is_yaml {
            Self::from_yaml(&substituted)
        } else {
            Self::from_json5(&substituted)
        }
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn from_json5(raw: &str) -> Result<Self> {
        json5::from_str(raw).map_err(|e| PlacebotError::Config(e.to_string()))
    }

    /// Zones that take part in drawing, in priority order.
    pub fn active_zones(&self) -> impl Iterator<Item = (&str, &ZoneConfig)> {
        self.zones
            .iter()
            .filter(|(_, zone)| !zone.skip)
            .map(|(name, zone)| (name.as_str(), zone))
    }

    /// Validate config, returning (warnings, errors).
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if self.users.is_empty() {
            errors.push("No users configured".to_string());
        }

        for u in &self.users {
            if u.user.is_empty() {
                errors.push("User entry with empty name".to_string());
            } else if u.resolve_pass().is_none() {
                warnings.push(format!("User '{}' has no password configured", u.user));
            }
        }

        if self.active_zones().next().is_none() {
            errors.push("No active zones configured".to_string());
        }

        for (name, zone) in self.active_zones() {
            if zone.data.trim().is_empty() {
                warnings.push(format!("Zone '{name}' has an empty image"));
            }
        }

        if self.canvas.extent == 0 {
            errors.push("Canvas extent cannot be 0".to_string());
        }

        if self.canvas.refresh_secs == 0 {
            errors.push("Canvas refresh interval cannot be 0".to_string());
        }

        (warnings, errors)
    }
}
