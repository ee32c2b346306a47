use chrono::{NaiveTime, Timelike};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::job::BackfillPolicy;
use crate::core::llm::{DEFAULT_MODEL_URL, RetryPolicy, SamplingParams};
use crate::core::scheduler::{DEFAULT_SCHEDULE, fixed_time_of_day};

pub const API_KEY_ENV: &str = "HUGGINGFACE_API_KEY";
pub const API_KEY_VAULT_KEY: &str = "huggingface_api_key";
pub const DATA_DIR_ENV: &str = "AUTOBLOG_DATA_DIR";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "no text-generation credential: set {env_var} or run `autoblog vault set {vault_key} <token>`"
    )]
    MissingCredential {
        env_var: &'static str,
        vault_key: &'static str,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub endpoint: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub warmup_cooldown_secs: u64,
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        let params = SamplingParams::default();
        Self {
            endpoint: DEFAULT_MODEL_URL.to_string(),
            timeout_secs: 60,
            max_attempts: 3,
            warmup_cooldown_secs: 20,
            max_new_tokens: params.max_new_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub schedule: String,
    pub min_articles: u32,
    pub backfill_delay_secs: u64,
    /// Hour stamped on backfilled articles. Only needed when `schedule` has no
    /// fixed time of day; otherwise it must agree with the schedule.
    pub publish_hour: Option<u32>,
    pub topics: Vec<String>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            schedule: DEFAULT_SCHEDULE.to_string(),
            min_articles: 3,
            backfill_delay_secs: 5,
            publish_hour: None,
            topics: Vec::new(),
        }
    }
}

/// On-disk shape of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
struct FileConfig {
    database_path: Option<PathBuf>,
    log_level: Option<String>,
    backend: BackendConfig,
    job: JobConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub log_level: String,
    pub backend: BackendConfig,
    pub job: JobConfig,
    /// Credential taken from the environment. The vault is consulted later, once the
    /// database is open.
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Resolve the data dir, read `config.toml` if present and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let lookup = |key: &str| std::env::var(key).ok();
        let data_dir = resolve_data_dir(&lookup);
        Self::load_from(&data_dir, &lookup)
    }

    pub fn load_from(
        data_dir: &Path,
        lookup: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let path = data_dir.join("config.toml");
        let file = if path.exists() {
            let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            parse_file_config(&raw, &path)?
        } else {
            FileConfig::default()
        };

        let mut config = Self {
            data_dir: data_dir.to_path_buf(),
            database_path: file
                .database_path
                .unwrap_or_else(|| data_dir.join("articles.db")),
            log_level: file.log_level.unwrap_or_else(|| "info".to_string()),
            backend: file.backend,
            job: file.job,
            api_key: None,
        };
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, lookup: &dyn Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        self.api_key = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty());
        if let Some(url) = lookup("AUTOBLOG_MODEL_URL") {
            self.backend.endpoint = url;
        }
        if let Some(schedule) = lookup("AUTOBLOG_SCHEDULE") {
            self.job.schedule = schedule;
        }
        if let Some(level) = lookup("AUTOBLOG_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(min) = lookup("AUTOBLOG_MIN_ARTICLES") {
            self.job.min_articles =
                min.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: "AUTOBLOG_MIN_ARTICLES",
                        reason: format!("'{}' is not a non-negative integer", min),
                    })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backend.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }
        if let Some(hour) = self.job.publish_hour {
            if hour > 23 {
                return Err(ConfigError::InvalidValue {
                    field: "job.publish_hour",
                    reason: format!("{} is not an hour of the day", hour),
                });
            }
            if let Some(fires_at) = fixed_time_of_day(&self.job.schedule)
                && fires_at.hour() != hour
            {
                return Err(ConfigError::InvalidValue {
                    field: "job.publish_hour",
                    reason: format!(
                        "{} disagrees with schedule '{}', which fires at {}",
                        hour,
                        self.job.schedule,
                        fires_at.format("%H:%M")
                    ),
                });
            }
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backend.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        if parse_level(&self.log_level).is_none() {
            return Err(ConfigError::InvalidValue {
                field: "log_level",
                reason: format!("unknown level '{}'", self.log_level),
            });
        }
        Ok(())
    }

    /// The credential, or the fail-fast startup error when neither source has one.
    pub fn require_api_key(&self, from_vault: Option<String>) -> Result<String, ConfigError> {
        self.api_key
            .clone()
            .or(from_vault.filter(|k| !k.trim().is_empty()))
            .ok_or(ConfigError::MissingCredential {
                env_var: API_KEY_ENV,
                vault_key: API_KEY_VAULT_KEY,
            })
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join("autoblog.log")
    }

    pub fn max_level(&self) -> tracing::Level {
        parse_level(&self.log_level).unwrap_or(tracing::Level::INFO)
    }

    pub fn sampling_params(&self) -> SamplingParams {
        SamplingParams {
            max_new_tokens: self.backend.max_new_tokens,
            temperature: self.backend.temperature,
            top_p: self.backend.top_p,
            do_sample: true,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.backend.max_attempts,
            warmup_cooldown: Duration::from_secs(self.backend.warmup_cooldown_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    /// Backfilled articles carry the time the schedule fires at, so history and
    /// live articles share one time of day.
    pub fn backfill_policy(&self) -> BackfillPolicy {
        let publish_at = fixed_time_of_day(&self.job.schedule)
            .or_else(|| {
                self.job
                    .publish_hour
                    .and_then(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
            })
            .unwrap_or(BackfillPolicy::default().publish_at);
        BackfillPolicy {
            minimum: self.job.min_articles,
            delay: Duration::from_secs(self.job.backfill_delay_secs),
            publish_at,
        }
    }
}

fn parse_file_config(raw: &str, path: &Path) -> Result<FileConfig, ConfigError> {
    toml::from_str(raw).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn parse_level(level: &str) -> Option<tracing::Level> {
    level.trim().parse().ok()
}

fn resolve_data_dir(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    match lookup(DATA_DIR_ENV) {
        Some(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join(".autoblog"),
    }
}
