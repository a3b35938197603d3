//! Runtime configuration loaded from the environment (and `.env` if present).

use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_DATABASE_URL: &str = "sqlite://workout-coach.db?mode=rwc";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Invalid value for {name}: {value:?}")]
  Invalid { name: &'static str, value: String },
}

/// Attempt budget and per-attempt timeout for plan generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationSettings {
  pub max_attempts: u32,
  pub attempt_timeout: Duration,
}

impl Default for GenerationSettings {
  fn default() -> Self {
    Self {
      max_attempts: DEFAULT_MAX_ATTEMPTS,
      attempt_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_url: String,
  /// Only required when generating plans
  pub openai_api_key: Option<String>,
  pub openai_base_url: String,
  pub openai_model: String,
  pub generation: GenerationSettings,
  /// Reject unknown exercise names instead of creating placeholder entries
  pub strict_exercise_resolution: bool,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      openai_api_key: None,
      openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
      openai_model: DEFAULT_OPENAI_MODEL.to_string(),
      generation: GenerationSettings::default(),
      strict_exercise_resolution: false,
    }
  }
}

impl AppConfig {
  /// Load configuration, reading a `.env` file first if one exists.
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();
    Self::from_current_env()
  }

  /// Load configuration from the process environment only.
  pub fn from_current_env() -> Result<Self, ConfigError> {
    let defaults = Self::default();

    let openai_base_url = match env::var("OPENAI_BASE_URL") {
      Ok(raw) => match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => raw.trim().trim_end_matches('/').to_string(),
        _ => {
          return Err(ConfigError::Invalid {
            name: "OPENAI_BASE_URL",
            value: raw,
          })
        }
      },
      Err(_) => defaults.openai_base_url,
    };

    let attempt_timeout = match env::var("GENERATION_TIMEOUT_SECS") {
      Ok(raw) => Duration::from_secs(parse_positive("GENERATION_TIMEOUT_SECS", &raw)?),
      Err(_) => defaults.generation.attempt_timeout,
    };

    let max_attempts = match env::var("GENERATION_MAX_ATTEMPTS") {
      Ok(raw) => parse_positive("GENERATION_MAX_ATTEMPTS", &raw)? as u32,
      Err(_) => defaults.generation.max_attempts,
    };

    Ok(Self {
      database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
      openai_api_key: env::var("OPENAI_API_KEY")
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty()),
      openai_base_url,
      openai_model: env::var("OPENAI_MODEL").unwrap_or(defaults.openai_model),
      generation: GenerationSettings {
        max_attempts,
        attempt_timeout,
      },
      strict_exercise_resolution: env::var("STRICT_EXERCISE_RESOLUTION")
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false),
    })
  }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
  match raw.trim().parse::<u64>() {
    Ok(v) if v > 0 => Ok(v),
    _ => Err(ConfigError::Invalid {
      name,
      value: raw.to_string(),
    }),
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
