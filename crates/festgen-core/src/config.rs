use std::fmt;
use std::str::FromStr;

use crate::error::FestgenError;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CLOUDCONVERT_BASE_URL: &str = "https://api.cloudconvert.com/v2";
/// Characters of document text sent to the generation service.
pub const DEFAULT_TEXT_BUDGET: usize = 15_000;

/// How HWP documents are turned into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HwpStrategy {
    /// Parse the compound file locally.
    #[default]
    Offline,
    /// Convert to PDF through the remote conversion service.
    Remote,
}

impl FromStr for HwpStrategy {
    type Err = FestgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "offline" | "local" => Ok(HwpStrategy::Offline),
            "remote" | "cloudconvert" => Ok(HwpStrategy::Remote),
            other => Err(FestgenError::Config(format!(
                "unknown hwp strategy '{other}' (expected 'offline' or 'remote')"
            ))),
        }
    }
}

impl fmt::Display for HwpStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HwpStrategy::Offline => write!(f, "offline"),
            HwpStrategy::Remote => write!(f, "remote"),
        }
    }
}

#[derive(Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

#[derive(Clone)]
pub struct ConversionConfig {
    pub api_key: String,
    pub base_url: String,
}

impl ConversionConfig {
    /// Read `CLOUDCONVERT_API_KEY` (required) and `CLOUDCONVERT_BASE_URL`.
    pub fn from_lookup<F>(lookup: F) -> Result<ConversionConfig, FestgenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let api_key = get("CLOUDCONVERT_API_KEY").ok_or_else(|| {
            FestgenError::Config("CLOUDCONVERT_API_KEY is required for the remote hwp strategy".into())
        })?;
        Ok(ConversionConfig {
            api_key,
            base_url: get("CLOUDCONVERT_BASE_URL")
                .unwrap_or_else(|| DEFAULT_CLOUDCONVERT_BASE_URL.to_string()),
        })
    }
}

/// Process-wide settings, built once at startup and passed by reference.
#[derive(Clone)]
pub struct Config {
    pub generation: GenerationConfig,
    pub text_budget: usize,
    pub hwp_strategy: HwpStrategy,
    /// Present only when `hwp_strategy` is `Remote`.
    pub conversion: Option<ConversionConfig>,
}

// API keys stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("model", &self.generation.model)
            .field("base_url", &self.generation.base_url)
            .field("text_budget", &self.text_budget)
            .field("hwp_strategy", &self.hwp_strategy)
            .field("conversion", &self.conversion.as_ref().map(|c| &c.base_url))
            .finish()
    }
}

impl Config {
    /// Load `.env` (if present) and read the process environment.
    pub fn from_env() -> Result<Config, FestgenError> {
        load_dotenv()?;
        Config::from_lookup(env_lookup)
    }

    /// Build from any key lookup. Missing credentials for an enabled
    /// component are fatal here, not at call time.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, FestgenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = get("OPENAI_API_KEY").ok_or_else(|| {
            FestgenError::Config(
                "OPENAI_API_KEY not set. Add OPENAI_API_KEY=sk-... to .env or the environment"
                    .into(),
            )
        })?;

        let text_budget = match get("FESTGEN_TEXT_BUDGET") {
            Some(raw) => parse_budget(&raw)?,
            None => DEFAULT_TEXT_BUDGET,
        };

        let hwp_strategy = match get("FESTGEN_HWP_STRATEGY") {
            Some(raw) => raw.parse()?,
            None => HwpStrategy::default(),
        };

        let mut config = Config {
            generation: GenerationConfig {
                api_key,
                model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                base_url: get("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            },
            text_budget,
            hwp_strategy: HwpStrategy::Offline,
            conversion: None,
        };
        config.set_hwp_strategy(hwp_strategy, &get)?;
        Ok(config)
    }

    /// Switch HWP strategy, pulling the conversion credential when going remote.
    pub fn set_hwp_strategy<F>(&mut self, strategy: HwpStrategy, lookup: F) -> Result<(), FestgenError>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.conversion = match strategy {
            HwpStrategy::Offline => None,
            HwpStrategy::Remote => Some(ConversionConfig::from_lookup(lookup)?),
        };
        self.hwp_strategy = strategy;
        Ok(())
    }
}

/// Merge `.env` from the working directory into the process environment.
/// A missing file is fine.
pub fn load_dotenv() -> Result<(), FestgenError> {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => return Err(FestgenError::Config(format!("cannot read .env: {e}"))),
    }
    Ok(())
}

pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub fn parse_budget(raw: &str) -> Result<usize, FestgenError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(FestgenError::Config(format!(
            "text budget must be a positive integer, got '{raw}'"
        ))),
    }
}
