pub mod batch;
pub mod cardnews;
pub mod extract;
pub mod schema;
pub mod summarize;

use festgen_core::config::{self, Config};
use festgen_core::error::FestgenError;

use crate::Overrides;

/// Environment configuration with command-line overrides applied.
pub fn load_config(overrides: &Overrides) -> Result<Config, FestgenError> {
    let mut config = Config::from_env()?;
    if let Some(model) = &overrides.model {
        config.generation.model = model.clone();
    }
    if let Some(budget) = overrides.budget {
        if budget == 0 {
            return Err(FestgenError::InvalidInput("--budget must be positive".into()));
        }
        config.text_budget = budget;
    }
    if let Some(strategy) = overrides.hwp_strategy {
        config.set_hwp_strategy(strategy, config::env_lookup)?;
    }
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}
