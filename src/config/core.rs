use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Json, Toml, Yaml};
use std::path::Path;
use tracing::debug;

use super::{AppConfig, smart_load};
use crate::reducer::MAX_CHANNEL_BUFFER_MULTIPLIER;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

const ENV_PREFIX: &str = "MULTICRYPT_";

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::load_with_custom_config(None)
    }

    pub fn load_with_custom_config(custom_config: Option<&Path>) -> Result<Self> {
        let config: AppConfig = Self::figment(custom_config)?
            .extract()
            .context("Failed to extract configuration")?;

        config.validate()?;
        debug!(?config, "configuration loaded");
        Ok(config)
    }

    /// The merged provider stack, before extraction
    pub fn figment(custom_config: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(path) = custom_config {
            if !path.exists() {
                bail!("Config file not found: {}", path.display());
            }
            figment = figment.merge(smart_load::auto(path));
        } else {
            figment = figment
                .merge(Toml::file("multicrypt.toml"))
                .merge(Yaml::file("multicrypt.yaml"))
                .merge(Yaml::file("multicrypt.yml"))
                .merge(Json::file("multicrypt.json"));
        }

        // Environment variables always have highest priority
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    pub fn validate(&self) -> Result<()> {
        let reducer = &self.reducer;
        if reducer.worker_count == 0 {
            bail!("reducer.worker_count must be at least 1");
        }
        if !(1..=MAX_CHANNEL_BUFFER_MULTIPLIER).contains(&reducer.channel_buffer_multiplier) {
            bail!(
                "reducer.channel_buffer_multiplier must be between 1 and {}, got {}",
                MAX_CHANNEL_BUFFER_MULTIPLIER,
                reducer.channel_buffer_multiplier
            );
        }
        if reducer.low > reducer.high {
            bail!(
                "reducer.low ({}) must not be greater than reducer.high ({})",
                reducer.low,
                reducer.high
            );
        }
        Ok(())
    }
}
