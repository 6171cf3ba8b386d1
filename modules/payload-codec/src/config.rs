use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Codec settings. Everything defaults to compact JSON output.
///
/// May be loaded from a dedicated TOML file, from a `[codec]` table inside a
/// larger application config, or from `PAYLOAD_CODEC_*` env vars.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    /// Pretty-print converted payloads.
    pub pretty: bool,
}

impl CodecConfig {
    /// Parse config from TOML source. A top-level `[codec]` table takes
    /// precedence over top-level keys.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut table: toml::Table =
            toml::from_str(content).context("Failed to parse codec config as TOML")?;

        let section = match table.remove("codec") {
            Some(toml::Value::Table(codec)) => codec,
            Some(other) => anyhow::bail!("`codec` must be a table, found {}", other.type_str()),
            None => table,
        };

        let config: CodecConfig = toml::Value::Table(section)
            .try_into()
            .context("Invalid codec config")?;
        Ok(config)
    }

    /// Load and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read codec config file: {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load codec config: {}", path.display()))?;

        config.log();
        Ok(config)
    }

    /// Load from environment variables (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let pretty = match std::env::var("PAYLOAD_CODEC_PRETTY") {
            Ok(raw) => parse_flag(&raw)
                .with_context(|| format!("PAYLOAD_CODEC_PRETTY must be a boolean, got {raw:?}"))?,
            Err(_) => false,
        };

        let config = Self { pretty };
        config.log();
        Ok(config)
    }

    fn log(&self) {
        tracing::info!(pretty = self.pretty, "Codec config loaded");
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
