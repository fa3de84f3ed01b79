//! `groundwork.toml` configuration.
//!
//! Supplies defaults for command-line flags; flags always win.
//!
//! # Example
//!
//! ```toml
//! [render]
//! references = "resolve"
//! format = "yaml"
//! ```

use std::path::Path;

use clap::ValueEnum;
use groundwork_core::ReferencePolicy;
use serde::Deserialize;

/// Config file looked up in the working directory when `--config` is absent.
pub(crate) const DEFAULT_CONFIG: &str = "groundwork.toml";

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum DocFormat {
    #[default]
    Json,
    Yaml,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[serde(default)]
    pub render: RenderConfig,
}

/// `[render]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RenderConfig {
    pub references: Option<ReferencePolicy>,
    pub format: Option<DocFormat>,
}

/// Effective render settings after flags are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RenderSettings {
    pub policy: ReferencePolicy,
    pub format: DocFormat,
}

impl RenderConfig {
    pub(crate) fn merge(&self, resolve_references: bool, format: Option<DocFormat>) -> RenderSettings {
        let policy = if resolve_references {
            ReferencePolicy::Resolve
        } else {
            self.references.unwrap_or_default()
        };
        RenderSettings {
            policy,
            format: format.or(self.format).unwrap_or_default(),
        }
    }
}

/// Read the config at `path`, or the default file when it exists.
///
/// Returns a human-readable error string on failure.
pub(crate) fn load_config(path: Option<&Path>) -> Result<Config, String> {
    let path = match path {
        Some(p) => p,
        None => {
            let default = Path::new(DEFAULT_CONFIG);
            if !default.is_file() {
                return Ok(Config::default());
            }
            default
        }
    };
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
    let config: Config = toml::from_str(&content)
        .map_err(|e| format!("could not parse '{}': {}", path.display(), e))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(config)
}
