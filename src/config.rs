//! Tool configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. User values are
//! layered on top of stock defaults, so a config file only needs the keys it
//! changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! profile = "discord"       # Platform profile the optimizer targets
//!
//! [optimizer]
//! format = "webp"           # jpeg | png | webp
//! quality = 85              # 1-100, ignored for png
//! shrink_only = false       # true = never upscale small images
//!
//! [profiles.my-server]      # Custom profiles, selectable via `profile`
//! max_width = 1280
//! max_height = 720
//! max_payload_bytes = 4194304
//! ```
//!
//! Built-in profile names are `discord` and `discord-nitro`. A custom profile
//! with the same name as a built-in replaces it.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{FitPolicy, OptimizerPolicy, OutputFormat, Quality};
use crate::profile::PlatformProfile;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Tool configuration loaded from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Name of the platform profile the optimizer targets.
    pub profile: String,
    /// User-declared profiles, keyed by name.
    pub profiles: BTreeMap<String, PlatformProfile>,
    /// Format/quality/upscale policy for the optimizer and fresh uploads.
    pub optimizer: OptimizerConfig,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            profile: "discord".to_string(),
            profiles: BTreeMap::new(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.optimizer.quality) {
            return Err(ConfigError::Validation(
                "optimizer.quality must be 1-100".into(),
            ));
        }
        for (name, p) in &self.profiles {
            if p.max_width == 0 || p.max_height == 0 || p.max_payload_bytes == 0 {
                return Err(ConfigError::Validation(format!(
                    "profiles.{name}: limits must be non-zero"
                )));
            }
        }
        self.resolve_profile()?;
        Ok(())
    }

    /// Resolve [`ToolConfig::profile`] against custom then built-in profiles.
    pub fn resolve_profile(&self) -> Result<PlatformProfile, ConfigError> {
        self.lookup_profile(&self.profile)
    }

    /// Resolve any profile name against custom then built-in profiles.
    pub fn lookup_profile(&self, name: &str) -> Result<PlatformProfile, ConfigError> {
        self.profiles
            .get(name)
            .copied()
            .or_else(|| PlatformProfile::builtin(name))
            .ok_or_else(|| {
                let mut known: Vec<&str> = PlatformProfile::BUILTIN_NAMES.to_vec();
                known.extend(self.profiles.keys().map(String::as_str));
                ConfigError::Validation(format!(
                    "unknown profile {name:?} (known: {})",
                    known.join(", ")
                ))
            })
    }

    pub fn optimizer_policy(&self) -> OptimizerPolicy {
        self.optimizer.policy()
    }
}

/// Optimizer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    /// Output format chosen by the optimizer and for fresh uploads.
    pub format: OutputFormat,
    /// Encoding quality (1 = smallest, 100 = best). Ignored for PNG.
    pub quality: u32,
    /// Never scale an image up to fill the profile bounds.
    pub shrink_only: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        let policy = OptimizerPolicy::default();
        Self {
            format: policy.format,
            quality: policy.quality.value(),
            shrink_only: policy.fit == FitPolicy::ShrinkOnly,
        }
    }
}

impl OptimizerConfig {
    pub fn policy(&self) -> OptimizerPolicy {
        OptimizerPolicy {
            format: self.format,
            quality: Quality::new(self.quality),
            fit: if self.shrink_only {
                FitPolicy::ShrinkOnly
            } else {
                FitPolicy::AllowUpscale
            },
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ToolConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ToolConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ToolConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to stock defaults if absent.
pub fn load_config(path: &Path) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# discord-image-tools configuration
# =================================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# Platform profile the "optimize" step fits images into.
# Built-in: "discord" (1920x1080, 8 MiB), "discord-nitro" (1920x1080, 25 MiB).
profile = "discord"

# ---------------------------------------------------------------------------
# Optimizer
# ---------------------------------------------------------------------------
[optimizer]
# Output format: "webp", "jpeg" or "png".
format = "webp"

# Encoding quality (1 = smallest, 100 = best). PNG ignores it.
quality = 85

# When false, images smaller than the profile bounds are scaled up until one
# side touches the bound. Set to true to keep them at their original size.
shrink_only = false

# ---------------------------------------------------------------------------
# Custom profiles
# ---------------------------------------------------------------------------
# Declare extra targets and select one with `profile = "<name>"`.
#
# [profiles.small-server]
# max_width = 1280
# max_height = 720
# max_payload_bytes = 4194304
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_targets_discord() {
        let config = ToolConfig::default();
        assert_eq!(config.profile, "discord");
        assert_eq!(config.resolve_profile().unwrap(), PlatformProfile::DISCORD);
    }

    #[test]
    fn default_optimizer_policy() {
        let policy = ToolConfig::default().optimizer_policy();
        assert_eq!(policy, OptimizerPolicy::default());
        assert_eq!(policy.format, OutputFormat::WebP);
        assert_eq!(policy.quality.value(), 85);
        assert_eq!(policy.fit, FitPolicy::AllowUpscale);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[optimizer]
shrink_only = true
"#;
        let config: ToolConfig = toml::from_str(toml).unwrap();
        assert!(config.optimizer.shrink_only);
        // Defaults preserved
        assert_eq!(config.optimizer.quality, 85);
        assert_eq!(config.profile, "discord");
        assert_eq!(config.optimizer_policy().fit, FitPolicy::ShrinkOnly);
    }

    #[test]
    fn parse_custom_profile() {
        let toml = r#"
profile = "small"

[profiles.small]
max_width = 1280
max_height = 720
max_payload_bytes = 4194304
"#;
        let config: ToolConfig = toml::from_str(toml).unwrap();
        config.validate().unwrap();
        let profile = config.resolve_profile().unwrap();
        assert_eq!(profile.bounds(), (1280, 720));
        assert_eq!(profile.max_payload_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn custom_profile_overrides_builtin() {
        let toml = r#"
[profiles.discord]
max_width = 100
max_height = 100
max_payload_bytes = 1
"#;
        let config: ToolConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.resolve_profile().unwrap().max_width, 100);
        // Other built-ins untouched
        assert_eq!(
            config.lookup_profile("discord-nitro").unwrap(),
            PlatformProfile::DISCORD_NITRO
        );
    }

    #[test]
    fn unknown_profile_is_validation_error() {
        let config = ToolConfig {
            profile: "myspace".into(),
            ..ToolConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("discord-nitro"));
    }

    #[test]
    fn quality_out_of_range_is_validation_error() {
        let mut config = ToolConfig::default();
        config.optimizer.quality = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
        config.optimizer.quality = 101;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn zero_limit_profile_is_validation_error() {
        let toml = r#"
[profiles.broken]
max_width = 0
max_height = 720
max_payload_bytes = 10
"#;
        let config: ToolConfig = toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.profile, "discord");
        assert_eq!(config.optimizer.format, OutputFormat::WebP);
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
profile = "discord-nitro"

[optimizer]
format = "jpeg"
quality = 70
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.resolve_profile().unwrap(), PlatformProfile::DISCORD_NITRO);
        assert_eq!(config.optimizer.format, OutputFormat::Jpeg);
        assert_eq!(config.optimizer.quality, 70);
        // Unspecified values are defaults
        assert!(!config.optimizer.shrink_only);
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();

        let result = load_config(&path);
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn load_config_validates() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "profile = \"nowhere\"\n").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[optimizer]
format = "webp"
quality = 85
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[optimizer]
quality = 60
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let optimizer = merged.get("optimizer").unwrap();
        assert_eq!(optimizer.get("quality").unwrap().as_integer(), Some(60));
        assert_eq!(optimizer.get("format").unwrap().as_str(), Some("webp"));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"profile = "discord""#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"profile = "discord-nitro""#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(
            merged.get("profile").unwrap().as_str(),
            Some("discord-nitro")
        );
    }

    // =========================================================================
    // Unknown key rejection tests
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let toml_str = r#"
[optimizer]
qualty = 90
"#;
        let result: Result<ToolConfig, _> = toml::from_str(toml_str);
        assert!(result.unwrap_err().to_string().contains("unknown field"));
    }

    #[test]
    fn unknown_profile_key_rejected() {
        let toml_str = r#"
[profiles.x]
max_width = 1
max_height = 1
max_bytes = 1
"#;
        let result: Result<ToolConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: ToolConfig = toml::from_str(stock_config_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.profile, "discord");
        assert_eq!(config.optimizer.quality, 85);
        assert!(config.profiles.is_empty());
    }
}
