//! Outlay configuration system
//!
//! Loads layout and demo settings from `outlay.toml`, with environment
//! variables taking precedence over file values.

use outlay_item::{LayoutOptions, StyleMap, StyleProperty, StyleValue, UnknownProperty};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default configuration file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "outlay.toml";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    UnknownStyleProperty(#[from] UnknownProperty),
    #[error("invalid transition duration: {0:?}")]
    InvalidDuration(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutlayConfig {
    /// Options handed to every item of the layout
    pub layout: LayoutConfig,
    /// Headless demo settings
    pub demo: DemoConfig,
}

/// A duration written either as milliseconds or as a CSS-like string
/// (`"400ms"`, `"0.4s"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransitionDuration {
    Millis(f32),
    Text(String),
}

impl TransitionDuration {
    pub fn to_millis(&self) -> Result<f32, ConfigError> {
        match self {
            Self::Millis(ms) => Ok(*ms),
            Self::Text(text) => parse_duration(text),
        }
    }
}

impl Default for TransitionDuration {
    fn default() -> Self {
        Self::Text("0.4s".to_string())
    }
}

/// Parse `"400ms"`, `"0.4s"` or a bare number of milliseconds.
///
/// An empty string is a zero duration, which disables animation.
pub fn parse_duration(text: &str) -> Result<f32, ConfigError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0.0);
    }
    let invalid = || ConfigError::InvalidDuration(text.to_string());
    let (number, scale) = if let Some(ms) = text.strip_suffix("ms") {
        (ms, 1.0)
    } else if let Some(secs) = text.strip_suffix('s') {
        (secs, 1000.0)
    } else {
        (text, 1.0)
    };
    let value: f32 = number.trim().parse().map_err(|_| invalid())?;
    if !value.is_finite() {
        return Err(invalid());
    }
    Ok(value * scale)
}

/// Layout options as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Grow coordinates from the left edge
    pub origin_left: bool,
    /// Grow coordinates from the top edge
    pub origin_top: bool,
    /// Transition duration; zero disables animation
    pub transition_duration: TransitionDuration,
    /// Style items transition to when revealed
    pub visible_style: BTreeMap<String, StyleValue>,
    /// Style items transition to when hidden
    pub hidden_style: BTreeMap<String, StyleValue>,
}

/// Headless demo configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of items to lay out
    pub items: usize,
    /// Items per row
    pub columns: usize,
    /// Cell size in pixels
    pub cell: f64,
    /// Container padding in pixels
    pub padding: f64,
    /// Simulated frame length in milliseconds
    pub frame_ms: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        let options = LayoutOptions::default();
        Self {
            origin_left: options.origin_left,
            origin_top: options.origin_top,
            transition_duration: TransitionDuration::default(),
            visible_style: named_style(&options.visible_style),
            hidden_style: named_style(&options.hidden_style),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            items: 6,
            columns: 3,
            cell: 120.0,
            padding: 10.0,
            frame_ms: 16.0,
        }
    }
}

fn named_style(style: &StyleMap) -> BTreeMap<String, StyleValue> {
    style
        .iter()
        .map(|(property, value)| (property.name().to_string(), value.clone()))
        .collect()
}

fn typed_style(named: &BTreeMap<String, StyleValue>) -> Result<StyleMap, ConfigError> {
    named
        .iter()
        .map(|(name, value)| Ok((name.parse::<StyleProperty>()?, value.clone())))
        .collect()
}

impl LayoutConfig {
    /// Convert to the options items read from their layout.
    pub fn to_options(&self) -> Result<LayoutOptions, ConfigError> {
        Ok(LayoutOptions {
            origin_left: self.origin_left,
            origin_top: self.origin_top,
            transition_duration_ms: self.transition_duration.to_millis()?,
            visible_style: typed_style(&self.visible_style)?,
            hidden_style: typed_style(&self.hidden_style)?,
        })
    }
}

fn env_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl OutlayConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content)?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load configuration from `outlay.toml` in the current directory,
    /// or return the default configuration if it is missing or invalid
    pub fn load_or_default() -> Self {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if !path.exists() {
            return Self::default();
        }
        Self::load_from_file(path).unwrap_or_else(|e| {
            warn!("{e}; using default configuration");
            Self::default()
        })
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        self.merge_with(|name| std::env::var(name).ok());
    }

    /// Merge overrides looked up by variable name. Unparsable values are
    /// logged and skipped.
    pub fn merge_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("OUTLAY_ORIGIN_LEFT") {
            self.layout.origin_left = env_flag(&val);
        }
        if let Some(val) = lookup("OUTLAY_ORIGIN_TOP") {
            self.layout.origin_top = env_flag(&val);
        }
        if let Some(val) = lookup("OUTLAY_TRANSITION_DURATION") {
            match parse_duration(&val) {
                Ok(ms) => self.layout.transition_duration = TransitionDuration::Millis(ms),
                Err(e) => warn!("ignoring OUTLAY_TRANSITION_DURATION: {e}"),
            }
        }
        if let Some(val) = lookup("OUTLAY_DEMO_ITEMS") {
            match val.trim().parse::<usize>() {
                Ok(items) => self.demo.items = items,
                Err(e) => warn!("ignoring OUTLAY_DEMO_ITEMS={val:?}: {e}"),
            }
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from outlay.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = OutlayConfig::default();
        let options = config.layout.to_options().unwrap();
        assert_eq!(options, LayoutOptions::default());
        assert_eq!(config.demo.columns, 3);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("400ms").unwrap(), 400.0);
        assert_eq!(parse_duration("0.4s").unwrap(), 400.0);
        assert_eq!(parse_duration(" 250 ").unwrap(), 250.0);
        assert_eq!(parse_duration("").unwrap(), 0.0);
        assert!(matches!(
            parse_duration("fast"),
            Err(ConfigError::InvalidDuration(_))
        ));
        assert!(parse_duration("infs").is_err());
    }

    #[test]
    fn test_toml_serialization() {
        let config = OutlayConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: OutlayConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            parsed.layout.to_options().unwrap(),
            config.layout.to_options().unwrap()
        );
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[layout]
origin_left = false
transition_duration = 0

[layout.hidden_style]
opacity = 0
display = "none"

[demo]
items = 2
"#
        )
        .unwrap();

        let config = OutlayConfig::load_from_file(file.path()).unwrap();
        let options = config.layout.to_options().unwrap();
        assert!(!options.origin_left);
        assert!(options.origin_top);
        assert_eq!(options.transition_duration(), None);
        assert_eq!(options.hidden_style.number(StyleProperty::Opacity), Some(0.0));
        assert_eq!(
            options.hidden_style.get(StyleProperty::Display),
            Some(&StyleValue::from("none"))
        );
        assert_eq!(config.demo.items, 2);
        assert_eq!(config.demo.columns, 3);
    }

    #[test]
    fn test_unknown_style_property() {
        let mut config = LayoutConfig::default();
        config
            .visible_style
            .insert("colour".to_string(), StyleValue::from("red"));
        assert!(matches!(
            config.to_options(),
            Err(ConfigError::UnknownStyleProperty(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            OutlayConfig::load_from_file("/nonexistent/outlay.toml"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("OUTLAY_TRANSITION_DURATION", "1.5s");
            std::env::set_var("OUTLAY_ORIGIN_TOP", "false");
            std::env::set_var("OUTLAY_DEMO_ITEMS", "9");
        }

        let mut config = OutlayConfig::default();
        config.merge_with_env();

        assert_eq!(
            config.layout.transition_duration,
            TransitionDuration::Millis(1500.0)
        );
        assert!(!config.layout.origin_top);
        assert_eq!(config.demo.items, 9);

        unsafe {
            std::env::remove_var("OUTLAY_TRANSITION_DURATION");
            std::env::remove_var("OUTLAY_ORIGIN_TOP");
            std::env::remove_var("OUTLAY_DEMO_ITEMS");
        }
    }

    #[test]
    fn test_invalid_overrides_keep_file_values() {
        let mut config = OutlayConfig::default();
        config.demo.items = 4;
        config.layout.transition_duration = TransitionDuration::Millis(250.0);

        config.merge_with(|name| match name {
            "OUTLAY_DEMO_ITEMS" => Some("many".to_string()),
            "OUTLAY_TRANSITION_DURATION" => Some("soon".to_string()),
            "OUTLAY_ORIGIN_LEFT" => Some("0".to_string()),
            _ => None,
        });

        assert_eq!(config.demo.items, 4);
        assert_eq!(
            config.layout.transition_duration,
            TransitionDuration::Millis(250.0)
        );
        assert!(!config.layout.origin_left);
        assert!(config.layout.origin_top);
    }
}
