//! Engine configuration
//!
//! Every field has a default, so an empty TOML document is a valid config.
//!
//! ```toml
//! merge_modifier = "reviewer"
//!
//! [layout]
//! kind = "tidy"
//! level_spacing = 150.0
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Id of the synthetic current-state node unless configured otherwise
pub const DEFAULT_CURRENT_NODE_ID: &str = "__current__";

/// Which layout strategy positions the forest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    /// Parents centred over children, no collision avoidance
    #[default]
    Centered,
    /// Leaves on consecutive slots, no overlap
    Tidy,
}

/// Spacing constants for layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Vertical distance between levels
    pub level_spacing: f64,
    /// Horizontal distance between siblings
    pub child_spacing: f64,
    /// Horizontal offset between root trees
    pub root_spacing: f64,
    /// Strategy
    pub kind: LayoutKind,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            level_spacing: 120.0,
            child_spacing: 220.0,
            root_spacing: 400.0,
            kind: LayoutKind::Centered,
        }
    }
}

impl LayoutConfig {
    /// With strategy
    #[inline]
    #[must_use]
    pub fn with_kind(mut self, kind: LayoutKind) -> Self {
        self.kind = kind;
        self
    }

    /// Reject spacings that are not finite and positive
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] naming the first bad field
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("layout.level_spacing", self.level_spacing),
            ("layout.child_spacing", self.child_spacing),
            ("layout.root_spacing", self.root_spacing),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("must be a positive finite number, got {value}"),
                });
            }
        }
        Ok(())
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Layout spacing and strategy
    pub layout: LayoutConfig,
    /// Id of the synthetic current-state node
    pub current_node_id: String,
    /// Display label of the current-state node
    pub current_node_label: String,
    /// Modifier recorded on merge entries
    pub merge_modifier: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            current_node_id: DEFAULT_CURRENT_NODE_ID.to_string(),
            current_node_label: "Current state".to_string(),
            merge_modifier: "system".to_string(),
        }
    }
}

impl EngineConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With layout settings
    #[inline]
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// With merge modifier
    #[inline]
    #[must_use]
    pub fn with_merge_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.merge_modifier = modifier.into();
        self
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// [`ConfigError::Parse`] or [`ConfigError::InvalidValue`]
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    ///
    /// # Errors
    /// [`ConfigError::Io`] when the file cannot be read, otherwise as
    /// [`EngineConfig::from_toml_str`]
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check all values
    ///
    /// # Errors
    /// [`ConfigError::InvalidValue`] naming the first bad field
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.layout.validate()?;
        if self.current_node_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "current_node_id",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}
