//! Generator Configuration - Layout, Style and Metadata Defaults

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid layout value: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct GeneratorConfig {
    #[serde(default)]
    pub metadata: MetadataConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub predicate_style: PredicateStyle,
    #[serde(default)]
    pub atom_notation: AtomNotation,
    #[serde(default)]
    pub ownership: OwnershipPolicy,
    #[serde(default = "default_indent")]
    pub indent: usize,
}

fn default_indent() -> usize { 2 }

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            metadata: MetadataConfig::default(),
            layout: LayoutConfig::default(),
            predicate_style: PredicateStyle::default(),
            atom_notation: AtomNotation::default(),
            ownership: OwnershipPolicy::default(),
            indent: default_indent(),
        }
    }
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content)?;
        config.layout.check()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_description")]
    pub description: String,
}

fn default_title() -> String { "Existential Graph".to_string() }
fn default_description() -> String { "Generated by egrf-core".to_string() }

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: default_description(),
        }
    }
}

/// Sizes and spacing used by the position calculator, in canvas units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LayoutConfig {
    #[serde(default = "default_canvas_width")]
    pub canvas_width: f64,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: f64,
    #[serde(default = "default_predicate_width")]
    pub predicate_width: f64,
    #[serde(default = "default_predicate_height")]
    pub predicate_height: f64,
    /// Approximate label glyph width; long names widen the predicate box
    #[serde(default = "default_char_width")]
    pub char_width: f64,
    #[serde(default = "default_entity_size")]
    pub entity_size: f64,
    #[serde(default = "default_margin")]
    pub margin: f64,
    #[serde(default = "default_spacing")]
    pub spacing: f64,
    #[serde(default = "default_min_cut")]
    pub min_cut_width: f64,
    #[serde(default = "default_min_cut")]
    pub min_cut_height: f64,
}

fn default_canvas_width() -> f64 { 800.0 }
fn default_canvas_height() -> f64 { 600.0 }
fn default_predicate_width() -> f64 { 60.0 }
fn default_predicate_height() -> f64 { 30.0 }
fn default_char_width() -> f64 { 9.0 }
fn default_entity_size() -> f64 { 10.0 }
fn default_margin() -> f64 { 20.0 }
fn default_spacing() -> f64 { 10.0 }
fn default_min_cut() -> f64 { 100.0 }

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            predicate_width: default_predicate_width(),
            predicate_height: default_predicate_height(),
            char_width: default_char_width(),
            entity_size: default_entity_size(),
            margin: default_margin(),
            spacing: default_spacing(),
            min_cut_width: default_min_cut(),
            min_cut_height: default_min_cut(),
        }
    }
}

impl LayoutConfig {
    /// Sizes must be positive and finite, margin and spacing non-negative.
    pub fn check(&self) -> Result<(), ConfigError> {
        let positive = [
            ("canvas_width", self.canvas_width),
            ("canvas_height", self.canvas_height),
            ("predicate_width", self.predicate_width),
            ("predicate_height", self.predicate_height),
            ("entity_size", self.entity_size),
            ("min_cut_width", self.min_cut_width),
            ("min_cut_height", self.min_cut_height),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("char_width", self.char_width),
            ("margin", self.margin),
            ("spacing", self.spacing),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("{} must be >= 0, got {}", name, value)));
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PredicateStyle {
    /// Bordered box with fill and stroke
    Boxed,
    /// Bare label, no box
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AtomNotation {
    /// `Man(Socrates)`
    #[default]
    Functional,
    /// `(Man Socrates)`
    Prefix,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipPolicy {
    /// Items without a context are owned by the sheet of assertion
    #[default]
    RootFallback,
    /// Items without a context are rejected
    Strict,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = GeneratorConfig::from_json("{}").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert_eq!(config.layout.canvas_width, 800.0);
        assert_eq!(config.layout.predicate_height, 30.0);
        assert_eq!(config.predicate_style, PredicateStyle::None);
        assert_eq!(config.indent, 2);
    }

    #[test]
    fn test_partial_override() {
        let config = GeneratorConfig::from_json(
            r#"{
                "layout": {"canvas_width": 1000},
                "predicate_style": "boxed",
                "ownership": "strict"
            }"#,
        )
        .unwrap();
        assert_eq!(config.layout.canvas_width, 1000.0);
        assert_eq!(config.layout.canvas_height, 600.0);
        assert_eq!(config.predicate_style, PredicateStyle::Boxed);
        assert_eq!(config.ownership, OwnershipPolicy::Strict);
    }

    #[test]
    fn test_rejects_non_positive_size() {
        let err = GeneratorConfig::from_json(r#"{"layout": {"predicate_width": 0}}"#).unwrap_err();
        assert!(err.to_string().contains("predicate_width"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = GeneratorConfig::load(Path::new("/nonexistent/egrf.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
