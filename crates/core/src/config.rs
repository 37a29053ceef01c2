//! Annotation and report settings.
//!
//! Settings can be loaded from a JSON file, from environment variables, or
//! built programmatically with the `with_*` methods.

use crate::routing::RouteParams;
use crate::units;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;

/// How deep the document scanner looks for annotated items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanDepth {
    /// Layer items and all of their descendants.
    #[default]
    Recursive,
    /// Only items directly inside a layer.
    TopLevel,
}

/// Which report layout the CSV export produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportVariant {
    /// `layer,materials,area(m²)`
    #[default]
    Quantity,
    /// `layer,material,area(m²),unitPrice,totalPrice`
    UnitPrice,
}

/// CSV field quoting; one convention per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quoting {
    /// Quote only fields that need it.
    #[default]
    Minimal,
    /// Wrap every field in double quotes.
    All,
}

macro_rules! impl_from_str {
    ($ty:ty { $($text:literal => $variant:expr),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($text => Ok($variant),)+
                    _ => Err(()),
                }
            }
        }
    };
}

impl_from_str!(ScanDepth { "recursive" => ScanDepth::Recursive, "top-level" => ScanDepth::TopLevel });
impl_from_str!(ReportVariant { "quantity" => ReportVariant::Quantity, "unit-price" => ReportVariant::UnitPrice });
impl_from_str!(Quoting { "minimal" => Quoting::Minimal, "all" => Quoting::All });

/// Settings for annotating selections and exporting reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationSettings {
    /// Outline margin in document units
    pub margin: f64,
    pub label_width_mm: f64,
    pub label_height_mm: f64,
    /// Gap between the leader endpoint and the label, in document units
    pub endpoint_gap: f64,
    pub arrow_size: f64,
    pub stroke_width: f64,
    pub font_size: f64,
    /// Name of the tag holding annotation records
    pub tag_name: String,
    pub scan_depth: ScanDepth,
    pub report_variant: ReportVariant,
    pub quoting: Quoting,
    /// Annotate selections whose envelope has zero width or height
    pub allow_degenerate: bool,
    /// Prefix used when naming unnamed annotated objects
    pub unnamed_prefix: String,
    /// Append diagnostic detail to user-facing messages
    pub debug_messages: bool,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            margin: 7.0,
            label_width_mm: 66.0,
            label_height_mm: 42.0,
            endpoint_gap: 15.0,
            arrow_size: 8.0,
            stroke_width: 1.0,
            font_size: 10.0,
            tag_name: "QuoteMaterial".to_string(),
            scan_depth: ScanDepth::default(),
            report_variant: ReportVariant::default(),
            quoting: Quoting::default(),
            allow_degenerate: false,
            unnamed_prefix: "Material object".to_string(),
            debug_messages: false,
        }
    }
}

impl AnnotationSettings {
    pub fn with_margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    pub fn with_tag_name(mut self, tag_name: impl Into<String>) -> Self {
        self.tag_name = tag_name.into();
        self
    }

    pub fn with_scan_depth(mut self, scan_depth: ScanDepth) -> Self {
        self.scan_depth = scan_depth;
        self
    }

    pub fn with_report_variant(mut self, variant: ReportVariant) -> Self {
        self.report_variant = variant;
        self
    }

    pub fn with_quoting(mut self, quoting: Quoting) -> Self {
        self.quoting = quoting;
        self
    }

    pub fn with_allow_degenerate(mut self, allow: bool) -> Self {
        self.allow_degenerate = allow;
        self
    }

    pub fn with_debug_messages(mut self, debug: bool) -> Self {
        self.debug_messages = debug;
        self
    }

    /// Routing constants with the label size converted to document units.
    pub fn route_params(&self) -> RouteParams {
        RouteParams {
            margin: self.margin,
            label_width: units::mm_to_units(self.label_width_mm),
            label_height: units::mm_to_units(self.label_height_mm),
            endpoint_gap: self.endpoint_gap,
            arrow_size: self.arrow_size,
        }
    }

    /// Loads settings from environment variables on top of the defaults.
    ///
    /// Environment variables:
    /// - `MATQUOTE_MARGIN`: outline margin in document units
    /// - `MATQUOTE_TAG_NAME`: annotation tag name
    /// - `MATQUOTE_SCAN_DEPTH`: `recursive` or `top-level`
    /// - `MATQUOTE_REPORT_VARIANT`: `quantity` or `unit-price`
    /// - `MATQUOTE_QUOTING`: `minimal` or `all`
    /// - `MATQUOTE_DEBUG`: `1`/`true` to show diagnostic detail
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidValue`] naming the first variable that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().merge_env()
    }

    /// Applies any `MATQUOTE_*` variables over `self`.
    pub fn merge_env(mut self) -> Result<Self, ConfigError> {
        if let Some(val) = env_var("MATQUOTE_MARGIN") {
            self.margin = parse_env("MATQUOTE_MARGIN", &val)?;
        }

        if let Some(val) = env_var("MATQUOTE_TAG_NAME") {
            if val.trim().is_empty() {
                return Err(ConfigError::InvalidValue("MATQUOTE_TAG_NAME".to_string()));
            }
            self.tag_name = val;
        }

        if let Some(val) = env_var("MATQUOTE_SCAN_DEPTH") {
            self.scan_depth = parse_env("MATQUOTE_SCAN_DEPTH", &val)?;
        }

        if let Some(val) = env_var("MATQUOTE_REPORT_VARIANT") {
            self.report_variant = parse_env("MATQUOTE_REPORT_VARIANT", &val)?;
        }

        if let Some(val) = env_var("MATQUOTE_QUOTING") {
            self.quoting = parse_env("MATQUOTE_QUOTING", &val)?;
        }

        if let Some(val) = env_var("MATQUOTE_DEBUG") {
            self.debug_messages = match val.trim() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" | "" => false,
                _ => return Err(ConfigError::InvalidValue("MATQUOTE_DEBUG".to_string())),
            };
        }

        Ok(self)
    }

    /// Loads settings from a JSON file. Missing keys keep their defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Saves settings as pretty JSON.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue(key.to_string()))
}

/// Errors that can occur while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for configuration key: {0}")]
    InvalidValue(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Settings file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
