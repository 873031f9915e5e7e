//! Reader configuration.
//!
//! Everything the engine reads from a chapter document is addressed through
//! names collected here: the `data-*` attributes written by the book
//! generator, the URL parameters that persist reading state, and the CSS
//! custom properties those parameters are bound to. The defaults match the
//! markup emitted by the ereader generator; hosts with different markup can
//! override them (the CLI loads overrides from JSON).

#[cfg(feature = "cli")]
use serde::Deserialize;

use crate::error::{Error, Result};

/// URL parameter holding the current location.
pub const LOCATION_PARAM: &str = "location";

/// URL parameter holding the comma-separated font family list.
pub const FONTS_PARAM: &str = "fonts";

/// Attribute names of the chapter and index document contracts.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(Deserialize))]
#[cfg_attr(feature = "cli", serde(default))]
pub struct Attributes {
    /// Location tag on every addressable element.
    pub location: String,
    /// Next chapter path, on the root element.
    pub next: String,
    /// Previous chapter path, on the root element.
    pub previous: String,
    /// Index document path, on the root element.
    pub index: String,
    /// Inclusive first location of the chapter, on the root element.
    pub location_start: String,
    /// Exclusive last location of the chapter, on the root element.
    pub location_end: String,
    /// Set to `"true"` on the root element when text flows vertically.
    pub is_vertical: String,
    /// Chapter path on an index entry.
    pub index_path: String,
    /// Inclusive first location on an index entry.
    pub index_start: String,
    /// Exclusive last location on an index entry.
    pub index_end: String,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            location: "data-ereader__location".into(),
            next: "data-ereader__next".into(),
            previous: "data-ereader__previous".into(),
            index: "data-ereader__index".into(),
            location_start: "data-ereader__location_start".into(),
            location_end: "data-ereader__location_end".into(),
            is_vertical: "data-ereader__is_vertical".into(),
            index_path: "data-ereader__path".into(),
            index_start: "data-ereader__start".into(),
            index_end: "data-ereader__end".into(),
        }
    }
}

/// A URL parameter bound to a CSS custom property.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(Deserialize))]
pub struct StyleBinding {
    pub param: String,
    pub css_var: String,
}

impl StyleBinding {
    pub fn new(param: impl Into<String>, css_var: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            css_var: css_var.into(),
        }
    }
}

/// Keys that turn pages (as `KeyboardEvent.code` values).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(Deserialize))]
#[cfg_attr(feature = "cli", serde(default))]
pub struct PageKeys {
    pub previous: String,
    pub next: String,
    /// Keys whose default scrolling is suppressed.
    pub suppressed: Vec<String>,
}

impl Default for PageKeys {
    fn default() -> Self {
        Self {
            previous: "BracketLeft".into(),
            next: "BracketRight".into(),
            suppressed: ["Space", "ArrowUp", "ArrowDown", "ArrowLeft", "ArrowRight"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Font availability probe and web font service settings.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(Deserialize))]
#[cfg_attr(feature = "cli", serde(default))]
pub struct FontSettings {
    /// CSS custom property holding the font family list.
    pub css_var: String,
    /// String measured to tell a family apart from the fallback.
    pub probe_text: String,
    /// Probe size in CSS pixels.
    pub probe_size_px: f64,
    /// Generic family every probe falls back to.
    pub fallback_family: String,
    /// Script URL of the web font loader.
    pub loader_url: String,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            css_var: "--ereader-fonts".into(),
            probe_text: "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".into(),
            probe_size_px: 144.0,
            fallback_family: "monospace".into(),
            loader_url: "https://ajax.googleapis.com/ajax/libs/webfont/1/webfont.js".into(),
        }
    }
}

/// Complete reader configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "cli", derive(Deserialize))]
#[cfg_attr(feature = "cli", serde(default))]
pub struct ReaderConfig {
    pub attributes: Attributes,
    /// Parameters synced with CSS on setup, in order.
    pub styles: Vec<StyleBinding>,
    pub keys: PageKeys,
    pub fonts: FontSettings,
    /// Content of the `<meta name="viewport">` tag.
    pub viewport_meta: String,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            attributes: Attributes::default(),
            styles: vec![
                StyleBinding::new("background", "--ereader-background-color"),
                StyleBinding::new("foreground", "--ereader-foreground-color"),
                StyleBinding::new("scale", "--ereader-scale"),
                StyleBinding::new("main-padding", "--ereader-main-padding"),
                StyleBinding::new("cross-padding", "--ereader-cross-padding"),
                StyleBinding::new("line-height", "--ereader-line-height"),
            ],
            keys: PageKeys::default(),
            fonts: FontSettings::default(),
            viewport_meta: "width=device-width, initial-scale=1.0, height=device-height".into(),
        }
    }
}

impl ReaderConfig {
    /// Check that no name the engine relies on is empty.
    pub fn validate(&self) -> Result<()> {
        let a = &self.attributes;
        let required = [
            ("attributes.location", &a.location),
            ("attributes.next", &a.next),
            ("attributes.previous", &a.previous),
            ("attributes.index", &a.index),
            ("attributes.location_start", &a.location_start),
            ("attributes.location_end", &a.location_end),
            ("attributes.index_path", &a.index_path),
            ("attributes.index_start", &a.index_start),
            ("attributes.index_end", &a.index_end),
            ("fonts.css_var", &self.fonts.css_var),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{field} must not be empty")));
            }
        }

        for binding in &self.styles {
            if !binding.css_var.starts_with("--") {
                return Err(Error::Config(format!(
                    "style binding for {:?} must target a custom property, got {:?}",
                    binding.param, binding.css_var
                )));
            }
        }

        let size = self.fonts.probe_size_px;
        if !size.is_finite() || size <= 0.0 {
            return Err(Error::Config("fonts.probe_size_px must be positive".into()));
        }

        Ok(())
    }

    /// Parse a configuration from JSON; missing fields take their defaults.
    #[cfg(feature = "cli")]
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ReaderConfig::default().validate().is_ok());
    }

    #[test]
    fn test_default_style_bindings_order() {
        let config = ReaderConfig::default();
        let params: Vec<_> = config.styles.iter().map(|b| b.param.as_str()).collect();
        assert_eq!(
            params,
            [
                "background",
                "foreground",
                "scale",
                "main-padding",
                "cross-padding",
                "line-height"
            ]
        );
    }

    #[test]
    fn test_validate_rejects_empty_attribute() {
        let mut config = ReaderConfig::default();
        config.attributes.location = "  ".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("attributes.location"));
    }

    #[test]
    fn test_validate_rejects_plain_property_binding() {
        let mut config = ReaderConfig::default();
        config.styles.push(StyleBinding::new("color", "color"));
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_from_json_partial_override() {
        let config = ReaderConfig::from_json(
            r#"{ "attributes": { "location": "data-loc" }, "keys": { "next": "KeyJ" } }"#,
        )
        .unwrap();
        assert_eq!(config.attributes.location, "data-loc");
        assert_eq!(config.attributes.next, "data-ereader__next");
        assert_eq!(config.keys.next, "KeyJ");
        assert_eq!(config.keys.previous, "BracketLeft");
        assert_eq!(config.styles.len(), 6);
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            ReaderConfig::from_json("{ not json"),
            Err(Error::Config(_))
        ));
    }
}
