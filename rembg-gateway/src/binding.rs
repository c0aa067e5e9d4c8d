//! Binding of raw request fields into typed removal options.

use rembg_common::{ModelName, RemovalOptions};

use crate::error::{Error, Result};

/// Unparsed removal parameters as they arrive on the wire.
///
/// Filled from the query string first; multipart text fields with the same
/// name replace the query value.
#[derive(Debug, Clone, Default)]
pub struct RawRemovalParams {
    pub model: Option<String>,
    pub alpha_matting: Option<String>,
    pub alpha_matting_foreground_threshold: Option<String>,
    pub alpha_matting_background_threshold: Option<String>,
    pub alpha_matting_erode_size: Option<String>,
}

impl RawRemovalParams {
    /// Record a query or form value. Returns false for unknown names.
    pub fn set(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "model" => &mut self.model,
            "alpha_matting" => &mut self.alpha_matting,
            "alpha_matting_foreground_threshold" => &mut self.alpha_matting_foreground_threshold,
            "alpha_matting_background_threshold" => &mut self.alpha_matting_background_threshold,
            "alpha_matting_erode_size" => &mut self.alpha_matting_erode_size,
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Parse into `RemovalOptions`, filling defaults for absent fields.
    pub fn bind(&self) -> Result<RemovalOptions> {
        let defaults = RemovalOptions::default();

        Ok(RemovalOptions {
            model: self
                .model
                .clone()
                .map(ModelName::from)
                .unwrap_or(defaults.model),
            alpha_matting: parse_field("alpha_matting", &self.alpha_matting, parse_bool)?
                .unwrap_or(defaults.alpha_matting),
            alpha_matting_foreground_threshold: parse_field(
                "alpha_matting_foreground_threshold",
                &self.alpha_matting_foreground_threshold,
                parse_int,
            )?
            .unwrap_or(defaults.alpha_matting_foreground_threshold),
            alpha_matting_background_threshold: parse_field(
                "alpha_matting_background_threshold",
                &self.alpha_matting_background_threshold,
                parse_int,
            )?
            .unwrap_or(defaults.alpha_matting_background_threshold),
            alpha_matting_erode_size: parse_field(
                "alpha_matting_erode_size",
                &self.alpha_matting_erode_size,
                parse_int,
            )?
            .unwrap_or(defaults.alpha_matting_erode_size),
        })
    }
}

fn parse_field<T>(
    name: &str,
    raw: &Option<String>,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>> {
    match raw {
        None => Ok(None),
        Some(value) => parse(value)
            .map(Some)
            .ok_or_else(|| Error::Validation(format!("Invalid value for {}: {}", name, value))),
    }
}

/// Lenient boolean parsing for form and query values.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" | "t" | "y" => Some(true),
        "false" | "0" | "no" | "off" | "f" | "n" => Some(false),
        _ => None,
    }
}

/// Signed integer parsing. Out-of-range magnitudes are not clamped.
pub fn parse_int(value: &str) -> Option<i64> {
    value.trim().parse().ok()
}
