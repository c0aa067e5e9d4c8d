//! Background removal options.

use serde::{Deserialize, Serialize};

use crate::ModelName;

pub const DEFAULT_FOREGROUND_THRESHOLD: i64 = 240;
pub const DEFAULT_BACKGROUND_THRESHOLD: i64 = 10;
pub const DEFAULT_ERODE_SIZE: i64 = 10;

/// Options for a single background removal call.
///
/// Thresholds and erode size are not range checked: negative or oversized
/// values are forwarded to the engine as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemovalOptions {
    #[serde(default)]
    pub model: ModelName,
    /// Refine mask edges with alpha matting.
    #[serde(default)]
    pub alpha_matting: bool,
    #[serde(default = "default_foreground_threshold")]
    pub alpha_matting_foreground_threshold: i64,
    #[serde(default = "default_background_threshold")]
    pub alpha_matting_background_threshold: i64,
    #[serde(default = "default_erode_size")]
    pub alpha_matting_erode_size: i64,
}

impl Default for RemovalOptions {
    fn default() -> Self {
        Self {
            model: ModelName::default(),
            alpha_matting: false,
            alpha_matting_foreground_threshold: default_foreground_threshold(),
            alpha_matting_background_threshold: default_background_threshold(),
            alpha_matting_erode_size: default_erode_size(),
        }
    }
}

fn default_foreground_threshold() -> i64 {
    DEFAULT_FOREGROUND_THRESHOLD
}
fn default_background_threshold() -> i64 {
    DEFAULT_BACKGROUND_THRESHOLD
}
fn default_erode_size() -> i64 {
    DEFAULT_ERODE_SIZE
}
