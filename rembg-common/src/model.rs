//! Segmentation model names understood by the removal engine.

use serde::{Deserialize, Serialize};

/// Name of the pre-trained segmentation model the engine should use.
///
/// The four known models are listed by `/models`. Any other name is kept
/// verbatim in [`ModelName::Other`] and handed to the engine unchanged, which
/// may reject it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ModelName {
    /// General purpose model
    #[default]
    U2Net,
    /// Human segmentation
    U2NetHumanSeg,
    /// Portraits and people
    Silueta,
    /// High quality general purpose model
    IsNetGeneralUse,
    /// Unrecognized name, passed through as given
    Other(String),
}

impl ModelName {
    /// All known model variants, in `/models` order.
    pub const ALL: [ModelName; 4] = [
        ModelName::U2Net,
        ModelName::U2NetHumanSeg,
        ModelName::Silueta,
        ModelName::IsNetGeneralUse,
    ];

    /// The name as the engine expects it.
    pub fn as_str(&self) -> &str {
        match self {
            ModelName::U2Net => "u2net",
            ModelName::U2NetHumanSeg => "u2net_human_seg",
            ModelName::Silueta => "silueta",
            ModelName::IsNetGeneralUse => "isnet-general-use",
            ModelName::Other(name) => name,
        }
    }

    /// Human-readable description, for known models only.
    pub fn description(&self) -> Option<&'static str> {
        match self {
            ModelName::U2Net => Some("General purpose model, good balance of speed and quality"),
            ModelName::U2NetHumanSeg => Some("Optimized for human subjects"),
            ModelName::Silueta => Some("Good for portraits and people"),
            ModelName::IsNetGeneralUse => Some("High quality general purpose model"),
            ModelName::Other(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ModelName::Other(_))
    }
}

impl From<String> for ModelName {
    fn from(name: String) -> Self {
        match name.as_str() {
            "u2net" => ModelName::U2Net,
            "u2net_human_seg" => ModelName::U2NetHumanSeg,
            "silueta" => ModelName::Silueta,
            "isnet-general-use" => ModelName::IsNetGeneralUse,
            _ => ModelName::Other(name),
        }
    }
}

impl From<&str> for ModelName {
    fn from(name: &str) -> Self {
        ModelName::from(name.to_string())
    }
}

impl From<ModelName> for String {
    fn from(model: ModelName) -> Self {
        match model {
            ModelName::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for ModelName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry of the `/models` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub name: String,
    pub description: String,
}

impl ModelDescriptor {
    /// The fixed registry of known models.
    pub fn registry() -> Vec<ModelDescriptor> {
        ModelName::ALL
            .iter()
            .map(|model| ModelDescriptor {
                name: model.as_str().to_string(),
                description: model.description().unwrap_or_default().to_string(),
            })
            .collect()
    }
}
