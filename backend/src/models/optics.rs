use serde::{Deserialize, Serialize};

/// Icon class used by the presentation layer to draw the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconClass {
    Reflector,
    Camera,
    Binocular,
}

/// Canonical description of an imaging device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpticsProfile {
    pub canonical_name: String,
    pub field_of_view_descriptor: String,
    pub icon_class: IconClass,
    /// Device-specific exposure constraint passed to the reasoning service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exposure_rule: Option<String>,
}
