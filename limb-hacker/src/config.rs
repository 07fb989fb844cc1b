use serde::{Deserialize, Serialize};

use crate::{DEFAULT_RAGDOLL_LAYER, SKELETON_ROOT_NAME, STANDARD_BONE_FILTERS};

/// Settings shared by every hackable character driven by a [`crate::LimbHacker`].
///
/// Build one with the setters, or deserialize it from whatever your game keeps its settings in:
///
/// ```
/// use limb_hacker::config::HackerConfig;
///
/// let mut config = HackerConfig::new();
/// config.ragdoll_layer(9).renderer_name(Some("UMARenderer"));
/// assert_eq!(config.ragdoll_layer, 9);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HackerConfig {
    /// Physics layer fragments are moved to, unless their source carries a physics avatar of its own
    pub ragdoll_layer: u32,
    /// Substrings that exclude a bone from the severable list while standard filters are applied
    pub standard_bone_filters: Vec<String>,
    /// Name of the node the skeleton hangs off
    pub skeleton_root_name: String,
    /// Only treat skinned renderers with this name as the character's body
    pub renderer_name: Option<String>,
}

impl Default for HackerConfig {
    fn default() -> Self {
        Self {
            ragdoll_layer: DEFAULT_RAGDOLL_LAYER,
            standard_bone_filters: STANDARD_BONE_FILTERS.iter().map(|s| s.to_string()).collect(),
            skeleton_root_name: SKELETON_ROOT_NAME.to_string(),
            renderer_name: None,
        }
    }
}

impl HackerConfig {
    /// Create a `HackerConfig` with the default settings
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the fallback ragdoll layer
    pub fn ragdoll_layer(&mut self, layer: u32) -> &mut Self {
        self.ragdoll_layer = layer;
        self
    }

    /// Replace the standard bone filters
    pub fn standard_bone_filters<S: Into<String>>(
        &mut self,
        filters: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.standard_bone_filters = filters.into_iter().map(Into::into).collect();
        self
    }

    /// Set the name of the skeleton root node
    pub fn skeleton_root_name(&mut self, name: &str) -> &mut Self {
        self.skeleton_root_name = name.to_string();
        self
    }

    /// Restrict renderer lookup to entities with this name
    pub fn renderer_name(&mut self, name: Option<&str>) -> &mut Self {
        self.renderer_name = name.map(|s| s.to_string());
        self
    }

    /// The filters as string slices, ready for [`crate::systems::severable_selector::available_bones`]
    pub fn filters(&self) -> Vec<&str> {
        self.standard_bone_filters
            .iter()
            .map(String::as_str)
            .collect()
    }
}
