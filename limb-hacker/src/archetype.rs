use serde::{Deserialize, Serialize};

use crate::bone::BoneIdentity;

/// Stable identifier of a [`RigArchetype`]. Display names may collide; ids do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArchetypeId(pub u32);

/// A character template (a "race"): the base recipe of mesh slots that make up the character.
#[derive(Debug, Clone, PartialEq)]
pub struct RigArchetype {
    /// Stable identifier, used as the key for cached selections
    pub id: ArchetypeId,
    /// A helpful name
    pub name: String,
    /// The slots the character is built from
    pub base_recipe: Recipe,
}

impl RigArchetype {
    /// Create a new archetype
    pub fn new(id: ArchetypeId, name: &str, base_recipe: Recipe) -> Self {
        Self {
            id,
            name: name.to_string(),
            base_recipe,
        }
    }
}

/// The slots of a character recipe. Slots may be empty while assets are still streaming in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recipe {
    /// Slots, in recipe order
    pub slots: Vec<Option<SlotData>>,
}

impl Recipe {
    /// Create a recipe from a list of slots
    pub fn new(slots: Vec<Option<SlotData>>) -> Self {
        Self { slots }
    }

    /// Every slot that is present
    pub fn all_slots(&self) -> impl Iterator<Item = &SlotData> {
        self.slots.iter().flatten()
    }
}

/// A single slot of a recipe, eg. the body, the eyes, a helmet.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotData {
    /// A helpful name
    pub name: String,
    /// The slot's asset, if it has been resolved
    pub asset: Option<SlotAsset>,
}

/// The asset behind a slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotAsset {
    /// Mesh data, absent for slots that carry no geometry
    pub mesh_data: Option<SlotMeshData>,
}

/// The part of a slot's mesh data we care about: the bones it is skinned to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotMeshData {
    /// Bones referenced by the mesh, absent when the mesh has no skin
    pub bones: Option<Vec<BoneIdentity>>,
}

impl SlotData {
    /// Create a slot whose mesh references `bones`
    pub fn with_bones(name: &str, bones: Vec<BoneIdentity>) -> Self {
        Self {
            name: name.to_string(),
            asset: Some(SlotAsset {
                mesh_data: Some(SlotMeshData { bones: Some(bones) }),
            }),
        }
    }

    /// The bones referenced by this slot's mesh, if the asset, mesh data and bone list are all present
    pub fn bones(&self) -> Option<&[BoneIdentity]> {
        self.asset
            .as_ref()?
            .mesh_data
            .as_ref()?
            .bones
            .as_deref()
    }
}
