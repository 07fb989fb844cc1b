use std::collections::HashMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    archetype::{ArchetypeId, Recipe, RigArchetype},
    bone::{contains_bone, BoneHash, BoneIdentity},
    resources::RigContext,
};

/// Every bone referenced by the meshes of `recipe`, once each, in the order they are first found.
///
/// Slots that haven't resolved their asset, mesh data or bone list yet are skipped. A bone whose name
/// contains any of the (non empty) `filters` is left out. Matching is case sensitive.
pub fn available_bones(recipe: &Recipe, filters: &[&str]) -> Vec<BoneIdentity> {
    let mut bones: Vec<BoneIdentity> = Vec::new();
    for slot in recipe.all_slots() {
        let Some(slot_bones) = slot.bones() else {
            debug!("[LIMB_HACKER] Slot {} has no bones yet, skipping", slot.name);
            continue;
        };

        for bone in slot_bones {
            if contains_bone(&bones, bone.hash) || is_filtered(&bone.name, filters) {
                continue;
            }
            bones.push(bone.clone());
        }
    }
    bones
}

fn is_filtered(name: &str, filters: &[&str]) -> bool {
    filters
        .iter()
        .any(|filter| !filter.is_empty() && name.contains(filter))
}

/// What [`SeverableSelector::check_for_archetype_change`] found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchetypeCheck {
    /// The rig is still the archetype we last saw
    Unchanged,
    /// The rig has switched archetype but hasn't finished building; try again next frame
    Deferred,
    /// The rig has switched archetype and the selection has been rebuilt for it
    Changed,
}

/// Keeps track of which bones of a character are severable.
///
/// `available` is every bone the character's archetype offers, `selected` is the subset a designer has
/// picked. Selections are remembered per archetype, so switching a character from one archetype to
/// another and back restores what was picked for the first one.
///
/// Only `last_archetype`, `available`, `selected` and the filter toggle are saved. Remembered
/// selections for other archetypes only live as long as the selector does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverableSelector {
    last_archetype: Option<ArchetypeId>,
    available: Vec<BoneIdentity>,
    selected: Vec<BoneIdentity>,
    apply_standard_filters: bool,
    #[serde(skip)]
    cache: HashMap<ArchetypeId, Vec<BoneIdentity>>,
}

impl Default for SeverableSelector {
    fn default() -> Self {
        Self {
            last_archetype: None,
            available: Vec::new(),
            selected: Vec::new(),
            apply_standard_filters: true,
            cache: HashMap::new(),
        }
    }
}

impl SeverableSelector {
    /// Bones that can be selected
    pub fn available(&self) -> &[BoneIdentity] {
        &self.available
    }

    /// Bones that have been selected
    pub fn selected(&self) -> &[BoneIdentity] {
        &self.selected
    }

    /// The archetype `available` was last built for
    pub fn last_archetype(&self) -> Option<ArchetypeId> {
        self.last_archetype
    }

    /// Are the standard bone filters being applied?
    pub fn applies_standard_filters(&self) -> bool {
        self.apply_standard_filters
    }

    /// Is the bone with this hash selected?
    pub fn is_selected(&self, hash: BoneHash) -> bool {
        contains_bone(&self.selected, hash)
    }

    /// Set the selector up for `rig`.
    ///
    /// The first call adopts the rig's archetype. Later calls behave like
    /// [`SeverableSelector::check_for_archetype_change`].
    pub fn init(&mut self, rig: &dyn RigContext, filters: &[&str]) -> ArchetypeCheck {
        if self.last_archetype.is_some() {
            return self.check_for_archetype_change(rig, filters);
        }

        let archetype = rig.active_archetype();
        self.last_archetype = Some(archetype.id);
        self.refresh(archetype, filters);
        ArchetypeCheck::Changed
    }

    /// Rebuild `available` from `archetype` and rebuild the selection to match.
    ///
    /// The selection becomes whatever was remembered for `archetype`, or the current selection if
    /// nothing was, keeping only bones that are still available.
    pub fn refresh(&mut self, archetype: &RigArchetype, filters: &[&str]) {
        let filters: &[&str] = if self.apply_standard_filters {
            filters
        } else {
            &[]
        };
        self.available = available_bones(&archetype.base_recipe, filters);

        let selection = self
            .cache
            .get(&archetype.id)
            .unwrap_or(&self.selected)
            .clone();
        self.selected = selection
            .into_iter()
            .filter(|bone| contains_bone(&self.available, bone.hash))
            .collect();
    }

    /// Remember the selection for `old`, then switch to `new`.
    pub fn on_archetype_changed(
        &mut self,
        old: ArchetypeId,
        new: &RigArchetype,
        filters: &[&str],
    ) {
        self.cache.insert(old, self.selected.clone());
        self.refresh(new, filters);
        self.last_archetype = Some(new.id);
    }

    /// Has `rig` switched archetype since we last looked? If so, and the rig has finished building,
    /// switch over to the new archetype.
    pub fn check_for_archetype_change(
        &mut self,
        rig: &dyn RigContext,
        filters: &[&str],
    ) -> ArchetypeCheck {
        let Some(last) = self.last_archetype else {
            return ArchetypeCheck::Unchanged;
        };
        let active = rig.active_archetype();
        if last == active.id {
            return ArchetypeCheck::Unchanged;
        }

        if rig.is_dirty() || rig.resolved_archetype() != Some(active.id) {
            debug!(
                "[LIMB_HACKER] Archetype changed to {} but the rig isn't ready, waiting",
                active.name
            );
            return ArchetypeCheck::Deferred;
        }

        info!(
            "[LIMB_HACKER] Archetype changed from {:?} to {}",
            last, active.name
        );
        self.on_archetype_changed(last, active, filters);
        ArchetypeCheck::Changed
    }

    /// Select an available bone. Returns false if the bone isn't available or is already selected.
    pub fn select(&mut self, bone: BoneIdentity) -> bool {
        if !contains_bone(&self.available, bone.hash) || self.is_selected(bone.hash) {
            return false;
        }
        self.selected.push(bone);
        true
    }

    /// Deselect the bone with this hash. Returns false if it wasn't selected.
    pub fn deselect(&mut self, hash: BoneHash) -> bool {
        let before = self.selected.len();
        self.selected.retain(|b| b.hash != hash);
        self.selected.len() != before
    }

    /// Select every available bone, in the order they are available
    pub fn select_all(&mut self) {
        self.selected = self.available.clone();
    }

    /// Deselect everything
    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Switch the standard filters on or off and rebuild for `archetype`
    pub fn set_apply_standard_filters(
        &mut self,
        apply: bool,
        archetype: &RigArchetype,
        filters: &[&str],
    ) {
        self.apply_standard_filters = apply;
        self.refresh(archetype, filters);
    }
}
