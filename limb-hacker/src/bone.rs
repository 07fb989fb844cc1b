use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Stable identity of a bone, derived from its name.
///
/// Two bones with the same name compare equal no matter which rig instance they came from, which is
/// what lets selections survive re-instantiation and archetype switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoneHash(pub i32);

impl BoneHash {
    /// Hash a bone name
    pub fn of(name: &str) -> Self {
        hash_name(name)
    }
}

/// 32 bit FNV-1a over the UTF-8 bytes of `name`. Stable across runs and platforms.
pub fn hash_name(name: &str) -> BoneHash {
    let mut hash: u32 = 0x811c_9dc5; // FNV offset basis
    for &byte in name.as_bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193); // FNV prime
    }
    BoneHash(hash as i32)
}

/// A named bone as described by a rig's mesh data.
///
/// Equality and hashing only consider `hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoneIdentity {
    /// Name of the bone
    pub name: String,
    /// Hash of `name`
    pub hash: BoneHash,
    /// Hash of the parent bone's name, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_hash: Option<BoneHash>,
}

impl BoneIdentity {
    /// Create a bone identity with no parent information
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            hash: hash_name(name),
            parent_hash: None,
        }
    }

    /// Create a bone identity that knows its parent
    pub fn with_parent(name: &str, parent: &str) -> Self {
        Self {
            parent_hash: Some(hash_name(parent)),
            ..Self::new(name)
        }
    }
}

impl PartialEq for BoneIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for BoneIdentity {}

impl Hash for BoneIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

/// Is a bone with this hash in the list?
pub fn contains_bone(bones: &[BoneIdentity], hash: BoneHash) -> bool {
    bones.iter().any(|b| b.hash == hash)
}
