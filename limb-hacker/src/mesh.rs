use glam::{Vec2, Vec3};
use itertools::Itertools;

use crate::{LimbHackerError, LimbHackerResult};

/// Up to four bones influencing a single vertex. Channels with a weight of zero are unused.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoneWeight {
    /// Index into the skin's bone table, one per channel
    pub indices: [u32; 4],
    /// Blend weight, one per channel
    pub weights: [f32; 4],
}

impl BoneWeight {
    /// A vertex entirely bound to one bone
    pub fn single(index: u32) -> Self {
        Self {
            indices: [index, 0, 0, 0],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }

    /// A vertex blended between bones
    pub fn new(indices: [u32; 4], weights: [f32; 4]) -> Self {
        Self { indices, weights }
    }

    /// The bone with the largest weight. Ties go to the lowest channel.
    pub fn dominant_bone(&self) -> Option<usize> {
        let mut dominant: Option<(usize, f32)> = None;
        for (index, weight) in self.influences() {
            match dominant {
                Some((_, best)) if best >= weight => {}
                _ => dominant = Some((index, weight)),
            }
        }
        dominant.map(|(index, _)| index)
    }

    /// Every `(bone index, weight)` with a weight above zero, in channel order
    pub fn influences(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices
            .iter()
            .zip(self.weights.iter())
            .filter(|(_, w)| **w > 0.0)
            .map(|(i, w)| (*i as usize, *w))
    }
}

/// CPU side geometry of a skinned mesh.
///
/// `indices` holds the regular triangles; `infill_indices` holds the triangles generated to cap cuts so
/// they can be drawn with their own material.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkinnedMeshData {
    /// Position in model space
    pub positions: Vec<Vec3>,
    /// Normal in model space
    pub normals: Vec<Vec3>,
    /// First set of texture coordinates
    pub uvs: Vec<Vec2>,
    /// Skinning data, one per vertex
    pub bone_weights: Vec<BoneWeight>,
    /// Triangle list
    pub indices: Vec<u32>,
    /// Triangle list of the caps closing any cuts
    pub infill_indices: Vec<u32>,
}

impl SkinnedMeshData {
    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of (non infill) triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// The (non infill) triangles
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// The infill triangles
    pub fn infill_triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.infill_indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Every bone index referenced with a non zero weight in any channel, in the order first seen
    pub fn used_bone_indexes(&self) -> Vec<usize> {
        self.bone_weights
            .iter()
            .flat_map(|w| w.influences().map(|(index, _)| index))
            .unique()
            .collect()
    }

    /// Check that every attribute has one entry per vertex and every index is in range
    pub fn validate(&self) -> LimbHackerResult<()> {
        let vertex_count = self.vertex_count();
        if self.normals.len() != vertex_count
            || self.uvs.len() != vertex_count
            || self.bone_weights.len() != vertex_count
        {
            return Err(LimbHackerError::InvalidMesh(format!(
                "{} positions, {} normals, {} uvs, {} bone weights",
                vertex_count,
                self.normals.len(),
                self.uvs.len(),
                self.bone_weights.len()
            )));
        }

        for (name, list) in [
            ("indices", &self.indices),
            ("infill indices", &self.infill_indices),
        ] {
            if list.len() % 3 != 0 {
                return Err(LimbHackerError::InvalidMesh(format!(
                    "{} {name} is not a triangle list",
                    list.len()
                )));
            }
            if let Some(index) = list.iter().find(|i| **i as usize >= vertex_count) {
                return Err(LimbHackerError::InvalidMesh(format!(
                    "index {index} is out of range for {vertex_count} vertices"
                )));
            }
        }

        Ok(())
    }
}
