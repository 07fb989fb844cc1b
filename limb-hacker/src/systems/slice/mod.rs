//! Cutting a skinned mesh in two (or more) at a bone.
//!
//! Every vertex follows its dominant bone: if a cut bone sits at or above that bone in the
//! [`BoneTree`], the vertex belongs to that cut's severed piece, otherwise it stays with the body.
//! Every triangle then goes wherever most of its vertices went. The holes this leaves along the cut
//! can be capped with [`InfillMode`] geometry.

mod bone_tree;
mod infill;

use std::collections::HashMap;

use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

pub use bone_tree::BoneTree;

use crate::{mesh::SkinnedMeshData, LimbHackerError, LimbHackerResult};

/// How to close the holes a cut leaves in a mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfillMode {
    /// A fan around the middle of each hole. Cheap, but stretches the texture.
    Sloppy,
    /// Triangulate each hole and give the cap its own texture coordinates
    Meticulous,
}

/// One piece of a sliced mesh
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentMesh {
    /// The piece's geometry
    pub mesh: SkinnedMeshData,
    /// Every bone the piece's vertices are weighted to, in the order first seen
    pub used_bone_indexes: Vec<usize>,
    /// Index in the source mesh of each of the piece's vertices. Cap vertices come after these.
    pub source_vertices: Vec<u32>,
    /// Index in the source mesh of each of the piece's triangles
    pub source_triangles: Vec<usize>,
}

/// A piece cut off at a bone
#[derive(Debug, Clone, PartialEq)]
pub struct SeveredMesh {
    /// The skin bone index the piece was cut at
    pub cut_bone: usize,
    /// The piece
    pub fragment: FragmentMesh,
}

/// The result of slicing a mesh
#[derive(Debug, Clone, PartialEq)]
pub struct SliceResult {
    /// What's left of the body
    pub kept: FragmentMesh,
    /// A piece for every cut that claimed any geometry, in the order the cuts were asked for
    pub severed: Vec<SeveredMesh>,
}

impl SliceResult {
    /// The piece cut at `cut_bone`, if there is one
    pub fn severed_at(&self, cut_bone: usize) -> Option<&FragmentMesh> {
        self.severed
            .iter()
            .find(|s| s.cut_bone == cut_bone)
            .map(|s| &s.fragment)
    }
}

const KEPT: usize = 0;

/// Slice `mesh` at a single bone
pub fn slice(
    mesh: &SkinnedMeshData,
    bone_tree: &BoneTree,
    cut_bone: usize,
    infill: Option<InfillMode>,
) -> LimbHackerResult<SliceResult> {
    slice_at(mesh, bone_tree, &[cut_bone], infill)
}

/// Slice `mesh` at every bone in `cut_bones`. A vertex below several cuts goes to the nearest one.
///
/// The output only depends on the input: slicing the same mesh the same way twice gives the same result.
pub fn slice_at(
    mesh: &SkinnedMeshData,
    bone_tree: &BoneTree,
    cut_bones: &[usize],
    infill: Option<InfillMode>,
) -> LimbHackerResult<SliceResult> {
    mesh.validate()?;
    if let Some(index) = cut_bones.iter().copied().find(|b| *b >= bone_tree.len()) {
        return Err(LimbHackerError::InvalidBone {
            index,
            len: bone_tree.len(),
        });
    }

    // Side 0 is the body, side n + 1 is the piece cut at cut_bones[n]
    let vertex_sides: Vec<usize> = mesh
        .bone_weights
        .iter()
        .map(|weight| {
            weight
                .dominant_bone()
                .and_then(|bone| bone_tree.nearest_cut(bone, cut_bones))
                .map_or(KEPT, |cut| cut + 1)
        })
        .collect();
    let sides = Sides {
        triangles: mesh
            .triangles()
            .map(|t| triangle_side(&vertex_sides, t))
            .collect(),
        infill_triangles: mesh
            .infill_triangles()
            .map(|t| triangle_side(&vertex_sides, t))
            .collect(),
        vertices: vertex_sides,
    };

    let welded = weld(&mesh.positions);
    let edges = EdgeUsage::count(mesh, &welded, &sides.triangles, cut_bones.len() + 1);
    let builder = FragmentBuilder {
        source: mesh,
        sides: &sides,
        welded: &welded,
        edges: &edges,
        infill,
    };

    let kept = builder.build(KEPT);
    let severed = cut_bones
        .iter()
        .enumerate()
        .filter_map(|(cut, cut_bone)| {
            let side = cut + 1;
            if !sides.vertices.contains(&side) && !sides.triangles.contains(&side) {
                debug!("[LIMB_HACKER] Nothing to cut at bone {cut_bone}");
                return None;
            }
            Some(SeveredMesh {
                cut_bone: *cut_bone,
                fragment: builder.build(side),
            })
        })
        .collect();

    Ok(SliceResult { kept, severed })
}

struct Sides {
    vertices: Vec<usize>,
    triangles: Vec<usize>,
    infill_triangles: Vec<usize>,
}

/// Majority wins. If all three differ the lowest side does.
fn triangle_side(vertex_sides: &[usize], [a, b, c]: [u32; 3]) -> usize {
    let (a, b, c) = (
        vertex_sides[a as usize],
        vertex_sides[b as usize],
        vertex_sides[c as usize],
    );
    if a == b || a == c {
        a
    } else if b == c {
        b
    } else {
        a.min(b).min(c)
    }
}

/// For each vertex, the first vertex with exactly the same position.
fn weld(positions: &[Vec3]) -> Vec<u32> {
    let mut first_seen: HashMap<[u32; 3], u32> = HashMap::new();
    positions
        .iter()
        .enumerate()
        .map(|(i, p)| *first_seen.entry(position_key(*p)).or_insert(i as u32))
        .collect()
}

fn position_key(p: Vec3) -> [u32; 3] {
    // Adding zero folds -0.0 into 0.0
    [
        (p.x + 0.0).to_bits(),
        (p.y + 0.0).to_bits(),
        (p.z + 0.0).to_bits(),
    ]
}

fn triangle_edges([a, b, c]: [u32; 3]) -> [[u32; 2]; 3] {
    [[a, b], [b, c], [c, a]]
}

/// How many triangles on each side use each (welded, undirected) edge
struct EdgeUsage {
    counts: HashMap<(u32, u32), Vec<u32>>,
}

impl EdgeUsage {
    fn count(
        mesh: &SkinnedMeshData,
        welded: &[u32],
        triangle_sides: &[usize],
        side_count: usize,
    ) -> Self {
        let mut counts: HashMap<(u32, u32), Vec<u32>> = HashMap::new();
        for (triangle, side) in mesh.triangles().zip(triangle_sides) {
            for edge in triangle_edges(triangle) {
                if let Some(key) = edge_key(welded, edge) {
                    counts.entry(key).or_insert_with(|| vec![0; side_count])[*side] += 1;
                }
            }
        }
        Self { counts }
    }

    /// Is `edge` on the border between `side` and some other side?
    fn is_cut(&self, welded: &[u32], edge: [u32; 2], side: usize) -> bool {
        let Some(counts) = edge_key(welded, edge).and_then(|key| self.counts.get(&key)) else {
            return false;
        };
        counts[side] == 1
            && counts
                .iter()
                .enumerate()
                .any(|(other, count)| other != side && *count > 0)
    }
}

fn edge_key(welded: &[u32], [a, b]: [u32; 2]) -> Option<(u32, u32)> {
    let (a, b) = (welded[a as usize], welded[b as usize]);
    match a.cmp(&b) {
        std::cmp::Ordering::Less => Some((a, b)),
        std::cmp::Ordering::Greater => Some((b, a)),
        std::cmp::Ordering::Equal => None,
    }
}

struct FragmentBuilder<'a> {
    source: &'a SkinnedMeshData,
    sides: &'a Sides,
    welded: &'a [u32],
    edges: &'a EdgeUsage,
    infill: Option<InfillMode>,
}

impl<'a> FragmentBuilder<'a> {
    fn build(&self, side: usize) -> FragmentMesh {
        let source = self.source;
        let on_side = |sides: &[usize]| -> Vec<usize> {
            sides
                .iter()
                .enumerate()
                .filter(|(_, s)| **s == side)
                .map(|(i, _)| i)
                .collect()
        };
        let source_triangles = on_side(&self.sides.triangles);
        let source_infill = on_side(&self.sides.infill_triangles);

        // Vertices the side owns, plus any its triangles borrow from another side
        let mut included: Vec<bool> = self.sides.vertices.iter().map(|s| *s == side).collect();
        for t in &source_triangles {
            for i in &source.indices[t * 3..t * 3 + 3] {
                included[*i as usize] = true;
            }
        }
        for t in &source_infill {
            for i in &source.infill_indices[t * 3..t * 3 + 3] {
                included[*i as usize] = true;
            }
        }
        let source_vertices: Vec<u32> = included
            .iter()
            .enumerate()
            .filter(|(_, included)| **included)
            .map(|(v, _)| v as u32)
            .collect();

        let mut remap = vec![0u32; source.vertex_count()];
        for (new, old) in source_vertices.iter().enumerate() {
            remap[*old as usize] = new as u32;
        }
        let remapped = |indices: &[u32], triangles: &[usize]| -> Vec<u32> {
            triangles
                .iter()
                .flat_map(|t| &indices[t * 3..t * 3 + 3])
                .map(|i| remap[*i as usize])
                .collect()
        };

        let mut mesh = SkinnedMeshData {
            positions: copy(&source.positions, &source_vertices),
            normals: copy(&source.normals, &source_vertices),
            uvs: copy(&source.uvs, &source_vertices),
            bone_weights: copy(&source.bone_weights, &source_vertices),
            indices: remapped(&source.indices, &source_triangles),
            infill_indices: remapped(&source.infill_indices, &source_infill),
        };

        if let Some(mode) = self.infill {
            let cut_edges: Vec<[u32; 2]> = source_triangles
                .iter()
                .flat_map(|t| {
                    triangle_edges([
                        source.indices[t * 3],
                        source.indices[t * 3 + 1],
                        source.indices[t * 3 + 2],
                    ])
                })
                .filter(|edge| self.edges.is_cut(self.welded, *edge, side))
                .collect();
            infill::append_caps(source, &cut_edges, self.welded, mode, &mut mesh);
        }

        let used_bone_indexes = mesh.used_bone_indexes();
        FragmentMesh {
            mesh,
            used_bone_indexes,
            source_vertices,
            source_triangles,
        }
    }
}

fn copy<T: Copy>(attribute: &[T], vertices: &[u32]) -> Vec<T> {
    vertices.iter().map(|v| attribute[*v as usize]).collect()
}
