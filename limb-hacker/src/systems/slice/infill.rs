use std::collections::HashMap;

use glam::{Vec2, Vec3};
use log::debug;

use super::InfillMode;
use crate::mesh::{BoneWeight, SkinnedMeshData};

const EPSILON: f32 = 1e-6;

/// Close every hole outlined by `cut_edges`, appending the caps to `fragment`.
///
/// `cut_edges` are vertex indices into `source`, directed the way they appear in the fragment's
/// triangles. Caps are wound the other way so they face out of the fragment.
pub(super) fn append_caps(
    source: &SkinnedMeshData,
    cut_edges: &[[u32; 2]],
    welded: &[u32],
    mode: InfillMode,
    fragment: &mut SkinnedMeshData,
) {
    for outline in find_loops(cut_edges, welded) {
        let positions: Vec<Vec3> = outline
            .iter()
            .map(|v| source.positions[*v as usize])
            .collect();
        let normal = match newell_normal(&positions).try_normalize() {
            Some(normal) => normal,
            None => {
                debug!("[LIMB_HACKER] Skipping degenerate cap");
                continue;
            }
        };

        let capped = match mode {
            InfillMode::Sloppy => false,
            InfillMode::Meticulous => clip(source, &outline, &positions, normal, fragment),
        };
        if !capped {
            fan(source, &outline, &positions, normal, fragment);
        }
    }
}

/// Chain the reversed cut edges into closed loops. Chains that don't close, and loops of fewer than three
/// vertices, are dropped.
pub(super) fn find_loops(cut_edges: &[[u32; 2]], welded: &[u32]) -> Vec<Vec<u32>> {
    let reversed: Vec<[u32; 2]> = cut_edges.iter().map(|[a, b]| [*b, *a]).collect();
    let mut by_start: HashMap<u32, Vec<usize>> = HashMap::new();
    for (i, [start, _]) in reversed.iter().enumerate() {
        by_start.entry(welded[*start as usize]).or_default().push(i);
    }

    let mut used = vec![false; reversed.len()];
    let mut loops = Vec::new();
    for first in 0..reversed.len() {
        if used[first] {
            continue;
        }
        used[first] = true;

        let [start, mut current] = reversed[first];
        let start = welded[start as usize];
        let mut outline = vec![reversed[first][0]];
        let closed = loop {
            if welded[current as usize] == start {
                break true;
            }
            outline.push(current);
            let next = by_start
                .get(&welded[current as usize])
                .and_then(|edges| edges.iter().copied().find(|e| !used[*e]));
            match next {
                Some(edge) => {
                    used[edge] = true;
                    current = reversed[edge][1];
                }
                None => break false,
            }
        };

        if closed && outline.len() >= 3 {
            loops.push(outline);
        } else {
            debug!(
                "[LIMB_HACKER] Dropping cut outline with {} vertices (closed: {closed})",
                outline.len()
            );
        }
    }
    loops
}

fn newell_normal(points: &[Vec3]) -> Vec3 {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .fold(Vec3::ZERO, |normal, (a, b)| {
            normal
                + Vec3::new(
                    (a.y - b.y) * (a.z + b.z),
                    (a.z - b.z) * (a.x + b.x),
                    (a.x - b.x) * (a.y + b.y),
                )
        })
}

fn push_vertex(
    fragment: &mut SkinnedMeshData,
    position: Vec3,
    normal: Vec3,
    uv: Vec2,
    bone_weight: BoneWeight,
) -> u32 {
    let index = fragment.positions.len() as u32;
    fragment.positions.push(position);
    fragment.normals.push(normal);
    fragment.uvs.push(uv);
    fragment.bone_weights.push(bone_weight);
    index
}

/// A centre vertex joined to every vertex of the outline. The outline keeps its texture coordinates.
fn fan(
    source: &SkinnedMeshData,
    outline: &[u32],
    positions: &[Vec3],
    normal: Vec3,
    fragment: &mut SkinnedMeshData,
) {
    let count = outline.len() as f32;
    let centre = positions.iter().copied().sum::<Vec3>() / count;
    let centre_uv = outline
        .iter()
        .map(|v| source.uvs[*v as usize])
        .sum::<Vec2>()
        / count;
    // The centre is skinned like the outline vertex closest to it
    let nearest = outline
        .iter()
        .zip(positions)
        .min_by(|(_, a), (_, b)| {
            a.distance_squared(centre)
                .total_cmp(&b.distance_squared(centre))
        })
        .map(|(v, _)| *v as usize)
        .unwrap_or_default();

    let centre_index = push_vertex(
        fragment,
        centre,
        normal,
        centre_uv,
        source.bone_weights[nearest],
    );
    let rim: Vec<u32> = outline
        .iter()
        .map(|v| {
            let v = *v as usize;
            push_vertex(
                fragment,
                source.positions[v],
                normal,
                source.uvs[v],
                source.bone_weights[v],
            )
        })
        .collect();

    for (i, a) in rim.iter().enumerate() {
        let b = rim[(i + 1) % rim.len()];
        fragment.infill_indices.extend([centre_index, *a, b]);
    }
}

/// Project the outline onto its plane and ear clip it. Texture coordinates are the projected positions
/// scaled into the unit square. Returns false, adding nothing, if the outline can't be clipped.
fn clip(
    source: &SkinnedMeshData,
    outline: &[u32],
    positions: &[Vec3],
    normal: Vec3,
    fragment: &mut SkinnedMeshData,
) -> bool {
    let u = normal.any_orthonormal_vector();
    let v = normal.cross(u);
    let projected: Vec<Vec2> = positions
        .iter()
        .map(|p| Vec2::new(p.dot(u), p.dot(v)))
        .collect();

    let triangles = match ear_clip(&projected) {
        Some(triangles) => triangles,
        None => {
            debug!(
                "[LIMB_HACKER] Couldn't clip a cap with {} vertices, falling back to a fan",
                outline.len()
            );
            return false;
        }
    };

    let min = projected
        .iter()
        .fold(Vec2::splat(f32::MAX), |min, p| min.min(*p));
    let max = projected
        .iter()
        .fold(Vec2::splat(f32::MIN), |max, p| max.max(*p));
    let extent = (max - min).max(Vec2::splat(EPSILON));

    let base = fragment.positions.len() as u32;
    for (vertex, point) in outline.iter().zip(&projected) {
        push_vertex(
            fragment,
            source.positions[*vertex as usize],
            normal,
            (*point - min) / extent,
            source.bone_weights[*vertex as usize],
        );
    }
    for triangle in triangles {
        fragment
            .infill_indices
            .extend(triangle.map(|corner| base + corner as u32));
    }
    true
}

/// Triangulate a simple, counter clockwise polygon. Collinear vertices are dropped rather than turned
/// into slivers.
fn ear_clip(points: &[Vec2]) -> Option<Vec<[usize; 3]>> {
    if points.len() < 3 || signed_area(points) <= EPSILON {
        return None;
    }

    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut triangles = Vec::with_capacity(points.len() - 2);
    while remaining.len() > 3 {
        let count = remaining.len();
        let corner = |i: usize| {
            (
                remaining[(i + count - 1) % count],
                remaining[i],
                remaining[(i + 1) % count],
            )
        };

        let ear = (0..count).find(|i| {
            let (a, b, c) = corner(*i);
            turn(points[a], points[b], points[c]) > EPSILON
                && !remaining.iter().any(|o| {
                    *o != a && *o != b && *o != c && contains(points[a], points[b], points[c], points[*o])
                })
        });
        if let Some(i) = ear {
            let (a, b, c) = corner(i);
            triangles.push([a, b, c]);
            remaining.remove(i);
            continue;
        }

        // No ears left: drop a collinear vertex, or give up
        let collinear = (0..count)
            .map(corner)
            .find(|(a, b, c)| turn(points[*a], points[*b], points[*c]).abs() <= EPSILON)
            .map(|(_, b, _)| b)?;
        remaining.retain(|v| *v != collinear);
    }

    if turn(
        points[remaining[0]],
        points[remaining[1]],
        points[remaining[2]],
    ) > EPSILON
    {
        triangles.push([remaining[0], remaining[1], remaining[2]]);
    }
    Some(triangles)
}

fn signed_area(points: &[Vec2]) -> f32 {
    points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.perp_dot(*b))
        .sum::<f32>()
        * 0.5
}

/// Positive when `a -> b -> c` turns left
fn turn(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    (b - a).perp_dot(c - b)
}

/// Is `p` inside or on the edge of the counter clockwise triangle `abc`?
fn contains(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> bool {
    (b - a).perp_dot(p - a) >= 0. && (c - b).perp_dot(p - b) >= 0. && (a - c).perp_dot(p - c) >= 0.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    pub fn test_find_loops() {
        // A square's edges as they'd appear in the fragment's triangles, plus a dangling edge. Vertex 4
        // sits on top of vertex 0.
        let welded = [0, 1, 2, 3, 0, 5, 6];
        let edges = [[1, 0], [2, 1], [3, 2], [4, 3], [5, 6]];
        let loops = find_loops(&edges, &welded);
        assert_eq!(loops, vec![vec![0, 1, 2, 3]]);

        // Two edges can't make a loop
        assert!(find_loops(&[[0, 1], [1, 0]], &welded).is_empty());
    }

    #[test]
    pub fn test_ear_clip() {
        let square = [
            Vec2::new(0., 0.),
            Vec2::new(1., 0.),
            Vec2::new(1., 1.),
            Vec2::new(0., 1.),
        ];
        assert_eq!(ear_clip(&square).map(|t| t.len()), Some(2));

        // Clockwise or degenerate outlines are refused
        let mut clockwise = square;
        clockwise.reverse();
        assert!(ear_clip(&clockwise).is_none());
        assert!(ear_clip(&[Vec2::ZERO, Vec2::X, Vec2::X * 2.]).is_none());

        // An L shape has a reflex corner
        let l_shape = [
            Vec2::new(0., 0.),
            Vec2::new(2., 0.),
            Vec2::new(2., 1.),
            Vec2::new(1., 1.),
            Vec2::new(1., 2.),
            Vec2::new(0., 2.),
        ];
        let triangles = ear_clip(&l_shape).unwrap();
        assert_eq!(triangles.len(), 4);
        assert!((covered_area(&l_shape, &triangles) - 3.).abs() < 1e-5);

        // A vertex in the middle of an edge doesn't leave a sliver behind
        let with_midpoint = [
            Vec2::new(0., 0.),
            Vec2::new(0.5, 0.),
            Vec2::new(1., 0.),
            Vec2::new(1., 1.),
            Vec2::new(0., 1.),
        ];
        let triangles = ear_clip(&with_midpoint).unwrap();
        assert!((covered_area(&with_midpoint, &triangles) - 1.).abs() < 1e-5);
        for [a, b, c] in triangles {
            assert!(turn(with_midpoint[a], with_midpoint[b], with_midpoint[c]) > 0.);
        }
    }

    #[test]
    pub fn test_meticulous_cap_falls_back_to_a_fan() {
        // Too small for the ear clipper to trust, but still has a plane
        let side = 1e-4;
        let positions = vec![
            Vec3::new(0., 0., 0.),
            Vec3::new(side, 0., 0.),
            Vec3::new(side, 0., side),
            Vec3::new(0., 0., side),
        ];
        let source = SkinnedMeshData {
            normals: vec![Vec3::Y; 4],
            uvs: (0..4).map(|i| Vec2::splat(5. + i as f32)).collect(),
            bone_weights: vec![BoneWeight::single(0); 4],
            positions,
            ..Default::default()
        };
        let edges = [[1, 0], [2, 1], [3, 2], [0, 3]];
        let welded = [0, 1, 2, 3];

        let mut fragment = SkinnedMeshData::default();
        append_caps(
            &source,
            &edges,
            &welded,
            InfillMode::Meticulous,
            &mut fragment,
        );

        // A centre plus the four rim vertices, one triangle per edge
        assert_eq!(fragment.vertex_count(), 5);
        assert_eq!(fragment.infill_indices.len(), 12);
        for triangle in fragment.infill_indices.chunks(3) {
            assert_eq!(triangle[0], 0);
        }
        // The rim keeps the source's texture coordinates instead of the clipped cap's unit square
        assert_eq!(&fragment.uvs[1..], &source.uvs[..]);
        assert_eq!(fragment.uvs[0], Vec2::splat(6.5));
        assert!(fragment.validate().is_ok());
    }

    fn covered_area(points: &[Vec2], triangles: &[[usize; 3]]) -> f32 {
        triangles
            .iter()
            .map(|[a, b, c]| signed_area(&[points[*a], points[*b], points[*c]]))
            .sum()
    }
}
