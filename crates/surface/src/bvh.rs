//! Bounding volume hierarchy over a mesh snapshot.
//!
//! The tree is a flat node array built once per stroke by median splits
//! along the longest centroid axis. Queries walk it with a fixed-size stack,
//! nearest child first, so no allocation happens per query.

use glam::{Vec2, Vec3};
use tracing::info;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::aabb::Aabb;
use crate::error::SurfaceError;
use crate::mesh::MeshSnapshot;
use crate::triangle::{
    closest_point_barycentric, interpolate_vec2, interpolate_vec3, ray_triangle_intersection,
};

/// Maximum triangles stored in a leaf.
const MAX_LEAF_SIZE: usize = 4;

/// Traversal stack depth. Median splits keep the tree balanced, so the
/// depth stays near log2(triangles / MAX_LEAF_SIZE).
const STACK_SIZE: usize = 64;

/// Where a query landed on the surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    /// Point on the surface
    pub location: Vec3,
    /// Interpolated, normalized shading normal
    pub normal: Vec3,
    /// Index of the triangle in the snapshot
    pub triangle_index: u32,
    /// Corner weights, summing to one
    pub barycentric: Vec3,
}

/// A ray for [`SurfaceIndex::shoot_ray`]. The direction need not be normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }
}

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf { start: u32, count: u32 },
    Internal { left: u32, right: u32 },
}

#[derive(Debug, Clone, Copy)]
struct BvhNode {
    bounds: Aabb,
    kind: NodeKind,
}

/// Immutable acceleration structure for closest-point and ray queries.
///
/// Built once at stroke start and shared read-only for the stroke's lifetime.
#[derive(Debug, Clone)]
pub struct SurfaceIndex {
    positions: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
    /// Three shading normals per triangle
    corner_normals: Vec<Vec3>,
    /// Three UVs per triangle, when the mesh has a UV layer
    corner_uvs: Option<Vec<Vec2>>,
    nodes: Vec<BvhNode>,
    /// Triangle indices in leaf order
    order: Vec<u32>,
}

struct BvhBuilder<'a> {
    centroids: &'a [Vec3],
    tri_bounds: &'a [Aabb],
    order: Vec<u32>,
    nodes: Vec<BvhNode>,
}

impl BvhBuilder<'_> {
    fn build_node(&mut self, start: usize, end: usize) -> u32 {
        let mut bounds = Aabb::empty();
        let mut centroid_bounds = Aabb::empty();
        for &tri in &self.order[start..end] {
            bounds.include_aabb(&self.tri_bounds[tri as usize]);
            centroid_bounds.include_point(self.centroids[tri as usize]);
        }

        let index = self.nodes.len() as u32;
        let count = end - start;
        if count <= MAX_LEAF_SIZE {
            self.nodes.push(BvhNode {
                bounds,
                kind: NodeKind::Leaf {
                    start: start as u32,
                    count: count as u32,
                },
            });
            return index;
        }

        let axis = centroid_bounds.longest_axis();
        let mid = start + count / 2;
        let centroids = self.centroids;
        self.order[start..end].select_nth_unstable_by(mid - start, |&a, &b| {
            centroids[a as usize][axis]
                .total_cmp(&centroids[b as usize][axis])
                .then(a.cmp(&b))
        });

        // Placeholder until both children exist
        self.nodes.push(BvhNode {
            bounds,
            kind: NodeKind::Leaf { start: 0, count: 0 },
        });
        let left = self.build_node(start, mid);
        let right = self.build_node(mid, end);
        self.nodes[index as usize].kind = NodeKind::Internal { left, right };
        index
    }
}

/// Fixed-capacity stack of node indices.
struct NodeStack {
    items: [u32; STACK_SIZE],
    len: usize,
}

impl NodeStack {
    fn new(root: u32) -> Self {
        let mut items = [0; STACK_SIZE];
        items[0] = root;
        Self { items, len: 1 }
    }

    fn push(&mut self, node: u32) {
        // Depth is bounded by the balanced build; guard anyway
        if self.len < STACK_SIZE {
            self.items[self.len] = node;
            self.len += 1;
        }
    }

    fn pop(&mut self) -> Option<u32> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        Some(self.items[self.len])
    }
}

impl SurfaceIndex {
    /// Validate the snapshot and build the hierarchy.
    pub fn build(mesh: MeshSnapshot) -> Result<Self, SurfaceError> {
        mesh.validate()?;

        let MeshSnapshot {
            positions,
            triangles,
            normals,
            uvs,
        } = mesh;

        let corner_normals = match normals.to_corners(&triangles) {
            Some(normals) => normals,
            None => triangles
                .iter()
                .flat_map(|tri| {
                    let [a, b, c] = tri.map(|i| positions[i as usize]);
                    let face = (b - a).cross(c - a).normalize_or_zero();
                    [face; 3]
                })
                .collect(),
        };
        let corner_uvs = uvs.to_corners(&triangles);

        let tri_bounds: Vec<Aabb> = triangles
            .iter()
            .map(|tri| {
                let [a, b, c] = tri.map(|i| positions[i as usize]);
                Aabb::from_triangle(a, b, c)
            })
            .collect();
        let centroids: Vec<Vec3> = tri_bounds.iter().map(Aabb::center).collect();

        let mut builder = BvhBuilder {
            centroids: &centroids,
            tri_bounds: &tri_bounds,
            order: (0..triangles.len() as u32).collect(),
            nodes: Vec::with_capacity(2 * triangles.len().div_ceil(MAX_LEAF_SIZE)),
        };
        builder.build_node(0, triangles.len());
        let BvhBuilder { order, nodes, .. } = builder;

        info!(
            "Built surface index: {} triangles, {} nodes",
            triangles.len(),
            nodes.len()
        );

        Ok(Self {
            positions,
            triangles,
            corner_normals,
            corner_uvs,
            nodes,
            order,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Bounds of the whole mesh.
    pub fn bounds(&self) -> Aabb {
        self.nodes[0].bounds
    }

    pub fn has_uvs(&self) -> bool {
        self.corner_uvs.is_some()
    }

    fn triangle_positions(&self, tri: u32) -> (Vec3, Vec3, Vec3) {
        let [a, b, c] = self.triangles[tri as usize];
        (
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        )
    }

    fn make_hit(&self, tri: u32, barycentric: Vec3, location: Vec3) -> SurfaceHit {
        let base = tri as usize * 3;
        let corners = &self.corner_normals[base..base + 3];
        let normal = interpolate_vec3(barycentric, corners[0], corners[1], corners[2])
            .try_normalize()
            .or_else(|| {
                let (a, b, c) = self.triangle_positions(tri);
                (b - a).cross(c - a).try_normalize()
            })
            .unwrap_or(Vec3::Z);

        SurfaceHit {
            location,
            normal,
            triangle_index: tri,
            barycentric,
        }
    }

    /// Nearest point on the mesh to `query`.
    ///
    /// Returns `None` only when nothing could be measured, e.g. for a
    /// non-finite query. Equidistant triangles resolve to the lowest index.
    pub fn closest_point(&self, query: Vec3) -> Option<SurfaceHit> {
        let mut best_d2 = f32::INFINITY;
        let mut best: Option<(u32, Vec3, Vec3)> = None;
        let mut stack = NodeStack::new(0);

        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index as usize];
            if node.bounds.distance_squared(query) > best_d2 {
                continue;
            }

            match node.kind {
                NodeKind::Leaf { start, count } => {
                    for &tri in &self.order[start as usize..(start + count) as usize] {
                        let (a, b, c) = self.triangle_positions(tri);
                        let bary = closest_point_barycentric(query, a, b, c);
                        let location = interpolate_vec3(bary, a, b, c);
                        let d2 = location.distance_squared(query);

                        let better = match best {
                            None => d2 < best_d2,
                            Some((best_tri, _, _)) => {
                                d2 < best_d2 || (d2 == best_d2 && tri < best_tri)
                            }
                        };
                        if better {
                            best_d2 = d2;
                            best = Some((tri, bary, location));
                        }
                    }
                }
                NodeKind::Internal { left, right } => {
                    let dl = self.nodes[left as usize].bounds.distance_squared(query);
                    let dr = self.nodes[right as usize].bounds.distance_squared(query);
                    // Push the farther child first so the nearer one is visited first
                    let (near, far, d_far) = if dl <= dr {
                        (left, right, dr)
                    } else {
                        (right, left, dl)
                    };
                    if d_far <= best_d2 {
                        stack.push(far);
                    }
                    stack.push(near);
                }
            }
        }

        best.map(|(tri, bary, location)| self.make_hit(tri, bary, location))
    }

    /// Nearest surface hit along `ray`, or `None` on a miss.
    ///
    /// Hits at equal distance resolve to the lowest triangle index.
    pub fn shoot_ray(&self, ray: Ray) -> Option<SurfaceHit> {
        let Ray { origin, direction } = ray;
        if !origin.is_finite() || !direction.is_finite() || direction == Vec3::ZERO {
            return None;
        }

        let inv_dir = direction.recip();
        let mut best_t = f32::INFINITY;
        let mut best: Option<(u32, Vec3)> = None;
        let mut stack = NodeStack::new(0);

        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index as usize];
            if node.bounds.ray_entry(origin, inv_dir, best_t).is_none() {
                continue;
            }

            match node.kind {
                NodeKind::Leaf { start, count } => {
                    for &tri in &self.order[start as usize..(start + count) as usize] {
                        let (a, b, c) = self.triangle_positions(tri);
                        let Some(hit) = ray_triangle_intersection(origin, direction, a, b, c)
                        else {
                            continue;
                        };
                        let better = match best {
                            None => true,
                            Some((best_tri, _)) => {
                                hit.t < best_t || (hit.t == best_t && tri < best_tri)
                            }
                        };
                        if better {
                            best_t = hit.t;
                            best = Some((tri, hit.barycentric));
                        }
                    }
                }
                NodeKind::Internal { left, right } => {
                    let tl = self.nodes[left as usize]
                        .bounds
                        .ray_entry(origin, inv_dir, best_t);
                    let tr = self.nodes[right as usize]
                        .bounds
                        .ray_entry(origin, inv_dir, best_t);
                    match (tl, tr) {
                        (Some(tl), Some(tr)) if tl <= tr => {
                            stack.push(right);
                            stack.push(left);
                        }
                        (Some(_), Some(_)) => {
                            stack.push(left);
                            stack.push(right);
                        }
                        (Some(_), None) => stack.push(left),
                        (None, Some(_)) => stack.push(right),
                        (None, None) => {}
                    }
                }
            }
        }

        best.map(|(tri, bary)| self.make_hit(tri, bary, origin + direction * best_t))
    }

    /// Batch form of [`closest_point`](Self::closest_point), one result per query.
    pub fn closest_points(&self, queries: &[Vec3]) -> Vec<Option<SurfaceHit>> {
        #[cfg(feature = "parallel")]
        {
            queries.par_iter().map(|&q| self.closest_point(q)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            queries.iter().map(|&q| self.closest_point(q)).collect()
        }
    }

    /// Batch form of [`shoot_ray`](Self::shoot_ray), one result per ray.
    pub fn shoot_rays(&self, rays: &[Ray]) -> Vec<Option<SurfaceHit>> {
        #[cfg(feature = "parallel")]
        {
            rays.par_iter().map(|&r| self.shoot_ray(r)).collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            rays.iter().map(|&r| self.shoot_ray(r)).collect()
        }
    }

    /// Texture coordinate at a hit; zero when the mesh has no UV layer.
    pub fn uv_at(&self, hit: &SurfaceHit) -> Vec2 {
        match &self.corner_uvs {
            Some(uvs) => {
                let base = hit.triangle_index as usize * 3;
                interpolate_vec2(hit.barycentric, uvs[base], uvs[base + 1], uvs[base + 2])
            }
            None => Vec2::ZERO,
        }
    }
}
