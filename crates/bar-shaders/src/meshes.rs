//! Procedural mesh catalog.
//!
//! Every item mesh spans [-1, 1] on each axis and stands on y = -1, so a
//! model scale of `h` on Y gives a glyph of height `2h`. Solids of
//! revolution are built from a radial profile; bars and pyramids are
//! four-segment lathes rotated by 45 degrees.

use std::f32::consts::{FRAC_PI_4, PI, SQRT_2};

use glam::{Vec2, Vec3};

use crate::Vertex;

/// Triangle list mesh
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Every identifier [`mesh_by_id`] resolves
pub const MESH_IDS: [&str; 13] = [
    "bar",
    "barSmooth",
    "pyramid",
    "pyramidSmooth",
    "cone",
    "coneSmooth",
    "cylinder",
    "cylinderSmooth",
    "bevelbar",
    "bevelbarSmooth",
    "sphere",
    "sphereSmooth",
    "background",
];

const ROUND_SEGMENTS: u32 = 32;
const SPHERE_RINGS: u32 = 16;

/// Build the mesh for a catalog identifier
pub fn mesh_by_id(id: &str) -> Option<MeshData> {
    let (base, smooth) = match id.strip_suffix("Smooth") {
        Some(base) => (base, true),
        None => (id, false),
    };
    let mesh = match base {
        "bar" => lathe(&[(SQRT_2, -1.0), (SQRT_2, 1.0)], 4, FRAC_PI_4, smooth),
        "pyramid" => lathe(&[(SQRT_2, -1.0), (0.0, 1.0)], 4, FRAC_PI_4, smooth),
        "cone" => lathe(&[(1.0, -1.0), (0.0, 1.0)], ROUND_SEGMENTS, 0.0, smooth),
        "cylinder" => lathe(&[(1.0, -1.0), (1.0, 1.0)], ROUND_SEGMENTS, 0.0, smooth),
        "bevelbar" => lathe(
            &[(SQRT_2, -1.0), (SQRT_2, 0.8), (SQRT_2 * 0.8, 1.0)],
            4,
            FRAC_PI_4,
            smooth,
        ),
        "sphere" => {
            let profile: Vec<(f32, f32)> = (0..=SPHERE_RINGS)
                .map(|k| {
                    let phi = PI * k as f32 / SPHERE_RINGS as f32;
                    (phi.sin(), -phi.cos())
                })
                .collect();
            lathe(&profile, ROUND_SEGMENTS, 0.0, smooth)
        }
        "background" if !smooth => background_plane(),
        _ => return None,
    };
    Some(mesh)
}

/// Unit quad in XY facing +Z, UV origin at the top-left
pub fn background_plane() -> MeshData {
    let v = |x: f32, y: f32, u: f32, w: f32| Vertex {
        position: [x, y, 0.0],
        normal: [0.0, 0.0, 1.0],
        uv: [u, w],
    };
    MeshData {
        vertices: vec![
            v(-1.0, -1.0, 0.0, 1.0),
            v(1.0, -1.0, 1.0, 1.0),
            v(1.0, 1.0, 1.0, 0.0),
            v(-1.0, 1.0, 0.0, 0.0),
        ],
        indices: vec![0, 1, 2, 0, 2, 3],
    }
}

fn ring_point(radius: f32, y: f32, angle: f32) -> Vec3 {
    Vec3::new(radius * angle.cos(), y, radius * angle.sin())
}

/// Outward (radial, vertical) normal of each profile segment
fn segment_normals(profile: &[(f32, f32)]) -> Vec<Vec2> {
    profile
        .windows(2)
        .map(|w| {
            let t = Vec2::new(w[1].0 - w[0].0, w[1].1 - w[0].1);
            Vec2::new(t.y, -t.x).normalize_or_zero()
        })
        .collect()
}

/// Revolve `profile` (radius, y), bottom to top, around the Y axis.
fn lathe(profile: &[(f32, f32)], segments: u32, angle_offset: f32, smooth: bool) -> MeshData {
    let mut mesh = MeshData::default();
    let seg_normals = segment_normals(profile);
    let last = profile.len() - 1;
    let angle = |j: u32| angle_offset + 2.0 * PI * j as f32 / segments as f32;

    // Profile point normals for smooth shading: average of adjacent segments
    let point_normal = |k: usize, seg: usize| -> Vec2 {
        if !smooth {
            return seg_normals[seg];
        }
        let before = k.checked_sub(1).map(|i| seg_normals[i]);
        let after = seg_normals.get(k).copied();
        match (before, after) {
            (Some(a), Some(b)) => (a + b).normalize_or_zero(),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => Vec2::Y,
        }
    };

    for (seg, w) in profile.windows(2).enumerate() {
        let ((r0, y0), (r1, y1)) = (w[0], w[1]);
        let v0 = seg as f32 / last as f32;
        let v1 = (seg + 1) as f32 / last as f32;
        let n_bottom = point_normal(seg, seg);
        let n_top = point_normal(seg + 1, seg);

        for j in 0..segments {
            let (a0, a1) = (angle(j), angle(j + 1));
            let a = ring_point(r0, y0, a0);
            let b = ring_point(r0, y0, a1);
            let c = ring_point(r1, y1, a1);
            let d = ring_point(r1, y1, a0);

            let normal_at = |n: Vec2, ang: f32| -> Vec3 {
                if smooth {
                    Vec3::new(n.x * ang.cos(), n.y, n.x * ang.sin()).normalize_or_zero()
                } else {
                    // Flat: face normal at the quad's middle angle
                    let mid = (a0 + a1) * 0.5;
                    Vec3::new(n.x * mid.cos(), n.y, n.x * mid.sin()).normalize_or_zero()
                }
            };

            let u0 = j as f32 / segments as f32;
            let u1 = (j + 1) as f32 / segments as f32;
            let base = mesh.vertices.len() as u32;
            mesh.vertices.extend([
                vertex(a, normal_at(n_bottom, a0), [u0, 1.0 - v0]),
                vertex(b, normal_at(n_bottom, a1), [u1, 1.0 - v0]),
                vertex(c, normal_at(n_top, a1), [u1, 1.0 - v1]),
                vertex(d, normal_at(n_top, a0), [u0, 1.0 - v1]),
            ]);
            if r0 > 0.0 {
                mesh.indices.extend([base, base + 2, base + 1]);
            }
            if r1 > 0.0 {
                mesh.indices.extend([base, base + 3, base + 2]);
            }
        }
    }

    let (r_bottom, y_bottom) = profile[0];
    if r_bottom > 0.0 {
        cap(&mut mesh, r_bottom, y_bottom, segments, &angle, false);
    }
    let (r_top, y_top) = profile[last];
    if r_top > 0.0 {
        cap(&mut mesh, r_top, y_top, segments, &angle, true);
    }
    mesh
}

fn cap(mesh: &mut MeshData, radius: f32, y: f32, segments: u32, angle: &dyn Fn(u32) -> f32, top: bool) {
    let normal = if top { Vec3::Y } else { Vec3::NEG_Y };
    let center = mesh.vertices.len() as u32;
    mesh.vertices.push(vertex(Vec3::new(0.0, y, 0.0), normal, [0.5, 0.5]));
    for j in 0..segments {
        let a = angle(j);
        let p = ring_point(radius, y, a);
        mesh.vertices.push(vertex(p, normal, [0.5 + 0.5 * a.cos(), 0.5 + 0.5 * a.sin()]));
    }
    for j in 0..segments {
        let p0 = center + 1 + j;
        let p1 = center + 1 + (j + 1) % segments;
        if top {
            mesh.indices.extend([center, p1, p0]);
        } else {
            mesh.indices.extend([center, p0, p1]);
        }
    }
}

fn vertex(position: Vec3, normal: Vec3, uv: [f32; 2]) -> Vertex {
    Vertex {
        position: position.to_array(),
        normal: normal.to_array(),
        uv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_normal(mesh: &MeshData, tri: &[u32]) -> Vec3 {
        let p = |i: u32| Vec3::from(mesh.vertices[i as usize].position);
        (p(tri[1]) - p(tri[0])).cross(p(tri[2]) - p(tri[0]))
    }

    #[test]
    fn test_catalog_resolves_every_id() {
        for id in MESH_IDS {
            let mesh = mesh_by_id(id).unwrap_or_else(|| panic!("missing {id}"));
            assert!(!mesh.indices.is_empty(), "{id}");
            assert_eq!(mesh.indices.len() % 3, 0, "{id}");
            assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.vertices.len()), "{id}");
        }
        assert!(mesh_by_id("teapot").is_none());
        assert!(mesh_by_id("backgroundSmooth").is_none());
    }

    #[test]
    fn test_geometry_inside_unit_cube() {
        for id in MESH_IDS {
            let mesh = mesh_by_id(id).unwrap();
            for v in &mesh.vertices {
                for c in v.position {
                    assert!((-1.0 - 1e-5..=1.0 + 1e-5).contains(&c), "{id}: {c}");
                }
                let n = Vec3::from(v.normal).length();
                assert!((n - 1.0).abs() < 1e-4, "{id}: normal length {n}");
            }
        }
    }

    #[test]
    fn test_items_stand_on_floor() {
        for id in MESH_IDS.iter().filter(|id| **id != "background") {
            let mesh = mesh_by_id(id).unwrap();
            let min_y = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MAX, f32::min);
            let max_y = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
            assert!((min_y + 1.0).abs() < 1e-5, "{id}");
            assert!((max_y - 1.0).abs() < 1e-5, "{id}");
        }
    }

    #[test]
    fn test_bar_faces_point_outward() {
        let mesh = mesh_by_id("bar").unwrap();
        for tri in mesh.indices.chunks(3) {
            let center: Vec3 = tri.iter().map(|&i| Vec3::from(mesh.vertices[i as usize].position)).sum::<Vec3>() / 3.0;
            assert!(triangle_normal(&mesh, tri).dot(center) > 0.0);
        }
        // 4 sides of 2 triangles, 2 fan caps of 4
        assert_eq!(mesh.indices.len() / 3, 16);
    }

    #[test]
    fn test_bar_corners_on_unit_square() {
        let mesh = mesh_by_id("bar").unwrap();
        let corner = mesh.vertices.iter().any(|v| {
            (v.position[0] - 1.0).abs() < 1e-5 && (v.position[2] - 1.0).abs() < 1e-5
        });
        assert!(corner);
    }
}
