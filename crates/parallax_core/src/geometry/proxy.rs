//! Inverted spherical proxy shared by all layers

use super::{Geometry, Vertex};
use crate::config::ProxyConfig;
use std::f32::consts::PI;
use std::sync::Arc;

/// Shared, read-only proxy mesh
///
/// Every layer draws this same mesh; per-layer variation happens in the vertex
/// program. Cloning only bumps a reference count.
pub type SharedGeometry = Arc<Geometry>;

/// Sphere generator mirrored in X so its inner surface faces the center
pub struct ProxySphere;

impl ProxySphere {
    /// Build the proxy described by `config`
    pub fn from_config(config: &ProxyConfig) -> SharedGeometry {
        Arc::new(Self::with_detail(
            config.radius,
            config.width_segments,
            config.height_segments,
        ))
    }

    /// Create an inverted sphere with custom segment count
    ///
    /// Positions are mirrored in X, which flips the triangle winding so faces
    /// are counter-clockwise when seen from the center. Normals point inward.
    /// `uv` runs left to right around the horizon and top to bottom from the
    /// north pole, matching equirectangular frames with a top-left origin.
    pub fn with_detail(radius: f32, width_segments: u32, height_segments: u32) -> Geometry {
        let width_segments = width_segments.max(3);
        let height_segments = height_segments.max(2);

        let mut vertices =
            Vec::with_capacity(((width_segments + 1) * (height_segments + 1)) as usize);
        let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);

        for iy in 0..=height_segments {
            let v = iy as f32 / height_segments as f32;
            let phi = v * PI;

            for ix in 0..=width_segments {
                let u = ix as f32 / width_segments as f32;
                let theta = u * 2.0 * PI;

                let x = radius * phi.sin() * theta.cos();
                let y = radius * phi.cos();
                let z = radius * phi.sin() * theta.sin();

                let normal = [-x / radius, -y / radius, -z / radius];
                vertices.push(Vertex::new([x, y, z], normal, [u, v]));
            }
        }

        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = iy * (width_segments + 1) + ix;
                let b = a + width_segments + 1;
                let c = b + 1;
                let d = a + 1;

                // the pole rows collapse to a point; skip their degenerate halves
                if iy != 0 {
                    indices.extend_from_slice(&[a, b, d]);
                }
                if iy != height_segments - 1 {
                    indices.extend_from_slice(&[b, c, d]);
                }
            }
        }

        tracing::debug!(
            "proxy sphere: radius {}, {}x{} segments, {} vertices, {} triangles",
            radius,
            width_segments,
            height_segments,
            vertices.len(),
            indices.len() / 3
        );

        Geometry::from_data(vertices, indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;

    #[test]
    fn test_counts() {
        let sphere = ProxySphere::with_detail(6.0, 8, 4);
        assert_eq!(sphere.vertex_count(), 9 * 5);
        // two pole rows contribute one triangle per segment
        assert_eq!(sphere.triangle_count(), 8 * 4 * 2 - 2 * 8);
        assert!(sphere
            .indices
            .iter()
            .all(|&i| (i as usize) < sphere.vertex_count()));
    }

    #[test]
    fn test_vertices_lie_on_radius() {
        let sphere = ProxySphere::with_detail(6.0, 16, 8);
        for vertex in &sphere.vertices {
            let r = Vec3::from(vertex.position).length();
            assert!((r - 6.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_normals_point_inward() {
        let sphere = ProxySphere::with_detail(2.0, 16, 8);
        for vertex in sphere.vertices.iter().skip(17).take(16) {
            let p = Vec3::from(vertex.position);
            let n = Vec3::from(vertex.normal);
            assert!(p.dot(n) < 0.0);
        }
    }

    #[test]
    fn test_faces_wind_toward_center() {
        let sphere = ProxySphere::with_detail(1.0, 12, 6);
        for tri in sphere.indices.chunks(3) {
            let p0 = Vec3::from(sphere.vertices[tri[0] as usize].position);
            let p1 = Vec3::from(sphere.vertices[tri[1] as usize].position);
            let p2 = Vec3::from(sphere.vertices[tri[2] as usize].position);
            let face_normal = (p1 - p0).cross(p2 - p0);
            let centroid = (p0 + p1 + p2) * (1.0 / 3.0);
            assert!(face_normal.dot(centroid) < 0.0);
        }
    }

    #[test]
    fn test_uv_spans_unit_square() {
        let sphere = ProxySphere::with_detail(1.0, 10, 5);
        let first = sphere.vertices.first().unwrap();
        let last = sphere.vertices.last().unwrap();
        assert_eq!(first.uv, [0.0, 0.0]);
        assert_eq!(last.uv, [1.0, 1.0]);
        // north pole at v = 0
        assert!((first.position[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_shared_geometry_is_not_copied() {
        let shared = ProxySphere::from_config(&ProxyConfig {
            radius: 1.0,
            width_segments: 4,
            height_segments: 2,
        });
        let other = Arc::clone(&shared);
        assert!(Arc::ptr_eq(&shared, &other));
    }
}
