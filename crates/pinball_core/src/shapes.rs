//! Serializable shape templates
//!
//! ShapeTemplate is the table-file representation of collision geometry.
//! Each variant stores construction parameters in playfield coordinates and
//! expands into one or more physics primitives. Meshes expand into their
//! triangles plus the shared edges and corners, so a ball rolling over a
//! seam or striking a corner meets a proper line or point instead of slipping
//! between two faces.

use std::collections::HashSet;

use pinball_math::Vec3;
use pinball_physics::{HitLine, HitLineZ, HitPlane, HitShape, HitSphere, HitTriangle};
use serde::{Deserialize, Serialize};

use crate::table_error::TableError;

/// Serializable shape template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ShapeTemplate {
    /// Infinite plane through `point`; the ball stays on the `normal` side
    Plane { point: Vec3, normal: Vec3 },
    /// Single one-sided triangle, counter-clockwise seen from the front
    Triangle { a: Vec3, b: Vec3, c: Vec3 },
    /// Segment between two points
    Line { start: Vec3, end: Vec3 },
    /// Vertical post at `(x, y)` (rubber posts, pins)
    LineZ { x: f32, y: f32, z_low: f32, z_high: f32 },
    /// Single point (e.g. a wall corner)
    Point { position: Vec3 },
    /// Static sphere (bumper caps, domes)
    Sphere { center: Vec3, radius: f32 },
    /// Indexed triangle mesh
    Mesh {
        vertices: Vec<Vec3>,
        /// Counter-clockwise triangles (front face points at the ball)
        indices: Vec<[u32; 3]>,
    },
}

impl ShapeTemplate {
    /// Create the physics primitives described by this template
    pub fn create_shapes(&self) -> Result<Vec<HitShape>, TableError> {
        match self {
            ShapeTemplate::Plane { point, normal } => {
                if normal.length() <= f32::EPSILON {
                    return Err(TableError::InvalidMesh("plane normal has zero length".to_string()));
                }
                Ok(vec![HitShape::Plane(HitPlane::from_point_normal(*point, *normal))])
            }
            ShapeTemplate::Triangle { a, b, c } => HitTriangle::new(*a, *b, *c)
                .map(|tri| vec![HitShape::Triangle(tri)])
                .ok_or_else(|| TableError::InvalidMesh("degenerate triangle".to_string())),
            ShapeTemplate::Line { start, end } => Ok(vec![HitShape::Line(HitLine {
                start: *start,
                end: *end,
            })]),
            ShapeTemplate::LineZ { x, y, z_low, z_high } => Ok(vec![HitShape::LineZ(HitLineZ {
                x: *x,
                y: *y,
                z_low: z_low.min(*z_high),
                z_high: z_low.max(*z_high),
            })]),
            ShapeTemplate::Point { position } => Ok(vec![HitShape::Point(*position)]),
            ShapeTemplate::Sphere { center, radius } => Ok(vec![HitShape::Sphere(HitSphere {
                center: *center,
                radius: radius.max(0.0),
            })]),
            ShapeTemplate::Mesh { vertices, indices } => expand_mesh(vertices, indices),
        }
    }

    /// Create a triangle template
    pub fn triangle(a: Vec3, b: Vec3, c: Vec3) -> Self {
        ShapeTemplate::Triangle { a, b, c }
    }

    /// Create a vertical post template
    pub fn post(x: f32, y: f32, z_low: f32, z_high: f32) -> Self {
        ShapeTemplate::LineZ { x, y, z_low, z_high }
    }

    /// Create a static sphere template
    pub fn sphere(center: Vec3, radius: f32) -> Self {
        ShapeTemplate::Sphere { center, radius }
    }

    /// Axis-aligned wall block between two corners, sides and top only
    ///
    /// The bottom face is omitted since it rests on the playfield.
    pub fn wall(min: Vec3, max: Vec3) -> Self {
        let vertices = vec![
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(max.x, max.y, max.z),
            Vec3::new(min.x, max.y, max.z),
        ];
        let indices = vec![
            // top (+z)
            [4, 5, 6],
            [4, 6, 7],
            // -y
            [0, 1, 5],
            [0, 5, 4],
            // +x
            [1, 2, 6],
            [1, 6, 5],
            // +y
            [2, 3, 7],
            [2, 7, 6],
            // -x
            [3, 0, 4],
            [3, 4, 7],
        ];
        ShapeTemplate::Mesh { vertices, indices }
    }
}

/// Expand an indexed mesh into triangles, unique edges and used vertices
///
/// Degenerate triangles are skipped. Output order follows the index list so
/// the same mesh always yields the same collider ids.
fn expand_mesh(vertices: &[Vec3], indices: &[[u32; 3]]) -> Result<Vec<HitShape>, TableError> {
    let mut triangles = Vec::with_capacity(indices.len());
    let mut edges = Vec::new();
    let mut seen_edges = HashSet::new();
    let mut corners = Vec::new();
    let mut seen_corners = HashSet::new();

    for (n, tri) in indices.iter().enumerate() {
        let mut corner = [Vec3::ZERO; 3];
        for (slot, &index) in tri.iter().enumerate() {
            corner[slot] = *vertices.get(index as usize).ok_or_else(|| {
                TableError::InvalidMesh(format!(
                    "triangle {} references vertex {} but the mesh has {} vertices",
                    n,
                    index,
                    vertices.len()
                ))
            })?;
        }

        let Some(triangle) = HitTriangle::new(corner[0], corner[1], corner[2]) else {
            log::debug!("Skipping degenerate mesh triangle {}", n);
            continue;
        };
        triangles.push(HitShape::Triangle(triangle));

        for (i, j) in [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])] {
            let key = (i.min(j), i.max(j));
            if seen_edges.insert(key) {
                edges.push(HitShape::Line(HitLine {
                    start: vertices[key.0 as usize],
                    end: vertices[key.1 as usize],
                }));
            }
        }
        for &index in tri {
            if seen_corners.insert(index) {
                corners.push(HitShape::Point(vertices[index as usize]));
            }
        }
    }

    if triangles.is_empty() {
        return Err(TableError::InvalidMesh("mesh has no non-degenerate triangles".to_string()));
    }

    triangles.extend(edges);
    triangles.extend(corners);
    Ok(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(shapes: &[HitShape]) -> (usize, usize, usize) {
        let tris = shapes.iter().filter(|s| matches!(s, HitShape::Triangle(_))).count();
        let lines = shapes.iter().filter(|s| matches!(s, HitShape::Line(_))).count();
        let points = shapes.iter().filter(|s| matches!(s, HitShape::Point(_))).count();
        (tris, lines, points)
    }

    #[test]
    fn test_quad_mesh_shares_diagonal() {
        let mesh = ShapeTemplate::Mesh {
            vertices: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(10.0, 0.0, 0.0),
                Vec3::new(10.0, 10.0, 0.0),
                Vec3::new(0.0, 10.0, 0.0),
            ],
            indices: vec![[0, 1, 2], [0, 2, 3]],
        };
        let shapes = mesh.create_shapes().unwrap();
        // 4 outer edges + 1 shared diagonal
        assert_eq!(count(&shapes), (2, 5, 4));
    }

    #[test]
    fn test_wall_block_expansion() {
        let wall = ShapeTemplate::wall(Vec3::new(0.0, 0.0, 0.0), Vec3::new(20.0, 100.0, 50.0));
        let shapes = wall.create_shapes().unwrap();
        let (tris, lines, points) = count(&shapes);
        assert_eq!(tris, 10);
        // 12 box edges + 5 face diagonals
        assert_eq!(lines, 17);
        assert_eq!(points, 8);
    }

    #[test]
    fn test_wall_faces_point_outward() {
        let min = Vec3::new(0.0, 0.0, 0.0);
        let max = Vec3::new(20.0, 100.0, 50.0);
        let center = (min + max) * 0.5;
        let shapes = ShapeTemplate::wall(min, max).create_shapes().unwrap();
        for shape in shapes {
            if let HitShape::Triangle(tri) = shape {
                let to_face = tri.vertices[0] - center;
                assert!(tri.normal.dot(to_face) > 0.0, "inward normal {:?}", tri.normal);
            }
        }
    }

    #[test]
    fn test_mesh_index_out_of_range() {
        let mesh = ShapeTemplate::Mesh {
            vertices: vec![Vec3::ZERO, Vec3::X],
            indices: vec![[0, 1, 2]],
        };
        match mesh.create_shapes() {
            Err(TableError::InvalidMesh(msg)) => assert!(msg.contains("vertex 2")),
            other => panic!("Expected InvalidMesh, got {:?}", other),
        }
    }

    #[test]
    fn test_mesh_without_area_is_rejected() {
        let mesh = ShapeTemplate::Mesh {
            vertices: vec![Vec3::ZERO, Vec3::X, Vec3::X * 2.0],
            indices: vec![[0, 1, 2]],
        };
        assert!(matches!(mesh.create_shapes(), Err(TableError::InvalidMesh(_))));
    }

    #[test]
    fn test_degenerate_triangle_template() {
        let tri = ShapeTemplate::triangle(Vec3::ZERO, Vec3::ZERO, Vec3::X);
        assert!(tri.create_shapes().is_err());
    }

    #[test]
    fn test_post_orders_heights() {
        let shapes = ShapeTemplate::post(5.0, 6.0, 50.0, 0.0).create_shapes().unwrap();
        match shapes[0] {
            HitShape::LineZ(post) => {
                assert_eq!(post.z_low, 0.0);
                assert_eq!(post.z_high, 50.0);
            }
            other => panic!("Expected LineZ, got {:?}", other),
        }
    }

    #[test]
    fn test_ron_roundtrip_uses_type_tag() {
        let template = ShapeTemplate::sphere(Vec3::new(1.0, 2.0, 3.0), 4.0);
        let serialized = ron::to_string(&template).unwrap();
        assert!(serialized.contains("Sphere"));
        let parsed: ShapeTemplate = ron::from_str(&serialized).unwrap();
        assert_eq!(parsed, template);
    }
}
