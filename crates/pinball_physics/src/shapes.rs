//! Collision primitives and their time-of-impact tests
//!
//! Every test answers the same question: given a sphere moving at constant
//! velocity and the time left in the current sub-step, when does its surface
//! first touch the primitive? Results outside `[0, budget]`, non-finite
//! results and hits on spheres already embedded past the primitive's
//! threshold are rejected.

use pinball_math::{solve_quadratic, Vec3};
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;
use crate::config::ContactTolerances;
use crate::event::Impact;

/// Smallest relative speed squared worth solving for
const MIN_SPEED_SQUARED: f32 = 1.0e-8;

/// Distances below this are treated as "center lies on the primitive"
const DEGENERATE_DISTANCE: f32 = 1.0e-6;

/// A moving sphere as seen by the narrow phase
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SweptSphere {
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
}

impl SweptSphere {
    pub fn new(position: Vec3, velocity: Vec3, radius: f32) -> Self {
        Self {
            position,
            velocity,
            radius,
        }
    }
}

/// Infinite plane: `normal · p = distance`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitPlane {
    /// Unit normal pointing to the free side
    pub normal: Vec3,
    /// Signed distance from origin along the normal
    pub distance: f32,
}

impl HitPlane {
    /// Create a plane from a normal (normalized automatically) and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self {
            normal: normal.normalized(),
            distance,
        }
    }

    /// Create a plane from a point on the plane and a normal
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let n = normal.normalized();
        Self {
            normal: n,
            distance: n.dot(point),
        }
    }

    /// Signed distance from a point to the plane
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) - self.distance
    }
}

/// Single-sided triangle; the front face is the counter-clockwise side
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitTriangle {
    pub vertices: [Vec3; 3],
    pub normal: Vec3,
}

impl HitTriangle {
    /// Create a triangle; returns `None` for degenerate (zero-area) input
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Option<Self> {
        let normal = (b - a).cross(c - a);
        if normal.length_squared() < DEGENERATE_DISTANCE * DEGENERATE_DISTANCE {
            return None;
        }
        Some(Self {
            vertices: [a, b, c],
            normal: normal.normalized(),
        })
    }

    /// Barycentric inside test for a point on the triangle's plane
    fn contains(&self, point: Vec3) -> bool {
        let [a, b, c] = self.vertices;
        let v0 = c - a;
        let v1 = b - a;
        let v2 = point - a;

        let dot00 = v0.dot(v0);
        let dot01 = v0.dot(v1);
        let dot02 = v0.dot(v2);
        let dot11 = v1.dot(v1);
        let dot12 = v1.dot(v2);

        let inv_denom = 1.0 / (dot00 * dot11 - dot01 * dot01);
        let u = (dot11 * dot02 - dot01 * dot12) * inv_denom;
        let v = (dot00 * dot12 - dot01 * dot02) * inv_denom;

        u >= 0.0 && v >= 0.0 && u + v <= 1.0
    }
}

/// Line segment between two points (collides like a zero-radius capsule)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitLine {
    pub start: Vec3,
    pub end: Vec3,
}

/// Vertical line at `(x, y)` spanning `z_low..=z_high`
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitLineZ {
    pub x: f32,
    pub y: f32,
    pub z_low: f32,
    pub z_high: f32,
}

/// Static sphere; a zero radius gives a point
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitSphere {
    pub center: Vec3,
    pub radius: f32,
}

/// Closed set of collidable primitives
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum HitShape {
    Plane(HitPlane),
    Triangle(HitTriangle),
    Line(HitLine),
    LineZ(HitLineZ),
    Point(Vec3),
    Sphere(HitSphere),
}

impl HitShape {
    /// Bounding box of the primitive (planes are unbounded)
    pub fn bounds(&self) -> Aabb {
        match self {
            HitShape::Plane(_) => Aabb::EVERYTHING,
            HitShape::Triangle(t) => Aabb::from_points(&t.vertices),
            HitShape::Line(l) => Aabb::from_points(&[l.start, l.end]),
            HitShape::LineZ(l) => Aabb::new(
                Vec3::new(l.x, l.y, l.z_low.min(l.z_high)),
                Vec3::new(l.x, l.y, l.z_low.max(l.z_high)),
            ),
            HitShape::Point(p) => Aabb::new(*p, *p),
            HitShape::Sphere(s) => Aabb::from_center_half_extents(s.center, Vec3::splat(s.radius)),
        }
    }

    /// Earliest touch of the sphere within `budget`, or a resting contact
    pub fn time_of_impact(&self, sphere: &SweptSphere, budget: f32, tol: &ContactTolerances) -> Option<Impact> {
        let impact = match self {
            HitShape::Plane(p) => plane_toi(p, sphere, tol),
            HitShape::Triangle(t) => triangle_toi(t, sphere, tol),
            HitShape::Line(l) => {
                let axis = l.end - l.start;
                let length = axis.length();
                if length < DEGENERATE_DISTANCE {
                    sphere_toi(l.start, 0.0, sphere, tol)
                } else {
                    segment_toi(l.start, axis / length, length, sphere, budget, tol)
                }
            }
            HitShape::LineZ(l) => {
                let start = Vec3::new(l.x, l.y, l.z_low.min(l.z_high));
                let length = (l.z_high - l.z_low).abs();
                segment_toi(start, Vec3::Z, length, sphere, budget, tol)
            }
            HitShape::Point(p) => sphere_toi(*p, 0.0, sphere, tol),
            HitShape::Sphere(s) => sphere_toi(s.center, s.radius, sphere, tol),
        }?;

        if impact.is_contact || impact.is_within(budget) {
            Some(impact)
        } else {
            None
        }
    }
}

/// Resolve the hit time from the surface distance and normal speed
///
/// Shared policy of the flat primitives: touching and slow is a contact,
/// touching and fast (or penetrating) is an immediate hit, anything farther
/// is a linear sweep.
fn linear_hit_time(distance: f32, normal_speed: f32, tol: &ContactTolerances) -> Option<(f32, bool)> {
    if distance <= tol.touch_distance {
        if normal_speed.abs() <= tol.contact_velocity {
            Some((0.0, true))
        } else if distance <= 0.0 {
            Some((0.0, false))
        } else {
            Some((distance / -normal_speed, false))
        }
    } else if normal_speed.abs() > tol.low_normal_velocity {
        Some((distance / -normal_speed, false))
    } else {
        None
    }
}

fn plane_toi(plane: &HitPlane, sphere: &SweptSphere, tol: &ContactTolerances) -> Option<Impact> {
    let bnv = plane.normal.dot(sphere.velocity);
    if bnv > tol.contact_velocity {
        // Clearly receding
        return None;
    }

    let bnd = plane.signed_distance(sphere.position) - sphere.radius;
    if bnd < -2.0 * sphere.radius {
        // Already far through the plane
        return None;
    }

    if bnv.abs() <= tol.contact_velocity {
        return if bnd.abs() <= tol.touch_distance {
            Some(Impact::contact(plane.normal, bnd, bnv))
        } else {
            None
        };
    }

    let time = (bnd / -bnv).max(0.0);
    Some(Impact::collision(time, plane.normal, bnd, bnv))
}

fn triangle_toi(triangle: &HitTriangle, sphere: &SweptSphere, tol: &ContactTolerances) -> Option<Impact> {
    let normal = triangle.normal;
    let bnv = normal.dot(sphere.velocity);
    if bnv > tol.contact_velocity {
        return None;
    }

    let bnd = normal.dot(sphere.position - triangle.vertices[0]) - sphere.radius;
    if bnd < -sphere.radius {
        return None;
    }

    let (time, is_contact) = linear_hit_time(bnd, bnv, tol)?;
    if !time.is_finite() || time < 0.0 {
        return None;
    }

    let hit_point = sphere.position + sphere.velocity * time - normal * sphere.radius;
    if !triangle.contains(hit_point) {
        return None;
    }

    Some(if is_contact {
        Impact::contact(normal, bnd, bnv)
    } else {
        Impact::collision(time, normal, bnd, bnv)
    })
}

/// Sweep against a segment `start + axis * s`, `s` in `[0, length]`
///
/// Works in the plane perpendicular to the unit `axis`: the sphere center
/// must come within `radius` of the line, and the closest point at that time
/// must lie inside the segment.
fn segment_toi(
    start: Vec3,
    axis: Vec3,
    length: f32,
    sphere: &SweptSphere,
    budget: f32,
    tol: &ContactTolerances,
) -> Option<Impact> {
    let rel = sphere.position - start;
    let p_perp = rel.reject(axis);
    let v_perp = sphere.velocity.reject(axis);

    let dist = p_perp.length();
    if dist < DEGENERATE_DISTANCE {
        return None;
    }
    let outward = p_perp / dist;

    let bnv = v_perp.dot(outward);
    if bnv > tol.contact_velocity {
        return None;
    }

    let bnd = dist - sphere.radius;
    if bnd < -sphere.radius {
        return None;
    }

    let (time, is_contact) = if bnd <= tol.touch_distance {
        linear_hit_time(bnd, bnv, tol)?
    } else {
        let a = v_perp.length_squared();
        if a < MIN_SPEED_SQUARED {
            return None;
        }
        let b = 2.0 * p_perp.dot(v_perp);
        let c = dist * dist - sphere.radius * sphere.radius;
        let (t1, _) = solve_quadratic(a, b, c)?;
        (t1, false)
    };

    if !time.is_finite() || time < 0.0 || (!is_contact && time > budget) {
        return None;
    }

    let center = sphere.position + sphere.velocity * time;
    let along = (center - start).dot(axis);
    if along < 0.0 || along > length {
        return None;
    }

    let normal = if is_contact {
        outward
    } else {
        (center - start).reject(axis).normalized()
    };

    Some(if is_contact {
        Impact::contact(normal, bnd, bnv)
    } else {
        Impact::collision(time, normal, bnd, bnv)
    })
}

/// Sweep against a static sphere of `radius` (zero for a point)
fn sphere_toi(center: Vec3, radius: f32, sphere: &SweptSphere, tol: &ContactTolerances) -> Option<Impact> {
    let rel = sphere.position - center;
    let dist = rel.length();
    if dist < DEGENERATE_DISTANCE {
        return None;
    }

    let bnv = sphere.velocity.dot(rel) / dist;
    if bnv > tol.contact_velocity {
        return None;
    }

    let total_radius = sphere.radius + radius;
    let bnd = dist - total_radius;
    if bnd < -sphere.radius {
        return None;
    }

    let (time, is_contact) = if bnd <= tol.touch_distance {
        linear_hit_time(bnd, bnv, tol)?
    } else {
        let a = sphere.velocity.length_squared();
        if a < MIN_SPEED_SQUARED {
            return None;
        }
        let b = 2.0 * rel.dot(sphere.velocity);
        let c = dist * dist - total_radius * total_radius;
        let (t1, _) = solve_quadratic(a, b, c)?;
        (t1, false)
    };

    if !time.is_finite() || time < 0.0 {
        return None;
    }

    let normal = (rel + sphere.velocity * time).normalized();
    Some(if is_contact {
        Impact::contact(normal, bnd, bnv)
    } else {
        Impact::collision(time, normal, bnd, bnv)
    })
}

/// Sweep of two moving spheres
///
/// `moving` is the sphere being tested, `other` the ball it may strike. The
/// normal points from `other` toward `moving`. Ball pairs never produce
/// resting contacts: a slow pair that is touching waits until it either
/// separates or penetrates far enough to count as a hit.
pub fn ball_ball_toi(moving: &SweptSphere, other: &SweptSphere, budget: f32, tol: &ContactTolerances) -> Option<Impact> {
    let dp = moving.position - other.position;
    let dv = moving.velocity - other.velocity;

    let dist_sq = dp.length_squared();
    let dist = dist_sq.sqrt();
    if dist < DEGENERATE_DISTANCE {
        // Coincident centers are separated by the scheduler before testing
        return None;
    }

    let b = dv.dot(dp);
    let bnv = b / dist;
    if bnv > tol.contact_velocity {
        return None;
    }

    let total_radius = moving.radius + other.radius;
    let bnd = dist - total_radius;

    let time = if bnd <= tol.touch_distance {
        if bnd < -2.0 * moving.radius {
            return None;
        }
        if bnv.abs() > tol.contact_velocity || bnd <= -tol.touch_distance {
            0.0
        } else if bnv >= 0.0 {
            // Already apart or drifting apart within touch range
            return None;
        } else {
            bnd / -bnv
        }
    } else {
        let a = dv.length_squared();
        if a < MIN_SPEED_SQUARED {
            // Nearly at rest relative to each other: wait for contact
            return None;
        }
        let c = dist_sq - total_radius * total_radius;
        let (t1, t2) = solve_quadratic(a, 2.0 * b, c)?;
        if t1 * t2 < 0.0 {
            t1.max(t2)
        } else {
            t1.min(t2)
        }
    };

    if !time.is_finite() || time < 0.0 || time > budget {
        return None;
    }

    let normal = (dp + dv * time).normalized();
    Some(Impact::collision(time, normal, bnd, bnv))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1.0e-4;

    fn tol() -> ContactTolerances {
        ContactTolerances::default()
    }

    fn floor() -> HitShape {
        HitShape::Plane(HitPlane::from_point_normal(Vec3::ZERO, Vec3::Z))
    }

    #[test]
    fn test_plane_hit_time() {
        let sphere = SweptSphere::new(Vec3::new(0.0, 0.0, 35.0), Vec3::new(0.0, 0.0, -5.0), 25.0);
        let hit = floor().time_of_impact(&sphere, 10.0, &tol()).unwrap();
        assert!(!hit.is_contact);
        assert!((hit.time - 2.0).abs() < EPSILON);
        assert_eq!(hit.normal, Vec3::Z);
    }

    #[test]
    fn test_plane_receding_is_ignored() {
        let sphere = SweptSphere::new(Vec3::new(0.0, 0.0, 30.0), Vec3::new(0.0, 0.0, 5.0), 25.0);
        assert!(floor().time_of_impact(&sphere, 10.0, &tol()).is_none());
    }

    #[test]
    fn test_plane_beyond_budget_is_rejected() {
        let sphere = SweptSphere::new(Vec3::new(0.0, 0.0, 100.0), Vec3::new(0.0, 0.0, -1.0), 25.0);
        assert!(floor().time_of_impact(&sphere, 1.0, &tol()).is_none());
    }

    #[test]
    fn test_plane_resting_is_contact() {
        let sphere = SweptSphere::new(Vec3::new(0.0, 0.0, 25.01), Vec3::new(3.0, 0.0, -0.05), 25.0);
        let hit = floor().time_of_impact(&sphere, 1.0, &tol()).unwrap();
        assert!(hit.is_contact);
        assert!((hit.normal_velocity + 0.05).abs() < EPSILON);
    }

    #[test]
    fn test_plane_deep_embedding_is_rejected() {
        let sphere = SweptSphere::new(Vec3::new(0.0, 0.0, -30.0), Vec3::new(0.0, 0.0, -1.0), 25.0);
        assert!(floor().time_of_impact(&sphere, 1.0, &tol()).is_none());
    }

    #[test]
    fn test_plane_penetrating_hits_immediately() {
        let sphere = SweptSphere::new(Vec3::new(0.0, 0.0, 24.0), Vec3::new(0.0, 0.0, -2.0), 25.0);
        let hit = floor().time_of_impact(&sphere, 1.0, &tol()).unwrap();
        assert_eq!(hit.time, 0.0);
        assert!((hit.distance + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_triangle_inside_and_outside() {
        let tri = HitShape::Triangle(
            HitTriangle::new(Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0), Vec3::new(0.0, 100.0, 0.0)).unwrap(),
        );
        let inside = SweptSphere::new(Vec3::new(10.0, 10.0, 30.0), Vec3::new(0.0, 0.0, -10.0), 25.0);
        let hit = tri.time_of_impact(&inside, 1.0, &tol()).unwrap();
        assert!((hit.time - 0.5).abs() < EPSILON);
        assert_eq!(hit.normal, Vec3::Z);

        let outside = SweptSphere::new(Vec3::new(90.0, 90.0, 30.0), Vec3::new(0.0, 0.0, -10.0), 25.0);
        assert!(tri.time_of_impact(&outside, 1.0, &tol()).is_none());
    }

    #[test]
    fn test_degenerate_triangle_is_rejected() {
        assert!(HitTriangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0).is_none());
    }

    #[test]
    fn test_line_z_hit() {
        let post = HitShape::LineZ(HitLineZ {
            x: 100.0,
            y: 0.0,
            z_low: 0.0,
            z_high: 50.0,
        });
        let sphere = SweptSphere::new(Vec3::new(0.0, 0.0, 25.0), Vec3::new(10.0, 0.0, 0.0), 25.0);
        let hit = post.time_of_impact(&sphere, 10.0, &tol()).unwrap();
        // Surface reaches the line when the center is 25 away: (100 - 25) / 10
        assert!((hit.time - 7.5).abs() < EPSILON);
        assert!((hit.normal - (-Vec3::X)).length() < EPSILON);
    }

    #[test]
    fn test_line_misses_past_endpoint() {
        let line = HitShape::Line(HitLine {
            start: Vec3::new(100.0, 0.0, 0.0),
            end: Vec3::new(100.0, 0.0, 10.0),
        });
        // Center passes well above the top of the segment
        let sphere = SweptSphere::new(Vec3::new(0.0, 0.0, 60.0), Vec3::new(10.0, 0.0, 0.0), 25.0);
        assert!(line.time_of_impact(&sphere, 20.0, &tol()).is_none());
    }

    #[test]
    fn test_point_hit_time() {
        let point = HitShape::Point(Vec3::new(50.0, 0.0, 0.0));
        let sphere = SweptSphere::new(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), 25.0);
        let hit = point.time_of_impact(&sphere, 10.0, &tol()).unwrap();
        assert!((hit.time - 5.0).abs() < EPSILON);
        assert!((hit.normal - (-Vec3::X)).length() < EPSILON);
    }

    #[test]
    fn test_static_sphere_uses_combined_radius() {
        let bumper = HitShape::Sphere(HitSphere {
            center: Vec3::new(100.0, 0.0, 0.0),
            radius: 25.0,
        });
        let sphere = SweptSphere::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 25.0);
        let hit = bumper.time_of_impact(&sphere, 10.0, &tol()).unwrap();
        assert!((hit.time - 5.0).abs() < EPSILON);
    }

    #[test]
    fn test_ball_ball_hit_time() {
        let a = SweptSphere::new(Vec3::ZERO, Vec3::new(50.0, 0.0, 0.0), 25.0);
        let b = SweptSphere::new(Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO, 25.0);
        let hit = ball_ball_toi(&a, &b, 2.0, &tol()).unwrap();
        assert!((hit.time - 1.0).abs() < EPSILON);
        assert!((hit.normal - (-Vec3::X)).length() < EPSILON);

        // Symmetric from the other ball's point of view
        let hit_b = ball_ball_toi(&b, &a, 2.0, &tol()).unwrap();
        assert_eq!(hit.time, hit_b.time);
    }

    #[test]
    fn test_ball_ball_slow_pair_waits() {
        let a = SweptSphere::new(Vec3::ZERO, Vec3::new(1.0e-5, 0.0, 0.0), 25.0);
        let b = SweptSphere::new(Vec3::new(100.0, 0.0, 0.0), Vec3::ZERO, 25.0);
        assert!(ball_ball_toi(&a, &b, 1.0, &tol()).is_none());
    }

    #[test]
    fn test_ball_ball_receding_overlap_is_not_a_hit() {
        let a = SweptSphere::new(Vec3::ZERO, Vec3::new(-0.05, 0.0, 0.0), 25.0);
        let b = SweptSphere::new(Vec3::new(49.996, 0.0, 0.0), Vec3::ZERO, 25.0);
        assert!(ball_ball_toi(&a, &b, 1.0, &tol()).is_none());
        assert!(ball_ball_toi(&b, &a, 1.0, &tol()).is_none());
    }

    #[test]
    fn test_ball_ball_coincident_is_not_a_hit() {
        let a = SweptSphere::new(Vec3::ZERO, Vec3::X, 25.0);
        assert!(ball_ball_toi(&a, &a, 1.0, &tol()).is_none());
    }

    #[test]
    fn test_bounds() {
        let line = HitShape::LineZ(HitLineZ {
            x: 1.0,
            y: 2.0,
            z_low: 10.0,
            z_high: 0.0,
        });
        let b = line.bounds();
        assert_eq!(b.min, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(b.max, Vec3::new(1.0, 2.0, 10.0));
        assert_eq!(floor().bounds(), Aabb::EVERYTHING);
    }
}
