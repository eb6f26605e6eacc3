//! Geometric primitives and intersection tests
//!
//! Axis-aligned bounds for the broad phase and triangles for mesh-accurate
//! narrow-phase refinement.

use crate::foundation::math::{transform_point, Mat4, Point3, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Create an AABB from min and max corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing all given points. None for an empty set.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut min = first.coords;
        let mut max = first.coords;
        for p in iter {
            min = min.inf(&p.coords);
            max = max.sup(&p.coords);
        }
        Some(Self { min, max })
    }

    /// Center of the box.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size along each axis.
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Merge with another box.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Overlap test, inclusive at faces.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Exact minimum separation between two boxes; zero when they overlap.
    ///
    /// Computed from the per-axis gaps, so long thin boxes do not over-report
    /// proximity the way center-distance heuristics do.
    pub fn distance_to(&self, other: &Self) -> f32 {
        let gap = |min_a: f32, max_a: f32, min_b: f32, max_b: f32| -> f32 {
            (min_b - max_a).max(min_a - max_b).max(0.0)
        };
        let dx = gap(self.min.x, self.max.x, other.min.x, other.max.x);
        let dy = gap(self.min.y, self.max.y, other.min.y, other.max.y);
        let dz = gap(self.min.z, self.max.z, other.min.z, other.max.z);
        dz.mul_add(dz, dx.mul_add(dx, dy * dy)).sqrt()
    }

    /// World-space box covering this box transformed by `matrix`.
    ///
    /// Transforms the eight corners and refits, which stays tight enough for
    /// pruning without touching the underlying geometry.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];
        let mut min = transform_point(matrix, corners[0]);
        let mut max = min;
        for corner in &corners[1..] {
            let p = transform_point(matrix, *corner);
            min = min.inf(&p);
            max = max.sup(&p);
        }
        Self { min, max }
    }
}

/// A triangle in either local or world space.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    /// First vertex
    pub a: Vec3,
    /// Second vertex
    pub b: Vec3,
    /// Third vertex
    pub c: Vec3,
}

impl Triangle {
    /// Create a triangle.
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// Face normal by the right-hand rule (unnormalized cross product).
    fn face_axis(&self) -> Vec3 {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    /// Transform all vertices by a world matrix.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            a: transform_point(matrix, self.a),
            b: transform_point(matrix, self.b),
            c: transform_point(matrix, self.c),
        }
    }

    /// Closest point on the triangle to `p` (Ericson, Real-Time Collision
    /// Detection 5.1.5).
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        let ab = self.b - self.a;
        let ac = self.c - self.a;
        let ap = p - self.a;

        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.a;
        }

        let bp = p - self.b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= 0.0 && d4 <= d3 {
            return self.b;
        }

        let vc = d1.mul_add(d4, -(d3 * d2));
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return self.a + ab * v;
        }

        let cp = p - self.c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return self.c;
        }

        let vb = d5.mul_add(d2, -(d1 * d6));
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return self.a + ac * w;
        }

        let va = d3.mul_add(d6, -(d5 * d4));
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.b + (self.c - self.b) * w;
        }

        let denom = 1.0 / (va + vb + vc);
        let v = vb * denom;
        let w = vc * denom;
        self.a + ab * v + ac * w
    }

    /// Separating-axis intersection test against another triangle.
    ///
    /// Eleven candidate axes: both face normals plus the nine edge-edge
    /// cross products. Degenerate axes are skipped.
    pub fn intersects(&self, other: &Self) -> bool {
        const EPSILON: f32 = 1e-6;

        fn project(tri: &Triangle, axis: &Vec3) -> (f32, f32) {
            let p0 = axis.dot(&tri.a);
            let p1 = axis.dot(&tri.b);
            let p2 = axis.dot(&tri.c);
            (p0.min(p1).min(p2), p0.max(p1).max(p2))
        }

        let separated_on = |axis: Vec3| -> bool {
            if axis.norm_squared() < EPSILON {
                return false; // degenerate axis carries no information
            }
            let (min_a, max_a) = project(self, &axis);
            let (min_b, max_b) = project(other, &axis);
            max_a < min_b || max_b < min_a
        };

        if separated_on(self.face_axis()) || separated_on(other.face_axis()) {
            return false;
        }

        let edges_a = [self.b - self.a, self.c - self.b, self.a - self.c];
        let edges_b = [other.b - other.a, other.c - other.b, other.a - other.c];
        for ea in &edges_a {
            for eb in &edges_b {
                if separated_on(ea.cross(eb)) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box_at(x: f32) -> Aabb {
        Aabb::new(Vec3::new(x - 0.5, -0.5, -0.5), Vec3::new(x + 0.5, 0.5, 0.5))
    }

    #[test]
    fn aabb_overlap_is_inclusive_at_faces() {
        // Boxes exactly touching at x = 0.5 count as overlapping.
        assert!(unit_box_at(0.0).intersects(&unit_box_at(1.0)));
        assert!(!unit_box_at(0.0).intersects(&unit_box_at(1.001)));
    }

    #[test]
    fn aabb_distance_is_axis_gap() {
        let a = unit_box_at(0.0);
        let b = unit_box_at(3.0);
        assert_relative_eq!(a.distance_to(&b), 2.0);
        assert_relative_eq!(a.distance_to(&unit_box_at(0.25)), 0.0);

        // Diagonal separation combines per-axis gaps.
        let c = Aabb::new(Vec3::new(1.5, 1.5, -0.5), Vec3::new(2.5, 2.5, 0.5));
        assert_relative_eq!(a.distance_to(&c), 2.0_f32.sqrt());
    }

    #[test]
    fn aabb_transform_refits_corners() {
        let b = unit_box_at(0.0);
        let m = Mat4::new_translation(&Vec3::new(2.0, 0.0, 0.0));
        let world = b.transformed(&m);
        assert_relative_eq!(world.center().x, 2.0);
        assert_relative_eq!(world.half_extents().x, 0.5);
    }

    #[test]
    fn triangle_sat_detects_crossing_and_separation() {
        let flat = Triangle::new(
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
        );
        let piercing = Triangle::new(
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.5, 1.0, 0.5),
        );
        let far = Triangle::new(
            Vec3::new(0.0, 5.0, 0.0),
            Vec3::new(1.0, 5.0, 0.0),
            Vec3::new(0.0, 5.0, 1.0),
        );
        assert!(flat.intersects(&piercing));
        assert!(piercing.intersects(&flat));
        assert!(!flat.intersects(&far));
    }

    #[test]
    fn closest_point_regions() {
        let tri = Triangle::new(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        );
        // Above the interior projects straight down.
        let p = tri.closest_point(Vec3::new(0.5, 0.5, 3.0));
        assert_relative_eq!(p.z, 0.0);
        assert_relative_eq!(p.x, 0.5);
        // Outside a vertex clamps to that vertex.
        let p = tri.closest_point(Vec3::new(-1.0, -1.0, 0.0));
        assert_relative_eq!(p.norm(), 0.0);
    }
}
