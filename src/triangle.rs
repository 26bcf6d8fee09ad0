//! Triangle facets and their geometric predicates.
//!
//! [`Triangle`] is a plain value type: three corners in counter-clockwise
//! winding when viewed from the outward side. It carries the predicates the
//! hull algorithm and the hull-vs-hull queries are built on:
//!
//! - [`Triangle::classify`]: which side of the facet a point sees (the
//!   visibility test driving hull growth and containment)
//! - [`Triangle::classify_in_plane`]: barycentric in-triangle test for
//!   points already on the supporting plane
//! - [`Triangle::intersects`]: positive-measure triangle overlap, edges
//!   parametrized against the other triangle's plane

use glam::{DVec2, DVec3};

use crate::plane::{Classification, Plane};

/// A triangle in 3-space, corners in counter-clockwise winding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    /// Corner points in winding order.
    pub points: [DVec3; 3],
}

impl Triangle {
    /// Build a triangle from three corners in winding order.
    #[inline]
    #[must_use]
    pub const fn new(a: DVec3, b: DVec3, c: DVec3) -> Self {
        Self { points: [a, b, c] }
    }

    /// Unnormalized normal: cross product of the first two edges. Its length
    /// is twice the triangle area.
    #[inline]
    #[must_use]
    pub fn normal(&self) -> DVec3 {
        let [a, b, c] = self.points;
        (b - a).cross(c - a)
    }

    #[inline]
    #[must_use]
    pub fn centroid(&self) -> DVec3 {
        let [a, b, c] = self.points;
        (a + b + c) / 3.0
    }

    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        0.5 * self.normal().length()
    }

    /// Supporting plane with the winding-outward normal, or None for a
    /// degenerate triangle.
    #[must_use]
    pub fn plane(&self, epsilon: f64) -> Option<Plane> {
        let [a, b, c] = self.points;
        Plane::from_points(a, b, c, epsilon)
    }

    /// Classify a point against the supporting plane: Outside means the
    /// point sees the counter-clockwise (outward) side.
    ///
    /// Uses the raw triple product, so the working tolerance scales with
    /// twice the triangle's area.
    #[must_use]
    pub fn classify(&self, point: DVec3, epsilon: f64) -> Classification {
        let d = (point - self.points[0]).dot(self.normal());
        if d > epsilon {
            Classification::Outside
        } else if d < -epsilon {
            Classification::Inside
        } else {
            Classification::On
        }
    }

    /// The two coordinate axes that survive dropping the dominant normal
    /// component.
    fn planar_axes(&self) -> (usize, usize) {
        let n = self.normal().abs();
        if n.x >= n.y && n.x >= n.z {
            (1, 2)
        } else if n.y >= n.z {
            (0, 2)
        } else {
            (0, 1)
        }
    }

    /// Barycentric in-triangle test for a point on the supporting plane:
    /// Inside the triangle, On its boundary, or Outside.
    ///
    /// The point is projected into 2D by dropping the dominant normal axis,
    /// which keeps the projection well-conditioned for any facet
    /// orientation. A degenerate triangle classifies everything Outside.
    #[must_use]
    pub fn classify_in_plane(&self, point: DVec3, epsilon: f64) -> Classification {
        let (u, v) = self.planar_axes();
        let flat = |p: DVec3| DVec2::new(p[u], p[v]);
        let [a, b, c] = self.points;

        let v0 = flat(c) - flat(a);
        let v1 = flat(b) - flat(a);
        let v2 = flat(point) - flat(a);

        let dot00 = v0.dot(v0);
        let dot01 = v0.dot(v1);
        let dot02 = v0.dot(v2);
        let dot11 = v1.dot(v1);
        let dot12 = v1.dot(v2);

        // denom is the squared cross product of the edge vectors, so the
        // degeneracy gate compares squared units
        let denom = dot00 * dot11 - dot01 * dot01;
        if denom <= epsilon * epsilon {
            return Classification::Outside;
        }
        let inv = 1.0 / denom;
        let s = (dot11 * dot02 - dot01 * dot12) * inv;
        let t = (dot00 * dot12 - dot01 * dot02) * inv;

        if s > epsilon && t > epsilon && s + t < 1.0 - epsilon {
            Classification::Inside
        } else if s < -epsilon || t < -epsilon || s + t > 1.0 + epsilon {
            Classification::Outside
        } else {
            Classification::On
        }
    }

    /// Test whether two triangles intersect with positive measure.
    ///
    /// Contact counts only when the triangles truly cross (a transversal
    /// contact of positive length) or overlap coplanar with positive area.
    /// Touching at a single vertex or grazing along an edge does not count.
    #[must_use]
    pub fn intersects(&self, other: &Self, epsilon: f64) -> bool {
        let (Some(pa), Some(pb)) = (self.plane(epsilon), other.plane(epsilon)) else {
            return false;
        };

        if pa.normal.cross(pb.normal).length() <= epsilon {
            // Parallel supports: only coincident planes can still touch
            let coincident = if pa.normal.dot(pb.normal) > 0.0 {
                (pa.offset - pb.offset).abs() <= epsilon
            } else {
                (pa.offset + pb.offset).abs() <= epsilon
            };
            return coincident && self.coplanar_overlap(other, epsilon);
        }

        self.pierces(other, &pb, epsilon) || other.pierces(self, &pa, epsilon)
    }

    /// True when `self` crosses `target`'s plane along a span reaching
    /// `target`'s interior.
    fn pierces(&self, target: &Self, target_plane: &Plane, epsilon: f64) -> bool {
        let d = self.points.map(|p| target_plane.signed_distance(p));
        let mut crossings: Vec<DVec3> = Vec::with_capacity(2);

        // Edges strictly straddling the plane
        for i in 0..3 {
            let j = (i + 1) % 3;
            if (d[i] > epsilon && d[j] < -epsilon) || (d[i] < -epsilon && d[j] > epsilon) {
                let t = d[i] / (d[i] - d[j]);
                crossings.push(self.points[i].lerp(self.points[j], t));
            }
        }

        // A corner on the plane counts as a crossing only when the other
        // two corners sit strictly on opposite sides; grazing contacts
        // contribute nothing
        for k in 0..3 {
            if d[k].abs() <= epsilon {
                let a = d[(k + 1) % 3];
                let b = d[(k + 2) % 3];
                if (a > epsilon && b < -epsilon) || (a < -epsilon && b > epsilon) {
                    crossings.push(self.points[k]);
                }
            }
        }

        if crossings
            .iter()
            .any(|&hit| target.classify_in_plane(hit, epsilon) == Classification::Inside)
        {
            return true;
        }

        // Both crossing points can land exactly on the target's boundary
        // while the open span between them runs through its interior
        if let [q0, q1] = crossings[..] {
            return target.classify_in_plane(q0.midpoint(q1), epsilon) == Classification::Inside;
        }

        false
    }

    /// Positive-area overlap test for triangles with coincident supports.
    fn coplanar_overlap(&self, other: &Self, epsilon: f64) -> bool {
        // A corner of one strictly inside the other
        if self
            .points
            .iter()
            .any(|&p| other.classify_in_plane(p, epsilon) == Classification::Inside)
            || other
                .points
                .iter()
                .any(|&p| self.classify_in_plane(p, epsilon) == Classification::Inside)
        {
            return true;
        }

        // A centroid reaching the other triangle covers coincident and
        // equal-footprint overlaps that the corner tests miss
        if other.classify_in_plane(self.centroid(), epsilon) != Classification::Outside
            || self.classify_in_plane(other.centroid(), epsilon) != Classification::Outside
        {
            return true;
        }

        // Any pair of boundary edges crossing properly
        for i in 0..3 {
            for j in 0..3 {
                if segments_cross(
                    self.points[i],
                    self.points[(i + 1) % 3],
                    other.points[j],
                    other.points[(j + 1) % 3],
                    epsilon,
                ) {
                    return true;
                }
            }
        }

        false
    }
}

/// Proper crossing test for two coplanar segments: both interpolation
/// parameters must land strictly inside (0, 1). Parallel and collinear
/// pairs never cross properly.
fn segments_cross(p1: DVec3, p2: DVec3, q1: DVec3, q2: DVec3, epsilon: f64) -> bool {
    let u = p2 - p1;
    let v = q2 - q1;
    let w = p1 - q1;

    let a = u.dot(u);
    let b = u.dot(v);
    let c = v.dot(v);
    let d = u.dot(w);
    let e = v.dot(w);

    // Squared cross product of the two directions, gated in squared units
    let denom = a * c - b * b;
    if denom <= epsilon * epsilon {
        return false;
    }

    let s = (b * e - c * d) / denom;
    let t = (a * e - b * d) / denom;

    s > epsilon && s < 1.0 - epsilon && t > epsilon && t < 1.0 - epsilon
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-7;

    fn xy_triangle() -> Triangle {
        Triangle::new(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(4.0, 0.0, 0.0),
            DVec3::new(0.0, 4.0, 0.0),
        )
    }

    #[test]
    fn test_normal_and_area() {
        let tri = xy_triangle();
        assert!(tri.normal().abs_diff_eq(DVec3::new(0.0, 0.0, 16.0), 1e-12));
        assert!((tri.area() - 8.0).abs() < 1e-12);
        assert!(
            tri.centroid()
                .abs_diff_eq(DVec3::new(4.0 / 3.0, 4.0 / 3.0, 0.0), 1e-12)
        );
    }

    #[test]
    fn test_classify_sides() {
        let tri = xy_triangle();
        assert_eq!(
            tri.classify(DVec3::new(0.2, 0.2, 1.0), EPS),
            Classification::Outside
        );
        assert_eq!(
            tri.classify(DVec3::new(0.2, 0.2, -1.0), EPS),
            Classification::Inside
        );
        // On means on the supporting plane, even far from the triangle
        assert_eq!(
            tri.classify(DVec3::new(50.0, 50.0, 0.0), EPS),
            Classification::On
        );
    }

    #[test]
    fn test_classify_in_plane() {
        let tri = xy_triangle();
        assert_eq!(
            tri.classify_in_plane(DVec3::new(1.0, 1.0, 0.0), EPS),
            Classification::Inside
        );
        assert_eq!(
            tri.classify_in_plane(DVec3::new(2.0, 0.0, 0.0), EPS),
            Classification::On
        );
        assert_eq!(
            tri.classify_in_plane(DVec3::new(4.0, 4.0, 0.0), EPS),
            Classification::Outside
        );
        assert_eq!(
            tri.classify_in_plane(DVec3::new(-0.5, 2.0, 0.0), EPS),
            Classification::Outside
        );
    }

    #[test]
    fn test_classify_in_plane_degenerate() {
        let line = Triangle::new(
            DVec3::ZERO,
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(2.0, 2.0, 2.0),
        );
        assert_eq!(
            line.classify_in_plane(DVec3::new(1.0, 1.0, 1.0), EPS),
            Classification::Outside
        );
    }

    #[test]
    fn test_transversal_crossing() {
        let flat = xy_triangle();
        // Vertical triangle whose lower corner dips through the interior
        let needle = Triangle::new(
            DVec3::new(1.0, 1.0, -1.0),
            DVec3::new(2.0, 1.0, 1.0),
            DVec3::new(0.0, 1.0, 1.0),
        );
        assert!(flat.intersects(&needle, EPS));
        assert!(needle.intersects(&flat, EPS));
    }

    #[test]
    fn test_small_scale_transversal_crossing() {
        // Millimetre-scale geometry: the in-plane denominators are quartic
        // in edge length and must not trip the degeneracy gate
        let s = 0.0025;
        let flat = Triangle::new(
            DVec3::ZERO,
            DVec3::new(4.0 * s, 0.0, 0.0),
            DVec3::new(0.0, 4.0 * s, 0.0),
        );
        let needle = Triangle::new(
            DVec3::new(1.0, 1.0, -1.0) * s,
            DVec3::new(2.0, 1.0, 1.0) * s,
            DVec3::new(0.0, 1.0, 1.0) * s,
        );
        assert!(flat.intersects(&needle, EPS));
        assert!(needle.intersects(&flat, EPS));
    }

    #[test]
    fn test_corner_pierce() {
        let flat = xy_triangle();
        // One corner exactly on the plane inside the flat triangle, the
        // other two on opposite sides; the off-plane edge crosses outside
        let spike = Triangle::new(
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(8.0, 1.0, 2.0),
            DVec3::new(6.0, 1.0, -2.0),
        );
        assert!(flat.intersects(&spike, EPS));
        assert!(spike.intersects(&flat, EPS));
    }

    #[test]
    fn test_aligned_crossing_detected() {
        let flat = xy_triangle();
        // Both plane-crossing points land on the flat triangle's boundary,
        // yet the span between them runs through both interiors
        let ridge = Triangle::new(
            DVec3::new(-1.0, 1.0, -1.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(5.0, 1.0, -1.0),
        );
        assert!(flat.intersects(&ridge, EPS));
        assert!(ridge.intersects(&flat, EPS));
    }

    #[test]
    fn test_edge_graze_rejected() {
        let flat = xy_triangle();
        // One edge lies in the flat triangle's plane, apex above: contact
        // is a line segment, not a crossing
        let tent = Triangle::new(
            DVec3::new(0.5, 0.5, 0.0),
            DVec3::new(2.0, 0.5, 0.0),
            DVec3::new(1.0, 0.5, 3.0),
        );
        assert!(!flat.intersects(&tent, EPS));
        assert!(!tent.intersects(&flat, EPS));
    }

    #[test]
    fn test_coplanar_disjoint() {
        let a = xy_triangle();
        let b = Triangle::new(
            DVec3::new(10.0, 10.0, 0.0),
            DVec3::new(14.0, 10.0, 0.0),
            DVec3::new(10.0, 14.0, 0.0),
        );
        assert!(!a.intersects(&b, EPS));
        assert!(!b.intersects(&a, EPS));
    }

    #[test]
    fn test_shared_vertex_only() {
        let a = Triangle::new(DVec3::ZERO, DVec3::new(1.0, 0.0, 0.0), DVec3::new(0.0, 1.0, 0.0));
        // Coplanar, touching at the origin only
        let b = Triangle::new(DVec3::ZERO, DVec3::new(-1.0, 0.0, 0.0), DVec3::new(0.0, -1.0, 0.0));
        assert!(!a.intersects(&b, EPS));

        // Same corner contact, tilted out of plane
        let c = Triangle::new(DVec3::ZERO, DVec3::new(-1.0, 0.0, 1.0), DVec3::new(0.0, -1.0, 1.0));
        assert!(!a.intersects(&c, EPS));
        assert!(!c.intersects(&a, EPS));
    }

    #[test]
    fn test_shared_edge_rejected() {
        // Two halves of a diagonally split square share an edge but no area
        let a = Triangle::new(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
        );
        let b = Triangle::new(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(0.0, 1.0, 0.0),
        );
        assert!(!a.intersects(&b, EPS));
        assert!(!b.intersects(&a, EPS));
    }

    #[test]
    fn test_coincident_triangles() {
        let a = xy_triangle();
        let b = a;
        assert!(a.intersects(&b, EPS));
    }

    #[test]
    fn test_nested_coplanar() {
        let outer = xy_triangle();
        let inner = Triangle::new(
            DVec3::new(0.5, 0.5, 0.0),
            DVec3::new(1.5, 0.5, 0.0),
            DVec3::new(0.5, 1.5, 0.0),
        );
        assert!(outer.intersects(&inner, EPS));
        assert!(inner.intersects(&outer, EPS));
    }

    #[test]
    fn test_coplanar_sliver_cross() {
        // Two thin slivers crossing each other: no corner or centroid of
        // either falls inside the other, only edges cross
        let horizontal = Triangle::new(
            DVec3::new(-4.0, 0.1, 0.0),
            DVec3::new(4.0, 0.1, 0.0),
            DVec3::new(1.7, 0.6, 0.0),
        );
        let vertical = Triangle::new(
            DVec3::new(0.0, -4.0, 0.0),
            DVec3::new(0.0, 4.0, 0.0),
            DVec3::new(0.5, 0.0, 0.0),
        );
        assert!(horizontal.intersects(&vertical, EPS));
        assert!(vertical.intersects(&horizontal, EPS));
    }

    #[test]
    fn test_small_scale_sliver_cross() {
        // Same crossing slivers shrunk a thousandfold: the segment crossing
        // solver's denominator shrinks with the fourth power of the scale
        let s = 1e-3;
        let horizontal = Triangle::new(
            DVec3::new(-4.0, 0.1, 0.0) * s,
            DVec3::new(4.0, 0.1, 0.0) * s,
            DVec3::new(1.7, 0.6, 0.0) * s,
        );
        let vertical = Triangle::new(
            DVec3::new(0.0, -4.0, 0.0) * s,
            DVec3::new(0.0, 4.0, 0.0) * s,
            DVec3::new(0.5, 0.0, 0.0) * s,
        );
        assert!(horizontal.intersects(&vertical, EPS));
        assert!(vertical.intersects(&horizontal, EPS));
    }

    #[test]
    fn test_parallel_offset() {
        let a = xy_triangle();
        let b = Triangle::new(
            DVec3::new(0.0, 0.0, 1.0),
            DVec3::new(4.0, 0.0, 1.0),
            DVec3::new(0.0, 4.0, 1.0),
        );
        assert!(!a.intersects(&b, EPS));
    }

    #[test]
    fn test_degenerate_never_intersects() {
        let a = xy_triangle();
        let line = Triangle::new(
            DVec3::new(1.0, 1.0, -1.0),
            DVec3::new(1.0, 1.0, 1.0),
            DVec3::new(1.0, 1.0, 3.0),
        );
        assert!(!a.intersects(&line, EPS));
        assert!(!line.intersects(&a, EPS));
    }

    #[test]
    fn test_intersects_is_symmetric() {
        let fixtures = [
            xy_triangle(),
            Triangle::new(
                DVec3::new(1.0, 1.0, -1.0),
                DVec3::new(2.0, 1.0, 1.0),
                DVec3::new(0.0, 1.0, 1.0),
            ),
            Triangle::new(
                DVec3::new(10.0, 10.0, 0.0),
                DVec3::new(14.0, 10.0, 0.0),
                DVec3::new(10.0, 14.0, 0.0),
            ),
            Triangle::new(
                DVec3::new(0.5, 0.5, 0.0),
                DVec3::new(1.5, 0.5, 0.0),
                DVec3::new(0.5, 1.5, 0.0),
            ),
            Triangle::new(
                DVec3::new(0.0, -4.0, 0.0),
                DVec3::new(0.0, 4.0, 0.0),
                DVec3::new(0.5, 0.0, 0.0),
            ),
            Triangle::new(
                DVec3::new(-1.0, 1.0, -1.0),
                DVec3::new(1.0, 1.0, 1.0),
                DVec3::new(5.0, 1.0, -1.0),
            ),
        ];

        for a in &fixtures {
            for b in &fixtures {
                assert_eq!(a.intersects(b, EPS), b.intersects(a, EPS));
            }
        }
    }
}
