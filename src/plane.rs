//! Planes in Hessian normal form and grid-hashed plane deduplication.
//!
//! A [`Plane`] stores a unit normal `n` and offset `d` describing the plane
//! `{ x : n·x = d }`. Points with `n·x > d` sit on the positive (outward)
//! side. [`PlaneHash`] treats a plane as a point in 4-space `(n, d)` and
//! reuses the grid-cell trick for near-duplicate detection:
//! 1. Quantize the coefficients onto a grid of cells
//! 2. Check that cell plus its 3^4 - 1 neighbors
//! 3. Compare coefficients only against planes in those cells
//!
//! This avoids O(n) comparisons against all existing planes.

use glam::DVec3;
use hashbrown::HashMap;

const EPSILON: f64 = 1e-7;

/// An oriented plane: `n · x = d` with unit normal `n`.
#[derive(Clone, Copy, Debug)]
pub struct Plane {
    /// Unit normal pointing toward the positive side.
    pub normal: DVec3,
    /// Signed distance from the origin along the normal.
    pub offset: f64,
}

impl Plane {
    /// Create a plane, normalizing the input normal vector.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    #[must_use]
    pub fn new(normal: DVec3, offset: f64) -> Self {
        let len = normal.length();
        assert!(len > EPSILON, "Normal vector must be non-zero");
        Self {
            normal: normal / len,
            offset: offset / len,
        }
    }

    /// Try to create, returning None if the normal is zero.
    #[must_use]
    pub fn try_new(normal: DVec3, offset: f64) -> Option<Self> {
        let len = normal.length();
        (len > EPSILON).then(|| Self {
            normal: normal / len,
            offset: offset / len,
        })
    }

    /// Supporting plane of the triangle `(a, b, c)`, oriented so that the
    /// normal faces the side from which the winding reads counter-clockwise.
    ///
    /// Returns None when the three points are collinear within `epsilon`.
    #[must_use]
    pub fn from_points(a: DVec3, b: DVec3, c: DVec3, epsilon: f64) -> Option<Self> {
        let cross = (b - a).cross(c - a);
        let len = cross.length();
        if len <= epsilon {
            return None;
        }
        let normal = cross / len;
        Some(Self {
            normal,
            offset: normal.dot(a),
        })
    }

    /// Signed distance: negative = behind, zero = on the plane, positive =
    /// in front.
    #[inline]
    #[must_use]
    pub fn signed_distance(&self, point: DVec3) -> f64 {
        self.normal.dot(point) - self.offset
    }

    /// Classify a point: Inside (behind), On (within tolerance), or Outside
    /// (in front).
    #[must_use]
    pub fn classify(&self, point: DVec3, epsilon: f64) -> Classification {
        let d = self.signed_distance(point);
        if d < -epsilon {
            Classification::Inside
        } else if d > epsilon {
            Classification::Outside
        } else {
            Classification::On
        }
    }

    /// Coefficient-wise equality within tolerance. Orientation matters: a
    /// plane and its flipped twin are distinct surfaces.
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.normal.abs_diff_eq(other.normal, epsilon)
            && (self.offset - other.offset).abs() <= epsilon
    }
}

/// Classification of a point relative to a plane or facet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Classification {
    /// Behind the plane: `n·x < d - ε`
    Inside,

    /// On the plane within tolerance: `|n·x - d| ≤ ε`
    On,

    /// In front of the plane: `n·x > d + ε`
    Outside,
}

/// A numbered bounding plane extracted from a finished hull.
#[derive(Clone, Copy, Debug)]
pub struct HullSurface {
    /// Surface identifier, always ≥ 1.
    pub id: u32,
    /// Supporting plane with outward normal.
    pub plane: Plane,
}

/// Grid hash over plane coefficients for duplicate plane detection.
pub(crate) struct PlaneHash {
    cells: HashMap<(i64, i64, i64, i64), Vec<Plane>>,
    cell_size: f64,
    tolerance: f64,
}

impl PlaneHash {
    /// Create a plane hash with the given tolerance.
    ///
    /// Planes whose coefficients agree within `tolerance` are duplicates.
    #[must_use]
    pub(crate) fn new(tolerance: f64) -> Self {
        // Cell size = 2x tolerance ensures duplicates are in adjacent cells
        Self {
            cells: HashMap::new(),
            cell_size: tolerance * 2.0,
            tolerance,
        }
    }

    /// Map a plane to its grid cell indices.
    #[inline]
    fn cell_coords(&self, plane: &Plane) -> (i64, i64, i64, i64) {
        #[allow(clippy::cast_possible_truncation)]
        let discretize = |v: f64| (v / self.cell_size).floor() as i64;
        (
            discretize(plane.normal.x),
            discretize(plane.normal.y),
            discretize(plane.normal.z),
            discretize(plane.offset),
        )
    }

    /// Check if the given plane is within tolerance of any existing plane.
    #[must_use]
    pub(crate) fn is_duplicate(&self, plane: &Plane) -> bool {
        let (cx, cy, cz, cw) = self.cell_coords(plane);

        // Check the 3^4 neighborhood
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    for dw in -1..=1 {
                        if let Some(known) = self.cells.get(&(cx + dx, cy + dy, cz + dz, cw + dw))
                            && known.iter().any(|p| p.approx_eq(plane, self.tolerance))
                        {
                            return true;
                        }
                    }
                }
            }
        }

        false
    }

    /// Insert a plane into the hash (does not check for duplicates).
    pub(crate) fn insert(&mut self, plane: Plane) {
        self.cells
            .entry(self.cell_coords(&plane))
            .or_default()
            .push(plane);
    }

    /// Insert only if not a duplicate. Returns true if inserted.
    pub(crate) fn insert_if_unique(&mut self, plane: Plane) -> bool {
        if self.is_duplicate(&plane) {
            false
        } else {
            self.insert(plane);
            true
        }
    }
}
