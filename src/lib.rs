//! # `hull_surge`
//!
//! Fast incremental 3D convex hull construction with **face-level
//! intersection tests** between finished hulls.
//!
//! ## What is this?
//!
//! The convex hull of a point cloud is the smallest convex solid containing
//! every point. This crate builds it **one point at a time** as a closed
//! triangle mesh (vertices, edges, faces with full adjacency), then answers
//! questions about the result: containment, convexity, the deduplicated
//! bounding planes, and whether two hulls' boundaries genuinely cross.
//!
//! ## Quick Start
//!
//! ```rust
//! use hull_surge::ConvexHull;
//! use hull_surge::math::DVec3;
//!
//! // Eight corners of a unit cube
//! let mut points = Vec::new();
//! for x in [0.0, 1.0] {
//!     for y in [0.0, 1.0] {
//!         for z in [0.0, 1.0] {
//!             points.push(DVec3::new(x, y, z));
//!         }
//!     }
//! }
//!
//! let mut hull = ConvexHull::build(&points).unwrap();
//!
//! assert_eq!(hull.vertex_count(), 8);   // Cube has 8 corners
//! assert_eq!(hull.face_count(), 12);    // Two triangles per square side
//! assert!(hull.is_convex());
//! assert!(hull.in_hull(DVec3::new(0.5, 0.5, 0.5)));
//!
//! // The twelve triangles reduce to six numbered boundary planes
//! let surfaces = hull.create_surfaces(1);
//! assert_eq!(surfaces.len(), 6);
//! assert_eq!(surfaces[0].id, 1);
//! ```
//!
//! ## Key Features
//!
//! - **Incremental construction**: `O(F + E)` visibility sweep and cone
//!   replacement per inserted point
//! - **Manifold bookkeeping**: every edge keeps exactly two faces, and
//!   `validate()` checks adjacency, convexity, and the Euler count
//! - **Surface extraction**: coplanar triangles merge into numbered planes
//!   via spatial hashing over plane coefficients
//! - **Hull-vs-hull intersection**: positive-measure triangle contact, so
//!   corner touches and edge grazes do not count
//!
//! ## When to Use
//!
//! - Bounding volumes for containment and overlap tests
//! - Turning convex point clouds into half-space descriptions
//! - Collision queries between convex solids at face granularity
//!
//! ## When NOT to Use
//!
//! - Exact arithmetic required (we use f64 with epsilon tolerance)
//! - Degenerate inputs: fewer than four points, or all collinear or
//!   coplanar sets are rejected with an error
//! - Millions of points (the visibility sweep is linear per insertion)
//!
//! ## Algorithm
//!
//! Construction is beneath-beyond: each new point deletes the faces it
//! sees and stitches a cone of fresh faces over the horizon loop that
//! separated the visible patch from the hidden side. A point seen by no
//! face is interior and is dropped. Surfaces then come from merging
//! coplanar triangles through a grid hash of plane coefficients.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod convex_hull;
mod plane;
mod triangle;

pub use convex_hull::{
    ConvexHull, EdgeIdx, FaceIdx, HullError, InputError, TopologyError, VertexIdx,
};

pub use plane::{Classification, HullSurface, Plane};

pub use triangle::Triangle;

/// Re-export glam types for convenience
pub mod math {
    pub use glam::{DVec2, DVec3};
}
