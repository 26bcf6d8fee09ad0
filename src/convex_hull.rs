//! # Incremental Convex Hull Construction
//!
//! Builds a triangulated 3D convex hull by inserting points one at a time
//! (beneath-beyond):
//!
//! 1. **Seeding**: pick four points in general position and raise the
//!    initial tetrahedron
//! 2. **Growth**: for each remaining point, collect the faces it sees, walk
//!    the horizon separating them from the rest, and replace the visible
//!    patch with a cone of new faces apexed at the point
//! 3. **Cleanup**: promote cone faces into the horizon edges, drop dead
//!    entities, and prune vertices swallowed by the hull
//!
//! Orientation tests use the raw triple product against the insertion
//! tolerance, so the effective tolerance scales with face area.
//!
//! ## Complexity
//!
//! | Operation        | Complexity    | Notes                         |
//! |------------------|---------------|-------------------------------|
//! | Insert point     | O(F + E)      | Visibility sweep + cone build |
//! | Build            | O(N·(F + E))  | N input points                |
//! | Validation       | O(F·V)        | Convexity sweep dominates     |
//! | Surface extract  | O(F) expected | Spatial-hash deduplication    |

#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]

use glam::DVec3;
use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::plane::{Classification, HullSurface, Plane, PlaneHash};
use crate::triangle::Triangle;

const EPSILON: f64 = 1e-7;

// TYPE-SAFE INDICES

/// Index of a vertex slot. Stable for the life of the hull.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexIdx(pub usize);

/// Index of an edge slot. Freed slots may be reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIdx(pub usize);

/// Index of a face slot. Freed slots may be reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FaceIdx(pub usize);

// MESH ENTITIES

/// An input point with its lifecycle flags.
#[derive(Clone, Copy, Debug)]
struct Vertex {
    point: DVec3,
    /// Already consumed by the insertion sweep (seed corner or grown).
    processed: bool,
    /// Currently an endpoint of at least one hull edge.
    on_hull: bool,
}

impl Vertex {
    const fn new(point: DVec3) -> Self {
        Self {
            point,
            processed: false,
            on_hull: false,
        }
    }
}

/// An undirected edge joining two vertices. A closed hull keeps exactly
/// two adjacent faces per edge.
#[derive(Clone, Copy, Debug)]
struct Edge {
    ends: (VertexIdx, VertexIdx),
    faces: [Option<FaceIdx>; 2],
}

impl Edge {
    const fn new(a: VertexIdx, b: VertexIdx) -> Self {
        Self {
            ends: (a, b),
            faces: [None, None],
        }
    }

    /// Record an adjacent face in the first free slot. False when both
    /// slots are already taken.
    fn attach_face(&mut self, face: FaceIdx) -> bool {
        for slot in &mut self.faces {
            if slot.is_none() {
                *slot = Some(face);
                return true;
            }
        }
        false
    }

    /// Endpoint pair in index order, for keyed comparisons.
    const fn canonical_ends(ends: (VertexIdx, VertexIdx)) -> (VertexIdx, VertexIdx) {
        if ends.0 .0 <= ends.1 .0 {
            ends
        } else {
            (ends.1, ends.0)
        }
    }
}

/// A triangular face. Corners wind counter-clockwise seen from outside the
/// hull; edge slot `i` joins corners `i` and `(i + 1) % 3`.
#[derive(Clone, Copy, Debug)]
struct Face {
    vertices: [VertexIdx; 3],
    edges: [EdgeIdx; 3],
}

/// The order in which `face` traverses the edge joining `ends`, or None
/// when the face does not contain that edge.
fn winding_order(face: &Face, ends: (VertexIdx, VertexIdx)) -> Option<(VertexIdx, VertexIdx)> {
    for i in 0..3 {
        let a = face.vertices[i];
        let b = face.vertices[(i + 1) % 3];
        if (a, b) == ends || (b, a) == ends {
            return Some((a, b));
        }
    }
    None
}

/// Per-insertion working state, reset at the start of every insertion.
/// Kept on the hull so the flag arrays are allocated once, not per point.
#[derive(Clone, Debug, Default)]
struct InsertScratch {
    /// Cone edge raised for a horizon vertex this step, by vertex slot.
    cone_edge: Vec<Option<EdgeIdx>>,
    /// Replacement face awaiting promotion, by horizon edge slot.
    pending_face: Vec<Option<FaceIdx>>,
    /// Faces the apex sees, by face slot.
    visible: Vec<bool>,
    /// Edges that lost both faces, by edge slot.
    dead: Vec<bool>,
}

impl InsertScratch {
    fn reset(&mut self, vertices: usize, edges: usize, faces: usize) {
        self.cone_edge.clear();
        self.cone_edge.resize(vertices, None);
        self.pending_face.clear();
        self.pending_face.resize(edges, None);
        self.visible.clear();
        self.visible.resize(faces, false);
        self.dead.clear();
        self.dead.resize(edges, false);
    }
}

// ERRORS

/// Input rejection: the point set cannot seed a 3-dimensional hull.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InputError {
    /// Fewer than four input points.
    TooFewPoints { count: usize },
    /// All points lie on a single line (or coincide).
    Collinear,
    /// All points lie on a single plane.
    Coplanar,
}

impl std::fmt::Display for InputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooFewPoints { count } => {
                write!(f, "Need at least 4 points to build a hull, got {count}")
            }
            Self::Collinear => write!(f, "Input points are collinear"),
            Self::Coplanar => write!(f, "Input points are coplanar"),
        }
    }
}

impl std::error::Error for InputError {}

/// Topology validation errors.
///
/// These indicate inconsistencies in the hull mesh that result from
/// numerical issues or bugs in the insertion algorithm.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TopologyError {
    /// Edge without exactly two live adjacent faces.
    OpenEdge { edge: EdgeIdx, live_faces: usize },
    /// Edge references a freed vertex.
    DanglingEdge {
        edge: EdgeIdx,
        missing_vertex: VertexIdx,
    },
    /// Face references a freed vertex.
    DanglingFace { face: FaceIdx },
    /// Face and edge disagree about their adjacency.
    AdjacencyMismatch { face: FaceIdx, edge: EdgeIdx },
    /// Edge asked to adopt a third face.
    SaturatedEdge { edge: EdgeIdx },
    /// Two edges join the same endpoint pair.
    DuplicateEdge { ends: (VertexIdx, VertexIdx) },
    /// A vertex lies strictly outside a face.
    ConvexityViolation { face: FaceIdx, vertex: VertexIdx },
    /// Euler characteristic differs from 2.
    EulerMismatch {
        vertices: usize,
        edges: usize,
        faces: usize,
        actual: i32,
    },
}

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenEdge { edge, live_faces } => {
                write!(f, "Edge {edge:?} has {live_faces} live faces (need exactly 2)")
            }
            Self::DanglingEdge {
                edge,
                missing_vertex,
            } => {
                write!(f, "Edge {edge:?} references freed vertex {missing_vertex:?}")
            }
            Self::DanglingFace { face } => {
                write!(f, "Face {face:?} references a freed vertex")
            }
            Self::AdjacencyMismatch { face, edge } => {
                write!(f, "Face {face:?} and edge {edge:?} disagree about adjacency")
            }
            Self::SaturatedEdge { edge } => {
                write!(f, "Edge {edge:?} already has two faces")
            }
            Self::DuplicateEdge { ends } => {
                write!(f, "Duplicate edge for vertices {ends:?}")
            }
            Self::ConvexityViolation { face, vertex } => {
                write!(f, "Vertex {vertex:?} lies strictly outside face {face:?}")
            }
            Self::EulerMismatch {
                vertices,
                edges,
                faces,
                actual,
            } => {
                write!(
                    f,
                    "Euler mismatch: V={vertices}, E={edges}, F={faces}, χ={actual} (expected 2)"
                )
            }
        }
    }
}

impl std::error::Error for TopologyError {}

/// Any failure surfaced while building or validating a hull.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HullError {
    Input(InputError),
    Topology(TopologyError),
}

impl std::fmt::Display for HullError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(e) => write!(f, "{e}"),
            Self::Topology(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for HullError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Input(e) => Some(e),
            Self::Topology(e) => Some(e),
        }
    }
}

impl From<InputError> for HullError {
    fn from(err: InputError) -> Self {
        Self::Input(err)
    }
}

impl From<TopologyError> for HullError {
    fn from(err: TopologyError) -> Self {
        Self::Topology(err)
    }
}

// MAIN STRUCTURE - The incremental convex hull

/// An incrementally constructed triangulated convex hull.
///
/// # Design Decisions
///
/// **Sparse storage**: entity arrays use `Option<T>` slots, with free lists
/// for edges and faces. Indices handed out stay valid for the life of the
/// hull; vertex slots in particular are never reused, so a [`VertexIdx`]
/// always names the same input point.
///
/// **Raw orientation predicate**: visibility and containment use the
/// unnormalized triple product, so the working tolerance scales with face
/// area rather than true distance.
///
/// **Reusable scratch**: the per-insertion flag arrays live on the hull and
/// are reset per point instead of reallocated.
///
/// **Lazy surfaces**: deduplicated boundary planes are extracted on first
/// use and cached.
///
/// # Example
///
/// ```
/// use hull_surge::ConvexHull;
/// use hull_surge::math::DVec3;
///
/// let points = [
///     DVec3::new(0.0, 0.0, 0.0),
///     DVec3::new(1.0, 0.0, 0.0),
///     DVec3::new(0.0, 1.0, 0.0),
///     DVec3::new(0.0, 0.0, 1.0),
/// ];
/// let hull = ConvexHull::build(&points)?;
/// assert_eq!(hull.face_count(), 4);
/// # Ok::<(), hull_surge::HullError>(())
/// ```
#[derive(Clone, Debug)]
pub struct ConvexHull {
    // Core mesh (sparse arrays)
    vertices: Vec<Option<Vertex>>,
    edges: Vec<Option<Edge>>,
    faces: Vec<Option<Face>>,

    // Free lists for O(1) slot reuse
    edge_free_list: Vec<EdgeIdx>,
    face_free_list: Vec<FaceIdx>,

    // Reusable per-insertion state
    scratch: InsertScratch,

    epsilon: f64,
    input_points: usize,

    // Cached surface extraction
    surfaces: Vec<HullSurface>,
    surfaces_dirty: bool,
}

impl ConvexHull {
    // CONSTRUCTION

    /// Build the hull of `points` with the default tolerance.
    pub fn build(points: &[DVec3]) -> Result<Self, HullError> {
        Self::build_with_epsilon(points, EPSILON)
    }

    /// Build with a custom numerical tolerance.
    pub fn build_with_epsilon(points: &[DVec3], epsilon: f64) -> Result<Self, HullError> {
        if points.len() < 4 {
            return Err(InputError::TooFewPoints {
                count: points.len(),
            }
            .into());
        }

        let mut hull = Self {
            vertices: points.iter().map(|&p| Some(Vertex::new(p))).collect(),
            edges: Vec::new(),
            faces: Vec::new(),
            edge_free_list: Vec::new(),
            face_free_list: Vec::new(),
            scratch: InsertScratch::default(),
            epsilon,
            input_points: points.len(),
            surfaces: Vec::new(),
            surfaces_dirty: true,
        };
        hull.construct(points)?;
        Ok(hull)
    }

    fn construct(&mut self, points: &[DVec3]) -> Result<(), HullError> {
        let apex = self.seed_simplex(points)?;
        self.mark_processed(apex);
        self.insert_point(apex, points[apex.0])?;

        while let Some((apex, point)) = self.take_unprocessed() {
            self.insert_point(apex, point)?;
        }
        Ok(())
    }

    /// Find four points in general position and raise the seed hull: a
    /// doubled triangle over the first three, ready to grow toward the
    /// fourth (returned as the first apex).
    ///
    /// The forward scans are complete: a point rejected by one stage can
    /// never satisfy a later one.
    fn seed_simplex(&mut self, points: &[DVec3]) -> Result<VertexIdx, InputError> {
        let p0 = points[0];

        let i1 = (1..points.len())
            .find(|&i| (points[i] - p0).length() > self.epsilon)
            .ok_or(InputError::Collinear)?;
        let p1 = points[i1];

        let i2 = (i1 + 1..points.len())
            .find(|&i| (p1 - p0).cross(points[i] - p0).length() > self.epsilon)
            .ok_or(InputError::Collinear)?;
        let p2 = points[i2];
        let seed_normal = (p1 - p0).cross(p2 - p0);

        let i3 = (i2 + 1..points.len())
            .find(|&i| (points[i] - p0).dot(seed_normal).abs() > self.epsilon)
            .ok_or(InputError::Coplanar)?;

        let (v0, v1, v2) = (VertexIdx(0), VertexIdx(i1), VertexIdx(i2));
        for v in [v0, v1, v2] {
            self.mark_processed(v);
        }

        let e01 = self.alloc_edge(Edge::new(v0, v1));
        let e12 = self.alloc_edge(Edge::new(v1, v2));
        let e20 = self.alloc_edge(Edge::new(v2, v0));

        // Two coincident faces with opposite windings close the mesh, so
        // the first insertion is an ordinary cone step
        let front = self.alloc_face(Face {
            vertices: [v0, v1, v2],
            edges: [e01, e12, e20],
        });
        let back = self.alloc_face(Face {
            vertices: [v2, v1, v0],
            edges: [e12, e01, e20],
        });
        for e in [e01, e12, e20] {
            if let Some(edge) = self.edges[e.0].as_mut() {
                edge.faces = [Some(front), Some(back)];
            }
        }

        Ok(VertexIdx(i3))
    }

    /// Pick the next unconsumed input vertex, marking it processed.
    fn take_unprocessed(&mut self) -> Option<(VertexIdx, DVec3)> {
        let (idx, point) = self.vertices.iter().enumerate().find_map(|(i, slot)| {
            slot.as_ref()
                .filter(|v| !v.processed)
                .map(|v| (VertexIdx(i), v.point))
        })?;
        self.mark_processed(idx);
        Some((idx, point))
    }

    fn mark_processed(&mut self, v: VertexIdx) {
        if let Some(vertex) = self.vertices[v.0].as_mut() {
            vertex.processed = true;
        }
    }

    /// Grow the hull toward `apex`. If no face sees the point it lies
    /// inside the current hull and its slot is freed instead.
    fn insert_point(&mut self, apex: VertexIdx, point: DVec3) -> Result<(), TopologyError> {
        let (nv, ne, nf) = (self.vertices.len(), self.edges.len(), self.faces.len());
        self.scratch.reset(nv, ne, nf);

        // Phase 1: faces the point sees strictly from outside
        let mut visible_count = 0usize;
        for i in 0..nf {
            let Some(face) = &self.faces[i] else { continue };
            let tri = self
                .triangle_of(face)
                .ok_or(TopologyError::DanglingFace { face: FaceIdx(i) })?;
            if tri.classify(point, self.epsilon) == Classification::Outside {
                self.scratch.visible[i] = true;
                visible_count += 1;
            }
        }

        if visible_count == 0 {
            self.free_vertex(apex);
            return Ok(());
        }

        // Phase 2: horizon sweep. An edge with exactly one visible face
        // lies on the horizon; one with two visible faces dies with them.
        // No allocation happens here, so slot indices stay stable.
        let mut horizon: Vec<(EdgeIdx, FaceIdx)> = Vec::new();
        for i in 0..ne {
            let Some(edge) = &self.edges[i] else { continue };
            let live = edge.faces.iter().flatten().count();
            let [Some(fa), Some(fb)] = edge.faces else {
                return Err(TopologyError::OpenEdge {
                    edge: EdgeIdx(i),
                    live_faces: live,
                });
            };
            let a_vis = self.scratch.visible[fa.0];
            let b_vis = self.scratch.visible[fb.0];
            if a_vis && b_vis {
                self.scratch.dead[i] = true;
            } else if a_vis {
                horizon.push((EdgeIdx(i), fa));
            } else if b_vis {
                horizon.push((EdgeIdx(i), fb));
            }
        }

        // Phase 3: build the replacement cone. Each new face traverses its
        // horizon edge in the same direction the dying face did, which
        // keeps the outward winding.
        for &(edge_idx, old_face) in &horizon {
            let Some(ends) = self.edges[edge_idx.0].as_ref().map(|e| e.ends) else {
                continue;
            };
            let Some(face) = self.faces[old_face.0].as_ref() else {
                continue;
            };
            let (u, w) = winding_order(face, ends).ok_or(TopologyError::AdjacencyMismatch {
                face: old_face,
                edge: edge_idx,
            })?;

            let ue = self.cone_edge(u, apex);
            let we = self.cone_edge(w, apex);
            let new_face = self.alloc_face(Face {
                vertices: [u, w, apex],
                edges: [edge_idx, we, ue],
            });

            for e in [we, ue] {
                let attached = self.edges[e.0]
                    .as_mut()
                    .is_some_and(|edge| edge.attach_face(new_face));
                if !attached {
                    // A pinched horizon visits a vertex more than twice
                    return Err(TopologyError::SaturatedEdge { edge: e });
                }
            }
            self.scratch.pending_face[edge_idx.0] = Some(new_face);
        }

        self.cleanup(&horizon)
    }

    /// Reuse or raise the cone edge joining a horizon vertex to the apex.
    fn cone_edge(&mut self, rim: VertexIdx, apex: VertexIdx) -> EdgeIdx {
        if let Some(e) = self.scratch.cone_edge[rim.0] {
            return e;
        }
        let e = self.alloc_edge(Edge::new(rim, apex));
        self.scratch.cone_edge[rim.0] = Some(e);
        e
    }

    /// Swap promoted cone faces into the horizon edges, drop dead entities,
    /// and refresh the on-hull vertex flags.
    fn cleanup(&mut self, horizon: &[(EdgeIdx, FaceIdx)]) -> Result<(), TopologyError> {
        // Each horizon edge trades its dying face for the cone face
        for &(edge_idx, old_face) in horizon {
            let Some(new_face) = self.scratch.pending_face[edge_idx.0].take() else {
                continue;
            };
            let Some(edge) = self.edges[edge_idx.0].as_mut() else {
                continue;
            };
            let slot = edge
                .faces
                .iter()
                .position(|&f| f == Some(old_face))
                .ok_or(TopologyError::AdjacencyMismatch {
                    face: old_face,
                    edge: edge_idx,
                })?;
            edge.faces[slot] = Some(new_face);
        }

        // Edges that lost both faces
        for i in 0..self.scratch.dead.len() {
            if self.scratch.dead[i] {
                self.free_edge(EdgeIdx(i));
            }
        }

        // The faces the apex replaced. Slots allocated for cone faces this
        // step were never marked visible, so they survive.
        for i in 0..self.scratch.visible.len() {
            if self.scratch.visible[i] {
                self.free_face(FaceIdx(i));
            }
        }

        // Refresh hull membership from the surviving edges
        for vertex in self.vertices.iter_mut().flatten() {
            vertex.on_hull = false;
        }
        for i in 0..self.edges.len() {
            let Some(edge) = &self.edges[i] else { continue };
            let (a, b) = edge.ends;
            for v in [a, b] {
                self.vertices
                    .get_mut(v.0)
                    .and_then(Option::as_mut)
                    .ok_or(TopologyError::DanglingEdge {
                        edge: EdgeIdx(i),
                        missing_vertex: v,
                    })?
                    .on_hull = true;
            }
        }

        // Processed vertices that lost hull membership are interior for
        // good and can be dropped
        for i in 0..self.vertices.len() {
            let interior = self.vertices[i]
                .as_ref()
                .is_some_and(|v| v.processed && !v.on_hull);
            if interior {
                self.free_vertex(VertexIdx(i));
            }
        }

        Ok(())
    }

    // STORAGE MANAGEMENT

    /// Allocate a new edge slot, reusing holes if available.
    fn alloc_edge(&mut self, edge: Edge) -> EdgeIdx {
        if let Some(idx) = self.edge_free_list.pop() {
            self.edges[idx.0] = Some(edge);
            idx
        } else {
            let idx = EdgeIdx(self.edges.len());
            self.edges.push(Some(edge));
            idx
        }
    }

    /// Remove an edge, adding its slot to the free list.
    fn free_edge(&mut self, idx: EdgeIdx) {
        if self.edges[idx.0].is_some() {
            self.edges[idx.0] = None;
            self.edge_free_list.push(idx);
        }
    }

    /// Allocate a new face slot, reusing holes if available.
    fn alloc_face(&mut self, face: Face) -> FaceIdx {
        if let Some(idx) = self.face_free_list.pop() {
            self.faces[idx.0] = Some(face);
            idx
        } else {
            let idx = FaceIdx(self.faces.len());
            self.faces.push(Some(face));
            idx
        }
    }

    /// Remove a face, adding its slot to the free list.
    fn free_face(&mut self, idx: FaceIdx) {
        if self.faces[idx.0].is_some() {
            self.faces[idx.0] = None;
            self.face_free_list.push(idx);
        }
    }

    /// Vertex slots are tombstoned, never reused: indices keep naming the
    /// same input point.
    fn free_vertex(&mut self, idx: VertexIdx) {
        self.vertices[idx.0] = None;
    }

    // BASIC QUERIES

    /// Number of vertices on the hull boundary.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.iter().flatten().count()
    }

    /// Number of live edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    /// Number of live faces.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.iter().flatten().count()
    }

    /// Number of input points the hull was built from, interior and
    /// duplicate points included.
    #[must_use]
    pub const fn point_count(&self) -> usize {
        self.input_points
    }

    /// The numerical tolerance the hull was built with.
    #[must_use]
    pub const fn epsilon(&self) -> f64 {
        self.epsilon
    }

    fn triangle_of(&self, face: &Face) -> Option<Triangle> {
        let point = |v: VertexIdx| {
            self.vertices
                .get(v.0)
                .and_then(Option::as_ref)
                .map(|vert| vert.point)
        };
        let [a, b, c] = face.vertices;
        Some(Triangle::new(point(a)?, point(b)?, point(c)?))
    }

    /// The triangle spanned by a face, or None for a freed slot.
    #[must_use]
    pub fn face_triangle(&self, face: FaceIdx) -> Option<Triangle> {
        let f = self.faces.get(face.0).and_then(Option::as_ref)?;
        self.triangle_of(f)
    }

    /// Iterate live faces as (index, triangle) pairs.
    pub fn faces(&self) -> impl Iterator<Item = (FaceIdx, Triangle)> + '_ {
        self.faces.iter().enumerate().filter_map(|(i, slot)| {
            let face = slot.as_ref()?;
            Some((FaceIdx(i), self.triangle_of(face)?))
        })
    }

    /// Iterate the boundary triangles.
    pub fn triangles(&self) -> impl Iterator<Item = Triangle> + '_ {
        self.faces().map(|(_, tri)| tri)
    }

    /// The points remaining on the hull boundary.
    #[must_use]
    pub fn hull_points(&self) -> Vec<DVec3> {
        self.vertices.iter().flatten().map(|v| v.point).collect()
    }

    // CONTAINMENT

    /// True when the point lies inside the hull or on its boundary.
    ///
    /// Tests the raw orientation predicate against every face, so the
    /// boundary tolerance scales with face area.
    #[must_use]
    pub fn in_hull(&self, point: DVec3) -> bool {
        self.triangles()
            .all(|tri| tri.classify(point, self.epsilon) != Classification::Outside)
    }

    /// Containment against the deduplicated surface planes instead of the
    /// raw faces. The tolerance acts on true distances here, so grazing
    /// answers can differ from [`Self::in_hull`] on large or sliver faces.
    pub fn in_surf_hull(&mut self, point: DVec3) -> bool {
        self.ensure_surfaces();
        self.surfaces
            .iter()
            .all(|s| s.plane.classify(point, self.epsilon) != Classification::Outside)
    }

    // VALIDATION

    /// True when the mesh passes full validation. See [`Self::validate`].
    #[must_use]
    pub fn is_convex(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check structural and geometric invariants:
    ///
    /// 1. every face references live vertices and edges, edge slot `i`
    ///    joins corners `i` and `i + 1`, and each edge lists the face back
    /// 2. every edge references live endpoints and exactly two live faces
    /// 3. no two edges join the same endpoint pair
    /// 4. no live vertex lies strictly outside any face
    /// 5. the Euler characteristic V − E + F equals 2
    pub fn validate(&self) -> Result<(), TopologyError> {
        // Check 1: face adjacency
        for (i, slot) in self.faces.iter().enumerate() {
            let Some(face) = slot else { continue };
            let idx = FaceIdx(i);
            if self.triangle_of(face).is_none() {
                return Err(TopologyError::DanglingFace { face: idx });
            }
            for k in 0..3 {
                let a = face.vertices[k];
                let b = face.vertices[(k + 1) % 3];
                let edge_idx = face.edges[k];
                let Some(edge) = self.edges.get(edge_idx.0).and_then(Option::as_ref) else {
                    return Err(TopologyError::AdjacencyMismatch {
                        face: idx,
                        edge: edge_idx,
                    });
                };
                let joins = edge.ends == (a, b) || edge.ends == (b, a);
                if !joins || !edge.faces.contains(&Some(idx)) {
                    return Err(TopologyError::AdjacencyMismatch {
                        face: idx,
                        edge: edge_idx,
                    });
                }
            }
        }

        // Check 2: edge endpoints and the two-face invariant
        for (i, slot) in self.edges.iter().enumerate() {
            let Some(edge) = slot else { continue };
            let idx = EdgeIdx(i);
            let (a, b) = edge.ends;
            for v in [a, b] {
                if self.vertices.get(v.0).and_then(Option::as_ref).is_none() {
                    return Err(TopologyError::DanglingEdge {
                        edge: idx,
                        missing_vertex: v,
                    });
                }
            }
            let live_faces = edge
                .faces
                .iter()
                .flatten()
                .filter(|f| self.faces.get(f.0).and_then(Option::as_ref).is_some())
                .count();
            if live_faces != 2 {
                return Err(TopologyError::OpenEdge {
                    edge: idx,
                    live_faces,
                });
            }
        }

        // Check 3: no duplicate edges
        if let Some(ends) = self
            .edges
            .iter()
            .flatten()
            .map(|edge| Edge::canonical_ends(edge.ends))
            .duplicates()
            .next()
        {
            return Err(TopologyError::DuplicateEdge { ends });
        }

        // Check 4: convexity. A face's own corners classify On, so no
        // special-casing is needed.
        for (i, slot) in self.faces.iter().enumerate() {
            let Some(face) = slot else { continue };
            let Some(tri) = self.triangle_of(face) else {
                return Err(TopologyError::DanglingFace { face: FaceIdx(i) });
            };
            for (vi, vertex) in self.vertices.iter().enumerate() {
                let Some(vertex) = vertex else { continue };
                if tri.classify(vertex.point, self.epsilon) == Classification::Outside {
                    return Err(TopologyError::ConvexityViolation {
                        face: FaceIdx(i),
                        vertex: VertexIdx(vi),
                    });
                }
            }
        }

        // Check 5: Euler characteristic
        let v = self.vertex_count();
        let e = self.edge_count();
        let f = self.face_count();
        let euler = v as i32 - e as i32 + f as i32;
        if euler != 2 {
            return Err(TopologyError::EulerMismatch {
                vertices: v,
                edges: e,
                faces: f,
                actual: euler,
            });
        }

        Ok(())
    }

    // SURFACE EXTRACTION

    /// Extract the deduplicated boundary planes, numbered sequentially from
    /// `start_id` (clamped to a minimum of 1). When several faces share a
    /// plane the earliest face wins. The result is cached. Ids saturate at
    /// `u32::MAX` instead of wrapping.
    pub fn create_surfaces(&mut self, start_id: u32) -> &[HullSurface] {
        let start = start_id.max(1);
        let mut hash = PlaneHash::new(self.epsilon);
        let mut planes = Vec::new();
        for tri in self.triangles() {
            if let Some(plane) = tri.plane(self.epsilon)
                && hash.insert_if_unique(plane)
            {
                planes.push(plane);
            }
        }

        self.surfaces = planes
            .into_iter()
            .enumerate()
            .map(|(k, plane)| HullSurface {
                id: start.saturating_add(k as u32),
                plane,
            })
            .collect();
        self.surfaces_dirty = false;
        &self.surfaces
    }

    fn ensure_surfaces(&mut self) {
        if self.surfaces_dirty {
            self.create_surfaces(1);
        }
    }

    /// The most recently extracted surfaces. Empty before any extraction.
    #[must_use]
    pub fn surfaces(&self) -> &[HullSurface] {
        &self.surfaces
    }

    /// The deduplicated boundary planes, extracting surfaces if needed.
    pub fn planes(&mut self) -> Vec<Plane> {
        self.ensure_surfaces();
        self.surfaces.iter().map(|s| s.plane).collect()
    }

    // HULL-VS-HULL QUERIES

    /// First pair of intersecting faces between two hulls, if any. The
    /// first index names a face of `self`, the second a face of `other`.
    #[must_use]
    pub fn intersect_hull(&self, other: &Self) -> Option<(FaceIdx, FaceIdx)> {
        for (i, mine) in self.faces() {
            for (j, theirs) in other.faces() {
                if mine.intersects(&theirs, self.epsilon) {
                    return Some((i, j));
                }
            }
        }
        None
    }

    /// The faces of `other` that intersect at least one face of `self`.
    #[must_use]
    pub fn intersect_hull_faces(&self, other: &Self) -> Vec<Triangle> {
        other
            .faces()
            .filter(|(_, theirs)| {
                self.triangles()
                    .any(|mine| mine.intersects(theirs, self.epsilon))
            })
            .map(|(_, tri)| tri)
            .collect()
    }

    /// Drop candidates whose supporting planes already occur among this
    /// hull's surfaces, or earlier in the candidate list. Degenerate
    /// candidates are dropped as well. Returns the retained count.
    pub fn retain_unmatched(&mut self, candidates: &mut Vec<Triangle>) -> usize {
        self.ensure_surfaces();
        let mut hash = PlaneHash::new(self.epsilon);
        for surface in &self.surfaces {
            hash.insert(surface.plane);
        }
        let eps = self.epsilon;
        candidates.retain(|tri| {
            tri.plane(eps)
                .is_some_and(|plane| hash.insert_if_unique(plane))
        });
        candidates.len()
    }

    // MESH EXPORT

    /// Flatten the hull into an indexed triangle mesh. Vertices are
    /// compacted and faces keep their outward winding.
    #[must_use]
    pub fn to_mesh(&self) -> (Vec<DVec3>, Vec<[u32; 3]>) {
        let mut points = Vec::new();
        let mut remap: FxHashMap<VertexIdx, u32> = FxHashMap::default();
        let mut triangles = Vec::new();

        let mut intern = |v: VertexIdx, point: DVec3| -> u32 {
            *remap.entry(v).or_insert_with(|| {
                let id = points.len() as u32;
                points.push(point);
                id
            })
        };

        for face in self.faces.iter().flatten() {
            let resolve = |v: VertexIdx| {
                self.vertices
                    .get(v.0)
                    .and_then(Option::as_ref)
                    .map(|vert| vert.point)
            };
            let [a, b, c] = face.vertices;
            let (Some(pa), Some(pb), Some(pc)) = (resolve(a), resolve(b), resolve(c)) else {
                continue;
            };
            triangles.push([intern(a, pa), intern(b, pb), intern(c, pc)]);
        }

        (points, triangles)
    }
}
