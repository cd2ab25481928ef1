//! Collision queries against a chunk's polygon stream
//!
//! [`CollisionQuery`] walks one chunk's packed polygon stream lazily,
//! running the SAT primitive per record and yielding only the polygons that
//! intersect the box. Decoding and testing are interleaved, so memory use
//! is bounded by the largest single polygon, not the polygon count.
//!
//! The query is confined to the box's declared origin chunk. Polygons in
//! neighbouring chunks are not tested even when the box geometrically
//! reaches through a portal; callers must treat the portal sweep as
//! unsupported rather than assume it happens here.

use crate::math::Vec3;
use crate::world::{polygon_aabb_mtv, Level, Vertex};

/// One intersecting polygon: its material plus the minimal translation
/// vector that moves the queried box out of it.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    pub material: u32,
    pub mtv: Vec3,
}

/// Lazy intersection query over a single chunk.
///
/// Holds the chunk's slices, the box, and a stream cursor; restarting means
/// constructing a fresh query. The polygon buffer is scratch space reused
/// across records.
pub struct CollisionQuery<'a> {
    vertices: &'a [Vertex],
    stream: &'a [u32],
    cursor: usize,
    center: Vec3,
    extent: Vec3,
    polygon: Vec<Vec3>,
}

impl<'a> CollisionQuery<'a> {
    /// Query `chunk_index` of `level` with an AABB. An out-of-range chunk
    /// index is a caller contract violation and panics.
    pub fn new(level: &'a Level, chunk_index: u32, center: Vec3, extent: Vec3) -> Self {
        let chunk = level.chunk(chunk_index as usize);
        CollisionQuery {
            vertices: level.chunk_vertices(chunk),
            stream: level.chunk_polygon_stream(chunk),
            cursor: 0,
            center,
            extent,
            polygon: Vec::new(),
        }
    }
}

impl Iterator for CollisionQuery<'_> {
    type Item = Contact;

    fn next(&mut self) -> Option<Contact> {
        let vertices = self.vertices;
        let stream = self.stream;
        loop {
            // stream layout was validated at level build time
            let count = stream[self.cursor] as usize;
            if count == 0 {
                return None;
            }
            let material = stream[self.cursor + 1];
            let indices = &stream[self.cursor + 2..self.cursor + 2 + count];
            self.cursor += 2 + count;

            self.polygon.clear();
            self.polygon
                .extend(indices.iter().map(|&i| vertices[i as usize].position));

            if let Some(mtv) = polygon_aabb_mtv(self.center, self.extent, &self.polygon) {
                return Some(Contact { material, mtv });
            }
        }
    }
}

/// The intersecting polygon with the largest squared MTV, if any.
///
/// Used by the ground probe and the step-up search, where the deepest
/// contact decides the surface the entity is standing on.
pub fn dominant_contact(
    level: &Level,
    chunk_index: u32,
    center: Vec3,
    extent: Vec3,
) -> Option<Contact> {
    let mut best: Option<Contact> = None;
    for contact in CollisionQuery::new(level, chunk_index, center, extent) {
        let better = best
            .as_ref()
            .map_or(true, |b| contact.mtv.len_sq() > b.mtv.len_sq());
        if better {
            best = Some(contact);
        }
    }
    best
}
