//! Level model
//!
//! A level is a set of chunks (vertex pools plus a packed polygon stream),
//! portals linking chunk pairs through shared vertex loops, and a material
//! table. Everything is allocated from one bump arena: the level owns the
//! arena, the tables are handles into it, and teardown is a single drop.
//!
//! The polygon stream is a packed `u32` sequence of variable-length records
//! `[vertex_count, material_index, vertex_index x vertex_count]` closed by a
//! `vertex_count == 0` sentinel. The validator and the collision query both
//! decode this exact encoding; it is kept packed for locality on the
//! per-tick collision path.
//!
//! Levels are built once through [`crate::world::build`] and never
//! structurally mutated afterwards. The `init_*` operations are public so a
//! host with its own authoring pipeline can populate a level in place, but
//! it then owns running [`crate::world::validate_level`] before use.

use bytemuck::{Pod, Zeroable};

use crate::arena::{Arena, ArenaSlice};
use crate::math::{Vec2, Vec3};
use crate::world::validate::ValidateError;

/// Longest allowed material name, in bytes.
pub const MATERIAL_NAME_MAX_LENGTH: usize = 63;

/// Arena block size for level storage.
pub const LEVEL_ARENA_BLOCK_SIZE: usize = 1 << 22;

/// One chunk vertex: position plus texture coordinate.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
}

/// Chunk record: handles into the level arena.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct Chunk {
    pub(crate) vertices: ArenaSlice<Vertex>,
    pub(crate) polygon_stream: ArenaSlice<u32>,
    pub(crate) portal_indices: ArenaSlice<u32>,
}

/// Portal record linking two chunks.
///
/// `vertex_pairs` is `2 x (convex_pair_count + additional_pair_count)`
/// entries, alternating (vertex index in side 0, vertex index in side 1).
/// The convex pairs come first and must enclose the portal's convex
/// connecting region; the additional pairs weld vertices inside it.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct Portal {
    pub chunk_indices: [u32; 2],
    pub convex_pair_count: u32,
    pub additional_pair_count: u32,
    pub(crate) vertex_pairs: ArenaSlice<u32>,
}

/// Material record with a fixed-size name buffer.
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
#[repr(C)]
pub struct Material {
    name_len: u32,
    name: [u8; MATERIAL_NAME_MAX_LENGTH + 1],
}

impl Material {
    pub fn name(&self) -> &str {
        std::str::from_utf8(&self.name[..self.name_len as usize]).unwrap_or("")
    }
}

/// An immutable, arena-backed level.
#[derive(Debug)]
pub struct Level {
    arena: Arena,
    chunks: ArenaSlice<Chunk>,
    portals: ArenaSlice<Portal>,
    materials: ArenaSlice<Material>,
    gravity: Vec3,
    gravity_dir: Vec3,
}

impl Level {
    /// Reserve storage for the level's top-level tables.
    ///
    /// Chunks and portals start zeroed (empty handles) and are populated in
    /// place with [`Level::init_chunk`] / [`Level::init_portal`].
    pub fn construct(chunk_count: usize, portal_count: usize, material_count: usize) -> Level {
        let mut arena = Arena::new(LEVEL_ARENA_BLOCK_SIZE);
        let chunks = arena.alloc::<Chunk>(chunk_count);
        let portals = arena.alloc::<Portal>(portal_count);
        let materials = arena.alloc::<Material>(material_count);
        let mut level = Level {
            arena,
            chunks,
            portals,
            materials,
            gravity: Vec3::ZERO,
            gravity_dir: Vec3::ZERO,
        };
        level.set_gravity(Vec3::new(0.0, -10.0, 0.0));
        level
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn portal_count(&self) -> usize {
        self.portals.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    /// World gravity vector.
    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Unit gravity direction (zero if gravity is zero).
    pub fn gravity_dir(&self) -> Vec3 {
        self.gravity_dir
    }

    pub fn set_gravity(&mut self, gravity: Vec3) {
        self.gravity = gravity;
        self.gravity_dir = gravity.normalize();
    }

    /// Chunk record by index. Out-of-range indices are a caller contract
    /// violation and panic.
    pub fn chunk(&self, index: usize) -> Chunk {
        self.arena.get(self.chunks)[index]
    }

    pub fn portal(&self, index: usize) -> Portal {
        self.arena.get(self.portals)[index]
    }

    pub fn material(&self, index: usize) -> Material {
        self.arena.get(self.materials)[index]
    }

    pub fn chunk_vertices(&self, chunk: Chunk) -> &[Vertex] {
        self.arena.get(chunk.vertices)
    }

    pub fn chunk_polygon_stream(&self, chunk: Chunk) -> &[u32] {
        self.arena.get(chunk.polygon_stream)
    }

    pub fn chunk_portal_indices(&self, chunk: Chunk) -> &[u32] {
        self.arena.get(chunk.portal_indices)
    }

    pub fn portal_vertex_pairs(&self, portal: Portal) -> &[u32] {
        self.arena.get(portal.vertex_pairs)
    }

    /// Allocate a chunk's storage and install the record.
    pub fn init_chunk(
        &mut self,
        index: usize,
        vertex_count: usize,
        polygon_stream_len: usize,
        portal_index_count: usize,
    ) {
        let vertices = self.arena.alloc::<Vertex>(vertex_count);
        let polygon_stream = self.arena.alloc::<u32>(polygon_stream_len);
        let portal_indices = self.arena.alloc::<u32>(portal_index_count);
        self.arena.get_mut(self.chunks)[index] = Chunk {
            vertices,
            polygon_stream,
            portal_indices,
        };
    }

    /// Allocate a portal's vertex-pair storage and install the record.
    /// The chunk pair is set separately with
    /// [`Level::set_portal_chunk_indices`].
    pub fn init_portal(
        &mut self,
        index: usize,
        convex_pair_count: usize,
        additional_pair_count: usize,
    ) {
        let vertex_pairs = self
            .arena
            .alloc::<u32>(2 * (convex_pair_count + additional_pair_count));
        self.arena.get_mut(self.portals)[index] = Portal {
            chunk_indices: [0, 0],
            convex_pair_count: convex_pair_count as u32,
            additional_pair_count: additional_pair_count as u32,
            vertex_pairs,
        };
    }

    pub fn set_portal_chunk_indices(&mut self, index: usize, chunk_indices: [u32; 2]) {
        self.arena.get_mut(self.portals)[index].chunk_indices = chunk_indices;
    }

    /// Set a material name. Names longer than
    /// [`MATERIAL_NAME_MAX_LENGTH`] bytes are rejected.
    pub fn set_material(&mut self, index: usize, name: &str) -> Result<(), ValidateError> {
        if name.len() > MATERIAL_NAME_MAX_LENGTH {
            return Err(ValidateError::MaterialNameTooLong {
                material: index,
                length: name.len(),
            });
        }
        let record = &mut self.arena.get_mut(self.materials)[index];
        record.name = [0; MATERIAL_NAME_MAX_LENGTH + 1];
        record.name[..name.len()].copy_from_slice(name.as_bytes());
        record.name_len = name.len() as u32;
        Ok(())
    }

    /// Linear scan for a material by name.
    pub fn lookup_material_index(&self, name: &str) -> Option<u32> {
        self.arena
            .get(self.materials)
            .iter()
            .position(|m| m.name() == name)
            .map(|i| i as u32)
    }

    pub fn chunk_vertices_mut(&mut self, index: usize) -> &mut [Vertex] {
        let chunk = self.chunk(index);
        self.arena.get_mut(chunk.vertices)
    }

    pub fn chunk_polygon_stream_mut(&mut self, index: usize) -> &mut [u32] {
        let chunk = self.chunk(index);
        self.arena.get_mut(chunk.polygon_stream)
    }

    pub fn chunk_portal_indices_mut(&mut self, index: usize) -> &mut [u32] {
        let chunk = self.chunk(index);
        self.arena.get_mut(chunk.portal_indices)
    }

    pub fn portal_vertex_pairs_mut(&mut self, index: usize) -> &mut [u32] {
        let portal = self.portal(index);
        self.arena.get_mut(portal.vertex_pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construct_counts() {
        let level = Level::construct(3, 2, 1);
        assert_eq!(level.chunk_count(), 3);
        assert_eq!(level.portal_count(), 2);
        assert_eq!(level.material_count(), 1);
    }

    #[test]
    fn test_default_gravity() {
        let level = Level::construct(0, 0, 0);
        assert_eq!(level.gravity(), Vec3::new(0.0, -10.0, 0.0));
        assert!((level.gravity_dir().y + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_init_chunk_and_populate() {
        let mut level = Level::construct(1, 0, 0);
        level.init_chunk(0, 2, 3, 1);
        level.chunk_vertices_mut(0)[0].position = Vec3::new(1.0, 2.0, 3.0);
        level.chunk_polygon_stream_mut(0).copy_from_slice(&[0, 0, 0]);
        level.chunk_portal_indices_mut(0)[0] = 5;

        let chunk = level.chunk(0);
        assert_eq!(level.chunk_vertices(chunk).len(), 2);
        assert_eq!(level.chunk_vertices(chunk)[0].position.x, 1.0);
        assert_eq!(level.chunk_portal_indices(chunk), &[5]);
    }

    #[test]
    fn test_material_lookup() {
        let mut level = Level::construct(0, 0, 2);
        level.set_material(0, "rock").unwrap();
        level.set_material(1, "metal").unwrap();
        assert_eq!(level.lookup_material_index("metal"), Some(1));
        assert_eq!(level.lookup_material_index("rock"), Some(0));
        assert_eq!(level.lookup_material_index("grass"), None);
    }

    #[test]
    fn test_material_name_too_long() {
        let mut level = Level::construct(0, 0, 1);
        let long = "x".repeat(MATERIAL_NAME_MAX_LENGTH + 1);
        let err = level.set_material(0, &long).unwrap_err();
        match err {
            ValidateError::MaterialNameTooLong { material, length } => {
                assert_eq!(material, 0);
                assert_eq!(length, MATERIAL_NAME_MAX_LENGTH + 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_material_name_max_length_ok() {
        let mut level = Level::construct(0, 0, 1);
        let name = "x".repeat(MATERIAL_NAME_MAX_LENGTH);
        level.set_material(0, &name).unwrap();
        assert_eq!(level.material(0).name(), name);
    }

    #[test]
    fn test_portal_init() {
        let mut level = Level::construct(2, 1, 0);
        level.init_portal(0, 3, 1);
        level.set_portal_chunk_indices(0, [0, 1]);
        level
            .portal_vertex_pairs_mut(0)
            .copy_from_slice(&[0, 1, 2, 3, 4, 5, 6, 7]);

        let portal = level.portal(0);
        assert_eq!(portal.chunk_indices, [0, 1]);
        assert_eq!(portal.convex_pair_count, 3);
        assert_eq!(portal.additional_pair_count, 1);
        assert_eq!(level.portal_vertex_pairs(portal).len(), 8);
    }
}
