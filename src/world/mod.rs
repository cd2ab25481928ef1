//! Level geometry: chunks, portals, materials
//!
//! Levels are authored as a [`LevelSpec`], built into an arena-backed
//! [`Level`] through [`build`], and validated on the way in. The
//! collision primitive [`polygon_aabb_mtv`] operates on the packed
//! polygon streams the level stores.

mod builder;
mod geometry;
mod level;
mod validate;

pub use builder::{
    build, load_level, load_level_from_str, save_level_spec, ChunkSpec, LevelError, LevelSpec,
    PortalSpec, VertexSpec,
};
pub use geometry::polygon_aabb_mtv;
pub use level::{Chunk, Level, Material, Portal, Vertex, MATERIAL_NAME_MAX_LENGTH};
pub use validate::{validate_level, validate_polygon_stream, ValidateError};
