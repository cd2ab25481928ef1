//! Level construction from authoring data
//!
//! The authoring tool hands the core a [`LevelSpec`]: chunk descriptions
//! (vertices, packed polygon stream, portal indices), portal descriptions
//! and material names. [`build`] turns one into an arena-backed
//! [`Level`], all-or-nothing: validation failures return before any level
//! escapes.
//!
//! Persistence uses RON, written pretty-printed and brotli-compressed,
//! read with auto-detection (plain RON starts with `(` or whitespace,
//! anything else is treated as brotli). The file format carries the
//! *spec*, never the built level.

use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::math::{Vec2, Vec3};
use crate::world::level::{Level, Vertex};
use crate::world::validate::{validate_level, ValidateError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VertexSpec {
    pub position: Vec3,
    pub uv: Vec2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkSpec {
    pub vertices: Vec<VertexSpec>,
    /// Packed records `[count, material, indices...]` plus the zero
    /// terminator, exactly as stored in the level.
    pub polygon_stream: Vec<u32>,
    #[serde(default)]
    pub portal_indices: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSpec {
    pub chunk_indices: [u32; 2],
    pub convex_pairs: Vec<[u32; 2]>,
    #[serde(default)]
    pub additional_pairs: Vec<[u32; 2]>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSpec {
    pub chunks: Vec<ChunkSpec>,
    #[serde(default)]
    pub portals: Vec<PortalSpec>,
    pub materials: Vec<String>,
    #[serde(default = "default_gravity")]
    pub gravity: Vec3,
}

fn default_gravity() -> Vec3 {
    Vec3::new(0.0, -10.0, 0.0)
}

/// Error type for level loading and saving.
#[derive(Debug)]
pub enum LevelError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    Validation(ValidateError),
}

impl From<std::io::Error> for LevelError {
    fn from(e: std::io::Error) -> Self {
        LevelError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for LevelError {
    fn from(e: ron::error::SpannedError) -> Self {
        LevelError::ParseError(e)
    }
}

impl From<ron::Error> for LevelError {
    fn from(e: ron::Error) -> Self {
        LevelError::SerializeError(e)
    }
}

impl From<ValidateError> for LevelError {
    fn from(e: ValidateError) -> Self {
        LevelError::Validation(e)
    }
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::IoError(e) => write!(f, "IO error: {}", e),
            LevelError::ParseError(e) => write!(f, "Parse error: {}", e),
            LevelError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            LevelError::Validation(e) => write!(f, "Validation error: {}", e),
        }
    }
}

impl std::error::Error for LevelError {}

/// Build a validated level from a spec.
///
/// Populates an arena-backed level via the in-place `init_*` operations,
/// then runs structural and cross-reference validation. On any error the
/// partially populated level is dropped; callers only ever see a fully
/// valid [`Level`].
pub fn build(spec: &LevelSpec) -> Result<Level, ValidateError> {
    let mut level = Level::construct(spec.chunks.len(), spec.portals.len(), spec.materials.len());

    for (i, name) in spec.materials.iter().enumerate() {
        level.set_material(i, name)?;
    }

    for (i, chunk) in spec.chunks.iter().enumerate() {
        level.init_chunk(
            i,
            chunk.vertices.len(),
            chunk.polygon_stream.len(),
            chunk.portal_indices.len(),
        );
        for (v, s) in level.chunk_vertices_mut(i).iter_mut().zip(&chunk.vertices) {
            *v = Vertex {
                position: s.position,
                uv: s.uv,
            };
        }
        level
            .chunk_polygon_stream_mut(i)
            .copy_from_slice(&chunk.polygon_stream);
        level
            .chunk_portal_indices_mut(i)
            .copy_from_slice(&chunk.portal_indices);
    }

    for (i, portal) in spec.portals.iter().enumerate() {
        level.init_portal(i, portal.convex_pairs.len(), portal.additional_pairs.len());
        level.set_portal_chunk_indices(i, portal.chunk_indices);
        let pairs = level.portal_vertex_pairs_mut(i);
        for (slot, pair) in portal
            .convex_pairs
            .iter()
            .chain(&portal.additional_pairs)
            .enumerate()
        {
            pairs[slot * 2] = pair[0];
            pairs[slot * 2 + 1] = pair[1];
        }
    }

    level.set_gravity(spec.gravity);

    validate_level(&level)?;

    log::debug!(
        "built level: {} chunks, {} portals, {} materials",
        level.chunk_count(),
        level.portal_count(),
        level.material_count()
    );
    Ok(level)
}

/// Load a level spec from a RON file (compressed or not) and build it.
pub fn load_level<P: AsRef<Path>>(path: P) -> Result<Level, LevelError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;

    // Detect format: RON files start with '(' or whitespace, brotli is binary
    let is_plain_ron = bytes
        .first()
        .map(|&b| b == b'(' || b == b' ' || b == b'\n' || b == b'\r' || b == b'\t')
        .unwrap_or(false);

    let contents = if is_plain_ron {
        String::from_utf8(bytes).map_err(|e| {
            LevelError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8: {}", e),
            ))
        })?
    } else {
        let mut decompressed = Vec::new();
        brotli::BrotliDecompress(&mut Cursor::new(&bytes), &mut decompressed).map_err(|e| {
            LevelError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("brotli decompression failed: {}", e),
            ))
        })?;
        String::from_utf8(decompressed).map_err(|e| {
            LevelError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("invalid UTF-8 after decompression: {}", e),
            ))
        })?
    };

    let spec: LevelSpec = match ron::from_str(&contents) {
        Ok(s) => s,
        Err(e) => {
            let pos = e.position;
            log::warn!(
                "RON parse error in {} at line {} col {}: {}",
                path.display(),
                pos.line,
                pos.col,
                e
            );
            return Err(e.into());
        }
    };

    Ok(build(&spec)?)
}

/// Parse and build a level from a RON string (embedded levels, tests).
pub fn load_level_from_str(s: &str) -> Result<Level, LevelError> {
    let spec: LevelSpec = ron::from_str(s)?;
    Ok(build(&spec)?)
}

/// Save a level spec to a brotli-compressed RON file.
pub fn save_level_spec<P: AsRef<Path>>(spec: &LevelSpec, path: P) -> Result<(), LevelError> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());
    let ron_string = ron::ser::to_string_pretty(spec, config)?;

    // quality 6, window 22 - good balance of speed and ratio
    let mut compressed = Vec::new();
    brotli::BrotliCompress(
        &mut Cursor::new(ron_string.as_bytes()),
        &mut compressed,
        &brotli::enc::BrotliEncoderParams {
            quality: 6,
            lgwin: 22,
            ..Default::default()
        },
    )
    .map_err(|e| {
        LevelError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("brotli compression failed: {}", e),
        ))
    })?;

    fs::write(path, compressed)?;
    Ok(())
}
