//! Structural and cross-reference validation
//!
//! All validation happens at construction time; the collision path trusts
//! the encoding afterwards and indexes the stream without re-checking.
//! Every error carries the indices needed to point at the offending entry.

use std::fmt;

use crate::world::level::Level;

/// Validation failure. Construction is atomic: any of these aborts the
/// build and no level is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidateError {
    /// Polygon record with 1 or 2 vertices.
    InvalidPolygonSize {
        chunk: usize,
        position: usize,
        count: u32,
    },
    /// Zero vertex count before the final stream entry.
    MisplacedTerminator { chunk: usize, position: usize },
    /// Stream ended without a closing zero record.
    MissingTerminator { chunk: usize },
    /// Polygon record references a material past the material table.
    MaterialOutOfBounds {
        chunk: usize,
        position: usize,
        index: u32,
    },
    /// Polygon record references a vertex past the chunk's vertex pool.
    VertexOutOfBounds {
        chunk: usize,
        position: usize,
        index: u32,
    },
    /// Chunk portal-index entry past the portal table.
    PortalIndexOutOfBounds {
        chunk: usize,
        slot: usize,
        index: u32,
    },
    /// Portal side references a chunk past the chunk table.
    ChunkIndexOutOfBounds {
        portal: usize,
        side: usize,
        index: u32,
    },
    /// Portal vertex pair references a vertex past its side's vertex pool.
    PairVertexOutOfBounds {
        portal: usize,
        pair: usize,
        side: usize,
        index: u32,
    },
    /// Material name longer than the 63-byte limit.
    MaterialNameTooLong { material: usize, length: usize },
}

impl fmt::Display for ValidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidateError::InvalidPolygonSize { chunk, position, count } => write!(
                f,
                "chunk {} polygon stream [{}]: polygon size {} (minimum 3)",
                chunk, position, count
            ),
            ValidateError::MisplacedTerminator { chunk, position } => write!(
                f,
                "chunk {} polygon stream [{}]: terminator before end of stream",
                chunk, position
            ),
            ValidateError::MissingTerminator { chunk } => {
                write!(f, "chunk {} polygon stream: missing terminator", chunk)
            }
            ValidateError::MaterialOutOfBounds { chunk, position, index } => write!(
                f,
                "chunk {} polygon stream [{}]: material index {} out of bounds",
                chunk, position, index
            ),
            ValidateError::VertexOutOfBounds { chunk, position, index } => write!(
                f,
                "chunk {} polygon stream [{}]: vertex index {} out of bounds",
                chunk, position, index
            ),
            ValidateError::PortalIndexOutOfBounds { chunk, slot, index } => write!(
                f,
                "chunk {} portal_indices[{}]: portal index {} out of bounds",
                chunk, slot, index
            ),
            ValidateError::ChunkIndexOutOfBounds { portal, side, index } => write!(
                f,
                "portal {} side {}: chunk index {} out of bounds",
                portal, side, index
            ),
            ValidateError::PairVertexOutOfBounds { portal, pair, side, index } => write!(
                f,
                "portal {} pair {} side {}: vertex index {} out of bounds",
                portal, pair, side, index
            ),
            ValidateError::MaterialNameTooLong { material, length } => write!(
                f,
                "material {}: name is {} bytes (maximum 63)",
                material, length
            ),
        }
    }
}

impl std::error::Error for ValidateError {}

/// Decoder states for the packed polygon stream.
enum StreamState {
    WantCount,
    WantMaterial { count: u32 },
    WantVertex { remaining: u32 },
}

/// Replay a chunk's polygon stream against its vertex pool and the level's
/// material table.
///
/// A zero vertex count closes the stream and is only valid as the final
/// entry; counts of 1 or 2 are rejected; material and vertex indices are
/// bounds-checked as they stream past.
pub fn validate_polygon_stream(
    stream: &[u32],
    vertex_count: usize,
    material_count: usize,
    chunk: usize,
) -> Result<(), ValidateError> {
    let mut state = StreamState::WantCount;
    for (position, &value) in stream.iter().enumerate() {
        match state {
            StreamState::WantCount => {
                if value == 0 {
                    if position + 1 != stream.len() {
                        return Err(ValidateError::MisplacedTerminator { chunk, position });
                    }
                    return Ok(());
                }
                if value < 3 {
                    return Err(ValidateError::InvalidPolygonSize {
                        chunk,
                        position,
                        count: value,
                    });
                }
                state = StreamState::WantMaterial { count: value };
            }
            StreamState::WantMaterial { count } => {
                if value as usize >= material_count {
                    return Err(ValidateError::MaterialOutOfBounds {
                        chunk,
                        position,
                        index: value,
                    });
                }
                state = StreamState::WantVertex { remaining: count };
            }
            StreamState::WantVertex { remaining } => {
                if value as usize >= vertex_count {
                    return Err(ValidateError::VertexOutOfBounds {
                        chunk,
                        position,
                        index: value,
                    });
                }
                state = if remaining == 1 {
                    StreamState::WantCount
                } else {
                    StreamState::WantVertex {
                        remaining: remaining - 1,
                    }
                };
            }
        }
    }
    Err(ValidateError::MissingTerminator { chunk })
}

/// Cross-reference validation over a fully populated level: polygon
/// streams, chunk portal indices, portal chunk indices and portal vertex
/// pairs. Material name lengths are enforced at `set_material` time.
pub fn validate_level(level: &Level) -> Result<(), ValidateError> {
    let chunk_count = level.chunk_count();
    let portal_count = level.portal_count();
    let material_count = level.material_count();

    for chunk_index in 0..chunk_count {
        let chunk = level.chunk(chunk_index);
        let vertex_count = level.chunk_vertices(chunk).len();
        validate_polygon_stream(
            level.chunk_polygon_stream(chunk),
            vertex_count,
            material_count,
            chunk_index,
        )?;

        for (slot, &portal_index) in level.chunk_portal_indices(chunk).iter().enumerate() {
            if portal_index as usize >= portal_count {
                return Err(ValidateError::PortalIndexOutOfBounds {
                    chunk: chunk_index,
                    slot,
                    index: portal_index,
                });
            }
        }
    }

    for portal_index in 0..portal_count {
        let portal = level.portal(portal_index);
        for (side, &chunk_index) in portal.chunk_indices.iter().enumerate() {
            if chunk_index as usize >= chunk_count {
                return Err(ValidateError::ChunkIndexOutOfBounds {
                    portal: portal_index,
                    side,
                    index: chunk_index,
                });
            }
        }

        let side_vertex_counts = [
            level
                .chunk_vertices(level.chunk(portal.chunk_indices[0] as usize))
                .len(),
            level
                .chunk_vertices(level.chunk(portal.chunk_indices[1] as usize))
                .len(),
        ];
        for (i, &vertex_index) in level.portal_vertex_pairs(portal).iter().enumerate() {
            let side = i % 2;
            if vertex_index as usize >= side_vertex_counts[side] {
                return Err(ValidateError::PairVertexOutOfBounds {
                    portal: portal_index,
                    pair: i / 2,
                    side,
                    index: vertex_index,
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_stream() {
        // one triangle, one quad, terminator
        let stream = [3, 0, 0, 1, 2, 4, 1, 0, 1, 2, 3, 0];
        assert!(validate_polygon_stream(&stream, 4, 2, 0).is_ok());
    }

    #[test]
    fn test_terminator_only() {
        assert!(validate_polygon_stream(&[0], 0, 0, 0).is_ok());
    }

    #[test]
    fn test_polygon_size_one_rejected() {
        let stream = [1, 0, 0, 0];
        let err = validate_polygon_stream(&stream, 4, 1, 2).unwrap_err();
        assert_eq!(
            err,
            ValidateError::InvalidPolygonSize {
                chunk: 2,
                position: 0,
                count: 1
            }
        );
    }

    #[test]
    fn test_polygon_size_two_rejected_at_position() {
        let stream = [3, 0, 0, 1, 2, 2, 0, 0, 1, 0];
        let err = validate_polygon_stream(&stream, 4, 1, 0).unwrap_err();
        assert_eq!(
            err,
            ValidateError::InvalidPolygonSize {
                chunk: 0,
                position: 5,
                count: 2
            }
        );
    }

    #[test]
    fn test_missing_terminator() {
        let stream = [3, 0, 0, 1, 2];
        let err = validate_polygon_stream(&stream, 4, 1, 1).unwrap_err();
        assert_eq!(err, ValidateError::MissingTerminator { chunk: 1 });
    }

    #[test]
    fn test_empty_stream_missing_terminator() {
        let err = validate_polygon_stream(&[], 0, 0, 0).unwrap_err();
        assert_eq!(err, ValidateError::MissingTerminator { chunk: 0 });
    }

    #[test]
    fn test_misplaced_terminator() {
        let stream = [0, 3, 0, 0, 1, 2, 0];
        let err = validate_polygon_stream(&stream, 4, 1, 0).unwrap_err();
        assert_eq!(
            err,
            ValidateError::MisplacedTerminator {
                chunk: 0,
                position: 0
            }
        );
    }

    #[test]
    fn test_material_out_of_bounds() {
        let stream = [3, 5, 0, 1, 2, 0];
        let err = validate_polygon_stream(&stream, 4, 2, 0).unwrap_err();
        assert_eq!(
            err,
            ValidateError::MaterialOutOfBounds {
                chunk: 0,
                position: 1,
                index: 5
            }
        );
    }

    #[test]
    fn test_vertex_out_of_bounds() {
        let stream = [3, 0, 0, 9, 2, 0];
        let err = validate_polygon_stream(&stream, 4, 1, 0).unwrap_err();
        assert_eq!(
            err,
            ValidateError::VertexOutOfBounds {
                chunk: 0,
                position: 3,
                index: 9
            }
        );
    }

    #[test]
    fn test_truncated_record_missing_terminator() {
        // count says 4 vertices but the stream ends after 2
        let stream = [4, 0, 0, 1];
        let err = validate_polygon_stream(&stream, 4, 1, 0).unwrap_err();
        assert_eq!(err, ValidateError::MissingTerminator { chunk: 0 });
    }
}
