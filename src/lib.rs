//! Portal-chunked level geometry with SAT collision and first-person
//! locomotion.
//!
//! The crate is the simulation core of a small 3D engine: levels are
//! chunks of convex polygons linked by portals, all stored in one bump
//! arena ([`arena`]), collision is a polygon-vs-AABB separating axis
//! test ([`world::polygon_aabb_mtv`]) driven lazily over a chunk's
//! polygon stream ([`game::CollisionQuery`]), and [`game::Entity`]
//! layers walking, jumping, step-up and wall sliding on top.
//!
//! Levels are authored as RON ([`world::LevelSpec`]), stored brotli
//! compressed, and validated structurally before any simulation touches
//! them.

pub mod arena;
pub mod game;
pub mod math;
pub mod world;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
