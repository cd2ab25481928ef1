//! Runtime simulation: collision queries and entity locomotion

pub mod collision;
pub mod entity;

pub use collision::{dominant_contact, CollisionQuery, Contact};
pub use entity::{Entity, ENTITY_EXTENT};
