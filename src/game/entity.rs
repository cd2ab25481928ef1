//! Entity locomotion
//!
//! One entity is a box (radius 0.5, half height 1.0) living inside a chunk.
//! Each tick runs a fixed pipeline: ground probe, acceleration, jump,
//! then a clip-move that integrates velocity over 8 substeps and resolves
//! collisions by step-up or sliding. The entity's chunk index is not
//! updated by the move; crossing portals is the host's concern for now
//! (see the module note in `game::collision`).
//!
//! The constants below are tuned as a set; changing one changes how the
//! locomotion feels, not just its numerics.

use crate::game::collision::{dominant_contact, CollisionQuery};
use crate::math::{mat4_mul, mat4_rotation_x, mat4_rotation_y, mat4_translation, Mat4, Vec3};
use crate::world::Level;

/// Entity box half-extents: radius 0.5, half height 1.0.
pub const ENTITY_EXTENT: Vec3 = Vec3 { x: 0.5, y: 1.0, z: 0.5 };

/// How far the ground probe is pushed along gravity.
const GROUND_PROBE_EPSILON: f32 = 0.01;

/// dot(gravity_dir, mtv_dir) below this counts as standing ground (~135
/// degrees between gravity and the push).
const GROUND_DOT: f32 = -0.707;

/// dot(gravity_dir, mtv_dir) below this is jumpable: surfaces up to ~80
/// degrees from flat, which allows jumps off steep walls.
const JUMP_DOT: f32 = -0.17;

/// |dot(gravity_dir, mtv_dir)| below this classifies a clip-move contact
/// as wall-like, triggering the step-up search.
const STEP_DOT: f32 = 0.17;

/// Fraction of velocity retained per second while grounded.
const GROUND_DECAY: f32 = 1e-3;

const GROUND_ACCEL: f32 = 30.0;
const AIR_ACCEL: f32 = 5.0;
const JUMP_IMPULSE: f32 = 5.0;

const CLIP_SUBSTEPS: u32 = 8;
/// Contacts with a smaller MTV than this are treated as touching, not
/// penetrating.
const CONTACT_EPSILON: f32 = 1e-6;
/// Re-query passes per substep; resolution normally settles in one or two.
const MAX_RESOLVE_PASSES: u32 = 4;

const STEP_UP_HEIGHT: f32 = 0.5;
const STEP_UP_ITERATIONS: u32 = 6;
/// Lateral probe offset into the wall during the step-up search.
const STEP_UP_NUDGE: f32 = 0.05;

/// A moving box with view angles and per-tick movement intents.
///
/// Intents set through [`Entity::set_move`] are consumed (and zeroed) by
/// the next [`Entity::update`]. The level never references entities; the
/// simulation layer owns them.
#[derive(Debug, Clone)]
pub struct Entity {
    /// Chunk the entity's box is tested against.
    pub chunk: u32,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Degrees.
    pub yaw: f32,
    /// Degrees, clamped to +-90.
    pub pitch: f32,
    /// Set when the ground probe found a surface opposing gravity.
    pub grounded: bool,
    move_forward: f32,
    move_right: f32,
    move_jump: f32,
}

impl Entity {
    pub fn new(chunk: u32, position: Vec3) -> Self {
        Entity {
            chunk,
            position,
            velocity: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            grounded: false,
            move_forward: 0.0,
            move_right: 0.0,
            move_jump: 0.0,
        }
    }

    /// Apply yaw/pitch deltas in degrees; pitch clamps at straight up/down.
    pub fn look(&mut self, dyaw: f32, dpitch: f32) {
        self.yaw += dyaw;
        self.pitch = (self.pitch + dpitch).clamp(-90.0, 90.0);
    }

    /// Store movement intents for the next update.
    pub fn set_move(&mut self, forward: f32, right: f32, jump: f32) {
        self.move_forward = forward;
        self.move_right = right;
        self.move_jump = jump;
    }

    /// Horizontal basis derived from yaw only; pitch never leaks into
    /// ground movement.
    fn move_basis(&self) -> (Vec3, Vec3) {
        let yaw = self.yaw.to_radians();
        let forward = Vec3::new(yaw.sin(), 0.0, -yaw.cos());
        let right = Vec3::new(yaw.cos(), 0.0, yaw.sin());
        (forward, right)
    }

    /// Advance the entity by one tick against `level`.
    pub fn update(&mut self, level: &Level, dt: f32) {
        let gravity_dir = level.gravity_dir();

        // ground probe: the entity box nudged along gravity
        let probe_center = self.position + gravity_dir * GROUND_PROBE_EPSILON;
        let probe = dominant_contact(level, self.chunk, probe_center, ENTITY_EXTENT);
        let probe_normal = probe.as_ref().and_then(|c| {
            if c.mtv.len_sq() > CONTACT_EPSILON * CONTACT_EPSILON {
                Some(c.mtv.normalize())
            } else {
                None
            }
        });

        self.grounded = false;
        if let Some(normal) = probe_normal {
            if gravity_dir.dot(normal) < GROUND_DOT {
                self.grounded = true;
                // ground friction: exponential decay toward rest
                self.velocity = self.velocity * GROUND_DECAY.powf(dt);
            }
        }

        // acceleration
        let (forward, right) = self.move_basis();
        let wish = forward * self.move_forward + right * self.move_right;
        if self.grounded {
            if let Some(normal) = probe_normal {
                // project the intent onto the ground plane; steeper ground
                // gives less grip
                let tangent = normal.cross(wish.cross(normal));
                let grip = -gravity_dir.dot(normal);
                self.velocity += tangent * (GROUND_ACCEL * grip * dt);
            }
        } else {
            self.velocity += level.gravity() * dt;
            self.velocity += wish * (AIR_ACCEL * dt);
        }

        // jump, also off steep-but-not-overhanging surfaces
        if self.move_jump > 0.0 {
            if let Some(normal) = probe_normal {
                if gravity_dir.dot(normal) < JUMP_DOT {
                    self.velocity += normal * (self.move_jump * JUMP_IMPULSE);
                }
            }
        }

        // clip-move
        let substep_dt = dt / CLIP_SUBSTEPS as f32;
        for _ in 0..CLIP_SUBSTEPS {
            self.position += self.velocity * substep_dt;
            self.resolve_collisions(level, gravity_dir);
        }

        self.move_forward = 0.0;
        self.move_right = 0.0;
        self.move_jump = 0.0;
    }

    /// Resolve penetrations at the current position: wall-like contacts
    /// try the step-up search first, everything else slides.
    fn resolve_collisions(&mut self, level: &Level, gravity_dir: Vec3) {
        for _ in 0..MAX_RESOLVE_PASSES {
            let mut resolved_any = false;
            // the query box is fixed at the pass's starting position;
            // contacts found after a slide within the pass use the stale
            // box, so a clean pass is re-checked below
            for contact in CollisionQuery::new(level, self.chunk, self.position, ENTITY_EXTENT) {
                let len = contact.mtv.len();
                if len <= CONTACT_EPSILON {
                    continue;
                }
                let normal = contact.mtv * (1.0 / len);

                if gravity_dir.dot(normal).abs() < STEP_DOT {
                    if let Some(offset) = self.search_step_up(level, gravity_dir, normal) {
                        log::trace!("step-up by {:?}", offset);
                        self.position += offset;
                        // the substep ends on a successful step-up
                        return;
                    }
                }

                // slide: push out, drop the velocity component into the
                // surface
                self.position += contact.mtv;
                self.velocity -= normal * self.velocity.dot(normal);
                resolved_any = true;
            }
            if !resolved_any {
                break;
            }
        }
    }

    /// Bisection search for a step-up offset that lands the entity on
    /// ground above a wall-like contact.
    ///
    /// The probe direction into the wall comes from crossing gravity with
    /// the MTV twice, which isolates the MTV's gravity-tangent component.
    /// Six iterations refine a height factor in [0, 1], starting at 0.5
    /// with a halving adjustment of 0.25. Returns the probe offset of the
    /// lowest raise whose dominant contact classifies as ground.
    fn search_step_up(&self, level: &Level, gravity_dir: Vec3, wall_normal: Vec3) -> Option<Vec3> {
        let lateral = gravity_dir.cross(wall_normal.cross(gravity_dir));
        if lateral.len_sq() <= CONTACT_EPSILON * CONTACT_EPSILON {
            return None;
        }
        // the MTV points out of the wall; probe into it
        let into_wall = -lateral.normalize();
        let up = -gravity_dir;

        let mut factor = 0.5f32;
        let mut adjust = 0.25f32;
        let mut found = None;
        for _ in 0..STEP_UP_ITERATIONS {
            let offset = up * (STEP_UP_HEIGHT * factor) + into_wall * STEP_UP_NUDGE;
            let probe = dominant_contact(level, self.chunk, self.position + offset, ENTITY_EXTENT);
            let is_ground = probe.map_or(false, |c| {
                c.mtv.len_sq() > CONTACT_EPSILON * CONTACT_EPSILON
                    && gravity_dir.dot(c.mtv.normalize()) < GROUND_DOT
            });
            if is_ground {
                found = Some(offset);
                factor -= adjust;
            } else {
                factor += adjust;
            }
            adjust *= 0.5;
        }
        found
    }

    /// Collision-free movement along the view direction (noclip camera).
    pub fn fly_move(&mut self, forward: f32, right: f32) {
        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        let view_forward = Vec3::new(
            pitch.cos() * yaw.sin(),
            -pitch.sin(),
            -pitch.cos() * yaw.cos(),
        );
        let view_right = Vec3::new(yaw.cos(), 0.0, yaw.sin());
        self.position += view_forward * forward + view_right * right;
    }

    /// View matrix for rendering: pitch about X, yaw about Y, then the
    /// negated position. Read-only; never feeds back into simulation.
    pub fn view_matrix(&self) -> Mat4 {
        let rotation = mat4_mul(
            &mat4_rotation_x(self.pitch.to_radians()),
            &mat4_rotation_y(self.yaw.to_radians()),
        );
        mat4_mul(&rotation, &mat4_translation(-self.position))
    }
}
