//! Physics Bridge
//!
//! Wraps a rapier2d world and speaks presentation units at its boundary.
//! Bodies are keyed by the same [`CharacterId`] as the sprites they move, so
//! a step can be joined back onto the character registry.
//!
//! ## Units
//!
//! Presentation units are pixels with y pointing down. The simulation runs in
//! metres along the same axes; `world_scale` pixels make one metre.

use std::collections::BTreeMap;
use rapier2d::prelude::*;
use tracing::{debug, trace};

use crate::core::vec2::Vec2;
use crate::game::state::CharacterId;

/// Physics bodies share the character key space.
pub type BodyId = CharacterId;

/// Default pixels per metre.
pub const DEFAULT_WORLD_SCALE: f32 = 30.0;

/// Default downward gravity (m/s²).
pub const DEFAULT_GRAVITY: f32 = 30.0;

/// Contact normals steeper than this count as standing on something.
const GROUND_NORMAL_MIN: f32 = 0.5;

// =============================================================================
// PHYSICS UPDATE
// =============================================================================

/// Where one body ended up after a step.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsUpdate {
    /// Position in presentation units
    pub position: Vec2,
    /// Rotation (radians)
    pub angle: f32,
    /// Velocity in presentation units per second
    pub velocity: Vec2,
    /// Time of the step (ms)
    pub timestamp: f64,
    /// Body / character key
    pub character_id: BodyId,
    /// Underlying rapier body
    pub body: RigidBodyHandle,
    /// Body rests on something below it
    pub grounded: bool,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Physics bridge errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PhysicsError {
    /// A body with this id already exists.
    #[error("body already exists: {0}")]
    DuplicateBody(BodyId),

    /// No body with this id.
    #[error("unknown body: {0}")]
    UnknownBody(BodyId),
}

// =============================================================================
// BRIDGE
// =============================================================================

#[derive(Clone, Debug)]
struct BodyEntry {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    /// Last translation written by `set_position`, with the presentation
    /// position it came from. Reported verbatim while the body has not moved.
    synced: Option<(Vector<Real>, Vec2)>,
}

/// Rigid-body world in presentation units.
pub struct PhysicsBridge {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    world_scale: f32,
    bodies: BTreeMap<BodyId, BodyEntry>,
}

impl Default for PhysicsBridge {
    fn default() -> Self {
        Self::new(DEFAULT_GRAVITY, DEFAULT_WORLD_SCALE)
    }
}

impl PhysicsBridge {
    /// Create a world with downward `gravity` (m/s²) and `world_scale` px per metre.
    pub fn new(gravity: f32, world_scale: f32) -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            gravity: vector![0.0, gravity],
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            world_scale: world_scale.max(f32::EPSILON),
            bodies: BTreeMap::new(),
        }
    }

    /// Pixels per metre.
    pub fn world_scale(&self) -> f32 {
        self.world_scale
    }

    /// Number of bodies.
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Check if a body exists.
    pub fn has_body(&self, id: &BodyId) -> bool {
        self.bodies.contains_key(id)
    }

    #[inline]
    fn to_metres(&self, v: Vec2) -> Vector<Real> {
        vector![v.x / self.world_scale, v.y / self.world_scale]
    }

    #[inline]
    fn to_presentation(&self, v: &Vector<Real>) -> Vec2 {
        Vec2::new(v.x * self.world_scale, v.y * self.world_scale)
    }

    /// Create a box centred at (`x`, `y`) with size `width` x `height`.
    ///
    /// All inputs are presentation units. Rotation is locked and mass is 1.
    pub fn create_box(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        dynamic: bool,
        id: BodyId,
    ) -> Result<RigidBodyHandle, PhysicsError> {
        if self.bodies.contains_key(&id) {
            return Err(PhysicsError::DuplicateBody(id));
        }

        let translation = self.to_metres(Vec2::new(x, y));
        let builder = if dynamic {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };
        let rb = builder.translation(translation).lock_rotations().build();
        let body = self.rigid_body_set.insert(rb);

        let collider = ColliderBuilder::cuboid(
            width / 2.0 / self.world_scale,
            height / 2.0 / self.world_scale,
        )
        .mass(1.0)
        .friction(0.0)
        .build();
        let collider = self
            .collider_set
            .insert_with_parent(collider, body, &mut self.rigid_body_set);

        debug!(%id, x, y, width, height, dynamic, "Created body");
        self.bodies.insert(
            id,
            BodyEntry {
                body,
                collider,
                synced: None,
            },
        );
        Ok(body)
    }

    /// Remove a body and its collider. Returns false if it did not exist.
    pub fn remove_body(&mut self, id: &BodyId) -> bool {
        let Some(entry) = self.bodies.remove(id) else {
            return false;
        };
        self.rigid_body_set.remove(
            entry.body,
            &mut self.island_manager,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            true,
        );
        debug!(%id, "Removed body");
        true
    }

    /// Move a body to a presentation position. Velocity is kept.
    pub fn set_position(&mut self, id: &BodyId, position: Vec2) -> Result<(), PhysicsError> {
        let translation = self.to_metres(position);
        let entry = self
            .bodies
            .get_mut(id)
            .ok_or_else(|| PhysicsError::UnknownBody(id.clone()))?;
        let rb = self
            .rigid_body_set
            .get_mut(entry.body)
            .ok_or_else(|| PhysicsError::UnknownBody(id.clone()))?;
        rb.set_translation(translation, true);
        entry.synced = Some((translation, position));
        Ok(())
    }

    /// Set a body's velocity in presentation units per second.
    pub fn set_velocity(&mut self, id: &BodyId, velocity: Vec2) -> Result<(), PhysicsError> {
        let linvel = self.to_metres(velocity);
        let entry = self
            .bodies
            .get(id)
            .ok_or_else(|| PhysicsError::UnknownBody(id.clone()))?;
        let rb = self
            .rigid_body_set
            .get_mut(entry.body)
            .ok_or_else(|| PhysicsError::UnknownBody(id.clone()))?;
        rb.set_linvel(linvel, true);
        Ok(())
    }

    /// Velocity in presentation units per second.
    pub fn velocity(&self, id: &BodyId) -> Option<Vec2> {
        let entry = self.bodies.get(id)?;
        let rb = self.rigid_body_set.get(entry.body)?;
        Some(self.to_presentation(rb.linvel()))
    }

    /// Position in presentation units.
    pub fn position(&self, id: &BodyId) -> Option<Vec2> {
        let entry = self.bodies.get(id)?;
        let rb = self.rigid_body_set.get(entry.body)?;
        Some(self.report_position(entry, rb))
    }

    fn report_position(&self, entry: &BodyEntry, rb: &RigidBody) -> Vec2 {
        match entry.synced {
            Some((translation, position)) if *rb.translation() == translation => position,
            _ => self.to_presentation(rb.translation()),
        }
    }

    /// Check if the body has an active contact with something below it.
    pub fn is_touching_down(&self, id: &BodyId) -> bool {
        let Some(entry) = self.bodies.get(id) else {
            return false;
        };
        self.narrow_phase
            .contact_pairs_with(entry.collider)
            .filter(|pair| pair.has_any_active_contact)
            .any(|pair| {
                // Normals point from collider1 to collider2
                let sign = if pair.collider1 == entry.collider { 1.0 } else { -1.0 };
                pair.manifolds
                    .iter()
                    .any(|m| !m.points.is_empty() && m.data.normal.y * sign > GROUND_NORMAL_MIN)
            })
    }

    /// Advance the world by `delta` ms and report every body.
    ///
    /// A non-positive `delta` reports without stepping.
    pub fn step(&mut self, time: f64, delta: f64) -> BTreeMap<BodyId, PhysicsUpdate> {
        if delta > 0.0 {
            self.integration_params.dt = (delta / 1000.0) as Real;
            self.pipeline.step(
                &self.gravity,
                &self.integration_params,
                &mut self.island_manager,
                &mut self.broad_phase,
                &mut self.narrow_phase,
                &mut self.rigid_body_set,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                &mut self.ccd_solver,
                None,
                &(),
                &(),
            );
            for (_, rb) in self.rigid_body_set.iter_mut() {
                rb.reset_forces(false);
            }
        } else {
            trace!(delta, "Skipping physics step");
        }

        let mut updates = BTreeMap::new();
        for (id, entry) in &self.bodies {
            let Some(rb) = self.rigid_body_set.get(entry.body) else {
                continue;
            };
            updates.insert(
                id.clone(),
                PhysicsUpdate {
                    position: self.report_position(entry, rb),
                    angle: rb.rotation().angle(),
                    velocity: self.to_presentation(rb.linvel()),
                    timestamp: time,
                    character_id: id.clone(),
                    body: entry.body,
                    grounded: self.is_touching_down(id),
                },
            );
        }
        updates
    }
}

// =============================================================================
// TESTS
// =============================================================================
