//! The engine-agnostic bridge contract.
//!
//! A [`PhysicsEngine`] is built once from a scene snapshot and then exchanges
//! state with the caller's simulation loop: poses are *pushed* into the
//! engine before stepping, simulated results are *pulled* back into the scene
//! afterwards. The core never depends on a concrete engine's types; backends
//! implement this trait.

use kin_model::{JointKind, Scene};
use kin_types::{BodyKind, FrameId, Twist};
use nalgebra::Vector3;

use crate::error::BridgeError;

/// Dense per-frame velocity table, indexed by frame id.
///
/// One `[linear | angular]` pair per frame; frames without actors stay zero.
#[derive(Debug, Clone, Default)]
pub struct VelocityTable {
    entries: Vec<Twist>,
}

impl VelocityTable {
    /// Create a zeroed table for `frame_count` frames.
    #[must_use]
    pub fn new(frame_count: usize) -> Self {
        Self {
            entries: vec![Twist::zero(); frame_count],
        }
    }

    /// Number of frame slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Velocity of a frame (zero if out of range).
    #[must_use]
    pub fn get(&self, id: FrameId) -> Twist {
        self.entries.get(id.index()).copied().unwrap_or_default()
    }

    /// Set the velocity of a frame, growing the table if needed.
    pub fn set(&mut self, id: FrameId, twist: Twist) {
        if id.index() >= self.entries.len() {
            self.entries.resize(id.index() + 1, Twist::zero());
        }
        self.entries[id.index()] = twist;
    }

    /// Zero every slot, resizing to `frame_count`.
    pub fn reset(&mut self, frame_count: usize) {
        self.entries.clear();
        self.entries.resize(frame_count, Twist::zero());
    }
}

/// Global tunables of a bridge, fixed at construction.
///
/// Stepping granularity (`substep_dt`, `max_substeps`, `solver_iterations`)
/// is tunable only here, never per call.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeOptions {
    /// Gravity vector.
    pub gravity: Vector3<f64>,
    /// Build soft rope actors for soft groups.
    pub enable_soft_bodies: bool,
    /// Build articulated chains instead of independent rigid actors.
    pub enable_multibody: bool,
    /// Friction applied when a frame has no override.
    pub default_friction: f64,
    /// Restitution applied when a frame has no override.
    pub default_restitution: f64,
    /// Fixed inner integration step.
    pub substep_dt: f64,
    /// Cap on inner steps per [`PhysicsEngine::step`] call.
    pub max_substeps: usize,
    /// Constraint-solver iterations per inner step.
    pub solver_iterations: usize,
    /// Add an infinite static ground plane through the origin.
    pub ground_plane: bool,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(0.0, 0.0, -9.81),
            enable_soft_bodies: false,
            enable_multibody: false,
            default_friction: 1.0,
            default_restitution: 0.1,
            substep_dt: 1.0 / 240.0,
            max_substeps: 10,
            solver_iterations: 4,
            ground_plane: true,
        }
    }
}

impl BridgeOptions {
    /// Options with gravity switched off (and no ground plane).
    #[must_use]
    pub fn zero_gravity() -> Self {
        Self {
            gravity: Vector3::zeros(),
            ground_plane: false,
            ..Self::default()
        }
    }

    /// Options with gravity along −Y instead of −Z.
    #[must_use]
    pub fn y_up() -> Self {
        Self {
            gravity: Vector3::new(0.0, -9.81, 0.0),
            ..Self::default()
        }
    }
}

/// Contract between the frame-graph core and an external physics simulator.
///
/// Per-step call order matters: push (kinematic or full) before `step`, pull
/// after. Teardown happens on drop.
pub trait PhysicsEngine {
    /// Advance the simulator by `dt`, using the fixed inner time-step and
    /// solver iteration count configured at construction.
    fn step(&mut self, dt: f64);

    /// Overwrite every kinematic actor's transform from its frame's current
    /// world pose. Use before stepping when motion is externally driven.
    fn push_kinematic_states(&mut self, scene: &mut Scene) -> Result<(), BridgeError>;

    /// Overwrite every actor's transform from its frame's pose; dynamic
    /// actors additionally get their forces cleared and their velocities set
    /// from `velocities` (zero if absent).
    fn push_full_state(
        &mut self,
        scene: &mut Scene,
        velocities: Option<&VelocityTable>,
    ) -> Result<(), BridgeError>;

    /// Read simulated transforms back into the scene; optionally report
    /// linear/angular velocities. Soft actors write their node positions
    /// into the owning frame's mesh vertex buffer instead and contribute no
    /// velocity.
    fn pull_dynamic_states(
        &mut self,
        scene: &mut Scene,
        velocities: Option<&mut VelocityTable>,
    ) -> Result<(), BridgeError>;

    /// Transition an actor between kinematic and dynamic; optionally seed
    /// the linear velocity when waking a dynamic body. Requesting the
    /// current kind is a logged no-op.
    fn change_body_kind(
        &mut self,
        frame: FrameId,
        kind: BodyKind,
        velocity: Option<Vector3<f64>>,
    ) -> Result<(), BridgeError>;

    /// Whether articulated-chain construction supports this joint kind.
    ///
    /// Callers should query instead of assuming; unsupported kinds make the
    /// build fail, never silently approximate.
    fn supports_joint(&self, kind: JointKind) -> bool;

    /// Current actor kind of a frame, if it has an actor.
    fn body_kind(&self, frame: FrameId) -> Option<BodyKind>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_velocity_table() {
        let mut table = VelocityTable::new(2);
        assert_eq!(table.len(), 2);
        let id = FrameId::new(5);
        table.set(id, Twist::linear(Vector3::x()));
        assert_eq!(table.len(), 6);
        assert_eq!(table.get(id).linear.x, 1.0);
        assert_eq!(table.get(FrameId::new(9)).linear.x, 0.0);
        table.reset(3);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get(FrameId::new(1)).linear.norm(), 0.0);
    }

    #[test]
    fn test_default_options() {
        let opt = BridgeOptions::default();
        assert_eq!(opt.gravity.z, -9.81);
        assert!(opt.ground_plane);
        let zg = BridgeOptions::zero_gravity();
        assert_eq!(zg.gravity.norm(), 0.0);
        assert!(!zg.ground_plane);
    }
}
