//! Rapier backend of the physics bridge.
//!
//! Builds one engine actor per rigid-body group of the scene, keeps the
//! frame-id → actor map as a dense array, and implements the push/pull state
//! synchronization protocol. Growing the scene after construction is
//! unsupported; build a new bridge from the new snapshot instead.
//!
//! Backend notes:
//!
//! - Rapier applies `set_position` immediately, so the dummy-step workaround
//!   some engines need after a full-state push does not exist here.
//! - The "tracked motion-state pose" of kinematic actors is rapier's
//!   next-kinematic position.
//! - Soft groups become pinned rope actors: one small rigid node per mesh
//!   vertex, consecutive nodes linked by spherical joints, total mass split
//!   evenly across nodes.

use std::num::NonZeroUsize;

use kin_model::{Axis, JointKind, Scene};
use kin_types::{BodyKind, FrameId, Inertia, Pose, Twist};
use nalgebra::{Point3, Vector3};
use rapier3d_f64::prelude::{
    CCDSolver, ColliderBuilder, ColliderSet, DefaultBroadPhase, GenericJointBuilder,
    IntegrationParameters, IslandManager, JointAxesMask, MassProperties, NarrowPhase,
    PhysicsPipeline, RigidBodyBuilder, RigidBodyHandle, RigidBodySet, RigidBodyType, SharedShape,
    SphericalJointBuilder,
};
use tracing::{debug, info};

use crate::engine::{BridgeOptions, PhysicsEngine, VelocityTable};
use crate::error::BridgeError;
use crate::shape::build_group_shape;

/// Engine-side identity of one actor.
#[derive(Debug, Clone)]
enum ActorHandle {
    /// Free-standing rigid body.
    Rigid(RigidBodyHandle),
    /// Link body of an articulated chain.
    Link(RigidBodyHandle),
    /// Rope nodes of a soft body, one per mesh vertex.
    Soft(Vec<RigidBodyHandle>),
}

#[derive(Debug, Clone)]
struct Actor {
    handle: ActorHandle,
    kind: BodyKind,
}

/// Bridge between a [`Scene`] snapshot and a rapier physics world.
pub struct RapierBridge {
    options: BridgeOptions,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: rapier3d_f64::prelude::ImpulseJointSet,
    multibody_joints: rapier3d_f64::prelude::MultibodyJointSet,
    ccd: CCDSolver,
    /// Dense frame-id → actor map.
    actors: Vec<Option<Actor>>,
    accumulator: f64,
    step_count: u64,
}

impl std::fmt::Debug for RapierBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RapierBridge")
            .field("options", &self.options)
            .field("actors", &self.actors)
            .field("accumulator", &self.accumulator)
            .field("step_count", &self.step_count)
            .finish_non_exhaustive()
    }
}

impl RapierBridge {
    /// Build a rapier world from the scene's current structure and poses.
    ///
    /// Runs the full build protocol: ground plane, rigid-group enumeration,
    /// compound-inertia recentering, body classification, one actor per
    /// group, and (optionally) articulated chains and soft ropes.
    pub fn new(scene: &mut Scene, options: BridgeOptions) -> Result<Self, BridgeError> {
        let mut params = IntegrationParameters::default();
        params.dt = options.substep_dt;
        if let Some(iters) = NonZeroUsize::new(options.solver_iterations) {
            params.num_solver_iterations = iters;
        }

        let mut bridge = Self {
            options,
            params,
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: rapier3d_f64::prelude::ImpulseJointSet::new(),
            multibody_joints: rapier3d_f64::prelude::MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            actors: vec![None; scene.frame_count()],
            accumulator: 0.0,
            step_count: 0,
        };

        info!("creating scene within rapier");
        if bridge.options.ground_plane {
            bridge.add_ground();
        }

        if bridge.options.enable_multibody {
            for id in scene.frame_ids().collect::<Vec<_>>() {
                let frame = scene.frame(id).ok_or(BridgeError::NoActor { frame: id })?;
                let is_root = frame.parent().is_none()
                    || frame.joint().is_some_and(|j| j.kind == JointKind::Free);
                if is_root {
                    bridge.add_articulated(scene, id)?;
                }
            }
        } else {
            for rep in scene.links() {
                let soft = scene
                    .frame(rep)
                    .and_then(|f| f.inertia().map(|i| i.kind == BodyKind::Soft))
                    .unwrap_or(false);
                if soft {
                    if !bridge.options.enable_soft_bodies {
                        return Err(BridgeError::SoftBodiesDisabled { frame: rep });
                    }
                    bridge.add_soft(scene, rep)?;
                } else {
                    bridge.add_rigid_link(scene, rep)?;
                }
            }
        }
        info!("done creating scene within rapier");
        Ok(bridge)
    }

    /// Number of registered actors.
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.iter().filter(|a| a.is_some()).count()
    }

    /// Inner steps executed so far.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Direct access to the engine body set (diagnostics and tests).
    #[must_use]
    pub fn bodies(&self) -> &RigidBodySet {
        &self.bodies
    }

    fn add_ground(&mut self) {
        let body = self.bodies.insert(RigidBodyBuilder::fixed().build());
        let up = if self.options.gravity.y < 0.0 && self.options.gravity.z == 0.0 {
            Vector3::y_axis()
        } else {
            Vector3::z_axis()
        };
        let collider = ColliderBuilder::new(SharedShape::halfspace(up))
            .friction(self.options.default_friction)
            .restitution(self.options.default_restitution)
            .build();
        self.colliders
            .insert_with_parent(collider, body, &mut self.bodies);
    }

    /// Collect a rigid group's shape and inertia, recentering the
    /// representative onto the group's center of mass when needed.
    ///
    /// The target engine wants body origins at the center of mass with a
    /// diagonal inertia tensor, so a representative without authored inertia
    /// gets the compound inertia of its group and is relocated by the COM
    /// offset; the relocation provably leaves every child's world pose
    /// unchanged.
    fn prepare_link(
        &mut self,
        scene: &mut Scene,
        rep: FrameId,
    ) -> Result<(BodyKind, Option<SharedShape>, Option<Inertia>), BridgeError> {
        // Shapes come from the whole upward-link group; for articulated mass
        // frames that group is rooted at the joint frame above `rep`.
        let members = scene.rigid_group(scene.upward_link(rep));

        let members_have_inertia = members
            .iter()
            .any(|&id| id != rep && scene.frame(id).and_then(kin_model::Frame::inertia).is_some());
        let rep_frame = scene.frame(rep).ok_or(BridgeError::NoActor { frame: rep })?;
        if members_have_inertia && rep_frame.inertia().is_none() {
            if let Some(compound) = scene.compound_inertia(rep)? {
                if compound.com.norm() > 1e-12 {
                    let frame = scene.frame(rep).ok_or(BridgeError::NoActor { frame: rep })?;
                    if frame.shape().is_some_and(kin_types::ShapeGeometry::collidable) {
                        return Err(BridgeError::CannotRecenter {
                            frame: rep,
                            reason: "frame carries a collidable shape",
                        });
                    }
                    let joint_ok = frame.joint().is_none_or(|j| {
                        matches!(j.kind, JointKind::Rigid | JointKind::Free)
                    });
                    if !joint_ok {
                        return Err(BridgeError::CannotRecenter {
                            frame: rep,
                            reason: "frame hangs on an incompatible joint",
                        });
                    }
                    info!(frame = %rep, "relocating frame onto its compound center of mass");
                    scene.set_inertia(rep, Some(compound));
                    scene.shift_origin(rep, compound.com)?;
                } else {
                    scene.set_inertia(rep, Some(compound));
                }
            }
        }

        let shape = build_group_shape(scene, rep, &members)?;

        let frame = scene.frame(rep).ok_or(BridgeError::NoActor { frame: rep })?;
        let mut kind = BodyKind::Static;
        if shape.is_some() {
            if frame.joint().is_some() {
                kind = BodyKind::Kinematic;
            }
            if let Some(inertia) = frame.inertia() {
                kind = inertia.kind;
            }
        }
        debug!(frame = %rep, name = frame.name(), kind = %kind, "adding link");
        Ok((kind, shape, frame.inertia().copied()))
    }

    /// Resolved friction/restitution for a group (last member override wins).
    fn surface_params(&self, scene: &Scene, members: &[FrameId]) -> (f64, f64) {
        let mut friction = self.options.default_friction;
        let mut restitution = self.options.default_restitution;
        for &id in members {
            if let Some(frame) = scene.frame(id) {
                if let Some(f) = frame.surface().friction {
                    friction = f;
                }
                if let Some(r) = frame.surface().restitution {
                    restitution = r;
                }
            }
        }
        (friction, restitution)
    }

    fn register(&mut self, frame: FrameId, actor: Actor) -> Result<(), BridgeError> {
        let slot = &mut self.actors[frame.index()];
        if slot.is_some() {
            return Err(BridgeError::DuplicateActor { frame });
        }
        *slot = Some(actor);
        Ok(())
    }

    fn insert_body(
        &mut self,
        scene: &mut Scene,
        rep: FrameId,
        kind: BodyKind,
        shape: Option<SharedShape>,
        inertia: Option<Inertia>,
        force_dynamic: bool,
    ) -> Result<RigidBodyHandle, BridgeError> {
        let pose = scene.world_pose(rep)?;
        let body_type = if force_dynamic {
            RigidBodyType::Dynamic
        } else {
            match kind {
                BodyKind::Static => RigidBodyType::Fixed,
                BodyKind::Kinematic => RigidBodyType::KinematicPositionBased,
                BodyKind::Dynamic | BodyKind::Soft => RigidBodyType::Dynamic,
            }
        };
        let mut builder = RigidBodyBuilder::new(body_type).position(pose.to_isometry());
        if body_type == RigidBodyType::KinematicPositionBased {
            builder = builder.can_sleep(false);
        }
        if body_type == RigidBodyType::Dynamic {
            let props = match inertia {
                Some(i) => MassProperties::new(
                    Point3::from(i.com),
                    i.mass,
                    // Diagonal inertia as the engine requires.
                    i.tensor.diagonal(),
                ),
                None => MassProperties::new(Point3::origin(), 1.0, Vector3::repeat(0.1)),
            };
            builder = builder.additional_mass_properties(props);
        }
        let handle = self.bodies.insert(builder.build());

        if let Some(shape) = shape {
            let members = scene.rigid_group(scene.upward_link(rep));
            let (friction, restitution) = self.surface_params(scene, &members);
            let collider = ColliderBuilder::new(shape)
                .density(0.0)
                .friction(friction)
                .restitution(restitution)
                .build();
            self.colliders
                .insert_with_parent(collider, handle, &mut self.bodies);
        }
        Ok(handle)
    }

    fn add_rigid_link(&mut self, scene: &mut Scene, rep: FrameId) -> Result<(), BridgeError> {
        let (kind, shape, inertia) = self.prepare_link(scene, rep)?;
        let handle = self.insert_body(scene, rep, kind, shape, inertia, false)?;
        self.register(
            rep,
            Actor {
                handle: ActorHandle::Rigid(handle),
                kind,
            },
        )
    }

    /// Build one articulated multi-body chain rooted at `root`.
    ///
    /// Only the single supported rotational joint kind (`Hinge(Axis::X)`) is
    /// accepted for non-root links; anything else is a hard error, never a
    /// silent approximation.
    fn add_articulated(&mut self, scene: &mut Scene, root: FrameId) -> Result<(), BridgeError> {
        scene.ensure_poses()?;
        let root_frame = scene.frame(root).ok_or(BridgeError::NoActor { frame: root })?;
        if root_frame.parent().is_some()
            && (root_frame.joint().is_none() || root_frame.inertia().is_none())
        {
            return Err(BridgeError::inconsistent(format!(
                "articulated root {root} needs a free joint and inertia"
            )));
        }

        // Joint-bearing frames of the subtree, topological order.
        let mut links = vec![root];
        let mut stack: Vec<FrameId> = root_frame.children().to_vec();
        while let Some(id) = stack.pop() {
            let frame = scene.frame(id).ok_or(BridgeError::NoActor { frame: id })?;
            if frame.has_articulated_joint() {
                links.push(id);
            }
            stack.extend(frame.children().iter().copied());
        }

        // Parent index per link, through the rigid-group representatives.
        let mut parents = vec![usize::MAX; links.len()];
        for i in 1..links.len() {
            let frame = scene.frame(links[i]).ok_or(BridgeError::NoActor { frame: links[i] })?;
            let up = frame
                .parent()
                .map(|p| scene.upward_link(p))
                .ok_or_else(|| BridgeError::inconsistent("chain link lost its parent"))?;
            parents[i] = links
                .iter()
                .position(|&l| l == up)
                .ok_or_else(|| BridgeError::inconsistent("chain parent is not a link"))?;
        }

        // Mass frame per link: itself if it carries inertia, else its
        // nearest mass-bearing child.
        let mut masses = links.clone();
        for (i, &link) in links.iter().enumerate() {
            let frame = scene.frame(link).ok_or(BridgeError::NoActor { frame: link })?;
            if frame.inertia().is_none() {
                for &child in frame.children() {
                    if scene
                        .frame(child)
                        .and_then(kin_model::Frame::inertia)
                        .is_some()
                    {
                        masses[i] = child;
                        break;
                    }
                }
            }
        }

        let mut handles = vec![None; links.len()];
        for i in 0..links.len() {
            let link_joint = links[i];
            let link_mass = masses[i];
            if i > 0 {
                let jf = scene
                    .frame(link_joint)
                    .ok_or(BridgeError::NoActor { frame: link_joint })?;
                if jf.inertia().is_some() {
                    return Err(BridgeError::inconsistent(format!(
                        "joint frame {link_joint} must not carry inertia (it lives on the mass frame)"
                    )));
                }
            }

            let (_, shape, inertia) = self.prepare_link(scene, link_mass)?;
            let handle =
                self.insert_body(scene, link_mass, BodyKind::Dynamic, shape, inertia, true)?;
            handles[i] = Some(handle);
            self.register(
                link_mass,
                Actor {
                    handle: ActorHandle::Link(handle),
                    kind: BodyKind::Dynamic,
                },
            )?;

            if i > 0 {
                let joint_kind = scene
                    .frame(link_joint)
                    .and_then(|f| f.joint().map(|j| j.kind))
                    .ok_or_else(|| BridgeError::inconsistent("chain link without joint"))?;
                if joint_kind != JointKind::Hinge(Axis::X) {
                    return Err(BridgeError::UnsupportedJointKind { kind: joint_kind });
                }

                let parent_mass = masses[parents[i]];
                let joint_parent = scene
                    .frame(link_joint)
                    .and_then(kin_model::Frame::parent)
                    .ok_or_else(|| BridgeError::inconsistent("chain link lost its parent"))?;
                // Anchor relative to the parent's accumulated mass-frame pose.
                let rel_a = scene
                    .world_pose(joint_parent)?
                    .relative_to(&scene.world_pose(parent_mass)?);
                // Mass frame relative to the joint frame.
                let rel_b = scene
                    .frame(link_mass)
                    .map(kin_model::Frame::relative_pose)
                    .unwrap_or_default();

                let joint = GenericJointBuilder::new(JointAxesMask::LOCKED_REVOLUTE_AXES)
                    .local_frame1(rel_a.to_isometry())
                    .local_frame2(rel_b.to_isometry().inverse())
                    .build();
                let parent_handle = handles[parents[i]]
                    .ok_or_else(|| BridgeError::inconsistent("chain parent has no body"))?;
                self.multibody_joints
                    .insert(parent_handle, handle, joint, true)
                    .ok_or_else(|| BridgeError::inconsistent("engine rejected chain joint"))?;
            }
        }
        debug!(root = %root, links = links.len(), "finalized articulated chain");
        Ok(())
    }

    /// Build a pinned rope actor for a soft group.
    fn add_soft(&mut self, scene: &mut Scene, rep: FrameId) -> Result<(), BridgeError> {
        let frame = scene.frame(rep).ok_or(BridgeError::NoActor { frame: rep })?;
        if !frame.children().is_empty() {
            return Err(BridgeError::inconsistent(format!(
                "soft frame {rep} must be a leaf"
            )));
        }
        let vertices = match frame.shape() {
            Some(kin_types::ShapeGeometry::ConvexMesh { vertices }) if vertices.len() >= 2 => {
                vertices.clone()
            }
            _ => {
                return Err(BridgeError::UnsupportedShape {
                    kind: "soft body needs a node mesh",
                })
            }
        };
        let mass = frame
            .inertia()
            .map(|i| i.mass)
            .ok_or_else(|| BridgeError::inconsistent(format!("soft frame {rep} needs inertia")))?;
        let world = scene.world_pose(rep)?;

        let node_mass = mass / vertices.len() as f64;
        let mean_segment = vertices
            .windows(2)
            .map(|w| (w[1] - w[0]).norm())
            .sum::<f64>()
            / (vertices.len() - 1) as f64;
        let radius = (0.25 * mean_segment).max(1e-3);

        let mut nodes = Vec::with_capacity(vertices.len());
        for (i, v) in vertices.iter().enumerate() {
            let position = world.transform_point(v);
            let body_type = if i == 0 {
                // Rope root is pinned, as in the reference rope constructor.
                RigidBodyType::Fixed
            } else {
                RigidBodyType::Dynamic
            };
            let body = RigidBodyBuilder::new(body_type)
                .position(Pose::from_position(position).to_isometry())
                .additional_mass_properties(MassProperties::new(
                    Point3::origin(),
                    node_mass,
                    Vector3::repeat(node_mass * radius * radius * 0.4),
                ))
                .build();
            let handle = self.bodies.insert(body);
            let collider = ColliderBuilder::new(SharedShape::ball(radius))
                .density(0.0)
                .friction(self.options.default_friction)
                .build();
            self.colliders
                .insert_with_parent(collider, handle, &mut self.bodies);
            nodes.push(handle);
        }
        for i in 0..nodes.len() - 1 {
            let delta = vertices[i + 1] - vertices[i];
            let joint = SphericalJointBuilder::new()
                .local_anchor1(Point3::from(delta))
                .local_anchor2(Point3::origin())
                .build();
            self.impulse_joints.insert(nodes[i], nodes[i + 1], joint, true);
        }

        debug!(frame = %rep, nodes = nodes.len(), "added soft rope actor");
        self.register(
            rep,
            Actor {
                handle: ActorHandle::Soft(nodes),
                kind: BodyKind::Soft,
            },
        )
    }

    fn run_substep(&mut self) {
        self.pipeline.step(
            &self.options.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );
        self.step_count += 1;
    }
}

impl PhysicsEngine for RapierBridge {
    fn step(&mut self, dt: f64) {
        self.accumulator += dt;
        let mut substeps = 0;
        while self.accumulator >= self.options.substep_dt && substeps < self.options.max_substeps {
            self.run_substep();
            self.accumulator -= self.options.substep_dt;
            substeps += 1;
        }
    }

    fn push_kinematic_states(&mut self, scene: &mut Scene) -> Result<(), BridgeError> {
        scene.ensure_poses()?;
        for id in 0..self.actors.len() {
            let frame = FrameId::new(id as u32);
            let Some(actor) = self.actors[id].clone() else {
                continue;
            };
            if actor.kind != BodyKind::Kinematic {
                continue;
            }
            if let ActorHandle::Rigid(handle) = actor.handle {
                let pose = scene.world_pose(frame)?;
                if let Some(body) = self.bodies.get_mut(handle) {
                    body.set_next_kinematic_position(pose.to_isometry());
                }
            }
        }
        Ok(())
    }

    fn push_full_state(
        &mut self,
        scene: &mut Scene,
        velocities: Option<&VelocityTable>,
    ) -> Result<(), BridgeError> {
        scene.ensure_poses()?;
        for id in 0..self.actors.len() {
            let frame = FrameId::new(id as u32);
            let Some(actor) = self.actors[id].clone() else {
                continue;
            };
            let handle = match actor.handle {
                ActorHandle::Rigid(h) | ActorHandle::Link(h) => h,
                // Soft nodes have no single transform to overwrite.
                ActorHandle::Soft(_) => continue,
            };
            let pose = scene.world_pose(frame)?;
            let Some(body) = self.bodies.get_mut(handle) else {
                continue;
            };
            body.set_position(pose.to_isometry(), true);
            if actor.kind == BodyKind::Dynamic {
                body.reset_forces(true);
                body.reset_torques(true);
                let twist = velocities.map(|v| v.get(frame)).unwrap_or_default();
                body.set_linvel(twist.linear, true);
                body.set_angvel(twist.angular, true);
            }
        }
        // No settling step needed: rapier honors transform/velocity writes
        // immediately, even on back-to-back pushes.
        Ok(())
    }

    fn pull_dynamic_states(
        &mut self,
        scene: &mut Scene,
        mut velocities: Option<&mut VelocityTable>,
    ) -> Result<(), BridgeError> {
        if let Some(table) = velocities.as_deref_mut() {
            table.reset(scene.frame_count());
        }
        for id in 0..self.actors.len() {
            let frame = FrameId::new(id as u32);
            let Some(actor) = self.actors[id].clone() else {
                continue;
            };
            match actor.handle {
                ActorHandle::Rigid(handle) => {
                    // Free-standing actors carry a tracked pose: write it
                    // straight into the owning frame.
                    let Some(body) = self.bodies.get(handle) else {
                        continue;
                    };
                    if body.is_fixed() || body.is_kinematic() {
                        continue;
                    }
                    let pose = Pose::from_isometry(*body.position());
                    scene.set_world_pose(frame, pose)?;
                    if let Some(table) = velocities.as_deref_mut() {
                        table.set(frame, Twist::new(*body.linvel(), *body.angvel()));
                    }
                }
                ActorHandle::Link(handle) => {
                    let Some(body) = self.bodies.get(handle) else {
                        continue;
                    };
                    let pose = Pose::from_isometry(*body.position());
                    let (linvel, angvel) = (*body.linvel(), *body.angvel());

                    // The link body tracks the mass frame, which hangs under
                    // its joint frame: the joint frame's pose is the raw
                    // transform shifted by the inverse local offset.
                    let parent_with_joint = scene
                        .frame(frame)
                        .and_then(kin_model::Frame::parent)
                        .filter(|&p| scene.frame(p).is_some_and(|pf| pf.joint().is_some()));
                    if let Some(parent) = parent_with_joint {
                        let rel = scene
                            .frame(frame)
                            .map(kin_model::Frame::relative_pose)
                            .unwrap_or_default();
                        scene.set_world_pose(parent, pose.compose(&rel.inverse()))?;
                    } else {
                        scene.set_world_pose(frame, pose)?;
                    }
                    if let Some(table) = velocities.as_deref_mut() {
                        table.set(frame, Twist::new(linvel, angvel));
                    }
                }
                ActorHandle::Soft(ref nodes) => {
                    // Copy simulated node positions into the owning frame's
                    // mesh vertex buffer; soft actors contribute no velocity.
                    let world = scene.world_pose(frame)?;
                    let positions: Vec<Point3<f64>> = nodes
                        .iter()
                        .filter_map(|&h| self.bodies.get(h))
                        .map(|b| world.inverse_transform_point(&Point3::from(b.position().translation.vector)))
                        .collect();
                    if let Some(vertices) = scene.mesh_vertices_mut(frame) {
                        if vertices.len() == positions.len() {
                            vertices.copy_from_slice(&positions);
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn change_body_kind(
        &mut self,
        frame: FrameId,
        kind: BodyKind,
        velocity: Option<Vector3<f64>>,
    ) -> Result<(), BridgeError> {
        let actor = self.actors[frame.index()]
            .as_ref()
            .ok_or(BridgeError::NoActor { frame })?;
        if actor.kind == kind {
            debug!(frame = %frame, kind = %kind, "frame already has requested kind");
            return Ok(());
        }
        let handle = match actor.handle {
            ActorHandle::Rigid(h) => h,
            _ => return Err(BridgeError::NoActor { frame }),
        };
        let from = actor.kind;
        let body = self
            .bodies
            .get_mut(handle)
            .ok_or(BridgeError::NoActor { frame })?;
        match kind {
            BodyKind::Kinematic => {
                body.set_body_type(RigidBodyType::KinematicPositionBased, true);
                body.activation_mut().normalized_linear_threshold = -1.0;
            }
            BodyKind::Dynamic => {
                body.set_body_type(RigidBodyType::Dynamic, true);
                body.activation_mut().normalized_linear_threshold = -1.0;
                if let Some(v) = velocity {
                    body.set_linvel(v, true);
                }
            }
            other => {
                return Err(BridgeError::UnsupportedKindTransition { from, to: other });
            }
        }
        if let Some(actor) = self.actors[frame.index()].as_mut() {
            actor.kind = kind;
        }
        Ok(())
    }

    fn supports_joint(&self, kind: JointKind) -> bool {
        matches!(
            kind,
            JointKind::Rigid | JointKind::Free | JointKind::Hinge(Axis::X)
        )
    }

    fn body_kind(&self, frame: FrameId) -> Option<BodyKind> {
        self.actors
            .get(frame.index())
            .and_then(|a| a.as_ref().map(|a| a.kind))
    }
}
