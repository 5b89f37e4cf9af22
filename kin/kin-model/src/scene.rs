//! The scene: aggregate root over the kinematic forest.
//!
//! A [`Scene`] owns the frame arena, the force exchanges, the proxy list and
//! the generalized coordinate vector `q`, together with the derived caches
//! over them. Derived state is synchronized lazily: every cache is guarded by
//! an explicit freshness bit, structural edits flip the bits, and the
//! `ensure_*` methods recompute on the next read. There is no implicit
//! dependency tracking.
//!
//! Cache layers and their invalidation triggers:
//!
//! | cache            | recomputed by          | invalidated by                  |
//! |------------------|------------------------|---------------------------------|
//! | DOF index ranges | `ensure_indexed_dofs`  | any structural edit / selection |
//! | `q` vector       | `ensure_q`             | structural edits, pose writes   |
//! | world poses      | `ensure_poses`         | relative-pose / joint writes    |
//! | proxies          | `ensure_proxies`       | anything that moves a shape     |

use hashbrown::HashMap;
use kin_types::{BodyKind, FrameId, Inertia, KinError, Pose, Result, ShapeGeometry};
use nalgebra::{DVector, Point3, Vector3};
use tracing::debug;

use crate::force::ForceExchange;
use crate::frame::{Frame, SurfaceParams};
use crate::jacobian::JacobianMode;
use crate::joint::{Joint, JointKind};
use crate::proxy::{shape_distance, Proxy};

/// Aggregate root of an articulated frame-graph model.
///
/// The scene is the sole writer of frame structure; all edits go through its
/// methods so the derived caches can be invalidated atomically. It is a
/// single-threaded structure: use one scene (plus its bridge) per thread.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    frames: Vec<Frame>,
    by_name: HashMap<String, FrameId>,
    forces: Vec<ForceExchange>,
    proxies: Vec<Proxy>,

    q: DVector<f64>,
    q_dim: usize,
    /// Frames with active, nonzero-DOF joints in topological order.
    active_order: Vec<FrameId>,

    indexed_fresh: bool,
    q_fresh: bool,
    poses_fresh: bool,
    proxies_fresh: bool,

    jac_mode: JacobianMode,
    proxy_margin: f64,
    set_joint_state_count: u64,
}

impl Scene {
    /// Create an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self {
            proxy_margin: 0.1,
            indexed_fresh: true,
            q_fresh: true,
            poses_fresh: true,
            proxies_fresh: true,
            ..Self::default()
        }
    }

    // ------------------------------------------------------------------
    // Building
    // ------------------------------------------------------------------

    /// Add a frame, optionally under a parent, with identity relative pose.
    pub fn add_frame(&mut self, name: &str, parent: Option<FrameId>) -> Result<FrameId> {
        if self.by_name.contains_key(name) {
            return Err(KinError::DuplicateFrameName {
                name: name.to_owned(),
            });
        }
        let id = FrameId::new(self.frames.len() as u32);
        let mut frame = Frame::new(id, name);
        frame.parent = parent;
        if let Some(p) = parent {
            self.frames[p.index()].children.push(id);
        }
        self.frames.push(frame);
        self.by_name.insert(name.to_owned(), id);
        self.invalidate_structure();
        Ok(id)
    }

    /// Add a shaped frame at a relative pose under `parent`.
    pub fn add_object(
        &mut self,
        name: &str,
        parent: Option<FrameId>,
        shape: ShapeGeometry,
        rel: Pose,
    ) -> Result<FrameId> {
        let id = self.add_frame(name, parent)?;
        let frame = &mut self.frames[id.index()];
        frame.shape = Some(shape);
        frame.rel = rel;
        Ok(id)
    }

    /// Set a frame's pose relative to its parent.
    pub fn set_relative_pose(&mut self, id: FrameId, rel: Pose) {
        self.frames[id.index()].rel = rel;
        self.poses_fresh = false;
        self.proxies_fresh = false;
        // A joint frame's relative pose encodes its coordinates.
        if self.frames[id.index()].joint.is_some() {
            self.q_fresh = false;
        }
    }

    /// Attach or remove a joint connecting `id` to its parent.
    pub fn set_joint(&mut self, id: FrameId, kind: Option<JointKind>) {
        self.frames[id.index()].joint = kind.map(Joint::new);
        self.invalidate_structure();
    }

    /// Set or clear a frame's shape.
    pub fn set_shape(&mut self, id: FrameId, shape: Option<ShapeGeometry>) {
        self.frames[id.index()].shape = shape;
        self.proxies_fresh = false;
    }

    /// Set or clear a frame's mass properties.
    pub fn set_inertia(&mut self, id: FrameId, inertia: Option<Inertia>) {
        self.frames[id.index()].inertia = inertia;
    }

    /// Set a frame's contact material overrides.
    pub fn set_surface(&mut self, id: FrameId, surface: SurfaceParams) {
        self.frames[id.index()].surface = surface;
    }

    /// Mutable access to a frame's mesh vertex buffer, if it has one.
    ///
    /// Soft-body pulls use this to write simulated node positions back.
    pub fn mesh_vertices_mut(&mut self, id: FrameId) -> Option<&mut Vec<Point3<f64>>> {
        match self.frames[id.index()].shape.as_mut() {
            Some(ShapeGeometry::ConvexMesh { vertices }) => Some(vertices),
            _ => None,
        }
    }

    /// Register a force exchange between two frames; returns its index.
    pub fn add_force_exchange(&mut self, a: FrameId, b: FrameId) -> usize {
        self.forces.push(ForceExchange::new(a, b));
        self.invalidate_structure();
        self.forces.len() - 1
    }

    /// Reparent `child` under `parent` through a rigid connection.
    ///
    /// The child's world pose is preserved: its new relative pose is computed
    /// from the current world poses. Fails with a structural error if the
    /// edit would create a cycle.
    pub fn attach(&mut self, parent: FrameId, child: FrameId) -> Result<()> {
        if parent == child || self.is_ancestor(child, parent) {
            return Err(KinError::StructuralCycle { frame: child });
        }
        self.ensure_poses()?;

        if let Some(old) = self.frames[child.index()].parent {
            let siblings = &mut self.frames[old.index()].children;
            siblings.retain(|&c| c != child);
        }
        let rel = self.frames[child.index()]
            .world
            .relative_to(&self.frames[parent.index()].world);
        let f = &mut self.frames[child.index()];
        f.parent = Some(parent);
        f.rel = rel;
        self.frames[parent.index()].children.push(child);

        debug!(child = %child, parent = %parent, "attached frame");
        self.indexed_fresh = false;
        self.q_fresh = false;
        Ok(())
    }

    /// Whether `ancestor` lies on the parent chain of `of` (exclusive).
    #[must_use]
    pub fn is_ancestor(&self, ancestor: FrameId, of: FrameId) -> bool {
        let mut cur = self.frames[of.index()].parent;
        while let Some(id) = cur {
            if id == ancestor {
                return true;
            }
            cur = self.frames[id.index()].parent;
        }
        false
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Number of frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Get a frame by id.
    #[must_use]
    pub fn frame(&self, id: FrameId) -> Option<&Frame> {
        self.frames.get(id.index())
    }

    /// Get a frame by name.
    #[must_use]
    pub fn frame_by_name(&self, name: &str) -> Option<&Frame> {
        self.by_name.get(name).map(|id| &self.frames[id.index()])
    }

    /// Resolve a frame name to its id.
    pub fn frame_id(&self, name: &str) -> Result<FrameId> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| KinError::frame_not_found(name))
    }

    /// Iterate over all frames.
    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }

    /// Iterate over all frame ids.
    pub fn frame_ids(&self) -> impl Iterator<Item = FrameId> + '_ {
        self.frames.iter().map(Frame::id)
    }

    /// All registered force exchanges.
    #[must_use]
    pub fn forces(&self) -> &[ForceExchange] {
        &self.forces
    }

    /// The force exchange connecting a pair, if any.
    #[must_use]
    pub fn force_between(&self, a: FrameId, b: FrameId) -> Option<&ForceExchange> {
        self.forces.iter().find(|f| f.connects(a, b))
    }

    /// Mutable handle on the force exchange connecting a pair.
    ///
    /// Writing through it bypasses `q`; callers that maintain `q` should
    /// prefer [`Scene::set_joint_state`].
    pub fn force_between_mut(&mut self, a: FrameId, b: FrameId) -> Option<&mut ForceExchange> {
        self.q_fresh = false;
        self.forces.iter_mut().find(|f| f.connects(a, b))
    }

    /// Times `set_joint_state` has been called (diagnostic counter).
    #[must_use]
    pub fn set_joint_state_count(&self) -> u64 {
        self.set_joint_state_count
    }

    /// Selected Jacobian representation.
    #[must_use]
    pub fn jacobian_mode(&self) -> JacobianMode {
        self.jac_mode
    }

    /// Select the Jacobian representation for subsequent kinematics calls.
    pub fn set_jacobian_mode(&mut self, mode: JacobianMode) {
        self.jac_mode = mode;
    }

    // ------------------------------------------------------------------
    // Active-joint selection and DOF indexing
    // ------------------------------------------------------------------

    /// Select which joints are active (contribute coordinates to `q`).
    ///
    /// With `not_those = false`, exactly the joints owned by `ids` become
    /// active; with `not_those = true` the complement does.
    pub fn select_joints(&mut self, ids: &[FrameId], not_those: bool) {
        for frame in &mut self.frames {
            if let Some(joint) = frame.joint.as_mut() {
                let in_set = ids.contains(&frame.id);
                joint.active = in_set != not_those;
            }
        }
        self.indexed_fresh = false;
        self.q_fresh = false;
    }

    /// Recompute the DOF index cache if stale.
    pub fn ensure_indexed_dofs(&mut self) -> Result<()> {
        if !self.indexed_fresh {
            self.calc_indexed_dofs()?;
        }
        Ok(())
    }

    fn calc_indexed_dofs(&mut self) -> Result<()> {
        let order = self.calc_top_sort()?;
        self.active_order.clear();
        let mut idx = 0;
        for id in order {
            if let Some(joint) = self.frames[id.index()].joint.as_mut() {
                if joint.active {
                    joint.q_index = idx;
                    idx += joint.dof();
                    if joint.dof() > 0 {
                        self.active_order.push(id);
                    }
                }
            }
        }
        for force in &mut self.forces {
            force.q_index = idx;
            idx += ForceExchange::DOF;
        }
        self.q_dim = idx;
        self.indexed_fresh = true;
        self.q_fresh = false;
        Ok(())
    }

    /// Total number of active generalized coordinates.
    pub fn joint_dim(&mut self) -> Result<usize> {
        self.ensure_indexed_dofs()?;
        Ok(self.q_dim)
    }

    /// Topological order of all frames, parents strictly before children.
    ///
    /// A graph containing a cycle is rejected with a structural error, never
    /// silently accepted.
    pub fn calc_top_sort(&self) -> Result<Vec<FrameId>> {
        let mut order = Vec::with_capacity(self.frames.len());
        let mut visited = vec![false; self.frames.len()];
        let mut stack: Vec<FrameId> = self
            .frames
            .iter()
            .filter(|f| f.parent.is_none())
            .map(Frame::id)
            .collect();
        while let Some(id) = stack.pop() {
            if visited[id.index()] {
                continue;
            }
            visited[id.index()] = true;
            order.push(id);
            stack.extend(self.frames[id.index()].children.iter().copied());
        }
        if order.len() != self.frames.len() {
            let frame = self
                .frames
                .iter()
                .find(|f| !visited[f.id.index()])
                .map_or(FrameId::new(0), Frame::id);
            return Err(KinError::StructuralCycle { frame });
        }
        Ok(order)
    }

    // ------------------------------------------------------------------
    // Generalized coordinates
    // ------------------------------------------------------------------

    /// Recompute `q` from the current relative poses and force states if
    /// stale.
    pub fn ensure_q(&mut self) -> Result<()> {
        if self.q_fresh {
            return Ok(());
        }
        self.ensure_indexed_dofs()?;
        self.q = DVector::zeros(self.q_dim);
        for i in 0..self.active_order.len() {
            let id = self.active_order[i];
            let frame = &self.frames[id.index()];
            let (joint, rel) = match frame.joint {
                Some(j) => (j, frame.rel),
                None => continue,
            };
            let (start, dof) = (joint.q_index, joint.dof());
            joint.q_from_pose(&rel, &mut self.q.as_mut_slice()[start..start + dof]);
        }
        for i in 0..self.forces.len() {
            let force = self.forces[i];
            let s = force.q_index;
            self.q.as_mut_slice()[s..s + 3].copy_from_slice(force.position.coords.as_slice());
            self.q.as_mut_slice()[s + 3..s + 6].copy_from_slice(force.force.as_slice());
        }
        self.q_fresh = true;
        Ok(())
    }

    /// The current generalized coordinate vector.
    pub fn joint_state(&mut self) -> Result<&DVector<f64>> {
        self.ensure_q()?;
        Ok(&self.q)
    }

    /// Write the generalized coordinate vector.
    ///
    /// Length must equal [`Scene::joint_dim`]; relative poses of all active
    /// joints (and all force exchanges) are recomputed, world poses and
    /// proxies are invalidated.
    pub fn set_joint_state(&mut self, q: &[f64]) -> Result<()> {
        self.ensure_indexed_dofs()?;
        if q.len() != self.q_dim {
            return Err(KinError::joint_dim_mismatch(self.q_dim, q.len()));
        }
        self.q = DVector::from_column_slice(q);
        for i in 0..self.active_order.len() {
            let id = self.active_order[i];
            let joint = match self.frames[id.index()].joint {
                Some(j) => j,
                None => continue,
            };
            let (start, dof) = (joint.q_index, joint.dof());
            let rel = joint.pose_from_q(&q[start..start + dof]);
            self.frames[id.index()].rel = rel;
        }
        for force in &mut self.forces {
            let s = force.q_index;
            force.position = Point3::new(q[s], q[s + 1], q[s + 2]);
            force.force = Vector3::new(q[s + 3], q[s + 4], q[s + 5]);
        }
        self.q_fresh = true;
        self.poses_fresh = false;
        self.proxies_fresh = false;
        self.set_joint_state_count += 1;
        Ok(())
    }

    // ------------------------------------------------------------------
    // World poses
    // ------------------------------------------------------------------

    /// Recompute cached world poses if stale.
    pub fn ensure_poses(&mut self) -> Result<()> {
        if self.poses_fresh {
            return Ok(());
        }
        let order = self.calc_top_sort()?;
        for id in order {
            let world = match self.frames[id.index()].parent {
                Some(p) => self.frames[p.index()]
                    .world
                    .compose(&self.frames[id.index()].rel),
                None => self.frames[id.index()].rel,
            };
            self.frames[id.index()].world = world;
        }
        self.poses_fresh = true;
        Ok(())
    }

    /// World pose of a frame.
    pub fn world_pose(&mut self, id: FrameId) -> Result<Pose> {
        self.ensure_poses()?;
        Ok(self.frames[id.index()].world)
    }

    /// World poses of all frames, in id order.
    pub fn frame_state(&mut self) -> Result<Vec<Pose>> {
        self.ensure_poses()?;
        Ok(self.frames.iter().map(|f| f.world).collect())
    }

    /// Overwrite the world pose of every frame, in id order.
    ///
    /// Relative poses are recomputed top-down so the graph stays consistent;
    /// `q` is invalidated.
    pub fn set_frame_state(&mut self, poses: &[Pose]) -> Result<()> {
        if poses.len() != self.frames.len() {
            return Err(KinError::DimensionMismatch {
                what: "frame state",
                expected: self.frames.len(),
                actual: poses.len(),
            });
        }
        let order = self.calc_top_sort()?;
        for id in order {
            let world = poses[id.index()];
            let rel = match self.frames[id.index()].parent {
                Some(p) => world.relative_to(&poses[p.index()]),
                None => world,
            };
            let f = &mut self.frames[id.index()];
            f.world = world;
            f.rel = rel;
        }
        self.poses_fresh = true;
        self.q_fresh = false;
        self.proxies_fresh = false;
        Ok(())
    }

    /// Overwrite one frame's world pose, preserving all descendants' relative
    /// poses (they move along with it).
    pub fn set_world_pose(&mut self, id: FrameId, world: Pose) -> Result<()> {
        self.ensure_poses()?;
        let rel = match self.frames[id.index()].parent {
            Some(p) => world.relative_to(&self.frames[p.index()].world),
            None => world,
        };
        let f = &mut self.frames[id.index()];
        f.rel = rel;
        f.world = world;
        // Descendant world caches are stale now.
        self.poses_fresh = false;
        self.proxies_fresh = false;
        if self.frames[id.index()].joint.is_some() {
            self.q_fresh = false;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Rigid-body groups
    // ------------------------------------------------------------------

    /// Representative of the rigid-body group containing `id`.
    ///
    /// Walks up through rigid (zero-DOF) connections; stops at the first
    /// frame that hangs on an articulated joint, or at a root.
    #[must_use]
    pub fn upward_link(&self, mut id: FrameId) -> FrameId {
        loop {
            let f = &self.frames[id.index()];
            if f.has_articulated_joint() {
                return id;
            }
            match f.parent {
                Some(p) => id = p,
                None => return id,
            }
        }
    }

    /// Partition the scene into maximal rigid-body groups.
    ///
    /// Returns one representative frame per group, in first-encountered id
    /// order. This partition is the unit a physics bridge turns into actors.
    #[must_use]
    pub fn links(&self) -> Vec<FrameId> {
        let mut seen = vec![false; self.frames.len()];
        let mut reps = Vec::new();
        for id in 0..self.frames.len() {
            let rep = self.upward_link(FrameId::new(id as u32));
            if !seen[rep.index()] {
                seen[rep.index()] = true;
                reps.push(rep);
            }
        }
        reps
    }

    /// All members of the rigid group represented by `rep`, including `rep`.
    #[must_use]
    pub fn rigid_group(&self, rep: FrameId) -> Vec<FrameId> {
        self.frames
            .iter()
            .map(Frame::id)
            .filter(|&id| self.upward_link(id) == rep)
            .collect()
    }

    /// Compound inertia of `rep`'s rigid group, expressed in `rep`'s frame.
    ///
    /// Returns `None` when no member carries mass. The resulting kind is
    /// `Dynamic` if any member is dynamic, else `Soft` if any is soft, else
    /// the first member's kind.
    pub fn compound_inertia(&mut self, rep: FrameId) -> Result<Option<Inertia>> {
        self.ensure_poses()?;
        let rep_world = self.frames[rep.index()].world;
        let mut acc: Option<Inertia> = None;
        let mut kind: Option<BodyKind> = None;
        for id in self.rigid_group(rep) {
            let frame = &self.frames[id.index()];
            let Some(inertia) = frame.inertia else {
                continue;
            };
            let rel = frame.world.relative_to(&rep_world);
            let rot = rel.rotation.to_rotation_matrix();
            let moved = Inertia::new(
                inertia.kind,
                inertia.mass,
                rel.transform_point(&Point3::from(inertia.com)).coords,
                rot * inertia.tensor * rot.transpose(),
            );
            kind = Some(match (kind, inertia.kind) {
                (_, BodyKind::Dynamic) | (Some(BodyKind::Dynamic), _) => BodyKind::Dynamic,
                (Some(BodyKind::Soft), _) | (_, BodyKind::Soft) => BodyKind::Soft,
                (None, k) => k,
                (Some(k), _) => k,
            });
            acc = Some(match acc {
                Some(total) => total.combined_with(&moved),
                None => moved,
            });
        }
        Ok(acc.zip(kind).map(|(i, k)| i.with_kind(k)))
    }

    /// Relocate a frame's origin by `offset` (local coordinates), leaving
    /// every world pose in the scene unchanged.
    ///
    /// The frame's relative pose absorbs the shift, each child's relative
    /// pose is compensated by the inverse, and the frame's inertia COM (if
    /// any) moves accordingly. Used by bridges to satisfy engines that
    /// require body origins at the center of mass.
    pub fn shift_origin(&mut self, id: FrameId, offset: Vector3<f64>) -> Result<()> {
        self.ensure_poses()?;
        let f = &mut self.frames[id.index()];
        f.rel.position += f.rel.rotation * offset;
        f.world.position += f.world.rotation * offset;
        if let Some(inertia) = f.inertia.as_mut() {
            inertia.com -= offset;
        }
        let children = f.children.clone();
        if self.frames[id.index()].joint.is_some() {
            self.q_fresh = false;
        }
        for child in children {
            let c = &mut self.frames[child.index()];
            c.rel.position -= offset;
            if c.joint.is_some() {
                self.q_fresh = false;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Structural maintenance
    // ------------------------------------------------------------------

    /// Delete all rigid joints; the connections become plain links.
    pub fn prune_rigid_joints(&mut self) {
        for frame in &mut self.frames {
            if frame.joint.is_some_and(|j| j.kind.is_rigid()) {
                frame.joint = None;
            }
        }
        self.invalidate_structure();
    }

    /// Delete leaf frames carrying no joint, shape or inertia.
    ///
    /// Removal cascades until a fixpoint, then the arena is compacted:
    /// **frame ids are reassigned**. Returns the number of frames removed.
    pub fn prune_useless_frames(&mut self) -> usize {
        let mut keep = vec![true; self.frames.len()];
        let mut child_count: Vec<usize> =
            self.frames.iter().map(|f| f.children.len()).collect();
        let mut removed = 0;
        let mut changed = true;
        while changed {
            changed = false;
            for i in 0..self.frames.len() {
                let f = &self.frames[i];
                if keep[i]
                    && child_count[i] == 0
                    && f.joint.is_none()
                    && f.shape.is_none()
                    && f.inertia.is_none()
                    && !self.forces.iter().any(|fx| fx.a == f.id || fx.b == f.id)
                {
                    keep[i] = false;
                    removed += 1;
                    changed = true;
                    if let Some(p) = f.parent {
                        child_count[p.index()] -= 1;
                    }
                }
            }
        }
        if removed > 0 {
            self.compact(&keep);
            debug!(removed, "pruned useless frames");
        }
        removed
    }

    /// Rebuild the arena keeping only flagged frames, reassigning dense ids.
    fn compact(&mut self, keep: &[bool]) {
        let mut remap: Vec<Option<FrameId>> = vec![None; self.frames.len()];
        let mut next = 0u32;
        for (i, &k) in keep.iter().enumerate() {
            if k {
                remap[i] = Some(FrameId::new(next));
                next += 1;
            }
        }
        let old = std::mem::take(&mut self.frames);
        self.by_name.clear();
        for mut frame in old {
            let Some(new_id) = remap[frame.id.index()] else {
                continue;
            };
            frame.id = new_id;
            frame.parent = frame.parent.and_then(|p| remap[p.index()]);
            frame.children = frame
                .children
                .iter()
                .filter_map(|c| remap[c.index()])
                .collect();
            self.by_name.insert(frame.name.clone(), new_id);
            self.frames.push(frame);
        }
        for force in &mut self.forces {
            // Kept by construction: prune refuses frames referenced by forces.
            if let (Some(a), Some(b)) = (remap[force.a.index()], remap[force.b.index()]) {
                force.a = a;
                force.b = b;
            }
        }
        self.proxies.clear();
        self.invalidate_structure();
    }

    /// Remove every frame, force, proxy and coordinate.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.by_name.clear();
        self.forces.clear();
        self.proxies.clear();
        self.q = DVector::zeros(0);
        self.q_dim = 0;
        self.active_order.clear();
        self.indexed_fresh = true;
        self.q_fresh = true;
        self.poses_fresh = true;
        self.proxies_fresh = true;
    }

    /// Verify internal invariants: parent/child symmetry, name map
    /// correctness and forest shape.
    #[must_use]
    pub fn check_consistency(&self) -> bool {
        if self.calc_top_sort().is_err() {
            return false;
        }
        for frame in &self.frames {
            if self.by_name.get(&frame.name) != Some(&frame.id) {
                return false;
            }
            if let Some(p) = frame.parent {
                if !self.frames[p.index()].children.contains(&frame.id) {
                    return false;
                }
            }
            for &child in &frame.children {
                if self.frames[child.index()].parent != Some(frame.id) {
                    return false;
                }
            }
        }
        true
    }

    /// Write a structural listing of the scene (one line per frame).
    pub fn report(&self, out: &mut dyn std::io::Write) -> std::io::Result<()> {
        for frame in &self.frames {
            write!(out, "[{}] '{}'", frame.id.0, frame.name)?;
            if let Some(p) = frame.parent {
                write!(out, " parent={}", p.0)?;
            }
            if let Some(j) = frame.joint {
                write!(out, " joint={}{}", j.kind, if j.active { "" } else { " (inactive)" })?;
            }
            if let Some(s) = &frame.shape {
                write!(out, " shape={}", s.kind_name())?;
            }
            if let Some(i) = &frame.inertia {
                write!(out, " body={} mass={}", i.kind, i.mass)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Proxies
    // ------------------------------------------------------------------

    /// Set the broad-phase margin for proxy creation.
    pub fn set_proxy_margin(&mut self, margin: f64) {
        self.proxy_margin = margin;
        self.proxies_fresh = false;
    }

    /// Recompute the proxy list if stale.
    ///
    /// Candidate pairs are shaped frames from different rigid groups whose
    /// bounding spheres come within the proxy margin; the narrow phase is
    /// analytic (see [`crate::proxy`]).
    pub fn ensure_proxies(&mut self) -> Result<()> {
        if self.proxies_fresh {
            return Ok(());
        }
        self.ensure_poses()?;
        self.proxies.clear();
        let shaped: Vec<FrameId> = self
            .frames
            .iter()
            .filter(|f| f.shape.as_ref().is_some_and(ShapeGeometry::collidable))
            .map(Frame::id)
            .collect();
        for (i, &a) in shaped.iter().enumerate() {
            for &b in &shaped[i + 1..] {
                if self.upward_link(a) == self.upward_link(b) {
                    continue;
                }
                let (fa, fb) = (&self.frames[a.index()], &self.frames[b.index()]);
                let (sa, sb) = match (&fa.shape, &fb.shape) {
                    (Some(sa), Some(sb)) => (sa, sb),
                    _ => continue,
                };
                let coarse = (fb.world.position - fa.world.position).norm()
                    - sa.bounding_radius()
                    - sb.bounding_radius();
                if coarse > self.proxy_margin {
                    continue;
                }
                let d = shape_distance(sa, &fa.world, sb, &fb.world);
                if d.distance <= self.proxy_margin {
                    self.proxies.push(Proxy {
                        a,
                        b,
                        witness_a: d.witness_a,
                        witness_b: d.witness_b,
                        normal: d.normal,
                        distance: d.distance,
                    });
                }
            }
        }
        self.proxies_fresh = true;
        Ok(())
    }

    /// Current proxy list (call [`Scene::ensure_proxies`] first).
    #[must_use]
    pub fn proxies(&self) -> &[Proxy] {
        &self.proxies
    }

    /// The proxy for a pair, if one was created.
    #[must_use]
    pub fn proxy_between(&self, a: FrameId, b: FrameId) -> Option<&Proxy> {
        self.proxies.iter().find(|p| p.connects(a, b))
    }

    /// Sum of all penetration depths over the current proxies.
    pub fn total_penetration(&mut self) -> Result<f64> {
        self.ensure_proxies()?;
        Ok(self
            .proxies
            .iter()
            .filter(|p| p.distance < 0.0)
            .map(|p| -p.distance)
            .sum())
    }

    // ------------------------------------------------------------------

    /// DOF dimension assuming the index cache is fresh.
    pub(crate) fn joint_dim_cached(&self) -> usize {
        self.q_dim
    }

    pub(crate) fn invalidate_structure(&mut self) {
        self.indexed_fresh = false;
        self.q_fresh = false;
        self.poses_fresh = false;
        self.proxies_fresh = false;
    }

    pub(crate) fn frame_ref(&self, id: FrameId) -> &Frame {
        &self.frames[id.index()]
    }
}
