//! Forward kinematics, Jacobians and velocity propagation.
//!
//! Every query walks the root-to-frame chain once. For each active ancestor
//! joint the local derivative of the queried quantity with respect to that
//! joint's coordinates lands in the Jacobian's column block at the joint's
//! index range; all other columns stay empty.

use kin_types::{FrameId, KinError, Result, Twist};
use nalgebra::{DVector, Point3, Quaternion, UnitQuaternion, Vector3};

use crate::jacobian::{Jacobian, JacobianMode};
use crate::joint::JointKind;
use crate::scene::Scene;

/// Per-coordinate derivative of a joint, expressed in world coordinates.
enum DofColumn {
    /// Pure translation direction (prismatic, free translation).
    Linear(Vector3<f64>),
    /// Instantaneous rotation. `scalar` is the quaternion-radial component
    /// (nonzero only for quaternion coordinates); `omega` is the angular
    /// velocity per unit coordinate rate.
    Angular { scalar: f64, omega: Vector3<f64> },
}

/// `2 · (e_k ⊗ r̄)` split into (scalar, rotated vector) per quaternion
/// coordinate `k` (order w, x, y, z), with the vector part expressed through
/// the parent world rotation.
fn quat_columns(parent_rot: &UnitQuaternion<f64>, rel_rot: &UnitQuaternion<f64>) -> [DofColumn; 4] {
    let rbar = rel_rot.quaternion().conjugate();
    std::array::from_fn(|k| {
        let e = match k {
            0 => Quaternion::new(1.0, 0.0, 0.0, 0.0),
            1 => Quaternion::new(0.0, 1.0, 0.0, 0.0),
            2 => Quaternion::new(0.0, 0.0, 1.0, 0.0),
            _ => Quaternion::new(0.0, 0.0, 0.0, 1.0),
        };
        let u = e * rbar;
        DofColumn::Angular {
            scalar: u.w,
            omega: 2.0 * (parent_rot * u.imag()),
        }
    })
}

impl Scene {
    /// Derivative columns of the active joint at `fid`, if any, together
    /// with the joint's `q` start index and world anchor point.
    fn dof_columns(&self, fid: FrameId) -> Option<(usize, Point3<f64>, Vec<DofColumn>)> {
        let frame = self.frame_ref(fid);
        let joint = frame.joint.filter(|j| j.active && j.dof() > 0)?;
        let parent_rot = frame
            .parent
            .map_or_else(UnitQuaternion::identity, |p| {
                self.frame_ref(p).world.rotation
            });
        let anchor = frame.world.position;
        let cols = match joint.kind {
            JointKind::Rigid => return None,
            JointKind::Hinge(axis) => vec![DofColumn::Angular {
                scalar: 0.0,
                omega: frame.world.transform_vector(&axis.unit()),
            }],
            JointKind::Prismatic(axis) => {
                vec![DofColumn::Linear(parent_rot * axis.unit())]
            }
            JointKind::Ball => quat_columns(&parent_rot, &frame.rel.rotation).into(),
            JointKind::Free => {
                let mut cols: Vec<DofColumn> = vec![
                    DofColumn::Linear(parent_rot * Vector3::x()),
                    DofColumn::Linear(parent_rot * Vector3::y()),
                    DofColumn::Linear(parent_rot * Vector3::z()),
                ];
                cols.extend(quat_columns(&parent_rot, &frame.rel.rotation));
                cols
            }
        };
        Some((joint.q_index(), anchor, cols))
    }

    /// World position of a point fixed in `id` (at `rel`, default origin) and
    /// its Jacobian with respect to `q`.
    pub fn kinematics_pos(
        &mut self,
        id: FrameId,
        rel: Option<Vector3<f64>>,
    ) -> Result<(Point3<f64>, Jacobian)> {
        self.ensure_indexed_dofs()?;
        self.ensure_poses()?;
        let world = self.frame_ref(id).world;
        let point = match rel {
            Some(r) => world.transform_point(&Point3::from(r)),
            None => world.position,
        };
        let mut jac = Jacobian::zeros(self.jacobian_mode(), 3, self.joint_dim_cached());
        if self.jacobian_mode() != JacobianMode::Suppressed {
            self.walk_ancestors(id, |start, anchor, cols| {
                for (k, col) in cols.iter().enumerate() {
                    let v = match col {
                        DofColumn::Linear(dir) => *dir,
                        DofColumn::Angular { omega, .. } => omega.cross(&(point - anchor)),
                    };
                    for row in 0..3 {
                        if v[row] != 0.0 {
                            jac.add(row, start + k, v[row]);
                        }
                    }
                }
            });
        }
        Ok((point, jac))
    }

    /// World direction of a vector fixed in `id` and its Jacobian.
    pub fn kinematics_vec(
        &mut self,
        id: FrameId,
        vec: Vector3<f64>,
    ) -> Result<(Vector3<f64>, Jacobian)> {
        self.ensure_indexed_dofs()?;
        self.ensure_poses()?;
        let dir = self.frame_ref(id).world.transform_vector(&vec);
        let mut jac = Jacobian::zeros(self.jacobian_mode(), 3, self.joint_dim_cached());
        if self.jacobian_mode() != JacobianMode::Suppressed {
            self.walk_ancestors(id, |start, _anchor, cols| {
                for (k, col) in cols.iter().enumerate() {
                    if let DofColumn::Angular { omega, .. } = col {
                        let v = omega.cross(&dir);
                        for row in 0..3 {
                            if v[row] != 0.0 {
                                jac.add(row, start + k, v[row]);
                            }
                        }
                    }
                }
            });
        }
        Ok((dir, jac))
    }

    /// World orientation of `id` as a unit quaternion (rows w, x, y, z) and
    /// its Jacobian.
    pub fn kinematics_quat(
        &mut self,
        id: FrameId,
    ) -> Result<(UnitQuaternion<f64>, Jacobian)> {
        self.ensure_indexed_dofs()?;
        self.ensure_poses()?;
        let world_rot = self.frame_ref(id).world.rotation;
        let w = *world_rot.quaternion();
        let mut jac = Jacobian::zeros(self.jacobian_mode(), 4, self.joint_dim_cached());
        if self.jacobian_mode() != JacobianMode::Suppressed {
            self.walk_ancestors(id, |start, _anchor, cols| {
                for (k, col) in cols.iter().enumerate() {
                    if let DofColumn::Angular { scalar, omega } = col {
                        // d(world quat) = (scalar + ω/2) ⊗ W
                        let dq = w * *scalar + Quaternion::from_imag(*omega / 2.0) * w;
                        for (row, v) in [dq.w, dq.i, dq.j, dq.k].into_iter().enumerate() {
                            if v != 0.0 {
                                jac.add(row, start + k, v);
                            }
                        }
                    }
                }
            });
        }
        Ok((world_rot, jac))
    }

    /// Forward-propagate frame velocities for a coordinate rate vector.
    ///
    /// Returns one world-frame [`Twist`] per frame, in id order. `qdot` must
    /// have the active DOF dimension; force-exchange coordinates are ignored
    /// by propagation but still counted in the expected length.
    pub fn fwd_propagate_velocities(&mut self, qdot: &DVector<f64>) -> Result<Vec<Twist>> {
        self.ensure_indexed_dofs()?;
        self.ensure_poses()?;
        let dim = self.joint_dim_cached();
        if qdot.len() != dim {
            return Err(KinError::DimensionMismatch {
                what: "joint velocity",
                expected: dim,
                actual: qdot.len(),
            });
        }
        let order = self.calc_top_sort()?;
        let mut twists = vec![Twist::zero(); self.frame_count()];
        for id in order {
            let frame = self.frame_ref(id);
            let mut tw = match frame.parent() {
                Some(p) => {
                    let parent = self.frame_ref(p);
                    let tp = twists[p.index()];
                    Twist::new(
                        tp.linear
                            + tp.angular
                                .cross(&(frame.world.position - parent.world.position)),
                        tp.angular,
                    )
                }
                None => Twist::zero(),
            };
            if let Some((start, _anchor, cols)) = self.dof_columns(id) {
                for (k, col) in cols.iter().enumerate() {
                    let rate = qdot[start + k];
                    match col {
                        DofColumn::Linear(dir) => tw.linear += dir * rate,
                        DofColumn::Angular { omega, .. } => tw.angular += omega * rate,
                    }
                }
            }
            twists[id.index()] = tw;
        }
        Ok(twists)
    }

    /// Walk active ancestor joints of `id` (including `id`'s own joint),
    /// handing each joint's column block to `visit`.
    fn walk_ancestors(
        &self,
        id: FrameId,
        mut visit: impl FnMut(usize, Point3<f64>, &[DofColumn]),
    ) {
        let mut cur = Some(id);
        while let Some(fid) = cur {
            if let Some((start, anchor, cols)) = self.dof_columns(fid) {
                visit(start, anchor, &cols);
            }
            cur = self.frame_ref(fid).parent();
        }
    }
}
