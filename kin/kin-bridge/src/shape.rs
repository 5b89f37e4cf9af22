//! Collision shape construction.
//!
//! Maps model shape primitives to engine collision geometry: sphere → ball,
//! box → cuboid (half-extents), convex mesh → convex hull with zero added
//! margin. Everything else is a hard "not implemented" error. A rigid group
//! with several contributing shapes becomes a compound, each part offset by
//! its pose relative to the group's representative frame.

use kin_model::Scene;
use kin_types::{FrameId, ShapeGeometry};
use rapier3d_f64::prelude::SharedShape;

use crate::error::BridgeError;

/// Build the collision geometry for a single shape primitive.
pub fn build_collision_shape(
    frame: FrameId,
    geometry: &ShapeGeometry,
) -> Result<SharedShape, BridgeError> {
    match geometry {
        ShapeGeometry::Sphere { radius } => Ok(SharedShape::ball(*radius)),
        ShapeGeometry::Box { half_extents } => Ok(SharedShape::cuboid(
            half_extents.x,
            half_extents.y,
            half_extents.z,
        )),
        ShapeGeometry::ConvexMesh { vertices } => SharedShape::convex_hull(vertices).ok_or(
            BridgeError::DegenerateMesh {
                frame,
                vertices: vertices.len(),
            },
        ),
        other => Err(BridgeError::UnsupportedShape {
            kind: other.kind_name(),
        }),
    }
}

/// Build the collision geometry for a whole rigid group.
///
/// Returns `None` when no member contributes a collidable shape. A single
/// shape co-located with the representative is passed through directly;
/// otherwise the result is a compound of all member shapes, each at its
/// offset relative to the representative.
pub fn build_group_shape(
    scene: &mut Scene,
    rep: FrameId,
    members: &[FrameId],
) -> Result<Option<SharedShape>, BridgeError> {
    let mut parts = Vec::new();
    let rep_pose = scene.world_pose(rep)?;
    for &id in members {
        let Some(frame) = scene.frame(id) else {
            continue;
        };
        let Some(geometry) = frame.shape().filter(|s| s.collidable()).cloned() else {
            continue;
        };
        let offset = scene.world_pose(id)?.relative_to(&rep_pose);
        parts.push((offset.to_isometry(), build_collision_shape(id, &geometry)?));
    }

    if parts.is_empty() {
        return Ok(None);
    }
    if parts.len() == 1 && parts[0].0 == nalgebra::Isometry3::identity() {
        if let Some((_, shape)) = parts.pop() {
            return Ok(Some(shape));
        }
    }
    Ok(Some(SharedShape::compound(parts)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use kin_types::Pose;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_primitive_mapping() {
        let id = FrameId::new(0);
        assert!(build_collision_shape(id, &ShapeGeometry::sphere(1.0)).is_ok());
        assert!(
            build_collision_shape(id, &ShapeGeometry::box_shape(Vector3::new(1.0, 1.0, 1.0)))
                .is_ok()
        );
        let hull = build_collision_shape(
            id,
            &ShapeGeometry::convex_mesh(vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ]),
        );
        assert!(hull.is_ok());
    }

    #[test]
    fn test_unsupported_kinds_fail() {
        let id = FrameId::new(0);
        let err = build_collision_shape(
            id,
            &ShapeGeometry::Capsule {
                half_length: 1.0,
                radius: 0.5,
            },
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedShape { kind: "capsule" }));

        let err = build_collision_shape(
            id,
            &ShapeGeometry::Cylinder {
                half_length: 1.0,
                radius: 0.5,
            },
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedShape { kind: "cylinder" }));
    }

    #[test]
    fn test_group_compound() {
        let mut scene = Scene::new();
        let rep = scene
            .add_object("rep", None, ShapeGeometry::sphere(0.5), Pose::identity())
            .unwrap();
        scene
            .add_object(
                "part",
                Some(rep),
                ShapeGeometry::box_shape(Vector3::new(0.1, 0.1, 0.1)),
                Pose::from_position(Point3::new(0.0, 0.0, 0.4)),
            )
            .unwrap();
        let members = scene.rigid_group(rep);
        let shape = build_group_shape(&mut scene, rep, &members).unwrap().unwrap();
        assert!(shape.as_compound().is_some());
    }

    #[test]
    fn test_markers_do_not_contribute() {
        let mut scene = Scene::new();
        let rep = scene
            .add_object("rep", None, ShapeGeometry::Marker { size: 0.1 }, Pose::identity())
            .unwrap();
        let members = scene.rigid_group(rep);
        assert!(build_group_shape(&mut scene, rep, &members)
            .unwrap()
            .is_none());
    }
}
