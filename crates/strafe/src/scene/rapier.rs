use std::collections::HashMap;

use glam::Vec3;
use rapier3d::parry::query::{ShapeCastOptions, ShapeCastStatus};
use rapier3d::prelude::*;

use super::{CollisionQuery, ProbeShape, SurfaceMaterial, SweepHit};

/// Static world geometry backed by rapier. This is the production
/// implementation of [`CollisionQuery`]; tests use purpose-built worlds.
///
/// Call [`RapierScene::commit`] after adding geometry so the broad phase
/// knows about it before the first query.
pub struct RapierScene {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    materials: HashMap<ColliderHandle, SurfaceMaterial>,
}

impl Default for RapierScene {
    fn default() -> Self {
        Self::new()
    }
}

impl RapierScene {
    pub fn new() -> Self {
        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            materials: HashMap::new(),
        }
    }

    /// Runs one zero-gravity pipeline step to register new colliders with
    /// the broad phase.
    pub fn commit(&mut self) {
        self.pipeline.step(
            Vector::new(0.0, 0.0, 0.0),
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    pub fn add_ground(&mut self, z: f32, half_size: f32, material: SurfaceMaterial) -> ColliderHandle {
        self.add_box(
            Vec3::new(0.0, 0.0, z - 5.0),
            Vec3::new(half_size, half_size, 5.0),
            material,
        )
    }

    pub fn add_box(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        material: SurfaceMaterial,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(Vector::new(center.x, center.y, center.z))
            .friction(material.friction)
            .build();
        let handle = self.colliders.insert(collider);
        self.materials.insert(handle, material);
        handle
    }

    /// A box pitched about the Y axis; positive `angle` raises the +X edge.
    pub fn add_ramp(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        angle: f32,
        material: SurfaceMaterial,
    ) -> ColliderHandle {
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(Vector::new(center.x, center.y, center.z))
            .rotation(Vector::new(0.0, angle, 0.0))
            .friction(material.friction)
            .build();
        let handle = self.colliders.insert(collider);
        self.materials.insert(handle, material);
        handle
    }

    fn material(&self, handle: ColliderHandle) -> SurfaceMaterial {
        self.materials.get(&handle).copied().unwrap_or_default()
    }

    fn query_pipeline(&self) -> QueryPipeline<'_> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            QueryFilter::default(),
        )
    }
}

impl CollisionQuery for RapierScene {
    fn sweep(&self, shape: &ProbeShape, start: Vec3, end: Vec3) -> Option<SweepHit> {
        let delta = end - start;
        let len = delta.length();
        if len < 1e-8 {
            return None;
        }

        let cuboid = Cuboid::new(Vector::new(
            shape.half_extents.x,
            shape.half_extents.y,
            shape.half_extents.z,
        ));
        let pose = Pose::from_parts(Vector::new(start.x, start.y, start.z), Rotation::IDENTITY);
        let vel = Vector::new(delta.x, delta.y, delta.z);
        let options = ShapeCastOptions {
            max_time_of_impact: 1.0,
            target_distance: 0.0,
            stop_at_penetration: true,
            compute_impact_geometry_on_penetration: true,
        };

        let (handle, hit) = self.query_pipeline().cast_shape(&pose, vel, &cuboid, options)?;
        let start_penetrating =
            matches!(hit.status, ShapeCastStatus::PenetratingOrWithinTargetDist);
        Some(SweepHit {
            toi: hit.time_of_impact,
            distance: hit.time_of_impact * len,
            normal: Vec3::new(hit.normal1.x, hit.normal1.y, hit.normal1.z),
            point: Vec3::new(hit.witness1.x, hit.witness1.y, hit.witness1.z),
            start_penetrating,
            surface: self.material(handle),
        })
    }

    fn overlaps(&self, shape: &ProbeShape, location: Vec3) -> bool {
        let cuboid = Cuboid::new(Vector::new(
            shape.half_extents.x,
            shape.half_extents.y,
            shape.half_extents.z,
        ));
        let pose = Pose::from_parts(
            Vector::new(location.x, location.y, location.z),
            Rotation::IDENTITY,
        );
        self.query_pipeline()
            .intersect_shape(pose, &cuboid)
            .next()
            .is_some()
    }
}
