// ==============================================================================
// obstacles.rs — STATIC COURSE OBSTACLES (RAPIER COLLIDERS + RAY FEELERS)
// ------------------------------------------------------------------------------
// Fence posts, barrels and other static props are inserted as parentless
// cylinder colliders. Feelers are flat `QueryPipeline::cast_ray` calls a
// little above the ground.
// Nothing here moves; the pipeline is updated once at construction.
// ==============================================================================

use rapier3d::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::math::{vec3, Vec3};

const OBSTACLE_HALF_HEIGHT: f32 = 2.0; // m
const PROBE_HEIGHT: f32 = 0.5; // m above the kart origin

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ObstacleDef {
    pub position: [f32; 3],
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleHit {
    pub distance: f32,
    pub position: Vec3, // obstacle center
    pub radius: f32,
}

pub struct ObstacleField {
    bodies: RigidBodySet, // always empty, cast_ray wants one
    colliders: ColliderSet,
    query_pipeline: QueryPipeline,
    defs: Vec<ObstacleDef>,
    handle_to_index: HashMap<ColliderHandle, usize>,
}

impl ObstacleField {
    pub fn new(defs: &[ObstacleDef]) -> Self {
        let bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();
        let mut handle_to_index = HashMap::new();

        for (index, def) in defs.iter().enumerate() {
            let [x, y, z] = def.position;
            let collider = ColliderBuilder::cylinder(OBSTACLE_HALF_HEIGHT, def.radius.max(0.05))
                .translation(vector![x, y, z])
                .build();
            let handle = colliders.insert(collider);
            handle_to_index.insert(handle, index);
        }

        let mut query_pipeline = QueryPipeline::new();
        query_pipeline.update(&colliders);

        tracing::debug!(count = defs.len(), "obstacle colliders inserted");

        Self {
            bodies,
            colliders,
            query_pipeline,
            defs: defs.to_vec(),
            handle_to_index,
        }
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Cast a flat ray from `origin` along `direction` (Y ignored).
    pub fn probe(&self, origin: &Vec3, direction: &Vec3, max_distance: f32) -> Option<ObstacleHit> {
        if self.defs.is_empty() || max_distance <= 0.0 {
            return None;
        }

        let flat = vec3(direction.x, 0.0, direction.z);
        let len = flat.norm();
        if !(len > 1e-6) {
            return None;
        }
        let dir = flat / len;

        let ray = Ray::new(
            point![origin.x, origin.y + PROBE_HEIGHT, origin.z],
            vector![dir.x, 0.0, dir.z],
        );

        let (handle, toi) = self.query_pipeline.cast_ray(
            &self.bodies,
            &self.colliders,
            &ray,
            max_distance,
            true,
            QueryFilter::default(),
        )?;

        let index = *self.handle_to_index.get(&handle)?;
        let def = self.defs[index];
        Some(ObstacleHit {
            distance: toi,
            position: vec3(def.position[0], def.position[1], def.position[2]),
            radius: def.radius,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_hits_post_straight_ahead() {
        let field = ObstacleField::new(&[ObstacleDef {
            position: [0.0, 0.0, 10.0],
            radius: 1.0,
        }]);
        let hit = field
            .probe(&Vec3::zeros(), &vec3(0.0, 0.0, 1.0), 20.0)
            .expect("post should be hit");
        assert!((hit.distance - 9.0).abs() < 0.05, "toi {}", hit.distance);
        assert_eq!(hit.radius, 1.0);
    }

    #[test]
    fn probe_misses_post_off_to_the_side() {
        let field = ObstacleField::new(&[ObstacleDef {
            position: [5.0, 0.0, 10.0],
            radius: 1.0,
        }]);
        assert!(field.probe(&Vec3::zeros(), &vec3(0.0, 0.0, 1.0), 20.0).is_none());
        assert!(field.probe(&Vec3::zeros(), &vec3(0.0, 0.0, 1.0), 5.0).is_none());
    }
}
