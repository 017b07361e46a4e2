// src/track/course.rs

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::path::Path;

use crate::error::ServerError;
use crate::math::{bearing, planar_distance, vec3, Vec3};
use crate::track::obstacles::{ObstacleDef, ObstacleField, ObstacleHit};
use crate::track::{PhysicsModifiers, TrackQuery};

const ICE_TURN_GRIP: f32 = 0.35;
const ICE_BRAKE_EFFICIENCY: f32 = 0.4;
const ICE_FRICTION: f32 = 0.3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseTheme {
    #[default]
    Standard,
    Ice,
    Lava,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    Ice,
    Lava,
    BoostPad,
    Ramp,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceZone {
    pub kind: SurfaceKind,
    pub center: [f32; 3],
    pub radius: f32,
}

fn one() -> f32 {
    1.0
}

fn default_checkpoints() -> usize {
    8
}

/// Course description as handed over by the loader. Assumed valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDef {
    pub name: String,
    /// Closed loop; the first point is the start/finish line.
    pub centerline: Vec<[f32; 3]>,
    pub track_width: f32,
    #[serde(default)]
    pub theme: CourseTheme,
    #[serde(default = "one")]
    pub friction: f32,
    #[serde(default = "one")]
    pub top_speed: f32,
    #[serde(default)]
    pub surfaces: Vec<SurfaceZone>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleDef>,
    #[serde(default)]
    pub item_boxes: Vec<[f32; 3]>,
    #[serde(default = "default_checkpoints")]
    pub checkpoints: usize,
    #[serde(default)]
    pub arena_radius: Option<f32>,
}

impl CourseDef {
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let text = std::fs::read_to_string(path).map_err(|source| ServerError::CourseRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ServerError::CourseParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Stadium oval: two 120 m straights joined by 50 m radius hairpins.
    pub fn oval() -> Self {
        let radius = 50.0;
        let half_straight = 60.0;
        let arc_segments = 16;
        let mut centerline = Vec::new();

        // Front straight, heading +Z.
        for i in 0..6 {
            let z = -half_straight + (2.0 * half_straight) * (i as f32 / 6.0);
            centerline.push([radius, 0.0, z]);
        }
        // North hairpin around (0, 60).
        for i in 0..arc_segments {
            let theta = PI * (i as f32 / arc_segments as f32);
            centerline.push([radius * theta.cos(), 0.0, half_straight + radius * theta.sin()]);
        }
        // Back straight, heading -Z.
        for i in 0..6 {
            let z = half_straight - (2.0 * half_straight) * (i as f32 / 6.0);
            centerline.push([-radius, 0.0, z]);
        }
        // South hairpin around (0, -60).
        for i in 0..arc_segments {
            let theta = PI + PI * (i as f32 / arc_segments as f32);
            centerline.push([radius * theta.cos(), 0.0, -half_straight + radius * theta.sin()]);
        }

        Self {
            name: "Oval".to_string(),
            centerline,
            track_width: 14.0,
            theme: CourseTheme::Standard,
            friction: 1.0,
            top_speed: 1.0,
            surfaces: vec![
                SurfaceZone { kind: SurfaceKind::BoostPad, center: [50.0, 0.0, 20.0], radius: 2.5 },
                SurfaceZone { kind: SurfaceKind::Ramp, center: [-50.0, 0.0, 10.0], radius: 3.0 },
            ],
            obstacles: vec![ObstacleDef { position: [-46.0, 0.0, -20.0], radius: 1.2 }],
            item_boxes: vec![
                [45.0, 0.0, 35.0],
                [50.0, 0.0, 35.0],
                [55.0, 0.0, 35.0],
                [-55.0, 0.0, -35.0],
                [-50.0, 0.0, -35.0],
                [-45.0, 0.0, -35.0],
            ],
            checkpoints: 8,
            arena_radius: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Projection {
    point: Vec3,
    segment: usize,
    t: f32,
    distance: f32,
}

/// Polyline course geometry with arc-length progress.
pub struct Course {
    def: CourseDef,
    points: Vec<Vec3>,
    cumulative: Vec<f32>, // arc length at the start of each segment
    length: f32,
    center: Vec3,
    radius: f32,
    obstacles: ObstacleField,
}

impl Course {
    pub fn new(def: CourseDef) -> Self {
        let points: Vec<Vec3> = def
            .centerline
            .iter()
            .map(|p| vec3(p[0], p[1], p[2]))
            .collect();

        let mut cumulative = Vec::with_capacity(points.len());
        let mut length = 0.0;
        for i in 0..points.len() {
            cumulative.push(length);
            let next = points[(i + 1) % points.len()];
            length += planar_distance(&points[i], &next);
        }

        let center = if points.is_empty() {
            Vec3::zeros()
        } else {
            points.iter().fold(Vec3::zeros(), |acc, p| acc + p) / points.len() as f32
        };
        let farthest = points
            .iter()
            .map(|p| planar_distance(p, &center))
            .fold(0.0_f32, f32::max);
        let radius = def
            .arena_radius
            .unwrap_or(farthest + def.track_width * 2.0)
            .max(def.track_width);

        if points.len() < 2 {
            tracing::warn!(name = %def.name, "course centerline has fewer than two points");
        }

        let obstacles = ObstacleField::new(&def.obstacles);

        Self {
            def,
            points,
            cumulative,
            length,
            center,
            radius,
            obstacles,
        }
    }

    pub fn def(&self) -> &CourseDef {
        &self.def
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn theme(&self) -> CourseTheme {
        self.def.theme
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    pub fn checkpoint_count(&self) -> usize {
        self.def.checkpoints.max(1)
    }

    pub fn item_box_positions(&self) -> Vec<Vec3> {
        self.def
            .item_boxes
            .iter()
            .map(|p| vec3(p[0], p[1], p[2]))
            .collect()
    }

    /// Point and course heading at `distance` metres along the centerline.
    pub fn point_at_distance(&self, distance: f32) -> (Vec3, f32) {
        if self.points.len() < 2 || self.length <= 0.0 {
            return (self.center, 0.0);
        }
        let d = distance.rem_euclid(self.length);
        let n = self.points.len();
        // Last segment whose start is <= d.
        let segment = match self
            .cumulative
            .binary_search_by(|c| c.partial_cmp(&d).unwrap_or(std::cmp::Ordering::Less))
        {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        }
        .min(n - 1);

        let a = self.points[segment];
        let b = self.points[(segment + 1) % n];
        let seg_len = planar_distance(&a, &b);
        let t = if seg_len > 1e-6 {
            ((d - self.cumulative[segment]) / seg_len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (a + (b - a) * t, bearing(&a, &b))
    }

    fn project(&self, x: f32, z: f32) -> Option<Projection> {
        let n = self.points.len();
        if n < 2 {
            return None;
        }
        let p = vec3(x, 0.0, z);
        let mut best: Option<Projection> = None;

        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let ab = vec3(b.x - a.x, 0.0, b.z - a.z);
            let len_sq = ab.norm_squared();
            let t = if len_sq > 1e-9 {
                (((p.x - a.x) * ab.x + (p.z - a.z) * ab.z) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let point = a + (b - a) * t;
            let distance = planar_distance(&point, &p);
            if best.map_or(true, |current| distance < current.distance) {
                best = Some(Projection { point, segment: i, t, distance });
            }
        }
        best
    }

    fn zone_at(&self, x: f32, z: f32) -> Option<(usize, SurfaceKind)> {
        let p = vec3(x, 0.0, z);
        self.def.surfaces.iter().enumerate().find_map(|(i, zone)| {
            let c = vec3(zone.center[0], 0.0, zone.center[2]);
            (planar_distance(&c, &p) <= zone.radius).then_some((i, zone.kind))
        })
    }
}

impl TrackQuery for Course {
    fn is_on_track(&self, x: f32, z: f32) -> bool {
        match self.project(x, z) {
            Some(proj) => proj.distance <= self.half_width(),
            None => true,
        }
    }

    fn nearest_centerline_point(&self, x: f32, z: f32) -> Vec3 {
        self.project(x, z).map_or(self.center, |proj| proj.point)
    }

    fn course_direction(&self, x: f32, z: f32) -> f32 {
        match self.project(x, z) {
            Some(proj) => {
                let a = self.points[proj.segment];
                let b = self.points[(proj.segment + 1) % self.points.len()];
                bearing(&a, &b)
            }
            None => 0.0,
        }
    }

    fn progress_fraction(&self, x: f32, z: f32) -> f32 {
        let Some(proj) = self.project(x, z) else {
            return 0.0;
        };
        if self.length <= 0.0 {
            return 0.0;
        }
        let a = self.points[proj.segment];
        let b = self.points[(proj.segment + 1) % self.points.len()];
        let along = self.cumulative[proj.segment] + planar_distance(&a, &b) * proj.t;
        let fraction = along / self.length;
        if fraction >= 1.0 || !fraction.is_finite() {
            0.0
        } else {
            fraction.max(0.0)
        }
    }

    fn physics_modifiers(&self, x: f32, z: f32) -> PhysicsModifiers {
        let mut m = PhysicsModifiers {
            friction: self.def.friction,
            top_speed: self.def.top_speed,
            ..PhysicsModifiers::default()
        };

        if let Some(proj) = self.project(x, z) {
            m.ground_height = proj.point.y;
            m.off_road = proj.distance > self.half_width();
        }

        if let Some((index, kind)) = self.zone_at(x, z) {
            m.zone = Some(index);
            match kind {
                SurfaceKind::Ice => {
                    m.on_ice = true;
                    m.turn_grip = ICE_TURN_GRIP;
                    m.brake_efficiency = ICE_BRAKE_EFFICIENCY;
                    m.friction *= ICE_FRICTION;
                }
                SurfaceKind::Lava => m.on_lava = true,
                SurfaceKind::BoostPad => m.boost_pad = true,
                SurfaceKind::Ramp => m.ramp = true,
            }
        }
        m
    }

    fn track_width(&self) -> f32 {
        self.def.track_width
    }

    fn arena_center(&self) -> Vec3 {
        self.center
    }

    fn arena_radius(&self) -> f32 {
        self.radius
    }

    fn centerline_samples(&self, count: usize) -> Vec<Vec3> {
        if self.points.len() < 2 || count == 0 {
            return Vec::new();
        }
        (0..count)
            .map(|k| self.point_at_distance(self.length * k as f32 / count as f32).0)
            .collect()
    }

    fn probe_obstacle(
        &self,
        origin: &Vec3,
        direction: &Vec3,
        max_distance: f32,
    ) -> Option<ObstacleHit> {
        self.obstacles.probe(origin, direction, max_distance)
    }
}
