//! Reference obstacle scene built from simple 2D shapes.
//!
//! [`ObstacleScene`] is a brute-force [`ObstacleSurface`] suitable for tests,
//! tools and small levels. Games with their own collision world should
//! implement [`ObstacleSurface`] directly instead.

use super::surface::{LayerMask, ObstacleSurface, RayHit};
use crate::math::Vec2;

const PARALLEL_EPSILON: f32 = 1e-8;

/// Geometric shape of an opaque obstacle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ObstacleShape {
    /// Infinitely thin wall between two points
    Segment { start: Vec2, end: Vec2 },
    /// Axis-aligned solid box
    Aabb { min: Vec2, max: Vec2 },
    /// Solid disc
    Circle { center: Vec2, radius: f32 },
}

/// An obstacle shape tagged with the layers it lives on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub shape: ObstacleShape,
    pub layers: LayerMask,
}

impl Obstacle {
    pub fn segment(start: Vec2, end: Vec2) -> Self {
        Self {
            shape: ObstacleShape::Segment { start, end },
            layers: LayerMask::layer(0),
        }
    }

    pub fn aabb(min: Vec2, max: Vec2) -> Self {
        Self {
            shape: ObstacleShape::Aabb {
                min: min.min(max),
                max: min.max(max),
            },
            layers: LayerMask::layer(0),
        }
    }

    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self {
            shape: ObstacleShape::Circle {
                center,
                radius: radius.abs(),
            },
            layers: LayerMask::layer(0),
        }
    }

    /// Moves the obstacle onto `layers`.
    pub fn on_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }

    /// Intersects a normalized ray with this obstacle.
    pub fn intersect(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<RayHit> {
        let (distance, normal) = match self.shape {
            ObstacleShape::Segment { start, end } => {
                intersect_segment(origin, direction, start, end)?
            }
            ObstacleShape::Aabb { min, max } => intersect_aabb(origin, direction, min, max)?,
            ObstacleShape::Circle { center, radius } => {
                intersect_circle(origin, direction, center, radius)?
            }
        };

        if distance > max_distance {
            return None;
        }

        Some(RayHit::new(origin + direction * distance, normal, distance))
    }
}

fn intersect_segment(
    origin: Vec2,
    direction: Vec2,
    start: Vec2,
    end: Vec2,
) -> Option<(f32, Vec2)> {
    let edge = end - start;
    let denom = direction.perp_dot(edge);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }

    let to_start = start - origin;
    let t = to_start.perp_dot(edge) / denom;
    let s = to_start.perp_dot(direction) / denom;
    if t < 0.0 || !(0.0..=1.0).contains(&s) {
        return None;
    }

    let mut normal = edge.perp().normalize();
    if normal.dot(direction) > 0.0 {
        normal = -normal;
    }
    Some((t, normal))
}

fn intersect_circle(
    origin: Vec2,
    direction: Vec2,
    center: Vec2,
    radius: f32,
) -> Option<(f32, Vec2)> {
    let offset = origin - center;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        // Origin inside the disc: blocked immediately.
        return Some((0.0, -direction));
    }

    let b = offset.dot(direction);
    if b > 0.0 {
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let t = -b - discriminant.sqrt();
    let point = origin + direction * t;
    let normal = (point - center).try_normalize().unwrap_or(-direction);
    Some((t.max(0.0), normal))
}

fn intersect_aabb(origin: Vec2, direction: Vec2, min: Vec2, max: Vec2) -> Option<(f32, Vec2)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut enter_normal = -direction;

    for axis in 0..2 {
        let o = origin[axis];
        let d = direction[axis];
        if d.abs() < PARALLEL_EPSILON {
            if o < min[axis] || o > max[axis] {
                return None;
            }
            continue;
        }

        let mut t1 = (min[axis] - o) / d;
        let mut t2 = (max[axis] - o) / d;
        let mut normal = Vec2::ZERO;
        normal[axis] = -d.signum();
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
        }
        if t1 > t_enter {
            t_enter = t1;
            enter_normal = normal;
        }
        t_exit = t_exit.min(t2);
        if t_enter > t_exit {
            return None;
        }
    }

    if t_exit < 0.0 {
        return None;
    }
    if t_enter < 0.0 {
        // Origin inside the box.
        return Some((0.0, -direction));
    }
    Some((t_enter, enter_normal))
}

/// Collection of static obstacles answering ray queries by brute force.
///
/// # Example
///
/// ```
/// use petalsonic_occlusion::math::Vec2;
/// use petalsonic_occlusion::scene::{LayerMask, Obstacle, ObstacleScene, ObstacleSurface};
///
/// let mut scene = ObstacleScene::new();
/// scene.add(Obstacle::segment(Vec2::new(5.0, -5.0), Vec2::new(5.0, 5.0)));
///
/// let hit = scene.cast_ray(Vec2::ZERO, Vec2::X, 100.0, LayerMask::ALL).unwrap();
/// assert_eq!(hit.distance, 5.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObstacleScene {
    obstacles: Vec<Obstacle>,
}

impl ObstacleScene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an obstacle and returns its index
    pub fn add(&mut self, obstacle: Obstacle) -> usize {
        self.obstacles.push(obstacle);
        self.obstacles.len() - 1
    }

    pub fn with(mut self, obstacle: Obstacle) -> Self {
        self.add(obstacle);
        self
    }

    pub fn get(&self, index: usize) -> Option<&Obstacle> {
        self.obstacles.get(index)
    }

    /// Replaces the obstacle at `index`, e.g. for a door that moves.
    pub fn set(&mut self, index: usize, obstacle: Obstacle) -> bool {
        match self.obstacles.get_mut(index) {
            Some(slot) => {
                *slot = obstacle;
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.obstacles.clear();
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }
}

impl ObstacleSurface for ObstacleScene {
    fn cast_ray(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        self.obstacles
            .iter()
            .filter(|obstacle| obstacle.layers.intersects(mask))
            .filter_map(|obstacle| obstacle.intersect(origin, direction, max_distance))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_segment_hit_and_normal() {
        let wall = Obstacle::segment(Vec2::new(5.0, -1.0), Vec2::new(5.0, 1.0));
        let hit = wall.intersect(Vec2::ZERO, Vec2::X, 10.0).unwrap();
        assert!((hit.distance - 5.0).abs() < EPS);
        assert!((hit.point - Vec2::new(5.0, 0.0)).length() < EPS);
        assert!((hit.normal - Vec2::new(-1.0, 0.0)).length() < EPS);
    }

    #[test]
    fn test_segment_miss_cases() {
        let wall = Obstacle::segment(Vec2::new(5.0, -1.0), Vec2::new(5.0, 1.0));
        // Beyond max distance
        assert!(wall.intersect(Vec2::ZERO, Vec2::X, 4.0).is_none());
        // Pointing away
        assert!(wall.intersect(Vec2::ZERO, -Vec2::X, 10.0).is_none());
        // Passing beside the segment
        assert!(wall.intersect(Vec2::new(0.0, 3.0), Vec2::X, 10.0).is_none());
        // Parallel
        assert!(wall.intersect(Vec2::ZERO, Vec2::Y, 10.0).is_none());
    }

    #[test]
    fn test_circle_hit() {
        let pillar = Obstacle::circle(Vec2::new(10.0, 0.0), 2.0);
        let hit = pillar.intersect(Vec2::ZERO, Vec2::X, 20.0).unwrap();
        assert!((hit.distance - 8.0).abs() < EPS);
        assert!((hit.normal - Vec2::new(-1.0, 0.0)).length() < EPS);
        assert!(pillar.intersect(Vec2::new(0.0, 3.0), Vec2::X, 20.0).is_none());
        assert!(pillar.intersect(Vec2::ZERO, -Vec2::X, 20.0).is_none());
    }

    #[test]
    fn test_aabb_hit() {
        let crate_box = Obstacle::aabb(Vec2::new(4.0, -1.0), Vec2::new(6.0, 1.0));
        let hit = crate_box.intersect(Vec2::ZERO, Vec2::X, 20.0).unwrap();
        assert!((hit.distance - 4.0).abs() < EPS);
        assert!((hit.normal - Vec2::new(-1.0, 0.0)).length() < EPS);

        let hit = crate_box
            .intersect(Vec2::new(5.0, 10.0), -Vec2::Y, 20.0)
            .unwrap();
        assert!((hit.distance - 9.0).abs() < EPS);
        assert!((hit.normal - Vec2::Y).length() < EPS);

        assert!(crate_box.intersect(Vec2::new(0.0, 5.0), Vec2::X, 20.0).is_none());
    }

    #[test]
    fn test_origin_inside_solid_blocks_immediately() {
        let crate_box = Obstacle::aabb(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0));
        let hit = crate_box.intersect(Vec2::ZERO, Vec2::X, 20.0).unwrap();
        assert_eq!(hit.distance, 0.0);

        let pillar = Obstacle::circle(Vec2::ZERO, 1.0);
        let hit = pillar.intersect(Vec2::ZERO, Vec2::X, 20.0).unwrap();
        assert_eq!(hit.distance, 0.0);
    }

    #[test]
    fn test_scene_returns_closest_hit() {
        let scene = ObstacleScene::new()
            .with(Obstacle::segment(
                Vec2::new(8.0, -1.0),
                Vec2::new(8.0, 1.0),
            ))
            .with(Obstacle::segment(
                Vec2::new(3.0, -1.0),
                Vec2::new(3.0, 1.0),
            ));
        let hit = scene
            .cast_ray(Vec2::ZERO, Vec2::X, 20.0, LayerMask::ALL)
            .unwrap();
        assert!((hit.distance - 3.0).abs() < EPS);
    }

    #[test]
    fn test_scene_respects_layer_mask() {
        let glass = LayerMask::layer(2);
        let scene = ObstacleScene::new().with(
            Obstacle::segment(Vec2::new(3.0, -1.0), Vec2::new(3.0, 1.0)).on_layers(glass),
        );
        assert!(
            scene
                .cast_ray(Vec2::ZERO, Vec2::X, 20.0, LayerMask::layer(0))
                .is_none()
        );
        assert!(scene.cast_ray(Vec2::ZERO, Vec2::X, 20.0, glass).is_some());
    }

    #[test]
    fn test_scene_set_replaces_obstacle() {
        let mut scene = ObstacleScene::new();
        let door = scene.add(Obstacle::segment(
            Vec2::new(3.0, -1.0),
            Vec2::new(3.0, 1.0),
        ));
        assert_eq!(scene.len(), 1);
        assert!(scene.set(
            door,
            Obstacle::segment(Vec2::new(3.0, 2.0), Vec2::new(3.0, 4.0))
        ));
        assert!(!scene.set(7, Obstacle::circle(Vec2::ZERO, 1.0)));
        assert!(
            scene
                .cast_ray(Vec2::ZERO, Vec2::X, 20.0, LayerMask::ALL)
                .is_none()
        );
    }
}
