use anyhow::Result;
use petalsonic_occlusion::math::{Pose2, Vec2};
use petalsonic_occlusion::scene::{LayerMask, Obstacle, ObstacleScene};
use petalsonic_occlusion::{
    Anchor, ChannelSink, ConeSettings, DirectionalMode, LateralSettings, LoopMode, OcclusionEngine,
    OcclusionEvent, OcclusionWorldDesc, SourceProfile, SpatialLevels,
};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

const TICK_SECONDS: f64 = 1.0 / 30.0;

/// Corridor with a pillar and a side room behind the upper wall.
fn corridor() -> ObstacleScene {
    let walls = LayerMask::layer(0);
    let props = LayerMask::layer(1);
    ObstacleScene::new()
        .with(Obstacle::segment(Vec2::new(-2.0, 3.0), Vec2::new(30.0, 3.0)).on_layers(walls))
        .with(Obstacle::segment(Vec2::new(-2.0, -3.0), Vec2::new(30.0, -3.0)).on_layers(walls))
        .with(Obstacle::aabb(Vec2::new(12.0, 3.0), Vec2::new(13.0, 9.0)).on_layers(walls))
        .with(Obstacle::circle(Vec2::new(8.0, 0.0), 1.0).on_layers(props))
        // Crates the game ignores for occlusion
        .with(Obstacle::aabb(Vec2::new(18.0, -1.0), Vec2::new(19.0, 1.0)).on_layers(LayerMask::layer(5)))
}

/// The listener walks down the corridor past a looping cone source, a lateral
/// source in the side room, a door that gets destroyed and a one-shot bell.
pub fn run_corridor(ticks: usize) -> Result<()> {
    let scene = corridor();
    let listener = Rc::new(Cell::new(Vec2::new(0.0, 0.0)));

    let desc = OcclusionWorldDesc {
        max_sources: 8,
        layer_mask: LayerMask::layer(0).with(LayerMask::layer(1)),
        ..Default::default()
    };
    let anchor = Rc::downgrade(&listener);
    let (sink, updates) = ChannelSink::unbounded();
    let mut engine = OcclusionEngine::new(
        desc,
        move || Some(Box::new(anchor.clone()) as Box<dyn Anchor>),
        sink,
    )?;

    let generator = engine.register_source(
        || Some(Pose2::new(Vec2::new(15.0, 0.0), Vec2::NEG_X)),
        SourceProfile::cone(ConeSettings {
            max_bounces: 2,
            spatial_rays: 24,
            ..Default::default()
        })
        .max_distance(40.0),
        LoopMode::Infinite,
        0.0,
    )?;
    log::info!("Generator registered with ID: {}", generator);

    let radio = engine.register_source(
        || Some(Pose2::from_position(Vec2::new(12.5, 6.0))),
        SourceProfile::lateral(LateralSettings {
            lateral_offset: 0.75,
            directional_mode: DirectionalMode::Fractional {
                min_blocked_floor: 0.4,
            },
            levels: SpatialLevels::default(),
        })
        .staleness_interval(Duration::from_millis(100)),
        LoopMode::Infinite,
        0.0,
    )?;
    log::info!("Radio registered with ID: {}", radio);

    let door = Rc::new(Cell::new(Pose2::from_position(Vec2::new(22.0, 2.0))));
    let creak = engine.register_default(Rc::downgrade(&door), LoopMode::Infinite, 0.0)?;
    let mut door = Some(door);
    log::info!("Door creak registered with ID: {}", creak);

    let bell = engine.register_default(
        || Some(Pose2::from_position(Vec2::new(4.0, 2.0))),
        LoopMode::Once,
        0.0,
    )?;
    log::info!("Bell registered with ID: {}", bell);

    for tick in 0..ticks {
        let now = tick as f64 * TICK_SECONDS;
        listener.set(Vec2::new(now as f32 * 6.0, 0.0));

        // The door is destroyed halfway through; its source gets pruned.
        if tick == ticks / 2 && door.take().is_some() {
            log::info!("Destroying the door");
        }

        let report = engine.tick(now, &scene);
        log::debug!(
            "t={:.2}s listener={:?} rr={:?} recomputed={} rays={} pruned={} expired={} ({:?})",
            now,
            listener.get(),
            report.round_robin.map(|id| id.to_string()),
            report.recomputed.len(),
            report.ray_casts,
            report.pruned,
            report.expired,
            report.elapsed
        );

        for update in updates.try_iter() {
            log::info!(
                "  {} -> directional {:.2}, spatial {:.2}",
                update.source_id,
                update.directional,
                update.spatial
            );
        }

        for event in engine.poll_events() {
            match event {
                OcclusionEvent::SourcePruned { source_id } => {
                    log::info!("  {} pruned", source_id);
                }
                OcclusionEvent::TrackingWindowElapsed { source_id } => {
                    log::info!("  {} stopped tracking", source_id);
                }
                other => log::debug!("  event: {:?}", other),
            }
        }
    }

    let forced = engine.query(generator, ticks as f64 * TICK_SECONDS, &scene, true);
    log::info!("Final forced generator query: {:?}", forced);
    log::info!("Corridor walkthrough completed with {} sources", engine.source_count());
    Ok(())
}
