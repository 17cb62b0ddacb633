use std::time::Duration;

use firebot_core::{
    Command, ControllerState, Event, FireClearReason, FloorPlan, LogLevel, MapId, Position, Rect,
};
use firebot_system_fire_lifecycle::{Config, FireLifecycle, FreePointSampler};
use firebot_world::{self as world, query, World};

const FIRE_SITE: Position = Position::new(600.0, 400.0);

struct Harness {
    world: World,
    lifecycle: FireLifecycle,
    log: Vec<Event>,
}

impl Harness {
    fn patrolling() -> Self {
        let config = Config {
            ignition_chance: 0.0,
            ..Config::default()
        };
        let mut harness = Self {
            world: World::new(),
            lifecycle: FireLifecycle::new(config, FreePointSampler::default()),
            log: Vec::new(),
        };
        harness.submit(vec![
            Command::LoadFloorPlan {
                plan: FloorPlan {
                    id: MapId::new("open"),
                    bounds: Rect::new(0.0, 0.0, 800.0, 600.0),
                    obstacles: Vec::new(),
                },
            },
            Command::Start,
            Command::TransitionState {
                from: ControllerState::Idle,
                to: ControllerState::Patrolling,
            },
        ]);
        harness
    }

    fn submit(&mut self, commands: Vec<Command>) {
        let mut events = Vec::new();
        for command in commands {
            world::apply(&mut self.world, command, &mut events);
        }
        self.pump(events);
    }

    fn advance(&mut self, dt: Duration) {
        self.submit(vec![Command::Tick { dt }]);
    }

    fn pump(&mut self, mut events: Vec<Event>) {
        while !events.is_empty() {
            self.log.extend(events.iter().cloned());
            let mut commands = Vec::new();
            self.lifecycle.handle(
                &events,
                &query::simulation_view(&self.world),
                &mut commands,
            );
            events = Vec::new();
            for command in commands {
                world::apply(&mut self.world, command, &mut events);
            }
        }
    }

    fn timed_out(&self) -> usize {
        self.log
            .iter()
            .filter(|event| {
                matches!(
                    event,
                    Event::FireCleared {
                        reason: FireClearReason::TimedOut,
                        ..
                    }
                )
            })
            .count()
    }
}

#[test]
fn stale_timeout_does_not_clear_newer_fire_at_same_site() {
    let mut harness = Harness::patrolling();
    harness.submit(vec![Command::SpawnFire {
        position: FIRE_SITE,
        confidence: 0.9,
    }]);
    let first = query::fire(&harness.world).expect("first fire").id;

    harness.advance(Duration::from_millis(1000));
    harness.submit(vec![
        Command::ExtinguishFire,
        Command::SpawnFire {
            position: FIRE_SITE,
            confidence: 0.9,
        },
    ]);
    let second = query::fire(&harness.world).expect("second fire").id;
    assert_ne!(first, second);

    harness.advance(Duration::from_millis(4100));
    assert_eq!(query::fire(&harness.world).map(|fire| fire.id), Some(second));
    assert_eq!(harness.timed_out(), 0);
    assert_eq!(query::state(&harness.world), ControllerState::Patrolling);

    harness.advance(Duration::from_millis(1000));
    assert!(query::fire(&harness.world).is_none());
    assert_eq!(harness.timed_out(), 1);
    assert!(harness.log.contains(&Event::Logged {
        level: LogLevel::Error,
        message: "Fire timed out! Relocating...".to_owned(),
    }));
}

#[test]
fn spawn_is_announced_with_floored_coordinates() {
    let mut harness = Harness::patrolling();
    harness.submit(vec![Command::SpawnFire {
        position: Position::new(612.7, 388.2),
        confidence: 0.9,
    }]);

    assert!(harness.log.contains(&Event::Logged {
        level: LogLevel::Error,
        message: "Fire detected at [612, 388]".to_owned(),
    }));
}

#[test]
fn second_spawn_is_rejected_while_slot_is_occupied() {
    let mut harness = Harness::patrolling();
    harness.submit(vec![
        Command::SpawnFire {
            position: FIRE_SITE,
            confidence: 0.9,
        },
        Command::SpawnFire {
            position: Position::new(100.0, 100.0),
            confidence: 0.9,
        },
    ]);

    let fire = query::fire(&harness.world).expect("fire spawned");
    assert_eq!(fire.position, FIRE_SITE);
    let spawned = harness
        .log
        .iter()
        .filter(|event| matches!(event, Event::FireSpawned { .. }))
        .count();
    assert_eq!(spawned, 1);
}

#[test]
fn random_ignition_spawns_while_patrolling() {
    let config = Config {
        ignition_chance: 1.0,
        rng_seed: 42,
        ..Config::default()
    };
    let mut harness = Harness::patrolling();
    harness.lifecycle = FireLifecycle::new(config, FreePointSampler::default());
    harness.submit(vec![Command::Stop, Command::Start]);
    harness.submit(vec![Command::TransitionState {
        from: ControllerState::Idle,
        to: ControllerState::Patrolling,
    }]);

    for _ in 0..10 {
        harness.advance(Duration::from_millis(16));
    }

    let fire = query::fire(&harness.world).expect("fire ignited");
    assert!(fire.position.distance_to(query::robot(&harness.world)) >= 150.0);
    assert!((0.75..=0.95).contains(&fire.confidence));
}
